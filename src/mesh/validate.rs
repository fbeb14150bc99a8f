//! Structural checks of single elements and of whole meshes.
//!
//! Nothing in here is needed for normal operation. The checks are used by
//! the test suite and, with the `paranoid` feature, after every lifecycle
//! operation.

use fxhash::FxHashSet;
use log::warn;
use smallvec::SmallVec;

use crate::{
    flags::ElemMask,
    handle::{hsize, EdgeHandle, ElemHandle, FaceHandle, Handle, LoopHandle, VertHandle},
};
use super::BMesh;


bitflags::bitflags! {
    /// Set of structural problems found by [`BMesh::validate_elem`]. Each bit
    /// names one specific check that failed.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ElemErrors: u32 {
        /// The element itself is not alive.
        const STALE = 1 << 0;

        /// `v.e` is stale or does not contain `v`.
        const VERT_WRONG_EDGE = 1 << 1;
        /// The disk cycle of the vertex is broken.
        const VERT_BROKEN_DISK = 1 << 2;

        /// An endpoint is stale, or both endpoints are the same vertex.
        const EDGE_WRONG_VERT = 1 << 3;
        /// A disk link is missing or only half set.
        const EDGE_NULL_DISK_LINK = 1 << 4;
        /// `e.l` is stale or does not use `e`.
        const EDGE_WRONG_LOOP = 1 << 5;
        /// The radial cycle of the edge is broken.
        const EDGE_BROKEN_RADIAL = 1 << 6;
        /// A loop in the radial cycle belongs to a stale face or one of length 0.
        const EDGE_WRONG_FACE = 1 << 7;
        /// The edge cannot be reached by walking the disk cycle of one of its
        /// endpoints.
        const EDGE_NOT_IN_DISK = 1 << 21;

        /// The vertex, edge or face of the loop is stale.
        const LOOP_STALE_REF = 1 << 8;
        /// The loop has no edge.
        const LOOP_NULL_EDGE = 1 << 9;
        /// The vertex of the loop is not an endpoint of its edge, or the edge
        /// does not lead to the vertex of the next loop.
        const LOOP_VERT_NOT_IN_EDGE = 1 << 10;
        /// `next`/`prev` are broken or lead to a loop of another face.
        const LOOP_BROKEN_CYCLE = 1 << 11;
        /// The radial cycle through the loop is broken.
        const LOOP_WRONG_RADIAL_LENGTH = 1 << 12;
        /// The loop is not reachable from the first loop of its face.
        const LOOP_NOT_IN_FACE = 1 << 13;

        /// `f.l_first` is stale.
        const FACE_NULL_LOOP = 1 << 14;
        /// A loop of the boundary belongs to another face.
        const FACE_WRONG_LOOP_FACE = 1 << 15;
        /// The boundary has not exactly `f.len` loops, or `f.len == 0`.
        const FACE_WRONG_LENGTH = 1 << 16;
        /// A loop of the boundary has a broken vertex, edge or radial cycle.
        const FACE_LOOP_BROKEN = 1 << 17;
        const FACE_DUPE_LOOP = 1 << 18;
        const FACE_DUPE_VERT = 1 << 19;
        const FACE_DUPE_EDGE = 1 << 20;
    }
}


/// Result of [`BMesh::validate`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshReport {
    /// Every element with problems, in pool order per kind.
    pub elem_errors: Vec<(ElemHandle, ElemErrors)>,

    /// Kinds whose indices are marked clean but are wrong.
    pub bad_indices: ElemMask,

    /// Kinds whose lookup tables are marked clean but are wrong.
    pub bad_tables: ElemMask,

    /// Number of loops not reachable from any face.
    pub orphan_loops: usize,
}

impl MeshReport {
    pub fn is_ok(&self) -> bool {
        self.elem_errors.is_empty()
            && self.bad_indices.is_empty()
            && self.bad_tables.is_empty()
            && self.orphan_loops == 0
    }
}


impl BMesh {
    /// Checks the local structure of a single element and returns the set of
    /// checks that failed. Never panics.
    pub fn validate_elem(&self, h: impl Into<ElemHandle>) -> ElemErrors {
        match h.into() {
            ElemHandle::Vert(v) => self.validate_vert(v),
            ElemHandle::Edge(e) => self.validate_edge(e),
            ElemHandle::Loop(l) => self.validate_loop(l),
            ElemHandle::Face(f) => self.validate_face(f),
        }
    }

    fn validate_vert(&self, v: VertHandle) -> ElemErrors {
        let mut err = ElemErrors::empty();
        let vert = match self.verts.get(v) {
            Some(vert) => vert,
            None => return ElemErrors::STALE,
        };

        if let Some(e) = vert.e() {
            match self.edges.get(e) {
                Some(edge) if edge.has_vert(v) => {
                    // Any cycle longer than the number of edges is broken.
                    let len = self.disk_len_checked(e, v, self.edges.len() as usize);
                    if len.map(|len| !self.disk_validate(len, e, v)).unwrap_or(true) {
                        err |= ElemErrors::VERT_BROKEN_DISK;
                    }
                }
                _ => err |= ElemErrors::VERT_WRONG_EDGE,
            }
        }

        err
    }

    /// Length of the disk cycle of `v` starting at `e`, or `None` if the walk
    /// hits a broken link or does not return within `limit` steps.
    fn disk_len_checked(&self, e: EdgeHandle, v: VertHandle, limit: usize) -> Option<usize> {
        let mut len = 0;
        let mut cur = e;
        loop {
            cur = self.edges.get(cur)?.disk_link(v)?.next()?;
            len += 1;
            if cur == e {
                return Some(len);
            }
            if len > limit {
                return None;
            }
        }
    }

    /// Returns `true` if walking the disk cycle of `v` from `v.e` reaches
    /// `e` before returning to the start or hitting a broken link.
    fn disk_reaches(&self, v: VertHandle, e: EdgeHandle) -> bool {
        let start = match self.verts.get(v).and_then(|vert| vert.e()) {
            Some(start) => start,
            None => return false,
        };

        let mut cur = start;
        for _ in 0..=self.edges.len() {
            if cur == e {
                return true;
            }
            cur = match self.edges.get(cur).and_then(|edge| edge.disk_link(v)).and_then(|l| l.next()) {
                Some(next) => next,
                None => return false,
            };
            if cur == start {
                return false;
            }
        }

        false
    }

    /// Length of the radial cycle starting at `l`, or `None` if the walk
    /// hits a stale loop or does not return within `limit` steps.
    fn radial_len_checked(&self, l: LoopHandle, limit: usize) -> Option<usize> {
        let mut len = 0;
        let mut cur = l;
        loop {
            cur = self.loops.get(cur)?.radial_next;
            len += 1;
            if cur == l {
                return Some(len);
            }
            if len > limit {
                return None;
            }
        }
    }

    fn validate_edge(&self, e: EdgeHandle) -> ElemErrors {
        let mut err = ElemErrors::empty();
        let edge = match self.edges.get(e) {
            Some(edge) => edge,
            None => return ElemErrors::STALE,
        };

        if !self.verts.contains(edge.v1) || !self.verts.contains(edge.v2) || edge.v1 == edge.v2 {
            err |= ElemErrors::EDGE_WRONG_VERT;
        }
        if !edge.v1_disk.is_linked() || !edge.v2_disk.is_linked() {
            err |= ElemErrors::EDGE_NULL_DISK_LINK;
        }
        if !err.contains(ElemErrors::EDGE_WRONG_VERT) {
            if !self.disk_reaches(edge.v1, e) || !self.disk_reaches(edge.v2, e) {
                err |= ElemErrors::EDGE_NOT_IN_DISK;
            }
        }

        if let Some(l) = edge.l() {
            match self.loops.get(l) {
                Some(lp) if lp.e == e => {
                    let limit = self.loops.len() as usize;
                    match self.radial_len_checked(l, limit) {
                        Some(len) if self.radial_validate(len, l) => {
                            let mut cur = l;
                            loop {
                                let lp = &self.loops[cur];
                                let face_ok = self.faces.get(lp.f).map(|f| f.len > 0).unwrap_or(false);
                                if !face_ok {
                                    err |= ElemErrors::EDGE_WRONG_FACE;
                                }
                                cur = lp.radial_next;
                                if cur == l {
                                    break;
                                }
                            }
                        }
                        _ => err |= ElemErrors::EDGE_BROKEN_RADIAL,
                    }
                }
                _ => err |= ElemErrors::EDGE_WRONG_LOOP,
            }
        }

        err
    }

    fn validate_loop(&self, l: LoopHandle) -> ElemErrors {
        let mut err = ElemErrors::empty();
        let lp = match self.loops.get(l) {
            Some(lp) => lp,
            None => return ElemErrors::STALE,
        };

        if !self.verts.contains(lp.v) || !self.faces.contains(lp.f) {
            err |= ElemErrors::LOOP_STALE_REF;
        }
        if lp.e.is_invalid() {
            err |= ElemErrors::LOOP_NULL_EDGE;
        } else {
            match self.edges.get(lp.e) {
                None => err |= ElemErrors::LOOP_STALE_REF,
                Some(edge) => {
                    let next_v = self.loops.get(lp.next).map(|n| n.v);
                    let leads_to_next = next_v
                        .map(|nv| edge.other_vert(lp.v) == Some(nv))
                        .unwrap_or(false);
                    if !leads_to_next {
                        err |= ElemErrors::LOOP_VERT_NOT_IN_EDGE;
                    }

                    let limit = self.loops.len() as usize;
                    let radial_ok = self.radial_len_checked(l, limit)
                        .map(|len| self.radial_validate(len, l))
                        .unwrap_or(false);
                    if !radial_ok {
                        err |= ElemErrors::LOOP_WRONG_RADIAL_LENGTH;
                    }
                }
            }
        }

        let next_ok = self.loops.get(lp.next).map(|n| n.prev == l && n.f == lp.f).unwrap_or(false);
        let prev_ok = self.loops.get(lp.prev).map(|p| p.next == l && p.f == lp.f).unwrap_or(false);
        if !next_ok || !prev_ok {
            err |= ElemErrors::LOOP_BROKEN_CYCLE;
        }

        if let Some(face) = self.faces.get(lp.f) {
            let mut found = false;
            let mut cur = face.l_first;
            for _ in 0..face.len {
                if cur == l {
                    found = true;
                    break;
                }
                cur = match self.loops.get(cur) {
                    Some(c) => c.next,
                    None => break,
                };
            }
            if !found {
                err |= ElemErrors::LOOP_NOT_IN_FACE;
            }
        }

        err
    }

    fn validate_face(&self, f: FaceHandle) -> ElemErrors {
        let mut err = ElemErrors::empty();
        let face = match self.faces.get(f) {
            Some(face) => face,
            None => return ElemErrors::STALE,
        };

        if !self.loops.contains(face.l_first) {
            return ElemErrors::FACE_NULL_LOOP;
        }
        if face.len == 0 || !self.loop_cycle_validate(f) {
            err |= ElemErrors::FACE_WRONG_LENGTH;
        }

        let mut loops = FxHashSet::default();
        let mut verts = FxHashSet::default();
        let mut edges = FxHashSet::default();

        let mut cur = face.l_first;
        for _ in 0..face.len {
            let lp = match self.loops.get(cur) {
                Some(lp) => lp,
                None => {
                    err |= ElemErrors::FACE_LOOP_BROKEN;
                    break;
                }
            };

            if lp.f != f {
                err |= ElemErrors::FACE_WRONG_LOOP_FACE;
            }
            let loop_err = self.validate_loop(cur);
            if !loop_err.is_empty() {
                err |= ElemErrors::FACE_LOOP_BROKEN;
            }

            if !loops.insert(cur) {
                err |= ElemErrors::FACE_DUPE_LOOP;
            }
            if !verts.insert(lp.v) {
                err |= ElemErrors::FACE_DUPE_VERT;
            }
            if !edges.insert(lp.e) {
                err |= ElemErrors::FACE_DUPE_EDGE;
            }

            cur = lp.next;
        }

        err
    }

    /// Checks every element of the mesh, the index and table bookkeeping and
    /// the loop count. Every problem found is logged as a warning.
    pub fn validate(&self) -> MeshReport {
        let mut report = MeshReport::default();

        let elems = self.verts.handles().map(ElemHandle::from)
            .chain(self.edges.handles().map(ElemHandle::from))
            .chain(self.loops.handles().map(ElemHandle::from))
            .chain(self.faces.handles().map(ElemHandle::from));
        for h in elems {
            let err = self.validate_elem(h);
            if !err.is_empty() {
                warn!("{:?} is broken: {:?}", h, err);
                report.elem_errors.push((h, err));
            }
        }

        report.bad_indices = self.validate_indices(ElemMask::ALL);
        if !report.bad_indices.is_empty() {
            warn!("indices marked as clean are wrong for {:?}", report.bad_indices);
        }
        report.bad_tables = self.check_tables(ElemMask::ALL);
        if !report.bad_tables.is_empty() {
            warn!("tables marked as clean are wrong for {:?}", report.bad_tables);
        }

        let face_loops: hsize = self.faces.iter().map(|(_, f)| f.len).sum();
        let total = self.loops.len();
        if face_loops < total {
            report.orphan_loops = (total - face_loops) as usize;
            warn!("{} loops do not belong to any face boundary", report.orphan_loops);
        }

        report
    }

    /// With the `paranoid` feature, panics if `h` does not pass
    /// `validate_elem`. Otherwise does nothing.
    #[inline]
    pub(crate) fn paranoid_check(&self, h: impl Into<ElemHandle>) {
        #[cfg(feature = "paranoid")]
        {
            let h = h.into();
            let err = self.validate_elem(h);
            if !err.is_empty() {
                panic!("{:?} is broken after a mesh operation: {:?}", h, err);
            }
        }

        #[cfg(not(feature = "paranoid"))]
        let _ = h;
    }

    /// With the `paranoid` feature, returns the vertices whose surroundings
    /// an operation on `h` modifies: the corners of `h` and of every face
    /// that uses it. Returns nothing otherwise.
    pub(crate) fn paranoid_touched(&self, h: ElemHandle) -> SmallVec<[VertHandle; 16]> {
        #[allow(unused_mut)]
        let mut out = SmallVec::new();

        #[cfg(feature = "paranoid")]
        {
            match h {
                ElemHandle::Vert(v) => {
                    out.push(v);
                    for e in self.edges_of_vert(v) {
                        out.extend(self.paranoid_touched(e.into()));
                    }
                }
                ElemHandle::Edge(e) => {
                    out.extend_from_slice(&self.edges[e].verts());
                    for f in self.faces_of_edge(e) {
                        out.extend(self.verts_of_face(f));
                    }
                }
                ElemHandle::Loop(l) => out.extend(self.paranoid_touched(self.loops[l].f.into())),
                ElemHandle::Face(f) => out.extend(self.verts_of_face(f)),
            }
        }

        #[cfg(not(feature = "paranoid"))]
        let _ = h;

        out
    }

    /// With the `paranoid` feature, panics if one of the surviving vertices
    /// in `verts`, an edge around it or a face on such an edge does not pass
    /// `validate_elem`.
    pub(crate) fn paranoid_check_around(&self, verts: &[VertHandle]) {
        #[cfg(feature = "paranoid")]
        {
            for &v in verts {
                if !self.verts.contains(v) {
                    continue;
                }
                self.paranoid_check(v);
                for e in self.edges_of_vert(v) {
                    self.paranoid_check(e);
                    for f in self.faces_of_edge(e) {
                        self.paranoid_check(f);
                    }
                }
            }
        }

        #[cfg(not(feature = "paranoid"))]
        let _ = verts;
    }
}
