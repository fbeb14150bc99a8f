//! Creating and destroying elements.
//!
//! Every public operation first checks all of its arguments and returns an
//! error before anything is modified. After the checks, an operation always
//! runs to completion: a cascade (e.g. killing all faces of an edge) is never
//! left half-done.

use cgmath::{Point3, Vector3};
use log::trace;
use num_traits::Zero;
use optional::Optioned as Opt;
use smallvec::SmallVec;

use crate::{
    customdata::{LayerTypeMask, ShapeKeyIndex, SHAPE_KEY_INDEX_NONE},
    elem::{Edge, Face, Loop, Vert},
    error::{Error, Result},
    flags::{CreateFlags, ElemFlags, ElemMask},
    handle::{hsize, EdgeHandle, FaceHandle, Handle, LoopHandle, VertHandle},
};
use super::BMesh;


// ===============================================================================================
// ===== Creation
// ===============================================================================================

impl BMesh {
    /// Creates a new, isolated vertex at `co`.
    ///
    /// If `example` is given, its attributes (flags, normal, custom data) are
    /// copied to the new vertex, except for the shape key index, which is
    /// reset to "none". Otherwise the custom data gets the layer defaults.
    /// With `CreateFlags::SKIP_CD` the custom data block is left empty (only
    /// the normal of `example` is copied).
    ///
    /// `CreateFlags::NO_DOUBLE` makes no sense for vertices and must not be
    /// passed.
    pub fn create_vert(
        &mut self,
        co: Point3<f32>,
        example: Option<VertHandle>,
        flags: CreateFlags,
    ) -> Result<VertHandle> {
        debug_assert!(
            !flags.contains(CreateFlags::NO_DOUBLE),
            "`NO_DOUBLE` cannot be used when creating vertices",
        );
        if let Some(ex) = example {
            self.check(ex)?;
        }

        let v = self.verts.alloc(Vert::new(co));
        self.mark_dirty(ElemMask::VERT);

        if !flags.contains(CreateFlags::SKIP_CD) {
            match example {
                Some(ex) => {
                    self.copy_attrs_unchecked(ex.into(), v.into(), LayerTypeMask::empty());
                    if let Some(k) = self.vdata.get_mut::<ShapeKeyIndex>(&mut self.verts[v].head.data) {
                        *k = ShapeKeyIndex(SHAPE_KEY_INDEX_NONE);
                    }
                }
                None => {
                    let data = self.vdata.default_block();
                    self.verts[v].head.data = data;
                }
            }
        } else if let Some(ex) = example {
            self.verts[v].no = self.verts[ex].no;
        }

        trace!("created vertex {:?} at {:?}", v, co);
        self.paranoid_check(v);
        Ok(v)
    }

    /// Creates an edge between `v1` and `v2` and links it into both disk
    /// cycles.
    ///
    /// With `CreateFlags::NO_DOUBLE`, an existing edge between the two
    /// vertices is returned instead, if there is one. New edges get the flags
    /// `SMOOTH | DRAW` unless the attributes of `example` are copied.
    pub fn create_edge(
        &mut self,
        v1: VertHandle,
        v2: VertHandle,
        example: Option<EdgeHandle>,
        flags: CreateFlags,
    ) -> Result<EdgeHandle> {
        self.check(v1)?;
        self.check(v2)?;
        if v1 == v2 {
            return Err(Error::DegenerateEdge(v1));
        }
        if let Some(ex) = example {
            self.check(ex)?;
        }

        if flags.contains(CreateFlags::NO_DOUBLE) {
            if let Some(e) = self.edge_exists(v1, v2) {
                return Ok(e);
            }
        }

        let mut edge = Edge::new(v1, v2);
        edge.head.flag = ElemFlags::SMOOTH | ElemFlags::DRAW;
        let e = self.edges.alloc(edge);
        self.mark_dirty(ElemMask::EDGE);

        self.disk_append(e, v1);
        self.disk_append(e, v2);

        if !flags.contains(CreateFlags::SKIP_CD) {
            match example {
                Some(ex) => self.copy_attrs_unchecked(ex.into(), e.into(), LayerTypeMask::empty()),
                None => {
                    let data = self.edata.default_block();
                    self.edges[e].head.data = data;
                }
            }
        }

        trace!("created edge {:?} ({:?} - {:?})", e, v1, v2);
        self.paranoid_check(e);
        self.paranoid_check_around(&[v1, v2]);
        Ok(e)
    }

    /// Allocates a loop at `v` with edge `e` belonging to face `f`. The loop
    /// is not linked into any cycle yet: all its links point to itself. Only
    /// the custom data of `example` is copied.
    pub(crate) fn create_loop(
        &mut self,
        v: VertHandle,
        e: EdgeHandle,
        f: FaceHandle,
        example: Option<LoopHandle>,
        flags: CreateFlags,
    ) -> LoopHandle {
        let l = self.loops.alloc_with(|me| Loop::new(me, v, e, f));
        self.mark_dirty(ElemMask::LOOP);

        if !flags.contains(CreateFlags::SKIP_CD) {
            let data = match example.and_then(|ex| self.loops.get(ex)) {
                Some(ex) => self.ldata.copy_block(&ex.head.data, LayerTypeMask::empty()),
                None => self.ldata.default_block(),
            };
            self.loops[l].head.data = data;
        }

        l
    }

    /// Creates a face with the boundary `verts[0], edges[0], verts[1], ...`.
    /// `edges[i]` has to connect `verts[i]` and `verts[i + 1]` (wrapping
    /// around), and no vertex may appear twice.
    ///
    /// Returns `Ok(None)` if `verts` is empty. With `CreateFlags::NO_DOUBLE`,
    /// an existing face with the same vertices (in any rotation and winding)
    /// is returned instead, if there is one. The face attributes (including
    /// the normal and material index) are copied from `example`, otherwise
    /// the normal is zero and the material index 0.
    pub fn create_face(
        &mut self,
        verts: &[VertHandle],
        edges: &[EdgeHandle],
        example: Option<FaceHandle>,
        flags: CreateFlags,
    ) -> Result<Option<FaceHandle>> {
        self.check_face_boundary(verts, edges)?;
        if let Some(ex) = example {
            self.check(ex)?;
        }
        if verts.is_empty() {
            return Ok(None);
        }

        if flags.contains(CreateFlags::NO_DOUBLE) {
            if let Some(f) = self.face_exists(verts) {
                return Ok(Some(f));
            }
        }

        let f = self.create_face_unchecked(verts, edges, None, example, flags);
        Ok(Some(f))
    }

    /// Creates a face from its vertices. The boundary edges are looked up;
    /// missing edges are created if `create_edges` is `true`. Otherwise
    /// `Ok(None)` is returned if an edge is missing.
    pub fn create_face_verts(
        &mut self,
        verts: &[VertHandle],
        example: Option<FaceHandle>,
        flags: CreateFlags,
        create_edges: bool,
    ) -> Result<Option<FaceHandle>> {
        for &v in verts {
            self.check(v)?;
        }
        if let Some(v) = find_duplicate(verts) {
            return Err(Error::DuplicateFaceVertex(v));
        }
        if let Some(ex) = example {
            self.check(ex)?;
        }
        if verts.is_empty() {
            return Ok(None);
        }

        let len = verts.len();
        if len < 3 {
            return Err(Error::TooFewCorners(len));
        }

        let mut edges = SmallVec::<[EdgeHandle; 8]>::with_capacity(len);
        for i in 0..len {
            let (a, b) = (verts[i], verts[(i + 1) % len]);
            let e = match self.edge_exists(a, b) {
                Some(e) => e,
                None if create_edges => self.create_edge(a, b, None, CreateFlags::NO_DOUBLE)?,
                None => return Ok(None),
            };
            edges.push(e);
        }

        self.create_face(verts, &edges, example, flags)
    }

    /// Checks the arguments of `create_face`.
    fn check_face_boundary(&self, verts: &[VertHandle], edges: &[EdgeHandle]) -> Result<()> {
        if verts.len() != edges.len() {
            return Err(Error::FaceLengthMismatch { verts: verts.len(), edges: edges.len() });
        }
        for &v in verts {
            self.check(v)?;
        }
        for &e in edges {
            self.check(e)?;
        }

        let len = verts.len();
        for (i, &e) in edges.iter().enumerate() {
            if self.edges[e].other_vert(verts[i]) != Some(verts[(i + 1) % len]) {
                return Err(Error::EdgeNotInFace { edge: e, index: i });
            }
        }

        if let Some(v) = find_duplicate(verts) {
            return Err(Error::DuplicateFaceVertex(v));
        }
        if let Some(e) = find_duplicate(edges) {
            return Err(Error::DuplicateFaceEdge(e));
        }
        Ok(())
    }

    /// Creates the face record and its loops. All arguments have to be
    /// checked already. If `loop_examples` is given, it has one loop per
    /// corner whose custom data is copied to the new loop.
    pub(crate) fn create_face_unchecked(
        &mut self,
        verts: &[VertHandle],
        edges: &[EdgeHandle],
        loop_examples: Option<&[LoopHandle]>,
        example: Option<FaceHandle>,
        flags: CreateFlags,
    ) -> FaceHandle {
        let f = self.faces.alloc(Face::new());
        self.mark_dirty(ElemMask::FACE);

        let loop_example = |i: usize| loop_examples.map(|ls| ls[i]);

        let first = self.create_loop(verts[0], edges[0], f, loop_example(0), flags);
        self.radial_append(edges[0], first);
        self.faces[f].l_first = first;

        let mut last = first;
        for i in 1..verts.len() {
            let l = self.create_loop(verts[i], edges[i], f, loop_example(i), flags);
            self.radial_append(edges[i], l);
            self.loops[l].prev = last;
            self.loops[last].next = l;
            last = l;
        }
        self.loops[first].prev = last;
        self.loops[last].next = first;
        self.faces[f].len = verts.len() as hsize;

        if !flags.contains(CreateFlags::SKIP_CD) {
            match example {
                Some(ex) => self.copy_attrs_unchecked(ex.into(), f.into(), LayerTypeMask::empty()),
                None => {
                    let data = self.pdata.default_block();
                    let face = &mut self.faces[f];
                    face.head.data = data;
                    face.no = Vector3::zero();
                }
            }
        } else if let Some(ex) = example {
            self.faces[f].no = self.faces[ex].no;
        }

        trace!("created face {:?} with {} corners", f, verts.len());
        self.paranoid_check(f);
        self.paranoid_check_around(verts);
        f
    }

    /// Creates a new face with the same boundary as `f`. The attributes of
    /// the face and of each corner are copied.
    pub fn copy_face(&mut self, f: FaceHandle) -> Result<FaceHandle> {
        self.check(f)?;

        let loops = self.face_loops_vec(f);
        let verts = loops.iter().map(|&l| self.loops[l].v).collect::<SmallVec<[_; 8]>>();
        let edges = loops.iter().map(|&l| self.loops[l].e).collect::<SmallVec<[_; 8]>>();

        let copy = self.create_face_unchecked(&verts, &edges, Some(&loops[..]), Some(f), CreateFlags::empty());
        self.paranoid_check(f);
        Ok(copy)
    }

    /// The loops of `f` in boundary order, starting at `l_first`.
    pub(crate) fn face_loops_vec(&self, f: FaceHandle) -> SmallVec<[LoopHandle; 8]> {
        let first = self.faces[f].l_first;
        let mut out = SmallVec::new();
        let mut l = first;
        loop {
            out.push(l);
            l = self.loops[l].next;
            if l == first {
                break;
            }
        }
        out
    }
}

/// Returns a handle that appears more than once in `items`, if any.
fn find_duplicate<H: Handle>(items: &[H]) -> Option<H> {
    let mut sorted = SmallVec::<[H; 8]>::from_slice(items);
    sorted.sort_unstable();
    sorted.windows(2).find(|w| w[0] == w[1]).map(|w| w[0])
}


// ===============================================================================================
// ===== Destruction
// ===============================================================================================

impl BMesh {
    fn kill_only_vert(&mut self, v: VertHandle) {
        if let Some(mut vert) = self.verts.free(v) {
            self.vdata.free_block(&mut vert.head.data);
        }
        self.mark_dirty(ElemMask::VERT);
        trace!("killed vertex {:?}", v);
    }

    fn kill_only_edge(&mut self, e: EdgeHandle) {
        if let Some(mut edge) = self.edges.free(e) {
            self.edata.free_block(&mut edge.head.data);
        }
        self.mark_dirty(ElemMask::EDGE);
        trace!("killed edge {:?}", e);
    }

    fn kill_only_loop(&mut self, l: LoopHandle) {
        if let Some(mut lp) = self.loops.free(l) {
            self.ldata.free_block(&mut lp.head.data);
        }
        self.mark_dirty(ElemMask::LOOP);
    }

    fn kill_only_face(&mut self, f: FaceHandle) {
        if let Some(mut face) = self.faces.free(f) {
            self.pdata.free_block(&mut face.head.data);
        }
        self.mark_dirty(ElemMask::FACE);
        trace!("killed face {:?}", f);
    }

    /// Removes `e` from both disk cycles and frees it. `e` must not have any
    /// loops left.
    fn unlink_and_kill_edge(&mut self, e: EdgeHandle) {
        debug_assert!(self.edges[e].l.is_none());
        let (v1, v2) = (self.edges[e].v1, self.edges[e].v2);
        self.disk_remove(e, v1);
        self.disk_remove(e, v2);
        self.kill_only_edge(e);
    }

    /// Kills `f` and all its loops. Edges and vertices of the boundary stay,
    /// even if they end up without faces.
    pub fn kill_face(&mut self, f: FaceHandle) -> Result<()> {
        self.check(f)?;
        let touched = self.paranoid_touched(f.into());
        self.kill_face_unchecked(f);
        self.paranoid_check_around(&touched);
        Ok(())
    }

    fn kill_face_unchecked(&mut self, f: FaceHandle) {
        for l in self.face_loops_vec(f) {
            let e = self.loops[l].e;
            self.radial_remove(e, l);
            self.kill_only_loop(l);
        }
        self.kill_only_face(f);
    }

    /// Kills `f` and all its loops, and additionally every boundary edge
    /// that is left without faces and every boundary vertex that is left
    /// without edges.
    pub fn kill_face_loose(&mut self, f: FaceHandle) -> Result<()> {
        self.check(f)?;
        let touched = self.paranoid_touched(f.into());
        self.kill_face_loose_unchecked(f);
        self.paranoid_check_around(&touched);
        Ok(())
    }

    fn kill_face_loose_unchecked(&mut self, f: FaceHandle) {
        for l in self.face_loops_vec(f) {
            let e = self.loops[l].e;
            self.radial_remove(e, l);
            self.kill_only_loop(l);

            if self.edges[e].l.is_none() {
                let (v1, v2) = (self.edges[e].v1, self.edges[e].v2);
                self.unlink_and_kill_edge(e);
                if self.verts[v1].e.is_none() {
                    self.kill_only_vert(v1);
                }
                if self.verts[v2].e.is_none() {
                    self.kill_only_vert(v2);
                }
            }
        }
        self.kill_only_face(f);
    }

    /// Kills `e` and every face using it. The endpoints stay.
    pub fn kill_edge(&mut self, e: EdgeHandle) -> Result<()> {
        self.check(e)?;
        let touched = self.paranoid_touched(e.into());
        self.kill_edge_unchecked(e);
        self.paranoid_check_around(&touched);
        Ok(())
    }

    fn kill_edge_unchecked(&mut self, e: EdgeHandle) {
        while let Some(l) = self.edges[e].l() {
            let f = self.loops[l].f;
            self.kill_face_unchecked(f);
        }
        self.unlink_and_kill_edge(e);
    }

    /// Kills `e` and every face using it (like `kill_face_loose` does), and
    /// every vertex that is left without edges afterwards.
    pub fn kill_edge_loose(&mut self, e: EdgeHandle) -> Result<()> {
        self.check(e)?;
        let touched = self.paranoid_touched(e.into());
        self.kill_edge_loose_unchecked(e);
        self.paranoid_check_around(&touched);
        Ok(())
    }

    fn kill_edge_loose_unchecked(&mut self, e: EdgeHandle) {
        let (v1, v2) = (self.edges[e].v1, self.edges[e].v2);

        // Killing the last face of `e` kills `e` itself.
        while let Some(l) = self.edges.get(e).and_then(|edge| edge.l()) {
            let f = self.loops[l].f;
            self.kill_face_loose_unchecked(f);
        }

        if self.edges.contains(e) {
            self.unlink_and_kill_edge(e);
        }
        for &v in &[v1, v2] {
            if self.verts.get(v).map(|vert| vert.e.is_none()).unwrap_or(false) {
                self.kill_only_vert(v);
            }
        }
    }

    /// Kills `v`, every edge using it and every face using those edges.
    pub fn kill_vert(&mut self, v: VertHandle) -> Result<()> {
        self.check(v)?;
        let touched = self.paranoid_touched(v.into());
        while let Some(e) = self.verts[v].e() {
            self.kill_edge_unchecked(e);
        }
        self.kill_only_vert(v);
        self.paranoid_check_around(&touched);
        Ok(())
    }

    /// Like `kill_vert`, but also kills all elements that are left isolated
    /// by the cascade: edges without faces and vertices without edges.
    pub fn kill_vert_loose(&mut self, v: VertHandle) -> Result<()> {
        self.check(v)?;
        let touched = self.paranoid_touched(v.into());
        while self.verts.contains(v) {
            match self.verts[v].e() {
                Some(e) => self.kill_edge_loose_unchecked(e),
                None => self.kill_only_vert(v),
            }
        }
        self.paranoid_check_around(&touched);
        Ok(())
    }

    /// Removes all elements. Layers are kept.
    pub fn clear(&mut self) {
        self.verts.clear();
        self.edges.clear();
        self.loops.clear();
        self.faces.clear();
        self.vtable.clear();
        self.etable.clear();
        self.ltable.clear();
        self.ftable.clear();
        self.elem_index_dirty = ElemMask::empty();
        self.elem_table_dirty = ElemMask::ALL;
        self.elem_index_start = [0; 4];
        trace!("cleared mesh");
    }
}


// ===============================================================================================
// ===== Face winding and normals
// ===============================================================================================

impl BMesh {
    /// Reverses the winding of `f`. Every loop keeps its vertex (and custom
    /// data), but takes over the edge of its former predecessor; the radial
    /// cycles are updated accordingly. The cached normal is not touched, see
    /// `face_normal_flip`.
    pub fn face_reverse(&mut self, f: FaceHandle) -> Result<()> {
        self.check(f)?;
        let touched = self.paranoid_touched(f.into());

        let first = self.faces[f].l_first;
        let first_prev = self.loops[first].prev;

        let mut e_prev = self.loops[first_prev].e;
        let mut prev_radial_next = self.loops[first_prev].radial_next;
        let mut prev_radial_prev = self.loops[first_prev].radial_prev;
        let mut is_prev_boundary = prev_radial_next == self.loops[prev_radial_next].radial_next;

        let mut l = first;
        loop {
            let e = self.loops[l].e;
            let radial_next = self.loops[l].radial_next;
            let radial_prev = self.loops[l].radial_prev;
            let is_boundary = radial_next == self.loops[radial_next].radial_next;

            if is_prev_boundary {
                self.loops[l].radial_next = l;
                self.loops[l].radial_prev = l;
            } else {
                self.loops[l].radial_next = prev_radial_next;
                self.loops[l].radial_prev = prev_radial_prev;
                self.loops[prev_radial_next].radial_prev = l;
                self.loops[prev_radial_prev].radial_next = l;
            }

            if self.edges[e].l.into_option() == Some(l) {
                self.edges[e].l = Opt::some(self.loops[l].next);
            }

            {
                let lp = &mut self.loops[l];
                lp.e = e_prev;
                std::mem::swap(&mut lp.next, &mut lp.prev);
            }

            e_prev = e;
            prev_radial_next = radial_next;
            prev_radial_prev = radial_prev;
            is_prev_boundary = is_boundary;

            // `prev` is the former `next`.
            l = self.loops[l].prev;
            if l == first {
                break;
            }
        }

        self.mark_index_dirty(ElemMask::LOOP);
        self.mark_table_dirty(ElemMask::LOOP);
        self.paranoid_check(f);
        self.paranoid_check_around(&touched);
        Ok(())
    }

    /// Reverses the winding of `f` and negates its cached normal.
    pub fn face_normal_flip(&mut self, f: FaceHandle) -> Result<()> {
        self.face_reverse(f)?;
        self.faces[f].no = -self.faces[f].no;
        Ok(())
    }

    /// Recalculates the cached normal of `f` from its vertex positions.
    pub fn face_normal_update(&mut self, f: FaceHandle) -> Result<()> {
        self.check(f)?;
        let no = self.face_calc_normal(f);
        self.faces[f].no = no;
        Ok(())
    }

    /// Recalculates the normal of `v` as the average of the cached normals
    /// of the faces around it, weighted by the corner angle. Vertices
    /// without faces get their normalized position as normal.
    pub fn vert_normal_update(&mut self, v: VertHandle) -> Result<()> {
        self.check(v)?;
        let no = self.vert_calc_normal(v);
        self.verts[v].no = no;
        Ok(())
    }

    /// Updates the normals of all faces, then of all vertices.
    pub fn normals_update(&mut self) {
        for f in self.faces.handles().collect::<Vec<_>>() {
            let no = self.face_calc_normal(f);
            self.faces[f].no = no;
        }
        for v in self.verts.handles().collect::<Vec<_>>() {
            let no = self.vert_calc_normal(v);
            self.verts[v].no = no;
        }
    }
}
