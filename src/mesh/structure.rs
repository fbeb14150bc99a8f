//! Disk and radial cycle primitives.
//!
//! These functions only splice handles; they never allocate or free
//! elements. All of them assume that the handles they get are alive and
//! that the anchor (vertex of a disk cycle, edge of a radial cycle) actually
//! belongs to the element, which the public callers check beforehand.

use optional::Optioned as Opt;

use crate::{
    elem::DiskLink,
    handle::{EdgeHandle, FaceHandle, Handle, LoopHandle, VertHandle},
};
use super::BMesh;


// ===============================================================================================
// ===== Disk cycle
// ===============================================================================================

impl BMesh {
    /// The disk link of edge `e` in the cycle of its endpoint `v`.
    #[inline]
    fn disk_link_of(&self, e: EdgeHandle, v: VertHandle) -> &DiskLink {
        let edge = &self.edges[e];
        debug_assert!(edge.has_vert(v), "{:?} is not an endpoint of {:?}", v, e);
        if edge.v1 == v { &edge.v1_disk } else { &edge.v2_disk }
    }

    #[inline]
    fn disk_link_of_mut(&mut self, e: EdgeHandle, v: VertHandle) -> &mut DiskLink {
        let edge = &mut self.edges[e];
        debug_assert!(edge.has_vert(v), "{:?} is not an endpoint of {:?}", v, e);
        if edge.v1 == v { &mut edge.v1_disk } else { &mut edge.v2_disk }
    }

    /// Next edge in the disk cycle of `v`, for an edge that is linked into
    /// that cycle.
    #[inline]
    pub(crate) fn disk_next(&self, e: EdgeHandle, v: VertHandle) -> EdgeHandle {
        self.disk_link_of(e, v).next.unpack()
    }

    /// Returns the edge following `e` in the disk cycle of `v`. Returns
    /// `None` if `e` is stale, `v` is not an endpoint of `e` or `e` is not
    /// linked.
    pub fn disk_edge_next(&self, e: EdgeHandle, v: VertHandle) -> Option<EdgeHandle> {
        self.edges.get(e)?.disk_link(v)?.next()
    }

    /// Returns the edge preceding `e` in the disk cycle of `v`. See
    /// `disk_edge_next`.
    pub fn disk_edge_prev(&self, e: EdgeHandle, v: VertHandle) -> Option<EdgeHandle> {
        self.edges.get(e)?.disk_link(v)?.prev()
    }

    /// Inserts `e` into the disk cycle of `v`. If `v` has no edge yet, `e`
    /// becomes a cycle of length one and the entry edge of `v`. Otherwise it
    /// is inserted right before the entry edge.
    pub(crate) fn disk_append(&mut self, e: EdgeHandle, v: VertHandle) {
        match self.verts[v].e.into_option() {
            None => {
                self.verts[v].e = Opt::some(e);
                let link = self.disk_link_of_mut(e, v);
                link.next = Opt::some(e);
                link.prev = Opt::some(e);
            }
            Some(first) => {
                let before = self.disk_link_of(first, v).prev;
                {
                    let link = self.disk_link_of_mut(e, v);
                    link.next = Opt::some(first);
                    link.prev = before;
                }
                self.disk_link_of_mut(first, v).prev = Opt::some(e);
                if let Some(before) = before.into_option() {
                    self.disk_link_of_mut(before, v).next = Opt::some(e);
                }
            }
        }
    }

    /// Removes `e` from the disk cycle of `v`. If `e` was the entry edge of
    /// `v`, the entry moves to the next edge (or is cleared if `e` was the
    /// only one). Both links of `e` in this cycle are cleared.
    pub(crate) fn disk_remove(&mut self, e: EdgeHandle, v: VertHandle) {
        let DiskLink { next, prev } = *self.disk_link_of(e, v);

        if let Some(prev) = prev.into_option() {
            self.disk_link_of_mut(prev, v).next = next;
        }
        if let Some(next) = next.into_option() {
            self.disk_link_of_mut(next, v).prev = prev;
        }

        if self.verts[v].e.into_option() == Some(e) {
            self.verts[v].e = if next.into_option() != Some(e) { next } else { Opt::none() };
        }

        *self.disk_link_of_mut(e, v) = DiskLink::unlinked();
    }

    /// Number of edges in the disk cycle of `v`.
    pub fn disk_count(&self, v: VertHandle) -> usize {
        let first = match self.verts[v].e.into_option() {
            Some(e) => e,
            None => return 0,
        };

        let mut count = 0;
        let mut e = first;
        loop {
            count += 1;
            e = self.disk_next(e, v);
            if e == first {
                break;
            }
        }
        count
    }

    /// Like `disk_count`, but stops counting at `limit`.
    pub fn disk_count_at_most(&self, v: VertHandle, limit: usize) -> usize {
        let first = match self.verts[v].e.into_option() {
            Some(e) => e,
            None => return 0,
        };

        let mut count = 0;
        let mut e = first;
        loop {
            count += 1;
            if count == limit {
                break;
            }
            e = self.disk_next(e, v);
            if e == first {
                break;
            }
        }
        count
    }

    /// Checks the disk cycle of `v` starting at `e`: it has to have exactly
    /// `len` edges, every edge has to contain `v`, every link has to point to
    /// a live edge and `prev` has to be the inverse of `next`.
    ///
    /// Never panics, even on broken cycles.
    pub fn disk_validate(&self, len: usize, e: EdgeHandle, v: VertHandle) -> bool {
        let mut count = 0;
        let mut cur = e;
        loop {
            let edge = match self.edges.get(cur) {
                Some(edge) => edge,
                None => return false,
            };
            let link = match edge.disk_link(v) {
                Some(link) if link.is_linked() => *link,
                _ => return false,
            };
            let next = link.next.unpack();
            let back = self.edges.get(next)
                .and_then(|n| n.disk_link(v))
                .and_then(|l| l.prev());
            if back != Some(cur) {
                return false;
            }

            count += 1;
            if count > len {
                return false;
            }

            cur = next;
            if cur == e {
                break;
            }
        }

        count == len
    }

    /// Returns the next edge after `e` in the disk cycle of `v` that has a
    /// face using `v`. Returns `e` itself if there is no other such edge.
    pub(crate) fn disk_faceedge_find_next(&self, e: EdgeHandle, v: VertHandle) -> EdgeHandle {
        let mut searched = self.disk_next(e, v);
        while searched != e {
            if let Some(l) = self.edges[searched].l() {
                if self.radial_facevert_check(l, v) {
                    return searched;
                }
            }
            searched = self.disk_next(searched, v);
        }
        e
    }

    /// Returns the first loop at `v` found by walking the disk cycle of `v`
    /// starting at `e`. This re-derives a valid loop entry point from the
    /// cycles alone.
    pub(crate) fn disk_faceloop_find_first(&self, e: EdgeHandle, v: VertHandle) -> Option<LoopHandle> {
        let mut searched = e;
        loop {
            if let Some(l) = self.edges[searched].l() {
                if let Some(found) = self.radial_faceloop_find_first(l, v) {
                    return Some(found);
                }
            }
            searched = self.disk_next(searched, v);
            if searched == e {
                return None;
            }
        }
    }

    /// Number of face corners at `v`, i.e. the number of loops `l` with
    /// `l.v == v`.
    pub(crate) fn disk_facevert_count(&self, v: VertHandle) -> usize {
        let first = match self.verts[v].e.into_option() {
            Some(e) => e,
            None => return 0,
        };

        let mut count = 0;
        let mut e = first;
        loop {
            if let Some(l) = self.edges[e].l() {
                count += self.radial_facevert_count(l, v);
            }
            e = self.disk_next(e, v);
            if e == first {
                break;
            }
        }
        count
    }
}


// ===============================================================================================
// ===== Radial cycle
// ===============================================================================================

impl BMesh {
    /// Inserts `l` into the radial cycle of `e` and sets `l.e = e`. The loop
    /// becomes the new entry loop of `e`.
    pub(crate) fn radial_append(&mut self, e: EdgeHandle, l: LoopHandle) {
        debug_assert!(
            self.loops[l].e.is_invalid() || self.loops[l].e == e,
            "{:?} is already part of the radial cycle of another edge",
            l,
        );

        match self.edges[e].l.into_option() {
            None => {
                let lp = &mut self.loops[l];
                lp.radial_next = l;
                lp.radial_prev = l;
            }
            Some(first) => {
                let after = self.loops[first].radial_next;
                {
                    let lp = &mut self.loops[l];
                    lp.radial_prev = first;
                    lp.radial_next = after;
                }
                self.loops[after].radial_prev = l;
                self.loops[first].radial_next = l;
            }
        }

        self.edges[e].l = Opt::some(l);
        self.loops[l].e = e;
    }

    /// Removes `l` from the radial cycle of `e`. If `l` was the entry loop of
    /// `e`, the entry moves to the next loop (or is cleared). Afterwards `l`
    /// links to itself and has no edge.
    pub(crate) fn radial_remove(&mut self, e: EdgeHandle, l: LoopHandle) {
        let (next, prev) = {
            let lp = &self.loops[l];
            (lp.radial_next, lp.radial_prev)
        };

        if next != l {
            if self.edges[e].l.into_option() == Some(l) {
                self.edges[e].l = Opt::some(next);
            }
            self.loops[next].radial_prev = prev;
            self.loops[prev].radial_next = next;
        } else {
            debug_assert!(self.edges[e].l.into_option() == Some(l), "{:?} not in radial cycle of {:?}", l, e);
            self.edges[e].l = Opt::none();
        }

        let lp = &mut self.loops[l];
        lp.radial_next = l;
        lp.radial_prev = l;
        lp.e = EdgeHandle::invalid();
    }

    /// Number of loops in the radial cycle starting at `l`. Returns 0 for
    /// `None` (a wire edge).
    pub fn radial_length(&self, l: Option<LoopHandle>) -> usize {
        let first = match l {
            Some(l) => l,
            None => return 0,
        };

        let mut count = 0;
        let mut cur = first;
        loop {
            count += 1;
            cur = self.loops[cur].radial_next;
            if cur == first {
                break;
            }
        }
        count
    }

    /// Checks the radial cycle starting at `l`: it has to have exactly
    /// `len` loops, all of which use the same edge as `l`, and `radial_prev`
    /// has to be the inverse of `radial_next`.
    ///
    /// Never panics, even on broken cycles.
    pub fn radial_validate(&self, len: usize, l: LoopHandle) -> bool {
        let e = match self.loops.get(l) {
            Some(lp) => lp.e,
            None => return false,
        };

        let mut count = 0;
        let mut cur = l;
        loop {
            let lp = match self.loops.get(cur) {
                Some(lp) => lp,
                None => return false,
            };
            if lp.e != e {
                return false;
            }
            match self.loops.get(lp.radial_next) {
                Some(next) if next.radial_prev == cur => {}
                _ => return false,
            }

            count += 1;
            if count > len {
                return false;
            }

            cur = lp.radial_next;
            if cur == l {
                break;
            }
        }

        count == len
    }

    /// Returns `true` if any loop of the radial cycle of `l` is at `v`.
    pub(crate) fn radial_facevert_check(&self, l: LoopHandle, v: VertHandle) -> bool {
        self.radial_faceloop_find_first(l, v).is_some()
    }

    /// Number of loops in the radial cycle of `l` that are at `v`.
    pub(crate) fn radial_facevert_count(&self, l: LoopHandle, v: VertHandle) -> usize {
        let mut count = 0;
        let mut cur = l;
        loop {
            if self.loops[cur].v == v {
                count += 1;
            }
            cur = self.loops[cur].radial_next;
            if cur == l {
                break;
            }
        }
        count
    }

    /// The first loop at `v` in the radial cycle of `l`, starting with `l`
    /// itself.
    pub(crate) fn radial_faceloop_find_first(&self, l: LoopHandle, v: VertHandle) -> Option<LoopHandle> {
        let mut cur = l;
        loop {
            if self.loops[cur].v == v {
                return Some(cur);
            }
            cur = self.loops[cur].radial_next;
            if cur == l {
                return None;
            }
        }
    }

    /// The next loop at `v` in the radial cycle of `l`, after `l`. Returns
    /// `l` if there is no other one.
    pub(crate) fn radial_faceloop_find_next(&self, l: LoopHandle, v: VertHandle) -> LoopHandle {
        let mut cur = self.loops[l].radial_next;
        while cur != l {
            if self.loops[cur].v == v {
                return cur;
            }
            cur = self.loops[cur].radial_next;
        }
        l
    }
}


// ===============================================================================================
// ===== Loop cycle
// ===============================================================================================

impl BMesh {
    /// Checks the loop cycle of face `f`: starting at `f.l_first` it must
    /// have exactly `f.len` loops which all belong to `f`, and `prev` has to
    /// be the inverse of `next`.
    ///
    /// Never panics, even on broken cycles.
    pub fn loop_cycle_validate(&self, f: FaceHandle) -> bool {
        let face = match self.faces.get(f) {
            Some(face) => face,
            None => return false,
        };
        let len = face.len as usize;
        let first = face.l_first;

        let mut count = 0;
        let mut cur = first;
        loop {
            let lp = match self.loops.get(cur) {
                Some(lp) => lp,
                None => return false,
            };
            if lp.f != f {
                return false;
            }
            match self.loops.get(lp.next) {
                Some(next) if next.prev == cur => {}
                _ => return false,
            }

            count += 1;
            if count > len {
                return false;
            }

            cur = lp.next;
            if cur == first {
                break;
            }
        }

        count == len && len > 0
    }
}
