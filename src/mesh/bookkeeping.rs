//! Element indices and lookup tables.
//!
//! Both are derived data: every create/kill operation marks them dirty for
//! the affected element kind and they are only rebuilt on request.
//! Vertices, edges and faces are numbered in pool order. Loops are numbered
//! face by face (faces in pool order), each face starting at its first loop.

use log::debug;

use crate::{
    flags::ElemMask,
    handle::{hsize, EdgeHandle, ElemHandle, ElemKind, FaceHandle, Handle, LoopHandle, VertHandle},
};
use super::BMesh;


impl BMesh {
    /// Marks indices and tables of the kinds in `mask` as out of date.
    pub fn mark_dirty(&mut self, mask: ElemMask) {
        self.elem_index_dirty |= mask;
        self.elem_table_dirty |= mask;
    }

    /// Marks the indices of the kinds in `mask` as out of date. Call this
    /// after using `Header::index` for something else.
    pub fn mark_index_dirty(&mut self, mask: ElemMask) {
        self.elem_index_dirty |= mask;
    }

    pub fn mark_table_dirty(&mut self, mask: ElemMask) {
        self.elem_table_dirty |= mask;
    }

    /// The kinds whose indices are out of date.
    pub fn index_dirty(&self) -> ElemMask {
        self.elem_index_dirty
    }

    /// The kinds whose lookup tables are out of date.
    pub fn table_dirty(&self) -> ElemMask {
        self.elem_table_dirty
    }

    /// The index of `h`, if the indices of its kind are up to date.
    pub fn elem_index(&self, h: impl Into<ElemHandle>) -> Option<hsize> {
        let h = h.into();
        if self.elem_index_dirty.has(h.kind()) {
            return None;
        }
        self.header(h).and_then(|head| head.index())
    }


    // ===== Indices ============================================================================

    /// Assigns the indices `0..n` to all elements of each kind in `mask`
    /// whose indices are out of date or were assigned with an offset.
    pub fn ensure_indices(&mut self, mask: ElemMask) {
        let mut offsets = [0; 4];
        self.ensure_indices_ex(mask, &mut offsets);
    }

    /// Like `ensure_indices`, but numbering starts at `offsets[kind.slot()]`
    /// for each kind. Each offset is advanced by the number of elements of
    /// its kind, so that the elements of several meshes can be numbered in
    /// one scheme by passing the same array to each mesh.
    ///
    /// A kind is renumbered if its indices are dirty or start at another
    /// value than the requested offset. Afterwards its indices are clean and
    /// `elem_index` returns them.
    pub fn ensure_indices_ex(&mut self, mask: ElemMask, offsets: &mut [hsize; 4]) {
        for kind in mask.kinds() {
            let slot = kind.slot();
            let offset = offsets[slot];
            if self.elem_index_dirty.has(kind) || self.elem_index_start[slot] != offset {
                let count = self.assign_indices(kind, offset);
                debug_assert_eq!(count, self.num_elems(kind));
                debug!("assigned {} {} indices starting at {}", count, kind, offset);

                self.elem_index_start[slot] = offset;
                self.elem_index_dirty.remove(kind.into());
            }

            offsets[slot] += self.num_elems(kind);
        }
    }

    /// The first index of the current numbering of `kind`. Only meaningful
    /// while the indices of `kind` are clean.
    pub fn index_start(&self, kind: ElemKind) -> hsize {
        self.elem_index_start[kind.slot()]
    }

    /// Numbers all elements of `kind` starting at `start`. Returns the number
    /// of elements.
    fn assign_indices(&mut self, kind: ElemKind, start: hsize) -> hsize {
        let mut i = start;
        match kind {
            ElemKind::Vert => {
                for vert in self.verts.values_mut() {
                    vert.head.index = i;
                    i += 1;
                }
            }
            ElemKind::Edge => {
                for edge in self.edges.values_mut() {
                    edge.head.index = i;
                    i += 1;
                }
            }
            ElemKind::Loop => {
                for f in self.faces.handles() {
                    let first = self.faces[f].l_first;
                    let mut l = first;
                    loop {
                        self.loops[l].head.index = i;
                        i += 1;
                        l = self.loops[l].next;
                        if l == first {
                            break;
                        }
                    }
                }
            }
            ElemKind::Face => {
                for face in self.faces.values_mut() {
                    face.head.index = i;
                    i += 1;
                }
            }
        }

        i - start
    }

    /// Returns the kinds in `mask` whose indices are marked clean but do not
    /// match a fresh numbering from `index_start(kind)`.
    pub fn validate_indices(&self, mask: ElemMask) -> ElemMask {
        let mut out = ElemMask::empty();
        for kind in mask.kinds() {
            if self.elem_index_dirty.has(kind) {
                continue;
            }

            let start = self.index_start(kind);
            let ok = match kind {
                ElemKind::Vert => indices_sequential(start, self.verts.iter().map(|(_, x)| x.head.index)),
                ElemKind::Edge => indices_sequential(start, self.edges.iter().map(|(_, x)| x.head.index)),
                ElemKind::Loop => indices_sequential(
                    start,
                    self.loops_in_face_order().map(|l| self.loops[l].head.index),
                ),
                ElemKind::Face => indices_sequential(start, self.faces.iter().map(|(_, x)| x.head.index)),
            };
            if !ok {
                out.insert(kind.into());
            }
        }

        out
    }

    /// All loops of the mesh in the order they are numbered in.
    pub(crate) fn loops_in_face_order(&self) -> impl Iterator<Item = LoopHandle> + '_ {
        self.faces.handles().flat_map(move |f| FaceLoopWalk::new(self, f))
    }


    // ===== Tables =============================================================================

    /// Rebuilds the lookup tables (index to handle) of all kinds in `mask`
    /// that are out of date. A table is reused if its capacity is between
    /// the element count and twice the element count.
    pub fn ensure_tables(&mut self, mask: ElemMask) {
        let needed = mask & self.elem_table_dirty;
        if needed.is_empty() {
            return;
        }

        if needed.has(ElemKind::Vert) {
            prepare_table(&mut self.vtable, self.verts.len());
            self.vtable.extend(self.verts.handles());
        }
        if needed.has(ElemKind::Edge) {
            prepare_table(&mut self.etable, self.edges.len());
            self.etable.extend(self.edges.handles());
        }
        if needed.has(ElemKind::Loop) {
            let mut table = std::mem::replace(&mut self.ltable, Vec::new());
            prepare_table(&mut table, self.loops.len());
            table.extend(self.loops_in_face_order());
            self.ltable = table;
        }
        if needed.has(ElemKind::Face) {
            prepare_table(&mut self.ftable, self.faces.len());
            self.ftable.extend(self.faces.handles());
        }

        debug!("rebuilt lookup tables for {:?}", needed);
        self.elem_table_dirty.remove(needed);
    }

    /// Returns the kinds in `mask` whose tables are marked clean but differ
    /// from a fresh walk over the mesh. This catches code that changed the
    /// mesh without marking the tables dirty.
    pub fn check_tables(&self, mask: ElemMask) -> ElemMask {
        let mut out = ElemMask::empty();
        for kind in mask.kinds() {
            if self.elem_table_dirty.has(kind) {
                continue;
            }

            let ok = match kind {
                ElemKind::Vert => self.vtable.iter().cloned().eq(self.verts.handles()),
                ElemKind::Edge => self.etable.iter().cloned().eq(self.edges.handles()),
                ElemKind::Loop => self.ltable.iter().cloned().eq(self.loops_in_face_order()),
                ElemKind::Face => self.ftable.iter().cloned().eq(self.faces.handles()),
            };
            if !ok {
                out.insert(kind.into());
            }
        }

        out
    }

    /// Looks up the vertex with index `i` in the table. The table has to be
    /// up to date (see `ensure_tables`).
    pub fn vert_at_index(&self, i: hsize) -> Option<VertHandle> {
        debug_assert!(!self.elem_table_dirty.has(ElemKind::Vert), "vertex table is dirty");
        self.vtable.get(i as usize).cloned()
    }

    pub fn edge_at_index(&self, i: hsize) -> Option<EdgeHandle> {
        debug_assert!(!self.elem_table_dirty.has(ElemKind::Edge), "edge table is dirty");
        self.etable.get(i as usize).cloned()
    }

    pub fn loop_at_index(&self, i: hsize) -> Option<LoopHandle> {
        debug_assert!(!self.elem_table_dirty.has(ElemKind::Loop), "loop table is dirty");
        self.ltable.get(i as usize).cloned()
    }

    pub fn face_at_index(&self, i: hsize) -> Option<FaceHandle> {
        debug_assert!(!self.elem_table_dirty.has(ElemKind::Face), "face table is dirty");
        self.ftable.get(i as usize).cloned()
    }

    /// Returns the `i`-th vertex in pool order without using the table.
    /// O(n).
    pub fn vert_at_index_find(&self, i: hsize) -> Option<VertHandle> {
        self.verts.handles().nth(i as usize)
    }

    pub fn edge_at_index_find(&self, i: hsize) -> Option<EdgeHandle> {
        self.edges.handles().nth(i as usize)
    }

    pub fn loop_at_index_find(&self, i: hsize) -> Option<LoopHandle> {
        self.loops_in_face_order().nth(i as usize)
    }

    pub fn face_at_index_find(&self, i: hsize) -> Option<FaceHandle> {
        self.faces.handles().nth(i as usize)
    }
}

/// Empties `table` and makes sure it can hold `len` elements. The old
/// allocation is kept if it is at most twice as large as needed.
fn prepare_table<H: Handle>(table: &mut Vec<H>, len: hsize) {
    let len = len as usize;
    table.clear();
    if table.capacity() < len || table.capacity() / 2 > len {
        *table = Vec::with_capacity(len);
    }
}

fn indices_sequential(start: hsize, indices: impl Iterator<Item = hsize>) -> bool {
    indices.enumerate().all(|(i, index)| start + i as hsize == index)
}


/// Walks the loop cycle of a face once, starting at its first loop.
pub(crate) struct FaceLoopWalk<'a> {
    mesh: &'a BMesh,
    first: LoopHandle,
    next: Option<LoopHandle>,
}

impl<'a> FaceLoopWalk<'a> {
    pub(crate) fn new(mesh: &'a BMesh, f: FaceHandle) -> Self {
        let first = mesh.faces[f].l_first;
        Self { mesh, first, next: Some(first) }
    }
}

impl Iterator for FaceLoopWalk<'_> {
    type Item = LoopHandle;

    fn next(&mut self) -> Option<Self::Item> {
        let cur = self.next?;
        let next = self.mesh.loops[cur].next;
        self.next = if next == self.first { None } else { Some(next) };
        Some(cur)
    }
}
