//! Iterating over elements related to another element.
//!
//! [`BMIter`] is a single iterator type that can walk any of the
//! relationships listed in [`IterKind`]. It is configured once, at
//! construction, with the relationship kind and the anchor element, and then
//! yields [`ElemHandle`]s. [`TypedIter`] wraps it for callers that know the
//! element type statically; the shortcut methods on [`BMesh`] (`verts()`,
//! `edges_of_vert(v)`, ...) return those.
//!
//! No iterator allocates. The walks follow the disk, radial and loop cycles
//! directly, so each step is O(1) amortized. The mesh is borrowed for the
//! lifetime of the iterator, so it cannot be changed while iterating.

use std::{fmt, marker::PhantomData};

use crate::{
    elem::{Edge, Face, Vert},
    error::{Error, Result},
    handle::{EdgeHandle, ElemHandle, ElemKind, FaceHandle, Handle, LoopHandle, VertHandle},
    mesh::BMesh,
    pool::Handles,
};

#[cfg(test)]
mod tests;


/// The relationships `BMIter` can walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IterKind {
    /// All vertices of the mesh, in pool order. No anchor.
    VertsOfMesh,
    /// All edges of the mesh, in pool order. No anchor.
    EdgesOfMesh,
    /// All faces of the mesh, in pool order. No anchor.
    FacesOfMesh,

    /// The disk cycle of a vertex.
    EdgesOfVert,
    /// All faces with a corner at a vertex. A face is yielded once per
    /// corner at the vertex.
    FacesOfVert,
    /// All loops at a vertex.
    LoopsOfVert,

    /// The two endpoints of an edge.
    VertsOfEdge,
    /// The faces in the radial cycle of an edge.
    FacesOfEdge,
    /// The loops in the radial cycle of an edge.
    LoopsOfEdge,

    /// The boundary vertices of a face.
    VertsOfFace,
    /// The boundary edges of a face.
    EdgesOfFace,
    /// The loops of a face.
    LoopsOfFace,

    /// The other loops in the radial cycle of a loop (excluding the loop
    /// itself).
    LoopsOfLoop,
}

impl IterKind {
    pub const ALL: [IterKind; 13] = [
        IterKind::VertsOfMesh,
        IterKind::EdgesOfMesh,
        IterKind::FacesOfMesh,
        IterKind::EdgesOfVert,
        IterKind::FacesOfVert,
        IterKind::LoopsOfVert,
        IterKind::VertsOfEdge,
        IterKind::FacesOfEdge,
        IterKind::LoopsOfEdge,
        IterKind::VertsOfFace,
        IterKind::EdgesOfFace,
        IterKind::LoopsOfFace,
        IterKind::LoopsOfLoop,
    ];

    /// The kind of anchor element required, or `None` for the `*OfMesh`
    /// kinds, which take no anchor.
    pub fn anchor_kind(self) -> Option<ElemKind> {
        use self::IterKind::*;

        match self {
            VertsOfMesh | EdgesOfMesh | FacesOfMesh => None,
            EdgesOfVert | FacesOfVert | LoopsOfVert => Some(ElemKind::Vert),
            VertsOfEdge | FacesOfEdge | LoopsOfEdge => Some(ElemKind::Edge),
            VertsOfFace | EdgesOfFace | LoopsOfFace => Some(ElemKind::Face),
            LoopsOfLoop => Some(ElemKind::Loop),
        }
    }

    /// The kind of the yielded elements.
    pub fn item_kind(self) -> ElemKind {
        use self::IterKind::*;

        match self {
            VertsOfMesh | VertsOfEdge | VertsOfFace => ElemKind::Vert,
            EdgesOfMesh | EdgesOfVert | EdgesOfFace => ElemKind::Edge,
            FacesOfMesh | FacesOfVert | FacesOfEdge => ElemKind::Face,
            LoopsOfVert | LoopsOfEdge | LoopsOfFace | LoopsOfLoop => ElemKind::Loop,
        }
    }
}


/// The stepping strategy of a `BMIter`. Each variant only stores handles
/// into the cycle it walks.
#[derive(Clone)]
enum Step<'a> {
    Verts(Handles<'a, VertHandle, Vert>),
    Edges(Handles<'a, EdgeHandle, Edge>),
    Faces(Handles<'a, FaceHandle, Face>),

    /// Walks a disk cycle.
    Disk {
        v: VertHandle,
        first: EdgeHandle,
        next: Option<EdgeHandle>,
    },

    /// Walks all loops at `v`: for each edge of the disk cycle, the loops of
    /// its radial cycle that are at `v`. `count` is the number of loops left.
    VertLoops {
        v: VertHandle,
        count: usize,
        e_next: EdgeHandle,
        l_first: LoopHandle,
        l_next: Option<LoopHandle>,
    },

    /// Two endpoints; `pos` is the next one to yield.
    EdgeVerts {
        verts: [VertHandle; 2],
        pos: usize,
    },

    /// Walks a radial cycle, stopping when `stop` is reached again.
    Radial {
        stop: LoopHandle,
        next: Option<LoopHandle>,
    },

    /// Walks a face boundary.
    Boundary {
        first: LoopHandle,
        next: Option<LoopHandle>,
    },

    Empty,
}

/// Iterator over the elements related to an anchor element. See the module
/// documentation.
///
/// Once exhausted, it stays exhausted; it cannot be restarted.
#[derive(Clone)]
pub struct BMIter<'a> {
    mesh: &'a BMesh,
    kind: IterKind,
    step: Step<'a>,
}

impl<'a> BMIter<'a> {
    /// Creates an iterator of kind `kind` anchored at `anchor`.
    ///
    /// Returns `Err(WrongAnchor)` if `anchor` is not of the kind the
    /// relationship requires (or present for a `*OfMesh` kind), and
    /// `Err(StaleHandle)` if it is not a live element.
    pub fn new(mesh: &'a BMesh, kind: IterKind, anchor: Option<ElemHandle>) -> Result<Self> {
        if anchor.map(|a| a.kind()) != kind.anchor_kind() {
            return Err(Error::WrongAnchor { kind, anchor });
        }
        if let Some(a) = anchor {
            mesh.check(a)?;
        }

        let step = match (kind, anchor) {
            (IterKind::VertsOfMesh, None) => Step::Verts(mesh.verts.handles()),
            (IterKind::EdgesOfMesh, None) => Step::Edges(mesh.edges.handles()),
            (IterKind::FacesOfMesh, None) => Step::Faces(mesh.faces.handles()),

            (IterKind::EdgesOfVert, Some(ElemHandle::Vert(v))) => Self::disk(mesh, v),
            (IterKind::FacesOfVert, Some(ElemHandle::Vert(v)))
            | (IterKind::LoopsOfVert, Some(ElemHandle::Vert(v))) => Self::vert_loops(mesh, v),

            (IterKind::VertsOfEdge, Some(ElemHandle::Edge(e))) => {
                Step::EdgeVerts { verts: mesh[e].verts(), pos: 0 }
            }
            (IterKind::FacesOfEdge, Some(ElemHandle::Edge(e)))
            | (IterKind::LoopsOfEdge, Some(ElemHandle::Edge(e))) => {
                match mesh[e].l() {
                    Some(l) => Step::Radial { stop: l, next: Some(l) },
                    None => Step::Empty,
                }
            }

            (IterKind::VertsOfFace, Some(ElemHandle::Face(f)))
            | (IterKind::EdgesOfFace, Some(ElemHandle::Face(f)))
            | (IterKind::LoopsOfFace, Some(ElemHandle::Face(f))) => {
                let first = mesh[f].l_first();
                Step::Boundary { first, next: Some(first) }
            }

            (IterKind::LoopsOfLoop, Some(ElemHandle::Loop(l))) => {
                let next = mesh[l].radial_next();
                if next == l {
                    Step::Empty
                } else {
                    Step::Radial { stop: l, next: Some(next) }
                }
            }

            // Excluded by the anchor kind check above.
            _ => return Err(Error::WrongAnchor { kind, anchor }),
        };

        Ok(Self { mesh, kind, step })
    }

    fn disk(mesh: &BMesh, v: VertHandle) -> Step<'a> {
        match mesh[v].e() {
            Some(first) => Step::Disk { v, first, next: Some(first) },
            None => Step::Empty,
        }
    }

    fn vert_loops(mesh: &BMesh, v: VertHandle) -> Step<'a> {
        let e = match mesh[v].e() {
            Some(e) => e,
            None => return Step::Empty,
        };
        let count = mesh.disk_facevert_count(v);
        if count == 0 {
            return Step::Empty;
        }

        match mesh.disk_faceloop_find_first(e, v) {
            Some(l_first) => Step::VertLoops {
                v,
                count,
                e_next: mesh[l_first].e(),
                l_first,
                l_next: Some(l_first),
            },
            None => Step::Empty,
        }
    }

    pub fn kind(&self) -> IterKind {
        self.kind
    }

    /// Advances the strategy and returns the next element as the raw item of
    /// the walk (before mapping loops to their vertex/edge/face).
    fn step(&mut self) -> Option<ElemHandle> {
        let mesh = self.mesh;
        match &mut self.step {
            Step::Verts(it) => it.next().map(ElemHandle::from),
            Step::Edges(it) => it.next().map(ElemHandle::from),
            Step::Faces(it) => it.next().map(ElemHandle::from),

            Step::Disk { v, first, next } => {
                let cur = (*next)?;
                let n = mesh.disk_next(cur, *v);
                *next = if n == *first { None } else { Some(n) };
                Some(cur.into())
            }

            Step::VertLoops { v, count, e_next, l_first, l_next } => {
                let cur = (*l_next)?;
                *count -= 1;
                if *count == 0 {
                    *l_next = None;
                } else {
                    let mut n = mesh.radial_faceloop_find_next(cur, *v);
                    if n == *l_first {
                        *e_next = mesh.disk_faceedge_find_next(*e_next, *v);
                        n = mesh[*e_next].l()
                            .and_then(|l| mesh.radial_faceloop_find_first(l, *v))
                            .unwrap_or(n);
                        *l_first = n;
                    }
                    *l_next = Some(n);
                }
                Some(cur.into())
            }

            Step::EdgeVerts { verts, pos } => {
                let out = verts.get(*pos).cloned();
                *pos += 1;
                out.map(ElemHandle::from)
            }

            Step::Radial { stop, next } => {
                let cur = (*next)?;
                let n = mesh[cur].radial_next();
                *next = if n == *stop { None } else { Some(n) };
                Some(cur.into())
            }

            Step::Boundary { first, next } => {
                let cur = (*next)?;
                let n = mesh[cur].next();
                *next = if n == *first { None } else { Some(n) };
                Some(cur.into())
            }

            Step::Empty => None,
        }
    }

    /// Number of elements left, without consuming the iterator. O(n) in the
    /// length of the walk for most kinds.
    fn remaining(&self) -> usize {
        match &self.step {
            Step::Verts(it) => it.len(),
            Step::Edges(it) => it.len(),
            Step::Faces(it) => it.len(),
            Step::VertLoops { count, l_next, .. } => if l_next.is_some() { *count } else { 0 },
            Step::EdgeVerts { pos, .. } => 2usize.saturating_sub(*pos),
            Step::Empty => 0,
            _ => self.clone().count(),
        }
    }
}

impl Iterator for BMIter<'_> {
    type Item = ElemHandle;

    fn next(&mut self) -> Option<Self::Item> {
        let raw = self.step()?;
        let mesh = self.mesh;

        let loop_of = |h: ElemHandle| h.loop_().map(|l| &mesh[l]);
        match self.kind {
            IterKind::FacesOfVert | IterKind::FacesOfEdge => loop_of(raw).map(|l| l.f().into()),
            IterKind::VertsOfFace => loop_of(raw).map(|l| l.v().into()),
            IterKind::EdgesOfFace => loop_of(raw).map(|l| l.e().into()),
            _ => Some(raw),
        }
    }
}

impl fmt::Debug for BMIter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("BMIter")
            .field("kind", &self.kind)
            .finish()
    }
}


/// A `BMIter` that yields handles of a statically known type.
#[derive(Clone, Debug)]
pub struct TypedIter<'a, H: Handle> {
    inner: BMIter<'a>,
    _dummy: PhantomData<H>,
}

impl<'a, H: Handle> TypedIter<'a, H> {
    /// Creates the typed iterator. Returns `Err(WrongAnchor)` if `kind` does
    /// not yield elements of type `H`.
    pub fn new(mesh: &'a BMesh, kind: IterKind, anchor: Option<ElemHandle>) -> Result<Self> {
        if kind.item_kind() != H::KIND {
            return Err(Error::WrongAnchor { kind, anchor });
        }

        Ok(Self {
            inner: BMIter::new(mesh, kind, anchor)?,
            _dummy: PhantomData,
        })
    }

    /// Iterator with an anchor that was checked by the caller.
    fn checked(mesh: &'a BMesh, kind: IterKind, anchor: Option<ElemHandle>) -> Self {
        debug_assert_eq!(kind.item_kind(), H::KIND);
        let inner = match BMIter::new(mesh, kind, anchor) {
            Ok(it) => it,
            Err(e) => panic!("cannot iterate {:?}: {}", kind, e),
        };

        Self { inner, _dummy: PhantomData }
    }

    pub fn into_inner(self) -> BMIter<'a> {
        self.inner
    }
}

impl<H: Handle> Iterator for TypedIter<'_, H> {
    type Item = H;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().and_then(H::from_elem)
    }
}


// ===============================================================================================
// ===== Shortcuts and bulk helpers on `BMesh`
// ===============================================================================================

/// Generates the shortcut methods. They panic if the anchor is stale, like
/// indexing the mesh does.
macro_rules! shortcuts {
    ($( $(#[$attr:meta])* $name:ident($($anchor:ident: $anchor_ty:ty)?) -> $item:ty = $kind:ident; )*) => {
        impl BMesh {
            $(
                $(#[$attr])*
                pub fn $name(&self $(, $anchor: $anchor_ty)?) -> TypedIter<'_, $item> {
                    let anchor: Option<ElemHandle> = None $( .or(Some($anchor.into())) )?;
                    TypedIter::checked(self, IterKind::$kind, anchor)
                }
            )*
        }
    };
}

shortcuts! {
    /// All vertices in pool order.
    verts() -> VertHandle = VertsOfMesh;
    /// All edges in pool order.
    edges() -> EdgeHandle = EdgesOfMesh;
    /// All faces in pool order.
    faces() -> FaceHandle = FacesOfMesh;
    edges_of_vert(v: VertHandle) -> EdgeHandle = EdgesOfVert;
    faces_of_vert(v: VertHandle) -> FaceHandle = FacesOfVert;
    loops_of_vert(v: VertHandle) -> LoopHandle = LoopsOfVert;
    verts_of_edge(e: EdgeHandle) -> VertHandle = VertsOfEdge;
    faces_of_edge(e: EdgeHandle) -> FaceHandle = FacesOfEdge;
    loops_of_edge(e: EdgeHandle) -> LoopHandle = LoopsOfEdge;
    verts_of_face(f: FaceHandle) -> VertHandle = VertsOfFace;
    edges_of_face(f: FaceHandle) -> EdgeHandle = EdgesOfFace;
    loops_of_face(f: FaceHandle) -> LoopHandle = LoopsOfFace;
    /// The other loops in the radial cycle of `l`.
    loops_of_loop(l: LoopHandle) -> LoopHandle = LoopsOfLoop;
}

impl BMesh {
    /// Creates a `BMIter`. See [`BMIter::new`].
    pub fn iter(&self, kind: IterKind, anchor: Option<ElemHandle>) -> Result<BMIter<'_>> {
        BMIter::new(self, kind, anchor)
    }

    /// Number of elements the iterator of kind `kind` at `anchor` yields.
    /// For most kinds this is computed without walking the iterator itself.
    pub fn iter_elem_count(&self, kind: IterKind, anchor: Option<ElemHandle>) -> Result<usize> {
        let it = BMIter::new(self, kind, anchor)?;

        let count = match (kind, anchor) {
            (IterKind::VertsOfMesh, _) => self.num_verts() as usize,
            (IterKind::EdgesOfMesh, _) => self.num_edges() as usize,
            (IterKind::FacesOfMesh, _) => self.num_faces() as usize,
            (IterKind::EdgesOfVert, Some(ElemHandle::Vert(v))) => self.disk_count(v),
            (IterKind::VertsOfEdge, _) => 2,
            (IterKind::FacesOfEdge, Some(ElemHandle::Edge(e)))
            | (IterKind::LoopsOfEdge, Some(ElemHandle::Edge(e))) => self.radial_length(self[e].l()),
            (IterKind::VertsOfFace, Some(ElemHandle::Face(f)))
            | (IterKind::EdgesOfFace, Some(ElemHandle::Face(f)))
            | (IterKind::LoopsOfFace, Some(ElemHandle::Face(f))) => self[f].len() as usize,
            (IterKind::LoopsOfLoop, Some(ElemHandle::Loop(l))) => {
                self.radial_length(Some(l)) - 1
            }
            _ => it.remaining(),
        };

        Ok(count)
    }

    /// Writes the elements of the iterator into `out`, stopping when `out`
    /// is full. Returns the number of elements written.
    pub fn iter_as_slice(
        &self,
        kind: IterKind,
        anchor: Option<ElemHandle>,
        out: &mut [ElemHandle],
    ) -> Result<usize> {
        let it = BMIter::new(self, kind, anchor)?;
        let mut written = 0;
        for (slot, h) in out.iter_mut().zip(it) {
            *slot = h;
            written += 1;
        }
        Ok(written)
    }

    /// Collects the elements of the iterator into a vector allocated with the
    /// exact size.
    pub fn iter_as_vec(&self, kind: IterKind, anchor: Option<ElemHandle>) -> Result<Vec<ElemHandle>> {
        let count = self.iter_elem_count(kind, anchor)?;
        let mut out = Vec::with_capacity(count);
        out.extend(BMIter::new(self, kind, anchor)?);
        Ok(out)
    }

    /// Evaluates `filter` for each element of the iterator and stores the
    /// result in `bitmap`, indexed by iteration position. `bitmap` is
    /// resized to the number of elements. Returns the number of elements for
    /// which `filter` returned `true`.
    pub fn iter_bitmap_from_filter(
        &self,
        kind: IterKind,
        anchor: Option<ElemHandle>,
        bitmap: &mut Vec<bool>,
        mut filter: impl FnMut(&BMesh, ElemHandle) -> bool,
    ) -> Result<usize> {
        let count = self.iter_elem_count(kind, anchor)?;
        bitmap.clear();
        bitmap.reserve(count);

        let mut hits = 0;
        for h in BMIter::new(self, kind, anchor)? {
            let hit = filter(self, h);
            if hit {
                hits += 1;
            }
            bitmap.push(hit);
        }

        Ok(hits)
    }
}
