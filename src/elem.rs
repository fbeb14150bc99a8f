//! The element records stored in the pools of a [`BMesh`][crate::BMesh].
//!
//! Elements refer to each other only via handles. None of these references
//! is ownership: the mesh owns all elements through its pools and elements
//! are only ever freed by the explicit kill operations.

use std::fmt;

use cgmath::{Point3, Vector3};
use num_traits::Zero;
use optional::Optioned as Opt;

use crate::{
    customdata::AttrBlock,
    flags::ElemFlags,
    handle::{hsize, EdgeHandle, FaceHandle, Handle, LoopHandle, VertHandle},
};


/// Value of `Header::index` if the element has not been indexed yet.
pub const INDEX_INVALID: hsize = hsize::max_value();


/// Data shared by all four element kinds.
#[derive(Clone, PartialEq)]
pub struct Header {
    /// Generic flags (selection, visibility, drawing hints).
    pub flag: ElemFlags,

    /// The element index. Only meaningful while the index dirty bit of the
    /// element kind is clear (see `BMesh::ensure_indices`). Callers may use
    /// it as scratch space, which is why it is public; doing so must be
    /// followed by `BMesh::mark_index_dirty`.
    pub index: hsize,

    /// Attribute values of this element.
    pub data: AttrBlock,
}

impl Header {
    pub(crate) fn new() -> Self {
        Self {
            flag: ElemFlags::empty(),
            index: INDEX_INVALID,
            data: AttrBlock::default(),
        }
    }

    /// The index, if it was ever assigned.
    pub fn index(&self) -> Option<hsize> {
        if self.index == INDEX_INVALID {
            None
        } else {
            Some(self.index)
        }
    }
}

impl fmt::Debug for Header {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?} #", self.flag)?;
        match self.index() {
            Some(i) => write!(f, "{}", i)?,
            None => write!(f, "-")?,
        }
        if !self.data.is_empty() {
            write!(f, " {:?}", self.data)?;
        }
        Ok(())
    }
}


// ===============================================================================================
// ===== Vert
// ===============================================================================================

/// A vertex.
#[derive(Clone, Debug)]
pub struct Vert {
    pub head: Header,
    pub co: Point3<f32>,
    pub no: Vector3<f32>,

    /// One edge of the vertex' disk cycle, `None` if the vertex is isolated.
    pub(crate) e: Opt<EdgeHandle>,
}

impl Vert {
    pub(crate) fn new(co: Point3<f32>) -> Self {
        Self {
            head: Header::new(),
            co,
            no: Vector3::zero(),
            e: Opt::none(),
        }
    }

    /// Entry point into the disk cycle of this vertex.
    pub fn e(&self) -> Option<EdgeHandle> {
        self.e.into_option()
    }
}


// ===============================================================================================
// ===== Edge
// ===============================================================================================

/// The links of an edge in the disk cycle of one of its endpoints.
#[derive(Clone, Copy)]
pub struct DiskLink {
    pub(crate) next: Opt<EdgeHandle>,
    pub(crate) prev: Opt<EdgeHandle>,
}

impl DiskLink {
    pub(crate) fn unlinked() -> Self {
        Self {
            next: Opt::none(),
            prev: Opt::none(),
        }
    }

    pub fn next(&self) -> Option<EdgeHandle> {
        self.next.into_option()
    }

    pub fn prev(&self) -> Option<EdgeHandle> {
        self.prev.into_option()
    }

    pub fn is_linked(&self) -> bool {
        self.next.is_some() && self.prev.is_some()
    }
}

impl fmt::Debug for DiskLink {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?} <-> {:?}", self.prev, self.next)
    }
}

/// An edge between two vertices.
///
/// The order of `v1` and `v2` has no topological meaning, but operations
/// never swap them.
#[derive(Clone, Debug)]
pub struct Edge {
    pub head: Header,
    pub(crate) v1: VertHandle,
    pub(crate) v2: VertHandle,

    /// One loop of the radial cycle, `None` for wire edges.
    pub(crate) l: Opt<LoopHandle>,

    /// Link in the disk cycle of `v1`.
    pub(crate) v1_disk: DiskLink,
    /// Link in the disk cycle of `v2`.
    pub(crate) v2_disk: DiskLink,
}

impl Edge {
    pub(crate) fn new(v1: VertHandle, v2: VertHandle) -> Self {
        Self {
            head: Header::new(),
            v1,
            v2,
            l: Opt::none(),
            v1_disk: DiskLink::unlinked(),
            v2_disk: DiskLink::unlinked(),
        }
    }

    pub fn v1(&self) -> VertHandle {
        self.v1
    }

    pub fn v2(&self) -> VertHandle {
        self.v2
    }

    pub fn verts(&self) -> [VertHandle; 2] {
        [self.v1, self.v2]
    }

    /// Entry point into the radial cycle of this edge.
    pub fn l(&self) -> Option<LoopHandle> {
        self.l.into_option()
    }

    pub fn has_vert(&self, v: VertHandle) -> bool {
        self.v1 == v || self.v2 == v
    }

    /// The endpoint that is not `v`. Returns `None` if `v` is not an endpoint.
    pub fn other_vert(&self, v: VertHandle) -> Option<VertHandle> {
        if self.v1 == v {
            Some(self.v2)
        } else if self.v2 == v {
            Some(self.v1)
        } else {
            None
        }
    }

    /// The disk link of this edge in the cycle anchored at `v`. Returns `None`
    /// if `v` is not an endpoint.
    pub fn disk_link(&self, v: VertHandle) -> Option<&DiskLink> {
        if self.v1 == v {
            Some(&self.v1_disk)
        } else if self.v2 == v {
            Some(&self.v2_disk)
        } else {
            None
        }
    }

    #[cfg(test)]
    pub(crate) fn disk_link_mut(&mut self, v: VertHandle) -> Option<&mut DiskLink> {
        if self.v1 == v {
            Some(&mut self.v1_disk)
        } else if self.v2 == v {
            Some(&mut self.v2_disk)
        } else {
            None
        }
    }
}


// ===============================================================================================
// ===== Loop
// ===============================================================================================

/// A face corner.
///
/// Loops are always part of exactly one face. Right after allocation all
/// cycle links of a loop point to the loop itself.
#[derive(Clone, Debug)]
pub struct Loop {
    pub head: Header,

    /// The vertex at this corner.
    pub(crate) v: VertHandle,
    /// The edge from `v` to the vertex of `next`. Invalid only while the loop
    /// is not part of a radial cycle.
    pub(crate) e: EdgeHandle,
    pub(crate) f: FaceHandle,

    pub(crate) next: LoopHandle,
    pub(crate) prev: LoopHandle,
    pub(crate) radial_next: LoopHandle,
    pub(crate) radial_prev: LoopHandle,
}

impl Loop {
    pub(crate) fn new(me: LoopHandle, v: VertHandle, e: EdgeHandle, f: FaceHandle) -> Self {
        Self {
            head: Header::new(),
            v,
            e,
            f,
            next: me,
            prev: me,
            radial_next: me,
            radial_prev: me,
        }
    }

    pub fn v(&self) -> VertHandle {
        self.v
    }

    pub fn e(&self) -> EdgeHandle {
        self.e
    }

    pub fn f(&self) -> FaceHandle {
        self.f
    }

    pub fn next(&self) -> LoopHandle {
        self.next
    }

    pub fn prev(&self) -> LoopHandle {
        self.prev
    }

    pub fn radial_next(&self) -> LoopHandle {
        self.radial_next
    }

    pub fn radial_prev(&self) -> LoopHandle {
        self.radial_prev
    }
}


// ===============================================================================================
// ===== Face
// ===============================================================================================

/// A face, bounded by a cycle of loops.
#[derive(Clone, Debug)]
pub struct Face {
    pub head: Header,

    /// Any loop of the boundary.
    pub(crate) l_first: LoopHandle,
    pub(crate) len: hsize,

    /// The cached face normal. Updated by `BMesh::face_normal_update`.
    pub no: Vector3<f32>,
    pub mat_nr: i16,
}

impl Face {
    pub(crate) fn new() -> Self {
        Self {
            head: Header::new(),
            l_first: LoopHandle::invalid(),
            len: 0,
            no: Vector3::zero(),
            mat_nr: 0,
        }
    }

    pub fn l_first(&self) -> LoopHandle {
        self.l_first
    }

    /// Number of corners (and edges) of this face.
    pub fn len(&self) -> hsize {
        self.len
    }
}
