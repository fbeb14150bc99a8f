//! Handles to refer to elements of a [`BMesh`][crate::BMesh].
//!
//! A handle is an index into one of the mesh's element pools together with
//! the generation of the pool slot at the time the element was allocated.
//! When an element is killed, the generation of its slot is bumped. A handle
//! to a killed element thus never refers to a different element that later
//! reuses the same slot: the mesh simply reports the handle as stale.
//!
//! Each handle type implements `optional::Noned`, so `Optioned<H>` has the
//! same size as `H`. The elements use this for all their "entry point"
//! references (e.g. `Vert::e`), which may legitimately be absent.

use std::{fmt, hash::Hash};

use derive_more::From;
use optional::{Noned, OptEq};
use static_assertions::assert_eq_size;


/// The integer type used as index in handles.
///
/// By default, this is `u32`. With the feature `large-handle` it is `u64`
/// instead.
#[cfg(not(feature = "large-handle"))]
#[allow(non_camel_case_types)]
pub type hsize = u32;

/// The integer type used as index in handles.
#[cfg(feature = "large-handle")]
#[allow(non_camel_case_types)]
pub type hsize = u64;

/// Generation counter of a pool slot.
pub type Generation = u32;


/// The four kinds of elements stored in a mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ElemKind {
    Vert,
    Edge,
    Loop,
    Face,
}

impl ElemKind {
    /// All kinds, in the order used by per-kind arrays (e.g. the offsets of
    /// `BMesh::ensure_indices_ex`).
    pub const ALL: [ElemKind; 4] = [ElemKind::Vert, ElemKind::Edge, ElemKind::Loop, ElemKind::Face];

    /// Position of this kind in per-kind arrays.
    pub fn slot(self) -> usize {
        match self {
            ElemKind::Vert => 0,
            ElemKind::Edge => 1,
            ElemKind::Loop => 2,
            ElemKind::Face => 3,
        }
    }
}

impl fmt::Display for ElemKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            ElemKind::Vert => "vertex",
            ElemKind::Edge => "edge",
            ElemKind::Loop => "loop",
            ElemKind::Face => "face",
        };
        s.fmt(f)
    }
}


/// Types that can be used as handle to an element of a mesh.
pub trait Handle: 'static + Copy + fmt::Debug + Eq + Hash + Ord + Noned + OptEq {
    /// The kind of element this handle refers to.
    const KIND: ElemKind;

    /// Creates a handle from the raw pool index and slot generation.
    fn new(idx: hsize, generation: Generation) -> Self;

    /// The pool index of the element.
    fn idx(&self) -> hsize;

    /// The slot generation this handle was created with.
    fn generation(&self) -> Generation;

    /// Wraps this handle into the sum type `ElemHandle`.
    fn into_elem(self) -> ElemHandle;

    /// Extracts a handle of this type from the sum type. Returns `None` if
    /// `elem` refers to an element of another kind.
    fn from_elem(elem: ElemHandle) -> Option<Self>;

    /// An invalid handle, used as "cleared" value for references that are
    /// always overwritten before they are read again.
    fn invalid() -> Self {
        Self::get_none()
    }

    /// Returns `true` if this is the `invalid` handle.
    fn is_invalid(&self) -> bool {
        Noned::is_none(self)
    }

    /// Helper method to convert the index to `usize`.
    #[inline(always)]
    fn to_usize(&self) -> usize {
        self.idx() as usize
    }
}

macro_rules! make_handle_type {
    ($(#[$attr:meta])* $name:ident = $kind:ident, $short:expr) => {
        $(#[$attr])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name {
            idx: hsize,
            generation: Generation,
        }

        impl Handle for $name {
            const KIND: ElemKind = ElemKind::$kind;

            #[inline(always)]
            fn new(idx: hsize, generation: Generation) -> Self {
                Self { idx, generation }
            }

            #[inline(always)]
            fn idx(&self) -> hsize {
                self.idx
            }

            #[inline(always)]
            fn generation(&self) -> Generation {
                self.generation
            }

            fn into_elem(self) -> ElemHandle {
                ElemHandle::$kind(self)
            }

            fn from_elem(elem: ElemHandle) -> Option<Self> {
                match elem {
                    ElemHandle::$kind(h) => Some(h),
                    _ => None,
                }
            }
        }

        impl Noned for $name {
            fn is_none(&self) -> bool {
                self.idx == hsize::max_value()
            }
            fn get_none() -> Self {
                Self { idx: hsize::max_value(), generation: 0 }
            }
        }

        impl OptEq for $name {
            fn opt_eq(&self, other: &Self) -> bool {
                self == other
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                if Noned::is_none(self) {
                    write!(f, "{}-", $short)
                } else if self.generation == 0 {
                    write!(f, "{}{}", $short, self.idx)
                } else {
                    write!(f, "{}{}@{}", $short, self.idx, self.generation)
                }
            }
        }
    }
}

make_handle_type!(
    /// A handle referring to a vertex.
    VertHandle = Vert, "V"
);
make_handle_type!(
    /// A handle referring to an edge.
    EdgeHandle = Edge, "E"
);
make_handle_type!(
    /// A handle referring to a loop (a face corner).
    LoopHandle = Loop, "L"
);
make_handle_type!(
    /// A handle referring to a face.
    FaceHandle = Face, "F"
);

// Optional references must not cost anything extra.
assert_eq_size!(optional::Optioned<VertHandle>, VertHandle);
assert_eq_size!(optional::Optioned<LoopHandle>, LoopHandle);


/// A handle to an element of any kind.
///
/// This is the closed set of element capabilities: code that needs to treat
/// elements uniformly matches on this enum instead of inspecting a runtime
/// type tag.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, From)]
pub enum ElemHandle {
    Vert(VertHandle),
    Edge(EdgeHandle),
    Loop(LoopHandle),
    Face(FaceHandle),
}

impl ElemHandle {
    /// The kind of element this handle refers to.
    pub fn kind(&self) -> ElemKind {
        match self {
            ElemHandle::Vert(_) => ElemKind::Vert,
            ElemHandle::Edge(_) => ElemKind::Edge,
            ElemHandle::Loop(_) => ElemKind::Loop,
            ElemHandle::Face(_) => ElemKind::Face,
        }
    }

    pub fn vert(self) -> Option<VertHandle> {
        VertHandle::from_elem(self)
    }

    pub fn edge(self) -> Option<EdgeHandle> {
        EdgeHandle::from_elem(self)
    }

    pub fn loop_(self) -> Option<LoopHandle> {
        LoopHandle::from_elem(self)
    }

    pub fn face(self) -> Option<FaceHandle> {
        FaceHandle::from_elem(self)
    }
}

impl fmt::Debug for ElemHandle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ElemHandle::Vert(h) => h.fmt(f),
            ElemHandle::Edge(h) => h.fmt(f),
            ElemHandle::Loop(h) => h.fmt(f),
            ElemHandle::Face(h) => h.fmt(f),
        }
    }
}


#[cfg(test)]
mod tests {
    use optional::Optioned as Opt;
    use super::*;

    #[test]
    fn debug_output() {
        assert_eq!(format!("{:?}", VertHandle::new(3, 0)), "V3");
        assert_eq!(format!("{:?}", FaceHandle::new(7, 2)), "F7@2");
        assert_eq!(format!("{:?}", EdgeHandle::invalid()), "E-");
        assert_eq!(format!("{:?}", ElemHandle::from(LoopHandle::new(1, 0))), "L1");
    }

    #[test]
    fn optional_handles() {
        let none = Opt::<EdgeHandle>::none();
        assert!(none.is_none());

        let e = EdgeHandle::new(0, 0);
        let some = Opt::some(e);
        assert_eq!(some.into_option(), Some(e));
        assert!(!e.is_invalid());
    }

    #[test]
    fn elem_round_trip_rejects_other_kinds() {
        let v = VertHandle::new(4, 1);
        let elem = v.into_elem();
        assert_eq!(elem.kind(), ElemKind::Vert);
        assert_eq!(elem.vert(), Some(v));
        assert_eq!(elem.face(), None);
        assert_eq!(EdgeHandle::from_elem(elem), None);
    }
}
