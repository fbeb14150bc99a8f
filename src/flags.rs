//! Small bitmask types: per-element flags, element-kind masks and creation
//! flags.

use std::fmt;

use crate::handle::ElemKind;


bitflags::bitflags! {
    /// Generic per-element flags (visibility, selection, drawing hints, ...).
    ///
    /// Every element header stores one of these. The kernel itself only ever
    /// sets the defaults for new edges; everything else is owned by callers.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ElemFlags: u8 {
        const SELECT = 1 << 0;
        const HIDDEN = 1 << 1;
        const SEAM = 1 << 2;
        /// Smooth shading (faces) or a smooth edge.
        const SMOOTH = 1 << 3;
        /// Free for use by tools; not cleared by the kernel.
        const TAG = 1 << 4;
        const DRAW = 1 << 5;
    }
}


bitflags::bitflags! {
    /// A set of element kinds. Used for the dirty bits of the mesh bookkeeping
    /// and to select which kinds `ensure_indices` and friends operate on.
    #[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ElemMask: u8 {
        const VERT = 1 << 0;
        const EDGE = 1 << 1;
        const LOOP = 1 << 2;
        const FACE = 1 << 3;
        const ALL = Self::VERT.bits() | Self::EDGE.bits() | Self::LOOP.bits() | Self::FACE.bits();
    }
}

impl ElemMask {
    /// Returns the mask containing only `kind`.
    pub fn of(kind: ElemKind) -> Self {
        match kind {
            ElemKind::Vert => Self::VERT,
            ElemKind::Edge => Self::EDGE,
            ElemKind::Loop => Self::LOOP,
            ElemKind::Face => Self::FACE,
        }
    }

    /// Returns `true` if `kind` is part of this mask.
    pub fn has(self, kind: ElemKind) -> bool {
        self.contains(Self::of(kind))
    }

    /// Iterates over all kinds in this mask (in `ElemKind::ALL` order).
    pub fn kinds(self) -> impl Iterator<Item = ElemKind> {
        ElemKind::ALL.iter().cloned().filter(move |&k| self.has(k))
    }
}

impl From<ElemKind> for ElemMask {
    fn from(kind: ElemKind) -> Self {
        Self::of(kind)
    }
}

impl fmt::Debug for ElemMask {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_set().entries(self.kinds()).finish()
    }
}


bitflags::bitflags! {
    /// Options for the `create_*` operations.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct CreateFlags: u8 {
        /// Return an existing element if one with the same boundary exists
        /// already. Only meaningful for edges and faces.
        const NO_DOUBLE = 1 << 0;

        /// Do not initialize the custom data block of the new element (it is
        /// left unallocated). Used by callers that overwrite it right away.
        const SKIP_CD = 1 << 1;
    }
}
