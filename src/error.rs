//! The error type of all fallible mesh operations.

use failure::Fail;

use crate::{
    customdata::LayerType,
    handle::{EdgeHandle, ElemHandle, ElemKind, VertHandle},
    iter::IterKind,
};


/// Errors returned when an operation is called with arguments that violate
/// its preconditions. Operations check their arguments before touching the
/// mesh, so an `Err` always means that nothing was changed.
#[derive(Debug, Fail, Clone, PartialEq)]
pub enum Error {
    #[fail(display = "handle {:?} does not refer to a live element", _0)]
    StaleHandle(ElemHandle),

    #[fail(display = "cannot create an edge from {:?} to itself", _0)]
    DegenerateEdge(VertHandle),

    #[fail(display = "face boundary has {} vertices but {} edges", verts, edges)]
    FaceLengthMismatch {
        verts: usize,
        edges: usize,
    },

    #[fail(
        display = "edge {:?} at boundary position {} does not connect its corner to the next one",
        edge, index
    )]
    EdgeNotInFace {
        edge: EdgeHandle,
        index: usize,
    },

    #[fail(display = "vertex {:?} appears more than once in a face boundary", _0)]
    DuplicateFaceVertex(VertHandle),

    #[fail(display = "edge {:?} appears more than once in a face boundary", _0)]
    DuplicateFaceEdge(EdgeHandle),

    #[fail(display = "a face needs at least 3 corners to derive its edges, got {}", _0)]
    TooFewCorners(usize),

    #[fail(display = "iterator kind {:?} cannot be anchored at {:?}", kind, anchor)]
    WrongAnchor {
        kind: IterKind,
        anchor: Option<ElemHandle>,
    },

    #[fail(display = "cannot copy attributes from {:?} to {:?}: different element kinds", src, dst)]
    KindMismatch {
        src: ElemHandle,
        dst: ElemHandle,
    },

    #[fail(display = "no {:?} layer on {} attributes", ty, kind)]
    NoSuchLayer {
        kind: ElemKind,
        ty: LayerType,
    },

    #[fail(display = "a {:?} layer called '{}' exists already", ty, name)]
    DuplicateLayer {
        ty: LayerType,
        name: String,
    },

    #[fail(display = "{:?} is not a storable layer type", _0)]
    InvalidLayerType(LayerType),
}

/// Result with the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;
