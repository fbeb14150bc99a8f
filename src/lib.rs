//! A BMesh-style boundary representation for polygon meshes.
//!
//! A [`BMesh`] stores four kinds of elements: vertices, edges, loops (face
//! corners) and faces. They are connected by three kinds of cycles:
//!
//! - the *disk cycle* of a vertex links all edges using that vertex,
//! - the *radial cycle* of an edge links all loops (and thus faces) using
//!   that edge,
//! - the *loop cycle* of a face links its corners in boundary order.
//!
//! All cycles are stored intrusively in the elements, so every local
//! navigation step and every local splice is O(1). Elements live in pools
//! and refer to each other through generational handles (see [`handle`]):
//! using a handle of a killed element is detected instead of silently reading
//! another element.
//!
//! The crate provides the element lifecycle (`create_*` and `kill_*`),
//! per-kind index and lookup table bookkeeping, attribute layers
//! ([`customdata`]), iterators over all element relationships ([`iter`]),
//! topology and geometry queries and a structural validator.
//!
//! ```
//! use bmesh::{BMesh, CreateFlags};
//! use cgmath::Point3;
//!
//! let mut mesh = BMesh::new();
//! let a = mesh.create_vert(Point3::new(0.0, 0.0, 0.0), None, CreateFlags::empty())?;
//! let b = mesh.create_vert(Point3::new(1.0, 0.0, 0.0), None, CreateFlags::empty())?;
//! let c = mesh.create_vert(Point3::new(0.0, 1.0, 0.0), None, CreateFlags::empty())?;
//! let f = mesh.create_face_verts(&[a, b, c], None, CreateFlags::empty(), true)?.unwrap();
//!
//! assert_eq!(mesh.num_edges(), 3);
//! assert_eq!(mesh.verts_of_face(f).collect::<Vec<_>>(), vec![a, b, c]);
//! assert!(mesh.validate().is_ok());
//! # Ok::<(), bmesh::Error>(())
//! ```

#[cfg(test)]
#[macro_use]
mod test_utils;

pub mod customdata;
pub mod elem;
mod error;
pub mod flags;
pub mod handle;
pub mod iter;
pub mod math;
mod mesh;
pub mod pool;
pub mod query;
pub mod set;

pub use self::{
    customdata::{AttrValue, CustomData, LayerType, LayerTypeMask},
    elem::{Edge, Face, Header, Loop, Vert},
    error::{Error, Result},
    flags::{CreateFlags, ElemFlags, ElemMask},
    handle::{EdgeHandle, ElemHandle, ElemKind, FaceHandle, Handle, LoopHandle, VertHandle},
    iter::{BMIter, IterKind, TypedIter},
    mesh::{AllocTemplate, BMesh, ElemErrors, MeshReport},
    query::RegionScratch,
    set::ElemSet,
};
