//! The mesh container [`BMesh`].

// # Some notes for developers about this implementation
//
// - All four element kinds live in their own `Pool`. Handles are generational,
//   so every public operation can cheaply check whether the handles it was
//   given are still alive before it touches anything.
// - Cycle links between elements are plain handles. Entry points that may be
//   absent (`Vert::e`, `Edge::l`, disk links) are `Opt<_>`; loop links always
//   point to a live loop (a new loop links to itself).
// - The implementation is split into `structure` (cycle splicing), `lifecycle`
//   (create/kill), `bookkeeping` (indices and tables) and `validate`.

use std::{
    fmt,
    ops::{Index, IndexMut},
};

use crate::{
    customdata::{AttrBlock, AttrValue, CustomData, LayerType, LayerTypeMask, LayerValue},
    elem::{Edge, Face, Header, Loop, Vert},
    error::{Error, Result},
    flags::{ElemFlags, ElemMask},
    handle::{hsize, EdgeHandle, ElemHandle, ElemKind, FaceHandle, LoopHandle, VertHandle},
    pool::Pool,
};

mod bookkeeping;
mod lifecycle;
mod structure;
mod validate;

pub use self::validate::{ElemErrors, MeshReport};


/// Initial pool sizes of a new mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllocTemplate {
    pub verts: usize,
    pub edges: usize,
    pub loops: usize,
    pub faces: usize,
}

impl AllocTemplate {
    /// Sizes for a small mesh; the pools grow as needed anyway.
    pub const DEFAULT: Self = AllocTemplate {
        verts: 512,
        edges: 1024,
        loops: 2048,
        faces: 512,
    };

    /// A template with the current element counts of `mesh`.
    pub fn from_mesh(mesh: &BMesh) -> Self {
        Self {
            verts: mesh.num_verts() as usize,
            edges: mesh.num_edges() as usize,
            loops: mesh.num_loops() as usize,
            faces: mesh.num_faces() as usize,
        }
    }
}

impl Default for AllocTemplate {
    fn default() -> Self {
        Self::DEFAULT
    }
}


/// A polygon mesh with explicit disk and radial cycles.
///
/// Elements are created and destroyed only through the lifecycle operations
/// (`create_vert`, `kill_face`, ...). Element data can be read via indexing
/// (`mesh[v]`, panics on stale handles) or the `vert`/`edge`/`loop_`/`face`
/// methods (return `None` for stale handles).
#[derive(Clone)]
pub struct BMesh {
    pub(crate) verts: Pool<VertHandle, Vert>,
    pub(crate) edges: Pool<EdgeHandle, Edge>,
    pub(crate) loops: Pool<LoopHandle, Loop>,
    pub(crate) faces: Pool<FaceHandle, Face>,

    pub(crate) vdata: CustomData,
    pub(crate) edata: CustomData,
    pub(crate) ldata: CustomData,
    pub(crate) pdata: CustomData,

    /// Kinds whose `Header::index` values are out of date.
    pub(crate) elem_index_dirty: ElemMask,
    /// Kinds whose lookup table is out of date.
    pub(crate) elem_table_dirty: ElemMask,
    /// First index of the current numbering of each kind, by `ElemKind::slot`.
    pub(crate) elem_index_start: [hsize; 4],

    pub(crate) vtable: Vec<VertHandle>,
    pub(crate) etable: Vec<EdgeHandle>,
    pub(crate) ltable: Vec<LoopHandle>,
    pub(crate) ftable: Vec<FaceHandle>,
}

impl BMesh {
    /// Creates an empty mesh with the default allocation template.
    pub fn new() -> Self {
        Self::with_capacity(AllocTemplate::DEFAULT)
    }

    pub fn with_capacity(alloc: AllocTemplate) -> Self {
        Self {
            verts: Pool::with_capacity(alloc.verts),
            edges: Pool::with_capacity(alloc.edges),
            loops: Pool::with_capacity(alloc.loops),
            faces: Pool::with_capacity(alloc.faces),
            vdata: CustomData::new(),
            edata: CustomData::new(),
            ldata: CustomData::new(),
            pdata: CustomData::new(),
            elem_index_dirty: ElemMask::empty(),
            elem_table_dirty: ElemMask::ALL,
            elem_index_start: [0; 4],
            vtable: Vec::new(),
            etable: Vec::new(),
            ltable: Vec::new(),
            ftable: Vec::new(),
        }
    }

    pub fn num_verts(&self) -> hsize {
        self.verts.len()
    }

    pub fn num_edges(&self) -> hsize {
        self.edges.len()
    }

    pub fn num_loops(&self) -> hsize {
        self.loops.len()
    }

    pub fn num_faces(&self) -> hsize {
        self.faces.len()
    }

    /// Number of elements of the given kind.
    pub fn num_elems(&self, kind: ElemKind) -> hsize {
        match kind {
            ElemKind::Vert => self.num_verts(),
            ElemKind::Edge => self.num_edges(),
            ElemKind::Loop => self.num_loops(),
            ElemKind::Face => self.num_faces(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.verts.is_empty()
            && self.edges.is_empty()
            && self.loops.is_empty()
            && self.faces.is_empty()
    }

    pub fn vert(&self, v: VertHandle) -> Option<&Vert> {
        self.verts.get(v)
    }

    pub fn vert_mut(&mut self, v: VertHandle) -> Option<&mut Vert> {
        self.verts.get_mut(v)
    }

    pub fn edge(&self, e: EdgeHandle) -> Option<&Edge> {
        self.edges.get(e)
    }

    pub fn edge_mut(&mut self, e: EdgeHandle) -> Option<&mut Edge> {
        self.edges.get_mut(e)
    }

    pub fn loop_(&self, l: LoopHandle) -> Option<&Loop> {
        self.loops.get(l)
    }

    pub fn loop_mut(&mut self, l: LoopHandle) -> Option<&mut Loop> {
        self.loops.get_mut(l)
    }

    pub fn face(&self, f: FaceHandle) -> Option<&Face> {
        self.faces.get(f)
    }

    pub fn face_mut(&mut self, f: FaceHandle) -> Option<&mut Face> {
        self.faces.get_mut(f)
    }

    /// Returns `true` if `h` refers to a live element of this mesh.
    pub fn contains(&self, h: impl Into<ElemHandle>) -> bool {
        match h.into() {
            ElemHandle::Vert(v) => self.verts.contains(v),
            ElemHandle::Edge(e) => self.edges.contains(e),
            ElemHandle::Loop(l) => self.loops.contains(l),
            ElemHandle::Face(f) => self.faces.contains(f),
        }
    }

    /// Returns `Err(StaleHandle)` if `h` is not a live element.
    pub fn check(&self, h: impl Into<ElemHandle>) -> Result<()> {
        let h = h.into();
        if self.contains(h) {
            Ok(())
        } else {
            Err(Error::StaleHandle(h))
        }
    }

    pub fn header(&self, h: impl Into<ElemHandle>) -> Option<&Header> {
        match h.into() {
            ElemHandle::Vert(v) => self.verts.get(v).map(|x| &x.head),
            ElemHandle::Edge(e) => self.edges.get(e).map(|x| &x.head),
            ElemHandle::Loop(l) => self.loops.get(l).map(|x| &x.head),
            ElemHandle::Face(f) => self.faces.get(f).map(|x| &x.head),
        }
    }

    pub fn header_mut(&mut self, h: impl Into<ElemHandle>) -> Option<&mut Header> {
        match h.into() {
            ElemHandle::Vert(v) => self.verts.get_mut(v).map(|x| &mut x.head),
            ElemHandle::Edge(e) => self.edges.get_mut(e).map(|x| &mut x.head),
            ElemHandle::Loop(l) => self.loops.get_mut(l).map(|x| &mut x.head),
            ElemHandle::Face(f) => self.faces.get_mut(f).map(|x| &mut x.head),
        }
    }

    fn live_header_mut(&mut self, h: ElemHandle) -> &mut Header {
        match self.header_mut(h) {
            Some(head) => head,
            None => panic!("{:?} does not refer to a live {}", h, h.kind()),
        }
    }


    // ===== Flags ==============================================================================

    /// Returns `true` if any bit of `flag` is set on `h`. Stale handles have
    /// no flags.
    pub fn elem_flag_test(&self, h: impl Into<ElemHandle>, flag: ElemFlags) -> bool {
        self.header(h).map(|head| head.flag.intersects(flag)).unwrap_or(false)
    }

    /// Sets `flag` on `h`. Panics if `h` is stale.
    pub fn elem_flag_enable(&mut self, h: impl Into<ElemHandle>, flag: ElemFlags) {
        self.live_header_mut(h.into()).flag.insert(flag);
    }

    /// Clears `flag` on `h`. Panics if `h` is stale.
    pub fn elem_flag_disable(&mut self, h: impl Into<ElemHandle>, flag: ElemFlags) {
        self.live_header_mut(h.into()).flag.remove(flag);
    }

    pub fn elem_flag_set(&mut self, h: impl Into<ElemHandle>, flag: ElemFlags, value: bool) {
        self.live_header_mut(h.into()).flag.set(flag, value);
    }

    /// Clears `flag` on all elements of the kinds in `mask`.
    pub fn elem_flag_clear_all(&mut self, mask: ElemMask, flag: ElemFlags) {
        if mask.has(ElemKind::Vert) {
            for h in self.verts.handles().collect::<Vec<_>>() {
                self.verts[h].head.flag.remove(flag);
            }
        }
        if mask.has(ElemKind::Edge) {
            for h in self.edges.handles().collect::<Vec<_>>() {
                self.edges[h].head.flag.remove(flag);
            }
        }
        if mask.has(ElemKind::Loop) {
            for h in self.loops.handles().collect::<Vec<_>>() {
                self.loops[h].head.flag.remove(flag);
            }
        }
        if mask.has(ElemKind::Face) {
            for h in self.faces.handles().collect::<Vec<_>>() {
                self.faces[h].head.flag.remove(flag);
            }
        }
    }


    // ===== Attributes =========================================================================

    /// The layer descriptor of the given element kind.
    pub fn custom_data(&self, kind: ElemKind) -> &CustomData {
        match kind {
            ElemKind::Vert => &self.vdata,
            ElemKind::Edge => &self.edata,
            ElemKind::Loop => &self.ldata,
            ElemKind::Face => &self.pdata,
        }
    }

    /// Adds a layer of type `ty` to all elements of `kind`. Existing elements
    /// get the default value of the layer. Returns the index of the layer.
    pub fn add_layer(&mut self, kind: ElemKind, ty: LayerType, name: &str) -> Result<usize> {
        let default = ty.default_value().ok_or(Error::InvalidLayerType(ty))?;
        self.add_layer_with_default(kind, name, default)
    }

    /// Like `add_layer`, with a custom default value. The layer type is the
    /// type of `default`.
    pub fn add_layer_with_default(
        &mut self,
        kind: ElemKind,
        name: &str,
        default: AttrValue,
    ) -> Result<usize> {
        macro_rules! add {
            ($cd:ident, $pool:ident) => {{
                let idx = self.$cd.add_layer_with_default(name, default)?;
                let cd = &self.$cd;
                for h in self.$pool.handles().collect::<Vec<_>>() {
                    cd.block_add_layer(&mut self.$pool[h].head.data);
                }
                Ok(idx)
            }};
        }

        match kind {
            ElemKind::Vert => add!(vdata, verts),
            ElemKind::Edge => add!(edata, edges),
            ElemKind::Loop => add!(ldata, loops),
            ElemKind::Face => add!(pdata, faces),
        }
    }

    /// Removes the layer of type `ty` called `name` from all elements of
    /// `kind`.
    pub fn remove_layer(&mut self, kind: ElemKind, ty: LayerType, name: &str) -> Result<()> {
        macro_rules! remove {
            ($cd:ident, $pool:ident) => {{
                let idx = self.$cd.layer_index_named(ty, name)
                    .ok_or(Error::NoSuchLayer { kind, ty })?;
                self.$cd.remove_layer(idx);
                let cd = &self.$cd;
                for h in self.$pool.handles().collect::<Vec<_>>() {
                    cd.block_remove_layer(&mut self.$pool[h].head.data, idx);
                }
                Ok(())
            }};
        }

        match kind {
            ElemKind::Vert => remove!(vdata, verts),
            ElemKind::Edge => remove!(edata, edges),
            ElemKind::Loop => remove!(ldata, loops),
            ElemKind::Face => remove!(pdata, faces),
        }
    }

    fn data_of(&self, h: ElemHandle) -> Option<(&CustomData, &AttrBlock)> {
        match h {
            ElemHandle::Vert(v) => self.verts.get(v).map(|x| (&self.vdata, &x.head.data)),
            ElemHandle::Edge(e) => self.edges.get(e).map(|x| (&self.edata, &x.head.data)),
            ElemHandle::Loop(l) => self.loops.get(l).map(|x| (&self.ldata, &x.head.data)),
            ElemHandle::Face(f) => self.faces.get(f).map(|x| (&self.pdata, &x.head.data)),
        }
    }

    fn data_of_mut(&mut self, h: ElemHandle) -> Option<(&CustomData, &mut AttrBlock)> {
        match h {
            ElemHandle::Vert(v) => {
                let cd = &self.vdata;
                self.verts.get_mut(v).map(|x| (cd, &mut x.head.data))
            }
            ElemHandle::Edge(e) => {
                let cd = &self.edata;
                self.edges.get_mut(e).map(|x| (cd, &mut x.head.data))
            }
            ElemHandle::Loop(l) => {
                let cd = &self.ldata;
                self.loops.get_mut(l).map(|x| (cd, &mut x.head.data))
            }
            ElemHandle::Face(f) => {
                let cd = &self.pdata;
                self.faces.get_mut(f).map(|x| (cd, &mut x.head.data))
            }
        }
    }

    /// The value of the first layer of type `T::TYPE` of element `h`.
    pub fn attr<T: LayerValue>(&self, h: impl Into<ElemHandle>) -> Option<&T> {
        let (cd, block) = self.data_of(h.into())?;
        cd.get::<T>(block)
    }

    /// The value of the layer of type `T::TYPE` called `name` of element `h`.
    pub fn attr_named<T: LayerValue>(&self, h: impl Into<ElemHandle>, name: &str) -> Option<&T> {
        let (cd, block) = self.data_of(h.into())?;
        cd.get_named::<T>(block, name)
    }

    pub fn attr_mut<T: LayerValue>(&mut self, h: impl Into<ElemHandle>) -> Option<&mut T> {
        let (cd, block) = self.data_of_mut(h.into())?;
        cd.get_mut::<T>(block)
    }

    /// Sets the value of the first layer of type `T::TYPE` of element `h`.
    pub fn set_attr<T: LayerValue>(&mut self, h: impl Into<ElemHandle>, value: T) -> Result<()> {
        let h = h.into();
        let (cd, block) = self.data_of_mut(h).ok_or(Error::StaleHandle(h))?;
        if cd.set(block, value) {
            Ok(())
        } else {
            Err(Error::NoSuchLayer { kind: h.kind(), ty: T::TYPE })
        }
    }

    /// Copies the attributes of `src` to `dst`: flags (except `SELECT`, which
    /// `dst` keeps), the normal (unless `exclude` contains
    /// `LayerType::Normal`), the material index of faces and all custom data
    /// layers not in `exclude`. Both elements must be of the same kind.
    pub fn copy_attrs(
        &mut self,
        src: impl Into<ElemHandle>,
        dst: impl Into<ElemHandle>,
        exclude: LayerTypeMask,
    ) -> Result<()> {
        let src = src.into();
        let dst = dst.into();
        self.check(src)?;
        self.check(dst)?;
        if src.kind() != dst.kind() {
            return Err(Error::KindMismatch { src, dst });
        }
        if src == dst {
            return Ok(());
        }

        self.copy_attrs_unchecked(src, dst, exclude);
        Ok(())
    }

    /// `copy_attrs` for two live elements of the same kind.
    pub(crate) fn copy_attrs_unchecked(
        &mut self,
        src: ElemHandle,
        dst: ElemHandle,
        exclude: LayerTypeMask,
    ) {
        let copy_normal = !exclude.has(LayerType::Normal);
        let (src_flag, data) = match self.data_of(src) {
            Some((cd, block)) => {
                let flag = self.header(src).map(|h| h.flag).unwrap_or_default();
                (flag, cd.copy_block(block, exclude))
            }
            None => return,
        };

        {
            let head = self.live_header_mut(dst);
            let keep = head.flag & ElemFlags::SELECT;
            head.flag = keep | (src_flag & !ElemFlags::SELECT);
            head.data = data;
        }

        match (src, dst) {
            (ElemHandle::Vert(s), ElemHandle::Vert(d)) => {
                if copy_normal {
                    self.verts[d].no = self.verts[s].no;
                }
            }
            (ElemHandle::Face(s), ElemHandle::Face(d)) => {
                if copy_normal {
                    self.faces[d].no = self.faces[s].no;
                }
                self.faces[d].mat_nr = self.faces[s].mat_nr;
            }
            _ => {}
        }
    }
}

impl Default for BMesh {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for BMesh {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("BMesh")
            .field("verts", &self.verts)
            .field("edges", &self.edges)
            .field("loops", &self.loops)
            .field("faces", &self.faces)
            .field("elem_index_dirty", &self.elem_index_dirty)
            .field("elem_table_dirty", &self.elem_table_dirty)
            .finish()
    }
}

macro_rules! impl_index {
    ($handle:ident, $elem:ident, $pool:ident) => {
        impl Index<$handle> for BMesh {
            type Output = $elem;
            fn index(&self, h: $handle) -> &Self::Output {
                &self.$pool[h]
            }
        }

        impl IndexMut<$handle> for BMesh {
            fn index_mut(&mut self, h: $handle) -> &mut Self::Output {
                &mut self.$pool[h]
            }
        }
    };
}

impl_index!(VertHandle, Vert, verts);
impl_index!(EdgeHandle, Edge, edges);
impl_index!(LoopHandle, Loop, loops);
impl_index!(FaceHandle, Face, faces);
