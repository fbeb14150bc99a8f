//! Per-element attribute storage ("custom data").
//!
//! Each element kind of a mesh has one [`CustomData`] descriptor that lists
//! the attribute layers all elements of that kind carry. Every element owns
//! one [`AttrBlock`] with exactly one value per layer, in layer order. The
//! descriptor knows how to create, copy and free blocks and how to find a
//! typed value in a block.

use std::fmt;

use log::debug;
use smallvec::SmallVec;

use crate::error::{Error, Result};


/// Value stored in a `ShapeKeyIndex` layer of an element that does not
/// originate from a shape key vertex.
pub const SHAPE_KEY_INDEX_NONE: i32 = -1;


/// The type of an attribute layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerType {
    Float,
    Int,
    Bool,
    /// Two floats, e.g. UV coordinates.
    Float2,
    Float3,
    /// RGBA color.
    Color,
    /// Index of the shape key vertex an element originates from. This layer
    /// is never copied when a vertex is created from an exemplar: the copy
    /// gets [`SHAPE_KEY_INDEX_NONE`].
    ShapeKeyIndex,
    /// Not a real layer: stands for the normal field of vertices and faces.
    /// Only used in exclusion masks passed to attribute copy functions.
    Normal,
}

impl LayerType {
    /// The mask containing only this type.
    pub fn mask(self) -> LayerTypeMask {
        match self {
            LayerType::Float => LayerTypeMask::FLOAT,
            LayerType::Int => LayerTypeMask::INT,
            LayerType::Bool => LayerTypeMask::BOOL,
            LayerType::Float2 => LayerTypeMask::FLOAT2,
            LayerType::Float3 => LayerTypeMask::FLOAT3,
            LayerType::Color => LayerTypeMask::COLOR,
            LayerType::ShapeKeyIndex => LayerTypeMask::SHAPE_KEY_INDEX,
            LayerType::Normal => LayerTypeMask::NORMAL,
        }
    }

    /// The value new elements get if no other default was specified for the
    /// layer. Returns `None` for `Normal`, which cannot be stored in a layer.
    pub fn default_value(self) -> Option<AttrValue> {
        let v = match self {
            LayerType::Float => AttrValue::Float(0.0),
            LayerType::Int => AttrValue::Int(0),
            LayerType::Bool => AttrValue::Bool(false),
            LayerType::Float2 => AttrValue::Float2([0.0; 2]),
            LayerType::Float3 => AttrValue::Float3([0.0; 3]),
            LayerType::Color => AttrValue::Color([1.0; 4]),
            LayerType::ShapeKeyIndex => AttrValue::ShapeKeyIndex(ShapeKeyIndex(SHAPE_KEY_INDEX_NONE)),
            LayerType::Normal => return None,
        };

        Some(v)
    }
}


bitflags::bitflags! {
    /// A set of layer types.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct LayerTypeMask: u16 {
        const FLOAT = 1 << 0;
        const INT = 1 << 1;
        const BOOL = 1 << 2;
        const FLOAT2 = 1 << 3;
        const FLOAT3 = 1 << 4;
        const COLOR = 1 << 5;
        const SHAPE_KEY_INDEX = 1 << 6;
        const NORMAL = 1 << 7;
    }
}

impl LayerTypeMask {
    /// Returns `true` if `ty` is part of this mask.
    pub fn has(self, ty: LayerType) -> bool {
        self.contains(ty.mask())
    }
}

impl From<LayerType> for LayerTypeMask {
    fn from(ty: LayerType) -> Self {
        ty.mask()
    }
}


/// Newtype for values of `ShapeKeyIndex` layers, to distinguish them from
/// plain `Int` layers in typed lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShapeKeyIndex(pub i32);

/// A single attribute value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AttrValue {
    Float(f32),
    Int(i32),
    Bool(bool),
    Float2([f32; 2]),
    Float3([f32; 3]),
    Color([f32; 4]),
    ShapeKeyIndex(ShapeKeyIndex),
}

impl AttrValue {
    pub fn layer_type(&self) -> LayerType {
        match self {
            AttrValue::Float(_) => LayerType::Float,
            AttrValue::Int(_) => LayerType::Int,
            AttrValue::Bool(_) => LayerType::Bool,
            AttrValue::Float2(_) => LayerType::Float2,
            AttrValue::Float3(_) => LayerType::Float3,
            AttrValue::Color(_) => LayerType::Color,
            AttrValue::ShapeKeyIndex(_) => LayerType::ShapeKeyIndex,
        }
    }
}

/// Rust types that can be looked up in an attribute block.
pub trait LayerValue: Copy {
    const TYPE: LayerType;

    fn from_attr(v: &AttrValue) -> Option<&Self>;
    fn from_attr_mut(v: &mut AttrValue) -> Option<&mut Self>;
    fn into_attr(self) -> AttrValue;
}

macro_rules! impl_layer_value {
    ($ty:ty, $variant:ident) => {
        impl LayerValue for $ty {
            const TYPE: LayerType = LayerType::$variant;

            fn from_attr(v: &AttrValue) -> Option<&Self> {
                match v {
                    AttrValue::$variant(x) => Some(x),
                    _ => None,
                }
            }

            fn from_attr_mut(v: &mut AttrValue) -> Option<&mut Self> {
                match v {
                    AttrValue::$variant(x) => Some(x),
                    _ => None,
                }
            }

            fn into_attr(self) -> AttrValue {
                AttrValue::$variant(self)
            }
        }
    }
}

impl_layer_value!(f32, Float);
impl_layer_value!(i32, Int);
impl_layer_value!(bool, Bool);
impl_layer_value!([f32; 2], Float2);
impl_layer_value!([f32; 3], Float3);
impl_layer_value!([f32; 4], Color);
impl_layer_value!(ShapeKeyIndex, ShapeKeyIndex);


/// The attribute block owned by one element: one value per layer of the
/// `CustomData` descriptor of the element's kind.
///
/// A block is unallocated if the element was created with
/// `CreateFlags::SKIP_CD` or after it was freed. An allocated block of a
/// kind without layers holds no values but still receives every layer
/// added later.
#[derive(Clone, Default, PartialEq)]
pub struct AttrBlock {
    values: SmallVec<[AttrValue; 4]>,
    allocated: bool,
}

impl AttrBlock {
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn is_allocated(&self) -> bool {
        self.allocated
    }

    /// All values, in layer order.
    pub fn values(&self) -> &[AttrValue] {
        &self.values
    }
}

impl fmt::Debug for AttrBlock {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_list().entries(&self.values).finish()
    }
}


/// Description of a single layer.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    pub ty: LayerType,
    pub name: String,
    pub default: AttrValue,
}

/// Layer descriptor shared by all elements of one kind.
#[derive(Debug, Clone, Default)]
pub struct CustomData {
    layers: Vec<Layer>,
}

impl CustomData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn num_layers(&self) -> usize {
        self.layers.len()
    }

    pub fn has_layer(&self, ty: LayerType) -> bool {
        self.layer_index(ty).is_some()
    }

    /// Index of the first layer of type `ty`.
    pub fn layer_index(&self, ty: LayerType) -> Option<usize> {
        self.layers.iter().position(|l| l.ty == ty)
    }

    pub fn layer_index_named(&self, ty: LayerType, name: &str) -> Option<usize> {
        self.layers.iter().position(|l| l.ty == ty && l.name == name)
    }

    /// Appends a layer with the type's default value. Existing blocks are
    /// *not* updated; use [`BMesh::add_layer`][crate::BMesh::add_layer] for
    /// that.
    pub fn add_layer(&mut self, ty: LayerType, name: &str) -> Result<usize> {
        let default = ty.default_value().ok_or(Error::InvalidLayerType(ty))?;
        self.add_layer_with_default(name, default)
    }

    /// Appends a layer with a custom default value. The layer type is the
    /// type of `default`.
    pub fn add_layer_with_default(&mut self, name: &str, default: AttrValue) -> Result<usize> {
        let ty = default.layer_type();
        if self.layer_index_named(ty, name).is_some() {
            return Err(Error::DuplicateLayer { ty, name: name.into() });
        }

        debug!("adding {:?} layer '{}'", ty, name);
        self.layers.push(Layer { ty, name: name.into(), default });
        Ok(self.layers.len() - 1)
    }

    /// Removes the layer at `idx` from the descriptor. Blocks have to be
    /// updated via `block_remove_layer`.
    pub(crate) fn remove_layer(&mut self, idx: usize) -> Layer {
        let layer = self.layers.remove(idx);
        debug!("removed {:?} layer '{}'", layer.ty, layer.name);
        layer
    }

    /// Returns a block with all values set to the layer defaults.
    pub fn default_block(&self) -> AttrBlock {
        AttrBlock {
            values: self.layers.iter().map(|l| l.default).collect(),
            allocated: true,
        }
    }

    /// Overwrites `block` with a default block.
    pub fn set_default(&self, block: &mut AttrBlock) {
        block.values.clear();
        block.values.extend(self.layers.iter().map(|l| l.default));
        block.allocated = true;
    }

    /// Copies `src` into a new block. Values of layers whose type is in
    /// `exclude` are set to their default instead. An empty `src` (e.g. of an
    /// element created with `SKIP_CD`) results in a default block.
    pub fn copy_block(&self, src: &AttrBlock, exclude: LayerTypeMask) -> AttrBlock {
        let values = self.layers.iter()
            .enumerate()
            .map(|(i, layer)| {
                if exclude.has(layer.ty) {
                    layer.default
                } else {
                    src.values.get(i).copied().unwrap_or(layer.default)
                }
            })
            .collect();

        AttrBlock { values, allocated: true }
    }

    /// Releases the values of `block`, leaving it unallocated.
    pub fn free_block(&self, block: &mut AttrBlock) {
        block.values = SmallVec::new();
        block.allocated = false;
    }

    /// Returns the value of the first layer of type `T::TYPE`.
    pub fn get<'b, T: LayerValue>(&self, block: &'b AttrBlock) -> Option<&'b T> {
        let idx = self.layer_index(T::TYPE)?;
        block.values.get(idx).and_then(T::from_attr)
    }

    pub fn get_mut<'b, T: LayerValue>(&self, block: &'b mut AttrBlock) -> Option<&'b mut T> {
        let idx = self.layer_index(T::TYPE)?;
        block.values.get_mut(idx).and_then(T::from_attr_mut)
    }

    /// Returns the value of the layer of type `T::TYPE` called `name`.
    pub fn get_named<'b, T: LayerValue>(&self, block: &'b AttrBlock, name: &str) -> Option<&'b T> {
        let idx = self.layer_index_named(T::TYPE, name)?;
        block.values.get(idx).and_then(T::from_attr)
    }

    /// Sets the value of the first layer of type `T::TYPE`. Returns `false`
    /// if there is no such layer or the block is empty.
    pub fn set<T: LayerValue>(&self, block: &mut AttrBlock, value: T) -> bool {
        match self.get_mut::<T>(block) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// Brings a block that matched the descriptor before the last layer was
    /// added up to date. Unallocated blocks stay untouched.
    pub(crate) fn block_add_layer(&self, block: &mut AttrBlock) {
        if !block.allocated {
            return;
        }

        if let Some(layer) = self.layers.last() {
            block.values.push(layer.default);
        }
    }

    pub(crate) fn block_remove_layer(&self, block: &mut AttrBlock, idx: usize) {
        if idx < block.values.len() {
            block.values.remove(idx);
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn uv_and_weight() -> CustomData {
        let mut cd = CustomData::new();
        cd.add_layer(LayerType::Float2, "uv").unwrap();
        cd.add_layer_with_default("weight", AttrValue::Float(0.5)).unwrap();
        cd
    }

    #[test]
    fn default_block_has_layer_defaults() {
        let cd = uv_and_weight();
        let block = cd.default_block();
        assert_eq!(block.values(), &[AttrValue::Float2([0.0, 0.0]), AttrValue::Float(0.5)]);
        assert_eq!(cd.get::<f32>(&block), Some(&0.5));
        assert_eq!(cd.get::<i32>(&block), None);
    }

    #[test]
    fn typed_access() {
        let cd = uv_and_weight();
        let mut block = cd.default_block();
        assert!(cd.set(&mut block, [0.25f32, 0.75]));
        assert_eq!(cd.get_named::<[f32; 2]>(&block, "uv"), Some(&[0.25, 0.75]));
        assert_eq!(cd.get_named::<[f32; 2]>(&block, "other"), None);
        assert!(!cd.set(&mut block, true));
    }

    #[test]
    fn copy_respects_exclusion_mask() {
        let cd = uv_and_weight();
        let mut src = cd.default_block();
        cd.set(&mut src, [1.0f32, 2.0]);
        cd.set(&mut src, 3.0f32);

        let full = cd.copy_block(&src, LayerTypeMask::empty());
        assert_eq!(full, src);

        let partial = cd.copy_block(&src, LayerType::Float2.mask());
        assert_eq!(cd.get::<[f32; 2]>(&partial), Some(&[0.0, 0.0]));
        assert_eq!(cd.get::<f32>(&partial), Some(&3.0));
    }

    #[test]
    fn copy_of_empty_block_is_default() {
        let cd = uv_and_weight();
        let copy = cd.copy_block(&AttrBlock::default(), LayerTypeMask::empty());
        assert_eq!(copy, cd.default_block());
    }

    #[test]
    fn layer_errors() {
        let mut cd = uv_and_weight();
        assert!(cd.add_layer(LayerType::Normal, "no").is_err());
        assert!(cd.add_layer(LayerType::Float2, "uv").is_err());
        assert!(cd.add_layer(LayerType::Float2, "uv2").is_ok());
    }

    #[test]
    fn free_block_empties() {
        let cd = uv_and_weight();
        let mut block = cd.default_block();
        cd.free_block(&mut block);
        assert!(block.is_empty());
        assert!(!block.is_allocated());
        assert_eq!(cd.get::<f32>(&block), None);

        cd.block_add_layer(&mut block);
        assert!(block.is_empty());
    }

    #[test]
    fn layer_added_to_block_without_layers() {
        let mut cd = CustomData::new();
        let mut block = cd.default_block();
        assert!(block.is_empty());
        assert!(block.is_allocated());

        cd.add_layer(LayerType::Float, "w").unwrap();
        cd.block_add_layer(&mut block);
        assert_eq!(cd.get::<f32>(&block), Some(&0.0));
        assert!(cd.set(&mut block, 1.5f32));
        assert_eq!(cd.get::<f32>(&block), Some(&1.5));
    }

    #[test]
    fn mask_has() {
        let mask = LayerType::Float.mask() | LayerType::Normal.mask();
        assert!(mask.has(LayerType::Normal));
        assert!(!mask.has(LayerType::Float2));
        assert_eq!(LayerTypeMask::from(LayerType::Color), LayerTypeMask::COLOR);
        assert!(!LayerTypeMask::empty().has(LayerType::Float));
    }
}
