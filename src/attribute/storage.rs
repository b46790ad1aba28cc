//! Typed attribute storage and its type-erased interface.

use std::any::Any;

use glam::{Mat3, Mat4, Vec2, Vec3, Vec4};

use super::{AttributeDescriptor, AttributeType, InterpolationMode};

/// Element types that can live in an attribute channel.
///
/// The trait binds each Rust type to its runtime [`AttributeType`] tag and
/// supplies the blending primitives the interpolation layer builds on.
/// The permitted set is closed: int, float, the fixed-size vectors and
/// matrices, and string.
pub trait AttributeElement: Clone + Default + std::fmt::Debug + Send + Sync + 'static {
    const TYPE: AttributeType;

    /// Linear blend. Types without a meaningful blend (strings) fall back
    /// to nearest-value semantics.
    fn lerp(a: &Self, b: &Self, t: f32) -> Self;

    /// Weighted sum over `(value, weight)` pairs; weights are expected to
    /// sum to 1. Non-blendable types return the highest-weight value.
    fn weighted(values: &[(&Self, f32)]) -> Self;

    /// Approximate heap+inline footprint of one element, for
    /// `memory_usage` reporting.
    fn element_size(&self) -> usize {
        size_of::<Self>()
    }
}

macro_rules! impl_blendable_element {
    ($ty:ty, $tag:ident, $zero:expr, $scale:expr) => {
        impl AttributeElement for $ty {
            const TYPE: AttributeType = AttributeType::$tag;

            fn lerp(a: &Self, b: &Self, t: f32) -> Self {
                let scale = $scale;
                scale(a, 1.0 - t) + scale(b, t)
            }

            fn weighted(values: &[(&Self, f32)]) -> Self {
                let scale = $scale;
                values.iter().fold($zero, |acc, &(v, w)| acc + scale(v, w))
            }
        }
    };
}

impl_blendable_element!(f32, Float, 0.0, |v: &f32, w: f32| v * w);
impl_blendable_element!(Vec2, Vec2f, Vec2::ZERO, |v: &Vec2, w: f32| *v * w);
impl_blendable_element!(Vec3, Vec3f, Vec3::ZERO, |v: &Vec3, w: f32| *v * w);
impl_blendable_element!(Vec4, Vec4f, Vec4::ZERO, |v: &Vec4, w: f32| *v * w);
impl_blendable_element!(Mat3, Mat3f, Mat3::ZERO, |v: &Mat3, w: f32| *v * w);
impl_blendable_element!(Mat4, Mat4f, Mat4::ZERO, |v: &Mat4, w: f32| *v * w);

impl AttributeElement for i32 {
    const TYPE: AttributeType = AttributeType::Int;

    fn lerp(a: &Self, b: &Self, t: f32) -> Self {
        (*a as f32 * (1.0 - t) + *b as f32 * t).round() as i32
    }

    fn weighted(values: &[(&Self, f32)]) -> Self {
        values
            .iter()
            .map(|(v, w)| **v as f32 * w)
            .sum::<f32>()
            .round() as i32
    }
}

impl AttributeElement for String {
    const TYPE: AttributeType = AttributeType::String;

    fn lerp(a: &Self, b: &Self, t: f32) -> Self {
        if t < 0.5 { a.clone() } else { b.clone() }
    }

    fn weighted(values: &[(&Self, f32)]) -> Self {
        values
            .iter()
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(v, _)| (*v).clone())
            .unwrap_or_default()
    }

    fn element_size(&self) -> usize {
        size_of::<Self>() + self.capacity()
    }
}

/// Dense typed array of attribute values, one per element of the owning
/// class, plus the immutable descriptor.
#[derive(Clone, Debug)]
pub struct AttributeStorage<T: AttributeElement> {
    descriptor: AttributeDescriptor,
    data: Vec<T>,
}

impl<T: AttributeElement> AttributeStorage<T> {
    pub fn new(descriptor: AttributeDescriptor, len: usize) -> Self {
        debug_assert_eq!(descriptor.attribute_type(), T::TYPE);
        Self {
            descriptor,
            data: vec![T::default(); len],
        }
    }

    pub fn descriptor(&self) -> &AttributeDescriptor {
        &self.descriptor
    }

    pub fn interpolation(&self) -> InterpolationMode {
        self.descriptor.interpolation()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn get(&self, index: usize) -> &T {
        &self.data[index]
    }

    pub fn get_mut(&mut self, index: usize) -> &mut T {
        &mut self.data[index]
    }

    pub fn set(&mut self, index: usize, value: T) {
        self.data[index] = value;
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.data.iter()
    }

    pub fn fill(&mut self, value: T) {
        self.data.iter_mut().for_each(|v| *v = value.clone());
    }

    pub fn push(&mut self, value: T) {
        self.data.push(value);
    }
}

impl<T: AttributeElement> std::ops::Index<usize> for AttributeStorage<T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        &self.data[index]
    }
}

impl<T: AttributeElement> std::ops::IndexMut<usize> for AttributeStorage<T> {
    fn index_mut(&mut self, index: usize) -> &mut T {
        &mut self.data[index]
    }
}

/// Type-erased storage interface.
///
/// [`super::AttributeSet`] holds `Box<dyn AnyAttributeStorage>`; everything
/// a set or a topology-mutating operator needs without knowing the element
/// type goes through this vtable. Typed access recovers the concrete
/// [`AttributeStorage<T>`] via [`AnyAttributeStorage::as_any`], guarded by
/// the tag.
pub trait AnyAttributeStorage: Send + Sync + std::fmt::Debug {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Resize to `len`, zero-initializing (default-initializing) new
    /// entries.
    fn resize(&mut self, len: usize);

    fn attribute_type(&self) -> AttributeType;

    fn descriptor(&self) -> &AttributeDescriptor;

    /// Deep copy as an owned boxed storage of the same concrete type.
    fn clone_boxed(&self) -> Box<dyn AnyAttributeStorage>;

    fn memory_usage(&self) -> usize;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Copy one element from `src` (which must be a storage of the same
    /// concrete type) into slot `dst`. Returns false on a type mismatch.
    fn copy_element(&mut self, dst: usize, src: &dyn AnyAttributeStorage, src_index: usize)
        -> bool;

    /// Copy an element inside this storage.
    fn copy_element_within(&mut self, dst: usize, src: usize);

    /// Blend several source elements into slot `dst` honoring this
    /// storage's interpolation mode. `src` must be of the same concrete
    /// type; weights pair with `src_indices`. Returns false on mismatch.
    fn blend_element(
        &mut self,
        dst: usize,
        src: &dyn AnyAttributeStorage,
        src_indices: &[usize],
        weights: &[f32],
    ) -> bool;
}

impl<T: AttributeElement> AnyAttributeStorage for AttributeStorage<T> {
    fn len(&self) -> usize {
        self.data.len()
    }

    fn resize(&mut self, len: usize) {
        self.data.resize(len, T::default());
    }

    fn attribute_type(&self) -> AttributeType {
        T::TYPE
    }

    fn descriptor(&self) -> &AttributeDescriptor {
        &self.descriptor
    }

    fn clone_boxed(&self) -> Box<dyn AnyAttributeStorage> {
        Box::new(self.clone())
    }

    fn memory_usage(&self) -> usize {
        size_of::<Self>() + self.data.iter().map(AttributeElement::element_size).sum::<usize>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn copy_element(
        &mut self,
        dst: usize,
        src: &dyn AnyAttributeStorage,
        src_index: usize,
    ) -> bool {
        let Some(src) = src.as_any().downcast_ref::<AttributeStorage<T>>() else {
            return false;
        };
        self.data[dst] = src.data[src_index].clone();
        true
    }

    fn copy_element_within(&mut self, dst: usize, src: usize) {
        if dst != src {
            self.data[dst] = self.data[src].clone();
        }
    }

    fn blend_element(
        &mut self,
        dst: usize,
        src: &dyn AnyAttributeStorage,
        src_indices: &[usize],
        weights: &[f32],
    ) -> bool {
        let Some(src) = src.as_any().downcast_ref::<AttributeStorage<T>>() else {
            return false;
        };
        debug_assert_eq!(src_indices.len(), weights.len());
        self.data[dst] = match self.descriptor.interpolation() {
            // Constant attributes copy the dominant source outright.
            InterpolationMode::Constant => src_indices
                .iter()
                .zip(weights)
                .max_by(|a, b| a.1.total_cmp(b.1))
                .map(|(&i, _)| src.data[i].clone())
                .unwrap_or_default(),
            _ => {
                let pairs: Vec<(&T, f32)> = src_indices
                    .iter()
                    .zip(weights)
                    .map(|(&i, &w)| (&src.data[i], w))
                    .collect();
                T::weighted(&pairs)
            }
        };
        true
    }
}

impl Clone for Box<dyn AnyAttributeStorage> {
    fn clone(&self) -> Self {
        self.clone_boxed()
    }
}

/// Construct an empty boxed storage for a descriptor, dispatching on its
/// type tag.
pub fn new_storage(descriptor: AttributeDescriptor, len: usize) -> Box<dyn AnyAttributeStorage> {
    match descriptor.attribute_type() {
        AttributeType::Int => Box::new(AttributeStorage::<i32>::new(descriptor, len)),
        AttributeType::Float => Box::new(AttributeStorage::<f32>::new(descriptor, len)),
        AttributeType::Vec2f => Box::new(AttributeStorage::<Vec2>::new(descriptor, len)),
        AttributeType::Vec3f => Box::new(AttributeStorage::<Vec3>::new(descriptor, len)),
        AttributeType::Vec4f => Box::new(AttributeStorage::<Vec4>::new(descriptor, len)),
        AttributeType::Mat3f => Box::new(AttributeStorage::<Mat3>::new(descriptor, len)),
        AttributeType::Mat4f => Box::new(AttributeStorage::<Mat4>::new(descriptor, len)),
        AttributeType::String => Box::new(AttributeStorage::<String>::new(descriptor, len)),
    }
}
