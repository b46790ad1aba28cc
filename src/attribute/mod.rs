//! Named, typed, per-element-class attribute channels.
//!
//! This module defines:
//! - [`ElementClass`]: the closed set of element scopes an attribute can
//!   live on (point, vertex, primitive, detail).
//! - [`AttributeType`]: the closed set of element value types, and
//!   [`InterpolationMode`]: how values blend when operators synthesize new
//!   elements from existing ones.
//! - [`AttributeStorage<T>`]: a dense typed array with an immutable
//!   [`AttributeDescriptor`].
//! - [`AnyAttributeStorage`]: the type-erased interface that lets an
//!   [`AttributeSet`] hold heterogeneous storages. Typed access goes
//!   through a downcast guarded by the runtime type tag and returns `None`
//!   on a mismatch, so a caller can never reinterpret one element type as
//!   another.
//!
//! # Notes
//! * Storages are type-erased at the set level but every access path is
//!   typed; the tag check makes downcasts total rather than trusting the
//!   caller.
//! * The erased interface also carries a clone-element-by-index hook and a
//!   weighted-blend hook. Topology-mutating operators (delete, merge,
//!   subdivide, scatter) use those to move attribute data between
//!   containers without knowing the concrete type.

mod interp;
mod set;
mod storage;

pub use interp::{interpolate, interpolate_barycentric, interpolate_bilinear};
pub use set::AttributeSet;
pub use storage::{new_storage, AnyAttributeStorage, AttributeElement, AttributeStorage};

/// Element scope an attribute (or group) is attached to. A closed set:
/// `Detail` is the single global scope with size always 1.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ElementClass {
    Point,
    Vertex,
    Primitive,
    Detail,
}

impl ElementClass {
    pub fn as_str(self) -> &'static str {
        match self {
            ElementClass::Point => "point",
            ElementClass::Vertex => "vertex",
            ElementClass::Primitive => "primitive",
            ElementClass::Detail => "detail",
        }
    }
}

impl std::fmt::Display for ElementClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Runtime type tag of an attribute storage. A closed set; typed access
/// checks this tag before downcasting.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AttributeType {
    Int,
    Float,
    Vec2f,
    Vec3f,
    Vec4f,
    Mat3f,
    Mat4f,
    String,
}

impl AttributeType {
    pub fn as_str(self) -> &'static str {
        match self {
            AttributeType::Int => "int",
            AttributeType::Float => "float",
            AttributeType::Vec2f => "vec2f",
            AttributeType::Vec3f => "vec3f",
            AttributeType::Vec4f => "vec4f",
            AttributeType::Mat3f => "mat3f",
            AttributeType::Mat4f => "mat4f",
            AttributeType::String => "string",
        }
    }
}

/// How values of an attribute combine when an operator creates new elements
/// from existing ones (subdivision, scattering, copy-to-points).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum InterpolationMode {
    /// Standard linear interpolation.
    #[default]
    Linear,
    /// Smooth Hermite interpolation.
    Cubic,
    /// No interpolation; the dominant source value is copied.
    Constant,
    /// Weighted average with caller-provided weights.
    Weighted,
}

/// Immutable metadata carried by every storage.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttributeDescriptor {
    name: String,
    attribute_type: AttributeType,
    class: ElementClass,
    interpolation: InterpolationMode,
}

impl AttributeDescriptor {
    pub fn new(
        name: impl Into<String>,
        attribute_type: AttributeType,
        class: ElementClass,
        interpolation: InterpolationMode,
    ) -> Self {
        Self {
            name: name.into(),
            attribute_type,
            class,
            interpolation,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attribute_type(&self) -> AttributeType {
        self.attribute_type
    }

    pub fn class(&self) -> ElementClass {
        self.class
    }

    pub fn interpolation(&self) -> InterpolationMode {
        self.interpolation
    }
}

/// Standard attribute names the container exposes convenience accessors
/// for.
pub mod standard {
    /// Point positions (`Vec3f`), conventionally always present.
    pub const P: &str = "P";
    /// Normals (`Vec3f`); per-point when shared, per-vertex when split.
    pub const N: &str = "N";
    /// Vertex UVs (`Vec2f`).
    pub const UV: &str = "uv";
    /// Diffuse color (`Vec3f`).
    pub const CD: &str = "Cd";
    /// Per-point uniform scale consumed by copy-to-points.
    pub const PSCALE: &str = "pscale";
    /// Prefix under which groups are stored as `Int` attributes.
    pub const GROUP_PREFIX: &str = "group_";
}
