//! Node parameters: values, schema and the fluent definition builder.
//!
//! A node's parameter *schema* ([`ParameterDefinition`]) is immutable
//! metadata registered once when the node is constructed. Parameter
//! *values* live in a separate [`ParameterMap`] the execution engine
//! updates before each cook. Typed reads go through [`FromParameter`] and
//! fall back to a caller-provided default when the stored variant does not
//! match, so operators never branch on variant errors.

use std::collections::HashMap;

use glam::Vec3;

/// A parameter value: a closed sum over the supported kinds. `Code` is
/// textually a string but semantically an expression evaluated by
/// operators that run user expressions (Wrangle).
#[derive(Clone, Debug, PartialEq)]
pub enum ParameterValue {
    Int(i32),
    Float(f32),
    Bool(bool),
    String(String),
    Vec3(Vec3),
    Code(String),
}

impl ParameterValue {
    /// Kind tag for serialization and schema checks.
    pub fn parameter_type(&self) -> ParameterType {
        match self {
            ParameterValue::Int(_) => ParameterType::Int,
            ParameterValue::Float(_) => ParameterType::Float,
            ParameterValue::Bool(_) => ParameterType::Bool,
            ParameterValue::String(_) => ParameterType::String,
            ParameterValue::Vec3(_) => ParameterType::Vector3,
            ParameterValue::Code(_) => ParameterType::Code,
        }
    }
}

/// Parameter kind, including the UI-level distinction between a plain
/// string, code, and a group selector (all strings on the wire).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParameterType {
    Float,
    Int,
    Bool,
    String,
    Vector3,
    Code,
    GroupSelector,
}

impl ParameterType {
    /// Wire name used by the graph JSON format.
    pub fn as_str(self) -> &'static str {
        match self {
            ParameterType::Float => "float",
            ParameterType::Int => "int",
            ParameterType::Bool => "bool",
            ParameterType::String => "string",
            ParameterType::Vector3 => "vector3",
            ParameterType::Code => "code",
            ParameterType::GroupSelector => "group_selector",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "float" => ParameterType::Float,
            "int" => ParameterType::Int,
            "bool" => ParameterType::Bool,
            "string" => ParameterType::String,
            "vector3" => ParameterType::Vector3,
            "code" => ParameterType::Code,
            "group_selector" => ParameterType::GroupSelector,
            _ => return None,
        })
    }
}

/// Types that can be read out of a [`ParameterValue`].
pub trait FromParameter: Sized {
    fn from_parameter(value: &ParameterValue) -> Option<Self>;
}

impl FromParameter for i32 {
    fn from_parameter(value: &ParameterValue) -> Option<Self> {
        match value {
            ParameterValue::Int(v) => Some(*v),
            _ => None,
        }
    }
}

impl FromParameter for f32 {
    fn from_parameter(value: &ParameterValue) -> Option<Self> {
        match value {
            ParameterValue::Float(v) => Some(*v),
            // Graphs routinely store whole numbers as ints; accept them.
            ParameterValue::Int(v) => Some(*v as f32),
            _ => None,
        }
    }
}

impl FromParameter for bool {
    fn from_parameter(value: &ParameterValue) -> Option<Self> {
        match value {
            ParameterValue::Bool(v) => Some(*v),
            ParameterValue::Int(v) => Some(*v != 0),
            _ => None,
        }
    }
}

impl FromParameter for String {
    fn from_parameter(value: &ParameterValue) -> Option<Self> {
        match value {
            ParameterValue::String(v) | ParameterValue::Code(v) => Some(v.clone()),
            _ => None,
        }
    }
}

impl FromParameter for Vec3 {
    fn from_parameter(value: &ParameterValue) -> Option<Self> {
        match value {
            ParameterValue::Vec3(v) => Some(*v),
            _ => None,
        }
    }
}

/// Name → value map; the engine transfers graph-side values in here
/// before each cook.
pub type ParameterMap = HashMap<String, ParameterValue>;

/// Typed read with a default on miss or variant mismatch.
pub fn get_parameter<T: FromParameter>(map: &ParameterMap, name: &str, default: T) -> T {
    map.get(name)
        .and_then(T::from_parameter)
        .unwrap_or(default)
}

/// Immutable per-parameter schema: identity, UI metadata, type, default
/// and constraints.
#[derive(Clone, Debug, PartialEq)]
pub struct ParameterDefinition {
    pub name: String,
    pub label: String,
    pub category: String,
    pub description: String,
    pub parameter_type: ParameterType,
    pub default_value: ParameterValue,
    pub float_min: f32,
    pub float_max: f32,
    pub int_min: i32,
    pub int_max: i32,
    /// Combo-box labels for `Int` parameters.
    pub options: Vec<String>,
    /// Widget hint ("filepath", "button", "multiline", ...).
    pub ui_hint: String,
    /// When set, this parameter is shown only while the named control
    /// parameter holds the given value.
    pub visible_when: Option<(String, i32)>,
}

impl ParameterDefinition {
    pub fn new(
        name: impl Into<String>,
        parameter_type: ParameterType,
        default_value: ParameterValue,
    ) -> Self {
        let name = name.into();
        Self {
            label: name.clone(),
            name,
            category: String::new(),
            description: String::new(),
            parameter_type,
            default_value,
            float_min: 0.0,
            float_max: 100.0,
            int_min: 0,
            int_max: 100,
            options: Vec::new(),
            ui_hint: String::new(),
            visible_when: None,
        }
    }
}

/// Fluent builder over [`ParameterDefinition`]; finish with `build()`.
pub struct ParameterBuilder {
    def: ParameterDefinition,
}

impl ParameterBuilder {
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.def.label = label.into();
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.def.category = category.into();
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.def.description = description.into();
        self
    }

    pub fn range(mut self, min: f32, max: f32) -> Self {
        self.def.float_min = min;
        self.def.float_max = max;
        self
    }

    pub fn int_range(mut self, min: i32, max: i32) -> Self {
        self.def.int_min = min;
        self.def.int_max = max;
        self
    }

    pub fn options(mut self, options: &[&str]) -> Self {
        self.def.options = options.iter().map(|s| s.to_string()).collect();
        self.def.int_min = 0;
        self.def.int_max = self.def.options.len() as i32 - 1;
        self
    }

    pub fn visible_when(mut self, control: impl Into<String>, value: i32) -> Self {
        self.def.visible_when = Some((control.into(), value));
        self
    }

    pub fn hint(mut self, ui_hint: impl Into<String>) -> Self {
        self.def.ui_hint = ui_hint.into();
        self
    }

    pub fn build(self) -> ParameterDefinition {
        self.def
    }
}

/// Entry points for the builder, one per parameter kind.
pub fn float_parameter(name: &str, default: f32) -> ParameterBuilder {
    ParameterBuilder {
        def: ParameterDefinition::new(name, ParameterType::Float, ParameterValue::Float(default)),
    }
}

pub fn int_parameter(name: &str, default: i32) -> ParameterBuilder {
    ParameterBuilder {
        def: ParameterDefinition::new(name, ParameterType::Int, ParameterValue::Int(default)),
    }
}

pub fn bool_parameter(name: &str, default: bool) -> ParameterBuilder {
    ParameterBuilder {
        def: ParameterDefinition::new(name, ParameterType::Bool, ParameterValue::Bool(default)),
    }
}

pub fn string_parameter(name: &str, default: &str) -> ParameterBuilder {
    ParameterBuilder {
        def: ParameterDefinition::new(
            name,
            ParameterType::String,
            ParameterValue::String(default.to_string()),
        ),
    }
}

pub fn vector3_parameter(name: &str, default: Vec3) -> ParameterBuilder {
    ParameterBuilder {
        def: ParameterDefinition::new(name, ParameterType::Vector3, ParameterValue::Vec3(default)),
    }
}

pub fn code_parameter(name: &str, default: &str) -> ParameterBuilder {
    ParameterBuilder {
        def: ParameterDefinition::new(
            name,
            ParameterType::Code,
            ParameterValue::Code(default.to_string()),
        ),
    }
}

pub fn group_selector_parameter(name: &str, default: &str) -> ParameterBuilder {
    ParameterBuilder {
        def: ParameterDefinition::new(
            name,
            ParameterType::GroupSelector,
            ParameterValue::String(default.to_string()),
        ),
    }
}
