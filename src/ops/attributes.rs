//! Attribute operators: create, delete, color, wrangle.

use glam::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::attribute::{standard, AttributeType, ElementClass};
use crate::error::{CookError, CookResult};
use crate::geometry::GeometryHandle;
use crate::param::{
    code_parameter, float_parameter, int_parameter, string_parameter, ParameterDefinition,
};
use crate::sop::{CookContext, Operator};
use crate::wrangle;

fn class_from_index(index: i32) -> ElementClass {
    match index {
        0 => ElementClass::Point,
        1 => ElementClass::Vertex,
        2 => ElementClass::Primitive,
        _ => ElementClass::Detail,
    }
}

/// Create a typed attribute and fill the selected elements with a
/// default value.
pub struct AttributeCreateSop;

impl Operator for AttributeCreateSop {
    fn type_name(&self) -> &'static str {
        "AttributeCreate"
    }

    fn schema(&self) -> Vec<ParameterDefinition> {
        vec![
            string_parameter("name", "myattrib")
                .label("Name")
                .category("Attribute")
                .build(),
            int_parameter("class", 0)
                .label("Class")
                .options(&["Point", "Vertex", "Primitive", "Detail"])
                .category("Attribute")
                .description("Geometry element class to operate on")
                .build(),
            int_parameter("type", 0)
                .label("Type")
                .options(&["Float", "Vector", "Integer"])
                .category("Attribute")
                .build(),
            float_parameter("value_float", 0.0)
                .label("Value")
                .range(-1000.0, 1000.0)
                .category("Value")
                .visible_when("type", 0)
                .build(),
            float_parameter("value_x", 0.0)
                .label("X")
                .range(-1000.0, 1000.0)
                .category("Value")
                .visible_when("type", 1)
                .build(),
            float_parameter("value_y", 0.0)
                .label("Y")
                .range(-1000.0, 1000.0)
                .category("Value")
                .visible_when("type", 1)
                .build(),
            float_parameter("value_z", 0.0)
                .label("Z")
                .range(-1000.0, 1000.0)
                .category("Value")
                .visible_when("type", 1)
                .build(),
            int_parameter("value_int", 0)
                .label("Value")
                .int_range(-1000, 1000)
                .category("Value")
                .visible_when("type", 2)
                .build(),
        ]
    }

    fn execute(&mut self, ctx: &mut CookContext<'_>) -> CookResult<GeometryHandle> {
        let name: String = ctx.get("name", String::new());
        if name.is_empty() {
            return Err(CookError::parameter_invalid("attribute name is empty"));
        }
        let class = class_from_index(ctx.get("class", 0));
        let type_index = ctx.get("type", 0);

        let mut output = ctx.input_writable(0)?;
        let selected = {
            let geo = output.read().expect("non-empty");
            ctx.selected_elements(geo, class)?
        };
        let geo = output.write().expect("non-empty");
        match type_index {
            0 => {
                let value: f32 = ctx.get("value_float", 0.0);
                geo.attributes_mut(class)
                    .add(&name, AttributeType::Float, Default::default());
                let storage = geo
                    .attributes_mut(class)
                    .get_typed_mut::<f32>(&name)
                    .ok_or_else(|| {
                        CookError::parameter_invalid(format!(
                            "attribute '{name}' exists with a different type"
                        ))
                    })?;
                for &element in &selected {
                    storage.set(element, value);
                }
            }
            1 => {
                let value = Vec3::new(
                    ctx.get("value_x", 0.0),
                    ctx.get("value_y", 0.0),
                    ctx.get("value_z", 0.0),
                );
                geo.attributes_mut(class)
                    .add(&name, AttributeType::Vec3f, Default::default());
                let storage = geo
                    .attributes_mut(class)
                    .get_typed_mut::<Vec3>(&name)
                    .ok_or_else(|| {
                        CookError::parameter_invalid(format!(
                            "attribute '{name}' exists with a different type"
                        ))
                    })?;
                for &element in &selected {
                    storage.set(element, value);
                }
            }
            _ => {
                let value = ctx.get("value_int", 0);
                geo.attributes_mut(class)
                    .add(&name, AttributeType::Int, Default::default());
                let storage = geo
                    .attributes_mut(class)
                    .get_typed_mut::<i32>(&name)
                    .ok_or_else(|| {
                        CookError::parameter_invalid(format!(
                            "attribute '{name}' exists with a different type"
                        ))
                    })?;
                for &element in &selected {
                    storage.set(element, value);
                }
            }
        }
        Ok(output)
    }
}

/// Delete attributes matching a wildcard pattern.
pub struct AttributeDeleteSop;

impl Operator for AttributeDeleteSop {
    fn type_name(&self) -> &'static str {
        "AttributeDelete"
    }

    fn schema(&self) -> Vec<ParameterDefinition> {
        vec![
            string_parameter("pattern", "temp_*")
                .label("Pattern")
                .category("Attribute")
                .description("Wildcard pattern of attribute names to delete (* and ?)")
                .build(),
            int_parameter("class", 0)
                .label("Class")
                .options(&["Point", "Vertex", "Primitive", "Detail"])
                .category("Attribute")
                .build(),
            int_parameter("invert", 0)
                .label("Invert")
                .options(&["No", "Yes"])
                .category("Attribute")
                .description("Delete attributes NOT matching the pattern")
                .build(),
        ]
    }

    fn execute(&mut self, ctx: &mut CookContext<'_>) -> CookResult<GeometryHandle> {
        let pattern_text: String = ctx.get("pattern", String::new());
        let pattern = glob::Pattern::new(&pattern_text).map_err(|e| {
            CookError::parameter_invalid(format!("invalid pattern '{pattern_text}': {e}"))
        })?;
        let class = class_from_index(ctx.get("class", 0));
        let invert = ctx.get("invert", 0) != 0;

        let mut output = ctx.input_writable(0)?;
        let geo = output.write().expect("non-empty");
        let set = geo.attributes_mut(class);
        let doomed: Vec<String> = set
            .names()
            .iter()
            .filter(|name| {
                // Positions are load-bearing; never pattern-delete them.
                if class == ElementClass::Point && ***name == *standard::P {
                    return false;
                }
                pattern.matches(name) != invert
            })
            .map(|name| name.to_string())
            .collect();
        for name in doomed {
            set.remove(&name);
        }
        Ok(output)
    }
}

/// Write diffuse colors (`Cd`) on the chosen element class.
pub struct ColorSop;

impl Operator for ColorSop {
    fn type_name(&self) -> &'static str {
        "Color"
    }

    fn schema(&self) -> Vec<ParameterDefinition> {
        vec![
            int_parameter("color_mode", 0)
                .label("Mode")
                .options(&["Constant", "Random", "Ramp"])
                .category("Color")
                .build(),
            int_parameter("class", 0)
                .label("Class")
                .options(&["Point", "Vertex", "Primitive"])
                .category("Color")
                .build(),
            float_parameter("color_r", 1.0)
                .label("Red")
                .range(0.0, 1.0)
                .category("Constant")
                .visible_when("color_mode", 0)
                .build(),
            float_parameter("color_g", 1.0)
                .label("Green")
                .range(0.0, 1.0)
                .category("Constant")
                .visible_when("color_mode", 0)
                .build(),
            float_parameter("color_b", 1.0)
                .label("Blue")
                .range(0.0, 1.0)
                .category("Constant")
                .visible_when("color_mode", 0)
                .build(),
            int_parameter("seed", 0)
                .label("Seed")
                .int_range(0, 1_000_000)
                .category("Random")
                .visible_when("color_mode", 1)
                .build(),
            float_parameter("ramp_start_r", 0.0)
                .label("Start Red")
                .range(0.0, 1.0)
                .category("Ramp")
                .visible_when("color_mode", 2)
                .build(),
            float_parameter("ramp_start_g", 0.0)
                .label("Start Green")
                .range(0.0, 1.0)
                .category("Ramp")
                .visible_when("color_mode", 2)
                .build(),
            float_parameter("ramp_start_b", 1.0)
                .label("Start Blue")
                .range(0.0, 1.0)
                .category("Ramp")
                .visible_when("color_mode", 2)
                .build(),
            float_parameter("ramp_end_r", 1.0)
                .label("End Red")
                .range(0.0, 1.0)
                .category("Ramp")
                .visible_when("color_mode", 2)
                .build(),
            float_parameter("ramp_end_g", 0.0)
                .label("End Green")
                .range(0.0, 1.0)
                .category("Ramp")
                .visible_when("color_mode", 2)
                .build(),
            float_parameter("ramp_end_b", 0.0)
                .label("End Blue")
                .range(0.0, 1.0)
                .category("Ramp")
                .visible_when("color_mode", 2)
                .build(),
            int_parameter("ramp_axis", 1)
                .label("Ramp Axis")
                .options(&["X", "Y", "Z"])
                .category("Ramp")
                .visible_when("color_mode", 2)
                .build(),
        ]
    }

    fn execute(&mut self, ctx: &mut CookContext<'_>) -> CookResult<GeometryHandle> {
        let mode = ctx.get("color_mode", 0);
        let class = class_from_index(ctx.get("class", 0).min(2));

        let mut output = ctx.input_writable(0)?;
        let selected = {
            let geo = output.read().expect("non-empty");
            ctx.selected_elements(geo, class)?
        };
        let geo = output.write().expect("non-empty");

        // Element anchor positions drive the ramp.
        let anchors: Vec<Vec3> = match class {
            ElementClass::Point => geo
                .positions()
                .map(|p| p.as_slice().to_vec())
                .unwrap_or_default(),
            ElementClass::Vertex => {
                let positions = geo.positions();
                (0..geo.vertex_count())
                    .map(|v| {
                        let point = geo.topology().vertex_point(v) as usize;
                        positions.map(|p| *p.get(point)).unwrap_or(Vec3::ZERO)
                    })
                    .collect()
            }
            _ => (0..geo.primitive_count())
                .map(|prim| {
                    let positions = geo.positions();
                    let corners: Vec<Vec3> = geo
                        .topology()
                        .primitive_points(prim)
                        .filter_map(|p| positions.map(|s| *s.get(p as usize)))
                        .collect();
                    if corners.is_empty() {
                        Vec3::ZERO
                    } else {
                        corners.iter().sum::<Vec3>() / corners.len() as f32
                    }
                })
                .collect(),
        };

        geo.attributes_mut(class)
            .add(standard::CD, AttributeType::Vec3f, Default::default());

        let colors: Vec<(usize, Vec3)> = match mode {
            0 => {
                let constant = Vec3::new(
                    ctx.get("color_r", 1.0),
                    ctx.get("color_g", 1.0),
                    ctx.get("color_b", 1.0),
                );
                selected.iter().map(|&e| (e, constant)).collect()
            }
            1 => {
                let seed = ctx.get("seed", 0) as u64;
                // Per-element generator keeps colors stable under
                // reordering of the selection.
                selected
                    .iter()
                    .map(|&e| {
                        let mut rng = StdRng::seed_from_u64(seed ^ (e as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15));
                        (
                            e,
                            Vec3::new(rng.random(), rng.random(), rng.random()),
                        )
                    })
                    .collect()
            }
            _ => {
                let start = Vec3::new(
                    ctx.get("ramp_start_r", 0.0),
                    ctx.get("ramp_start_g", 0.0),
                    ctx.get("ramp_start_b", 1.0),
                );
                let end = Vec3::new(
                    ctx.get("ramp_end_r", 1.0),
                    ctx.get("ramp_end_g", 0.0),
                    ctx.get("ramp_end_b", 0.0),
                );
                let axis = crate::math::Axis::from_index(ctx.get("ramp_axis", 1));
                let (min, max) = anchors.iter().fold(
                    (f32::INFINITY, f32::NEG_INFINITY),
                    |(min, max), &p| {
                        let v = axis.component(p);
                        (min.min(v), max.max(v))
                    },
                );
                let span = (max - min).max(1e-12);
                selected
                    .iter()
                    .map(|&e| {
                        let t = (axis.component(anchors[e]) - min) / span;
                        (e, start.lerp(end, t))
                    })
                    .collect()
            }
        };

        let storage = geo
            .attributes_mut(class)
            .get_typed_mut::<Vec3>(standard::CD)
            .ok_or_else(|| {
                CookError::parameter_invalid("Cd exists with a non-vector type")
            })?;
        for (element, color) in colors {
            storage.set(element, color);
        }
        Ok(output)
    }
}

/// Per-element attribute expressions.
pub struct WrangleSop;

impl Operator for WrangleSop {
    fn type_name(&self) -> &'static str {
        "Wrangle"
    }

    fn schema(&self) -> Vec<ParameterDefinition> {
        vec![
            code_parameter("expression", "@Cd = set(1.0, 0.0, 0.0);")
                .label("Expression")
                .category("Wrangle")
                .hint("multiline")
                .build(),
            int_parameter("class", 0)
                .label("Run Over")
                .options(&["Points", "Vertices", "Primitives", "Detail"])
                .category("Wrangle")
                .build(),
        ]
    }

    fn execute(&mut self, ctx: &mut CookContext<'_>) -> CookResult<GeometryHandle> {
        let source: String = ctx.get("expression", String::new());
        let class = class_from_index(ctx.get("class", 0));

        let mut output = ctx.input_writable(0)?;
        let selected = {
            let geo = output.read().expect("non-empty");
            ctx.selected_elements(geo, class)?
        };

        let program = wrangle::parse(&source)
            .map_err(|e| CookError::parameter_invalid(format!("expression error: {e}")))?;

        // ch("name") resolves against this node's Float parameters.
        let mut channels = std::collections::HashMap::new();
        for name in program.channels() {
            channels.insert(name.clone(), ctx.get(name.as_str(), 0.0f32));
        }

        let geo = output.write().expect("non-empty");
        wrangle::run(geo, class, &selected, &program, &channels)
            .map_err(|e| CookError::algorithm_failure(format!("expression failed: {e}")))?;
        Ok(output)
    }
}
