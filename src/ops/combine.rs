//! Combining operators: Merge, Switch, Boolean, CopyToPoints.

use glam::{Mat4, Quat, Vec3};

use crate::attribute::{standard, ElementClass};
use crate::error::{CookError, CookResult};
use crate::geometry::{GeometryContainer, GeometryHandle};
use crate::param::{bool_parameter, float_parameter, int_parameter, ParameterDefinition};
use crate::processing::boolean::{self, BooleanOp};
use crate::sop::{CookContext, InputConfig, InputKind, Operator};

/// Concatenate containers: points, vertices and primitives re-indexed by
/// offset; attribute sets unioned by name. When two inputs carry the
/// same attribute name with different types, the later input's type wins
/// and elements from earlier inputs default-fill. Detail attributes copy
/// from the first input whose storage matches the unified type.
pub(crate) fn concatenate(parts: &[&GeometryContainer]) -> GeometryContainer {
    let mut out = GeometryContainer::new();

    // Union the attribute layouts.
    for class in [
        ElementClass::Point,
        ElementClass::Vertex,
        ElementClass::Primitive,
        ElementClass::Detail,
    ] {
        for part in parts {
            for (name, storage) in part.attributes(class).iter() {
                let set = out.attributes_mut(class);
                let existing = set.get(name).map(|s| s.attribute_type());
                match existing {
                    Some(t) if t == storage.attribute_type() => {}
                    Some(_) => {
                        // Documented edge case: the later input's type
                        // wins; earlier elements fall back to defaults.
                        set.remove(name);
                        set.add(
                            name,
                            storage.attribute_type(),
                            storage.descriptor().interpolation(),
                        );
                    }
                    None => {
                        set.add(
                            name,
                            storage.attribute_type(),
                            storage.descriptor().interpolation(),
                        );
                    }
                }
            }
        }
    }

    for part in parts {
        let point_offset = out.point_count();
        out.set_point_count(point_offset + part.point_count());
        for point in 0..part.point_count() {
            out.copy_element_attributes(ElementClass::Point, point_offset + point, part, point);
        }

        let vertex_offset = out.vertex_count();
        for vertex in 0..part.vertex_count() {
            let point = part.topology().vertex_point(vertex) as usize + point_offset;
            let new_vertex = out.add_vertex(point as u32);
            out.copy_element_attributes(ElementClass::Vertex, new_vertex, part, vertex);
        }

        for prim in 0..part.primitive_count() {
            let vertices: Vec<u32> = part
                .topology()
                .primitive_vertices(prim)
                .iter()
                .map(|&v| v + vertex_offset as u32)
                .collect();
            let new_prim = out.add_primitive(vertices);
            out.copy_element_attributes(ElementClass::Primitive, new_prim, part, prim);
        }
    }

    // Detail values: the first input whose storage matches the unified
    // type wins. Inputs the layout loop out-typed are skipped, so a
    // re-typed slot never default-fills when a matching input exists.
    let names: Vec<String> = out
        .detail_attributes()
        .names()
        .iter()
        .map(|s| s.to_string())
        .collect();
    for name in names {
        let Some(unified) = out
            .detail_attributes()
            .get(&name)
            .map(|s| s.attribute_type())
        else {
            continue;
        };
        for part in parts {
            let Some(src_storage) = part.detail_attributes().get(&name) else {
                continue;
            };
            if src_storage.attribute_type() != unified {
                continue;
            }
            if let Some(dst_storage) = out.detail_attributes_mut().get_mut(&name) {
                dst_storage.copy_element(0, src_storage, 0);
            }
            break;
        }
    }
    out
}

/// Concatenate every connected input into one geometry.
pub struct MergeSop;

impl Operator for MergeSop {
    fn type_name(&self) -> &'static str {
        "Merge"
    }

    fn input_config(&self) -> InputConfig {
        InputConfig::multi_dynamic()
    }

    fn execute(&mut self, ctx: &mut CookContext<'_>) -> CookResult<GeometryHandle> {
        let inputs: Vec<&GeometryContainer> = ctx
            .inputs()
            .iter()
            .filter_map(|handle| handle.read())
            .collect();
        if inputs.is_empty() {
            return Err(CookError::input_missing("Merge requires input geometry"));
        }
        Ok(concatenate(&inputs).into())
    }
}

/// Pass one selected input through.
pub struct SwitchSop;

impl Operator for SwitchSop {
    fn type_name(&self) -> &'static str {
        "Switch"
    }

    fn input_config(&self) -> InputConfig {
        InputConfig::multi_fixed(10)
    }

    fn schema(&self) -> Vec<ParameterDefinition> {
        vec![int_parameter("index", 0)
            .label("Input Index")
            .int_range(0, 9)
            .category("Switch")
            .description("Which input to pass through")
            .build()]
    }

    fn execute(&mut self, ctx: &mut CookContext<'_>) -> CookResult<GeometryHandle> {
        let index = ctx.get("index", 0);
        if index < 0 || index as usize >= ctx.input_count() {
            return Err(CookError::parameter_invalid(format!(
                "switch index {index} is out of range (inputs: {})",
                ctx.input_count()
            )));
        }
        let handle = ctx.input(index as usize);
        if handle.is_empty() {
            return Err(CookError::input_missing(format!(
                "switch input {index} is not connected"
            )));
        }
        Ok(handle)
    }
}

/// Boolean operation between two closed manifold solids.
pub struct BooleanSop;

impl Operator for BooleanSop {
    fn type_name(&self) -> &'static str {
        "Boolean"
    }

    fn input_config(&self) -> InputConfig {
        InputConfig::dual()
    }

    fn schema(&self) -> Vec<ParameterDefinition> {
        vec![int_parameter("operation", 0)
            .label("Operation")
            .options(&["Union", "Intersection", "Difference", "Symmetric Difference"])
            .category("Boolean")
            .build()]
    }

    fn execute(&mut self, ctx: &mut CookContext<'_>) -> CookResult<GeometryHandle> {
        let a = ctx.input_geometry(0)?;
        let b = ctx.input_geometry(1)?;
        let op = BooleanOp::from_index(ctx.get("operation", 0));
        Ok(boolean::compute(a, b, op)?.into())
    }
}

/// Stamp a template onto every point of the second input.
pub struct CopyToPointsSop;

impl Operator for CopyToPointsSop {
    fn type_name(&self) -> &'static str {
        "CopyToPoints"
    }

    fn input_config(&self) -> InputConfig {
        InputConfig {
            kind: InputKind::Dual,
            min_count: 2,
            max_count: Some(2),
            initial_pins: 2,
        }
    }

    fn schema(&self) -> Vec<ParameterDefinition> {
        vec![
            bool_parameter("use_point_normals", true)
                .label("Orient to Normals")
                .category("Copy")
                .description("Rotate each copy so +Z follows the target point normal")
                .build(),
            bool_parameter("use_point_scale", true)
                .label("Use Point Scale")
                .category("Copy")
                .description("Scale each copy by the target point's pscale attribute")
                .build(),
            float_parameter("uniform_scale", 1.0)
                .label("Uniform Scale")
                .range(0.001, 100.0)
                .category("Copy")
                .build(),
        ]
    }

    fn execute(&mut self, ctx: &mut CookContext<'_>) -> CookResult<GeometryHandle> {
        let template = ctx.input_geometry(0)?;
        let targets = ctx.input_geometry(1)?;
        let use_normals: bool = ctx.get("use_point_normals", true);
        let use_scale: bool = ctx.get("use_point_scale", true);
        let uniform_scale: f32 = ctx.get("uniform_scale", 1.0);

        let Some(target_positions) = targets.positions() else {
            return Err(CookError::input_invalid(
                "CopyToPoints target input has no position attribute",
            ));
        };
        let normals = targets.point_normals();
        let scales = targets
            .point_attributes()
            .get_typed::<f32>(standard::PSCALE);

        let mut copies: Vec<GeometryContainer> = Vec::with_capacity(targets.point_count());
        for target in 0..targets.point_count() {
            let mut scale = uniform_scale;
            if use_scale {
                if let Some(pscale) = scales {
                    scale *= *pscale.get(target);
                }
            }
            let rotation = match (use_normals, normals) {
                (true, Some(n)) => {
                    let normal = n.get(target).try_normalize().unwrap_or(Vec3::Z);
                    Quat::from_rotation_arc(Vec3::Z, normal)
                }
                _ => Quat::IDENTITY,
            };
            let matrix = Mat4::from_scale_rotation_translation(
                Vec3::splat(scale),
                rotation,
                *target_positions.get(target),
            );

            let mut copy = template.clone();
            if let Some(positions) = copy.positions_mut() {
                for p in positions.as_mut_slice() {
                    *p = matrix.transform_point3(*p);
                }
            }
            if let Some(point_normals) = copy.point_normals_mut() {
                for n in point_normals.as_mut_slice() {
                    *n = rotation * *n;
                }
            }
            if let Some(vertex_normals) = copy.vertex_normals_mut() {
                for n in vertex_normals.as_mut_slice() {
                    *n = rotation * *n;
                }
            }
            copies.push(copy);
        }

        let refs: Vec<&GeometryContainer> = copies.iter().collect();
        Ok(concatenate(&refs).into())
    }
}
