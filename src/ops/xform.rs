//! Point-deforming operators: Transform, Bend, Twist, Align, Mirror,
//! Array.
//!
//! These all read the universal group filter and move only the selected
//! points; the input arrives as a copy-on-write handle, so the first
//! position write clones and upstream caches stay intact.

use glam::Vec3;

use crate::attribute::ElementClass;
use crate::error::{CookError, CookResult};
use crate::geometry::{GeometryContainer, GeometryHandle};
use crate::math::{self, Axis};
use crate::param::{
    bool_parameter, float_parameter, int_parameter, vector3_parameter, ParameterDefinition,
};
use crate::sop::{CookContext, InputConfig, Operator};

/// Scale, rotate (ZYX, degrees), translate — in that order.
pub struct TransformSop;

impl Operator for TransformSop {
    fn type_name(&self) -> &'static str {
        "Transform"
    }

    fn schema(&self) -> Vec<ParameterDefinition> {
        vec![
            vector3_parameter("translate", Vec3::ZERO)
                .label("Translate")
                .category("Transform")
                .build(),
            vector3_parameter("rotate", Vec3::ZERO)
                .label("Rotate")
                .category("Transform")
                .description("Rotation in degrees, applied in ZYX order")
                .build(),
            vector3_parameter("scale", Vec3::ONE)
                .label("Scale")
                .category("Transform")
                .build(),
        ]
    }

    fn execute(&mut self, ctx: &mut CookContext<'_>) -> CookResult<GeometryHandle> {
        let translate: Vec3 = ctx.get("translate", Vec3::ZERO);
        let rotate: Vec3 = ctx.get("rotate", Vec3::ZERO);
        let scale: Vec3 = ctx.get("scale", Vec3::ONE);
        let matrix = math::srt_matrix(translate, rotate, scale);

        let mut output = ctx.input_writable(0)?;
        let selected = {
            let geo = output.read().expect("non-empty");
            ctx.selected_elements(geo, ElementClass::Point)?
        };
        let geo = output.write().expect("non-empty");
        let Some(positions) = geo.positions_mut() else {
            return Err(CookError::input_invalid(
                "Transform requires a position attribute",
            ));
        };
        for point in selected {
            let p = *positions.get(point);
            positions.set(point, matrix.transform_point3(p));
        }
        Ok(output)
    }
}

/// Bend the capture region around an axis-perpendicular arc.
pub struct BendSop;

impl Operator for BendSop {
    fn type_name(&self) -> &'static str {
        "Bend"
    }

    fn schema(&self) -> Vec<ParameterDefinition> {
        vec![
            float_parameter("angle", 90.0)
                .label("Angle")
                .range(-360.0, 360.0)
                .category("Bend")
                .description("Total bend angle in degrees over the capture region")
                .build(),
            int_parameter("axis", 1)
                .label("Axis")
                .options(&["X", "Y", "Z"])
                .category("Bend")
                .build(),
            float_parameter("capture_origin", 0.0)
                .label("Capture Origin")
                .range(-100.0, 100.0)
                .category("Capture")
                .build(),
            float_parameter("capture_length", 1.0)
                .label("Capture Length")
                .range(0.001, 100.0)
                .category("Capture")
                .build(),
        ]
    }

    fn execute(&mut self, ctx: &mut CookContext<'_>) -> CookResult<GeometryHandle> {
        let angle: f32 = ctx.get("angle", 90.0);
        let axis = Axis::from_index(ctx.get("axis", 1));
        let capture_origin: f32 = ctx.get("capture_origin", 0.0);
        let capture_length: f32 = ctx.get("capture_length", 1.0).max(1e-4);

        let mut output = ctx.input_writable(0)?;
        let selected = {
            let geo = output.read().expect("non-empty");
            ctx.selected_elements(geo, ElementClass::Point)?
        };
        let geo = output.write().expect("non-empty");
        let Some(positions) = geo.positions_mut() else {
            return Err(CookError::input_invalid("Bend requires a position attribute"));
        };
        if angle.abs() < 1e-6 {
            return Ok(output);
        }

        let total = angle.to_radians();
        // Arc radius chosen so the capture region's length is preserved.
        let radius = capture_length / total;
        // Bend deforms along the axis; the "forward" direction is the
        // next axis in XYZ order, matching a bend of a Y-extruded shape
        // toward X when axis = Y.
        let (axial, forward) = match axis {
            Axis::X => (Vec3::X, Vec3::Y),
            Axis::Y => (Vec3::Y, Vec3::X),
            Axis::Z => (Vec3::Z, Vec3::X),
        };

        for point in selected {
            let p = *positions.get(point);
            let along = axial.dot(p) - capture_origin;
            if along <= 0.0 {
                continue;
            }
            let t = (along / capture_length).min(1.0);
            let theta = total * t;
            // Offset past the capture region continues straight along
            // the rotated tangent.
            let overshoot = (along - capture_length).max(0.0);

            let lateral = p - axial * axial.dot(p);
            let forward_dist = forward.dot(lateral);
            let rest = lateral - forward * forward_dist;

            // Map (along, forward) into the bend plane arc.
            let center_distance = radius - forward_dist;
            let arc = Vec3::new(
                center_distance * theta.sin(),
                radius - center_distance * theta.cos(),
                0.0,
            );
            let tangent = Vec3::new(theta.cos(), theta.sin(), 0.0);
            let bent2 = arc + tangent * overshoot;

            let new_p = axial * (capture_origin + bent2.x) + forward * bent2.y + rest;
            positions.set(point, new_p);
        }
        Ok(output)
    }
}

/// Twist points around an axis by angle proportional to axial distance.
pub struct TwistSop;

impl Operator for TwistSop {
    fn type_name(&self) -> &'static str {
        "Twist"
    }

    fn schema(&self) -> Vec<ParameterDefinition> {
        vec![
            float_parameter("angle", 90.0)
                .label("Angle")
                .range(-3600.0, 3600.0)
                .category("Twist")
                .description("Twist angle in degrees per unit distance along the axis")
                .build(),
            int_parameter("axis", 1)
                .label("Axis")
                .options(&["X", "Y", "Z"])
                .category("Twist")
                .build(),
            float_parameter("origin", 0.0)
                .label("Origin")
                .range(-100.0, 100.0)
                .category("Twist")
                .build(),
            int_parameter("rate", 0)
                .label("Rate")
                .options(&["Linear", "Squared"])
                .category("Twist")
                .build(),
        ]
    }

    fn execute(&mut self, ctx: &mut CookContext<'_>) -> CookResult<GeometryHandle> {
        let angle: f32 = ctx.get("angle", 90.0);
        let axis = Axis::from_index(ctx.get("axis", 1));
        let origin: f32 = ctx.get("origin", 0.0);
        let squared = ctx.get("rate", 0) == 1;

        let mut output = ctx.input_writable(0)?;
        let selected = {
            let geo = output.read().expect("non-empty");
            ctx.selected_elements(geo, ElementClass::Point)?
        };
        let geo = output.write().expect("non-empty");
        let Some(positions) = geo.positions_mut() else {
            return Err(CookError::input_invalid("Twist requires a position attribute"));
        };

        let axis_vec = axis.unit();
        let axis_origin = axis_vec * origin;
        for point in selected {
            let p = *positions.get(point);
            let distance = axis.component(p) - origin;
            let falloff = if squared {
                distance * distance.abs()
            } else {
                distance
            };
            let theta = (angle * falloff).to_radians();
            positions.set(point, math::rotate_around_axis(p, axis_origin, axis_vec, theta));
        }
        Ok(output)
    }
}

/// Shift all points by a bounding-box-derived offset.
pub struct AlignSop;

impl Operator for AlignSop {
    fn type_name(&self) -> &'static str {
        "Align"
    }

    fn schema(&self) -> Vec<ParameterDefinition> {
        vec![
            int_parameter("align_mode", 0)
                .label("Align Mode")
                .options(&["Center to Origin", "Min to Origin", "Max to Origin"])
                .category("Align")
                .build(),
            int_parameter("align_x", 1)
                .label("Align X")
                .options(&["Off", "On"])
                .category("Axes")
                .build(),
            int_parameter("align_y", 1)
                .label("Align Y")
                .options(&["Off", "On"])
                .category("Axes")
                .build(),
            int_parameter("align_z", 1)
                .label("Align Z")
                .options(&["Off", "On"])
                .category("Axes")
                .build(),
        ]
    }

    fn execute(&mut self, ctx: &mut CookContext<'_>) -> CookResult<GeometryHandle> {
        let mode = ctx.get("align_mode", 0);
        let mask = Vec3::new(
            if ctx.get("align_x", 1) != 0 { 1.0 } else { 0.0 },
            if ctx.get("align_y", 1) != 0 { 1.0 } else { 0.0 },
            if ctx.get("align_z", 1) != 0 { 1.0 } else { 0.0 },
        );

        let mut output = ctx.input_writable(0)?;
        let bounds = output.read().expect("non-empty").bounding_box();
        if bounds.is_empty() {
            return Ok(output);
        }
        let anchor = match mode {
            1 => bounds.min,
            2 => bounds.max,
            _ => bounds.center(),
        };
        let offset = -anchor * mask;

        let geo = output.write().expect("non-empty");
        if let Some(positions) = geo.positions_mut() {
            for p in positions.as_mut_slice() {
                *p += offset;
            }
        }
        Ok(output)
    }
}

/// Reflect geometry across a plane, optionally keeping the original.
pub struct MirrorSop;

impl Operator for MirrorSop {
    fn type_name(&self) -> &'static str {
        "Mirror"
    }

    fn schema(&self) -> Vec<ParameterDefinition> {
        vec![
            int_parameter("plane", 2)
                .label("Mirror Plane")
                .options(&["XY", "XZ", "YZ", "Custom"])
                .category("Mirror")
                .build(),
            vector3_parameter("custom_point", Vec3::ZERO)
                .label("Plane Point")
                .category("Custom Plane")
                .visible_when("plane", 3)
                .build(),
            vector3_parameter("custom_normal", Vec3::Y)
                .label("Plane Normal")
                .category("Custom Plane")
                .visible_when("plane", 3)
                .build(),
            bool_parameter("keep_original", true)
                .label("Keep Original")
                .category("Mirror")
                .description("Concatenate the mirrored copy with the input")
                .build(),
        ]
    }

    fn execute(&mut self, ctx: &mut CookContext<'_>) -> CookResult<GeometryHandle> {
        let plane = ctx.get("plane", 2);
        let keep_original: bool = ctx.get("keep_original", true);
        let (origin, normal) = match plane {
            0 => (Vec3::ZERO, Vec3::Z), // XY plane
            1 => (Vec3::ZERO, Vec3::Y), // XZ plane
            2 => (Vec3::ZERO, Vec3::X), // YZ plane
            _ => {
                let normal: Vec3 = ctx.get("custom_normal", Vec3::Y);
                (
                    ctx.get("custom_point", Vec3::ZERO),
                    normal.try_normalize().ok_or_else(|| {
                        CookError::parameter_invalid("mirror plane normal is zero-length")
                    })?,
                )
            }
        };

        let input = ctx.input_geometry(0)?;
        let mut mirrored = input.clone();
        if let Some(positions) = mirrored.positions_mut() {
            for p in positions.as_mut_slice() {
                *p = math::reflect_across_plane(*p, origin, normal);
            }
        }
        // A reflection flips handedness; reverse winding to compensate.
        reverse_winding(&mut mirrored);
        if let Some(normals) = mirrored.point_normals_mut() {
            for n in normals.as_mut_slice() {
                *n = math::reflect_across_plane(*n, Vec3::ZERO, normal);
            }
        }
        if let Some(normals) = mirrored.vertex_normals_mut() {
            for n in normals.as_mut_slice() {
                *n = math::reflect_across_plane(*n, Vec3::ZERO, normal);
            }
        }

        if keep_original {
            let combined = super::combine::concatenate(&[input, &mirrored]);
            Ok(combined.into())
        } else {
            Ok(mirrored.into())
        }
    }
}

/// Reverse every primitive's vertex order in place.
pub(crate) fn reverse_winding(geo: &mut GeometryContainer) {
    let topology = geo.topology_mut();
    for prim in 0..topology.primitive_count() {
        let mut vertices = topology.primitive_vertices(prim).to_vec();
        vertices.reverse();
        topology.set_primitive_vertices(prim, vertices);
    }
}

/// Duplicate the input N times with an accumulating transform.
pub struct ArraySop;

impl Operator for ArraySop {
    fn type_name(&self) -> &'static str {
        "Array"
    }

    fn schema(&self) -> Vec<ParameterDefinition> {
        vec![
            int_parameter("copies", 3)
                .label("Copies")
                .int_range(1, 1000)
                .category("Array")
                .description("Total number of copies, the original included")
                .build(),
            vector3_parameter("translate_step", Vec3::new(1.0, 0.0, 0.0))
                .label("Translate Step")
                .category("Per-Copy Transform")
                .build(),
            vector3_parameter("rotate_step", Vec3::ZERO)
                .label("Rotate Step")
                .category("Per-Copy Transform")
                .description("Per-copy rotation in degrees, ZYX order")
                .build(),
            vector3_parameter("scale_step", Vec3::ONE)
                .label("Scale Step")
                .category("Per-Copy Transform")
                .build(),
        ]
    }

    fn execute(&mut self, ctx: &mut CookContext<'_>) -> CookResult<GeometryHandle> {
        let copies = ctx.get("copies", 3).max(1) as usize;
        let translate: Vec3 = ctx.get("translate_step", Vec3::new(1.0, 0.0, 0.0));
        let rotate: Vec3 = ctx.get("rotate_step", Vec3::ZERO);
        let scale: Vec3 = ctx.get("scale_step", Vec3::ONE);
        let step = math::srt_matrix(translate, rotate, scale);

        let input = ctx.input_geometry(0)?;
        let mut parts: Vec<GeometryContainer> = Vec::with_capacity(copies);
        let mut matrix = glam::Mat4::IDENTITY;
        for _ in 0..copies {
            let mut copy = input.clone();
            if let Some(positions) = copy.positions_mut() {
                for p in positions.as_mut_slice() {
                    *p = matrix.transform_point3(*p);
                }
            }
            parts.push(copy);
            matrix = step * matrix;
        }
        let refs: Vec<&GeometryContainer> = parts.iter().collect();
        Ok(super::combine::concatenate(&refs).into())
    }
}
