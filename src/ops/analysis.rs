//! Surface analysis operators: Geodesic, Curvature, UVUnwrap,
//! Parameterize.

use crate::attribute::{AttributeType, ElementClass};
use crate::error::{CookError, CookResult};
use crate::geometry::{group, GeometryHandle};
use crate::param::{
    bool_parameter, float_parameter, int_parameter, string_parameter, ParameterDefinition,
};
use crate::processing::measure;
use crate::sop::{CookContext, Operator};

/// Geodesic distance from a seed group, written to a point attribute.
pub struct GeodesicSop;

impl Operator for GeodesicSop {
    fn type_name(&self) -> &'static str {
        "Geodesic"
    }

    fn schema(&self) -> Vec<ParameterDefinition> {
        vec![
            int_parameter("method", 0)
                .label("Method")
                .options(&["Dijkstra", "Heat"])
                .category("Geodesic")
                .build(),
            string_parameter("seed_group", "")
                .label("Seed Group")
                .category("Geodesic")
                .description("Point group the distance field grows from")
                .build(),
            float_parameter("max_distance", 0.0)
                .label("Max Distance")
                .range(0.0, 1000.0)
                .category("Geodesic")
                .description("Stop expanding past this distance (0 = unlimited)")
                .build(),
            string_parameter("output_attribute", "geodesic_dist")
                .label("Output Attribute")
                .category("Geodesic")
                .build(),
        ]
    }

    fn execute(&mut self, ctx: &mut CookContext<'_>) -> CookResult<GeometryHandle> {
        if ctx.get("method", 0) == 1 {
            return Err(CookError::algorithm_failure(
                "heat-method geodesics are not implemented",
            ));
        }
        let seed_group: String = ctx.get("seed_group", String::new());
        let max_distance: f32 = ctx.get("max_distance", 0.0);
        let output_attribute: String = ctx.get("output_attribute", "geodesic_dist".to_string());

        let mut output = ctx.input_writable(0)?;
        let geo = output.write().expect("non-empty");
        let seeds: Vec<usize> = if seed_group.is_empty() {
            // Default seed is point 0, matching a click on the first point.
            if geo.point_count() == 0 {
                return Err(CookError::input_invalid("Geodesic input has no points"));
            }
            vec![0]
        } else {
            if !group::has_group(geo, &seed_group, ElementClass::Point) {
                return Err(CookError::parameter_invalid(format!(
                    "seed group '{seed_group}' does not exist"
                )));
            }
            group::group_elements(geo, &seed_group, ElementClass::Point)
        };

        let distances = measure::geodesic_distance(geo, &seeds, max_distance);
        geo.add_point_attribute(&output_attribute, AttributeType::Float);
        let storage = geo
            .get_point_attribute_typed_mut::<f32>(&output_attribute)
            .ok_or_else(|| {
                CookError::parameter_invalid(format!(
                    "attribute '{output_attribute}' exists with a different type"
                ))
            })?;
        for (point, distance) in distances.into_iter().enumerate() {
            storage.set(point, distance);
        }
        Ok(output)
    }
}

/// Discrete curvature, written to a `curvature` point attribute.
pub struct CurvatureSop;

impl Operator for CurvatureSop {
    fn type_name(&self) -> &'static str {
        "Curvature"
    }

    fn schema(&self) -> Vec<ParameterDefinition> {
        vec![
            int_parameter("curvature_type", 0)
                .label("Type")
                .options(&["Mean", "Gaussian"])
                .category("Curvature")
                .build(),
            bool_parameter("use_absolute", false)
                .label("Absolute")
                .category("Curvature")
                .build(),
            bool_parameter("smooth", true)
                .label("Smooth")
                .category("Curvature")
                .build(),
            int_parameter("smoothing_iterations", 2)
                .label("Smoothing Iterations")
                .int_range(1, 20)
                .category("Curvature")
                .visible_when("smooth", 1)
                .build(),
        ]
    }

    fn execute(&mut self, ctx: &mut CookContext<'_>) -> CookResult<GeometryHandle> {
        let gaussian = ctx.get("curvature_type", 0) == 1;
        let use_absolute: bool = ctx.get("use_absolute", false);
        let smooth: bool = ctx.get("smooth", true);
        let iterations = ctx.get("smoothing_iterations", 2).max(1) as usize;

        let mut output = ctx.input_writable(0)?;
        let geo = output.write().expect("non-empty");
        if geo.positions().is_none() {
            return Err(CookError::input_invalid(
                "Curvature requires a position attribute",
            ));
        }

        let mut values = if gaussian {
            measure::gaussian_curvature(geo)
        } else {
            measure::mean_curvature(geo)
        };
        if use_absolute {
            for v in &mut values {
                *v = v.abs();
            }
        }
        if smooth {
            let neighbors = crate::processing::adjacency::point_neighbors(geo);
            for _ in 0..iterations {
                let snapshot = values.clone();
                for (point, value) in values.iter_mut().enumerate() {
                    if neighbors[point].is_empty() {
                        continue;
                    }
                    let sum: f32 = neighbors[point]
                        .iter()
                        .map(|&n| snapshot[n as usize])
                        .sum();
                    *value = (snapshot[point] + sum / neighbors[point].len() as f32) * 0.5;
                }
            }
        }

        geo.add_point_attribute("curvature", AttributeType::Float);
        let storage = geo
            .get_point_attribute_typed_mut::<f32>("curvature")
            .ok_or_else(|| {
                CookError::parameter_invalid("'curvature' exists with a different type")
            })?;
        for (point, value) in values.into_iter().enumerate() {
            storage.set(point, value);
        }
        Ok(output)
    }
}

/// Atlas-style UV unwrap; delegated algorithm not carried by this build.
pub struct UvUnwrapSop;

impl Operator for UvUnwrapSop {
    fn type_name(&self) -> &'static str {
        "UVUnwrap"
    }

    fn schema(&self) -> Vec<ParameterDefinition> {
        vec![string_parameter("uv_attribute", "uv")
            .label("UV Attribute")
            .category("UV")
            .build()]
    }

    fn execute(&mut self, ctx: &mut CookContext<'_>) -> CookResult<GeometryHandle> {
        let _ = ctx.input_geometry(0)?;
        Err(CookError::algorithm_failure(
            "UV unwrapping is not implemented",
        ))
    }
}

/// Harmonic/LSCM parameterization; delegated algorithm not carried by
/// this build.
pub struct ParameterizeSop;

impl Operator for ParameterizeSop {
    fn type_name(&self) -> &'static str {
        "Parameterize"
    }

    fn schema(&self) -> Vec<ParameterDefinition> {
        vec![
            int_parameter("method", 0)
                .label("Method")
                .options(&["Harmonic", "LSCM"])
                .category("Parameterize")
                .build(),
            bool_parameter("use_uniform_weights", false)
                .label("Uniform Weights")
                .category("Parameterize")
                .build(),
            string_parameter("uv_attribute", "uv")
                .label("UV Attribute")
                .category("Parameterize")
                .build(),
        ]
    }

    fn execute(&mut self, ctx: &mut CookContext<'_>) -> CookResult<GeometryHandle> {
        let _ = ctx.input_geometry(0)?;
        Err(CookError::algorithm_failure(
            "surface parameterization is not implemented",
        ))
    }
}
