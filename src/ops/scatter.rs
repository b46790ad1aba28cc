//! Point scattering: on surfaces and inside volumes.

use glam::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::attribute::ElementClass;
use crate::error::{CookError, CookResult};
use crate::geometry::{GeometryContainer, GeometryHandle};
use crate::param::{float_parameter, int_parameter, ParameterDefinition};
use crate::processing::sampling;
use crate::sop::{CookContext, Operator};

/// Scatter points over the input surface, area-weighted, with point
/// attributes interpolated from the source triangle corners.
pub struct ScatterSop;

impl Operator for ScatterSop {
    fn type_name(&self) -> &'static str {
        "Scatter"
    }

    fn schema(&self) -> Vec<ParameterDefinition> {
        vec![
            int_parameter("count", 100)
                .label("Count")
                .int_range(1, 1_000_000)
                .category("Scatter")
                .build(),
            int_parameter("seed", 12345)
                .label("Seed")
                .int_range(0, 1_000_000)
                .category("Scatter")
                .build(),
        ]
    }

    fn execute(&mut self, ctx: &mut CookContext<'_>) -> CookResult<GeometryHandle> {
        let count = ctx.get("count", 100).max(1) as usize;
        let seed = ctx.get("seed", 12345) as u64;

        // The group filter reduces the surface to the selected
        // primitives before sampling.
        let filtered = ctx.apply_group_filter(0, ElementClass::Primitive, true)?;
        let input = filtered.read().ok_or_else(|| {
            CookError::input_missing("Scatter requires input geometry")
        })?;
        if input.positions().is_none() {
            return Err(CookError::input_invalid(
                "Scatter requires a position attribute",
            ));
        }
        if input.primitive_count() == 0 {
            return Err(CookError::input_invalid(
                "Scatter requires primitives to sample",
            ));
        }

        let mut rng = StdRng::seed_from_u64(seed);
        let samples = sampling::sample_surface(input, count, &mut rng);

        let mut out = GeometryContainer::new();
        out.adopt_attribute_layout(input);
        out.set_point_count(samples.len());
        for (index, sample) in samples.iter().enumerate() {
            let [a, b, c] = sample.triangle.points;
            out.blend_element_attributes(
                ElementClass::Point,
                index,
                input,
                &[a as usize, b as usize, c as usize],
                &[1.0 - sample.u - sample.v, sample.u, sample.v],
            );
        }
        let positions = out.positions_mut().ok_or_else(|| {
            CookError::input_invalid("Scatter requires a position attribute")
        })?;
        for (index, sample) in samples.iter().enumerate() {
            positions.set(index, sample.position);
        }
        Ok(out.into())
    }
}

/// Scatter points inside the input's bounding box or enclosed volume.
pub struct ScatterVolumeSop;

impl Operator for ScatterVolumeSop {
    fn type_name(&self) -> &'static str {
        "ScatterVolume"
    }

    fn schema(&self) -> Vec<ParameterDefinition> {
        vec![
            int_parameter("count", 100)
                .label("Count")
                .int_range(1, 1_000_000)
                .category("Scatter")
                .build(),
            int_parameter("seed", 12345)
                .label("Seed")
                .int_range(0, 1_000_000)
                .category("Scatter")
                .build(),
            int_parameter("distribution_mode", 0)
                .label("Distribution")
                .options(&["Random", "Uniform Grid", "Poisson Disk"])
                .category("Scatter")
                .build(),
            int_parameter("volume_mode", 0)
                .label("Volume")
                .options(&["Bounding Box", "Inside Mesh"])
                .category("Scatter")
                .build(),
            float_parameter("min_distance", 0.1)
                .label("Min Distance")
                .range(0.001, 10.0)
                .category("Scatter")
                .visible_when("distribution_mode", 2)
                .build(),
        ]
    }

    fn execute(&mut self, ctx: &mut CookContext<'_>) -> CookResult<GeometryHandle> {
        let count = ctx.get("count", 100).max(1) as usize;
        let seed = ctx.get("seed", 12345) as u64;
        let distribution = ctx.get("distribution_mode", 0);
        let inside_mesh = ctx.get("volume_mode", 0) == 1;
        let min_distance: f32 = ctx.get("min_distance", 0.1);

        let input = ctx.input_geometry(0)?;
        let bounds = input.bounding_box();
        if bounds.is_empty() {
            return Err(CookError::input_invalid(
                "ScatterVolume input has no positions",
            ));
        }
        let triangles = if inside_mesh {
            let tris = sampling::triangulate(input);
            if tris.is_empty() {
                return Err(CookError::input_invalid(
                    "inside-mesh scattering requires primitives",
                ));
            }
            tris
        } else {
            Vec::new()
        };
        let accept = |p: Vec3| {
            if inside_mesh {
                sampling::point_inside_mesh(input, &triangles, p)
            } else {
                true
            }
        };

        let extent = bounds.extent();
        let mut rng = StdRng::seed_from_u64(seed);
        let mut random_point = |rng: &mut StdRng| {
            bounds.min
                + Vec3::new(
                    rng.random::<f32>() * extent.x,
                    rng.random::<f32>() * extent.y,
                    rng.random::<f32>() * extent.z,
                )
        };

        let mut points: Vec<Vec3> = Vec::with_capacity(count);
        match distribution {
            // Random: rejection-sample until the budget is met.
            0 | 2 => {
                let mut attempts = 0usize;
                let max_attempts = count * 100;
                while points.len() < count && attempts < max_attempts {
                    attempts += 1;
                    let p = random_point(&mut rng);
                    if !accept(p) {
                        continue;
                    }
                    if distribution == 2 {
                        let min_sq = min_distance * min_distance;
                        if points.iter().any(|q| q.distance_squared(p) < min_sq) {
                            continue;
                        }
                    }
                    points.push(p);
                }
            }
            // Uniform grid: a lattice sized to roughly the requested
            // count, filtered by the volume test.
            _ => {
                let volume = (extent.x * extent.y * extent.z).max(1e-9);
                let cell = (volume / count as f32).cbrt().max(1e-6);
                let steps = |span: f32| ((span / cell).ceil() as usize).max(1);
                let (nx, ny, nz) = (steps(extent.x), steps(extent.y), steps(extent.z));
                'outer: for iz in 0..nz {
                    for iy in 0..ny {
                        for ix in 0..nx {
                            let p = bounds.min
                                + Vec3::new(
                                    (ix as f32 + 0.5) / nx as f32 * extent.x,
                                    (iy as f32 + 0.5) / ny as f32 * extent.y,
                                    (iz as f32 + 0.5) / nz as f32 * extent.z,
                                );
                            if accept(p) {
                                points.push(p);
                                if points.len() >= count {
                                    break 'outer;
                                }
                            }
                        }
                    }
                }
            }
        }

        let mut out = GeometryContainer::new();
        out.ensure_position_attribute();
        out.set_point_count(points.len());
        let storage = out.positions_mut().expect("ensured above");
        for (index, p) in points.into_iter().enumerate() {
            storage.set(index, p);
        }
        Ok(out.into())
    }
}
