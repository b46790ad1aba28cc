//! Topology- and surface-modifying operators.

use glam::Vec3;
use rayon::prelude::*;

use crate::attribute::ElementClass;
use crate::error::{CookError, CookResult};
use crate::geometry::{GeometryContainer, GeometryHandle};
use crate::param::{bool_parameter, float_parameter, int_parameter, ParameterDefinition};
use crate::processing::{decimate, normals, repair, smooth, subdivide};
use crate::sop::{CookContext, InputConfig, Operator};

/// Subdivision surfaces. Catmull-Clark is implemented; the other schemes
/// are delegated algorithms this build does not carry.
pub struct SubdivideSop;

impl Operator for SubdivideSop {
    fn type_name(&self) -> &'static str {
        "Subdivide"
    }

    fn schema(&self) -> Vec<ParameterDefinition> {
        vec![
            int_parameter("subdivision_type", 0)
                .label("Type")
                .options(&["Catmull-Clark", "Loop", "Quad-Tri"])
                .category("Subdivide")
                .build(),
            int_parameter("levels", 1)
                .label("Levels")
                .int_range(1, 5)
                .category("Subdivide")
                .build(),
        ]
    }

    fn execute(&mut self, ctx: &mut CookContext<'_>) -> CookResult<GeometryHandle> {
        let input = ctx.input_geometry(0)?;
        let levels = ctx.get("levels", 1).max(1) as usize;
        match ctx.get("subdivision_type", 0) {
            0 => Ok(subdivide::catmull_clark(input, levels).into()),
            1 => Err(CookError::algorithm_failure(
                "Loop subdivision is not implemented",
            )),
            _ => Err(CookError::algorithm_failure(
                "Quad-Tri subdivision is not implemented",
            )),
        }
    }
}

/// Laplacian smoothing.
pub struct SmoothSop;

impl Operator for SmoothSop {
    fn type_name(&self) -> &'static str {
        "Smooth"
    }

    fn schema(&self) -> Vec<ParameterDefinition> {
        vec![
            int_parameter("method", 0)
                .label("Method")
                .options(&["Explicit", "Implicit", "Fairing"])
                .category("Smooth")
                .build(),
            int_parameter("iterations", 10)
                .label("Iterations")
                .int_range(1, 500)
                .category("Smooth")
                .build(),
            int_parameter("laplace_type", 0)
                .label("Laplacian")
                .options(&["Cotangent", "Uniform"])
                .category("Smooth")
                .build(),
            float_parameter("timestep", 0.001)
                .label("Timestep")
                .range(0.000_01, 1.0)
                .category("Smooth")
                .visible_when("method", 1)
                .build(),
            int_parameter("rescale", 1)
                .label("Rescale")
                .options(&["Off", "On"])
                .category("Smooth")
                .description("Restore the original bounding box after smoothing")
                .build(),
        ]
    }

    fn execute(&mut self, ctx: &mut CookContext<'_>) -> CookResult<GeometryHandle> {
        let method = ctx.get("method", 0);
        if method == 1 {
            return Err(CookError::algorithm_failure(
                "implicit smoothing solve is not implemented",
            ));
        }
        if method == 2 {
            return Err(CookError::algorithm_failure(
                "fairing smoothing is not implemented",
            ));
        }
        let iterations = ctx.get("iterations", 10).max(1) as usize;
        let weights = if ctx.get("laplace_type", 0) == 0 {
            smooth::LaplacianWeights::Cotangent
        } else {
            smooth::LaplacianWeights::Uniform
        };
        let rescale = ctx.get("rescale", 1) != 0;

        let mut output = ctx.input_writable(0)?;
        let (selected, bounds) = {
            let geo = output.read().expect("non-empty");
            let selected = ctx.selected_elements(geo, ElementClass::Point)?;
            (selected, geo.bounding_box())
        };
        let mask = if ctx.group_name().is_some() {
            let mut mask = vec![false; output.read().expect("non-empty").point_count()];
            for point in selected {
                mask[point] = true;
            }
            Some(mask)
        } else {
            None
        };

        let geo = output.write().expect("non-empty");
        smooth::laplacian_smooth(geo, weights, iterations, 0.5, mask.as_deref());
        if rescale {
            smooth::rescale_to_bounds(geo, bounds);
        }
        Ok(output)
    }
}

/// Incremental remeshing interface; the kernel is a delegated algorithm
/// this build does not carry.
pub struct RemeshSop;

impl Operator for RemeshSop {
    fn type_name(&self) -> &'static str {
        "Remesh"
    }

    fn schema(&self) -> Vec<ParameterDefinition> {
        vec![
            float_parameter("target_edge_length", 0.1)
                .label("Target Edge Length")
                .range(0.001, 10.0)
                .category("Remesh")
                .build(),
            int_parameter("iterations", 10)
                .label("Iterations")
                .int_range(1, 100)
                .category("Remesh")
                .build(),
            int_parameter("preserve_boundaries", 1)
                .label("Preserve Boundaries")
                .options(&["Off", "On"])
                .category("Remesh")
                .build(),
            int_parameter("adaptive", 0)
                .label("Adaptive")
                .options(&["Off", "On"])
                .category("Remesh")
                .build(),
            float_parameter("approx_error", 0.01)
                .label("Approximation Error")
                .range(0.000_1, 1.0)
                .category("Remesh")
                .visible_when("adaptive", 1)
                .build(),
        ]
    }

    fn execute(&mut self, ctx: &mut CookContext<'_>) -> CookResult<GeometryHandle> {
        let _ = ctx.input_geometry(0)?;
        let target: f32 = ctx.get("target_edge_length", 0.1);
        if target <= 0.0 {
            return Err(CookError::parameter_invalid(
                "target edge length must be positive",
            ));
        }
        Err(CookError::algorithm_failure(
            "remeshing kernel is not implemented",
        ))
    }
}

/// Shortest-edge-collapse decimation.
pub struct DecimateSop;

impl Operator for DecimateSop {
    fn type_name(&self) -> &'static str {
        "Decimate"
    }

    fn schema(&self) -> Vec<ParameterDefinition> {
        vec![
            int_parameter("target_mode", 0)
                .label("Target")
                .options(&["Percentage", "Point Count"])
                .category("Decimate")
                .build(),
            float_parameter("target_percentage", 50.0)
                .label("Percentage")
                .range(1.0, 100.0)
                .category("Decimate")
                .visible_when("target_mode", 0)
                .build(),
            int_parameter("target_point_count", 100)
                .label("Point Count")
                .int_range(3, 1_000_000)
                .category("Decimate")
                .visible_when("target_mode", 1)
                .build(),
            bool_parameter("preserve_boundaries", true)
                .label("Preserve Boundaries")
                .category("Decimate")
                .build(),
        ]
    }

    fn execute(&mut self, ctx: &mut CookContext<'_>) -> CookResult<GeometryHandle> {
        let input = ctx.input_geometry(0)?;
        let target = match ctx.get("target_mode", 0) {
            0 => {
                let percentage: f32 = ctx.get("target_percentage", 50.0);
                ((input.point_count() as f32 * percentage / 100.0).round() as usize).max(3)
            }
            _ => ctx.get("target_point_count", 100).max(3) as usize,
        };
        let preserve_boundaries: bool = ctx.get("preserve_boundaries", true);
        Ok(decimate::decimate_to_point_count(input, target, preserve_boundaries).into())
    }
}

/// Fill boundary loops.
pub struct RepairMeshSop;

impl Operator for RepairMeshSop {
    fn type_name(&self) -> &'static str {
        "RepairMesh"
    }

    fn schema(&self) -> Vec<ParameterDefinition> {
        vec![
            int_parameter("min_hole_size", 0)
                .label("Min Hole Size")
                .int_range(0, 1000)
                .category("Repair")
                .description("Smallest boundary loop to fill (0 = no lower bound)")
                .build(),
            int_parameter("max_hole_size", 0)
                .label("Max Hole Size")
                .int_range(0, 1000)
                .category("Repair")
                .description("Largest boundary loop to fill (0 = no upper bound)")
                .build(),
            bool_parameter("refine_fill", true)
                .label("Refine Fill")
                .category("Repair")
                .description("Fan-triangulate fills around a centroid point")
                .build(),
        ]
    }

    fn execute(&mut self, ctx: &mut CookContext<'_>) -> CookResult<GeometryHandle> {
        let min_hole = ctx.get("min_hole_size", 0).max(0) as usize;
        let max_hole = ctx.get("max_hole_size", 0).max(0) as usize;
        let refine: bool = ctx.get("refine_fill", true);

        let mut output = ctx.input_writable(0)?;
        let geo = output.write().expect("non-empty");
        repair::fill_holes(geo, min_hole, max_hole, refine);
        Ok(output)
    }
}

/// Seeded fractal value noise, displacing points along their normals.
pub struct NoiseDisplacementSop;

impl Operator for NoiseDisplacementSop {
    fn type_name(&self) -> &'static str {
        "NoiseDisplacement"
    }

    fn schema(&self) -> Vec<ParameterDefinition> {
        vec![
            float_parameter("amplitude", 0.1)
                .label("Amplitude")
                .range(0.0, 10.0)
                .category("Noise")
                .build(),
            float_parameter("frequency", 1.0)
                .label("Frequency")
                .range(0.01, 100.0)
                .category("Noise")
                .build(),
            int_parameter("octaves", 4)
                .label("Octaves")
                .int_range(1, 10)
                .category("Noise")
                .build(),
            float_parameter("lacunarity", 2.0)
                .label("Lacunarity")
                .range(1.0, 4.0)
                .category("Noise")
                .build(),
            float_parameter("persistence", 0.5)
                .label("Persistence")
                .range(0.0, 1.0)
                .category("Noise")
                .build(),
            int_parameter("seed", 12345)
                .label("Seed")
                .int_range(0, 1_000_000)
                .category("Noise")
                .build(),
        ]
    }

    fn execute(&mut self, ctx: &mut CookContext<'_>) -> CookResult<GeometryHandle> {
        let amplitude: f32 = ctx.get("amplitude", 0.1);
        let frequency: f32 = ctx.get("frequency", 1.0);
        let octaves = ctx.get("octaves", 4).clamp(1, 10);
        let lacunarity: f32 = ctx.get("lacunarity", 2.0);
        let persistence: f32 = ctx.get("persistence", 0.5);
        let seed = ctx.get("seed", 12345);

        let mut output = ctx.input_writable(0)?;
        let selected = {
            let geo = output.read().expect("non-empty");
            ctx.selected_elements(geo, ElementClass::Point)?
        };
        let geo = output.write().expect("non-empty");
        if geo.positions().is_none() {
            return Err(CookError::input_invalid(
                "NoiseDisplacement requires a position attribute",
            ));
        }
        let point_normals = normals::point_normals_or_computed(geo);
        let positions = geo.positions_mut().expect("checked above");

        let displaced: Vec<(usize, Vec3)> = selected
            .par_iter()
            .map(|&point| {
                let p = *positions.get(point);
                let noise = fractal_noise(
                    p * frequency,
                    seed,
                    octaves as u32,
                    lacunarity,
                    persistence,
                );
                (point, p + point_normals[point] * (noise * amplitude))
            })
            .collect();
        for (point, p) in displaced {
            positions.set(point, p);
        }
        Ok(output)
    }
}

/// Integer lattice hash → [-1, 1].
fn hash_noise(x: i32, y: i32, z: i32, seed: i32) -> f32 {
    let mut h = x.wrapping_mul(374_761_393)
        ^ y.wrapping_mul(668_265_263)
        ^ z.wrapping_mul(2_147_483_647)
        ^ seed.wrapping_mul(144_665_461);
    h = (h ^ (h >> 13)).wrapping_mul(1_274_126_177);
    let h = h ^ (h >> 16);
    (h as f32 / i32::MAX as f32).clamp(-1.0, 1.0)
}

/// Trilinear value noise with Hermite-smoothed lattice weights.
fn value_noise(p: Vec3, seed: i32) -> f32 {
    let base = p.floor();
    let frac = p - base;
    let smooth = frac * frac * (Vec3::splat(3.0) - frac * 2.0);
    let (ix, iy, iz) = (base.x as i32, base.y as i32, base.z as i32);

    let mut value = 0.0;
    for corner in 0..8 {
        let cx = corner & 1;
        let cy = (corner >> 1) & 1;
        let cz = (corner >> 2) & 1;
        let weight = (if cx == 1 { smooth.x } else { 1.0 - smooth.x })
            * (if cy == 1 { smooth.y } else { 1.0 - smooth.y })
            * (if cz == 1 { smooth.z } else { 1.0 - smooth.z });
        value += weight * hash_noise(ix + cx, iy + cy, iz + cz, seed);
    }
    value
}

/// Multi-octave fractal sum of value noise.
fn fractal_noise(p: Vec3, seed: i32, octaves: u32, lacunarity: f32, persistence: f32) -> f32 {
    let mut sum = 0.0;
    let mut amplitude = 1.0;
    let mut total = 0.0;
    let mut position = p;
    for octave in 0..octaves {
        sum += amplitude * value_noise(position, seed.wrapping_add(octave as i32 * 101));
        total += amplitude;
        amplitude *= persistence;
        position *= lacunarity;
    }
    if total > 0.0 { sum / total } else { 0.0 }
}

/// Compute normals into the chosen attribute slot.
pub struct NormalSop;

impl Operator for NormalSop {
    fn type_name(&self) -> &'static str {
        "Normal"
    }

    fn schema(&self) -> Vec<ParameterDefinition> {
        vec![
            int_parameter("mode", 0)
                .label("Mode")
                .options(&["Vertex", "Face", "Point"])
                .category("Normals")
                .description("Which element class receives the computed normals")
                .build(),
            int_parameter("weighting", 0)
                .label("Weighting")
                .options(&["Area", "Uniform"])
                .category("Normals")
                .build(),
            float_parameter("cusp_angle", 60.0)
                .label("Cusp Angle")
                .range(0.0, 180.0)
                .category("Normals")
                .visible_when("mode", 0)
                .build(),
            bool_parameter("reverse", false)
                .label("Reverse")
                .category("Normals")
                .build(),
        ]
    }

    fn execute(&mut self, ctx: &mut CookContext<'_>) -> CookResult<GeometryHandle> {
        let mode = ctx.get("mode", 0);
        let uniform_weighting = ctx.get("weighting", 0) == 1;
        let cusp_angle: f32 = ctx.get("cusp_angle", 60.0);
        let reverse: bool = ctx.get("reverse", false);

        let mut output = ctx.input_writable(0)?;
        let geo = output.write().expect("non-empty");
        if geo.positions().is_none() {
            return Err(CookError::input_invalid(
                "Normal requires a position attribute",
            ));
        }
        match mode {
            0 => normals::compute_vertex_normals(geo, cusp_angle),
            1 => normals::compute_face_normals(geo, true),
            _ => {
                if uniform_weighting {
                    normals::compute_point_normals_uniform(geo);
                } else {
                    normals::compute_point_normals(geo);
                }
            }
        }
        if reverse {
            let flip = |storage: Option<&mut crate::attribute::AttributeStorage<Vec3>>| {
                if let Some(storage) = storage {
                    for n in storage.as_mut_slice() {
                        *n = -*n;
                    }
                }
            };
            match mode {
                0 => flip(geo.vertex_normals_mut()),
                1 => flip(
                    geo.get_primitive_attribute_typed_mut::<Vec3>(crate::attribute::standard::N),
                ),
                _ => flip(geo.point_normals_mut()),
            }
        }
        Ok(output)
    }
}

/// Merge points within a distance threshold, averaging their positions.
pub struct FuseSop;

impl Operator for FuseSop {
    fn type_name(&self) -> &'static str {
        "Fuse"
    }

    fn schema(&self) -> Vec<ParameterDefinition> {
        vec![float_parameter("distance", 0.01)
            .label("Distance")
            .range(0.000_01, 10.0)
            .category("Fuse")
            .description("Points closer than this merge into one")
            .build()]
    }

    fn execute(&mut self, ctx: &mut CookContext<'_>) -> CookResult<GeometryHandle> {
        let distance: f32 = ctx.get("distance", 0.01).max(0.0);
        let input = ctx.input_geometry(0)?;
        Ok(fuse_points(input, distance).into())
    }
}

/// Grid-hash fuse: cluster points by cell, snap each cluster to its
/// average, remap vertices and drop primitives that collapse.
fn fuse_points(geo: &GeometryContainer, distance: f32) -> GeometryContainer {
    let Some(positions) = geo.positions() else {
        return geo.clone();
    };
    let cell = distance.max(1e-9);
    let quantize = |p: Vec3| {
        (
            (p.x / cell).round() as i64,
            (p.y / cell).round() as i64,
            (p.z / cell).round() as i64,
        )
    };

    // representative point per cell, in first-seen order
    let mut cluster_of: std::collections::HashMap<(i64, i64, i64), u32> =
        std::collections::HashMap::new();
    let mut representative: Vec<u32> = Vec::with_capacity(geo.point_count());
    let mut cluster_sum: Vec<(Vec3, u32)> = Vec::new();
    for point in 0..geo.point_count() {
        let p = *positions.get(point);
        let next = cluster_sum.len() as u32;
        let cluster = *cluster_of.entry(quantize(p)).or_insert(next);
        if cluster == next {
            cluster_sum.push((Vec3::ZERO, 0));
        }
        representative.push(cluster);
        let entry = &mut cluster_sum[cluster as usize];
        entry.0 += p;
        entry.1 += 1;
    }

    let mut out = GeometryContainer::new();
    out.adopt_attribute_layout(geo);
    out.set_point_count(cluster_sum.len());
    // First member of each cluster donates its attributes; position snaps
    // to the cluster average.
    let mut donated = vec![false; cluster_sum.len()];
    for point in 0..geo.point_count() {
        let cluster = representative[point] as usize;
        if !donated[cluster] {
            donated[cluster] = true;
            out.copy_element_attributes(ElementClass::Point, cluster, geo, point);
        }
    }
    if let Some(storage) = out.positions_mut() {
        for (cluster, (sum, count)) in cluster_sum.iter().enumerate() {
            storage.set(cluster, *sum / (*count).max(1) as f32);
        }
    }

    for prim in 0..geo.primitive_count() {
        let remapped: Vec<u32> = geo
            .topology()
            .primitive_points(prim)
            .map(|p| representative[p as usize])
            .collect();
        let mut unique = remapped.clone();
        unique.dedup();
        if unique.len() > 1 && unique.first() == unique.last() {
            unique.pop();
        }
        // Faces that collapse below a line are dropped outright.
        if unique.len() < 2 {
            continue;
        }
        let mut vertices = Vec::with_capacity(unique.len());
        let old_vertices = geo.topology().primitive_vertices(prim).to_vec();
        for (corner, point) in unique.iter().enumerate() {
            let vertex = out.add_vertex(*point);
            // Borrow the matching original corner's attributes.
            if let Some(&old_vertex) = old_vertices.get(corner) {
                out.copy_element_attributes(
                    ElementClass::Vertex,
                    vertex,
                    geo,
                    old_vertex as usize,
                );
            }
            vertices.push(vertex as u32);
        }
        let new_prim = out.add_primitive(vertices);
        out.copy_element_attributes(ElementClass::Primitive, new_prim, geo, prim);
    }
    out
}

/// Resample polyline primitives to evenly spaced points.
pub struct ResampleSop;

impl Operator for ResampleSop {
    fn type_name(&self) -> &'static str {
        "Resample"
    }

    fn schema(&self) -> Vec<ParameterDefinition> {
        vec![
            int_parameter("mode", 0)
                .label("Mode")
                .options(&["By Length", "By Count"])
                .category("Resample")
                .build(),
            float_parameter("segment_length", 0.1)
                .label("Segment Length")
                .range(0.001, 100.0)
                .category("Resample")
                .visible_when("mode", 0)
                .build(),
            int_parameter("segment_count", 10)
                .label("Segments")
                .int_range(1, 10_000)
                .category("Resample")
                .visible_when("mode", 1)
                .build(),
        ]
    }

    fn execute(&mut self, ctx: &mut CookContext<'_>) -> CookResult<GeometryHandle> {
        let by_count = ctx.get("mode", 0) == 1;
        let segment_length: f32 = ctx.get("segment_length", 0.1).max(1e-6);
        let segment_count = ctx.get("segment_count", 10).max(1) as usize;

        let input = ctx.input_geometry(0)?;
        let Some(positions) = input.positions() else {
            return Err(CookError::input_invalid(
                "Resample requires a position attribute",
            ));
        };

        let mut out = GeometryContainer::new();
        out.ensure_position_attribute();
        for prim in 0..input.primitive_count() {
            let chain: Vec<Vec3> = input
                .topology()
                .primitive_points(prim)
                .map(|p| *positions.get(p as usize))
                .collect();
            if chain.len() < 2 {
                continue;
            }
            let total: f32 = chain.windows(2).map(|w| w[0].distance(w[1])).sum();
            let segments = if by_count {
                segment_count
            } else {
                ((total / segment_length).round() as usize).max(1)
            };

            let base = out.point_count();
            out.set_point_count(base + segments + 1);
            {
                let storage = out.positions_mut().expect("ensured above");
                for i in 0..=segments {
                    let target = total * i as f32 / segments as f32;
                    storage.set(base + i, sample_chain(&chain, target));
                }
            }
            let points: Vec<u32> = (base..=base + segments).map(|p| p as u32).collect();
            out.add_polygon(&points);
        }
        Ok(out.into())
    }
}

/// Point at arc-length `target` along an open polyline.
fn sample_chain(chain: &[Vec3], target: f32) -> Vec3 {
    let mut walked = 0.0;
    for window in chain.windows(2) {
        let step = window[0].distance(window[1]);
        if walked + step >= target && step > 0.0 {
            let t = (target - walked) / step;
            return window[0].lerp(window[1], t);
        }
        walked += step;
    }
    *chain.last().expect("chain has at least two points")
}

/// Face extrusion; delegated algorithm not carried by this build.
pub struct ExtrudeSop;

impl Operator for ExtrudeSop {
    fn type_name(&self) -> &'static str {
        "Extrude"
    }

    fn schema(&self) -> Vec<ParameterDefinition> {
        vec![float_parameter("distance", 0.1)
            .label("Distance")
            .range(-100.0, 100.0)
            .category("Extrude")
            .build()]
    }

    fn execute(&mut self, ctx: &mut CookContext<'_>) -> CookResult<GeometryHandle> {
        let _ = ctx.input_geometry(0)?;
        Err(CookError::algorithm_failure("extrusion is not implemented"))
    }
}

/// Per-polygon extrusion; delegated algorithm not carried by this build.
pub struct PolyExtrudeSop;

impl Operator for PolyExtrudeSop {
    fn type_name(&self) -> &'static str {
        "PolyExtrude"
    }

    fn schema(&self) -> Vec<ParameterDefinition> {
        vec![
            float_parameter("distance", 0.1)
                .label("Distance")
                .range(-100.0, 100.0)
                .category("Extrude")
                .build(),
            float_parameter("inset", 0.0)
                .label("Inset")
                .range(-10.0, 10.0)
                .category("Extrude")
                .build(),
        ]
    }

    fn execute(&mut self, ctx: &mut CookContext<'_>) -> CookResult<GeometryHandle> {
        let _ = ctx.input_geometry(0)?;
        Err(CookError::algorithm_failure(
            "polygon extrusion is not implemented",
        ))
    }
}

/// Lattice deformation; delegated algorithm not carried by this build.
pub struct LatticeSop;

impl Operator for LatticeSop {
    fn type_name(&self) -> &'static str {
        "Lattice"
    }

    fn schema(&self) -> Vec<ParameterDefinition> {
        vec![int_parameter("divisions", 2)
            .label("Divisions")
            .int_range(2, 10)
            .category("Lattice")
            .build()]
    }

    fn execute(&mut self, ctx: &mut CookContext<'_>) -> CookResult<GeometryHandle> {
        let _ = ctx.input_geometry(0)?;
        Err(CookError::algorithm_failure(
            "lattice deformation is not implemented",
        ))
    }
}

/// Edge beveling; delegated algorithm not carried by this build.
pub struct BevelSop;

impl Operator for BevelSop {
    fn type_name(&self) -> &'static str {
        "Bevel"
    }

    fn schema(&self) -> Vec<ParameterDefinition> {
        vec![
            float_parameter("width", 0.1)
                .label("Width")
                .range(0.001, 10.0)
                .category("Bevel")
                .build(),
            int_parameter("segments", 1)
                .label("Segments")
                .int_range(1, 10)
                .category("Bevel")
                .build(),
        ]
    }

    fn execute(&mut self, ctx: &mut CookContext<'_>) -> CookResult<GeometryHandle> {
        let _ = ctx.input_geometry(0)?;
        Err(CookError::algorithm_failure("beveling is not implemented"))
    }
}
