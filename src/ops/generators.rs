//! Generator operators: no inputs, geometry out.
//!
//! All polygonal generators expose the universal `primitive_type`
//! parameter: `Polygon` emits faces, `Points` keeps the same positions
//! with zero primitives.

use glam::{Vec2, Vec3};

use crate::attribute::{standard, AttributeType};
use crate::error::CookResult;
use crate::geometry::{GeometryContainer, GeometryHandle};
use crate::param::{float_parameter, int_parameter, vector3_parameter, ParameterDefinition};
use crate::sop::{CookContext, InputConfig, Operator};

const DEFAULT_SIZE: f32 = 2.0;

fn primitive_type_parameter() -> ParameterDefinition {
    int_parameter("primitive_type", 0)
        .label("Primitive Type")
        .options(&["Polygon", "Points"])
        .category("Universal")
        .build()
}

/// Strip primitives (and their vertices) when Points mode is selected.
fn apply_primitive_type(ctx: &CookContext<'_>, mut geo: GeometryContainer) -> GeometryContainer {
    if ctx.get("primitive_type", 0) == 1 {
        geo.set_primitive_count(0);
        geo.set_vertex_count(0);
    }
    geo
}

/// Axis-aligned box with per-axis subdivisions.
pub struct BoxSop;

impl Operator for BoxSop {
    fn type_name(&self) -> &'static str {
        "Box"
    }

    fn input_config(&self) -> InputConfig {
        InputConfig::none()
    }

    fn schema(&self) -> Vec<ParameterDefinition> {
        vec![
            primitive_type_parameter(),
            float_parameter("width", DEFAULT_SIZE)
                .label("Width")
                .range(0.01, 100.0)
                .category("Size")
                .description("Width of the box along X axis")
                .build(),
            float_parameter("height", DEFAULT_SIZE)
                .label("Height")
                .range(0.01, 100.0)
                .category("Size")
                .description("Height of the box along Y axis")
                .build(),
            float_parameter("depth", DEFAULT_SIZE)
                .label("Depth")
                .range(0.01, 100.0)
                .category("Size")
                .description("Depth of the box along Z axis")
                .build(),
            int_parameter("width_segments", 1)
                .label("Width Segments")
                .int_range(1, 100)
                .category("Subdivisions")
                .build(),
            int_parameter("height_segments", 1)
                .label("Height Segments")
                .int_range(1, 100)
                .category("Subdivisions")
                .build(),
            int_parameter("depth_segments", 1)
                .label("Depth Segments")
                .int_range(1, 100)
                .category("Subdivisions")
                .build(),
        ]
    }

    fn execute(&mut self, ctx: &mut CookContext<'_>) -> CookResult<GeometryHandle> {
        let width: f32 = ctx.get("width", DEFAULT_SIZE);
        let height: f32 = ctx.get("height", DEFAULT_SIZE);
        let depth: f32 = ctx.get("depth", DEFAULT_SIZE);
        let segments = [
            ctx.get("width_segments", 1).max(1) as usize,
            ctx.get("height_segments", 1).max(1) as usize,
            ctx.get("depth_segments", 1).max(1) as usize,
        ];

        let geo = generate_box(Vec3::new(width, height, depth), segments);
        Ok(apply_primitive_type(ctx, geo).into())
    }
}

/// Build a box centered at the origin. With one segment per axis this is
/// the classic 8-point, 6-quad cube; subdivided axes emit one grid of
/// quads per face with points shared along the face seams.
fn generate_box(size: Vec3, segments: [usize; 3]) -> GeometryContainer {
    let mut geo = GeometryContainer::new();
    geo.ensure_position_attribute();
    let half = size * 0.5;

    if segments == [1, 1, 1] {
        // Fast path: unit-segment cube with shared corner points.
        geo.set_point_count(8);
        let positions = geo.positions_mut().expect("ensured above");
        let corners = [
            Vec3::new(-half.x, -half.y, -half.z),
            Vec3::new(half.x, -half.y, -half.z),
            Vec3::new(half.x, half.y, -half.z),
            Vec3::new(-half.x, half.y, -half.z),
            Vec3::new(-half.x, -half.y, half.z),
            Vec3::new(half.x, -half.y, half.z),
            Vec3::new(half.x, half.y, half.z),
            Vec3::new(-half.x, half.y, half.z),
        ];
        for (i, c) in corners.iter().enumerate() {
            positions.set(i, *c);
        }
        let faces: [[u32; 4]; 6] = [
            [0, 3, 2, 1], // -Z
            [4, 5, 6, 7], // +Z
            [0, 1, 5, 4], // -Y
            [3, 7, 6, 2], // +Y
            [0, 4, 7, 3], // -X
            [1, 2, 6, 5], // +X
        ];
        for face in faces {
            geo.add_polygon(&face);
        }
        return geo;
    }

    // Subdivided: one point lattice per face, welded afterwards.
    let mut grid_face = |geo: &mut GeometryContainer,
                         origin: Vec3,
                         du: Vec3,
                         dv: Vec3,
                         nu: usize,
                         nv: usize| {
        let base = geo.point_count();
        geo.set_point_count(base + (nu + 1) * (nv + 1));
        let positions = geo.positions_mut().expect("ensured above");
        for v in 0..=nv {
            for u in 0..=nu {
                let index = base + v * (nu + 1) + u;
                positions.set(
                    index,
                    origin + du * (u as f32 / nu as f32) + dv * (v as f32 / nv as f32),
                );
            }
        }
        for v in 0..nv {
            for u in 0..nu {
                let p00 = (base + v * (nu + 1) + u) as u32;
                let p10 = p00 + 1;
                let p01 = (base + (v + 1) * (nu + 1) + u) as u32;
                let p11 = p01 + 1;
                geo.add_polygon(&[p00, p10, p11, p01]);
            }
        }
    };

    let [sx, sy, sz] = segments;
    let x = Vec3::new(size.x, 0.0, 0.0);
    let y = Vec3::new(0.0, size.y, 0.0);
    let z = Vec3::new(0.0, 0.0, size.z);
    // Each face is wound to face outward.
    grid_face(&mut geo, Vec3::new(-half.x, -half.y, half.z), x, y, sx, sy); // +Z
    grid_face(&mut geo, Vec3::new(half.x, -half.y, -half.z), -x, y, sx, sy); // -Z
    grid_face(&mut geo, Vec3::new(half.x, -half.y, half.z), -z, y, sz, sy); // +X
    grid_face(&mut geo, Vec3::new(-half.x, -half.y, -half.z), z, y, sz, sy); // -X
    grid_face(&mut geo, Vec3::new(-half.x, half.y, half.z), x, -z, sx, sz); // +Y
    grid_face(&mut geo, Vec3::new(-half.x, -half.y, -half.z), x, z, sx, sz); // -Y

    weld_coincident_points(&mut geo, size.length() * 1e-6);
    geo
}

/// Merge points closer than `threshold`, remapping vertices. Used by the
/// subdivided box to stitch its face lattices along shared edges.
pub(crate) fn weld_coincident_points(geo: &mut GeometryContainer, threshold: f32) {
    let positions: Vec<Vec3> = match geo.positions() {
        Some(p) => p.as_slice().to_vec(),
        None => return,
    };
    let cell = threshold.max(1e-12);
    let quantize = |p: Vec3| {
        (
            (p.x / cell).round() as i64,
            (p.y / cell).round() as i64,
            (p.z / cell).round() as i64,
        )
    };
    let mut first_at: std::collections::HashMap<(i64, i64, i64), u32> =
        std::collections::HashMap::new();
    let mut remap: Vec<u32> = Vec::with_capacity(positions.len());
    for (i, &p) in positions.iter().enumerate() {
        let representative = *first_at.entry(quantize(p)).or_insert(i as u32);
        remap.push(representative);
    }
    let topology = geo.topology_mut();
    for v in 0..topology.vertex_count() {
        let old = topology.vertex_point(v);
        topology.set_vertex_point(v, remap[old as usize]);
    }
    geo.remove_unreferenced_points();
}

/// UV sphere: rings of latitude, segments of longitude, pole fans.
pub struct SphereSop;

impl Operator for SphereSop {
    fn type_name(&self) -> &'static str {
        "Sphere"
    }

    fn input_config(&self) -> InputConfig {
        InputConfig::none()
    }

    fn schema(&self) -> Vec<ParameterDefinition> {
        vec![
            primitive_type_parameter(),
            float_parameter("radius", 1.0)
                .label("Radius")
                .range(0.01, 100.0)
                .category("Size")
                .description("Radius of the sphere")
                .build(),
            int_parameter("segments", 32)
                .label("Segments")
                .int_range(3, 256)
                .category("Resolution")
                .description("Number of vertical segments (longitude)")
                .build(),
            int_parameter("rings", 16)
                .label("Rings")
                .int_range(2, 128)
                .category("Resolution")
                .description("Number of horizontal rings (latitude)")
                .build(),
        ]
    }

    fn execute(&mut self, ctx: &mut CookContext<'_>) -> CookResult<GeometryHandle> {
        let radius: f32 = ctx.get("radius", 1.0);
        let segments = ctx.get("segments", 32).max(3) as usize;
        let rings = ctx.get("rings", 16).max(2) as usize;

        let mut geo = GeometryContainer::new();
        geo.ensure_position_attribute();
        // Poles plus (rings-1) interior latitude circles.
        let interior = rings - 1;
        geo.set_point_count(2 + interior * segments);
        {
            let positions = geo.positions_mut().expect("ensured above");
            positions.set(0, Vec3::new(0.0, radius, 0.0));
            positions.set(1, Vec3::new(0.0, -radius, 0.0));
            for ring in 0..interior {
                let theta = std::f32::consts::PI * (ring + 1) as f32 / rings as f32;
                for segment in 0..segments {
                    let phi = std::f32::consts::TAU * segment as f32 / segments as f32;
                    positions.set(
                        2 + ring * segments + segment,
                        Vec3::new(
                            radius * theta.sin() * phi.cos(),
                            radius * theta.cos(),
                            radius * theta.sin() * phi.sin(),
                        ),
                    );
                }
            }
        }

        let ring_point = |ring: usize, segment: usize| (2 + ring * segments + segment % segments) as u32;
        // Top fan.
        for segment in 0..segments {
            geo.add_polygon(&[0, ring_point(0, segment + 1), ring_point(0, segment)]);
        }
        // Latitude bands.
        for ring in 0..interior.saturating_sub(1) {
            for segment in 0..segments {
                geo.add_polygon(&[
                    ring_point(ring, segment),
                    ring_point(ring, segment + 1),
                    ring_point(ring + 1, segment + 1),
                    ring_point(ring + 1, segment),
                ]);
            }
        }
        // Bottom fan.
        for segment in 0..segments {
            geo.add_polygon(&[
                1,
                ring_point(interior - 1, segment),
                ring_point(interior - 1, segment + 1),
            ]);
        }

        Ok(apply_primitive_type(ctx, geo).into())
    }
}

/// Cylinder along Y with optional caps.
pub struct CylinderSop;

impl Operator for CylinderSop {
    fn type_name(&self) -> &'static str {
        "Cylinder"
    }

    fn input_config(&self) -> InputConfig {
        InputConfig::none()
    }

    fn schema(&self) -> Vec<ParameterDefinition> {
        vec![
            primitive_type_parameter(),
            float_parameter("radius", 1.0)
                .label("Radius")
                .range(0.01, 100.0)
                .category("Size")
                .build(),
            float_parameter("height", DEFAULT_SIZE)
                .label("Height")
                .range(0.01, 100.0)
                .category("Size")
                .description("Height of the cylinder along Y axis")
                .build(),
            int_parameter("radial_segments", 32)
                .label("Radial Segments")
                .int_range(3, 256)
                .category("Resolution")
                .build(),
            int_parameter("height_segments", 1)
                .label("Height Segments")
                .int_range(1, 100)
                .category("Resolution")
                .build(),
            crate::param::bool_parameter("top_cap", true)
                .label("Top Cap")
                .category("Caps")
                .description("Enable top cap (circular face at +Y)")
                .build(),
            crate::param::bool_parameter("bottom_cap", true)
                .label("Bottom Cap")
                .category("Caps")
                .description("Enable bottom cap (circular face at -Y)")
                .build(),
        ]
    }

    fn execute(&mut self, ctx: &mut CookContext<'_>) -> CookResult<GeometryHandle> {
        let radius: f32 = ctx.get("radius", 1.0);
        let height: f32 = ctx.get("height", DEFAULT_SIZE);
        let radial = ctx.get("radial_segments", 32).max(3) as usize;
        let rows = ctx.get("height_segments", 1).max(1) as usize;
        let top_cap: bool = ctx.get("top_cap", true);
        let bottom_cap: bool = ctx.get("bottom_cap", true);

        let mut geo = GeometryContainer::new();
        geo.ensure_position_attribute();
        geo.set_point_count((rows + 1) * radial);
        {
            let positions = geo.positions_mut().expect("ensured above");
            for row in 0..=rows {
                let y = height * (row as f32 / rows as f32 - 0.5);
                for segment in 0..radial {
                    let phi = std::f32::consts::TAU * segment as f32 / radial as f32;
                    positions.set(
                        row * radial + segment,
                        Vec3::new(radius * phi.cos(), y, radius * phi.sin()),
                    );
                }
            }
        }

        let at = |row: usize, segment: usize| (row * radial + segment % radial) as u32;
        for row in 0..rows {
            for segment in 0..radial {
                geo.add_polygon(&[
                    at(row, segment),
                    at(row, segment + 1),
                    at(row + 1, segment + 1),
                    at(row + 1, segment),
                ]);
            }
        }
        if bottom_cap {
            let rim: Vec<u32> = (0..radial).map(|s| at(0, s)).collect();
            geo.add_polygon(&rim);
        }
        if top_cap {
            let rim: Vec<u32> = (0..radial).rev().map(|s| at(rows, s)).collect();
            geo.add_polygon(&rim);
        }

        Ok(apply_primitive_type(ctx, geo).into())
    }
}

/// Torus around the Y axis.
pub struct TorusSop;

impl Operator for TorusSop {
    fn type_name(&self) -> &'static str {
        "Torus"
    }

    fn input_config(&self) -> InputConfig {
        InputConfig::none()
    }

    fn schema(&self) -> Vec<ParameterDefinition> {
        vec![
            primitive_type_parameter(),
            float_parameter("major_radius", 1.0)
                .label("Major Radius")
                .range(0.01, 100.0)
                .category("Size")
                .description("Distance from torus center to tube center")
                .build(),
            float_parameter("minor_radius", 0.25)
                .label("Minor Radius")
                .range(0.01, 100.0)
                .category("Size")
                .description("Radius of the tube cross-section")
                .build(),
            int_parameter("major_segments", 32)
                .label("Major Segments")
                .int_range(3, 256)
                .category("Resolution")
                .build(),
            int_parameter("minor_segments", 16)
                .label("Minor Segments")
                .int_range(3, 128)
                .category("Resolution")
                .build(),
        ]
    }

    fn execute(&mut self, ctx: &mut CookContext<'_>) -> CookResult<GeometryHandle> {
        let major_radius: f32 = ctx.get("major_radius", 1.0);
        let minor_radius: f32 = ctx.get("minor_radius", 0.25);
        let major = ctx.get("major_segments", 32).max(3) as usize;
        let minor = ctx.get("minor_segments", 16).max(3) as usize;

        let mut geo = GeometryContainer::new();
        geo.ensure_position_attribute();
        geo.set_point_count(major * minor);
        {
            let positions = geo.positions_mut().expect("ensured above");
            for i in 0..major {
                let u = std::f32::consts::TAU * i as f32 / major as f32;
                for j in 0..minor {
                    let v = std::f32::consts::TAU * j as f32 / minor as f32;
                    let ring = major_radius + minor_radius * v.cos();
                    positions.set(
                        i * minor + j,
                        Vec3::new(ring * u.cos(), minor_radius * v.sin(), ring * u.sin()),
                    );
                }
            }
        }

        let at = |i: usize, j: usize| ((i % major) * minor + j % minor) as u32;
        for i in 0..major {
            for j in 0..minor {
                geo.add_polygon(&[at(i, j), at(i + 1, j), at(i + 1, j + 1), at(i, j + 1)]);
            }
        }

        Ok(apply_primitive_type(ctx, geo).into())
    }
}

/// Flat grid in the XZ plane, with UVs.
pub struct GridSop;

impl Operator for GridSop {
    fn type_name(&self) -> &'static str {
        "Plane"
    }

    fn input_config(&self) -> InputConfig {
        InputConfig::none()
    }

    fn schema(&self) -> Vec<ParameterDefinition> {
        vec![
            primitive_type_parameter(),
            float_parameter("size_x", 10.0)
                .label("Size X")
                .range(0.01, 1000.0)
                .category("Size")
                .description("Width of the grid in X direction")
                .build(),
            float_parameter("size_z", 10.0)
                .label("Size Z")
                .range(0.01, 1000.0)
                .category("Size")
                .description("Depth of the grid in Z direction")
                .build(),
            int_parameter("columns", 10)
                .label("Columns")
                .int_range(1, 1000)
                .category("Resolution")
                .description("Number of divisions along X axis")
                .build(),
            int_parameter("rows", 10)
                .label("Rows")
                .int_range(1, 1000)
                .category("Resolution")
                .description("Number of divisions along Z axis")
                .build(),
        ]
    }

    fn execute(&mut self, ctx: &mut CookContext<'_>) -> CookResult<GeometryHandle> {
        let size_x: f32 = ctx.get("size_x", 10.0);
        let size_z: f32 = ctx.get("size_z", 10.0);
        let columns = ctx.get("columns", 10).max(1) as usize;
        let rows = ctx.get("rows", 10).max(1) as usize;

        let mut geo = GeometryContainer::new();
        geo.ensure_position_attribute();
        geo.set_point_count((columns + 1) * (rows + 1));
        {
            let positions = geo.positions_mut().expect("ensured above");
            for row in 0..=rows {
                for column in 0..=columns {
                    positions.set(
                        row * (columns + 1) + column,
                        Vec3::new(
                            size_x * (column as f32 / columns as f32 - 0.5),
                            0.0,
                            size_z * (row as f32 / rows as f32 - 0.5),
                        ),
                    );
                }
            }
        }
        geo.add_vertex_attribute(standard::UV, AttributeType::Vec2f);
        for row in 0..rows {
            for column in 0..columns {
                let p00 = (row * (columns + 1) + column) as u32;
                let p10 = p00 + 1;
                let p01 = ((row + 1) * (columns + 1) + column) as u32;
                let p11 = p01 + 1;
                let prim = geo.add_polygon(&[p00, p01, p11, p10]);
                let uvs = [
                    (column, row),
                    (column, row + 1),
                    (column + 1, row + 1),
                    (column + 1, row),
                ];
                let vertices: Vec<u32> = geo.topology().primitive_vertices(prim).to_vec();
                let storage = geo
                    .get_vertex_attribute_typed_mut::<Vec2>(standard::UV)
                    .expect("added above");
                for (&vertex, (u, v)) in vertices.iter().zip(uvs) {
                    storage.set(
                        vertex as usize,
                        Vec2::new(u as f32 / columns as f32, v as f32 / rows as f32),
                    );
                }
            }
        }

        Ok(apply_primitive_type(ctx, geo).into())
    }
}

/// Straight line of points, optionally as a polyline primitive.
pub struct LineSop;

impl Operator for LineSop {
    fn type_name(&self) -> &'static str {
        "Line"
    }

    fn input_config(&self) -> InputConfig {
        InputConfig::none()
    }

    fn schema(&self) -> Vec<ParameterDefinition> {
        vec![
            primitive_type_parameter(),
            vector3_parameter("start", Vec3::ZERO)
                .label("Start")
                .category("Shape")
                .build(),
            vector3_parameter("end", Vec3::new(0.0, 1.0, 0.0))
                .label("End")
                .category("Shape")
                .build(),
            int_parameter("segments", 10)
                .label("Segments")
                .int_range(1, 1000)
                .category("Resolution")
                .build(),
        ]
    }

    fn execute(&mut self, ctx: &mut CookContext<'_>) -> CookResult<GeometryHandle> {
        let start: Vec3 = ctx.get("start", Vec3::ZERO);
        let end: Vec3 = ctx.get("end", Vec3::new(0.0, 1.0, 0.0));
        let segments = ctx.get("segments", 10).max(1) as usize;

        let mut geo = GeometryContainer::new();
        geo.ensure_position_attribute();
        geo.set_point_count(segments + 1);
        {
            let positions = geo.positions_mut().expect("ensured above");
            for i in 0..=segments {
                positions.set(i, start.lerp(end, i as f32 / segments as f32));
            }
        }
        let chain: Vec<u32> = (0..=segments as u32).collect();
        geo.add_polygon(&chain);

        Ok(apply_primitive_type(ctx, geo).into())
    }
}

/// A single point carrying the current frame, time, fps and normalized
/// time as point attributes.
pub struct TimeSop;

impl Operator for TimeSop {
    fn type_name(&self) -> &'static str {
        "Time"
    }

    fn input_config(&self) -> InputConfig {
        InputConfig::none()
    }

    fn schema(&self) -> Vec<ParameterDefinition> {
        vec![
            int_parameter("frame", 1)
                .label("Frame")
                .int_range(1, 240)
                .category("Time")
                .build(),
            float_parameter("fps", 24.0)
                .label("FPS")
                .range(1.0, 120.0)
                .category("Time")
                .build(),
            int_parameter("start_frame", 1)
                .label("Start Frame")
                .int_range(1, 1000)
                .category("Time Range")
                .build(),
            int_parameter("end_frame", 240)
                .label("End Frame")
                .int_range(1, 10000)
                .category("Time Range")
                .build(),
        ]
    }

    fn execute(&mut self, ctx: &mut CookContext<'_>) -> CookResult<GeometryHandle> {
        let frame = ctx.get("frame", 1);
        let fps: f32 = ctx.get("fps", 24.0).max(1.0);
        let start_frame = ctx.get("start_frame", 1);
        let end_frame = ctx.get("end_frame", 240).max(start_frame + 1);

        let mut geo = GeometryContainer::new();
        geo.ensure_position_attribute();
        geo.set_point_count(1);
        geo.add_point_attribute("frame", AttributeType::Int);
        geo.add_point_attribute("time", AttributeType::Float);
        geo.add_point_attribute("fps", AttributeType::Float);
        geo.add_point_attribute("normalized_time", AttributeType::Float);

        geo.get_point_attribute_typed_mut::<i32>("frame")
            .expect("added above")
            .set(0, frame);
        geo.get_point_attribute_typed_mut::<f32>("time")
            .expect("added above")
            .set(0, frame as f32 / fps);
        geo.get_point_attribute_typed_mut::<f32>("fps")
            .expect("added above")
            .set(0, fps);
        geo.get_point_attribute_typed_mut::<f32>("normalized_time")
            .expect("added above")
            .set(
                0,
                (frame - start_frame) as f32 / (end_frame - start_frame) as f32,
            );

        Ok(geo.into())
    }
}
