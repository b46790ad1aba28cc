//! Surface triangulation, area-weighted sampling and containment tests.

use glam::Vec3;
use rand::Rng;

use crate::geometry::GeometryContainer;

/// A triangle from the fan-triangulated surface, remembering its source
/// primitive so attribute transfer can find the original corners.
#[derive(Clone, Copy, Debug)]
pub struct Triangle {
    pub prim: u32,
    pub points: [u32; 3],
}

/// Fan-triangulate every primitive with three or more corners.
pub fn triangulate(geo: &GeometryContainer) -> Vec<Triangle> {
    let topology = geo.topology();
    let mut triangles = Vec::new();
    for prim in 0..topology.primitive_count() {
        let points: Vec<u32> = topology.primitive_points(prim).collect();
        for i in 1..points.len().saturating_sub(1) {
            triangles.push(Triangle {
                prim: prim as u32,
                points: [points[0], points[i], points[i + 1]],
            });
        }
    }
    triangles
}

pub fn triangle_area(a: Vec3, b: Vec3, c: Vec3) -> f32 {
    (b - a).cross(c - a).length() * 0.5
}

/// A sample on the surface: the triangle it landed on plus barycentric
/// coordinates (`u` toward the second corner, `v` toward the third).
#[derive(Clone, Copy, Debug)]
pub struct SurfaceSample {
    pub triangle: Triangle,
    pub u: f32,
    pub v: f32,
    pub position: Vec3,
}

/// Draw `count` area-weighted uniform samples over the surface.
pub fn sample_surface(
    geo: &GeometryContainer,
    count: usize,
    rng: &mut impl Rng,
) -> Vec<SurfaceSample> {
    let Some(positions) = geo.positions() else {
        return Vec::new();
    };
    let triangles = triangulate(geo);
    if triangles.is_empty() {
        return Vec::new();
    }

    // Cumulative area table for weighted triangle choice.
    let mut cumulative = Vec::with_capacity(triangles.len());
    let mut total = 0.0f32;
    for tri in &triangles {
        let [a, b, c] = tri.points;
        total += triangle_area(
            *positions.get(a as usize),
            *positions.get(b as usize),
            *positions.get(c as usize),
        );
        cumulative.push(total);
    }
    if total <= 0.0 {
        return Vec::new();
    }

    let mut samples = Vec::with_capacity(count);
    for _ in 0..count {
        let pick = rng.random::<f32>() * total;
        let index = cumulative.partition_point(|&a| a < pick).min(triangles.len() - 1);
        let tri = triangles[index];

        // Uniform barycentric via square-root warping.
        let r1: f32 = rng.random::<f32>().sqrt();
        let r2: f32 = rng.random::<f32>();
        let u = r1 * (1.0 - r2);
        let v = r1 * r2;

        let [a, b, c] = tri.points;
        let pa = *positions.get(a as usize);
        let pb = *positions.get(b as usize);
        let pc = *positions.get(c as usize);
        samples.push(SurfaceSample {
            triangle: tri,
            u,
            v,
            position: pa * (1.0 - u - v) + pb * u + pc * v,
        });
    }
    samples
}

/// Möller–Trumbore ray/triangle intersection; returns the distance along
/// the ray when hit.
fn ray_triangle(origin: Vec3, direction: Vec3, a: Vec3, b: Vec3, c: Vec3) -> Option<f32> {
    let e1 = b - a;
    let e2 = c - a;
    let p = direction.cross(e2);
    let det = e1.dot(p);
    if det.abs() < 1e-9 {
        return None;
    }
    let inv = 1.0 / det;
    let s = origin - a;
    let u = s.dot(p) * inv;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }
    let q = s.cross(e1);
    let v = direction.dot(q) * inv;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }
    let t = e2.dot(q) * inv;
    if t > 1e-6 { Some(t) } else { None }
}

/// Parity containment test: a point is inside a closed surface iff a ray
/// from it crosses the surface an odd number of times. The ray direction
/// is slightly irrational to dodge edge-grazing ties.
pub fn point_inside_mesh(geo: &GeometryContainer, triangles: &[Triangle], p: Vec3) -> bool {
    let Some(positions) = geo.positions() else {
        return false;
    };
    let direction = Vec3::new(0.577_350_3, 0.211_324_9, 0.788_675_1).normalize();
    let mut crossings = 0;
    for tri in triangles {
        let [a, b, c] = tri.points;
        if ray_triangle(
            p,
            direction,
            *positions.get(a as usize),
            *positions.get(b as usize),
            *positions.get(c as usize),
        )
        .is_some()
        {
            crossings += 1;
        }
    }
    crossings % 2 == 1
}
