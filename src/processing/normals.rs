//! Normal computation: per-face, per-point (shared) and per-vertex
//! (split by cusp angle).

use glam::Vec3;

use crate::attribute::{standard, AttributeType};
use crate::geometry::GeometryContainer;
use crate::processing::adjacency;

/// Unnormalized face normal by Newell's method. Magnitude is twice the
/// polygon area, which is exactly the area weighting the accumulation
/// paths want.
pub fn primitive_normal(geo: &GeometryContainer, prim: usize) -> Vec3 {
    let Some(positions) = geo.positions() else {
        return Vec3::ZERO;
    };
    let points: Vec<Vec3> = geo
        .topology()
        .primitive_points(prim)
        .map(|p| *positions.get(p as usize))
        .collect();
    if points.len() < 3 {
        return Vec3::ZERO;
    }
    let mut normal = Vec3::ZERO;
    for i in 0..points.len() {
        let a = points[i];
        let b = points[(i + 1) % points.len()];
        normal += Vec3::new(
            (a.y - b.y) * (a.z + b.z),
            (a.z - b.z) * (a.x + b.x),
            (a.x - b.x) * (a.y + b.y),
        );
    }
    normal
}

/// Compute per-primitive normals into the primitive `N` attribute.
pub fn compute_face_normals(geo: &mut GeometryContainer, normalize: bool) {
    geo.add_primitive_attribute(standard::N, AttributeType::Vec3f);
    let normals: Vec<Vec3> = (0..geo.primitive_count())
        .map(|prim| {
            let n = primitive_normal(geo, prim);
            if normalize {
                n.try_normalize().unwrap_or(Vec3::Z)
            } else {
                n
            }
        })
        .collect();
    let storage = geo
        .get_primitive_attribute_typed_mut::<Vec3>(standard::N)
        .expect("attribute added above");
    for (prim, n) in normals.into_iter().enumerate() {
        storage.set(prim, n);
    }
}

/// Compute shared per-point normals (area-weighted average of incident
/// face normals) into the point `N` attribute.
pub fn compute_point_normals(geo: &mut GeometryContainer) {
    let mut accumulated = vec![Vec3::ZERO; geo.point_count()];
    for prim in 0..geo.primitive_count() {
        let face = primitive_normal(geo, prim);
        for point in geo.topology().primitive_points(prim) {
            accumulated[point as usize] += face;
        }
    }
    geo.ensure_point_normals();
    let storage = geo
        .point_normals_mut()
        .expect("attribute ensured above");
    for (point, n) in accumulated.into_iter().enumerate() {
        storage.set(point, n.try_normalize().unwrap_or(Vec3::Z));
    }
}

/// Like [`compute_point_normals`] but with every incident face weighing
/// the same regardless of area.
pub fn compute_point_normals_uniform(geo: &mut GeometryContainer) {
    let mut accumulated = vec![Vec3::ZERO; geo.point_count()];
    for prim in 0..geo.primitive_count() {
        let face = primitive_normal(geo, prim).try_normalize().unwrap_or(Vec3::Z);
        for point in geo.topology().primitive_points(prim) {
            accumulated[point as usize] += face;
        }
    }
    geo.ensure_point_normals();
    let storage = geo.point_normals_mut().expect("attribute ensured above");
    for (point, n) in accumulated.into_iter().enumerate() {
        storage.set(point, n.try_normalize().unwrap_or(Vec3::Z));
    }
}

/// Compute split per-vertex normals into the vertex `N` attribute.
///
/// Each vertex averages the normals of the faces around its point whose
/// angle to the vertex's own face stays under `cusp_angle_degrees`; edges
/// sharper than the cusp stay hard.
pub fn compute_vertex_normals(geo: &mut GeometryContainer, cusp_angle_degrees: f32) {
    let face_normals: Vec<Vec3> = (0..geo.primitive_count())
        .map(|prim| primitive_normal(geo, prim))
        .collect();
    let incident = adjacency::point_primitives(geo);
    let cos_cusp = cusp_angle_degrees.to_radians().cos();

    let topology = geo.topology();
    let mut vertex_normals = vec![Vec3::Z; topology.vertex_count()];
    for prim in 0..topology.primitive_count() {
        let own = face_normals[prim];
        let own_dir = own.try_normalize().unwrap_or(Vec3::Z);
        for &vertex in topology.primitive_vertices(prim) {
            let point = topology.vertex_point(vertex as usize);
            let mut accumulated = Vec3::ZERO;
            for &other in &incident[point as usize] {
                let dir = face_normals[other as usize]
                    .try_normalize()
                    .unwrap_or(Vec3::Z);
                if own_dir.dot(dir) >= cos_cusp {
                    accumulated += face_normals[other as usize];
                }
            }
            vertex_normals[vertex as usize] =
                accumulated.try_normalize().unwrap_or(own_dir);
        }
    }

    geo.ensure_vertex_normals();
    let storage = geo
        .vertex_normals_mut()
        .expect("attribute ensured above");
    for (vertex, n) in vertex_normals.into_iter().enumerate() {
        storage.set(vertex, n);
    }
}

/// Point normals, computing them first when absent. Returns the values by
/// copy so callers can keep reading while mutating positions.
pub fn point_normals_or_computed(geo: &mut GeometryContainer) -> Vec<Vec3> {
    if geo.point_normals().is_none() {
        compute_point_normals(geo);
    }
    geo.point_normals()
        .expect("computed above")
        .as_slice()
        .to_vec()
}
