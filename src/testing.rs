//! Assertion helpers and fixtures for geometry tests.
//!
//! Float-tolerant comparisons plus a few tiny meshes the integration
//! tests build on. Used by this crate's own `tests/` directory and
//! available to embedders for theirs.

use glam::Vec3;

use crate::geometry::GeometryContainer;
use crate::math::Aabb;

/// Default comparison tolerance.
pub const EPSILON: f32 = 1e-4;

/// Assert two floats agree within `epsilon`, with a readable message.
pub fn assert_near(actual: f32, expected: f32, epsilon: f32) {
    assert!(
        (actual - expected).abs() <= epsilon,
        "value mismatch:\n  expected: {expected}\n  actual:   {actual}\n  epsilon:  {epsilon}"
    );
}

/// Assert two vectors agree componentwise within `epsilon`.
pub fn assert_vec3_near(actual: Vec3, expected: Vec3, epsilon: f32) {
    assert!(
        (actual - expected).abs().max_element() <= epsilon,
        "vector mismatch:\n  expected: {expected:?}\n  actual:   {actual:?}\n  epsilon:  {epsilon}"
    );
}

/// Assert two position sets match pairwise within `epsilon`.
pub fn assert_positions_near(geo: &GeometryContainer, expected: &[Vec3], epsilon: f32) {
    let positions = geo.positions().expect("geometry has positions");
    assert_eq!(
        positions.len(),
        expected.len(),
        "point count mismatch: expected {}, actual {}",
        expected.len(),
        positions.len()
    );
    for (index, (actual, expected)) in positions.iter().zip(expected).enumerate() {
        assert!(
            (*actual - *expected).abs().max_element() <= epsilon,
            "position mismatch at point {index}:\n  expected: {expected:?}\n  actual:   {actual:?}"
        );
    }
}

/// Bounding box of a container's points (empty box when positionless).
pub fn bounds_of(geo: &GeometryContainer) -> Aabb {
    geo.bounding_box()
}

/// A single triangle in the XY plane.
pub fn triangle() -> GeometryContainer {
    let mut geo = GeometryContainer::new();
    geo.ensure_position_attribute();
    geo.set_point_count(3);
    let positions = geo.positions_mut().expect("ensured above");
    positions.set(0, Vec3::new(0.0, 0.0, 0.0));
    positions.set(1, Vec3::new(1.0, 0.0, 0.0));
    positions.set(2, Vec3::new(0.0, 1.0, 0.0));
    geo.add_polygon(&[0, 1, 2]);
    geo
}

/// Two disconnected triangles (for component and split tests).
pub fn two_triangles() -> GeometryContainer {
    let mut geo = GeometryContainer::new();
    geo.ensure_position_attribute();
    geo.set_point_count(6);
    let positions = geo.positions_mut().expect("ensured above");
    for (index, p) in [
        Vec3::new(0.0, 0.0, 0.0),
        Vec3::new(1.0, 0.0, 0.0),
        Vec3::new(0.0, 1.0, 0.0),
        Vec3::new(5.0, 0.0, 0.0),
        Vec3::new(6.0, 0.0, 0.0),
        Vec3::new(5.0, 1.0, 0.0),
    ]
    .iter()
    .enumerate()
    {
        positions.set(index, *p);
    }
    geo.add_polygon(&[0, 1, 2]);
    geo.add_polygon(&[3, 4, 5]);
    geo
}

/// A unit quad in the XZ plane.
pub fn quad() -> GeometryContainer {
    let mut geo = GeometryContainer::new();
    geo.ensure_position_attribute();
    geo.set_point_count(4);
    let positions = geo.positions_mut().expect("ensured above");
    positions.set(0, Vec3::new(0.0, 0.0, 0.0));
    positions.set(1, Vec3::new(1.0, 0.0, 0.0));
    positions.set(2, Vec3::new(1.0, 0.0, 1.0));
    positions.set(3, Vec3::new(0.0, 0.0, 1.0));
    geo.add_polygon(&[0, 1, 2, 3]);
    geo
}
