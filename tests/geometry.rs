//! GeometryContainer and copy-on-write handle behavior.

use glam::Vec3;
use meshforge::attribute::{AttributeType, ElementClass};
use meshforge::geometry::{group, GeometryContainer, GeometryHandle};
use meshforge::testing;

/// A 2x2x2 cube with shared corner points and named point values.
fn cube() -> GeometryContainer {
    let mut geo = GeometryContainer::new();
    geo.ensure_position_attribute();
    geo.set_point_count(8);
    {
        let positions = geo.positions_mut().unwrap();
        for (i, p) in [
            Vec3::new(-1.0, -1.0, -1.0),
            Vec3::new(1.0, -1.0, -1.0),
            Vec3::new(1.0, 1.0, -1.0),
            Vec3::new(-1.0, 1.0, -1.0),
            Vec3::new(-1.0, -1.0, 1.0),
            Vec3::new(1.0, -1.0, 1.0),
            Vec3::new(1.0, 1.0, 1.0),
            Vec3::new(-1.0, 1.0, 1.0),
        ]
        .iter()
        .enumerate()
        {
            positions.set(i, *p);
        }
    }
    for face in [
        [0u32, 3, 2, 1],
        [4, 5, 6, 7],
        [0, 1, 5, 4],
        [3, 7, 6, 2],
        [0, 4, 7, 3],
        [1, 2, 6, 5],
    ] {
        geo.add_polygon(&face);
    }
    geo.add_point_attribute("id", AttributeType::Int);
    let ids = geo.get_point_attribute_typed_mut::<i32>("id").unwrap();
    for i in 0..8 {
        ids.set(i, i as i32 * 10);
    }
    geo
}

#[test]
fn container_validates_consistent_sizes() {
    let geo = cube();
    assert!(geo.validate());
    assert_eq!(geo.point_count(), 8);
    assert_eq!(geo.vertex_count(), 24);
    assert_eq!(geo.primitive_count(), 6);
}

#[test]
fn clone_is_independent() {
    let geo = cube();
    let mut copy = geo.clone();
    copy.positions_mut().unwrap().set(0, Vec3::splat(99.0));
    assert_ne!(
        *geo.positions().unwrap().get(0),
        *copy.positions().unwrap().get(0)
    );
}

#[test]
fn stats_report_counts_and_memory() {
    let geo = cube();
    let stats = geo.stats();
    assert_eq!(stats.points, 8);
    assert_eq!(stats.primitives, 6);
    assert_eq!(stats.point_attributes, 2); // P and id
    assert!(stats.total_memory_bytes > 0);
}

#[test]
fn delete_points_drops_touching_primitives() {
    let mut geo = cube();
    group::create_group(&mut geo, "top", ElementClass::Point);
    for point in 0..8 {
        if geo.positions().unwrap().get(point).y > 0.0 {
            group::add_to_group(&mut geo, "top", ElementClass::Point, point);
        }
    }

    let result = geo
        .delete_elements("top", ElementClass::Point, false)
        .unwrap();
    assert!(result.validate());
    assert_eq!(result.point_count(), 4);
    // Only the bottom face had no deleted corner.
    assert_eq!(result.primitive_count(), 1);
    for p in result.positions().unwrap().iter() {
        assert!(p.y < 0.0);
    }
    // Retained attribute values are unchanged.
    let ids = result.get_point_attribute_typed::<i32>("id").unwrap();
    let mut values: Vec<i32> = ids.iter().copied().collect();
    values.sort_unstable();
    assert_eq!(values, vec![0, 10, 40, 50]);
}

#[test]
fn delete_primitives_keeps_points_unless_orphaned() {
    let mut geo = cube();
    group::create_group(&mut geo, "walls", ElementClass::Primitive);
    for prim in 1..6 {
        group::add_to_group(&mut geo, "walls", ElementClass::Primitive, prim);
    }

    let keep_points = geo
        .delete_elements("walls", ElementClass::Primitive, false)
        .unwrap();
    assert_eq!(keep_points.primitive_count(), 1);
    assert_eq!(keep_points.point_count(), 8);
    assert!(keep_points.validate());

    let drop_points = geo
        .delete_elements("walls", ElementClass::Primitive, true)
        .unwrap();
    assert_eq!(drop_points.primitive_count(), 1);
    // The surviving face references exactly 4 points.
    assert_eq!(drop_points.point_count(), 4);
    assert!(drop_points.validate());
}

#[test]
fn delete_orphaned_points_leaves_no_unreferenced_point() {
    let mut geo = cube();
    group::create_group(&mut geo, "walls", ElementClass::Primitive);
    for prim in 1..6 {
        group::add_to_group(&mut geo, "walls", ElementClass::Primitive, prim);
    }
    let result = geo
        .delete_elements("walls", ElementClass::Primitive, true)
        .unwrap();

    let mut referenced = vec![false; result.point_count()];
    for v in 0..result.vertex_count() {
        referenced[result.topology().vertex_point(v) as usize] = true;
    }
    assert!(referenced.iter().all(|&r| r));
}

#[test]
fn delete_reports_bad_arguments() {
    let geo = cube();
    let missing = geo.delete_elements("nope", ElementClass::Point, false);
    assert!(missing.is_err());
    assert!(missing.unwrap_err().message().contains("does not exist"));

    let mut geo = cube();
    group::create_group(&mut geo, "empty", ElementClass::Point);
    let empty = geo.delete_elements("empty", ElementClass::Point, false);
    assert!(empty.unwrap_err().message().contains("is empty"));

    let invalid = geo.delete_elements("empty", ElementClass::Vertex, false);
    assert!(invalid.is_err());
}

#[test]
fn handle_write_copies_only_when_shared() {
    let h1 = GeometryHandle::from_container(cube());
    let mut h2 = h1.clone();
    assert_eq!(h1.use_count(), 2);
    assert!(!h1.is_unique());

    h2.write().unwrap().set_point_count(1);

    // After the write h2 owns a private copy and h1 kept the original.
    assert!(h2.is_unique());
    assert_eq!(h1.use_count(), 1);
    assert_eq!(h1.read().unwrap().point_count(), 8);
    assert_eq!(h2.read().unwrap().point_count(), 1);
}

#[test]
fn unique_handle_writes_in_place() {
    let mut handle = GeometryHandle::from_container(cube());
    assert!(handle.is_unique());
    handle.make_unique();
    handle.write().unwrap().set_point_count(2);
    assert_eq!(handle.read().unwrap().point_count(), 2);
    assert_eq!(handle.use_count(), 1);
}

#[test]
fn empty_handle_is_a_valid_state() {
    let mut handle = GeometryHandle::empty();
    assert!(handle.is_empty());
    assert!(handle.read().is_none());
    assert!(handle.write().is_none());
    assert_eq!(handle.use_count(), 0);

    handle = GeometryHandle::from_container(cube());
    handle.reset();
    assert!(handle.is_empty());
}

#[test]
fn deep_clone_never_shares() {
    let h1 = GeometryHandle::from_container(cube());
    let h2 = h1.deep_clone();
    assert_eq!(h1.use_count(), 1);
    assert_eq!(h2.use_count(), 1);
}

#[test]
fn bounding_box_matches_extents() {
    let geo = cube();
    let bounds = testing::bounds_of(&geo);
    assert_eq!(bounds.extent(), Vec3::splat(2.0));
    assert_eq!(bounds.center(), Vec3::ZERO);
}
