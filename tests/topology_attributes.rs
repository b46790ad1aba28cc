//! Topology and attribute-layer invariants.

use glam::Vec3;
use meshforge::attribute::{AttributeSet, AttributeType, ElementClass, InterpolationMode};
use meshforge::topology::ElementTopology;

#[test]
fn topology_indices_validate() {
    let mut topo = ElementTopology::new();
    topo.set_point_count(4);
    topo.set_vertex_count(4);
    for v in 0..4 {
        topo.set_vertex_point(v, v as u32);
    }
    topo.add_primitive(vec![0, 1, 2, 3]);
    assert!(topo.validate());
    assert_eq!(topo.primitive_vertices(0), &[0, 1, 2, 3]);

    // Out-of-range vertex -> invalid.
    topo.add_primitive(vec![0, 9]);
    assert!(!topo.validate());
}

#[test]
fn topology_clear_resets_counts() {
    let mut topo = ElementTopology::new();
    topo.set_point_count(10);
    topo.set_vertex_count(5);
    topo.add_primitive(vec![0, 1, 2]);
    topo.clear();
    assert_eq!(topo.point_count(), 0);
    assert_eq!(topo.vertex_count(), 0);
    assert_eq!(topo.primitive_count(), 0);
}

#[test]
fn vertex_point_entries_default_to_zero() {
    let mut topo = ElementTopology::new();
    topo.set_point_count(1);
    topo.set_vertex_count(3);
    assert_eq!(topo.vertex_point(2), 0);
}

#[test]
fn add_fails_on_duplicate_name() {
    let mut set = AttributeSet::new(ElementClass::Point);
    assert!(set.add("P", AttributeType::Vec3f, InterpolationMode::Linear));
    assert!(!set.add("P", AttributeType::Float, InterpolationMode::Linear));
    assert_eq!(set.attribute_count(), 1);
}

#[test]
fn has_tracks_add_remove_sequences() {
    let mut set = AttributeSet::new(ElementClass::Point);
    assert!(!set.has("mass"));
    set.add("mass", AttributeType::Float, InterpolationMode::Linear);
    assert!(set.has("mass"));
    assert!(set.remove("mass"));
    assert!(!set.has("mass"));
    assert!(!set.remove("mass"));
    set.add("mass", AttributeType::Float, InterpolationMode::Linear);
    assert!(set.has("mass"));
}

#[test]
fn typed_access_checks_the_tag() {
    let mut set = AttributeSet::new(ElementClass::Point);
    set.resize(4);
    set.add("Cd", AttributeType::Vec3f, InterpolationMode::Linear);

    assert!(set.get_typed::<Vec3>("Cd").is_some());
    // Wrong element type -> None, never a reinterpretation.
    assert!(set.get_typed::<f32>("Cd").is_none());
    assert!(set.get_typed::<Vec3>("missing").is_none());
}

#[test]
fn resize_keeps_all_storages_in_lockstep() {
    let mut set = AttributeSet::new(ElementClass::Point);
    set.add("P", AttributeType::Vec3f, InterpolationMode::Linear);
    set.add("id", AttributeType::Int, InterpolationMode::Constant);
    set.resize(7);
    assert!(set.validate());
    assert_eq!(set.get("P").unwrap().len(), 7);
    assert_eq!(set.get("id").unwrap().len(), 7);
}

#[test]
fn clone_is_deep() {
    let mut set = AttributeSet::new(ElementClass::Point);
    set.resize(2);
    set.add("name", AttributeType::String, InterpolationMode::Constant);
    set.get_typed_mut::<String>("name")
        .unwrap()
        .set(0, "left".to_string());

    let cloned = set.clone();
    set.get_typed_mut::<String>("name")
        .unwrap()
        .set(0, "changed".to_string());
    assert_eq!(cloned.get_typed::<String>("name").unwrap().get(0), "left");
}

#[test]
fn names_keep_insertion_order() {
    let mut set = AttributeSet::new(ElementClass::Vertex);
    set.add("N", AttributeType::Vec3f, InterpolationMode::Linear);
    set.add("uv", AttributeType::Vec2f, InterpolationMode::Linear);
    set.add("weight", AttributeType::Float, InterpolationMode::Linear);
    assert_eq!(set.names(), vec!["N", "uv", "weight"]);

    set.remove("uv");
    assert_eq!(set.names(), vec!["N", "weight"]);
    // Lookup still works after the positional shift.
    assert!(set.get_typed::<f32>("weight").is_some());
}

#[test]
fn detail_sets_always_have_one_slot() {
    let mut set = AttributeSet::new(ElementClass::Detail);
    set.add("time", AttributeType::Float, InterpolationMode::Constant);
    assert_eq!(set.size(), 1);
    assert_eq!(set.get("time").unwrap().len(), 1);
}

#[test]
fn memory_usage_grows_with_elements() {
    let mut set = AttributeSet::new(ElementClass::Point);
    set.add("P", AttributeType::Vec3f, InterpolationMode::Linear);
    let empty = set.memory_usage();
    set.resize(1000);
    assert!(set.memory_usage() > empty);
}
