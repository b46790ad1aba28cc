//! Attribute and group operators, wrangle included.

use glam::Vec3;
use meshforge::attribute::{AttributeType, ElementClass};
use meshforge::error::{CookResult, ErrorKind};
use meshforge::geometry::{group, GeometryContainer, GeometryHandle};
use meshforge::host::NullHost;
use meshforge::param::ParameterValue;
use meshforge::sop::{NodeType, SopNode};
use meshforge::testing::{self, assert_vec3_near};

fn cook_with_inputs(node: &mut SopNode, inputs: &[GeometryContainer]) -> CookResult<GeometryHandle> {
    for (index, geo) in inputs.iter().enumerate() {
        node.set_input_data(index, GeometryHandle::from_container(geo.clone()));
    }
    node.run_operator(&NullHost)
}

#[test]
fn attribute_create_fills_defaults() {
    let mut node = SopNode::new("attr", NodeType::AttributeCreate);
    node.set_parameter("name", ParameterValue::String("weight".to_string()));
    node.set_parameter("value_float", ParameterValue::Float(0.5));
    let result = cook_with_inputs(&mut node, &[testing::triangle()]).unwrap();
    let geo = result.read().unwrap();
    let weights = geo.get_point_attribute_typed::<f32>("weight").unwrap();
    assert!(weights.iter().all(|&w| w == 0.5));
}

#[test]
fn attribute_create_vector_and_int_kinds() {
    let mut node = SopNode::new("attr", NodeType::AttributeCreate);
    node.set_parameter("name", ParameterValue::String("v".to_string()));
    node.set_parameter("type", ParameterValue::Int(1));
    node.set_parameter("value_x", ParameterValue::Float(1.0));
    node.set_parameter("value_y", ParameterValue::Float(2.0));
    node.set_parameter("value_z", ParameterValue::Float(3.0));
    let result = cook_with_inputs(&mut node, &[testing::triangle()]).unwrap();
    let geo = result.read().unwrap();
    assert_vec3_near(
        *geo.get_point_attribute_typed::<Vec3>("v").unwrap().get(0),
        Vec3::new(1.0, 2.0, 3.0),
        1e-6,
    );

    let mut node = SopNode::new("attr", NodeType::AttributeCreate);
    node.set_parameter("name", ParameterValue::String("count".to_string()));
    node.set_parameter("type", ParameterValue::Int(2));
    node.set_parameter("value_int", ParameterValue::Int(7));
    node.set_parameter("class", ParameterValue::Int(2)); // primitives
    let result = cook_with_inputs(&mut node, &[testing::triangle()]).unwrap();
    let geo = result.read().unwrap();
    assert_eq!(
        *geo.get_primitive_attribute_typed::<i32>("count").unwrap().get(0),
        7
    );
}

#[test]
fn attribute_delete_by_pattern_spares_positions() {
    let mut geo = testing::triangle();
    geo.add_point_attribute("temp_a", AttributeType::Float);
    geo.add_point_attribute("temp_b", AttributeType::Float);
    geo.add_point_attribute("keep", AttributeType::Float);

    let mut node = SopNode::new("attrdel", NodeType::AttributeDelete);
    node.set_parameter("pattern", ParameterValue::String("temp_*".to_string()));
    let result = cook_with_inputs(&mut node, &[geo.clone()]).unwrap();
    let out = result.read().unwrap();
    assert!(!out.has_point_attribute("temp_a"));
    assert!(!out.has_point_attribute("temp_b"));
    assert!(out.has_point_attribute("keep"));
    assert!(out.has_point_attribute("P"));

    // Inverted match deletes the complement but still protects P.
    let mut node = SopNode::new("attrdel", NodeType::AttributeDelete);
    node.set_parameter("pattern", ParameterValue::String("temp_*".to_string()));
    node.set_parameter("invert", ParameterValue::Int(1));
    let result = cook_with_inputs(&mut node, &[geo]).unwrap();
    let out = result.read().unwrap();
    assert!(out.has_point_attribute("temp_a"));
    assert!(!out.has_point_attribute("keep"));
    assert!(out.has_point_attribute("P"));
}

#[test]
fn color_constant_and_ramp() {
    let mut node = SopNode::new("color", NodeType::Color);
    node.set_parameter("color_r", ParameterValue::Float(0.25));
    node.set_parameter("color_g", ParameterValue::Float(0.5));
    node.set_parameter("color_b", ParameterValue::Float(0.75));
    let result = cook_with_inputs(&mut node, &[testing::triangle()]).unwrap();
    let geo = result.read().unwrap();
    assert_vec3_near(*geo.colors().unwrap().get(1), Vec3::new(0.25, 0.5, 0.75), 1e-6);

    // Ramp along Y: the apex takes the end color.
    let mut node = SopNode::new("color", NodeType::Color);
    node.set_parameter("color_mode", ParameterValue::Int(2));
    let result = cook_with_inputs(&mut node, &[testing::triangle()]).unwrap();
    let geo = result.read().unwrap();
    assert_vec3_near(*geo.colors().unwrap().get(0), Vec3::new(0.0, 0.0, 1.0), 1e-5);
    assert_vec3_near(*geo.colors().unwrap().get(2), Vec3::new(1.0, 0.0, 0.0), 1e-5);
}

#[test]
fn color_random_is_seed_stable() {
    let run = |seed: i32| -> Vec3 {
        let mut node = SopNode::new("color", NodeType::Color);
        node.set_parameter("color_mode", ParameterValue::Int(1));
        node.set_parameter("seed", ParameterValue::Int(seed));
        let result = cook_with_inputs(&mut node, &[testing::triangle()]).unwrap();
        let borrowed = result.read().unwrap();
        let out = *borrowed.colors().unwrap().get(0);
        out
    };
    assert_eq!(run(5), run(5));
    assert_ne!(run(5), run(6));
}

#[test]
fn wrangle_writes_vectors_and_moves_points() {
    let mut node = SopNode::new("wrangle", NodeType::Wrangle);
    node.set_parameter(
        "expression",
        ParameterValue::Code("@Cd = set(1.0, 0.5, 0.0);\n@P.y = @P.y + 2.0;".to_string()),
    );
    let result = cook_with_inputs(&mut node, &[testing::triangle()]).unwrap();
    let geo = result.read().unwrap();
    assert_vec3_near(*geo.colors().unwrap().get(0), Vec3::new(1.0, 0.5, 0.0), 1e-6);
    assert_vec3_near(*geo.positions().unwrap().get(2), Vec3::new(0.0, 3.0, 0.0), 1e-5);
}

#[test]
fn wrangle_reads_channels_and_builtins() {
    let mut node = SopNode::new("wrangle", NodeType::Wrangle);
    node.set_parameter(
        "expression",
        ParameterValue::Code("@offset = ch(\"amount\") * (@ptnum + 1.0);".to_string()),
    );
    node.set_parameter("amount", ParameterValue::Float(3.0));
    let result = cook_with_inputs(&mut node, &[testing::triangle()]).unwrap();
    let geo = result.read().unwrap();
    let offsets = geo.get_point_attribute_typed::<f32>("offset").unwrap();
    assert_eq!(*offsets.get(0), 3.0);
    assert_eq!(*offsets.get(2), 9.0);
}

#[test]
fn wrangle_rejects_malformed_expressions() {
    let mut node = SopNode::new("wrangle", NodeType::Wrangle);
    node.set_parameter(
        "expression",
        ParameterValue::Code("@P.y = = 1.0".to_string()),
    );
    let result = cook_with_inputs(&mut node, &[testing::triangle()]);
    assert_eq!(result.unwrap_err().kind(), ErrorKind::ParameterInvalid);
}

#[test]
fn group_sop_by_expression_and_bounds() {
    let mut node = SopNode::new("group", NodeType::Group);
    node.set_parameter("group_name", ParameterValue::String("high".to_string()));
    node.set_parameter("method", ParameterValue::Int(3));
    node.set_parameter("expression", ParameterValue::Code("@P.y > 0.5".to_string()));
    let result = cook_with_inputs(&mut node, &[testing::triangle()]).unwrap();
    let geo = result.read().unwrap();
    assert_eq!(
        group::group_elements(geo, "high", ElementClass::Point),
        vec![2]
    );

    let mut node = SopNode::new("group", NodeType::Group);
    node.set_parameter("group_name", ParameterValue::String("corner".to_string()));
    node.set_parameter("method", ParameterValue::Int(2));
    node.set_parameter("bounds_min", ParameterValue::Vec3(Vec3::new(0.5, -0.5, -0.5)));
    node.set_parameter("bounds_max", ParameterValue::Vec3(Vec3::new(1.5, 0.5, 0.5)));
    let result = cook_with_inputs(&mut node, &[testing::triangle()]).unwrap();
    let geo = result.read().unwrap();
    assert_eq!(
        group::group_elements(geo, "corner", ElementClass::Point),
        vec![1]
    );
}

#[test]
fn group_sop_by_range_with_step() {
    let mut line = SopNode::new("line", NodeType::Line);
    line.set_parameter("segments", ParameterValue::Int(9));
    let input = line
        .run_operator(&NullHost)
        .unwrap()
        .read()
        .unwrap()
        .clone();

    let mut node = SopNode::new("group", NodeType::Group);
    node.set_parameter("group_name", ParameterValue::String("alt".to_string()));
    node.set_parameter("method", ParameterValue::Int(1));
    node.set_parameter("range", ParameterValue::String("0-9:3".to_string()));
    let result = cook_with_inputs(&mut node, &[input]).unwrap();
    let geo = result.read().unwrap();
    assert_eq!(
        group::group_elements(geo, "alt", ElementClass::Point),
        vec![0, 3, 6, 9]
    );
}

#[test]
fn group_delete_by_pattern() {
    let mut geo = testing::triangle();
    group::create_group(&mut geo, "tmp_a", ElementClass::Point);
    group::create_group(&mut geo, "keep", ElementClass::Point);

    let mut node = SopNode::new("gdel", NodeType::GroupDelete);
    node.set_parameter("pattern", ParameterValue::String("tmp_*".to_string()));
    let result = cook_with_inputs(&mut node, &[geo]).unwrap();
    let out = result.read().unwrap();
    assert!(!group::has_group(out, "tmp_a", ElementClass::Point));
    assert!(group::has_group(out, "keep", ElementClass::Point));
}

#[test]
fn group_promote_any_vs_all() {
    let mut geo = testing::quad();
    group::create_group(&mut geo, "some", ElementClass::Point);
    group::add_to_group(&mut geo, "some", ElementClass::Point, 0);

    // Any: one member corner is enough.
    let mut node = SopNode::new("promote", NodeType::GroupPromote);
    node.set_parameter("group_name", ParameterValue::String("some".to_string()));
    let result = cook_with_inputs(&mut node, &[geo.clone()]).unwrap();
    assert_eq!(
        group::group_size(result.read().unwrap(), "some", ElementClass::Primitive),
        1
    );

    // All: every corner must be a member.
    let mut node = SopNode::new("promote", NodeType::GroupPromote);
    node.set_parameter("group_name", ParameterValue::String("some".to_string()));
    node.set_parameter("mode", ParameterValue::Int(1));
    let result = cook_with_inputs(&mut node, &[geo]).unwrap();
    assert_eq!(
        group::group_size(result.read().unwrap(), "some", ElementClass::Primitive),
        0
    );
}

#[test]
fn group_expand_and_shrink_along_edges() {
    let mut line = SopNode::new("line", NodeType::Line);
    line.set_parameter("segments", ParameterValue::Int(6));
    let mut input = line
        .run_operator(&NullHost)
        .unwrap()
        .read()
        .unwrap()
        .clone();
    group::create_group(&mut input, "seed", ElementClass::Point);
    group::add_to_group(&mut input, "seed", ElementClass::Point, 3);

    let mut node = SopNode::new("expand", NodeType::GroupExpand);
    node.set_parameter("group_name", ParameterValue::String("seed".to_string()));
    let result = cook_with_inputs(&mut node, &[input.clone()]).unwrap();
    assert_eq!(
        group::group_elements(result.read().unwrap(), "seed", ElementClass::Point),
        vec![2, 3, 4]
    );

    let mut node = SopNode::new("shrink", NodeType::GroupExpand);
    node.set_parameter("group_name", ParameterValue::String("seed".to_string()));
    node.set_parameter("operation", ParameterValue::Int(1));
    let shrunk = cook_with_inputs(&mut node, &[result.read().unwrap().clone()]).unwrap();
    assert_eq!(
        group::group_elements(shrunk.read().unwrap(), "seed", ElementClass::Point),
        vec![3]
    );
}

#[test]
fn group_transfer_by_index_and_position() {
    let mut source = testing::triangle();
    group::create_group(&mut source, "mark", ElementClass::Point);
    group::add_to_group(&mut source, "mark", ElementClass::Point, 1);

    let destination = testing::triangle();
    let mut node = SopNode::new("transfer", NodeType::GroupTransfer);
    let result = cook_with_inputs(&mut node, &[destination.clone(), source.clone()]).unwrap();
    assert_eq!(
        group::group_elements(result.read().unwrap(), "mark", ElementClass::Point),
        vec![1]
    );

    // Positional transfer within threshold.
    let mut node = SopNode::new("transfer", NodeType::GroupTransfer);
    node.set_parameter("method", ParameterValue::Int(1));
    node.set_parameter("threshold", ParameterValue::Float(0.01));
    let result = cook_with_inputs(&mut node, &[destination, source]).unwrap();
    assert_eq!(
        group::group_elements(result.read().unwrap(), "mark", ElementClass::Point),
        vec![1]
    );
}

#[test]
fn geodesic_distances_accumulate_along_edges() {
    let mut geo = testing::quad();
    group::create_group(&mut geo, "start", ElementClass::Point);
    group::add_to_group(&mut geo, "start", ElementClass::Point, 0);

    let mut node = SopNode::new("geo", NodeType::Geodesic);
    node.set_parameter("seed_group", ParameterValue::String("start".to_string()));
    let result = cook_with_inputs(&mut node, &[geo]).unwrap();
    let out = result.read().unwrap();
    let distances = out
        .get_point_attribute_typed::<f32>("geodesic_dist")
        .unwrap();
    assert!((distances.get(0) - 0.0).abs() < 1e-6);
    assert!((distances.get(1) - 1.0).abs() < 1e-5);
    assert!((distances.get(3) - 1.0).abs() < 1e-5);
    // The far corner is two edges away.
    assert!((distances.get(2) - 2.0).abs() < 1e-5);
}

#[test]
fn curvature_writes_a_point_attribute() {
    let mut sphere = SopNode::new("sphere", NodeType::Sphere);
    let input = sphere
        .run_operator(&NullHost)
        .unwrap()
        .read()
        .unwrap()
        .clone();

    let mut node = SopNode::new("curv", NodeType::Curvature);
    node.set_parameter("curvature_type", ParameterValue::Int(1)); // gaussian
    let result = cook_with_inputs(&mut node, &[input]).unwrap();
    let geo = result.read().unwrap();
    let curvature = geo.get_point_attribute_typed::<f32>("curvature").unwrap();
    assert_eq!(curvature.len(), geo.point_count());
    // A sphere curves positively everywhere.
    let average: f32 = curvature.iter().sum::<f32>() / curvature.len() as f32;
    assert!(average > 0.0);
}
