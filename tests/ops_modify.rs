//! Deformers and topology modifiers.

use glam::Vec3;
use meshforge::attribute::ElementClass;
use meshforge::error::{CookResult, ErrorKind};
use meshforge::geometry::{group, GeometryContainer, GeometryHandle};
use meshforge::host::NullHost;
use meshforge::param::ParameterValue;
use meshforge::sop::{NodeType, SopNode};
use meshforge::testing::{self, assert_vec3_near};

fn cook_with_input(node: &mut SopNode, input: GeometryContainer) -> CookResult<GeometryHandle> {
    node.set_input_data(0, GeometryHandle::from_container(input));
    node.run_operator(&NullHost)
}

fn generate(node_type: NodeType) -> GeometryContainer {
    let mut node = SopNode::new("gen", node_type);
    node.run_operator(&NullHost)
        .unwrap()
        .read()
        .unwrap()
        .clone()
}

#[test]
fn transform_applies_scale_rotate_translate() {
    let mut node = SopNode::new("xform", NodeType::Transform);
    node.set_parameter("translate", ParameterValue::Vec3(Vec3::new(1.0, 2.0, 3.0)));
    node.set_parameter("scale", ParameterValue::Vec3(Vec3::splat(2.0)));

    let result = cook_with_input(&mut node, testing::triangle()).unwrap();
    let geo = result.read().unwrap();
    assert_vec3_near(
        *geo.positions().unwrap().get(1),
        Vec3::new(3.0, 2.0, 3.0),
        1e-5,
    );
}

#[test]
fn transform_rotation_is_zyx_order() {
    let mut node = SopNode::new("xform", NodeType::Transform);
    // 90 degrees around Z maps +X to +Y.
    node.set_parameter("rotate", ParameterValue::Vec3(Vec3::new(0.0, 0.0, 90.0)));
    let result = cook_with_input(&mut node, testing::triangle()).unwrap();
    let geo = result.read().unwrap();
    assert_vec3_near(
        *geo.positions().unwrap().get(1),
        Vec3::new(0.0, 1.0, 0.0),
        1e-5,
    );
}

#[test]
fn transform_honors_point_groups() {
    let mut geo = testing::triangle();
    group::create_group(&mut geo, "only", ElementClass::Point);
    group::add_to_group(&mut geo, "only", ElementClass::Point, 0);

    let mut node = SopNode::new("xform", NodeType::Transform);
    node.set_parameter("input_group", ParameterValue::String("only".to_string()));
    node.set_parameter("translate", ParameterValue::Vec3(Vec3::new(0.0, 5.0, 0.0)));

    let result = cook_with_input(&mut node, geo).unwrap();
    let out = result.read().unwrap();
    assert_vec3_near(*out.positions().unwrap().get(0), Vec3::new(0.0, 5.0, 0.0), 1e-5);
    // Non-members stay put.
    assert_vec3_near(*out.positions().unwrap().get(1), Vec3::new(1.0, 0.0, 0.0), 1e-5);
}

#[test]
fn transform_requires_a_known_group() {
    let mut node = SopNode::new("xform", NodeType::Transform);
    node.set_parameter("input_group", ParameterValue::String("ghost".to_string()));
    let result = cook_with_input(&mut node, testing::triangle());
    assert_eq!(result.unwrap_err().kind(), ErrorKind::ParameterInvalid);
}

#[test]
fn mirror_without_original_reflects_and_double_apply_is_identity() {
    let original = testing::triangle();
    let expected: Vec<Vec3> = original
        .positions()
        .unwrap()
        .iter()
        .copied()
        .collect();

    let mut node = SopNode::new("mirror", NodeType::Mirror);
    node.set_parameter("plane", ParameterValue::Int(0)); // XY plane
    node.set_parameter("keep_original", ParameterValue::Bool(false));

    let once = cook_with_input(&mut node, original.clone()).unwrap();
    let twice = cook_with_input(&mut node, once.read().unwrap().clone()).unwrap();
    let geo = twice.read().unwrap();

    testing::assert_positions_near(geo, &expected, 1e-5);
    assert_eq!(geo.primitive_count(), original.primitive_count());
    // Winding reversed twice is the original ordering of points.
    let points: Vec<u32> = geo.topology().primitive_points(0).collect();
    let original_points: Vec<u32> = original.topology().primitive_points(0).collect();
    assert_eq!(points, original_points);
}

#[test]
fn mirror_keep_original_doubles_the_mesh() {
    let mut node = SopNode::new("mirror", NodeType::Mirror);
    node.set_parameter("plane", ParameterValue::Int(2)); // YZ plane
    let result = cook_with_input(&mut node, testing::triangle()).unwrap();
    let geo = result.read().unwrap();
    assert_eq!(geo.point_count(), 6);
    assert_eq!(geo.primitive_count(), 2);
    assert!(geo.validate());
}

#[test]
fn align_centers_the_bounding_box() {
    let mut xform = SopNode::new("xform", NodeType::Transform);
    xform.set_parameter("translate", ParameterValue::Vec3(Vec3::new(7.0, -2.0, 3.0)));
    let moved = cook_with_input(&mut xform, generate(NodeType::Box)).unwrap();

    let mut align = SopNode::new("align", NodeType::Align);
    let result = cook_with_input(&mut align, moved.read().unwrap().clone()).unwrap();
    assert_vec3_near(
        result.read().unwrap().bounding_box().center(),
        Vec3::ZERO,
        1e-5,
    );
}

#[test]
fn align_min_mode_rests_on_the_origin() {
    let mut align = SopNode::new("align", NodeType::Align);
    align.set_parameter("align_mode", ParameterValue::Int(1));
    let result = cook_with_input(&mut align, generate(NodeType::Box)).unwrap();
    assert_vec3_near(result.read().unwrap().bounding_box().min, Vec3::ZERO, 1e-5);
}

#[test]
fn twist_rotates_proportionally_to_height() {
    let mut line = SopNode::new("line", NodeType::Line);
    line.set_parameter("start", ParameterValue::Vec3(Vec3::new(1.0, 0.0, 0.0)));
    line.set_parameter("end", ParameterValue::Vec3(Vec3::new(1.0, 1.0, 0.0)));
    line.set_parameter("segments", ParameterValue::Int(2));
    let input = line
        .run_operator(&NullHost)
        .unwrap()
        .read()
        .unwrap()
        .clone();

    let mut twist = SopNode::new("twist", NodeType::Twist);
    twist.set_parameter("angle", ParameterValue::Float(90.0));
    let result = cook_with_input(&mut twist, input).unwrap();
    let geo = result.read().unwrap();

    // Base (distance 0) is unmoved; the top rotated 90 degrees around Y.
    assert_vec3_near(*geo.positions().unwrap().get(0), Vec3::new(1.0, 0.0, 0.0), 1e-5);
    assert_vec3_near(*geo.positions().unwrap().get(2), Vec3::new(0.0, 1.0, -1.0), 1e-4);
}

#[test]
fn bend_keeps_points_before_the_capture_region() {
    let mut line = SopNode::new("line", NodeType::Line);
    line.set_parameter("segments", ParameterValue::Int(10));
    let input = line
        .run_operator(&NullHost)
        .unwrap()
        .read()
        .unwrap()
        .clone();

    let mut bend = SopNode::new("bend", NodeType::Bend);
    bend.set_parameter("angle", ParameterValue::Float(90.0));
    bend.set_parameter("capture_origin", ParameterValue::Float(0.5));
    let result = cook_with_input(&mut bend, input.clone()).unwrap();
    let geo = result.read().unwrap();

    // Below the capture origin nothing moves.
    for point in 0..5 {
        assert_vec3_near(
            *geo.positions().unwrap().get(point),
            *input.positions().unwrap().get(point),
            1e-5,
        );
    }
    // The tip bent away from the axis.
    let tip = *geo.positions().unwrap().get(10);
    assert!(tip.x.abs() > 1e-3);
}

#[test]
fn array_emits_offset_copies() {
    let mut node = SopNode::new("array", NodeType::Array);
    node.set_parameter("copies", ParameterValue::Int(3));
    node.set_parameter(
        "translate_step",
        ParameterValue::Vec3(Vec3::new(2.0, 0.0, 0.0)),
    );
    let result = cook_with_input(&mut node, testing::triangle()).unwrap();
    let geo = result.read().unwrap();
    assert_eq!(geo.point_count(), 9);
    assert_eq!(geo.primitive_count(), 3);
    // Third copy is shifted by two steps.
    assert_vec3_near(*geo.positions().unwrap().get(6), Vec3::new(4.0, 0.0, 0.0), 1e-5);
}

#[test]
fn subdivide_quad_one_level() {
    let mut node = SopNode::new("subd", NodeType::Subdivide);
    let result = cook_with_input(&mut node, testing::quad()).unwrap();
    let geo = result.read().unwrap();
    assert!(geo.validate());
    // One quad -> 4 quads around a face point: 4 + 1 + 4 edge points.
    assert_eq!(geo.point_count(), 9);
    assert_eq!(geo.primitive_count(), 4);
    for prim in 0..4 {
        assert_eq!(geo.topology().primitive_vertices(prim).len(), 4);
    }
}

#[test]
fn subdivide_closed_box_quadruples_faces() {
    let mut node = SopNode::new("subd", NodeType::Subdivide);
    node.set_parameter("levels", ParameterValue::Int(2));
    let result = cook_with_input(&mut node, generate(NodeType::Box)).unwrap();
    let geo = result.read().unwrap();
    assert!(geo.validate());
    assert_eq!(geo.primitive_count(), 6 * 16);
}

#[test]
fn unimplemented_schemes_report_algorithm_failure() {
    let mut node = SopNode::new("subd", NodeType::Subdivide);
    node.set_parameter("subdivision_type", ParameterValue::Int(1));
    let result = cook_with_input(&mut node, testing::quad());
    assert_eq!(result.unwrap_err().kind(), ErrorKind::AlgorithmFailure);

    for node_type in [
        NodeType::Remesh,
        NodeType::Extrude,
        NodeType::PolyExtrude,
        NodeType::Lattice,
        NodeType::Bevel,
        NodeType::UvUnwrap,
        NodeType::Parameterize,
    ] {
        let mut node = SopNode::new("nyi", node_type);
        let result = cook_with_input(&mut node, testing::quad());
        assert_eq!(
            result.unwrap_err().kind(),
            ErrorKind::AlgorithmFailure,
            "{node_type}"
        );
    }
}

#[test]
fn smooth_contracts_an_open_grid() {
    let mut grid = SopNode::new("grid", NodeType::Grid);
    grid.set_parameter("columns", ParameterValue::Int(8));
    grid.set_parameter("rows", ParameterValue::Int(8));
    let input = grid
        .run_operator(&NullHost)
        .unwrap()
        .read()
        .unwrap()
        .clone();
    let before = input.bounding_box().extent();

    let mut node = SopNode::new("smooth", NodeType::Smooth);
    node.set_parameter("laplace_type", ParameterValue::Int(1)); // uniform
    node.set_parameter("iterations", ParameterValue::Int(20));
    node.set_parameter("rescale", ParameterValue::Int(0));
    let result = cook_with_input(&mut node, input).unwrap();
    let after = result.read().unwrap().bounding_box().extent();
    assert!(after.x < before.x);
    assert!(after.z < before.z);
}

#[test]
fn smooth_rescale_restores_the_bounding_box() {
    let input = generate(NodeType::Sphere);
    let before = input.bounding_box();

    let mut node = SopNode::new("smooth", NodeType::Smooth);
    node.set_parameter("iterations", ParameterValue::Int(10));
    let result = cook_with_input(&mut node, input).unwrap();
    let after = result.read().unwrap().bounding_box();
    assert_vec3_near(after.extent(), before.extent(), 1e-3);
}

#[test]
fn noise_displacement_is_seed_deterministic() {
    let positions = |seed: i32| -> Vec<Vec3> {
        let mut node = SopNode::new("noise", NodeType::NoiseDisplacement);
        node.set_parameter("seed", ParameterValue::Int(seed));
        node.set_parameter("amplitude", ParameterValue::Float(0.5));
        let result = cook_with_input(&mut node, generate(NodeType::Sphere)).unwrap();
        let borrowed = result.read().unwrap();
        borrowed.positions().unwrap().iter().copied().collect()
    };

    assert_eq!(positions(7), positions(7));
    assert_ne!(positions(7), positions(8));
}

#[test]
fn normal_point_mode_on_a_grid_points_up() {
    let mut node = SopNode::new("normal", NodeType::Normal);
    node.set_parameter("mode", ParameterValue::Int(2));
    let result = cook_with_input(&mut node, generate(NodeType::Grid)).unwrap();
    let geo = result.read().unwrap();
    let normals = geo.point_normals().expect("point normals computed");
    for n in normals.iter() {
        assert_vec3_near(*n, Vec3::Y, 1e-4);
    }
}

#[test]
fn normal_face_mode_is_unit_length_and_reversible() {
    let mut node = SopNode::new("normal", NodeType::Normal);
    node.set_parameter("mode", ParameterValue::Int(1));
    node.set_parameter("reverse", ParameterValue::Bool(true));
    let result = cook_with_input(&mut node, generate(NodeType::Grid)).unwrap();
    let geo = result.read().unwrap();
    let normals = geo
        .get_primitive_attribute_typed::<Vec3>("N")
        .expect("face normals computed");
    for n in normals.iter() {
        assert_vec3_near(*n, -Vec3::Y, 1e-4);
    }
}

#[test]
fn normal_vertex_mode_fills_vertex_slots() {
    let mut node = SopNode::new("normal", NodeType::Normal);
    node.set_parameter("mode", ParameterValue::Int(0));
    let result = cook_with_input(&mut node, generate(NodeType::Box)).unwrap();
    let geo = result.read().unwrap();
    let normals = geo.vertex_normals().expect("vertex normals computed");
    assert_eq!(normals.len(), geo.vertex_count());
    for n in normals.iter() {
        assert!((n.length() - 1.0).abs() < 1e-4);
    }
}

#[test]
fn fuse_merges_coincident_points() {
    // Two triangles sharing an edge spatially but not topologically.
    let mut geo = GeometryContainer::new();
    geo.ensure_position_attribute();
    geo.set_point_count(6);
    {
        let positions = geo.positions_mut().unwrap();
        positions.set(0, Vec3::new(0.0, 0.0, 0.0));
        positions.set(1, Vec3::new(1.0, 0.0, 0.0));
        positions.set(2, Vec3::new(0.0, 1.0, 0.0));
        positions.set(3, Vec3::new(1.0, 0.0, 0.0));
        positions.set(4, Vec3::new(0.0, 1.0, 0.0));
        positions.set(5, Vec3::new(1.0, 1.0, 0.0));
    }
    geo.add_polygon(&[0, 1, 2]);
    geo.add_polygon(&[3, 5, 4]);

    let mut node = SopNode::new("fuse", NodeType::Fuse);
    node.set_parameter("distance", ParameterValue::Float(0.001));
    let result = cook_with_input(&mut node, geo).unwrap();
    let fused = result.read().unwrap();
    assert_eq!(fused.point_count(), 4);
    assert_eq!(fused.primitive_count(), 2);
    assert!(fused.validate());
}

#[test]
fn decimate_reaches_the_target_point_count() {
    let mut node = SopNode::new("decimate", NodeType::Decimate);
    node.set_parameter("target_mode", ParameterValue::Int(1));
    node.set_parameter("target_point_count", ParameterValue::Int(40));
    node.set_parameter("preserve_boundaries", ParameterValue::Bool(false));

    let input = generate(NodeType::Sphere);
    let before = input.point_count();
    let result = cook_with_input(&mut node, input).unwrap();
    let geo = result.read().unwrap();
    assert!(geo.point_count() <= 40);
    assert!(geo.point_count() < before);
    assert!(geo.validate());
}

#[test]
fn repair_caps_an_open_quad() {
    let mut node = SopNode::new("repair", NodeType::RepairMesh);
    let result = cook_with_input(&mut node, testing::quad()).unwrap();
    let geo = result.read().unwrap();
    // Centroid fan: one new point, four triangles over the 4-loop.
    assert_eq!(geo.point_count(), 5);
    assert_eq!(geo.primitive_count(), 5);
    assert!(geo.validate());
}

#[test]
fn repair_respects_hole_size_limits() {
    let mut node = SopNode::new("repair", NodeType::RepairMesh);
    node.set_parameter("max_hole_size", ParameterValue::Int(3));
    let result = cook_with_input(&mut node, testing::quad()).unwrap();
    // The 4-corner hole exceeds the limit and stays open.
    assert_eq!(result.read().unwrap().primitive_count(), 1);
}

#[test]
fn resample_by_count_spaces_points_evenly() {
    let mut line = SopNode::new("line", NodeType::Line);
    line.set_parameter("end", ParameterValue::Vec3(Vec3::new(0.0, 3.0, 0.0)));
    line.set_parameter("segments", ParameterValue::Int(3));
    let input = line
        .run_operator(&NullHost)
        .unwrap()
        .read()
        .unwrap()
        .clone();

    let mut node = SopNode::new("resample", NodeType::Resample);
    node.set_parameter("mode", ParameterValue::Int(1));
    node.set_parameter("segment_count", ParameterValue::Int(6));
    let result = cook_with_input(&mut node, input).unwrap();
    let geo = result.read().unwrap();
    assert_eq!(geo.point_count(), 7);
    assert_vec3_near(*geo.positions().unwrap().get(3), Vec3::new(0.0, 1.5, 0.0), 1e-4);
}
