//! Generator operator contracts.

use glam::Vec3;
use meshforge::error::CookResult;
use meshforge::geometry::GeometryHandle;
use meshforge::host::NullHost;
use meshforge::param::ParameterValue;
use meshforge::sop::{NodeType, SopNode};
use meshforge::testing::assert_vec3_near;

fn cook(node: &mut SopNode) -> CookResult<GeometryHandle> {
    node.run_operator(&NullHost)
}

#[test]
fn box_unit_segments_is_a_cube() {
    let mut node = SopNode::new("box1", NodeType::Box);
    node.set_parameter("width", ParameterValue::Float(2.0));
    node.set_parameter("height", ParameterValue::Float(3.0));
    node.set_parameter("depth", ParameterValue::Float(4.0));

    let result = cook(&mut node).unwrap();
    let geo = result.read().unwrap();
    assert!(geo.validate());
    assert_eq!(geo.point_count(), 8);
    assert_eq!(geo.primitive_count(), 6);
    // Every face is a quad.
    for prim in 0..6 {
        assert_eq!(geo.topology().primitive_vertices(prim).len(), 4);
    }
    assert_vec3_near(geo.bounding_box().extent(), Vec3::new(2.0, 3.0, 4.0), 1e-6);
    assert_vec3_near(geo.bounding_box().center(), Vec3::ZERO, 1e-6);
}

#[test]
fn box_subdivisions_share_seam_points() {
    let mut node = SopNode::new("box1", NodeType::Box);
    node.set_parameter("width_segments", ParameterValue::Int(2));
    node.set_parameter("height_segments", ParameterValue::Int(2));
    node.set_parameter("depth_segments", ParameterValue::Int(2));

    let result = cook(&mut node).unwrap();
    let geo = result.read().unwrap();
    assert!(geo.validate());
    // A 2x2x2 lattice surface: 26 unique points (3^3 minus the center),
    // 4 quads per face.
    assert_eq!(geo.point_count(), 26);
    assert_eq!(geo.primitive_count(), 24);
}

#[test]
fn sphere_points_lie_on_the_radius() {
    let mut node = SopNode::new("sphere1", NodeType::Sphere);
    node.set_parameter("radius", ParameterValue::Float(2.5));
    node.set_parameter("segments", ParameterValue::Int(12));
    node.set_parameter("rings", ParameterValue::Int(6));

    let result = cook(&mut node).unwrap();
    let geo = result.read().unwrap();
    assert!(geo.validate());
    assert_eq!(geo.point_count(), 2 + 5 * 12);
    for p in geo.positions().unwrap().iter() {
        assert!((p.length() - 2.5).abs() < 1e-4);
    }
}

#[test]
fn minimal_sphere_has_two_fans() {
    let mut node = SopNode::new("sphere1", NodeType::Sphere);
    node.set_parameter("segments", ParameterValue::Int(4));
    node.set_parameter("rings", ParameterValue::Int(2));

    let result = cook(&mut node).unwrap();
    let geo = result.read().unwrap();
    assert_eq!(geo.point_count(), 6);
    assert_eq!(geo.primitive_count(), 8);
    for p in geo.positions().unwrap().iter() {
        assert!((p.length() - 1.0).abs() < 1e-5);
    }
}

#[test]
fn cylinder_caps_are_optional() {
    let mut node = SopNode::new("cyl1", NodeType::Cylinder);
    node.set_parameter("radial_segments", ParameterValue::Int(8));

    let result = cook(&mut node).unwrap();
    assert_eq!(result.read().unwrap().primitive_count(), 10);

    node.set_parameter("top_cap", ParameterValue::Bool(false));
    node.set_parameter("bottom_cap", ParameterValue::Bool(false));
    let open = cook(&mut node).unwrap();
    assert_eq!(open.read().unwrap().primitive_count(), 8);
}

#[test]
fn torus_is_a_closed_quad_lattice() {
    let mut node = SopNode::new("torus1", NodeType::Torus);
    node.set_parameter("major_segments", ParameterValue::Int(8));
    node.set_parameter("minor_segments", ParameterValue::Int(6));

    let result = cook(&mut node).unwrap();
    let geo = result.read().unwrap();
    assert!(geo.validate());
    assert_eq!(geo.point_count(), 48);
    assert_eq!(geo.primitive_count(), 48);
}

#[test]
fn grid_counts_and_uvs() {
    let mut node = SopNode::new("grid1", NodeType::Grid);
    node.set_parameter("columns", ParameterValue::Int(3));
    node.set_parameter("rows", ParameterValue::Int(2));

    let result = cook(&mut node).unwrap();
    let geo = result.read().unwrap();
    assert_eq!(geo.point_count(), 12);
    assert_eq!(geo.primitive_count(), 6);
    let uvs = geo.uvs().expect("grid emits vertex uvs");
    for uv in uvs.iter() {
        assert!(uv.x >= 0.0 && uv.x <= 1.0);
        assert!(uv.y >= 0.0 && uv.y <= 1.0);
    }
    // Grid lies flat in XZ.
    for p in geo.positions().unwrap().iter() {
        assert_eq!(p.y, 0.0);
    }
}

#[test]
fn line_spans_start_to_end() {
    let mut node = SopNode::new("line1", NodeType::Line);
    node.set_parameter("start", ParameterValue::Vec3(Vec3::ZERO));
    node.set_parameter("end", ParameterValue::Vec3(Vec3::new(0.0, 2.0, 0.0)));
    node.set_parameter("segments", ParameterValue::Int(4));

    let result = cook(&mut node).unwrap();
    let geo = result.read().unwrap();
    assert_eq!(geo.point_count(), 5);
    assert_eq!(geo.primitive_count(), 1);
    assert_vec3_near(*geo.positions().unwrap().get(0), Vec3::ZERO, 1e-6);
    assert_vec3_near(
        *geo.positions().unwrap().get(4),
        Vec3::new(0.0, 2.0, 0.0),
        1e-6,
    );
    assert_vec3_near(
        *geo.positions().unwrap().get(2),
        Vec3::new(0.0, 1.0, 0.0),
        1e-6,
    );
}

#[test]
fn points_mode_strips_primitives() {
    for node_type in [
        NodeType::Box,
        NodeType::Sphere,
        NodeType::Cylinder,
        NodeType::Torus,
        NodeType::Grid,
        NodeType::Line,
    ] {
        let mut node = SopNode::new("gen", node_type);
        let full = cook(&mut node).unwrap();
        let full_points = full.read().unwrap().point_count();

        node.set_parameter("primitive_type", ParameterValue::Int(1));
        let points_only = cook(&mut node).unwrap();
        let geo = points_only.read().unwrap();
        assert_eq!(geo.point_count(), full_points, "{node_type}");
        assert_eq!(geo.primitive_count(), 0, "{node_type}");
        assert_eq!(geo.vertex_count(), 0, "{node_type}");
    }
}

#[test]
fn time_node_emits_clock_attributes() {
    let mut node = SopNode::new("time1", NodeType::Time);
    node.set_parameter("frame", ParameterValue::Int(48));
    node.set_parameter("fps", ParameterValue::Float(24.0));
    node.set_parameter("start_frame", ParameterValue::Int(1));
    node.set_parameter("end_frame", ParameterValue::Int(241));

    let result = cook(&mut node).unwrap();
    let geo = result.read().unwrap();
    assert_eq!(geo.point_count(), 1);
    assert_eq!(
        *geo.get_point_attribute_typed::<i32>("frame").unwrap().get(0),
        48
    );
    assert!(
        (geo.get_point_attribute_typed::<f32>("time").unwrap().get(0) - 2.0).abs() < 1e-6
    );
    assert!(
        (geo.get_point_attribute_typed::<f32>("normalized_time")
            .unwrap()
            .get(0)
            - 47.0 / 240.0)
            .abs()
            < 1e-6
    );
}
