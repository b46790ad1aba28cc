//! OBJ import/export round trips.

use glam::Vec3;
use meshforge::host::NullHost;
use meshforge::io::obj;
use meshforge::param::ParameterValue;
use meshforge::sop::{NodeType, SopNode};
use meshforge::testing::assert_vec3_near;

fn boxed_geometry() -> meshforge::geometry::GeometryContainer {
    let mut node = SopNode::new("box", NodeType::Box);
    node.set_parameter("width", ParameterValue::Float(2.0));
    node.set_parameter("height", ParameterValue::Float(3.0));
    node.set_parameter("depth", ParameterValue::Float(4.0));
    node.run_operator(&NullHost)
        .unwrap()
        .read()
        .unwrap()
        .clone()
}

#[test]
fn exported_box_has_expected_lines() {
    let text = obj::geometry_to_obj_string(&boxed_geometry()).unwrap();
    let v_lines = text.lines().filter(|l| l.starts_with("v ")).count();
    let f_lines: Vec<&str> = text.lines().filter(|l| l.starts_with("f ")).collect();
    assert_eq!(v_lines, 8);
    assert_eq!(f_lines.len(), 6);
    // Quads: four indices per face.
    for line in f_lines {
        assert_eq!(line.split_whitespace().count(), 5);
    }
}

#[test]
fn import_recovers_positions_and_faces() {
    let text = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n";
    let geo = obj::parse_obj(text).unwrap();
    assert_eq!(geo.point_count(), 3);
    assert_eq!(geo.primitive_count(), 1);
    assert_vec3_near(*geo.positions().unwrap().get(1), Vec3::new(1.0, 0.0, 0.0), 1e-6);
}

#[test]
fn import_reads_split_normals() {
    let text = "v 0 0 0\nv 1 0 0\nv 0 1 0\nvn 0 0 1\nf 1//1 2//1 3//1\n";
    let geo = obj::parse_obj(text).unwrap();
    let normals = geo.vertex_normals().expect("vn lines produce vertex N");
    assert_eq!(normals.len(), 3);
    assert_vec3_near(*normals.get(0), Vec3::Z, 1e-6);
}

#[test]
fn import_accepts_all_face_index_forms() {
    let text = "v 0 0 0\nv 1 0 0\nv 0 1 0\nvn 0 0 1\nvt 0 0\nf 1/1/1 2/1 3//1\n";
    let geo = obj::parse_obj(text).unwrap();
    assert_eq!(geo.primitive_count(), 1);
}

#[test]
fn import_supports_negative_indices() {
    let text = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf -3 -2 -1\n";
    let geo = obj::parse_obj(text).unwrap();
    assert_eq!(geo.primitive_count(), 1);
    let points: Vec<u32> = geo.topology().primitive_points(0).collect();
    assert_eq!(points, vec![0, 1, 2]);
}

#[test]
fn import_rejects_out_of_range_faces() {
    assert!(obj::parse_obj("v 0 0 0\nf 1 2 3\n").is_err());
    assert!(obj::parse_obj("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 0 1 2\n").is_err());
}

#[test]
fn export_import_preserves_counts_and_positions() {
    let original = boxed_geometry();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("box.obj");
    obj::export_obj(&original, &path).unwrap();

    let reloaded = obj::import_obj(&path).unwrap();
    assert_eq!(reloaded.point_count(), original.point_count());
    assert_eq!(reloaded.primitive_count(), original.primitive_count());
    let original_positions = original.positions().unwrap();
    let reloaded_positions = reloaded.positions().unwrap();
    for point in 0..original.point_count() {
        assert_vec3_near(
            *reloaded_positions.get(point),
            *original_positions.get(point),
            1e-5,
        );
    }
}

#[test]
fn file_and_export_nodes_round_trip_through_disk() {
    use meshforge::geometry::GeometryHandle;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mesh.obj");
    let path_text = path.to_string_lossy().to_string();

    let mut export = SopNode::new("export", NodeType::Export);
    export.set_parameter("file_path", ParameterValue::String(path_text.clone()));
    export.set_input_data(0, GeometryHandle::from_container(boxed_geometry()));
    let passed = export.run_operator(&NullHost).unwrap();
    // Export passes its input through unchanged.
    assert_eq!(passed.read().unwrap().point_count(), 8);

    let mut file = SopNode::new("file", NodeType::File);
    file.set_parameter("file_path", ParameterValue::String(path_text));
    let loaded = file.run_operator(&NullHost).unwrap();
    assert_eq!(loaded.read().unwrap().point_count(), 8);
    assert_eq!(loaded.read().unwrap().primitive_count(), 6);
}

#[test]
fn file_node_reports_missing_files() {
    let mut file = SopNode::new("file", NodeType::File);
    file.set_parameter(
        "file_path",
        ParameterValue::String("/nonexistent/mesh.obj".to_string()),
    );
    let result = file.run_operator(&NullHost);
    assert_eq!(
        result.unwrap_err().kind(),
        meshforge::error::ErrorKind::ResourceFailure
    );
}
