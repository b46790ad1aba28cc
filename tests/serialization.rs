//! Graph JSON round trips.

use glam::Vec3;
use meshforge::graph::{ExecutionEngine, GraphSerializer, NodeGraph};
use meshforge::param::ParameterValue;
use meshforge::sop::NodeType;
use serde_json::Value;

fn sample_graph() -> NodeGraph {
    let mut graph = NodeGraph::new();
    let box_node = graph.add_node(NodeType::Box, "box1");
    let grid = graph.add_node(NodeType::Grid, "grid1");
    let merge = graph.add_node(NodeType::Merge, "merge1");
    let xform = graph.add_node(NodeType::Transform, "xform1");
    graph.add_connection(box_node, 0, merge, 0).unwrap();
    graph.add_connection(grid, 0, merge, 1).unwrap();
    graph.add_connection(merge, 0, xform, 0).unwrap();

    graph.get_node_mut(box_node).unwrap().set_position(10.0, 20.0);
    graph
        .get_node_mut(box_node)
        .unwrap()
        .set_parameter("width", ParameterValue::Float(4.0));
    graph
        .get_node_mut(xform)
        .unwrap()
        .set_parameter("translate", ParameterValue::Vec3(Vec3::new(1.0, 2.0, 3.0)));
    graph.set_display_node(xform);
    graph.graph_parameters_mut().push(meshforge::graph::GraphParameter {
        name: "quality".to_string(),
        parameter_type: meshforge::param::ParameterType::Int,
        value: ParameterValue::Int(3),
        description: "global quality knob".to_string(),
    });
    graph
}

#[test]
fn empty_graph_serializes_to_the_bare_schema() {
    let graph = NodeGraph::new();
    let json = GraphSerializer::serialize_to_json(&graph);
    let value: Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["version"], "1.0");
    assert_eq!(value["nodes"].as_array().unwrap().len(), 0);
    assert_eq!(value["connections"].as_array().unwrap().len(), 0);
    assert_eq!(value["graph_parameters"].as_array().unwrap().len(), 0);
}

#[test]
fn serialize_parse_serialize_is_identity() {
    let graph = sample_graph();
    let first = GraphSerializer::serialize_to_json(&graph);
    let parsed = GraphSerializer::deserialize_from_json(&first).unwrap();
    let second = GraphSerializer::serialize_to_json(&parsed);
    assert_eq!(first, second);
}

#[test]
fn node_ids_and_counters_survive_the_round_trip() {
    let graph = sample_graph();
    let json = GraphSerializer::serialize_to_json(&graph);
    let parsed = GraphSerializer::deserialize_from_json(&json).unwrap();

    let original_ids: Vec<i32> = graph.nodes().iter().map(|n| n.id()).collect();
    let parsed_ids: Vec<i32> = parsed.nodes().iter().map(|n| n.id()).collect();
    assert_eq!(original_ids, parsed_ids);
    assert_eq!(parsed.next_node_id(), original_ids.iter().max().unwrap() + 1);
    let original_connection_ids: Vec<i32> =
        graph.connections().iter().map(|c| c.id).collect();
    let parsed_connection_ids: Vec<i32> =
        parsed.connections().iter().map(|c| c.id).collect();
    assert_eq!(original_connection_ids, parsed_connection_ids);
    assert_eq!(parsed.get_display_node(), graph.get_display_node());
}

#[test]
fn loaded_graphs_cook_like_the_original() {
    let graph = sample_graph();
    let json = GraphSerializer::serialize_to_json(&graph);
    let mut parsed = GraphSerializer::deserialize_from_json(&json).unwrap();

    let mut engine = ExecutionEngine::new();
    assert!(engine.execute_graph(&mut parsed));
    let display = parsed.get_display_node().unwrap();
    let result = engine.get_node_geometry(display).unwrap();
    let geo = result.read().unwrap();
    // Box (8 points, width 4) merged with the default grid (121 points).
    assert_eq!(geo.point_count(), 129);
    let bounds = geo.bounding_box();
    assert!((bounds.center().x - 1.0).abs() < 1e-4);
}

#[test]
fn grid_nodes_serialize_as_plane() {
    let mut graph = NodeGraph::new();
    graph.add_node(NodeType::Grid, "grid1");
    let json = GraphSerializer::serialize_to_json(&graph);
    let value: Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["nodes"][0]["type"], "Plane");

    let parsed = GraphSerializer::deserialize_from_json(&json).unwrap();
    assert_eq!(parsed.nodes()[0].node_type(), NodeType::Grid);
}

#[test]
fn unknown_node_types_are_skipped() {
    let json = r#"{
        "version": "1.0",
        "nodes": [
            { "id": 1, "type": "Imaginary", "name": "x", "position": [0, 0], "parameters": [] },
            { "id": 2, "type": "Box", "name": "box1", "position": [0, 0], "parameters": [] }
        ],
        "connections": [],
        "graph_parameters": []
    }"#;
    let graph = GraphSerializer::deserialize_from_json(json).unwrap();
    assert_eq!(graph.node_count(), 1);
    assert_eq!(graph.nodes()[0].node_type(), NodeType::Box);
}

#[test]
fn connections_to_missing_nodes_are_skipped() {
    let json = r#"{
        "version": "1.0",
        "nodes": [
            { "id": 1, "type": "Box", "name": "box1", "position": [0, 0], "parameters": [] },
            { "id": 2, "type": "Transform", "name": "t", "position": [0, 0], "parameters": [] }
        ],
        "connections": [
            { "id": 0, "source_node": 1, "source_pin": 0, "target_node": 2, "target_pin": 0 },
            { "id": 1, "source_node": 99, "source_pin": 0, "target_node": 2, "target_pin": 0 }
        ],
        "graph_parameters": []
    }"#;
    let graph = GraphSerializer::deserialize_from_json(json).unwrap();
    assert_eq!(graph.connections().len(), 1);
    assert_eq!(graph.connections()[0].source_node, 1);
}

#[test]
fn parameter_values_round_trip_by_type() {
    let graph = sample_graph();
    let json = GraphSerializer::serialize_to_json(&graph);
    let parsed = GraphSerializer::deserialize_from_json(&json).unwrap();

    let box_node = parsed
        .nodes()
        .iter()
        .find(|n| n.name() == "box1")
        .unwrap();
    assert_eq!(
        box_node.get_parameter("width"),
        Some(&ParameterValue::Float(4.0))
    );
    let xform = parsed
        .nodes()
        .iter()
        .find(|n| n.name() == "xform1")
        .unwrap();
    assert_eq!(
        xform.get_parameter("translate"),
        Some(&ParameterValue::Vec3(Vec3::new(1.0, 2.0, 3.0)))
    );
    assert_eq!(parsed.graph_parameters().len(), 1);
    assert_eq!(parsed.graph_parameters()[0].value, ParameterValue::Int(3));
}

#[test]
fn malformed_json_is_an_error() {
    assert!(GraphSerializer::deserialize_from_json("not json").is_err());
}
