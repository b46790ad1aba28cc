//! Node graph structure, cooking, caching and error propagation.

use glam::Vec3;
use meshforge::error::ErrorKind;
use meshforge::graph::{ExecutionEngine, NodeGraph};
use meshforge::param::ParameterValue;
use meshforge::sop::{ExecutionState, NodeType};
use meshforge::testing::assert_vec3_near;

#[test]
fn empty_graph_cooks_successfully() {
    let mut graph = NodeGraph::new();
    let mut engine = ExecutionEngine::new();
    assert!(engine.execute_graph(&mut graph));
    assert!(engine.node_errors().is_empty());
}

#[test]
fn node_ids_are_stable_and_unique() {
    let mut graph = NodeGraph::new();
    let a = graph.add_node(NodeType::Box, "a");
    let b = graph.add_node(NodeType::Sphere, "b");
    assert_ne!(a, b);
    assert!(graph.add_node_with_id(b, NodeType::Null, "dup") == false);
    assert!(graph.add_node_with_id(100, NodeType::Null, "far"));
    assert!(graph.next_node_id() > 100);
}

#[test]
fn connections_reject_cycles_and_bad_endpoints() {
    let mut graph = NodeGraph::new();
    let a = graph.add_node(NodeType::Box, "a");
    let b = graph.add_node(NodeType::Transform, "b");
    let c = graph.add_node(NodeType::Transform, "c");

    assert!(graph.add_connection(a, 0, b, 0).is_some());
    assert!(graph.add_connection(b, 0, c, 0).is_some());
    // c -> b would close a cycle.
    assert!(graph.add_connection(c, 0, b, 0).is_none());
    // Self-loops and missing nodes are rejected.
    assert!(graph.add_connection(b, 0, b, 0).is_none());
    assert!(graph.add_connection(999, 0, b, 0).is_none());
}

#[test]
fn new_connection_replaces_previous_input_link() {
    let mut graph = NodeGraph::new();
    let a = graph.add_node(NodeType::Box, "a");
    let b = graph.add_node(NodeType::Sphere, "b");
    let t = graph.add_node(NodeType::Transform, "t");

    graph.add_connection(a, 0, t, 0).unwrap();
    graph.add_connection(b, 0, t, 0).unwrap();
    // Only the replacement edge remains.
    let incoming: Vec<_> = graph.input_connections(t).collect();
    assert_eq!(incoming.len(), 1);
    assert_eq!(incoming[0].source_node, b);
}

#[test]
fn remove_node_drops_incident_connections() {
    let mut graph = NodeGraph::new();
    let a = graph.add_node(NodeType::Box, "a");
    let b = graph.add_node(NodeType::Transform, "b");
    graph.add_connection(a, 0, b, 0).unwrap();

    assert!(graph.remove_node(a));
    assert!(graph.connections().is_empty());
    assert!(graph.get_node(a).is_none());
}

#[test]
fn execution_order_respects_dependencies() {
    let mut graph = NodeGraph::new();
    let merge = graph.add_node(NodeType::Merge, "merge");
    let a = graph.add_node(NodeType::Box, "a");
    let b = graph.add_node(NodeType::Sphere, "b");
    graph.add_connection(a, 0, merge, 0).unwrap();
    graph.add_connection(b, 0, merge, 1).unwrap();

    let order = graph.get_execution_order();
    let pos = |id| order.iter().position(|&n| n == id).unwrap();
    assert_eq!(order.len(), 3);
    assert!(pos(a) < pos(merge));
    assert!(pos(b) < pos(merge));
}

#[test]
fn cook_produces_geometry_per_node() {
    let mut graph = NodeGraph::new();
    let box_node = graph.add_node(NodeType::Box, "box1");
    let xform = graph.add_node(NodeType::Transform, "xform1");
    graph.add_connection(box_node, 0, xform, 0).unwrap();
    graph
        .get_node_mut(xform)
        .unwrap()
        .set_parameter("translate", ParameterValue::Vec3(Vec3::new(5.0, 0.0, 0.0)));

    let mut engine = ExecutionEngine::new();
    assert!(engine.execute_graph(&mut graph));

    let raw = engine.get_node_geometry(box_node).unwrap();
    assert_eq!(raw.read().unwrap().point_count(), 8);
    let moved = engine.get_node_geometry(xform).unwrap();
    let bounds = moved.read().unwrap().bounding_box();
    assert_vec3_near(bounds.center(), Vec3::new(5.0, 0.0, 0.0), 1e-5);
    // Upstream output is untouched by the downstream copy-on-write.
    let raw_bounds = raw.read().unwrap().bounding_box();
    assert_vec3_near(raw_bounds.center(), Vec3::ZERO, 1e-5);
}

#[test]
fn translated_sphere_stays_unit_radius() {
    let mut graph = NodeGraph::new();
    let sphere = graph.add_node(NodeType::Sphere, "sphere1");
    let xform = graph.add_node(NodeType::Transform, "xform1");
    graph.add_connection(sphere, 0, xform, 0).unwrap();
    {
        let node = graph.get_node_mut(sphere).unwrap();
        node.set_parameter("radius", ParameterValue::Float(1.0));
        node.set_parameter("segments", ParameterValue::Int(4));
        node.set_parameter("rings", ParameterValue::Int(2));
    }
    graph
        .get_node_mut(xform)
        .unwrap()
        .set_parameter("translate", ParameterValue::Vec3(Vec3::new(10.0, 0.0, 0.0)));

    let mut engine = ExecutionEngine::new();
    assert!(engine.execute_graph(&mut graph));

    let result = engine.get_node_geometry(xform).unwrap();
    let geo = result.read().unwrap();
    let center = Vec3::new(10.0, 0.0, 0.0);
    for p in geo.positions().unwrap().iter() {
        assert!(((*p - center).length() - 1.0).abs() < 1e-4);
    }
}

#[test]
fn clean_nodes_short_circuit_and_recook_on_parameter_change() {
    let mut graph = NodeGraph::new();
    let box_node = graph.add_node(NodeType::Box, "box1");
    let mut engine = ExecutionEngine::new();

    assert!(engine.execute_graph(&mut graph));
    assert_eq!(
        graph.get_node(box_node).unwrap().sop().state(),
        ExecutionState::Clean
    );
    let first = engine.get_node_geometry(box_node).unwrap();

    // Unchanged parameters: the cached container is reused, not rebuilt.
    assert!(engine.execute_graph(&mut graph));
    let second = engine.get_node_geometry(box_node).unwrap();
    assert!(std::sync::Arc::ptr_eq(
        &first.shared().unwrap(),
        &second.shared().unwrap()
    ));

    // A real change dirties and recooks.
    graph
        .get_node_mut(box_node)
        .unwrap()
        .set_parameter("width", ParameterValue::Float(6.0));
    assert!(engine.execute_graph(&mut graph));
    let third = engine.get_node_geometry(box_node).unwrap();
    let extent = third.read().unwrap().bounding_box().extent();
    assert_vec3_near(extent, Vec3::new(6.0, 2.0, 2.0), 1e-5);
}

#[test]
fn cook_is_deterministic_for_equal_inputs() {
    let mut graph = NodeGraph::new();
    let scatter_src = graph.add_node(NodeType::Box, "box1");
    let scatter = graph.add_node(NodeType::Scatter, "scatter1");
    graph.add_connection(scatter_src, 0, scatter, 0).unwrap();
    graph
        .get_node_mut(scatter)
        .unwrap()
        .set_parameter("seed", ParameterValue::Int(7));

    let mut engine = ExecutionEngine::new();
    assert!(engine.execute_graph(&mut graph));
    let first: Vec<Vec3> = engine
        .get_node_geometry(scatter)
        .unwrap()
        .read()
        .unwrap()
        .positions()
        .unwrap()
        .iter()
        .copied()
        .collect();

    // Force a recook of the whole chain with identical inputs.
    engine.clear_cache();
    engine.invalidate_node(&mut graph, scatter_src);
    assert!(engine.execute_graph(&mut graph));
    let second: Vec<Vec3> = engine
        .get_node_geometry(scatter)
        .unwrap()
        .read()
        .unwrap()
        .positions()
        .unwrap()
        .iter()
        .copied()
        .collect();
    assert_eq!(first, second);
}

#[test]
fn missing_input_fails_the_node_but_not_the_graph_walk() {
    let mut graph = NodeGraph::new();
    let lonely = graph.add_node(NodeType::Transform, "lonely");
    let box_node = graph.add_node(NodeType::Box, "box1");

    let mut engine = ExecutionEngine::new();
    assert!(!engine.execute_graph(&mut graph));

    // The healthy node still cooked.
    assert!(engine.get_node_geometry(box_node).is_some());
    assert!(engine.get_node_geometry(lonely).is_none());
    let errors = engine.node_errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].0, lonely);
    assert_eq!(errors[0].1.kind(), ErrorKind::InputMissing);
    assert!(graph.get_node(lonely).unwrap().sop().last_error().is_some());
}

#[test]
fn downstream_of_a_failed_node_reports_missing_input() {
    let mut graph = NodeGraph::new();
    // Boolean's kernel is unavailable, so it always errors.
    let a = graph.add_node(NodeType::Box, "a");
    let b = graph.add_node(NodeType::Box, "b");
    let boolean = graph.add_node(NodeType::Boolean, "bool1");
    let downstream = graph.add_node(NodeType::Transform, "after");
    graph.add_connection(a, 0, boolean, 0).unwrap();
    graph.add_connection(b, 0, boolean, 1).unwrap();
    graph.add_connection(boolean, 0, downstream, 0).unwrap();

    let mut engine = ExecutionEngine::new();
    assert!(!engine.execute_graph(&mut graph));

    let kinds: Vec<ErrorKind> = engine.node_errors().iter().map(|(_, e)| e.kind()).collect();
    assert!(kinds.contains(&ErrorKind::AlgorithmFailure));
    assert!(kinds.contains(&ErrorKind::InputMissing));
}

#[test]
fn switch_selects_and_validates_index() {
    let mut graph = NodeGraph::new();
    let a = graph.add_node(NodeType::Box, "a");
    let b = graph.add_node(NodeType::Sphere, "b");
    let switch = graph.add_node(NodeType::Switch, "switch1");
    graph.add_connection(a, 0, switch, 0).unwrap();
    graph.add_connection(b, 0, switch, 1).unwrap();

    let mut engine = ExecutionEngine::new();
    graph
        .get_node_mut(switch)
        .unwrap()
        .set_parameter("index", ParameterValue::Int(0));
    assert!(engine.execute_graph(&mut graph));
    assert_eq!(
        engine
            .get_node_geometry(switch)
            .unwrap()
            .read()
            .unwrap()
            .point_count(),
        8
    );

    graph
        .get_node_mut(switch)
        .unwrap()
        .set_parameter("index", ParameterValue::Int(5));
    assert!(!engine.execute_graph(&mut graph));
    assert_eq!(
        engine.node_errors()[0].1.kind(),
        ErrorKind::ParameterInvalid
    );
}

#[test]
fn bypass_passes_the_input_through() {
    let mut graph = NodeGraph::new();
    let box_node = graph.add_node(NodeType::Box, "box1");
    let xform = graph.add_node(NodeType::Transform, "xform1");
    graph.add_connection(box_node, 0, xform, 0).unwrap();
    graph
        .get_node_mut(xform)
        .unwrap()
        .set_parameter("translate", ParameterValue::Vec3(Vec3::splat(4.0)));
    graph.get_node_mut(xform).unwrap().set_bypass(true);

    let mut engine = ExecutionEngine::new();
    assert!(engine.execute_graph(&mut graph));
    let bounds = engine
        .get_node_geometry(xform)
        .unwrap()
        .read()
        .unwrap()
        .bounding_box();
    assert_vec3_near(bounds.center(), Vec3::ZERO, 1e-6);
}

#[test]
fn cache_lock_freezes_upstream_until_cleared() {
    let mut graph = NodeGraph::new();
    let box_node = graph.add_node(NodeType::Box, "box1");
    let cache = graph.add_node(NodeType::Cache, "cache1");
    graph.add_connection(box_node, 0, cache, 0).unwrap();
    {
        let node = graph.get_node_mut(cache).unwrap();
        node.set_parameter("enable_cache", ParameterValue::Int(1));
        node.set_parameter("lock_cache", ParameterValue::Int(1));
    }

    let mut engine = ExecutionEngine::new();
    assert!(engine.execute_graph(&mut graph));
    let frozen_extent = engine
        .get_node_geometry(cache)
        .unwrap()
        .read()
        .unwrap()
        .bounding_box()
        .extent();

    // Upstream changes; the locked cache keeps serving the old copy.
    graph
        .get_node_mut(box_node)
        .unwrap()
        .set_parameter("width", ParameterValue::Float(9.0));
    assert!(engine.execute_graph(&mut graph));
    let still_frozen = engine
        .get_node_geometry(cache)
        .unwrap()
        .read()
        .unwrap()
        .bounding_box()
        .extent();
    assert_vec3_near(still_frozen, frozen_extent, 1e-6);

    // Clearing the cache picks up the new upstream geometry.
    graph
        .get_node_mut(cache)
        .unwrap()
        .set_parameter("clear_cache", ParameterValue::Int(1));
    assert!(engine.execute_graph(&mut graph));
    let refreshed = engine
        .get_node_geometry(cache)
        .unwrap()
        .read()
        .unwrap()
        .bounding_box()
        .extent();
    assert_vec3_near(refreshed, Vec3::new(9.0, 2.0, 2.0), 1e-5);
}

#[test]
fn invalidate_node_drops_downstream_cache_entries() {
    let mut graph = NodeGraph::new();
    let box_node = graph.add_node(NodeType::Box, "box1");
    let xform = graph.add_node(NodeType::Transform, "xform1");
    graph.add_connection(box_node, 0, xform, 0).unwrap();

    let mut engine = ExecutionEngine::new();
    assert!(engine.execute_graph(&mut graph));
    assert!(engine.get_node_geometry(xform).is_some());

    engine.invalidate_node(&mut graph, box_node);
    assert!(engine.get_node_geometry(box_node).is_none());
    assert!(engine.get_node_geometry(xform).is_none());
    assert_eq!(
        graph.get_node(xform).unwrap().sop().state(),
        ExecutionState::Dirty
    );
}

#[test]
fn display_node_flag_is_exclusive() {
    let mut graph = NodeGraph::new();
    let a = graph.add_node(NodeType::Box, "a");
    let b = graph.add_node(NodeType::Sphere, "b");
    graph.set_display_node(a);
    graph.set_display_node(b);
    assert_eq!(graph.get_display_node(), Some(b));
    assert!(!graph.get_node(a).unwrap().display_flag);
    assert!(graph.get_node(b).unwrap().display_flag);
}
