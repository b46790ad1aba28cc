//! Graph ↔ JSON persistence.
//!
//! The format (version "1.0"): a `nodes` array (id, type name, editor
//! position, flags and a full parameter dump), a `connections` array and
//! a `graph_parameters` array. Node ids are preserved verbatim on load
//! and the next-id counters recover as max+1, so saving immediately after
//! loading reproduces the same file modulo canonical key ordering.
//! Connections referencing missing nodes — and nodes of unknown type —
//! are skipped with a warning rather than failing the load.

use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use glam::Vec3;
use serde_json::{json, Map, Value};
use tracing::warn;

use crate::param::{ParameterType, ParameterValue};
use crate::sop::NodeType;

use super::{GraphParameter, NodeGraph};

/// Stateless serialization entry points.
pub struct GraphSerializer;

impl GraphSerializer {
    /// Serialize a graph to pretty-printed JSON.
    pub fn serialize_to_json(graph: &NodeGraph) -> String {
        let mut root = Map::new();
        root.insert("version".into(), json!("1.0"));

        let nodes: Vec<Value> = graph.nodes().iter().map(|node| {
            let mut node_json = Map::new();
            node_json.insert("id".into(), json!(node.id()));
            node_json.insert("type".into(), json!(node.node_type().as_str()));
            node_json.insert("name".into(), json!(node.name()));
            let (x, y) = node.position();
            node_json.insert("position".into(), json!([x, y]));
            node_json.insert("display_flag".into(), json!(node.display_flag));
            node_json.insert("bypass_flag".into(), json!(node.bypass_flag()));
            node_json.insert("render_flag".into(), json!(node.render_flag));

            // Schema parameters first, carrying their UI metadata; then
            // any graph-side extras (dynamically declared channels).
            let mut parameters = Vec::new();
            for def in node.sop().parameter_definitions() {
                let value = node
                    .get_parameter(&def.name)
                    .cloned()
                    .unwrap_or_else(|| def.default_value.clone());
                let mut p = Map::new();
                p.insert("name".into(), json!(def.name));
                p.insert("label".into(), json!(def.label));
                p.insert("category".into(), json!(def.category));
                p.insert("ui_hint".into(), json!(def.ui_hint));
                p.insert("type".into(), json!(def.parameter_type.as_str()));
                p.insert("value".into(), parameter_value_to_json(&value));
                match def.parameter_type {
                    ParameterType::Float => {
                        p.insert("float_min".into(), json!(def.float_min));
                        p.insert("float_max".into(), json!(def.float_max));
                    }
                    ParameterType::Int => {
                        p.insert("int_min".into(), json!(def.int_min));
                        p.insert("int_max".into(), json!(def.int_max));
                        if !def.options.is_empty() {
                            p.insert("string_options".into(), json!(def.options));
                        }
                    }
                    _ => {}
                }
                parameters.push(Value::Object(p));
            }
            for extra in node.parameters() {
                if node
                    .sop()
                    .parameter_definitions()
                    .iter()
                    .any(|d| d.name == extra.name)
                {
                    continue;
                }
                let mut p = Map::new();
                p.insert("name".into(), json!(extra.name));
                p.insert("label".into(), json!(extra.name));
                p.insert("category".into(), json!(""));
                p.insert("ui_hint".into(), json!(""));
                p.insert(
                    "type".into(),
                    json!(extra.value.parameter_type().as_str()),
                );
                p.insert("value".into(), parameter_value_to_json(&extra.value));
                parameters.push(Value::Object(p));
            }
            node_json.insert("parameters".into(), Value::Array(parameters));
            Value::Object(node_json)
        }).collect();
        root.insert("nodes".into(), Value::Array(nodes));

        let connections: Vec<Value> = graph
            .connections()
            .iter()
            .map(|c| {
                json!({
                    "id": c.id,
                    "source_node": c.source_node,
                    "source_pin": c.source_pin,
                    "target_node": c.target_node,
                    "target_pin": c.target_pin,
                })
            })
            .collect();
        root.insert("connections".into(), Value::Array(connections));

        let graph_parameters: Vec<Value> = graph
            .graph_parameters()
            .iter()
            .map(|p| {
                json!({
                    "name": p.name,
                    "type": p.parameter_type.as_str(),
                    "value": parameter_value_to_json(&p.value),
                    "description": p.description,
                })
            })
            .collect();
        root.insert("graph_parameters".into(), Value::Array(graph_parameters));

        serde_json::to_string_pretty(&Value::Object(root)).unwrap_or_else(|_| "{}".to_string())
    }

    /// Parse a graph from JSON.
    pub fn deserialize_from_json(json_data: &str) -> Result<NodeGraph> {
        let root: Value =
            serde_json::from_str(json_data).context("failed to parse graph JSON")?;

        if let Some(version) = root.get("version").and_then(Value::as_str) {
            if version != "1.0" {
                warn!(version, "graph file version may not be fully supported");
            }
        }

        let mut graph = NodeGraph::new();

        if let Some(nodes) = root.get("nodes").and_then(Value::as_array) {
            for node_json in nodes {
                let Some(type_str) = node_json.get("type").and_then(Value::as_str) else {
                    warn!("skipping node without a type");
                    continue;
                };
                let Some(name) = node_json.get("name").and_then(Value::as_str) else {
                    warn!("skipping node without a name");
                    continue;
                };
                let Some(node_type) = NodeType::parse(type_str) else {
                    warn!(node_type = type_str, "skipping node of unknown type");
                    continue;
                };
                let Some(id) = node_json.get("id").and_then(Value::as_i64) else {
                    warn!(name, "skipping node without an id");
                    continue;
                };
                if !graph.add_node_with_id(id as i32, node_type, name) {
                    warn!(id, "skipping node with duplicate id");
                    continue;
                }

                let node = graph.get_node_mut(id as i32).expect("just added");
                if let Some(position) = node_json.get("position").and_then(Value::as_array) {
                    if position.len() >= 2 {
                        node.set_position(
                            position[0].as_f64().unwrap_or(0.0) as f32,
                            position[1].as_f64().unwrap_or(0.0) as f32,
                        );
                    }
                }
                node.display_flag = node_json
                    .get("display_flag")
                    .and_then(Value::as_bool)
                    .unwrap_or(false);
                node.render_flag = node_json
                    .get("render_flag")
                    .and_then(Value::as_bool)
                    .unwrap_or(false);
                let bypass = node_json
                    .get("bypass_flag")
                    .and_then(Value::as_bool)
                    .unwrap_or(false);
                node.set_bypass(bypass);

                if let Some(parameters) = node_json.get("parameters").and_then(Value::as_array) {
                    for p in parameters {
                        let (Some(param_name), Some(param_type)) = (
                            p.get("name").and_then(Value::as_str),
                            p.get("type").and_then(Value::as_str),
                        ) else {
                            continue;
                        };
                        let Some(value) = p.get("value") else {
                            continue;
                        };
                        let Some(param_type) = ParameterType::parse(param_type) else {
                            warn!(name = param_name, "skipping parameter of unknown type");
                            continue;
                        };
                        if let Some(value) = parameter_value_from_json(param_type, value) {
                            node.set_parameter(param_name, value);
                        }
                    }
                }

                if node.display_flag {
                    let id = node.id();
                    graph.set_display_node(id);
                }
            }
        }

        if let Some(connections) = root.get("connections").and_then(Value::as_array) {
            for c in connections {
                let (Some(source_node), Some(source_pin), Some(target_node), Some(target_pin)) = (
                    c.get("source_node").and_then(Value::as_i64),
                    c.get("source_pin").and_then(Value::as_i64),
                    c.get("target_node").and_then(Value::as_i64),
                    c.get("target_pin").and_then(Value::as_i64),
                ) else {
                    warn!("skipping malformed connection");
                    continue;
                };
                // Ids are preserved verbatim; files without one fall back
                // to the running counter.
                let id = c
                    .get("id")
                    .and_then(Value::as_i64)
                    .map(|id| id as i32)
                    .unwrap_or_else(|| graph.next_connection_id());
                if graph
                    .add_connection_with_id(
                        id,
                        source_node as i32,
                        source_pin as usize,
                        target_node as i32,
                        target_pin as usize,
                    )
                    .is_none()
                {
                    warn!(
                        source_node,
                        target_node, "skipping connection with missing endpoint"
                    );
                }
            }
        }

        if let Some(params) = root.get("graph_parameters").and_then(Value::as_array) {
            for p in params {
                let (Some(name), Some(type_str)) = (
                    p.get("name").and_then(Value::as_str),
                    p.get("type").and_then(Value::as_str),
                ) else {
                    continue;
                };
                let Some(param_type) = ParameterType::parse(type_str) else {
                    continue;
                };
                let Some(value) = p
                    .get("value")
                    .and_then(|v| parameter_value_from_json(param_type, v))
                else {
                    continue;
                };
                graph.graph_parameters_mut().push(GraphParameter {
                    name: name.to_string(),
                    parameter_type: param_type,
                    value,
                    description: p
                        .get("description")
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_string(),
                });
            }
        }

        Ok(graph)
    }

    /// Serialize a graph into a file on disk.
    pub fn save_to_file(graph: &NodeGraph, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = Self::serialize_to_json(graph);
        fs::write(path, json)
            .with_context(|| format!("failed to write graph file '{}'", path.display()))
    }

    /// Load a graph from a file on disk.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<NodeGraph> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed to read graph file '{}'", path.display()))?;
        Self::deserialize_from_json(&data)
            .map_err(|e| anyhow!("failed to load '{}': {e}", path.display()))
    }
}

fn parameter_value_to_json(value: &ParameterValue) -> Value {
    match value {
        ParameterValue::Int(v) => json!(v),
        ParameterValue::Float(v) => json!(v),
        ParameterValue::Bool(v) => json!(v),
        ParameterValue::String(v) | ParameterValue::Code(v) => json!(v),
        ParameterValue::Vec3(v) => json!([v.x, v.y, v.z]),
    }
}

fn parameter_value_from_json(param_type: ParameterType, value: &Value) -> Option<ParameterValue> {
    Some(match param_type {
        ParameterType::Float => ParameterValue::Float(value.as_f64()? as f32),
        ParameterType::Int => ParameterValue::Int(value.as_i64()? as i32),
        ParameterType::Bool => ParameterValue::Bool(value.as_bool()?),
        ParameterType::String | ParameterType::GroupSelector => {
            ParameterValue::String(value.as_str()?.to_string())
        }
        ParameterType::Code => ParameterValue::Code(value.as_str()?.to_string()),
        ParameterType::Vector3 => {
            let array = value.as_array()?;
            if array.len() < 3 {
                return None;
            }
            ParameterValue::Vec3(Vec3::new(
                array[0].as_f64()? as f32,
                array[1].as_f64()? as f32,
                array[2].as_f64()? as f32,
            ))
        }
    })
}
