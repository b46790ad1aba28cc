//! The node graph: an arena of operator nodes plus their connections.
//!
//! Nodes are owned by the graph and addressed by integer id; connections
//! reference endpoints by id, never by pointer, so the bidirectional port
//! links stay consistent with single ownership (and a dropped node can
//! never dangle). The graph arbitrates connect/disconnect, rejects
//! connections that would introduce a cycle, and propagates cache
//! invalidation downstream along the connection table.

pub mod engine;
pub mod serializer;

use std::collections::{HashSet, VecDeque};

use crate::param::{ParameterType, ParameterValue};
use crate::sop::{NodeType, PortRef, SopNode};

pub use engine::ExecutionEngine;
pub use serializer::GraphSerializer;

/// A graph-side parameter value on a node, transferred into the SOP's
/// parameter map by the engine before each cook.
#[derive(Clone, Debug, PartialEq)]
pub struct NodeParameter {
    pub name: String,
    pub value: ParameterValue,
}

/// A node entry: the wrapped SOP plus editor-facing metadata.
pub struct GraphNode {
    id: i32,
    name: String,
    position: (f32, f32),
    pub display_flag: bool,
    pub render_flag: bool,
    bypass_flag: bool,
    parameters: Vec<NodeParameter>,
    sop: SopNode,
}

impl GraphNode {
    pub fn id(&self) -> i32 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn node_type(&self) -> NodeType {
        self.sop.node_type()
    }

    pub fn position(&self) -> (f32, f32) {
        self.position
    }

    pub fn set_position(&mut self, x: f32, y: f32) {
        self.position = (x, y);
    }

    pub fn bypass_flag(&self) -> bool {
        self.bypass_flag
    }

    /// Bypass maps onto the SOP's pass-through mode.
    pub fn set_bypass(&mut self, bypass: bool) {
        self.bypass_flag = bypass;
        self.sop.set_pass_through(bypass);
    }

    pub fn parameters(&self) -> &[NodeParameter] {
        &self.parameters
    }

    /// Set (or add) a graph-side parameter value.
    pub fn set_parameter(&mut self, name: &str, value: ParameterValue) {
        match self.parameters.iter_mut().find(|p| p.name == name) {
            Some(param) => param.value = value,
            None => self.parameters.push(NodeParameter {
                name: name.to_string(),
                value,
            }),
        }
    }

    pub fn get_parameter(&self, name: &str) -> Option<&ParameterValue> {
        self.parameters
            .iter()
            .find(|p| p.name == name)
            .map(|p| &p.value)
    }

    pub fn sop(&self) -> &SopNode {
        &self.sop
    }

    pub fn sop_mut(&mut self) -> &mut SopNode {
        &mut self.sop
    }
}

/// A directed connection between two node pins.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Connection {
    pub id: i32,
    pub source_node: i32,
    pub source_pin: usize,
    pub target_node: i32,
    pub target_pin: usize,
}

/// A graph-scope parameter (not attached to any node).
#[derive(Clone, Debug, PartialEq)]
pub struct GraphParameter {
    pub name: String,
    pub parameter_type: ParameterType,
    pub value: ParameterValue,
    pub description: String,
}

/// Arena-owned node set, connection table and graph metadata.
#[derive(Default)]
pub struct NodeGraph {
    nodes: Vec<GraphNode>,
    connections: Vec<Connection>,
    display_node: Option<i32>,
    graph_parameters: Vec<GraphParameter>,
    next_node_id: i32,
    next_connection_id: i32,
}

impl NodeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    // ---------------------------------------------------------------
    // Nodes
    // ---------------------------------------------------------------

    /// Create a node and return its id.
    pub fn add_node(&mut self, node_type: NodeType, name: &str) -> i32 {
        let id = self.next_node_id;
        self.next_node_id += 1;
        self.insert_node(id, node_type, name);
        id
    }

    /// Create a node with an explicit id (deserialization). Fails when the
    /// id is already taken.
    pub fn add_node_with_id(&mut self, id: i32, node_type: NodeType, name: &str) -> bool {
        if self.get_node(id).is_some() {
            return false;
        }
        self.insert_node(id, node_type, name);
        self.next_node_id = self.next_node_id.max(id + 1);
        true
    }

    fn insert_node(&mut self, id: i32, node_type: NodeType, name: &str) {
        self.nodes.push(GraphNode {
            id,
            name: name.to_string(),
            position: (0.0, 0.0),
            display_flag: false,
            render_flag: false,
            bypass_flag: false,
            parameters: Vec::new(),
            sop: SopNode::new(name, node_type),
        });
    }

    /// Remove a node and every incident connection.
    pub fn remove_node(&mut self, id: i32) -> bool {
        let Some(pos) = self.nodes.iter().position(|n| n.id == id) else {
            return false;
        };
        self.invalidate_downstream(id);
        let incident: Vec<i32> = self
            .connections
            .iter()
            .filter(|c| c.source_node == id || c.target_node == id)
            .map(|c| c.id)
            .collect();
        for connection in incident {
            self.remove_connection(connection);
        }
        self.nodes.remove(pos);
        if self.display_node == Some(id) {
            self.display_node = None;
        }
        true
    }

    pub fn get_node(&self, id: i32) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn get_node_mut(&mut self, id: i32) -> Option<&mut GraphNode> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    /// Nodes in insertion order.
    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    // ---------------------------------------------------------------
    // Connections
    // ---------------------------------------------------------------

    /// Connect `source_node`'s output pin to `target_node`'s input pin.
    ///
    /// Returns the connection id, or `None` when an endpoint is missing,
    /// the pin is out of range for the target's input configuration, or
    /// the edge would introduce a cycle. An existing link into the target
    /// pin is replaced.
    pub fn add_connection(
        &mut self,
        source_node: i32,
        source_pin: usize,
        target_node: i32,
        target_pin: usize,
    ) -> Option<i32> {
        let id = self.next_connection_id;
        self.add_connection_with_id(id, source_node, source_pin, target_node, target_pin)
    }

    /// Like [`NodeGraph::add_connection`] but with an explicit id
    /// (deserialization). The next-id counter advances past `id`.
    pub fn add_connection_with_id(
        &mut self,
        id: i32,
        source_node: i32,
        source_pin: usize,
        target_node: i32,
        target_pin: usize,
    ) -> Option<i32> {
        if source_node == target_node
            || self.get_node(source_node).is_none()
            || self.get_node(target_node).is_none()
            || self.connections.iter().any(|c| c.id == id)
        {
            return None;
        }
        // Output pin 0 is the only geometry output today.
        if source_pin != 0 {
            return None;
        }
        if self.reaches(target_node, source_node) {
            return None;
        }
        if !self
            .get_node_mut(target_node)
            .expect("checked above")
            .sop_mut()
            .ensure_input_pin(target_pin)
        {
            return None;
        }

        // Replace any previous link into this input pin.
        if let Some(existing) = self
            .connections
            .iter()
            .find(|c| c.target_node == target_node && c.target_pin == target_pin)
            .map(|c| c.id)
        {
            self.remove_connection(existing);
        }

        self.next_connection_id = self.next_connection_id.max(id + 1);
        self.connections.push(Connection {
            id,
            source_node,
            source_pin,
            target_node,
            target_pin,
        });

        // Wire the ports on both sides.
        let source_ref = PortRef {
            node: source_node,
            port: source_pin,
        };
        let target_ref = PortRef {
            node: target_node,
            port: target_pin,
        };
        if let Some(node) = self.get_node_mut(source_node) {
            if let Some(port) = node.sop_mut().output_ports_mut().get_mut(source_pin) {
                port.add_fanout(target_ref);
            }
        }
        if let Some(node) = self.get_node_mut(target_node) {
            let sop = node.sop_mut();
            if let Some(port) = sop.input_ports_mut().get_mut(target_pin) {
                port.set_link(Some(source_ref));
            }
            sop.mark_dirty();
        }
        self.invalidate_downstream(target_node);
        Some(id)
    }

    pub fn remove_connection(&mut self, id: i32) -> bool {
        let Some(pos) = self.connections.iter().position(|c| c.id == id) else {
            return false;
        };
        let connection = self.connections.remove(pos);
        let target_ref = PortRef {
            node: connection.target_node,
            port: connection.target_pin,
        };
        if let Some(node) = self.get_node_mut(connection.source_node) {
            if let Some(port) = node
                .sop_mut()
                .output_ports_mut()
                .get_mut(connection.source_pin)
            {
                port.remove_fanout(target_ref);
            }
        }
        if let Some(node) = self.get_node_mut(connection.target_node) {
            let sop = node.sop_mut();
            if let Some(port) = sop.input_ports_mut().get_mut(connection.target_pin) {
                port.set_link(None);
            }
            sop.mark_dirty();
        }
        self.invalidate_downstream(connection.target_node);
        true
    }

    /// Connections in insertion order.
    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    /// Connections whose target is `node`.
    pub fn input_connections(&self, node: i32) -> impl Iterator<Item = &Connection> {
        self.connections.iter().filter(move |c| c.target_node == node)
    }

    /// True when `to` is reachable from `from` along connections.
    fn reaches(&self, from: i32, to: i32) -> bool {
        if from == to {
            return true;
        }
        let mut queue = VecDeque::from([from]);
        let mut seen = HashSet::from([from]);
        while let Some(current) = queue.pop_front() {
            for c in self.connections.iter().filter(|c| c.source_node == current) {
                if c.target_node == to {
                    return true;
                }
                if seen.insert(c.target_node) {
                    queue.push_back(c.target_node);
                }
            }
        }
        false
    }

    // ---------------------------------------------------------------
    // Dirty propagation
    // ---------------------------------------------------------------

    /// Mark `node` and everything downstream of it dirty, dropping the
    /// affected port caches (the port-level mirror of engine cache
    /// invalidation).
    pub fn invalidate_downstream(&mut self, node: i32) {
        let mut queue = VecDeque::from([node]);
        let mut seen = HashSet::from([node]);
        while let Some(current) = queue.pop_front() {
            if let Some(entry) = self.get_node_mut(current) {
                entry.sop_mut().mark_dirty();
            }
            let downstream: Vec<i32> = self
                .connections
                .iter()
                .filter(|c| c.source_node == current)
                .map(|c| c.target_node)
                .collect();
            for next in downstream {
                if seen.insert(next) {
                    queue.push_back(next);
                }
            }
        }
    }

    // ---------------------------------------------------------------
    // Flags & graph parameters
    // ---------------------------------------------------------------

    pub fn set_display_node(&mut self, id: i32) {
        if self.get_node(id).is_some() {
            for node in &mut self.nodes {
                node.display_flag = node.id == id;
            }
            self.display_node = Some(id);
        }
    }

    pub fn get_display_node(&self) -> Option<i32> {
        self.display_node
    }

    pub fn graph_parameters(&self) -> &[GraphParameter] {
        &self.graph_parameters
    }

    pub fn graph_parameters_mut(&mut self) -> &mut Vec<GraphParameter> {
        &mut self.graph_parameters
    }

    pub fn next_node_id(&self) -> i32 {
        self.next_node_id
    }

    pub fn next_connection_id(&self) -> i32 {
        self.next_connection_id
    }

    // ---------------------------------------------------------------
    // Execution order
    // ---------------------------------------------------------------

    /// Deterministic topological order over all nodes, consistent with
    /// the connection DAG. Independent nodes keep insertion order.
    pub fn get_execution_order(&self) -> Vec<i32> {
        let mut degree: std::collections::HashMap<i32, usize> = self
            .nodes
            .iter()
            .map(|n| {
                let incoming = self
                    .connections
                    .iter()
                    .filter(|c| c.target_node == n.id)
                    .count();
                (n.id, incoming)
            })
            .collect();
        let mut remaining: Vec<i32> = self.nodes.iter().map(|n| n.id).collect();
        let mut order = Vec::with_capacity(remaining.len());

        // Kahn's algorithm, always taking the earliest-inserted ready node.
        while let Some(pos) = remaining.iter().position(|id| degree[id] == 0) {
            let id = remaining.remove(pos);
            order.push(id);
            for c in self.connections.iter().filter(|c| c.source_node == id) {
                if let Some(d) = degree.get_mut(&c.target_node) {
                    *d = d.saturating_sub(1);
                }
            }
        }
        // Anything left would be a cycle; connection validation prevents
        // that, so `order` covers every node.
        order
    }
}
