//! Graph execution: drives the cook of every node in dependency order.
//!
//! For each node in topological order the engine transfers the graph-side
//! parameter values into the SOP's parameter map (dirtying on change),
//! feeds cached upstream outputs into the node's input ports, cooks the
//! node (recursively cooking any upstream node that is still dirty), and
//! records the result in its geometry cache. Progress and cancellation go
//! through the pluggable [`HostInterface`]; the default host is silent
//! and never cancels.
//!
//! Scheduling is single-threaded and cooperative: cancellation takes
//! effect only at node boundaries, and an aborted cook leaves
//! already-cooked nodes with their new caches (no rollback).

use std::collections::HashMap;
use std::time::Instant;

use tracing::{debug, warn};

use crate::error::{CookError, CookResult};
use crate::geometry::GeometryHandle;
use crate::host::{HostInterface, LogLevel, NullHost};
use crate::sop::ExecutionState;

use super::NodeGraph;

/// Drives graph cooks and caches per-node results.
pub struct ExecutionEngine {
    geometry_cache: HashMap<i32, GeometryHandle>,
    host: Box<dyn HostInterface>,
    /// When true, the first node error aborts the cook. Default is to
    /// continue with the remaining nodes.
    pub stop_on_error: bool,
    node_errors: Vec<(i32, CookError)>,
    last_error: Option<String>,
}

impl Default for ExecutionEngine {
    fn default() -> Self {
        Self {
            geometry_cache: HashMap::new(),
            host: Box::new(NullHost),
            stop_on_error: false,
            node_errors: Vec::new(),
            last_error: None,
        }
    }
}

impl ExecutionEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a host interface (progress, cancel, log, path resolve).
    pub fn set_host(&mut self, host: Box<dyn HostInterface>) {
        self.host = host;
    }

    pub fn host(&self) -> &dyn HostInterface {
        self.host.as_ref()
    }

    /// Cook the whole graph. Returns true iff every node cooked cleanly
    /// and the host did not cancel.
    pub fn execute_graph(&mut self, graph: &mut NodeGraph) -> bool {
        let order = graph.get_execution_order();
        let total = order.len();
        self.last_error = None;
        self.node_errors.clear();

        for (index, id) in order.iter().copied().enumerate() {
            if self.host.is_cancelled() {
                self.last_error = Some("execution cancelled".to_string());
                return false;
            }

            self.transfer_parameters(graph, id);

            let node_name = graph
                .get_node(id)
                .map(|n| n.name().to_string())
                .unwrap_or_default();

            match self.cook_node(graph, id) {
                Ok(result) => {
                    self.geometry_cache.insert(id, result);
                }
                Err(error) => {
                    self.geometry_cache.remove(&id);
                    self.host.log(
                        LogLevel::Error,
                        &format!("node '{node_name}' failed: {error}"),
                    );
                    warn!(node = id, %error, "node cook failed");
                    self.node_errors.push((id, error));
                    if self.stop_on_error {
                        break;
                    }
                }
            }

            if !self
                .host
                .report_progress(index + 1, total, &node_name)
            {
                self.last_error = Some("execution cancelled".to_string());
                return false;
            }
        }

        if let Some((id, error)) = self.node_errors.first() {
            self.last_error = Some(format!("node {id}: {error}"));
        }
        self.node_errors.is_empty()
    }

    /// Cook one node, recursively cooking upstream nodes that are still
    /// dirty. A node observed already `Computing` is a cycle; a `Clean`
    /// node with a valid cache short-circuits.
    fn cook_node(&mut self, graph: &mut NodeGraph, id: i32) -> CookResult<GeometryHandle> {
        {
            let node = graph
                .get_node(id)
                .ok_or_else(|| CookError::input_missing(format!("missing node {id}")))?;
            match node.sop().state() {
                ExecutionState::Computing => {
                    let error = CookError::circular_dependency(format!(
                        "circular dependency detected in node '{}'",
                        node.name()
                    ));
                    let started = Instant::now();
                    graph
                        .get_node_mut(id)
                        .expect("node exists")
                        .sop_mut()
                        .fail_cook(error.clone(), started.elapsed());
                    return Err(error);
                }
                ExecutionState::Clean => {
                    if let Some(cached) = node.sop().cached_output() {
                        debug!(node = id, "cache hit");
                        return Ok(cached);
                    }
                }
                _ => {}
            }
        }

        let started = Instant::now();
        graph
            .get_node_mut(id)
            .expect("checked above")
            .sop_mut()
            .begin_cook();

        // Pre-cook inputs: pull each connected upstream node, then feed
        // its output into our input port. A failed upstream leaves the
        // port empty; this node then reports its own input-missing error.
        let links: Vec<(usize, i32)> = graph
            .input_connections(id)
            .map(|c| (c.target_pin, c.source_node))
            .collect();
        for (pin, source) in links {
            let upstream = self.cook_node(graph, source).unwrap_or_default();
            graph
                .get_node_mut(id)
                .expect("node exists")
                .sop_mut()
                .set_input_data(pin, upstream);
        }

        let node = graph.get_node_mut(id).expect("node exists");
        let result = node.sop_mut().run_operator(self.host.as_ref());
        let elapsed = started.elapsed();
        match result {
            Ok(output) => {
                node.sop_mut().finish_cook(output.clone(), elapsed);
                Ok(output)
            }
            Err(error) => {
                node.sop_mut().fail_cook(error.clone(), elapsed);
                Err(error)
            }
        }
    }

    /// Copy the node's graph-side parameter values into the SOP's map.
    /// `SopNode::set_parameter` dirties the node only when a value
    /// actually changed, which is what keeps clean caches valid across
    /// repeated cooks.
    fn transfer_parameters(&self, graph: &mut NodeGraph, id: i32) {
        let Some(node) = graph.get_node_mut(id) else {
            return;
        };
        let values: Vec<(String, crate::param::ParameterValue)> = node
            .parameters()
            .iter()
            .map(|p| (p.name.clone(), p.value.clone()))
            .collect();
        let was_clean = node.sop().is_clean();
        for (name, value) in values {
            node.sop_mut().set_parameter(&name, value);
        }
        if was_clean && !node.sop().is_clean() {
            graph.invalidate_downstream(id);
        }
    }

    // ---------------------------------------------------------------
    // Cache access
    // ---------------------------------------------------------------

    /// Cached output of a node from the last cook, if any.
    pub fn get_node_geometry(&self, id: i32) -> Option<GeometryHandle> {
        self.geometry_cache.get(&id).cloned()
    }

    /// Drop every cached result.
    pub fn clear_cache(&mut self) {
        self.geometry_cache.clear();
    }

    /// Drop the cache entry of `id` and everything downstream, mirroring
    /// the port-level invalidation.
    pub fn invalidate_node(&mut self, graph: &mut NodeGraph, id: i32) {
        graph.invalidate_downstream(id);
        let mut doomed = vec![id];
        let mut cursor = 0;
        while cursor < doomed.len() {
            let current = doomed[cursor];
            cursor += 1;
            for c in graph.connections() {
                if c.source_node == current && !doomed.contains(&c.target_node) {
                    doomed.push(c.target_node);
                }
            }
        }
        for node in doomed {
            self.geometry_cache.remove(&node);
        }
    }

    /// Per-node errors from the last cook, in execution order.
    pub fn node_errors(&self) -> &[(i32, CookError)] {
        &self.node_errors
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }
}
