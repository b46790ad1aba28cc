//! Node ports: typed connection points carrying cached geometry.
//!
//! An input port links to at most one upstream output; an output port
//! fans out to any number of downstream inputs. Links are stored as
//! `(node id, port index)` pairs — never pointers — so the port graph
//! stays consistent with the arena-owned node set in
//! [`crate::graph::NodeGraph`], which arbitrates connect/disconnect and
//! propagates cache invalidation along the links.

use crate::geometry::GeometryHandle;

/// Port direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PortDirection {
    Input,
    Output,
}

/// What flows through the port. All geometry ports carry
/// [`GeometryHandle`]s; parameter ports exist for graph-level parameter
/// plumbing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PortDataKind {
    Geometry,
    Parameter,
}

/// Address of a port on some node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PortRef {
    pub node: i32,
    pub port: usize,
}

/// A single connection point with its cached value.
#[derive(Clone, Debug)]
pub struct NodePort {
    name: String,
    direction: PortDirection,
    kind: PortDataKind,
    /// For inputs: the upstream output feeding this port.
    link: Option<PortRef>,
    /// For outputs: downstream inputs fed by this port.
    fanout: Vec<PortRef>,
    cache: GeometryHandle,
    cache_valid: bool,
}

impl NodePort {
    pub fn new(name: impl Into<String>, direction: PortDirection, kind: PortDataKind) -> Self {
        Self {
            name: name.into(),
            direction,
            kind,
            link: None,
            fanout: Vec::new(),
            cache: GeometryHandle::empty(),
            cache_valid: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn direction(&self) -> PortDirection {
        self.direction
    }

    pub fn data_kind(&self) -> PortDataKind {
        self.kind
    }

    pub fn is_connected(&self) -> bool {
        match self.direction {
            PortDirection::Input => self.link.is_some(),
            PortDirection::Output => !self.fanout.is_empty(),
        }
    }

    /// Upstream output feeding this input, if any.
    pub fn link(&self) -> Option<PortRef> {
        self.link
    }

    pub(crate) fn set_link(&mut self, link: Option<PortRef>) {
        debug_assert_eq!(self.direction, PortDirection::Input);
        self.link = link;
        self.invalidate_cache();
    }

    /// Downstream inputs fed by this output.
    pub fn fanout(&self) -> &[PortRef] {
        &self.fanout
    }

    pub(crate) fn add_fanout(&mut self, target: PortRef) {
        debug_assert_eq!(self.direction, PortDirection::Output);
        if !self.fanout.contains(&target) {
            self.fanout.push(target);
        }
    }

    pub(crate) fn remove_fanout(&mut self, target: PortRef) {
        self.fanout.retain(|r| *r != target);
    }

    /// Cached geometry. For inputs this is the value the engine fed in;
    /// for outputs, the value the owner's cook produced.
    pub fn data(&self) -> GeometryHandle {
        if self.cache_valid {
            self.cache.clone()
        } else {
            GeometryHandle::empty()
        }
    }

    /// Store a value and mark the cache valid.
    pub fn set_data(&mut self, data: GeometryHandle) {
        self.cache = data;
        self.cache_valid = true;
    }

    /// Drop the cached value. Downstream propagation is the graph's job
    /// since ports hold ids, not pointers.
    pub fn invalidate_cache(&mut self) {
        self.cache.reset();
        self.cache_valid = false;
    }

    pub fn is_cache_valid(&self) -> bool {
        self.cache_valid
    }
}

/// Ordered collection of ports with name lookup.
#[derive(Clone, Debug, Default)]
pub struct PortCollection {
    ports: Vec<NodePort>,
}

impl PortCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, port: NodePort) -> usize {
        self.ports.push(port);
        self.ports.len() - 1
    }

    pub fn len(&self) -> usize {
        self.ports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ports.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&NodePort> {
        self.ports.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut NodePort> {
        self.ports.get_mut(index)
    }

    pub fn by_name(&self, name: &str) -> Option<&NodePort> {
        self.ports.iter().find(|p| p.name == name)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, NodePort> {
        self.ports.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, NodePort> {
        self.ports.iter_mut()
    }

    pub fn invalidate_all(&mut self) {
        for port in &mut self.ports {
            port.invalidate_cache();
        }
    }
}
