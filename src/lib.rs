//! # Meshforge
//!
//! A **node-based procedural geometry engine** for Rust. Meshforge models
//! geometry as a directed acyclic graph of surface operators (SOPs):
//! generators make meshes, modifiers deform and restructure them,
//! combiners merge them, and an execution engine cooks the graph in
//! dependency order with per-node caching and copy-on-write sharing of
//! the geometry flowing between nodes.
//!
//! ## Key pieces
//!
//! - **Geometry container** — point/vertex/primitive topology plus
//!   typed, named attribute channels per element class
//!   ([`GeometryContainer`], [`attribute`]).
//! - **Copy-on-write handles** — [`GeometryHandle`] shares containers
//!   across the graph; the first write through a shared handle clones.
//! - **SOP node model** — parameterized operators with typed ports and a
//!   dirty/clean/computing/error cook state machine ([`sop`]).
//! - **Graph & engine** — arena-owned nodes, cycle-free connections,
//!   topological cooking with progress/cancel via a host interface
//!   ([`graph`], [`host`]).
//! - **Groups** — named element subsets stored as `group_*` integer
//!   attributes that every operator honors as a uniform filter
//!   ([`geometry::group`]).
//! - **Wrangle** — a small per-element attribute-expression dialect
//!   ([`wrangle`]).
//!
//! ## Quick start
//!
//! ```
//! use meshforge::graph::{ExecutionEngine, NodeGraph};
//! use meshforge::param::ParameterValue;
//! use meshforge::sop::NodeType;
//! use glam::Vec3;
//!
//! // Box -> Transform, cooked by the engine.
//! let mut graph = NodeGraph::new();
//! let box_node = graph.add_node(NodeType::Box, "box1");
//! let xform = graph.add_node(NodeType::Transform, "xform1");
//! graph.add_connection(box_node, 0, xform, 0).unwrap();
//!
//! graph
//!     .get_node_mut(xform)
//!     .unwrap()
//!     .set_parameter("translate", ParameterValue::Vec3(Vec3::new(10.0, 0.0, 0.0)));
//!
//! let mut engine = ExecutionEngine::new();
//! assert!(engine.execute_graph(&mut graph));
//! let result = engine.get_node_geometry(xform).unwrap();
//! assert_eq!(result.read().unwrap().point_count(), 8);
//! ```
//!
//! ## Scheduling model
//!
//! Cooking is single-threaded and cooperative: operators run
//! sequentially in topological order, and cancellation (through
//! [`host::HostInterface`]) takes effect at node boundaries. Individual
//! operators may parallelize their own inner loops; the graph itself
//! never does.

pub mod attribute;
pub mod error;
pub mod geometry;
pub mod graph;
pub mod host;
pub mod io;
pub mod math;
pub mod ops;
pub mod param;
pub mod processing;
pub mod sop;
pub mod testing;
pub mod topology;
pub mod wrangle;

pub use attribute::{AttributeSet, AttributeStorage, AttributeType, ElementClass, InterpolationMode};
pub use error::{CookError, CookResult, ErrorKind};
pub use geometry::{GeometryContainer, GeometryHandle};
pub use graph::{ExecutionEngine, GraphSerializer, NodeGraph};
pub use host::{HostInterface, LogLevel, NullHost};
pub use param::{ParameterDefinition, ParameterType, ParameterValue};
pub use sop::{ExecutionState, NodeType, Operator, SopNode};
pub use topology::ElementTopology;
