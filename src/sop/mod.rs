//! The SOP node model: operators, parameters, ports and the cook loop.
//!
//! This module defines:
//! - [`Operator`]: the trait every concrete surface operator implements —
//!   a parameter schema, an input configuration, and `execute()`.
//! - [`SopNode`]: the concrete node wrapping a boxed operator with its
//!   parameter values, ports, timing and the
//!   {Clean, Dirty, Computing, Error} state machine.
//! - [`CookContext`]: what `execute()` sees — resolved inputs, typed
//!   parameter access, the universal group filter, and the host
//!   interface for coarse progress.
//!
//! # Notes
//! * Operators are type-erased behind `Box<dyn Operator>` and built
//!   through the factory table in [`registry`]; nothing below the
//!   port/Result boundary is operator-specific.
//! * Recursion into upstream nodes is driven by the execution engine over
//!   the graph's node arena; a node observed in the `Computing` state at
//!   cook entry is a circular dependency and poisons only the cycle.
//! * A `Clean` node with a valid output cache short-circuits: `cook`
//!   returns the cached handle without re-running `execute`.

pub mod ports;
pub mod registry;

use std::time::Duration;

use crate::attribute::ElementClass;
use crate::error::{CookError, CookResult};
use crate::geometry::{group, GeometryContainer, GeometryHandle};
use crate::host::HostInterface;
use crate::param::{
    get_parameter, group_selector_parameter, FromParameter, ParameterDefinition, ParameterMap,
    ParameterValue,
};

pub use ports::{NodePort, PortCollection, PortDataKind, PortDirection, PortRef};
pub use registry::NodeType;

/// Cook state of a node.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ExecutionState {
    /// Output cache is up to date with inputs and parameters.
    Clean,
    /// Needs recomputation.
    #[default]
    Dirty,
    /// Currently cooking (observing this at cook entry means a cycle).
    Computing,
    /// Last cook failed; see `last_error`.
    Error,
}

/// How a node type handles inputs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputKind {
    /// Generators: no inputs.
    None,
    /// Standard modifiers: exactly one input.
    Single,
    /// Exactly two inputs (Boolean, GroupTransfer).
    Dual,
    /// Unlimited inputs (Merge).
    MultiDynamic,
    /// Up to a fixed number of inputs (Switch).
    MultiFixed,
}

/// Input configuration: kind plus pin counts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InputConfig {
    pub kind: InputKind,
    pub min_count: usize,
    /// `None` means unlimited.
    pub max_count: Option<usize>,
    /// Pins created up front; dynamic kinds grow on connect.
    pub initial_pins: usize,
}

impl InputConfig {
    pub fn none() -> Self {
        Self {
            kind: InputKind::None,
            min_count: 0,
            max_count: Some(0),
            initial_pins: 0,
        }
    }

    pub fn single() -> Self {
        Self {
            kind: InputKind::Single,
            min_count: 1,
            max_count: Some(1),
            initial_pins: 1,
        }
    }

    pub fn dual() -> Self {
        Self {
            kind: InputKind::Dual,
            min_count: 2,
            max_count: Some(2),
            initial_pins: 2,
        }
    }

    pub fn multi_dynamic() -> Self {
        Self {
            kind: InputKind::MultiDynamic,
            min_count: 1,
            max_count: None,
            initial_pins: 1,
        }
    }

    pub fn multi_fixed(max: usize) -> Self {
        Self {
            kind: InputKind::MultiFixed,
            min_count: 1,
            max_count: Some(max),
            initial_pins: 2,
        }
    }
}

/// A concrete surface operator: schema + input shape + execution.
///
/// Implementations read parameters and inputs through the [`CookContext`]
/// and return a fresh (or copy-on-write shared) geometry handle.
pub trait Operator: Send {
    /// Type name from the closed set in [`registry::NodeType`].
    fn type_name(&self) -> &'static str;

    /// Input handling; default is a single-input modifier.
    fn input_config(&self) -> InputConfig {
        InputConfig::single()
    }

    /// Parameter schema, registered once at node construction.
    fn schema(&self) -> Vec<ParameterDefinition> {
        Vec::new()
    }

    /// Node-specific computation.
    fn execute(&mut self, ctx: &mut CookContext<'_>) -> CookResult<GeometryHandle>;
}

/// What an operator sees while cooking.
pub struct CookContext<'a> {
    node_name: &'a str,
    inputs: &'a [GeometryHandle],
    parameters: &'a ParameterMap,
    host: &'a dyn HostInterface,
}

impl<'a> CookContext<'a> {
    pub fn new(
        node_name: &'a str,
        inputs: &'a [GeometryHandle],
        parameters: &'a ParameterMap,
        host: &'a dyn HostInterface,
    ) -> Self {
        Self {
            node_name,
            inputs,
            parameters,
            host,
        }
    }

    pub fn node_name(&self) -> &str {
        self.node_name
    }

    pub fn host(&self) -> &dyn HostInterface {
        self.host
    }

    /// Typed parameter read; missing names and variant mismatches yield
    /// `default`.
    pub fn get<T: FromParameter>(&self, name: &str, default: T) -> T {
        get_parameter(self.parameters, name, default)
    }

    pub fn parameters(&self) -> &ParameterMap {
        self.parameters
    }

    pub fn input_count(&self) -> usize {
        self.inputs.len()
    }

    /// Input handle at `index`; empty handles mean nothing is connected
    /// (or the upstream node errored).
    pub fn input(&self, index: usize) -> GeometryHandle {
        self.inputs.get(index).cloned().unwrap_or_default()
    }

    /// All inputs, connected or not.
    pub fn inputs(&self) -> &[GeometryHandle] {
        self.inputs
    }

    /// Read view of input `index`, or an input-missing error.
    pub fn input_geometry(&self, index: usize) -> CookResult<&GeometryContainer> {
        self.inputs
            .get(index)
            .and_then(|h| h.read())
            .ok_or_else(|| {
                CookError::input_missing(format!("{} requires input geometry", self.node_name))
            })
    }

    /// Input handle primed for mutation: shares now, copies on first
    /// write (the port's own reference keeps the upstream copy intact).
    pub fn input_writable(&self, index: usize) -> CookResult<GeometryHandle> {
        let handle = self.input(index);
        if handle.is_empty() {
            return Err(CookError::input_missing(format!(
                "{} requires input geometry",
                self.node_name
            )));
        }
        Ok(handle)
    }

    // ---------------------------------------------------------------
    // Universal group filter
    // ---------------------------------------------------------------

    /// Active group name from the universal `input_group` parameter;
    /// `None` when empty (no filtering).
    pub fn group_name(&self) -> Option<String> {
        let name: String = self.get("input_group", String::new());
        if name.is_empty() { None } else { Some(name) }
    }

    /// True when no filter is active or the element is in the group.
    pub fn is_in_active_group(
        &self,
        geo: &GeometryContainer,
        class: ElementClass,
        index: usize,
    ) -> bool {
        match self.group_name() {
            None => true,
            Some(name) => group::is_in_group(geo, &name, class, index),
        }
    }

    /// Indices the operator should touch: all elements without a filter,
    /// group members with one. Errors when the named group is missing.
    pub fn selected_elements(
        &self,
        geo: &GeometryContainer,
        class: ElementClass,
    ) -> CookResult<Vec<usize>> {
        match self.group_name() {
            None => Ok((0..geo.element_count(class)).collect()),
            Some(name) => {
                if !group::has_group(geo, &name, class) {
                    return Err(CookError::parameter_invalid(format!(
                        "group '{name}' does not exist on {class} class"
                    )));
                }
                Ok(group::group_elements(geo, &name, class))
            }
        }
    }

    /// Reduce input `index` to the elements of the active group.
    ///
    /// With no active group the input passes through unchanged. With one,
    /// the inverse group is deleted, which turns any operator into a
    /// group-aware variant without per-operator code. The group must
    /// exist and be non-empty.
    pub fn apply_group_filter(
        &self,
        index: usize,
        class: ElementClass,
        delete_orphaned_points: bool,
    ) -> CookResult<GeometryHandle> {
        let input = self.input(index);
        if input.is_empty() {
            return Err(CookError::input_missing(format!(
                "{} requires input geometry",
                self.node_name
            )));
        }
        let Some(name) = self.group_name() else {
            return Ok(input);
        };

        let geo = input.read().expect("non-empty handle");
        if !group::has_group(geo, &name, class) {
            return Err(CookError::parameter_invalid(format!(
                "group '{name}' does not exist on input geometry"
            )));
        }
        if group::group_size(geo, &name, class) == 0 {
            return Err(CookError::parameter_invalid(format!("group '{name}' is empty")));
        }
        // A group covering everything filters nothing.
        if group::group_size(geo, &name, class) == geo.element_count(class) {
            return Ok(input);
        }

        let mut scratch = input.deep_clone();
        let inverted = format!("__inverted_{name}");
        let work = scratch.write().expect("non-empty handle");
        group::create_inverted_group(work, &name, &inverted, class);
        let mut filtered = work.delete_elements(&inverted, class, delete_orphaned_points)?;
        filtered
            .attributes_mut(class)
            .remove(&group::group_attribute_name(&inverted));
        Ok(GeometryHandle::from_container(filtered))
    }
}

/// A node in the operator graph: a boxed operator plus everything the
/// cook machinery needs around it.
pub struct SopNode {
    name: String,
    node_type: NodeType,
    state: ExecutionState,
    pass_through: bool,
    last_error: Option<CookError>,
    cook_duration: Duration,
    parameters: ParameterMap,
    definitions: Vec<ParameterDefinition>,
    inputs: PortCollection,
    outputs: PortCollection,
    operator: Box<dyn Operator>,
}

impl SopNode {
    /// Build a node of the given type. Ports come from the operator's
    /// input configuration; every node gets the universal `input_group`
    /// parameter and a primary `geometry` output.
    pub fn new(name: impl Into<String>, node_type: NodeType) -> Self {
        let operator = node_type.create_operator();
        let config = operator.input_config();

        let mut inputs = PortCollection::new();
        for pin in 0..config.initial_pins.max(config.min_count) {
            inputs.add(NodePort::new(
                pin.to_string(),
                PortDirection::Input,
                PortDataKind::Geometry,
            ));
        }
        let mut outputs = PortCollection::new();
        outputs.add(NodePort::new(
            "geometry",
            PortDirection::Output,
            PortDataKind::Geometry,
        ));

        let mut node = Self {
            name: name.into(),
            node_type,
            state: ExecutionState::Dirty,
            pass_through: false,
            last_error: None,
            cook_duration: Duration::ZERO,
            parameters: ParameterMap::new(),
            definitions: Vec::new(),
            inputs,
            outputs,
            operator,
        };

        node.register_parameter(
            group_selector_parameter("input_group", "")
                .label("Group")
                .category("Universal")
                .description("Name of group to operate on (empty = all elements)")
                .build(),
        );
        for def in node.operator.schema() {
            node.register_parameter(def);
        }
        node
    }

    fn register_parameter(&mut self, def: ParameterDefinition) {
        self.parameters
            .insert(def.name.clone(), def.default_value.clone());
        self.definitions.push(def);
    }

    // ---------------------------------------------------------------
    // Identity & state
    // ---------------------------------------------------------------

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn node_type(&self) -> NodeType {
        self.node_type
    }

    pub fn state(&self) -> ExecutionState {
        self.state
    }

    pub fn is_clean(&self) -> bool {
        self.state == ExecutionState::Clean
    }

    pub fn set_pass_through(&mut self, pass_through: bool) {
        if self.pass_through != pass_through {
            self.pass_through = pass_through;
            self.mark_dirty();
        }
    }

    pub fn is_pass_through(&self) -> bool {
        self.pass_through
    }

    pub fn last_error(&self) -> Option<&CookError> {
        self.last_error.as_ref()
    }

    pub fn cook_duration(&self) -> Duration {
        self.cook_duration
    }

    /// Mark dirty and drop the output cache.
    pub fn mark_dirty(&mut self) {
        self.state = ExecutionState::Dirty;
        if let Some(port) = self.outputs.get_mut(0) {
            port.invalidate_cache();
        }
    }

    // ---------------------------------------------------------------
    // Parameters
    // ---------------------------------------------------------------

    pub fn parameter_definitions(&self) -> &[ParameterDefinition] {
        &self.definitions
    }

    pub fn parameters(&self) -> &ParameterMap {
        &self.parameters
    }

    pub fn has_parameter(&self, name: &str) -> bool {
        self.parameters.contains_key(name)
    }

    pub fn get_parameter<T: FromParameter>(&self, name: &str, default: T) -> T {
        get_parameter(&self.parameters, name, default)
    }

    /// Write a parameter value and dirty the node if it changed.
    pub fn set_parameter(&mut self, name: &str, value: ParameterValue) {
        let changed = self.parameters.get(name) != Some(&value);
        self.parameters.insert(name.to_string(), value);
        if changed {
            self.mark_dirty();
        }
    }

    // ---------------------------------------------------------------
    // Ports
    // ---------------------------------------------------------------

    pub fn input_ports(&self) -> &PortCollection {
        &self.inputs
    }

    pub fn input_ports_mut(&mut self) -> &mut PortCollection {
        &mut self.inputs
    }

    pub fn output_ports(&self) -> &PortCollection {
        &self.outputs
    }

    pub fn output_ports_mut(&mut self) -> &mut PortCollection {
        &mut self.outputs
    }

    pub fn input_config(&self) -> InputConfig {
        self.operator.input_config()
    }

    /// Ensure an input pin exists at `index`, growing dynamic collections
    /// up to the configured maximum. Returns false when out of bounds.
    pub fn ensure_input_pin(&mut self, index: usize) -> bool {
        let config = self.operator.input_config();
        if let Some(max) = config.max_count {
            if index >= max {
                return false;
            }
        }
        while self.inputs.len() <= index {
            let pin = self.inputs.len();
            self.inputs.add(NodePort::new(
                pin.to_string(),
                PortDirection::Input,
                PortDataKind::Geometry,
            ));
        }
        true
    }

    /// Feed geometry into an input pin (engine and tests).
    pub fn set_input_data(&mut self, index: usize, data: GeometryHandle) {
        if self.ensure_input_pin(index) {
            if let Some(port) = self.inputs.get_mut(index) {
                port.set_data(data);
            }
        }
    }

    /// Cached output, if the last cook's result is still valid.
    pub fn cached_output(&self) -> Option<GeometryHandle> {
        let port = self.outputs.get(0)?;
        if port.is_cache_valid() {
            Some(port.data())
        } else {
            None
        }
    }

    // ---------------------------------------------------------------
    // Cook protocol (driven by the execution engine)
    // ---------------------------------------------------------------

    /// Enter the Computing state, clearing the previous error.
    pub fn begin_cook(&mut self) {
        self.state = ExecutionState::Computing;
        self.last_error = None;
    }

    /// Run the operator against the current port caches and parameters.
    pub fn run_operator(&mut self, host: &dyn HostInterface) -> CookResult<GeometryHandle> {
        let Self {
            name,
            inputs,
            parameters,
            operator,
            pass_through,
            ..
        } = self;
        if *pass_through {
            return Ok(inputs.get(0).map(|p| p.data()).unwrap_or_default());
        }
        let gathered: Vec<GeometryHandle> = inputs.iter().map(|p| p.data()).collect();
        let mut ctx = CookContext::new(name, &gathered, parameters, host);
        operator.execute(&mut ctx)
    }

    /// Record a successful cook: cache the result and go Clean.
    pub fn finish_cook(&mut self, result: GeometryHandle, elapsed: Duration) {
        if let Some(port) = self.outputs.get_mut(0) {
            port.set_data(result);
        }
        self.state = ExecutionState::Clean;
        self.cook_duration = elapsed;
    }

    /// Record a failed cook: remember the error, drop the output cache.
    pub fn fail_cook(&mut self, error: CookError, elapsed: Duration) {
        if let Some(port) = self.outputs.get_mut(0) {
            port.invalidate_cache();
        }
        self.last_error = Some(error);
        self.state = ExecutionState::Error;
        self.cook_duration = elapsed;
    }
}
