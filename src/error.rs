//! Error types for cooking and geometry operations.
//!
//! Failures are classified by *kind*, not by a type per failure site:
//! every error carries an [`ErrorKind`] from the closed taxonomy plus a
//! human-readable message. Operators surface these through their cook
//! `Result`; the engine records them per node and forwards them to the
//! host interface's log channel.

use std::fmt;

/// Closed failure taxonomy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// A required input port is not connected or produced no geometry.
    InputMissing,
    /// Input geometry violates an operator precondition.
    InputInvalid,
    /// A parameter value is out of range or names a missing group or
    /// attribute.
    ParameterInvalid,
    /// A delegated geometry-processing routine failed or is unavailable.
    AlgorithmFailure,
    /// File I/O failed.
    ResourceFailure,
    /// Cook re-entered a node that was already computing.
    CircularDependency,
    /// Serialized graph names a node type outside the closed set.
    UnknownNodeType,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::InputMissing => "input-missing",
            ErrorKind::InputInvalid => "input-invalid",
            ErrorKind::ParameterInvalid => "parameter-invalid",
            ErrorKind::AlgorithmFailure => "algorithm-failure",
            ErrorKind::ResourceFailure => "resource-failure",
            ErrorKind::CircularDependency => "circular-dependency",
            ErrorKind::UnknownNodeType => "unknown-node-type",
        }
    }
}

/// An operator or engine failure: a kind from the taxonomy plus a message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CookError {
    kind: ErrorKind,
    message: String,
}

impl CookError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn input_missing(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InputMissing, message)
    }

    pub fn input_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InputInvalid, message)
    }

    pub fn parameter_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ParameterInvalid, message)
    }

    pub fn algorithm_failure(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::AlgorithmFailure, message)
    }

    pub fn resource_failure(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ResourceFailure, message)
    }

    pub fn circular_dependency(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::CircularDependency, message)
    }

    pub fn unknown_node_type(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnknownNodeType, message)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CookError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind.as_str(), self.message)
    }
}

impl std::error::Error for CookError {}

/// Result alias used by operator `execute` bodies and the cook path.
pub type CookResult<T> = Result<T, CookError>;
