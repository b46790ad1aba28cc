//! Bridge to the embedding application.
//!
//! The engine reports progress, checks for cancellation and emits
//! user-facing log lines through a [`HostInterface`] supplied by whatever
//! hosts the library — a CLI, an editor, a render farm worker. The
//! default [`NullHost`] accepts everything and never cancels, so embedders
//! that do not care pay nothing.

use std::path::PathBuf;

/// Severity of a host log line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warning => "warning",
            LogLevel::Error => "error",
        }
    }
}

/// Progress, cancellation, logging and path resolution for the embedding
/// application. All methods have no-op defaults; implement what you need.
pub trait HostInterface: Send + Sync {
    /// Report cook progress (`current` of `total` nodes). Returning false
    /// aborts the remainder of the cook at the next node boundary.
    fn report_progress(&self, current: usize, total: usize, message: &str) -> bool {
        let _ = (current, total, message);
        true
    }

    /// Cooperative cancellation flag, polled at node boundaries.
    fn is_cancelled(&self) -> bool {
        false
    }

    /// User-facing log channel.
    fn log(&self, level: LogLevel, message: &str) {
        let _ = (level, message);
    }

    /// Resolve a path relative to whatever the host considers the project
    /// root. The default leaves paths untouched.
    fn resolve_path(&self, relative: &str) -> PathBuf {
        PathBuf::from(relative)
    }

    /// Identification string for diagnostics.
    fn host_info(&self) -> String {
        "meshforge".to_string()
    }
}

/// Default host: silent, never cancels.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullHost;

impl HostInterface for NullHost {}
