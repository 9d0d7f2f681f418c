//! Trace severity levels and their mapping onto the `tracing` sink.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::Level;

/// Abstract trace severity, ordered by urgency: `Critical` ranks before
/// `Verbose`, so `severity <= threshold` expresses "at least as urgent as".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TraceSeverity {
    Critical,
    Error,
    Warning,
    Information,
    Verbose,
}

impl TraceSeverity {
    /// Whether emissions at this severity take the error path (flattening,
    /// last-error bookkeeping).
    pub fn is_error_class(self) -> bool {
        matches!(self, TraceSeverity::Critical | TraceSeverity::Error)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TraceSeverity::Critical => "Critical",
            TraceSeverity::Error => "Error",
            TraceSeverity::Warning => "Warning",
            TraceSeverity::Information => "Information",
            TraceSeverity::Verbose => "Verbose",
        }
    }
}

impl fmt::Display for TraceSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<TraceSeverity> for Level {
    fn from(severity: TraceSeverity) -> Self {
        match severity {
            TraceSeverity::Critical => Level::ERROR,
            TraceSeverity::Error => Level::ERROR,
            TraceSeverity::Warning => Level::WARN,
            TraceSeverity::Information => Level::INFO,
            TraceSeverity::Verbose => Level::DEBUG,
        }
    }
}

impl From<Level> for TraceSeverity {
    fn from(level: Level) -> Self {
        match level {
            Level::ERROR => TraceSeverity::Error,
            Level::WARN => TraceSeverity::Warning,
            Level::INFO => TraceSeverity::Information,
            _ => TraceSeverity::Verbose,
        }
    }
}
