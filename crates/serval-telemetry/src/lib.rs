//! # Serval Telemetry
//!
//! Diagnostic trace logging core for the Serval transactional client.
//!
//! ## Features
//!
//! - **Exception flattening**: one recursive renderer turns every failure
//!   shape the remote-call path produces into a consistent multi-block
//!   diagnostic dump
//! - **Condensed last error**: a single accumulating summary string for
//!   programmatic inspection
//! - **In-memory retention**: recent rendered lines kept in a bounded,
//!   time-windowed buffer with inline eviction
//! - **Listener registry**: named trace sinks with a minimum severity
//!   threshold and explicit teardown
//! - **Structured logging**: a bundled sink forwards into `tracing`
//! - **Configurable**: toml-backed configuration with environment overrides
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use serval_telemetry::{MemorySink, TraceLogger, TraceRegistry};
//!
//! fn main() -> serval_telemetry::Result<()> {
//!     let registry = Arc::new(TraceRegistry::new("serval-client"));
//!     registry.register_listener("memory", Arc::new(MemorySink::new()))?;
//!
//!     let logger = TraceLogger::new(registry);
//!     logger.log("Client initialized");
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod flatten;
pub mod format;
pub mod logger;
pub mod registry;
pub mod retention;
pub mod severity;


pub use config::{RetentionSettings, TraceConfig};
pub use flatten::{flatten, FlattenedFailure, MAX_FLATTEN_DEPTH};
pub use format::FailureNotice;
pub use logger::{
    TraceLogger, EVENT_ID_FAILURE_NOTICE, EVENT_ID_GENERAL, EVENT_ID_REQUEST_FAILURE,
    EVENT_ID_RETRY,
};
pub use registry::{CapturedEvent, MemorySink, TraceRegistry, TraceSink, TracingSink};
pub use retention::{LogRecord, RetentionBuffer, DEFAULT_RETENTION_WINDOW};
pub use severity::TraceSeverity;

// Re-export the failure model so callers need only one crate.
pub use serval_fault::{Failure, GenericFailure, OperationFailure, ServiceFault, TransportFault};

/// Result type for telemetry operations
pub type Result<T> = std::result::Result<T, Error>;

/// Telemetry-specific errors
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Listener registration error: {message}")]
    Registry { message: String },
}
