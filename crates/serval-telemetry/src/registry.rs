//! Trace source configuration: named sink listeners and the minimum
//! severity threshold.
//!
//! Built once at process start, injected into the logger, and torn down by
//! an explicit [`TraceRegistry::close_listeners`] call. Registration calls
//! are individually atomic; none of this sits on the hot logging path.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use serval_fault::Failure;

use crate::config::TraceConfig;
use crate::severity::TraceSeverity;
use crate::{Error, Result};

/// A registered trace listener.
///
/// `emit` must be callable from any thread. Failures of the sink itself are
/// not caught by the logging core; propagate-or-crash is the sink's
/// contract.
pub trait TraceSink: Send + Sync {
    fn emit(&self, severity: TraceSeverity, event_id: u32, message: &str, failure: Option<&Failure>);

    /// Called once when the registry tears the listener down.
    fn close(&self) {}
}

/// Process-wide trace settings: source name, severity threshold, and the
/// set of registered listeners keyed by name.
pub struct TraceRegistry {
    name: String,
    min_severity: RwLock<TraceSeverity>,
    listeners: RwLock<HashMap<String, Arc<dyn TraceSink>>>,
}

impl TraceRegistry {
    /// Create a registry admitting every severity.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            min_severity: RwLock::new(TraceSeverity::Verbose),
            listeners: RwLock::new(HashMap::new()),
        }
    }

    /// Create a registry with name and threshold taken from configuration.
    pub fn from_config(config: &TraceConfig) -> Self {
        let registry = Self::new(config.source_name.clone());
        registry.set_min_severity(config.min_severity);
        registry
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Register a named listener. Duplicate names are rejected.
    pub fn register_listener(&self, name: impl Into<String>, sink: Arc<dyn TraceSink>) -> Result<()> {
        let name = name.into();
        let mut listeners = self
            .listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if listeners.contains_key(&name) {
            return Err(Error::Registry {
                message: format!("listener '{}' is already registered", name),
            });
        }
        listeners.insert(name, sink);
        Ok(())
    }

    /// Drain every registered listener and close each one.
    pub fn close_listeners(&self) {
        let drained: Vec<_> = {
            let mut listeners = self
                .listeners
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            listeners.drain().collect()
        };
        for (_, sink) in drained {
            sink.close();
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn set_min_severity(&self, severity: TraceSeverity) {
        *self
            .min_severity
            .write()
            .unwrap_or_else(PoisonError::into_inner) = severity;
    }

    pub fn min_severity(&self) -> TraceSeverity {
        *self
            .min_severity
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether an emission at `severity` passes the threshold.
    pub fn enabled_for(&self, severity: TraceSeverity) -> bool {
        severity <= self.min_severity()
    }

    /// Fan an event out to every registered listener.
    pub fn dispatch(
        &self,
        severity: TraceSeverity,
        event_id: u32,
        message: &str,
        failure: Option<&Failure>,
    ) {
        let listeners = self
            .listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        for sink in listeners.values() {
            sink.emit(severity, event_id, message, failure);
        }
    }
}

/// Listener that forwards dispatched events into the `tracing` macros at
/// the translated level.
#[derive(Debug, Default)]
pub struct TracingSink;

impl TracingSink {
    pub fn new() -> Self {
        Self
    }
}

impl TraceSink for TracingSink {
    fn emit(&self, severity: TraceSeverity, event_id: u32, message: &str, failure: Option<&Failure>) {
        let error = failure.map(|failure| failure.to_string());
        let error = error.as_deref();
        match severity {
            TraceSeverity::Critical | TraceSeverity::Error => {
                tracing::error!(event_id, error, "{}", message)
            }
            TraceSeverity::Warning => tracing::warn!(event_id, error, "{}", message),
            TraceSeverity::Information => tracing::info!(event_id, error, "{}", message),
            TraceSeverity::Verbose => tracing::debug!(event_id, error, "{}", message),
        }
    }
}

/// Captured copy of a dispatched event.
#[derive(Debug, Clone)]
pub struct CapturedEvent {
    pub severity: TraceSeverity,
    pub event_id: u32,
    pub message: String,
    pub failure: Option<String>,
}

/// In-memory listener for post-hoc inspection without external log
/// infrastructure.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<CapturedEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<CapturedEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn clear(&self) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub fn len(&self) -> usize {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TraceSink for MemorySink {
    fn emit(&self, severity: TraceSeverity, event_id: u32, message: &str, failure: Option<&Failure>) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(CapturedEvent {
                severity,
                event_id,
                message: message.to_string(),
                failure: failure.map(|failure| failure.to_string()),
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct ClosableSink {
        closed: AtomicBool,
    }

    impl TraceSink for ClosableSink {
        fn emit(&self, _: TraceSeverity, _: u32, _: &str, _: Option<&Failure>) {}

        fn close(&self) {
            self.closed.store(true, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let registry = TraceRegistry::new("serval-client");
        registry
            .register_listener("memory", Arc::new(MemorySink::new()))
            .unwrap();

        let err = registry
            .register_listener("memory", Arc::new(MemorySink::new()))
            .unwrap_err();
        assert!(matches!(err, Error::Registry { .. }));
        assert_eq!(registry.listener_count(), 1);
    }

    #[test]
    fn test_close_listeners_drains_and_closes() {
        let registry = TraceRegistry::new("serval-client");
        let sink = Arc::new(ClosableSink {
            closed: AtomicBool::new(false),
        });
        registry.register_listener("closable", sink.clone()).unwrap();

        registry.close_listeners();
        assert!(sink.closed.load(Ordering::SeqCst));
        assert_eq!(registry.listener_count(), 0);

        // Registration after teardown is allowed.
        registry
            .register_listener("closable", Arc::new(MemorySink::new()))
            .unwrap();
    }

    #[test]
    fn test_threshold_gating() {
        let registry = TraceRegistry::new("serval-client");
        registry.set_min_severity(TraceSeverity::Warning);

        assert!(registry.enabled_for(TraceSeverity::Critical));
        assert!(registry.enabled_for(TraceSeverity::Error));
        assert!(registry.enabled_for(TraceSeverity::Warning));
        assert!(!registry.enabled_for(TraceSeverity::Information));
        assert!(!registry.enabled_for(TraceSeverity::Verbose));
    }

    #[test]
    fn test_dispatch_reaches_all_listeners() {
        let registry = TraceRegistry::new("serval-client");
        let first = Arc::new(MemorySink::new());
        let second = Arc::new(MemorySink::new());
        registry.register_listener("first", first.clone()).unwrap();
        registry.register_listener("second", second.clone()).unwrap();

        registry.dispatch(TraceSeverity::Information, 1, "hello", None);

        assert_eq!(first.len(), 1);
        assert_eq!(second.len(), 1);
        let event = &first.events()[0];
        assert_eq!(event.severity, TraceSeverity::Information);
        assert_eq!(event.event_id, 1);
        assert_eq!(event.message, "hello");
        assert!(event.failure.is_none());
    }

    #[test]
    fn test_from_config_applies_name_and_threshold() {
        let mut config = TraceConfig::default();
        config.source_name = "serval-test".to_string();
        config.min_severity = TraceSeverity::Error;

        let registry = TraceRegistry::from_config(&config);
        assert_eq!(registry.name(), "serval-test");
        assert_eq!(registry.min_severity(), TraceSeverity::Error);
    }
}
