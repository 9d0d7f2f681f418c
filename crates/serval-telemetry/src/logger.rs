//! The orchestrating trace logger.
//!
//! Every call formats a message, flattens the associated failure on the
//! error path, fans the result out to the registered listeners, updates the
//! last-error state, and appends to the retention buffer when capture is
//! enabled. Calls execute synchronously on the calling thread; nothing here
//! blocks on I/O or timers.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::Utc;
use serval_fault::Failure;

use crate::config::TraceConfig;
use crate::flatten::flatten;
use crate::format::{self, FailureNotice};
use crate::registry::TraceRegistry;
use crate::retention::{LogRecord, RetentionBuffer, DEFAULT_RETENTION_WINDOW};
use crate::severity::TraceSeverity;

/// Event id for plain and bare-failure log calls.
pub const EVENT_ID_GENERAL: u32 = 1;
/// Event id for retry notices.
pub const EVENT_ID_RETRY: u32 = 2;
/// Event id for request-exception notices.
pub const EVENT_ID_REQUEST_FAILURE: u32 = 3;
/// Event id for terminal and intermediate failure notices.
pub const EVENT_ID_FAILURE_NOTICE: u32 = 4;

/// Diagnostic logging core for the Serval client.
pub struct TraceLogger {
    registry: Arc<TraceRegistry>,
    retention: RetentionBuffer,
    retention_enabled: AtomicBool,
    retention_window: Mutex<Duration>,
    last_error_text: Mutex<String>,
    last_failure: Mutex<Option<Failure>>,
}

impl TraceLogger {
    /// Create a logger with retention capture disabled.
    pub fn new(registry: Arc<TraceRegistry>) -> Self {
        Self {
            registry,
            retention: RetentionBuffer::new(),
            retention_enabled: AtomicBool::new(false),
            retention_window: Mutex::new(DEFAULT_RETENTION_WINDOW),
            last_error_text: Mutex::new(String::new()),
            last_failure: Mutex::new(None),
        }
    }

    /// Create a logger with retention settings taken from configuration.
    pub fn with_config(registry: Arc<TraceRegistry>, config: &TraceConfig) -> Self {
        let logger = Self::new(registry);
        logger.set_retention_enabled(config.retention.enabled);
        logger.set_retention_window(config.retention.window());
        logger
    }

    pub fn registry(&self) -> &TraceRegistry {
        &self.registry
    }

    /// Log an informational message.
    pub fn log(&self, message: &str) {
        self.log_at(message, TraceSeverity::Information);
    }

    /// Log a message at an explicit severity.
    pub fn log_at(&self, message: &str, severity: TraceSeverity) {
        self.log_with(message, severity, None);
    }

    /// Log a message with an optional failure. An error-severity message
    /// without a failure synthesizes one from the message text so the
    /// flattener has something to render.
    pub fn log_with(&self, message: &str, severity: TraceSeverity, failure: Option<&Failure>) {
        if severity.is_error_class() && failure.is_none() {
            let synthesized = format::synthesize_failure(message);
            self.emit(severity, EVENT_ID_GENERAL, message, Some(&synthesized));
        } else {
            self.emit(severity, EVENT_ID_GENERAL, message, failure);
        }
    }

    /// Log a bare failure at error severity.
    pub fn log_error(&self, failure: &Failure) {
        self.emit(
            TraceSeverity::Error,
            EVENT_ID_GENERAL,
            &failure.to_string(),
            Some(failure),
        );
    }

    /// Record a retry attempt reported by the retry scheduler.
    pub fn log_retry(
        &self,
        attempt: u32,
        request_name: Option<&str>,
        delay: Duration,
        is_terminal: bool,
        is_throttled: bool,
        fallback_label: &str,
    ) {
        let event = format::retry_notice(
            attempt,
            request_name,
            fallback_label,
            delay,
            is_terminal,
            is_throttled,
        );
        self.emit(event.severity, EVENT_ID_RETRY, &event.message, None);
    }

    /// Record a request-scoped exception notice.
    pub fn log_request_failure(
        &self,
        request_name: Option<&str>,
        failure: &Failure,
        context: &str,
        fallback_label: &str,
    ) {
        let event = format::request_failure(request_name, fallback_label, failure, context);
        self.emit(
            event.severity,
            EVENT_ID_REQUEST_FAILURE,
            &event.message,
            Some(failure),
        );
    }

    /// Record a terminal or intermediate failure notice.
    pub fn log_failure(&self, notice: &FailureNotice, failure: &Failure) {
        let event = format::failure_notice(notice, failure);
        self.emit(
            event.severity,
            EVENT_ID_FAILURE_NOTICE,
            &event.message,
            Some(failure),
        );
    }

    fn emit(&self, severity: TraceSeverity, event_id: u32, message: &str, failure: Option<&Failure>) {
        if !self.registry.enabled_for(severity) {
            return;
        }

        let mut rendered = message.to_string();
        if severity.is_error_class() {
            if let Some(failure) = failure {
                let flat = flatten(failure);
                rendered.push('\n');
                rendered.push_str(&flat.detail);
                self.registry
                    .dispatch(severity, event_id, &rendered, Some(failure));

                // The two last-error fields are guarded by separate locks;
                // concurrent error emissions may interleave between them.
                self.last_error_text
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push_str(&flat.summary);
                *self
                    .last_failure
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner) = Some(failure.clone());
            } else {
                self.registry.dispatch(severity, event_id, &rendered, None);
            }
        } else {
            self.registry.dispatch(severity, event_id, &rendered, failure);
        }

        if self.retention_enabled.load(Ordering::Relaxed) {
            let window = *self
                .retention_window
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            let line = format!("{}: {}", severity, rendered);
            self.retention.append(Utc::now(), line, window);
        }
    }

    /// Accumulated condensed summaries of every error logged since the last
    /// reset.
    pub fn last_error(&self) -> String {
        self.last_error_text
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The most recently logged failure, if any.
    pub fn last_failure(&self) -> Option<Failure> {
        self.last_failure
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Read both last-error fields under their locks in update order,
    /// yielding a mutually consistent pair.
    pub fn last_error_snapshot(&self) -> (String, Option<Failure>) {
        let text = self
            .last_error_text
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let failure = self
            .last_failure
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        (text.clone(), failure.clone())
    }

    /// Truncate the accumulated error text and drop the stored failure.
    /// Idempotent; never raises when already empty.
    pub fn reset_last_error(&self) {
        self.last_error_text
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        *self
            .last_failure
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Drop every record captured in the retention buffer.
    pub fn clear_log_cache(&self) {
        self.retention.clear();
    }

    /// Point-in-time copy of the retention buffer, oldest first.
    pub fn cached_records(&self) -> Vec<LogRecord> {
        self.retention.snapshot()
    }

    pub fn set_retention_enabled(&self, enabled: bool) {
        self.retention_enabled.store(enabled, Ordering::Relaxed);
    }

    pub fn retention_enabled(&self) -> bool {
        self.retention_enabled.load(Ordering::Relaxed)
    }

    pub fn set_retention_window(&self, window: Duration) {
        *self
            .retention_window
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = window;
    }

    pub fn retention_window(&self) -> Duration {
        *self
            .retention_window
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
