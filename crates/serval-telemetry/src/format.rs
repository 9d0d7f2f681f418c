//! Message templates and severity policy per event family.

use std::fmt::Write;
use std::time::Duration;

use serval_fault::{Failure, GenericFailure};

use crate::severity::TraceSeverity;

/// A formatted message together with the severity it must be emitted at.
#[derive(Debug, Clone)]
pub(crate) struct FormattedEvent {
    pub severity: TraceSeverity,
    pub message: String,
}

/// Parameters of a terminal or intermediate failure notice.
#[derive(Debug, Clone, Default)]
pub struct FailureNotice {
    pub request_name: Option<String>,
    pub fallback_label: String,
    pub tracking_id: String,
    pub session_id: Option<String>,
    pub cross_thread_safety_disabled: bool,
    pub lock_wait: Duration,
    pub elapsed: Duration,
    pub context: String,
    pub is_terminal: bool,
}

fn bool_label(value: bool) -> &'static str {
    if value {
        "True"
    } else {
        "False"
    }
}

/// Message text used for a failure in formatted notices: transport faults
/// substitute the parsed JSON error message, falling back to the HTTP
/// status text.
pub(crate) fn failure_message(failure: &Failure) -> String {
    match failure {
        Failure::Transport(fault) => fault.summary_message(),
        other => other.to_string(),
    }
}

/// Synthesized failure for error-severity messages logged without one.
pub(crate) fn synthesize_failure(message: &str) -> Failure {
    Failure::from(GenericFailure::new(message))
}

pub(crate) fn retry_notice(
    attempt: u32,
    request_name: Option<&str>,
    fallback_label: &str,
    delay: Duration,
    is_terminal: bool,
    is_throttled: bool,
) -> FormattedEvent {
    let name = request_name.unwrap_or(fallback_label);
    if attempt == 0 {
        FormattedEvent {
            severity: TraceSeverity::Verbose,
            message: format!("No retries attempted for request {}", name),
        }
    } else if is_terminal {
        FormattedEvent {
            severity: TraceSeverity::Verbose,
            message: format!("Retries completed at Retry No={} for request {}", attempt, name),
        }
    } else {
        FormattedEvent {
            severity: TraceSeverity::Warning,
            message: format!(
                "Retry started for request {}: Retry No={}, IsThrottle={}, Delay={:?}",
                name,
                attempt,
                bool_label(is_throttled),
                delay
            ),
        }
    }
}

pub(crate) fn request_failure(
    request_name: Option<&str>,
    fallback_label: &str,
    failure: &Failure,
    context: &str,
) -> FormattedEvent {
    FormattedEvent {
        severity: TraceSeverity::Error,
        message: format!(
            "**** {} - {} : {} |=> {}",
            failure.kind_name(),
            request_name.unwrap_or(fallback_label),
            context,
            failure_message(failure)
        ),
    }
}

pub(crate) fn failure_notice(notice: &FailureNotice, failure: &Failure) -> FormattedEvent {
    let mut line = String::new();
    if notice.is_terminal {
        line.push_str("[TerminalFailure] ");
    }
    if let Some(session_id) = notice.session_id.as_deref() {
        if !session_id.is_empty() {
            let _ = write!(line, "SessionID={} ", session_id);
        }
    }
    let _ = write!(
        line,
        "{}",
        notice.request_name.as_deref().unwrap_or(&notice.fallback_label)
    );
    if notice.cross_thread_safety_disabled {
        line.push_str(" : DisableCrossThreadSafeties=true :");
    }
    let _ = write!(line, " RequestID={}", notice.tracking_id);
    if !notice.lock_wait.is_zero() {
        let _ = write!(line, " LockWaitDuration={:?}", notice.lock_wait);
    }
    let _ = write!(line, " duration={:?}", notice.elapsed);
    let _ = write!(line, " {} |=> {}", notice.context, failure_message(failure));

    FormattedEvent {
        severity: TraceSeverity::Error,
        message: line,
    }
}
