//! The four recognized failure variants and the union over them.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::body::{first_line, ErrorBody};

/// Any failure produced by the remote-call path.
///
/// Variants form a closed set so downstream rendering can dispatch with an
/// exhaustive match. A variant may reference a cause of another variant;
/// chains are practically shallow (1-4 deep) but not contractually acyclic.
#[derive(Debug, Clone, Error)]
pub enum Failure {
    #[error("{}", .0.message)]
    ServiceFault(ServiceFault),

    #[error("HTTP {} {}", .0.status, .0.status_text)]
    Transport(TransportFault),

    #[error("{}", .0.message)]
    Operation(OperationFailure),

    #[error("{}", .0.message)]
    Generic(GenericFailure),
}

impl Failure {
    /// Short variant name used in formatted notices.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Failure::ServiceFault(_) => "ServiceFault",
            Failure::Transport(_) => "TransportFault",
            Failure::Operation(_) => "OperationFailure",
            Failure::Generic(_) => "GenericFailure",
        }
    }
}

impl From<ServiceFault> for Failure {
    fn from(fault: ServiceFault) -> Self {
        Failure::ServiceFault(fault)
    }
}

impl From<TransportFault> for Failure {
    fn from(fault: TransportFault) -> Self {
        Failure::Transport(fault)
    }
}

impl From<OperationFailure> for Failure {
    fn from(failure: OperationFailure) -> Self {
        Failure::Operation(failure)
    }
}

impl From<GenericFailure> for Failure {
    fn from(failure: GenericFailure) -> Self {
        Failure::Generic(failure)
    }
}

/// Structured service-side fault. Nesting stays within this variant: an
/// inner fault is always another `ServiceFault`.
#[derive(Debug, Clone)]
pub struct ServiceFault {
    pub message: String,
    pub error_code: String,
    pub trace: Option<String>,
    pub activity_id: Option<String>,
    pub occurred_at: Option<DateTime<Utc>>,
    pub help_link: Option<String>,
    pub details: BTreeMap<String, String>,
    pub inner: Option<Box<ServiceFault>>,
}

impl ServiceFault {
    pub fn new(message: impl Into<String>, error_code: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            error_code: error_code.into(),
            trace: None,
            activity_id: None,
            occurred_at: None,
            help_link: None,
            details: BTreeMap::new(),
            inner: None,
        }
    }

    pub fn with_trace(mut self, trace: impl Into<String>) -> Self {
        self.trace = Some(trace.into());
        self
    }

    pub fn with_activity_id(mut self, activity_id: impl Into<String>) -> Self {
        self.activity_id = Some(activity_id.into());
        self
    }

    pub fn with_occurred_at(mut self, occurred_at: DateTime<Utc>) -> Self {
        self.occurred_at = Some(occurred_at);
        self
    }

    pub fn with_help_link(mut self, help_link: impl Into<String>) -> Self {
        self.help_link = Some(help_link.into());
        self
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }

    pub fn with_inner(mut self, inner: ServiceFault) -> Self {
        self.inner = Some(Box::new(inner));
        self
    }
}

/// Transport-level HTTP fault. The JSON error body, when present, nests at
/// most one level (`error.innererror`).
#[derive(Debug, Clone)]
pub struct TransportFault {
    pub status: u16,
    pub status_text: String,
    pub body: Option<String>,
    pub correlation_id: Option<String>,
}

impl TransportFault {
    pub fn new(status: u16, status_text: impl Into<String>) -> Self {
        Self {
            status,
            status_text: status_text.into(),
            body: None,
            correlation_id: None,
        }
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_correlation_id(mut self, correlation_id: impl Into<String>) -> Self {
        self.correlation_id = Some(correlation_id.into());
        self
    }

    /// Parse the JSON error body, if any. Malformed bodies parse to `None`.
    pub fn parsed_body(&self) -> Option<ErrorBody> {
        self.body.as_deref().and_then(ErrorBody::parse)
    }

    /// First line of the parsed body's `error.message`, if parseable.
    pub fn body_message(&self) -> Option<String> {
        self.parsed_body()
            .and_then(|body| body.error.message)
            .map(|message| first_line(&message).to_string())
    }

    /// Best-effort human message: the parsed body message, falling back to
    /// the HTTP status text.
    pub fn summary_message(&self) -> String {
        self.body_message()
            .unwrap_or_else(|| self.status_text.clone())
    }
}

/// Wrapped operation error carrying a numeric result code and a keyed data
/// dictionary. `result_code: None` expresses the "unset" sentinel.
#[derive(Debug, Clone)]
pub struct OperationFailure {
    pub message: String,
    pub source: Option<String>,
    pub result_code: Option<i32>,
    pub data: BTreeMap<String, String>,
    pub help_link: Option<String>,
    pub inner: Option<Box<Failure>>,
}

impl OperationFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
            result_code: None,
            data: BTreeMap::new(),
            help_link: None,
            inner: None,
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_result_code(mut self, result_code: i32) -> Self {
        self.result_code = Some(result_code);
        self
    }

    pub fn with_data_entry(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    pub fn with_help_link(mut self, help_link: impl Into<String>) -> Self {
        self.help_link = Some(help_link.into());
        self
    }

    pub fn with_inner(mut self, inner: Failure) -> Self {
        self.inner = Some(Box::new(inner));
        self
    }
}

/// Generic runtime failure with an optional stack trace and cause.
#[derive(Debug, Clone)]
pub struct GenericFailure {
    pub message: String,
    pub source: Option<String>,
    pub target_operation: Option<String>,
    pub help_link: Option<String>,
    pub stack_trace: Option<String>,
    pub inner: Option<Box<Failure>>,
}

impl GenericFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
            target_operation: None,
            help_link: None,
            stack_trace: None,
            inner: None,
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_target_operation(mut self, target_operation: impl Into<String>) -> Self {
        self.target_operation = Some(target_operation.into());
        self
    }

    pub fn with_help_link(mut self, help_link: impl Into<String>) -> Self {
        self.help_link = Some(help_link.into());
        self
    }

    pub fn with_stack_trace(mut self, stack_trace: impl Into<String>) -> Self {
        self.stack_trace = Some(stack_trace.into());
        self
    }

    pub fn with_inner(mut self, inner: Failure) -> Self {
        self.inner = Some(Box::new(inner));
        self
    }
}
