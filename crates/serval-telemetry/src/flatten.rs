//! Cause-chain flattening.
//!
//! Walks a failure chain depth-first and renders two views at once: a
//! multi-block detail dump for trace sinks and a condensed single-line
//! summary for programmatic inspection. Both accumulate in a single
//! [`RenderContext`] threaded through the recursion.
//!
//! Block timestamps are the wall clock at render time, not the time of the
//! original failure; callers needing event timing must read the failure's
//! own `Time`/`Trace` fields rendered inline.

use std::fmt::Write;

use chrono::Utc;
use serval_fault::body::first_line;
use serval_fault::{Failure, GenericFailure, OperationFailure, ServiceFault, TransportFault};

/// Hard cap on cause-chain recursion. External failure objects are not
/// contractually acyclic; past this depth flattening stops silently.
pub const MAX_FLATTEN_DEPTH: usize = 32;

const NOT_PROVIDED: &str = "Not Provided";
const SUMMARY_SEPARATOR: &str = " => ";
const BLOCK_SEPARATOR: &str =
    "----------------------------------------------------------------------";

/// Both renderings of a flattened cause chain.
#[derive(Debug, Clone)]
pub struct FlattenedFailure {
    /// Multi-block, multi-line dump of the full chain.
    pub detail: String,
    /// Single-line rendering of all messages, joined by `" => "`.
    pub summary: String,
}

/// Accumulating buffers shared by every recursive render call.
#[derive(Debug, Default)]
struct RenderContext {
    detail: String,
    summary: String,
}

impl RenderContext {
    fn begin_block(&mut self, header: &str, level: usize) {
        let _ = writeln!(self.detail, "{}", BLOCK_SEPARATOR);
        if level == 0 {
            let _ = writeln!(self.detail, "{}", header);
        } else {
            let _ = writeln!(self.detail, "Inner Exception Level {}: {}", level, header);
        }
        let now = Utc::now();
        let _ = writeln!(
            self.detail,
            "DateUTC: {}, TimeUTC: {}",
            now.format("%Y-%m-%d"),
            now.format("%H:%M:%S")
        );
    }

    fn end_block(&mut self) {
        let _ = writeln!(self.detail, "{}", BLOCK_SEPARATOR);
    }

    /// Render `name: value`; absent or empty values degrade to the
    /// "Not Provided" literal.
    fn field(&mut self, name: &str, value: Option<&str>) {
        let value = match value {
            Some(value) if !value.is_empty() => value,
            _ => NOT_PROVIDED,
        };
        let _ = writeln!(self.detail, "{}: {}", name, value);
    }

    fn line(&mut self, text: &str) {
        let _ = writeln!(self.detail, "{}", text);
    }

    fn push_summary(&mut self, fragment: &str) {
        self.summary.push_str(fragment);
    }

    fn push_summary_separator(&mut self) {
        self.summary.push_str(SUMMARY_SEPARATOR);
    }
}

/// Flatten a failure chain into a detail dump and a condensed summary.
pub fn flatten(failure: &Failure) -> FlattenedFailure {
    let mut ctx = RenderContext::default();
    flatten_into(&mut ctx, failure, 0);
    FlattenedFailure {
        detail: ctx.detail,
        summary: ctx.summary,
    }
}

fn flatten_into(ctx: &mut RenderContext, failure: &Failure, level: usize) {
    match failure {
        Failure::ServiceFault(fault) => render_service_fault(ctx, fault, level),
        Failure::Transport(fault) => render_transport_fault(ctx, fault, level),
        Failure::Operation(failure) => render_operation_failure(ctx, failure, level),
        Failure::Generic(failure) => render_generic_failure(ctx, failure, level),
    }
}

fn render_service_fault(ctx: &mut RenderContext, fault: &ServiceFault, level: usize) {
    ctx.begin_block("ServiceFault Info", level);
    ctx.field("Error", Some(&fault.message));
    if let Some(occurred_at) = fault.occurred_at {
        let rendered = occurred_at.format("%Y-%m-%d %H:%M:%S UTC").to_string();
        ctx.field("Time", Some(&rendered));
    }
    ctx.field("ErrorCode", Some(&fault.error_code));
    if let Some(activity_id) = &fault.activity_id {
        ctx.field("ActivityId", Some(activity_id));
    }
    ctx.field("HelpLink", fault.help_link.as_deref());
    ctx.field("Trace", fault.trace.as_deref());
    for (key, value) in &fault.details {
        ctx.field(key, Some(value));
    }
    ctx.end_block();

    ctx.push_summary(&fault.message);
    if let Some(inner) = &fault.inner {
        if level + 1 < MAX_FLATTEN_DEPTH {
            ctx.push_summary_separator();
            render_service_fault(ctx, inner, level + 1);
        }
    }
}

fn render_transport_fault(ctx: &mut RenderContext, fault: &TransportFault, level: usize) {
    let detail = fault.parsed_body().map(|body| body.error);
    let message = detail
        .as_ref()
        .and_then(|detail| detail.message.as_deref().map(first_line));

    ctx.begin_block("Exception", level);
    ctx.field("Source", None);
    ctx.field("Method", None);
    ctx.field("Error", message);
    if let Some(correlation_id) = &fault.correlation_id {
        ctx.field("ActivityId", Some(correlation_id));
    }
    ctx.field(
        "HelpLink",
        detail.as_ref().and_then(|detail| detail.helplink.as_deref()),
    );
    ctx.field(
        "Stack Trace",
        detail.as_ref().and_then(|detail| detail.stacktrace.as_deref()),
    );
    ctx.end_block();

    ctx.push_summary(message.unwrap_or(NOT_PROVIDED));

    // The wire format nests at most one level; render that single synthetic
    // extra block and stop.
    if let Some(inner) = detail.and_then(|detail| detail.innererror) {
        if level + 1 < MAX_FLATTEN_DEPTH {
            let inner_message = inner.message.as_deref().map(first_line);
            ctx.push_summary_separator();
            ctx.begin_block("Exception", level + 1);
            ctx.field("Error", inner_message);
            ctx.field("HelpLink", inner.helplink.as_deref());
            ctx.field("Stack Trace", inner.stacktrace.as_deref());
            ctx.end_block();
            ctx.push_summary(inner_message.unwrap_or(NOT_PROVIDED));
        }
    }
}

fn render_operation_failure(ctx: &mut RenderContext, failure: &OperationFailure, level: usize) {
    ctx.begin_block("OperationException Info", level);
    ctx.field("Source", failure.source.as_deref());
    ctx.field("Error", Some(&failure.message));
    let result_code = failure.result_code.map(|code| code.to_string());
    ctx.field("ErrorCode", result_code.as_deref());
    ctx.field("HelpLink", failure.help_link.as_deref());
    if !failure.data.is_empty() {
        ctx.line("Data:");
        for (key, value) in &failure.data {
            ctx.line(&format!("  {}: {}", key, value));
        }
    }
    ctx.end_block();

    ctx.push_summary(&failure.message);
    if let Some(inner) = &failure.inner {
        if level + 1 < MAX_FLATTEN_DEPTH {
            ctx.push_summary_separator();
            flatten_into(ctx, inner, level + 1);
        }
    }
}

fn render_generic_failure(ctx: &mut RenderContext, failure: &GenericFailure, level: usize) {
    ctx.begin_block("Exception", level);
    ctx.field("Source", failure.source.as_deref());
    ctx.field("Method", failure.target_operation.as_deref());
    ctx.field("Error", Some(&failure.message));
    ctx.field("HelpLink", failure.help_link.as_deref());
    ctx.field("Stack Trace", failure.stack_trace.as_deref());
    ctx.end_block();

    ctx.push_summary(&failure.message);
    if let Some(inner) = &failure.inner {
        if level + 1 < MAX_FLATTEN_DEPTH {
            ctx.push_summary_separator();
            flatten_into(ctx, inner, level + 1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn generic_chain(depth: usize) -> Failure {
        let mut failure = GenericFailure::new(format!("level-{}", depth - 1));
        for index in (0..depth - 1).rev() {
            failure =
                GenericFailure::new(format!("level-{}", index)).with_inner(Failure::from(failure));
        }
        Failure::from(failure)
    }

    fn summary_fragments(summary: &str) -> Vec<&str> {
        summary.split(SUMMARY_SEPARATOR).collect()
    }

    #[test]
    fn test_single_generic_failure() {
        let failure = Failure::from(
            GenericFailure::new("connection dropped")
                .with_source("serval-transport")
                .with_target_operation("ReadDocument")
                .with_stack_trace("at transport::read"),
        );

        let flat = flatten(&failure);
        assert_eq!(flat.summary, "connection dropped");
        assert!(flat.detail.contains("Exception\n"));
        assert!(flat.detail.contains("Source: serval-transport"));
        assert!(flat.detail.contains("Method: ReadDocument"));
        assert!(flat.detail.contains("Error: connection dropped"));
        assert!(flat.detail.contains("HelpLink: Not Provided"));
        assert!(flat.detail.contains("Stack Trace: at transport::read"));
        assert!(!flat.detail.contains("Inner Exception Level"));
    }

    #[test]
    fn test_mixed_chain_summary_and_levels() {
        let chain = Failure::from(
            GenericFailure::new("request aborted").with_inner(Failure::from(
                OperationFailure::new("commit failed")
                    .with_result_code(-2146233088)
                    .with_inner(Failure::from(
                        ServiceFault::new("quorum lost", "1002").with_trace("replica trace"),
                    )),
            )),
        );

        let flat = flatten(&chain);
        assert_eq!(
            summary_fragments(&flat.summary),
            vec!["request aborted", "commit failed", "quorum lost"]
        );
        assert!(flat
            .detail
            .contains("Inner Exception Level 1: OperationException Info"));
        assert!(flat
            .detail
            .contains("Inner Exception Level 2: ServiceFault Info"));
        assert!(flat.detail.contains("ErrorCode: -2146233088"));
        assert!(flat.detail.contains("Trace: replica trace"));
    }

    #[test]
    fn test_service_fault_same_variant_nesting() {
        let fault = ServiceFault::new("outer fault", "1001")
            .with_activity_id("activity-123")
            .with_detail("PartitionId", "42")
            .with_occurred_at(chrono::Utc.with_ymd_and_hms(2026, 3, 1, 9, 30, 0).unwrap())
            .with_inner(ServiceFault::new("inner fault", "1002"));

        let flat = flatten(&Failure::from(fault));
        assert_eq!(
            summary_fragments(&flat.summary),
            vec!["outer fault", "inner fault"]
        );
        assert!(flat.detail.contains("ServiceFault Info"));
        assert!(flat
            .detail
            .contains("Inner Exception Level 1: ServiceFault Info"));
        assert!(flat.detail.contains("ActivityId: activity-123"));
        assert!(flat.detail.contains("PartitionId: 42"));
        assert!(flat.detail.contains("Time: 2026-03-01 09:30:00 UTC"));
    }

    #[test]
    fn test_transport_fault_with_inner_error() {
        let fault = TransportFault::new(503, "Service Unavailable")
            .with_correlation_id("corr-9")
            .with_body(
                r#"{"error": {
                    "message": "Gateway rejected the request\nSee diagnostics",
                    "stacktrace": "at Gateway.Route()",
                    "innererror": {"message": "Replica quorum not met", "helplink": "https://aka.serval/1002"}
                }}"#,
            );

        let flat = flatten(&Failure::from(fault));
        assert_eq!(
            summary_fragments(&flat.summary),
            vec!["Gateway rejected the request", "Replica quorum not met"]
        );
        assert!(flat.detail.contains("Error: Gateway rejected the request"));
        assert!(!flat.detail.contains("See diagnostics"));
        assert!(flat.detail.contains("ActivityId: corr-9"));
        assert!(flat.detail.contains("Stack Trace: at Gateway.Route()"));
        assert!(flat.detail.contains("Inner Exception Level 1: Exception"));
        assert!(flat.detail.contains("HelpLink: https://aka.serval/1002"));
    }

    #[test]
    fn test_transport_fault_unparseable_body_degrades() {
        let fault = TransportFault::new(500, "Internal Server Error").with_body("<html>oops</html>");

        let flat = flatten(&Failure::from(fault));
        assert_eq!(flat.summary, "Not Provided");
        assert!(flat.detail.contains("Error: Not Provided"));
        assert!(flat.detail.contains("Stack Trace: Not Provided"));
        assert!(!flat.detail.contains("Inner Exception Level"));
    }

    #[test]
    fn test_transport_fault_absent_body_degrades() {
        let flat = flatten(&Failure::from(TransportFault::new(408, "Request Timeout")));
        assert_eq!(flat.summary, "Not Provided");
        assert!(flat.detail.contains("Error: Not Provided"));
    }

    #[test]
    fn test_operation_failure_data_dump() {
        let failure = OperationFailure::new("batch rejected")
            .with_source("serval-batch")
            .with_data_entry("BatchSize", "100")
            .with_data_entry("Partition", "7");

        let flat = flatten(&Failure::from(failure));
        assert!(flat.detail.contains("OperationException Info"));
        assert!(flat.detail.contains("Data:"));
        assert!(flat.detail.contains("  BatchSize: 100"));
        assert!(flat.detail.contains("  Partition: 7"));
        assert!(flat.detail.contains("ErrorCode: Not Provided"));
    }

    #[test]
    fn test_chain_of_depth_ten() {
        let flat = flatten(&generic_chain(10));
        assert_eq!(summary_fragments(&flat.summary).len(), 10);
        for level in 1..10 {
            assert!(flat
                .detail
                .contains(&format!("Inner Exception Level {}: Exception", level)));
        }
    }

    #[test]
    fn test_depth_cap_stops_silently() {
        let flat = flatten(&generic_chain(40));
        assert_eq!(summary_fragments(&flat.summary).len(), MAX_FLATTEN_DEPTH);
        assert!(flat
            .detail
            .contains(&format!("Inner Exception Level {}: ", MAX_FLATTEN_DEPTH - 1)));
        assert!(!flat
            .detail
            .contains(&format!("Inner Exception Level {}: ", MAX_FLATTEN_DEPTH)));
        assert!(!flat.summary.ends_with(SUMMARY_SEPARATOR));
    }

    #[test]
    fn test_empty_message_renders_not_provided() {
        let flat = flatten(&Failure::from(GenericFailure::new("")));
        assert!(flat.detail.contains("Error: Not Provided"));
    }

    #[test]
    fn test_every_block_is_separator_delimited() {
        let flat = flatten(&generic_chain(3));
        let separators = flat
            .detail
            .lines()
            .filter(|line| *line == BLOCK_SEPARATOR)
            .count();
        assert_eq!(separators, 6);
    }
}
