//! Basic trace logging usage example
//!
//! This example demonstrates wiring the Serval trace logging core: a
//! listener registry, the structured-logging forwarder, and the in-memory
//! retention buffer.
//!
//! Run with: cargo run --example basic_usage

use std::sync::Arc;
use std::time::Duration;

use serval_telemetry::{
    Failure, FailureNotice, MemorySink, ServiceFault, TraceConfig, TraceLogger, TraceRegistry,
    TraceSeverity, TracingSink, TransportFault,
};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    println!("🚀 Starting Serval trace logging example");

    // Configure the trace source
    let mut config = TraceConfig::default();
    config.min_severity = TraceSeverity::Verbose;
    config.retention.enabled = true;
    config.retention.window_secs = 300;
    config.validate()?;

    // Register listeners before traffic begins
    let registry = Arc::new(TraceRegistry::from_config(&config));
    registry.register_listener("tracing", Arc::new(TracingSink::new()))?;
    let memory = Arc::new(MemorySink::new());
    registry.register_listener("memory", memory.clone())?;

    let logger = TraceLogger::with_config(registry.clone(), &config);

    println!("✅ Registry wired with {} listeners", registry.listener_count());

    // Plain logging
    logger.log("Client session opened");
    logger.log_at("Replica map refreshed", TraceSeverity::Verbose);

    // Retry notices as reported by the retry scheduler
    logger.log_retry(0, Some("ReadDocument"), Duration::ZERO, false, false, "n/a");
    logger.log_retry(
        2,
        Some("ReadDocument"),
        Duration::from_millis(250),
        false,
        true,
        "n/a",
    );

    // A transport fault with a structured JSON error body
    let fault = TransportFault::new(503, "Service Unavailable")
        .with_correlation_id("corr-7781")
        .with_body(
            r#"{"error": {
                "message": "Gateway rejected the request",
                "innererror": {"message": "Replica quorum not met"}
            }}"#,
        );
    logger.log_request_failure(
        Some("UpsertDocument"),
        &Failure::from(fault),
        "phase=send",
        "unnamed-request",
    );

    // A terminal failure notice with full request identity
    let notice = FailureNotice {
        request_name: Some("ReplaceDocument".to_string()),
        fallback_label: "unnamed-request".to_string(),
        tracking_id: "req-20260806-0042".to_string(),
        session_id: Some("session-17".to_string()),
        lock_wait: Duration::from_millis(12),
        elapsed: Duration::from_millis(840),
        context: "phase=commit".to_string(),
        is_terminal: true,
        ..FailureNotice::default()
    };
    let chain = Failure::from(ServiceFault::new("Write conflict", "1205").with_inner(
        ServiceFault::new("Partition moved during commit", "1008"),
    ));
    logger.log_failure(&notice, &chain);

    println!("\n📋 Condensed last error:\n{}", logger.last_error());

    println!("\n📋 Retained log lines:");
    for record in logger.cached_records() {
        let first_line = record.line.lines().next().unwrap_or_default();
        println!("  {} {}", record.timestamp.format("%H:%M:%S"), first_line);
    }

    // Explicit teardown once traffic stops
    registry.close_listeners();
    println!("\n✅ Listeners closed");
    Ok(())
}
