/*!
 * Tracing
 * Structured tracing for mailbox syscalls using the tracing crate
 */

use crate::core::limits::SLOW_SYSCALL_THRESHOLD_MS;
use crate::core::types::Pid;
use std::time::Instant;
use tracing::{debug, info, span, warn, Level};
use tracing_subscriber::{fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

/// Initialize structured tracing
///
/// Environment variables:
/// - RUST_LOG: Set log level (default: info)
/// - MAILBOX_TRACE_JSON: Enable JSON output (default: false)
///
/// Safe to call more than once; later calls leave the first subscriber in place.
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let use_json = std::env::var("MAILBOX_TRACE_JSON")
        .map(|v| v == "1" || v == "true")
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(env_filter);

    let installed = if use_json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_span_events(FmtSpan::CLOSE),
            )
            .try_init()
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_thread_names(true)
                    .compact(),
            )
            .try_init()
    };

    if installed.is_ok() {
        info!(json = use_json, "Structured tracing initialized");
    }
}

/// Generate a unique trace ID for request correlation
pub fn generate_trace_id() -> String {
    Uuid::new_v4().to_string()
}

/// Span covering a single syscall from dispatch to result
pub struct SyscallSpan {
    span: tracing::Span,
    start: Instant,
    syscall_name: &'static str,
    trace_id: String,
}

impl SyscallSpan {
    pub fn new(syscall_name: &'static str, pid: Pid) -> Self {
        let trace_id = generate_trace_id();

        let span = span!(
            Level::DEBUG,
            "syscall",
            trace_id = %trace_id,
            syscall = syscall_name,
            pid = pid,
            result = tracing::field::Empty,
            errno = tracing::field::Empty,
        );

        Self {
            span,
            start: Instant::now(),
            syscall_name,
            trace_id,
        }
    }

    pub fn trace_id(&self) -> &str {
        &self.trace_id
    }

    /// Enter the span context
    pub fn enter(&self) -> tracing::span::Entered<'_> {
        self.span.enter()
    }

    pub fn record_success(&self) {
        self.span.record("result", "success");
    }

    pub fn record_errno(&self, errno: i32) {
        self.span.record("result", "error");
        self.span.record("errno", errno);
    }
}

impl Drop for SyscallSpan {
    fn drop(&mut self) {
        let duration = self.start.elapsed();
        let _entered = self.span.enter();

        // Blocking receives are expected to be slow
        if duration.as_millis() > SLOW_SYSCALL_THRESHOLD_MS && self.syscall_name != "receive" {
            warn!(
                trace_id = %self.trace_id,
                syscall = self.syscall_name,
                duration_ms = duration.as_millis() as u64,
                slow = true,
                "slow syscall detected"
            );
        } else {
            debug!(
                trace_id = %self.trace_id,
                syscall = self.syscall_name,
                duration_us = duration.as_micros() as u64,
                "syscall completed"
            );
        }
    }
}
