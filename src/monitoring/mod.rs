/*!
 * Monitoring Module
 * Structured tracing for the mailbox service
 */

pub mod tracer;

pub use tracer::{generate_trace_id, init_tracing, SyscallSpan};
