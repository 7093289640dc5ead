/*!
 * Core Module
 * Fundamental kernel types, limits, configuration and error handling
 */

pub mod config;
pub mod errors;
pub mod limits;
pub mod sync;
pub mod types;

// Re-export for convenience
pub use config::{MailboxConfig, TruncationPolicy};
pub use errors::*;
pub use types::*;
