/*!
 * Error Types
 * Centralized error handling with thiserror and miette
 */

use miette::Diagnostic;
use thiserror::Error;

// Re-export MailboxError from mailbox module
pub use crate::mailbox::MailboxError;

/// Unified kernel error type with miette diagnostics
#[derive(Error, Debug, Diagnostic)]
pub enum KernelError {
    #[error("Mailbox error: {0}")]
    #[diagnostic(transparent)]
    Mailbox(#[from] MailboxError),

    #[error("Configuration error: {0}")]
    #[diagnostic(
        code(kernel::configuration_error),
        help("Invalid configuration. Review the MAILBOX_* environment variables.")
    )]
    Configuration(String),

    #[error("I/O error: {0}")]
    #[diagnostic(code(kernel::io_error))]
    Io(String),

    #[error("Internal error: {0}")]
    #[diagnostic(
        code(kernel::internal_error),
        help("An unexpected internal error occurred. Please report this issue.")
    )]
    Internal(String),
}

impl From<std::io::Error> for KernelError {
    fn from(err: std::io::Error) -> Self {
        KernelError::Io(err.to_string())
    }
}

impl From<&str> for KernelError {
    fn from(msg: &str) -> Self {
        KernelError::Internal(msg.into())
    }
}
