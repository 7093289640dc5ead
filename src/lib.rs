/*!
 * Rank Mailbox Kernel Library
 * Rank-addressed mailbox IPC: register, send, receive with timeout
 */

pub mod core;
pub mod mailbox;
pub mod monitoring;
pub mod syscalls;

// Re-exports
pub use crate::core::{KernelError, KernelResult, MailboxConfig, Pid, Rank, TruncationPolicy};
pub use mailbox::{
    MailboxError, MailboxResult, MailboxService, MailboxStats, Message, ReceiveTimeout, Received,
    ServiceStats, SourceFilter,
};
pub use monitoring::init_tracing;
pub use syscalls::{MailboxSyscall, SyscallResult, SyscallTable};
