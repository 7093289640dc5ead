/*!
 * Syscalls Module
 * Raw mailbox syscall boundary: argument decoding, dispatch and errno mapping
 */

pub mod errno;
mod handler;
mod types;

// Re-export public API
pub use handler::{MailboxHandler, SyscallHandler, SyscallTable};
pub use types::{
    MailboxSyscall, SyscallResult, SYS_DEREGISTER, SYS_RECEIVE, SYS_REGISTER, SYS_SEND,
};
