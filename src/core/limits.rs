/*!
 * System Limits and Constants
 *
 * Centralized location for the mailbox service's limits and defaults.
 * Runtime overrides go through [`crate::core::config::MailboxConfig`].
 */

// =============================================================================
// RANK REGISTRY
// =============================================================================

/// Default number of ranks that may be registered at the same time
pub const DEFAULT_MAX_RANKS: usize = 256;

/// Hard ceiling for `max_ranks`
/// Ranks are handed out over the `i32` syscall ABI
pub const MAX_RANKS_LIMIT: usize = 65_536;

// =============================================================================
// MAILBOXES
// =============================================================================

/// Default pending-message capacity per mailbox
pub const DEFAULT_MAILBOX_CAPACITY: usize = 1024;

/// Hard ceiling for per-mailbox capacity
pub const MAX_MAILBOX_CAPACITY: usize = 1_000_000;

/// Default maximum payload size (4KB)
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 4 * 1024;

/// Hard ceiling for payload size (1MB)
pub const MAX_MESSAGE_SIZE_LIMIT: usize = 1024 * 1024;

// =============================================================================
// SYSCALL ABI
// =============================================================================

/// Wildcard source rank accepted by `receive`
pub const ANY_SOURCE: i32 = -1;

/// Timeout value that blocks until a message arrives
pub const WAIT_FOREVER: i64 = -1;

/// Syscalls slower than this are reported at `warn` level
pub const SLOW_SYSCALL_THRESHOLD_MS: u128 = 10;
