/*!
 * Core Types
 * Common types used across the kernel
 */

/// Process ID type
pub type Pid = u32;

/// Rank assigned to a registered process
pub type Rank = u32;

/// Size type for buffers and payloads
pub type Size = usize;

/// Timestamp in microseconds since the UNIX epoch
pub type Timestamp = u64;

/// Common result type for kernel operations
pub type KernelResult<T> = Result<T, super::errors::KernelError>;

/// Current wall-clock time as a [`Timestamp`]
#[inline]
#[must_use]
pub fn now_micros() -> Timestamp {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_micros() as Timestamp)
        .unwrap_or(0)
}
