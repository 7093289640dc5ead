/*!
 * Syscall Handler Trait
 * Handler interface, the mailbox handler and the dispatch table
 */

use super::errno::{errno_name, ENOSYS};
use super::types::{MailboxSyscall, SyscallResult};
use crate::core::limits::ANY_SOURCE;
use crate::core::types::{Pid, Rank, Size};
use crate::mailbox::{MailboxError, MailboxResult, MailboxService, ReceiveTimeout, SourceFilter};
use crate::monitoring::SyscallSpan;
use std::sync::Arc;
use tracing::{debug, warn};

/// Trait for handling individual syscalls
pub trait SyscallHandler: Send + Sync {
    /// Handle a syscall, or return `None` if it is not ours
    fn handle(&self, pid: Pid, syscall: &MailboxSyscall) -> Option<SyscallResult>;

    /// Get the name of this handler (for logging/debugging)
    fn name(&self) -> &'static str;
}

/// Decodes raw syscall arguments and calls into the mailbox service
pub struct MailboxHandler {
    service: MailboxService,
}

impl MailboxHandler {
    #[inline]
    pub fn new(service: MailboxService) -> Self {
        Self { service }
    }

    fn register(&self, pid: Pid) -> MailboxResult<SyscallResult> {
        let rank = self.service.register(pid)?;
        Ok(SyscallResult::success(i64::from(rank)))
    }

    fn deregister(&self, pid: Pid) -> MailboxResult<SyscallResult> {
        let rank = self.service.deregister(pid)?;
        Ok(SyscallResult::success(i64::from(rank)))
    }

    fn send(&self, pid: Pid, rank: i32, data: &[u8], size: i64) -> MailboxResult<SyscallResult> {
        let destination = decode_rank(rank)?;
        let size = decode_size(size, "message size")?;
        let sent = self.service.send(pid, destination, data, size)?;
        Ok(SyscallResult::success(sent as i64))
    }

    fn receive(
        &self,
        pid: Pid,
        rank: i32,
        timeout: i64,
        capacity: i64,
    ) -> MailboxResult<SyscallResult> {
        let source = decode_source(rank)?;
        let timeout = ReceiveTimeout::from_secs(timeout)?;
        let capacity = decode_size(capacity, "buffer size")?;

        // No message is longer than the configured maximum
        let mut buffer = vec![0u8; capacity.min(self.service.config().max_message_size)];
        let received = self.service.receive(pid, source, timeout, &mut buffer)?;
        buffer.truncate(received.copied);

        Ok(SyscallResult::received(
            received.len as i64,
            buffer,
            received.sender,
        ))
    }
}

impl SyscallHandler for MailboxHandler {
    fn handle(&self, pid: Pid, syscall: &MailboxSyscall) -> Option<SyscallResult> {
        let result = match syscall {
            MailboxSyscall::Register => self.register(pid),
            MailboxSyscall::Send {
                rank,
                data,
                size,
            } => self.send(pid, *rank, data, *size),
            MailboxSyscall::Receive {
                rank,
                timeout,
                capacity,
            } => self.receive(pid, *rank, *timeout, *capacity),
            MailboxSyscall::Deregister => self.deregister(pid),
        };
        Some(result.unwrap_or_else(SyscallResult::from))
    }

    fn name(&self) -> &'static str {
        "mailbox_handler"
    }
}

fn decode_rank(rank: i32) -> MailboxResult<Rank> {
    Rank::try_from(rank)
        .map_err(|_| MailboxError::invalid_argument(format!("negative rank {}", rank)))
}

fn decode_source(rank: i32) -> MailboxResult<SourceFilter> {
    if rank == ANY_SOURCE {
        Ok(SourceFilter::Any)
    } else {
        decode_rank(rank).map(SourceFilter::Rank)
    }
}

fn decode_size(size: i64, what: &str) -> MailboxResult<Size> {
    match Size::try_from(size) {
        Ok(size) if size > 0 => Ok(size),
        _ => Err(MailboxError::invalid_argument(format!(
            "{} must be at least 1, got {}",
            what, size
        ))),
    }
}

/// Syscall dispatch table
///
/// Handlers are consulted in registration order; the first to claim a
/// syscall produces its result.
#[derive(Clone)]
pub struct SyscallTable {
    handlers: Arc<Vec<Arc<dyn SyscallHandler>>>,
}

impl SyscallTable {
    pub fn new() -> Self {
        Self {
            handlers: Arc::new(Vec::new()),
        }
    }

    /// Table with the mailbox handler installed
    pub fn with_service(service: MailboxService) -> Self {
        Self::new().register(Arc::new(MailboxHandler::new(service)))
    }

    pub fn register(mut self, handler: Arc<dyn SyscallHandler>) -> Self {
        Arc::make_mut(&mut self.handlers).push(handler);
        self
    }

    /// Dispatch a syscall; unclaimed syscalls fail with `ENOSYS`
    pub fn dispatch(&self, pid: Pid, syscall: &MailboxSyscall) -> SyscallResult {
        let span = SyscallSpan::new(syscall.name(), pid);
        let _entered = span.enter();

        let result = self
            .handlers
            .iter()
            .find_map(|handler| handler.handle(pid, syscall))
            .unwrap_or_else(|| {
                warn!(pid, number = syscall.number(), "no handler for syscall");
                SyscallResult::error(ENOSYS, "not_implemented", "syscall not implemented")
            });

        match result.errno() {
            None => span.record_success(),
            Some(errno) => {
                span.record_errno(errno);
                debug!(pid, errno = errno_name(errno), "syscall failed");
            }
        }
        result
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }
}

impl Default for SyscallTable {
    fn default() -> Self {
        Self::new()
    }
}
