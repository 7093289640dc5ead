/*!
 * Delivery Engine
 * Send and timeout-aware receive against the mailbox store
 */

use super::registry::RankRegistry;
use super::store::MailboxStore;
use super::types::{MailboxError, MailboxResult, Message, Received, SourceFilter};
use crate::core::config::{MailboxConfig, TruncationPolicy};
use crate::core::limits::WAIT_FOREVER;
use crate::core::sync::WaitError;
use crate::core::types::{Pid, Rank, Size};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// How long a receive may wait for a matching message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiveTimeout {
    /// Single attempt, fail immediately when nothing matches
    Poll,
    /// Wait up to the given duration
    After(Duration),
    /// Block until a matching message arrives
    Infinite,
}

impl ReceiveTimeout {
    /// Decode the syscall ABI encoding: `0` polls, `> 0` is seconds,
    /// `-1` waits forever
    pub fn from_secs(secs: i64) -> MailboxResult<Self> {
        match secs {
            0 => Ok(Self::Poll),
            WAIT_FOREVER => Ok(Self::Infinite),
            s if s > 0 => Ok(Self::After(Duration::from_secs(s as u64))),
            s => Err(MailboxError::invalid_argument(format!(
                "negative timeout {}s",
                s
            ))),
        }
    }

    /// Total wait budget (`None` means unbounded)
    pub fn duration(&self) -> Option<Duration> {
        match self {
            Self::Poll => Some(Duration::ZERO),
            Self::After(d) => Some(*d),
            Self::Infinite => None,
        }
    }

    /// Budget left since `start` (`None` means unbounded)
    pub fn remaining(&self, start: Instant) -> Option<Duration> {
        self.duration().map(|d| d.saturating_sub(start.elapsed()))
    }
}

impl From<Duration> for ReceiveTimeout {
    fn from(d: Duration) -> Self {
        if d.is_zero() {
            Self::Poll
        } else {
            Self::After(d)
        }
    }
}

/// Delivery counters
#[derive(Debug, Default)]
pub(super) struct DeliveryCounters {
    pub sent: AtomicU64,
    pub received: AtomicU64,
    pub bytes_sent: AtomicU64,
    pub rejected_full: AtomicU64,
    pub timeouts: AtomicU64,
}

/// Snapshot of [`DeliveryCounters`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryStats {
    pub sent: u64,
    pub received: u64,
    pub bytes_sent: u64,
    pub rejected_full: u64,
    pub timeouts: u64,
}

/// Send/receive engine shared by every caller
#[derive(Clone)]
pub struct DeliveryEngine {
    registry: RankRegistry,
    store: MailboxStore,
    config: Arc<MailboxConfig>,
    next_seq: Arc<AtomicU64>,
    counters: Arc<DeliveryCounters>,
}

impl DeliveryEngine {
    pub fn new(registry: RankRegistry, store: MailboxStore, config: Arc<MailboxConfig>) -> Self {
        Self {
            registry,
            store,
            config,
            next_seq: Arc::new(AtomicU64::new(1)),
            counters: Arc::new(DeliveryCounters::default()),
        }
    }

    /// Send the first `size` bytes of `data` from `pid` to `destination`
    ///
    /// Single best-effort attempt; returns the number of bytes queued.
    pub fn send(&self, pid: Pid, destination: Rank, data: &[u8], size: Size) -> MailboxResult<Size> {
        let from = self.registry.rank_of(pid)?;
        self.validate_send(data, size)?;

        let message = Message::new(
            self.next_seq.fetch_add(1, Ordering::Relaxed),
            from,
            Bytes::copy_from_slice(&data[..size]),
        );
        let seq = message.seq;

        match self.store.enqueue(destination, message) {
            Ok(()) => {
                self.counters.sent.fetch_add(1, Ordering::Relaxed);
                self.counters
                    .bytes_sent
                    .fetch_add(size as u64, Ordering::Relaxed);
                debug!(from, destination, size, seq, "message queued");
                Ok(size)
            }
            Err(e) => {
                if matches!(e, MailboxError::MailboxFull { .. }) {
                    self.counters.rejected_full.fetch_add(1, Ordering::Relaxed);
                }
                warn!(from, destination, size, error = %e, "send rejected");
                Err(e)
            }
        }
    }

    fn validate_send(&self, data: &[u8], size: Size) -> MailboxResult<()> {
        if size == 0 {
            return Err(MailboxError::invalid_argument("message size must be at least 1"));
        }
        if size > data.len() {
            return Err(MailboxError::invalid_argument(format!(
                "declared size {} exceeds buffer of {} bytes",
                size,
                data.len()
            )));
        }
        if size > self.config.max_message_size {
            return Err(MailboxError::MessageTooLarge {
                size,
                max: self.config.max_message_size,
            });
        }
        Ok(())
    }

    /// Receive into `buffer`, honouring the configured truncation policy
    pub fn receive(
        &self,
        pid: Pid,
        source: SourceFilter,
        timeout: ReceiveTimeout,
        buffer: &mut [u8],
    ) -> MailboxResult<Received> {
        if buffer.is_empty() {
            return Err(MailboxError::invalid_argument("receive buffer is empty"));
        }

        let limit = match self.config.truncation {
            TruncationPolicy::Truncate => None,
            TruncationPolicy::Reject => Some(buffer.len()),
        };
        let message = self.receive_message(pid, source, timeout, limit)?;

        let copied = message.len().min(buffer.len());
        buffer[..copied].copy_from_slice(&message.payload[..copied]);

        Ok(Received {
            len: message.len(),
            copied,
            sender: message.from,
        })
    }

    /// Dequeue the next matching message for `pid`, waiting up to `timeout`
    ///
    /// Pending messages from a source that has since deregistered are still
    /// delivered; once none remain, waiting on that source fails with
    /// `UnknownRank`.
    pub fn receive_message(
        &self,
        pid: Pid,
        source: SourceFilter,
        timeout: ReceiveTimeout,
        limit: Option<Size>,
    ) -> MailboxResult<Message> {
        let rank = self.registry.rank_of(pid)?;
        let mailbox = self.store.get(rank).ok_or(MailboxError::NotRegistered(pid))?;
        let start = Instant::now();

        loop {
            let observed = mailbox.epoch();

            match mailbox.take(source, limit) {
                Ok(Some(message)) => {
                    self.counters.received.fetch_add(1, Ordering::Relaxed);
                    debug!(
                        rank,
                        from = message.from,
                        size = message.len(),
                        seq = message.seq,
                        waited_us = start.elapsed().as_micros() as u64,
                        "message delivered"
                    );
                    return Ok(message);
                }
                Ok(None) => {}
                Err(MailboxError::UnknownRank(_)) => return Err(MailboxError::NotRegistered(pid)),
                Err(e) => return Err(e),
            }

            if let SourceFilter::Rank(src) = source {
                if !self.registry.is_active(src) {
                    return Err(MailboxError::UnknownRank(src));
                }
            }

            let remaining = timeout.remaining(start);
            if remaining == Some(Duration::ZERO) {
                return Err(self.timed_out(start, timeout));
            }

            match mailbox.wait(observed, remaining) {
                Ok(()) => continue,
                Err(WaitError::Timeout) => return Err(self.timed_out(start, timeout)),
                Err(WaitError::Closed) => return Err(MailboxError::NotRegistered(pid)),
            }
        }
    }

    fn timed_out(&self, start: Instant, timeout: ReceiveTimeout) -> MailboxError {
        self.counters.timeouts.fetch_add(1, Ordering::Relaxed);
        MailboxError::TimedOut {
            elapsed_ms: start.elapsed().as_millis() as u64,
            timeout_ms: timeout.duration().map(|d| d.as_millis() as u64),
        }
    }

    pub fn stats(&self) -> DeliveryStats {
        DeliveryStats {
            sent: self.counters.sent.load(Ordering::Relaxed),
            received: self.counters.received.load(Ordering::Relaxed),
            bytes_sent: self.counters.bytes_sent.load(Ordering::Relaxed),
            rejected_full: self.counters.rejected_full.load(Ordering::Relaxed),
            timeouts: self.counters.timeouts.load(Ordering::Relaxed),
        }
    }
}
