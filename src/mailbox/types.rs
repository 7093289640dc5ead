/*!
 * Mailbox Types
 * Errors, messages and statistics shared by the mailbox subsystem
 */

use crate::core::types::{now_micros, Pid, Rank, Size, Timestamp};
use bytes::Bytes;
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Mailbox operation result
pub type MailboxResult<T> = Result<T, MailboxError>;

/// Caller-visible failure kinds of the mailbox service
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Diagnostic)]
#[serde(rename_all = "snake_case", tag = "error", content = "details")]
pub enum MailboxError {
    #[error("unknown rank {0}")]
    #[diagnostic(
        code(mailbox::unknown_rank),
        help("The rank is not registered. It may never have registered or may have deregistered.")
    )]
    UnknownRank(Rank),

    #[error("process {0} is not registered")]
    #[diagnostic(
        code(mailbox::not_registered),
        help("Call register before sending or receiving.")
    )]
    NotRegistered(Pid),

    #[error("process {pid} is already registered as rank {rank}")]
    #[diagnostic(code(mailbox::already_registered))]
    AlreadyRegistered { pid: Pid, rank: Rank },

    #[error("rank capacity exhausted ({max_ranks} ranks active)")]
    #[diagnostic(
        code(mailbox::resource_exhausted),
        help("Deregister idle processes or raise MAILBOX_MAX_RANKS.")
    )]
    ResourceExhausted { max_ranks: Size },

    #[error("mailbox of rank {rank} is full ({capacity} messages pending)")]
    #[diagnostic(
        code(mailbox::mailbox_full),
        help("The destination is not draining its mailbox. Retry later.")
    )]
    MailboxFull { rank: Rank, capacity: Size },

    #[error("message of {size} bytes exceeds the {max} byte limit")]
    #[diagnostic(code(mailbox::message_too_large))]
    MessageTooLarge { size: Size, max: Size },

    #[error("invalid argument: {0}")]
    #[diagnostic(code(mailbox::invalid_argument))]
    InvalidArgument(String),

    #[error("receive timed out after {elapsed_ms}ms (timeout: {}ms)", timeout_ms.map(|t| t.to_string()).unwrap_or_else(|| "none".to_string()))]
    #[diagnostic(
        code(mailbox::timed_out),
        help("No matching message arrived in time. Increase the timeout or check the sender.")
    )]
    TimedOut {
        elapsed_ms: u64,
        timeout_ms: Option<u64>,
    },

    #[error("buffer of {available} bytes is too small for a {required} byte message")]
    #[diagnostic(
        code(mailbox::buffer_too_small),
        help("The message is still queued. Retry with a larger buffer.")
    )]
    BufferTooSmall { required: Size, available: Size },
}

impl MailboxError {
    #[inline]
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Short stable name of the failure kind
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::UnknownRank(_) => "unknown_rank",
            Self::NotRegistered(_) => "not_registered",
            Self::AlreadyRegistered { .. } => "already_registered",
            Self::ResourceExhausted { .. } => "resource_exhausted",
            Self::MailboxFull { .. } => "mailbox_full",
            Self::MessageTooLarge { .. } => "message_too_large",
            Self::InvalidArgument(_) => "invalid_argument",
            Self::TimedOut { .. } => "timed_out",
            Self::BufferTooSmall { .. } => "buffer_too_small",
        }
    }
}

/// Which senders a receive accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceFilter {
    /// Wildcard: earliest pending message from any sender
    Any,
    /// Only messages sent by this rank
    Rank(Rank),
}

impl SourceFilter {
    #[inline(always)]
    pub fn matches(&self, sender: Rank) -> bool {
        match self {
            SourceFilter::Any => true,
            SourceFilter::Rank(rank) => *rank == sender,
        }
    }
}

impl From<Rank> for SourceFilter {
    fn from(rank: Rank) -> Self {
        SourceFilter::Rank(rank)
    }
}

/// A queued message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Service-wide arrival sequence number
    pub seq: u64,
    pub from: Rank,
    pub payload: Bytes,
    pub sent_at: Timestamp,
}

impl Message {
    #[inline]
    #[must_use]
    pub fn new(seq: u64, from: Rank, payload: Bytes) -> Self {
        Self {
            seq,
            from,
            payload,
            sent_at: now_micros(),
        }
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}

/// Outcome of a successful receive into a caller buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Received {
    /// Full length of the delivered message
    pub len: Size,
    /// Bytes actually copied into the buffer
    pub copied: Size,
    pub sender: Rank,
}

impl Received {
    #[inline]
    pub fn truncated(&self) -> bool {
        self.copied < self.len
    }
}

/// Per-mailbox statistics
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailboxStats {
    pub rank: Rank,
    pub length: Size,
    pub capacity: Size,
    pub waiters: Size,
}

/// Service-wide statistics snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ServiceStats {
    pub active_ranks: Size,
    pub pending_messages: Size,
    pub messages_sent: u64,
    pub messages_received: u64,
    pub bytes_sent: u64,
    pub rejected_full: u64,
    pub timeouts: u64,
}
