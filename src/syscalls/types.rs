/*!
 * Syscall Types
 * Mailbox syscall enum and result types
 */

use super::errno::errno_of;
use crate::core::types::Rank;
use crate::mailbox::MailboxError;
use serde::{Deserialize, Serialize};

pub const SYS_REGISTER: u32 = 243;
pub const SYS_SEND: u32 = 244;
pub const SYS_RECEIVE: u32 = 245;
pub const SYS_DEREGISTER: u32 = 246;

/// Mailbox syscalls with raw ABI arguments
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "syscall", rename_all = "snake_case")]
pub enum MailboxSyscall {
    Register,
    Send {
        rank: i32,
        data: Vec<u8>,
        size: i64,
    },
    Receive {
        /// Source rank, or `ANY_SOURCE`
        rank: i32,
        /// Seconds; `0` polls, `WAIT_FOREVER` blocks
        timeout: i64,
        /// Caller buffer size
        capacity: i64,
    },
    Deregister,
}

impl MailboxSyscall {
    /// Trap table number
    pub const fn number(&self) -> u32 {
        match self {
            Self::Register => SYS_REGISTER,
            Self::Send { .. } => SYS_SEND,
            Self::Receive { .. } => SYS_RECEIVE,
            Self::Deregister => SYS_DEREGISTER,
        }
    }

    pub const fn name(&self) -> &'static str {
        match self {
            Self::Register => "register",
            Self::Send { .. } => "send",
            Self::Receive { .. } => "receive",
            Self::Deregister => "deregister",
        }
    }
}

/// System call result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SyscallResult {
    Success {
        value: i64,
        /// Payload copied out by `receive`
        data: Option<Vec<u8>>,
        sender: Option<Rank>,
    },
    Error {
        errno: i32,
        kind: String,
        message: String,
    },
}

impl SyscallResult {
    pub fn success(value: i64) -> Self {
        Self::Success {
            value,
            data: None,
            sender: None,
        }
    }

    pub fn received(value: i64, data: Vec<u8>, sender: Rank) -> Self {
        Self::Success {
            value,
            data: Some(data),
            sender: Some(sender),
        }
    }

    pub fn error(errno: i32, kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Error {
            errno,
            kind: kind.into(),
            message: message.into(),
        }
    }

    #[inline]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn errno(&self) -> Option<i32> {
        match self {
            Self::Success { .. } => None,
            Self::Error { errno, .. } => Some(*errno),
        }
    }

    /// Raw return value: the success value or `-errno`
    pub fn to_raw(&self) -> i64 {
        match self {
            Self::Success { value, .. } => *value,
            Self::Error { errno, .. } => -i64::from(*errno),
        }
    }
}

impl From<MailboxError> for SyscallResult {
    fn from(err: MailboxError) -> Self {
        Self::error(errno_of(&err), err.kind(), err.to_string())
    }
}
