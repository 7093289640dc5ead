/*!
 * Mailbox Configuration
 *
 * Runtime limits for the mailbox service, with defaults from
 * [`crate::core::limits`] and overrides from the environment.
 */

use super::errors::KernelError;
use super::limits::{
    DEFAULT_MAILBOX_CAPACITY, DEFAULT_MAX_MESSAGE_SIZE, DEFAULT_MAX_RANKS, MAX_MAILBOX_CAPACITY,
    MAX_MESSAGE_SIZE_LIMIT, MAX_RANKS_LIMIT,
};
use super::types::{KernelResult, Size};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// What `receive` does when a message is longer than the caller's buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TruncationPolicy {
    /// Copy the prefix that fits and report the full message length
    #[default]
    Truncate,
    /// Fail with `BufferTooSmall` and leave the message queued
    Reject,
}

impl FromStr for TruncationPolicy {
    type Err = KernelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "truncate" => Ok(Self::Truncate),
            "reject" => Ok(Self::Reject),
            other => Err(KernelError::Configuration(format!(
                "unknown truncation policy '{}' (expected: truncate, reject)",
                other
            ))),
        }
    }
}

/// Mailbox service configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct MailboxConfig {
    /// Maximum number of concurrently registered ranks
    pub max_ranks: Size,
    /// Maximum number of pending messages per mailbox
    pub mailbox_capacity: Size,
    /// Maximum payload size accepted by `send`
    pub max_message_size: Size,
    /// Oversize delivery behaviour
    pub truncation: TruncationPolicy,
}

impl Default for MailboxConfig {
    fn default() -> Self {
        Self {
            max_ranks: DEFAULT_MAX_RANKS,
            mailbox_capacity: DEFAULT_MAILBOX_CAPACITY,
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            truncation: TruncationPolicy::default(),
        }
    }
}

impl MailboxConfig {
    /// Build a configuration from defaults overridden by environment variables
    ///
    /// Environment variables:
    /// - MAILBOX_MAX_RANKS
    /// - MAILBOX_CAPACITY
    /// - MAILBOX_MAX_MESSAGE_SIZE
    /// - MAILBOX_TRUNCATION (`truncate` or `reject`)
    pub fn from_env() -> KernelResult<Self> {
        let mut config = Self::default();

        if let Some(v) = env_parse::<Size>("MAILBOX_MAX_RANKS")? {
            config.max_ranks = v;
        }
        if let Some(v) = env_parse::<Size>("MAILBOX_CAPACITY")? {
            config.mailbox_capacity = v;
        }
        if let Some(v) = env_parse::<Size>("MAILBOX_MAX_MESSAGE_SIZE")? {
            config.max_message_size = v;
        }
        if let Ok(v) = std::env::var("MAILBOX_TRUNCATION") {
            config.truncation = v.parse()?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn with_max_ranks(mut self, max_ranks: Size) -> Self {
        self.max_ranks = max_ranks;
        self
    }

    pub fn with_mailbox_capacity(mut self, capacity: Size) -> Self {
        self.mailbox_capacity = capacity;
        self
    }

    pub fn with_max_message_size(mut self, size: Size) -> Self {
        self.max_message_size = size;
        self
    }

    pub fn with_truncation(mut self, policy: TruncationPolicy) -> Self {
        self.truncation = policy;
        self
    }

    /// Check every limit is non-zero and within its hard ceiling
    pub fn validate(&self) -> KernelResult<()> {
        check_range("max_ranks", self.max_ranks, MAX_RANKS_LIMIT)?;
        check_range("mailbox_capacity", self.mailbox_capacity, MAX_MAILBOX_CAPACITY)?;
        check_range("max_message_size", self.max_message_size, MAX_MESSAGE_SIZE_LIMIT)?;
        Ok(())
    }
}

fn check_range(name: &str, value: Size, max: Size) -> KernelResult<()> {
    if value == 0 || value > max {
        return Err(KernelError::Configuration(format!(
            "{} must be in 1..={} (got {})",
            name, max, value
        )));
    }
    Ok(())
}

fn env_parse<T: FromStr>(key: &str) -> KernelResult<Option<T>>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| KernelError::Configuration(format!("{}: {}", key, e))),
        Err(_) => Ok(None),
    }
}
