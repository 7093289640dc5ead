/*!
 * Mailbox Service
 * Caller-facing entry point tying registry, store and delivery together
 */

use super::delivery::{DeliveryEngine, ReceiveTimeout};
use super::registry::RankRegistry;
use super::store::MailboxStore;
use super::types::{MailboxResult, MailboxStats, Message, Received, ServiceStats, SourceFilter};
use crate::core::config::MailboxConfig;
use crate::core::errors::KernelError;
use crate::core::types::{KernelResult, Pid, Rank, Size};
use std::sync::Arc;
use tracing::{info, instrument};

/// Mailbox service handle
///
/// Cheap to clone; every clone shares the same registry and mailboxes.
#[derive(Clone)]
pub struct MailboxService {
    config: Arc<MailboxConfig>,
    registry: RankRegistry,
    store: MailboxStore,
    engine: DeliveryEngine,
}

impl MailboxService {
    /// Create a service after validating `config`
    pub fn new(config: MailboxConfig) -> KernelResult<Self> {
        config.validate()?;
        let service = Self::build(Arc::new(config));

        info!(
            max_ranks = service.config.max_ranks,
            mailbox_capacity = service.config.mailbox_capacity,
            max_message_size = service.config.max_message_size,
            truncation = ?service.config.truncation,
            "Mailbox service initialized"
        );
        Ok(service)
    }

    /// Create a service with default limits
    pub fn with_defaults() -> Self {
        Self::build(Arc::new(MailboxConfig::default()))
    }

    fn build(config: Arc<MailboxConfig>) -> Self {
        let store = MailboxStore::new(config.mailbox_capacity);
        let registry = RankRegistry::new(store.clone(), config.max_ranks);
        let engine = DeliveryEngine::new(registry.clone(), store.clone(), Arc::clone(&config));
        Self {
            config,
            registry,
            store,
            engine,
        }
    }

    #[inline]
    pub fn config(&self) -> &MailboxConfig {
        &self.config
    }

    /// Register the calling process; returns its new rank
    #[instrument(level = "debug", skip(self))]
    pub fn register(&self, pid: Pid) -> MailboxResult<Rank> {
        self.registry.register(pid)
    }

    /// Release the calling process's rank and drop its pending messages
    #[instrument(level = "debug", skip(self))]
    pub fn deregister(&self, pid: Pid) -> MailboxResult<Rank> {
        self.registry.deregister(pid)
    }

    /// Send `data[..size]` to `destination`; returns bytes sent
    #[instrument(level = "debug", skip(self, data), fields(len = data.len()))]
    pub fn send(&self, pid: Pid, destination: Rank, data: &[u8], size: Size) -> MailboxResult<Size> {
        self.engine.send(pid, destination, data, size)
    }

    /// Receive the next message from `source` into `buffer`
    #[instrument(level = "debug", skip(self, buffer), fields(capacity = buffer.len()))]
    pub fn receive(
        &self,
        pid: Pid,
        source: SourceFilter,
        timeout: ReceiveTimeout,
        buffer: &mut [u8],
    ) -> MailboxResult<Received> {
        self.engine.receive(pid, source, timeout, buffer)
    }

    /// Async receive returning the owned message
    ///
    /// The wait runs on tokio's blocking pool so runtime workers stay free.
    /// `limit` rejects messages longer than it with `BufferTooSmall`,
    /// leaving them queued.
    pub async fn receive_async(
        &self,
        pid: Pid,
        source: SourceFilter,
        timeout: ReceiveTimeout,
        limit: Option<Size>,
    ) -> KernelResult<Message> {
        let engine = self.engine.clone();
        let message = tokio::task::spawn_blocking(move || {
            engine.receive_message(pid, source, timeout, limit)
        })
        .await
        .map_err(|e| KernelError::Internal(format!("receive task failed: {}", e)))??;
        Ok(message)
    }

    pub fn rank_of(&self, pid: Pid) -> MailboxResult<Rank> {
        self.registry.rank_of(pid)
    }

    pub fn active_ranks(&self) -> Vec<Rank> {
        self.registry.active_ranks()
    }

    pub fn mailbox_stats(&self, rank: Rank) -> MailboxResult<MailboxStats> {
        self.store.stats(rank)
    }

    pub fn stats(&self) -> ServiceStats {
        let delivery = self.engine.stats();
        ServiceStats {
            active_ranks: self.registry.len(),
            pending_messages: self.store.pending_messages(),
            messages_sent: delivery.sent,
            messages_received: delivery.received,
            bytes_sent: delivery.bytes_sent,
            rejected_full: delivery.rejected_full,
            timeouts: delivery.timeouts,
        }
    }
}

impl Default for MailboxService {
    fn default() -> Self {
        Self::with_defaults()
    }
}
