/*!
 * Mailbox Store
 * One bounded mailbox per registered rank
 */

use super::queue::Mailbox;
use super::types::{MailboxError, MailboxResult, MailboxStats, Message, SourceFilter};
use crate::core::types::{Rank, Size};
use ahash::RandomState;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::debug;

/// Sharded map of rank mailboxes
///
/// Mailboxes are created and removed only by the rank registry, while it
/// holds its write lock. Lookups never block other ranks' traffic.
#[derive(Clone)]
pub struct MailboxStore {
    mailboxes: Arc<DashMap<Rank, Arc<Mailbox>, RandomState>>,
    capacity: Size,
}

impl MailboxStore {
    pub fn new(capacity: Size) -> Self {
        Self {
            mailboxes: Arc::new(DashMap::with_hasher(RandomState::new())),
            capacity,
        }
    }

    /// Per-mailbox message capacity
    #[inline]
    pub fn capacity(&self) -> Size {
        self.capacity
    }

    pub(super) fn create(&self, rank: Rank) -> Arc<Mailbox> {
        let mailbox = Arc::new(Mailbox::new(rank, self.capacity));
        self.mailboxes.insert(rank, Arc::clone(&mailbox));
        mailbox
    }

    /// Remove and close a mailbox, returning how many messages were dropped
    pub(super) fn remove(&self, rank: Rank) -> Option<Size> {
        self.mailboxes.remove(&rank).map(|(_, mailbox)| {
            let dropped = mailbox.close();
            debug!(rank, dropped, "mailbox removed");
            dropped
        })
    }

    pub fn get(&self, rank: Rank) -> Option<Arc<Mailbox>> {
        // Clone out of the shard so no DashMap guard outlives this call
        self.mailboxes.get(&rank).map(|m| Arc::clone(m.value()))
    }

    pub fn contains(&self, rank: Rank) -> bool {
        self.mailboxes.contains_key(&rank)
    }

    /// Append a message to `destination`'s mailbox
    pub fn enqueue(&self, destination: Rank, message: Message) -> MailboxResult<()> {
        let mailbox = self
            .get(destination)
            .ok_or(MailboxError::UnknownRank(destination))?;
        mailbox.push(message)
    }

    /// Single non-blocking dequeue attempt against `rank`'s mailbox
    pub fn dequeue(
        &self,
        rank: Rank,
        filter: SourceFilter,
        limit: Option<Size>,
    ) -> MailboxResult<Option<Message>> {
        let mailbox = self.get(rank).ok_or(MailboxError::UnknownRank(rank))?;
        mailbox.take(filter, limit)
    }

    /// Drop messages a previous owner of `sender` left in any mailbox
    pub(super) fn purge_from(&self, sender: Rank) -> Size {
        let mailboxes: Vec<Arc<Mailbox>> =
            self.mailboxes.iter().map(|m| Arc::clone(m.value())).collect();
        let purged: Size = mailboxes.iter().map(|m| m.purge_from(sender)).sum();
        if purged > 0 {
            debug!(sender, purged, "stale messages purged");
        }
        purged
    }

    /// Wake every parked receiver so it re-checks its source
    pub fn notify_all(&self) {
        let mailboxes: Vec<Arc<Mailbox>> =
            self.mailboxes.iter().map(|m| Arc::clone(m.value())).collect();
        for mailbox in mailboxes {
            mailbox.notify();
        }
    }

    pub fn stats(&self, rank: Rank) -> MailboxResult<MailboxStats> {
        self.get(rank)
            .map(|m| m.stats())
            .ok_or(MailboxError::UnknownRank(rank))
    }

    /// Total pending messages across all mailboxes
    pub fn pending_messages(&self) -> Size {
        self.mailboxes.iter().map(|m| m.value().len()).sum()
    }

    pub fn len(&self) -> Size {
        self.mailboxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mailboxes.is_empty()
    }
}
