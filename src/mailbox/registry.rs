/*!
 * Rank Registry
 * Assigns ranks to processes and owns mailbox lifecycle
 */

use super::store::MailboxStore;
use super::types::{MailboxError, MailboxResult};
use crate::core::types::{Pid, Rank, Size};
use ahash::RandomState;
use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use tracing::info;

#[derive(Default)]
struct RegistryState {
    by_pid: HashMap<Pid, Rank, RandomState>,
    owners: BTreeMap<Rank, Pid>,
    /// Released ranks below `next`
    free: BTreeSet<Rank>,
    next: Rank,
}

impl RegistryState {
    /// Lowest free rank
    fn allocate(&mut self) -> Rank {
        if let Some(rank) = self.free.pop_first() {
            return rank;
        }
        let rank = self.next;
        self.next += 1;
        rank
    }

    fn release(&mut self, rank: Rank) {
        if rank + 1 == self.next {
            self.next = rank;
            // Fold trailing free ranks back into `next`
            while let Some(&last) = self.free.last() {
                if last + 1 != self.next {
                    break;
                }
                self.free.remove(&last);
                self.next = last;
            }
        } else {
            self.free.insert(rank);
        }
    }
}

/// Registry of active ranks
///
/// Register and deregister hold the write lock while the matching mailbox is
/// created or removed, so a rank has a mailbox exactly while it has an owner.
#[derive(Clone)]
pub struct RankRegistry {
    state: Arc<RwLock<RegistryState>>,
    store: MailboxStore,
    max_ranks: Size,
}

impl RankRegistry {
    pub fn new(store: MailboxStore, max_ranks: Size) -> Self {
        Self {
            state: Arc::new(RwLock::new(RegistryState::default())),
            store,
            max_ranks,
        }
    }

    /// Register `pid` and create its mailbox
    pub fn register(&self, pid: Pid) -> MailboxResult<Rank> {
        let mut state = self.state.write();

        if let Some(&rank) = state.by_pid.get(&pid) {
            return Err(MailboxError::AlreadyRegistered { pid, rank });
        }
        if state.owners.len() >= self.max_ranks {
            return Err(MailboxError::ResourceExhausted {
                max_ranks: self.max_ranks,
            });
        }

        let rank = state.allocate();
        state.by_pid.insert(pid, rank);
        state.owners.insert(rank, pid);
        // Leftovers from the rank's previous owner must not look like ours
        self.store.purge_from(rank);
        self.store.create(rank);

        info!(pid, rank, active = state.owners.len(), "process registered");
        Ok(rank)
    }

    /// Release `pid`'s rank and drop its mailbox
    pub fn deregister(&self, pid: Pid) -> MailboxResult<Rank> {
        let (rank, dropped) = {
            let mut state = self.state.write();
            let rank = state
                .by_pid
                .remove(&pid)
                .ok_or(MailboxError::NotRegistered(pid))?;
            state.owners.remove(&rank);
            state.release(rank);
            (rank, self.store.remove(rank).unwrap_or(0))
        };

        // Receivers waiting on this rank as a source must re-check it
        self.store.notify_all();

        info!(pid, rank, dropped, "process deregistered");
        Ok(rank)
    }

    pub fn rank_of(&self, pid: Pid) -> MailboxResult<Rank> {
        self.state
            .read()
            .by_pid
            .get(&pid)
            .copied()
            .ok_or(MailboxError::NotRegistered(pid))
    }

    pub fn owner_of(&self, rank: Rank) -> Option<Pid> {
        self.state.read().owners.get(&rank).copied()
    }

    pub fn is_active(&self, rank: Rank) -> bool {
        self.state.read().owners.contains_key(&rank)
    }

    /// Active ranks in ascending order
    pub fn active_ranks(&self) -> Vec<Rank> {
        self.state.read().owners.keys().copied().collect()
    }

    #[inline]
    pub fn max_ranks(&self) -> Size {
        self.max_ranks
    }

    pub fn len(&self) -> Size {
        self.state.read().owners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
