/*!
 * Mailbox Queue
 * Bounded arrival-ordered message queue owned by one rank
 */

use super::types::{MailboxError, MailboxResult, MailboxStats, Message, SourceFilter};
use crate::core::sync::{Epoch, WaitQueue, WaitResult};
use crate::core::types::{Rank, Size};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::time::Duration;

struct QueueState {
    messages: VecDeque<Message>,
    closed: bool,
}

/// Per-rank mailbox
///
/// All mutation happens under the mailbox's own lock. Waiters park on
/// `arrivals`, which is advanced after every successful push.
pub struct Mailbox {
    rank: Rank,
    capacity: Size,
    state: Mutex<QueueState>,
    arrivals: WaitQueue,
}

impl Mailbox {
    pub fn new(rank: Rank, capacity: Size) -> Self {
        Self {
            rank,
            capacity,
            state: Mutex::new(QueueState {
                messages: VecDeque::new(),
                closed: false,
            }),
            arrivals: WaitQueue::new(),
        }
    }

    #[inline]
    pub fn rank(&self) -> Rank {
        self.rank
    }

    #[inline]
    pub fn capacity(&self) -> Size {
        self.capacity
    }

    /// Append a message; fails instead of blocking when full
    pub fn push(&self, message: Message) -> MailboxResult<()> {
        {
            let mut state = self.state.lock();
            if state.closed {
                return Err(MailboxError::UnknownRank(self.rank));
            }
            if state.messages.len() >= self.capacity {
                return Err(MailboxError::MailboxFull {
                    rank: self.rank,
                    capacity: self.capacity,
                });
            }
            state.messages.push_back(message);
        }
        self.arrivals.wake_all();
        Ok(())
    }

    /// Remove the oldest message matching `filter`
    ///
    /// With `limit` set, a matching message longer than `limit` is left in
    /// place and reported as `BufferTooSmall`.
    pub fn take(&self, filter: SourceFilter, limit: Option<Size>) -> MailboxResult<Option<Message>> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(MailboxError::UnknownRank(self.rank));
        }

        let index = match filter {
            SourceFilter::Any => (!state.messages.is_empty()).then_some(0),
            SourceFilter::Rank(_) => state.messages.iter().position(|m| filter.matches(m.from)),
        };
        let Some(index) = index else {
            return Ok(None);
        };

        if let Some(limit) = limit {
            let required = state.messages[index].len();
            if required > limit {
                return Err(MailboxError::BufferTooSmall {
                    required,
                    available: limit,
                });
            }
        }

        Ok(state.messages.remove(index))
    }

    /// Drop every pending message sent by `sender`; returns how many
    pub fn purge_from(&self, sender: Rank) -> Size {
        let mut state = self.state.lock();
        let before = state.messages.len();
        state.messages.retain(|m| m.from != sender);
        before - state.messages.len()
    }

    /// Snapshot the arrival counter; take it before checking the queue
    #[inline]
    pub fn epoch(&self) -> Epoch {
        self.arrivals.epoch()
    }

    /// Park until something arrives after `observed`
    #[inline]
    pub fn wait(&self, observed: Epoch, timeout: Option<Duration>) -> WaitResult<()> {
        self.arrivals.wait(observed, timeout)
    }

    /// Wake waiters without enqueuing (used when a source rank goes away)
    #[inline]
    pub fn notify(&self) {
        self.arrivals.wake_all();
    }

    /// Close the mailbox, drop pending messages and release waiters
    pub fn close(&self) -> Size {
        let dropped = {
            let mut state = self.state.lock();
            state.closed = true;
            let dropped = state.messages.len();
            state.messages.clear();
            dropped
        };
        self.arrivals.close();
        dropped
    }

    pub fn len(&self) -> Size {
        self.state.lock().messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> MailboxStats {
        MailboxStats {
            rank: self.rank,
            length: self.len(),
            capacity: self.capacity,
            waiters: self.arrivals.waiter_count(),
        }
    }
}
