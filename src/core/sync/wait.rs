/*!
 * Wait Queue
 *
 * Event-count style wait/notify built on `parking_lot::Condvar`.
 *
 * A waiter first takes an [`Epoch`] snapshot, then re-checks its condition,
 * and only then calls [`WaitQueue::wait`] with that snapshot. Any
 * [`WaitQueue::wake_all`] issued after the snapshot advances the epoch, so
 * the wait returns immediately instead of missing the wakeup.
 */

use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use thiserror::Error;

/// Result type for wait operations
pub type WaitResult<T> = Result<T, WaitError>;

/// Wait operation errors
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitError {
    #[error("Wait operation timed out")]
    Timeout,

    #[error("Wait queue was closed")]
    Closed,
}

/// Result of a wake operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WakeResult {
    /// Woke N waiters (N >= 1)
    Woken(usize),
    /// No waiters were waiting
    NoWaiters,
}

impl WakeResult {
    #[inline(always)]
    pub fn is_woken(&self) -> bool {
        matches!(self, WakeResult::Woken(_))
    }

    /// Number of woken waiters (0 if none)
    #[inline(always)]
    pub fn count(&self) -> usize {
        match self {
            WakeResult::Woken(n) => *n,
            WakeResult::NoWaiters => 0,
        }
    }
}

/// Opaque snapshot of a wait queue's notification counter
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Epoch(u64);

#[derive(Debug, Default)]
struct WaitState {
    epoch: u64,
    closed: bool,
}

/// Single-key wait queue
#[derive(Debug, Default)]
pub struct WaitQueue {
    state: Mutex<WaitState>,
    condvar: Condvar,
    waiters: AtomicUsize,
}

impl WaitQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot the current epoch
    #[inline]
    pub fn epoch(&self) -> Epoch {
        Epoch(self.state.lock().epoch)
    }

    /// Block until the epoch moves past `observed`, the queue is closed,
    /// or `timeout` elapses. `None`, or a timeout too large to form a
    /// deadline, waits without one.
    pub fn wait(&self, observed: Epoch, timeout: Option<Duration>) -> WaitResult<()> {
        let deadline = timeout.and_then(|t| Instant::now().checked_add(t));
        let mut state = self.state.lock();

        self.waiters.fetch_add(1, Ordering::Relaxed);
        let result = loop {
            if state.closed {
                break Err(WaitError::Closed);
            }
            if state.epoch != observed.0 {
                break Ok(());
            }
            match deadline {
                Some(deadline) => {
                    if self.condvar.wait_until(&mut state, deadline).timed_out() {
                        // A wake that raced the deadline still counts
                        break if state.closed {
                            Err(WaitError::Closed)
                        } else if state.epoch != observed.0 {
                            Ok(())
                        } else {
                            Err(WaitError::Timeout)
                        };
                    }
                }
                None => self.condvar.wait(&mut state),
            }
        };
        self.waiters.fetch_sub(1, Ordering::Relaxed);

        result
    }

    /// Advance the epoch and wake every waiter
    pub fn wake_all(&self) -> WakeResult {
        {
            let mut state = self.state.lock();
            state.epoch = state.epoch.wrapping_add(1);
        }
        self.notify()
    }

    /// Close the queue; current and future waits fail with [`WaitError::Closed`]
    pub fn close(&self) -> WakeResult {
        self.state.lock().closed = true;
        self.notify()
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// Approximate number of blocked waiters (for diagnostics)
    pub fn waiter_count(&self) -> usize {
        self.waiters.load(Ordering::Relaxed)
    }

    fn notify(&self) -> WakeResult {
        let count = self.waiters.load(Ordering::Relaxed);
        self.condvar.notify_all();
        if count == 0 {
            WakeResult::NoWaiters
        } else {
            WakeResult::Woken(count)
        }
    }
}
