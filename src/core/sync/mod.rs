/*!
 * Synchronization Primitives
 *
 * Wait/notify primitive used to park receivers on their mailbox.
 */

mod wait;

pub use wait::{Epoch, WaitError, WaitQueue, WaitResult, WakeResult};
