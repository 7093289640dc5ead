/*!
 * Mailbox Module
 * Rank registry, per-rank mailboxes and the delivery engine
 */

pub mod delivery;
pub mod queue;
pub mod registry;
pub mod service;
pub mod store;
pub mod types;

// Re-export public API
pub use delivery::{DeliveryEngine, DeliveryStats, ReceiveTimeout};
pub use queue::Mailbox;
pub use registry::RankRegistry;
pub use service::MailboxService;
pub use store::MailboxStore;
pub use types::{
    MailboxError, MailboxResult, MailboxStats, Message, Received, ServiceStats, SourceFilter,
};
