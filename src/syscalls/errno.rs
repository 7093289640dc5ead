/*!
 * Errno Mapping
 *
 * Syscall return values follow the Linux convention: on failure the raw
 * return value is `-errno`.
 */

use crate::mailbox::MailboxError;

pub const ESRCH: i32 = 3;
pub const EAGAIN: i32 = 11;
pub const ENOMEM: i32 = 12;
pub const EEXIST: i32 = 17;
pub const EINVAL: i32 = 22;
pub const ENOSYS: i32 = 38;
pub const EMSGSIZE: i32 = 90;
pub const ENOBUFS: i32 = 105;
pub const ETIMEDOUT: i32 = 110;

/// Errno reported for a mailbox failure
pub const fn errno_of(err: &MailboxError) -> i32 {
    match err {
        MailboxError::UnknownRank(_) | MailboxError::NotRegistered(_) => ESRCH,
        MailboxError::AlreadyRegistered { .. } => EEXIST,
        MailboxError::ResourceExhausted { .. } => ENOMEM,
        MailboxError::MailboxFull { .. } => EAGAIN,
        MailboxError::MessageTooLarge { .. } => EMSGSIZE,
        MailboxError::InvalidArgument(_) => EINVAL,
        MailboxError::TimedOut { .. } => ETIMEDOUT,
        MailboxError::BufferTooSmall { .. } => ENOBUFS,
    }
}

/// Symbolic name of an errno value
pub const fn errno_name(errno: i32) -> &'static str {
    match errno {
        ESRCH => "ESRCH",
        EAGAIN => "EAGAIN",
        ENOMEM => "ENOMEM",
        EEXIST => "EEXIST",
        EINVAL => "EINVAL",
        ENOSYS => "ENOSYS",
        EMSGSIZE => "EMSGSIZE",
        ENOBUFS => "ENOBUFS",
        ETIMEDOUT => "ETIMEDOUT",
        _ => "EUNKNOWN",
    }
}
