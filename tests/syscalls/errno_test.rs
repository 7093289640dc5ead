/*!
 * Errno Tests
 * Every failure kind surfaces as a negative errno through the syscall table
 */

use pretty_assertions::assert_eq;
use rank_mailbox_kernel::core::limits::{ANY_SOURCE, WAIT_FOREVER};
use rank_mailbox_kernel::syscalls::errno::{
    EAGAIN, EEXIST, EINVAL, EMSGSIZE, ENOBUFS, ENOMEM, ESRCH, ETIMEDOUT,
};
use rank_mailbox_kernel::{
    MailboxConfig, MailboxService, MailboxSyscall, SyscallTable, TruncationPolicy,
};

fn table(config: MailboxConfig) -> SyscallTable {
    SyscallTable::with_service(MailboxService::new(config).unwrap())
}

fn send(rank: i32, data: &[u8]) -> MailboxSyscall {
    MailboxSyscall::Send {
        rank,
        data: data.to_vec(),
        size: data.len() as i64,
    }
}

fn receive(rank: i32, timeout: i64, capacity: i64) -> MailboxSyscall {
    MailboxSyscall::Receive {
        rank,
        timeout,
        capacity,
    }
}

#[test]
fn test_unregistered_caller_is_esrch() {
    let table = table(MailboxConfig::default());

    assert_eq!(table.dispatch(1, &send(0, b"hello")).to_raw(), -i64::from(ESRCH));
    assert_eq!(table.dispatch(1, &receive(0, 0, 16)).to_raw(), -i64::from(ESRCH));
}

#[test]
fn test_unknown_destination_is_esrch() {
    let table = table(MailboxConfig::default());
    table.dispatch(1, &MailboxSyscall::Register);

    assert_eq!(table.dispatch(1, &send(1, b"hello")).errno(), Some(ESRCH));
}

#[test]
fn test_registration_errors() {
    let table = table(MailboxConfig::default().with_max_ranks(1));

    assert_eq!(table.dispatch(1, &MailboxSyscall::Register).to_raw(), 0);
    assert_eq!(table.dispatch(1, &MailboxSyscall::Register).errno(), Some(EEXIST));
    assert_eq!(table.dispatch(2, &MailboxSyscall::Register).errno(), Some(ENOMEM));
}

#[test]
fn test_full_mailbox_is_eagain() {
    let table = table(MailboxConfig::default().with_mailbox_capacity(1));
    table.dispatch(1, &MailboxSyscall::Register);

    assert_eq!(table.dispatch(1, &send(0, b"one")).to_raw(), 3);
    assert_eq!(table.dispatch(1, &send(0, b"two")).errno(), Some(EAGAIN));
}

#[test]
fn test_oversize_message_is_emsgsize() {
    let table = table(MailboxConfig::default().with_max_message_size(4));
    table.dispatch(1, &MailboxSyscall::Register);

    assert_eq!(table.dispatch(1, &send(0, b"too long")).errno(), Some(EMSGSIZE));
}

#[test]
fn test_bad_arguments_are_einval() {
    let table = table(MailboxConfig::default());
    table.dispatch(1, &MailboxSyscall::Register);

    let zero_size = MailboxSyscall::Send {
        rank: 0,
        data: b"abc".to_vec(),
        size: 0,
    };
    let oversized_declaration = MailboxSyscall::Send {
        rank: 0,
        data: b"abc".to_vec(),
        size: 10,
    };
    for syscall in [
        zero_size,
        oversized_declaration,
        send(ANY_SOURCE, b"abc"),
        receive(-2, 0, 8),
        receive(0, -3, 8),
        receive(0, 0, -1),
    ] {
        assert_eq!(table.dispatch(1, &syscall).errno(), Some(EINVAL), "{:?}", syscall);
    }
}

#[test]
fn test_poll_on_empty_mailbox_is_etimedout() {
    let table = table(MailboxConfig::default());
    table.dispatch(1, &MailboxSyscall::Register);

    assert_eq!(table.dispatch(1, &receive(ANY_SOURCE, 0, 8)).errno(), Some(ETIMEDOUT));
    assert_eq!(table.dispatch(1, &receive(0, 1, 8)).errno(), Some(ETIMEDOUT));
}

#[test]
fn test_reject_policy_is_enobufs() {
    let table = table(MailboxConfig::default().with_truncation(TruncationPolicy::Reject));
    table.dispatch(1, &MailboxSyscall::Register);
    table.dispatch(1, &send(0, b"0123456789"));

    assert_eq!(table.dispatch(1, &receive(0, 0, 4)).errno(), Some(ENOBUFS));
    assert_eq!(table.dispatch(1, &receive(0, WAIT_FOREVER, 10)).to_raw(), 10);
}
