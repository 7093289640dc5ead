/*!
 * Syscall Dispatch Tests
 * Raw ABI round trips through the syscall table
 */

use pretty_assertions::assert_eq;
use rank_mailbox_kernel::core::limits::{ANY_SOURCE, WAIT_FOREVER};
use rank_mailbox_kernel::syscalls::{
    MailboxHandler, SyscallHandler, SYS_RECEIVE, SYS_REGISTER,
};
use rank_mailbox_kernel::{MailboxService, MailboxSyscall, Pid, SyscallResult, SyscallTable};
use serial_test::serial;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

#[test]
fn test_receive_reports_sender_and_payload() {
    let table = SyscallTable::with_service(MailboxService::with_defaults());
    assert_eq!(table.dispatch(10, &MailboxSyscall::Register).to_raw(), 0);
    assert_eq!(table.dispatch(20, &MailboxSyscall::Register).to_raw(), 1);

    table.dispatch(
        20,
        &MailboxSyscall::Send {
            rank: 0,
            data: b"Hello world".to_vec(),
            size: 11,
        },
    );

    let result = table.dispatch(
        10,
        &MailboxSyscall::Receive {
            rank: ANY_SOURCE,
            timeout: 0,
            capacity: 100,
        },
    );
    assert_eq!(result, SyscallResult::received(11, b"Hello world".to_vec(), 1));
}

#[test]
fn test_truncated_receive_returns_full_length() {
    let table = SyscallTable::with_service(MailboxService::with_defaults());
    table.dispatch(1, &MailboxSyscall::Register);
    table.dispatch(
        1,
        &MailboxSyscall::Send {
            rank: 0,
            data: b"truncate me".to_vec(),
            size: 11,
        },
    );

    let result = table.dispatch(
        1,
        &MailboxSyscall::Receive {
            rank: 0,
            timeout: 0,
            capacity: 8,
        },
    );
    assert_eq!(result, SyscallResult::received(11, b"truncate".to_vec(), 0));
}

#[test]
fn test_blocking_receive_across_threads() {
    let table = SyscallTable::with_service(MailboxService::with_defaults());
    table.dispatch(1, &MailboxSyscall::Register);
    table.dispatch(2, &MailboxSyscall::Register);

    let receiver = table.clone();
    let handle = thread::spawn(move || {
        receiver.dispatch(
            1,
            &MailboxSyscall::Receive {
                rank: 1,
                timeout: WAIT_FOREVER,
                capacity: 16,
            },
        )
    });

    thread::sleep(Duration::from_millis(50));
    table.dispatch(
        2,
        &MailboxSyscall::Send {
            rank: 0,
            data: b"ping".to_vec(),
            size: 4,
        },
    );

    assert_eq!(handle.join().unwrap(), SyscallResult::received(4, b"ping".to_vec(), 1));
}

#[test]
#[serial]
fn test_receive_timeout_is_in_seconds() {
    let table = SyscallTable::with_service(MailboxService::with_defaults());
    table.dispatch(1, &MailboxSyscall::Register);
    table.dispatch(2, &MailboxSyscall::Register);

    let wait_one_second = MailboxSyscall::Receive {
        rank: 1,
        timeout: 1,
        capacity: 16,
    };

    // Nothing sent: the full second elapses before ETIMEDOUT
    let start = Instant::now();
    assert!(!table.dispatch(1, &wait_one_second).is_success());
    assert!(start.elapsed() >= Duration::from_secs(1));

    // A send 300ms later still lands inside the one-second window
    let sender = table.clone();
    let handle = thread::spawn(move || {
        thread::sleep(Duration::from_millis(300));
        sender.dispatch(
            2,
            &MailboxSyscall::Send {
                rank: 0,
                data: b"late".to_vec(),
                size: 4,
            },
        )
    });

    let result = table.dispatch(1, &wait_one_second);
    assert!(handle.join().unwrap().is_success());
    assert_eq!(result, SyscallResult::received(4, b"late".to_vec(), 1));
}

#[test]
fn test_deregister_releases_rank() {
    let table = SyscallTable::with_service(MailboxService::with_defaults());
    table.dispatch(1, &MailboxSyscall::Register);
    table.dispatch(2, &MailboxSyscall::Register);

    assert_eq!(table.dispatch(1, &MailboxSyscall::Deregister).to_raw(), 0);
    assert_eq!(table.dispatch(3, &MailboxSyscall::Register).to_raw(), 0);
}

/// Claims only register, to check handler ordering
struct RegisterOnly;

impl SyscallHandler for RegisterOnly {
    fn handle(&self, _pid: Pid, syscall: &MailboxSyscall) -> Option<SyscallResult> {
        match syscall {
            MailboxSyscall::Register => Some(SyscallResult::success(99)),
            _ => None,
        }
    }

    fn name(&self) -> &'static str {
        "register_only"
    }
}

#[test]
fn test_handlers_consulted_in_order() {
    let service = MailboxService::with_defaults();
    let table = SyscallTable::new()
        .register(Arc::new(RegisterOnly))
        .register(Arc::new(MailboxHandler::new(service.clone())));
    assert_eq!(table.handler_count(), 2);

    let register = MailboxSyscall::Register;
    assert_eq!(register.number(), SYS_REGISTER);
    assert_eq!(table.dispatch(1, &register).to_raw(), 99);
    assert!(service.active_ranks().is_empty());

    // Falls through to the mailbox handler
    let receive = MailboxSyscall::Receive {
        rank: 0,
        timeout: 0,
        capacity: 4,
    };
    assert_eq!(receive.number(), SYS_RECEIVE);
    assert!(!table.dispatch(1, &receive).is_success());
}
