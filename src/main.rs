/*!
 * Mailbox Daemon - Main Entry Point
 *
 * Hosts the rank mailbox service:
 * - Loads limits from the environment
 * - Runs a ping/pong self-test through the syscall table
 * - Serves until interrupted, then reports statistics
 */

use miette::IntoDiagnostic;
use rank_mailbox_kernel::core::limits::WAIT_FOREVER;
use rank_mailbox_kernel::{
    init_tracing, MailboxConfig, MailboxService, MailboxSyscall, Pid, SyscallResult, SyscallTable,
};
use std::time::Instant;
use tracing::{error, info};

const PING_PID: Pid = 1;
const PONG_PID: Pid = 2;
const SELF_TEST_ROUNDS: usize = 8;

#[tokio::main]
async fn main() -> miette::Result<()> {
    init_tracing();

    info!("Mailbox daemon starting...");

    let config = MailboxConfig::from_env()?;
    let service = MailboxService::new(config)?;
    let table = SyscallTable::with_service(service.clone());
    info!(handlers = table.handler_count(), "Syscall table ready");

    self_test(&table).await?;

    info!("Mailbox daemon ready, press Ctrl+C to stop");
    tokio::signal::ctrl_c().await.into_diagnostic()?;

    let stats = serde_json::to_string(&service.stats()).into_diagnostic()?;
    info!(stats = %stats, "Mailbox daemon shutting down");
    Ok(())
}

/// Bounce a message between two ranks and release them again
async fn self_test(table: &SyscallTable) -> miette::Result<()> {
    let start = Instant::now();
    let ping = expect_ok(table.dispatch(PING_PID, &MailboxSyscall::Register), "register ping")?;
    let pong = expect_ok(table.dispatch(PONG_PID, &MailboxSyscall::Register), "register pong")?;

    let responder = table.clone();
    let echo = tokio::task::spawn_blocking(move || -> miette::Result<()> {
        for _ in 0..SELF_TEST_ROUNDS {
            let received = responder.dispatch(
                PONG_PID,
                &MailboxSyscall::Receive {
                    rank: ping as i32,
                    timeout: WAIT_FOREVER,
                    capacity: 64,
                },
            );
            let (data, value) = match received {
                SyscallResult::Success {
                    data: Some(data),
                    value,
                    ..
                } => (data, value),
                other => return Err(failure("pong receive", &other)),
            };
            expect_ok(
                responder.dispatch(
                    PONG_PID,
                    &MailboxSyscall::Send {
                        rank: ping as i32,
                        data,
                        size: value,
                    },
                ),
                "pong send",
            )?;
        }
        Ok(())
    });

    for round in 0..SELF_TEST_ROUNDS {
        let payload = format!("ping {}", round).into_bytes();
        let size = payload.len() as i64;
        let requester = table.clone();
        let reply = tokio::task::spawn_blocking(move || {
            expect_ok(
                requester.dispatch(
                    PING_PID,
                    &MailboxSyscall::Send {
                        rank: pong as i32,
                        data: payload,
                        size,
                    },
                ),
                "ping send",
            )?;
            expect_ok(
                requester.dispatch(
                    PING_PID,
                    &MailboxSyscall::Receive {
                        rank: pong as i32,
                        timeout: 1,
                        capacity: 64,
                    },
                ),
                "ping receive",
            )
        })
        .await
        .into_diagnostic()??;

        if reply != size {
            return Err(miette::miette!("self-test echo returned {} bytes, expected {}", reply, size));
        }
    }

    echo.await.into_diagnostic()??;

    expect_ok(table.dispatch(PONG_PID, &MailboxSyscall::Deregister), "deregister pong")?;
    expect_ok(table.dispatch(PING_PID, &MailboxSyscall::Deregister), "deregister ping")?;

    info!(
        rounds = SELF_TEST_ROUNDS,
        elapsed_us = start.elapsed().as_micros() as u64,
        "Self-test passed"
    );
    Ok(())
}

fn expect_ok(result: SyscallResult, step: &str) -> miette::Result<i64> {
    match result {
        SyscallResult::Success { value, .. } => Ok(value),
        other => Err(failure(step, &other)),
    }
}

fn failure(step: &str, result: &SyscallResult) -> miette::Report {
    error!(step, raw = result.to_raw(), "Self-test failed");
    miette::miette!("self-test step '{}' failed: {:?}", step, result)
}
