/*!
 * Delivery Tests
 * Send/receive semantics: exact delivery, ordering, capacity and truncation
 */

use pretty_assertions::assert_eq;
use rank_mailbox_kernel::{
    MailboxConfig, MailboxError, MailboxService, ReceiveTimeout, SourceFilter, TruncationPolicy,
};

/// Service with `count` processes registered as pids 1..=count (ranks 0..count)
fn setup(config: MailboxConfig, count: u32) -> MailboxService {
    let service = MailboxService::new(config).unwrap();
    for pid in 1..=count {
        service.register(pid).unwrap();
    }
    service
}

fn poll(service: &MailboxService, pid: u32, source: SourceFilter) -> (Vec<u8>, u32) {
    let mut buffer = vec![0u8; 256];
    let received = service
        .receive(pid, source, ReceiveTimeout::Poll, &mut buffer)
        .unwrap();
    buffer.truncate(received.copied);
    (buffer, received.sender)
}

#[test]
fn test_send_then_poll_returns_exact_bytes() {
    let service = setup(MailboxConfig::default(), 2);
    let message = b"Hello world from rank 1\x00\xff";

    assert_eq!(service.send(2, 0, message, message.len()), Ok(message.len()));

    let (bytes, sender) = poll(&service, 1, SourceFilter::Rank(1));
    assert_eq!(bytes, message.to_vec());
    assert_eq!(sender, 1);
}

#[test]
fn test_send_to_unregistered_rank() {
    let service = setup(MailboxConfig::default(), 2);

    for payload in [&b"a"[..], &b"longer payload"[..], &[0u8; 64][..]] {
        assert_eq!(
            service.send(1, 9, payload, payload.len()),
            Err(MailboxError::UnknownRank(9))
        );
    }
}

#[test]
fn test_send_from_unregistered_process() {
    let service = setup(MailboxConfig::default(), 1);
    assert_eq!(service.send(42, 0, b"hi", 2), Err(MailboxError::NotRegistered(42)));

    let mut buffer = [0u8; 4];
    assert_eq!(
        service.receive(42, SourceFilter::Any, ReceiveTimeout::Poll, &mut buffer),
        Err(MailboxError::NotRegistered(42))
    );
}

#[test]
fn test_fifo_per_sender() {
    let service = setup(MailboxConfig::default(), 2);
    service.send(2, 0, b"A", 1).unwrap();
    service.send(2, 0, b"B", 1).unwrap();

    assert_eq!(poll(&service, 1, SourceFilter::Rank(1)).0, b"A".to_vec());
    assert_eq!(poll(&service, 1, SourceFilter::Rank(1)).0, b"B".to_vec());
}

#[test]
fn test_wildcard_uses_arrival_order() {
    // Ranks: 0 receiver, 1 = X, 2 = Y
    let service = setup(MailboxConfig::default(), 3);
    service.send(3, 0, b"from Y first", 12).unwrap();
    service.send(2, 0, b"from X second", 13).unwrap();

    let (first, sender) = poll(&service, 1, SourceFilter::Any);
    assert_eq!(first, b"from Y first".to_vec());
    assert_eq!(sender, 2);

    let (second, sender) = poll(&service, 1, SourceFilter::Any);
    assert_eq!(second, b"from X second".to_vec());
    assert_eq!(sender, 1);
}

#[test]
fn test_source_filter_skips_other_senders() {
    let service = setup(MailboxConfig::default(), 3);
    service.send(2, 0, b"x1", 2).unwrap();
    service.send(3, 0, b"y1", 2).unwrap();
    service.send(2, 0, b"x2", 2).unwrap();

    assert_eq!(poll(&service, 1, SourceFilter::Rank(2)).0, b"y1".to_vec());
    assert_eq!(poll(&service, 1, SourceFilter::Any).0, b"x1".to_vec());
    assert_eq!(poll(&service, 1, SourceFilter::Any).0, b"x2".to_vec());
}

#[test]
fn test_full_mailbox_until_drained() {
    let service = setup(MailboxConfig::default().with_mailbox_capacity(3), 2);

    for i in 0..3u8 {
        service.send(2, 0, &[i], 1).unwrap();
    }
    assert_eq!(
        service.send(2, 0, b"overflow", 8),
        Err(MailboxError::MailboxFull {
            rank: 0,
            capacity: 3
        })
    );
    assert_eq!(
        service.send(2, 0, b"again", 5),
        Err(MailboxError::MailboxFull {
            rank: 0,
            capacity: 3
        })
    );

    assert_eq!(poll(&service, 1, SourceFilter::Any).0, vec![0]);
    assert_eq!(service.send(2, 0, b"fits", 4), Ok(4));
    assert_eq!(service.stats().rejected_full, 2);
}

#[test]
fn test_message_size_limit() {
    let service = setup(MailboxConfig::default().with_max_message_size(16), 1);
    let payload = [7u8; 17];

    assert_eq!(
        service.send(1, 0, &payload, 17),
        Err(MailboxError::MessageTooLarge { size: 17, max: 16 })
    );
    assert_eq!(service.send(1, 0, &payload, 16), Ok(16));
}

#[test]
fn test_invalid_arguments() {
    let service = setup(MailboxConfig::default(), 1);

    assert!(matches!(
        service.send(1, 0, b"abc", 0),
        Err(MailboxError::InvalidArgument(_))
    ));
    let mut empty: [u8; 0] = [];
    assert!(matches!(
        service.receive(1, SourceFilter::Any, ReceiveTimeout::Poll, &mut empty),
        Err(MailboxError::InvalidArgument(_))
    ));
}

#[test]
fn test_truncation_reports_actual_length() {
    let service = setup(MailboxConfig::default(), 1);
    service.send(1, 0, b"abcdefghij", 10).unwrap();

    let mut buffer = [0u8; 3];
    let received = service
        .receive(1, SourceFilter::Any, ReceiveTimeout::Poll, &mut buffer)
        .unwrap();
    assert_eq!(received.len, 10);
    assert_eq!(received.copied, 3);
    assert_eq!(&buffer, b"abc");

    // The truncated message is consumed
    assert!(matches!(
        service.receive(1, SourceFilter::Any, ReceiveTimeout::Poll, &mut buffer),
        Err(MailboxError::TimedOut { .. })
    ));
}

#[test]
fn test_reject_policy_keeps_message_queued() {
    let config = MailboxConfig::default().with_truncation(TruncationPolicy::Reject);
    let service = setup(config, 1);
    service.send(1, 0, b"abcdefghij", 10).unwrap();

    let mut small = [0u8; 3];
    assert_eq!(
        service.receive(1, SourceFilter::Any, ReceiveTimeout::Poll, &mut small),
        Err(MailboxError::BufferTooSmall {
            required: 10,
            available: 3
        })
    );
    assert_eq!(service.mailbox_stats(0).unwrap().length, 1);

    let mut exact = [0u8; 10];
    let received = service
        .receive(1, SourceFilter::Any, ReceiveTimeout::Poll, &mut exact)
        .unwrap();
    assert!(!received.truncated());
    assert_eq!(&exact, b"abcdefghij");
}

#[test]
fn test_stats_counters() {
    let service = setup(MailboxConfig::default(), 2);
    service.send(2, 0, b"one", 3).unwrap();
    service.send(2, 0, b"two", 3).unwrap();
    poll(&service, 1, SourceFilter::Any);

    let mut buffer = [0u8; 8];
    let _ = service.receive(2, SourceFilter::Any, ReceiveTimeout::Poll, &mut buffer);

    let stats = service.stats();
    assert_eq!(stats.active_ranks, 2);
    assert_eq!(stats.messages_sent, 2);
    assert_eq!(stats.messages_received, 1);
    assert_eq!(stats.bytes_sent, 6);
    assert_eq!(stats.pending_messages, 1);
    assert_eq!(stats.timeouts, 1);
}
