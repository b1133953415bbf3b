//! Integration tests for driving nodes through a full session.
//!
//! A `MemoryChannel` stands in for the serial link; replies queued on it are
//! released one per transmitted frame, the way a node answers a request.

use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;

use cmri_protocol::{
    CmriError, Diagnostic, FrameCodec, MemoryChannel, MessageType, NodeAddress, NodeSession,
    NodeType, ProtocolVariant, SessionConfig,
};

fn addr(n: u8) -> NodeAddress {
    NodeAddress::new(n).expect("address in range")
}

fn session(config: SessionConfig) -> NodeSession<MemoryChannel> {
    NodeSession::new(MemoryChannel::new(), config).expect("valid config")
}

fn quick_config() -> SessionConfig {
    SessionConfig {
        max_tries: 50,
        ..Default::default()
    }
}

// ============================================================================
// Poll Tests
// ============================================================================

#[test]
fn test_end_to_end_poll() {
    let (tx, rx) = mpsc::channel::<Diagnostic>();
    let mut session = session(quick_config()).with_sink(tx);
    session.channel_mut().queue_reply(&[2, 70, 82, 10, 20, 30, 3]);

    let inputs = session.poll(addr(5)).expect("poll should succeed");

    assert_eq!(inputs, vec![10, 20, 30]);
    assert!(rx.try_recv().is_err(), "no diagnostics expected");
}

#[test]
fn test_poll_resyncs_after_noise() {
    let mut session = session(quick_config());
    session
        .channel_mut()
        .queue_reply(&[0x01, 0x02, 0x46, 0x52, 10, 20, 30, 0x03]);

    assert_eq!(session.poll(addr(5)).unwrap(), vec![10, 20, 30]);
}

#[test]
fn test_poll_diagnostics_reach_another_thread() {
    let (tx, rx) = mpsc::channel::<Diagnostic>();
    let mut session = session(quick_config()).with_sink(tx);
    // Wrong node answers first, then a bad type byte, then a bad trailer.
    session.channel_mut().queue_reply(&[2, 66, 82, 0, 0, 0, 3]);
    session
        .channel_mut()
        .queue_reply(&[2, 70, 0x41, 2, 70, 82, 1, 4, 5, 0x04]);

    let collector = thread::spawn(move || rx.iter().collect::<Vec<Diagnostic>>());

    assert_eq!(session.poll(addr(5)).unwrap(), vec![1, 4, 5]);
    drop(session);

    let diagnostics = collector.join().unwrap();
    assert_eq!(
        diagnostics,
        vec![
            Diagnostic::BadAddress { expected: addr(5), received: 66 },
            Diagnostic::BadResponseType { address: addr(5), received: 0x41 },
            Diagnostic::MissingEtx { address: addr(5), received: 0x04 },
        ]
    );
}

#[test]
fn test_poll_timeout_reports_node_and_tries() {
    let mut session = session(SessionConfig {
        max_tries: 10,
        ..Default::default()
    });

    match session.poll(addr(42)) {
        Err(CmriError::Timeout { address, tries }) => {
            assert_eq!(address, addr(42));
            assert_eq!(tries, 10);
        }
        other => panic!("expected timeout, got {:?}", other),
    }
    assert_eq!(session.channel().bytes_read(), 0);
}

#[test]
fn test_poll_overrun() {
    let mut session = session(quick_config());
    session.channel_mut().set_reported_available(Some(51));

    assert!(matches!(
        session.poll(addr(5)),
        Err(CmriError::Overrun { max_buf: 50, .. })
    ));
    assert_eq!(session.channel().bytes_read(), 0);
}

#[test]
fn test_poll_framing_error_propagates() {
    let mut session = session(quick_config());
    session.channel_mut().queue_reply(&[2, 70, 82, 10, 2, 30, 3]);

    let err = session.poll(addr(5)).unwrap_err();
    assert!(matches!(err, CmriError::Framing { byte: 2, .. }));
    assert!(err.to_string().contains("node 5"));
}

// ============================================================================
// Init / Output Tests
// ============================================================================

#[test]
fn test_init_then_poll_then_output() {
    let mut session = session(quick_config());
    let node = addr(3);

    session
        .init(node, NodeType::Smini, Some(&[0b0000_1111, 0, 0, 0, 0, 0b1100_0000]))
        .unwrap();
    session.channel_mut().queue_reply(&[2, 68, 82, 0xFF, 0x10, 0x03, 0x00, 3]);
    assert_eq!(session.poll(node).unwrap(), vec![0xFF, 0x03, 0x00]);
    session.output(node, &[0x02, 0x00, 0x01]).unwrap();

    let writes = session.channel().writes().to_vec();
    assert_eq!(writes.len(), 3);

    let init = FrameCodec::decode(&writes[0]).unwrap();
    assert_eq!(init.address, node);
    assert_eq!(init.message_type, MessageType::Init.byte());
    assert_eq!(init.payload, vec![b'M', 0, 0, 3, 0b0000_1111, 0, 0, 0, 0, 0b1100_0000]);

    let poll = FrameCodec::decode(&writes[1]).unwrap();
    assert_eq!(poll.message_type, b'P');
    assert!(poll.payload.is_empty());

    let output = FrameCodec::decode(&writes[2]).unwrap();
    assert_eq!(output.message_type, b'T');
    assert_eq!(output.payload, vec![0x02, 0x00, 0x01]);
}

#[test]
fn test_init_rejects_invalid_ct_for_each_node_type() {
    let mut session = session(quick_config());

    assert!(matches!(
        session.init(addr(0), NodeType::Smini, Some(&[0b0000_0001, 0, 0, 0, 0, 0])),
        Err(CmriError::InvalidCtByte { node_type: NodeType::Smini, .. })
    ));
    assert!(matches!(
        session.init(addr(0), NodeType::Smini, Some(&[0; 4])),
        Err(CmriError::InvalidCtLength { .. })
    ));
    assert!(matches!(
        session.init(addr(0), NodeType::Maxi24, Some(&[0b0000_0011])),
        Err(CmriError::InvalidCtByte { node_type: NodeType::Maxi24, .. })
    ));
    assert!(matches!(
        session.init(addr(0), NodeType::Maxi32, None),
        Err(CmriError::MissingConfiguration(NodeType::Maxi32))
    ));
    assert!(session.channel().writes().is_empty());

    session.init(addr(0), NodeType::Maxi24, Some(&[0b0000_0001])).unwrap();
    session.init(addr(0), NodeType::Cpnode, None).unwrap();
    assert_eq!(session.channel().writes().len(), 2);
}

#[test]
fn test_legacy_variant_smini_only() {
    let mut session = session(SessionConfig {
        variant: ProtocolVariant::Legacy,
        delay: 300,
        ..quick_config()
    });

    session.init(addr(1), NodeType::Smini, None).unwrap();
    let init = FrameCodec::decode(&session.channel().writes()[0]).unwrap();
    assert_eq!(init.payload, vec![b'M', 1, 44, 0]);

    for node_type in [NodeType::Maxi24, NodeType::Maxi32, NodeType::Cpnode] {
        assert!(matches!(
            session.init(addr(1), node_type, Some(&[0])),
            Err(CmriError::UnsupportedNodeType { variant: ProtocolVariant::Legacy, .. })
        ));
    }
}

// ============================================================================
// Shared Link Tests
// ============================================================================

#[test]
fn test_session_shared_behind_mutex() {
    let session = Arc::new(Mutex::new(session(quick_config())));

    let handles: Vec<_> = (0..4u8)
        .map(|n| {
            let session = Arc::clone(&session);
            thread::spawn(move || {
                let node = addr(n);
                // Offset keeps the payload clear of STX/ETX/DLE.
                let value = n + 4;
                let mut session = session.lock().unwrap();
                session
                    .channel_mut()
                    .queue_reply(&[2, node.wire_byte(), 82, value, value, value, 3]);
                session.poll(node).unwrap()
            })
        })
        .collect();

    for (n, handle) in handles.into_iter().enumerate() {
        let value = n as u8 + 4;
        assert_eq!(handle.join().unwrap(), vec![value, value, value]);
    }
}
