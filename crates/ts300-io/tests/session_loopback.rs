// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Transport session tests against a loopback listener standing in for the unit

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::mpsc::Receiver;
use std::time::{Duration, Instant};

use ts300_io::{
    ConnectionState, DisconnectPolicy, SessionEvent, SessionOptions, SocketStatus,
    TransportError, TransportSession,
};

const WAIT: Duration = Duration::from_secs(5);

fn fast_options() -> SessionOptions {
    SessionOptions::default().with_reconnect_delay(Duration::from_millis(200))
}

fn listener() -> (TcpListener, u16) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    (listener, port)
}

/// Drain events until one matches, failing after `WAIT`
fn wait_for<F>(events: &Receiver<SessionEvent>, mut matches: F) -> SessionEvent
where
    F: FnMut(&SessionEvent) -> bool,
{
    let deadline = Instant::now() + WAIT;
    loop {
        let remaining = deadline
            .checked_duration_since(Instant::now())
            .expect("timed out waiting for session event");
        let event = events
            .recv_timeout(remaining)
            .expect("timed out waiting for session event");
        if matches(&event) {
            return event;
        }
    }
}

fn is_status(event: &SessionEvent, status: SocketStatus) -> bool {
    event.socket_status() == Some(status)
}

/// Collect `ReceivedText` chunks until `expected_len` characters have arrived
fn receive_text(events: &Receiver<SessionEvent>, expected_len: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    while chunks.iter().map(|c: &String| c.chars().count()).sum::<usize>() < expected_len {
        match wait_for(events, |e| matches!(e, SessionEvent::ReceivedText(_))) {
            SessionEvent::ReceivedText(text) => chunks.push(text),
            _ => unreachable!(),
        }
    }
    chunks
}

fn connected_session(port: u16, listener: &TcpListener) -> (TransportSession, Receiver<SessionEvent>, TcpStream) {
    connected_session_with_buffer(port, listener, 64)
}

fn connected_session_with_buffer(
    port: u16,
    listener: &TcpListener,
    buffer: usize,
) -> (TransportSession, Receiver<SessionEvent>, TcpStream) {
    let (session, events) = TransportSession::with_channel(fast_options()).unwrap();
    session.initialize("127.0.0.1", port, buffer).unwrap();
    session.connect();
    let (peer, _) = listener.accept().unwrap();
    wait_for(&events, |e| is_status(e, SocketStatus::Connected));
    (session, events, peer)
}

#[test]
fn test_initialize_reports_outcome() {
    let (session, events) = TransportSession::with_channel(fast_options()).unwrap();

    assert!(matches!(
        session.initialize("", 5000, 0),
        Err(TransportError::InvalidEndpoint(_))
    ));
    assert_eq!(events.recv_timeout(WAIT).unwrap(), SessionEvent::Initialized(false));
    assert_eq!(session.state(), ConnectionState::Uninitialized);

    session.initialize("127.0.0.1", 5000, 0).unwrap();
    assert_eq!(events.recv_timeout(WAIT).unwrap(), SessionEvent::Initialized(true));
    assert_eq!(session.state(), ConnectionState::Initialized);
    assert_eq!(session.endpoint().unwrap().receive_buffer_size(), 1024);
}

#[test]
fn test_connect_before_initialize_does_nothing() {
    let (session, events) = TransportSession::with_channel(fast_options()).unwrap();
    session.connect();
    assert!(events.recv_timeout(Duration::from_millis(300)).is_err());
    assert_eq!(session.state(), ConnectionState::Uninitialized);
}

#[test]
fn test_connect_reports_connected_code() {
    let (listener, port) = listener();
    let (session, events) = TransportSession::with_channel(fast_options()).unwrap();
    session.initialize("127.0.0.1", port, 64).unwrap();
    session.connect();
    let _peer = listener.accept().unwrap();

    let event = wait_for(&events, |e| matches!(e, SessionEvent::ConnectionStatus { .. }));
    assert_eq!(
        event,
        SessionEvent::ConnectionStatus {
            label: "SOCKET_STATUS_CONNECTED",
            code: 2
        }
    );
    assert!(session.is_connected());
    assert_eq!(session.state(), ConnectionState::Connected);
}

#[test]
fn test_received_bytes_become_text() {
    let (listener, port) = listener();
    let (_session, events, mut peer) = connected_session(port, &listener);

    peer.write_all(&[b'O', b'K', 0xAA]).unwrap();
    let event = wait_for(&events, |e| matches!(e, SessionEvent::ReceivedText(_)));
    assert_eq!(event, SessionEvent::ReceivedText("OK\u{AA}".to_string()));
}

#[test]
fn test_small_buffer_splits_reads_without_loss() {
    let (listener, port) = listener();
    let (_session, events, mut peer) = connected_session_with_buffer(port, &listener, 8);

    peer.write_all(b"MIC 0012 ON\r\n").unwrap();
    let chunks = receive_text(&events, 13);
    assert!(chunks.len() >= 2);
    assert!(chunks.iter().all(|chunk| chunk.len() <= 8));
    assert_eq!(chunks.concat(), "MIC 0012 ON\r\n");
}

#[test]
fn test_send_delivers_frame_bytes() {
    let (listener, port) = listener();
    let (session, _events, mut peer) = connected_session(port, &listener);

    let frame = [
        0xAA, 0xEE, 0x08, 0x80, 0x00, 0x05, 0x00, 0x07, 0x00, 0x00, 0x00, 0xEE, 0xFC,
    ];
    session.send(&frame).unwrap();

    let mut received = [0u8; 13];
    peer.set_read_timeout(Some(WAIT)).unwrap();
    peer.read_exact(&mut received).unwrap();
    assert_eq!(received, frame);
}

#[test]
fn test_send_text_is_ascii() {
    let (listener, port) = listener();
    let (session, _events, mut peer) = connected_session(port, &listener);

    session.send_text("MIC é").unwrap();

    let mut received = [0u8; 5];
    peer.set_read_timeout(Some(WAIT)).unwrap();
    peer.read_exact(&mut received).unwrap();
    assert_eq!(&received, b"MIC ?");
}

#[test]
fn test_send_requires_link() {
    let (session, _events) = TransportSession::with_channel(fast_options()).unwrap();
    assert!(matches!(session.send(&[0x01]), Err(TransportError::NotInitialized)));

    session.initialize("127.0.0.1", 5000, 0).unwrap();
    assert!(matches!(session.send(&[0x01]), Err(TransportError::NotConnected)));
}

#[test]
fn test_remote_close_triggers_reconnect() {
    let (listener, port) = listener();
    let (session, events, peer) = connected_session_with_buffer(port, &listener, 8);

    drop(peer);
    wait_for(&events, |e| is_status(e, SocketStatus::BrokenRemotely));
    assert!(!session.is_connected());

    // Next attempt arrives after the reconnect delay
    let (mut second, _) = listener.accept().unwrap();
    wait_for(&events, |e| is_status(e, SocketStatus::Connected));
    assert!(session.is_connected());

    // The receive loop picked up the new link
    second.write_all(b"second link").unwrap();
    assert_eq!(receive_text(&events, 11).concat(), "second link");
}

#[test]
fn test_manual_disconnect_suppresses_reconnect() {
    let (listener, port) = listener();
    let (session, events, _peer) = connected_session(port, &listener);

    session.disconnect();
    wait_for(&events, |e| is_status(e, SocketStatus::BrokenLocally));
    assert_eq!(session.state(), ConnectionState::Disconnected);
    assert_eq!(session.pending_reconnects(), 0);

    listener.set_nonblocking(true).unwrap();
    std::thread::sleep(Duration::from_millis(800));
    assert!(listener.accept().is_err());

    // connect() clears the manual flag again
    listener.set_nonblocking(false).unwrap();
    session.connect();
    let _peer = listener.accept().unwrap();
    wait_for(&events, |e| is_status(e, SocketStatus::Connected));
}

#[test]
fn test_refused_connect_schedules_one_retry() {
    let (listener, port) = listener();
    drop(listener);

    let options = SessionOptions::default().with_reconnect_delay(Duration::from_secs(60));
    let (session, events) = TransportSession::with_channel(options).unwrap();
    session.initialize("127.0.0.1", port, 0).unwrap();
    session.connect();

    wait_for(&events, |e| is_status(e, SocketStatus::ConnectFailed));
    assert_eq!(session.pending_reconnects(), 1);
    assert_eq!(session.state(), ConnectionState::Connecting);

    session.disconnect();
    assert_eq!(session.pending_reconnects(), 0);
    assert_eq!(session.state(), ConnectionState::Disconnected);
}

#[test]
fn test_reinitialize_same_endpoint_keeps_link() {
    let (listener, port) = listener();
    let (session, events, _peer) = connected_session(port, &listener);

    session.initialize("127.0.0.1", port, 64).unwrap();
    assert_eq!(events.recv_timeout(WAIT).unwrap(), SessionEvent::Initialized(true));
    assert!(session.is_connected());

    listener.set_nonblocking(true).unwrap();
    std::thread::sleep(Duration::from_millis(300));
    assert!(listener.accept().is_err());
}

#[test]
fn test_disconnect_always_policy_without_link() {
    let options = fast_options().with_disconnect_policy(DisconnectPolicy::Always);
    let (session, events) = TransportSession::with_channel(options).unwrap();
    session.initialize("127.0.0.1", 5000, 0).unwrap();
    assert_eq!(events.recv_timeout(WAIT).unwrap(), SessionEvent::Initialized(true));

    session.disconnect();
    assert_eq!(session.state(), ConnectionState::Disconnected);
    assert!(events.recv_timeout(Duration::from_millis(200)).is_err());
}

#[tokio::test]
async fn test_send_on_current_thread_runtime() {
    let device = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = device.local_addr().unwrap().port();

    let (session, _events) = TransportSession::with_channel(fast_options()).unwrap();
    session.initialize("127.0.0.1", port, 0).unwrap();
    assert!(matches!(session.send(&[0x01]), Err(TransportError::NotConnected)));

    session.connect();
    let (mut peer, _) = device.accept().await.unwrap();
    let deadline = Instant::now() + WAIT;
    while !session.is_connected() {
        assert!(Instant::now() < deadline, "session never connected");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    session.send(&[0xAA, 0xEE, 0x08, 0xEE, 0xFC]).unwrap();
    session.send_text("OK").unwrap();

    let mut received = [0u8; 7];
    tokio::time::timeout(WAIT, tokio::io::AsyncReadExt::read_exact(&mut peer, &mut received))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(received, [0xAA, 0xEE, 0x08, 0xEE, 0xFC, b'O', b'K']);
}

#[test]
fn test_owned_runtime_dropped_inside_async_code() {
    let (session, _events) = TransportSession::with_channel(fast_options()).unwrap();
    session.initialize("127.0.0.1", 5000, 0).unwrap();

    let outer = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();
    outer.block_on(async move {
        drop(session);
    });
}
