// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration file to device bytes, through the umbrella crate

use std::fs;
use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::mpsc::Receiver;
use std::time::{Duration, Instant};

use tempfile::tempdir;
use ts300::prelude::*;

fn next_matching<F>(events: &Receiver<SessionEvent>, mut matches: F) -> SessionEvent
where
    F: FnMut(&SessionEvent) -> bool,
{
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        let remaining = deadline
            .checked_duration_since(Instant::now())
            .expect("timed out waiting for session event");
        let event = events.recv_timeout(remaining).expect("session event");
        if matches(&event) {
            return event;
        }
    }
}

fn status_is(event: &SessionEvent, status: SocketStatus) -> bool {
    event.socket_status() == Some(status)
}

#[test]
fn test_config_file_drives_a_live_bridge() {
    let device = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = device.local_addr().unwrap().port();

    let dir = tempdir().unwrap();
    let config_path = dir.path().join("ts300_configuration.toml");
    fs::write(
        &config_path,
        format!(
            "[device]\nhost = \"127.0.0.1\"\nport = {port}\nreceive_buffer_size = 32\n\n\
             [reconnect]\ndelay_ms = 200\n\n[logging]\ndiagnostics = true\n"
        ),
    )
    .unwrap();

    let config = load_config(Some(&config_path), None).unwrap();
    validate_config(&config).unwrap();

    let (bridge, events) = Ts300Bridge::with_channel(&config).unwrap();
    assert_eq!(events.recv_timeout(Duration::from_secs(2)).unwrap(), SessionEvent::Initialized(true));

    bridge.connect();
    let (mut unit, _) = device.accept().unwrap();
    next_matching(&events, |e| status_is(e, SocketStatus::Connected));

    // Device to bridge: raw text, no framing
    unit.write_all(b"MIC 0001 ON\r\n").unwrap();
    let event = next_matching(&events, |e| matches!(e, SessionEvent::ReceivedText(_)));
    assert_eq!(event, SessionEvent::ReceivedText("MIC 0001 ON\r\n".to_string()));

    // Bridge to device: conference mode frame
    bridge.controller().set_conference_mode(Topology::Wireless, 2, 4);
    let mut frame = [0u8; 19];
    unit.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
    unit.read_exact(&mut frame).unwrap();
    assert_eq!(
        frame,
        [
            0xAA, 0xEE, 0x08, 0xFF, 0xEA, 0x82, 0x02, 0x00, 0x00, 0x00, 0x06, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0xEE, 0xFC
        ]
    );

    // Unit drops the link; the bridge comes back on its own
    drop(unit);
    next_matching(&events, |e| status_is(e, SocketStatus::BrokenRemotely));
    let (mut unit, _) = device.accept().unwrap();
    next_matching(&events, |e| status_is(e, SocketStatus::Connected));
    assert_eq!(bridge.state(), ConnectionState::Connected);

    // Inbound data still flows on the new link
    unit.write_all(b"MIC 0002 OFF\r\n").unwrap();
    let mut text = String::new();
    while text.len() < 14 {
        if let SessionEvent::ReceivedText(chunk) =
            next_matching(&events, |e| matches!(e, SessionEvent::ReceivedText(_)))
        {
            text.push_str(&chunk);
        }
    }
    assert_eq!(text, "MIC 0002 OFF\r\n");
}
