// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Outbound notifications to the owning component

use std::sync::mpsc;
use std::sync::Arc;

use crate::status::SocketStatus;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Raw inbound bytes decoded as ISO-8859-1, no framing applied
    ReceivedText(String),
    /// Socket status label plus its fixed numeric code
    ConnectionStatus { label: &'static str, code: u16 },
    /// Outcome of `initialize()`
    Initialized(bool),
}

impl SessionEvent {
    pub fn status(status: SocketStatus) -> Self {
        SessionEvent::ConnectionStatus {
            label: status.label(),
            code: status.code(),
        }
    }

    /// Status carried by a `ConnectionStatus` event
    pub fn socket_status(&self) -> Option<SocketStatus> {
        match self {
            SessionEvent::ConnectionStatus { code, .. } => SocketStatus::from_code(*code),
            _ => None,
        }
    }
}

/// Type alias for the subscriber callback.
///
/// Called from runtime worker threads as well as the caller's thread; it must
/// not block for long.
pub type SessionEventCallback = Arc<dyn Fn(SessionEvent) + Send + Sync + 'static>;

/// Callback that forwards every event into a std channel
pub fn channel_callback() -> (SessionEventCallback, mpsc::Receiver<SessionEvent>) {
    let (tx, rx) = mpsc::channel();
    let tx = parking_lot::Mutex::new(tx);
    let callback: SessionEventCallback = Arc::new(move |event| {
        // Receiver gone means nobody is listening any more
        let _ = tx.lock().send(event);
    });
    (callback, rx)
}
