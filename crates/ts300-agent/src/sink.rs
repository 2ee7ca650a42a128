// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Where encoded frames go

use std::sync::Arc;

use parking_lot::Mutex;
use ts300_io::{TransportError, TransportSession};

/// Byte-level output used by [`Ts300Controller`](crate::Ts300Controller)
pub trait FrameSink: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Write one complete frame
    fn send_frame(&self, frame: &[u8]) -> Result<(), Self::Error>;

    /// Write a raw ASCII string
    fn send_text(&self, text: &str) -> Result<(), Self::Error>;

    /// Whether `error` clears up on its own once the link is back
    fn is_transient(_error: &Self::Error) -> bool {
        false
    }
}

impl FrameSink for TransportSession {
    type Error = TransportError;

    fn send_frame(&self, frame: &[u8]) -> Result<(), Self::Error> {
        self.send(frame)
    }

    fn send_text(&self, text: &str) -> Result<(), Self::Error> {
        TransportSession::send_text(self, text)
    }

    fn is_transient(error: &Self::Error) -> bool {
        error.is_transient()
    }
}

impl<S: FrameSink + ?Sized> FrameSink for Arc<S> {
    type Error = S::Error;

    fn send_frame(&self, frame: &[u8]) -> Result<(), Self::Error> {
        (**self).send_frame(frame)
    }

    fn send_text(&self, text: &str) -> Result<(), Self::Error> {
        (**self).send_text(text)
    }

    fn is_transient(error: &Self::Error) -> bool {
        S::is_transient(error)
    }
}

/// In-memory sink that keeps every write. Used for dry runs and tests.
#[derive(Debug, Default)]
pub struct RecordingSink {
    writes: Mutex<Vec<Vec<u8>>>,
    offline: Mutex<bool>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// While offline every write fails with `NotConnected`
    pub fn set_offline(&self, offline: bool) {
        *self.offline.lock() = offline;
    }

    /// Everything written so far, oldest first
    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.writes.lock().clone()
    }

    pub fn last_write(&self) -> Option<Vec<u8>> {
        self.writes.lock().last().cloned()
    }

    pub fn clear(&self) {
        self.writes.lock().clear();
    }

    fn record(&self, bytes: &[u8]) -> Result<(), TransportError> {
        if *self.offline.lock() {
            return Err(TransportError::NotConnected);
        }
        self.writes.lock().push(bytes.to_vec());
        Ok(())
    }
}

impl FrameSink for RecordingSink {
    type Error = TransportError;

    fn send_frame(&self, frame: &[u8]) -> Result<(), Self::Error> {
        self.record(frame)
    }

    fn send_text(&self, text: &str) -> Result<(), Self::Error> {
        self.record(&ts300_io::text::encode_ascii(text))
    }

    fn is_transient(error: &Self::Error) -> bool {
        error.is_transient()
    }
}
