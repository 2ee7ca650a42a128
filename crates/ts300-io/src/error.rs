// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Error types for the transport session

/// Result type alias using TransportError
pub type Result<T> = std::result::Result<T, TransportError>;

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// `initialize()` has not succeeded yet
    #[error("Transport session not initialized - call initialize() first")]
    NotInitialized,

    /// Endpoint rejected by `initialize()`
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// No live socket to write to
    #[error("Not connected to device")]
    NotConnected,

    /// Write failed on a live socket
    #[error("Send failed: {0}")]
    SendFailed(#[from] std::io::Error),

    /// Could not build the tokio runtime
    #[error("Runtime error: {0}")]
    Runtime(String),
}

impl TransportError {
    /// Errors that clear up once the link comes back
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            TransportError::NotConnected | TransportError::SendFailed(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_errors_are_transient() {
        assert!(TransportError::NotConnected.is_transient());
        let reset = std::io::Error::from(std::io::ErrorKind::ConnectionReset);
        assert!(TransportError::from(reset).is_transient());
        assert!(!TransportError::NotInitialized.is_transient());
        assert!(!TransportError::Runtime("no threads".to_string()).is_transient());
    }
}
