// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Validation errors raised while building device commands

/// Result type alias using CommandError
pub type CommandResult<T> = std::result::Result<T, CommandError>;

/// Reasons a command could not be turned into a frame
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    /// Microphone id outside (0, 4095]
    #[error("Microphone id {0} is outside 1..=4095")]
    MicIdOutOfRange(u16),

    /// Wireless addressing only covers ids up to 300
    #[error("Microphone id {0} cannot be addressed wirelessly (max 300)")]
    WirelessIdOutOfRange(u16),

    /// Master volume above 31
    #[error("Master volume {0} is outside 0..=31")]
    VolumeOutOfRange(u16),

    /// Conference mode number outside [1,4]
    #[error("Conference mode {0} is outside 1..=4")]
    InvalidConferenceMode(u16),

    /// Delegate-count position outside [1,4]
    #[error("Delegate count mode {0} is outside 1..=4")]
    InvalidDelegateCountMode(u16),

    /// Numeric selector that does not map to a known variant
    #[error("Invalid {kind} selector: {value}")]
    InvalidSelector { kind: &'static str, value: u16 },
}
