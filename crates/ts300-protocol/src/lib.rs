// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # ts300-protocol
//!
//! Binary command encoding for TS-300/TS-03 class conference microphone units.
//!
//! Every command sent to the unit is a [`Frame`]: the fixed prefix `AA EE 08`,
//! a command-specific section, zero padding, and the fixed postfix `EE FC`.
//! This crate is pure: it builds frames and validates inputs, it never touches
//! a socket.
//!
//! ```rust
//! use ts300_protocol::{DeviceCommand, MasterVolume};
//!
//! let frame = DeviceCommand::MasterVolume(MasterVolume::new(12)?).encode();
//! assert_eq!(
//!     frame.as_bytes(),
//!     &[0xAA, 0xEE, 0x08, 0xFF, 0xE3, 0x82, 0x01, 0x0C, 0x00, 0x00, 0x00, 0x00, 0xEE, 0xFC]
//! );
//! # Ok::<(), ts300_protocol::CommandError>(())
//! ```

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod address;
pub mod command;
pub mod error;
pub mod frame;
pub mod tables;

pub use address::{MicAddress, MicId, Topology};
pub use command::{
    ConferenceMode, DelegateCountMode, DeviceCommand, MasterVolume, MicOperation, MicRole,
};
pub use error::{CommandError, CommandResult};
pub use frame::Frame;
