// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Constant lookup data for the TS-03 wire protocol.
//!
//! Opcodes and unit identifiers are literal byte sequences and are written to
//! the wire in the order listed here. Only numeric payloads (addresses, volume,
//! mode values) go through little-endian encoding.

/// Leading marker of every frame
pub const FRAME_PREFIX: [u8; 3] = [0xAA, 0xEE, 0x08];

/// Trailing marker of every frame
pub const FRAME_POSTFIX: [u8; 2] = [0xEE, 0xFC];

// Conference arbitration mode
pub const OPCODE_WIRED_CONFERENCE_MODE: [u8; 2] = [0xFF, 0xE1];
pub const OPCODE_WIRELESS_CONFERENCE_MODE: [u8; 2] = [0xFF, 0xEA];
pub const UNIT_WIRED_CONFERENCE: [u8; 2] = [0x82, 0x01];
pub const UNIT_WIRELESS_CONFERENCE: [u8; 1] = [0x82];

// Master volume
pub const OPCODE_MASTER_VOLUME: [u8; 2] = [0xFF, 0xE3];
pub const UNIT_MASTER_VOLUME: [u8; 2] = [0x82, 0x01];

// Microphone switching
pub const UNIT_MIC_SWITCH: [u8; 2] = [0x80, 0x00];
pub const OPCODE_MIC_ON_DELEGATE: [u8; 2] = [0x05, 0x00];
pub const OPCODE_MIC_OFF_DELEGATE: [u8; 2] = [0x06, 0x00];
pub const OPCODE_MIC_ON_CHAIRMAN: [u8; 2] = [0x07, 0x00];
pub const OPCODE_MIC_OFF_CHAIRMAN: [u8; 2] = [0x08, 0x00];

/// High byte OR-ed into wireless microphone addresses
pub const WIRELESS_ADDRESS_HIGH_BYTE: u16 = 0x30;

pub const RESERVED_2: [u8; 2] = [0x00; 2];
pub const RESERVED_3: [u8; 3] = [0x00; 3];

/// Pre-baked "turn every wireless unit off" frame (opcode FF F0)
pub const ALL_WIRELESS_UNITS_OFF: [u8; 13] = [
    0xAA, 0xEE, 0x08, 0xFF, 0xF0, 0x80, 0x04, 0xE2, 0x00, 0x00, 0x00, 0xEE, 0xFC,
];

/// Delegate-count position (1..=4) to encoded value, wired units.
///
/// Position 3 encodes 4, not 3. Kept as the device protocol lists it.
pub const WIRED_DELEGATE_COUNT_VALUES: [u32; 4] = [1, 2, 4, 8];

/// Delegate-count position (1..=4) to encoded value, wireless units.
///
/// Position 4 encodes 6 where the wired table has 8. Kept as the device
/// protocol lists it; unconfirmed against vendor documentation.
pub const WIRELESS_DELEGATE_COUNT_VALUES: [u32; 4] = [1, 2, 4, 6];
