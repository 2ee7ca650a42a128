// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Single-byte text conversions used at the socket boundary

/// Decode bytes as ISO-8859-1: every byte becomes the code point of the same
/// value, so no input is ever rejected or altered.
pub fn decode_single_byte(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

/// Encode text as ASCII, replacing anything outside 0..=127 with `?`
pub fn encode_ascii(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| if c.is_ascii() { c as u8 } else { b'?' })
        .collect()
}
