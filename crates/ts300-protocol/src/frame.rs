// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Frame assembly

use std::fmt::{Display, Formatter};

use crate::tables::{FRAME_POSTFIX, FRAME_PREFIX};

/// A complete binary message ready for transmission.
///
/// Frames are built per send and dropped right after; nothing retains them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    bytes: Vec<u8>,
}

impl Frame {
    /// Lay out `segments` contiguously between [`FRAME_PREFIX`] and
    /// [`FRAME_POSTFIX`].
    ///
    /// The buffer length is exactly the sum of all segment lengths. Segment
    /// contents are the caller's responsibility: encoders in this crate only
    /// pass fixed-size table entries and little-endian fields.
    ///
    /// Length varies by command: 13 bytes for mic switching and the
    /// all-wireless-off literal, 14 for master volume, 20 (wired) or 19
    /// (wireless) for conference mode.
    pub fn assemble(segments: &[&[u8]]) -> Self {
        let body_len: usize = segments.iter().map(|s| s.len()).sum();
        let mut bytes = Vec::with_capacity(FRAME_PREFIX.len() + body_len + FRAME_POSTFIX.len());
        bytes.extend_from_slice(&FRAME_PREFIX);
        for segment in segments {
            bytes.extend_from_slice(segment);
        }
        bytes.extend_from_slice(&FRAME_POSTFIX);
        Self { bytes }
    }

    /// Wrap a literal, already complete frame
    pub fn from_literal(bytes: &[u8]) -> Self {
        Self {
            bytes: bytes.to_vec(),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

impl AsRef<[u8]> for Frame {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

/// Upper-case hex, space separated (`AA EE 08 ...`)
impl Display for Frame {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for (i, byte) in self.bytes.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{:02X}", byte)?;
        }
        Ok(())
    }
}
