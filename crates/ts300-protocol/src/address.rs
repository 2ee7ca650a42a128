// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Microphone addressing.
//!
//! Wired and wireless microphones share the id range 1..=4095. Wired units are
//! addressed by their raw id; wireless units (ids up to 300) carry the `0x30`
//! high byte. Both forms go on the wire as 16-bit little-endian.

use std::fmt::{Display, Formatter};

use byteorder::{ByteOrder, LittleEndian};

use crate::error::{CommandError, CommandResult};
use crate::tables::WIRELESS_ADDRESS_HIGH_BYTE;

/// How the microphone is attached to the central unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topology {
    Wired,
    Wireless,
}

impl TryFrom<u16> for Topology {
    type Error = CommandError;

    /// Host-platform selector: 0 = wired, 1 = wireless
    fn try_from(value: u16) -> CommandResult<Self> {
        match value {
            0 => Ok(Topology::Wired),
            1 => Ok(Topology::Wireless),
            _ => Err(CommandError::InvalidSelector {
                kind: "topology",
                value,
            }),
        }
    }
}

impl Display for Topology {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Topology::Wired => write!(f, "wired"),
            Topology::Wireless => write!(f, "wireless"),
        }
    }
}

/// A microphone id in 1..=4095
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MicId(u16);

impl MicId {
    pub const MIN: u16 = 1;
    pub const MAX: u16 = 4095;
    /// Highest id reachable through the wireless receiver
    pub const WIRELESS_MAX: u16 = 300;

    pub fn new(id: u16) -> CommandResult<Self> {
        if (Self::MIN..=Self::MAX).contains(&id) {
            Ok(Self(id))
        } else {
            Err(CommandError::MicIdOutOfRange(id))
        }
    }

    pub fn get(&self) -> u16 {
        self.0
    }
}

impl Display for MicId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A microphone id resolved against its topology
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MicAddress {
    topology: Topology,
    id: MicId,
}

impl MicAddress {
    /// Resolve `id` for `topology`, rejecting ids the topology cannot reach
    pub fn new(topology: Topology, id: u16) -> CommandResult<Self> {
        let id = MicId::new(id)?;
        if topology == Topology::Wireless && id.get() > MicId::WIRELESS_MAX {
            return Err(CommandError::WirelessIdOutOfRange(id.get()));
        }
        Ok(Self { topology, id })
    }

    pub fn wired(id: u16) -> CommandResult<Self> {
        Self::new(Topology::Wired, id)
    }

    pub fn wireless(id: u16) -> CommandResult<Self> {
        Self::new(Topology::Wireless, id)
    }

    pub fn topology(&self) -> Topology {
        self.topology
    }

    pub fn id(&self) -> MicId {
        self.id
    }

    /// The 16-bit address value the unit expects
    pub fn value(&self) -> u16 {
        match self.topology {
            Topology::Wired => self.id.get(),
            Topology::Wireless => (WIRELESS_ADDRESS_HIGH_BYTE << 8) | self.id.get(),
        }
    }

    /// Address in wire order (little-endian)
    pub fn to_wire(&self) -> [u8; 2] {
        let mut buf = [0u8; 2];
        LittleEndian::write_u16(&mut buf, self.value());
        buf
    }
}

impl Display for MicAddress {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} mic {} (0x{:04X})", self.topology, self.id, self.value())
    }
}
