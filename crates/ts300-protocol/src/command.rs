// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Validated device commands and their frame encodings

use std::fmt::{Display, Formatter};

use byteorder::{ByteOrder, LittleEndian};

use crate::address::{MicAddress, Topology};
use crate::error::{CommandError, CommandResult};
use crate::frame::Frame;
use crate::tables::*;

/// Device-wide arbitration policy among open microphones
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum ConferenceMode {
    Fifo = 1,
    Normal = 2,
    Voice = 3,
    Apply = 4,
}

impl ConferenceMode {
    pub fn from_number(mode: u16) -> CommandResult<Self> {
        match mode {
            1 => Ok(ConferenceMode::Fifo),
            2 => Ok(ConferenceMode::Normal),
            3 => Ok(ConferenceMode::Voice),
            4 => Ok(ConferenceMode::Apply),
            _ => Err(CommandError::InvalidConferenceMode(mode)),
        }
    }

    pub fn number(&self) -> u16 {
        *self as u16
    }

    /// The mode goes on the wire as its own number
    pub fn wire_value(&self) -> u32 {
        self.number() as u32
    }
}

impl Display for ConferenceMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ConferenceMode::Fifo => "FIFO",
            ConferenceMode::Normal => "Normal",
            ConferenceMode::Voice => "Voice",
            ConferenceMode::Apply => "Apply",
        };
        write!(f, "{}", name)
    }
}

/// Delegate-count position in 1..=4.
///
/// The encoded value depends on the topology, see
/// [`WIRED_DELEGATE_COUNT_VALUES`] and [`WIRELESS_DELEGATE_COUNT_VALUES`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DelegateCountMode(u16);

impl DelegateCountMode {
    pub fn from_position(position: u16) -> CommandResult<Self> {
        if (1..=4).contains(&position) {
            Ok(Self(position))
        } else {
            Err(CommandError::InvalidDelegateCountMode(position))
        }
    }

    pub fn position(&self) -> u16 {
        self.0
    }

    pub fn wire_value(&self, topology: Topology) -> u32 {
        let table = match topology {
            Topology::Wired => &WIRED_DELEGATE_COUNT_VALUES,
            Topology::Wireless => &WIRELESS_DELEGATE_COUNT_VALUES,
        };
        table[(self.0 - 1) as usize]
    }
}

/// Master volume in 0..=31
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MasterVolume(u16);

impl MasterVolume {
    pub const MAX: u16 = 31;

    pub fn new(volume: u16) -> CommandResult<Self> {
        if volume <= Self::MAX {
            Ok(Self(volume))
        } else {
            Err(CommandError::VolumeOutOfRange(volume))
        }
    }

    pub fn get(&self) -> u16 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MicOperation {
    On,
    Off,
}

impl TryFrom<u16> for MicOperation {
    type Error = CommandError;

    /// Host-platform selector: 1 = on, 0 = off
    fn try_from(value: u16) -> CommandResult<Self> {
        match value {
            1 => Ok(MicOperation::On),
            0 => Ok(MicOperation::Off),
            _ => Err(CommandError::InvalidSelector {
                kind: "operation",
                value,
            }),
        }
    }
}

/// Arbitration priority of a microphone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MicRole {
    Delegate,
    Chairman,
}

impl TryFrom<u16> for MicRole {
    type Error = CommandError;

    /// Host-platform selector: 1 = delegate, 0 = chairman
    fn try_from(value: u16) -> CommandResult<Self> {
        match value {
            1 => Ok(MicRole::Delegate),
            0 => Ok(MicRole::Chairman),
            _ => Err(CommandError::InvalidSelector { kind: "role", value }),
        }
    }
}

/// Opcode for one (operation, role) pair
pub fn mic_switch_opcode(operation: MicOperation, role: MicRole) -> [u8; 2] {
    match (operation, role) {
        (MicOperation::On, MicRole::Delegate) => OPCODE_MIC_ON_DELEGATE,
        (MicOperation::Off, MicRole::Delegate) => OPCODE_MIC_OFF_DELEGATE,
        (MicOperation::On, MicRole::Chairman) => OPCODE_MIC_ON_CHAIRMAN,
        (MicOperation::Off, MicRole::Chairman) => OPCODE_MIC_OFF_CHAIRMAN,
    }
}

/// Every command the unit accepts. Variants hold only validated values, so
/// encoding cannot fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceCommand {
    ConferenceMode {
        topology: Topology,
        mode: ConferenceMode,
        delegate_count: DelegateCountMode,
    },
    MasterVolume(MasterVolume),
    MicSwitch {
        address: MicAddress,
        operation: MicOperation,
        role: MicRole,
    },
    AllWirelessUnitsOff,
}

impl DeviceCommand {
    /// Build a conference-mode command from raw numbers; both must be in 1..=4
    pub fn conference_mode(
        topology: Topology,
        mode: u16,
        delegate_count_mode: u16,
    ) -> CommandResult<Self> {
        Ok(DeviceCommand::ConferenceMode {
            topology,
            mode: ConferenceMode::from_number(mode)?,
            delegate_count: DelegateCountMode::from_position(delegate_count_mode)?,
        })
    }

    pub fn master_volume(volume: u16) -> CommandResult<Self> {
        Ok(DeviceCommand::MasterVolume(MasterVolume::new(volume)?))
    }

    pub fn mic_switch(
        topology: Topology,
        id: u16,
        operation: MicOperation,
        role: MicRole,
    ) -> CommandResult<Self> {
        Ok(DeviceCommand::MicSwitch {
            address: MicAddress::new(topology, id)?,
            operation,
            role,
        })
    }

    pub fn encode(&self) -> Frame {
        match self {
            DeviceCommand::ConferenceMode {
                topology,
                mode,
                delegate_count,
            } => {
                let mut values = [0u8; 8];
                LittleEndian::write_u32(&mut values[..4], mode.wire_value());
                LittleEndian::write_u32(&mut values[4..], delegate_count.wire_value(*topology));
                let (opcode, unit): (&[u8], &[u8]) = match topology {
                    Topology::Wired => (&OPCODE_WIRED_CONFERENCE_MODE, &UNIT_WIRED_CONFERENCE),
                    Topology::Wireless => {
                        (&OPCODE_WIRELESS_CONFERENCE_MODE, &UNIT_WIRELESS_CONFERENCE)
                    }
                };
                Frame::assemble(&[opcode, unit, &values, &RESERVED_3])
            }
            DeviceCommand::MasterVolume(volume) => {
                let mut value = [0u8; 2];
                LittleEndian::write_u16(&mut value, volume.get());
                Frame::assemble(&[&OPCODE_MASTER_VOLUME, &UNIT_MASTER_VOLUME, &value, &RESERVED_3])
            }
            DeviceCommand::MicSwitch {
                address,
                operation,
                role,
            } => Frame::assemble(&[
                &address.to_wire(),
                &UNIT_MIC_SWITCH,
                &mic_switch_opcode(*operation, *role),
                &RESERVED_2,
            ]),
            DeviceCommand::AllWirelessUnitsOff => Frame::from_literal(&ALL_WIRELESS_UNITS_OFF),
        }
    }
}

impl Display for DeviceCommand {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            DeviceCommand::ConferenceMode {
                topology,
                mode,
                delegate_count,
            } => write!(
                f,
                "{} conference mode {} (delegate count mode {})",
                topology,
                mode,
                delegate_count.position()
            ),
            DeviceCommand::MasterVolume(volume) => write!(f, "master volume {}", volume.get()),
            DeviceCommand::MicSwitch {
                address,
                operation,
                role,
            } => write!(f, "{:?} {:?} {}", operation, role, address),
            DeviceCommand::AllWirelessUnitsOff => write!(f, "all wireless units off"),
        }
    }
}
