// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Command builder: validated device operations on top of a [`FrameSink`]
//!
//! Operations never return failures. Invalid input drops the command, and
//! transport errors are logged and swallowed; the caller learns about link
//! trouble from the session's status events instead.

use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, error, info, warn};
use ts300_protocol::{CommandError, DeviceCommand, MicOperation, MicRole, Topology};

use crate::sink::FrameSink;

pub struct Ts300Controller<S: FrameSink> {
    sink: S,
    diagnostics: AtomicBool,
}

impl<S: FrameSink> Ts300Controller<S> {
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            diagnostics: AtomicBool::new(false),
        }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Log rejected commands and every frame sent
    pub fn enable_diagnostics(&self) {
        self.diagnostics.store(true, Ordering::Relaxed);
        info!("[CONTROLLER] diagnostics enabled");
    }

    pub fn disable_diagnostics(&self) {
        self.diagnostics.store(false, Ordering::Relaxed);
        info!("[CONTROLLER] diagnostics disabled");
    }

    pub fn diagnostics_enabled(&self) -> bool {
        self.diagnostics.load(Ordering::Relaxed)
    }

    /// Switch arbitration mode. `mode` and `delegate_count_mode` must both be
    /// in 1..=4.
    pub fn set_conference_mode(&self, topology: Topology, mode: u16, delegate_count_mode: u16) {
        let command = DeviceCommand::conference_mode(topology, mode, delegate_count_mode);
        self.submit("conference mode", command);
    }

    /// Master volume in 0..=31
    pub fn set_master_volume(&self, volume: u16) {
        self.submit("master volume", DeviceCommand::master_volume(volume));
    }

    pub fn mic_control(&self, id: u16, operation: MicOperation, topology: Topology, role: MicRole) {
        match operation {
            MicOperation::On => self.mic_on(topology, role, id),
            MicOperation::Off => self.mic_off(topology, role, id),
        }
    }

    /// Numeric selectors as host control systems pass them:
    /// `operate` 1 = on / 0 = off, `connection_type` 1 = wireless / 0 = wired,
    /// `delegate_type` 1 = delegate / 0 = chairman.
    pub fn mic_control_raw(&self, id: u16, operate: u16, connection_type: u16, delegate_type: u16) {
        match parse_selectors(operate, connection_type, delegate_type) {
            Ok((operation, topology, role)) => self.mic_control(id, operation, topology, role),
            Err(e) => self.reject("mic control", &e),
        }
    }

    pub fn mic_on(&self, topology: Topology, role: MicRole, id: u16) {
        let command = DeviceCommand::mic_switch(topology, id, MicOperation::On, role);
        self.submit("mic on", command);
    }

    pub fn mic_off(&self, topology: Topology, role: MicRole, id: u16) {
        let command = DeviceCommand::mic_switch(topology, id, MicOperation::Off, role);
        self.submit("mic off", command);
    }

    /// Mute every wireless unit at once
    pub fn all_wireless_units_off(&self) {
        self.submit("all wireless units off", Ok(DeviceCommand::AllWirelessUnitsOff));
    }

    /// Raw ASCII passthrough
    pub fn send_text(&self, text: &str) {
        match self.sink.send_text(text) {
            Ok(()) => {
                if self.diagnostics_enabled() {
                    debug!("[CONTROLLER] text sent: {:?}", text);
                }
            }
            Err(e) => self.report_send_failure("text", &e),
        }
    }

    fn submit(&self, operation: &str, command: Result<DeviceCommand, CommandError>) {
        let command = match command {
            Ok(command) => command,
            Err(e) => {
                self.reject(operation, &e);
                return;
            }
        };

        let frame = command.encode();
        match self.sink.send_frame(frame.as_bytes()) {
            Ok(()) => {
                if self.diagnostics_enabled() {
                    debug!("[CONTROLLER] {} sent: {}", command, frame);
                }
            }
            Err(e) => self.report_send_failure(&command.to_string(), &e),
        }
    }

    /// Link trouble is expected while reconnecting; anything else is a fault
    fn report_send_failure(&self, what: &str, e: &S::Error) {
        if S::is_transient(e) {
            warn!("[CONTROLLER] {} not sent, link down: {}", what, e);
        } else {
            error!("[CONTROLLER] {} not sent: {}", what, e);
        }
    }

    fn reject(&self, operation: &str, error: &CommandError) {
        if self.diagnostics_enabled() {
            warn!("[CONTROLLER] {} rejected: {}", operation, error);
        }
    }
}

fn parse_selectors(
    operate: u16,
    connection_type: u16,
    delegate_type: u16,
) -> Result<(MicOperation, Topology, MicRole), CommandError> {
    Ok((
        MicOperation::try_from(operate)?,
        Topology::try_from(connection_type)?,
        MicRole::try_from(delegate_type)?,
    ))
}
