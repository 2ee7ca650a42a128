// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Session plus controller, built from a [`Ts300Config`]

use std::sync::mpsc::Receiver;
use std::sync::Arc;

use tracing::info;
use ts300_config::{validate_config, DisconnectPolicyConfig, Ts300Config};
use ts300_io::{
    channel_callback, ConnectionState, DisconnectPolicy, SessionEvent, SessionEventCallback,
    SessionOptions, TransportSession,
};

use crate::controller::Ts300Controller;
use crate::error::Result;

/// Session options described by the `[reconnect]` section
pub fn session_options(config: &Ts300Config) -> SessionOptions {
    let disconnect_policy = match config.reconnect.disconnect_policy {
        DisconnectPolicyConfig::WhenConnected => DisconnectPolicy::WhenConnected,
        DisconnectPolicyConfig::Always => DisconnectPolicy::Always,
    };
    SessionOptions::default()
        .with_reconnect_delay(config.reconnect.delay())
        .with_disconnect_policy(disconnect_policy)
}

/// One configured device: an initialized session and a controller writing to
/// it. Nothing connects until [`connect`](Self::connect).
pub struct Ts300Bridge {
    session: Arc<TransportSession>,
    controller: Ts300Controller<Arc<TransportSession>>,
}

impl Ts300Bridge {
    /// Validate `config`, create the session and initialize it from `[device]`
    pub fn from_config(config: &Ts300Config, events: Option<SessionEventCallback>) -> Result<Self> {
        validate_config(config)?;

        let session = Arc::new(TransportSession::new(session_options(config), events)?);
        session.initialize(
            &config.device.host,
            config.device.port,
            config.device.receive_buffer_size,
        )?;

        let controller = Ts300Controller::new(Arc::clone(&session));
        if config.logging.diagnostics {
            controller.enable_diagnostics();
        }

        info!(
            "[BRIDGE] ready for {}:{} (reconnect delay {} ms)",
            config.device.host, config.device.port, config.reconnect.delay_ms
        );
        Ok(Self {
            session,
            controller,
        })
    }

    /// Bridge whose session events arrive on a std channel
    pub fn with_channel(config: &Ts300Config) -> Result<(Self, Receiver<SessionEvent>)> {
        let (callback, events) = channel_callback();
        Ok((Self::from_config(config, Some(callback))?, events))
    }

    pub fn connect(&self) {
        self.session.connect();
    }

    pub fn disconnect(&self) {
        self.session.disconnect();
    }

    pub fn state(&self) -> ConnectionState {
        self.session.state()
    }

    pub fn controller(&self) -> &Ts300Controller<Arc<TransportSession>> {
        &self.controller
    }

    pub fn session(&self) -> &Arc<TransportSession> {
        &self.session
    }
}
