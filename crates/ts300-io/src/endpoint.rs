// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use std::fmt::{Display, Formatter};

use crate::error::{Result, TransportError};

/// Receive buffer used when the caller passes 0
pub const DEFAULT_RECEIVE_BUFFER_SIZE: usize = 1024;

/// Where the device lives and how much to read per receive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    address: String,
    port: u16,
    receive_buffer_size: usize,
}

impl Endpoint {
    /// Validate an endpoint: the port must be positive and the address
    /// non-empty.
    pub fn new(address: &str, port: u16, receive_buffer_size: usize) -> Result<Self> {
        let address = address.trim();
        if address.is_empty() {
            return Err(TransportError::InvalidEndpoint(
                "device address is empty".to_string(),
            ));
        }
        if port == 0 {
            return Err(TransportError::InvalidEndpoint(format!(
                "port for {} must be positive",
                address
            )));
        }
        let receive_buffer_size = if receive_buffer_size == 0 {
            DEFAULT_RECEIVE_BUFFER_SIZE
        } else {
            receive_buffer_size
        };
        Ok(Self {
            address: address.to_string(),
            port,
            receive_buffer_size,
        })
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn receive_buffer_size(&self) -> usize {
        self.receive_buffer_size
    }
}

impl Display for Endpoint {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.address, self.port)
    }
}
