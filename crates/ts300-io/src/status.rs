// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Socket status codes reported to the subscriber.
//!
//! The numeric codes are part of the external interface and follow the table
//! below, not the declaration order of any enum.

use std::fmt::{Display, Formatter};
use std::io;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SocketStatus {
    NoConnect,
    Waiting,
    Connected,
    ConnectFailed,
    BrokenRemotely,
    BrokenLocally,
    DnsLookup,
    DnsFailed,
    DnsResolved,
    LinkLost,
    SocketNotExist,
}

/// (status, code, label) for every status
pub const SOCKET_STATUS_TABLE: [(SocketStatus, u16, &str); 11] = [
    (SocketStatus::NoConnect, 0, "SOCKET_STATUS_NO_CONNECT"),
    (SocketStatus::Waiting, 1, "SOCKET_STATUS_WAITING"),
    (SocketStatus::Connected, 2, "SOCKET_STATUS_CONNECTED"),
    (SocketStatus::ConnectFailed, 3, "SOCKET_STATUS_CONNECT_FAILED"),
    (SocketStatus::BrokenRemotely, 4, "SOCKET_STATUS_BROKEN_REMOTELY"),
    (SocketStatus::BrokenLocally, 5, "SOCKET_STATUS_BROKEN_LOCALLY"),
    (SocketStatus::DnsLookup, 6, "SOCKET_STATUS_DNS_LOOKUP"),
    (SocketStatus::DnsFailed, 7, "SOCKET_STATUS_DNS_FAILED"),
    (SocketStatus::DnsResolved, 8, "SOCKET_STATUS_DNS_RESOLVED"),
    (SocketStatus::LinkLost, 9, "SOCKET_STATUS_LINK_LOST"),
    (SocketStatus::SocketNotExist, 10, "SOCKET_STATUS_SOCKET_NOT_EXIST"),
];

impl SocketStatus {
    fn entry(&self) -> &'static (SocketStatus, u16, &'static str) {
        // Table covers every variant
        SOCKET_STATUS_TABLE
            .iter()
            .find(|(status, _, _)| status == self)
            .unwrap_or(&SOCKET_STATUS_TABLE[0])
    }

    pub fn code(&self) -> u16 {
        self.entry().1
    }

    pub fn label(&self) -> &'static str {
        self.entry().2
    }

    pub fn from_code(code: u16) -> Option<Self> {
        SOCKET_STATUS_TABLE
            .iter()
            .find(|(_, c, _)| *c == code)
            .map(|(status, _, _)| *status)
    }

    pub fn is_connected(&self) -> bool {
        *self == SocketStatus::Connected
    }

    /// Status for an I/O failure on an established link
    pub fn from_link_error(error: &io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::UnexpectedEof
            | io::ErrorKind::BrokenPipe => SocketStatus::BrokenRemotely,
            _ => SocketStatus::LinkLost,
        }
    }
}

impl Display for SocketStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}
