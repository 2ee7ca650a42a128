// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # ts300-observability
//!
//! Logging setup shared by the TS-300 bridge binaries, with per-crate debug
//! flag support.
//!
//! ## Features
//! - `file-logging`: daily rolling log files next to the console output

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod cli;
pub mod init;

pub use cli::*;
pub use init::*;

/// Workspace crates that accept `--debug-<crate>`
pub const KNOWN_CRATES: &[&str] = &[
    "ts300",
    "ts300-protocol",
    "ts300-io",
    "ts300-agent",
    "ts300-config",
    "ts300-observability",
];
