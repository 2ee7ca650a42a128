// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # ts300 - TS-300/TS-03 Conference Unit Control Bridge
//!
//! Keeps a TCP link to a conference-microphone unit alive and turns device
//! operations (microphone on/off, conference mode, master volume, mass mute of
//! wireless units) into the unit's binary frames.
//!
//! ## Quick Start
//!
//! ```toml
//! [dependencies]
//! ts300 = "0.1"  # Default: full
//! ```
//!
//! ## Feature Flags
//!
//! - **`full`** (default): `agent` + `observability`
//! - **`agent`**: command builder and [`Ts300Bridge`](agent::Ts300Bridge)
//! - **`observability`**: logging initialisation and per-crate debug flags
//! - **`file-logging`**: daily rolling log files
//!
//! The frame codec, transport session and configuration loader are always
//! available.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use ts300::prelude::*;
//!
//! let config = load_config(None, None)?;
//! let (bridge, events) = Ts300Bridge::with_channel(&config)?;
//! bridge.connect();
//!
//! bridge.controller().mic_on(Topology::Wired, MicRole::Chairman, 12);
//! bridge.controller().set_master_volume(20);
//!
//! for event in events.iter() {
//!     println!("{:?}", event);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Architecture
//!
//! ```text
//! caller -> Ts300Controller (validate) -> DeviceCommand::encode -> TransportSession
//! TransportSession (raw bytes) -> SessionEvent::ReceivedText -> subscriber
//! ```

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================================================
// Core (always available)
// ============================================================================

pub use ts300_config as config;
pub use ts300_io as io;
pub use ts300_protocol as protocol;

// ============================================================================
// Optional components
// ============================================================================

#[cfg(feature = "agent")]
pub use ts300_agent as agent;

#[cfg(feature = "observability")]
pub use ts300_observability as observability;

/// Common imports
pub mod prelude {
    pub use ts300_config::{load_config, validate_config, Ts300Config};
    pub use ts300_io::{
        ConnectionState, SessionEvent, SessionOptions, SocketStatus, TransportError,
        TransportSession,
    };
    pub use ts300_protocol::{
        CommandError, DeviceCommand, Frame, MicAddress, MicOperation, MicRole, Topology,
    };

    #[cfg(feature = "agent")]
    pub use ts300_agent::{FrameSink, RecordingSink, Ts300Bridge, Ts300Controller};

    #[cfg(feature = "observability")]
    pub use ts300_observability::{init_logging, parse_debug_flags, CrateDebugFlags};
}
