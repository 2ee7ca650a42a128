// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # ts300-agent
//!
//! Device operations for TS-300/TS-03 conference units.
//!
//! [`Ts300Controller`] validates each operation, encodes it with
//! `ts300-protocol` and writes the frame to a [`FrameSink`]. The usual sink is
//! a `ts300_io::TransportSession`; [`Ts300Bridge`] builds both from a
//! configuration file.
//!
//! ```rust
//! use ts300_agent::{RecordingSink, Ts300Controller};
//! use ts300_protocol::{MicRole, Topology};
//!
//! let controller = Ts300Controller::new(RecordingSink::new());
//! controller.mic_on(Topology::Wired, MicRole::Chairman, 1);
//! assert_eq!(controller.sink().writes().len(), 1);
//! ```

pub mod bridge;
pub mod controller;
pub mod error;
pub mod sink;

pub use bridge::{session_options, Ts300Bridge};
pub use controller::Ts300Controller;
pub use error::{BridgeError, Result};
pub use sink::{FrameSink, RecordingSink};
