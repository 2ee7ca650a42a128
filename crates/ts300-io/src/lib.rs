// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # ts300-io
//!
//! Long-lived TCP session to a TS-300/TS-03 conference unit.
//!
//! # Features
//! - Endpoint validation before any network activity
//! - Background connect with address lookup
//! - Fixed-delay automatic reconnection after link loss or failed attempts
//! - Manual disconnect that suppresses reconnection until the next `connect()`
//! - Persistent receive loop delivering raw text to a subscriber
//! - Status notifications with fixed numeric codes
//!
//! # Quick Start
//!
//! ```no_run
//! use std::time::Duration;
//! use ts300_io::{SessionEvent, SessionOptions, TransportSession};
//!
//! let options = SessionOptions::default().with_reconnect_delay(Duration::from_secs(5));
//! let (session, events) = TransportSession::with_channel(options)?;
//! session.initialize("192.168.1.50", 5000, 0)?;
//! session.connect();
//!
//! if let Ok(SessionEvent::ConnectionStatus { label, code }) = events.recv() {
//!     println!("{} ({})", label, code);
//! }
//! # Ok::<(), ts300_io::TransportError>(())
//! ```
//!
//! # Architecture
//!
//! [`SessionStateMachine`] holds every decision and is tested without sockets.
//! [`TransportSession`] executes its actions on tokio: connect attempts and
//! reconnect timers are spawned tasks, one receive loop lives as long as the
//! session. Events are delivered through a [`SessionEventCallback`] outside
//! the session lock.

pub mod endpoint;
pub mod error;
pub mod events;
pub mod reconnect;
pub mod session;
pub mod state_machine;
pub mod status;
pub mod text;

pub use endpoint::{Endpoint, DEFAULT_RECEIVE_BUFFER_SIZE};
pub use error::{Result, TransportError};
pub use events::{channel_callback, SessionEvent, SessionEventCallback};
pub use reconnect::{DisconnectPolicy, ReconnectPolicy, DEFAULT_RECONNECT_DELAY};
pub use session::{SessionOptions, TransportSession};
pub use state_machine::{ConnectionState, SessionAction, SessionStateMachine};
pub use status::{SocketStatus, SOCKET_STATUS_TABLE};
