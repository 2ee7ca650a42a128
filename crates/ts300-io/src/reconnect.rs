// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Reconnection and disconnect policies

use std::time::Duration;

/// Delay before an automatic reconnect attempt
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(10);

/// Fixed-delay reconnection.
///
/// Every non-connected status observed while the caller has not asked to
/// disconnect schedules one one-shot timer with this delay, which makes exactly
/// one connect attempt. There is no backoff and no attempt cap; timers
/// scheduled by separate status events are not merged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    delay: Duration,
}

impl ReconnectPolicy {
    pub fn fixed(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::fixed(DEFAULT_RECONNECT_DELAY)
    }
}

/// What `disconnect()` does beyond closing a live link.
///
/// Both variants mark the disconnect as manual, so automatic reconnects stop
/// either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisconnectPolicy {
    /// Close a live link. A connect attempt already in flight still finishes:
    /// a failure is reported as a status, a success is closed unused.
    #[default]
    WhenConnected,
    /// Also abandon in-flight connect attempts; their outcome is never reported
    Always,
}
