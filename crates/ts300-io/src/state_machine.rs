// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Pure connection state machine.
//!
//! Caller requests and observed socket statuses go in, [`SessionAction`]s come
//! out. No sockets, no timers, no threads: the session driver owns those and
//! executes the actions. The driver keeps this struct behind its lock, so every
//! transition is serialized.

use std::time::Duration;

use crate::endpoint::Endpoint;
use crate::reconnect::{DisconnectPolicy, ReconnectPolicy};
use crate::status::SocketStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    Uninitialized,
    Initialized,
    Connecting,
    Connected,
    Disconnected,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionAction {
    /// Tell the subscriber how `initialize()` went
    NotifyInitialized(bool),
    /// Tell the subscriber about a socket status
    NotifyStatus(SocketStatus),
    /// Make one connect attempt against the current endpoint
    StartConnect,
    /// Hand the freshly connected socket to the receive loop
    ArmReceive,
    /// Release the current socket, if any
    CloseLink,
    /// Discard the outcome of every connect attempt still in flight
    AbandonConnects,
    /// One-shot timer that calls back into `on_reconnect_timer`
    ScheduleReconnect(Duration),
    /// Abort every pending reconnect timer
    CancelReconnects,
}

#[derive(Debug, Clone)]
pub struct SessionStateMachine {
    state: ConnectionState,
    endpoint: Option<Endpoint>,
    manual_disconnect: bool,
    connected: bool,
    reconnect: ReconnectPolicy,
    disconnect_policy: DisconnectPolicy,
}

impl SessionStateMachine {
    pub fn new(reconnect: ReconnectPolicy, disconnect_policy: DisconnectPolicy) -> Self {
        Self {
            state: ConnectionState::Uninitialized,
            endpoint: None,
            manual_disconnect: false,
            connected: false,
            reconnect,
            disconnect_policy,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn endpoint(&self) -> Option<&Endpoint> {
        self.endpoint.as_ref()
    }

    pub fn is_initialized(&self) -> bool {
        self.endpoint.is_some()
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn manual_disconnect(&self) -> bool {
        self.manual_disconnect
    }

    pub fn reconnect_policy(&self) -> ReconnectPolicy {
        self.reconnect
    }

    /// Adopt an endpoint, or drop back to Uninitialized when it was rejected.
    ///
    /// Re-initialising with the same endpoint keeps whatever link exists and
    /// never connects on its own.
    pub fn initialize(&mut self, endpoint: Option<Endpoint>) -> Vec<SessionAction> {
        let mut actions = Vec::new();

        let Some(endpoint) = endpoint else {
            actions.extend(self.tear_down_link());
            self.endpoint = None;
            self.manual_disconnect = true;
            self.state = ConnectionState::Uninitialized;
            actions.push(SessionAction::NotifyInitialized(false));
            return actions;
        };

        let unchanged = self.endpoint.as_ref() == Some(&endpoint);
        if unchanged
            && matches!(
                self.state,
                ConnectionState::Connecting | ConnectionState::Connected
            )
        {
            actions.push(SessionAction::NotifyInitialized(true));
            return actions;
        }

        if !unchanged {
            actions.extend(self.tear_down_link());
        }
        self.endpoint = Some(endpoint);
        self.manual_disconnect = false;
        self.state = ConnectionState::Initialized;
        actions.push(SessionAction::NotifyInitialized(true));
        actions
    }

    /// Caller asked to connect. Empty when not initialized.
    pub fn connect(&mut self) -> Vec<SessionAction> {
        if !self.is_initialized() {
            return Vec::new();
        }
        self.manual_disconnect = false;
        if self.connected {
            return Vec::new();
        }
        self.state = ConnectionState::Connecting;
        vec![SessionAction::StartConnect]
    }

    /// Caller asked to disconnect. Always suppresses further reconnects.
    ///
    /// Under [`DisconnectPolicy::Always`] attempts still in flight are
    /// abandoned too, so their outcome is never reported.
    pub fn disconnect(&mut self) -> Vec<SessionAction> {
        self.manual_disconnect = true;
        let mut actions = self.tear_down_link();
        if self.disconnect_policy == DisconnectPolicy::Always {
            actions.push(SessionAction::AbandonConnects);
        }
        if self.is_initialized() {
            self.state = ConnectionState::Disconnected;
        }
        actions
    }

    /// A socket status was observed by the driver
    pub fn on_status(&mut self, status: SocketStatus) -> Vec<SessionAction> {
        let mut actions = vec![SessionAction::NotifyStatus(status)];

        if status.is_connected() {
            self.connected = true;
            self.state = ConnectionState::Connected;
            actions.push(SessionAction::ArmReceive);
            return actions;
        }

        self.connected = false;
        if !self.is_initialized() {
            return actions;
        }
        if self.manual_disconnect {
            self.state = ConnectionState::Disconnected;
        } else {
            self.state = ConnectionState::Connecting;
            actions.push(SessionAction::ScheduleReconnect(self.reconnect.delay()));
        }
        actions
    }

    /// A reconnect timer fired
    pub fn on_reconnect_timer(&mut self) -> Vec<SessionAction> {
        if self.manual_disconnect || self.connected || !self.is_initialized() {
            return Vec::new();
        }
        self.state = ConnectionState::Connecting;
        vec![SessionAction::StartConnect]
    }

    fn tear_down_link(&mut self) -> Vec<SessionAction> {
        let mut actions = vec![SessionAction::CancelReconnects];
        if self.connected {
            self.connected = false;
            actions.push(SessionAction::CloseLink);
            actions.push(SessionAction::NotifyStatus(SocketStatus::BrokenLocally));
        }
        actions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoint() -> Endpoint {
        Endpoint::new("192.168.1.50", 5000, 1024).unwrap()
    }

    fn machine() -> SessionStateMachine {
        SessionStateMachine::new(ReconnectPolicy::default(), DisconnectPolicy::WhenConnected)
    }

    fn connected_machine() -> SessionStateMachine {
        let mut sm = machine();
        sm.initialize(Some(endpoint()));
        sm.connect();
        sm.on_status(SocketStatus::Connected);
        sm
    }

    #[test]
    fn test_initialize_success_and_failure() {
        let mut sm = machine();
        assert_eq!(
            sm.initialize(None),
            vec![SessionAction::CancelReconnects, SessionAction::NotifyInitialized(false)]
        );
        assert_eq!(sm.state(), ConnectionState::Uninitialized);

        let actions = sm.initialize(Some(endpoint()));
        assert!(actions.contains(&SessionAction::NotifyInitialized(true)));
        assert!(!actions.contains(&SessionAction::StartConnect));
        assert_eq!(sm.state(), ConnectionState::Initialized);
    }

    #[test]
    fn test_repeated_initialize_is_idempotent() {
        let mut sm = machine();
        sm.initialize(Some(endpoint()));
        let actions = sm.initialize(Some(endpoint()));
        assert_eq!(actions, vec![SessionAction::NotifyInitialized(true)]);
        assert_eq!(sm.state(), ConnectionState::Initialized);
    }

    #[test]
    fn test_connect_requires_initialize() {
        let mut sm = machine();
        assert!(sm.connect().is_empty());
        assert_eq!(sm.state(), ConnectionState::Uninitialized);
    }

    #[test]
    fn test_connect_then_connected_arms_receive() {
        let mut sm = machine();
        sm.initialize(Some(endpoint()));
        assert_eq!(sm.connect(), vec![SessionAction::StartConnect]);
        assert_eq!(sm.state(), ConnectionState::Connecting);

        let actions = sm.on_status(SocketStatus::Connected);
        assert_eq!(
            actions,
            vec![
                SessionAction::NotifyStatus(SocketStatus::Connected),
                SessionAction::ArmReceive
            ]
        );
        assert_eq!(sm.state(), ConnectionState::Connected);
        assert!(sm.is_connected());
    }

    #[test]
    fn test_drop_schedules_exactly_one_reconnect() {
        let mut sm = connected_machine();
        let actions = sm.on_status(SocketStatus::BrokenRemotely);
        let timers = actions
            .iter()
            .filter(|a| matches!(a, SessionAction::ScheduleReconnect(_)))
            .count();
        assert_eq!(timers, 1);
        assert!(actions.contains(&SessionAction::ScheduleReconnect(Duration::from_secs(10))));
        assert_eq!(sm.state(), ConnectionState::Connecting);

        assert_eq!(sm.on_reconnect_timer(), vec![SessionAction::StartConnect]);
    }

    #[test]
    fn test_failed_attempts_keep_retrying() {
        let mut sm = machine();
        sm.initialize(Some(endpoint()));
        sm.connect();
        for _ in 0..5 {
            let actions = sm.on_status(SocketStatus::ConnectFailed);
            assert!(actions
                .iter()
                .any(|a| matches!(a, SessionAction::ScheduleReconnect(_))));
            assert_eq!(sm.on_reconnect_timer(), vec![SessionAction::StartConnect]);
        }
    }

    #[test]
    fn test_manual_disconnect_suppresses_reconnect() {
        let mut sm = connected_machine();
        let actions = sm.disconnect();
        assert_eq!(
            actions,
            vec![
                SessionAction::CancelReconnects,
                SessionAction::CloseLink,
                SessionAction::NotifyStatus(SocketStatus::BrokenLocally),
            ]
        );
        assert_eq!(sm.state(), ConnectionState::Disconnected);

        let actions = sm.on_status(SocketStatus::BrokenRemotely);
        assert_eq!(actions, vec![SessionAction::NotifyStatus(SocketStatus::BrokenRemotely)]);
        assert!(sm.on_reconnect_timer().is_empty());

        // connect() lifts the override
        assert_eq!(sm.connect(), vec![SessionAction::StartConnect]);
        assert!(!sm.manual_disconnect());
    }

    #[test]
    fn test_disconnect_while_retrying_stops_timers() {
        let mut sm = machine();
        sm.initialize(Some(endpoint()));
        sm.connect();
        sm.on_status(SocketStatus::ConnectFailed);

        assert_eq!(sm.disconnect(), vec![SessionAction::CancelReconnects]);
        assert!(sm.on_reconnect_timer().is_empty());
        assert_eq!(sm.state(), ConnectionState::Disconnected);
    }

    #[test]
    fn test_disconnect_policy_always_abandons_attempts() {
        let mut sm =
            SessionStateMachine::new(ReconnectPolicy::default(), DisconnectPolicy::Always);
        sm.initialize(Some(endpoint()));
        sm.connect();
        assert_eq!(
            sm.disconnect(),
            vec![SessionAction::CancelReconnects, SessionAction::AbandonConnects]
        );
        assert_eq!(sm.state(), ConnectionState::Disconnected);

        sm.connect();
        sm.on_status(SocketStatus::Connected);
        assert_eq!(
            sm.disconnect(),
            vec![
                SessionAction::CancelReconnects,
                SessionAction::CloseLink,
                SessionAction::NotifyStatus(SocketStatus::BrokenLocally),
                SessionAction::AbandonConnects,
            ]
        );
    }

    #[test]
    fn test_disconnect_policy_when_connected_leaves_attempts() {
        let mut sm = machine();
        sm.initialize(Some(endpoint()));
        sm.connect();
        let actions = sm.disconnect();
        assert!(!actions.contains(&SessionAction::AbandonConnects));
        assert!(!actions.contains(&SessionAction::CloseLink));
    }

    #[test]
    fn test_reinitialize_with_new_endpoint_drops_link() {
        let mut sm = connected_machine();
        let other = Endpoint::new("192.168.1.51", 5000, 1024).unwrap();
        let actions = sm.initialize(Some(other.clone()));
        assert!(actions.contains(&SessionAction::CloseLink));
        assert!(actions.contains(&SessionAction::NotifyInitialized(true)));
        assert_eq!(sm.state(), ConnectionState::Initialized);
        assert_eq!(sm.endpoint(), Some(&other));
        assert!(!sm.is_connected());
    }

    #[test]
    fn test_reinitialize_same_endpoint_keeps_link() {
        let mut sm = connected_machine();
        assert_eq!(
            sm.initialize(Some(endpoint())),
            vec![SessionAction::NotifyInitialized(true)]
        );
        assert_eq!(sm.state(), ConnectionState::Connected);
    }

    #[test]
    fn test_failed_reinitialize_blocks_reconnects() {
        let mut sm = connected_machine();
        sm.initialize(None);
        assert_eq!(sm.state(), ConnectionState::Uninitialized);
        assert!(sm.on_reconnect_timer().is_empty());
        assert!(sm.connect().is_empty());
    }

    #[test]
    fn test_timer_after_reconnect_is_noop() {
        let mut sm = connected_machine();
        sm.on_status(SocketStatus::LinkLost);
        sm.on_status(SocketStatus::Connected);
        assert!(sm.on_reconnect_timer().is_empty());
    }
}
