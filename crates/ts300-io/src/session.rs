// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Transport session: one TCP socket to one device, kept alive across drops.
//!
//! The [`SessionStateMachine`] decides, this module executes. Every caller
//! request and every socket observation takes the session lock, runs one
//! transition, performs the resulting side effects (spawning connect attempts
//! and timers, closing sockets) and collects notifications. Notifications go to
//! the subscriber only after the lock is released, so callbacks may call back
//! into the session.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::mpsc as std_mpsc;
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{lookup_host, TcpStream};
use tokio::runtime::{Handle, Runtime, RuntimeFlavor};
use tokio::sync::{mpsc, watch};
use tokio::task::{block_in_place, JoinHandle};
use tracing::{debug, info, trace, warn};

use crate::endpoint::Endpoint;
use crate::error::{Result, TransportError};
use crate::events::{channel_callback, SessionEvent, SessionEventCallback};
use crate::reconnect::{DisconnectPolicy, ReconnectPolicy};
use crate::state_machine::{ConnectionState, SessionAction, SessionStateMachine};
use crate::status::SocketStatus;
use crate::text::{decode_single_byte, encode_ascii};

fn block_on_with<T>(
    handle: &Handle,
    runtime: Option<&Runtime>,
    future: impl Future<Output = T>,
) -> T {
    if Handle::try_current().is_ok() {
        block_in_place(|| handle.block_on(future))
    } else if let Some(runtime) = runtime {
        runtime.block_on(future)
    } else {
        handle.block_on(future)
    }
}

/// Policies applied by a [`TransportSession`]
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionOptions {
    pub reconnect: ReconnectPolicy,
    pub disconnect_policy: DisconnectPolicy,
}

impl SessionOptions {
    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect = ReconnectPolicy::fixed(delay);
        self
    }

    pub fn with_disconnect_policy(mut self, policy: DisconnectPolicy) -> Self {
        self.disconnect_policy = policy;
        self
    }
}

type SharedWriter = Arc<tokio::sync::Mutex<OwnedWriteHalf>>;

/// A connected socket. The read half waits here until the state machine arms
/// the receive loop.
struct Link {
    id: u64,
    writer: SharedWriter,
    reader: Option<OwnedReadHalf>,
    receive_buffer_size: usize,
}

struct ReceiveHandoff {
    link_id: u64,
    reader: OwnedReadHalf,
    buffer_size: usize,
}

struct SessionCore {
    machine: SessionStateMachine,
    link: Option<Link>,
    next_link_id: u64,
    /// Bumped when the endpoint changes or the session is torn down; connect
    /// attempts started under an older epoch are discarded.
    epoch: u64,
    reconnect_timers: Vec<JoinHandle<()>>,
}

struct SessionShared {
    core: Mutex<SessionCore>,
    callback: Option<SessionEventCallback>,
    handle: Handle,
    receive_tx: mpsc::UnboundedSender<ReceiveHandoff>,
    active_link: watch::Sender<Option<u64>>,
}

impl SessionShared {
    fn emit(&self, events: Vec<SessionEvent>) {
        let Some(callback) = &self.callback else {
            return;
        };
        for event in events {
            trace!("[SESSION] notify {:?}", event);
            callback(event);
        }
    }

    fn transition<F>(self: &Arc<Self>, step: F)
    where
        F: FnOnce(&mut SessionCore) -> Vec<SessionAction>,
    {
        let events = {
            let mut core = self.core.lock();
            let actions = step(&mut core);
            self.apply(&mut core, actions)
        };
        self.emit(events);
    }

    fn apply(self: &Arc<Self>, core: &mut SessionCore, actions: Vec<SessionAction>) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        for action in actions {
            match action {
                SessionAction::NotifyInitialized(ok) => events.push(SessionEvent::Initialized(ok)),
                SessionAction::NotifyStatus(status) => {
                    debug!("[SESSION] socket status: {} ({})", status, status.code());
                    events.push(SessionEvent::status(status));
                }
                SessionAction::StartConnect => self.spawn_connect(core),
                SessionAction::ArmReceive => self.arm_receive(core),
                SessionAction::CloseLink => self.close_link(core),
                SessionAction::AbandonConnects => {
                    core.epoch += 1;
                    debug!("[SESSION] in-flight connect attempts abandoned");
                }
                SessionAction::ScheduleReconnect(delay) => self.schedule_reconnect(core, delay),
                SessionAction::CancelReconnects => {
                    for timer in core.reconnect_timers.drain(..) {
                        timer.abort();
                    }
                }
            }
        }
        events
    }

    fn spawn_connect(self: &Arc<Self>, core: &mut SessionCore) {
        let Some(endpoint) = core.machine.endpoint().cloned() else {
            return;
        };
        let epoch = core.epoch;
        let session = Arc::downgrade(self);
        info!("[SESSION] connection attempt: {}", endpoint);
        self.handle.spawn(async move {
            let outcome = open_stream(&endpoint).await;
            if let Some(session) = session.upgrade() {
                session.on_connect_outcome(epoch, &endpoint, outcome);
            }
        });
    }

    fn on_connect_outcome(
        self: &Arc<Self>,
        epoch: u64,
        endpoint: &Endpoint,
        outcome: std::result::Result<TcpStream, SocketStatus>,
    ) {
        self.transition(|core| {
            if core.epoch != epoch {
                debug!("[SESSION] discarding connect result for stale endpoint {}", endpoint);
                return Vec::new();
            }
            match outcome {
                Ok(stream) => {
                    if core.machine.manual_disconnect() || core.machine.is_connected() {
                        debug!("[SESSION] dropping surplus connection to {}", endpoint);
                        return Vec::new();
                    }
                    if let Err(e) = stream.set_nodelay(true) {
                        debug!("[SESSION] could not set TCP_NODELAY: {}", e);
                    }
                    let (reader, writer) = stream.into_split();
                    let id = core.next_link_id;
                    core.next_link_id += 1;
                    core.link = Some(Link {
                        id,
                        writer: Arc::new(tokio::sync::Mutex::new(writer)),
                        reader: Some(reader),
                        receive_buffer_size: endpoint.receive_buffer_size(),
                    });
                    info!("[SESSION] connected to TS-300 at {}", endpoint);
                    core.machine.on_status(SocketStatus::Connected)
                }
                Err(status) => {
                    if core.machine.is_connected() {
                        // Another attempt already won
                        return Vec::new();
                    }
                    core.machine.on_status(status)
                }
            }
        });
    }

    /// The socket identified by `link_id` failed or was closed by the peer
    fn on_link_lost(self: &Arc<Self>, link_id: u64, status: SocketStatus) {
        self.transition(|core| {
            if core.link.as_ref().map(|link| link.id) != Some(link_id) {
                return Vec::new();
            }
            core.link = None;
            self.active_link.send_replace(None);
            warn!("[SESSION] link lost: {}", status);
            core.machine.on_status(status)
        });
    }

    fn on_reconnect_timer(self: &Arc<Self>) {
        self.transition(|core| {
            let actions = core.machine.on_reconnect_timer();
            if actions.is_empty() {
                debug!("[RECONNECT] timer fired, nothing to do");
            }
            actions
        });
    }

    /// Writer of the live link, or why there is none
    fn live_writer(&self) -> Result<(u64, SharedWriter)> {
        let core = self.core.lock();
        match &core.link {
            Some(link) => Ok((link.id, Arc::clone(&link.writer))),
            None if !core.machine.is_initialized() => Err(TransportError::NotInitialized),
            None => Err(TransportError::NotConnected),
        }
    }

    async fn write(self: &Arc<Self>, link_id: u64, writer: SharedWriter, bytes: &[u8]) -> Result<()> {
        let written = async {
            let mut writer = writer.lock().await;
            writer.write_all(bytes).await?;
            writer.flush().await
        }
        .await;

        match written {
            Ok(()) => {
                trace!("[SESSION] sent {} bytes", bytes.len());
                Ok(())
            }
            Err(e) => {
                warn!("[SESSION] send failed: {}", e);
                self.on_link_lost(link_id, SocketStatus::from_link_error(&e));
                Err(TransportError::SendFailed(e))
            }
        }
    }

    fn arm_receive(&self, core: &mut SessionCore) {
        let Some(link) = core.link.as_mut() else {
            return;
        };
        let Some(reader) = link.reader.take() else {
            return;
        };
        self.active_link.send_replace(Some(link.id));
        let handoff = ReceiveHandoff {
            link_id: link.id,
            reader,
            buffer_size: link.receive_buffer_size,
        };
        if self.receive_tx.send(handoff).is_err() {
            warn!("[SESSION] receive loop has stopped");
        }
    }

    fn close_link(&self, core: &mut SessionCore) {
        match core.link.take() {
            Some(link) => {
                self.active_link.send_replace(None);
                self.handle.spawn(async move {
                    let mut writer = link.writer.lock().await;
                    if let Err(e) = writer.shutdown().await {
                        debug!("[SESSION] socket shutdown: {}", e);
                    }
                });
                info!("[SESSION] socket released");
            }
            None => debug!("[SESSION] close requested with no socket"),
        }
    }

    fn schedule_reconnect(self: &Arc<Self>, core: &mut SessionCore, delay: Duration) {
        core.reconnect_timers.retain(|timer| !timer.is_finished());
        info!("[RECONNECT] attempting to reconnect in {:?}", delay);
        let session = Arc::downgrade(self);
        let timer = self.handle.spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(session) = session.upgrade() {
                session.on_reconnect_timer();
            }
        });
        core.reconnect_timers.push(timer);
    }
}

async fn open_stream(endpoint: &Endpoint) -> std::result::Result<TcpStream, SocketStatus> {
    let addresses: Vec<SocketAddr> = match lookup_host((endpoint.address(), endpoint.port())).await
    {
        Ok(addresses) => addresses.collect(),
        Err(e) => {
            warn!("[SESSION] address lookup for {} failed: {}", endpoint, e);
            return Err(SocketStatus::DnsFailed);
        }
    };
    if addresses.is_empty() {
        warn!("[SESSION] address lookup for {} returned nothing", endpoint);
        return Err(SocketStatus::DnsFailed);
    }
    TcpStream::connect(&addresses[..]).await.map_err(|e| {
        warn!("[SESSION] connect to {} failed: {}", endpoint, e);
        SocketStatus::ConnectFailed
    })
}

/// Single long-lived receive loop. Waits for a link, reads until it ends,
/// reports how it ended, then waits for the next one. Only session teardown
/// stops it.
async fn receive_loop(
    session: Weak<SessionShared>,
    callback: Option<SessionEventCallback>,
    mut handoffs: mpsc::UnboundedReceiver<ReceiveHandoff>,
    mut active_link: watch::Receiver<Option<u64>>,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        let handoff = tokio::select! {
            _ = shutdown.changed() => break,
            next = handoffs.recv() => match next {
                Some(handoff) => handoff,
                None => break,
            },
        };
        let ReceiveHandoff {
            link_id,
            mut reader,
            buffer_size,
        } = handoff;
        let mut buffer = vec![0u8; buffer_size];
        debug!("[RECEIVE] armed for link {}", link_id);

        let ended = loop {
            tokio::select! {
                _ = shutdown.changed() => return,
                changed = active_link.changed() => {
                    if changed.is_err() {
                        return;
                    }
                    if *active_link.borrow_and_update() != Some(link_id) {
                        break None;
                    }
                }
                read = reader.read(&mut buffer) => match read {
                    Ok(0) => break Some(SocketStatus::BrokenRemotely),
                    Ok(n) => {
                        trace!("[RECEIVE] {} bytes", n);
                        if let Some(callback) = &callback {
                            callback(SessionEvent::ReceivedText(decode_single_byte(&buffer[..n])));
                        }
                    }
                    Err(e) => {
                        debug!("[RECEIVE] read failed: {}", e);
                        break Some(SocketStatus::from_link_error(&e));
                    }
                },
            }
        };

        if let Some(status) = ended {
            match session.upgrade() {
                Some(session) => session.on_link_lost(link_id, status),
                None => return,
            }
        }
    }
    debug!("[RECEIVE] loop stopped");
}

/// Long-lived TCP session to one TS-300 unit.
///
/// # Example
/// ```no_run
/// use ts300_io::{SessionOptions, TransportSession};
///
/// let (session, events) = TransportSession::with_channel(SessionOptions::default())?;
/// session.initialize("192.168.1.50", 5000, 1024)?;
/// session.connect();
/// for event in events.iter() {
///     println!("{:?}", event);
/// }
/// # Ok::<(), ts300_io::TransportError>(())
/// ```
///
/// Created inside a tokio runtime the session uses that runtime; otherwise it
/// owns a small multi-threaded one. Called from a current-thread runtime,
/// [`send`](Self::send) cannot block the only worker, so it queues the write on
/// the session's runtime and returns.
pub struct TransportSession {
    shared: Arc<SessionShared>,
    runtime: Option<Arc<Runtime>>,
    shutdown: watch::Sender<bool>,
    receive_task: JoinHandle<()>,
}

impl TransportSession {
    pub fn new(options: SessionOptions, callback: Option<SessionEventCallback>) -> Result<Self> {
        let (handle, runtime) = if let Ok(handle) = Handle::try_current() {
            (handle, None)
        } else {
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .worker_threads(2)
                .thread_name("ts300-io")
                .enable_all()
                .build()
                .map_err(|e| TransportError::Runtime(format!("Failed to create runtime: {}", e)))?;
            let handle = runtime.handle().clone();
            (handle, Some(Arc::new(runtime)))
        };

        let (receive_tx, receive_rx) = mpsc::unbounded_channel();
        let (active_link, active_rx) = watch::channel(None);
        let (shutdown, shutdown_rx) = watch::channel(false);

        let shared = Arc::new(SessionShared {
            core: Mutex::new(SessionCore {
                machine: SessionStateMachine::new(options.reconnect, options.disconnect_policy),
                link: None,
                next_link_id: 1,
                epoch: 0,
                reconnect_timers: Vec::new(),
            }),
            callback: callback.clone(),
            handle: handle.clone(),
            receive_tx,
            active_link,
        });

        let receive_task = handle.spawn(receive_loop(
            Arc::downgrade(&shared),
            callback,
            receive_rx,
            active_rx,
            shutdown_rx,
        ));

        Ok(Self {
            shared,
            runtime,
            shutdown,
            receive_task,
        })
    }

    /// Session whose events arrive on a std channel
    pub fn with_channel(
        options: SessionOptions,
    ) -> Result<(Self, std_mpsc::Receiver<SessionEvent>)> {
        let (callback, events) = channel_callback();
        Ok((Self::new(options, Some(callback))?, events))
    }

    /// Set the device endpoint. Emits `Initialized(true|false)`.
    ///
    /// Must succeed before [`connect`](Self::connect) does anything. Calling it
    /// again with the same endpoint changes nothing and never connects.
    pub fn initialize(&self, address: &str, port: u16, receive_buffer_size: usize) -> Result<()> {
        let candidate = Endpoint::new(address, port, receive_buffer_size);
        match &candidate {
            Ok(endpoint) => info!(
                "[SESSION] TCP client to TS-300 initialized: {} (buffer {})",
                endpoint,
                endpoint.receive_buffer_size()
            ),
            Err(e) => warn!("[SESSION] TCP client not initialized: {}", e),
        }
        let endpoint = candidate.as_ref().ok().cloned();
        self.shared.transition(|core| {
            if core.machine.endpoint() != endpoint.as_ref() {
                core.epoch += 1;
            }
            core.machine.initialize(endpoint)
        });
        candidate.map(|_| ())
    }

    /// Start connecting in the background. Failures show up as status events
    /// and drive the reconnection policy.
    pub fn connect(&self) {
        self.shared.transition(|core| {
            if !core.machine.is_initialized() {
                info!("[SESSION] TCP client not initialized, missing data");
                return Vec::new();
            }
            core.machine.connect()
        });
    }

    /// Close the link and stop automatic reconnects until the next `connect()`
    pub fn disconnect(&self) {
        self.shared.transition(|core| {
            info!("[SESSION] disconnect requested");
            core.machine.disconnect()
        });
    }

    /// Write the whole buffer, blocking the caller until it is handed to the
    /// socket.
    ///
    /// On a current-thread runtime the write is queued instead; a failure then
    /// shows up only as a status event.
    pub fn send(&self, bytes: &[u8]) -> Result<()> {
        let (link_id, writer) = self.shared.live_writer()?;

        let on_current_thread = Handle::try_current()
            .map(|current| current.runtime_flavor() == RuntimeFlavor::CurrentThread)
            .unwrap_or(false);
        if on_current_thread {
            let shared = Arc::clone(&self.shared);
            let bytes = bytes.to_vec();
            debug!("[SESSION] current-thread runtime, queueing {} bytes", bytes.len());
            self.shared.handle.spawn(async move {
                // Failures already logged and reported as a link status
                let _ = shared.write(link_id, writer, &bytes).await;
            });
            return Ok(());
        }

        block_on_with(
            &self.shared.handle,
            self.runtime.as_deref(),
            self.shared.write(link_id, writer, bytes),
        )
    }

    pub async fn send_async(&self, bytes: &[u8]) -> Result<()> {
        let (link_id, writer) = self.shared.live_writer()?;
        self.shared.write(link_id, writer, bytes).await
    }

    /// Send a string as ASCII
    pub fn send_text(&self, text: &str) -> Result<()> {
        self.send(&encode_ascii(text))
    }

    pub fn state(&self) -> ConnectionState {
        self.shared.core.lock().machine.state()
    }

    pub fn is_connected(&self) -> bool {
        self.shared.core.lock().machine.is_connected()
    }

    pub fn endpoint(&self) -> Option<Endpoint> {
        self.shared.core.lock().machine.endpoint().cloned()
    }

    /// Reconnect timers scheduled and not yet fired or cancelled
    pub fn pending_reconnects(&self) -> usize {
        self.shared
            .core
            .lock()
            .reconnect_timers
            .iter()
            .filter(|timer| !timer.is_finished())
            .count()
    }
}

impl Drop for TransportSession {
    fn drop(&mut self) {
        let _ = self.shutdown.send(true);
        {
            let mut core = self.shared.core.lock();
            for timer in core.reconnect_timers.drain(..) {
                timer.abort();
            }
            core.epoch += 1;
            core.link = None;
        }
        self.shared.active_link.send_replace(None);
        self.receive_task.abort();
        // Dropping a runtime inside async code panics; shutdown_background does not
        if let Some(runtime) = self.runtime.take().and_then(|rt| Arc::try_unwrap(rt).ok()) {
            runtime.shutdown_background();
        }
        debug!("[SESSION] torn down");
    }
}
