//! Connection lifecycle state machine.
//!
//! `ConnectionManager` owns no sockets and no timers. It consumes discrete
//! [`ConnectionEvent`]s and answers with [`Effect`]s that the transport driver
//! (see `network`) carries out. Decoded ticks, the current error and the
//! mirrored connection state are written straight into the [`GameStore`].
//!
//! ```text
//! Idle -> Connecting -> Open -> (Closing | Closed) -> Reconnecting -> Connecting -> ...
//! ```

use crate::config::{ClientConfig, Endpoint};
use crate::error::ClientError;
use crate::game::GameStore;
use log::{debug, error, info, warn};
use shared::{InboundMessage, OutboundMessage, NORMAL_CLOSURE};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Idle,
    Connecting,
    Open,
    Closing,
    Closed,
    Reconnecting,
}

impl ConnectionState {
    pub fn label(&self) -> &'static str {
        match self {
            ConnectionState::Idle => "idle",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Open => "connected",
            ConnectionState::Closing => "closing",
            ConnectionState::Closed => "closed",
            ConnectionState::Reconnecting => "reconnecting",
        }
    }
}

/// Identifies one low-level socket. Ids are never reused within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandleId(pub u64);

impl fmt::Display for HandleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionEvent {
    /// The session wants a live connection.
    Connect,
    Opened(HandleId),
    Message(HandleId, String),
    TransportError(HandleId, String),
    Closed {
        handle: HandleId,
        code: u16,
        reason: String,
    },
    /// The reconnect delay scheduled earlier has elapsed.
    ReconnectDue,
    Send(OutboundMessage),
    /// The session is over; nothing may reconnect after this.
    Teardown,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Open {
        handle: HandleId,
        endpoint: Endpoint,
    },
    Close {
        handle: HandleId,
        code: u16,
        reason: &'static str,
    },
    Send {
        handle: HandleId,
        payload: String,
    },
    ScheduleReconnect(Duration),
    CancelReconnect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SocketState {
    Connecting,
    Open,
    Closing,
}

#[derive(Debug, Clone, Copy)]
struct Socket {
    id: HandleId,
    state: SocketState,
}

impl Socket {
    fn is_live(&self) -> bool {
        matches!(self.state, SocketState::Connecting | SocketState::Open)
    }
}

pub struct ConnectionManager {
    config: ClientConfig,
    store: Arc<GameStore>,
    state: ConnectionState,
    socket: Option<Socket>,
    next_handle: u64,
    connecting: bool,
    unmounting: bool,
    reconnect_pending: bool,
}

impl ConnectionManager {
    pub fn new(config: ClientConfig, store: Arc<GameStore>) -> Self {
        Self {
            config,
            store,
            state: ConnectionState::Idle,
            socket: None,
            next_handle: 1,
            connecting: false,
            unmounting: false,
            reconnect_pending: false,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Handle of the socket the manager currently cares about, if any.
    pub fn current_handle(&self) -> Option<HandleId> {
        self.socket.map(|socket| socket.id)
    }

    pub fn is_torn_down(&self) -> bool {
        self.unmounting
    }

    pub fn reconnect_pending(&self) -> bool {
        self.reconnect_pending
    }

    pub fn handle(&mut self, event: ConnectionEvent) -> Vec<Effect> {
        let mut effects = Vec::new();

        match event {
            ConnectionEvent::Connect => self.connect(&mut effects),
            ConnectionEvent::Opened(handle) => self.on_open(handle, &mut effects),
            ConnectionEvent::Message(handle, text) => self.on_message(handle, &text),
            ConnectionEvent::TransportError(handle, detail) => {
                // The close that follows drives recovery.
                warn!(
                    "{}",
                    ClientError::Transport(format!("socket {}: {}", handle, detail))
                );
            }
            ConnectionEvent::Closed {
                handle,
                code,
                reason,
            } => self.on_close(handle, code, reason, &mut effects),
            ConnectionEvent::ReconnectDue => self.on_reconnect_due(&mut effects),
            ConnectionEvent::Send(message) => self.send(&message, &mut effects),
            ConnectionEvent::Teardown => self.teardown(&mut effects),
        }

        effects
    }

    fn set_state(&mut self, state: ConnectionState) {
        if self.state != state {
            debug!("Connection state {:?} -> {:?}", self.state, state);
        }
        self.state = state;
        self.store.set_connection_state(state);
    }

    fn connect(&mut self, effects: &mut Vec<Effect>) {
        if self.unmounting {
            debug!("Session torn down, ignoring connect request");
            return;
        }

        let live = self.socket.is_some_and(|socket| socket.is_live());
        if self.connecting || live {
            warn!("Connection attempt already in progress");
            return;
        }

        let endpoint = match self.config.endpoint() {
            Ok(endpoint) => endpoint,
            Err(err) => {
                let err = ClientError::from(err);
                error!("Refusing to connect: {}", err);
                self.store.set_error(err.to_string());
                return;
            }
        };

        // An explicit connect supersedes a pending retry.
        if self.reconnect_pending {
            self.reconnect_pending = false;
            effects.push(Effect::CancelReconnect);
        }

        if let Some(previous) = self.socket.take() {
            if previous.is_live() {
                effects.push(Effect::Close {
                    handle: previous.id,
                    code: NORMAL_CLOSURE,
                    reason: "Reconnecting",
                });
            }
        }

        let handle = HandleId(self.next_handle);
        self.next_handle += 1;
        self.connecting = true;
        self.socket = Some(Socket {
            id: handle,
            state: SocketState::Connecting,
        });
        self.set_state(ConnectionState::Connecting);

        info!("Connecting to {} (socket {})", endpoint, handle);
        effects.push(Effect::Open { handle, endpoint });
    }

    fn on_open(&mut self, handle: HandleId, effects: &mut Vec<Effect>) {
        let current = self.socket.filter(|socket| socket.id == handle);

        if current.is_some_and(|socket| socket.state == SocketState::Open) {
            debug!("Socket {} already open", handle);
            return;
        }

        if current.is_none() || self.unmounting {
            debug!("Closing socket {} that opened after it was abandoned", handle);
            effects.push(Effect::Close {
                handle,
                code: NORMAL_CLOSURE,
                reason: "Session ended",
            });
            return;
        }

        self.connecting = false;
        if let Some(socket) = self.socket.as_mut() {
            socket.state = SocketState::Open;
        }
        self.set_state(ConnectionState::Open);
        info!("Connected (socket {})", handle);

        let viewport = self.store.viewport();
        let join = OutboundMessage::Join {
            room_id: self.config.room_id.to_string(),
            name: self.config.name.clone(),
            width: viewport.width,
            height: viewport.height,
        };
        self.send(&join, effects);
        self.store.clear_error();
    }

    fn on_message(&mut self, handle: HandleId, text: &str) {
        let open = self
            .socket
            .is_some_and(|s| s.id == handle && s.state == SocketState::Open);
        if !open {
            debug!("Dropping frame from inactive socket {}", handle);
            return;
        }

        match InboundMessage::decode(text) {
            Ok(InboundMessage::Tick { players, orb }) => self.store.apply_tick(players, orb),
            Ok(InboundMessage::Unknown) => debug!("Ignoring unrecognized message"),
            Err(e) => {
                let err = ClientError::Protocol(e.to_string());
                error!("{}", err);
                self.store.set_error(err.to_string());
            }
        }
    }

    fn on_close(&mut self, handle: HandleId, code: u16, reason: String, effects: &mut Vec<Effect>) {
        if self.current_handle() != Some(handle) {
            debug!("Socket {} closed after being replaced ({})", handle, code);
            return;
        }

        info!("Socket {} closed: {} {}", handle, code, reason);
        self.socket = None;
        self.connecting = false;
        self.set_state(ConnectionState::Closed);

        if self.unmounting || code == NORMAL_CLOSURE {
            return;
        }

        let err = ClientError::Disconnected { code, reason };
        self.store.set_error(err.to_string());

        self.reconnect_pending = true;
        self.set_state(ConnectionState::Reconnecting);
        info!("Reconnecting in {:?}", self.config.reconnect_delay);
        effects.push(Effect::ScheduleReconnect(self.config.reconnect_delay));
    }

    fn on_reconnect_due(&mut self, effects: &mut Vec<Effect>) {
        if !self.reconnect_pending || self.unmounting {
            debug!("Stale reconnect timer ignored");
            return;
        }

        self.reconnect_pending = false;
        info!("Attempting to reconnect...");
        self.connect(effects);
    }

    /// Best effort: dropped with a warning unless the current socket is open.
    fn send(&mut self, message: &OutboundMessage, effects: &mut Vec<Effect>) {
        let handle = match self.socket {
            Some(socket) if socket.state == SocketState::Open => socket.id,
            _ => {
                warn!("Not connected, dropping {} message", message.kind());
                return;
            }
        };

        match message.to_json() {
            Ok(payload) => effects.push(Effect::Send { handle, payload }),
            Err(e) => error!("Failed to encode {} message: {}", message.kind(), e),
        }
    }

    fn teardown(&mut self, effects: &mut Vec<Effect>) {
        if self.unmounting {
            return;
        }

        info!("Tearing down connection");
        self.unmounting = true;
        self.connecting = false;

        if self.reconnect_pending {
            self.reconnect_pending = false;
            effects.push(Effect::CancelReconnect);
        }

        match self.socket.as_mut() {
            Some(socket) if socket.is_live() => {
                socket.state = SocketState::Closing;
                effects.push(Effect::Close {
                    handle: socket.id,
                    code: NORMAL_CLOSURE,
                    reason: "Session ended",
                });
                self.set_state(ConnectionState::Closing);
            }
            Some(_) => self.set_state(ConnectionState::Closing),
            None => self.set_state(ConnectionState::Closed),
        }
    }
}
