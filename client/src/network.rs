//! Transport driver: runs the [`ConnectionManager`] against real WebSocket
//! sockets, a reconnect timer and the session's request channel.

use crate::config::{ClientConfig, Endpoint};
use crate::connection::{ConnectionEvent, ConnectionManager, ConnectionState, Effect, HandleId};
use crate::game::GameStore;
use futures_util::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use shared::{OutboundMessage, ABNORMAL_CLOSURE, NO_STATUS_CLOSURE};
use std::collections::HashMap;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{sleep_until, timeout, Instant};
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};

/// How long teardown waits for the closing handshake before giving up.
const SHUTDOWN_GRACE: Duration = Duration::from_millis(1000);
/// How long a socket we asked to close may wait for the peer's close frame.
const CLOSE_HANDSHAKE_TIMEOUT: Duration = Duration::from_millis(2000);

/// Requests from the session (input capture, teardown) to the connection task.
#[derive(Debug)]
pub enum Request {
    Send(OutboundMessage),
    Teardown,
}

#[derive(Debug)]
enum SocketCommand {
    Send(String),
    Close { code: u16, reason: &'static str },
}

enum Step {
    Event(ConnectionEvent),
    Request(Option<Request>),
    ReconnectDue,
}

/// Cheap, cloneable way for the UI side to talk to the connection task.
/// Never blocks.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    requests: mpsc::UnboundedSender<Request>,
}

impl ConnectionHandle {
    pub fn send(&self, message: OutboundMessage) {
        if self.requests.send(Request::Send(message)).is_err() {
            warn!("Connection task has stopped, dropping message");
        }
    }

    pub fn teardown(&self) {
        if self.requests.send(Request::Teardown).is_err() {
            debug!("Connection task already stopped");
        }
    }
}

pub struct Connection {
    manager: ConnectionManager,
    requests: mpsc::UnboundedReceiver<Request>,
    events_tx: mpsc::UnboundedSender<ConnectionEvent>,
    events_rx: mpsc::UnboundedReceiver<ConnectionEvent>,
    sockets: HashMap<HandleId, mpsc::UnboundedSender<SocketCommand>>,
    reconnect_at: Option<Instant>,
}

impl Connection {
    pub fn new(config: ClientConfig, store: Arc<GameStore>) -> (Self, ConnectionHandle) {
        let (requests_tx, requests_rx) = mpsc::unbounded_channel();
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        let connection = Connection {
            manager: ConnectionManager::new(config, store),
            requests: requests_rx,
            events_tx,
            events_rx,
            sockets: HashMap::new(),
            reconnect_at: None,
        };

        (
            connection,
            ConnectionHandle {
                requests: requests_tx,
            },
        )
    }

    /// Runs the connection on its own thread with a single-threaded runtime.
    pub fn spawn(self) -> std::io::Result<thread::JoinHandle<()>> {
        thread::Builder::new()
            .name("connection".to_string())
            .spawn(move || {
                match tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                {
                    Ok(runtime) => runtime.block_on(self.run()),
                    Err(e) => error!("Failed to start connection runtime: {}", e),
                }
            })
    }

    /// Connects, then serves socket events, session requests and the
    /// reconnect timer until teardown is requested or every handle is dropped.
    pub async fn run(mut self) {
        self.dispatch(ConnectionEvent::Connect);

        loop {
            let reconnect_at = self.reconnect_at;

            let step = tokio::select! {
                Some(event) = self.events_rx.recv() => Step::Event(event),
                request = self.requests.recv() => Step::Request(request),
                _ = wait_until(reconnect_at) => Step::ReconnectDue,
            };

            match step {
                Step::Event(event) => self.dispatch(event),
                Step::Request(Some(Request::Send(message))) => {
                    self.dispatch(ConnectionEvent::Send(message))
                }
                Step::Request(Some(Request::Teardown)) | Step::Request(None) => break,
                Step::ReconnectDue => {
                    self.reconnect_at = None;
                    self.dispatch(ConnectionEvent::ReconnectDue);
                }
            }
        }

        self.shutdown().await;
    }

    async fn shutdown(&mut self) {
        self.dispatch(ConnectionEvent::Teardown);

        let drained = timeout(SHUTDOWN_GRACE, async {
            while self.manager.state() == ConnectionState::Closing {
                match self.events_rx.recv().await {
                    Some(event) => self.dispatch(event),
                    None => break,
                }
            }
        })
        .await;

        if drained.is_err() {
            warn!("Socket did not finish closing within {:?}", SHUTDOWN_GRACE);
        }
        info!("Connection task stopped");
    }

    fn dispatch(&mut self, event: ConnectionEvent) {
        if let ConnectionEvent::Closed { handle, .. } = &event {
            self.sockets.remove(handle);
        }

        for effect in self.manager.handle(event) {
            self.execute(effect);
        }
    }

    fn execute(&mut self, effect: Effect) {
        match effect {
            Effect::Open { handle, endpoint } => {
                let (commands_tx, commands_rx) = mpsc::unbounded_channel();
                self.sockets.insert(handle, commands_tx);
                tokio::spawn(run_socket(
                    handle,
                    endpoint,
                    self.events_tx.clone(),
                    commands_rx,
                ));
            }
            Effect::Close {
                handle,
                code,
                reason,
            } => match self.sockets.get(&handle) {
                Some(socket) => {
                    let _ = socket.send(SocketCommand::Close { code, reason });
                }
                None => debug!("Socket {} already gone", handle),
            },
            Effect::Send { handle, payload } => match self.sockets.get(&handle) {
                Some(socket) if socket.send(SocketCommand::Send(payload)).is_ok() => {}
                _ => warn!("Socket {} unavailable, message dropped", handle),
            },
            Effect::ScheduleReconnect(delay) => self.reconnect_at = Some(Instant::now() + delay),
            Effect::CancelReconnect => self.reconnect_at = None,
        }
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

fn closed(handle: HandleId, code: u16, reason: String) -> ConnectionEvent {
    ConnectionEvent::Closed {
        handle,
        code,
        reason,
    }
}

/// One socket from connect to close. Always finishes by reporting exactly one
/// `Closed` event for its handle.
async fn run_socket(
    handle: HandleId,
    endpoint: Endpoint,
    events: mpsc::UnboundedSender<ConnectionEvent>,
    mut commands: mpsc::UnboundedReceiver<SocketCommand>,
) {
    let ws = tokio::select! {
        result = tokio_tungstenite::connect_async(endpoint.as_str()) => match result {
            Ok((ws, _response)) => ws,
            Err(e) => {
                let _ = events.send(ConnectionEvent::TransportError(handle, e.to_string()));
                let _ = events.send(closed(handle, ABNORMAL_CLOSURE, String::new()));
                return;
            }
        },
        _ = commands.recv() => {
            debug!("Socket {} abandoned before the handshake finished", handle);
            let _ = events.send(closed(handle, ABNORMAL_CLOSURE, String::new()));
            return;
        }
    };

    let _ = events.send(ConnectionEvent::Opened(handle));

    let (mut write, mut read) = ws.split();
    let mut close: Option<(u16, String)> = None;
    let mut close_deadline: Option<Instant> = None;
    let mut commands_open = true;

    loop {
        tokio::select! {
            frame = read.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    let _ = events.send(ConnectionEvent::Message(handle, text.to_string()));
                }
                Some(Ok(Message::Close(frame))) => {
                    let info = match frame {
                        Some(frame) => (u16::from(frame.code), frame.reason.to_string()),
                        None => (NO_STATUS_CLOSURE, String::new()),
                    };
                    close.get_or_insert(info);
                }
                Some(Ok(_)) => {}
                Some(Err(WsError::ConnectionClosed)) | None => break,
                Some(Err(e)) => {
                    let _ = events.send(ConnectionEvent::TransportError(handle, e.to_string()));
                    break;
                }
            },
            command = commands.recv(), if commands_open => match command {
                Some(SocketCommand::Send(payload)) => {
                    if let Err(e) = write.send(Message::Text(payload.into())).await {
                        let _ = events.send(ConnectionEvent::TransportError(handle, e.to_string()));
                    }
                }
                Some(SocketCommand::Close { code, reason }) => {
                    commands_open = false;
                    close.get_or_insert((code, reason.to_string()));
                    close_deadline = Some(Instant::now() + CLOSE_HANDSHAKE_TIMEOUT);
                    let frame = CloseFrame {
                        code: CloseCode::from(code),
                        reason: reason.to_string().into(),
                    };
                    if let Err(e) = write.send(Message::Close(Some(frame))).await {
                        debug!("Socket {} close frame not sent: {}", handle, e);
                        break;
                    }
                }
                None => {
                    // driver is gone; nobody is left to hear about this socket
                    commands_open = false;
                    close_deadline = Some(Instant::now() + CLOSE_HANDSHAKE_TIMEOUT);
                    let _ = write.send(Message::Close(None)).await;
                }
            },
            _ = wait_until(close_deadline), if close_deadline.is_some() => {
                debug!("Socket {} close handshake timed out", handle);
                break;
            }
        }
    }

    let (code, reason) = close.unwrap_or((ABNORMAL_CLOSURE, String::new()));
    let _ = events.send(closed(handle, code, reason));
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::RoomId;
    use tokio_test::{assert_pending, assert_ready, task};

    fn connection(endpoint: Option<&str>) -> (Connection, ConnectionHandle, Arc<GameStore>) {
        let config = ClientConfig::new(
            endpoint.map(str::to_string),
            RoomId::parse("ABCDE").unwrap(),
            "Ann",
        )
        .unwrap();
        let store = Arc::new(GameStore::new());
        let (connection, handle) = Connection::new(config, Arc::clone(&store));
        (connection, handle, store)
    }

    #[test]
    fn test_no_deadline_never_fires() {
        let mut wait = task::spawn(wait_until(None));
        assert_pending!(wait.poll());
        assert_pending!(wait.poll());
    }

    #[tokio::test(start_paused = true)]
    async fn test_past_deadline_fires() {
        let fired = timeout(
            Duration::from_millis(10),
            wait_until(Some(Instant::now() - Duration::from_millis(1))),
        )
        .await;
        assert!(fired.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_future_deadline_waits() {
        let deadline = Instant::now() + Duration::from_millis(100);
        let mut wait = task::spawn(wait_until(Some(deadline)));
        assert_pending!(wait.poll());

        tokio::time::advance(Duration::from_millis(100)).await;
        assert_ready!(wait.poll());
    }

    #[test]
    fn test_handle_outlives_connection() {
        let (connection, handle, _store) = connection(Some("ws://127.0.0.1:9"));
        drop(connection);

        handle.send(OutboundMessage::Input {
            seq: 1,
            pressed: Default::default(),
        });
        handle.teardown();
    }

    #[test]
    fn test_run_stops_on_teardown() {
        let (connection, handle, store) = connection(None);
        handle.teardown();

        tokio_test::block_on(connection.run());

        assert!(store.error().is_some());
        assert_eq!(store.connection_state(), ConnectionState::Closed);
    }

    #[test]
    fn test_reconnect_timer_follows_effects() {
        tokio_test::block_on(async {
            let (mut connection, _handle, _store) = connection(None);

            connection.execute(Effect::ScheduleReconnect(Duration::from_millis(50)));
            assert!(connection.reconnect_at.is_some());

            connection.execute(Effect::CancelReconnect);
            assert!(connection.reconnect_at.is_none());
        });
    }
}
