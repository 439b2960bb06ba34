//! # Arena Dash Client Library
//!
//! Client side of the arena game: keeps one WebSocket session to the
//! authoritative server alive, mirrors the server's snapshots into a shared
//! store and paints that store at display rate.
//!
//! ## Architecture Overview
//!
//! Two long-lived tasks cooperate through a single shared cell:
//!
//! ### Connection
//! Runs on its own thread inside a single-threaded tokio runtime. The
//! lifecycle rules live in a pure state machine ([`connection::ConnectionManager`])
//! that turns events into effects; the driver ([`network::Connection`]) performs
//! those effects against real sockets and timers. At most one socket is ever
//! connecting or open, and an abnormal close schedules exactly one reconnect.
//!
//! ### Render Loop
//! Runs on the main thread under macroquad. Every frame reads the latest world
//! from the [`game::GameStore`], never waiting on the network, and paints it.
//!
//! ### Shared State Store
//! Each tick replaces the world wholesale behind an `Arc`, so a frame always
//! sees one consistent snapshot even while the next tick is being applied.
//!
//! ## Module Organization
//!
//! ### Configuration (`config`, `error`)
//! - Endpoint validation (`ws://` or `wss://`)
//! - Room code and display name checks
//! - The error taxonomy surfaced to the player
//!
//! ### Networking (`connection`, `network`)
//! - Lifecycle state machine with stale-handle protection
//! - Join on open, tick decoding, delayed reconnect
//! - Idempotent teardown
//!
//! ### Presentation (`palette`, `dragon`, `scene`, `rendering`, `render_loop`)
//! - Stable per-player colors
//! - Display-list composition in a fixed paint order
//! - macroquad drawing and window resizing
//!
//! ### Input (`input`)
//! - Arrow keys and WASD to steer, Enter to dismiss errors, Esc to leave
//! - Monotonic sequence numbers for the whole session
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use client::config::{resolve_room, ClientConfig};
//! use client::game::GameStore;
//! use client::network::Connection;
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let room = resolve_room(Some("ABCDE"))?;
//! let config = ClientConfig::new(Some("ws://127.0.0.1:8080".into()), room, "Ada")?;
//! let store = Arc::new(GameStore::new());
//!
//! let (connection, handle) = Connection::new(config, Arc::clone(&store));
//! let thread = connection.spawn()?;
//!
//! // ... render frames from `store.world()` ...
//!
//! handle.teardown();
//! let _ = thread.join();
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod connection;
pub mod dragon;
pub mod error;
pub mod game;
pub mod input;
pub mod network;
pub mod palette;
pub mod render_loop;
pub mod rendering;
pub mod scene;
