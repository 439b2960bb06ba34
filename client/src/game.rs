//! Shared state store: the latest authoritative world as known to this client.
//!
//! Written by the connection side, read by the render loop. Every tick
//! replaces the world wholesale, so a reader holding an `Arc<World>` never
//! observes a half-applied snapshot.

use crate::connection::ConnectionState;
use log::{debug, info};
use shared::{Orb, Player};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct World {
    pub players: Vec<Player>,
    pub orb: Orb,
}

/// Pixel size of the drawing surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(800, 600)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoreEntry {
    pub player_id: String,
    pub player_name: String,
    pub orbs_collected: u32,
}

pub struct GameStore {
    world: RwLock<Arc<World>>,
    ticks: AtomicU64,
    error: RwLock<Option<String>>,
    viewport: RwLock<Viewport>,
    connection: RwLock<ConnectionState>,
}

impl GameStore {
    pub fn new() -> Self {
        Self::with_viewport(Viewport::default())
    }

    pub fn with_viewport(viewport: Viewport) -> Self {
        Self {
            world: RwLock::new(Arc::new(World::default())),
            ticks: AtomicU64::new(0),
            error: RwLock::new(None),
            viewport: RwLock::new(viewport),
            connection: RwLock::new(ConnectionState::Idle),
        }
    }

    /// Replaces players and orb in one step.
    pub fn apply_tick(&self, players: Vec<Player>, orb: Orb) {
        let world = Arc::new(World { players, orb });
        *write(&self.world) = world;
        let tick = self.ticks.fetch_add(1, Ordering::AcqRel) + 1;
        debug!("Applied tick #{}", tick);
    }

    pub fn world(&self) -> Arc<World> {
        Arc::clone(&read(&self.world))
    }

    /// Number of ticks applied since the store was created.
    pub fn tick_count(&self) -> u64 {
        self.ticks.load(Ordering::Acquire)
    }

    pub fn error(&self) -> Option<String> {
        read(&self.error).clone()
    }

    pub fn set_error(&self, message: impl Into<String>) {
        let message = message.into();
        info!("Current error: {}", message);
        *write(&self.error) = Some(message);
    }

    pub fn clear_error(&self) {
        *write(&self.error) = None;
    }

    pub fn viewport(&self) -> Viewport {
        *read(&self.viewport)
    }

    pub fn set_viewport(&self, viewport: Viewport) {
        *write(&self.viewport) = viewport;
    }

    pub fn connection_state(&self) -> ConnectionState {
        *read(&self.connection)
    }

    pub fn set_connection_state(&self, state: ConnectionState) {
        *write(&self.connection) = state;
    }

    /// Per-player orb counts, in server order.
    pub fn scoreboard(&self) -> Vec<ScoreEntry> {
        self.world()
            .players
            .iter()
            .map(|player| ScoreEntry {
                player_id: player.id.clone(),
                player_name: player.name.clone(),
                orbs_collected: player.orbs_collected,
            })
            .collect()
    }

    pub fn total_orbs_collected(&self) -> u32 {
        self.world().players.iter().map(|p| p.orbs_collected).sum()
    }
}

impl Default for GameStore {
    fn default() -> Self {
        Self::new()
    }
}

// A panic while holding one of these locks cannot leave the value torn (every
// write is a single assignment), so poisoning is ignored.
fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}
