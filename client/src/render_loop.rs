//! Display-rate loop, decoupled from network timing.
//!
//! The loop never waits on the connection: every frame it takes whatever
//! world the store holds at that moment, composes a [`Frame`] and paints it.
//! Ticks that land between two frames are simply never drawn.

use crate::game::{GameStore, Viewport};
use crate::input::{InputAction, InputManager};
use crate::network::ConnectionHandle;
use crate::palette::ColorAllocator;
use crate::rendering::Renderer;
use crate::scene::{compose_frame, Frame, Overlay};
use log::{info, warn};
use macroquad::prelude::*;
use std::sync::Arc;
use std::thread::JoinHandle;

/// Builds frames from the store. Owns the color allocator, so colors are
/// stable for as long as one composer lives.
pub struct FrameComposer {
    store: Arc<GameStore>,
    colors: ColorAllocator,
    room_label: String,
}

impl FrameComposer {
    pub fn new(store: Arc<GameStore>, room_label: impl Into<String>) -> Self {
        Self {
            store,
            colors: ColorAllocator::new(),
            room_label: room_label.into(),
        }
    }

    /// Composes the frame for the latest world. Reads the store afresh on
    /// every call.
    pub fn compose(&mut self, viewport: Viewport) -> Frame {
        let world = self.store.world();
        let error = self.store.error();
        let overlay = Overlay {
            room_id: &self.room_label,
            connection: self.store.connection_state(),
            error: error.as_deref(),
        };

        compose_frame(&world, &mut self.colors, viewport, &overlay)
    }

    pub fn colors(&self) -> &ColorAllocator {
        &self.colors
    }
}

/// Reports the surface size when it differs from the last one seen.
#[derive(Debug, Default)]
pub struct ResizeWatcher {
    last: Option<Viewport>,
}

impl ResizeWatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, width: f32, height: f32) -> Option<Viewport> {
        if width < 1.0 || height < 1.0 {
            return None;
        }

        let viewport = Viewport::new(width.round() as u32, height.round() as u32);
        if self.last == Some(viewport) {
            return None;
        }
        self.last = Some(viewport);
        Some(viewport)
    }
}

pub struct RenderLoop {
    store: Arc<GameStore>,
    composer: FrameComposer,
    renderer: Renderer,
    input: InputManager,
    resize: ResizeWatcher,
    connection: Option<ConnectionHandle>,
    network_thread: Option<JoinHandle<()>>,
}

impl RenderLoop {
    pub fn new(store: Arc<GameStore>, room_label: impl Into<String>) -> Self {
        Self {
            composer: FrameComposer::new(Arc::clone(&store), room_label),
            store,
            renderer: Renderer::new(),
            input: InputManager::new(),
            resize: ResizeWatcher::new(),
            connection: None,
            network_thread: None,
        }
    }

    pub fn with_connection(mut self, handle: ConnectionHandle, thread: JoinHandle<()>) -> Self {
        self.connection = Some(handle);
        self.network_thread = Some(thread);
        self
    }

    /// Runs until the player leaves (Esc) or the window is closed, then tears
    /// the connection down and waits for the connection thread.
    pub async fn run(mut self) {
        prevent_quit();
        info!("Render loop started");

        let mut viewport = self.store.viewport();
        loop {
            if is_quit_requested() {
                break;
            }

            if let Some(resized) = self.resize.observe(screen_width(), screen_height()) {
                viewport = resized;
                self.store.set_viewport(resized);
            }

            if !self.handle_input() {
                break;
            }

            let frame = self.composer.compose(viewport);
            self.renderer.draw(&frame);

            next_frame().await;
        }

        self.leave();
    }

    /// Applies this frame's input. Returns false once the player leaves.
    fn handle_input(&mut self) -> bool {
        for action in self.input.poll() {
            match action {
                InputAction::Move(message) => match &self.connection {
                    Some(connection) => connection.send(message),
                    None => warn!("No connection, input dropped"),
                },
                InputAction::DismissError => self.store.clear_error(),
                InputAction::Leave => return false,
            }
        }
        true
    }

    fn leave(&mut self) {
        info!("Leaving after {} frames", self.renderer.frames_drawn());

        if let Some(connection) = self.connection.take() {
            connection.teardown();
        }
        if let Some(thread) = self.network_thread.take() {
            if thread.join().is_err() {
                warn!("Connection thread panicked");
            }
        }
    }
}
