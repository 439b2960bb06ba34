//! Keyboard capture with sequencing

use macroquad::prelude::*;
use shared::{Direction, OutboundMessage};
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq)]
pub enum InputAction {
    /// A movement message ready to be sent to the server.
    Move(OutboundMessage),
    DismissError,
    Leave,
}

/// Direction bound to `key`, if any. Arrow keys and WASD both steer.
pub fn direction_for(key: KeyCode) -> Option<Direction> {
    match key {
        KeyCode::Up | KeyCode::W => Some(Direction::Up),
        KeyCode::Down | KeyCode::S => Some(Direction::Down),
        KeyCode::Left | KeyCode::A => Some(Direction::Left),
        KeyCode::Right | KeyCode::D => Some(Direction::Right),
        _ => None,
    }
}

/// Turns key presses into actions. One instance per session, so sequence
/// numbers keep increasing across reconnects.
pub struct InputManager {
    next_sequence: u32,
}

impl InputManager {
    pub fn new() -> Self {
        Self { next_sequence: 1 }
    }

    /// Handles a fresh press of `key` while `held` keys are down.
    ///
    /// A direction press reports every direction currently held, so diagonal
    /// movement survives a second key going down.
    pub fn on_key<I>(&mut self, key: KeyCode, held: I) -> Option<InputAction>
    where
        I: IntoIterator<Item = KeyCode>,
    {
        match key {
            KeyCode::Escape => return Some(InputAction::Leave),
            KeyCode::Enter | KeyCode::KpEnter => return Some(InputAction::DismissError),
            _ => {}
        }

        let pressed_now = direction_for(key)?;
        let mut pressed: BTreeSet<Direction> = held.into_iter().filter_map(direction_for).collect();
        pressed.insert(pressed_now);

        let seq = self.next_sequence;
        self.next_sequence = self.next_sequence.wrapping_add(1);
        Some(InputAction::Move(OutboundMessage::Input { seq, pressed }))
    }

    /// Reads this frame's key presses from macroquad.
    pub fn poll(&mut self) -> Vec<InputAction> {
        let held: Vec<KeyCode> = get_keys_down().into_iter().collect();
        let mut pressed: Vec<KeyCode> = get_keys_pressed().into_iter().collect();
        // stable order within a frame
        pressed.sort_by_key(|key| *key as u32);

        pressed
            .into_iter()
            .filter_map(|key| self.on_key(key, held.iter().copied()))
            .collect()
    }

    pub fn next_sequence(&self) -> u32 {
        self.next_sequence
    }
}

impl Default for InputManager {
    fn default() -> Self {
        Self::new()
    }
}
