use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Close code for an orderly shutdown; never triggers a reconnect.
pub const NORMAL_CLOSURE: u16 = 1000;
/// Reported when the peer closed without a status code.
pub const NO_STATUS_CLOSURE: u16 = 1005;
/// Connection dropped without a close handshake (unreachable server, reset, ...).
pub const ABNORMAL_CLOSURE: u16 = 1006;

pub const DEFAULT_RECONNECT_DELAY_MS: u64 = 3000;

pub const ROOM_ID_LEN: usize = 5;
const ROOM_ID_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Messages sent from the client to the game server.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OutboundMessage {
    Join {
        #[serde(rename = "roomId")]
        room_id: String,
        name: String,
        width: u32,
        height: u32,
    },
    Input {
        seq: u32,
        pressed: BTreeSet<Direction>,
    },
}

impl OutboundMessage {
    pub fn kind(&self) -> &'static str {
        match self {
            OutboundMessage::Join { .. } => "join",
            OutboundMessage::Input { .. } => "input",
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Messages received from the game server. Only `tick` carries meaning for
/// the client; any other well-formed JSON decodes to `Unknown`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum InboundMessage {
    Tick { players: Vec<Player>, orb: Orb },
    #[serde(other)]
    Unknown,
}

impl InboundMessage {
    /// Fails only on invalid JSON or a `tick` with a bad body. Frames without
    /// a `"type": "tick"` field are `Unknown`, whatever their shape.
    pub fn decode(text: &str) -> Result<Self, serde_json::Error> {
        let value: serde_json::Value = serde_json::from_str(text)?;
        if value.get("type").and_then(serde_json::Value::as_str) != Some("tick") {
            return Ok(InboundMessage::Unknown);
        }
        serde_json::from_value(value)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Player {
    pub id: String,
    pub name: String,
    pub x: f32,
    pub y: f32,
    #[serde(rename = "orbsCollected")]
    pub orbs_collected: u32,
}

impl Player {
    pub fn new(id: impl Into<String>, name: impl Into<String>, x: f32, y: f32) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            x,
            y,
            orbs_collected: 0,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
pub struct Orb {
    pub x: f32,
    pub y: f32,
}

impl Orb {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Short shareable room code, e.g. `Z3K9D`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RoomId(String);

impl RoomId {
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let code = (0..ROOM_ID_LEN)
            .map(|_| ROOM_ID_ALPHABET[rng.gen_range(0..ROOM_ID_ALPHABET.len())] as char)
            .collect();
        RoomId(code)
    }

    /// Accepts any non-empty code made of ASCII letters and digits; lowercase
    /// letters are normalised to uppercase.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || !trimmed.chars().all(|c| c.is_ascii_alphanumeric()) {
            return None;
        }
        Some(RoomId(trimmed.to_ascii_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
