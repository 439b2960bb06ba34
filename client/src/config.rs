//! Session configuration and endpoint validation.

use crate::error::ConfigError;
use shared::{RoomId, DEFAULT_RECONNECT_DELAY_MS};
use std::fmt;
use std::time::Duration;

/// A WebSocket endpoint that has passed scheme validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint(String);

impl Endpoint {
    pub fn parse(raw: Option<&str>) -> Result<Self, ConfigError> {
        let raw = raw.map(str::trim).filter(|s| !s.is_empty());
        match raw {
            None => Err(ConfigError::MissingEndpoint),
            Some(url) if url.starts_with("ws://") || url.starts_with("wss://") => {
                Ok(Endpoint(url.to_string()))
            }
            Some(url) => Err(ConfigError::InvalidScheme(url.to_string())),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Everything a session needs from its caller: where to connect, which room
/// to join and under what name.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Raw endpoint as supplied; validated on every connect attempt so a bad
    /// value surfaces as a configuration error instead of aborting startup.
    pub endpoint: Option<String>,
    pub room_id: RoomId,
    pub name: String,
    pub reconnect_delay: Duration,
}

impl ClientConfig {
    pub fn new(
        endpoint: Option<String>,
        room_id: RoomId,
        name: &str,
    ) -> Result<Self, ConfigError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ConfigError::EmptyName);
        }

        Ok(Self {
            endpoint,
            room_id,
            name: name.to_string(),
            reconnect_delay: Duration::from_millis(DEFAULT_RECONNECT_DELAY_MS),
        })
    }

    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    pub fn endpoint(&self) -> Result<Endpoint, ConfigError> {
        Endpoint::parse(self.endpoint.as_deref())
    }
}

/// Resolves the room to join: the supplied code if any, otherwise a freshly
/// generated one.
pub fn resolve_room(raw: Option<&str>) -> Result<RoomId, ConfigError> {
    match raw {
        Some(code) => RoomId::parse(code).ok_or_else(|| ConfigError::InvalidRoomId(code.to_string())),
        None => Ok(RoomId::generate(&mut rand::thread_rng())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_accepts_socket_schemes() {
        assert_eq!(
            Endpoint::parse(Some("ws://127.0.0.1:8080")).unwrap().as_str(),
            "ws://127.0.0.1:8080"
        );
        assert!(Endpoint::parse(Some(" wss://arena.example/ws ")).is_ok());
    }

    #[test]
    fn test_endpoint_rejects_missing_or_blank() {
        assert_eq!(Endpoint::parse(None), Err(ConfigError::MissingEndpoint));
        assert_eq!(Endpoint::parse(Some("  ")), Err(ConfigError::MissingEndpoint));
    }

    #[test]
    fn test_endpoint_rejects_other_schemes() {
        assert_eq!(
            Endpoint::parse(Some("http://arena.example")),
            Err(ConfigError::InvalidScheme("http://arena.example".to_string()))
        );
    }

    #[test]
    fn test_config_requires_name() {
        let room = RoomId::parse("Z3K9D").unwrap();
        assert_eq!(
            ClientConfig::new(None, room.clone(), "   ").unwrap_err(),
            ConfigError::EmptyName
        );

        let config = ClientConfig::new(None, room, " Ann ").unwrap();
        assert_eq!(config.name, "Ann");
        assert_eq!(config.reconnect_delay, Duration::from_millis(3000));
    }

    #[test]
    fn test_config_defers_endpoint_validation() {
        let config = ClientConfig::new(
            Some("tcp://nope".to_string()),
            RoomId::parse("ABCDE").unwrap(),
            "Ann",
        )
        .unwrap();
        assert!(matches!(config.endpoint(), Err(ConfigError::InvalidScheme(_))));
    }

    #[test]
    fn test_resolve_room() {
        assert_eq!(resolve_room(Some("z3k9d")).unwrap().as_str(), "Z3K9D");
        assert!(resolve_room(Some("no way")).is_err());
        assert_eq!(resolve_room(None).unwrap().as_str().len(), shared::ROOM_ID_LEN);
    }
}
