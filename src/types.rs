//! Core identifier and validated value types
//!
//! This module provides the identifiers and validated values used
//! throughout the server.

pub mod duration;
pub mod validated;

pub use duration::{duration_serde, option_duration_serde};
pub use validated::{GroupName, HostName, MessageId, Password, PeerName, Username, ValidationError};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for client sessions
///
/// Carried as a structured field on every log line a session emits so the
/// lifetime of one connection can be followed through interleaved output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Generate a new unique session ID
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the underlying UUID
    #[must_use]
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A validated TCP port that cannot be zero
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Port(u16);

impl Port {
    /// NNTP well-known port (RFC 3977 §14)
    pub const NNTP: Port = Port(119);

    /// Create a new port, rejecting 0
    pub fn new(port: u16) -> Result<Self, ValidationError> {
        if port == 0 {
            Err(ValidationError::InvalidPort)
        } else {
            Ok(Self(port))
        }
    }

    /// Get the port number
    #[must_use]
    #[inline]
    pub fn get(&self) -> u16 {
        self.0
    }
}

impl TryFrom<u16> for Port {
    type Error = ValidationError;

    fn try_from(port: u16) -> Result<Self, Self::Error> {
        Self::new(port)
    }
}

impl std::fmt::Display for Port {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<'de> Deserialize<'de> for Port {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let port = u16::deserialize(deserializer)?;
        Self::new(port).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // SessionId tests
    #[test]
    fn test_session_id_unique() {
        let id1 = SessionId::new();
        let id2 = SessionId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_session_id_default() {
        let id1 = SessionId::default();
        let id2 = SessionId::default();
        assert_ne!(id1, id2); // Each default() creates unique ID
    }

    #[test]
    fn test_session_id_as_uuid() {
        let id = SessionId::new();
        let uuid = id.as_uuid();
        assert_eq!(uuid.get_version(), Some(uuid::Version::Random));
    }

    #[test]
    fn test_session_id_display() {
        let id = SessionId::new();
        let display = format!("{}", id);
        // UUID format: 8-4-4-4-12 hex characters
        assert_eq!(display.len(), 36);
        assert_eq!(display.chars().filter(|&c| c == '-').count(), 4);
    }

    #[test]
    fn test_session_id_hash() {
        use std::collections::HashSet;

        let id1 = SessionId::new();
        let id2 = id1;
        let id3 = SessionId::new();

        let mut set = HashSet::new();
        set.insert(id1);
        set.insert(id2); // Duplicate, should not increase size
        set.insert(id3);

        assert_eq!(set.len(), 2);
    }

    // Port tests
    #[test]
    fn test_port_valid() {
        let port = Port::new(119).unwrap();
        assert_eq!(port.get(), 119);
    }

    #[test]
    fn test_port_zero_rejected() {
        assert!(matches!(Port::new(0), Err(ValidationError::InvalidPort)));
    }

    #[test]
    fn test_port_max() {
        let port = Port::new(u16::MAX).unwrap();
        assert_eq!(port.get(), 65535);
    }

    #[test]
    fn test_port_nntp_constant() {
        assert_eq!(Port::NNTP.get(), 119);
    }

    #[test]
    fn test_port_display() {
        let port = Port::new(8119).unwrap();
        assert_eq!(format!("{}", port), "8119");
    }

    #[test]
    fn test_port_try_from() {
        let port: Port = 563u16.try_into().unwrap();
        assert_eq!(port.get(), 563);

        let result: Result<Port, _> = 0u16.try_into();
        assert!(result.is_err());
    }

    #[test]
    fn test_port_serde() {
        let port = Port::new(119).unwrap();
        let json = serde_json::to_string(&port).unwrap();
        assert_eq!(json, "119");

        let deserialized: Port = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, port);
    }

    #[test]
    fn test_port_serde_zero_rejected() {
        let result: Result<Port, _> = serde_json::from_str("0");
        assert!(result.is_err());
    }

    #[test]
    fn test_port_ordering() {
        let a = Port::new(119).unwrap();
        let b = Port::new(563).unwrap();
        assert!(a < b);
    }
}
