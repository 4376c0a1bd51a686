//! Connection error types for sessions and feed exchanges
//!
//! This module provides detailed error types for connection handling,
//! making it easier to diagnose and handle different failure scenarios.
//! The session driver and the feed client both report through
//! [`ConnectionError`]; the server picks a log level per variant so
//! ordinary client disconnects stay out of the error log.

use std::fmt;

use crate::storage::StorageError;

/// Errors that can occur while serving a session or feeding a peer
#[derive(Debug)]
#[non_exhaustive]
pub enum ConnectionError {
    /// TCP connection to a peer failed
    TcpConnect {
        host: String,
        port: u16,
        source: std::io::Error,
    },

    /// Socket configuration failed (buffer sizes, nodelay, etc.)
    SocketConfig {
        operation: String,
        source: std::io::Error,
    },

    /// Peer rejected our AUTHINFO credentials
    AuthenticationFailed { peer: String, response: String },

    /// Invalid or unexpected greeting from a peer
    InvalidGreeting { peer: String, greeting: String },

    /// Peer answered a command with a status we cannot proceed from
    UnexpectedResponse { command: String, response: String },

    /// A received line exceeded the configured limit
    LineTooLong { limit: usize },

    /// Session idled past the configured timeout and was reclaimed
    IdleTimeout,

    /// A feed network operation exceeded its deadline
    Timeout { operation: String },

    /// I/O error during communication
    IoError(std::io::Error),

    /// Storage fault that could not be answered with a status line
    Storage(StorageError),
}

impl fmt::Display for ConnectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TcpConnect { host, port, source } => {
                write!(f, "Failed to connect to {}:{}: {}", host, port, source)
            }
            Self::SocketConfig { operation, source } => {
                write!(f, "Failed to configure socket ({}): {}", operation, source)
            }
            Self::AuthenticationFailed { peer, response } => {
                write!(f, "Authentication failed for peer '{}': {}", peer, response)
            }
            Self::InvalidGreeting { peer, greeting } => {
                write!(f, "Invalid greeting from peer '{}': {}", peer, greeting)
            }
            Self::UnexpectedResponse { command, response } => {
                write!(f, "Unexpected response to {}: {}", command, response)
            }
            Self::LineTooLong { limit } => {
                write!(f, "Received line exceeds {} octets", limit)
            }
            Self::IdleTimeout => write!(f, "Session idle timeout"),
            Self::Timeout { operation } => write!(f, "Timed out during {}", operation),
            Self::IoError(e) => write!(f, "I/O error: {}", e),
            Self::Storage(e) => write!(f, "Storage fault: {}", e),
        }
    }
}

impl std::error::Error for ConnectionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::TcpConnect { source, .. } => Some(source),
            Self::SocketConfig { source, .. } => Some(source),
            Self::IoError(e) => Some(e),
            Self::Storage(e) => Some(e),
            _ => None,
        }
    }
}

impl ConnectionError {
    /// Check if this is the client going away (EOF, reset, broken pipe)
    #[must_use]
    pub fn is_client_disconnect(&self) -> bool {
        matches!(self, Self::IoError(e) if matches!(
            e.kind(),
            std::io::ErrorKind::UnexpectedEof
                | std::io::ErrorKind::BrokenPipe
                | std::io::ErrorKind::ConnectionReset
                | std::io::ErrorKind::ConnectionAborted
        ))
    }

    /// Check if this is a network connectivity error worth retrying
    #[must_use]
    pub const fn is_network_error(&self) -> bool {
        matches!(self, Self::TcpConnect { .. } | Self::Timeout { .. })
    }

    /// Get the appropriate log level for this error
    #[must_use]
    pub fn log_level(&self) -> tracing::Level {
        match self {
            // Clients vanishing mid-session is normal
            e if e.is_client_disconnect() => tracing::Level::DEBUG,
            // So is reclaiming an idle session
            Self::IdleTimeout => tracing::Level::DEBUG,
            Self::IoError(_) => tracing::Level::WARN,
            // Misbehaving peers and backends need attention
            Self::AuthenticationFailed { .. } | Self::Storage(_) => tracing::Level::ERROR,
            // Network errors might be transient
            Self::TcpConnect { .. } | Self::Timeout { .. } => tracing::Level::WARN,
            // Everything else is a warning
            _ => tracing::Level::WARN,
        }
    }
}

impl From<std::io::Error> for ConnectionError {
    fn from(err: std::io::Error) -> Self {
        Self::IoError(err)
    }
}

impl From<StorageError> for ConnectionError {
    fn from(err: StorageError) -> Self {
        Self::Storage(err)
    }
}

// Note: No need for From<ConnectionError> for anyhow::Error
// anyhow has a blanket impl for all types implementing std::error::Error
