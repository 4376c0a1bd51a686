//! Configuration type definitions
//!
//! This module contains all the core configuration structures used by the server.

use crate::storage::{FeedDirection, Peer};
use crate::types::{duration_serde, option_duration_serde, GroupName, HostName, PeerName, Port};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main server configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct Config {
    /// Listener and server identity settings
    #[serde(default)]
    pub server: ServerConfig,
    /// Client authentication settings
    #[serde(default)]
    pub auth: AuthConfig,
    /// Storage backend selection
    #[serde(default)]
    pub storage: StorageConfig,
    /// Per-connection session settings
    #[serde(default)]
    pub session: SessionConfig,
    /// Completed-offer cache settings
    #[serde(default)]
    pub cache: CacheConfig,
    /// Peer feed settings
    #[serde(default)]
    pub feed: FeedConfig,
    /// Newsgroups created in storage at startup if missing
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<GroupConfig>,
}

/// Listener and identity settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    /// Host/IP to bind to (default: 0.0.0.0)
    pub host: String,
    /// Port to listen on (default: 1119)
    pub port: Port,
    /// Name this server announces in greetings and stamps into
    /// generated message-ids
    pub name: HostName,
    /// Whether this server accepts POST at all; a read-only mirror
    /// sets this false and answers 440
    pub posting: bool,
    /// Number of worker threads (default: 1, use 0 for CPU cores)
    pub workers: usize,
}

impl ServerConfig {
    /// Default listen host (all interfaces)
    pub const DEFAULT_HOST: &'static str = "0.0.0.0";
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: Self::DEFAULT_HOST.to_string(),
            port: super::defaults::listen_port(),
            name: super::defaults::server_name(),
            posting: super::defaults::posting(),
            workers: super::defaults::workers(),
        }
    }
}

/// Client authentication settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AuthConfig {
    /// Whether clients may use the full command set without authenticating
    pub anonymous: bool,
    /// Authorized users; credential pairs are validated at startup
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub users: Vec<UserCredentials>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            anonymous: super::defaults::anonymous(),
            users: Vec::new(),
        }
    }
}

impl AuthConfig {
    /// Credential pairs in the shape the auth validator consumes
    #[must_use]
    pub fn user_pairs(&self) -> Vec<(String, String)> {
        self.users
            .iter()
            .map(|u| (u.username.clone(), u.password.clone()))
            .collect()
    }
}

/// Individual user credentials
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserCredentials {
    pub username: String,
    pub password: String,
}

/// Storage backend selection
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StorageConfig {
    /// Registered provider name (default: "memory")
    pub provider: String,
    /// Opaque configuration token passed through to the provider
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            provider: super::defaults::storage_provider(),
            token: None,
        }
    }
}

/// Per-connection session settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SessionConfig {
    /// Idle time after which a silent connection is dropped
    #[serde(with = "duration_serde")]
    pub idle_timeout: Duration,
    /// Maximum accepted command line length in octets
    pub max_command_line: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_timeout: super::defaults::idle_timeout(),
            max_command_line: super::defaults::max_command_line(),
        }
    }
}

/// Completed-offer cache settings for the push feeder
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CacheConfig {
    /// Time-to-live for completed-offer entries
    #[serde(with = "duration_serde")]
    pub ttl: Duration,
    /// Interval between background sweeps of expired entries;
    /// omit to disable the sweeper (lazy expiry still applies)
    #[serde(with = "option_duration_serde", skip_serializing_if = "Option::is_none")]
    pub sweep_interval: Option<Duration>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: super::defaults::cache_ttl(),
            sweep_interval: super::defaults::cache_sweep_interval(),
        }
    }
}

/// Peer feed settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FeedConfig {
    /// Interval between pull cycles
    #[serde(with = "duration_serde")]
    pub cycle_interval: Duration,
    /// Per-operation timeout for peer network exchanges
    #[serde(with = "duration_serde")]
    pub network_timeout: Duration,
    /// Delivery attempts per article and peer before giving up
    pub max_push_retries: u32,
    /// Peer subscriptions
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub peers: Vec<PeerConfig>,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            cycle_interval: super::defaults::feed_cycle_interval(),
            network_timeout: super::defaults::feed_network_timeout(),
            max_push_retries: super::defaults::max_push_retries(),
            peers: Vec::new(),
        }
    }
}

/// Configuration for a single feed peer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PeerConfig {
    pub name: PeerName,
    pub host: HostName,
    pub port: Port,
    /// Whether we pull from this peer, push to it, or both
    #[serde(default = "super::defaults::feed_direction")]
    pub direction: FeedDirection,
    /// Wildmat selecting which groups this peer exchanges
    #[serde(default = "super::defaults::peer_groups")]
    pub groups: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl PeerConfig {
    /// Materialize the storage-facing peer record
    #[must_use]
    pub fn to_peer(&self, checkpoint: u64) -> Peer {
        Peer {
            name: self.name.clone(),
            host: self.host.clone(),
            port: self.port,
            username: self.username.clone(),
            password: self.password.clone(),
            direction: self.direction,
            group_filter: self.groups.clone(),
            checkpoint,
        }
    }
}

/// A newsgroup created in storage at startup if missing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GroupConfig {
    pub name: GroupName,
    /// Whether clients may POST to this group
    #[serde(default = "super::defaults::posting")]
    pub posting: bool,
}
