//! Configuration module
//!
//! This module handles all configuration types, loading, and validation
//! for the NNTP server.

mod defaults;
mod loading;
mod types;
mod validation;

// Re-export public types
pub use loading::{create_default_config, load_config};
pub use types::{
    AuthConfig, CacheConfig, Config, FeedConfig, GroupConfig, PeerConfig, ServerConfig,
    SessionConfig, StorageConfig, UserCredentials,
};
