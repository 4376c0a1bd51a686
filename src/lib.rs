//! NNTP server library
//!
//! An RFC 3977 news server over pluggable storage. Each accepted
//! connection becomes a [`session::Session`] driven by the command
//! registry; AUTHINFO (RFC 4643) gates the command surface when
//! anonymous access is disabled, and the feed daemons exchange articles
//! with configured peers in the background.
//!
//! The binary wires these pieces together from a TOML config file; the
//! library exposes them individually so embedders can swap storage
//! providers or register their own command handlers through
//! [`plugin::ExtensionPoints`].

pub mod auth;
pub mod cache;
pub mod command;
pub mod config;
pub mod connection_error;
pub mod constants;
pub mod feed;
pub mod logging;
pub mod plugin;
pub mod protocol;
pub mod server;
pub mod session;
pub mod storage;
pub mod types;

pub use config::{create_default_config, load_config, Config};
pub use connection_error::ConnectionError;
pub use server::Server;
