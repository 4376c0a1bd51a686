//! Configuration loading from TOML files
//!
//! This module handles reading and parsing the config file, and writing a
//! commented default file on first start so the server comes up without
//! manual setup.

use anyhow::Result;

use super::types::Config;

/// Commented default configuration written when no config file exists
const DEFAULT_CONFIG_TEMPLATE: &str = r#"# NNTP server configuration

[server]
# Interface and port to listen on
host = "0.0.0.0"
port = 1119
# Name announced in greetings and stamped into generated message-ids
name = "news.localdomain"
# Set false to run a read-only mirror that refuses POST
posting = true
# Worker threads (0 = one per CPU core)
workers = 1

[auth]
# Allow the full command set without AUTHINFO
anonymous = true
# Uncomment to add credentials:
# [[auth.users]]
# username = "reader"
# password = "change-me"

[storage]
# Registered storage provider ("memory" is built in)
provider = "memory"

[session]
# Seconds a silent connection is kept before disconnect
idle_timeout = 600
# Longest accepted command line in octets
max_command_line = 512

[cache]
# Seconds a completed peer offer suppresses re-offers
ttl = 300
# Seconds between background sweeps of expired offers
sweep_interval = 60

[feed]
# Seconds between pull cycles
cycle_interval = 300
# Per-operation network timeout in seconds
network_timeout = 30
# Delivery attempts per article and peer before giving up
max_push_retries = 3
# Uncomment to exchange articles with a peer:
# [[feed.peers]]
# name = "upstream"
# host = "news.peer.example"
# port = 119
# direction = "both"
# groups = "*"

# Newsgroups created at startup if missing
[[groups]]
name = "local.test"
posting = true
"#;

/// Load configuration from a TOML file
pub fn load_config(config_path: &str) -> Result<Config> {
    let config_content = std::fs::read_to_string(config_path)
        .map_err(|e| anyhow::anyhow!("Failed to read config file '{}': {}", config_path, e))?;

    let config: Config = toml::from_str(&config_content)
        .map_err(|e| anyhow::anyhow!("Failed to parse config file '{}': {}", config_path, e))?;

    // Validate the loaded configuration
    config.validate()?;

    Ok(config)
}

/// Write the commented default configuration to `config_path` and return it
pub fn create_default_config(config_path: &str) -> Result<Config> {
    let config: Config = toml::from_str(DEFAULT_CONFIG_TEMPLATE)
        .map_err(|e| anyhow::anyhow!("Default config template failed to parse: {}", e))?;
    config.validate()?;

    std::fs::write(config_path, DEFAULT_CONFIG_TEMPLATE).map_err(|e| {
        anyhow::anyhow!("Failed to write default config '{}': {}", config_path, e)
    })?;

    Ok(config)
}
