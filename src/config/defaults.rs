//! Default values for configuration fields
//!
//! This module centralizes all default value functions used in serde
//! deserialization. Where a tuning constant exists in [`crate::constants`]
//! the default delegates to it, so the config file and the code never
//! disagree about a value.

use crate::constants::{cache, feed, limits, timeout};
use crate::storage::FeedDirection;
use crate::types::{HostName, Port};
use std::time::Duration;

/// Default listen port (unprivileged; the well-known 119 needs root)
#[inline]
pub fn listen_port() -> Port {
    Port::new(1119).expect("1119 is non-zero")
}

/// Default server name announced in greetings and stamped into generated message-ids
#[inline]
pub fn server_name() -> HostName {
    HostName::new("news.localdomain").expect("default server name is non-empty")
}

/// Default worker thread count (0 would mean one per CPU core)
#[inline]
pub fn workers() -> usize {
    1
}

/// Default for anonymous access (true = full command set without AUTHINFO)
#[inline]
pub fn anonymous() -> bool {
    true
}

/// Default storage provider name
#[inline]
pub fn storage_provider() -> String {
    "memory".to_string()
}

/// Default session idle timeout
#[inline]
pub fn idle_timeout() -> Duration {
    timeout::SESSION_IDLE
}

/// Default command line length limit in octets (RFC 3977 §3.1 minimum)
#[inline]
pub fn max_command_line() -> usize {
    limits::COMMAND_LINE
}

/// Default TTL for completed-offer cache entries
#[inline]
pub fn cache_ttl() -> Duration {
    cache::DEFAULT_TTL
}

/// Default interval between background sweeps of expired offers
#[inline]
pub fn cache_sweep_interval() -> Option<Duration> {
    Some(cache::SWEEP_INTERVAL)
}

/// Default interval between pull feed cycles
#[inline]
pub fn feed_cycle_interval() -> Duration {
    feed::PULL_INTERVAL
}

/// Default per-operation timeout for peer network exchanges
#[inline]
pub fn feed_network_timeout() -> Duration {
    timeout::FEED_NETWORK
}

/// Default delivery attempts per article and peer before giving up
#[inline]
pub fn max_push_retries() -> u32 {
    feed::PUSH_MAX_ATTEMPTS
}

/// Default feed direction for peers that do not specify one
#[inline]
pub fn feed_direction() -> FeedDirection {
    FeedDirection::Both
}

/// Default peer group filter (everything)
#[inline]
pub fn peer_groups() -> String {
    "*".to_string()
}

/// Default posting flag for seeded groups
#[inline]
pub fn posting() -> bool {
    true
}
