//! Constants used throughout the NNTP server
//!
//! This module centralizes magic numbers and default values
//! to improve maintainability and reduce duplication.

use std::time::Duration;

/// Line and article size limits
///
/// Limits follow RFC 3977 where it sets one (command lines) and are
/// otherwise sized for real Usenet traffic:
/// - Commands are small (< 512 bytes including CRLF)
/// - Text articles are a few KB; binaries dominate at ~700KB
pub mod limits {
    /// Maximum command line length in octets, including CRLF (RFC 3977 §3.1)
    pub const COMMAND_LINE: usize = 512;

    /// Maximum accepted article size (4MB)
    /// Oversize POST/IHAVE transfers are rejected, not truncated
    pub const ARTICLE_MAX: usize = 4 * 1024 * 1024;

    /// BufReader capacity for session line reading (64KB)
    /// Large enough that header blocks rarely need a second syscall
    pub const READER_CAPACITY: usize = 64 * 1024;

    /// Initial capacity for response accumulation buffers (8KB)
    /// Sized for status lines and small multi-line responses
    pub const RESPONSE_INITIAL: usize = 8192;

    /// Verify an article can always hold at least one full command line
    const _ORDERING: () = assert!(ARTICLE_MAX > COMMAND_LINE, "ARTICLE_MAX too small");

    /// Verify the reader never has to split a command line
    const _READER_FITS: () = assert!(
        READER_CAPACITY >= COMMAND_LINE,
        "READER_CAPACITY must hold a command line"
    );
}

/// Socket buffer size constants
pub mod socket {
    /// TCP receive buffer for client sessions (1MB)
    /// Covers an entire typical binary article in one window
    pub const SESSION_RECV_BUFFER: usize = 1024 * 1024;

    /// TCP send buffer for client sessions (1MB)
    pub const SESSION_SEND_BUFFER: usize = 1024 * 1024;

    /// TCP buffer size for outbound feed connections (256KB)
    /// Feed transfers are article-at-a-time; no need for session sizing
    pub const FEED_BUFFER: usize = 256 * 1024;
}

/// Timeout constants
pub mod timeout {
    use super::Duration;

    /// Default session idle timeout before forced disconnect
    pub const SESSION_IDLE: Duration = Duration::from_secs(600);

    /// Timeout for a single network operation during a feed exchange
    pub const FEED_NETWORK: Duration = Duration::from_secs(30);

    /// Connection timeout when dialing a peer
    pub const FEED_CONNECT: Duration = Duration::from_secs(10);

    /// How long graceful shutdown waits for daemons to finish an iteration
    pub const SHUTDOWN_DRAIN: Duration = Duration::from_secs(5);
}

/// Feed daemon defaults
pub mod feed {
    use super::Duration;

    /// Default interval between pull cycles
    pub const PULL_INTERVAL: Duration = Duration::from_secs(300);

    /// Default delay before retrying a failed push delivery
    pub const PUSH_RETRY_DELAY: Duration = Duration::from_secs(30);

    /// Default maximum delivery attempts per article per peer set
    pub const PUSH_MAX_ATTEMPTS: u32 = 3;

    /// Checkpoint used for a peer that has never completed a pull cycle
    /// (unix seconds; 0 means "everything the peer has")
    pub const INITIAL_CHECKPOINT: u64 = 0;
}

/// Expiring cache defaults
pub mod cache {
    use super::Duration;

    /// Default entry time-to-live
    pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

    /// Default interval between background sweeps of expired entries
    pub const SWEEP_INTERVAL: Duration = Duration::from_secs(60);
}

/// Display strings for logging
pub mod user {
    /// Display name for anonymous/unauthenticated sessions
    ///
    /// Used as map key and display value for sessions that haven't
    /// authenticated. The `<anonymous>` format is chosen to:
    /// - Sort first in alphabetical listings (< comes before letters)
    /// - Be clearly distinguished from actual usernames
    /// - Be consistent across all logging
    pub const ANONYMOUS: &str = "<anonymous>";
}
