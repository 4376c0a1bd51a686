//! Session lifecycle state machine
//!
//! Every connection walks the same one-directional lifecycle:
//!
//! ```text
//! UNAUTHENTICATED -> AUTHENTICATED -> GROUP_SELECTED -> ARTICLE_SELECTED
//!        |                 |                |                  |
//!        +-----------------+----------------+------------------+-> DISCONNECTED
//! ```
//!
//! Sessions start at `Authenticated` when anonymous access is configured
//! and at `Unauthenticated` otherwise. Transitions happen only on
//! successful command execution; a failed command leaves the state
//! untouched. `Disconnected` is terminal, entered on QUIT, transport
//! close, or an unrecoverable error.

use std::fmt;

/// Lifecycle state of one client session.
///
/// The state is owned exclusively by the connection's task alongside the
/// rest of the session, so plain reads and writes suffice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Connected but not yet allowed past the authentication gate
    Unauthenticated,
    /// Allowed to issue reader commands; no group selected yet
    Authenticated,
    /// A newsgroup is selected but no current article
    GroupSelected,
    /// A newsgroup and a current article number are selected
    ArticleSelected,
    /// Terminal; the driver stops reading once this is reached
    Disconnected,
}

impl SessionState {
    /// Whether commands behind the authentication gate may run.
    ///
    /// True in every state past `Unauthenticated` except `Disconnected`.
    #[inline]
    #[must_use]
    pub fn gate_open(self) -> bool {
        !matches!(self, Self::Unauthenticated | Self::Disconnected)
    }

    /// Terminal states never transition again
    #[inline]
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Disconnected)
    }

    /// Short name used in logs
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Unauthenticated => "unauthenticated",
            Self::Authenticated => "authenticated",
            Self::GroupSelected => "group-selected",
            Self::ArticleSelected => "article-selected",
            Self::Disconnected => "disconnected",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
