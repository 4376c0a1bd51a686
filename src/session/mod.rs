//! Client session layer
//!
//! One [`Session`] per accepted connection, driven by a [`Connection`]
//! that owns the socket. Session state (lifecycle, identity, selected
//! group, pending article input) is mutated only by command handlers;
//! shared facilities arrive through the [`SessionContext`].

mod connection;
#[allow(clippy::module_inception)]
mod session;
mod state;
#[cfg(test)]
pub(crate) mod testing;

pub use connection::Connection;
pub use session::{PendingInput, PendingKind, SelectedGroup, Session, SessionContext};
pub use state::SessionState;
