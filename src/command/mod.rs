//! Command dispatch layer
//!
//! Every NNTP command is served by a [`CommandHandler`] registered in a
//! [`CommandRegistry`] under its keyword(s). The connection driver
//! resolves the first word of each received line against the registry
//! and routes the line (and, for POST/IHAVE, the continuation lines
//! that follow) to the resolved handler; handlers return the complete
//! response to write. The registry also assembles the CAPABILITIES
//! list from what is actually registered, so plugins that add or
//! remove commands keep the advertisement honest.

pub mod handler;
pub mod handlers;
pub mod registry;

pub use handler::{CommandError, CommandHandler, Response};
pub use registry::{CommandRegistry, RegistryError};
