//! Article propagation between servers
//!
//! Two daemons keep this server in sync with its configured peers: the
//! pull feeder polls each pull peer for articles newer than a persisted
//! checkpoint, and the push feeder drains a queue of locally accepted
//! articles, offering each to the push peers whose group filter matches.
//! The [`FeedManager`] owns both daemons; sessions only ever see the
//! narrow [`FeedHandle`] enqueue capability.

mod handle;
mod manager;
mod peer;
mod pull;
mod push;
#[cfg(test)]
pub(crate) mod testing;

pub use handle::FeedHandle;
pub use manager::FeedManager;
pub use peer::{OfferOutcome, PeerClient};
pub use pull::PullFeeder;
pub use push::{OfferKey, PushFeeder};
