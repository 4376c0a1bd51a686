//! Enqueue side of the push feeder's article queue

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::debug;

use crate::protocol::Article;

/// Capability to queue an article for push propagation.
///
/// Cheap to clone; the server hands one to every session so accepted
/// POST and IHAVE articles reach the push feeder without the command
/// layer knowing anything about peers. Enqueueing never performs
/// network I/O and never blocks on the daemon.
#[derive(Debug, Clone)]
pub struct FeedHandle {
    tx: mpsc::UnboundedSender<Arc<Article>>,
}

impl FeedHandle {
    /// Create the queue, returning the enqueue handle and the receiving
    /// end the push feeder drains.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Arc<Article>>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Queue an article for delivery to matching push peers.
    ///
    /// Returns immediately after the enqueue. FIFO relative to other
    /// enqueues from the same caller. Articles queued after the feeder
    /// has shut down are dropped silently; shutdown means the server is
    /// going away anyway.
    pub fn queue_for_push(&self, article: Arc<Article>) {
        if self.tx.send(article).is_err() {
            debug!("Push feeder stopped; dropping queued article");
        }
    }
}
