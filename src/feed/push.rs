//! Push side of peer feeding
//!
//! A dispatcher drains the queue sessions feed through [`FeedHandle`] and
//! routes each article to one delivery worker per push peer, matching the
//! article's newsgroups against the peer's wildmat filter. Workers run
//! independently, so a dead peer backs up its own queue and nobody
//! else's. Completed offers (accepted, unwanted, or rejected) are
//! remembered in an expiring cache so a re-queued duplicate is not
//! offered again while the entry lives.
//!
//! [`FeedHandle`]: crate::feed::FeedHandle

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::ExpiringCache;
use crate::connection_error::ConnectionError;
use crate::feed::peer::{OfferOutcome, PeerClient};
use crate::protocol::{Article, Wildmat};
use crate::storage::Peer;
use crate::types::{MessageId, PeerName};

/// Cache key for one article offered to one peer
pub type OfferKey = (PeerName, MessageId);

/// Dispatcher for locally accepted articles heading to push peers
pub struct PushFeeder {
    network_timeout: Duration,
    retry_delay: Duration,
    max_attempts: u32,
    completed: Arc<ExpiringCache<OfferKey, ()>>,
}

/// Where the dispatcher sends articles for one peer
struct PeerRoute {
    name: PeerName,
    filter: Wildmat,
    tx: mpsc::UnboundedSender<Arc<Article>>,
}

impl PushFeeder {
    pub fn new(
        network_timeout: Duration,
        retry_delay: Duration,
        max_attempts: u32,
        completed: Arc<ExpiringCache<OfferKey, ()>>,
    ) -> Self {
        Self {
            network_timeout,
            retry_delay,
            max_attempts,
            completed,
        }
    }

    /// Dispatch queued articles to per-peer workers until the queue closes
    /// or shutdown is signalled.
    ///
    /// Peers with a filter that does not parse are logged and skipped;
    /// everything else keeps flowing.
    pub async fn run(
        self,
        peers: Vec<Peer>,
        mut queue: mpsc::UnboundedReceiver<Arc<Article>>,
        shutdown: broadcast::Sender<()>,
    ) {
        let mut routes: Vec<PeerRoute> = Vec::new();
        let mut workers: Vec<JoinHandle<()>> = Vec::new();
        for peer in peers.into_iter().filter(|p| p.direction.pushes()) {
            let filter = match Wildmat::parse(&peer.group_filter) {
                Ok(filter) => filter,
                Err(e) => {
                    warn!(
                        "Peer {} has unusable group filter {:?}; not pushing to it: {}",
                        peer.name, peer.group_filter, e
                    );
                    continue;
                }
            };
            let (tx, rx) = mpsc::unbounded_channel();
            routes.push(PeerRoute {
                name: peer.name.clone(),
                filter,
                tx,
            });
            let worker = DeliveryWorker {
                peer,
                network_timeout: self.network_timeout,
                retry_delay: self.retry_delay,
                max_attempts: self.max_attempts,
                completed: Arc::clone(&self.completed),
            };
            workers.push(tokio::spawn(worker.run(rx, shutdown.subscribe())));
        }
        debug!("Push feeder routing to {} peer(s)", routes.len());

        let mut shutdown_rx = shutdown.subscribe();
        loop {
            tokio::select! {
                article = queue.recv() => {
                    let Some(article) = article else { break };
                    dispatch(&routes, article);
                }
                _ = shutdown_rx.recv() => break,
            }
        }

        // Closing the routes lets idle workers drain and exit.
        drop(routes);
        for worker in workers {
            let _ = worker.await;
        }
        debug!("Push feeder stopped");
    }
}

/// Forward an article to every peer whose filter matches one of its groups
fn dispatch(routes: &[PeerRoute], article: Arc<Article>) {
    let groups = match article.newsgroups() {
        Ok(groups) => groups,
        Err(e) => {
            debug!("Not pushing {}: {}", article.message_id(), e);
            return;
        }
    };
    for route in routes {
        if groups.iter().any(|g| route.filter.matches_group(g)) {
            if route.tx.send(Arc::clone(&article)).is_err() {
                debug!("Delivery worker for {} stopped", route.name);
            }
        }
    }
}

/// Delivers queued articles to one peer, in order, with bounded retries
struct DeliveryWorker {
    peer: Peer,
    network_timeout: Duration,
    retry_delay: Duration,
    max_attempts: u32,
    completed: Arc<ExpiringCache<OfferKey, ()>>,
}

impl DeliveryWorker {
    async fn run(
        self,
        mut queue: mpsc::UnboundedReceiver<Arc<Article>>,
        mut shutdown: broadcast::Receiver<()>,
    ) {
        loop {
            tokio::select! {
                article = queue.recv() => {
                    let Some(article) = article else { return };
                    if !self.deliver(&article, &mut shutdown).await {
                        return;
                    }
                }
                _ = shutdown.recv() => return,
            }
        }
    }

    /// Offer one article until a terminal outcome or the attempt budget
    /// runs out. Returns false when shutdown interrupted the retry wait.
    async fn deliver(&self, article: &Arc<Article>, shutdown: &mut broadcast::Receiver<()>) -> bool {
        let id = article.message_id();
        let key = (self.peer.name.clone(), id.clone());
        if self.completed.contains_key(&key) {
            debug!("Already offered {} to {}; skipping", id, self.peer.name);
            return true;
        }

        for attempt in 1..=self.max_attempts {
            match self.try_offer(article).await {
                Ok(outcome) => {
                    match outcome {
                        OfferOutcome::Accepted => info!("Pushed {} to {}", id, self.peer.name),
                        OfferOutcome::Unwanted => {
                            debug!("Peer {} already has {}", self.peer.name, id);
                        }
                        OfferOutcome::Rejected => {
                            warn!("Peer {} rejected {}", self.peer.name, id);
                        }
                        OfferOutcome::Deferred => {
                            debug!(
                                "Peer {} deferred {} (attempt {}/{})",
                                self.peer.name, id, attempt, self.max_attempts
                            );
                        }
                    }
                    if !outcome.retryable() {
                        self.completed.put(key.clone(), ());
                        return true;
                    }
                }
                Err(e) => {
                    warn!(
                        "Push of {} to {} failed (attempt {}/{}): {}",
                        id, self.peer.name, attempt, self.max_attempts, e
                    );
                    // Dial failures, timeouts and hangups are worth another
                    // try; a peer answering off-script is not.
                    if !e.is_network_error() && !e.is_client_disconnect() {
                        debug!("Not retrying {} to {}", id, self.peer.name);
                        return true;
                    }
                }
            }
            if attempt < self.max_attempts {
                tokio::select! {
                    _ = tokio::time::sleep(self.retry_delay) => {}
                    _ = shutdown.recv() => return false,
                }
            }
        }
        warn!(
            "Giving up on {} for {} after {} attempt(s)",
            id, self.peer.name, self.max_attempts
        );
        true
    }

    /// One connect-offer-quit exchange
    async fn try_offer(&self, article: &Arc<Article>) -> Result<OfferOutcome, ConnectionError> {
        let mut client = PeerClient::connect(&self.peer, self.network_timeout).await?;
        let outcome = client.offer(article).await?;
        client.quit().await;
        Ok(outcome)
    }
}
