//! Lifecycle owner for the feed daemons
//!
//! The server starts one [`FeedManager`] at bootstrap. It spawns the pull
//! feeder, the push feeder, and the offer-cache sweeper, hands out the
//! [`FeedHandle`] sessions enqueue into, and tears the daemons down on
//! shutdown.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::cache::ExpiringCache;
use crate::config::{CacheConfig, FeedConfig};
use crate::constants::{feed, timeout};
use crate::feed::handle::FeedHandle;
use crate::feed::pull::PullFeeder;
use crate::feed::push::{OfferKey, PushFeeder};
use crate::storage::{Storage, StorageError};

/// Running feed daemons and the means to stop them
pub struct FeedManager {
    handle: FeedHandle,
    shutdown: broadcast::Sender<()>,
    tasks: Vec<JoinHandle<()>>,
}

impl FeedManager {
    /// Start the feed daemons.
    ///
    /// The push peer set is read from storage once here; peers added to
    /// storage later are picked up by the pull feeder (it re-lists every
    /// cycle) but not by the push side until restart.
    ///
    /// # Errors
    /// Fails when the initial peer listing fails.
    pub async fn start(
        storage: Arc<dyn Storage>,
        feed_config: &FeedConfig,
        cache_config: &CacheConfig,
    ) -> Result<Self, StorageError> {
        let peers = storage.list_peers().await?;
        let peer_count = peers.len();

        let (handle, queue) = FeedHandle::channel();
        let (shutdown, _) = broadcast::channel(1);
        let mut tasks = Vec::new();

        let completed: Arc<ExpiringCache<OfferKey, ()>> =
            Arc::new(ExpiringCache::new(cache_config.ttl));
        if let Some(interval) = cache_config.sweep_interval {
            tasks.push(tokio::spawn(sweep_offers(
                Arc::clone(&completed),
                interval,
                shutdown.subscribe(),
            )));
        }

        let push = PushFeeder::new(
            feed_config.network_timeout,
            feed::PUSH_RETRY_DELAY,
            feed_config.max_push_retries,
            completed,
        );
        tasks.push(tokio::spawn(push.run(peers, queue, shutdown.clone())));

        let pull = PullFeeder::new(
            storage,
            feed_config.cycle_interval,
            feed_config.network_timeout,
        );
        tasks.push(tokio::spawn(pull.run(shutdown.subscribe())));

        info!("Feed daemons started, {} subscribed peer(s)", peer_count);
        Ok(Self {
            handle,
            shutdown,
            tasks,
        })
    }

    /// Enqueue capability for sessions
    pub fn handle(&self) -> FeedHandle {
        self.handle.clone()
    }

    /// Signal the daemons and wait for them, bounded by the drain window.
    /// A daemon that overruns the window is left to die with the process.
    pub async fn stop(self) {
        let _ = self.shutdown.send(());
        for task in self.tasks {
            let aborter = task.abort_handle();
            if tokio::time::timeout(timeout::SHUTDOWN_DRAIN, task)
                .await
                .is_err()
            {
                warn!("Feed task did not stop within the drain window");
                aborter.abort();
            }
        }
        debug!("Feed daemons stopped");
    }
}

/// Periodically release memory held by expired offer records
async fn sweep_offers(
    cache: Arc<ExpiringCache<OfferKey, ()>>,
    interval: Duration,
    mut shutdown: broadcast::Receiver<()>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker.tick().await;
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let dropped = cache.purge_expired();
                if dropped > 0 {
                    debug!("Swept {} expired offer record(s)", dropped);
                }
            }
            _ = shutdown.recv() => return,
        }
    }
}
