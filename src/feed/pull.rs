//! Pull side of peer feeding
//!
//! Each cycle asks every pull peer for message-ids newer than the peer's
//! persisted checkpoint, fetches the ones this server does not hold, and
//! stores them. The checkpoint only advances to the cycle's start time
//! after the whole pass over that peer succeeded, so a failed pull is
//! retried from the same point next cycle. Ids the peer announces but
//! then cannot serve are skipped without failing the cycle.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::connection_error::ConnectionError;
use crate::feed::peer::PeerClient;
use crate::protocol::now_unix_secs;
use crate::storage::{Peer, Storage, StorageError};

/// What one pass over one peer accomplished
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct PullStats {
    stored: u64,
    already_held: u64,
    unavailable: u64,
}

/// Periodic puller of articles from subscribed peers
pub struct PullFeeder {
    storage: Arc<dyn Storage>,
    cycle_interval: Duration,
    network_timeout: Duration,
}

impl PullFeeder {
    pub fn new(
        storage: Arc<dyn Storage>,
        cycle_interval: Duration,
        network_timeout: Duration,
    ) -> Self {
        Self {
            storage,
            cycle_interval,
            network_timeout,
        }
    }

    /// Run pull cycles until the shutdown signal arrives.
    ///
    /// The first cycle starts one full interval after startup so a
    /// restart loop cannot hammer the peers.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        let mut ticker = tokio::time::interval(self.cycle_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // interval() fires immediately; consume that tick.
        ticker.tick().await;
        loop {
            tokio::select! {
                _ = ticker.tick() => self.run_cycle().await,
                _ = shutdown.recv() => {
                    debug!("Pull feeder stopping");
                    return;
                }
            }
        }
    }

    /// One pass over every pull-direction peer.
    ///
    /// Peers fail independently; one unreachable peer never blocks the
    /// others from being pulled.
    pub async fn run_cycle(&self) {
        let peers = match self.storage.list_peers().await {
            Ok(peers) => peers,
            Err(e) => {
                warn!("Pull cycle skipped, cannot list peers: {}", e);
                return;
            }
        };

        for peer in peers.into_iter().filter(|p| p.direction.pulls()) {
            let started_at = now_unix_secs();
            match self.pull_peer(&peer).await {
                Ok(stats) => {
                    info!(
                        "Pulled from {}: {} stored, {} already held, {} unavailable",
                        peer.name, stats.stored, stats.already_held, stats.unavailable
                    );
                    if let Err(e) = self
                        .storage
                        .update_peer_checkpoint(&peer.name, started_at)
                        .await
                    {
                        warn!("Failed to persist checkpoint for {}: {}", peer.name, e);
                    }
                }
                Err(e) => {
                    warn!("Pull from {} failed, checkpoint unchanged: {}", peer.name, e);
                }
            }
        }
    }

    /// Pull everything new from one peer
    async fn pull_peer(&self, peer: &Peer) -> Result<PullStats, ConnectionError> {
        let mut client = PeerClient::connect(peer, self.network_timeout).await?;
        let ids = client.newnews(&peer.group_filter, peer.checkpoint).await?;
        debug!("Peer {} announced {} article(s)", peer.name, ids.len());

        let mut stats = PullStats::default();
        for id in ids {
            if self.storage.contains_article(&id).await? {
                stats.already_held += 1;
                continue;
            }
            let Some(article) = client.fetch_article(&id).await? else {
                stats.unavailable += 1;
                continue;
            };
            match self.storage.add_article(article).await {
                Ok(_) => stats.stored += 1,
                // A local post or another peer won the race; not a failure.
                Err(StorageError::Duplicate(_)) => stats.already_held += 1,
                Err(e) => return Err(e.into()),
            }
        }
        client.quit().await;
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::testing::{peer_record, read_line, scripted_peer, send, TIMEOUT};
    use crate::session::testing::storage_with_groups;
    use crate::storage::FeedDirection;
    use crate::types::{MessageId, PeerName};
    use std::net::SocketAddr;
    use tokio::io::{AsyncWriteExt, BufReader};
    use tokio::net::{TcpListener, TcpStream};

    fn pull_peer_record(addr: SocketAddr, checkpoint: u64) -> Peer {
        let mut peer = peer_record(addr);
        peer.name = PeerName::new("upstream").unwrap();
        peer.direction = FeedDirection::Pull;
        peer.checkpoint = checkpoint;
        peer
    }

    async fn checkpoint_of(storage: &dyn Storage, name: &str) -> u64 {
        storage
            .list_peers()
            .await
            .unwrap()
            .into_iter()
            .find(|p| p.name.as_str() == name)
            .unwrap()
            .checkpoint
    }

    #[tokio::test]
    async fn test_cycle_stores_announced_articles() {
        let (addr, peer_task) = scripted_peer(|mut conn| async move {
            send(&mut conn, "200 ready\r\n").await;
            let newnews = read_line(&mut conn).await;
            assert!(newnews.starts_with("NEWNEWS * "));
            send(
                &mut conn,
                "230 Ids follow\r\n<a@peer.test>\r\n<b@peer.test>\r\n.\r\n",
            )
            .await;

            assert_eq!(read_line(&mut conn).await, "ARTICLE <a@peer.test>");
            send(
                &mut conn,
                "220 0 <a@peer.test>\r\nMessage-ID: <a@peer.test>\r\nNewsgroups: misc.test\r\n\r\nfirst\r\n.\r\n",
            )
            .await;

            assert_eq!(read_line(&mut conn).await, "ARTICLE <b@peer.test>");
            send(
                &mut conn,
                "220 0 <b@peer.test>\r\nMessage-ID: <b@peer.test>\r\nNewsgroups: misc.test\r\n\r\nsecond\r\n.\r\n",
            )
            .await;

            assert_eq!(read_line(&mut conn).await, "QUIT");
            send(&mut conn, "205 bye\r\n").await;
        });

        let storage = storage_with_groups(&[("misc.test", true)]).await;
        storage
            .upsert_peer(pull_peer_record(addr, 0))
            .await
            .unwrap();

        let before = now_unix_secs();
        let feeder = PullFeeder::new(storage.clone(), Duration::from_secs(300), TIMEOUT);
        feeder.run_cycle().await;
        peer_task.await.unwrap();

        for id in ["<a@peer.test>", "<b@peer.test>"] {
            let id = MessageId::new(id).unwrap();
            assert!(storage.contains_article(&id).await.unwrap(), "{} stored", id);
        }
        assert!(checkpoint_of(storage.as_ref(), "upstream").await >= before);
    }

    #[tokio::test]
    async fn test_cycle_skips_articles_already_held() {
        let (addr, peer_task) = scripted_peer(|mut conn| async move {
            send(&mut conn, "200 ready\r\n").await;
            read_line(&mut conn).await;
            send(&mut conn, "230 Ids follow\r\n<held@peer.test>\r\n.\r\n").await;
            // No ARTICLE command may arrive for the held id.
            assert_eq!(read_line(&mut conn).await, "QUIT");
            send(&mut conn, "205 bye\r\n").await;
        });

        let storage = storage_with_groups(&[("misc.test", true)]).await;
        crate::session::testing::store_article(
            storage.as_ref(),
            "<held@peer.test>",
            "misc.test",
            &["body"],
        )
        .await;
        storage
            .upsert_peer(pull_peer_record(addr, 0))
            .await
            .unwrap();

        PullFeeder::new(storage.clone(), Duration::from_secs(300), TIMEOUT)
            .run_cycle()
            .await;
        peer_task.await.unwrap();
    }

    #[tokio::test]
    async fn test_unserved_article_does_not_fail_cycle() {
        let (addr, peer_task) = scripted_peer(|mut conn| async move {
            send(&mut conn, "200 ready\r\n").await;
            read_line(&mut conn).await;
            send(&mut conn, "230 Ids follow\r\n<gone@peer.test>\r\n.\r\n").await;
            read_line(&mut conn).await;
            send(&mut conn, "430 No such article\r\n").await;
            assert_eq!(read_line(&mut conn).await, "QUIT");
            send(&mut conn, "205 bye\r\n").await;
        });

        let storage = storage_with_groups(&[("misc.test", true)]).await;
        storage
            .upsert_peer(pull_peer_record(addr, 0))
            .await
            .unwrap();

        let before = now_unix_secs();
        PullFeeder::new(storage.clone(), Duration::from_secs(300), TIMEOUT)
            .run_cycle()
            .await;
        peer_task.await.unwrap();

        // A 430 is the peer's problem; the cycle still completes.
        assert!(checkpoint_of(storage.as_ref(), "upstream").await >= before);
    }

    #[tokio::test]
    async fn test_failed_pull_keeps_checkpoint() {
        let (addr, peer_task) = scripted_peer(|mut conn| async move {
            send(&mut conn, "400 Service temporarily unavailable\r\n").await;
        });

        let storage = storage_with_groups(&[("misc.test", true)]).await;
        storage
            .upsert_peer(pull_peer_record(addr, 42))
            .await
            .unwrap();

        PullFeeder::new(storage.clone(), Duration::from_secs(300), TIMEOUT)
            .run_cycle()
            .await;
        peer_task.await.unwrap();

        assert_eq!(checkpoint_of(storage.as_ref(), "upstream").await, 42);
    }

    #[tokio::test]
    async fn test_push_only_peers_are_not_pulled() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.set_nonblocking(true).unwrap();
        let addr = listener.local_addr().unwrap();
        let listener = TcpListener::from_std(listener).unwrap();

        let storage = storage_with_groups(&[("misc.test", true)]).await;
        let mut record = pull_peer_record(addr, 7);
        record.direction = FeedDirection::Push;
        storage.upsert_peer(record).await.unwrap();

        PullFeeder::new(storage.clone(), Duration::from_secs(300), TIMEOUT)
            .run_cycle()
            .await;

        // The only connection the listener ever sees is our own sentinel;
        // had the feeder dialed out it would have been accepted first.
        let mut sentinel = TcpStream::connect(addr).await.unwrap();
        sentinel.write_all(b"PING\r\n").await.unwrap();
        let (accepted, _) = tokio::time::timeout(TIMEOUT, listener.accept())
            .await
            .expect("test timed out")
            .unwrap();
        let mut reader = BufReader::new(accepted);
        assert_eq!(read_line(&mut reader).await, "PING");
        assert_eq!(checkpoint_of(storage.as_ref(), "upstream").await, 7);
    }

    #[tokio::test]
    async fn test_checkpoint_reflects_cycle_start_not_end() {
        let (addr, peer_task) = scripted_peer(|mut conn| async move {
            send(&mut conn, "200 ready\r\n").await;
            let newnews = read_line(&mut conn).await;
            // A checkpoint of zero asks from the epoch.
            assert_eq!(newnews, "NEWNEWS * 19700101 000000 GMT");
            send(&mut conn, "230 Ids follow\r\n.\r\n").await;
            assert_eq!(read_line(&mut conn).await, "QUIT");
            send(&mut conn, "205 bye\r\n").await;
        });

        let storage = storage_with_groups(&[]).await;
        storage
            .upsert_peer(pull_peer_record(addr, 0))
            .await
            .unwrap();

        let before = now_unix_secs();
        PullFeeder::new(storage.clone(), Duration::from_secs(300), TIMEOUT)
            .run_cycle()
            .await;
        peer_task.await.unwrap();
        let after = now_unix_secs();

        let checkpoint = checkpoint_of(storage.as_ref(), "upstream").await;
        assert!(checkpoint >= before && checkpoint <= after);
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let storage = storage_with_groups(&[]).await;
        let feeder = PullFeeder::new(storage, Duration::from_secs(300), TIMEOUT);
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

        let task = tokio::spawn(feeder.run(shutdown_rx));
        shutdown_tx.send(()).unwrap();
        tokio::time::timeout(TIMEOUT, task)
            .await
            .expect("test timed out")
            .unwrap();
    }
}
