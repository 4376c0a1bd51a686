//! Server bootstrap and accept loop
//!
//! [`Server::new`] assembles the shared pieces from a [`Config`]: it
//! opens the configured storage provider, seeds groups and peers,
//! builds the credential validator and freezes the command registry.
//! [`Server::serve`] then starts the feed daemons and accepts clients
//! until a shutdown signal arrives, spawning one session task per
//! connection.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Context;
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error, info, warn, Level};

use crate::auth::AuthValidator;
use crate::command::CommandRegistry;
use crate::config::{Config, GroupConfig, PeerConfig, SessionConfig};
use crate::connection_error::ConnectionError;
use crate::constants::{feed, socket};
use crate::feed::FeedManager;
use crate::plugin::ExtensionPoints;
use crate::session::{Connection, Session, SessionContext};
use crate::storage::{Storage, StorageError};
use crate::types::PeerName;

/// A configured NNTP server ready to accept clients
pub struct Server {
    config: Config,
    storage: Arc<dyn Storage>,
    auth: Arc<AuthValidator>,
    registry: Arc<CommandRegistry>,
}

impl std::fmt::Debug for Server {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Server")
            .field("commands", &self.registry.len())
            .finish_non_exhaustive()
    }
}

impl Server {
    /// Build a server with the built-in command set and storage
    /// providers.
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let extensions = ExtensionPoints::with_builtins()?;
        Self::with_extensions(config, extensions).await
    }

    /// Build a server from extension points an embedder has already
    /// customized.
    ///
    /// The command registry is frozen here; plugins must be loaded
    /// before this call.
    pub async fn with_extensions(
        config: Config,
        extensions: ExtensionPoints,
    ) -> anyhow::Result<Self> {
        let storage = extensions
            .providers
            .open(&config.storage.provider, config.storage.token.as_deref())
            .await
            .with_context(|| {
                format!("failed to open storage provider '{}'", config.storage.provider)
            })?;

        seed_groups(storage.as_ref(), &config.groups).await?;
        seed_peers(storage.as_ref(), &config.feed.peers).await?;

        let auth = AuthValidator::with_users(config.auth.user_pairs(), config.auth.anonymous)
            .context("invalid [auth] configuration")?;

        Ok(Self {
            config,
            storage,
            auth: Arc::new(auth),
            registry: Arc::new(extensions.commands),
        })
    }

    /// Bind the configured address and serve until shutdown
    pub async fn run(self) -> anyhow::Result<()> {
        let listen_addr = format!("{}:{}", self.config.server.host, self.config.server.port);
        let listener = TcpListener::bind(&listen_addr)
            .await
            .with_context(|| format!("failed to bind {listen_addr}"))?;
        self.serve(listener).await
    }

    /// Serve clients from an already-bound listener.
    ///
    /// Returns after a shutdown signal once the feed daemons have
    /// drained. In-flight session tasks are not awaited; their sockets
    /// close when the process exits.
    pub async fn serve(self, listener: TcpListener) -> anyhow::Result<()> {
        let manager =
            FeedManager::start(Arc::clone(&self.storage), &self.config.feed, &self.config.cache)
                .await?;

        let context = SessionContext {
            storage: self.storage,
            auth: self.auth,
            feed: manager.handle(),
            registry: self.registry,
            server_name: self.config.server.name.clone(),
            posting: self.config.server.posting,
        };

        match listener.local_addr() {
            Ok(addr) => info!("NNTP server '{}' listening on {}", context.server_name, addr),
            Err(_) => info!("NNTP server '{}' listening", context.server_name),
        }

        loop {
            tokio::select! {
                accepted = listener.accept() => match accepted {
                    Ok((stream, addr)) => {
                        if let Err(e) = configure_session_socket(&stream) {
                            debug!("Failed to tune socket for {}: {}", addr, e);
                        }
                        let context = context.clone();
                        let settings = self.config.session.clone();
                        tokio::spawn(async move {
                            if let Err(e) = serve_client(stream, context, settings).await {
                                let level = e.log_level();
                                if level == Level::DEBUG {
                                    debug!("Client {} disconnected: {}", addr, e);
                                } else if level == Level::WARN {
                                    warn!("Error handling client {}: {}", addr, e);
                                } else {
                                    error!("Error handling client {}: {}", addr, e);
                                }
                            }
                        });
                    }
                    Err(e) => {
                        error!("Failed to accept connection: {}", e);
                    }
                },
                _ = shutdown_signal() => {
                    info!("Shutdown signal received, stopping feed daemons...");
                    break;
                }
            }
        }

        manager.stop().await;
        info!("Shutdown complete");
        Ok(())
    }
}

/// Create configured groups that do not exist yet
async fn seed_groups(storage: &dyn Storage, groups: &[GroupConfig]) -> Result<(), StorageError> {
    for group in groups {
        match storage.create_group(group.name.clone(), group.posting).await {
            Ok(()) => info!("Created group {}", group.name),
            Err(StorageError::GroupExists(_)) => {
                debug!("Group {} already exists", group.name);
            }
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

/// Write configured peers into storage, keeping the pull checkpoint of
/// any peer that is already known
async fn seed_peers(storage: &dyn Storage, peers: &[PeerConfig]) -> Result<(), StorageError> {
    if peers.is_empty() {
        return Ok(());
    }
    let known: HashMap<PeerName, u64> = storage
        .list_peers()
        .await?
        .into_iter()
        .map(|p| (p.name, p.checkpoint))
        .collect();
    for peer in peers {
        let checkpoint = known
            .get(&peer.name)
            .copied()
            .unwrap_or(feed::INITIAL_CHECKPOINT);
        storage.upsert_peer(peer.to_peer(checkpoint)).await?;
    }
    info!("Configured {} feed peer(s)", peers.len());
    Ok(())
}

async fn serve_client(
    stream: TcpStream,
    context: SessionContext,
    settings: SessionConfig,
) -> Result<(), ConnectionError> {
    let session = Session::new(context);
    debug!("Session {} opened", session.id());
    let (reader, writer) = stream.into_split();
    Connection::new(reader, writer, session, &settings).run().await
}

fn configure_session_socket(stream: &TcpStream) -> std::io::Result<()> {
    use socket2::SockRef;

    let sock = SockRef::from(stream);
    sock.set_recv_buffer_size(socket::SESSION_RECV_BUFFER)?;
    sock.set_send_buffer_size(socket::SESSION_SEND_BUFFER)?;
    stream.set_nodelay(true)?;
    Ok(())
}

/// Wait for shutdown signal (SIGTERM or Ctrl+C)
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
