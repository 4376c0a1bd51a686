//! Storage abstraction
//!
//! Two-level indirection between the rest of the server and persistence:
//! a [`StorageProvider`] resolves a backend-specific [`Storage`] handle,
//! parameterized by an opaque backend token (`None` selects the provider's
//! default configuration). Providers live in a [`ProviderRegistry`] keyed by
//! name; registering a duplicate name or resolving an unknown one is a
//! configuration error, fatal at startup.
//!
//! A `Storage` handle owns its internal concurrency control. Callers from
//! sessions and feed daemons invoke it concurrently without external locks.

mod memory;

pub use memory::{MemoryProvider, MemoryStorage, MEMORY_PROVIDER};

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::protocol::{Article, Wildmat};
use crate::types::{GroupName, HostName, MessageId, PeerName, Port};

/// Errors from the storage layer.
///
/// `ProviderExists` and `NoSuchProvider` are configuration errors and abort
/// startup; everything else is recoverable at the call site into a protocol
/// response.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("article {0} already stored")]
    Duplicate(MessageId),

    #[error("no such article")]
    ArticleNotFound,

    #[error("no such group: {0}")]
    GroupNotFound(GroupName),

    #[error("group {0} already exists")]
    GroupExists(GroupName),

    #[error("no such peer: {0}")]
    PeerNotFound(PeerName),

    #[error("storage provider {0} already registered")]
    ProviderExists(String),

    #[error("no such storage provider: {0}")]
    NoSuchProvider(String),

    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
}

/// Where an article was filed within a group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleLocation {
    pub group: GroupName,
    pub number: u64,
}

/// A group and its watermarks as reported by GROUP and LIST.
///
/// An empty group reports `high = low - 1` (the RFC 3977 empty-group
/// convention); numbers are never reused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupInfo {
    pub name: GroupName,
    pub low: u64,
    pub high: u64,
    pub count: u64,
    pub posting: bool,
    /// Unix seconds; drives NEWGROUPS
    pub created_at: u64,
}

/// Feed direction of a peer subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedDirection {
    Pull,
    Push,
    Both,
}

impl FeedDirection {
    pub fn pulls(self) -> bool {
        matches!(self, FeedDirection::Pull | FeedDirection::Both)
    }

    pub fn pushes(self) -> bool {
        matches!(self, FeedDirection::Push | FeedDirection::Both)
    }
}

/// A peer subscription record.
///
/// Loaded into storage at startup from configuration; the feeders read it
/// back each cycle and persist per-peer checkpoints through
/// [`Storage::update_peer_checkpoint`].
#[derive(Debug, Clone)]
pub struct Peer {
    pub name: PeerName,
    pub host: HostName,
    pub port: Port,
    pub username: Option<String>,
    pub password: Option<String>,
    pub direction: FeedDirection,
    /// Wildmat over group names selecting what to pull/push
    pub group_filter: String,
    /// Unix seconds; articles at or after this instant are fetched on pull
    pub checkpoint: u64,
}

/// Backend capability surface consumed by the rest of the server
#[async_trait]
pub trait Storage: Send + Sync {
    /// Store a new article, filing it under every existing group its
    /// `Newsgroups` header names. Returns the assigned locations, which may
    /// be empty when no named group exists here.
    ///
    /// # Errors
    /// `Duplicate` when the message-id is already stored; the existing
    /// article is left untouched.
    async fn add_article(&self, article: Article) -> Result<Vec<ArticleLocation>, StorageError>;

    /// Fetch an article by message-id
    async fn article_by_id(&self, id: &MessageId) -> Result<Arc<Article>, StorageError>;

    /// Fetch an article by number within a group
    async fn article_by_number(
        &self,
        group: &GroupName,
        number: u64,
    ) -> Result<Arc<Article>, StorageError>;

    /// True if the message-id is already stored
    async fn contains_article(&self, id: &MessageId) -> Result<bool, StorageError>;

    /// Group lookup by exact name
    async fn group(&self, name: &GroupName) -> Result<GroupInfo, StorageError>;

    /// Every group with current watermarks, sorted by name
    async fn list_groups(&self) -> Result<Vec<GroupInfo>, StorageError>;

    /// All article numbers present in a group, ascending
    async fn group_numbers(&self, group: &GroupName) -> Result<Vec<u64>, StorageError>;

    /// Groups created at or after `since` (unix seconds), sorted by name
    async fn groups_since(&self, since: u64) -> Result<Vec<GroupInfo>, StorageError>;

    /// Message-ids of articles that arrived at or after `since` (unix
    /// seconds) whose newsgroups match `filter`, in arrival order
    async fn message_ids_since(
        &self,
        since: u64,
        filter: &Wildmat,
    ) -> Result<Vec<MessageId>, StorageError>;

    /// Create a group; articles are filed into it from then on
    async fn create_group(&self, name: GroupName, posting: bool) -> Result<(), StorageError>;

    /// Every peer subscription
    async fn list_peers(&self) -> Result<Vec<Peer>, StorageError>;

    /// Insert or replace a peer subscription by name
    async fn upsert_peer(&self, peer: Peer) -> Result<(), StorageError>;

    /// Persist a peer's pull checkpoint (unix seconds)
    async fn update_peer_checkpoint(
        &self,
        name: &PeerName,
        checkpoint: u64,
    ) -> Result<(), StorageError>;
}

/// Resolves backend handles for one storage technology.
///
/// Repeated `open` calls with an equivalent token deterministically return a
/// usable handle (for shared backends, the same handle) or fail; a handle is
/// never returned half-initialized.
#[async_trait]
pub trait StorageProvider: Send + Sync {
    /// Name this provider is selected by in configuration
    fn name(&self) -> &str;

    /// Resolve a storage handle; `None` means the provider default
    async fn open(&self, token: Option<&str>) -> Result<Arc<dyn Storage>, StorageError>;
}

impl std::fmt::Debug for dyn StorageProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageProvider")
            .field("name", &self.name())
            .finish_non_exhaustive()
    }
}

/// Registry of storage providers, keyed by provider name
#[derive(Default)]
pub struct ProviderRegistry {
    providers: HashMap<String, Arc<dyn StorageProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider under its name.
    ///
    /// # Errors
    /// `ProviderExists` when the name is taken. Startup treats this as
    /// fatal, before any connection is accepted.
    pub fn register(&mut self, provider: Arc<dyn StorageProvider>) -> Result<(), StorageError> {
        let name = provider.name().to_string();
        if self.providers.contains_key(&name) {
            return Err(StorageError::ProviderExists(name));
        }
        self.providers.insert(name, provider);
        Ok(())
    }

    /// Remove a provider by name, returning it if present
    pub fn unregister(&mut self, name: &str) -> Option<Arc<dyn StorageProvider>> {
        self.providers.remove(name)
    }

    /// Look up a provider by name
    ///
    /// # Errors
    /// `NoSuchProvider` when unregistered; fatal when hit at startup.
    pub fn get(&self, name: &str) -> Result<&Arc<dyn StorageProvider>, StorageError> {
        self.providers
            .get(name)
            .ok_or_else(|| StorageError::NoSuchProvider(name.to_string()))
    }

    /// Resolve a handle through the named provider
    pub async fn open(
        &self,
        name: &str,
        token: Option<&str>,
    ) -> Result<Arc<dyn Storage>, StorageError> {
        self.get(name)?.open(token).await
    }

    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.provider_names())
            .finish()
    }
}
