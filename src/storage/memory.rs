//! In-memory storage backend
//!
//! The default backend: DashMap-based, process-lifetime persistence. Group
//! filing serializes per group on the map entry; an article becomes visible
//! by message-id first and in its groups' indexes before `add_article`
//! returns.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use dashmap::DashMap;

use super::{ArticleLocation, GroupInfo, Peer, Storage, StorageError, StorageProvider};
use crate::protocol::{now_unix_secs, Article, Wildmat};
use crate::types::{GroupName, MessageId, PeerName};

/// Name the in-memory provider registers under
pub const MEMORY_PROVIDER: &str = "memory";

#[derive(Debug)]
struct GroupState {
    low: u64,
    high: u64,
    posting: bool,
    created_at: u64,
    numbers: BTreeMap<u64, MessageId>,
}

impl GroupState {
    fn new(posting: bool) -> Self {
        // Empty group convention: high = low - 1.
        Self {
            low: 1,
            high: 0,
            posting,
            created_at: now_unix_secs(),
            numbers: BTreeMap::new(),
        }
    }

    fn info(&self, name: &GroupName) -> GroupInfo {
        GroupInfo {
            name: name.clone(),
            low: self.low,
            high: self.high,
            count: self.numbers.len() as u64,
            posting: self.posting,
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, Clone)]
struct Arrival {
    at: u64,
    id: MessageId,
    newsgroups: Vec<GroupName>,
}

/// DashMap-backed article store
#[derive(Debug, Default)]
pub struct MemoryStorage {
    articles: DashMap<MessageId, Arc<Article>>,
    groups: DashMap<GroupName, GroupState>,
    peers: DashMap<PeerName, Peer>,
    arrivals: Mutex<Vec<Arrival>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn add_article(&self, article: Article) -> Result<Vec<ArticleLocation>, StorageError> {
        let id = article.message_id().clone();
        let newsgroups = article.newsgroups().unwrap_or_default();

        // Atomic uniqueness claim; a duplicate never disturbs the stored copy.
        match self.articles.entry(id.clone()) {
            dashmap::mapref::entry::Entry::Occupied(_) => {
                return Err(StorageError::Duplicate(id));
            }
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(Arc::new(article));
            }
        }

        let mut locations = Vec::new();
        for group in &newsgroups {
            if let Some(mut state) = self.groups.get_mut(group) {
                state.high += 1;
                let number = state.high;
                state.numbers.insert(number, id.clone());
                locations.push(ArticleLocation {
                    group: group.clone(),
                    number,
                });
            }
        }

        if let Ok(mut arrivals) = self.arrivals.lock() {
            arrivals.push(Arrival {
                at: now_unix_secs(),
                id,
                newsgroups,
            });
        }
        Ok(locations)
    }

    async fn article_by_id(&self, id: &MessageId) -> Result<Arc<Article>, StorageError> {
        self.articles
            .get(id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or(StorageError::ArticleNotFound)
    }

    async fn article_by_number(
        &self,
        group: &GroupName,
        number: u64,
    ) -> Result<Arc<Article>, StorageError> {
        let id = {
            let state = self
                .groups
                .get(group)
                .ok_or_else(|| StorageError::GroupNotFound(group.clone()))?;
            state
                .numbers
                .get(&number)
                .cloned()
                .ok_or(StorageError::ArticleNotFound)?
        };
        self.article_by_id(&id).await
    }

    async fn contains_article(&self, id: &MessageId) -> Result<bool, StorageError> {
        Ok(self.articles.contains_key(id))
    }

    async fn group(&self, name: &GroupName) -> Result<GroupInfo, StorageError> {
        self.groups
            .get(name)
            .map(|state| state.info(name))
            .ok_or_else(|| StorageError::GroupNotFound(name.clone()))
    }

    async fn list_groups(&self) -> Result<Vec<GroupInfo>, StorageError> {
        let mut groups: Vec<GroupInfo> = self
            .groups
            .iter()
            .map(|entry| entry.value().info(entry.key()))
            .collect();
        groups.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(groups)
    }

    async fn group_numbers(&self, group: &GroupName) -> Result<Vec<u64>, StorageError> {
        let state = self
            .groups
            .get(group)
            .ok_or_else(|| StorageError::GroupNotFound(group.clone()))?;
        Ok(state.numbers.keys().copied().collect())
    }

    async fn groups_since(&self, since: u64) -> Result<Vec<GroupInfo>, StorageError> {
        let mut groups: Vec<GroupInfo> = self
            .groups
            .iter()
            .filter(|entry| entry.value().created_at >= since)
            .map(|entry| entry.value().info(entry.key()))
            .collect();
        groups.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(groups)
    }

    async fn message_ids_since(
        &self,
        since: u64,
        filter: &Wildmat,
    ) -> Result<Vec<MessageId>, StorageError> {
        let Ok(arrivals) = self.arrivals.lock() else {
            return Ok(Vec::new());
        };
        Ok(arrivals
            .iter()
            .filter(|a| a.at >= since)
            .filter(|a| a.newsgroups.iter().any(|g| filter.matches_group(g)))
            .map(|a| a.id.clone())
            .collect())
    }

    async fn create_group(&self, name: GroupName, posting: bool) -> Result<(), StorageError> {
        match self.groups.entry(name) {
            dashmap::mapref::entry::Entry::Occupied(entry) => {
                Err(StorageError::GroupExists(entry.key().clone()))
            }
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(GroupState::new(posting));
                Ok(())
            }
        }
    }

    async fn list_peers(&self) -> Result<Vec<Peer>, StorageError> {
        let mut peers: Vec<Peer> = self
            .peers
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        peers.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(peers)
    }

    async fn upsert_peer(&self, peer: Peer) -> Result<(), StorageError> {
        self.peers.insert(peer.name.clone(), peer);
        Ok(())
    }

    async fn update_peer_checkpoint(
        &self,
        name: &PeerName,
        checkpoint: u64,
    ) -> Result<(), StorageError> {
        let mut peer = self
            .peers
            .get_mut(name)
            .ok_or_else(|| StorageError::PeerNotFound(name.clone()))?;
        peer.checkpoint = checkpoint;
        Ok(())
    }
}

/// Provider for [`MemoryStorage`] handles.
///
/// Equivalent tokens resolve to the same shared store, so every session and
/// feeder opened against one token sees the same articles.
#[derive(Debug, Default)]
pub struct MemoryProvider {
    stores: DashMap<String, Arc<MemoryStorage>>,
}

impl MemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StorageProvider for MemoryProvider {
    fn name(&self) -> &str {
        MEMORY_PROVIDER
    }

    async fn open(&self, token: Option<&str>) -> Result<Arc<dyn Storage>, StorageError> {
        let key = token.unwrap_or_default().to_string();
        let store = self
            .stores
            .entry(key)
            .or_insert_with(|| Arc::new(MemoryStorage::new()));
        Ok(Arc::clone(store.value()) as Arc<dyn Storage>)
    }
}
