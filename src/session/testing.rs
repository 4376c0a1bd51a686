//! Shared fixtures for session and command handler tests

use std::sync::Arc;

use crate::auth::AuthValidator;
use crate::command::CommandRegistry;
use crate::feed::FeedHandle;
use crate::protocol::Article;
use crate::session::{Session, SessionContext};
use crate::storage::{MemoryStorage, Storage};
use crate::types::{GroupName, HostName, MessageId};

/// Context over the given storage with the builtin command set
pub(crate) fn context(storage: Arc<dyn Storage>, auth: AuthValidator) -> SessionContext {
    SessionContext {
        storage,
        auth: Arc::new(auth),
        feed: FeedHandle::channel().0,
        registry: Arc::new(CommandRegistry::with_builtins().expect("builtin registry")),
        server_name: HostName::new("news.test.example").expect("valid host name"),
        posting: true,
    }
}

/// Session over empty storage with anonymous access
pub(crate) fn anonymous_session() -> Session {
    Session::new(context(Arc::new(MemoryStorage::new()), AuthValidator::default()))
}

/// Session that must authenticate against the given user table
pub(crate) fn gated_session(users: &[(&str, &str)]) -> Session {
    let pairs = users
        .iter()
        .map(|(u, p)| (u.to_string(), p.to_string()))
        .collect();
    let auth = AuthValidator::with_users(pairs, false).expect("valid test users");
    Session::new(context(Arc::new(MemoryStorage::new()), auth))
}

/// Anonymous session over the given storage
pub(crate) fn session_with(storage: Arc<dyn Storage>) -> Session {
    Session::new(context(storage, AuthValidator::default()))
}

/// Anonymous session on a server that does not accept posting
pub(crate) fn readonly_session() -> Session {
    let mut context = context(Arc::new(MemoryStorage::new()), AuthValidator::default());
    context.posting = false;
    Session::new(context)
}

/// Fresh memory storage seeded with `(name, posting)` groups
pub(crate) async fn storage_with_groups(groups: &[(&str, bool)]) -> Arc<MemoryStorage> {
    let storage = Arc::new(MemoryStorage::new());
    for (name, posting) in groups {
        storage
            .create_group(GroupName::new(*name).expect("valid group name"), *posting)
            .await
            .expect("create group");
    }
    storage
}

/// Raw article lines as a client would send them, header block first
pub(crate) fn article_lines(id: &str, groups: &str, body: &[&str]) -> Vec<Vec<u8>> {
    let mut lines: Vec<Vec<u8>> = vec![
        format!("Message-ID: {}", id).into_bytes(),
        format!("Newsgroups: {}", groups).into_bytes(),
        b"From: poster@example.com".to_vec(),
        b"Subject: test".to_vec(),
        Vec::new(),
    ];
    lines.extend(body.iter().map(|l| l.as_bytes().to_vec()));
    lines
}

/// Assemble and store an article, returning the stored copy
pub(crate) async fn store_article(
    storage: &dyn Storage,
    id: &str,
    groups: &str,
    body: &[&str],
) -> Arc<Article> {
    let lines = article_lines(id, groups, body);
    let article = Article::assemble(&lines).expect("valid article");
    storage.add_article(article).await.expect("store article");
    storage
        .article_by_id(&MessageId::new(id).expect("valid message-id"))
        .await
        .expect("stored article is retrievable")
}
