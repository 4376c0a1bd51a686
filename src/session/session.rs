//! Per-connection session state
//!
//! A [`Session`] is owned exclusively by its connection's task and holds
//! everything the command layer mutates: the lifecycle state, the
//! claimed identity, the selected group with its current article number,
//! and pending multi-line input while a POST or IHAVE body is being
//! received. Shared server facilities (storage, the credential
//! validator, the push feed queue and the command registry) come in
//! through a cloned [`SessionContext`].

use std::fmt;
use std::sync::Arc;

use crate::auth::AuthValidator;
use crate::command::CommandRegistry;
use crate::constants::limits;
use crate::feed::FeedHandle;
use crate::protocol::unstuff_line;
use crate::session::SessionState;
use crate::storage::Storage;
use crate::types::{GroupName, HostName, MessageId, SessionId, Username};

/// Shared facilities handed to every session at accept time.
///
/// Cloning is cheap; every field is an `Arc` or a channel handle.
#[derive(Clone)]
pub struct SessionContext {
    pub storage: Arc<dyn Storage>,
    pub auth: Arc<AuthValidator>,
    pub feed: FeedHandle,
    pub registry: Arc<CommandRegistry>,
    /// Advertised in the greeting and stamped into generated message-ids
    pub server_name: HostName,
    /// False on a read-only mirror; POST answers 440 regardless of auth
    pub posting: bool,
}

impl fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionContext")
            .field("server_name", &self.server_name)
            .field("auth_required", &self.auth.required())
            .field("commands", &self.registry.len())
            .finish_non_exhaustive()
    }
}

/// The selected newsgroup and current article pointer.
///
/// The pointer is `None` for an empty group and after GROUP positions at
/// the start of one; it is only ever a number that was valid in the
/// group at selection time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedGroup {
    pub name: GroupName,
    pub current: Option<u64>,
}

/// What kind of multi-line input the session is waiting to finish
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingKind {
    /// POST body; a message-id is generated if the headers carry none
    Post,
    /// IHAVE transfer for the offered message-id
    Ihave(MessageId),
}

/// Buffered multi-line input between a 340/335 continuation response and
/// the terminating dot line.
///
/// Lines are stored unstuffed. Input past the article size limit flips
/// the `oversize` flag and releases the buffer; the remaining lines are
/// still consumed off the wire so the session stays in protocol sync,
/// and the handler rejects the article at the terminator.
#[derive(Debug)]
pub struct PendingInput {
    kind: PendingKind,
    lines: Vec<Vec<u8>>,
    bytes: usize,
    oversize: bool,
}

impl PendingInput {
    pub fn post() -> Self {
        Self {
            kind: PendingKind::Post,
            lines: Vec::new(),
            bytes: 0,
            oversize: false,
        }
    }

    pub fn ihave(id: MessageId) -> Self {
        Self {
            kind: PendingKind::Ihave(id),
            lines: Vec::new(),
            bytes: 0,
            oversize: false,
        }
    }

    pub fn kind(&self) -> &PendingKind {
        &self.kind
    }

    /// Buffer one received line (CRLF stripped, still dot-stuffed)
    pub fn push_line(&mut self, raw_line: &[u8]) {
        self.bytes += raw_line.len() + 2;
        if self.bytes > limits::ARTICLE_MAX {
            self.oversize = true;
            self.lines.clear();
        }
        if !self.oversize {
            self.lines.push(unstuff_line(raw_line).to_vec());
        }
    }

    pub fn is_oversize(&self) -> bool {
        self.oversize
    }

    /// Unstuffed lines received so far
    pub fn lines(&self) -> &[Vec<u8>] {
        &self.lines
    }

    pub fn into_lines(self) -> Vec<Vec<u8>> {
        self.lines
    }
}

/// Transient state of one client connection
#[derive(Debug)]
pub struct Session {
    id: SessionId,
    context: SessionContext,
    state: SessionState,
    user: Option<Username>,
    /// AUTHINFO USER argument awaiting its AUTHINFO PASS
    pending_user: Option<String>,
    group: Option<SelectedGroup>,
    pending_input: Option<PendingInput>,
}

impl Session {
    /// Create a session in its initial lifecycle state: `Authenticated`
    /// when anonymous access is configured, `Unauthenticated` otherwise.
    pub fn new(context: SessionContext) -> Self {
        let state = if context.auth.required() {
            SessionState::Unauthenticated
        } else {
            SessionState::Authenticated
        };
        Self {
            id: SessionId::new(),
            context,
            state,
            user: None,
            pending_user: None,
            group: None,
            pending_input: None,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn storage(&self) -> Arc<dyn Storage> {
        Arc::clone(&self.context.storage)
    }

    pub fn auth(&self) -> &AuthValidator {
        &self.context.auth
    }

    pub fn feed(&self) -> FeedHandle {
        self.context.feed.clone()
    }

    pub fn registry(&self) -> Arc<CommandRegistry> {
        Arc::clone(&self.context.registry)
    }

    pub fn server_name(&self) -> &HostName {
        &self.context.server_name
    }

    // --- authentication ---

    /// Whether commands behind the authentication gate may run
    pub fn is_authenticated(&self) -> bool {
        self.state.gate_open()
    }

    /// Whether POST is available to this session.
    ///
    /// Requires the server to accept posting at all and the session to
    /// be past the authentication gate. Reported by the greeting and
    /// MODE READER (200 vs 201) and enforced by POST (440).
    pub fn may_post(&self) -> bool {
        self.context.posting && self.is_authenticated()
    }

    /// Identity claimed through AUTHINFO, if any.
    ///
    /// Anonymous sessions are authenticated without one.
    pub fn user(&self) -> Option<&Username> {
        self.user.as_ref()
    }

    /// Identity for log lines; anonymous sessions get a fixed marker
    pub fn user_display(&self) -> &str {
        self.user
            .as_ref()
            .map_or(crate::constants::user::ANONYMOUS, |u| u.as_str())
    }

    /// Record a successful AUTHINFO exchange.
    ///
    /// Opens the gate if it was closed; a session that already selected
    /// a group keeps its selection state.
    pub fn mark_authenticated(&mut self, user: Username) {
        self.user = Some(user);
        if self.state == SessionState::Unauthenticated {
            self.state = SessionState::Authenticated;
        }
    }

    pub fn pending_user(&self) -> Option<&str> {
        self.pending_user.as_deref()
    }

    pub fn set_pending_user(&mut self, username: String) {
        self.pending_user = Some(username);
    }

    pub fn take_pending_user(&mut self) -> Option<String> {
        self.pending_user.take()
    }

    // --- group selection ---

    pub fn group(&self) -> Option<&SelectedGroup> {
        self.group.as_ref()
    }

    pub fn group_name(&self) -> Option<&GroupName> {
        self.group.as_ref().map(|g| &g.name)
    }

    pub fn current_article(&self) -> Option<u64> {
        self.group.as_ref().and_then(|g| g.current)
    }

    /// Select a group, positioning the article pointer.
    ///
    /// `current` is the group's first article number, or `None` for an
    /// empty group.
    pub fn select_group(&mut self, name: GroupName, current: Option<u64>) {
        self.state = if current.is_some() {
            SessionState::ArticleSelected
        } else {
            SessionState::GroupSelected
        };
        self.group = Some(SelectedGroup { name, current });
    }

    /// Move the article pointer within the selected group.
    ///
    /// Ignored when no group is selected; handlers answer 412 before
    /// getting here.
    pub fn set_current_article(&mut self, number: u64) {
        if let Some(group) = self.group.as_mut() {
            group.current = Some(number);
            self.state = SessionState::ArticleSelected;
        }
    }

    // --- multi-line input ---

    /// Start collecting continuation lines for POST or IHAVE
    pub fn begin_input(&mut self, pending: PendingInput) {
        self.pending_input = Some(pending);
    }

    pub fn pending_input(&self) -> Option<&PendingInput> {
        self.pending_input.as_ref()
    }

    pub fn pending_input_mut(&mut self) -> Option<&mut PendingInput> {
        self.pending_input.as_mut()
    }

    pub fn take_pending_input(&mut self) -> Option<PendingInput> {
        self.pending_input.take()
    }

    /// True while continuation lines must be routed to the same handler
    pub fn awaiting_input(&self) -> bool {
        self.pending_input.is_some()
    }

    // --- termination ---

    /// Enter the terminal state; the driver stops reading afterwards
    pub fn disconnect(&mut self) {
        self.state = SessionState::Disconnected;
    }

    pub fn is_disconnected(&self) -> bool {
        self.state.is_terminal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::testing;
    use crate::types::GroupName;

    #[test]
    fn test_anonymous_session_starts_authenticated() {
        let session = testing::anonymous_session();
        assert_eq!(session.state(), SessionState::Authenticated);
        assert!(session.is_authenticated());
        assert!(session.user().is_none());
        assert_eq!(session.user_display(), "<anonymous>");
    }

    #[test]
    fn test_gated_session_starts_unauthenticated() {
        let session = testing::gated_session(&[("alice", "secret")]);
        assert_eq!(session.state(), SessionState::Unauthenticated);
        assert!(!session.is_authenticated());
    }

    #[test]
    fn test_may_post_follows_gate_and_server_switch() {
        assert!(testing::anonymous_session().may_post());
        assert!(!testing::readonly_session().may_post());

        let mut gated = testing::gated_session(&[("alice", "secret")]);
        assert!(!gated.may_post());
        gated.mark_authenticated(Username::new("alice").unwrap());
        assert!(gated.may_post());
    }

    #[test]
    fn test_mark_authenticated_opens_gate() {
        let mut session = testing::gated_session(&[("alice", "secret")]);
        session.mark_authenticated(Username::new("alice").unwrap());

        assert_eq!(session.state(), SessionState::Authenticated);
        assert_eq!(session.user_display(), "alice");
    }

    #[test]
    fn test_mark_authenticated_keeps_group_selection() {
        let mut session = testing::anonymous_session();
        session.select_group(GroupName::new("misc.test").unwrap(), Some(3));
        session.mark_authenticated(Username::new("alice").unwrap());

        assert_eq!(session.state(), SessionState::ArticleSelected);
        assert_eq!(session.current_article(), Some(3));
    }

    #[test]
    fn test_select_group_positions_pointer() {
        let mut session = testing::anonymous_session();
        session.select_group(GroupName::new("misc.test").unwrap(), Some(1));

        assert_eq!(session.state(), SessionState::ArticleSelected);
        assert_eq!(session.group_name().unwrap().as_str(), "misc.test");
        assert_eq!(session.current_article(), Some(1));
    }

    #[test]
    fn test_select_empty_group_has_no_pointer() {
        let mut session = testing::anonymous_session();
        session.select_group(GroupName::new("misc.empty").unwrap(), None);

        assert_eq!(session.state(), SessionState::GroupSelected);
        assert_eq!(session.current_article(), None);
    }

    #[test]
    fn test_set_current_article_without_group_is_ignored() {
        let mut session = testing::anonymous_session();
        session.set_current_article(7);

        assert_eq!(session.state(), SessionState::Authenticated);
        assert_eq!(session.current_article(), None);
    }

    #[test]
    fn test_reselecting_group_replaces_pointer() {
        let mut session = testing::anonymous_session();
        session.select_group(GroupName::new("misc.test").unwrap(), Some(5));
        session.select_group(GroupName::new("misc.other").unwrap(), None);

        assert_eq!(session.group_name().unwrap().as_str(), "misc.other");
        assert_eq!(session.current_article(), None);
        assert_eq!(session.state(), SessionState::GroupSelected);
    }

    #[test]
    fn test_pending_user_round_trip() {
        let mut session = testing::gated_session(&[("alice", "secret")]);
        assert!(session.pending_user().is_none());

        session.set_pending_user("alice".to_string());
        assert_eq!(session.pending_user(), Some("alice"));

        assert_eq!(session.take_pending_user().unwrap(), "alice");
        assert!(session.pending_user().is_none());
    }

    #[test]
    fn test_disconnect_is_terminal() {
        let mut session = testing::anonymous_session();
        session.disconnect();

        assert!(session.is_disconnected());
        assert!(!session.is_authenticated());
    }

    #[test]
    fn test_session_ids_are_unique() {
        let a = testing::anonymous_session();
        let b = testing::anonymous_session();
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_pending_input_collects_unstuffed_lines() {
        let mut pending = PendingInput::post();
        pending.push_line(b"Subject: hi");
        pending.push_line(b"..leading dot");
        pending.push_line(b"");

        assert_eq!(pending.lines().len(), 3);
        assert_eq!(pending.lines()[1], b".leading dot");
        assert!(!pending.is_oversize());
    }

    #[test]
    fn test_pending_input_oversize_drops_buffer() {
        let mut pending = PendingInput::post();
        let chunk = vec![b'x'; 64 * 1024];
        // 4MB limit; 65 chunks of 64KB exceed it
        for _ in 0..65 {
            pending.push_line(&chunk);
        }

        assert!(pending.is_oversize());
        assert!(pending.lines().is_empty());
    }

    #[test]
    fn test_pending_kind_carries_offered_id() {
        let id = MessageId::new("<offer@example.com>").unwrap();
        let pending = PendingInput::ihave(id.clone());
        assert_eq!(pending.kind(), &PendingKind::Ihave(id));
    }

    #[test]
    fn test_session_begin_and_take_input() {
        let mut session = testing::anonymous_session();
        assert!(!session.awaiting_input());

        session.begin_input(PendingInput::post());
        assert!(session.awaiting_input());
        session.pending_input_mut().unwrap().push_line(b"line");

        let pending = session.take_pending_input().unwrap();
        assert_eq!(pending.lines().len(), 1);
        assert!(!session.awaiting_input());
    }

    #[test]
    fn test_context_debug_omits_credentials() {
        let session = testing::gated_session(&[("alice", "secret")]);
        let debug = format!("{:?}", session);
        assert!(debug.contains("auth_required"));
        assert!(!debug.contains("secret"));
    }
}
