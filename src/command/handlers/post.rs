//! Article injection commands: POST, IHAVE

use async_trait::async_trait;
use tracing::{debug, info};

use crate::command::handler::{CommandError, CommandHandler, Response};
use crate::protocol::{
    codes, is_dot_terminator, parse_article_spec, parse_command_line, responses, Article,
    ArticleSpec,
};
use crate::session::{PendingInput, PendingKind, Session};
use crate::storage::StorageError;

/// POST — accept an article from a reading client.
///
/// On a read-only server the command is refused outright with 440.
/// Otherwise the handler answers 340, buffers continuation lines until
/// the terminating dot, then assembles and stores the article. A
/// missing `Message-ID` header is filled in with a generated id; at
/// least one of the named newsgroups must exist here with posting
/// enabled.
pub struct PostHandler;

impl PostHandler {
    async fn accept(
        &self,
        session: &mut Session,
        pending: PendingInput,
    ) -> Result<Response, CommandError> {
        if pending.is_oversize() {
            return Ok(Response::status(codes::POSTING_FAILED, "Article too large"));
        }
        let lines = pending.into_lines();
        let article = match Article::assemble_generating_id(&lines, session.server_name()) {
            Ok(article) => article,
            Err(e) => {
                return Ok(Response::status(
                    codes::POSTING_FAILED,
                    &format!("Posting failed: {}", e),
                ))
            }
        };
        let groups = match article.newsgroups() {
            Ok(groups) => groups,
            Err(e) => {
                return Ok(Response::status(
                    codes::POSTING_FAILED,
                    &format!("Posting failed: {}", e),
                ))
            }
        };

        let storage = session.storage();
        let mut postable = false;
        for name in &groups {
            match storage.group(name).await {
                Ok(info) if info.posting => {
                    postable = true;
                    break;
                }
                Ok(_) | Err(StorageError::GroupNotFound(_)) => {}
                Err(e) => return Err(e.into()),
            }
        }
        if !postable {
            return Ok(Response::status(
                codes::POSTING_FAILED,
                "No posting-enabled newsgroup named",
            ));
        }

        let id = article.message_id().clone();
        match storage.add_article(article).await {
            Ok(locations) => {
                info!(
                    "Session {} posted article {} into {} group(s)",
                    session.id(),
                    id,
                    locations.len()
                );
                if let Ok(stored) = storage.article_by_id(&id).await {
                    session.feed().queue_for_push(stored);
                }
                Ok(Response::status(codes::ARTICLE_POSTED, "Article received OK"))
            }
            Err(StorageError::Duplicate(_)) => Ok(Response::status(
                codes::POSTING_FAILED,
                "Duplicate message-id",
            )),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl CommandHandler for PostHandler {
    fn supported_commands(&self) -> &'static [&'static str] {
        &["POST"]
    }

    fn implied_capability(&self) -> Option<&'static str> {
        Some("POST")
    }

    fn is_stateful(&self) -> bool {
        true
    }

    async fn process_line(
        &self,
        session: &mut Session,
        line: &[u8],
    ) -> Result<Response, CommandError> {
        if session.awaiting_input() {
            if !is_dot_terminator(line) {
                if let Some(pending) = session.pending_input_mut() {
                    pending.push_line(line);
                }
                return Ok(Response::none());
            }
            if let Some(pending) = session.take_pending_input() {
                return self.accept(session, pending).await;
            }
        }

        let cmd = match parse_command_line(line) {
            Ok(cmd) => cmd,
            Err(_) => return Ok(Response::raw(responses::SYNTAX_ERROR)),
        };
        if !cmd.args.is_empty() {
            return Ok(Response::raw(responses::SYNTAX_ERROR));
        }
        if !session.may_post() {
            return Ok(Response::raw(responses::POSTING_NOT_PERMITTED));
        }
        session.begin_input(PendingInput::post());
        Ok(Response::raw(responses::SEND_ARTICLE_POST))
    }
}

/// IHAVE — accept an article offered by a peer.
///
/// The offered message-id is checked against the store before the
/// transfer is invited with 335; the transferred copy must carry the
/// same id. 435 refuses an article already present, 437 rejects a bad
/// transfer for good, 436 asks the peer to retry later.
pub struct IhaveHandler;

impl IhaveHandler {
    async fn accept(
        &self,
        session: &mut Session,
        pending: PendingInput,
    ) -> Result<Response, CommandError> {
        let offered = match pending.kind() {
            PendingKind::Ihave(id) => id.clone(),
            PendingKind::Post => {
                return Ok(Response::status(codes::TRANSFER_REJECTED, "Transfer rejected"))
            }
        };
        if pending.is_oversize() {
            return Ok(Response::status(
                codes::TRANSFER_REJECTED,
                "Article too large",
            ));
        }
        let lines = pending.into_lines();
        let article = match Article::assemble(&lines) {
            Ok(article) => article,
            Err(e) => {
                return Ok(Response::status(
                    codes::TRANSFER_REJECTED,
                    &format!("Transfer rejected: {}", e),
                ))
            }
        };
        if article.message_id() != &offered {
            debug!(
                "Session {} offered {} but sent {}",
                session.id(),
                offered,
                article.message_id()
            );
            return Ok(Response::status(
                codes::TRANSFER_REJECTED,
                "Message-ID mismatch",
            ));
        }

        let storage = session.storage();
        match storage.add_article(article).await {
            Ok(locations) => {
                info!(
                    "Session {} transferred article {} into {} group(s)",
                    session.id(),
                    offered,
                    locations.len()
                );
                if let Ok(stored) = storage.article_by_id(&offered).await {
                    session.feed().queue_for_push(stored);
                }
                Ok(Response::status(
                    codes::TRANSFER_OK,
                    "Article transferred OK",
                ))
            }
            Err(StorageError::Duplicate(_)) => Ok(Response::status(
                codes::TRANSFER_REJECTED,
                "Duplicate article",
            )),
            Err(StorageError::Unavailable(_)) => Ok(Response::status(
                codes::TRANSFER_TRY_LATER,
                "Transfer failed; try again later",
            )),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl CommandHandler for IhaveHandler {
    fn supported_commands(&self) -> &'static [&'static str] {
        &["IHAVE"]
    }

    fn implied_capability(&self) -> Option<&'static str> {
        Some("IHAVE")
    }

    fn is_stateful(&self) -> bool {
        true
    }

    async fn process_line(
        &self,
        session: &mut Session,
        line: &[u8],
    ) -> Result<Response, CommandError> {
        if session.awaiting_input() {
            if !is_dot_terminator(line) {
                if let Some(pending) = session.pending_input_mut() {
                    pending.push_line(line);
                }
                return Ok(Response::none());
            }
            if let Some(pending) = session.take_pending_input() {
                return self.accept(session, pending).await;
            }
        }

        let cmd = match parse_command_line(line) {
            Ok(cmd) => cmd,
            Err(_) => return Ok(Response::raw(responses::SYNTAX_ERROR)),
        };
        let id = match parse_article_spec(cmd.args) {
            Ok(ArticleSpec::ByMessageId(id)) => id,
            _ => return Ok(Response::raw(responses::SYNTAX_ERROR)),
        };

        match session.storage().contains_article(&id).await {
            Ok(true) => Ok(Response::status(
                codes::TRANSFER_NOT_WANTED,
                "Article not wanted",
            )),
            Ok(false) => {
                session.begin_input(PendingInput::ihave(id));
                Ok(Response::status(
                    codes::SEND_ARTICLE_TRANSFER,
                    "Send it; end with <CR-LF>.<CR-LF>",
                ))
            }
            Err(StorageError::Unavailable(_)) => Ok(Response::status(
                codes::TRANSFER_TRY_LATER,
                "Transfer not possible; try again later",
            )),
            Err(e) => Err(e.into()),
        }
    }
}
