//! Article retrieval commands: ARTICLE, HEAD, BODY, STAT, LAST, NEXT

use std::sync::Arc;

use async_trait::async_trait;

use crate::command::handler::{CommandError, CommandHandler, Response};
use crate::protocol::{
    codes, parse_article_spec, parse_command_line, responses, Article, ArticleSpec,
};
use crate::session::Session;
use crate::storage::StorageError;

/// ARTICLE, HEAD, BODY and STAT — retrieve the current article, an
/// article by number in the selected group, or an article by
/// message-id from anywhere in the store.
///
/// Retrieval by number moves the article pointer; retrieval by
/// message-id never touches it and reports article number 0 as it is
/// not tied to any group.
pub struct ArticleHandler;

impl ArticleHandler {
    /// Resolve a spec to `(number, article)`, or the error status line
    /// the client should see.
    async fn resolve(
        &self,
        session: &mut Session,
        spec: ArticleSpec,
    ) -> Result<Result<(u64, Arc<Article>), Response>, CommandError> {
        match spec {
            ArticleSpec::ByMessageId(id) => {
                match session.storage().article_by_id(&id).await {
                    Ok(article) => Ok(Ok((0, article))),
                    Err(StorageError::ArticleNotFound) => {
                        Ok(Err(Response::raw(responses::NO_SUCH_ARTICLE_ID)))
                    }
                    Err(e) => Err(e.into()),
                }
            }
            ArticleSpec::ByNumber(number) => {
                let group = match session.group_name() {
                    Some(group) => group.clone(),
                    None => return Ok(Err(Response::raw(responses::NO_GROUP_SELECTED))),
                };
                match session.storage().article_by_number(&group, number).await {
                    Ok(article) => {
                        session.set_current_article(number);
                        Ok(Ok((number, article)))
                    }
                    Err(StorageError::ArticleNotFound) => {
                        Ok(Err(Response::raw(responses::NO_SUCH_ARTICLE_NUMBER)))
                    }
                    Err(StorageError::GroupNotFound(_)) => {
                        Ok(Err(Response::raw(responses::NO_SUCH_GROUP)))
                    }
                    Err(e) => Err(e.into()),
                }
            }
            ArticleSpec::Current => {
                let group = match session.group_name() {
                    Some(group) => group.clone(),
                    None => return Ok(Err(Response::raw(responses::NO_GROUP_SELECTED))),
                };
                let number = match session.current_article() {
                    Some(number) => number,
                    None => return Ok(Err(Response::raw(responses::NO_CURRENT_ARTICLE))),
                };
                match session.storage().article_by_number(&group, number).await {
                    Ok(article) => Ok(Ok((number, article))),
                    Err(StorageError::ArticleNotFound) => {
                        Ok(Err(Response::raw(responses::NO_CURRENT_ARTICLE)))
                    }
                    Err(StorageError::GroupNotFound(_)) => {
                        Ok(Err(Response::raw(responses::NO_SUCH_GROUP)))
                    }
                    Err(e) => Err(e.into()),
                }
            }
        }
    }
}

#[async_trait]
impl CommandHandler for ArticleHandler {
    fn supported_commands(&self) -> &'static [&'static str] {
        &["ARTICLE", "HEAD", "BODY", "STAT"]
    }

    fn implied_capability(&self) -> Option<&'static str> {
        Some("READER")
    }

    fn is_stateful(&self) -> bool {
        true
    }

    async fn process_line(
        &self,
        session: &mut Session,
        line: &[u8],
    ) -> Result<Response, CommandError> {
        let cmd = match parse_command_line(line) {
            Ok(cmd) => cmd,
            Err(_) => return Ok(Response::raw(responses::SYNTAX_ERROR)),
        };
        let spec = match parse_article_spec(cmd.args) {
            Ok(spec) => spec,
            Err(_) => return Ok(Response::raw(responses::SYNTAX_ERROR)),
        };
        let (number, article) = match self.resolve(session, spec).await? {
            Ok(found) => found,
            Err(resp) => return Ok(resp),
        };

        let position = format!("{} {}", number, article.message_id());
        let resp = match cmd.keyword.as_str() {
            "STAT" => Response::status(codes::ARTICLE_EXISTS, &format!("{} Article exists", position)),
            "HEAD" => {
                let mut resp = Response::multiline(
                    codes::HEAD_FOLLOWS,
                    &format!("{} Headers follow", position),
                );
                let mut buf = Vec::new();
                article.write_head(&mut buf);
                resp.extend_raw(&buf);
                resp.terminate();
                resp
            }
            "BODY" => {
                let mut resp = Response::multiline(
                    codes::BODY_FOLLOWS,
                    &format!("{} Body follows", position),
                );
                let mut buf = Vec::new();
                article.write_body(&mut buf);
                resp.extend_raw(&buf);
                resp.terminate();
                resp
            }
            _ => {
                let mut resp = Response::multiline(
                    codes::ARTICLE_FOLLOWS,
                    &format!("{} Article follows", position),
                );
                let mut buf = Vec::new();
                article.write_full(&mut buf);
                resp.extend_raw(&buf);
                resp.terminate();
                resp
            }
        };
        Ok(resp)
    }
}

/// LAST and NEXT — move the article pointer to the adjacent article
/// number present in the selected group.
pub struct NavigationHandler;

#[async_trait]
impl CommandHandler for NavigationHandler {
    fn supported_commands(&self) -> &'static [&'static str] {
        &["LAST", "NEXT"]
    }

    fn implied_capability(&self) -> Option<&'static str> {
        Some("READER")
    }

    fn is_stateful(&self) -> bool {
        true
    }

    async fn process_line(
        &self,
        session: &mut Session,
        line: &[u8],
    ) -> Result<Response, CommandError> {
        let cmd = match parse_command_line(line) {
            Ok(cmd) => cmd,
            Err(_) => return Ok(Response::raw(responses::SYNTAX_ERROR)),
        };
        if !cmd.args.is_empty() {
            return Ok(Response::raw(responses::SYNTAX_ERROR));
        }
        let forward = cmd.keyword == "NEXT";

        let group = match session.group_name() {
            Some(group) => group.clone(),
            None => return Ok(Response::raw(responses::NO_GROUP_SELECTED)),
        };
        let current = match session.current_article() {
            Some(current) => current,
            None => return Ok(Response::raw(responses::NO_CURRENT_ARTICLE)),
        };

        let numbers = session.storage().group_numbers(&group).await?;
        let target = if forward {
            numbers.iter().copied().find(|&n| n > current)
        } else {
            numbers.iter().rev().copied().find(|&n| n < current)
        };
        let no_adjacent = if forward {
            Response::status(codes::NO_NEXT_ARTICLE, "No next article in this group")
        } else {
            Response::status(codes::NO_PREV_ARTICLE, "No previous article in this group")
        };
        let number = match target {
            Some(number) => number,
            None => return Ok(no_adjacent),
        };

        match session.storage().article_by_number(&group, number).await {
            Ok(article) => {
                session.set_current_article(number);
                Ok(Response::status(
                    codes::ARTICLE_EXISTS,
                    &format!("{} {} Article exists", number, article.message_id()),
                ))
            }
            // The neighbour vanished between the scan and the fetch
            Err(StorageError::ArticleNotFound) => Ok(no_adjacent),
            Err(StorageError::GroupNotFound(_)) => Ok(Response::raw(responses::NO_SUCH_GROUP)),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::testing;
    use crate::types::GroupName;

    fn to_text(resp: &Response) -> String {
        String::from_utf8(resp.as_bytes().to_vec()).unwrap()
    }

    fn select(session: &mut Session, name: &str, current: Option<u64>) {
        session.select_group(GroupName::new(name).unwrap(), current);
    }

    async fn populated_session() -> Session {
        let storage =
            testing::storage_with_groups(&[("misc.test", true), ("misc.empty", true)]).await;
        testing::store_article(storage.as_ref(), "<one@example.com>", "misc.test", &["first"])
            .await;
        testing::store_article(storage.as_ref(), "<two@example.com>", "misc.test", &["second"])
            .await;
        testing::store_article(
            storage.as_ref(),
            "<three@example.com>",
            "misc.test",
            &["third"],
        )
        .await;
        testing::session_with(storage)
    }

    #[tokio::test]
    async fn test_article_by_number_moves_pointer() {
        let mut session = populated_session().await;
        select(&mut session, "misc.test", Some(1));

        let resp = ArticleHandler
            .process_line(&mut session, b"ARTICLE 2")
            .await
            .unwrap();
        let text = to_text(&resp);

        assert!(text.starts_with("220 2 <two@example.com>"));
        assert!(text.contains("Subject: test\r\n"));
        assert!(text.contains("\r\n\r\nsecond\r\n"));
        assert!(text.ends_with("\r\n.\r\n"));
        assert_eq!(session.current_article(), Some(2));
    }

    #[tokio::test]
    async fn test_article_by_message_id_reports_zero_and_keeps_pointer() {
        let mut session = populated_session().await;
        select(&mut session, "misc.test", Some(3));

        let resp = ArticleHandler
            .process_line(&mut session, b"ARTICLE <one@example.com>")
            .await
            .unwrap();

        assert!(to_text(&resp).starts_with("220 0 <one@example.com>"));
        assert_eq!(session.current_article(), Some(3));
    }

    #[tokio::test]
    async fn test_article_by_message_id_without_group() {
        let mut session = populated_session().await;
        let resp = ArticleHandler
            .process_line(&mut session, b"ARTICLE <two@example.com>")
            .await
            .unwrap();
        assert!(to_text(&resp).starts_with("220 0 <two@example.com>"));
    }

    #[tokio::test]
    async fn test_head_and_body_split_the_article() {
        let mut session = populated_session().await;
        select(&mut session, "misc.test", Some(1));

        let head = ArticleHandler
            .process_line(&mut session, b"HEAD 1")
            .await
            .unwrap();
        let text = to_text(&head);
        assert!(text.starts_with("221 1 <one@example.com>"));
        assert!(text.contains("Subject: test\r\n"));
        assert!(!text.contains("first"));

        let body = ArticleHandler
            .process_line(&mut session, b"BODY 1")
            .await
            .unwrap();
        let text = to_text(&body);
        assert!(text.starts_with("222 1 <one@example.com>"));
        assert!(text.contains("first\r\n"));
        assert!(!text.contains("Subject:"));
    }

    #[tokio::test]
    async fn test_stat_is_single_line() {
        let mut session = populated_session().await;
        select(&mut session, "misc.test", Some(1));

        let resp = ArticleHandler
            .process_line(&mut session, b"STAT")
            .await
            .unwrap();
        let text = to_text(&resp);

        assert!(text.starts_with("223 1 <one@example.com>"));
        assert_eq!(text.matches("\r\n").count(), 1);
    }

    #[tokio::test]
    async fn test_body_dot_lines_are_stuffed() {
        let storage = testing::storage_with_groups(&[("misc.test", true)]).await;
        testing::store_article(
            storage.as_ref(),
            "<dots@example.com>",
            "misc.test",
            &[".", ".hidden", "plain"],
        )
        .await;
        let mut session = testing::session_with(storage);

        let resp = ArticleHandler
            .process_line(&mut session, b"BODY <dots@example.com>")
            .await
            .unwrap();
        let text = to_text(&resp);

        assert!(text.contains("\r\n..\r\n..hidden\r\nplain\r\n"));
        assert!(text.ends_with("plain\r\n.\r\n"));
    }

    #[tokio::test]
    async fn test_retrieval_preconditions() {
        let mut session = populated_session().await;

        let resp = ArticleHandler
            .process_line(&mut session, b"ARTICLE 1")
            .await
            .unwrap();
        assert!(resp.as_bytes().starts_with(b"412 "));

        let resp = ArticleHandler
            .process_line(&mut session, b"ARTICLE")
            .await
            .unwrap();
        assert!(resp.as_bytes().starts_with(b"412 "));

        select(&mut session, "misc.empty", None);
        let resp = ArticleHandler
            .process_line(&mut session, b"ARTICLE")
            .await
            .unwrap();
        assert!(resp.as_bytes().starts_with(b"420 "));
    }

    #[tokio::test]
    async fn test_missing_articles() {
        let mut session = populated_session().await;
        select(&mut session, "misc.test", Some(1));

        let resp = ArticleHandler
            .process_line(&mut session, b"STAT 99")
            .await
            .unwrap();
        assert!(resp.as_bytes().starts_with(b"423 "));
        assert_eq!(session.current_article(), Some(1));

        let resp = ArticleHandler
            .process_line(&mut session, b"STAT <nosuch@example.com>")
            .await
            .unwrap();
        assert!(resp.as_bytes().starts_with(b"430 "));
    }

    #[tokio::test]
    async fn test_article_bad_spec() {
        let mut session = populated_session().await;
        let resp = ArticleHandler
            .process_line(&mut session, b"ARTICLE 1 2")
            .await
            .unwrap();
        assert!(resp.as_bytes().starts_with(b"501 "));
    }

    #[tokio::test]
    async fn test_next_walks_forward() {
        let mut session = populated_session().await;
        select(&mut session, "misc.test", Some(1));

        let resp = NavigationHandler
            .process_line(&mut session, b"NEXT")
            .await
            .unwrap();
        assert!(to_text(&resp).starts_with("223 2 <two@example.com>"));
        assert_eq!(session.current_article(), Some(2));

        NavigationHandler
            .process_line(&mut session, b"NEXT")
            .await
            .unwrap();
        let resp = NavigationHandler
            .process_line(&mut session, b"NEXT")
            .await
            .unwrap();
        assert!(resp.as_bytes().starts_with(b"421 "));
        assert_eq!(session.current_article(), Some(3));
    }

    #[tokio::test]
    async fn test_last_walks_backward() {
        let mut session = populated_session().await;
        select(&mut session, "misc.test", Some(2));

        let resp = NavigationHandler
            .process_line(&mut session, b"LAST")
            .await
            .unwrap();
        assert!(to_text(&resp).starts_with("223 1 <one@example.com>"));

        let resp = NavigationHandler
            .process_line(&mut session, b"LAST")
            .await
            .unwrap();
        assert!(resp.as_bytes().starts_with(b"422 "));
        assert_eq!(session.current_article(), Some(1));
    }

    #[tokio::test]
    async fn test_navigation_preconditions() {
        let mut session = populated_session().await;

        let resp = NavigationHandler
            .process_line(&mut session, b"NEXT")
            .await
            .unwrap();
        assert!(resp.as_bytes().starts_with(b"412 "));

        select(&mut session, "misc.empty", None);
        let resp = NavigationHandler
            .process_line(&mut session, b"NEXT")
            .await
            .unwrap();
        assert!(resp.as_bytes().starts_with(b"420 "));

        let resp = NavigationHandler
            .process_line(&mut session, b"NEXT 1")
            .await
            .unwrap();
        assert!(resp.as_bytes().starts_with(b"501 "));
    }
}
