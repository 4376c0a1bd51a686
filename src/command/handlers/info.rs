//! Information commands: DATE, HELP, LIST, NEWGROUPS, NEWNEWS

use async_trait::async_trait;

use crate::command::handler::{CommandError, CommandHandler, Response};
use crate::protocol::{
    codes, format_date_time, now_unix_secs, parse_command_line, parse_date_time, parse_gmt_token,
    responses, split_args, Wildmat,
};
use crate::session::Session;
use crate::storage::GroupInfo;

/// DATE — server time as `yyyymmddhhmmss` UTC
pub struct DateHandler;

#[async_trait]
impl CommandHandler for DateHandler {
    fn supported_commands(&self) -> &'static [&'static str] {
        &["DATE"]
    }

    fn is_stateful(&self) -> bool {
        false
    }

    async fn process_line(
        &self,
        _session: &mut Session,
        _line: &[u8],
    ) -> Result<Response, CommandError> {
        Ok(Response::status(
            codes::SERVER_DATE,
            &format_date_time(now_unix_secs()),
        ))
    }
}

/// HELP — list every registered command keyword
pub struct HelpHandler;

#[async_trait]
impl CommandHandler for HelpHandler {
    fn supported_commands(&self) -> &'static [&'static str] {
        &["HELP"]
    }

    fn is_stateful(&self) -> bool {
        false
    }

    async fn process_line(
        &self,
        session: &mut Session,
        _line: &[u8],
    ) -> Result<Response, CommandError> {
        let registry = session.registry();
        let mut resp = Response::multiline(codes::HELP_TEXT, "Legal commands");
        for keyword in registry.keywords() {
            resp.push_data_line(format!("  {}", keyword).as_bytes());
        }
        resp.terminate();
        Ok(resp)
    }
}

/// One `LIST ACTIVE` information line, `name high low status`
fn active_line(info: &GroupInfo) -> String {
    format!(
        "{} {} {} {}",
        info.name,
        info.high,
        info.low,
        if info.posting { 'y' } else { 'n' }
    )
}

/// LIST — group listings.
///
/// `LIST` and `LIST ACTIVE [wildmat]` report watermarks and posting
/// status; `LIST NEWSGROUPS [wildmat]` reports the plain names (this
/// server stores no descriptions). Unknown keywords get 501 so clients
/// can probe for optional variants.
pub struct ListHandler;

#[async_trait]
impl CommandHandler for ListHandler {
    fn supported_commands(&self) -> &'static [&'static str] {
        &["LIST"]
    }

    fn implied_capability(&self) -> Option<&'static str> {
        Some("LIST ACTIVE NEWSGROUPS")
    }

    fn is_stateful(&self) -> bool {
        false
    }

    async fn process_line(
        &self,
        session: &mut Session,
        line: &[u8],
    ) -> Result<Response, CommandError> {
        let args = match parse_command_line(line) {
            Ok(cmd) => cmd.args.to_string(),
            Err(_) => return Ok(Response::raw(responses::SYNTAX_ERROR)),
        };
        let tokens = split_args(&args);

        let (descriptions, filter) = match tokens.as_slice() {
            [] => (false, None),
            [keyword] | [keyword, _] => {
                let descriptions = if keyword.eq_ignore_ascii_case("ACTIVE") {
                    false
                } else if keyword.eq_ignore_ascii_case("NEWSGROUPS") {
                    true
                } else {
                    return Ok(Response::raw(responses::SYNTAX_ERROR));
                };
                let filter = match tokens.get(1) {
                    Some(pattern) => match Wildmat::parse(pattern) {
                        Ok(wildmat) => Some(wildmat),
                        Err(_) => return Ok(Response::raw(responses::SYNTAX_ERROR)),
                    },
                    None => None,
                };
                (descriptions, filter)
            }
            _ => return Ok(Response::raw(responses::SYNTAX_ERROR)),
        };

        let groups = session.storage().list_groups().await?;
        let mut resp = Response::multiline(codes::INFORMATION_FOLLOWS, "Newsgroups follow");
        for info in &groups {
            if filter.as_ref().map_or(true, |w| w.matches_group(&info.name)) {
                if descriptions {
                    resp.push_data_line(info.name.as_str().as_bytes());
                } else {
                    resp.push_data_line(active_line(info).as_bytes());
                }
            }
        }
        resp.terminate();
        Ok(resp)
    }
}

/// Parse the `date time [GMT]` tail shared by NEWGROUPS and NEWNEWS
fn parse_since(tokens: &[&str]) -> Option<u64> {
    let (date, time, gmt) = match tokens {
        [date, time] => (*date, *time, ""),
        [date, time, gmt] => (*date, *time, *gmt),
        _ => return None,
    };
    if !parse_gmt_token(gmt) {
        return None;
    }
    parse_date_time(date, time).map(|dt| dt.unix_secs)
}

/// NEWGROUPS date time [GMT] — groups created since the given instant
pub struct NewgroupsHandler;

#[async_trait]
impl CommandHandler for NewgroupsHandler {
    fn supported_commands(&self) -> &'static [&'static str] {
        &["NEWGROUPS"]
    }

    fn is_stateful(&self) -> bool {
        false
    }

    async fn process_line(
        &self,
        session: &mut Session,
        line: &[u8],
    ) -> Result<Response, CommandError> {
        let args = match parse_command_line(line) {
            Ok(cmd) => cmd.args.to_string(),
            Err(_) => return Ok(Response::raw(responses::SYNTAX_ERROR)),
        };
        let since = match parse_since(&split_args(&args)) {
            Some(since) => since,
            None => return Ok(Response::raw(responses::SYNTAX_ERROR)),
        };

        let groups = session.storage().groups_since(since).await?;
        let mut resp = Response::multiline(codes::NEW_GROUPS_FOLLOW, "New newsgroups follow");
        for info in &groups {
            resp.push_data_line(active_line(info).as_bytes());
        }
        resp.terminate();
        Ok(resp)
    }
}

/// NEWNEWS wildmat date time [GMT] — message-ids of articles that
/// arrived since the given instant in groups matching the wildmat.
///
/// This is the server side of the pull feed protocol.
pub struct NewnewsHandler;

#[async_trait]
impl CommandHandler for NewnewsHandler {
    fn supported_commands(&self) -> &'static [&'static str] {
        &["NEWNEWS"]
    }

    fn implied_capability(&self) -> Option<&'static str> {
        Some("NEWNEWS")
    }

    fn is_stateful(&self) -> bool {
        false
    }

    async fn process_line(
        &self,
        session: &mut Session,
        line: &[u8],
    ) -> Result<Response, CommandError> {
        let args = match parse_command_line(line) {
            Ok(cmd) => cmd.args.to_string(),
            Err(_) => return Ok(Response::raw(responses::SYNTAX_ERROR)),
        };
        let tokens = split_args(&args);
        if tokens.len() < 3 {
            return Ok(Response::raw(responses::SYNTAX_ERROR));
        }
        let filter = match Wildmat::parse(tokens[0]) {
            Ok(wildmat) => wildmat,
            Err(_) => return Ok(Response::raw(responses::SYNTAX_ERROR)),
        };
        let since = match parse_since(&tokens[1..]) {
            Some(since) => since,
            None => return Ok(Response::raw(responses::SYNTAX_ERROR)),
        };

        let ids = session.storage().message_ids_since(since, &filter).await?;
        let mut resp = Response::multiline(codes::NEW_ARTICLES_FOLLOW, "New articles follow");
        for id in &ids {
            resp.push_data_line(id.as_str().as_bytes());
        }
        resp.terminate();
        Ok(resp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::testing;

    fn to_text(resp: &Response) -> String {
        String::from_utf8(resp.as_bytes().to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_date_is_fourteen_digits() {
        let mut session = testing::anonymous_session();
        let resp = DateHandler
            .process_line(&mut session, b"DATE")
            .await
            .unwrap();

        let text = to_text(&resp);
        assert!(text.starts_with("111 "));
        let stamp = text.trim_end().strip_prefix("111 ").unwrap();
        assert_eq!(stamp.len(), 14);
        assert!(stamp.bytes().all(|b| b.is_ascii_digit()));
    }

    #[tokio::test]
    async fn test_help_lists_keywords() {
        let mut session = testing::anonymous_session();
        let resp = HelpHandler
            .process_line(&mut session, b"HELP")
            .await
            .unwrap();

        let text = to_text(&resp);
        assert!(text.starts_with("100 "));
        assert!(text.contains("  ARTICLE\r\n"));
        assert!(text.contains("  QUIT\r\n"));
        assert!(text.ends_with(".\r\n"));
    }

    #[tokio::test]
    async fn test_list_reports_watermarks() {
        let storage = testing::storage_with_groups(&[("misc.test", true), ("alt.quiet", false)]).await;
        testing::store_article(storage.as_ref(), "<one@example.com>", "misc.test", &["hi"]).await;
        let mut session = testing::session_with(storage);

        let resp = ListHandler
            .process_line(&mut session, b"LIST")
            .await
            .unwrap();

        let text = to_text(&resp);
        assert!(text.starts_with("215 "));
        assert!(text.contains("misc.test 1 1 y\r\n"));
        assert!(text.contains("alt.quiet 0 1 n\r\n"));
    }

    #[tokio::test]
    async fn test_list_active_with_wildmat() {
        let storage = testing::storage_with_groups(&[("misc.test", true), ("alt.quiet", true)]).await;
        let mut session = testing::session_with(storage);

        let resp = ListHandler
            .process_line(&mut session, b"LIST ACTIVE misc.*")
            .await
            .unwrap();

        let text = to_text(&resp);
        assert!(text.contains("misc.test"));
        assert!(!text.contains("alt.quiet"));
    }

    #[tokio::test]
    async fn test_list_newsgroups_names_only() {
        let storage = testing::storage_with_groups(&[("misc.test", true)]).await;
        let mut session = testing::session_with(storage);

        let resp = ListHandler
            .process_line(&mut session, b"LIST NEWSGROUPS")
            .await
            .unwrap();

        let text = to_text(&resp);
        assert!(text.contains("misc.test\r\n"));
        assert!(!text.contains("misc.test 0"));
    }

    #[tokio::test]
    async fn test_list_unknown_keyword() {
        let mut session = testing::anonymous_session();
        let resp = ListHandler
            .process_line(&mut session, b"LIST OVERVIEW.FMT")
            .await
            .unwrap();
        assert!(resp.as_bytes().starts_with(b"501 "));
    }

    #[tokio::test]
    async fn test_list_bad_wildmat() {
        let mut session = testing::anonymous_session();
        let resp = ListHandler
            .process_line(&mut session, b"LIST ACTIVE ,,")
            .await
            .unwrap();
        assert!(resp.as_bytes().starts_with(b"501 "));
    }

    #[tokio::test]
    async fn test_newgroups_since_epoch_lists_all() {
        let storage = testing::storage_with_groups(&[("misc.test", true)]).await;
        let mut session = testing::session_with(storage);

        let resp = NewgroupsHandler
            .process_line(&mut session, b"NEWGROUPS 19700101 000000 GMT")
            .await
            .unwrap();

        let text = to_text(&resp);
        assert!(text.starts_with("231 "));
        assert!(text.contains("misc.test 0 1 y\r\n"));
    }

    #[tokio::test]
    async fn test_newgroups_in_the_future_lists_none() {
        let storage = testing::storage_with_groups(&[("misc.test", true)]).await;
        let mut session = testing::session_with(storage);

        let resp = NewgroupsHandler
            .process_line(&mut session, b"NEWGROUPS 20990101 000000")
            .await
            .unwrap();

        assert_eq!(to_text(&resp), "231 New newsgroups follow\r\n.\r\n");
    }

    #[tokio::test]
    async fn test_newgroups_rejects_malformed_dates() {
        let mut session = testing::anonymous_session();
        for bad in [
            &b"NEWGROUPS"[..],
            b"NEWGROUPS 1999 000000",
            b"NEWGROUPS 19990624 25",
            b"NEWGROUPS 19990624 000000 PDT",
        ] {
            let resp = NewgroupsHandler.process_line(&mut session, bad).await.unwrap();
            assert!(resp.as_bytes().starts_with(b"501 "), "{:?}", bad);
        }
    }

    #[tokio::test]
    async fn test_newnews_filters_by_wildmat() {
        let storage = testing::storage_with_groups(&[("misc.test", true), ("alt.other", true)]).await;
        testing::store_article(storage.as_ref(), "<in@example.com>", "misc.test", &["a"]).await;
        testing::store_article(storage.as_ref(), "<out@example.com>", "alt.other", &["b"]).await;
        let mut session = testing::session_with(storage);

        let resp = NewnewsHandler
            .process_line(&mut session, b"NEWNEWS misc.* 19700101 000000 GMT")
            .await
            .unwrap();

        let text = to_text(&resp);
        assert!(text.starts_with("230 "));
        assert!(text.contains("<in@example.com>\r\n"));
        assert!(!text.contains("<out@example.com>"));
    }

    #[tokio::test]
    async fn test_newnews_since_future_is_empty() {
        let storage = testing::storage_with_groups(&[("misc.test", true)]).await;
        testing::store_article(storage.as_ref(), "<old@example.com>", "misc.test", &["a"]).await;
        let mut session = testing::session_with(storage);

        let resp = NewnewsHandler
            .process_line(&mut session, b"NEWNEWS * 20990101 000000")
            .await
            .unwrap();

        assert_eq!(to_text(&resp), "230 New articles follow\r\n.\r\n");
    }

    #[tokio::test]
    async fn test_newnews_requires_three_arguments() {
        let mut session = testing::anonymous_session();
        let resp = NewnewsHandler
            .process_line(&mut session, b"NEWNEWS misc.*")
            .await
            .unwrap();
        assert!(resp.as_bytes().starts_with(b"501 "));
    }
}
