//! Group selection commands: GROUP, LISTGROUP

use async_trait::async_trait;

use crate::command::handler::{CommandError, CommandHandler, Response};
use crate::protocol::{codes, parse_command_line, responses, split_args};
use crate::session::Session;
use crate::storage::{GroupInfo, StorageError};
use crate::types::GroupName;

/// First article pointer after selecting a group: the low watermark, or
/// nothing for an empty group.
fn first_article(info: &GroupInfo) -> Option<u64> {
    if info.count == 0 {
        None
    } else {
        Some(info.low)
    }
}

/// Parse a LISTGROUP range: `n`, `n-` or `n-m`
fn parse_range(token: &str) -> Option<(u64, u64)> {
    match token.split_once('-') {
        None => token.parse().ok().map(|n| (n, n)),
        Some((low, "")) => low.parse().ok().map(|n| (n, u64::MAX)),
        Some((low, high)) => {
            let low = low.parse().ok()?;
            let high = high.parse().ok()?;
            Some((low, high))
        }
    }
}

/// GROUP and LISTGROUP — select a newsgroup, positioning the article
/// pointer at its first article.
///
/// LISTGROUP additionally reports the article numbers present,
/// optionally restricted to a range, and falls back to the currently
/// selected group when called without an argument.
pub struct GroupHandler;

impl GroupHandler {
    async fn select(
        &self,
        session: &mut Session,
        name: GroupName,
    ) -> Result<Result<GroupInfo, Response>, CommandError> {
        match session.storage().group(&name).await {
            Ok(info) => {
                session.select_group(info.name.clone(), first_article(&info));
                Ok(Ok(info))
            }
            Err(StorageError::GroupNotFound(_)) => {
                Ok(Err(Response::raw(responses::NO_SUCH_GROUP)))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn group(
        &self,
        session: &mut Session,
        tokens: &[&str],
    ) -> Result<Response, CommandError> {
        let name = match tokens {
            [token] => match GroupName::new(*token) {
                Ok(name) => name,
                Err(_) => return Ok(Response::raw(responses::SYNTAX_ERROR)),
            },
            _ => return Ok(Response::raw(responses::SYNTAX_ERROR)),
        };
        let info = match self.select(session, name).await? {
            Ok(info) => info,
            Err(resp) => return Ok(resp),
        };
        Ok(Response::status(
            codes::GROUP_SELECTED,
            &format!("{} {} {} {}", info.count, info.low, info.high, info.name),
        ))
    }

    async fn listgroup(
        &self,
        session: &mut Session,
        tokens: &[&str],
    ) -> Result<Response, CommandError> {
        let range = match tokens.get(1) {
            Some(token) => match parse_range(token) {
                Some(range) => Some(range),
                None => return Ok(Response::raw(responses::SYNTAX_ERROR)),
            },
            None => None,
        };
        if tokens.len() > 2 {
            return Ok(Response::raw(responses::SYNTAX_ERROR));
        }

        // An explicit group argument selects it, exactly like GROUP;
        // without one the current selection is listed unchanged.
        let info = match tokens.first() {
            Some(token) => {
                let name = match GroupName::new(*token) {
                    Ok(name) => name,
                    Err(_) => return Ok(Response::raw(responses::SYNTAX_ERROR)),
                };
                match self.select(session, name).await? {
                    Ok(info) => info,
                    Err(resp) => return Ok(resp),
                }
            }
            None => {
                let name = match session.group_name() {
                    Some(name) => name.clone(),
                    None => return Ok(Response::raw(responses::NO_GROUP_SELECTED)),
                };
                match session.storage().group(&name).await {
                    Ok(info) => info,
                    Err(StorageError::GroupNotFound(_)) => {
                        return Ok(Response::raw(responses::NO_SUCH_GROUP))
                    }
                    Err(e) => return Err(e.into()),
                }
            }
        };

        let numbers = session.storage().group_numbers(&info.name).await?;
        let mut resp = Response::multiline(
            codes::GROUP_SELECTED,
            &format!(
                "{} {} {} {} list follows",
                info.count, info.low, info.high, info.name
            ),
        );
        for number in numbers {
            if range.map_or(true, |(low, high)| (low..=high).contains(&number)) {
                resp.push_data_line(number.to_string().as_bytes());
            }
        }
        resp.terminate();
        Ok(resp)
    }
}

#[async_trait]
impl CommandHandler for GroupHandler {
    fn supported_commands(&self) -> &'static [&'static str] {
        &["GROUP", "LISTGROUP"]
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
        let tokens = split_args(cmd.args);
        match cmd.keyword.as_str() {
            "GROUP" => self.group(session, &tokens).await,
            _ => self.listgroup(session, &tokens).await,
        }
    }
}
