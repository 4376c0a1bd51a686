//! AUTHINFO USER/PASS authentication exchange

use async_trait::async_trait;
use tracing::{info, warn};

use crate::command::handler::{CommandError, CommandHandler, Response};
use crate::protocol::{parse_command_line, responses};
use crate::session::Session;
use crate::types::Username;

/// AUTHINFO — the two step USER/PASS exchange.
///
/// USER stages a claimed identity and PASS resolves it against the
/// configured user table. A session that already carries an identity
/// cannot claim another one; a PASS without a staged USER is rejected
/// as out of sequence.
pub struct AuthinfoHandler;

#[async_trait]
impl CommandHandler for AuthinfoHandler {
    fn supported_commands(&self) -> &'static [&'static str] {
        &["AUTHINFO"]
    }

    fn implied_capability(&self) -> Option<&'static str> {
        Some("AUTHINFO USER")
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
        let (verb, rest) = cmd.args.split_once([' ', '\t']).unwrap_or((cmd.args, ""));
        let rest = rest.trim_matches([' ', '\t']);

        if session.user().is_some() {
            return Ok(Response::raw(responses::AUTH_ALREADY_AUTHENTICATED));
        }

        if verb.eq_ignore_ascii_case("USER") {
            if rest.is_empty() {
                return Ok(Response::raw(responses::SYNTAX_ERROR));
            }
            session.set_pending_user(rest.to_string());
            return Ok(Response::raw(responses::AUTH_PASSWORD_REQUIRED));
        }

        if verb.eq_ignore_ascii_case("PASS") {
            let pending = match session.take_pending_user() {
                Some(pending) => pending,
                None => return Ok(Response::raw(responses::AUTH_OUT_OF_SEQUENCE)),
            };
            if rest.is_empty() {
                return Ok(Response::raw(responses::SYNTAX_ERROR));
            }
            if !session.auth().validate(&pending, rest) {
                warn!(
                    "Session {} failed authentication for {}",
                    session.id(),
                    pending
                );
                return Ok(Response::raw(responses::AUTH_FAILED));
            }
            return match Username::new(pending.as_str()) {
                Ok(name) => {
                    info!("Session {} authenticated as {}", session.id(), name);
                    session.mark_authenticated(name);
                    Ok(Response::raw(responses::AUTH_ACCEPTED))
                }
                Err(_) => Ok(Response::raw(responses::AUTH_FAILED)),
            };
        }

        Ok(Response::raw(responses::SYNTAX_ERROR))
    }
}
