//! Session administration commands: CAPABILITIES, MODE, QUIT

use async_trait::async_trait;

use crate::command::handler::{CommandError, CommandHandler, Response};
use crate::protocol::{codes, parse_command_line, responses};
use crate::session::Session;

/// CAPABILITIES — advertise what this server implements.
///
/// The list is assembled by the registry from every handler's
/// [`implied_capability`] claim, so plugins show up automatically.
///
/// [`implied_capability`]: CommandHandler::implied_capability
pub struct CapabilitiesHandler;

#[async_trait]
impl CommandHandler for CapabilitiesHandler {
    fn supported_commands(&self) -> &'static [&'static str] {
        &["CAPABILITIES"]
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
        let mut resp = Response::multiline(codes::CAPABILITY_LIST, "Capability list:");
        for capability in registry.capabilities() {
            resp.push_data_line(capability.as_bytes());
        }
        resp.terminate();
        Ok(resp)
    }
}

/// MODE READER — mode negotiation.
///
/// This server is always in reader mode; the answer only reports
/// whether the session may post yet (200 past the authentication gate
/// on a posting server, 201 otherwise).
pub struct ModeHandler;

#[async_trait]
impl CommandHandler for ModeHandler {
    fn supported_commands(&self) -> &'static [&'static str] {
        &["MODE"]
    }

    fn implied_capability(&self) -> Option<&'static str> {
        Some("MODE-READER")
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
        if !args.eq_ignore_ascii_case("READER") {
            return Ok(Response::raw(responses::SYNTAX_ERROR));
        }
        if session.may_post() {
            Ok(Response::status(codes::POSTING_ALLOWED, "Posting allowed"))
        } else {
            Ok(Response::status(codes::NO_POSTING, "Posting prohibited"))
        }
    }
}

/// QUIT — close the session after acknowledging
pub struct QuitHandler;

#[async_trait]
impl CommandHandler for QuitHandler {
    fn supported_commands(&self) -> &'static [&'static str] {
        &["QUIT"]
    }

    fn is_stateful(&self) -> bool {
        true
    }

    async fn process_line(
        &self,
        session: &mut Session,
        _line: &[u8],
    ) -> Result<Response, CommandError> {
        session.disconnect();
        Ok(Response::raw(responses::CONNECTION_CLOSING))
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
    async fn test_capabilities_lists_version_first() {
        let mut session = testing::anonymous_session();
        let resp = CapabilitiesHandler
            .process_line(&mut session, b"CAPABILITIES")
            .await
            .unwrap();

        let text = to_text(&resp);
        assert!(text.starts_with("101 Capability list:\r\nVERSION 2\r\n"));
        assert!(text.contains("\r\nREADER\r\n"));
        assert!(text.contains("\r\nIHAVE\r\n"));
        assert!(text.contains("\r\nPOST\r\n"));
        assert!(text.ends_with("\r\n.\r\n"));
    }

    #[tokio::test]
    async fn test_mode_reader_when_authenticated() {
        let mut session = testing::anonymous_session();
        let resp = ModeHandler
            .process_line(&mut session, b"MODE READER")
            .await
            .unwrap();
        assert_eq!(resp.as_bytes(), b"200 Posting allowed\r\n");
    }

    #[tokio::test]
    async fn test_mode_reader_before_authentication() {
        let mut session = testing::gated_session(&[("alice", "secret")]);
        let resp = ModeHandler
            .process_line(&mut session, b"MODE READER")
            .await
            .unwrap();
        assert_eq!(resp.as_bytes(), b"201 Posting prohibited\r\n");
    }

    #[tokio::test]
    async fn test_mode_reader_on_readonly_server() {
        let mut session = testing::readonly_session();
        let resp = ModeHandler
            .process_line(&mut session, b"MODE READER")
            .await
            .unwrap();
        assert_eq!(resp.as_bytes(), b"201 Posting prohibited\r\n");
    }

    #[tokio::test]
    async fn test_mode_reader_is_case_insensitive() {
        let mut session = testing::anonymous_session();
        let resp = ModeHandler
            .process_line(&mut session, b"mode reader")
            .await
            .unwrap();
        assert!(resp.as_bytes().starts_with(b"200 "));
    }

    #[tokio::test]
    async fn test_mode_rejects_other_arguments() {
        let mut session = testing::anonymous_session();
        let resp = ModeHandler
            .process_line(&mut session, b"MODE STREAM")
            .await
            .unwrap();
        assert!(resp.as_bytes().starts_with(b"501 "));

        let resp = ModeHandler
            .process_line(&mut session, b"MODE")
            .await
            .unwrap();
        assert!(resp.as_bytes().starts_with(b"501 "));
    }

    #[tokio::test]
    async fn test_quit_disconnects() {
        let mut session = testing::anonymous_session();
        let resp = QuitHandler
            .process_line(&mut session, b"QUIT")
            .await
            .unwrap();

        assert_eq!(resp.as_bytes(), b"205 Connection closing\r\n");
        assert!(session.is_disconnected());
    }
}
