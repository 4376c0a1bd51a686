//! The command handler contract
//!
//! Handlers interpret protocol lines and return the bytes to answer
//! with, separating command interpretation from transport. The session
//! driver owns the socket; a handler only ever sees the session state
//! and one raw line at a time.

use async_trait::async_trait;
use thiserror::Error;

use crate::constants::limits;
use crate::protocol::{response, stuff_into, write_terminator};
use crate::session::Session;
use crate::storage::StorageError;

/// A failure no protocol status line can paper over.
///
/// Handlers convert expected storage outcomes (duplicates, missing
/// articles, missing groups) into negative status responses themselves;
/// what propagates here reaches the session driver, which answers
/// 403 and terminates that connection only.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Bytes queued for the client in reply to one input line.
///
/// A response is empty (continuation lines being buffered), a single
/// status line, or a status line followed by a dot-terminated
/// multi-line block. Data lines are dot-stuffed as they are appended.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Response {
    bytes: Vec<u8>,
}

impl Response {
    /// No output for this line
    pub fn none() -> Self {
        Self::default()
    }

    /// A single status line, `code SP message CRLF`
    pub fn status(code: u16, message: &str) -> Self {
        Self {
            bytes: response(code, message).into_bytes(),
        }
    }

    /// A pre-formed response, CRLF framing included
    pub fn raw(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }

    /// Begin a multi-line response; append data lines, then [`terminate`].
    ///
    /// [`terminate`]: Response::terminate
    pub fn multiline(code: u16, message: &str) -> Self {
        let mut bytes = Vec::with_capacity(limits::RESPONSE_INITIAL);
        bytes.extend_from_slice(response(code, message).as_bytes());
        Self { bytes }
    }

    /// Append one data line, dot-stuffed and CRLF-terminated
    pub fn push_data_line(&mut self, line: impl AsRef<[u8]>) {
        stuff_into(&mut self.bytes, line.as_ref());
    }

    /// Append pre-formatted block content that is already dot-stuffed
    pub fn extend_raw(&mut self, bytes: &[u8]) {
        self.bytes.extend_from_slice(bytes);
    }

    /// Close a multi-line response with the lone dot
    pub fn terminate(&mut self) {
        write_terminator(&mut self.bytes);
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// One unit of protocol behavior, claiming one or more command keywords.
///
/// The registry dispatches on the keyword; the driver then feeds the
/// handler raw lines until [`has_finished`] reports true again. For most
/// commands that is a single exchange; POST and IHAVE stay unfinished
/// while the article body is being received.
///
/// [`has_finished`]: CommandHandler::has_finished
#[async_trait]
pub trait CommandHandler: Send + Sync {
    /// Keywords this handler answers, uppercase
    fn supported_commands(&self) -> &'static [&'static str];

    /// Capability label contributed to the CAPABILITIES advertisement
    fn implied_capability(&self) -> Option<&'static str> {
        None
    }

    /// Whether execution may change session selection, authentication or
    /// pending-input state. The driver relies on stateless handlers
    /// leaving the session untouched.
    fn is_stateful(&self) -> bool;

    /// False while this handler is still consuming continuation lines;
    /// the driver then routes the next raw line straight back here
    /// instead of dispatching it as a command.
    fn has_finished(&self, session: &Session) -> bool {
        !session.awaiting_input()
    }

    /// Consume one client line (CRLF stripped, binary-safe) and produce
    /// the bytes to answer with.
    ///
    /// The first line routed in is the command line itself; subsequent
    /// lines arrive only while [`has_finished`] is false.
    ///
    /// # Errors
    /// Only for faults with no protocol mapping; see [`CommandError`].
    ///
    /// [`has_finished`]: CommandHandler::has_finished
    async fn process_line(
        &self,
        session: &mut Session,
        line: &[u8],
    ) -> Result<Response, CommandError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_none_is_empty() {
        assert!(Response::none().is_empty());
        assert_eq!(Response::none().as_bytes(), b"");
    }

    #[test]
    fn test_status_line_framing() {
        let resp = Response::status(205, "Connection closing");
        assert_eq!(resp.as_bytes(), b"205 Connection closing\r\n");
    }

    #[test]
    fn test_raw_passthrough() {
        let resp = Response::raw(&b"500 Unknown command\r\n"[..]);
        assert_eq!(resp.as_bytes(), b"500 Unknown command\r\n");
    }

    #[test]
    fn test_multiline_block() {
        let mut resp = Response::multiline(215, "Newsgroups follow");
        resp.push_data_line(b"misc.test 3 1 y");
        resp.push_data_line(b"alt.empty 0 1 n");
        resp.terminate();

        assert_eq!(
            resp.as_bytes(),
            b"215 Newsgroups follow\r\nmisc.test 3 1 y\r\nalt.empty 0 1 n\r\n.\r\n"
        );
    }

    #[test]
    fn test_data_lines_are_dot_stuffed() {
        let mut resp = Response::multiline(220, "1 <a@b.c>");
        resp.push_data_line(b".hidden");
        resp.terminate();

        assert_eq!(resp.as_bytes(), b"220 1 <a@b.c>\r\n..hidden\r\n.\r\n");
    }

    #[test]
    fn test_extend_raw_keeps_bytes_verbatim() {
        let mut resp = Response::multiline(222, "1 <a@b.c>");
        resp.extend_raw(b"..already stuffed\r\n");
        resp.terminate();

        assert_eq!(
            resp.as_bytes(),
            b"222 1 <a@b.c>\r\n..already stuffed\r\n.\r\n"
        );
    }
}
