//! The per-connection protocol driver
//!
//! Owns the socket for one client: greets, reads lines under the idle
//! timeout, resolves command keywords against the registry and routes
//! lines to handlers. A stateful handler that has not finished (POST
//! and IHAVE while their article body streams in) keeps receiving the
//! following lines without keyword dispatch. The driver is generic
//! over the transport so tests run it over in-memory pipes.

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, error};

use crate::command::{CommandError, CommandHandler};
use crate::config::SessionConfig;
use crate::connection_error::ConnectionError;
use crate::constants::limits;
use crate::protocol::{
    codes, greeting, greeting_readonly, parse_command_line, response, responses, strip_line_ending,
};
use crate::session::Session;

/// Commands answered before authentication (RFC 4643 §2.3 forbids 480
/// for these)
const AUTH_EXEMPT: &[&str] = &["AUTHINFO", "CAPABILITIES", "MODE", "QUIT"];

/// Drives one client connection from greeting to close
pub struct Connection<R, W> {
    reader: BufReader<R>,
    writer: W,
    session: Session,
    idle_timeout: Duration,
    max_command_line: usize,
}

impl<R, W> Connection<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(reader: R, writer: W, session: Session, settings: &SessionConfig) -> Self {
        Self {
            reader: BufReader::with_capacity(limits::READER_CAPACITY, reader),
            writer,
            session,
            idle_timeout: settings.idle_timeout,
            max_command_line: settings.max_command_line,
        }
    }

    /// Serve until QUIT, client EOF, idle timeout or a storage fault.
    ///
    /// Clean closes (QUIT, EOF) return `Ok`; everything else surfaces as
    /// a [`ConnectionError`] for the accept loop to log at its level.
    pub async fn run(self) -> Result<(), ConnectionError> {
        let Self {
            mut reader,
            mut writer,
            mut session,
            idle_timeout,
            max_command_line,
        } = self;

        let banner = if session.may_post() {
            greeting(&format!(
                "{} NNTP service ready, posting allowed",
                session.server_name()
            ))
        } else {
            greeting_readonly(&format!("{} NNTP service ready", session.server_name()))
        };
        writer.write_all(banner.as_bytes()).await?;
        writer.flush().await?;

        let mut current: Option<Arc<dyn CommandHandler>> = None;
        let mut buf = Vec::with_capacity(1024);
        loop {
            buf.clear();
            // Article body lines may legitimately run far past the
            // command line limit
            let limit = if session.awaiting_input() {
                limits::READER_CAPACITY
            } else {
                max_command_line
            };

            let n = match tokio::time::timeout(idle_timeout, read_line(&mut reader, &mut buf, limit))
                .await
            {
                Ok(Ok(n)) => n,
                Ok(Err(e)) => {
                    if matches!(e, ConnectionError::LineTooLong { .. }) {
                        let _ = writer.write_all(responses::SYNTAX_ERROR).await;
                    }
                    return Err(e);
                }
                Err(_) => {
                    let notice =
                        response(codes::SERVICE_UNAVAILABLE, "Idle timeout; closing connection");
                    let _ = writer.write_all(notice.as_bytes()).await;
                    return Err(ConnectionError::IdleTimeout);
                }
            };
            if n == 0 {
                debug!("Session {} closed by client", session.id());
                return Ok(());
            }
            let line = strip_line_ending(&buf);

            let handler = match &current {
                Some(handler) => Arc::clone(handler),
                None => match resolve_command(&session, line) {
                    Ok(handler) => handler,
                    Err(rejection) => {
                        writer.write_all(rejection).await?;
                        writer.flush().await?;
                        continue;
                    }
                },
            };

            match handler.process_line(&mut session, line).await {
                Ok(resp) => {
                    if !resp.is_empty() {
                        writer.write_all(resp.as_bytes()).await?;
                        writer.flush().await?;
                    }
                }
                Err(CommandError::Storage(e)) => {
                    error!("Session {}: storage fault: {}", session.id(), e);
                    let _ = writer.write_all(responses::INTERNAL_FAULT).await;
                    return Err(ConnectionError::Storage(e));
                }
            }

            current = if handler.is_stateful() && !handler.has_finished(&session) {
                Some(handler)
            } else {
                None
            };

            if session.is_disconnected() {
                debug!("Session {} quit", session.id());
                return Ok(());
            }
        }
    }
}

/// Resolve a keyword line to its handler, or the rejection to answer.
///
/// The authentication gate lives here: a gated session may only speak
/// the exempt commands until AUTHINFO succeeds. Argument-dependent
/// preconditions (412, 420) stay with the handlers.
fn resolve_command(
    session: &Session,
    line: &[u8],
) -> Result<Arc<dyn CommandHandler>, &'static [u8]> {
    let cmd = match parse_command_line(line) {
        Ok(cmd) => cmd,
        Err(_) => return Err(responses::UNKNOWN_COMMAND),
    };
    let registry = session.registry();
    let handler = match registry.resolve(&cmd.keyword) {
        Some(handler) => Arc::clone(handler),
        None => return Err(responses::UNKNOWN_COMMAND),
    };
    if !session.is_authenticated() && !AUTH_EXEMPT.contains(&cmd.keyword.as_str()) {
        return Err(responses::AUTH_REQUIRED_FOR_COMMAND);
    }
    // Keyword only; AUTHINFO arguments never reach the log
    debug!("Session {}: {}", session.id(), cmd.keyword);
    Ok(handler)
}

/// Read one LF-terminated line of at most `limit` bytes, ending included.
///
/// `Ok(0)` is client EOF at a line boundary; EOF mid-line and lines
/// past the limit are errors.
async fn read_line<R: AsyncRead + Unpin>(
    reader: &mut BufReader<R>,
    buf: &mut Vec<u8>,
    limit: usize,
) -> Result<usize, ConnectionError> {
    let mut bounded = (&mut *reader).take(limit as u64);
    let n = bounded.read_until(b'\n', buf).await?;
    if n == 0 {
        return Ok(0);
    }
    if buf.last() != Some(&b'\n') {
        if n >= limit {
            return Err(ConnectionError::LineTooLong { limit });
        }
        return Err(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            "connection closed mid-line",
        )
        .into());
    }
    Ok(n)
}
