//! NNTP client side of peer feeding
//!
//! One [`PeerClient`] wraps one TCP connection to a peer and speaks just
//! enough NNTP for the feeders: NEWNEWS and ARTICLE on the pull side,
//! IHAVE on the push side. Connecting consumes the greeting and runs the
//! RFC 4643 exchange when the peer record carries credentials.

use std::time::Duration;

use socket2::SockRef;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::debug;

use crate::connection_error::ConnectionError;
use crate::constants::{limits, socket, timeout as timeouts};
use crate::protocol::responses::CRLF;
use crate::protocol::{
    format_date_time, is_dot_terminator, strip_line_ending, unstuff_line, write_terminator, Article,
};
use crate::storage::Peer;
use crate::types::MessageId;

/// Outcome of one IHAVE offer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OfferOutcome {
    /// 235, the peer stored the article
    Accepted,
    /// 435, the peer already has it or never wants it
    Unwanted,
    /// 436, the peer asked for the article again later
    Deferred,
    /// 437, the peer rejected the transferred article
    Rejected,
}

impl OfferOutcome {
    /// True when offering this article to this peer again could succeed
    pub fn retryable(self) -> bool {
        matches!(self, OfferOutcome::Deferred)
    }
}

/// A live connection to one feed peer.
///
/// Commands run strictly in sequence; every network step is bounded by
/// the configured timeout so one stalled peer cannot wedge a feed cycle.
#[derive(Debug)]
pub struct PeerClient {
    name: String,
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
    network_timeout: Duration,
}

impl PeerClient {
    /// Connect to a peer, consume its greeting, and authenticate when the
    /// record carries credentials.
    ///
    /// # Errors
    /// Fails on connect/socket errors, a non 200/201 greeting, or a
    /// rejected AUTHINFO exchange.
    pub async fn connect(peer: &Peer, network_timeout: Duration) -> Result<Self, ConnectionError> {
        let addr = format!("{}:{}", peer.host.as_str(), peer.port.get());
        let stream = timeout(timeouts::FEED_CONNECT, TcpStream::connect(&addr))
            .await
            .map_err(|_| ConnectionError::Timeout {
                operation: format!("connect to {}", addr),
            })?
            .map_err(|source| ConnectionError::TcpConnect {
                host: peer.host.to_string(),
                port: peer.port.get(),
                source,
            })?;
        configure_feed_socket(&stream)?;

        let (read_half, write_half) = stream.into_split();
        let mut client = Self {
            name: peer.name.to_string(),
            reader: BufReader::with_capacity(limits::READER_CAPACITY, read_half),
            writer: write_half,
            network_timeout,
        };

        let greeting = client.read_status_line("greeting").await?;
        if !greeting.starts_with("200") && !greeting.starts_with("201") {
            return Err(ConnectionError::InvalidGreeting {
                peer: client.name,
                greeting,
            });
        }
        debug!("Connected to peer {}: {}", client.name, greeting);

        if let Some(username) = &peer.username {
            client
                .authenticate(username, peer.password.as_deref())
                .await?;
        }
        Ok(client)
    }

    /// Ask the peer for message-ids newer than `since` in groups matching
    /// `filter`. Ids the peer sends that do not parse are skipped.
    ///
    /// # Errors
    /// Fails on network errors or a non-230 response.
    pub async fn newnews(
        &mut self,
        filter: &str,
        since: u64,
    ) -> Result<Vec<MessageId>, ConnectionError> {
        let stamp = format_date_time(since);
        let command = format!("NEWNEWS {} {} {} GMT", filter, &stamp[..8], &stamp[8..]);
        let response = self.exchange(&command).await?;
        if !response.starts_with("230") {
            return Err(ConnectionError::UnexpectedResponse { command, response });
        }

        let mut ids = Vec::new();
        loop {
            let line = self.read_block_line("NEWNEWS list").await?;
            if is_dot_terminator(&line) {
                break;
            }
            let text = String::from_utf8_lossy(unstuff_line(&line));
            match MessageId::new(text.trim()) {
                Ok(id) => ids.push(id),
                Err(e) => debug!("Peer {} sent unusable message-id {:?}: {}", self.name, text, e),
            }
        }
        Ok(ids)
    }

    /// Fetch one article by message-id.
    ///
    /// Returns `None` when the peer answers 430 or sends an article this
    /// server cannot use (malformed, oversized, or claiming a different
    /// message-id). The transfer is always drained either way so the
    /// connection stays usable.
    ///
    /// # Errors
    /// Fails on network errors or an unexpected status.
    pub async fn fetch_article(
        &mut self,
        id: &MessageId,
    ) -> Result<Option<Article>, ConnectionError> {
        let command = format!("ARTICLE {}", id);
        let response = self.exchange(&command).await?;
        if response.starts_with("430") {
            return Ok(None);
        }
        if !response.starts_with("220") {
            return Err(ConnectionError::UnexpectedResponse { command, response });
        }

        let mut lines: Vec<Vec<u8>> = Vec::new();
        let mut received = 0usize;
        let mut oversize = false;
        loop {
            let line = self.read_block_line("ARTICLE fetch").await?;
            if is_dot_terminator(&line) {
                break;
            }
            received += line.len() + 2;
            if oversize || received > limits::ARTICLE_MAX {
                // Keep draining to the terminator; the block is unusable.
                oversize = true;
                continue;
            }
            lines.push(unstuff_line(&line).to_vec());
        }
        if oversize {
            debug!("Peer {} sent oversized article {}", self.name, id);
            return Ok(None);
        }

        match Article::assemble(&lines) {
            Ok(article) if article.message_id() == id => Ok(Some(article)),
            Ok(article) => {
                debug!(
                    "Peer {} answered ARTICLE {} with {}",
                    self.name,
                    id,
                    article.message_id()
                );
                Ok(None)
            }
            Err(e) => {
                debug!("Peer {} sent unusable article {}: {}", self.name, id, e);
                Ok(None)
            }
        }
    }

    /// Offer one article via IHAVE, transferring the content when the peer
    /// answers 335.
    ///
    /// # Errors
    /// Fails on network errors or a status outside the IHAVE exchange.
    pub async fn offer(&mut self, article: &Article) -> Result<OfferOutcome, ConnectionError> {
        let command = format!("IHAVE {}", article.message_id());
        let invitation = self.exchange(&command).await?;
        match invitation.get(..3) {
            Some("335") => {}
            Some("435") => return Ok(OfferOutcome::Unwanted),
            Some("436") => return Ok(OfferOutcome::Deferred),
            _ => {
                return Err(ConnectionError::UnexpectedResponse {
                    command,
                    response: invitation,
                })
            }
        }

        let mut block = Vec::with_capacity(limits::RESPONSE_INITIAL);
        article.write_full(&mut block);
        write_terminator(&mut block);
        self.write_timed(&block, "article transfer").await?;

        let verdict = self.read_status_line("IHAVE verdict").await?;
        match verdict.get(..3) {
            Some("235") => Ok(OfferOutcome::Accepted),
            Some("436") => Ok(OfferOutcome::Deferred),
            Some("437") => Ok(OfferOutcome::Rejected),
            _ => Err(ConnectionError::UnexpectedResponse {
                command,
                response: verdict,
            }),
        }
    }

    /// Close the connection politely. Errors are ignored; the peer may
    /// already be gone.
    pub async fn quit(mut self) {
        if self.write_timed(b"QUIT\r\n", "QUIT").await.is_ok() {
            let _ = self.read_status_line("QUIT").await;
        }
    }

    /// RFC 4643 client exchange: USER, then PASS when challenged
    async fn authenticate(
        &mut self,
        username: &str,
        password: Option<&str>,
    ) -> Result<(), ConnectionError> {
        let response = self
            .exchange(&format!("AUTHINFO USER {}", username))
            .await?;
        if response.starts_with("281") {
            return Ok(());
        }
        if !response.starts_with("381") {
            return Err(ConnectionError::AuthenticationFailed {
                peer: self.name.clone(),
                response,
            });
        }

        let Some(password) = password else {
            return Err(ConnectionError::AuthenticationFailed {
                peer: self.name.clone(),
                response: "password required but not configured".to_string(),
            });
        };
        let response = self
            .exchange(&format!("AUTHINFO PASS {}", password))
            .await?;
        if !response.starts_with("281") {
            return Err(ConnectionError::AuthenticationFailed {
                peer: self.name.clone(),
                response,
            });
        }
        debug!("Authenticated to peer {}", self.name);
        Ok(())
    }

    /// Send one command line and read the status line it earns
    async fn exchange(&mut self, command: &str) -> Result<String, ConnectionError> {
        let mut line = Vec::with_capacity(command.len() + CRLF.len());
        line.extend_from_slice(command.as_bytes());
        line.extend_from_slice(CRLF);
        self.write_timed(&line, command).await?;
        self.read_status_line(command).await
    }

    async fn write_timed(&mut self, data: &[u8], operation: &str) -> Result<(), ConnectionError> {
        timeout(self.network_timeout, async {
            self.writer.write_all(data).await?;
            self.writer.flush().await
        })
        .await
        .map_err(|_| ConnectionError::Timeout {
            operation: operation.to_string(),
        })?
        .map_err(ConnectionError::from)
    }

    async fn read_status_line(&mut self, operation: &str) -> Result<String, ConnectionError> {
        let line = self.read_raw_line(operation).await?;
        Ok(String::from_utf8_lossy(&line).into_owned())
    }

    /// Read one line of a multi-line block, dot terminator included
    async fn read_block_line(&mut self, operation: &str) -> Result<Vec<u8>, ConnectionError> {
        self.read_raw_line(operation).await
    }

    /// Read one CRLF-terminated line, bounded by the reader capacity
    async fn read_raw_line(&mut self, operation: &str) -> Result<Vec<u8>, ConnectionError> {
        let mut buf = Vec::new();
        let reader = &mut self.reader;
        let n = timeout(self.network_timeout, async {
            (&mut *reader)
                .take(limits::READER_CAPACITY as u64)
                .read_until(b'\n', &mut buf)
                .await
        })
        .await
        .map_err(|_| ConnectionError::Timeout {
            operation: operation.to_string(),
        })??;

        if n == 0 {
            return Err(ConnectionError::IoError(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "peer closed the connection",
            )));
        }
        if !buf.ends_with(b"\n") {
            if n >= limits::READER_CAPACITY {
                return Err(ConnectionError::LineTooLong {
                    limit: limits::READER_CAPACITY,
                });
            }
            return Err(ConnectionError::IoError(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "peer closed mid-line",
            )));
        }
        Ok(strip_line_ending(&buf).to_vec())
    }
}

/// Tune a feed socket: moderate buffers, no Nagle delay on command lines
fn configure_feed_socket(stream: &TcpStream) -> Result<(), ConnectionError> {
    let sock = SockRef::from(stream);
    sock.set_recv_buffer_size(socket::FEED_BUFFER)
        .map_err(|source| ConnectionError::SocketConfig {
            operation: "set_recv_buffer_size".to_string(),
            source,
        })?;
    sock.set_send_buffer_size(socket::FEED_BUFFER)
        .map_err(|source| ConnectionError::SocketConfig {
            operation: "set_send_buffer_size".to_string(),
            source,
        })?;
    sock.set_tcp_nodelay(true)
        .map_err(|source| ConnectionError::SocketConfig {
            operation: "set_tcp_nodelay".to_string(),
            source,
        })?;
    Ok(())
}
