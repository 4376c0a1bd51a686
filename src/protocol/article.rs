//! Article assembly and header access
//!
//! Articles arrive as dot-unstuffed line blocks (POST, IHAVE, feed pulls)
//! and are stored with CRLF framing intact. Header access is zero-copy over
//! the stored bytes.
//!
//! Per [RFC 5322](https://datatracker.ietf.org/doc/html/rfc5322):
//! - Each header line: `name: value CRLF`
//! - Header names: printable US-ASCII except colon, no whitespace
//! - Folded headers: continuation lines start with space/tab
//! - A blank line separates headers from body

use memchr::memchr;
use thiserror::Error;
use uuid::Uuid;

use super::parser::stuff_into;
use crate::types::{GroupName, HostName, MessageId};

/// Header names the server itself reads
pub mod header {
    pub const MESSAGE_ID: &str = "Message-ID";
    pub const NEWSGROUPS: &str = "Newsgroups";
    pub const PATH: &str = "Path";
}

/// Errors assembling an article from received lines
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ArticleError {
    /// Header block violates RFC 5322 framing
    #[error("invalid header: {0}")]
    InvalidHeader(String),

    /// Message-ID header present but not a valid message-id
    #[error("invalid Message-ID header: {0}")]
    InvalidMessageId(String),

    /// Message-ID header required but absent
    #[error("missing Message-ID header")]
    MissingMessageId,

    /// Newsgroups header absent or names no valid group
    #[error("missing or empty Newsgroups header")]
    MissingNewsgroups,

    /// Article had no header lines at all
    #[error("article has no headers")]
    Empty,
}

/// Validated zero-copy view over a raw header block
///
/// The block holds CRLF-terminated header lines and nothing else; the blank
/// separator line and the body are stored apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Headers<'a> {
    data: &'a [u8],
}

impl<'a> Headers<'a> {
    /// Validate a raw header block and wrap it.
    ///
    /// # Errors
    /// Fails when a line has no colon, an empty or malformed name, or the
    /// block opens with folding whitespace.
    pub fn parse(data: &'a [u8]) -> Result<Self, ArticleError> {
        let mut first = true;
        for line in block_lines(data) {
            if line.is_empty() {
                return Err(ArticleError::InvalidHeader(
                    "blank line inside header block".to_string(),
                ));
            }
            if line[0] == b' ' || line[0] == b'\t' {
                if first {
                    return Err(ArticleError::InvalidHeader(
                        "header block starts with folding whitespace".to_string(),
                    ));
                }
                first = false;
                continue;
            }
            first = false;

            let colon = memchr(b':', line).ok_or_else(|| {
                ArticleError::InvalidHeader(format!(
                    "header missing colon: {}",
                    String::from_utf8_lossy(line)
                ))
            })?;
            let name = &line[..colon];
            if name.is_empty() {
                return Err(ArticleError::InvalidHeader("empty header name".to_string()));
            }
            for &byte in name {
                if !(33..=126).contains(&byte) || byte == b':' {
                    return Err(ArticleError::InvalidHeader(format!(
                        "invalid character in header name: {}",
                        String::from_utf8_lossy(name)
                    )));
                }
            }
        }
        Ok(Headers { data })
    }

    /// Get a header value by name (case-insensitive, zero-copy).
    ///
    /// Folded headers yield their first line only; the callers here read
    /// `Message-ID` and `Newsgroups`, which peers send unfolded.
    pub fn get(&self, name: &str) -> Option<&'a [u8]> {
        self.iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name.as_bytes()))
            .map(|(_, v)| v)
    }

    /// Iterate `(name, value)` pairs, skipping folded continuation lines
    pub fn iter(&self) -> impl Iterator<Item = (&'a [u8], &'a [u8])> {
        block_lines(self.data).filter_map(|line| {
            if line.is_empty() || line[0] == b' ' || line[0] == b'\t' {
                return None;
            }
            let colon = memchr(b':', line)?;
            let value = line[colon + 1..].trim_ascii();
            Some((&line[..colon], value))
        })
    }

    /// Raw header block bytes
    pub fn as_bytes(&self) -> &'a [u8] {
        self.data
    }
}

/// A complete article as stored and served
///
/// Header and body blocks keep their CRLF framing so retrieval commands can
/// emit them without re-assembly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Article {
    message_id: MessageId,
    headers: Vec<u8>,
    body: Vec<u8>,
}

impl Article {
    /// Assemble an article from unstuffed received lines.
    ///
    /// The lines run up to (not including) the terminating dot. A blank line
    /// separates headers from body; with no blank line the whole block is
    /// headers and the body is empty. The `Message-ID` header must be present
    /// and valid.
    ///
    /// # Errors
    /// Fails on malformed headers or a missing/invalid `Message-ID`.
    pub fn assemble<L: AsRef<[u8]>>(lines: &[L]) -> Result<Self, ArticleError> {
        let (headers, body) = split_blocks(lines)?;
        let view = Headers::parse(&headers)?;
        let raw_id = view.get(header::MESSAGE_ID).ok_or(ArticleError::MissingMessageId)?;
        let message_id = parse_message_id_header(raw_id)?;
        Ok(Article {
            message_id,
            headers,
            body,
        })
    }

    /// Assemble a posted article, generating a `Message-ID` when absent.
    ///
    /// Generated ids take the form `<uuid@host>`; the header is appended to
    /// the stored block so every served copy carries it.
    ///
    /// # Errors
    /// Fails on malformed headers or a present-but-invalid `Message-ID`.
    pub fn assemble_generating_id<L: AsRef<[u8]>>(
        lines: &[L],
        host: &HostName,
    ) -> Result<Self, ArticleError> {
        let (mut headers, body) = split_blocks(lines)?;
        let view = Headers::parse(&headers)?;
        let message_id = match view.get(header::MESSAGE_ID) {
            Some(raw) => parse_message_id_header(raw)?,
            None => {
                let generated = generate_message_id(host)?;
                headers.extend_from_slice(header::MESSAGE_ID.as_bytes());
                headers.extend_from_slice(b": ");
                headers.extend_from_slice(generated.as_str().as_bytes());
                headers.extend_from_slice(b"\r\n");
                generated
            }
        };
        Ok(Article {
            message_id,
            headers,
            body,
        })
    }

    pub fn message_id(&self) -> &MessageId {
        &self.message_id
    }

    /// Validated header view over the stored block
    pub fn headers(&self) -> Headers<'_> {
        // The block was validated at assembly and is immutable afterwards.
        Headers { data: &self.headers }
    }

    /// Groups named by the `Newsgroups` header, syntactically valid ones only.
    ///
    /// # Errors
    /// Fails when the header is absent or names no valid group.
    pub fn newsgroups(&self) -> Result<Vec<GroupName>, ArticleError> {
        let raw = self
            .headers()
            .get(header::NEWSGROUPS)
            .ok_or(ArticleError::MissingNewsgroups)?;
        let text = std::str::from_utf8(raw).map_err(|_| ArticleError::MissingNewsgroups)?;
        let groups: Vec<GroupName> = text
            .split(',')
            .filter_map(|name| GroupName::new(name.trim()).ok())
            .collect();
        if groups.is_empty() {
            return Err(ArticleError::MissingNewsgroups);
        }
        Ok(groups)
    }

    /// Append the dot-stuffed header block to a response buffer
    pub fn write_head(&self, out: &mut Vec<u8>) {
        for line in block_lines(&self.headers) {
            stuff_into(out, line);
        }
    }

    /// Append the dot-stuffed body to a response buffer
    pub fn write_body(&self, out: &mut Vec<u8>) {
        for line in block_lines(&self.body) {
            stuff_into(out, line);
        }
    }

    /// Append the dot-stuffed full article (headers, blank line, body)
    pub fn write_full(&self, out: &mut Vec<u8>) {
        self.write_head(out);
        out.extend_from_slice(b"\r\n");
        self.write_body(out);
    }

    /// Stored size in bytes, headers plus separator plus body
    pub fn size(&self) -> usize {
        self.headers.len() + 2 + self.body.len()
    }
}

/// Iterate the CRLF-terminated lines of a stored block
fn block_lines(block: &[u8]) -> impl Iterator<Item = &[u8]> {
    block
        .split(|&b| b == b'\n')
        .filter_map(|line| line.strip_suffix(b"\r"))
}

/// Split received lines into the header block and the body block
fn split_blocks<L: AsRef<[u8]>>(lines: &[L]) -> Result<(Vec<u8>, Vec<u8>), ArticleError> {
    let mut headers = Vec::new();
    let mut body = Vec::new();
    let mut in_body = false;
    for line in lines {
        let line = line.as_ref();
        if !in_body && line.is_empty() {
            in_body = true;
            continue;
        }
        let target = if in_body { &mut body } else { &mut headers };
        target.extend_from_slice(line);
        target.extend_from_slice(b"\r\n");
    }
    if headers.is_empty() {
        return Err(ArticleError::Empty);
    }
    Ok((headers, body))
}

/// Parse a Message-ID header value into a validated [`MessageId`]
fn parse_message_id_header(raw: &[u8]) -> Result<MessageId, ArticleError> {
    let text = std::str::from_utf8(raw)
        .map_err(|_| ArticleError::InvalidMessageId("not US-ASCII".to_string()))?;
    MessageId::new(text.trim())
        .map_err(|e| ArticleError::InvalidMessageId(e.to_string()))
}

/// Generate a unique message-id scoped to this server's hostname.
///
/// Only fails when the configured hostname pushes the id past the
/// message-id length cap.
fn generate_message_id(host: &HostName) -> Result<MessageId, ArticleError> {
    let id = format!("<{}@{}>", Uuid::new_v4().simple(), host.as_str());
    MessageId::new(id).map_err(|e| ArticleError::InvalidMessageId(e.to_string()))
}
