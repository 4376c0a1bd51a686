//! NNTP response message constants and construction helpers
//!
//! This module provides pre-defined NNTP response messages and helpers
//! for constructing responses according to RFC 3977.

/// Multiline response terminator: "\r\n.\r\n" (RFC 3977)
pub const MULTILINE_TERMINATOR: &[u8] = b"\r\n.\r\n";

/// Line ending: "\r\n"
pub const CRLF: &[u8] = b"\r\n";

/// Minimum response length (3-digit code + CRLF)
pub const MIN_RESPONSE_LENGTH: usize = 5;

// Authentication responses (RFC 4643)

/// Password required response (381)
pub const AUTH_PASSWORD_REQUIRED: &[u8] = b"381 Password required\r\n";

/// Authentication accepted response (281)
pub const AUTH_ACCEPTED: &[u8] = b"281 Authentication accepted\r\n";

/// Authentication failed response (481)
pub const AUTH_FAILED: &[u8] = b"481 Authentication failed\r\n";

/// Authentication required for this command (480)
pub const AUTH_REQUIRED_FOR_COMMAND: &[u8] = b"480 Authentication required\r\n";

/// AUTHINFO PASS sent before AUTHINFO USER (482)
pub const AUTH_OUT_OF_SEQUENCE: &[u8] = b"482 AUTHINFO USER first\r\n";

/// Re-authentication after success is not allowed (502)
pub const AUTH_ALREADY_AUTHENTICATED: &[u8] = b"502 Already authenticated\r\n";

// Standard responses

/// Connection closing response (205)
pub const CONNECTION_CLOSING: &[u8] = b"205 Connection closing\r\n";

/// Continuation prompt for POST (340)
pub const SEND_ARTICLE_POST: &[u8] = b"340 Input article; end with <CR-LF>.<CR-LF>\r\n";

// Error responses

/// Unknown command response (500)
pub const UNKNOWN_COMMAND: &[u8] = b"500 Unknown command\r\n";

/// Command argument syntax error (501)
pub const SYNTAX_ERROR: &[u8] = b"501 Syntax error\r\n";

/// No such newsgroup (411)
pub const NO_SUCH_GROUP: &[u8] = b"411 No such newsgroup\r\n";

/// No newsgroup selected (412)
pub const NO_GROUP_SELECTED: &[u8] = b"412 No newsgroup selected\r\n";

/// No current article selected (420)
pub const NO_CURRENT_ARTICLE: &[u8] = b"420 No current article selected\r\n";

/// No article with that number (423)
pub const NO_SUCH_ARTICLE_NUMBER: &[u8] = b"423 No article with that number\r\n";

/// No article with that message-id (430)
pub const NO_SUCH_ARTICLE_ID: &[u8] = b"430 No article with that message-id\r\n";

/// Posting not permitted (440)
pub const POSTING_NOT_PERMITTED: &[u8] = b"440 Posting not permitted\r\n";

/// Storage could not complete the request (403)
pub const INTERNAL_FAULT: &[u8] = b"403 Internal fault\r\n";

// Response construction helpers

/// Construct a posting-allowed greeting response (200)
///
/// # Examples
/// ```
/// use nntp_server::protocol::greeting;
///
/// let msg = greeting("news.example.com ready");
/// assert_eq!(msg, "200 news.example.com ready\r\n");
/// ```
#[inline]
pub fn greeting(message: &str) -> String {
    format!("200 {}\r\n", message)
}

/// Construct a no-posting greeting response (201)
#[inline]
pub fn greeting_readonly(message: &str) -> String {
    format!("201 {}\r\n", message)
}

/// Construct a response with the given status code and message
///
/// # Examples
/// ```
/// use nntp_server::protocol::response;
///
/// let msg = response(430, "No such article");
/// assert_eq!(msg, "430 No such article\r\n");
/// ```
#[inline]
pub fn response(code: u16, message: &str) -> String {
    format!("{} {}\r\n", code, message)
}
