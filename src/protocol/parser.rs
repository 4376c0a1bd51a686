//! NNTP command-line parsing per RFC 3977
//!
//! Dispatch works on the command keyword alone; this module splits a raw
//! line into keyword and argument tail, and provides typed nom parsers for
//! the argument grammars handlers share (article specs, dates, tokens).
//!
//! Per [RFC 3977 §3.1](https://datatracker.ietf.org/doc/html/rfc3977#section-3.1):
//! - Commands consist of a keyword, optional arguments separated by spaces/tabs
//! - Command lines MUST NOT exceed 512 octets (including CRLF)
//! - Keywords are case-insensitive

use memchr::memchr2;
use nom::{
    branch::alt,
    bytes::complete::{tag_no_case, take_until},
    character::complete::{char, digit1, space0},
    combinator::{map, map_res, opt},
    sequence::{delimited, preceded},
    IResult, Parser,
};
use thiserror::Error;

use crate::types::MessageId;

/// Errors splitting a raw line into keyword and arguments
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("empty command line")]
    Empty,

    #[error("command line is not printable US-ASCII")]
    NotAscii,
}

/// A command line split into its dispatch keyword and argument tail
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine<'a> {
    /// Keyword, uppercased for case-insensitive dispatch
    pub keyword: String,
    /// Argument tail with surrounding whitespace removed; empty if none
    pub args: &'a str,
}

/// Split a raw command line (CRLF already stripped) for dispatch.
///
/// # Examples
/// ```
/// use nntp_server::protocol::parse_command_line;
///
/// let line = parse_command_line(b"article <id@example.com>").unwrap();
/// assert_eq!(line.keyword, "ARTICLE");
/// assert_eq!(line.args, "<id@example.com>");
/// ```
///
/// # Errors
/// Fails on an empty line or one containing non-ASCII / control octets;
/// the session answers such lines with a 500 response.
pub fn parse_command_line(line: &[u8]) -> Result<CommandLine<'_>, ParseError> {
    let text = std::str::from_utf8(line).map_err(|_| ParseError::NotAscii)?;
    if !text.bytes().all(|b| (0x20..0x7f).contains(&b) || b == b'\t') {
        return Err(ParseError::NotAscii);
    }
    let trimmed = text.trim_matches([' ', '\t']);
    if trimmed.is_empty() {
        return Err(ParseError::Empty);
    }

    let bytes = trimmed.as_bytes();
    let split = memchr2(b' ', b'\t', bytes).unwrap_or(bytes.len());
    let keyword = trimmed[..split].to_ascii_uppercase();
    let args = trimmed[split..].trim_matches([' ', '\t']);
    Ok(CommandLine { keyword, args })
}

/// Article specifier accepted by ARTICLE, HEAD, BODY and STAT
///
/// RFC 3977 §6.2.1 defines three forms:
/// - `ARTICLE <message-id>` — retrieval by message-id, group-independent
/// - `ARTICLE 3000234` — retrieval by number in the selected group
/// - `ARTICLE` — the currently selected article
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArticleSpec {
    /// Article by message-id (e.g. `<123@example.com>`)
    ByMessageId(MessageId),
    /// Article by number in the currently selected group (stateful)
    ByNumber(u64),
    /// Current article (no argument provided)
    Current,
}

/// Parse a message-id argument (RFC 3977 §3.6)
///
/// The angle-bracketed token is validated through [`MessageId`], which
/// enforces the length cap and octet rules.
fn message_id(input: &str) -> IResult<&str, MessageId> {
    let (input, interior) = delimited(char('<'), take_until(">"), char('>')).parse(input)?;

    let full = format!("<{}>", interior);
    match MessageId::new(full) {
        Ok(id) => Ok((input, id)),
        Err(_) => Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Verify,
        ))),
    }
}

/// Parse an article number (RFC 3977 §6: 1–16 digits, leading zeroes allowed)
fn article_number(input: &str) -> IResult<&str, u64> {
    map_res(digit1, |s: &str| s.parse::<u64>()).parse(input)
}

/// Parse the argument tail of an article retrieval command.
///
/// An empty tail selects the current article.
pub fn parse_article_spec(args: &str) -> Result<ArticleSpec, ParseError> {
    let trimmed = args.trim();
    if trimmed.is_empty() {
        return Ok(ArticleSpec::Current);
    }
    let spec = alt((
        map(message_id, ArticleSpec::ByMessageId),
        map(article_number, ArticleSpec::ByNumber),
    ))
    .parse(trimmed);
    match spec {
        Ok(("", spec)) => Ok(spec),
        _ => Err(ParseError::Empty),
    }
}

/// Parsed `date time [GMT]` argument pair used by NEWNEWS and NEWGROUPS
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NntpDateTime {
    /// Seconds since the unix epoch, interpreted as UTC
    pub unix_secs: u64,
}

/// Parse the trailing `date time [GMT]` of NEWNEWS/NEWGROUPS (RFC 3977 §7.3.2).
///
/// Dates are `yymmdd` or `yyyymmdd`; times are `hhmmss`. Two-digit years map
/// 00–69 to 2000–2069 and 70–99 to 1970–1999 so every date stays
/// unix-representable.
pub fn parse_date_time(date: &str, time: &str) -> Option<NntpDateTime> {
    if !date.bytes().all(|b| b.is_ascii_digit()) || !time.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let (year, rest) = match date.len() {
        6 => {
            let yy: i64 = date[..2].parse().ok()?;
            let year = if yy <= 69 { 2000 + yy } else { 1900 + yy };
            (year, &date[2..])
        }
        8 => (date[..4].parse().ok()?, &date[4..]),
        _ => return None,
    };
    let month: u32 = rest[..2].parse().ok()?;
    let day: u32 = rest[2..].parse().ok()?;
    if time.len() != 6 {
        return None;
    }
    let hour: u64 = time[..2].parse().ok()?;
    let minute: u64 = time[2..4].parse().ok()?;
    let second: u64 = time[4..].parse().ok()?;
    if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
        return None;
    }
    if hour > 23 || minute > 59 || second > 59 {
        return None;
    }

    let days = days_from_civil(year, month, day);
    if days < 0 {
        return None;
    }
    let unix_secs = (days as u64) * 86_400 + hour * 3_600 + minute * 60 + second;
    Some(NntpDateTime { unix_secs })
}

/// Current time in whole seconds since the unix epoch
#[must_use]
pub fn now_unix_secs() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map_or(0, |d| d.as_secs())
}

/// Format a unix timestamp as the DATE response payload, `yyyymmddhhmmss`
/// (RFC 3977 §7.1).
#[must_use]
pub fn format_date_time(unix_secs: u64) -> String {
    let days = (unix_secs / 86_400) as i64;
    let secs_of_day = unix_secs % 86_400;
    let (year, month, day) = civil_from_days(days);
    format!(
        "{:04}{:02}{:02}{:02}{:02}{:02}",
        year,
        month,
        day,
        secs_of_day / 3_600,
        (secs_of_day / 60) % 60,
        secs_of_day % 60
    )
}

/// Days from the unix epoch for a proleptic Gregorian civil date
fn days_from_civil(year: i64, month: u32, day: u32) -> i64 {
    let y = if month <= 2 { year - 1 } else { year };
    let era = if y >= 0 { y } else { y - 399 } / 400;
    let yoe = y - era * 400;
    let mp = i64::from((month + 9) % 12);
    let doy = (153 * mp + 2) / 5 + i64::from(day) - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
    era * 146_097 + doe - 719_468
}

/// Civil date for a day count from the unix epoch; inverse of [`days_from_civil`]
fn civil_from_days(days: i64) -> (i64, u32, u32) {
    let z = days + 719_468;
    let era = if z >= 0 { z } else { z - 146_096 } / 146_097;
    let doe = z - era * 146_097;
    let yoe = (doe - doe / 1_460 + doe / 36_524 - doe / 146_096) / 365;
    let y = yoe + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let month = if mp < 10 { mp + 3 } else { mp - 9 } as u32;
    (if month <= 2 { y + 1 } else { y }, month, day)
}

/// Parse an optional trailing `GMT` token (RFC 3977 treats both forms as UTC)
pub fn parse_gmt_token(input: &str) -> bool {
    let trimmed = input.trim();
    trimmed.is_empty()
        || opt(preceded(
            space0::<&str, nom::error::Error<&str>>,
            tag_no_case("GMT"),
        ))
            .parse(trimmed)
            .map(|(rest, _)| rest.trim().is_empty())
            .unwrap_or(false)
}

/// Split whitespace-separated argument tokens, collapsing repeated separators
pub fn split_args(args: &str) -> Vec<&str> {
    args.split([' ', '\t']).filter(|s| !s.is_empty()).collect()
}

// Dot-stuffing (RFC 3977 §3.1.1): in multi-line blocks a line starting with
// "." is sent with the dot doubled, and a lone "." terminates the block.

/// True if a received continuation line (CRLF stripped) terminates the block
#[must_use]
#[inline]
pub fn is_dot_terminator(line: &[u8]) -> bool {
    line == b"."
}

/// Remove dot-stuffing from a received continuation line
#[must_use]
#[inline]
pub fn unstuff_line(line: &[u8]) -> &[u8] {
    if line.starts_with(b"..") {
        &line[1..]
    } else {
        line
    }
}

/// Append a line to an outgoing multi-line block, dot-stuffed, CRLF-terminated
pub fn stuff_into(out: &mut Vec<u8>, line: &[u8]) {
    if line.starts_with(b".") {
        out.push(b'.');
    }
    out.extend_from_slice(line);
    out.extend_from_slice(b"\r\n");
}

/// Append the multi-line block terminator
#[inline]
pub fn write_terminator(out: &mut Vec<u8>) {
    out.extend_from_slice(b".\r\n");
}

/// Strip one trailing CRLF (or bare LF) from a read line
#[must_use]
pub fn strip_line_ending(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}
