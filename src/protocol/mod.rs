//! NNTP protocol handling module
//!
//! Wire-level building blocks shared by the session layer, the command
//! handlers, and the feeders: status codes, canonical responses, command
//! and argument parsing, article framing, and wildmat matching.

pub mod article;
pub mod codes;
pub mod parser;
pub mod responses;
pub mod wildmat;

pub use article::{Article, ArticleError, Headers};
pub use parser::{
    format_date_time, is_dot_terminator, now_unix_secs, parse_article_spec, parse_command_line,
    parse_date_time, parse_gmt_token, split_args, strip_line_ending, stuff_into, unstuff_line,
    write_terminator, ArticleSpec, CommandLine, NntpDateTime, ParseError,
};
pub use responses::{greeting, greeting_readonly, response};
pub use wildmat::{Wildmat, WildmatError};
