//! Wildmat pattern matching per RFC 3977 §4
//!
//! Used by NEWNEWS and by peer group filters. A wildmat is a comma-separated
//! list of glob patterns (`*` any run, `?` any one character), each
//! optionally negated with a leading `!`. Patterns are examined left to
//! right and the last one that matches decides the outcome; a negated
//! deciding pattern excludes the name.

use thiserror::Error;

use crate::types::GroupName;

/// Errors compiling a wildmat expression
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WildmatError {
    #[error("empty wildmat")]
    Empty,

    #[error("empty wildmat element")]
    EmptyElement,

    #[error("wildmat is not printable US-ASCII")]
    NotAscii,
}

/// A compiled wildmat expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wildmat {
    elements: Vec<Element>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Element {
    negated: bool,
    pattern: String,
}

impl Wildmat {
    /// Compile a wildmat expression.
    ///
    /// # Errors
    /// Fails on an empty expression, an empty element (`a,,b` or a bare
    /// `!`), or non-ASCII input.
    pub fn parse(text: &str) -> Result<Self, WildmatError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(WildmatError::Empty);
        }
        if !text.bytes().all(|b| (0x21..0x7f).contains(&b)) {
            return Err(WildmatError::NotAscii);
        }

        let mut elements = Vec::new();
        for part in text.split(',') {
            let (negated, pattern) = match part.strip_prefix('!') {
                Some(rest) => (true, rest),
                None => (false, part),
            };
            if pattern.is_empty() {
                return Err(WildmatError::EmptyElement);
            }
            elements.push(Element {
                negated,
                pattern: pattern.to_string(),
            });
        }
        Ok(Wildmat { elements })
    }

    /// The match-everything expression, `*`
    pub fn match_all() -> Self {
        Wildmat {
            elements: vec![Element {
                negated: false,
                pattern: "*".to_string(),
            }],
        }
    }

    /// True if `name` is selected by this expression.
    ///
    /// The last element that matches decides; no match means not selected.
    pub fn matches(&self, name: &str) -> bool {
        let mut selected = false;
        for element in &self.elements {
            if glob_match(element.pattern.as_bytes(), name.as_bytes()) {
                selected = !element.negated;
            }
        }
        selected
    }

    pub fn matches_group(&self, group: &GroupName) -> bool {
        self.matches(group.as_str())
    }
}

impl std::fmt::Display for Wildmat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, element) in self.elements.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            if element.negated {
                f.write_str("!")?;
            }
            f.write_str(&element.pattern)?;
        }
        Ok(())
    }
}

impl TryFrom<&str> for Wildmat {
    type Error = WildmatError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Wildmat::parse(value)
    }
}

/// Glob match with iterative `*` backtracking; `?` matches exactly one byte
fn glob_match(pattern: &[u8], text: &[u8]) -> bool {
    let mut p = 0;
    let mut t = 0;
    let mut star: Option<(usize, usize)> = None;

    while t < text.len() {
        if p < pattern.len() && (pattern[p] == b'?' || pattern[p] == text[t]) {
            p += 1;
            t += 1;
        } else if p < pattern.len() && pattern[p] == b'*' {
            star = Some((p, t));
            p += 1;
        } else if let Some((star_p, star_t)) = star {
            // Let the last star absorb one more byte and retry.
            p = star_p + 1;
            t = star_t + 1;
            star = Some((star_p, star_t + 1));
        } else {
            return false;
        }
    }
    while p < pattern.len() && pattern[p] == b'*' {
        p += 1;
    }
    p == pattern.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal() {
        let w = Wildmat::parse("misc.test").unwrap();
        assert!(w.matches("misc.test"));
        assert!(!w.matches("misc.tests"));
        assert!(!w.matches("misc.tes"));
    }

    #[test]
    fn test_star() {
        let w = Wildmat::parse("comp.*").unwrap();
        assert!(w.matches("comp.lang.rust"));
        assert!(w.matches("comp."));
        assert!(!w.matches("comp"));
        assert!(!w.matches("alt.comp.x"));
    }

    #[test]
    fn test_star_middle() {
        let w = Wildmat::parse("comp.*.announce").unwrap();
        assert!(w.matches("comp.lang.announce"));
        assert!(w.matches("comp.lang.rust.announce"));
        assert!(!w.matches("comp.announce"));
    }

    #[test]
    fn test_question_mark() {
        let w = Wildmat::parse("a?c").unwrap();
        assert!(w.matches("abc"));
        assert!(w.matches("axc"));
        assert!(!w.matches("ac"));
        assert!(!w.matches("abbc"));
    }

    #[test]
    fn test_match_all() {
        let w = Wildmat::match_all();
        assert!(w.matches("anything.at.all"));
        assert!(w.matches("x"));
    }

    #[test]
    fn test_last_match_wins() {
        // RFC 3977 §4.2 example shape: include a*, carve out ab*, restore abc*
        let w = Wildmat::parse("a*,!ab*,abc*").unwrap();
        assert!(w.matches("apple"));
        assert!(!w.matches("about"));
        assert!(w.matches("abcess"));
        assert!(!w.matches("other"));
    }

    #[test]
    fn test_negation_excludes() {
        let w = Wildmat::parse("comp.*,!comp.*.d").unwrap();
        assert!(w.matches("comp.lang.rust"));
        assert!(!w.matches("comp.lang.rust.d"));
    }

    #[test]
    fn test_negation_only_never_selects() {
        let w = Wildmat::parse("!misc.*").unwrap();
        assert!(!w.matches("misc.test"));
        assert!(!w.matches("comp.lang.rust"));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(Wildmat::parse("").unwrap_err(), WildmatError::Empty);
        assert_eq!(Wildmat::parse("   ").unwrap_err(), WildmatError::Empty);
        assert_eq!(
            Wildmat::parse("a,,b").unwrap_err(),
            WildmatError::EmptyElement
        );
        assert_eq!(Wildmat::parse("a,!").unwrap_err(), WildmatError::EmptyElement);
        assert_eq!(
            Wildmat::parse("caf\u{e9}.*").unwrap_err(),
            WildmatError::NotAscii
        );
    }

    #[test]
    fn test_display_round_trip() {
        for expr in ["*", "comp.*,!comp.*.d", "a*,!ab*,abc*"] {
            let w = Wildmat::parse(expr).unwrap();
            assert_eq!(w.to_string(), expr);
            assert_eq!(Wildmat::parse(&w.to_string()).unwrap(), w);
        }
    }

    #[test]
    fn test_matches_group() {
        let w = Wildmat::parse("misc.*").unwrap();
        let group = GroupName::new("misc.test").unwrap();
        assert!(w.matches_group(&group));
    }

    #[test]
    fn test_star_backtracking() {
        let w = Wildmat::parse("*.test").unwrap();
        assert!(w.matches("a.b.test"));
        assert!(w.matches(".test"));
        assert!(!w.matches("test"));

        let w = Wildmat::parse("*a*a*").unwrap();
        assert!(w.matches("banana"));
        assert!(!w.matches("bnn"));
    }
}
