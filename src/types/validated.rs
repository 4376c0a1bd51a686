//! Validated string types that enforce invariants at construction time

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Validation errors for string types
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum ValidationError {
    #[error("hostname cannot be empty or whitespace")]
    EmptyHostName,

    #[error("peer name cannot be empty or whitespace")]
    EmptyPeerName,

    #[error("invalid newsgroup name: {0}")]
    InvalidGroupName(String),

    #[error("port cannot be 0")]
    InvalidPort,

    #[error("invalid message ID: {0}")]
    InvalidMessageId(String),

    #[error("username cannot be empty or whitespace")]
    EmptyUsername,

    #[error("password cannot be empty or whitespace")]
    EmptyPassword,
}

/// Macro to generate validated string newtypes.
///
/// This macro eliminates boilerplate by generating all the standard implementations
/// for validated string types. Each type gets:
/// - A `new()` constructor that validates
/// - `as_str()` getter
/// - `AsRef<str>`, `Deref`, `Display`, `TryFrom<String>` impls
/// - Serde `Serialize` and `Deserialize` with validation
macro_rules! validated_string {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident(String) {
            validation: |$s_param:ident| $validation:expr,
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
        #[serde(transparent)]
        $vis struct $name(String);

        impl $name {
            #[doc = concat!("Create a new ", stringify!($name), " after validation")]
            pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
                let $s_param = value.into();
                let validate = || $validation;
                validate()?;
                Ok(Self($s_param))
            }

            #[doc = concat!("Get the ", stringify!($name), " as a string slice")]
            #[must_use]
            #[inline]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl AsRef<str> for $name {
            #[inline]
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl std::ops::Deref for $name {
            type Target = str;

            #[inline]
            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValidationError;

            fn try_from($s_param: String) -> Result<Self, Self::Error> {
                Self::new($s_param)
            }
        }

        impl TryFrom<&str> for $name {
            type Error = ValidationError;

            fn try_from($s_param: &str) -> Result<Self, Self::Error> {
                Self::new($s_param.to_string())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let s = String::deserialize(deserializer)?;
                Self::new(s).map_err(serde::de::Error::custom)
            }
        }
    };
}

// Now use the macro to generate the types

validated_string! {
    /// A validated hostname that cannot be empty or whitespace-only
    ///
    /// This type enforces at construction time that a hostname is always
    /// present, eliminating the need for runtime validation checks.
    ///
    /// # Examples
    /// ```
    /// use nntp_server::types::HostName;
    ///
    /// let host = HostName::new("news.example.com".to_string()).unwrap();
    /// assert_eq!(host.as_str(), "news.example.com");
    ///
    /// // Empty strings are rejected
    /// assert!(HostName::new("".to_string()).is_err());
    /// assert!(HostName::new("   ".to_string()).is_err());
    /// ```
    #[doc(alias = "host")]
    #[doc(alias = "domain")]
    pub struct HostName(String) {
        validation: |s| {
            if s.trim().is_empty() {
                Err(ValidationError::EmptyHostName)
            } else {
                Ok(())
            }
        },
    }
}

validated_string! {
    /// A validated peer subscription name that cannot be empty or whitespace-only
    pub struct PeerName(String) {
        validation: |s| {
            if s.trim().is_empty() {
                Err(ValidationError::EmptyPeerName)
            } else {
                Ok(())
            }
        },
    }
}

validated_string! {
    /// A validated newsgroup name
    ///
    /// Newsgroup names are non-empty, printable ASCII, contain no whitespace,
    /// never start with a dot, and exclude the wildmat metacharacters
    /// (`*`, `?`, `!`, `,`) so a group name can never be mistaken for a
    /// pattern.
    ///
    /// # Examples
    /// ```
    /// use nntp_server::types::GroupName;
    ///
    /// let group = GroupName::new("comp.lang.rust".to_string()).unwrap();
    /// assert_eq!(group.as_str(), "comp.lang.rust");
    ///
    /// assert!(GroupName::new("has space".to_string()).is_err());
    /// assert!(GroupName::new("wild.*".to_string()).is_err());
    /// ```
    pub struct GroupName(String) {
        validation: |s| {
            let ok = !s.is_empty()
                && !s.starts_with('.')
                && s.bytes().all(|b| {
                    b.is_ascii_graphic() && !matches!(b, b'*' | b'?' | b'!' | b',')
                });
            if ok {
                Ok(())
            } else {
                Err(ValidationError::InvalidGroupName(s.clone()))
            }
        },
    }
}

validated_string! {
    /// A validated article message-id
    ///
    /// Message-ids follow RFC 3977 §3.6: wrapped in angle brackets, at most
    /// 250 octets, printable ASCII with no whitespace, no interior angle
    /// brackets, and exactly one `@` separating the unique part from the
    /// originating host.
    ///
    /// # Examples
    /// ```
    /// use nntp_server::types::MessageId;
    ///
    /// let id = MessageId::new("<abc123@news.example.com>".to_string()).unwrap();
    /// assert_eq!(id.as_str(), "<abc123@news.example.com>");
    ///
    /// assert!(MessageId::new("missing-brackets@example.com".to_string()).is_err());
    /// assert!(MessageId::new("<no-at-sign>".to_string()).is_err());
    /// ```
    pub struct MessageId(String) {
        validation: |s| {
            if MessageId::is_valid(&s) {
                Ok(())
            } else {
                Err(ValidationError::InvalidMessageId(s.clone()))
            }
        },
    }
}

validated_string! {
    /// A validated login name that cannot be empty or whitespace-only.
    ///
    /// Rejecting empty credentials at construction keeps a blank config
    /// entry from silently disabling authentication.
    pub struct Username(String) {
        validation: |s| {
            if s.trim().is_empty() {
                Err(ValidationError::EmptyUsername)
            } else {
                Ok(())
            }
        },
    }
}

validated_string! {
    /// A validated password that cannot be empty or whitespace-only
    pub struct Password(String) {
        validation: |s| {
            if s.trim().is_empty() {
                Err(ValidationError::EmptyPassword)
            } else {
                Ok(())
            }
        },
    }
}

impl MessageId {
    /// Maximum message-id length in octets (RFC 3977 §3.6)
    pub const MAX_LEN: usize = 250;

    /// Check whether a string is a syntactically valid message-id
    #[must_use]
    pub fn is_valid(s: &str) -> bool {
        let bytes = s.as_bytes();
        if bytes.len() < 5 || bytes.len() > Self::MAX_LEN {
            return false;
        }
        if bytes[0] != b'<' || bytes[bytes.len() - 1] != b'>' {
            return false;
        }
        let interior = &bytes[1..bytes.len() - 1];
        let mut at_signs = 0usize;
        for &b in interior {
            match b {
                b'@' => at_signs += 1,
                b'<' | b'>' => return false,
                b if !b.is_ascii_graphic() => return false,
                _ => {}
            }
        }
        // local part and host part must both be non-empty
        at_signs == 1 && interior.first() != Some(&b'@') && interior.last() != Some(&b'@')
    }
}
