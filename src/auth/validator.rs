//! Client credential validation

use crate::types::{Password, Username, ValidationError};
use std::collections::HashMap;

/// Validates AUTHINFO credentials against the configured user table
///
/// Built once at startup and shared read-only across sessions. Whether a
/// session must authenticate before restricted commands is a separate
/// question from whether a given credential pair is good: `required()`
/// answers the first, `validate()` the second.
pub struct AuthValidator {
    /// Map of username -> password for O(1) lookups
    users: HashMap<String, String>,
    /// Whether unauthenticated sessions may use the full command set
    allow_anonymous: bool,
}

impl std::fmt::Debug for AuthValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthValidator")
            .field("required", &self.required())
            .field("user_count", &self.users.len())
            .finish_non_exhaustive()
    }
}

impl Default for AuthValidator {
    fn default() -> Self {
        Self {
            users: HashMap::new(),
            allow_anonymous: true,
        }
    }
}

impl AuthValidator {
    /// Create a validator from configured credential pairs
    ///
    /// # Errors
    /// Returns `Err` if any username or password is empty/whitespace.
    /// A blank credential in the config stops the server at startup rather
    /// than silently admitting every client under that entry.
    pub fn with_users(
        user_list: Vec<(String, String)>,
        allow_anonymous: bool,
    ) -> Result<Self, ValidationError> {
        let mut users = HashMap::new();

        for (u, p) in user_list {
            // Validate each credential pair
            let username = Username::new(u)?;
            let password = Password::new(p)?;
            users.insert(username.as_str().to_string(), password.as_str().to_string());
        }

        Ok(Self {
            users,
            allow_anonymous,
        })
    }

    /// Whether sessions must authenticate before restricted commands
    #[inline]
    pub fn required(&self) -> bool {
        !self.allow_anonymous
    }

    /// Whether any credentials are configured
    #[inline]
    pub fn has_users(&self) -> bool {
        !self.users.is_empty()
    }

    /// Validate a credential pair against the user table
    ///
    /// An empty table matches nothing. Whether such a server admits clients
    /// at all is decided by `required()`, checked at config load so that
    /// auth-required-with-no-users never reaches the accept loop.
    pub fn validate(&self, username: &str, password: &str) -> bool {
        self.users
            .get(username)
            .map_or(false, |stored_pass| stored_pass == password)
    }
}
