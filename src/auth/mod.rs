//! Authentication module
//!
//! Validates AUTHINFO credentials against the configured user table. The
//! AUTHINFO wire exchange itself lives in the command layer; sessions
//! consult the validator here for the verdict.

mod validator;

pub use validator::AuthValidator;
