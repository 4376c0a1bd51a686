//! Expiring cache module
//!
//! Bounds memory for transient state (feed offer suppression, session
//! scratch data) without explicit cleanup calls on every code path.

mod expiring;

pub use expiring::ExpiringCache;
