//! Session-stored models for the storefront.
//!
//! The storefront has no database; what the browser used to keep in local
//! storage lives in the server-side session under the keys in
//! [`session_keys`].

pub mod session;

pub use session::{CurrentUser, keys as session_keys};
