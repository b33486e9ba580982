//! Domain models for the storefront.
//!
//! Everything here lives in the server-side session; the backend owns the
//! rest.

pub mod session;

pub use session::{AuthToken, CurrentUser, keys as session_keys};
