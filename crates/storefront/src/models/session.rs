//! Session-related types.
//!
//! Types stored in the session for authentication and per-user UI state.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use qkart_core::Price;

/// Session-stored user identity returned by `POST /auth/login`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    /// Backend username.
    pub username: String,
    /// Wallet balance, decreased locally after each order.
    pub balance: Price,
}

/// Bearer token for the QKart backend.
///
/// Stored as a plain string in the session and wrapped here once read so it
/// never ends up in logs.
#[derive(Clone)]
pub struct AuthToken(SecretString);

impl AuthToken {
    /// Wrap a raw token.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(SecretString::from(token.into()))
    }

    /// The raw token, for the `Authorization` header.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl std::fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AuthToken([REDACTED])")
    }
}

/// Session keys.
pub mod keys {
    /// Key for the backend bearer token.
    pub const TOKEN: &str = "token";

    /// Key for the logged-in user's name and balance.
    pub const CURRENT_USER: &str = "current_user";

    /// Key for the last cart entries the backend returned.
    pub const CART_ENTRIES: &str = "cart_entries";

    /// Key for queued notifications.
    pub const NOTIFICATIONS: &str = "notifications";

    /// Key for the per-session search debounce key.
    pub const SEARCH_KEY: &str = "search_key";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_token_debug_redacts() {
        let token = AuthToken::new("eyJhbGciOiJIUzI1NiJ9.secret");
        assert_eq!(format!("{token:?}"), "AuthToken([REDACTED])");
        assert_eq!(token.expose(), "eyJhbGciOiJIUzI1NiJ9.secret");
    }
}
