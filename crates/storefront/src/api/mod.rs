//! QKart backend REST client.
//!
//! # Architecture
//!
//! - The backend is the source of truth - NO local sync, direct API calls
//! - JSON over HTTP(S), bearer-token auth on `/cart` and `/user` routes
//! - In-memory caching via `moka` for the product catalog only
//! - No retries; failures bubble up as [`ApiError`] and the route layer turns
//!   them into notifications
//!
//! # Example
//!
//! ```rust,ignore
//! use qkart_storefront::api::QkartClient;
//!
//! let client = QkartClient::new(&config.api)?;
//!
//! let catalog = client.get_products().await?;
//! let entries = client.update_cart(&token, &catalog[0].id, 1).await?;
//! ```

mod client;
pub mod types;

pub use client::QkartClient;
pub use types::*;

use thiserror::Error;

/// Errors that can occur when talking to the QKart backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced a response (connection refused, timeout, ...).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("Backend returned {status}: {}", .message.as_deref().unwrap_or("(no message)"))]
    Status {
        /// HTTP status code.
        status: u16,
        /// The `message` field of the error body, if there was one.
        message: Option<String>,
    },

    /// A success status whose body said `"success": false`.
    #[error("Backend refused: {}", .message.as_deref().unwrap_or("(no message)"))]
    Rejected {
        /// The `message` field of the body, if there was one.
        message: Option<String>,
    },

    /// A success response did not match the expected shape.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The configured endpoint could not be joined with a request path.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

impl ApiError {
    /// HTTP status of a `Status` error.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The backend's own explanation, if it sent one.
    #[must_use]
    pub fn backend_message(&self) -> Option<&str> {
        match self {
            Self::Status { message, .. } | Self::Rejected { message } => message.as_deref(),
            _ => None,
        }
    }

    /// A 400 with a message: the backend rejected the input and said why.
    #[must_use]
    pub fn is_bad_request(&self) -> bool {
        self.status() == Some(400) && self.backend_message().is_some()
    }

    /// Message to show the user: the backend's message on a 400 or an
    /// explicit refusal, else `fallback`.
    #[must_use]
    pub fn user_message<'a>(&'a self, fallback: &'a str) -> &'a str {
        if self.is_bad_request() || matches!(self, Self::Rejected { .. }) {
            self.backend_message().unwrap_or(fallback)
        } else {
            fallback
        }
    }
}

/// Extract the `message` field from an error body.
///
/// Returns `None` for empty, non-JSON, or message-less bodies.
pub(crate) fn error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get("message")
        .and_then(serde_json::Value::as_str)
        .map(str::to_owned)
}
