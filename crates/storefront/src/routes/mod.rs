//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! # Products
//! GET  /                       - Product grid, search bar, cart sidebar when logged in
//! GET  /search?q=              - Search results page (no-JS fallback)
//! GET  /search/live?q=         - Debounced grid fragment (HTMX, 204 when superseded)
//!
//! # Cart (HTMX fragments)
//! GET  /cart                   - Cart sidebar fragment
//! POST /cart/add               - Add to cart
//! POST /cart/update            - Set quantity (0 removes)
//!
//! # Checkout (requires login)
//! GET  /checkout               - Checkout page
//! POST /checkout               - Place order
//! POST /checkout/addresses     - Add address
//! POST /checkout/addresses/{id}/delete - Delete address
//! GET  /thanks                 - Order confirmation
//!
//! # Auth
//! GET  /login                  - Login page
//! POST /login                  - Login action
//! GET  /register               - Register page
//! POST /register               - Register action
//! POST /logout                 - Logout action
//! ```

pub mod auth;
pub mod cart;
pub mod checkout;
pub mod products;
pub mod search;

use axum::{
    Router,
    http::Uri,
    routing::{get, post},
};
use tower_sessions::Session;

use qkart_core::Notification;

use crate::error::AppError;
use crate::middleware::Authenticated;
use crate::notifications;
use crate::state::AppState;

/// Shown when a backend call fails and the backend gave no reason.
pub const BACKEND_UNREACHABLE: &str =
    "Something went wrong. Check that the backend is running, reachable and returns valid JSON.";

/// Data every full page needs for the header and toasts.
#[derive(Debug, Clone, Default)]
pub struct PageContext {
    pub username: Option<String>,
    pub balance: Option<String>,
    pub notifications: Vec<Notification>,
}

impl PageContext {
    /// Build the page context, draining queued notifications.
    pub async fn load(session: &Session, auth: Option<&Authenticated>) -> Self {
        Self {
            username: auth.map(|a| a.user.username.clone()),
            balance: auth.map(|a| a.user.balance.to_string()),
            notifications: notifications::take(session).await,
        }
    }

    /// Add a notification produced while rendering this page.
    pub fn notify(&mut self, notification: Notification) {
        self.notifications.push(notification);
    }
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
}

/// Create the checkout routes router.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(checkout::show).post(checkout::place_order))
        .route("/addresses", post(checkout::add_address))
        .route("/addresses/{id}/delete", post(checkout::delete_address))
}

/// Create the search routes router.
pub fn search_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(search::search_page))
        .route("/live", get(search::live))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .nest("/search", search_routes())
        .nest("/cart", cart_routes())
        .nest("/checkout", checkout_routes())
        .route("/thanks", get(checkout::thanks))
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/register", get(auth::register_page).post(auth::register))
        .route("/logout", post(auth::logout))
        .fallback(not_found)
}

/// Fallback for unknown paths.
async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(uri.path().to_string())
}
