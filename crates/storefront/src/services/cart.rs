//! Cart service.
//!
//! The backend stores `(productId, qty)` pairs; this service fetches and
//! updates them, joins them with the catalog for display, and remembers the
//! last entries it saw in the session. The add-to-cart gate runs against
//! those remembered entries, so a refused add never reaches the backend.

use tower_sessions::Session;
use tracing::instrument;

use qkart_core::{
    AddToCartRejection, CartEntry, CartItem, Notification, ProductId, check_add_to_cart,
    generate_cart_items,
};

use crate::api::{ApiError, QkartClient};
use crate::middleware::Authenticated;
use crate::models::session_keys;

/// Shown when the cart cannot be loaded for any reason other than a 400.
pub const CART_UNREACHABLE: &str = "Could not fetch cart details. Check that the backend is running, reachable and returns valid JSON.";

/// Shown when an upsert fails for any reason other than a 400.
pub const CART_UPDATE_FAILED: &str = "Could not add product to cart";

/// Shown after a product is added.
pub const ITEM_ADDED: &str = "Item added to cart";

/// Shown after a quantity change.
pub const CART_UPDATED: &str = "Cart updated";

/// Result of a cart operation: the rows to render plus an optional toast.
#[derive(Debug, Clone, Default)]
pub struct CartOutcome {
    pub items: Vec<CartItem>,
    pub notification: Option<Notification>,
}

impl CartOutcome {
    fn new(items: Vec<CartItem>, notification: Option<Notification>) -> Self {
        Self {
            items,
            notification,
        }
    }
}

/// Cart operations for one request.
pub struct CartService<'a> {
    client: &'a QkartClient,
    session: &'a Session,
}

impl<'a> CartService<'a> {
    /// Create a new cart service.
    #[must_use]
    pub const fn new(client: &'a QkartClient, session: &'a Session) -> Self {
        Self { client, session }
    }

    /// Fetch the user's cart and join it with the catalog.
    ///
    /// Never fails: a backend error yields an empty cart and an error toast
    /// (the backend's message for a 400, the reachability message otherwise).
    #[instrument(skip(self, auth), fields(username = %auth.user.username))]
    pub async fn fetch(&self, auth: &Authenticated) -> CartOutcome {
        let entries = match self.client.get_cart(&auth.token).await {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!("Failed to fetch cart: {e}");
                self.store_entries(&[]).await;
                return CartOutcome::new(
                    Vec::new(),
                    Some(Notification::error(e.user_message(CART_UNREACHABLE))),
                );
            }
        };

        self.store_entries(&entries).await;

        match self.join(&entries).await {
            Ok(items) => CartOutcome::new(items, None),
            Err(e) => {
                tracing::warn!("Failed to fetch catalog for cart: {e}");
                CartOutcome::new(Vec::new(), Some(Notification::error(CART_UNREACHABLE)))
            }
        }
    }

    /// Add one unit of a product to the cart.
    ///
    /// Refused without any backend call when logged out or when the product
    /// is already in the last known cart.
    #[instrument(skip(self, auth), fields(product_id = %product_id))]
    pub async fn add(&self, auth: Option<&Authenticated>, product_id: &ProductId) -> CartOutcome {
        let entries = self.stored_entries().await;

        if let Err(rejection) = check_add_to_cart(auth.is_some(), &entries, product_id) {
            tracing::debug!(?rejection, "Add to cart refused");
            let items = match rejection {
                AddToCartRejection::LoginRequired => Vec::new(),
                AddToCartRejection::AlreadyInCart => {
                    self.join(&entries).await.unwrap_or_default()
                }
            };
            return CartOutcome::new(items, Some(Notification::warning(rejection.to_string())));
        }

        let Some(auth) = auth else {
            return CartOutcome::default();
        };

        self.upsert(auth, product_id, 1, ITEM_ADDED, &entries).await
    }

    /// Set the quantity of a product (0 removes it).
    ///
    /// No duplicate check: this backs the cart's +/- controls.
    #[instrument(skip(self, auth), fields(product_id = %product_id))]
    pub async fn set_quantity(
        &self,
        auth: &Authenticated,
        product_id: &ProductId,
        qty: u32,
    ) -> CartOutcome {
        let entries = self.stored_entries().await;
        self.upsert(auth, product_id, qty, CART_UPDATED, &entries)
            .await
    }

    /// Forget the last known cart (after an order empties it).
    pub async fn forget(&self) {
        if let Err(e) = self
            .session
            .remove::<Vec<CartEntry>>(session_keys::CART_ENTRIES)
            .await
        {
            tracing::warn!("Failed to forget cart entries: {e}");
        }
    }

    async fn upsert(
        &self,
        auth: &Authenticated,
        product_id: &ProductId,
        qty: u32,
        success: &str,
        previous: &[CartEntry],
    ) -> CartOutcome {
        match self
            .client
            .update_cart(&auth.token, product_id, qty)
            .await
        {
            Ok(entries) => {
                self.store_entries(&entries).await;
                let items = self.join(&entries).await.unwrap_or_default();
                CartOutcome::new(items, Some(Notification::success(success)))
            }
            Err(e) => {
                tracing::warn!("Failed to update cart: {e}");
                let items = self.join(previous).await.unwrap_or_default();
                CartOutcome::new(
                    items,
                    Some(Notification::warning(e.user_message(CART_UPDATE_FAILED))),
                )
            }
        }
    }

    async fn join(&self, entries: &[CartEntry]) -> Result<Vec<CartItem>, ApiError> {
        if entries.is_empty() {
            return Ok(Vec::new());
        }

        let catalog = self.client.get_products().await?;
        let mut items = generate_cart_items(entries, &catalog);

        // The cached catalog may predate a product the backend now carries
        if items.len() != entries.len() {
            self.client.invalidate_catalog().await;
            let catalog = self.client.get_products().await?;
            items = generate_cart_items(entries, &catalog);
        }

        if items.len() != entries.len() {
            tracing::warn!(
                entries = entries.len(),
                items = items.len(),
                "Dropped cart entries missing from the catalog"
            );
        }

        Ok(items)
    }

    async fn stored_entries(&self) -> Vec<CartEntry> {
        self.session
            .get::<Vec<CartEntry>>(session_keys::CART_ENTRIES)
            .await
            .ok()
            .flatten()
            .unwrap_or_default()
    }

    async fn store_entries(&self, entries: &[CartEntry]) {
        if let Err(e) = self
            .session
            .insert(session_keys::CART_ENTRIES, entries)
            .await
        {
            tracing::warn!("Failed to remember cart entries: {e}");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use qkart_core::{Price, Severity};
    use tower_sessions::MemoryStore;
    use url::Url;

    use super::*;
    use crate::config::ApiConfig;
    use crate::models::{AuthToken, CurrentUser};

    fn unreachable_client() -> QkartClient {
        QkartClient::new(&ApiConfig {
            endpoint: Url::parse("http://127.0.0.1:9/").unwrap(),
            timeout: Duration::from_millis(200),
            catalog_ttl: Duration::from_secs(60),
        })
        .unwrap()
    }

    fn session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    fn auth() -> Authenticated {
        Authenticated {
            token: AuthToken::new("tok"),
            user: CurrentUser {
                username: "crio-user".to_string(),
                balance: Price::from_units(5000),
            },
        }
    }

    #[tokio::test]
    async fn test_add_logged_out_is_refused() {
        let client = unreachable_client();
        let session = session();
        let outcome = CartService::new(&client, &session)
            .add(None, &ProductId::new("p1"))
            .await;

        let notification = outcome.notification.unwrap();
        assert_eq!(notification.severity, Severity::Warning);
        assert_eq!(notification.message, "Login to add an item to the Cart");
        assert!(outcome.items.is_empty());
    }

    #[tokio::test]
    async fn test_add_duplicate_is_refused_before_upsert() {
        let client = unreachable_client();
        let session = session();
        session
            .insert(
                session_keys::CART_ENTRIES,
                vec![CartEntry::new(ProductId::new("p1"), 1)],
            )
            .await
            .unwrap();

        let outcome = CartService::new(&client, &session)
            .add(Some(&auth()), &ProductId::new("p1"))
            .await;

        let notification = outcome.notification.unwrap();
        assert_eq!(notification.severity, Severity::Warning);
        assert_eq!(
            notification.message,
            AddToCartRejection::AlreadyInCart.to_string()
        );
    }

    #[tokio::test]
    async fn test_fetch_failure_yields_empty_cart() {
        let client = unreachable_client();
        let session = session();
        let outcome = CartService::new(&client, &session).fetch(&auth()).await;

        assert!(outcome.items.is_empty());
        let notification = outcome.notification.unwrap();
        assert_eq!(notification.severity, Severity::Error);
        assert_eq!(notification.message, CART_UNREACHABLE);
    }

    #[tokio::test]
    async fn test_upsert_failure_keeps_warning_fallback() {
        let client = unreachable_client();
        let session = session();
        let outcome = CartService::new(&client, &session)
            .set_quantity(&auth(), &ProductId::new("p1"), 2)
            .await;

        let notification = outcome.notification.unwrap();
        assert_eq!(notification.severity, Severity::Warning);
        assert_eq!(notification.message, CART_UPDATE_FAILED);
    }
}
