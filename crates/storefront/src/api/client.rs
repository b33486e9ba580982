//! QKart backend client implementation.
//!
//! Uses `reqwest` for HTTP and caches the product catalog using `moka`.

use std::sync::Arc;

use moka::future::Cache;
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use qkart_core::{Address, AddressId, CartEntry, Product, ProductId};

use super::types::{Ack, CartUpsert, CheckoutRequest, Credentials, LoginResponse, NewAddress};
use super::{ApiError, error_message};
use crate::config::ApiConfig;
use crate::models::AuthToken;

const CATALOG_KEY: &str = "catalog";

// =============================================================================
// QkartClient
// =============================================================================

/// Client for the QKart REST API.
///
/// Cheap to clone; all clones share the connection pool and catalog cache.
#[derive(Clone)]
pub struct QkartClient {
    inner: Arc<QkartClientInner>,
}

struct QkartClientInner {
    client: reqwest::Client,
    endpoint: Url,
    catalog: Cache<&'static str, Arc<Vec<Product>>>,
}

impl QkartClient {
    /// Create a new backend client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built (e.g., TLS backend
    /// initialization failure).
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("qkart-storefront/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let catalog = Cache::builder()
            .max_capacity(1)
            .time_to_live(config.catalog_ttl)
            .build();

        Ok(Self {
            inner: Arc::new(QkartClientInner {
                client,
                endpoint: config.endpoint.clone(),
                catalog,
            }),
        })
    }

    /// Start a request to `path` under the configured endpoint.
    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, ApiError> {
        let url = self.inner.endpoint.join(path)?;
        Ok(self.inner.client.request(method, url))
    }

    /// Start an authenticated request.
    fn authed(
        &self,
        method: Method,
        path: &str,
        token: &AuthToken,
    ) -> Result<RequestBuilder, ApiError> {
        Ok(self.request(method, path)?.bearer_auth(token.expose()))
    }

    /// Send a request and decode a JSON success body.
    async fn execute<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let response = request.send().await?;
        let status = response.status();

        // Get response body as text first for better error diagnostics
        let body = response.text().await?;

        if !status.is_success() {
            let message = error_message(&body);
            debug!(
                status = %status,
                message = message.as_deref().unwrap_or(""),
                "QKart backend returned non-success status"
            );
            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse QKart response"
            );
            ApiError::Parse(e)
        })
    }

    // =========================================================================
    // Product Methods
    // =========================================================================

    /// Get the full product catalog (`GET /products`).
    ///
    /// Cached for the configured TTL.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn get_products(&self) -> Result<Arc<Vec<Product>>, ApiError> {
        if let Some(products) = self.inner.catalog.get(CATALOG_KEY).await {
            debug!("Cache hit for catalog");
            return Ok(products);
        }

        let products: Vec<Product> = self
            .execute(self.request(Method::GET, "products")?)
            .await?;
        let products = Arc::new(products);

        self.inner
            .catalog
            .insert(CATALOG_KEY, Arc::clone(&products))
            .await;

        Ok(products)
    }

    /// Drop the cached catalog so the next [`Self::get_products`] refetches.
    pub async fn invalidate_catalog(&self) {
        self.inner.catalog.invalidate(CATALOG_KEY).await;
    }

    /// Search products (`GET /products/search?value=<text>`).
    ///
    /// The text is sent as-is; the backend answers "no match" with an error
    /// status, which surfaces as [`ApiError::Status`].
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or nothing matches.
    #[instrument(skip(self))]
    pub async fn search_products(&self, value: &str) -> Result<Vec<Product>, ApiError> {
        let request = self
            .request(Method::GET, "products/search")?
            .query(&[("value", value)]);
        self.execute(request).await
    }

    // =========================================================================
    // Cart Methods
    // =========================================================================

    /// Get the user's cart entries (`GET /cart`).
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn get_cart(&self, token: &AuthToken) -> Result<Vec<CartEntry>, ApiError> {
        self.execute(self.authed(Method::GET, "cart", token)?).await
    }

    /// Set the quantity of a product in the cart (`POST /cart`).
    ///
    /// Adds the product if absent; a quantity of zero removes it. Returns the
    /// full updated cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token), fields(product_id = %product_id))]
    pub async fn update_cart(
        &self,
        token: &AuthToken,
        product_id: &ProductId,
        qty: u32,
    ) -> Result<Vec<CartEntry>, ApiError> {
        let request = self
            .authed(Method::POST, "cart", token)?
            .json(&CartUpsert { product_id, qty });
        self.execute(request).await
    }

    /// Place an order for everything in the cart (`POST /cart/checkout`).
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or the backend refuses the order.
    #[instrument(skip(self, token), fields(address_id = %address_id))]
    pub async fn checkout(&self, token: &AuthToken, address_id: &AddressId) -> Result<(), ApiError> {
        let request = self
            .authed(Method::POST, "cart/checkout", token)?
            .json(&CheckoutRequest { address_id });
        let ack: Ack = self.execute(request).await?;
        ack.into_result()
    }

    // =========================================================================
    // Auth Methods
    // =========================================================================

    /// Log in (`POST /auth/login`).
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or the credentials are rejected.
    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, ApiError> {
        let request = self
            .request(Method::POST, "auth/login")?
            .json(&Credentials { username, password });
        let response: LoginResponse = self.execute(request).await?;

        if !response.success {
            return Err(ApiError::Rejected {
                message: response.message,
            });
        }
        Ok(response)
    }

    /// Create an account (`POST /auth/register`).
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or the username is taken.
    #[instrument(skip(self, password))]
    pub async fn register(&self, username: &str, password: &str) -> Result<(), ApiError> {
        let request = self
            .request(Method::POST, "auth/register")?
            .json(&Credentials { username, password });
        let ack: Ack = self.execute(request).await?;
        ack.into_result()
    }

    // =========================================================================
    // Address Methods
    // =========================================================================

    /// List saved addresses (`GET /user/addresses`).
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn get_addresses(&self, token: &AuthToken) -> Result<Vec<Address>, ApiError> {
        self.execute(self.authed(Method::GET, "user/addresses", token)?)
            .await
    }

    /// Save a new address (`POST /user/addresses`). Returns the updated list.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token, address))]
    pub async fn add_address(
        &self,
        token: &AuthToken,
        address: &str,
    ) -> Result<Vec<Address>, ApiError> {
        let request = self
            .authed(Method::POST, "user/addresses", token)?
            .json(&NewAddress { address });
        self.execute(request).await
    }

    /// Delete a saved address (`DELETE /user/addresses/{id}`). Returns the updated list.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token), fields(address_id = %address_id))]
    pub async fn delete_address(
        &self,
        token: &AuthToken,
        address_id: &AddressId,
    ) -> Result<Vec<Address>, ApiError> {
        let mut url = self.inner.endpoint.join("user/addresses/")?;
        url.path_segments_mut()
            .map_err(|()| ApiError::Url(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .push(address_id.as_str());

        let request = self
            .inner
            .client
            .request(Method::DELETE, url)
            .bearer_auth(token.expose());
        self.execute(request).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn client() -> QkartClient {
        let config = ApiConfig {
            endpoint: Url::parse("http://127.0.0.1:9/v1/").unwrap(),
            timeout: Duration::from_millis(200),
            catalog_ttl: Duration::from_secs(60),
        };
        QkartClient::new(&config).unwrap()
    }

    #[test]
    fn test_request_urls_are_joined_under_endpoint() {
        let client = client();
        let request = client
            .request(Method::GET, "products/search")
            .unwrap()
            .query(&[("value", "running shoes")])
            .build()
            .unwrap();

        assert_eq!(
            request.url().as_str(),
            "http://127.0.0.1:9/v1/products/search?value=running+shoes"
        );
    }

    #[test]
    fn test_authed_request_has_bearer_header() {
        let client = client();
        let request = client
            .authed(Method::GET, "cart", &AuthToken::new("tok"))
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(
            request.headers().get("authorization").unwrap(),
            "Bearer tok"
        );
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_http_error() {
        let err = client().get_products().await.unwrap_err();
        assert!(matches!(err, ApiError::Http(_)));
        assert_eq!(err.status(), None);
    }
}
