//! Integration tests for the QKart storefront.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p qkart-integration-tests
//! ```
//!
//! Every test starts its own [`FakeBackend`] (an in-process QKart REST API
//! on an ephemeral port that records each request it receives) and a
//! [`TestStorefront`] pointed at it. Nothing external is required.

#![allow(clippy::missing_panics_doc)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::{
    Json, Router,
    extract::{Path, Query, Request, State},
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    middleware::{Next, from_fn_with_state},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use serde_json::{Value, json};
use tokio::net::TcpListener;

use qkart_storefront::config::StorefrontConfig;
use qkart_storefront::state::AppState;

/// Wallet balance every fake account starts with.
pub const STARTING_BALANCE: u32 = 5000;

/// Password the fake backend always rejects.
pub const WRONG_PASSWORD: &str = "wrong-password";

/// Username the fake backend reports as taken.
pub const TAKEN_USERNAME: &str = "crio.do";

// =============================================================================
// Fake backend
// =============================================================================

/// A request received by the fake backend.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    /// Path below the API prefix, e.g. `/cart`.
    pub path: String,
    pub query: Option<String>,
}

#[derive(Default)]
struct BackendData {
    products: Vec<Value>,
    carts: HashMap<String, Vec<(String, u32)>>,
    addresses: HashMap<String, Vec<(String, String)>>,
    next_address: u32,
    fail_cart_fetch: bool,
    refuse_checkout: Option<String>,
    requests: Vec<RecordedRequest>,
}

type Shared = Arc<Mutex<BackendData>>;

fn lock(data: &Shared) -> MutexGuard<'_, BackendData> {
    data.lock().unwrap_or_else(PoisonError::into_inner)
}

/// In-process stand-in for the QKart REST API.
pub struct FakeBackend {
    addr: SocketAddr,
    data: Shared,
}

/// Default catalog served by the fake backend.
#[must_use]
pub fn catalog() -> Vec<Value> {
    vec![
        json!({
            "_id": "BW0jAAeDJmlZCF8i",
            "name": "iPhone XR",
            "category": "Phones",
            "cost": 100,
            "rating": 4,
            "image": "https://crio-directus-assets.s3.ap-south-1.amazonaws.com/iphone.png"
        }),
        json!({
            "_id": "KCRwjF7lN97HnEaY",
            "name": "Tan Leatherette Weekender Duffle",
            "category": "Fashion",
            "cost": 150,
            "rating": 4,
            "image": "https://crio-directus-assets.s3.ap-south-1.amazonaws.com/duffle.png"
        }),
        json!({
            "_id": "TwMM4OAhmK0VQ93S",
            "name": "Apple MacBook Pro Max",
            "category": "Computers",
            "cost": 6000,
            "rating": 5,
            "image": "https://crio-directus-assets.s3.ap-south-1.amazonaws.com/macbook.png"
        }),
    ]
}

impl FakeBackend {
    /// Start a backend serving [`catalog`].
    pub async fn start() -> Self {
        let data: Shared = Arc::new(Mutex::new(BackendData {
            products: catalog(),
            ..BackendData::default()
        }));

        let api = Router::new()
            .route("/products", get(products))
            .route("/products/search", get(search))
            .route("/auth/login", post(login))
            .route("/auth/register", post(register))
            .route("/cart", get(get_cart).post(update_cart))
            .route("/cart/checkout", post(checkout))
            .route("/user/addresses", get(get_addresses).post(add_address))
            .route("/user/addresses/{id}", delete(delete_address))
            .layer(from_fn_with_state(Arc::clone(&data), record))
            .with_state(Arc::clone(&data));

        let app = Router::new().nest("/api/v1", api);

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind fake backend");
        let addr = listener.local_addr().expect("Failed to read backend address");

        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        Self { addr, data }
    }

    /// Endpoint to configure the storefront with.
    #[must_use]
    pub fn endpoint(&self) -> String {
        format!("http://{}/api/v1/", self.addr)
    }

    /// Every request received so far, oldest first.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        lock(&self.data).requests.clone()
    }

    /// Number of requests received for `method path`.
    #[must_use]
    pub fn count(&self, method: &str, path: &str) -> usize {
        lock(&self.data)
            .requests
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .count()
    }

    /// Forget the requests received so far.
    pub fn clear_requests(&self) {
        lock(&self.data).requests.clear();
    }

    /// Make `GET /cart` answer 500 with a non-JSON body.
    pub fn fail_cart_fetch(&self) {
        lock(&self.data).fail_cart_fetch = true;
    }

    /// Make `POST /cart/checkout` answer 200 with `{"success": false}`.
    pub fn refuse_checkout(&self, message: &str) {
        lock(&self.data).refuse_checkout = Some(message.to_string());
    }

    /// Seed the cart of `username` (including ids missing from the catalog).
    pub fn set_cart(&self, username: &str, entries: &[(&str, u32)]) {
        lock(&self.data).carts.insert(
            token_for(username),
            entries
                .iter()
                .map(|(id, qty)| ((*id).to_string(), *qty))
                .collect(),
        );
    }

    /// Add a product to the catalog after the storefront has started.
    pub fn add_product(&self, product: Value) {
        lock(&self.data).products.push(product);
    }

    /// Seed a saved address for `username`, returning its id.
    pub fn add_address(&self, username: &str, address: &str) -> String {
        let mut data = lock(&self.data);
        data.next_address += 1;
        let id = format!("addr-{}", data.next_address);
        data.addresses
            .entry(token_for(username))
            .or_default()
            .push((id.clone(), address.to_string()));
        id
    }
}

/// Token the fake backend issues to `username`.
#[must_use]
pub fn token_for(username: &str) -> String {
    format!("token-{username}")
}

async fn record(State(data): State<Shared>, request: Request, next: Next) -> Response {
    let uri = request.uri();
    let recorded = RecordedRequest {
        method: request.method().to_string(),
        path: uri.path().to_string(),
        query: uri.query().map(str::to_string),
    };
    lock(&data).requests.push(recorded);
    next.run(request).await
}

fn failure(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "success": false, "message": message }))).into_response()
}

fn bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::to_string)
}

fn cart_json(entries: &[(String, u32)]) -> Value {
    Value::Array(
        entries
            .iter()
            .map(|(id, qty)| json!({ "productId": id, "qty": qty }))
            .collect(),
    )
}

fn addresses_json(addresses: &[(String, String)]) -> Value {
    Value::Array(
        addresses
            .iter()
            .map(|(id, address)| json!({ "_id": id, "address": address }))
            .collect(),
    )
}

fn str_field<'a>(body: &'a Value, key: &str) -> &'a str {
    body.get(key).and_then(Value::as_str).unwrap_or_default()
}

async fn products(State(data): State<Shared>) -> Json<Value> {
    Json(Value::Array(lock(&data).products.clone()))
}

async fn search(
    State(data): State<Shared>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let needle = query.get("value").cloned().unwrap_or_default().to_lowercase();
    let matches: Vec<Value> = lock(&data)
        .products
        .iter()
        .filter(|p| {
            str_field(p, "name").to_lowercase().contains(&needle)
                || str_field(p, "category").to_lowercase().contains(&needle)
        })
        .cloned()
        .collect();

    if matches.is_empty() {
        return (StatusCode::NOT_FOUND, Json(json!([]))).into_response();
    }
    Json(Value::Array(matches)).into_response()
}

async fn login(Json(body): Json<Value>) -> Response {
    let username = str_field(&body, "username");
    if str_field(&body, "password") == WRONG_PASSWORD {
        return failure(StatusCode::BAD_REQUEST, "Password is incorrect");
    }

    (
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "token": token_for(username),
            "username": username,
            "balance": STARTING_BALANCE,
        })),
    )
        .into_response()
}

async fn register(Json(body): Json<Value>) -> Response {
    if str_field(&body, "username") == TAKEN_USERNAME {
        return failure(StatusCode::BAD_REQUEST, "Username is already taken");
    }
    (StatusCode::CREATED, Json(json!({ "success": true }))).into_response()
}

async fn get_cart(State(data): State<Shared>, headers: HeaderMap) -> Response {
    let Some(token) = bearer(&headers) else {
        return failure(StatusCode::UNAUTHORIZED, "Protected route, Oauth2 Bearer token not found");
    };

    let data = lock(&data);
    if data.fail_cart_fetch {
        return (StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded").into_response();
    }
    Json(cart_json(data.carts.get(&token).map_or(&[][..], Vec::as_slice))).into_response()
}

async fn update_cart(
    State(data): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let Some(token) = bearer(&headers) else {
        return failure(StatusCode::UNAUTHORIZED, "Protected route, Oauth2 Bearer token not found");
    };

    let product_id = str_field(&body, "productId").to_string();
    let qty = body
        .get("qty")
        .and_then(Value::as_u64)
        .and_then(|q| u32::try_from(q).ok())
        .unwrap_or_default();

    let mut data = lock(&data);
    if !data
        .products
        .iter()
        .any(|p| str_field(p, "_id") == product_id)
    {
        return failure(StatusCode::BAD_REQUEST, "Product does not exist");
    }

    let cart = data.carts.entry(token).or_default();
    cart.retain(|(id, _)| *id != product_id);
    if qty > 0 {
        cart.push((product_id, qty));
    }
    Json(cart_json(cart)).into_response()
}

async fn checkout(
    State(data): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let Some(token) = bearer(&headers) else {
        return failure(StatusCode::UNAUTHORIZED, "Protected route, Oauth2 Bearer token not found");
    };

    let address_id = str_field(&body, "addressId");
    let mut data = lock(&data);
    if let Some(message) = &data.refuse_checkout {
        return Json(json!({ "success": false, "message": message })).into_response();
    }
    let known = data
        .addresses
        .get(&token)
        .is_some_and(|list| list.iter().any(|(id, _)| id == address_id));
    if !known {
        return failure(StatusCode::BAD_REQUEST, "Address not set");
    }

    data.carts.remove(&token);
    Json(json!({ "success": true })).into_response()
}

async fn get_addresses(State(data): State<Shared>, headers: HeaderMap) -> Response {
    let Some(token) = bearer(&headers) else {
        return failure(StatusCode::UNAUTHORIZED, "Protected route, Oauth2 Bearer token not found");
    };
    let data = lock(&data);
    Json(addresses_json(
        data.addresses.get(&token).map_or(&[][..], Vec::as_slice),
    ))
    .into_response()
}

async fn add_address(
    State(data): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let Some(token) = bearer(&headers) else {
        return failure(StatusCode::UNAUTHORIZED, "Protected route, Oauth2 Bearer token not found");
    };

    let mut data = lock(&data);
    data.next_address += 1;
    let id = format!("addr-{}", data.next_address);
    let list = data.addresses.entry(token).or_default();
    list.push((id, str_field(&body, "address").to_string()));
    Json(addresses_json(list)).into_response()
}

async fn delete_address(
    State(data): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    let Some(token) = bearer(&headers) else {
        return failure(StatusCode::UNAUTHORIZED, "Protected route, Oauth2 Bearer token not found");
    };

    let mut data = lock(&data);
    let list = data.addresses.entry(token).or_default();
    list.retain(|(address_id, _)| *address_id != id);
    Json(addresses_json(list)).into_response()
}

// =============================================================================
// Storefront under test
// =============================================================================

/// A storefront served on an ephemeral port, talking to its own [`FakeBackend`].
pub struct TestStorefront {
    pub backend: FakeBackend,
    /// Client with a cookie store, so it keeps one session across requests.
    pub client: reqwest::Client,
    base_url: String,
}

impl TestStorefront {
    /// Start a storefront with default settings.
    pub async fn start() -> Self {
        Self::start_with(&[]).await
    }

    /// Start a storefront with extra configuration variables.
    pub async fn start_with(vars: &[(&str, &str)]) -> Self {
        let backend = FakeBackend::start().await;

        let mut env: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        env.insert("QKART_API_ENDPOINT".to_string(), backend.endpoint());
        env.insert("QKART_HTTP_TIMEOUT_SECS".to_string(), "2".to_string());

        let config = StorefrontConfig::from_lookup(|key| env.get(key).cloned())
            .expect("Invalid test configuration");
        let state = AppState::new(config).expect("Failed to build storefront state");
        let app = qkart_storefront::app(state);

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind storefront");
        let addr = listener
            .local_addr()
            .expect("Failed to read storefront address");

        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        let client = reqwest::Client::builder()
            .cookie_store(true)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            backend,
            client,
            base_url: format!("http://{addr}"),
        }
    }

    /// Absolute URL for a storefront path.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// GET a page and return its status and body.
    pub async fn get(&self, path: &str) -> (reqwest::StatusCode, String) {
        let response = self
            .client
            .get(self.url(path))
            .send()
            .await
            .expect("GET failed");
        let status = response.status();
        (status, response.text().await.expect("Failed to read body"))
    }

    /// POST a form and return the final status, path and body (redirects followed).
    pub async fn post(&self, path: &str, form: &[(&str, &str)]) -> (reqwest::StatusCode, String, String) {
        let response = self
            .client
            .post(self.url(path))
            .form(form)
            .send()
            .await
            .expect("POST failed");
        let status = response.status();
        let final_path = response.url().path().to_string();
        (
            status,
            final_path,
            response.text().await.expect("Failed to read body"),
        )
    }

    /// Log in as `username` and return the page the login redirected to.
    pub async fn login(&self, username: &str) -> String {
        let (status, path, body) = self
            .post("/login", &[("username", username), ("password", "learnwithcrio")])
            .await;
        assert!(status.is_success(), "login failed with {status}");
        assert_eq!(path, "/", "login should land on the products page");
        body
    }
}
