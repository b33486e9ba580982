//! Integration tests for the cart flows.
//!
//! Each test runs a storefront against an in-process fake backend and
//! checks both what the user sees and which backend calls were made.

use qkart_integration_tests::TestStorefront;
use serde_json::json;

const IPHONE: &str = "BW0jAAeDJmlZCF8i";
const DUFFLE: &str = "KCRwjF7lN97HnEaY";

#[tokio::test]
async fn test_add_to_cart_logged_out_makes_no_backend_calls() {
    let store = TestStorefront::start().await;
    store.backend.clear_requests();

    let (status, _, body) = store.post("/cart/add", &[("product_id", IPHONE)]).await;

    assert!(status.is_success());
    assert!(body.contains("Login to add an item to the Cart"));
    assert!(body.contains("toast--warning"));
    assert!(!body.contains("id=\"cart\""), "logged-out users have no cart sidebar");
    assert!(store.backend.requests().is_empty());
}

#[tokio::test]
async fn test_duplicate_add_issues_a_single_upsert() {
    let store = TestStorefront::start().await;
    store.login("crio-user").await;

    let (_, _, first) = store.post("/cart/add", &[("product_id", IPHONE)]).await;
    assert!(first.contains("Item added to cart"));
    assert!(first.contains("iPhone XR"));

    let (_, _, second) = store.post("/cart/add", &[("product_id", IPHONE)]).await;
    assert!(second.contains("Item already in cart. Use the cart sidebar to update quantity or remove item."));

    assert_eq!(store.backend.count("POST", "/cart"), 1);
}

#[tokio::test]
async fn test_add_unknown_product_shows_backend_message() {
    let store = TestStorefront::start().await;
    store.login("crio-user").await;

    let (_, _, body) = store
        .post("/cart/add", &[("product_id", "no-such-product")])
        .await;

    assert!(body.contains("Product does not exist"));
    assert!(body.contains("toast--warning"));
}

#[tokio::test]
async fn test_failed_cart_fetch_shows_error_and_empty_cart() {
    let store = TestStorefront::start().await;
    store.backend.fail_cart_fetch();

    let body = store.login("crio-user").await;

    assert!(body.contains(
        "Could not fetch cart details. Check that the backend is running, reachable and returns valid JSON."
    ));
    assert!(body.contains("Cart is empty"));
    // The product grid still renders
    assert!(body.contains("iPhone XR"));
}

#[tokio::test]
async fn test_cart_joins_catalog_and_drops_unknown_ids() {
    let store = TestStorefront::start().await;
    store
        .backend
        .set_cart("crio-user", &[(IPHONE, 2), ("deleted-product", 1), (DUFFLE, 1)]);

    let body = store.login("crio-user").await;

    // 2 x $100 + 1 x $150
    assert!(body.contains("$200"));
    assert!(body.contains("$350"));
    assert!(!body.contains("Cart is empty"));
}

#[tokio::test]
async fn test_product_newer_than_cached_catalog_shows_in_cart() {
    let store = TestStorefront::start().await;
    // Renders the products page, which caches the catalog
    store.login("crio-user").await;
    store.backend.add_product(json!({
        "_id": "NewYoga5mat00001",
        "name": "Yoga Mat",
        "category": "Sports",
        "cost": 40,
        "rating": 3,
        "image": "https://crio-directus-assets.s3.ap-south-1.amazonaws.com/mat.png"
    }));

    let (_, _, body) = store
        .post("/cart/add", &[("product_id", "NewYoga5mat00001")])
        .await;

    assert!(body.contains("Item added to cart"));
    assert!(body.contains("Yoga Mat"));
    assert!(body.contains("$40"));
}

#[tokio::test]
async fn test_quantity_update_to_zero_removes_item() {
    let store = TestStorefront::start().await;
    store.backend.set_cart("crio-user", &[(IPHONE, 1)]);
    store.login("crio-user").await;

    let (_, _, body) = store
        .post("/cart/update", &[("product_id", IPHONE), ("qty", "0")])
        .await;

    assert!(body.contains("Cart updated"));
    assert!(body.contains("Cart is empty"));
}

#[tokio::test]
async fn test_quantity_update_is_not_gated() {
    let store = TestStorefront::start().await;
    store.backend.set_cart("crio-user", &[(IPHONE, 1)]);
    store.login("crio-user").await;

    let (_, _, body) = store
        .post("/cart/update", &[("product_id", IPHONE), ("qty", "3")])
        .await;

    assert!(body.contains("$300"));
    assert_eq!(store.backend.count("POST", "/cart"), 1);
}

#[tokio::test]
async fn test_cart_fragment_requires_login() {
    let store = TestStorefront::start().await;

    let response = store
        .client
        .get(store.url("/cart"))
        .send()
        .await
        .expect("GET failed");

    assert_eq!(response.url().path(), "/login");
}
