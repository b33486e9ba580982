//! Integration tests for checkout.

use qkart_integration_tests::TestStorefront;

const IPHONE: &str = "BW0jAAeDJmlZCF8i";
const MACBOOK: &str = "TwMM4OAhmK0VQ93S";

#[tokio::test]
async fn test_checkout_requires_login() {
    let store = TestStorefront::start().await;

    let (_, body) = store.get("/checkout").await;

    assert!(body.contains("Login to QKart"));
}

#[tokio::test]
async fn test_checkout_page_shows_cart_addresses_and_balance() {
    let store = TestStorefront::start().await;
    store.backend.set_cart("crio-user", &[(IPHONE, 2)]);
    store.backend.add_address("crio-user", "221B Baker Street");
    store.login("crio-user").await;

    let (_, body) = store.get("/checkout").await;

    assert!(body.contains("221B Baker Street"));
    assert!(body.contains("$5000"));
    assert!(body.contains("$200"));
    // Read-only: no quantity buttons
    assert!(!body.contains("/cart/update"));
}

#[tokio::test]
async fn test_place_order_updates_balance() {
    let store = TestStorefront::start().await;
    store.backend.set_cart("crio-user", &[(IPHONE, 1)]);
    let address_id = store.backend.add_address("crio-user", "221B Baker Street");
    store.login("crio-user").await;

    let (_, path, body) = store
        .post("/checkout", &[("address_id", address_id.as_str())])
        .await;

    assert_eq!(path, "/thanks");
    assert!(body.contains("Order placed successfully"));
    assert!(body.contains("$4900"));
    assert_eq!(store.backend.count("POST", "/cart/checkout"), 1);
}

#[tokio::test]
async fn test_order_refused_with_success_status_keeps_balance() {
    let store = TestStorefront::start().await;
    store.backend.set_cart("crio-user", &[(IPHONE, 1)]);
    let address_id = store.backend.add_address("crio-user", "221B Baker Street");
    store.backend.refuse_checkout("Order could not be placed");
    store.login("crio-user").await;

    let (_, path, body) = store
        .post("/checkout", &[("address_id", address_id.as_str())])
        .await;

    assert_eq!(path, "/checkout");
    assert!(body.contains("Order could not be placed"));
    assert!(!body.contains("Order placed successfully"));
    assert!(body.contains("$5000"));
}

#[tokio::test]
async fn test_place_order_with_empty_cart() {
    let store = TestStorefront::start().await;
    let address_id = store.backend.add_address("crio-user", "221B Baker Street");
    store.login("crio-user").await;

    let (_, path, body) = store
        .post("/checkout", &[("address_id", address_id.as_str())])
        .await;

    assert_eq!(path, "/checkout");
    assert!(body.contains("You must add items to cart first"));
    assert_eq!(store.backend.count("POST", "/cart/checkout"), 0);
}

#[tokio::test]
async fn test_place_order_with_insufficient_balance() {
    let store = TestStorefront::start().await;
    store.backend.set_cart("crio-user", &[(MACBOOK, 1)]);
    let address_id = store.backend.add_address("crio-user", "221B Baker Street");
    store.login("crio-user").await;

    let (_, path, body) = store
        .post("/checkout", &[("address_id", address_id.as_str())])
        .await;

    assert_eq!(path, "/checkout");
    assert!(body.contains("You do not have enough balance in your wallet for this purchase"));
    assert_eq!(store.backend.count("POST", "/cart/checkout"), 0);
}

#[tokio::test]
async fn test_place_order_without_address() {
    let store = TestStorefront::start().await;
    store.backend.set_cart("crio-user", &[(IPHONE, 1)]);
    store.login("crio-user").await;

    let (_, path, body) = store.post("/checkout", &[]).await;

    assert_eq!(path, "/checkout");
    assert!(body.contains("Please select one shipping address to proceed."));
}

#[tokio::test]
async fn test_add_and_delete_address() {
    let store = TestStorefront::start().await;
    store.login("crio-user").await;

    let (_, path, body) = store
        .post("/checkout/addresses", &[("address", "12 Residency Road")])
        .await;
    assert_eq!(path, "/checkout");
    assert!(body.contains("Address added"));
    assert!(body.contains("12 Residency Road"));

    let (_, path, body) = store.post("/checkout/addresses/addr-1/delete", &[]).await;
    assert_eq!(path, "/checkout");
    assert!(body.contains("Address deleted"));
    assert!(!body.contains("12 Residency Road"));
}
