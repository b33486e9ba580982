//! Integration tests for product listing and debounced search.

use std::time::Duration;

use qkart_integration_tests::TestStorefront;
use reqwest::StatusCode;

#[tokio::test]
async fn test_products_page_lists_catalog() {
    let store = TestStorefront::start().await;

    let (status, body) = store.get("/").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("iPhone XR"));
    assert!(body.contains("Tan Leatherette Weekender Duffle"));
    assert!(body.contains("$100"));
    assert!(body.contains("delay:500ms"));
    // Logged out: login links, no cart
    assert!(body.contains("href=\"/login\""));
    assert!(!body.contains("id=\"cart\""));
}

#[tokio::test]
async fn test_rapid_searches_send_one_backend_search() {
    let store = TestStorefront::start().await;
    // Establish the session so both keystrokes share it
    store.get("/").await;
    store.backend.clear_requests();

    let first = store
        .client
        .get(store.url("/search/live"))
        .query(&[("q", "ip")])
        .send();
    let second = async {
        tokio::time::sleep(Duration::from_millis(100)).await;
        store
            .client
            .get(store.url("/search/live"))
            .query(&[("q", "iphone")])
            .send()
            .await
    };

    let (first, second) = tokio::join!(first, second);
    let first = first.expect("first search failed");
    let second = second.expect("second search failed");

    assert_eq!(first.status(), StatusCode::NO_CONTENT);
    assert_eq!(second.status(), StatusCode::OK);
    let body = second.text().await.expect("Failed to read body");
    assert!(body.contains("iPhone XR"));
    assert!(!body.contains("Duffle"));

    let searches: Vec<_> = store
        .backend
        .requests()
        .into_iter()
        .filter(|r| r.path == "/products/search")
        .collect();
    assert_eq!(searches.len(), 1);
    assert_eq!(searches[0].query.as_deref(), Some("value=iphone"));
}

#[tokio::test]
async fn test_search_without_match_shows_empty_state() {
    let store = TestStorefront::start_with(&[("QKART_SEARCH_DEBOUNCE_MS", "10")]).await;
    store.get("/").await;

    let (status, body) = store.get("/search/live?q=spaceship").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("No products found"));
    assert!(!body.contains("iPhone XR"));
}

#[tokio::test]
async fn test_search_matches_category() {
    let store = TestStorefront::start_with(&[("QKART_SEARCH_DEBOUNCE_MS", "10")]).await;

    let (status, body) = store.get("/search?q=fashion").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Tan Leatherette Weekender Duffle"));
    assert!(!body.contains("iPhone XR"));
    assert!(body.contains("value=\"fashion\""));
}

#[tokio::test]
async fn test_empty_search_shows_full_catalog() {
    let store = TestStorefront::start_with(&[("QKART_SEARCH_DEBOUNCE_MS", "10")]).await;
    store.get("/").await;
    store.backend.clear_requests();

    let (_, body) = store.get("/search/live?q=").await;

    assert!(body.contains("iPhone XR"));
    assert!(body.contains("Apple MacBook Pro Max"));
    assert_eq!(store.backend.count("GET", "/products/search"), 0);
}

#[tokio::test]
async fn test_health_endpoints() {
    let store = TestStorefront::start().await;

    let (status, body) = store.get("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "ok");

    let (status, _) = store.get("/health/ready").await;
    assert_eq!(status, StatusCode::OK);
}
