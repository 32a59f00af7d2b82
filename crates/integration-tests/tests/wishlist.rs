//! Favourites toggling against the backend, including a backend that cannot
//! list them.

#![allow(clippy::unwrap_used)]

use eyewear_integration_tests::{TestStorefront, location};

#[tokio::test]
async fn test_toggle_adds_then_removes() {
    let store = TestStorefront::start().await;
    store.login("/").await;

    let response = store
        .hx_post_form("/wishlist/toggle", &[("product_id", "p-round")])
        .await;
    assert_eq!(response.status(), 200);
    assert_eq!(
        response.headers().get("hx-trigger").unwrap(),
        "wishlist-updated"
    );
    let button = response.text().await.unwrap();
    assert!(button.contains(r#"aria-pressed="true""#));
    assert_eq!(store.backend.favourites(), vec!["p-round".to_string()]);

    let page = store.get("/wishlist").await.text().await.unwrap();
    assert!(page.contains("Round Reader"));
    let detail = store.get("/products/p-round").await.text().await.unwrap();
    assert!(detail.contains("wishlist-button active"));

    let response = store
        .hx_post_form("/wishlist/toggle", &[("product_id", "p-round")])
        .await;
    assert_eq!(response.status(), 200);
    assert!(response.text().await.unwrap().contains(r#"aria-pressed="false""#));
    assert!(store.backend.favourites().is_empty());
    assert_eq!(
        store.backend.favourite_writes(),
        vec!["POST p-round".to_string(), "DELETE p-round".to_string()]
    );
}

#[tokio::test]
async fn test_unreadable_favourites_block_the_toggle() {
    let store = TestStorefront::start().await;
    store.login("/").await;
    store
        .hx_post_form("/wishlist/toggle", &[("product_id", "p-aviator")])
        .await;
    assert_eq!(store.backend.favourites(), vec!["p-aviator".to_string()]);

    store.backend.fail_favourite_reads();
    let response = store
        .hx_post_form("/wishlist/toggle", &[("product_id", "p-aviator")])
        .await;
    assert_eq!(response.status(), 502);

    // No write was attempted, so the saved frame is still saved
    assert_eq!(store.backend.favourite_writes(), vec!["POST p-aviator".to_string()]);
    assert_eq!(store.backend.favourites(), vec!["p-aviator".to_string()]);
}

#[tokio::test]
async fn test_toggle_requires_login() {
    let store = TestStorefront::start().await;
    let response = store
        .post_form("/wishlist/toggle", &[("product_id", "p-round")])
        .await;
    assert!(response.status().is_redirection());
    assert!(location(&response).starts_with("/auth/login"));
    assert!(store.backend.favourite_writes().is_empty());
}
