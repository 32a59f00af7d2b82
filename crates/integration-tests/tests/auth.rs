//! Login, logout and session expiry.

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use eyewear_integration_tests::{EMAIL, MockBackend, TestStorefront, location};

#[tokio::test]
async fn test_protected_pages_redirect_to_login() {
    let store = TestStorefront::start().await;

    let response = store.get("/account").await;
    assert_eq!(response.status(), 303);
    assert_eq!(location(&response), "/auth/login?next=%2Faccount");

    let response = store.hx_get("/wishlist").await;
    assert_eq!(response.status(), 401);
    assert_eq!(response.headers().get("hx-redirect").unwrap(), "/auth/login");
}

#[tokio::test]
async fn test_wrong_password_returns_to_login_with_error() {
    let store = TestStorefront::start().await;

    let response = store
        .post_form(
            "/auth/login",
            &[("email", EMAIL), ("password", "nope"), ("next", "/account")],
        )
        .await;
    assert_eq!(response.status(), 303);
    assert_eq!(
        location(&response),
        "/auth/login?error=credentials&next=%2Faccount"
    );

    let page = store.get(&location(&response)).await.text().await.unwrap();
    assert!(page.contains("Invalid email or password."));
}

#[tokio::test]
async fn test_login_then_logout() {
    let store = TestStorefront::start().await;

    let response = store.login("/account").await;
    assert_eq!(response.status(), 303);
    assert_eq!(location(&response), "/account");

    let account = store.get("/account").await;
    assert_eq!(account.status(), 200);
    let body = account.text().await.unwrap();
    assert!(body.contains("Ana Silva"));
    assert!(body.contains(EMAIL));

    let response = store.post_form("/auth/logout", &[]).await;
    assert_eq!(response.status(), 303);
    assert_eq!(store.get("/account").await.status(), 303);
}

#[tokio::test]
async fn test_offsite_next_is_ignored() {
    let store = TestStorefront::start().await;
    let response = store.login("//evil.example.com/").await;
    assert_eq!(location(&response), "/account");
}

#[tokio::test]
async fn test_expired_token_logs_the_shopper_out() {
    let store = TestStorefront::with_backend(MockBackend::with_token_ttl(2).await).await;

    store.login("/account").await;
    assert_eq!(store.get("/account").await.status(), 200);

    tokio::time::sleep(Duration::from_secs(3)).await;

    let response = store.get("/account").await;
    assert_eq!(response.status(), 303);
    assert!(location(&response).starts_with("/auth/login"));

    let home = store.get("/").await.text().await.unwrap();
    assert!(home.contains("Log in"));
    assert!(!home.contains("Log out"));
}
