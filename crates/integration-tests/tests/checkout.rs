//! Checkout hand-off to the payment provider and the return trip.

#![allow(clippy::unwrap_used)]

use eyewear_integration_tests::{PAYMENT_URL, TestStorefront, location};

const ADDRESS: [(&str, &str); 5] = [
    ("full_name", "Ana Silva"),
    ("address", "1 Harbour Road"),
    ("city", "Lisbon"),
    ("postal_code", "1100-001"),
    ("country", "Portugal"),
];

#[tokio::test]
async fn test_checkout_requires_login() {
    let store = TestStorefront::start().await;
    let response = store.get("/checkout").await;
    assert_eq!(response.status(), 303);
    assert_eq!(location(&response), "/auth/login?next=%2Fcheckout");
}

#[tokio::test]
async fn test_empty_cart_goes_back_to_cart() {
    let store = TestStorefront::start().await;
    store.login("/account").await;

    let response = store.get("/checkout").await;
    assert_eq!(response.status(), 303);
    assert_eq!(location(&response), "/cart");
}

#[tokio::test]
async fn test_checkout_redirects_to_payment_then_clears_cart() {
    let store = TestStorefront::start().await;
    store.login("/cart").await;
    store
        .post_form(
            "/cart/add",
            &[("id", "p-aviator"), ("kind", "product"), ("quantity", "2")],
        )
        .await;

    let form = store.get("/checkout").await;
    assert_eq!(form.status(), 200);
    assert!(form.text().await.unwrap().contains("$240.00"));

    let response = store.post_form("/checkout", &ADDRESS).await;
    assert_eq!(response.status(), 303);
    assert_eq!(location(&response), PAYMENT_URL);

    let requests = store.backend.checkout_requests();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request["currency"], "usd");
    assert_eq!(request["items"][0]["id"], "p-aviator");
    assert_eq!(request["items"][0]["type"], "product");
    assert_eq!(request["items"][0]["quantity"], 2);
    assert_eq!(request["shippingAddress"]["city"], "Lisbon");
    assert!(
        request["successUrl"]
            .as_str()
            .unwrap()
            .ends_with("/checkout/success?session_id={CHECKOUT_SESSION_ID}")
    );

    // Cart survives until the payment is verified.
    let count = store.hx_get("/cart/count").await.text().await.unwrap();
    assert!(count.contains(">2<"));

    let success = store.get("/checkout/success?session_id=cs_test_1").await;
    assert_eq!(success.status(), 200);
    let body = success.text().await.unwrap();
    assert!(body.contains("order-1001"));
    assert!(!body.contains("cart-badge"));

    let count = store.hx_get("/cart/count").await.text().await.unwrap();
    assert!(!count.contains("cart-badge"));
}

#[tokio::test]
async fn test_unverified_session_keeps_cart() {
    let store = TestStorefront::start().await;
    store.login("/cart").await;
    store
        .post_form("/cart/add", &[("id", "p-round"), ("kind", "product")])
        .await;

    let body = store
        .get("/checkout/success?session_id=cs_forged")
        .await
        .text()
        .await
        .unwrap();
    assert!(body.contains("Payment not completed"));

    let count = store.hx_get("/cart/count").await.text().await.unwrap();
    assert!(count.contains(">1<"));
}

#[tokio::test]
async fn test_missing_address_field_is_reported() {
    let store = TestStorefront::start().await;
    store.login("/cart").await;
    store
        .post_form("/cart/add", &[("id", "p-round"), ("kind", "product")])
        .await;

    let mut form = ADDRESS;
    form[2] = ("city", "  ");
    let response = store.post_form("/checkout", &form).await;
    assert_eq!(response.status(), 303);
    assert!(location(&response).starts_with("/checkout?error="));
    assert!(store.backend.checkout_requests().is_empty());
}
