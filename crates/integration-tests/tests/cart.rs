//! Cart behaviour through the HTTP surface: merging, the header badge and
//! currency display.

#![allow(clippy::unwrap_used)]

use eyewear_integration_tests::{TestStorefront, location};

#[tokio::test]
async fn test_identical_lines_merge_and_badge_updates() {
    let store = TestStorefront::start().await;
    let form = [
        ("id", "p-round"),
        ("kind", "product"),
        ("quantity", "1"),
        ("custom[color]", "Tortoise"),
    ];

    let response = store.hx_post_form("/cart/add", &form).await;
    assert_eq!(response.status(), 200);
    assert_eq!(
        response.headers().get("hx-trigger").unwrap(),
        "cart-updated"
    );
    assert!(response.text().await.unwrap().contains(">1<"));

    let mut again = form;
    again[2] = ("quantity", "2");
    let response = store.hx_post_form("/cart/add", &again).await;
    assert!(response.text().await.unwrap().contains(">3<"));

    let count = store.hx_get("/cart/count").await.text().await.unwrap();
    assert!(count.contains(r#"<span class="cart-badge">3</span>"#));

    // One line, sale price applied: 3 x $60.00
    let page = store.get("/cart").await.text().await.unwrap();
    assert_eq!(page.matches(r#"name="key""#).count(), 2);
    assert!(page.contains("Color: Tortoise"));
    assert!(page.contains("$180.00"));
}

#[tokio::test]
async fn test_different_customizations_stay_separate() {
    let store = TestStorefront::start().await;
    for color in ["Gold", "Silver"] {
        store
            .hx_post_form(
                "/cart/add",
                &[
                    ("id", "p-aviator"),
                    ("kind", "product"),
                    ("quantity", "1"),
                    ("custom[color]", color),
                ],
            )
            .await;
    }

    let page = store.get("/cart").await.text().await.unwrap();
    assert_eq!(page.matches(r#"name="key""#).count(), 4);
    assert!(page.contains("$240.00"));
}

#[tokio::test]
async fn test_plain_form_add_redirects_to_cart() {
    let store = TestStorefront::start().await;
    let response = store
        .post_form("/cart/add", &[("id", "p-aviator"), ("kind", "product")])
        .await;
    assert_eq!(response.status(), 303);
    assert_eq!(location(&response), "/cart");

    let home = store.get("/").await.text().await.unwrap();
    assert!(home.contains(r#"<span class="cart-badge">1</span>"#));
}

#[tokio::test]
async fn test_out_of_stock_and_unknown_products_are_rejected() {
    let store = TestStorefront::start().await;

    let sold_out = store
        .hx_post_form("/cart/add", &[("id", "p-sold-out"), ("kind", "product")])
        .await;
    assert_eq!(sold_out.status(), 400);

    let missing = store
        .hx_post_form("/cart/add", &[("id", "p-nope"), ("kind", "product")])
        .await;
    assert_eq!(missing.status(), 404);

    let count = store.hx_get("/cart/count").await.text().await.unwrap();
    assert!(!count.contains("cart-badge"));
}

#[tokio::test]
async fn test_lens_options_are_priced_locally() {
    let store = TestStorefront::start().await;
    store
        .hx_post_form(
            "/cart/add",
            &[("id", "blue-light"), ("kind", "lens"), ("quantity", "2")],
        )
        .await;

    let page = store.get("/cart").await.text().await.unwrap();
    assert!(page.contains("$158.00"));
}

#[tokio::test]
async fn test_selected_currency_converts_cart_prices() {
    let store = TestStorefront::start().await;
    store
        .hx_post_form("/cart/add", &[("id", "p-aviator"), ("kind", "product")])
        .await;

    let response = store.hx_post_form("/currency", &[("currency", "EUR")]).await;
    assert_eq!(response.status(), 204);

    let page = store.get("/cart").await.text().await.unwrap();
    assert!(page.contains("€108.00"));
}

#[tokio::test]
async fn test_quantity_zero_removes_line() {
    let store = TestStorefront::start().await;
    store
        .hx_post_form("/cart/add", &[("id", "p-aviator"), ("kind", "product")])
        .await;

    let page = store.get("/cart").await.text().await.unwrap();
    let key = page
        .split(r#"name="key" value=""#)
        .nth(1)
        .and_then(|rest| rest.split('"').next())
        .unwrap()
        .to_string();

    let fragment = store
        .hx_post_form("/cart/update", &[("key", &key), ("quantity", "0")])
        .await
        .text()
        .await
        .unwrap();
    assert!(fragment.contains("Your cart is empty"));
}
