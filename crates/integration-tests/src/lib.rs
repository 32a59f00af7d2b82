//! Integration tests for the eyewear storefront.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p eyewear-integration-tests
//! ```
//!
//! Each test starts a [`MockBackend`] (a small axum app speaking the REST
//! backend's JSON) and a real storefront built with
//! [`eyewear_storefront::app::build_app`], both on ephemeral local ports.
//! Requests go through a cookie-keeping `reqwest` client, so sessions behave
//! as they do in a browser.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use eyewear_storefront::app::build_app;
use eyewear_storefront::config::StorefrontConfig;
use eyewear_storefront::state::AppState;
use serde_json::{Value, json};
use tokio::net::TcpListener;

/// Password the mock backend accepts for every seeded account.
pub const PASSWORD: &str = "correct-horse";

/// Email of the seeded shopper.
pub const EMAIL: &str = "ana@example.com";

/// Payment page the mock hands out for every checkout session.
pub const PAYMENT_URL: &str = "https://pay.example.com/c/cs_test_1";

// =============================================================================
// Mock Backend
// =============================================================================

#[derive(Default)]
struct Recorded {
    checkout_requests: Vec<Value>,
    favourites: Vec<String>,
    favourite_writes: Vec<String>,
    fail_favourite_reads: bool,
}

#[derive(Clone)]
struct MockState {
    token_ttl_secs: i64,
    recorded: Arc<Mutex<Recorded>>,
}

/// A stand-in for the catalog/orders REST backend.
pub struct MockBackend {
    addr: SocketAddr,
    recorded: Arc<Mutex<Recorded>>,
}

impl MockBackend {
    /// Start a backend whose login tokens live for an hour.
    pub async fn start() -> Self {
        Self::with_token_ttl(3600).await
    }

    /// Start a backend whose login tokens expire `secs` after issue.
    ///
    /// # Panics
    ///
    /// Panics if the listener cannot bind.
    #[allow(clippy::unwrap_used)]
    pub async fn with_token_ttl(secs: i64) -> Self {
        let recorded = Arc::new(Mutex::new(Recorded::default()));
        let state = MockState {
            token_ttl_secs: secs,
            recorded: Arc::clone(&recorded),
        };

        let api = Router::new()
            .route("/products", get(products))
            .route("/products/{id}", get(product))
            .route("/accessories", get(empty_list))
            .route("/categories", get(categories))
            .route("/reviews/product/{id}", get(empty_list))
            .route("/scripts", get(empty_list))
            .route("/announcements", get(empty_list))
            .route("/users/login", post(login))
            .route("/favourites", get(favourites).post(add_favourite))
            .route("/favourites/{id}", delete(remove_favourite))
            .route("/orders/my-orders", get(authed_empty_list))
            .route("/orders/create-checkout-session", post(create_checkout))
            .route("/orders/verify-session/{id}", get(verify_checkout));

        let app = Router::new()
            .nest("/api", api)
            .route("/rates", get(rates))
            .with_state(state);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        Self { addr, recorded }
    }

    /// Base URL of the REST API.
    #[must_use]
    pub fn api_url(&self) -> String {
        format!("http://{}/api/", self.addr)
    }

    /// URL of the exchange-rate endpoint.
    #[must_use]
    pub fn rates_url(&self) -> String {
        format!("http://{}/rates", self.addr)
    }

    /// Bodies of every checkout-session request received so far.
    ///
    /// # Panics
    ///
    /// Panics if the recorder lock is poisoned.
    #[must_use]
    #[allow(clippy::unwrap_used)]
    pub fn checkout_requests(&self) -> Vec<Value> {
        self.recorded.lock().unwrap().checkout_requests.clone()
    }

    /// Product ids currently saved as favourites.
    ///
    /// # Panics
    ///
    /// Panics if the recorder lock is poisoned.
    #[must_use]
    #[allow(clippy::unwrap_used)]
    pub fn favourites(&self) -> Vec<String> {
        self.recorded.lock().unwrap().favourites.clone()
    }

    /// Every favourite add or removal received, as `"POST <id>"` or
    /// `"DELETE <id>"`.
    ///
    /// # Panics
    ///
    /// Panics if the recorder lock is poisoned.
    #[must_use]
    #[allow(clippy::unwrap_used)]
    pub fn favourite_writes(&self) -> Vec<String> {
        self.recorded.lock().unwrap().favourite_writes.clone()
    }

    /// Make `GET /favourites` answer with a server error from now on.
    ///
    /// # Panics
    ///
    /// Panics if the recorder lock is poisoned.
    #[allow(clippy::unwrap_used)]
    pub fn fail_favourite_reads(&self) {
        self.recorded.lock().unwrap().fail_favourite_reads = true;
    }
}

fn catalog() -> Vec<Value> {
    vec![
        json!({
            "_id": "p-aviator",
            "name": "Aviator Classic",
            "description": "Teardrop metal frame",
            "price": 120,
            "brand": "Northline",
            "category": {"_id": "c-sun", "name": "Sunglasses"},
            "shape": "Aviator",
            "material": "Metal",
            "color": ["Gold", "Silver"],
            "images": ["https://cdn.example.com/aviator.jpg"],
            "countInStock": 12,
            "rating": 4.5,
            "numReviews": 8,
            "featured": true
        }),
        json!({
            "_id": "p-round",
            "name": "Round Reader",
            "description": "Lightweight acetate readers",
            "price": 80,
            "discountPrice": 60,
            "brand": "Studio",
            "category": {"_id": "c-opt", "name": "Optical"},
            "shape": "Round",
            "material": "Acetate",
            "color": "Tortoise",
            "image": "https://cdn.example.com/round.jpg",
            "countInStock": 3,
            "rating": 4.0
        }),
        json!({
            "_id": "p-sold-out",
            "name": "Cat-Eye Noir",
            "price": 150,
            "category": "Sunglasses",
            "shape": "Cat-eye",
            "countInStock": 0
        }),
    ]
}

async fn products() -> Json<Value> {
    Json(json!({"products": catalog(), "page": 1, "pages": 1}))
}

async fn product(Path(id): Path<String>) -> Response {
    catalog()
        .into_iter()
        .find(|p| p["_id"] == id.as_str())
        .map_or_else(
            || {
                (StatusCode::NOT_FOUND, Json(json!({"message": "Product not found"})))
                    .into_response()
            },
            |p| Json(p).into_response(),
        )
}

async fn categories() -> Json<Value> {
    Json(json!([
        {"_id": "c-sun", "name": "Sunglasses", "slug": "sunglasses"},
        {"_id": "c-opt", "name": "Optical"}
    ]))
}

async fn empty_list() -> Json<Value> {
    Json(json!([]))
}

async fn rates() -> Json<Value> {
    Json(json!({"base_code": "USD", "rates": {"USD": 1, "EUR": 0.9}}))
}

/// An unsigned JWT whose only meaningful claim is `exp`.
fn token(ttl_secs: i64) -> String {
    let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#);
    let exp = chrono::Utc::now().timestamp() + ttl_secs;
    let claims = URL_SAFE_NO_PAD.encode(format!(r#"{{"sub":"u-ana","exp":{exp}}}"#));
    format!("{header}.{claims}.mock-signature")
}

fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"message": "Not authorized, token failed"})),
    )
        .into_response()
}

async fn login(State(state): State<MockState>, Json(body): Json<Value>) -> Response {
    if body["email"] != EMAIL || body["password"] != PASSWORD {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"message": "Invalid email or password"})),
        )
            .into_response();
    }
    Json(json!({
        "_id": "u-ana",
        "name": "Ana Silva",
        "email": EMAIL,
        "role": "user",
        "token": token(state.token_ttl_secs)
    }))
    .into_response()
}

async fn authed_empty_list(headers: HeaderMap) -> Response {
    if bearer(&headers).is_none() {
        return unauthorized();
    }
    Json(json!([])).into_response()
}

#[allow(clippy::unwrap_used)]
async fn favourites(State(state): State<MockState>, headers: HeaderMap) -> Response {
    if bearer(&headers).is_none() {
        return unauthorized();
    }
    let recorded = state.recorded.lock().unwrap();
    if recorded.fail_favourite_reads {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"message": "database unavailable"})),
        )
            .into_response();
    }
    let saved: Vec<Value> = catalog()
        .into_iter()
        .filter(|p| recorded.favourites.iter().any(|id| p["_id"] == id.as_str()))
        .map(|p| json!({"product": p}))
        .collect();
    Json(Value::Array(saved)).into_response()
}

#[allow(clippy::unwrap_used)]
async fn add_favourite(
    State(state): State<MockState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if bearer(&headers).is_none() {
        return unauthorized();
    }
    let Some(id) = body["productId"].as_str() else {
        return (StatusCode::BAD_REQUEST, Json(json!({"message": "productId required"})))
            .into_response();
    };
    let mut recorded = state.recorded.lock().unwrap();
    recorded.favourite_writes.push(format!("POST {id}"));
    if !recorded.favourites.iter().any(|saved| saved == id) {
        recorded.favourites.push(id.to_string());
    }
    (StatusCode::CREATED, Json(json!({"message": "Added to favourites"}))).into_response()
}

#[allow(clippy::unwrap_used)]
async fn remove_favourite(
    State(state): State<MockState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    if bearer(&headers).is_none() {
        return unauthorized();
    }
    let mut recorded = state.recorded.lock().unwrap();
    recorded.favourite_writes.push(format!("DELETE {id}"));
    recorded.favourites.retain(|saved| *saved != id);
    Json(json!({"message": "Removed from favourites"})).into_response()
}

#[allow(clippy::unwrap_used)]
async fn create_checkout(
    State(state): State<MockState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if bearer(&headers).is_none() {
        return unauthorized();
    }
    state.recorded.lock().unwrap().checkout_requests.push(body);
    Json(json!({"url": PAYMENT_URL, "id": "cs_test_1"})).into_response()
}

async fn verify_checkout(headers: HeaderMap, Path(id): Path<String>) -> Response {
    if bearer(&headers).is_none() {
        return unauthorized();
    }
    let verified = id == "cs_test_1";
    Json(json!({"verified": verified, "orderId": verified.then_some("order-1001")})).into_response()
}

// =============================================================================
// Storefront Under Test
// =============================================================================

/// A storefront instance wired to a [`MockBackend`].
pub struct TestStorefront {
    pub backend: MockBackend,
    addr: SocketAddr,
    client: reqwest::Client,
}

impl TestStorefront {
    /// Start a storefront against a fresh backend with long-lived tokens.
    pub async fn start() -> Self {
        Self::with_backend(MockBackend::start().await).await
    }

    /// Start a storefront against `backend`.
    ///
    /// # Panics
    ///
    /// Panics if the listener cannot bind or the configuration is rejected.
    #[allow(clippy::unwrap_used)]
    pub async fn with_backend(backend: MockBackend) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let vars: HashMap<&str, String> = HashMap::from([
            ("STOREFRONT_BASE_URL", format!("http://{addr}")),
            ("STOREFRONT_PORT", addr.port().to_string()),
            ("EYEWEAR_API_URL", backend.api_url()),
            ("EXCHANGE_RATES_URL", backend.rates_url()),
            ("API_TIMEOUT_SECS", "5".to_string()),
        ]);
        let config = StorefrontConfig::from_lookup(|key| vars.get(key).cloned()).unwrap();
        let app = build_app(AppState::new(config).unwrap());

        tokio::spawn(async move {
            axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await
            .ok();
        });

        let client = reqwest::Client::builder()
            .cookie_store(true)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .unwrap();

        Self {
            backend,
            addr,
            client,
        }
    }

    /// Absolute URL for a storefront path.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    /// The shopper's browser: keeps cookies, does not follow redirects.
    #[must_use]
    pub const fn client(&self) -> &reqwest::Client {
        &self.client
    }

    /// `GET` a path.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be sent.
    #[allow(clippy::unwrap_used)]
    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client.get(self.url(path)).send().await.unwrap()
    }

    /// `GET` a path as HTMX would.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be sent.
    #[allow(clippy::unwrap_used)]
    pub async fn hx_get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .header("HX-Request", "true")
            .send()
            .await
            .unwrap()
    }

    /// `POST` a form.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be sent.
    #[allow(clippy::unwrap_used)]
    pub async fn post_form(&self, path: &str, form: &[(&str, &str)]) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .form(form)
            .send()
            .await
            .unwrap()
    }

    /// `POST` a form as HTMX would.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be sent.
    #[allow(clippy::unwrap_used)]
    pub async fn hx_post_form(&self, path: &str, form: &[(&str, &str)]) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .header("HX-Request", "true")
            .form(form)
            .send()
            .await
            .unwrap()
    }

    /// Log in as the seeded shopper and return the redirect response.
    pub async fn login(&self, next: &str) -> reqwest::Response {
        self.post_form(
            "/auth/login",
            &[("email", EMAIL), ("password", PASSWORD), ("next", next)],
        )
        .await
    }
}

/// The `Location` header of a redirect, or an empty string.
#[must_use]
pub fn location(response: &reqwest::Response) -> String {
    response
        .headers()
        .get("location")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}
