//! Authentication route handlers.
//!
//! Handles login, registration and logout against the backend's user
//! endpoints. The returned token and profile are kept in the session; the
//! browser only ever sees the session cookie.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use eyewear_core::Email;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::api::{ApiError, LoginRequest, RegisterRequest, SessionUser};
use crate::error::{add_breadcrumb, set_sentry_user};
use crate::filters;
use crate::middleware::{clear_current_user, set_current_user};
use crate::routes::account::MIN_PASSWORD_LENGTH;
use crate::services::PageContext;
use crate::state::AppState;

/// Where a successful login lands when no `next` was given.
const DEFAULT_LANDING: &str = "/account";

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: SecretString,
    #[serde(default)]
    pub next: Option<String>,
}

/// Registration form data.
#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub password: SecretString,
    pub password_confirm: SecretString,
    #[serde(default)]
    pub next: Option<String>,
}

// =============================================================================
// Query Types
// =============================================================================

/// Query parameters for the auth pages.
#[derive(Debug, Deserialize)]
pub struct AuthQuery {
    pub error: Option<String>,
    pub next: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub page: PageContext,
    pub error: Option<&'static str>,
    pub next: String,
}

/// Register page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub page: PageContext,
    pub error: Option<&'static str>,
    pub next: String,
}

// =============================================================================
// Helpers
// =============================================================================

/// Only same-site absolute paths are honoured as post-login targets.
fn safe_next(next: Option<&str>) -> &str {
    match next.map(str::trim) {
        Some(path)
            if path.starts_with('/')
                && !path.starts_with("//")
                && !path.contains('\\')
                && !path.starts_with("/auth/") =>
        {
            path
        }
        _ => DEFAULT_LANDING,
    }
}

/// Shopper-facing text for an error code in the query string.
fn error_message(code: &str) -> &'static str {
    match code {
        "credentials" => "Invalid email or password.",
        "email" => "Please enter a valid email address.",
        "name" => "Please enter your name.",
        "password_mismatch" => "Passwords do not match.",
        "password_too_short" => "Password must be at least 8 characters.",
        "email_taken" => "An account with this email already exists.",
        "rate_limited" => "Too many attempts. Please wait a minute and try again.",
        "session" => "We couldn't sign you in. Please try again.",
        _ => "Something went wrong. Please try again.",
    }
}

fn back_to(page: &str, code: &str, next: &str) -> Response {
    Redirect::to(&format!(
        "/auth/{page}?error={code}&next={}",
        urlencoding::encode(next)
    ))
    .into_response()
}

fn register_error_code(err: &ApiError) -> &'static str {
    match err {
        ApiError::Status { message, .. } if err.is_client_error() => {
            let lower = message.to_lowercase();
            if lower.contains("exist") || lower.contains("taken") || lower.contains("already") {
                "email_taken"
            } else {
                "failed"
            }
        }
        ApiError::RateLimited(_) => "rate_limited",
        _ => "failed",
    }
}

/// Store the session and send the shopper on.
async fn sign_in(session: &Session, user: &SessionUser, next: &str, page: &str) -> Response {
    if let Err(e) = set_current_user(session, user).await {
        tracing::error!("Failed to set session: {e}");
        return back_to(page, "session", next);
    }
    set_sentry_user(&user.user.id, Some(&user.user.email));
    add_breadcrumb("auth", "Signed in", None);
    tracing::info!(user_id = %user.user.id, "User signed in");
    Redirect::to(next).into_response()
}

// =============================================================================
// Login Routes
// =============================================================================

/// Display the login page.
pub async fn login_page(page: PageContext, Query(query): Query<AuthQuery>) -> impl IntoResponse {
    LoginTemplate {
        page,
        error: query.error.as_deref().map(error_message),
        next: safe_next(query.next.as_deref()).to_string(),
    }
}

/// Handle login form submission.
#[instrument(skip(state, session, form))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Response {
    let next = safe_next(form.next.as_deref()).to_string();

    let Ok(email) = Email::parse(&form.email) else {
        return back_to("login", "email", &next);
    };

    let request = LoginRequest {
        email: email.as_str(),
        password: form.password.expose_secret(),
    };

    match state.api().login(&request).await {
        Ok(user) => sign_in(&session, &user, &next, "login").await,
        Err(ApiError::RateLimited(_)) => back_to("login", "rate_limited", &next),
        Err(e) => {
            tracing::warn!("Login failed: {e}");
            let code = if matches!(e, ApiError::Unauthorized(_)) || e.is_client_error() {
                "credentials"
            } else {
                "failed"
            };
            back_to("login", code, &next)
        }
    }
}

// =============================================================================
// Registration Routes
// =============================================================================

/// Display the registration page.
pub async fn register_page(page: PageContext, Query(query): Query<AuthQuery>) -> impl IntoResponse {
    RegisterTemplate {
        page,
        error: query.error.as_deref().map(error_message),
        next: safe_next(query.next.as_deref()).to_string(),
    }
}

/// Handle registration form submission. A successful registration signs the
/// shopper in straight away.
#[instrument(skip(state, session, form))]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<RegisterForm>,
) -> Response {
    let next = safe_next(form.next.as_deref()).to_string();

    let name = form.name.trim();
    if name.is_empty() {
        return back_to("register", "name", &next);
    }
    let Ok(email) = Email::parse(&form.email) else {
        return back_to("register", "email", &next);
    };
    let password = form.password.expose_secret();
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return back_to("register", "password_too_short", &next);
    }
    if password != form.password_confirm.expose_secret() {
        return back_to("register", "password_mismatch", &next);
    }

    let request = RegisterRequest {
        name,
        email: email.as_str(),
        password,
        phone: form.phone.as_deref().map(str::trim).filter(|p| !p.is_empty()),
    };

    match state.api().register(&request).await {
        Ok(user) => sign_in(&session, &user, &next, "register").await,
        Err(e) => {
            tracing::warn!("Registration failed: {e}");
            back_to("register", register_error_code(&e), &next)
        }
    }
}

// =============================================================================
// Logout
// =============================================================================

/// Handle logout.
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Response {
    if let Err(e) = clear_current_user(&session).await {
        tracing::error!("Failed to clear session: {e}");
    }
    Redirect::to("/").into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_next_accepts_local_paths() {
        assert_eq!(safe_next(Some("/account/orders")), "/account/orders");
        assert_eq!(safe_next(Some("/checkout")), "/checkout");
    }

    #[test]
    fn test_safe_next_rejects_offsite_targets() {
        assert_eq!(safe_next(None), DEFAULT_LANDING);
        assert_eq!(safe_next(Some("https://evil.example")), DEFAULT_LANDING);
        assert_eq!(safe_next(Some("//evil.example")), DEFAULT_LANDING);
        assert_eq!(safe_next(Some("/\\evil.example")), DEFAULT_LANDING);
        assert_eq!(safe_next(Some("/auth/logout")), DEFAULT_LANDING);
    }

    #[test]
    fn test_register_error_codes() {
        let taken = ApiError::Status {
            status: 400,
            message: "User already exists".to_string(),
        };
        assert_eq!(register_error_code(&taken), "email_taken");

        let down = ApiError::Status {
            status: 503,
            message: "already".to_string(),
        };
        assert_eq!(register_error_code(&down), "failed");
    }

    #[test]
    fn test_unknown_error_code_is_generic() {
        assert_eq!(error_message("<script>"), "Something went wrong. Please try again.");
    }
}
