//! Authentication extractors.
//!
//! The logged-in user lives in the session. Every extraction checks the
//! backend token's `exp` claim and drops an expired session on the spot, so
//! handlers never see a stale token.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;
use tower_sessions::Session;

use crate::api::ApiError;
use crate::error::clear_sentry_user;
use crate::models::{CurrentUser, session_keys};

/// Extractor that requires a logged-in user.
///
/// If the user is not logged in (or the token expired), returns a redirect
/// to the login page.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAuth(current): RequireAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", current.user.name)
/// }
/// ```
pub struct RequireAuth(pub CurrentUser);

/// Error returned when authentication is required but the user is not logged in.
#[derive(Debug)]
pub enum AuthRejection {
    /// Redirect to login page (for page requests).
    RedirectToLogin { next: String },
    /// Ask HTMX to navigate to the login page (for fragment requests).
    HxRedirect,
    /// Unauthorized response (for API requests).
    Unauthorized,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin { next } => {
                let target = format!("/auth/login?next={}", urlencoding::encode(&next));
                Redirect::to(&target).into_response()
            }
            Self::HxRedirect => {
                (StatusCode::UNAUTHORIZED, [("HX-Redirect", "/auth/login")]).into_response()
            }
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
        }
    }
}

fn rejection(parts: &Parts) -> AuthRejection {
    if parts.uri.path().starts_with("/api/") {
        AuthRejection::Unauthorized
    } else if parts.headers.contains_key("hx-request") {
        AuthRejection::HxRedirect
    } else {
        AuthRejection::RedirectToLogin {
            next: parts.uri.path().to_string(),
        }
    }
}

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Get the session from extensions (set by SessionManagerLayer)
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or(AuthRejection::Unauthorized)?;

        current_user(session)
            .await
            .map(Self)
            .ok_or_else(|| rejection(parts))
    }
}

/// Extractor that optionally gets the current user.
///
/// Unlike `RequireAuth`, this does not reject the request if the user is not
/// logged in.
pub struct OptionalAuth(pub Option<CurrentUser>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = match parts.extensions.get::<Session>() {
            Some(session) => current_user(session).await,
            None => None,
        };

        Ok(Self(user))
    }
}

/// Read the current user, dropping it if the token has expired.
pub async fn current_user(session: &Session) -> Option<CurrentUser> {
    let user: CurrentUser = session
        .get(session_keys::CURRENT_USER)
        .await
        .ok()
        .flatten()?;

    if user.is_expired_at(Utc::now()) {
        tracing::info!(user_id = %user.user.id, "Session token expired, logging out");
        if let Err(e) = clear_current_user(session).await {
            tracing::warn!("Failed to clear expired session: {e}");
        }
        return None;
    }

    Some(user)
}

/// Helper to set the current user in the session.
///
/// Cycles the session id to prevent fixation.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_USER, user).await
}

/// Helper to clear the current user from the session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<CurrentUser>(session_keys::CURRENT_USER)
        .await?;
    clear_sentry_user();
    Ok(())
}

/// Drop the session user when the backend rejected its token.
pub async fn forget_on_unauthorized(session: &Session, err: &ApiError) {
    if matches!(err, ApiError::Unauthorized(_)) {
        tracing::info!("Backend rejected session token, logging out");
        if let Err(e) = clear_current_user(session).await {
            tracing::warn!("Failed to clear rejected session: {e}");
        }
    }
}
