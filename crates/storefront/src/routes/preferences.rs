//! Shopper preference handlers: display currency and dismissed banners.

use axum::{
    Form,
    extract::Path,
    http::{HeaderMap, StatusCode, header::REFERER},
    response::{IntoResponse, Redirect, Response},
};
use eyewear_core::CurrencyCode;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::services::{announcements, currency};

/// Currency picker form data.
#[derive(Debug, Deserialize)]
pub struct CurrencyForm {
    pub currency: String,
}

/// Path of the referring page when it is on this site.
fn referer_path(headers: &HeaderMap) -> String {
    headers
        .get(REFERER)
        .and_then(|v| v.to_str().ok())
        .and_then(|r| url::Url::parse(r).ok())
        .filter(|u| {
            headers.get("host").and_then(|h| h.to_str().ok()) == Some(host_port(u).as_str())
        })
        .map_or_else(
            || "/".to_string(),
            |u| match u.query() {
                Some(q) => format!("{}?{q}", u.path()),
                None => u.path().to_string(),
            },
        )
}

fn host_port(url: &url::Url) -> String {
    match (url.host_str(), url.port()) {
        (Some(host), Some(port)) => format!("{host}:{port}"),
        (Some(host), None) => host.to_string(),
        _ => String::new(),
    }
}

/// Select the display currency, then reload the current page.
#[instrument(skip(session, headers))]
pub async fn select_currency(
    session: Session,
    headers: HeaderMap,
    Form(form): Form<CurrencyForm>,
) -> Result<Response> {
    let code: CurrencyCode = form
        .currency
        .parse()
        .map_err(|e: eyewear_core::CurrencyParseError| {
            AppError::BadRequest(e.to_string())
        })?;
    currency::select(&session, code).await?;
    tracing::debug!(currency = %code, "Currency selected");

    if headers.contains_key("hx-request") {
        return Ok((StatusCode::NO_CONTENT, [("HX-Refresh", "true")]).into_response());
    }
    Ok(Redirect::to(&referer_path(&headers)).into_response())
}

/// Hide an announcement for the rest of the session.
#[instrument(skip(session, headers))]
pub async fn dismiss_announcement(
    session: Session,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Response> {
    announcements::dismiss(&session, &id).await?;

    if headers.contains_key("hx-request") {
        // Empty body; the banner swaps itself out.
        return Ok(StatusCode::OK.into_response());
    }
    Ok(Redirect::to(&referer_path(&headers)).into_response())
}
