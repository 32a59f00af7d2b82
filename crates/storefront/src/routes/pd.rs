//! Pupillary distance measurement handlers.
//!
//! The page runs the face mesh in the browser and posts the iris landmarks
//! of a captured frame to `/api/pd`. The last measurement is kept in the
//! session so lens forms can prefill it.

use askama::Template;
use askama_web::WebTemplate;
use axum::{Json, http::StatusCode, response::IntoResponse};
use eyewear_core::pd::{self, FaceLandmarks, PdMeasurement};
use serde::Serialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::Result;
use crate::filters;
use crate::models::session_keys;
use crate::services::PageContext;

/// PD page template.
#[derive(Template, WebTemplate)]
#[template(path = "pd.html")]
pub struct PdTemplate {
    pub page: PageContext,
    pub last: Option<PdMeasurement>,
}

/// Error body for a rejected measurement.
#[derive(Debug, Serialize)]
pub struct PdErrorResponse {
    pub error: String,
}

/// Last stored measurement, if any.
pub async fn last_measurement(session: &Session) -> Option<PdMeasurement> {
    session
        .get::<PdMeasurement>(session_keys::PD)
        .await
        .ok()
        .flatten()
}

/// Display the PD measurement page.
pub async fn page(session: Session, page: PageContext) -> impl IntoResponse {
    PdTemplate {
        last: last_measurement(&session).await,
        page,
    }
}

/// Convert landmarks to a PD in millimetres.
#[instrument(skip(session, face))]
pub async fn measure(
    session: Session,
    Json(face): Json<FaceLandmarks>,
) -> Result<axum::response::Response> {
    let measurement = match pd::measure(&face) {
        Ok(m) => m,
        Err(e) => {
            tracing::debug!("Rejected PD landmarks: {e}");
            return Ok((
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(PdErrorResponse {
                    error: e.to_string(),
                }),
            )
                .into_response());
        }
    };

    session.insert(session_keys::PD, measurement).await?;
    tracing::info!(
        pd_mm = measurement.millimeters,
        plausible = measurement.plausible,
        "PD measured"
    );

    Ok(Json(measurement).into_response())
}
