//! PD calculation from a landmarks file.
//!
//! The file holds the same JSON body the storefront's `/api/pd` endpoint
//! accepts, which makes it easy to replay a browser capture.

use std::path::Path;

use eyewear_core::pd::{self, FaceLandmarks};
use tracing::{info, warn};

/// Read landmarks and log the measurement.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or the landmarks
/// are unusable.
pub async fn run(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let content = tokio::fs::read_to_string(path).await?;
    let face: FaceLandmarks = serde_json::from_str(&content)?;

    let measurement = pd::measure(&face)?;
    info!(
        pixel_distance = measurement.pixel_distance,
        iris_diameter_px = measurement.iris_diameter_px,
        "PD: {:.1} mm",
        measurement.millimeters
    );
    if !measurement.plausible {
        warn!("Result is outside the usual adult range; recapture the landmarks");
    }

    Ok(())
}
