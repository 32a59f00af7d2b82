//! Pupillary distance from iris landmarks.
//!
//! The face mesh runs in the browser and reports, per eye, the iris centre
//! and four points on the iris boundary in image pixels. The human iris is
//! close to 11.7 mm across regardless of age or build, which gives the
//! pixel-to-millimetre scale for the whole face.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Average horizontal visible iris diameter in millimetres.
pub const IRIS_DIAMETER_MM: f64 = 11.7;

/// Adult PD range; results outside it are returned but flagged.
pub const PLAUSIBLE_RANGE_MM: (f64, f64) = (45.0, 80.0);

/// A point in image pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    const fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Iris landmarks for one eye.
///
/// `boundary` is ordered around the iris so that `[0]`/`[2]` and `[1]`/`[3]`
/// are opposite each other.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IrisLandmarks {
    pub center: Point,
    pub boundary: [Point; 4],
}

impl IrisLandmarks {
    /// Mean of the two boundary chords.
    #[must_use]
    pub fn diameter(&self) -> f64 {
        let [a, b, c, d] = self.boundary;
        (a.distance(c) + b.distance(d)) / 2.0
    }

    fn is_finite(&self) -> bool {
        self.center.is_finite() && self.boundary.iter().all(|p| p.is_finite())
    }
}

/// Landmarks for both eyes from a single frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FaceLandmarks {
    pub left_iris: IrisLandmarks,
    pub right_iris: IrisLandmarks,
}

/// Errors from [`measure`].
#[derive(Debug, Clone, Copy, Error, PartialEq)]
pub enum PdError {
    #[error("landmark coordinates must be finite numbers")]
    NonFinite,
    #[error("iris diameter must be positive (got {0:.3}px)")]
    DegenerateIris(f64),
}

/// A PD measurement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PdMeasurement {
    /// Distance between iris centres in pixels.
    pub pixel_distance: f64,
    /// Mean iris diameter in pixels.
    pub iris_diameter_px: f64,
    /// PD in millimetres, rounded to one decimal.
    pub millimeters: f64,
    /// Whether the result falls inside the adult range.
    pub plausible: bool,
}

/// Convert landmarks to a PD measurement.
///
/// # Errors
///
/// Returns [`PdError::NonFinite`] for NaN or infinite coordinates, or when
/// the coordinates are so large that an intermediate value overflows, and
/// [`PdError::DegenerateIris`] when the iris has no measurable width.
pub fn measure(face: &FaceLandmarks) -> Result<PdMeasurement, PdError> {
    if !face.left_iris.is_finite() || !face.right_iris.is_finite() {
        return Err(PdError::NonFinite);
    }

    // Finite coordinates can still overflow when subtracted
    let iris_diameter_px = (face.left_iris.diameter() + face.right_iris.diameter()) / 2.0;
    let pixel_distance = face.left_iris.center.distance(face.right_iris.center);
    if !iris_diameter_px.is_finite() || !pixel_distance.is_finite() {
        return Err(PdError::NonFinite);
    }
    if iris_diameter_px <= f64::EPSILON {
        return Err(PdError::DegenerateIris(iris_diameter_px));
    }

    let mm = pixel_distance * IRIS_DIAMETER_MM / iris_diameter_px;
    if !mm.is_finite() {
        return Err(PdError::NonFinite);
    }
    let millimeters = (mm * 10.0).round() / 10.0;
    let (low, high) = PLAUSIBLE_RANGE_MM;

    Ok(PdMeasurement {
        pixel_distance,
        iris_diameter_px,
        millimeters,
        plausible: (low..=high).contains(&millimeters),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn iris(cx: f64, cy: f64, radius: f64) -> IrisLandmarks {
        IrisLandmarks {
            center: Point::new(cx, cy),
            boundary: [
                Point::new(cx + radius, cy),
                Point::new(cx, cy + radius),
                Point::new(cx - radius, cy),
                Point::new(cx, cy - radius),
            ],
        }
    }

    #[test]
    fn test_point_distance() {
        assert!((Point::new(0.0, 0.0).distance(Point::new(3.0, 4.0)) - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_measure_scales_by_iris_width() {
        // Iris 23.4px wide => 0.5 mm/px; centres 126px apart => 63mm.
        let face = FaceLandmarks {
            left_iris: iris(100.0, 200.0, 11.7),
            right_iris: iris(226.0, 200.0, 11.7),
        };
        let pd = measure(&face).unwrap();
        assert!((pd.iris_diameter_px - 23.4).abs() < 1e-9);
        assert!((pd.pixel_distance - 126.0).abs() < 1e-9);
        assert!((pd.millimeters - 63.0).abs() < 1e-9);
        assert!(pd.plausible);
    }

    #[test]
    fn test_measure_is_scale_invariant() {
        let near = FaceLandmarks {
            left_iris: iris(0.0, 0.0, 20.0),
            right_iris: iris(220.0, 0.0, 20.0),
        };
        let far = FaceLandmarks {
            left_iris: iris(0.0, 0.0, 10.0),
            right_iris: iris(110.0, 0.0, 10.0),
        };
        assert_eq!(
            measure(&near).unwrap().millimeters,
            measure(&far).unwrap().millimeters
        );
    }

    #[test]
    fn test_implausible_result_is_flagged() {
        let face = FaceLandmarks {
            left_iris: iris(0.0, 0.0, 2.0),
            right_iris: iris(100.0, 0.0, 2.0),
        };
        let pd = measure(&face).unwrap();
        assert!(!pd.plausible);
    }

    #[test]
    fn test_degenerate_iris_is_rejected() {
        let face = FaceLandmarks {
            left_iris: iris(0.0, 0.0, 0.0),
            right_iris: iris(50.0, 0.0, 0.0),
        };
        assert!(matches!(measure(&face), Err(PdError::DegenerateIris(_))));
    }

    #[test]
    fn test_non_finite_is_rejected() {
        let face = FaceLandmarks {
            left_iris: iris(f64::NAN, 0.0, 5.0),
            right_iris: iris(50.0, 0.0, 5.0),
        };
        assert_eq!(measure(&face), Err(PdError::NonFinite));
    }

    #[test]
    fn test_overflowing_coordinates_are_rejected() {
        let face = FaceLandmarks {
            left_iris: iris(0.0, 0.0, 1e308),
            right_iris: iris(1e308, 0.0, 1e308),
        };
        assert_eq!(measure(&face), Err(PdError::NonFinite));

        // Each centre is finite but their distance is not
        let face = FaceLandmarks {
            left_iris: iris(-1.5e308, 0.0, 5.0),
            right_iris: iris(1.5e308, 0.0, 5.0),
        };
        assert_eq!(measure(&face), Err(PdError::NonFinite));
    }

    #[test]
    fn test_landmarks_deserialize() {
        let json = r#"{
            "left_iris": {"center": {"x": 1, "y": 2},
                          "boundary": [{"x": 2, "y": 2}, {"x": 1, "y": 3}, {"x": 0, "y": 2}, {"x": 1, "y": 1}]},
            "right_iris": {"center": {"x": 9, "y": 2},
                           "boundary": [{"x": 10, "y": 2}, {"x": 9, "y": 3}, {"x": 8, "y": 2}, {"x": 9, "y": 1}]}
        }"#;
        let face: FaceLandmarks = serde_json::from_str(json).unwrap();
        assert!((face.left_iris.diameter() - 2.0).abs() < 1e-9);
    }
}
