//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Render a rating as five star glyphs, rounding to the nearest whole star.
///
/// Usage in templates: `{{ product.rating|stars }}`
#[askama::filter_fn]
pub fn stars(rating: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(star_string(&rating.to_string()))
}

fn star_string(rating: &str) -> String {
    let value = rating.trim().parse::<f64>().unwrap_or(0.0).clamp(0.0, 5.0);
    // Clamped to 0..=5 above, so the cast cannot truncate.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let full = value.round() as usize;
    format!("{}{}", "★".repeat(full), "☆".repeat(5 - full))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_star_string_rounds() {
        assert_eq!(star_string("4.4"), "★★★★☆");
        assert_eq!(star_string("4.5"), "★★★★★");
        assert_eq!(star_string("0"), "☆☆☆☆☆");
    }

    #[test]
    fn test_star_string_tolerates_garbage() {
        assert_eq!(star_string("n/a"), "☆☆☆☆☆");
        assert_eq!(star_string("9"), "★★★★★");
    }
}
