//! Product reviews and their aggregate statistics.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{ProductId, ReviewId};

/// A published review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawReview")]
pub struct Review {
    pub id: ReviewId,
    pub product_id: Option<ProductId>,
    /// Reviewer display name.
    pub author: String,
    pub rating: u8,
    pub comment: String,
    pub created_at: Option<DateTime<Utc>>,
}

/// A related document: either its id or the populated document.
#[derive(Deserialize)]
#[serde(untagged)]
enum Reference {
    Id(String),
    Document {
        #[serde(rename = "_id")]
        mongo_id: Option<String>,
        id: Option<String>,
        name: Option<String>,
    },
}

impl Reference {
    fn id(self) -> Option<String> {
        match self {
            Self::Id(id) => Some(id),
            Self::Document { mongo_id, id, .. } => id.or(mongo_id),
        }
    }

    fn name(self) -> Option<String> {
        match self {
            Self::Id(_) => None,
            Self::Document { name, .. } => name,
        }
    }
}

/// The backend sends the reviewer as `name`, a populated `user`, or both
/// (with `user` then being a bare id).
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawReview {
    #[serde(rename = "_id")]
    mongo_id: Option<ReviewId>,
    id: Option<ReviewId>,
    product_id: Option<ProductId>,
    product: Option<Reference>,
    author: Option<String>,
    name: Option<String>,
    user: Option<Reference>,
    rating: u8,
    comment: Option<String>,
    review: Option<String>,
    text: Option<String>,
    created_at: Option<DateTime<Utc>>,
}

impl TryFrom<RawReview> for Review {
    type Error = &'static str;

    fn try_from(raw: RawReview) -> Result<Self, Self::Error> {
        Ok(Self {
            id: raw.id.or(raw.mongo_id).ok_or("review has no id")?,
            product_id: raw
                .product_id
                .or_else(|| raw.product.and_then(Reference::id).map(ProductId::new)),
            author: raw
                .author
                .or(raw.name)
                .or_else(|| raw.user.and_then(Reference::name))
                .unwrap_or_default(),
            rating: raw.rating,
            comment: raw.comment.or(raw.review).or(raw.text).unwrap_or_default(),
            created_at: raw.created_at,
        })
    }
}

/// Aggregate rating statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ReviewStats {
    pub count: u32,
    /// Mean rating rounded to one decimal; zero when there are no reviews.
    pub average: f64,
    /// Number of reviews per star, index 0 = one star.
    pub distribution: [u32; 5],
}

impl ReviewStats {
    /// Compute statistics. Ratings outside 1..=5 are clamped.
    #[must_use]
    pub fn from_reviews(reviews: &[Review]) -> Self {
        let mut stats = Self::default();
        let mut sum = 0u32;
        for review in reviews {
            let stars = review.rating.clamp(1, 5);
            sum += u32::from(stars);
            stats.count += 1;
            if let Some(bucket) = stats.distribution.get_mut(usize::from(stars - 1)) {
                *bucket += 1;
            }
        }
        if stats.count > 0 {
            let mean = f64::from(sum) / f64::from(stats.count);
            stats.average = (mean * 10.0).round() / 10.0;
        }
        stats
    }

    /// Percentage of reviews with `stars` stars, for the histogram bars.
    #[must_use]
    pub fn percent(&self, stars: u8) -> u32 {
        if self.count == 0 || !(1..=5).contains(&stars) {
            return 0;
        }
        let n = self
            .distribution
            .get(usize::from(stars - 1))
            .copied()
            .unwrap_or(0);
        n * 100 / self.count
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn reviews(ratings: &[u8]) -> Vec<Review> {
        ratings
            .iter()
            .enumerate()
            .map(|(i, r)| Review {
                id: ReviewId::new(format!("r{i}")),
                product_id: None,
                author: "A".into(),
                rating: *r,
                comment: String::new(),
                created_at: None,
            })
            .collect()
    }

    #[test]
    fn test_empty_reviews_are_zeroed() {
        let stats = ReviewStats::from_reviews(&[]);
        assert_eq!(stats, ReviewStats::default());
        assert_eq!(stats.percent(5), 0);
    }

    #[test]
    fn test_average_and_distribution() {
        let stats = ReviewStats::from_reviews(&reviews(&[5, 4, 4, 1]));
        assert_eq!(stats.count, 4);
        assert!((stats.average - 3.5).abs() < f64::EPSILON);
        assert_eq!(stats.distribution, [1, 0, 0, 2, 1]);
        assert_eq!(stats.percent(4), 50);
    }

    #[test]
    fn test_out_of_range_ratings_are_clamped() {
        let stats = ReviewStats::from_reviews(&reviews(&[0, 9]));
        assert_eq!(stats.distribution, [1, 0, 0, 0, 1]);
    }

    #[test]
    fn test_review_author_shapes() {
        let named: Review =
            serde_json::from_str(r#"{"_id":"1","name":"Ana","rating":5,"comment":"Great"}"#)
                .unwrap();
        assert_eq!(named.author, "Ana");

        let populated: Review = serde_json::from_str(
            r#"{"_id":"2","user":{"_id":"u1","name":"Ben"},"rating":4,"review":"Fine"}"#,
        )
        .unwrap();
        assert_eq!(populated.author, "Ben");
        assert_eq!(populated.comment, "Fine");

        let both: Review = serde_json::from_str(
            r#"{"_id":"3","id":"3","name":"Cleo","user":"u9","product":"p1","rating":3,"comment":"Ok"}"#,
        )
        .unwrap();
        assert_eq!(both.id.as_str(), "3");
        assert_eq!(both.author, "Cleo");
        assert_eq!(both.product_id.as_ref().map(ProductId::as_str), Some("p1"));
    }
}
