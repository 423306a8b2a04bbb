use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Largest accepted rating value (inclusive).
pub const MAX_RATING: i16 = 5;

#[derive(Debug, thiserror::Error)]
#[error("The rating is out of range. [0-{MAX_RATING}], got {0}")]
pub struct RatingOutOfRange(pub i16);

/// Feedback is a rating+comment record attributed to a FeedbackReceiver,
/// created exactly once per successful token redemption and immutable
/// thereafter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Feedback {
    pub id: Uuid,
    pub feedback_receiver_id: Uuid,
    pub rating: i16,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl Feedback {
    /// Constructs a Feedback, rejecting ratings outside `[0, MAX_RATING]`.
    pub fn new(
        feedback_receiver_id: Uuid,
        rating: i16,
        description: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<Self, RatingOutOfRange> {
        if !(0..=MAX_RATING).contains(&rating) {
            return Err(RatingOutOfRange(rating));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            feedback_receiver_id,
            rating,
            description: description.into(),
            created_at: now,
        })
    }
}
