use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::FeedbackReceiver;

/// Token is a single-use capability: possession of a valid token grants the
/// right to submit exactly one Feedback to the receiver it is bound to.
///
/// `time_used` transitions at most once, from `None` to a timestamp, and is
/// never cleared. The transition itself is performed by the store through a
/// conditional update; see `TokensService::mark_used`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Token {
    pub id: Uuid,
    pub feedback_receiver_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub expiry_time: Option<DateTime<Utc>>,
    pub time_used: Option<DateTime<Utc>>,
}

impl Token {
    pub fn new(
        feedback_receiver_id: Uuid,
        expiry_time: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            feedback_receiver_id,
            created_at: now,
            expiry_time,
            time_used: None,
        }
    }

    /// A token is valid while it is unused and not yet expired. A token whose
    /// `expiry_time <= now` is invalid regardless of use state, and a used
    /// token is invalid regardless of expiry.
    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        let expired = self.expiry_time.map_or(false, |e| e <= now);
        self.time_used.is_none() && !expired
    }

    /// Bound form of `is_valid`: additionally requires the token to belong to
    /// the given receiver.
    pub fn is_valid_for(&self, receiver: &FeedbackReceiver, now: DateTime<Utc>) -> bool {
        self.feedback_receiver_id == receiver.id && self.is_valid(now)
    }
}
