use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Filters for listing tokens. Absent fields are unconstrained; an empty id
/// set means "no id filter", not "match nothing". All range bounds are
/// inclusive.
#[derive(Debug, Clone, Default)]
pub struct TokenListFilters {
    pub ids: Vec<Uuid>,
    pub feedback_receiver_id: Option<Uuid>,
    pub created_after: Option<DateTime<Utc>>,
    pub created_before: Option<DateTime<Utc>>,
    pub used_after: Option<DateTime<Utc>>,
    pub used_before: Option<DateTime<Utc>>,
}

/// Filters for listing feedbacks. `feedback_receiver_id` is required at
/// query time; the created-time bounds are optional and inclusive.
#[derive(Debug, Clone, Default)]
pub struct FeedbackListFilters {
    pub feedback_receiver_id: Option<Uuid>,
    pub created_after: Option<DateTime<Utc>>,
    pub created_before: Option<DateTime<Utc>>,
}
