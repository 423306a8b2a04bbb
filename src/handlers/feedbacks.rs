use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::entities::Feedback;
use crate::error::ApiError;
use crate::services::FeedbackListFilters;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct FeedbackIn {
    pub token_id: Uuid,
    pub rating: i16,
    pub description: String,
}

/// POST /api/v1/feedback_receivers/feedbacks - token-scoped redemption
pub async fn add(
    State(state): State<AppState>,
    Json(dto): Json<FeedbackIn>,
) -> Result<StatusCode, ApiError> {
    state
        .redemption
        .redeem(dto.token_id, dto.rating, &dto.description, None, Utc::now())
        .await?;
    Ok(StatusCode::OK)
}

/// POST /api/v1/feedback_receivers/:id/feedbacks - receiver-scoped
/// redemption; the path receiver must match the token's bound receiver
pub async fn add_for_receiver(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(dto): Json<FeedbackIn>,
) -> Result<StatusCode, ApiError> {
    state
        .redemption
        .redeem(
            dto.token_id,
            dto.rating,
            &dto.description,
            Some(id),
            Utc::now(),
        )
        .await?;
    Ok(StatusCode::OK)
}

#[derive(Debug, Default, Deserialize)]
pub struct ListFeedbacksQuery {
    pub created_after: Option<DateTime<Utc>>,
    pub created_before: Option<DateTime<Utc>>,
}

/// GET /api/v1/feedback_receivers/:id/feedbacks
pub async fn list(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<ListFeedbacksQuery>,
) -> Result<Json<Vec<Feedback>>, ApiError> {
    let filters = FeedbackListFilters {
        feedback_receiver_id: Some(id),
        created_after: query.created_after,
        created_before: query.created_before,
    };
    Ok(Json(state.feedbacks.list(&filters).await?))
}
