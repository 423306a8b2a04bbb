use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use super::parse_id_list;
use crate::config;
use crate::entities::Token;
use crate::error::ApiError;
use crate::services::TokenListFilters;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct GenerateTokensIn {
    #[serde(default = "default_number_of_tokens")]
    pub number_of_tokens: i64,
    pub feedback_receiver_id: Uuid,
    pub expiry_time: Option<DateTime<Utc>>,
}

fn default_number_of_tokens() -> i64 {
    1
}

/// POST /api/v1/tokens - generate a batch of tokens for a receiver
pub async fn generate(
    State(state): State<AppState>,
    Json(dto): Json<GenerateTokensIn>,
) -> Result<Json<Value>, ApiError> {
    let now = Utc::now();
    let max_batch = config::config().max_tokens_per_batch;

    if !(1..=max_batch).contains(&dto.number_of_tokens) {
        return Err(ApiError::bad_request(format!(
            "numberOfTokens is out of range, allowed ranges [1-{max_batch}]"
        )));
    }
    if let Some(expiry) = dto.expiry_time {
        if expiry <= now {
            return Err(ApiError::bad_request("expiryTime cannot be in the past!"));
        }
    }

    // Generation does not validate the receiver; the boundary does.
    let receivers = state
        .receivers
        .find(&[dto.feedback_receiver_id], None, Some(1))
        .await?;
    if receivers.is_empty() {
        return Err(ApiError::bad_request(format!(
            "Invalid FeedbackReceiverId {}.",
            dto.feedback_receiver_id
        )));
    }

    state
        .tokens
        .generate(
            dto.number_of_tokens,
            dto.feedback_receiver_id,
            dto.expiry_time,
            now,
        )
        .await?;

    Ok(Json(json!({ "message": "Tokens generated." })))
}

#[derive(Debug, Default, Deserialize)]
pub struct ListTokensQuery {
    /// Comma-separated token ids.
    pub ids: Option<String>,
    pub feedback_receiver_id: Option<Uuid>,
    pub created_after: Option<DateTime<Utc>>,
    pub created_before: Option<DateTime<Utc>>,
    pub used_after: Option<DateTime<Utc>>,
    pub used_before: Option<DateTime<Utc>>,
}

/// GET /api/v1/tokens - list tokens matching the query filters
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListTokensQuery>,
) -> Result<Json<Vec<Token>>, ApiError> {
    let filters = TokenListFilters {
        ids: parse_id_list(query.ids.as_deref())?,
        feedback_receiver_id: query.feedback_receiver_id,
        created_after: query.created_after,
        created_before: query.created_before,
        used_after: query.used_after,
        used_before: query.used_before,
    };
    Ok(Json(state.tokens.find(&filters).await?))
}

/// DELETE /api/v1/tokens - bulk delete by id list
pub async fn delete_many(
    State(state): State<AppState>,
    Json(ids): Json<Vec<Uuid>>,
) -> Result<StatusCode, ApiError> {
    state.tokens.delete(&ids).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/v1/tokens/:id
pub async fn delete_one(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.tokens.delete(&[id]).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/tokens/:id/check - validity probe; a missing token is
/// reported as invalid, not as an error
pub async fn check(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let valid = state.redemption.check_token(id, Utc::now()).await?;
    Ok(Json(json!({ "valid": valid })))
}
