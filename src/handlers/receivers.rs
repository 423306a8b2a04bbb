use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use super::parse_id_list;
use crate::config;
use crate::entities::FeedbackReceiver;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct FeedbackReceiverIn {
    pub name: String,
    pub description: String,
}

/// POST /api/v1/feedback_receivers - register a batch of receivers
pub async fn create(
    State(state): State<AppState>,
    Json(items): Json<Vec<FeedbackReceiverIn>>,
) -> Result<Json<Value>, ApiError> {
    if items.is_empty() {
        return Err(ApiError::bad_request(
            "At least one FeedbackReceiver item is required.",
        ));
    }
    if items.iter().any(|i| i.name.trim().is_empty()) {
        return Err(ApiError::bad_request("name is required"));
    }

    let now = Utc::now();
    let receivers: Vec<FeedbackReceiver> = items
        .into_iter()
        .map(|i| FeedbackReceiver::new(i.name, i.description, now))
        .collect();
    state.receivers.create_many(receivers).await?;

    Ok(Json(json!({ "message": "Items created successfully!" })))
}

#[derive(Debug, Default, Deserialize)]
pub struct ListReceiversQuery {
    /// Comma-separated receiver ids; absent means all receivers.
    pub filter: Option<String>,
    pub offset: Option<i64>,
    pub limit: Option<i64>,
}

/// GET /api/v1/feedback_receivers - list receivers with optional paging
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListReceiversQuery>,
) -> Result<Json<Vec<FeedbackReceiver>>, ApiError> {
    let ids = parse_id_list(query.filter.as_deref())?;

    if let Some(offset) = query.offset {
        if offset < 1 {
            return Err(ApiError::bad_request(
                "offset is out of range, allowed ranges [1-IntMax]",
            ));
        }
    }
    let max_limit = config::config().find_max_limit;
    if let Some(limit) = query.limit {
        if !(1..=max_limit).contains(&limit) {
            return Err(ApiError::bad_request(format!(
                "limit is out of range, allowed ranges [1-{max_limit}]"
            )));
        }
    }

    let items = state.receivers.find(&ids, query.offset, query.limit).await?;
    Ok(Json(items))
}

/// GET /api/v1/feedback_receivers/:id
pub async fn get_one(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<FeedbackReceiver>, ApiError> {
    state
        .receivers
        .find(&[id], None, Some(1))
        .await?
        .into_iter()
        .next()
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("FeedbackReceiver with id {id} not found.")))
}

/// DELETE /api/v1/feedback_receivers/:id - delete one receiver, cascading to
/// its tokens
pub async fn delete_one(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    cascade_delete(&state, &[id]).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/v1/feedback_receivers - bulk delete with token cascade
pub async fn delete_many(
    State(state): State<AppState>,
    Json(ids): Json<Vec<Uuid>>,
) -> Result<StatusCode, ApiError> {
    cascade_delete(&state, &ids).await?;
    Ok(StatusCode::NO_CONTENT)
}

// Feedback records are retained on cascade; only the tokens go.
async fn cascade_delete(state: &AppState, ids: &[Uuid]) -> Result<(), ApiError> {
    tokio::try_join!(
        state.receivers.delete_many(ids),
        state.tokens.delete_by_receiver_ids(ids),
    )?;
    Ok(())
}
