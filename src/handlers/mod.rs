pub mod feedbacks;
pub mod receivers;
pub mod tokens;

use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route(
            "/api/v1/feedback_receivers",
            post(receivers::create)
                .get(receivers::list)
                .delete(receivers::delete_many),
        )
        // Static segment takes precedence over :id below
        .route(
            "/api/v1/feedback_receivers/feedbacks",
            post(feedbacks::add),
        )
        .route(
            "/api/v1/feedback_receivers/:id",
            get(receivers::get_one).delete(receivers::delete_one),
        )
        .route(
            "/api/v1/feedback_receivers/:id/feedbacks",
            post(feedbacks::add_for_receiver).get(feedbacks::list),
        )
        .route(
            "/api/v1/tokens",
            post(tokens::generate)
                .get(tokens::list)
                .delete(tokens::delete_many),
        )
        .route("/api/v1/tokens/:id", delete(tokens::delete_one))
        .route("/api/v1/tokens/:id/check", get(tokens::check))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Parses a comma-separated id list query parameter.
pub(crate) fn parse_id_list(raw: Option<&str>) -> Result<Vec<Uuid>, ApiError> {
    match raw {
        None => Ok(vec![]),
        Some(raw) => raw
            .split(',')
            .filter(|s| !s.trim().is_empty())
            .map(|s| {
                Uuid::parse_str(s.trim())
                    .map_err(|_| ApiError::bad_request(format!("invalid id: {}", s.trim())))
            })
            .collect(),
    }
}

async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "name": "Feedback API",
        "version": version,
        "description": "Feedback collection backend with single-use token redemption",
        "endpoints": {
            "feedback_receivers": "/api/v1/feedback_receivers[/:id]",
            "feedbacks": "/api/v1/feedback_receivers[/:id]/feedbacks",
            "tokens": "/api/v1/tokens[/:id]",
            "token_check": "/api/v1/tokens/:id/check",
            "health": "/health",
        }
    }))
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "timestamp": chrono::Utc::now(),
    }))
}
