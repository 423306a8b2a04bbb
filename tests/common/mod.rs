use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use feedback_api::handlers;
use feedback_api::state::AppState;

/// Builds the app over a fresh in-memory store. Each test gets its own
/// isolated state.
pub fn app() -> Router {
    handlers::routes(AppState::in_memory())
}

/// Issues one request against the router and returns status plus parsed JSON
/// body (Value::Null for empty bodies).
pub async fn request(
    app: &Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> anyhow::Result<(StatusCode, Value)> {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&body)?))?,
        None => builder.body(Body::empty())?,
    };

    let response = app.clone().oneshot(request).await?;
    let status = response.status();
    let bytes = response.into_body().collect().await?.to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)?
    };
    Ok((status, json))
}

/// Creates one receiver and returns its id.
pub async fn create_receiver(app: &Router, name: &str) -> anyhow::Result<String> {
    let (status, _) = request(
        app,
        "POST",
        "/api/v1/feedback_receivers",
        Some(serde_json::json!([{ "name": name, "description": "test receiver" }])),
    )
    .await?;
    anyhow::ensure!(status == StatusCode::OK, "create receiver failed: {status}");

    let (status, body) = request(app, "GET", "/api/v1/feedback_receivers", None).await?;
    anyhow::ensure!(status == StatusCode::OK, "list receivers failed: {status}");
    let id = body
        .as_array()
        .and_then(|items| {
            items
                .iter()
                .find(|item| item["name"] == name)
                .and_then(|item| item["id"].as_str())
        })
        .map(str::to_owned);
    id.ok_or_else(|| anyhow::anyhow!("receiver {name} not found after create"))
}

/// Generates `count` tokens for the receiver and returns their ids.
pub async fn generate_tokens(
    app: &Router,
    receiver_id: &str,
    count: i64,
) -> anyhow::Result<Vec<String>> {
    let (status, _) = request(
        app,
        "POST",
        "/api/v1/tokens",
        Some(serde_json::json!({
            "number_of_tokens": count,
            "feedback_receiver_id": receiver_id,
        })),
    )
    .await?;
    anyhow::ensure!(status == StatusCode::OK, "generate tokens failed: {status}");

    let (status, body) = request(
        app,
        "GET",
        &format!("/api/v1/tokens?feedback_receiver_id={receiver_id}"),
        None,
    )
    .await?;
    anyhow::ensure!(status == StatusCode::OK, "list tokens failed: {status}");
    let ids = body
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item["id"].as_str().map(str::to_owned))
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();
    Ok(ids)
}
