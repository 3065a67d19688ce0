use crate::{database, error::Result, AppState};
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value as JsonValue};

#[axum::debug_handler]
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let body = json!({
        "status": "ok",
        "app": state.settings.app_name,
        "env": state.settings.app_env,
    });
    (StatusCode::OK, Json(body))
}

/// Succeeds only when the database answers.
pub async fn ready(State(state): State<AppState>) -> Result<Json<JsonValue>> {
    database::ping(&state.pool).await?;
    Ok(Json(json!({ "status": "ready" })))
}
