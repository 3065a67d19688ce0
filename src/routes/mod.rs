pub mod health;

use crate::{middleware::cors::cors_layer, AppState};
use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

pub fn router(state: AppState) -> Router {
    let cors = cors_layer(&state.settings);
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::ready))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
