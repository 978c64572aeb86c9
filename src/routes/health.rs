use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::AppState;

const SERVICE_NAME: &str = "quiz-generator-api";
const VERSION: &str = env!("CARGO_PKG_VERSION");

pub async fn root() -> impl IntoResponse {
    Json(json!({
        "message": "Quiz Generator API",
        "version": VERSION,
        "docs": "/api/v1/openapi.json",
        "status": "running",
    }))
}

#[axum::debug_handler]
pub async fn health() -> impl IntoResponse {
    let body = json!({
        "status": "healthy",
        "service": SERVICE_NAME,
        "version": VERSION,
    });
    (StatusCode::OK, Json(body))
}

/// Health including a live round trip to the model.
#[axum::debug_handler]
pub async fn api_health(State(state): State<AppState>) -> impl IntoResponse {
    let model_connected = match &state.ai_service {
        Some(ai) => ai.test_connection().await,
        None => false,
    };

    let body = json!({
        "status": "healthy",
        "database": "connected",
        "gemini_api": if model_connected { "connected" } else { "disconnected" },
        "version": VERSION,
    });
    (StatusCode::OK, Json(body))
}
