/*
 * Responsibility
 * - GET /health, GET /api/v1/health (疎通用, JwtRequired を通さない)
 */
use axum::Json;
use serde_json::{Value, json};

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
