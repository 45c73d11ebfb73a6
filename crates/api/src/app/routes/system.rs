use axum::{http::StatusCode, Json};
use serde_json::{json, Value};

pub async fn health() -> StatusCode {
    StatusCode::OK
}

pub async fn status() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
