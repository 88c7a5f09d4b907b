//! HTTP request handlers
//!
//! Handlers stay thin: they extract the request, call into `store`, and
//! shape the result into a JSON projection.

pub mod ad;
pub mod category;
pub mod user;

use axum::Json;
use serde_json::{json, Value};

/// Acknowledgement returned by the delete endpoints
pub(crate) fn status_ok() -> Json<Value> {
    Json(json!({ "status": "OK" }))
}

/// `GET /`
pub async fn index() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
