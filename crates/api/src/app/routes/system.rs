use std::sync::Arc;

use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};

use stockroom_infra::InventoryService;

use crate::app::errors;

pub async fn health(Extension(service): Extension<Arc<InventoryService>>) -> axum::response::Response {
    match service.health().await {
        Ok(()) => (StatusCode::OK, Json(serde_json::json!({ "status": "ok" }))).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}
