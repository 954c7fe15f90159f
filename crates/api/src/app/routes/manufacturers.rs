use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;

use stockroom_infra::InventoryService;

use crate::app::routes::common;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_manufacturers).post(create_manufacturer))
        .route(
            "/:id",
            get(get_manufacturer)
                .put(update_manufacturer)
                .patch(update_manufacturer)
                .delete(delete_manufacturer),
        )
}

/// Create-or-fetch by name: 201 when created, 200 when the name already existed.
pub async fn create_manufacturer(
    Extension(service): Extension<Arc<InventoryService>>,
    body: Result<Json<dto::ManufacturerRequest>, JsonRejection>,
) -> Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(e) => return errors::json_rejection_to_response(e),
    };
    let draft = match body.into_draft() {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match service.create_manufacturer(draft).await {
        Ok((manufacturer, created)) => {
            let status = if created { StatusCode::CREATED } else { StatusCode::OK };
            (status, Json(dto::manufacturer_to_json(&manufacturer))).into_response()
        }
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn list_manufacturers(Extension(service): Extension<Arc<InventoryService>>) -> Response {
    match service.list_manufacturers().await {
        Ok(list) => {
            let items = list.iter().map(dto::manufacturer_to_json).collect::<Vec<_>>();
            (StatusCode::OK, Json(json!({ "items": items }))).into_response()
        }
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn get_manufacturer(
    Extension(service): Extension<Arc<InventoryService>>,
    Path(id): Path<String>,
) -> Response {
    let id = match common::parse_manufacturer_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match service.get_manufacturer(id).await {
        Ok(m) => (StatusCode::OK, Json(dto::manufacturer_to_json(&m))).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn update_manufacturer(
    Extension(service): Extension<Arc<InventoryService>>,
    Path(id): Path<String>,
    body: Result<Json<dto::UpdateManufacturerRequest>, JsonRejection>,
) -> Response {
    let id = match common::parse_manufacturer_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let Json(body) = match body {
        Ok(b) => b,
        Err(e) => return errors::json_rejection_to_response(e),
    };
    let changes = match body.into_domain() {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match service.update_manufacturer(id, changes).await {
        Ok(m) => (StatusCode::OK, Json(dto::manufacturer_to_json(&m))).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

/// Rejected with 400 while any product still references the manufacturer.
pub async fn delete_manufacturer(
    Extension(service): Extension<Arc<InventoryService>>,
    Path(id): Path<String>,
) -> Response {
    let id = match common::parse_manufacturer_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match service.delete_manufacturer(id).await {
        Ok(m) => (StatusCode::OK, Json(dto::manufacturer_to_json(&m))).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}
