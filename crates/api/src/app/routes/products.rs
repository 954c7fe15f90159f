use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Extension, Path, Query,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;

use stockroom_infra::InventoryService;

use crate::app::routes::common;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_product).get(list_products).delete(delete_all_products))
        .route("/low-stock", get(low_stock))
        .route("/critical-stock", get(critical_stock))
        .route(
            "/:id",
            get(get_product)
                .put(update_product)
                .patch(update_product)
                .delete(delete_product),
        )
}

pub async fn create_product(
    Extension(service): Extension<Arc<InventoryService>>,
    body: Result<Json<dto::CreateProductRequest>, JsonRejection>,
) -> Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(e) => return errors::json_rejection_to_response(e),
    };
    let new = match body.into_domain() {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };

    let product = match service.create_product(new).await {
        Ok(p) => p,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match common::product_json(&service, &product).await {
        Ok(body) => (StatusCode::CREATED, Json(body)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn list_products(Extension(service): Extension<Arc<InventoryService>>) -> Response {
    let products = match service.list_products().await {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };
    match common::products_json(&service, &products).await {
        Ok(items) => (StatusCode::OK, Json(json!({ "items": items }))).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn get_product(
    Extension(service): Extension<Arc<InventoryService>>,
    Path(id): Path<String>,
) -> Response {
    let id = match common::parse_product_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let product = match service.get_product(id).await {
        Ok(p) => p,
        Err(e) => return errors::domain_error_to_response(e),
    };
    match common::product_json(&service, &product).await {
        Ok(body) => (StatusCode::OK, Json(body)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn update_product(
    Extension(service): Extension<Arc<InventoryService>>,
    Path(id): Path<String>,
    body: Result<Json<dto::UpdateProductRequest>, JsonRejection>,
) -> Response {
    let id = match common::parse_product_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let Json(body) = match body {
        Ok(b) => b,
        Err(e) => return errors::json_rejection_to_response(e),
    };
    let update = match body.into_domain() {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };

    let product = match service.update_product(id, update).await {
        Ok(p) => p,
        Err(e) => return errors::domain_error_to_response(e),
    };
    match common::product_json(&service, &product).await {
        Ok(body) => (StatusCode::OK, Json(body)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn delete_product(
    Extension(service): Extension<Arc<InventoryService>>,
    Path(id): Path<String>,
) -> Response {
    let id = match common::parse_product_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let deleted = match service.delete_product(id).await {
        Ok(p) => p,
        Err(e) => return errors::domain_error_to_response(e),
    };
    match common::product_json(&service, &deleted).await {
        Ok(body) => (StatusCode::OK, Json(body)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

/// Irreversible; requires `?confirm=true`.
pub async fn delete_all_products(
    Extension(service): Extension<Arc<InventoryService>>,
    query: Result<Query<dto::ConfirmQuery>, QueryRejection>,
) -> Response {
    let Query(query) = match query {
        Ok(q) => q,
        Err(e) => return errors::query_rejection_to_response(e),
    };
    if !query.confirm {
        return errors::json_error(
            StatusCode::BAD_REQUEST,
            "confirmation_required",
            "deleting all products requires ?confirm=true",
        );
    }
    match service.delete_all_products().await {
        Ok(deleted) => (StatusCode::OK, Json(json!({ "deleted": deleted }))).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn low_stock(
    Extension(service): Extension<Arc<InventoryService>>,
    query: Result<Query<dto::ThresholdQuery>, QueryRejection>,
) -> Response {
    let Query(query) = match query {
        Ok(q) => q,
        Err(e) => return errors::query_rejection_to_response(e),
    };
    let threshold = match query.threshold() {
        Ok(t) => t.unwrap_or(service.thresholds().low),
        Err(e) => return errors::domain_error_to_response(e),
    };

    let products = match service.low_stock(Some(threshold)).await {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };
    match common::products_json(&service, &products).await {
        Ok(items) => (
            StatusCode::OK,
            Json(json!({ "threshold": threshold, "items": items })),
        )
            .into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn critical_stock(
    Extension(service): Extension<Arc<InventoryService>>,
    query: Result<Query<dto::ThresholdQuery>, QueryRejection>,
) -> Response {
    let Query(query) = match query {
        Ok(q) => q,
        Err(e) => return errors::query_rejection_to_response(e),
    };
    let threshold = match query.threshold() {
        Ok(t) => t.unwrap_or(service.thresholds().critical),
        Err(e) => return errors::domain_error_to_response(e),
    };

    match service.critical_stock(Some(threshold)).await {
        Ok(entries) => {
            let items = entries.iter().map(dto::critical_entry_to_json).collect::<Vec<_>>();
            (
                StatusCode::OK,
                Json(json!({ "threshold": threshold, "items": items })),
            )
                .into_response()
        }
        Err(e) => errors::domain_error_to_response(e),
    }
}
