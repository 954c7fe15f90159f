use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
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
        .route("/total-stock-value", get(total_stock_value))
        .route("/stock-value-by-manufacturer", get(stock_value_by_manufacturer))
        .route("/stock-value-by-manufacturer/:id", get(stock_value_for_manufacturer))
        .route("/summary", get(summary))
}

pub async fn total_stock_value(Extension(service): Extension<Arc<InventoryService>>) -> Response {
    match service.total_stock_value().await {
        Ok(total) => (
            StatusCode::OK,
            Json(json!({
                "totalValue": dto::money_to_json(total),
                "totalValueDecimal": dto::money_to_exact_json(total),
            })),
        )
            .into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn stock_value_by_manufacturer(Extension(service): Extension<Arc<InventoryService>>) -> Response {
    match service.total_stock_value_by_manufacturer().await {
        Ok(groups) => {
            let items = groups.iter().map(dto::manufacturer_value_to_json).collect::<Vec<_>>();
            (StatusCode::OK, Json(json!({ "items": items }))).into_response()
        }
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn stock_value_for_manufacturer(
    Extension(service): Extension<Arc<InventoryService>>,
    Path(id): Path<String>,
) -> Response {
    let id = match common::parse_manufacturer_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match service.stock_value_for_manufacturer(id).await {
        Ok(total) => (
            StatusCode::OK,
            Json(json!({
                "manufacturerId": id.to_string(),
                "totalValue": dto::money_to_json(total),
                "totalValueDecimal": dto::money_to_exact_json(total),
            })),
        )
            .into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn summary(Extension(service): Extension<Arc<InventoryService>>) -> Response {
    match service.summary().await {
        Ok(s) => (StatusCode::OK, Json(dto::summary_to_json(&s))).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}
