use std::collections::HashMap;

use axum::response::Response;
use serde_json::Value;

use stockroom_catalog::Product;
use stockroom_core::{DomainResult, Entity, ManufacturerId, ProductId};
use stockroom_infra::InventoryService;

use crate::app::{dto, errors};

pub fn parse_product_id(raw: &str) -> Result<ProductId, Response> {
    raw.parse().map_err(errors::domain_error_to_response)
}

pub fn parse_manufacturer_id(raw: &str) -> Result<ManufacturerId, Response> {
    raw.parse().map_err(errors::domain_error_to_response)
}

/// Render one product with its manufacturer populated.
pub async fn product_json(service: &InventoryService, product: &Product) -> DomainResult<Value> {
    let manufacturer = match product.manufacturer() {
        Some(id) => Some(service.get_manufacturer(id).await?),
        None => None,
    };
    Ok(dto::product_to_json(product, manufacturer.as_ref()))
}

/// Render a product list, loading manufacturers once.
pub async fn products_json(service: &InventoryService, products: &[Product]) -> DomainResult<Vec<Value>> {
    let manufacturers: HashMap<_, _> = service
        .list_manufacturers()
        .await?
        .into_iter()
        .map(|m| (m.id(), m))
        .collect();

    Ok(products
        .iter()
        .map(|p| dto::product_to_json(p, p.manufacturer().and_then(|id| manufacturers.get(&id))))
        .collect())
}
