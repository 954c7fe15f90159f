use axum::Router;

pub mod analytics;
pub mod common;
pub mod manufacturers;
pub mod products;
pub mod system;

/// Router for all inventory endpoints.
pub fn router() -> Router {
    Router::new()
        .nest("/products", products::router())
        .nest("/manufacturers", manufacturers::router())
        .nest("/analytics", analytics::router())
}
