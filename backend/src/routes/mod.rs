//! Route definitions for the Fish Trading Management Platform

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::{handlers, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Purchase lot management
        .nest("/lots", lot_routes())
        // Remaining stock queries
        .nest("/stock", stock_routes())
        // Sale management and allocation
        .nest("/sales", sale_routes())
}

/// Purchase lot routes
fn lot_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(handlers::record_purchase).get(handlers::list_lots))
        .route(
            "/:id",
            get(handlers::get_lot)
                .put(handlers::update_lot)
                .delete(handlers::delete_lot),
        )
        .route("/:id/remaining", get(handlers::get_remaining))
}

/// Remaining stock routes
fn stock_routes() -> Router<AppState> {
    Router::new().route("/", get(handlers::list_stock))
}

/// Sale routes
fn sale_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(handlers::create_sale).get(handlers::list_sales))
        .route(
            "/:id",
            get(handlers::get_sale).delete(handlers::delete_sale),
        )
        .route("/:id/quantity", put(handlers::reallocate_sale))
        .route("/:id/allocations", get(handlers::get_sale_allocations))
}
