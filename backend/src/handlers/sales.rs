//! HTTP handlers for sale endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::services::sale::{
    AllocationDetail, CreateSaleInput, ReallocateInput, SaleWithAllocations,
};
use crate::services::SaleService;
use crate::models::Sale;
use crate::AppState;
use shared::types::{PaginatedResponse, Pagination};

/// Create a sale, allocating its quantity from the oldest lots first
pub async fn create_sale(
    State(state): State<AppState>,
    Json(input): Json<CreateSaleInput>,
) -> AppResult<Json<SaleWithAllocations>> {
    let service = SaleService::new(state.db);
    let sale = service.create_sale(input).await?;
    Ok(Json(sale))
}

/// List sales
pub async fn list_sales(
    State(state): State<AppState>,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<PaginatedResponse<Sale>>> {
    let service = SaleService::new(state.db);
    let sales = service.list_sales(pagination).await?;
    Ok(Json(sales))
}

/// Get a sale with its allocation entries
pub async fn get_sale(
    State(state): State<AppState>,
    Path(sale_id): Path<Uuid>,
) -> AppResult<Json<SaleWithAllocations>> {
    let service = SaleService::new(state.db);
    let sale = service.get_sale(sale_id).await?;
    Ok(Json(sale))
}

/// Edit a sale's quantity; its allocation is recomputed from scratch
pub async fn reallocate_sale(
    State(state): State<AppState>,
    Path(sale_id): Path<Uuid>,
    Json(input): Json<ReallocateInput>,
) -> AppResult<Json<SaleWithAllocations>> {
    let service = SaleService::new(state.db);
    let sale = service.reallocate(sale_id, input.quantity_kg).await?;
    Ok(Json(sale))
}

/// Delete a sale, releasing its allocated stock
pub async fn delete_sale(
    State(state): State<AppState>,
    Path(sale_id): Path<Uuid>,
) -> AppResult<Json<serde_json::Value>> {
    let service = SaleService::new(state.db);
    service.delete_sale(sale_id).await?;
    Ok(Json(serde_json::json!({ "deleted": sale_id })))
}

/// Allocation entries for a sale joined with lot costs
pub async fn get_sale_allocations(
    State(state): State<AppState>,
    Path(sale_id): Path<Uuid>,
) -> AppResult<Json<Vec<AllocationDetail>>> {
    let service = SaleService::new(state.db);
    let allocations = service.get_allocations(sale_id).await?;
    Ok(Json(allocations))
}
