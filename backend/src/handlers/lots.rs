//! HTTP handlers for purchase lot endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::services::lot::{RecordPurchaseInput, UpdateLotInput};
use crate::services::LotService;
use crate::models::PurchaseLot;
use crate::AppState;
use shared::types::{PaginatedResponse, Pagination};

/// Record a purchase lot
pub async fn record_purchase(
    State(state): State<AppState>,
    Json(input): Json<RecordPurchaseInput>,
) -> AppResult<Json<PurchaseLot>> {
    let service = LotService::new(state.db);
    let lot = service.record_purchase(input).await?;
    Ok(Json(lot))
}

/// List purchase lots in FIFO order
pub async fn list_lots(
    State(state): State<AppState>,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<PaginatedResponse<PurchaseLot>>> {
    let service = LotService::new(state.db);
    let lots = service.list_lots(pagination).await?;
    Ok(Json(lots))
}

/// Get a purchase lot
pub async fn get_lot(
    State(state): State<AppState>,
    Path(lot_id): Path<Uuid>,
) -> AppResult<Json<PurchaseLot>> {
    let service = LotService::new(state.db);
    let lot = service.get_lot(lot_id).await?;
    Ok(Json(lot))
}

/// Correct a purchase lot's quantity, cost or notes
pub async fn update_lot(
    State(state): State<AppState>,
    Path(lot_id): Path<Uuid>,
    Json(input): Json<UpdateLotInput>,
) -> AppResult<Json<PurchaseLot>> {
    let service = LotService::new(state.db);
    let lot = service.update_lot(lot_id, input).await?;
    Ok(Json(lot))
}

/// Delete an unallocated purchase lot
pub async fn delete_lot(
    State(state): State<AppState>,
    Path(lot_id): Path<Uuid>,
) -> AppResult<Json<serde_json::Value>> {
    let service = LotService::new(state.db);
    service.delete_lot(lot_id).await?;
    Ok(Json(serde_json::json!({ "deleted": lot_id })))
}
