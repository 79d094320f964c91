//! HTTP handlers for remaining-stock endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::error::AppResult;
use crate::services::stock::LotStock;
use crate::services::StockService;
use crate::AppState;

/// Remaining quantity of one lot
#[derive(Serialize)]
pub struct RemainingResponse {
    pub lot_id: Uuid,
    pub remaining_kg: Decimal,
}

/// List all lots with remaining stock, oldest first
pub async fn list_stock(State(state): State<AppState>) -> AppResult<Json<Vec<LotStock>>> {
    let service = StockService::new(state.db);
    let stock = service.lots_with_remaining_stock().await?;
    Ok(Json(stock))
}

/// Get the remaining quantity of a lot
pub async fn get_remaining(
    State(state): State<AppState>,
    Path(lot_id): Path<Uuid>,
) -> AppResult<Json<RemainingResponse>> {
    let service = StockService::new(state.db);
    let remaining_kg = service.remaining_quantity(lot_id).await?;
    Ok(Json(RemainingResponse {
        lot_id,
        remaining_kg,
    }))
}
