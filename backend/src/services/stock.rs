//! Remaining-stock queries over the lot ledger

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Stock service answering "which lots still have stock, and how much"
///
/// Remaining quantities are always derived from purchases minus allocation
/// entries at query time; nothing here is cached or stored redundantly.
#[derive(Clone)]
pub struct StockService {
    db: PgPool,
}

/// A lot with stock left, in FIFO consumption order
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct LotStock {
    pub lot_id: Uuid,
    pub supplier_id: Uuid,
    pub purchase_date: NaiveDate,
    pub original_quantity_kg: Decimal,
    pub unit_cost: Decimal,
    pub remaining_kg: Decimal,
}

impl StockService {
    /// Create a new StockService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// All lots with remaining stock, oldest purchase first.
    ///
    /// Ordering is purchase date ascending, then the lot's insertion
    /// sequence; fully consumed lots are excluded.
    pub async fn lots_with_remaining_stock(&self) -> AppResult<Vec<LotStock>> {
        let stock = sqlx::query_as::<_, LotStock>(
            r#"
            SELECT l.id AS lot_id, l.supplier_id, l.purchase_date,
                   l.original_quantity_kg, l.unit_cost,
                   l.original_quantity_kg - COALESCE(SUM(a.quantity_kg), 0) AS remaining_kg
            FROM purchase_lots l
            LEFT JOIN allocation_entries a ON a.lot_id = l.id
            GROUP BY l.id
            HAVING l.original_quantity_kg - COALESCE(SUM(a.quantity_kg), 0) > 0
            ORDER BY l.purchase_date, l.sequence
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        Ok(stock)
    }

    /// Remaining quantity of a single lot.
    ///
    /// This is a display path: a negative stored remaining is logged as a
    /// data-integrity error and floored to zero rather than shown negative.
    pub async fn remaining_quantity(&self, lot_id: Uuid) -> AppResult<Decimal> {
        let remaining = sqlx::query_scalar::<_, Decimal>(
            r#"
            SELECT l.original_quantity_kg - COALESCE(SUM(a.quantity_kg), 0)
            FROM purchase_lots l
            LEFT JOIN allocation_entries a ON a.lot_id = l.id
            WHERE l.id = $1
            GROUP BY l.id
            "#,
        )
        .bind(lot_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Lot".to_string()))?;

        if remaining < Decimal::ZERO {
            tracing::error!(
                "Lot {} has negative remaining stock ({} kg): allocations exceed purchase",
                lot_id,
                remaining
            );
            return Ok(Decimal::ZERO);
        }

        Ok(remaining)
    }
}
