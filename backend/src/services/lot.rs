//! Purchase lot management service

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use shared::models::PurchaseLot;
use shared::types::{PaginatedResponse, Pagination, PaginationMeta};
use shared::validation::validate_lot_amount;

/// Lot service for recording purchases and correcting lot data
#[derive(Clone)]
pub struct LotService {
    db: PgPool,
}

/// Input for recording a purchase lot
#[derive(Debug, Deserialize)]
pub struct RecordPurchaseInput {
    pub supplier_id: Uuid,
    pub purchase_date: NaiveDate,
    pub quantity_kg: Decimal,
    pub unit_cost: Decimal,
    pub notes: Option<String>,
}

/// Input for correcting a lot's quantity, cost or notes
#[derive(Debug, Deserialize)]
pub struct UpdateLotInput {
    pub quantity_kg: Option<Decimal>,
    pub unit_cost: Option<Decimal>,
    /// Omitted keeps the existing notes; an empty string clears them
    pub notes: Option<String>,
}

/// Row for purchase lot queries
#[derive(Debug, FromRow)]
pub(crate) struct PurchaseLotRow {
    pub id: Uuid,
    pub supplier_id: Uuid,
    pub purchase_date: NaiveDate,
    pub sequence: i64,
    pub original_quantity_kg: Decimal,
    pub unit_cost: Decimal,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<PurchaseLotRow> for PurchaseLot {
    fn from(row: PurchaseLotRow) -> Self {
        PurchaseLot {
            id: row.id,
            supplier_id: row.supplier_id,
            purchase_date: row.purchase_date,
            sequence: row.sequence,
            original_quantity_kg: row.original_quantity_kg,
            unit_cost: row.unit_cost,
            notes: row.notes,
            created_at: row.created_at,
        }
    }
}

pub(crate) const LOT_COLUMNS: &str =
    "id, supplier_id, purchase_date, sequence, original_quantity_kg, unit_cost, notes, created_at";

impl LotService {
    /// Create a new LotService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Record a purchase lot
    pub async fn record_purchase(&self, input: RecordPurchaseInput) -> AppResult<PurchaseLot> {
        validate_lot_amount(input.quantity_kg).map_err(|msg| AppError::Validation {
            field: "quantity_kg".to_string(),
            message: msg.to_string(),
        })?;
        validate_lot_amount(input.unit_cost).map_err(|msg| AppError::Validation {
            field: "unit_cost".to_string(),
            message: msg.to_string(),
        })?;

        let row = sqlx::query_as::<_, PurchaseLotRow>(&format!(
            r#"
            INSERT INTO purchase_lots (supplier_id, purchase_date, original_quantity_kg, unit_cost, notes)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {LOT_COLUMNS}
            "#
        ))
        .bind(input.supplier_id)
        .bind(input.purchase_date)
        .bind(input.quantity_kg)
        .bind(input.unit_cost)
        .bind(&input.notes)
        .fetch_one(&self.db)
        .await?;

        tracing::info!(
            "Recorded purchase lot {} of {} kg dated {}",
            row.id,
            row.original_quantity_kg,
            row.purchase_date
        );

        Ok(row.into())
    }

    /// Get a lot by id
    pub async fn get_lot(&self, lot_id: Uuid) -> AppResult<PurchaseLot> {
        let row = sqlx::query_as::<_, PurchaseLotRow>(&format!(
            "SELECT {LOT_COLUMNS} FROM purchase_lots WHERE id = $1"
        ))
        .bind(lot_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Lot".to_string()))?;

        Ok(row.into())
    }

    /// List lots in FIFO order, paginated
    pub async fn list_lots(
        &self,
        pagination: Pagination,
    ) -> AppResult<PaginatedResponse<PurchaseLot>> {
        let total_items = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM purchase_lots")
            .fetch_one(&self.db)
            .await?;

        let rows = sqlx::query_as::<_, PurchaseLotRow>(&format!(
            r#"
            SELECT {LOT_COLUMNS} FROM purchase_lots
            ORDER BY purchase_date, sequence
            LIMIT $1 OFFSET $2
            "#
        ))
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        Ok(PaginatedResponse {
            data: rows.into_iter().map(PurchaseLot::from).collect(),
            pagination: PaginationMeta::new(&pagination, total_items as u64),
        })
    }

    /// Correct a lot's quantity, cost or notes.
    ///
    /// A quantity correction is re-validated against the lot's already
    /// allocated total inside a transaction holding the lot row lock: an
    /// edit that would leave `remaining < 0` is rejected rather than letting
    /// negative stock enter committed state.
    pub async fn update_lot(&self, lot_id: Uuid, input: UpdateLotInput) -> AppResult<PurchaseLot> {
        let mut tx = self.db.begin().await?;

        let row = sqlx::query_as::<_, PurchaseLotRow>(&format!(
            "SELECT {LOT_COLUMNS} FROM purchase_lots WHERE id = $1 FOR UPDATE"
        ))
        .bind(lot_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Lot".to_string()))?;

        let quantity_kg = input.quantity_kg.unwrap_or(row.original_quantity_kg);
        let unit_cost = input.unit_cost.unwrap_or(row.unit_cost);
        let notes = merge_notes(input.notes, row.notes);

        validate_lot_amount(quantity_kg).map_err(|msg| AppError::Validation {
            field: "quantity_kg".to_string(),
            message: msg.to_string(),
        })?;
        validate_lot_amount(unit_cost).map_err(|msg| AppError::Validation {
            field: "unit_cost".to_string(),
            message: msg.to_string(),
        })?;

        let allocated = sqlx::query_scalar::<_, Decimal>(
            "SELECT COALESCE(SUM(quantity_kg), 0) FROM allocation_entries WHERE lot_id = $1",
        )
        .bind(lot_id)
        .fetch_one(&mut *tx)
        .await?;

        if quantity_kg < allocated {
            return Err(AppError::Conflict {
                resource: "lot".to_string(),
                message: format!(
                    "Cannot reduce lot to {} kg: {} kg already allocated to sales",
                    quantity_kg, allocated
                ),
            });
        }

        let updated = sqlx::query_as::<_, PurchaseLotRow>(&format!(
            r#"
            UPDATE purchase_lots
            SET original_quantity_kg = $2, unit_cost = $3, notes = $4
            WHERE id = $1
            RETURNING {LOT_COLUMNS}
            "#
        ))
        .bind(lot_id)
        .bind(quantity_kg)
        .bind(unit_cost)
        .bind(&notes)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(updated.into())
    }

    /// Delete a lot that no sale has drawn from.
    ///
    /// Lots with allocation entries cannot be deleted; the entries are the
    /// cost record of committed sales.
    pub async fn delete_lot(&self, lot_id: Uuid) -> AppResult<()> {
        let mut tx = self.db.begin().await?;

        // Lock the lot row so no allocation can land between the entry
        // check and the delete; allocators lock lot rows too, so the two
        // serialize and the error stays a conflict, never an FK failure
        sqlx::query_scalar::<_, Uuid>("SELECT id FROM purchase_lots WHERE id = $1 FOR UPDATE")
            .bind(lot_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound("Lot".to_string()))?;

        let allocation_count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM allocation_entries WHERE lot_id = $1",
        )
        .bind(lot_id)
        .fetch_one(&mut *tx)
        .await?;

        if allocation_count > 0 {
            return Err(AppError::Conflict {
                resource: "lot".to_string(),
                message: "Lot has allocated stock and cannot be deleted".to_string(),
            });
        }

        sqlx::query("DELETE FROM purchase_lots WHERE id = $1")
            .bind(lot_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(())
    }
}

/// Merge a notes update: omitted keeps the existing text, an empty string clears it
fn merge_notes(update: Option<String>, existing: Option<String>) -> Option<String> {
    match update {
        Some(s) if s.is_empty() => None,
        Some(s) => Some(s),
        None => existing,
    }
}
