//! Sale management service: FIFO allocation, re-allocation and de-allocation
//!
//! Every operation here runs inside one transaction. Lots are read with
//! `FOR UPDATE` row locks in FIFO order, so two concurrent allocations can
//! never over-consume the same lot: the second allocator waits for the first
//! to commit and plans against the updated sums.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::lot::{PurchaseLotRow, LOT_COLUMNS};
use shared::allocation::{plan_fifo_allocation, plan_lot_allocation, plan_reallocation, LotTake};
use shared::models::{AllocationEntry, PurchaseLot, Sale};
use shared::types::{PaginatedResponse, Pagination, PaginationMeta};
use shared::validation::validate_sale_quantity;

/// Sale service: creates sales with their allocations, edits and deletes them
#[derive(Clone)]
pub struct SaleService {
    db: PgPool,
}

/// Input for creating a sale
#[derive(Debug, Deserialize)]
pub struct CreateSaleInput {
    pub customer_name: String,
    pub sale_date: NaiveDate,
    pub quantity_kg: Decimal,
    pub unit_price: Decimal,
    /// Draw the whole quantity from this lot instead of FIFO order
    pub lot_id: Option<Uuid>,
}

/// Input for editing a sale's quantity
#[derive(Debug, Deserialize)]
pub struct ReallocateInput {
    pub quantity_kg: Decimal,
}

/// A committed sale together with the entries that satisfy it
#[derive(Debug, Clone, Serialize)]
pub struct SaleWithAllocations {
    pub sale: Sale,
    pub allocations: Vec<AllocationEntry>,
}

/// An allocation entry joined with its lot's cost figures
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct AllocationDetail {
    pub lot_id: Uuid,
    pub purchase_date: NaiveDate,
    pub quantity_kg: Decimal,
    pub unit_cost: Decimal,
    pub cost: Decimal,
}

/// Row for sale queries
#[derive(Debug, FromRow)]
struct SaleRow {
    id: Uuid,
    customer_name: String,
    sale_date: NaiveDate,
    quantity_kg: Decimal,
    unit_price: Decimal,
    created_at: DateTime<Utc>,
}

impl From<SaleRow> for Sale {
    fn from(row: SaleRow) -> Self {
        Sale {
            id: row.id,
            customer_name: row.customer_name,
            sale_date: row.sale_date,
            quantity_kg: row.quantity_kg,
            unit_price: row.unit_price,
            created_at: row.created_at,
        }
    }
}

/// Row for allocation entry queries
#[derive(Debug, FromRow)]
struct AllocationEntryRow {
    id: Uuid,
    lot_id: Uuid,
    sale_id: Uuid,
    quantity_kg: Decimal,
    created_at: DateTime<Utc>,
}

impl From<AllocationEntryRow> for AllocationEntry {
    fn from(row: AllocationEntryRow) -> Self {
        AllocationEntry {
            id: row.id,
            lot_id: row.lot_id,
            sale_id: row.sale_id,
            quantity_kg: row.quantity_kg,
            created_at: row.created_at,
        }
    }
}

const SALE_COLUMNS: &str = "id, customer_name, sale_date, quantity_kg, unit_price, created_at";

impl SaleService {
    /// Create a new SaleService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create a sale and allocate its quantity FIFO across purchase lots.
    ///
    /// All-or-nothing: on `InsufficientStock` neither the sale nor any
    /// allocation entry is persisted.
    pub async fn create_sale(&self, input: CreateSaleInput) -> AppResult<SaleWithAllocations> {
        validate_sale_quantity(input.quantity_kg).map_err(|msg| AppError::Validation {
            field: "quantity_kg".to_string(),
            message: msg.to_string(),
        })?;
        if input.unit_price < Decimal::ZERO {
            return Err(AppError::Validation {
                field: "unit_price".to_string(),
                message: "Unit price cannot be negative".to_string(),
            });
        }

        let mut tx = self.db.begin().await?;

        let lots = lock_lots(&mut tx).await?;
        let entries = fetch_entries(&mut tx).await?;

        let takes = match input.lot_id {
            // Manual lot selection: the whole quantity comes from one lot
            Some(lot_id) => {
                let chosen = lots
                    .iter()
                    .find(|l| l.id == lot_id)
                    .ok_or_else(|| AppError::NotFound("Lot".to_string()))?;
                vec![plan_lot_allocation(chosen, &entries, input.quantity_kg)?]
            }
            None => plan_fifo_allocation(&lots, &entries, input.quantity_kg)?,
        };

        let sale = sqlx::query_as::<_, SaleRow>(&format!(
            r#"
            INSERT INTO sales (customer_name, sale_date, quantity_kg, unit_price)
            VALUES ($1, $2, $3, $4)
            RETURNING {SALE_COLUMNS}
            "#
        ))
        .bind(&input.customer_name)
        .bind(input.sale_date)
        .bind(input.quantity_kg)
        .bind(input.unit_price)
        .fetch_one(&mut *tx)
        .await?;

        let allocations = insert_takes(&mut tx, sale.id, &takes).await?;

        tx.commit().await?;

        tracing::info!(
            "Allocated {} kg across {} lot(s) for sale {}",
            input.quantity_kg,
            allocations.len(),
            sale.id
        );

        Ok(SaleWithAllocations {
            sale: sale.into(),
            allocations,
        })
    }

    /// Change a sale's quantity, recomputing its allocation from scratch.
    ///
    /// The old entries are discarded and a fresh FIFO pass is planned in one
    /// transaction. If the new quantity cannot be satisfied the transaction
    /// rolls back and the sale keeps its previous allocation unchanged.
    pub async fn reallocate(
        &self,
        sale_id: Uuid,
        new_quantity: Decimal,
    ) -> AppResult<SaleWithAllocations> {
        validate_sale_quantity(new_quantity).map_err(|msg| AppError::Validation {
            field: "quantity_kg".to_string(),
            message: msg.to_string(),
        })?;

        let mut tx = self.db.begin().await?;

        // Lock the sale row first so concurrent edits of the same sale serialize
        let sale = sqlx::query_as::<_, SaleRow>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales WHERE id = $1 FOR UPDATE"
        ))
        .bind(sale_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Sale".to_string()))?;

        let lots = lock_lots(&mut tx).await?;
        let entries = fetch_entries(&mut tx).await?;

        // Plan against the ledger with this sale's own entries discarded;
        // any failure here rolls the whole transaction back.
        let takes = plan_reallocation(&lots, &entries, sale_id, new_quantity)?;

        sqlx::query("DELETE FROM allocation_entries WHERE sale_id = $1")
            .bind(sale_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("UPDATE sales SET quantity_kg = $2 WHERE id = $1")
            .bind(sale_id)
            .bind(new_quantity)
            .execute(&mut *tx)
            .await?;

        let allocations = insert_takes(&mut tx, sale_id, &takes).await?;

        tx.commit().await?;

        tracing::info!(
            "Reallocated sale {} from {} kg to {} kg across {} lot(s)",
            sale_id,
            sale.quantity_kg,
            new_quantity,
            allocations.len()
        );

        let sale = Sale {
            quantity_kg: new_quantity,
            ..Sale::from(sale)
        };
        Ok(SaleWithAllocations { sale, allocations })
    }

    /// Delete a sale and release its allocated stock
    pub async fn delete_sale(&self, sale_id: Uuid) -> AppResult<()> {
        let mut tx = self.db.begin().await?;

        sqlx::query("DELETE FROM allocation_entries WHERE sale_id = $1")
            .bind(sale_id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM sales WHERE id = $1")
            .bind(sale_id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Sale".to_string()));
        }

        tx.commit().await?;

        tracing::info!("Deleted sale {} and released its stock", sale_id);

        Ok(())
    }

    /// Get a sale with its allocation entries
    pub async fn get_sale(&self, sale_id: Uuid) -> AppResult<SaleWithAllocations> {
        let sale = sqlx::query_as::<_, SaleRow>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales WHERE id = $1"
        ))
        .bind(sale_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Sale".to_string()))?;

        let allocations = sqlx::query_as::<_, AllocationEntryRow>(
            r#"
            SELECT id, lot_id, sale_id, quantity_kg, created_at
            FROM allocation_entries
            WHERE sale_id = $1
            ORDER BY created_at
            "#,
        )
        .bind(sale_id)
        .fetch_all(&self.db)
        .await?;

        Ok(SaleWithAllocations {
            sale: sale.into(),
            allocations: allocations.into_iter().map(AllocationEntry::from).collect(),
        })
    }

    /// List sales, newest first, paginated
    pub async fn list_sales(&self, pagination: Pagination) -> AppResult<PaginatedResponse<Sale>> {
        let total_items = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM sales")
            .fetch_one(&self.db)
            .await?;

        let rows = sqlx::query_as::<_, SaleRow>(&format!(
            r#"
            SELECT {SALE_COLUMNS} FROM sales
            ORDER BY sale_date DESC, created_at DESC
            LIMIT $1 OFFSET $2
            "#
        ))
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        Ok(PaginatedResponse {
            data: rows.into_iter().map(Sale::from).collect(),
            pagination: PaginationMeta::new(&pagination, total_items as u64),
        })
    }

    /// Allocation entries for a sale joined with lot costs.
    ///
    /// The per-entry `cost` figures are the sale's cost basis; profit and
    /// supplier reports sum these downstream.
    pub async fn get_allocations(&self, sale_id: Uuid) -> AppResult<Vec<AllocationDetail>> {
        let sale_exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM sales WHERE id = $1)")
                .bind(sale_id)
                .fetch_one(&self.db)
                .await?;

        if !sale_exists {
            return Err(AppError::NotFound("Sale".to_string()));
        }

        let details = sqlx::query_as::<_, AllocationDetail>(
            r#"
            SELECT a.lot_id, l.purchase_date, a.quantity_kg, l.unit_cost,
                   a.quantity_kg * l.unit_cost AS cost
            FROM allocation_entries a
            JOIN purchase_lots l ON l.id = a.lot_id
            WHERE a.sale_id = $1
            ORDER BY l.purchase_date, l.sequence
            "#,
        )
        .bind(sale_id)
        .fetch_all(&self.db)
        .await?;

        Ok(details)
    }
}

/// Read every purchase lot with a row lock, in FIFO order.
///
/// The locks are what makes concurrent allocators safe: the sums a planner
/// reads cannot change under it before its entries are committed.
async fn lock_lots(tx: &mut Transaction<'_, Postgres>) -> AppResult<Vec<PurchaseLot>> {
    let rows = sqlx::query_as::<_, PurchaseLotRow>(&format!(
        r#"
        SELECT {LOT_COLUMNS} FROM purchase_lots
        ORDER BY purchase_date, sequence
        FOR UPDATE
        "#
    ))
    .fetch_all(&mut **tx)
    .await?;

    Ok(rows.into_iter().map(PurchaseLot::from).collect())
}

/// Read all allocation entries inside the current transaction
async fn fetch_entries(tx: &mut Transaction<'_, Postgres>) -> AppResult<Vec<AllocationEntry>> {
    let rows = sqlx::query_as::<_, AllocationEntryRow>(
        "SELECT id, lot_id, sale_id, quantity_kg, created_at FROM allocation_entries",
    )
    .fetch_all(&mut **tx)
    .await?;

    Ok(rows.into_iter().map(AllocationEntry::from).collect())
}

/// Persist the planned takes as allocation entries for a sale
async fn insert_takes(
    tx: &mut Transaction<'_, Postgres>,
    sale_id: Uuid,
    takes: &[LotTake],
) -> AppResult<Vec<AllocationEntry>> {
    let mut allocations = Vec::with_capacity(takes.len());
    for take in takes {
        let row = sqlx::query_as::<_, AllocationEntryRow>(
            r#"
            INSERT INTO allocation_entries (lot_id, sale_id, quantity_kg)
            VALUES ($1, $2, $3)
            RETURNING id, lot_id, sale_id, quantity_kg, created_at
            "#,
        )
        .bind(take.lot_id)
        .bind(sale_id)
        .bind(take.quantity_kg)
        .fetch_one(&mut **tx)
        .await?;
        allocations.push(row.into());
    }
    Ok(allocations)
}
