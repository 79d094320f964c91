//! Purchase lot model

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A batch of fish bought from a supplier on a given date at a given unit cost.
///
/// Lots are the unit of FIFO consumption: sales draw stock from the oldest
/// lot first, ordered by `purchase_date` and then by `sequence`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseLot {
    pub id: Uuid,
    pub supplier_id: Uuid,
    pub purchase_date: NaiveDate,
    /// Monotonic insertion-order key. Breaks ties between lots purchased on
    /// the same date so consumption order is stable across storage engines.
    pub sequence: i64,
    pub original_quantity_kg: Decimal,
    pub unit_cost: Decimal,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl PurchaseLot {
    /// FIFO ordering key: oldest purchase date first, then insertion order.
    pub fn fifo_key(&self) -> (NaiveDate, i64) {
        (self.purchase_date, self.sequence)
    }
}
