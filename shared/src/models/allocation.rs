//! Allocation entry model

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The record that this many kilograms of a purchase lot were consumed to
/// satisfy a sale.
///
/// Entries are created by the allocator and deleted in bulk when a sale is
/// de-allocated; they are never updated in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationEntry {
    pub id: Uuid,
    pub lot_id: Uuid,
    pub sale_id: Uuid,
    pub quantity_kg: Decimal,
    pub created_at: DateTime<Utc>,
}

impl AllocationEntry {
    pub fn new(lot_id: Uuid, sale_id: Uuid, quantity_kg: Decimal) -> Self {
        Self {
            id: Uuid::new_v4(),
            lot_id,
            sale_id,
            quantity_kg,
            created_at: Utc::now(),
        }
    }
}
