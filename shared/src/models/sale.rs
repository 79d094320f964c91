//! Sale model

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A sale to a customer: one requested quantity at one unit price.
///
/// The quantity is satisfied by allocation entries drawn from purchase lots;
/// a committed sale is always fully allocated (all-or-nothing).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sale {
    pub id: Uuid,
    pub customer_name: String,
    pub sale_date: NaiveDate,
    pub quantity_kg: Decimal,
    pub unit_price: Decimal,
    pub created_at: DateTime<Utc>,
}
