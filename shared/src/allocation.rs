//! FIFO allocation planner
//!
//! Computes which lots a requested sale quantity should be drawn from,
//! oldest purchase first. The planner is pure: it reads lots and existing
//! allocation entries and returns the takes to persist, or an error. The
//! backend runs it inside a transaction that holds row locks on the lots,
//! so a successful plan can be inserted without re-checking.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::ledger::checked_remaining_quantity;
use crate::models::{AllocationEntry, PurchaseLot};

/// Allocation failure taxonomy
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AllocationError {
    /// Total remaining stock across all lots is less than requested.
    /// Recoverable: the caller can reduce the quantity or reject the sale.
    #[error("Insufficient stock: short by {shortfall} kg")]
    InsufficientStock { shortfall: Decimal },

    /// Requested quantity is zero or negative. Rejected before any lot is read.
    #[error("Requested quantity must be positive, got {quantity}")]
    InvalidQuantity { quantity: Decimal },

    /// A lot's allocations exceed its original quantity. Fatal for the lot;
    /// never clamped on paths that write.
    #[error("Allocations for lot {lot_id} exceed its purchased quantity")]
    DataIntegrity { lot_id: Uuid },
}

/// One planned consumption: this much from this lot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LotTake {
    pub lot_id: Uuid,
    pub quantity_kg: Decimal,
}

/// Plan a FIFO allocation of `requested` kilograms against the given lots.
///
/// Lots are consumed in purchase-date order (ties broken by insertion
/// sequence), each up to its remaining quantity. On success the returned
/// takes sum to exactly `requested`; a shortfall fails the whole request and
/// nothing is taken.
pub fn plan_fifo_allocation(
    lots: &[PurchaseLot],
    entries: &[AllocationEntry],
    requested: Decimal,
) -> Result<Vec<LotTake>, AllocationError> {
    if requested <= Decimal::ZERO {
        return Err(AllocationError::InvalidQuantity {
            quantity: requested,
        });
    }

    let mut ordered: Vec<&PurchaseLot> = lots.iter().collect();
    ordered.sort_by_key(|lot| lot.fifo_key());

    let mut remaining_to_allocate = requested;
    let mut takes = Vec::new();

    for lot in ordered {
        if remaining_to_allocate <= Decimal::ZERO {
            break;
        }
        let available = checked_remaining_quantity(lot, entries)?;
        let take = remaining_to_allocate.min(available);
        if take > Decimal::ZERO {
            takes.push(LotTake {
                lot_id: lot.id,
                quantity_kg: take,
            });
            remaining_to_allocate -= take;
        }
    }

    if remaining_to_allocate > Decimal::ZERO {
        return Err(AllocationError::InsufficientStock {
            shortfall: remaining_to_allocate,
        });
    }

    Ok(takes)
}

/// Plan an allocation drawn entirely from one caller-chosen lot.
///
/// Used when the seller picks the lot by hand instead of taking FIFO order.
/// The whole request must fit in that lot's remaining quantity; there is no
/// spill-over into other lots.
pub fn plan_lot_allocation(
    lot: &PurchaseLot,
    entries: &[AllocationEntry],
    requested: Decimal,
) -> Result<LotTake, AllocationError> {
    if requested <= Decimal::ZERO {
        return Err(AllocationError::InvalidQuantity {
            quantity: requested,
        });
    }

    let available = checked_remaining_quantity(lot, entries)?;
    if available < requested {
        return Err(AllocationError::InsufficientStock {
            shortfall: requested - available,
        });
    }

    Ok(LotTake {
        lot_id: lot.id,
        quantity_kg: requested,
    })
}

/// Plan a fresh allocation for a sale whose quantity is being edited.
///
/// The sale's existing entries are discarded before planning; FIFO order may
/// differ from the original allocation once other sales have consumed lots in
/// the interim, so this is a full reset, not an adjustment. The caller owns
/// making the delete-and-reinsert atomic.
pub fn plan_reallocation(
    lots: &[PurchaseLot],
    entries: &[AllocationEntry],
    sale_id: Uuid,
    new_quantity: Decimal,
) -> Result<Vec<LotTake>, AllocationError> {
    let retained: Vec<AllocationEntry> = entries
        .iter()
        .filter(|e| e.sale_id != sale_id)
        .cloned()
        .collect();
    plan_fifo_allocation(lots, &retained, new_quantity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn lot(date: &str, sequence: i64, qty: &str) -> PurchaseLot {
        PurchaseLot {
            id: Uuid::new_v4(),
            supplier_id: Uuid::new_v4(),
            purchase_date: NaiveDate::from_str(date).unwrap(),
            sequence,
            original_quantity_kg: dec(qty),
            unit_cost: dec("20"),
            notes: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_consumes_oldest_lot_first() {
        let l1 = lot("2024-01-01", 1, "10");
        let l2 = lot("2024-01-02", 2, "10");
        // Insertion order deliberately newest-first
        let takes = plan_fifo_allocation(&[l2.clone(), l1.clone()], &[], dec("15")).unwrap();

        assert_eq!(
            takes,
            vec![
                LotTake {
                    lot_id: l1.id,
                    quantity_kg: dec("10")
                },
                LotTake {
                    lot_id: l2.id,
                    quantity_kg: dec("5")
                },
            ]
        );
    }

    #[test]
    fn test_rejects_non_positive_request() {
        let l1 = lot("2024-01-01", 1, "10");
        assert_eq!(
            plan_fifo_allocation(&[l1.clone()], &[], Decimal::ZERO),
            Err(AllocationError::InvalidQuantity {
                quantity: Decimal::ZERO
            })
        );
        assert!(matches!(
            plan_fifo_allocation(&[l1], &[], dec("-3")),
            Err(AllocationError::InvalidQuantity { .. })
        ));
    }

    #[test]
    fn test_shortfall_reported_when_stock_runs_out() {
        let l1 = lot("2024-01-01", 1, "10");
        assert_eq!(
            plan_fifo_allocation(&[l1], &[], dec("12.5")),
            Err(AllocationError::InsufficientStock {
                shortfall: dec("2.5")
            })
        );
    }

    #[test]
    fn test_no_lots_means_full_shortfall() {
        assert_eq!(
            plan_fifo_allocation(&[], &[], dec("7")),
            Err(AllocationError::InsufficientStock {
                shortfall: dec("7")
            })
        );
    }

    #[test]
    fn test_existing_entries_reduce_availability() {
        let l1 = lot("2024-01-01", 1, "50");
        let entries = vec![AllocationEntry::new(l1.id, Uuid::new_v4(), dec("45"))];

        let takes = plan_fifo_allocation(&[l1.clone()], &entries, dec("5")).unwrap();
        assert_eq!(takes.len(), 1);
        assert_eq!(takes[0].quantity_kg, dec("5"));
    }

    #[test]
    fn test_data_integrity_surfaces_before_any_take() {
        let bad = lot("2024-01-01", 1, "10");
        let good = lot("2024-01-02", 2, "100");
        let entries = vec![AllocationEntry::new(bad.id, Uuid::new_v4(), dec("11"))];

        assert_eq!(
            plan_fifo_allocation(&[bad.clone(), good], &entries, dec("5")),
            Err(AllocationError::DataIntegrity { lot_id: bad.id })
        );
    }

    #[test]
    fn test_manual_lot_allocation_has_no_spill_over() {
        let l1 = lot("2024-01-01", 1, "10");
        let entries = vec![AllocationEntry::new(l1.id, Uuid::new_v4(), dec("4"))];

        let take = plan_lot_allocation(&l1, &entries, dec("6")).unwrap();
        assert_eq!(take.quantity_kg, dec("6"));

        assert_eq!(
            plan_lot_allocation(&l1, &entries, dec("7")),
            Err(AllocationError::InsufficientStock {
                shortfall: dec("1")
            })
        );
    }

    #[test]
    fn test_reallocation_ignores_the_sales_own_entries() {
        let l1 = lot("2024-01-01", 1, "10");
        let sale = Uuid::new_v4();
        let entries = vec![AllocationEntry::new(l1.id, sale, dec("10"))];

        // The lot is fully consumed by this sale; growing the sale to the
        // lot's full size must still plan cleanly against freed stock.
        let takes = plan_reallocation(&[l1.clone()], &entries, sale, dec("10")).unwrap();
        assert_eq!(takes, vec![LotTake { lot_id: l1.id, quantity_kg: dec("10") }]);
    }
}
