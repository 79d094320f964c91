//! Lot ledger projection
//!
//! Pure functions answering "how much of each lot is left" over explicit
//! collections of lots and allocation entries. The backend recomputes these
//! through SQL aggregates; the functions here are the reference semantics
//! and what the allocator plans against inside a transaction.

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::allocation::AllocationError;
use crate::models::{AllocationEntry, PurchaseLot};

/// Total quantity already consumed from a lot.
pub fn allocated_quantity(lot_id: Uuid, entries: &[AllocationEntry]) -> Decimal {
    entries
        .iter()
        .filter(|e| e.lot_id == lot_id)
        .map(|e| e.quantity_kg)
        .sum()
}

/// Remaining quantity of a lot, floored at zero.
///
/// The floor is a display-path safety net only: committed data with a
/// negative remaining is an integrity violation, and write paths must use
/// [`checked_remaining_quantity`] instead of this function.
pub fn remaining_quantity(lot: &PurchaseLot, entries: &[AllocationEntry]) -> Decimal {
    let remaining = lot.original_quantity_kg - allocated_quantity(lot.id, entries);
    remaining.max(Decimal::ZERO)
}

/// Remaining quantity of a lot, erroring if allocations exceed the purchase.
pub fn checked_remaining_quantity(
    lot: &PurchaseLot,
    entries: &[AllocationEntry],
) -> Result<Decimal, AllocationError> {
    let remaining = lot.original_quantity_kg - allocated_quantity(lot.id, entries);
    if remaining < Decimal::ZERO {
        return Err(AllocationError::DataIntegrity { lot_id: lot.id });
    }
    Ok(remaining)
}

/// All lots with stock left, in FIFO consumption order.
///
/// Ordered by purchase date ascending, then by the lot's insertion sequence.
/// Recomputed on every call; fully-consumed lots are excluded.
pub fn lots_with_remaining_stock<'a>(
    lots: &'a [PurchaseLot],
    entries: &[AllocationEntry],
) -> Vec<(&'a PurchaseLot, Decimal)> {
    let mut stocked: Vec<(&PurchaseLot, Decimal)> = lots
        .iter()
        .map(|lot| (lot, remaining_quantity(lot, entries)))
        .filter(|(_, remaining)| *remaining > Decimal::ZERO)
        .collect();
    stocked.sort_by_key(|(lot, _)| lot.fifo_key());
    stocked
}
