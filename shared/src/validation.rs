//! Validation utilities for the Fish Trading Management Platform
//!
//! Quantities are stored as `NUMERIC(12,2)` kilograms; the comparisons in
//! the allocator are exact at that scale, so inputs with finer precision are
//! rejected rather than rounded.

use rust_decimal::Decimal;

/// Storage precision for stock quantities: hundredths of a kilogram.
pub const STOCK_SCALE: u32 = 2;

/// Validate that a decimal fits the storage scale (at most 2 decimal places)
pub fn validate_stock_scale(value: Decimal) -> Result<(), &'static str> {
    if value.normalize().scale() > STOCK_SCALE {
        return Err("Quantity precision is limited to hundredths of a kilogram");
    }
    Ok(())
}

/// Validate a requested sale quantity: strictly positive, storage scale
pub fn validate_sale_quantity(quantity: Decimal) -> Result<(), &'static str> {
    if quantity <= Decimal::ZERO {
        return Err("Quantity must be greater than 0");
    }
    validate_stock_scale(quantity)
}

/// Validate a lot quantity or unit cost: non-negative, storage scale
pub fn validate_lot_amount(amount: Decimal) -> Result<(), &'static str> {
    if amount < Decimal::ZERO {
        return Err("Amount cannot be negative");
    }
    validate_stock_scale(amount)
}
