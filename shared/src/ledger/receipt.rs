//! Inbound receipt line merging
//!
//! Suppliers often list the same product more than once on a delivery
//! note. Lines sharing a product and unit cost are merged into one before
//! persisting, so each merged line maps 1:1 onto a batch.

use rust_decimal::Decimal;
use uuid::Uuid;

/// One raw line of an inbound receipt as submitted.
#[derive(Debug, Clone, PartialEq)]
pub struct ReceiptLine {
    pub product_id: Uuid,
    pub quantity: i64,
    pub unit_cost: Decimal,
}

/// A merged receipt line with its computed subtotal.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedLine {
    pub product_id: Uuid,
    pub quantity: i64,
    pub unit_cost: Decimal,
    pub subtotal: Decimal,
}

/// Merge lines sharing (product, unit cost), preserving first-seen order.
pub fn merge_lines(lines: &[ReceiptLine]) -> Vec<MergedLine> {
    let mut merged: Vec<MergedLine> = Vec::new();

    for line in lines {
        match merged
            .iter_mut()
            .find(|m| m.product_id == line.product_id && m.unit_cost == line.unit_cost)
        {
            Some(existing) => {
                existing.quantity += line.quantity;
                existing.subtotal = Decimal::from(existing.quantity) * existing.unit_cost;
            }
            None => merged.push(MergedLine {
                product_id: line.product_id,
                quantity: line.quantity,
                unit_cost: line.unit_cost,
                subtotal: Decimal::from(line.quantity) * line.unit_cost,
            }),
        }
    }

    merged
}

/// Receipt total across merged lines.
pub fn receipt_total(lines: &[MergedLine]) -> Decimal {
    lines.iter().map(|l| l.subtotal).sum()
}
