//! Per-line discount arithmetic for outbound shipments
//!
//! A discount applies to one requested product line as a whole, even when
//! FIFO expands that line into several batch sub-lines. The discount is
//! validated against the pre-discount line subtotal and then subtracted
//! from the last sub-line's subtotal only, keeping the earlier sub-lines
//! accurate for per-batch cost tracing.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::LedgerError;

/// How a line discount is expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscountKind {
    #[default]
    None,
    Percent,
    Amount,
}

impl DiscountKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiscountKind::None => "none",
            DiscountKind::Percent => "percent",
            DiscountKind::Amount => "amount",
        }
    }
}

impl FromStr for DiscountKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(DiscountKind::None),
            "percent" => Ok(DiscountKind::Percent),
            "amount" => Ok(DiscountKind::Amount),
            other => Err(format!("unknown discount kind: {}", other)),
        }
    }
}

impl fmt::Display for DiscountKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validate a discount against the pre-discount line subtotal.
///
/// Percent discounts above 99 and amount discounts that consume or exceed
/// the full line are rejected. Must be called before any totals mutate.
pub fn validate_discount(
    kind: DiscountKind,
    value: Decimal,
    line_subtotal: Decimal,
) -> Result<(), LedgerError> {
    if value < Decimal::ZERO {
        return Err(LedgerError::InvalidDiscount(
            "discount value cannot be negative".to_string(),
        ));
    }

    match kind {
        DiscountKind::None => Ok(()),
        DiscountKind::Percent => {
            if value > Decimal::from(99) {
                Err(LedgerError::InvalidDiscount(format!(
                    "percent discount must not exceed 99, got {}",
                    value
                )))
            } else {
                Ok(())
            }
        }
        DiscountKind::Amount => {
            if value >= line_subtotal {
                Err(LedgerError::InvalidDiscount(format!(
                    "amount discount {} must be less than line subtotal {}",
                    value, line_subtotal
                )))
            } else {
                Ok(())
            }
        }
    }
}

/// The currency amount a validated discount removes from the line.
pub fn discount_amount(kind: DiscountKind, value: Decimal, line_subtotal: Decimal) -> Decimal {
    match kind {
        DiscountKind::None => Decimal::ZERO,
        DiscountKind::Percent => line_subtotal * value / Decimal::from(100),
        DiscountKind::Amount => value,
    }
}

/// Subtract the discount from the last sub-line's subtotal.
///
/// The last subtotal may go negative when the discount exceeds it; the
/// line-level total stays correct because the discount was bounded by the
/// whole line's subtotal.
pub fn apply_to_last(subtotals: &mut [Decimal], discount: Decimal) {
    if let Some(last) = subtotals.last_mut() {
        *last -= discount;
    }
}
