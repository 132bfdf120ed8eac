//! Running-sum collectors.

use rust_decimal::Decimal;
use thiserror::Error;

/// A running sum left the range of `Decimal`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("running total overflowed")]
pub struct Overflow;

/// A running sum of quantities.
///
/// Created empty, only ever added to, and read with [`total`](Self::total).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValueCollector {
    total: Decimal,
}

impl ValueCollector {
    /// Create an empty collector.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            total: Decimal::ZERO,
        }
    }

    /// Create a collector that already holds `total`.
    #[must_use]
    pub const fn with_total(total: Decimal) -> Self {
        Self { total }
    }

    /// Add a quantity. On overflow the total is left unchanged.
    pub fn add(&mut self, quantity: Decimal) -> Result<(), Overflow> {
        self.total = self.total.checked_add(quantity).ok_or(Overflow)?;
        Ok(())
    }

    /// The current sum.
    #[must_use]
    pub const fn total(&self) -> Decimal {
        self.total
    }
}

/// A `(value, amount)` pair of collectors for one commodity pair.
///
/// Which commodity each side is counted in depends on the owner: in a
/// sum list `value` is in the base commodity and `amount` in the paired one;
/// in a report list `value` is in the report commodity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PairTotals {
    /// Quantity counted in the base (or report) commodity.
    pub value: ValueCollector,
    /// Quantity counted in the other commodity.
    pub amount: ValueCollector,
}

impl PairTotals {
    /// Build from explicit totals.
    #[must_use]
    pub const fn new(value: Decimal, amount: Decimal) -> Self {
        Self {
            value: ValueCollector::with_total(value),
            amount: ValueCollector::with_total(amount),
        }
    }

    /// Add one observation. Either both sides are updated or, on
    /// overflow, neither is.
    pub fn add(&mut self, value: Decimal, amount: Decimal) -> Result<(), Overflow> {
        let mut next = *self;
        next.value.add(value)?;
        next.amount.add(amount)?;
        *self = next;
        Ok(())
    }

    /// The same totals seen from the other commodity's side.
    #[must_use]
    pub const fn swapped(&self) -> Self {
        Self {
            value: self.amount,
            amount: self.value,
        }
    }

    /// Add another pair's totals into this one.
    pub fn merge(&mut self, other: &Self) -> Result<(), Overflow> {
        self.add(other.value.total(), other.amount.total())
    }
}
