//! Multi-commodity balance accumulator.
//!
//! A [`Balance`] tracks running totals for several commodities at once, one
//! entry per equivalence class. Report code fills it while walking accounts
//! and then reduces it to a single commodity with an exchange function.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{find_equiv, Amount, Commodity};

/// A collection of per-commodity totals.
///
/// # Examples
///
/// ```
/// use fxledger_core::{Amount, Balance, Commodity};
/// use rust_decimal_macros::dec;
///
/// let usd = Commodity::currency("USD");
/// let eur = Commodity::currency("EUR");
///
/// let mut balance = Balance::new();
/// balance.add(&Amount::new(dec!(100), usd.clone()));
/// balance.add(&Amount::new(dec!(20), eur.clone()));
/// balance.add(&Amount::new(dec!(-30), usd.clone()));
///
/// assert_eq!(balance.units(&usd), dec!(70));
/// assert_eq!(balance.units(&eur), dec!(20));
/// assert_eq!(balance.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    totals: Vec<Amount>,
}

impl Balance {
    /// Create an empty balance.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a balance from a sequence of amounts.
    pub fn from_amounts<'a>(amounts: impl IntoIterator<Item = &'a Amount>) -> Self {
        let mut balance = Self::new();
        for amount in amounts {
            balance.add(amount);
        }
        balance
    }

    /// Add an amount, merging into the entry of an equivalent commodity.
    pub fn add(&mut self, amount: &Amount) {
        if let Some(existing) = self
            .totals
            .iter_mut()
            .find(|a| a.commodity.equiv(&amount.commodity))
        {
            existing.number += amount.number;
        } else {
            self.totals.push(amount.clone());
        }
    }

    /// Add every entry of another balance.
    pub fn merge(&mut self, other: &Self) {
        for amount in &other.totals {
            self.add(amount);
        }
    }

    /// Total held of `commodity` (zero if absent).
    #[must_use]
    pub fn units(&self, commodity: &Commodity) -> Decimal {
        self.get(commodity).map_or(Decimal::ZERO, |a| a.number)
    }

    /// The entry for `commodity`, if one was ever added.
    #[must_use]
    pub fn get(&self, commodity: &Commodity) -> Option<&Amount> {
        find_equiv(&self.totals, commodity, |a| &a.commodity)
    }

    /// All entries in first-seen order, zero totals included.
    pub fn iter(&self) -> impl Iterator<Item = &Amount> {
        self.totals.iter()
    }

    /// Commodities with a non-zero total.
    #[must_use]
    pub fn commodities(&self) -> Vec<&Commodity> {
        self.totals
            .iter()
            .filter(|a| !a.is_zero())
            .map(|a| &a.commodity)
            .collect()
    }

    /// Number of entries (including zero totals).
    #[must_use]
    pub fn len(&self) -> usize {
        self.totals.len()
    }

    /// Check whether every entry is zero.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.totals.iter().all(Amount::is_zero)
    }
}

impl<'a> IntoIterator for &'a Balance {
    type Item = &'a Amount;
    type IntoIter = std::slice::Iter<'a, Amount>;

    fn into_iter(self) -> Self::IntoIter {
        self.totals.iter()
    }
}

impl fmt::Display for Balance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.totals.is_empty() {
            return write!(f, "(empty)");
        }
        let parts: Vec<String> = self.totals.iter().map(ToString::to_string).collect();
        write!(f, "{}", parts.join(", "))
    }
}
