//! Split snapshots.
//!
//! The rate core never reads the ledger store directly. A [`SplitFeed`] hands
//! it one ordered snapshot per top-level operation; [`Ledger`] is the
//! in-memory implementation used by the CLI and tests.

use chrono::NaiveDate;
use fxledger_core::{commodities_of, Commodity, InternedStr, Split};
use serde::{Deserialize, Serialize};

/// Source of split snapshots.
pub trait SplitFeed {
    /// Splits of non-void transactions, sorted by date.
    ///
    /// When `accounts` is given only splits posting to those accounts are
    /// returned. When `end_date` is given only splits dated on or before it
    /// are returned.
    fn fetch_splits(&self, accounts: Option<&[InternedStr]>, end_date: Option<NaiveDate>)
        -> Vec<Split>;
}

/// An in-memory ledger of splits.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Ledger {
    splits: Vec<Split>,
}

impl Ledger {
    /// Create an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a ledger from splits in any order.
    #[must_use]
    pub fn from_splits(splits: Vec<Split>) -> Self {
        Self { splits }
    }

    /// Add a split.
    pub fn push(&mut self, split: Split) {
        self.splits.push(split);
    }

    /// All stored splits, voided ones included.
    #[must_use]
    pub fn splits(&self) -> &[Split] {
        &self.splits
    }

    /// Number of stored splits.
    #[must_use]
    pub fn len(&self) -> usize {
        self.splits.len()
    }

    /// Whether the ledger holds no splits.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.splits.is_empty()
    }

    /// Distinct commodities appearing on either side of any split, in
    /// first-seen order.
    #[must_use]
    pub fn commodities(&self) -> Vec<Commodity> {
        commodities_of(&self.splits)
    }
}

impl SplitFeed for Ledger {
    fn fetch_splits(
        &self,
        accounts: Option<&[InternedStr]>,
        end_date: Option<NaiveDate>,
    ) -> Vec<Split> {
        let mut out: Vec<Split> = self
            .splits
            .iter()
            .filter(|s| !s.voided)
            .filter(|s| end_date.map_or(true, |end| s.date <= end))
            .filter(|s| accounts.map_or(true, |accts| accts.contains(&s.account)))
            .cloned()
            .collect();
        // Stable: same-day splits keep ledger order.
        out.sort_by_key(|s| s.date);
        out
    }
}

impl SplitFeed for [Split] {
    fn fetch_splits(
        &self,
        accounts: Option<&[InternedStr]>,
        end_date: Option<NaiveDate>,
    ) -> Vec<Split> {
        Ledger::from_splits(self.to_vec()).fetch_splits(accounts, end_date)
    }
}
