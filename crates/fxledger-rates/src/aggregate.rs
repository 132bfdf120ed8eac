//! Pair aggregation.
//!
//! Walks a split snapshot and accumulates, for every pair of commodities that
//! meet in a cross-commodity split, the total quantity exchanged on each side.
//! The result is a [`SumList`]: base commodity → list of [`PairEntry`], where
//! each entry's `value` is counted in the base and its `amount` in the paired
//! commodity.
//!
//! Two variants share the walk:
//!
//! - [`AggregationMode::Totals`] sums absolute quantities.
//! - [`AggregationMode::Cost`] keeps signs, so sales offset purchases, and
//!   skips trading-account splits, which would count every exchange twice.

use fxledger_core::{find_equiv, Commodity, Split};
use rust_decimal::Decimal;

use crate::collector::{Overflow, PairTotals};
use crate::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};

/// Which totals an aggregation pass keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregationMode {
    /// Absolute quantities of every exchange.
    Totals,
    /// Signed quantities, excluding trading accounts.
    Cost,
}

/// Totals exchanged between a base commodity and `commodity`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairEntry {
    /// The paired (non-base) commodity.
    pub commodity: Commodity,
    /// `value` in the base commodity, `amount` in `commodity`.
    pub totals: PairTotals,
}

/// All pairs observed against one base commodity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseEntry {
    /// The base commodity.
    pub commodity: Commodity,
    /// Pairs in discovery order.
    pub pairs: Vec<PairEntry>,
}

impl BaseEntry {
    fn new(commodity: Commodity) -> Self {
        Self {
            commodity,
            pairs: Vec::new(),
        }
    }

    /// The pair entry for `other`, if observed.
    #[must_use]
    pub fn pair(&self, other: &Commodity) -> Option<&PairEntry> {
        find_equiv(&self.pairs, other, |p| &p.commodity)
    }

    fn pair_mut(&mut self, other: &Commodity) -> &mut PairEntry {
        let idx = match self.pairs.iter().position(|p| p.commodity.equiv(other)) {
            Some(idx) => idx,
            None => {
                self.pairs.push(PairEntry {
                    commodity: other.clone(),
                    totals: PairTotals::default(),
                });
                self.pairs.len() - 1
            }
        };
        &mut self.pairs[idx]
    }
}

/// Raw exchange totals keyed by commodity pair.
///
/// Always holds an entry for the report commodity, possibly empty, as its
/// first base.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SumList {
    report_commodity: Commodity,
    entries: Vec<BaseEntry>,
}

impl SumList {
    /// Create a sum list seeded with an empty report-commodity entry.
    #[must_use]
    pub fn new(report_commodity: &Commodity) -> Self {
        Self {
            report_commodity: report_commodity.clone(),
            entries: vec![BaseEntry::new(report_commodity.clone())],
        }
    }

    /// The report commodity this list was seeded with.
    #[must_use]
    pub const fn report_commodity(&self) -> &Commodity {
        &self.report_commodity
    }

    /// The pairs observed directly against the report commodity.
    #[must_use]
    pub fn report_entry(&self) -> &BaseEntry {
        &self.entries[0]
    }

    /// All base entries in discovery order, report commodity first.
    #[must_use]
    pub fn entries(&self) -> &[BaseEntry] {
        &self.entries
    }

    /// The base entry for `commodity`, if any.
    #[must_use]
    pub fn entry(&self, commodity: &Commodity) -> Option<&BaseEntry> {
        find_equiv(&self.entries, commodity, |e| &e.commodity)
    }

    /// The totals recorded for `(base, other)`, if any.
    #[must_use]
    pub fn pair(&self, base: &Commodity, other: &Commodity) -> Option<&PairTotals> {
        self.entry(base)?.pair(other).map(|p| &p.totals)
    }

    fn index_of(&self, commodity: &Commodity) -> Option<usize> {
        self.entries
            .iter()
            .position(|e| e.commodity.equiv(commodity))
    }

    /// Record an exchange of `value` units of `base` for `amount` units of
    /// `other`, creating entries as needed.
    pub fn record(
        &mut self,
        base: &Commodity,
        other: &Commodity,
        value: Decimal,
        amount: Decimal,
    ) -> Result<(), Overflow> {
        let idx = match self.index_of(base) {
            Some(idx) => idx,
            None => {
                self.entries.push(BaseEntry::new(base.clone()));
                self.entries.len() - 1
            }
        };
        self.entries[idx].pair_mut(other).totals.add(value, amount)
    }

    /// Fold one split into the list.
    ///
    /// The entry is looked up by the transaction commodity first, then by the
    /// account commodity; a split matching neither opens a new base keyed by
    /// its account commodity. A split whose quantities would overflow the
    /// pair totals is left out.
    pub fn add_split(&mut self, split: &Split, mode: AggregationMode) -> Result<(), Overflow> {
        if !split.is_cross_commodity() || split.amount.is_zero() {
            return Ok(());
        }
        if mode == AggregationMode::Cost && split.is_trading() {
            return Ok(());
        }

        let txn = &split.transaction_commodity;
        let acct = &split.account_commodity;
        let idx = match self.index_of(txn).or_else(|| self.index_of(acct)) {
            Some(idx) => idx,
            None => {
                self.entries.push(BaseEntry::new(acct.clone()));
                self.entries.len() - 1
            }
        };

        let base_is_txn = self.entries[idx].commodity.equiv(txn);
        let (other, value, amount) = match (base_is_txn, mode) {
            (true, AggregationMode::Totals) => (acct, split.value.abs(), split.amount.abs()),
            (true, AggregationMode::Cost) => (acct, -split.value, -split.amount),
            (false, AggregationMode::Totals) => (txn, split.amount.abs(), split.value.abs()),
            (false, AggregationMode::Cost) => (txn, split.amount, split.value),
        };
        self.entries[idx].pair_mut(other).totals.add(value, amount)
    }
}

/// Aggregate a snapshot of splits against `report_commodity`.
pub fn aggregate(
    splits: &[Split],
    report_commodity: &Commodity,
    mode: AggregationMode,
    diags: &mut Diagnostics,
) -> SumList {
    let mut sumlist = SumList::new(report_commodity);
    for split in splits {
        if sumlist.add_split(split, mode).is_err() {
            diags.push(
                Diagnostic::new(
                    DiagnosticKind::Overflow,
                    format!(
                        "exchange totals between {} and {} overflowed; split in {} skipped",
                        split.account_commodity, split.transaction_commodity, split.account
                    ),
                )
                .with_commodity(&split.account_commodity)
                .with_date(split.date),
            );
        }
    }
    tracing::debug!(
        ?mode,
        splits = splits.len(),
        bases = sumlist.entries.len(),
        "aggregated exchange totals"
    );
    sumlist
}

/// Aggregate absolute exchange totals.
pub fn aggregate_totals(
    splits: &[Split],
    report_commodity: &Commodity,
    diags: &mut Diagnostics,
) -> SumList {
    aggregate(splits, report_commodity, AggregationMode::Totals, diags)
}

/// Aggregate signed exchange totals, excluding trading accounts.
pub fn aggregate_cost(
    splits: &[Split],
    report_commodity: &Commodity,
    diags: &mut Diagnostics,
) -> SumList {
    aggregate(splits, report_commodity, AggregationMode::Cost, diags)
}
