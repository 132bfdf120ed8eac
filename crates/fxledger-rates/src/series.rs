//! Price series built from split history.
//!
//! For one target commodity, walks its cross-commodity splits in date order
//! and emits a [`PricePoint`] per split, priced in the report commodity.
//!
//! - [`SeriesKind::WeightedAverage`] emits the running ratio of all value
//!   seen so far to all quantity seen so far.
//! - [`SeriesKind::Instantaneous`] emits each split's own ratio.
//!
//! The weighted average does not separate value-only legs (capital gain or
//! loss bookings with a zero quantity) from trades. Such a leg moves the
//! running value without moving the running quantity, so the average jumps
//! right after it and only partially settles on the next real trade. The
//! series reproduces that behavior as-is.

use chrono::NaiveDate;
use fxledger_core::{Amount, Commodity, CommodityKey, Split};
use rust_decimal::Decimal;
use std::collections::BTreeMap;

use crate::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
use crate::parity::FixedParity;
use crate::progress::{ProgressSink, ProgressWindow};
use crate::round::rate_div;

/// A price at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricePoint {
    /// When the price was observed.
    pub date: NaiveDate,
    /// Report-commodity units per unit of the priced commodity.
    pub price: Decimal,
}

impl PricePoint {
    /// Create a price point.
    #[must_use]
    pub const fn new(date: NaiveDate, price: Decimal) -> Self {
        Self { date, price }
    }
}

/// Ascending-by-date prices of one commodity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceList {
    /// The priced commodity.
    pub commodity: Commodity,
    /// Points sorted by date; never zero-priced.
    pub points: Vec<PricePoint>,
}

impl PriceList {
    /// Whether the series has no points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Number of points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }
}

/// Commodity → price series.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PriceAlist {
    series: BTreeMap<CommodityKey, PriceList>,
}

impl PriceAlist {
    /// Create an empty mapping.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the series for its commodity.
    pub fn insert(&mut self, list: PriceList) {
        self.series.insert(list.commodity.key().clone(), list);
    }

    /// The series for `commodity`, if any.
    #[must_use]
    pub fn get(&self, commodity: &Commodity) -> Option<&PriceList> {
        self.series.get(commodity.key())
    }

    /// All series ordered by commodity key.
    pub fn iter(&self) -> impl Iterator<Item = &PriceList> {
        self.series.values()
    }

    /// Number of series.
    #[must_use]
    pub fn len(&self) -> usize {
        self.series.len()
    }

    /// Whether there are no series.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

/// How each point of a series is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SeriesKind {
    /// Running weighted average of all splits so far.
    WeightedAverage,
    /// Each split's own price.
    Instantaneous,
}

/// One split reduced to quantities in the report and target commodities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Observation {
    /// Date of the split.
    pub date: NaiveDate,
    /// Quantity on the other side, in the report commodity.
    pub other_amount: Decimal,
    /// Quantity of the target commodity.
    pub target_amount: Decimal,
}

/// Running sums threaded through the weighted-average fold.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunningTotals {
    /// Report-commodity quantity seen so far.
    pub total_other: Decimal,
    /// Target quantity seen so far.
    pub total_target: Decimal,
}

impl RunningTotals {
    /// Fold one observation in, returning the new totals and the point to
    /// emit.
    ///
    /// An observation that would overflow the sums is not folded in and
    /// yields an unpriced point.
    #[must_use]
    pub fn step(self, obs: &Observation) -> (Self, PricePoint) {
        let next = self
            .total_other
            .checked_add(obs.other_amount)
            .zip(self.total_target.checked_add(obs.target_amount));
        let Some((total_other, total_target)) = next else {
            return (self, PricePoint::new(obs.date, Decimal::ZERO));
        };
        let next = Self {
            total_other,
            total_target,
        };
        let price = rate_div(next.total_other, next.total_target).unwrap_or(Decimal::ZERO);
        (next, PricePoint::new(obs.date, price))
    }
}

/// Cross-commodity splits, optionally restricted to those touching
/// `target`, in date order.
#[must_use]
pub fn interesting_splits<'a>(splits: &'a [Split], target: Option<&Commodity>) -> Vec<&'a Split> {
    let mut out: Vec<&Split> = splits
        .iter()
        .filter(|s| s.is_cross_commodity())
        .filter(|s| target.map_or(true, |t| s.involves(t)))
        .collect();
    out.sort_by_key(|s| s.date);
    out
}

/// Orient a split so quantities read as (report side, target side).
///
/// A non-report other side goes through the fixed-parity table; when that
/// fails the report side is recorded as zero.
fn observe(
    split: &Split,
    target: &Commodity,
    report_commodity: &Commodity,
    parity: &dyn FixedParity,
    diags: &mut Diagnostics,
) -> Observation {
    let (other, other_amount, target_amount) = if split.account_commodity.equiv(target) {
        (&split.transaction_commodity, split.value.abs(), split.amount.abs())
    } else {
        (&split.account_commodity, split.amount.abs(), split.value.abs())
    };

    let other_amount = if other.equiv(report_commodity) {
        other_amount
    } else {
        let foreign = Amount::new(other_amount, other.clone());
        if let Some(converted) = parity.convert(&foreign, report_commodity, Some(split.date)) {
            converted.number
        } else {
            diags.push(
                Diagnostic::new(
                    DiagnosticKind::NoPriceFound,
                    format!(
                        "cannot convert {other} to {report_commodity} while pricing {target}"
                    ),
                )
                .with_commodity(other)
                .with_date(split.date),
            );
            Decimal::ZERO
        }
    };

    Observation {
        date: split.date,
        other_amount,
        target_amount,
    }
}

fn drop_unpriced(points: Vec<PricePoint>) -> Vec<PricePoint> {
    points.into_iter().filter(|p| !p.price.is_zero()).collect()
}

/// Fold observations into a weighted-average series.
#[must_use]
pub fn fold_weighted_average(observations: &[Observation]) -> Vec<PricePoint> {
    let (_, points) = observations.iter().fold(
        (RunningTotals::default(), Vec::with_capacity(observations.len())),
        |(totals, mut points), obs| {
            let (next, point) = totals.step(obs);
            points.push(point);
            (next, points)
        },
    );
    drop_unpriced(points)
}

/// Map observations to per-split prices.
#[must_use]
pub fn map_instantaneous(observations: &[Observation]) -> Vec<PricePoint> {
    drop_unpriced(
        observations
            .iter()
            .map(|obs| {
                let price = rate_div(obs.other_amount, obs.target_amount).unwrap_or(Decimal::ZERO);
                PricePoint::new(obs.date, price)
            })
            .collect(),
    )
}

/// Build the price series of `commodity` in `report_commodity`.
pub fn price_series(
    splits: &[Split],
    commodity: &Commodity,
    report_commodity: &Commodity,
    kind: SeriesKind,
    parity: &dyn FixedParity,
    diags: &mut Diagnostics,
) -> PriceList {
    let observations: Vec<Observation> = interesting_splits(splits, Some(commodity))
        .into_iter()
        .map(|s| observe(s, commodity, report_commodity, parity, diags))
        .collect();
    let points = match kind {
        SeriesKind::WeightedAverage => fold_weighted_average(&observations),
        SeriesKind::Instantaneous => map_instantaneous(&observations),
    };
    tracing::debug!(
        commodity = %commodity,
        ?kind,
        splits = observations.len(),
        points = points.len(),
        "built price series"
    );
    PriceList {
        commodity: commodity.clone(),
        points,
    }
}

/// Weighted-average series of `commodity`.
pub fn weighted_average_prices(
    splits: &[Split],
    commodity: &Commodity,
    report_commodity: &Commodity,
    parity: &dyn FixedParity,
    diags: &mut Diagnostics,
) -> PriceList {
    price_series(splits, commodity, report_commodity, SeriesKind::WeightedAverage, parity, diags)
}

/// Instantaneous series of `commodity`.
pub fn instantaneous_prices(
    splits: &[Split],
    commodity: &Commodity,
    report_commodity: &Commodity,
    parity: &dyn FixedParity,
    diags: &mut Diagnostics,
) -> PriceList {
    price_series(splits, commodity, report_commodity, SeriesKind::Instantaneous, parity, diags)
}

/// Build one series per commodity in `commodities`.
///
/// The report commodity itself is skipped. `progress` is told the percent
/// done (within `window`) after each commodity.
#[allow(clippy::too_many_arguments)]
pub fn commodity_list_prices(
    splits: &[Split],
    commodities: &[Commodity],
    report_commodity: &Commodity,
    kind: SeriesKind,
    parity: &dyn FixedParity,
    progress: &mut dyn ProgressSink,
    window: ProgressWindow,
    diags: &mut Diagnostics,
) -> PriceAlist {
    let cross: Vec<Split> = interesting_splits(splits, None).into_iter().cloned().collect();
    let mut alist = PriceAlist::new();
    for (i, commodity) in commodities.iter().enumerate() {
        if !commodity.equiv(report_commodity) {
            alist.insert(price_series(&cross, commodity, report_commodity, kind, parity, diags));
        }
        progress.report_fraction_done(window.percent(i + 1, commodities.len()));
    }
    alist
}
