//! Exchange functions.
//!
//! A [`PriceSource`] picks where rates come from; [`RateContext`] turns it
//! into an [`Exchanger`] that converts amounts into a domestic commodity.
//! Every exchanger tries, in order:
//!
//! 1. the fixed-parity table, when both commodities are members;
//! 2. identity, when the commodities are equivalent;
//! 3. its own rate source.
//!
//! When the rate source has nothing usable the result is a zero amount in
//! the domestic commodity plus a [`DiagnosticKind::NoPriceFound`].

use chrono::NaiveDate;
use fxledger_core::{commodities_of, Amount, Commodity, InternedStr, Split};
use rust_decimal::Decimal;
use std::fmt;
use std::str::FromStr;

use crate::alist::{exchange_alist, exchange_cost_alist, ExchangeAlist};
use crate::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
use crate::feed::SplitFeed;
use crate::lookup::nearest;
use crate::parity::{EuroParity, FixedParity};
use crate::pricedb::PriceLookup;
use crate::progress::{NoProgress, ProgressSink, ProgressWindow};
use crate::round::{rate_div, round_sigfigs, PRODUCT_SIGFIGS};
use crate::series::{commodity_list_prices, PriceAlist, SeriesKind};

/// Where exchange rates come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PriceSource {
    /// Net cost of holdings: signed totals, trading accounts excluded.
    AverageCost,
    /// Absolute totals of every exchange, or their running average over
    /// time.
    WeightedAverage,
    /// The price of the individual exchange closest in time.
    ActualTransactions,
    /// Most recent quote in the price database.
    PriceDbLatest,
    /// Quote in the price database closest in time.
    PriceDbNearest,
}

/// Error for an unrecognized price source tag.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown price source \"{0}\"")]
pub struct UnknownPriceSource(pub String);

impl PriceSource {
    /// Every source, in configuration order.
    pub const ALL: [Self; 5] = [
        Self::AverageCost,
        Self::WeightedAverage,
        Self::ActualTransactions,
        Self::PriceDbLatest,
        Self::PriceDbNearest,
    ];

    /// Configuration tag.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::AverageCost => "average-cost",
            Self::WeightedAverage => "weighted-average",
            Self::ActualTransactions => "actual-transactions",
            Self::PriceDbLatest => "pricedb-latest",
            Self::PriceDbNearest => "pricedb-nearest",
        }
    }

    /// Parse a tag coming from user configuration.
    ///
    /// Unknown tags fall back to [`PriceSource::PriceDbNearest`] and record
    /// an [`DiagnosticKind::UnsupportedStrategy`].
    pub fn parse_or_fallback(tag: &str, diags: &mut Diagnostics) -> Self {
        tag.parse().unwrap_or_else(|e: UnknownPriceSource| {
            diags.push(Diagnostic::new(
                DiagnosticKind::UnsupportedStrategy,
                format!("{e}, using {}", Self::PriceDbNearest),
            ));
            Self::PriceDbNearest
        })
    }

    /// Whether rates come from ledger splits rather than quoted prices.
    #[must_use]
    pub const fn uses_splits(self) -> bool {
        matches!(
            self,
            Self::AverageCost | Self::WeightedAverage | Self::ActualTransactions
        )
    }
}

impl Default for PriceSource {
    fn default() -> Self {
        Self::PriceDbNearest
    }
}

impl fmt::Display for PriceSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for PriceSource {
    type Err = UnknownPriceSource;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|source| source.tag() == normalized)
            .ok_or_else(|| UnknownPriceSource(s.to_string()))
    }
}

/// Converts a foreign amount into a domestic commodity.
pub trait ExchangeFn {
    /// Convert `foreign` into `domestic`, optionally at `date`.
    ///
    /// Returns `None` only when the exchange cannot even be attempted
    /// (a time-dependent exchange called without a date). A missing rate
    /// gives a zero amount and a diagnostic.
    fn exchange(
        &self,
        foreign: &Amount,
        domestic: &Commodity,
        date: Option<NaiveDate>,
        diags: &mut Diagnostics,
    ) -> Option<Amount>;
}

impl<F> ExchangeFn for F
where
    F: Fn(&Amount, &Commodity, Option<NaiveDate>, &mut Diagnostics) -> Option<Amount>,
{
    fn exchange(
        &self,
        foreign: &Amount,
        domestic: &Commodity,
        date: Option<NaiveDate>,
        diags: &mut Diagnostics,
    ) -> Option<Amount> {
        self(foreign, domestic, date, diags)
    }
}

/// Which date a lookup uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum When {
    /// Fixed when the exchanger was built; `None` means "latest".
    Pinned(Option<NaiveDate>),
    /// Taken from each call.
    PerCall,
}

impl When {
    const fn resolve(self, call: Option<NaiveDate>) -> Option<Option<NaiveDate>> {
        match (self, call) {
            (Self::Pinned(date), _) => Some(date),
            (Self::PerCall, Some(date)) => Some(Some(date)),
            (Self::PerCall, None) => None,
        }
    }
}

enum RateSource<'a> {
    Alist(ExchangeAlist),
    Series {
        prices: PriceAlist,
        report_commodity: Commodity,
        when: When,
    },
    PriceDb {
        prices: &'a dyn PriceLookup,
        nearest: bool,
        when: When,
    },
}

impl fmt::Debug for RateSource<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Alist(alist) => f.debug_tuple("Alist").field(alist).finish(),
            Self::Series {
                prices,
                report_commodity,
                when,
            } => f
                .debug_struct("Series")
                .field("commodities", &prices.len())
                .field("report_commodity", report_commodity)
                .field("when", when)
                .finish(),
            Self::PriceDb { nearest, when, .. } => f
                .debug_struct("PriceDb")
                .field("nearest", nearest)
                .field("when", when)
                .finish(),
        }
    }
}

/// A concrete exchange function.
pub struct Exchanger<'a> {
    parity: &'a dyn FixedParity,
    source: RateSource<'a>,
}

impl fmt::Debug for Exchanger<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Exchanger")
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

impl<'a> Exchanger<'a> {
    /// Exchange through a static rate table.
    #[must_use]
    pub fn from_alist(alist: ExchangeAlist, parity: &'a dyn FixedParity) -> Self {
        Self {
            parity,
            source: RateSource::Alist(alist),
        }
    }

    /// Exchange through price series, at the date of each call.
    #[must_use]
    pub fn from_price_alist(
        prices: PriceAlist,
        report_commodity: &Commodity,
        parity: &'a dyn FixedParity,
    ) -> Self {
        Self {
            parity,
            source: RateSource::Series {
                prices,
                report_commodity: report_commodity.clone(),
                when: When::PerCall,
            },
        }
    }

    /// Exchange through price series at a fixed date, or at each series'
    /// last point when `date` is `None`.
    #[must_use]
    pub fn from_price_alist_at(
        prices: PriceAlist,
        report_commodity: &Commodity,
        date: Option<NaiveDate>,
        parity: &'a dyn FixedParity,
    ) -> Self {
        Self {
            parity,
            source: RateSource::Series {
                prices,
                report_commodity: report_commodity.clone(),
                when: When::Pinned(date),
            },
        }
    }

    /// Exchange through the latest quote in `prices`.
    #[must_use]
    pub fn latest(prices: &'a dyn PriceLookup, parity: &'a dyn FixedParity) -> Self {
        Self {
            parity,
            source: RateSource::PriceDb {
                prices,
                nearest: false,
                when: When::Pinned(None),
            },
        }
    }

    /// Exchange through the quote nearest to each call's date.
    #[must_use]
    pub fn nearest(prices: &'a dyn PriceLookup, parity: &'a dyn FixedParity) -> Self {
        Self {
            parity,
            source: RateSource::PriceDb {
                prices,
                nearest: true,
                when: When::PerCall,
            },
        }
    }

    /// Exchange through the quote nearest to a fixed date, or the latest
    /// quote when `date` is `None`.
    #[must_use]
    pub fn nearest_at(
        prices: &'a dyn PriceLookup,
        date: Option<NaiveDate>,
        parity: &'a dyn FixedParity,
    ) -> Self {
        Self {
            parity,
            source: RateSource::PriceDb {
                prices,
                nearest: true,
                when: When::Pinned(date),
            },
        }
    }

    /// The static table, if this exchanger uses one.
    #[must_use]
    pub const fn alist(&self) -> Option<&ExchangeAlist> {
        match &self.source {
            RateSource::Alist(alist) => Some(alist),
            _ => None,
        }
    }

    /// The price series, if this exchanger uses them.
    #[must_use]
    pub const fn price_alist(&self) -> Option<&PriceAlist> {
        match &self.source {
            RateSource::Series { prices, .. } => Some(prices),
            _ => None,
        }
    }

    /// Units of domestic per unit of foreign from the rate source.
    ///
    /// `Ok(None)` means there is no usable rate; `Err(())` means the lookup
    /// needs a date and none was given.
    fn source_rate(
        &self,
        foreign: &Commodity,
        domestic: &Commodity,
        date: Option<NaiveDate>,
    ) -> Result<Option<Decimal>, ()> {
        match &self.source {
            RateSource::Alist(alist) => Ok(cross_rate(
                alist.report_commodity(),
                foreign,
                domestic,
                |c| alist.rate(c),
            )),
            RateSource::Series {
                prices,
                report_commodity,
                when,
            } => {
                let at = when.resolve(date).ok_or(())?;
                Ok(cross_rate(report_commodity, foreign, domestic, |c| {
                    let points = &prices.get(c)?.points;
                    match at {
                        Some(day) => nearest(points, day),
                        None => points.last().map(|p| p.price),
                    }
                }))
            }
            RateSource::PriceDb {
                prices,
                nearest,
                when,
            } => {
                let at = when.resolve(date).ok_or(())?;
                Ok(match (nearest, at) {
                    (true, Some(day)) => prices.nearest_price(foreign, domestic, day),
                    _ => prices.latest_price(foreign, domestic),
                })
            }
        }
    }
}

/// Rate from `foreign` to `domestic` when both are priced in `report`.
fn cross_rate(
    report: &Commodity,
    foreign: &Commodity,
    domestic: &Commodity,
    rate_of: impl Fn(&Commodity) -> Option<Decimal>,
) -> Option<Decimal> {
    let in_report = |c: &Commodity| {
        if c.equiv(report) {
            Some(Decimal::ONE)
        } else {
            rate_of(c).filter(|r| !r.is_zero())
        }
    };
    let from = in_report(foreign)?;
    let to = in_report(domestic)?;
    if to == Decimal::ONE {
        Some(from)
    } else {
        rate_div(from, to)
    }
}

impl ExchangeFn for Exchanger<'_> {
    fn exchange(
        &self,
        foreign: &Amount,
        domestic: &Commodity,
        date: Option<NaiveDate>,
        diags: &mut Diagnostics,
    ) -> Option<Amount> {
        if let Some(converted) = self.parity.convert(foreign, domestic, date) {
            return Some(converted);
        }
        if foreign.commodity.equiv(domestic) {
            return Some(foreign.clone());
        }

        match self.source_rate(&foreign.commodity, domestic, date) {
            Err(()) => None,
            Ok(Some(rate)) => {
                let rate = round_sigfigs(rate, PRODUCT_SIGFIGS);
                if let Some(converted) = foreign.convert(rate, domestic.clone()) {
                    return Some(converted);
                }
                let mut diagnostic = Diagnostic::new(
                    DiagnosticKind::Overflow,
                    format!("{foreign} at {rate} overflows in {domestic}"),
                )
                .with_commodity(&foreign.commodity);
                if let Some(date) = date {
                    diagnostic = diagnostic.with_date(date);
                }
                diags.push(diagnostic);
                Some(Amount::zero(domestic.clone()))
            }
            Ok(None) => {
                let mut diagnostic = Diagnostic::new(
                    DiagnosticKind::NoPriceFound,
                    format!("no price for {} in {domestic}", foreign.commodity),
                )
                .with_commodity(&foreign.commodity);
                if let Some(date) = date {
                    diagnostic = diagnostic.with_date(date);
                }
                diags.push(diagnostic);
                Some(Amount::zero(domestic.clone()))
            }
        }
    }
}

/// Everything needed to build exchange functions over one ledger snapshot.
pub struct RateContext<'a> {
    feed: &'a dyn SplitFeed,
    prices: &'a dyn PriceLookup,
    parity: &'a dyn FixedParity,
    report_commodity: Commodity,
    end_date: Option<NaiveDate>,
    accounts: Option<Vec<InternedStr>>,
}

impl fmt::Debug for RateContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RateContext")
            .field("report_commodity", &self.report_commodity)
            .field("end_date", &self.end_date)
            .field("accounts", &self.accounts)
            .finish_non_exhaustive()
    }
}

impl<'a> RateContext<'a> {
    /// Context over every account, with the euro parity table.
    #[must_use]
    pub fn new(
        feed: &'a dyn SplitFeed,
        prices: &'a dyn PriceLookup,
        report_commodity: &Commodity,
    ) -> Self {
        Self {
            feed,
            prices,
            parity: &EuroParity,
            report_commodity: report_commodity.clone(),
            end_date: None,
            accounts: None,
        }
    }

    /// Use another fixed-parity table.
    #[must_use]
    pub fn with_parity(mut self, parity: &'a dyn FixedParity) -> Self {
        self.parity = parity;
        self
    }

    /// Only consider splits dated on or before `end_date`.
    #[must_use]
    pub const fn with_end_date(mut self, end_date: Option<NaiveDate>) -> Self {
        self.end_date = end_date;
        self
    }

    /// Only consider splits of these accounts.
    #[must_use]
    pub fn with_accounts(mut self, accounts: Vec<InternedStr>) -> Self {
        self.accounts = Some(accounts);
        self
    }

    /// The commodity every rate is expressed in.
    #[must_use]
    pub const fn report_commodity(&self) -> &Commodity {
        &self.report_commodity
    }

    /// The split snapshot all computations of one call share.
    #[must_use]
    pub fn splits(&self) -> Vec<Split> {
        self.feed.fetch_splits(self.accounts.as_deref(), self.end_date)
    }

    /// Weighted-average rate table.
    pub fn exchange_alist(&self, diags: &mut Diagnostics) -> ExchangeAlist {
        exchange_alist(&self.splits(), &self.report_commodity, self.parity, diags)
    }

    /// Average-cost rate table.
    pub fn exchange_cost_alist(&self, diags: &mut Diagnostics) -> ExchangeAlist {
        exchange_cost_alist(&self.splits(), &self.report_commodity, self.parity, diags)
    }

    /// Price series for `commodities`.
    pub fn price_alist(
        &self,
        commodities: &[Commodity],
        kind: SeriesKind,
        progress: &mut dyn ProgressSink,
        diags: &mut Diagnostics,
    ) -> PriceAlist {
        commodity_list_prices(
            &self.splits(),
            commodities,
            &self.report_commodity,
            kind,
            self.parity,
            progress,
            ProgressWindow::default(),
            diags,
        )
    }

    /// Point-in-time exchange function, valued at the context end date.
    pub fn exchange_fn(&self, source: PriceSource, diags: &mut Diagnostics) -> Exchanger<'a> {
        let exchanger = match source {
            PriceSource::AverageCost => {
                Exchanger::from_alist(self.exchange_cost_alist(diags), self.parity)
            }
            PriceSource::WeightedAverage => {
                Exchanger::from_alist(self.exchange_alist(diags), self.parity)
            }
            PriceSource::ActualTransactions => {
                let splits = self.splits();
                let commodities = commodities_of(&splits);
                let prices = commodity_list_prices(
                    &splits,
                    &commodities,
                    &self.report_commodity,
                    SeriesKind::Instantaneous,
                    self.parity,
                    &mut NoProgress,
                    ProgressWindow::default(),
                    diags,
                );
                Exchanger::from_price_alist_at(
                    prices,
                    &self.report_commodity,
                    self.end_date,
                    self.parity,
                )
            }
            PriceSource::PriceDbLatest => Exchanger::latest(self.prices, self.parity),
            PriceSource::PriceDbNearest => {
                Exchanger::nearest_at(self.prices, self.end_date, self.parity)
            }
        };
        tracing::debug!(%source, report = %self.report_commodity, "built exchange function");
        exchanger
    }

    /// Time-dependent exchange function; each call supplies its date.
    pub fn exchange_time_fn(
        &self,
        source: PriceSource,
        commodities: &[Commodity],
        progress: &mut dyn ProgressSink,
        diags: &mut Diagnostics,
    ) -> Exchanger<'a> {
        let kind = match source {
            PriceSource::AverageCost | PriceSource::WeightedAverage => {
                Some(SeriesKind::WeightedAverage)
            }
            PriceSource::ActualTransactions => Some(SeriesKind::Instantaneous),
            PriceSource::PriceDbLatest | PriceSource::PriceDbNearest => None,
        };
        let exchanger = match (kind, source) {
            (Some(kind), _) => {
                let prices = self.price_alist(commodities, kind, progress, diags);
                Exchanger::from_price_alist(prices, &self.report_commodity, self.parity)
            }
            (None, PriceSource::PriceDbLatest) => Exchanger::latest(self.prices, self.parity),
            (None, _) => Exchanger::nearest(self.prices, self.parity),
        };
        tracing::debug!(%source, report = %self.report_commodity, "built time exchange function");
        exchanger
    }
}
