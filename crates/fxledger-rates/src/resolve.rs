//! Transitive rate resolution.
//!
//! Turns a [`SumList`] keyed by arbitrary commodity pairs into a
//! [`ReportList`] where every entry is expressed against the report
//! commodity: `value` in the report commodity, `amount` in the entry's own.
//!
//! Resolution is a single pass over the sum list, in discovery order. A pair
//! whose commodities are both unknown when it is visited stays unresolved,
//! even if a later pair would have supplied the bridge. A chain more than one
//! hop away from the report commodity resolves only when each hop's bridge
//! was visited first, so the outcome depends on the order splits were
//! aggregated in.

use fxledger_core::{Amount, Commodity, CommodityKey};
use rust_decimal::Decimal;
use std::collections::BTreeMap;

use crate::aggregate::{BaseEntry, PairEntry, SumList};
use crate::collector::{Overflow, PairTotals};
use crate::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
use crate::parity::FixedParity;
use crate::round::{round_sigfigs, PRODUCT_SIGFIGS, RATE_SIGFIGS};

/// Units of a parity member converted when consulting the fixed-parity table.
const PARITY_SAMPLE_UNITS: Decimal = Decimal::ONE_THOUSAND;

/// Totals of one commodity against the report commodity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportEntry {
    /// The commodity.
    pub commodity: Commodity,
    /// `value` in the report commodity, `amount` in `commodity`.
    pub totals: PairTotals,
}

/// Exchange totals resolved relative to the report commodity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportList {
    report_commodity: Commodity,
    entries: BTreeMap<CommodityKey, ReportEntry>,
}

impl ReportList {
    /// Create an empty list for `report_commodity`.
    #[must_use]
    pub fn new(report_commodity: &Commodity) -> Self {
        Self {
            report_commodity: report_commodity.clone(),
            entries: BTreeMap::new(),
        }
    }

    /// The report commodity.
    #[must_use]
    pub const fn report_commodity(&self) -> &Commodity {
        &self.report_commodity
    }

    /// Totals for `commodity`, if resolved.
    #[must_use]
    pub fn get(&self, commodity: &Commodity) -> Option<&PairTotals> {
        self.entries.get(commodity.key()).map(|e| &e.totals)
    }

    /// Whether `commodity` has been resolved.
    #[must_use]
    pub fn contains(&self, commodity: &Commodity) -> bool {
        self.entries.contains_key(commodity.key())
    }

    /// Resolved entries ordered by commodity key.
    pub fn iter(&self) -> impl Iterator<Item = &ReportEntry> {
        self.entries.values()
    }

    /// Number of resolved commodities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing was resolved.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Add totals for `commodity`, merging with any existing entry.
    pub fn merge(&mut self, commodity: &Commodity, totals: PairTotals) -> Result<(), Overflow> {
        match self.entries.get_mut(commodity.key()) {
            Some(entry) => entry.totals.merge(&totals),
            None => {
                self.entries.insert(
                    commodity.key().clone(),
                    ReportEntry {
                        commodity: commodity.clone(),
                        totals,
                    },
                );
                Ok(())
            }
        }
    }

    fn merge_or_report(&mut self, commodity: &Commodity, totals: PairTotals, diags: &mut Diagnostics) {
        if self.merge(commodity, totals).is_err() {
            diags.push(
                Diagnostic::new(
                    DiagnosticKind::Overflow,
                    format!("resolved totals for {commodity} overflowed"),
                )
                .with_commodity(commodity),
            );
        }
    }
}

/// Synthetic bridge for a fixed-parity member: a sample quantity and its
/// converted value in the report commodity.
fn parity_bridge(
    parity: &dyn FixedParity,
    commodity: &Commodity,
    report_commodity: &Commodity,
) -> Option<PairTotals> {
    let sample = Amount::new(PARITY_SAMPLE_UNITS, commodity.clone());
    parity
        .convert(&sample, report_commodity, None)
        .map(|converted| PairTotals::new(converted.number, PARITY_SAMPLE_UNITS))
}

/// Express `quantity` (counted in the bridge's commodity) in the report
/// commodity through the bridge's totals.
///
/// `None` when the bridge has no amount or the product overflows.
fn through_bridge(
    quantity: Decimal,
    bridge: &PairTotals,
    commodity: &Commodity,
    diags: &mut Diagnostics,
) -> Option<Decimal> {
    let bridge_amount = bridge.amount.total();
    if bridge_amount.is_zero() {
        diags.push(
            Diagnostic::new(
                DiagnosticKind::DivisionByZero,
                format!("zero bridge amount while resolving {commodity}"),
            )
            .with_commodity(commodity),
        );
        return None;
    }
    let Some(product) = quantity.checked_mul(bridge.value.total()) else {
        diags.push(
            Diagnostic::new(
                DiagnosticKind::Overflow,
                format!("bridge product overflowed while resolving {commodity}"),
            )
            .with_commodity(commodity),
        );
        return None;
    };
    round_sigfigs(product, PRODUCT_SIGFIGS)
        .checked_div(bridge_amount)
        .map(|q| round_sigfigs(q, RATE_SIGFIGS))
}

/// Totals for a commodity reached through a bridge. An unusable bridge
/// leaves both sides zero, so no rate can be computed from them.
fn bridged_totals(value: Option<Decimal>, amount: Decimal) -> PairTotals {
    value.map_or_else(PairTotals::default, |value| PairTotals::new(value, amount))
}

fn resolve_pair(
    list: &mut ReportList,
    base: &BaseEntry,
    pair: &PairEntry,
    parity: &dyn FixedParity,
    diags: &mut Diagnostics,
) {
    let report = list.report_commodity.clone();

    if pair.commodity.equiv(&report) {
        list.merge_or_report(&base.commodity, pair.totals.swapped(), diags);
        return;
    }

    let bridge_base = list
        .get(&base.commodity)
        .copied()
        .or_else(|| parity_bridge(parity, &base.commodity, &report));
    let bridge_pair = list.get(&pair.commodity).copied();

    match (bridge_base, bridge_pair) {
        (None, None) => diags.push(
            Diagnostic::new(
                DiagnosticKind::UnresolvableRate,
                format!(
                    "cannot calculate rate between {} and {}: neither is related to {report}",
                    base.commodity, pair.commodity
                ),
            )
            .with_commodity(&pair.commodity),
        ),
        (Some(_), Some(_)) => diags.push(
            Diagnostic::new(
                DiagnosticKind::AmbiguousRate,
                format!(
                    "exchange rate ambiguity between {} and {}: both already resolved",
                    base.commodity, pair.commodity
                ),
            )
            .with_commodity(&pair.commodity),
        ),
        (Some(bridge), None) => {
            // Base known: value side is in the base commodity.
            let value = through_bridge(pair.totals.value.total(), &bridge, &pair.commodity, diags);
            let totals = bridged_totals(value, pair.totals.amount.total());
            list.merge_or_report(&pair.commodity, totals, diags);
        }
        (None, Some(bridge)) => {
            // Pair known: amount side is in the pair commodity.
            let value = through_bridge(pair.totals.amount.total(), &bridge, &base.commodity, diags);
            let totals = bridged_totals(value, pair.totals.value.total());
            list.merge_or_report(&base.commodity, totals, diags);
        }
    }
}

/// Resolve a sum list against its report commodity.
///
/// Direct pairs with the report commodity are taken as-is. Every other pair
/// is bridged through whichever of its two commodities is already resolved
/// (or, for the base commodity, convertible through `parity`). Unresolvable
/// and ambiguous pairs are dropped with a diagnostic.
pub fn resolve(sumlist: &SumList, parity: &dyn FixedParity, diags: &mut Diagnostics) -> ReportList {
    let report = sumlist.report_commodity();
    let mut list = ReportList::new(report);

    for pair in &sumlist.report_entry().pairs {
        list.merge_or_report(&pair.commodity, pair.totals, diags);
    }

    for base in sumlist.entries().iter().filter(|e| !e.commodity.equiv(report)) {
        for pair in &base.pairs {
            resolve_pair(&mut list, base, pair, parity, diags);
        }
    }

    tracing::debug!(
        report = %report,
        resolved = list.len(),
        "resolved exchange totals"
    );
    list
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parity::{EuroParity, NoParity};
    use rust_decimal_macros::dec;

    fn cur(code: &str) -> Commodity {
        Commodity::currency(code)
    }

    fn rate(list: &ReportList, c: &Commodity) -> Decimal {
        let t = list.get(c).unwrap();
        t.value.total() / t.amount.total()
    }

    #[test]
    fn test_direct_pairs_taken_as_is() {
        let usd = cur("USD");
        let mut sumlist = SumList::new(&usd);
        sumlist.record(&usd, &cur("EUR"), dec!(110), dec!(100)).unwrap();
        sumlist.record(&usd, &cur("GBP"), dec!(127), dec!(100)).unwrap();

        let mut diags = Diagnostics::new();
        let list = resolve(&sumlist, &NoParity, &mut diags);
        assert!(diags.is_empty());
        assert_eq!(list.len(), 2);
        assert_eq!(rate(&list, &cur("EUR")), dec!(1.1));
        assert_eq!(rate(&list, &cur("GBP")), dec!(1.27));
    }

    #[test]
    fn test_one_hop_through_pair_commodity() {
        // USD<->EUR direct, then a GBP base paired with EUR
        let usd = cur("USD");
        let mut sumlist = SumList::new(&usd);
        sumlist.record(&usd, &cur("EUR"), dec!(110), dec!(100)).unwrap();
        // 85 GBP for 100 EUR
        sumlist.record(&cur("GBP"), &cur("EUR"), dec!(85), dec!(100)).unwrap();

        let mut diags = Diagnostics::new();
        let list = resolve(&sumlist, &NoParity, &mut diags);
        assert!(diags.is_empty());
        let gbp = list.get(&cur("GBP")).unwrap();
        // 100 EUR * 110 / 100 = 110 USD for 85 GBP
        assert_eq!(gbp.value.total(), dec!(110));
        assert_eq!(gbp.amount.total(), dec!(85));
    }

    #[test]
    fn test_one_hop_through_base_commodity() {
        let usd = cur("USD");
        let mut sumlist = SumList::new(&usd);
        sumlist.record(&usd, &cur("EUR"), dec!(110), dec!(100)).unwrap();
        // EUR base paired with 3 shares of a fund bought for 300 EUR
        let fund = Commodity::new("FUND", "WORLD");
        sumlist.record(&cur("EUR"), &fund, dec!(300), dec!(3)).unwrap();

        let mut diags = Diagnostics::new();
        let list = resolve(&sumlist, &NoParity, &mut diags);
        let t = list.get(&fund).unwrap();
        assert_eq!(t.value.total(), dec!(330));
        assert_eq!(t.amount.total(), dec!(3));
        assert!(diags.is_empty());
    }

    #[test]
    fn test_report_commodity_as_inner_pair_is_swapped() {
        let usd = cur("USD");
        let mut sumlist = SumList::new(&usd);
        sumlist.record(&cur("CHF"), &usd, dec!(90), dec!(100)).unwrap();

        let mut diags = Diagnostics::new();
        let list = resolve(&sumlist, &NoParity, &mut diags);
        let chf = list.get(&cur("CHF")).unwrap();
        assert_eq!(chf.value.total(), dec!(100));
        assert_eq!(chf.amount.total(), dec!(90));
        assert!(diags.is_empty());
    }

    #[test]
    fn test_unresolvable_pair_dropped() {
        let usd = cur("USD");
        let mut sumlist = SumList::new(&usd);
        sumlist.record(&cur("JPY"), &cur("KRW"), dec!(1000), dec!(9000)).unwrap();

        let mut diags = Diagnostics::new();
        let list = resolve(&sumlist, &NoParity, &mut diags);
        assert!(list.is_empty());
        assert_eq!(diags.len(), 1);
        assert_eq!(diags.entries()[0].kind, DiagnosticKind::UnresolvableRate);
    }

    #[test]
    fn test_ambiguous_pair_dropped() {
        let usd = cur("USD");
        let mut sumlist = SumList::new(&usd);
        sumlist.record(&usd, &cur("EUR"), dec!(110), dec!(100)).unwrap();
        sumlist.record(&usd, &cur("GBP"), dec!(127), dec!(100)).unwrap();
        sumlist.record(&cur("EUR"), &cur("GBP"), dec!(117), dec!(100)).unwrap();

        let mut diags = Diagnostics::new();
        let list = resolve(&sumlist, &NoParity, &mut diags);
        assert_eq!(list.len(), 2);
        assert!(diags.contains(DiagnosticKind::AmbiguousRate));
        assert_eq!(rate(&list, &cur("GBP")), dec!(1.27));
    }

    #[test]
    fn test_two_hops_not_resolved() {
        let usd = cur("USD");
        let mut sumlist = SumList::new(&usd);
        // SEK only meets NOK, which only meets EUR, which meets USD.
        sumlist.record(&cur("SEK"), &cur("NOK"), dec!(100), dec!(98)).unwrap();
        sumlist.record(&usd, &cur("EUR"), dec!(110), dec!(100)).unwrap();
        sumlist.record(&cur("NOK"), &cur("EUR"), dec!(1150), dec!(100)).unwrap();

        let mut diags = Diagnostics::new();
        let list = resolve(&sumlist, &NoParity, &mut diags);
        assert!(list.contains(&cur("NOK")));
        assert!(!list.contains(&cur("SEK")));
        assert_eq!(diags.of_kind(DiagnosticKind::UnresolvableRate).count(), 1);
    }

    #[test]
    fn test_two_hops_resolve_when_bridge_comes_first() {
        let usd = cur("USD");
        let mut sumlist = SumList::new(&usd);
        // Same chain as above, with the NOK base discovered before SEK.
        sumlist.record(&usd, &cur("EUR"), dec!(110), dec!(100)).unwrap();
        sumlist.record(&cur("NOK"), &cur("EUR"), dec!(1150), dec!(100)).unwrap();
        sumlist.record(&cur("SEK"), &cur("NOK"), dec!(100), dec!(98)).unwrap();

        let mut diags = Diagnostics::new();
        let list = resolve(&sumlist, &NoParity, &mut diags);
        assert!(diags.is_empty());
        // 98 NOK at 110/1150 USD per NOK
        let sek = list.get(&cur("SEK")).unwrap();
        assert_eq!(sek.value.total(), dec!(9.3739130));
        assert_eq!(sek.amount.total(), dec!(100));
    }

    #[test]
    fn test_zero_bridge_leaves_empty_totals() {
        let usd = cur("USD");
        let mut sumlist = SumList::new(&usd);
        // EUR position closed out: net amount zero
        sumlist.record(&usd, &cur("EUR"), dec!(10), dec!(0)).unwrap();
        sumlist.record(&cur("EUR"), &cur("GBP"), dec!(120), dec!(100)).unwrap();

        let mut diags = Diagnostics::new();
        let list = resolve(&sumlist, &NoParity, &mut diags);
        let gbp = list.get(&cur("GBP")).unwrap();
        assert_eq!(*gbp, PairTotals::default());
        assert!(diags.contains(DiagnosticKind::DivisionByZero));
    }

    #[test]
    fn test_overflowing_bridge_product() {
        let usd = cur("USD");
        let mut sumlist = SumList::new(&usd);
        sumlist.record(&usd, &cur("EUR"), Decimal::MAX, dec!(1)).unwrap();
        sumlist.record(&cur("EUR"), &cur("GBP"), dec!(10), dec!(8)).unwrap();

        let mut diags = Diagnostics::new();
        let list = resolve(&sumlist, &NoParity, &mut diags);
        assert_eq!(*list.get(&cur("GBP")).unwrap(), PairTotals::default());
        assert!(diags.contains(DiagnosticKind::Overflow));
    }

    #[test]
    fn test_parity_member_bridges_base() {
        let eur = cur("EUR");
        let mut sumlist = SumList::new(&eur);
        // DEM base paired with a stock, never traded against EUR directly
        let stock = Commodity::new("XETRA", "SAP");
        sumlist.record(&cur("DEM"), &stock, dec!(195.583), dec!(1)).unwrap();

        let mut diags = Diagnostics::new();
        let list = resolve(&sumlist, &EuroParity, &mut diags);
        let t = list.get(&stock).unwrap();
        // 1000 DEM sample -> 511.292 EUR, so 195.583 DEM is 100.00002 EUR
        assert_eq!(t.value.total(), dec!(100.00002));
        assert!(diags.is_empty());

        let mut diags = Diagnostics::new();
        let list = resolve(&sumlist, &NoParity, &mut diags);
        assert!(!list.contains(&stock));
        assert!(diags.contains(DiagnosticKind::UnresolvableRate));
    }

    #[test]
    fn test_derived_value_is_rounded() {
        let usd = cur("USD");
        let mut sumlist = SumList::new(&usd);
        sumlist.record(&usd, &cur("EUR"), dec!(1), dec!(3)).unwrap();
        sumlist.record(&cur("EUR"), &cur("AUD"), dec!(1), dec!(7)).unwrap();

        let mut diags = Diagnostics::new();
        let list = resolve(&sumlist, &NoParity, &mut diags);
        let aud = list.get(&cur("AUD")).unwrap();
        assert_eq!(aud.value.total(), dec!(0.33333333));
        assert_eq!(aud.amount.total(), dec!(7));
    }
}
