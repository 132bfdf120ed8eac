//! Static exchange tables.
//!
//! An [`ExchangeAlist`] maps each commodity observed in the ledger to a
//! single rate: report-commodity units per one unit of that commodity.

use fxledger_core::{Commodity, CommodityKey, Split};
use rust_decimal::Decimal;
use std::collections::BTreeMap;

use crate::aggregate::{aggregate, AggregationMode};
use crate::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
use crate::parity::FixedParity;
use crate::resolve::{resolve, ReportList};
use crate::round::rate_div;

/// A resolved rate for one commodity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeRate {
    /// The commodity priced.
    pub commodity: Commodity,
    /// Report-commodity units per unit; `None` when no rate could be
    /// computed.
    pub rate: Option<Decimal>,
}

/// Commodity → rate in the report commodity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeAlist {
    report_commodity: Commodity,
    rates: BTreeMap<CommodityKey, ExchangeRate>,
}

impl ExchangeAlist {
    /// Create an empty table.
    #[must_use]
    pub fn new(report_commodity: &Commodity) -> Self {
        Self {
            report_commodity: report_commodity.clone(),
            rates: BTreeMap::new(),
        }
    }

    /// Set the rate for `commodity`.
    pub fn insert(&mut self, commodity: &Commodity, rate: Option<Decimal>) {
        self.rates.insert(
            commodity.key().clone(),
            ExchangeRate {
                commodity: commodity.clone(),
                rate,
            },
        );
    }

    /// The commodity every rate is expressed in.
    #[must_use]
    pub const fn report_commodity(&self) -> &Commodity {
        &self.report_commodity
    }

    /// The entry for `commodity`, present even when its rate is absent.
    #[must_use]
    pub fn get(&self, commodity: &Commodity) -> Option<&ExchangeRate> {
        self.rates.get(commodity.key())
    }

    /// The rate for `commodity`, if known and computable.
    #[must_use]
    pub fn rate(&self, commodity: &Commodity) -> Option<Decimal> {
        self.get(commodity).and_then(|r| r.rate)
    }

    /// Entries ordered by commodity key.
    pub fn iter(&self) -> impl Iterator<Item = &ExchangeRate> {
        self.rates.values()
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rates.len()
    }

    /// Whether the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    /// Turn resolved totals into rates.
    ///
    /// With [`AggregationMode::Totals`] a zero amount yields a zero rate; with
    /// [`AggregationMode::Cost`] it yields an absent rate. Both record a
    /// [`DiagnosticKind::DivisionByZero`].
    pub fn from_report_list(list: &ReportList, mode: AggregationMode, diags: &mut Diagnostics) -> Self {
        let mut alist = Self::new(list.report_commodity());
        for entry in list.iter() {
            let rate = rate_div(entry.totals.value.total(), entry.totals.amount.total()).map(|r| r.abs());
            if rate.is_none() {
                diags.push(
                    Diagnostic::new(
                        DiagnosticKind::DivisionByZero,
                        format!("zero total amount for {}", entry.commodity),
                    )
                    .with_commodity(&entry.commodity),
                );
            }
            let rate = match mode {
                AggregationMode::Totals => Some(rate.unwrap_or(Decimal::ZERO)),
                AggregationMode::Cost => rate,
            };
            alist.insert(&entry.commodity, rate);
        }
        alist
    }
}

/// Rates from absolute exchange totals up to the snapshot's end.
pub fn exchange_alist(
    splits: &[Split],
    report_commodity: &Commodity,
    parity: &dyn FixedParity,
    diags: &mut Diagnostics,
) -> ExchangeAlist {
    let sumlist = aggregate(splits, report_commodity, AggregationMode::Totals, diags);
    let list = resolve(&sumlist, parity, diags);
    ExchangeAlist::from_report_list(&list, AggregationMode::Totals, diags)
}

/// Rates from signed (net cost) totals, excluding trading accounts.
pub fn exchange_cost_alist(
    splits: &[Split],
    report_commodity: &Commodity,
    parity: &dyn FixedParity,
    diags: &mut Diagnostics,
) -> ExchangeAlist {
    let sumlist = aggregate(splits, report_commodity, AggregationMode::Cost, diags);
    let list = resolve(&sumlist, parity, diags);
    ExchangeAlist::from_report_list(&list, AggregationMode::Cost, diags)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parity::NoParity;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
    }

    fn usd() -> Commodity {
        Commodity::currency("USD")
    }

    fn ibm() -> Commodity {
        Commodity::new("NYSE", "IBM")
    }

    fn trade(d: u32, shares: Decimal, cost: Decimal) -> Split {
        Split::new(date(d), "Assets:Broker:IBM", ibm(), usd(), shares, cost)
    }

    #[test]
    fn test_totals_rate() {
        let splits = vec![trade(1, dec!(10), dec!(1500)), trade(2, dec!(-5), dec!(-800))];
        let mut diags = Diagnostics::new();
        let alist = exchange_alist(&splits, &usd(), &NoParity, &mut diags);
        // 2300 / 15
        assert_eq!(alist.rate(&ibm()), Some(dec!(153.33333)));
        assert!(alist.get(&usd()).is_none());
        assert!(diags.is_empty());
    }

    #[test]
    fn test_cost_rate_is_net_average() {
        let splits = vec![trade(1, dec!(10), dec!(1500)), trade(2, dec!(-5), dec!(-800))];
        let mut diags = Diagnostics::new();
        let alist = exchange_cost_alist(&splits, &usd(), &NoParity, &mut diags);
        // (-1500 + 800) / (-10 + 5)
        assert_eq!(alist.rate(&ibm()), Some(dec!(140)));
    }

    #[test]
    fn test_cost_rate_absent_when_position_closed() {
        let splits = vec![trade(1, dec!(10), dec!(1500)), trade(2, dec!(-10), dec!(-1700))];
        let mut diags = Diagnostics::new();
        let alist = exchange_cost_alist(&splits, &usd(), &NoParity, &mut diags);
        let entry = alist.get(&ibm()).unwrap();
        assert_eq!(entry.rate, None);
        assert!(diags.contains(DiagnosticKind::DivisionByZero));
    }

    #[test]
    fn test_cost_rate_absent_through_closed_bridge() {
        let eur = Commodity::currency("EUR");
        let fund = Commodity::new("FUND", "X");
        let splits = vec![
            Split::new(date(1), "Assets:Bank:EUR", eur.clone(), usd(), dec!(100), dec!(110)),
            Split::new(date(2), "Assets:Bank:EUR", eur.clone(), usd(), dec!(-100), dec!(-120)),
            Split::new(date(3), "Assets:Broker:X", fund.clone(), eur.clone(), dec!(3), dec!(300)),
        ];

        let mut diags = Diagnostics::new();
        let cost = exchange_cost_alist(&splits, &usd(), &NoParity, &mut diags);
        assert_eq!(cost.get(&eur).map(|e| e.rate), Some(None));
        assert_eq!(cost.get(&fund).map(|e| e.rate), Some(None));
        assert!(diags.contains(DiagnosticKind::DivisionByZero));

        let mut diags = Diagnostics::new();
        let totals = exchange_alist(&splits, &usd(), &NoParity, &mut diags);
        // 230 USD for 200 EUR, so 300 EUR is 345 USD for 3 units
        assert_eq!(totals.rate(&eur), Some(dec!(1.15)));
        assert_eq!(totals.rate(&fund), Some(dec!(115)));
        assert!(diags.is_empty());
    }

    #[test]
    fn test_totals_rate_is_absolute() {
        let odd = Split::new(date(1), "Assets:Bank", usd(), ibm(), dec!(-300), dec!(-2));
        let mut diags = Diagnostics::new();
        let alist = exchange_alist(&[odd], &usd(), &NoParity, &mut diags);
        assert_eq!(alist.rate(&ibm()), Some(dec!(150)));
    }
}
