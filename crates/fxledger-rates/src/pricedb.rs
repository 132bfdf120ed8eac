//! Price database for currency conversions.
//!
//! The rate core consumes quoted prices through [`PriceLookup`]. The
//! in-memory [`PriceDatabase`] stores historical quotes and answers both
//! latest-price and nearest-in-time queries, trying the inverted quote when
//! no direct one exists.

use chrono::NaiveDate;
use fxledger_core::{Commodity, CommodityKey};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Quoted-price source.
pub trait PriceLookup {
    /// Most recent price of one unit of `foreign` in `domestic`.
    fn latest_price(&self, foreign: &Commodity, domestic: &Commodity) -> Option<Decimal>;

    /// Price of one unit of `foreign` in `domestic` quoted closest to `date`.
    fn nearest_price(
        &self,
        foreign: &Commodity,
        domestic: &Commodity,
        date: NaiveDate,
    ) -> Option<Decimal>;
}

/// A quote as stored in snapshot files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceRecord {
    /// Date of the quote.
    pub date: NaiveDate,
    /// The commodity priced.
    pub commodity: Commodity,
    /// The commodity the price is quoted in.
    pub currency: Commodity,
    /// Units of `currency` per unit of `commodity`.
    pub price: Decimal,
}

/// A price entry.
#[derive(Debug, Clone)]
pub struct PriceEntry {
    /// Date of the price.
    pub date: NaiveDate,
    /// Price amount.
    pub price: Decimal,
    /// Quote commodity.
    pub currency: Commodity,
}

/// Database of quoted prices.
///
/// Stores prices as a map from base commodity to entries sorted by date.
#[derive(Debug, Default)]
pub struct PriceDatabase {
    prices: HashMap<CommodityKey, Vec<PriceEntry>>,
}

impl PriceDatabase {
    /// Create a new empty price database.
    pub fn new() -> Self {
        Self {
            prices: HashMap::new(),
        }
    }

    /// Build a price database from quote records.
    pub fn from_records(records: &[PriceRecord]) -> Self {
        let mut db = Self::new();
        for record in records {
            db.add_price(record.date, &record.commodity, &record.currency, record.price);
        }
        db
    }

    /// Add a quote, keeping the per-commodity list sorted by date.
    pub fn add_price(
        &mut self,
        date: NaiveDate,
        commodity: &Commodity,
        currency: &Commodity,
        price: Decimal,
    ) {
        let entries = self.prices.entry(commodity.key().clone()).or_default();
        let at = entries.partition_point(|e| e.date <= date);
        entries.insert(
            at,
            PriceEntry {
                date,
                price,
                currency: currency.clone(),
            },
        );
    }

    fn quotes<'a>(
        &'a self,
        base: &Commodity,
        quote: &'a Commodity,
    ) -> impl DoubleEndedIterator<Item = &'a PriceEntry> + 'a {
        self.prices
            .get(base.key())
            .into_iter()
            .flatten()
            .filter(move |e| e.currency.equiv(quote))
    }

    fn direct_latest(&self, base: &Commodity, quote: &Commodity) -> Option<Decimal> {
        self.quotes(base, quote).next_back().map(|e| e.price)
    }

    fn direct_nearest(&self, base: &Commodity, quote: &Commodity, date: NaiveDate) -> Option<Decimal> {
        self.quotes(base, quote)
            .min_by_key(|e| ((e.date - date).num_days().abs(), e.date))
            .map(|e| e.price)
    }

    /// Convert a quote of the inverted pair.
    fn invert(price: Decimal) -> Option<Decimal> {
        if price.is_zero() {
            None
        } else {
            Decimal::ONE.checked_div(price)
        }
    }

    /// Check if a commodity has any prices defined.
    pub fn has_prices(&self, commodity: &Commodity) -> bool {
        self.prices.contains_key(commodity.key())
    }

    /// Get the number of price entries.
    pub fn len(&self) -> usize {
        self.prices.values().map(Vec::len).sum()
    }

    /// Check if the database is empty.
    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }
}

impl PriceLookup for PriceDatabase {
    fn latest_price(&self, foreign: &Commodity, domestic: &Commodity) -> Option<Decimal> {
        if foreign.equiv(domestic) {
            return Some(Decimal::ONE);
        }
        self.direct_latest(foreign, domestic)
            .or_else(|| self.direct_latest(domestic, foreign).and_then(Self::invert))
    }

    fn nearest_price(
        &self,
        foreign: &Commodity,
        domestic: &Commodity,
        date: NaiveDate,
    ) -> Option<Decimal> {
        if foreign.equiv(domestic) {
            return Some(Decimal::ONE);
        }
        self.direct_nearest(foreign, domestic, date)
            .or_else(|| self.direct_nearest(domestic, foreign, date).and_then(Self::invert))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn usd() -> Commodity {
        Commodity::currency("USD")
    }

    fn aapl() -> Commodity {
        Commodity::new("NASDAQ", "AAPL")
    }

    fn db() -> PriceDatabase {
        let mut db = PriceDatabase::new();
        db.add_price(date(2024, 6, 1), &aapl(), &usd(), dec!(180.00));
        db.add_price(date(2024, 1, 1), &aapl(), &usd(), dec!(150.00));
        db
    }

    #[test]
    fn test_latest_price() {
        assert_eq!(db().latest_price(&aapl(), &usd()), Some(dec!(180.00)));
        assert_eq!(db().len(), 2);
        assert!(db().has_prices(&aapl()));
    }

    #[test]
    fn test_nearest_price_both_directions() {
        let db = db();
        // Before the first quote
        assert_eq!(db.nearest_price(&aapl(), &usd(), date(2023, 12, 1)), Some(dec!(150.00)));
        // Closer to the later quote
        assert_eq!(db.nearest_price(&aapl(), &usd(), date(2024, 5, 1)), Some(dec!(180.00)));
        // Closer to the earlier quote
        assert_eq!(db.nearest_price(&aapl(), &usd(), date(2024, 2, 1)), Some(dec!(150.00)));
    }

    #[test]
    fn test_nearest_tie_prefers_earlier() {
        let mut db = PriceDatabase::new();
        db.add_price(date(2024, 1, 1), &aapl(), &usd(), dec!(1));
        db.add_price(date(2024, 1, 3), &aapl(), &usd(), dec!(3));
        assert_eq!(db.nearest_price(&aapl(), &usd(), date(2024, 1, 2)), Some(dec!(1)));
    }

    #[test]
    fn test_inverse_price() {
        let eur = Commodity::currency("EUR");
        let mut db = PriceDatabase::new();
        db.add_price(date(2024, 1, 1), &eur, &usd(), dec!(1.25));

        assert_eq!(db.latest_price(&usd(), &eur), Some(dec!(0.8)));
        assert_eq!(db.nearest_price(&usd(), &eur, date(2024, 3, 1)), Some(dec!(0.8)));
    }

    #[test]
    fn test_missing_and_identity() {
        let db = db();
        let gbp = Commodity::currency("GBP");
        assert_eq!(db.latest_price(&aapl(), &gbp), None);
        assert_eq!(db.nearest_price(&gbp, &gbp, date(2024, 1, 1)), Some(dec!(1)));
        assert!(PriceDatabase::new().is_empty());
    }

    #[test]
    fn test_from_records() {
        let json = r#"[
            {"date": "2024-01-01", "commodity": "NASDAQ:AAPL", "currency": "USD", "price": "150"},
            {"date": "2024-01-01", "commodity": "EUR", "currency": "USD", "price": "1.10"}
        ]"#;
        let records: Vec<PriceRecord> = serde_json::from_str(json).unwrap();
        let db = PriceDatabase::from_records(&records);
        assert_eq!(db.len(), 2);
        assert!(db.has_prices(&Commodity::currency("EUR")));
    }
}
