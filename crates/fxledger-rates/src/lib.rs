//! Exchange rates and price series built from ledger splits.
//!
//! Most transactions never relate a commodity directly to the commodity a
//! report is written in. This crate infers those rates from what the ledger
//! does record:
//!
//! - [`aggregate`] - Sum cross-commodity exchanges per commodity pair
//! - [`resolve`] - Express the pair totals relative to the report commodity
//! - [`alist`] - Turn resolved totals into a static rate table
//! - [`series`] - Weighted-average and per-exchange price series over time
//! - [`lookup`] - Nearest-in-time price lookup
//! - [`exchange`] - Exchange functions selected by [`PriceSource`]
//! - [`reduce`] - Collapse multi-commodity balances into one commodity
//!
//! Recoverable problems never abort a computation. They are recorded in a
//! [`Diagnostics`] sink next to a degraded result.
//!
//! # Example
//!
//! ```
//! use chrono::NaiveDate;
//! use fxledger_core::{Amount, Commodity, Split};
//! use fxledger_rates::{ExchangeFn, Diagnostics, Ledger, PriceDatabase, PriceSource, RateContext};
//! use rust_decimal_macros::dec;
//!
//! let usd = Commodity::currency("USD");
//! let ibm = Commodity::new("NYSE", "IBM");
//! let day = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
//!
//! let ledger = Ledger::from_splits(vec![
//!     Split::new(day, "Assets:Broker", ibm.clone(), usd.clone(), dec!(10), dec!(1250)),
//! ]);
//! let prices = PriceDatabase::new();
//! let ctx = RateContext::new(&ledger, &prices, &usd);
//!
//! let mut diags = Diagnostics::new();
//! let fx = ctx.exchange_fn(PriceSource::WeightedAverage, &mut diags);
//! let value = fx.exchange(&Amount::new(dec!(4), ibm), &usd, None, &mut diags);
//! assert_eq!(value, Some(Amount::new(dec!(500), usd)));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod aggregate;
pub mod alist;
pub mod collector;
pub mod diagnostics;
pub mod exchange;
pub mod feed;
pub mod lookup;
pub mod options;
pub mod parity;
pub mod pricedb;
pub mod progress;
pub mod reduce;
pub mod resolve;
pub mod round;
pub mod series;

pub use aggregate::{aggregate, AggregationMode, SumList};
pub use alist::{exchange_alist, exchange_cost_alist, ExchangeAlist, ExchangeRate};
pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics, Severity};
pub use exchange::{ExchangeFn, Exchanger, PriceSource, RateContext, UnknownPriceSource};
pub use feed::{Ledger, SplitFeed};
pub use lookup::{nearest, nearest_in_alist};
pub use options::{OptionWarning, RateOptions};
pub use parity::{EuroParity, FixedParity, NoParity};
pub use pricedb::{PriceDatabase, PriceLookup, PriceRecord};
pub use progress::{NoProgress, ProgressSink};
pub use reduce::{sum_collector_commodity, sum_collector_stocks};
pub use resolve::{resolve, ReportList};
pub use series::{PriceAlist, PriceList, PricePoint, SeriesKind};
