//! Core types for fxledger
//!
//! This crate provides the value types the rate engine and report code share:
//!
//! - [`Commodity`] - A currency or security, compared by equivalence
//! - [`CommodityKey`] - Canonical map key for a commodity
//! - [`Amount`] - A decimal quantity of a commodity
//! - [`Split`] - One leg of a transaction, with account and transaction commodity
//! - [`Balance`] - A multi-commodity accumulator
//!
//! # Example
//!
//! ```
//! use fxledger_core::{Amount, Balance, Commodity, Split};
//! use rust_decimal_macros::dec;
//! use chrono::NaiveDate;
//!
//! let usd = Commodity::currency("USD");
//! let aapl = Commodity::new("NASDAQ", "AAPL");
//!
//! // Buying 10 shares for 1500 USD
//! let buy = Split::new(
//!     NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
//!     "Assets:Broker:AAPL",
//!     aapl.clone(),
//!     usd.clone(),
//!     dec!(10),
//!     dec!(1500),
//! );
//! assert!(buy.is_cross_commodity());
//!
//! let mut holdings = Balance::new();
//! holdings.add(&Amount::new(buy.amount, aapl.clone()));
//! assert_eq!(holdings.units(&aapl), dec!(10));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod amount;
pub mod balance;
pub mod commodity;
pub mod intern;
pub mod split;

pub use amount::Amount;
pub use balance::Balance;
pub use commodity::{find_equiv, Commodity, CommodityKey, CommodityParseError, CURRENCY_NAMESPACE};
pub use intern::InternedStr;
pub use split::{commodities_of, AccountType, Split, UnknownAccountType};

// Re-export commonly used external types
pub use chrono::NaiveDate;
pub use rust_decimal::Decimal;
