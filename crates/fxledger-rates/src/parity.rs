//! Legacy fixed-parity conversion.
//!
//! Some currencies were locked to each other at definitional rates when they
//! joined a currency union. Those rates are looked up in a table, never
//! derived from observed trades. The table is reached through the
//! [`FixedParity`] trait so callers can plug in their own (or none at all).

use chrono::NaiveDate;
use fxledger_core::{Amount, Commodity};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::round::round_sigfigs;

/// Significant figures kept on the intermediate anchor-currency amount.
const ANCHOR_SIGFIGS: u32 = 6;

/// A closed table of fixed conversion rates around an anchor currency.
pub trait FixedParity {
    /// Units of `commodity` per one unit of the anchor, if it is a member.
    fn units_per_anchor(&self, commodity: &Commodity) -> Option<Decimal>;

    /// Whether `commodity` participates in the union.
    fn participates(&self, commodity: &Commodity) -> bool {
        self.units_per_anchor(commodity).is_some()
    }

    /// Convert `foreign` into `domestic` when both are members.
    ///
    /// The amount is first expressed in the anchor currency, rounded to six
    /// significant figures, and then multiplied out into `domestic`.
    fn convert(
        &self,
        foreign: &Amount,
        domestic: &Commodity,
        _date: Option<NaiveDate>,
    ) -> Option<Amount> {
        let from = self.units_per_anchor(&foreign.commodity)?;
        let to = self.units_per_anchor(domestic)?;
        if foreign.commodity.equiv(domestic) {
            return Some(foreign.clone());
        }
        if from.is_zero() {
            return None;
        }
        let anchor = round_sigfigs(foreign.number.checked_div(from)?, ANCHOR_SIGFIGS);
        Some(Amount::new(anchor.checked_mul(to)?, domestic.clone()))
    }
}

/// No fixed-parity union: every lookup misses.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoParity;

impl FixedParity for NoParity {
    fn units_per_anchor(&self, _commodity: &Commodity) -> Option<Decimal> {
        None
    }
}

/// Irrevocable conversion rates of the legacy euro-area currencies.
const EURO_RATES: &[(&str, Decimal)] = &[
    ("EUR", dec!(1)),
    ("ATS", dec!(13.7603)),
    ("BEF", dec!(40.3399)),
    ("CYP", dec!(0.585274)),
    ("DEM", dec!(1.95583)),
    ("EEK", dec!(15.6466)),
    ("ESP", dec!(166.386)),
    ("FIM", dec!(5.94573)),
    ("FRF", dec!(6.55957)),
    ("GRD", dec!(340.750)),
    ("HRK", dec!(7.53450)),
    ("IEP", dec!(0.787564)),
    ("ITL", dec!(1936.27)),
    ("LTL", dec!(3.45280)),
    ("LUF", dec!(40.3399)),
    ("LVL", dec!(0.702804)),
    ("MTL", dec!(0.429300)),
    ("NLG", dec!(2.20371)),
    ("PTE", dec!(200.482)),
    ("SIT", dec!(239.640)),
    ("SKK", dec!(30.1260)),
];

/// The euro and the national currencies it replaced.
///
/// ```
/// use fxledger_core::{Amount, Commodity};
/// use fxledger_rates::parity::{EuroParity, FixedParity};
/// use rust_decimal_macros::dec;
///
/// let dem = Commodity::currency("DEM");
/// let eur = Commodity::currency("EUR");
/// let converted = EuroParity
///     .convert(&Amount::new(dec!(195.583), dem), &eur, None)
///     .unwrap();
/// assert_eq!(converted.number, dec!(100));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct EuroParity;

impl FixedParity for EuroParity {
    fn units_per_anchor(&self, commodity: &Commodity) -> Option<Decimal> {
        if !commodity.is_currency() {
            return None;
        }
        EURO_RATES
            .iter()
            .find(|(code, _)| code.eq_ignore_ascii_case(commodity.mnemonic()))
            .map(|(_, rate)| *rate)
    }
}
