//! Reduce multi-commodity balances to a single commodity.

use chrono::NaiveDate;
use fxledger_core::{Amount, Balance, Commodity};

use crate::diagnostics::Diagnostics;
use crate::exchange::ExchangeFn;

/// Convert every entry of `balance` into `domestic` and sum them.
///
/// Returns `None` when the balance or the exchange function is absent, or
/// when an entry could not be exchanged at all.
pub fn sum_collector_commodity(
    balance: Option<&Balance>,
    domestic: &Commodity,
    exchange: Option<&dyn ExchangeFn>,
    date: Option<NaiveDate>,
    diags: &mut Diagnostics,
) -> Option<Amount> {
    let balance = balance?;
    let exchange = exchange?;

    let mut sum = Amount::zero(domestic.clone());
    for amount in balance {
        let converted = if amount.commodity.equiv(domestic) {
            amount.clone()
        } else {
            exchange.exchange(amount, domestic, date, diags)?
        };
        sum += &converted;
    }
    Some(sum)
}

/// Convert only the non-currency holdings of `balance` into `domestic`.
///
/// Currency entries are carried over unconverted, so the result can still
/// hold several commodities.
pub fn sum_collector_stocks(
    balance: Option<&Balance>,
    domestic: &Commodity,
    exchange: Option<&dyn ExchangeFn>,
    date: Option<NaiveDate>,
    diags: &mut Diagnostics,
) -> Option<Balance> {
    let balance = balance?;
    let exchange = exchange?;

    let mut out = Balance::new();
    for amount in balance {
        if amount.commodity.is_currency() || amount.commodity.equiv(domestic) {
            out.add(amount);
        } else {
            out.add(&exchange.exchange(amount, domestic, date, diags)?);
        }
    }
    Some(out)
}
