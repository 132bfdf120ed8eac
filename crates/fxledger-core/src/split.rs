//! Transaction splits as seen by the rate core.
//!
//! A [`Split`] is an immutable snapshot of one leg of a transaction: the
//! account it posts to (with that account's commodity), the transaction's
//! own commodity, and the signed quantities in each.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::commodity::find_equiv;
use crate::intern::InternedStr;
use crate::Commodity;

/// Kind of account a split posts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    /// Generic asset account.
    #[default]
    Asset,
    /// Bank account.
    Bank,
    /// Cash on hand.
    Cash,
    /// Credit card or loan.
    Liability,
    /// Equity.
    Equity,
    /// Income.
    Income,
    /// Expense.
    Expense,
    /// Brokerage holding of a stock.
    Stock,
    /// Mutual fund holding.
    Mutual,
    /// Trading account balancing a multi-commodity transaction.
    ///
    /// Splits in trading accounts counterbalance each other and are excluded
    /// from cost aggregation.
    Trading,
}

/// Error parsing an [`AccountType`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown account type: {0}")]
pub struct UnknownAccountType(pub String);

impl FromStr for AccountType {
    type Err = UnknownAccountType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asset" => Ok(Self::Asset),
            "bank" => Ok(Self::Bank),
            "cash" => Ok(Self::Cash),
            "liability" => Ok(Self::Liability),
            "equity" => Ok(Self::Equity),
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            "stock" => Ok(Self::Stock),
            "mutual" => Ok(Self::Mutual),
            "trading" => Ok(Self::Trading),
            _ => Err(UnknownAccountType(s.to_string())),
        }
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Asset => "asset",
            Self::Bank => "bank",
            Self::Cash => "cash",
            Self::Liability => "liability",
            Self::Equity => "equity",
            Self::Income => "income",
            Self::Expense => "expense",
            Self::Stock => "stock",
            Self::Mutual => "mutual",
            Self::Trading => "trading",
        };
        f.write_str(s)
    }
}

/// One leg of a transaction.
///
/// `amount` is counted in `account_commodity`, `value` in
/// `transaction_commodity`. When both commodities are equivalent the two
/// numbers carry the same information.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Split {
    /// Date of the parent transaction.
    pub date: NaiveDate,
    /// Full name of the owning account.
    pub account: InternedStr,
    /// Kind of the owning account.
    #[serde(default)]
    pub account_type: AccountType,
    /// Commodity of the owning account.
    pub account_commodity: Commodity,
    /// Currency of the parent transaction.
    pub transaction_commodity: Commodity,
    /// Signed quantity in the account commodity.
    pub amount: Decimal,
    /// Signed quantity in the transaction commodity.
    pub value: Decimal,
    /// Whether the parent transaction has been voided.
    #[serde(default)]
    pub voided: bool,
}

impl Split {
    /// Create a split in a plain asset account.
    pub fn new(
        date: NaiveDate,
        account: impl Into<InternedStr>,
        account_commodity: Commodity,
        transaction_commodity: Commodity,
        amount: Decimal,
        value: Decimal,
    ) -> Self {
        Self {
            date,
            account: account.into(),
            account_type: AccountType::Asset,
            account_commodity,
            transaction_commodity,
            amount,
            value,
            voided: false,
        }
    }

    /// Set the account type.
    #[must_use]
    pub fn with_account_type(mut self, account_type: AccountType) -> Self {
        self.account_type = account_type;
        self
    }

    /// Mark the parent transaction as voided.
    #[must_use]
    pub fn void(mut self) -> Self {
        self.voided = true;
        self
    }

    /// A split is interesting for rates when its two commodities differ.
    pub fn is_cross_commodity(&self) -> bool {
        !self.transaction_commodity.equiv(&self.account_commodity)
    }

    /// Whether the owning account is a trading account.
    pub fn is_trading(&self) -> bool {
        self.account_type == AccountType::Trading
    }

    /// Whether either side of the split is counted in `commodity`.
    pub fn involves(&self, commodity: &Commodity) -> bool {
        self.transaction_commodity.equiv(commodity) || self.account_commodity.equiv(commodity)
    }
}

/// Distinct commodities on either side of `splits`, in first-seen order.
#[must_use]
pub fn commodities_of(splits: &[Split]) -> Vec<Commodity> {
    let mut seen: Vec<Commodity> = Vec::new();
    for split in splits {
        for c in [&split.account_commodity, &split.transaction_commodity] {
            if find_equiv(&seen, c, |s| s).is_none() {
                seen.push(c.clone());
            }
        }
    }
    seen
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_cross_commodity() {
        let usd = Commodity::currency("USD");
        let aapl = Commodity::new("NASDAQ", "AAPL");

        let buy = Split::new(date(2024, 1, 2), "Assets:Broker:AAPL", aapl.clone(), usd.clone(), dec!(10), dec!(1500));
        assert!(buy.is_cross_commodity());
        assert!(buy.involves(&aapl));
        assert!(buy.involves(&usd));

        let cash = Split::new(date(2024, 1, 2), "Assets:Bank", usd.clone(), usd, dec!(-1500), dec!(-1500));
        assert!(!cash.is_cross_commodity());
        assert!(!cash.involves(&aapl));
    }

    #[test]
    fn test_account_type_roundtrip() {
        for t in ["asset", "Trading", "STOCK"] {
            let parsed: AccountType = t.parse().unwrap();
            assert_eq!(parsed.to_string(), t.to_ascii_lowercase());
        }
        assert_eq!(
            "pension".parse::<AccountType>(),
            Err(UnknownAccountType("pension".to_string()))
        );
    }

    #[test]
    fn test_commodities_of_dedupes_by_equivalence() {
        let usd = Commodity::currency("USD");
        let aapl = Commodity::new("NASDAQ", "AAPL");
        let splits = vec![
            Split::new(date(2024, 1, 2), "Assets:Broker", aapl.clone(), usd.clone(), dec!(1), dec!(150)),
            Split::new(date(2024, 1, 3), "Assets:Bank", Commodity::currency("usd"), usd, dec!(5), dec!(5)),
        ];
        let found = commodities_of(&splits);
        assert_eq!(found.len(), 2);
        assert!(found[0].equiv(&aapl));
        assert_eq!(found[1].mnemonic(), "USD");
    }

    #[test]
    fn test_deserialize_defaults() {
        let json = r#"{
            "date": "2024-03-01",
            "account": "Assets:Broker",
            "account_commodity": "NYSE:IBM",
            "transaction_commodity": "USD",
            "amount": "5",
            "value": "900.50"
        }"#;
        let split: Split = serde_json::from_str(json).unwrap();
        assert_eq!(split.account_type, AccountType::Asset);
        assert!(!split.voided);
        assert_eq!(split.value, dec!(900.50));
        assert_eq!(split.account_commodity.namespace(), "NYSE");
    }
}
