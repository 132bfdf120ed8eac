//! Commodity identity and equivalence.
//!
//! A [`Commodity`] is a handle for a currency or security. Handles carry
//! display data (full name, smallest fraction) that may differ between two
//! handles for the same underlying instrument, so identity is never compared
//! structurally. Two handles are *equivalent* when their namespace and
//! mnemonic agree, ignoring ASCII case. Every map keyed by commodity uses the
//! canonical [`CommodityKey`] derived from exactly those two fields.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::intern::InternedStr;

/// Namespace used for ISO 4217 currencies.
pub const CURRENCY_NAMESPACE: &str = "CURRENCY";

/// Canonical identifier of a commodity, suitable as a map key.
///
/// Built as `NAMESPACE::MNEMONIC` in upper case, so equal keys mean
/// equivalent commodities.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CommodityKey(InternedStr);

impl CommodityKey {
    /// Get the canonical key text.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for CommodityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}

/// A currency, stock, fund or other tradable unit.
///
/// `PartialEq` is commodity equivalence, not structural equality: handles with
/// different full names or fractions still compare equal.
///
/// # Examples
///
/// ```
/// use fxledger_core::Commodity;
///
/// let usd = Commodity::currency("USD");
/// let other_usd = Commodity::currency("usd").with_fullname("US Dollar");
/// assert!(usd.equiv(&other_usd));
/// assert_eq!(usd.key(), other_usd.key());
///
/// let aapl: Commodity = "NASDAQ:AAPL".parse().unwrap();
/// assert!(!aapl.is_currency());
/// assert!(!aapl.equiv(&usd));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Commodity {
    namespace: InternedStr,
    mnemonic: InternedStr,
    fullname: Option<InternedStr>,
    key: CommodityKey,
}

impl Commodity {
    /// Create a commodity in the given namespace.
    pub fn new(namespace: impl Into<InternedStr>, mnemonic: impl Into<InternedStr>) -> Self {
        let namespace = namespace.into();
        let mnemonic = mnemonic.into();
        let key = CommodityKey(InternedStr::new(format!(
            "{}::{}",
            namespace.to_ascii_uppercase(),
            mnemonic.to_ascii_uppercase()
        )));
        Self {
            namespace,
            mnemonic,
            fullname: None,
            key,
        }
    }

    /// Create an ISO 4217 currency.
    pub fn currency(mnemonic: impl Into<InternedStr>) -> Self {
        Self::new(CURRENCY_NAMESPACE, mnemonic)
    }

    /// Attach a display name. Does not affect equivalence.
    pub fn with_fullname(mut self, fullname: impl Into<InternedStr>) -> Self {
        self.fullname = Some(fullname.into());
        self
    }

    /// The namespace (exchange or `CURRENCY`).
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// The ticker or ISO code.
    pub fn mnemonic(&self) -> &str {
        &self.mnemonic
    }

    /// The display name, if any.
    pub fn fullname(&self) -> Option<&str> {
        self.fullname.as_deref()
    }

    /// The canonical map key.
    pub const fn key(&self) -> &CommodityKey {
        &self.key
    }

    /// Whether this commodity is a currency rather than a security.
    pub fn is_currency(&self) -> bool {
        self.namespace.eq_ignore_ascii_case(CURRENCY_NAMESPACE)
    }

    /// Commodity equivalence: same namespace and mnemonic.
    pub fn equiv(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl PartialEq for Commodity {
    fn eq(&self, other: &Self) -> bool {
        self.equiv(other)
    }
}

impl Eq for Commodity {}

impl fmt::Display for Commodity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_currency() {
            write!(f, "{}", self.mnemonic)
        } else {
            write!(f, "{}:{}", self.namespace, self.mnemonic)
        }
    }
}

/// Error parsing a commodity from text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommodityParseError {
    /// The mnemonic part is empty.
    #[error("empty commodity mnemonic in \"{0}\"")]
    EmptyMnemonic(String),
    /// The namespace part before `:` is empty.
    #[error("empty commodity namespace in \"{0}\"")]
    EmptyNamespace(String),
}

impl FromStr for Commodity {
    type Err = CommodityParseError;

    /// Parse `NAMESPACE:MNEMONIC`, or a bare mnemonic as a currency.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.split_once(':') {
            Some((ns, mnemonic)) => {
                if ns.is_empty() {
                    return Err(CommodityParseError::EmptyNamespace(s.to_string()));
                }
                if mnemonic.is_empty() {
                    return Err(CommodityParseError::EmptyMnemonic(s.to_string()));
                }
                Ok(Self::new(ns, mnemonic))
            }
            None if s.is_empty() => Err(CommodityParseError::EmptyMnemonic(s.to_string())),
            None => Ok(Self::currency(s)),
        }
    }
}

impl TryFrom<String> for Commodity {
    type Error = CommodityParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Commodity> for String {
    fn from(value: Commodity) -> Self {
        value.to_string()
    }
}

/// Find the first item whose commodity is equivalent to `commodity`.
///
/// For the places where raw handles sit in a list rather than behind a
/// [`CommodityKey`]-indexed map.
pub fn find_equiv<'a, T>(
    items: &'a [T],
    commodity: &Commodity,
    get: impl Fn(&T) -> &Commodity,
) -> Option<&'a T> {
    items.iter().find(|item| get(item).equiv(commodity))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equivalence_ignores_display_data() {
        let a = Commodity::new("NYSE", "IBM").with_fullname("International Business Machines");
        let b = Commodity::new("nyse", "ibm");
        assert!(a.equiv(&b));
        assert_eq!(a, b);
        assert_eq!(a.key().as_str(), "NYSE::IBM");
    }

    #[test]
    fn test_different_namespace_not_equiv() {
        let a = Commodity::new("NYSE", "ABC");
        let b = Commodity::new("NASDAQ", "ABC");
        assert!(!a.equiv(&b));
    }

    #[test]
    fn test_parse() {
        let usd: Commodity = "USD".parse().unwrap();
        assert!(usd.is_currency());
        assert_eq!(usd.to_string(), "USD");

        let fund: Commodity = "FUND:VTSAX".parse().unwrap();
        assert_eq!(fund.namespace(), "FUND");
        assert_eq!(fund.mnemonic(), "VTSAX");
        assert_eq!(fund.to_string(), "FUND:VTSAX");

        assert!(matches!(
            "".parse::<Commodity>(),
            Err(CommodityParseError::EmptyMnemonic(_))
        ));
        assert!(matches!(
            ":X".parse::<Commodity>(),
            Err(CommodityParseError::EmptyNamespace(_))
        ));
    }

    #[test]
    fn test_find_equiv() {
        let list = vec![Commodity::currency("EUR"), Commodity::currency("GBP")];
        let found = find_equiv(&list, &Commodity::currency("gbp"), |c| c);
        assert_eq!(found.map(Commodity::mnemonic), Some("GBP"));
        assert!(find_equiv(&list, &Commodity::currency("JPY"), |c| c).is_none());
    }
}
