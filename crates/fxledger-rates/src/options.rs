//! Rate computation options.

use chrono::NaiveDate;
use fxledger_core::{Commodity, InternedStr};
use serde::Deserialize;
use std::collections::HashSet;

use crate::diagnostics::Diagnostics;
use crate::exchange::PriceSource;

/// Known option names.
const KNOWN_OPTIONS: &[&str] = &[
    "report_commodity",
    "price_source",
    "end_date",
    "account",
    "euro_parity",
];

/// Options that can be specified multiple times.
const REPEATABLE_OPTIONS: &[&str] = &["account"];

/// Option validation warning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionWarning {
    /// Warning code (E7001, E7002, E7003).
    pub code: &'static str,
    /// Warning message.
    pub message: String,
    /// Option name.
    pub option: String,
    /// Option value.
    pub value: String,
}

impl OptionWarning {
    fn new(code: &'static str, message: String, key: &str, value: &str) -> Self {
        Self {
            code,
            message,
            option: key.to_string(),
            value: value.to_string(),
        }
    }
}

/// Options for one rate computation.
///
/// Built from `key=value` pairs with [`RateOptions::set`], or deserialized
/// from an input file.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RateOptions {
    /// Commodity every rate is expressed in.
    pub report_commodity: Commodity,

    /// Price source tag, as configured.
    pub price_source: String,

    /// Only splits dated on or before this day are used.
    pub end_date: Option<NaiveDate>,

    /// Restrict to these accounts; empty means all.
    #[serde(alias = "account")]
    pub accounts: Vec<InternedStr>,

    /// Whether the euro fixed-parity table applies.
    pub euro_parity: bool,

    /// Options that have been set (for duplicate detection).
    #[doc(hidden)]
    #[serde(skip)]
    pub set_options: HashSet<String>,

    /// Validation warnings collected while setting options.
    #[serde(skip)]
    pub warnings: Vec<OptionWarning>,
}

impl Default for RateOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl RateOptions {
    /// Create new options with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self {
            report_commodity: Commodity::currency("USD"),
            price_source: PriceSource::default().tag().to_string(),
            end_date: None,
            accounts: Vec::new(),
            euro_parity: true,
            set_options: HashSet::new(),
            warnings: Vec::new(),
        }
    }

    /// Set an option by name.
    ///
    /// Validates the option and collects any warnings in `self.warnings`.
    pub fn set(&mut self, key: &str, value: &str) {
        // Check for unknown options (E7001)
        let is_known = KNOWN_OPTIONS.contains(&key);
        if !is_known {
            self.warnings.push(OptionWarning::new(
                "E7001",
                format!("Unknown option \"{key}\""),
                key,
                value,
            ));
            return;
        }

        // Check for duplicate non-repeatable options (E7003)
        if !REPEATABLE_OPTIONS.contains(&key) && !self.set_options.insert(key.to_string()) {
            self.warnings.push(OptionWarning::new(
                "E7003",
                format!("Option \"{key}\" can only be specified once"),
                key,
                value,
            ));
        }

        let invalid = |expected: &str| {
            OptionWarning::new(
                "E7002",
                format!("Invalid value \"{value}\" for option \"{key}\": expected {expected}"),
                key,
                value,
            )
        };

        match key {
            "report_commodity" => match value.parse::<Commodity>() {
                Ok(commodity) => self.report_commodity = commodity,
                Err(_) => self.warnings.push(invalid("NAMESPACE:MNEMONIC or a currency code")),
            },
            "price_source" => {
                if value.parse::<PriceSource>().is_err() {
                    let tags: Vec<&str> = PriceSource::ALL.iter().map(|s| s.tag()).collect();
                    self.warnings.push(invalid(&format!("one of {}", tags.join(", "))));
                }
                self.price_source = value.to_string();
            }
            "end_date" => match NaiveDate::parse_from_str(value, "%Y-%m-%d") {
                Ok(date) => self.end_date = Some(date),
                Err(_) => self.warnings.push(invalid("a YYYY-MM-DD date")),
            },
            "account" => self.accounts.push(InternedStr::from(value)),
            "euro_parity" => {
                if !value.eq_ignore_ascii_case("true") && !value.eq_ignore_ascii_case("false") {
                    self.warnings.push(invalid("TRUE or FALSE"));
                }
                self.euro_parity = value.eq_ignore_ascii_case("true");
            }
            _ => {}
        }
    }

    /// Set an option that takes precedence over earlier settings.
    ///
    /// Values are validated like [`set`](Self::set), but an earlier setting
    /// of the same key is replaced without an E7003 warning.
    pub fn override_with(&mut self, key: &str, value: &str) {
        self.set_options.remove(key);
        self.set(key, value);
    }

    /// The configured price source, falling back to the nearest database
    /// price for an unknown tag.
    pub fn source(&self, diags: &mut Diagnostics) -> PriceSource {
        PriceSource::parse_or_fallback(&self.price_source, diags)
    }

    /// Account restriction, if any.
    #[must_use]
    pub fn account_filter(&self) -> Option<&[InternedStr]> {
        if self.accounts.is_empty() {
            None
        } else {
            Some(&self.accounts)
        }
    }
}
