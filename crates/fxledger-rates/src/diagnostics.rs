//! Recoverable conditions raised while computing rates.
//!
//! Nothing in this crate fails a whole computation because one commodity
//! could not be priced. Each such condition becomes a [`Diagnostic`] pushed
//! into a caller-owned [`Diagnostics`] sink, and the affected entry degrades
//! to a dropped pair or a zero amount.
//!
//! | Code | Kind |
//! |------|------|
//! | R1001 | No bridge to the report commodity |
//! | R1002 | Both bridge sides already resolved |
//! | R2001 | No usable rate or price for a conversion |
//! | R2002 | Zero denominator while dividing totals |
//! | R2003 | Quantity outside the range of `Decimal` |
//! | R3001 | Unknown price-source tag |

use chrono::NaiveDate;
use fxledger_core::Commodity;
use std::fmt;
use thiserror::Error;

/// Kind of recoverable condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    /// R1001: a commodity pair has no path to the report commodity.
    UnresolvableRate,
    /// R1002: both sides of a pair are already known; the aggregation is
    /// inconsistent.
    AmbiguousRate,
    /// R2001: a conversion found no rate or price.
    NoPriceFound,
    /// R2002: a ratio had a zero denominator.
    DivisionByZero,
    /// R2003: a sum or product left the range of `Decimal`.
    Overflow,
    /// R3001: an unrecognized price-source tag fell back to the default.
    UnsupportedStrategy,
}

impl DiagnosticKind {
    /// Get the code string (e.g., "R1001").
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::UnresolvableRate => "R1001",
            Self::AmbiguousRate => "R1002",
            Self::NoPriceFound => "R2001",
            Self::DivisionByZero => "R2002",
            Self::Overflow => "R2003",
            Self::UnsupportedStrategy => "R3001",
        }
    }

    /// Get the severity level.
    #[must_use]
    pub const fn severity(&self) -> Severity {
        match self {
            Self::AmbiguousRate => Severity::Error,
            Self::UnresolvableRate
            | Self::NoPriceFound
            | Self::Overflow
            | Self::UnsupportedStrategy => Severity::Warning,
            Self::DivisionByZero => Severity::Info,
        }
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Severity {
    /// Informational only.
    Info,
    /// A value was degraded.
    Warning,
    /// Indicates an inconsistency upstream.
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// A recoverable condition with its context.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("[{kind}] {message}")]
pub struct Diagnostic {
    /// What went wrong.
    pub kind: DiagnosticKind,
    /// Human-readable description.
    pub message: String,
    /// Commodity the condition is about, if any.
    pub commodity: Option<Commodity>,
    /// Date of the lookup or split, if any.
    pub date: Option<NaiveDate>,
}

impl Diagnostic {
    /// Create a new diagnostic.
    #[must_use]
    pub fn new(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            commodity: None,
            date: None,
        }
    }

    /// Attach the commodity concerned.
    #[must_use]
    pub fn with_commodity(mut self, commodity: &Commodity) -> Self {
        self.commodity = Some(commodity.clone());
        self
    }

    /// Attach a date.
    #[must_use]
    pub const fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }
}

/// Sink collecting diagnostics alongside a primary result.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    /// Create an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a diagnostic and log it.
    pub fn push(&mut self, diagnostic: Diagnostic) {
        match diagnostic.kind.severity() {
            Severity::Error => tracing::error!(code = diagnostic.kind.code(), "{}", diagnostic.message),
            Severity::Warning => tracing::warn!(code = diagnostic.kind.code(), "{}", diagnostic.message),
            Severity::Info => tracing::debug!(code = diagnostic.kind.code(), "{}", diagnostic.message),
        }
        self.entries.push(diagnostic);
    }

    /// All recorded diagnostics in order.
    #[must_use]
    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    /// Recorded diagnostics of one kind.
    pub fn of_kind(&self, kind: DiagnosticKind) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter().filter(move |d| d.kind == kind)
    }

    /// Whether a diagnostic of `kind` was recorded.
    #[must_use]
    pub fn contains(&self, kind: DiagnosticKind) -> bool {
        self.entries.iter().any(|d| d.kind == kind)
    }

    /// Number of recorded diagnostics.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Take the recorded diagnostics, leaving the sink empty.
    pub fn drain(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.entries)
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
