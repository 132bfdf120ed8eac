//! Exchange-rate command.
//!
//! Reads a ledger snapshot, derives rates or price series in a report
//! commodity and prints them with any diagnostics raised on the way.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, ValueEnum};
use fxledger_core::{Amount, Commodity, Split};
use fxledger_rates::{
    Diagnostic, Diagnostics, EuroParity, ExchangeFn, FixedParity, Ledger, NoParity,
    OptionWarning, PriceAlist, PriceDatabase, PriceRecord, PriceSource, RateContext,
    RateOptions, SeriesKind,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output (default)
    #[default]
    Text,
    /// JSON output for tooling
    Json,
}

/// Derive exchange rates and price series from a ledger snapshot.
#[derive(Parser, Debug)]
#[command(name = "fxledger-rates", author, version, about, long_about = None)]
pub struct Args {
    /// Snapshot file (JSON with `splits`, `prices` and `options`)
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Report commodity (e.g. USD or NYSE:IBM)
    #[arg(short, long, value_name = "COMMODITY")]
    pub report: Option<String>,

    /// Price source: average-cost, weighted-average, actual-transactions,
    /// pricedb-latest or pricedb-nearest
    #[arg(short, long, value_name = "SOURCE")]
    pub source: Option<String>,

    /// Ignore splits dated after this day (YYYY-MM-DD)
    #[arg(short, long, value_name = "DATE")]
    pub end_date: Option<String>,

    /// Print price series for these commodities instead of the rate table
    #[arg(long, value_name = "COMMODITY", num_args = 1..)]
    pub series: Vec<String>,

    /// Use per-exchange prices for series instead of running averages
    #[arg(long)]
    pub instantaneous: bool,

    /// Set an option (can be specified multiple times)
    #[arg(short = 'o', long = "option", value_name = "KEY=VALUE")]
    pub options: Vec<String>,

    /// Output format (text or json)
    #[arg(long, short = 'f', value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Show verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

/// Input snapshot.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Snapshot {
    /// Transaction splits.
    pub splits: Vec<Split>,
    /// Quoted prices.
    pub prices: Vec<PriceRecord>,
    /// Computation options; command-line flags override them.
    pub options: RateOptions,
}

/// One row of the rate table.
#[derive(Debug, Serialize)]
pub struct JsonRate {
    /// Commodity priced
    pub commodity: String,
    /// Report-commodity units per unit, absent when unknown
    pub rate: Option<Decimal>,
}

/// One price point.
#[derive(Debug, Serialize)]
pub struct JsonPoint {
    /// Date of the point
    pub date: NaiveDate,
    /// Price in the report commodity
    pub price: Decimal,
}

/// Price series of one commodity.
#[derive(Debug, Serialize)]
pub struct JsonSeries {
    /// Commodity priced
    pub commodity: String,
    /// Points in date order
    pub points: Vec<JsonPoint>,
}

/// A diagnostic or option warning in JSON format.
#[derive(Debug, Serialize)]
pub struct JsonDiagnostic {
    /// Severity: "info", "warning" or "error"
    pub severity: String,
    /// Diagnostic code (e.g., "R1001", "E7001")
    pub code: String,
    /// Message
    pub message: String,
    /// Commodity concerned
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commodity: Option<String>,
    /// Date concerned
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
}

impl From<&Diagnostic> for JsonDiagnostic {
    fn from(diag: &Diagnostic) -> Self {
        Self {
            severity: diag.kind.severity().to_string(),
            code: diag.kind.code().to_string(),
            message: diag.message.clone(),
            commodity: diag.commodity.as_ref().map(ToString::to_string),
            date: diag.date,
        }
    }
}

impl From<&OptionWarning> for JsonDiagnostic {
    fn from(warning: &OptionWarning) -> Self {
        Self {
            severity: "warning".to_string(),
            code: warning.code.to_string(),
            message: warning.message.clone(),
            commodity: None,
            date: None,
        }
    }
}

/// JSON output structure.
#[derive(Debug, Serialize)]
pub struct JsonOutput {
    /// Report commodity
    pub report_commodity: String,
    /// Price source used
    pub price_source: String,
    /// Rate table (empty when series were requested)
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rates: Vec<JsonRate>,
    /// Price series (empty unless requested)
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub series: Vec<JsonSeries>,
    /// Diagnostics raised
    pub diagnostics: Vec<JsonDiagnostic>,
}

/// Read and parse a snapshot file.
pub fn load_snapshot(path: &Path) -> Result<Snapshot> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("failed to parse {}", path.display()))
}

/// Layer command-line settings over the snapshot's options.
pub fn apply_args(options: &mut RateOptions, args: &Args) -> Result<()> {
    for raw in &args.options {
        let (key, value) = raw
            .split_once('=')
            .with_context(|| format!("invalid option \"{raw}\": expected KEY=VALUE"))?;
        options.set(key.trim(), value.trim());
    }
    if let Some(report) = &args.report {
        options.override_with("report_commodity", report);
    }
    if let Some(source) = &args.source {
        options.override_with("price_source", source);
    }
    if let Some(end_date) = &args.end_date {
        options.override_with("end_date", end_date);
    }
    Ok(())
}

fn rate_rows(
    ctx: &RateContext<'_>,
    ledger: &Ledger,
    source: PriceSource,
    end_date: Option<NaiveDate>,
    diags: &mut Diagnostics,
) -> Vec<JsonRate> {
    let report = ctx.report_commodity();
    let fx = ctx.exchange_fn(source, diags);
    if let Some(alist) = fx.alist() {
        return alist
            .iter()
            .map(|entry| JsonRate {
                commodity: entry.commodity.to_string(),
                rate: entry.rate,
            })
            .collect();
    }
    ledger
        .commodities()
        .iter()
        .filter(|c| !c.equiv(report))
        .map(|c| {
            let unit = Amount::new(Decimal::ONE, c.clone());
            let rate = fx
                .exchange(&unit, report, end_date, diags)
                .filter(|a| !a.is_zero())
                .map(|a| a.number);
            JsonRate {
                commodity: c.to_string(),
                rate,
            }
        })
        .collect()
}

fn series_rows(alist: &PriceAlist, commodities: &[Commodity]) -> Vec<JsonSeries> {
    commodities
        .iter()
        .filter_map(|c| alist.get(c))
        .map(|list| JsonSeries {
            commodity: list.commodity.to_string(),
            points: list
                .points
                .iter()
                .map(|p| JsonPoint {
                    date: p.date,
                    price: p.price,
                })
                .collect(),
        })
        .collect()
}

/// Run the rates command, writing results to `out`.
pub fn run<W: Write>(args: &Args, out: &mut W) -> Result<ExitCode> {
    let snapshot = load_snapshot(&args.file)?;
    let mut options = snapshot.options;
    apply_args(&mut options, args)?;

    let mut diags = Diagnostics::new();
    let source = options.source(&mut diags);
    let ledger = Ledger::from_splits(snapshot.splits);
    let prices = PriceDatabase::from_records(&snapshot.prices);
    let parity: &dyn FixedParity = if options.euro_parity {
        &EuroParity
    } else {
        &NoParity
    };

    let mut ctx = RateContext::new(&ledger, &prices, &options.report_commodity)
        .with_parity(parity)
        .with_end_date(options.end_date);
    if let Some(accounts) = options.account_filter() {
        ctx = ctx.with_accounts(accounts.to_vec());
    }
    tracing::debug!(
        splits = ledger.len(),
        prices = prices.len(),
        %source,
        report = %options.report_commodity,
        "loaded snapshot"
    );

    let (rates, series) = if args.series.is_empty() {
        let rates = rate_rows(&ctx, &ledger, source, options.end_date, &mut diags);
        (rates, Vec::new())
    } else {
        let commodities = args
            .series
            .iter()
            .map(|s| s.parse::<Commodity>())
            .collect::<Result<Vec<_>, _>>()
            .context("invalid --series commodity")?;
        let kind = if args.instantaneous {
            SeriesKind::Instantaneous
        } else {
            SeriesKind::WeightedAverage
        };
        let mut progress = |percent: f64| tracing::debug!(percent, "building price series");
        let alist = ctx.price_alist(&commodities, kind, &mut progress, &mut diags);
        (Vec::new(), series_rows(&alist, &commodities))
    };

    let report = options.report_commodity.to_string();
    let problem_count = options.warnings.len() + diags.len();

    if args.format == OutputFormat::Json {
        let diagnostics = options
            .warnings
            .iter()
            .map(JsonDiagnostic::from)
            .chain(diags.entries().iter().map(JsonDiagnostic::from))
            .collect();
        let output = JsonOutput {
            report_commodity: report,
            price_source: source.to_string(),
            rates,
            series,
            diagnostics,
        };
        writeln!(out, "{}", serde_json::to_string_pretty(&output)?)?;
    } else {
        for row in &rates {
            match row.rate {
                Some(rate) => writeln!(out, "{:<24} {rate} {report}", row.commodity)?,
                None => writeln!(out, "{:<24} -", row.commodity)?,
            }
        }
        for list in &series {
            writeln!(out, "{}", list.commodity)?;
            for point in &list.points {
                writeln!(out, "  {}  {} {report}", point.date, point.price)?;
            }
        }
        for warning in &options.warnings {
            writeln!(out, "warning[{}]: {}", warning.code, warning.message)?;
        }
        for diag in &diags {
            writeln!(out, "{}[{}]: {}", diag.kind.severity(), diag.kind.code(), diag.message)?;
        }
    }

    if problem_count > 0 {
        Ok(ExitCode::from(1))
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

/// Main entry point for the rates command.
pub fn main() -> ExitCode {
    let args = Args::parse();

    let filter = if args.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let mut stdout = io::stdout().lock();
    match run(&args, &mut stdout) {
        Ok(exit_code) => exit_code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::from(2)
        }
    }
}
