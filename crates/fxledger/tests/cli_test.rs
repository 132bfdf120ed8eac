//! Tests for the `fxledger-rates` command.
//!
//! Snapshots are written to temporary files and the command is driven
//! through its library entry point with output captured in memory.

use clap::Parser;
use fxledger::cmd::rates_cmd::{run, Args};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::io::Write;
use std::process::ExitCode;
use tempfile::NamedTempFile;

const BROKER_SNAPSHOT: &str = r#"{
    "splits": [
        {
            "date": "2024-01-02",
            "account": "Assets:Broker:X",
            "account_commodity": "FUND:X",
            "transaction_commodity": "USD",
            "amount": "10",
            "value": "200"
        },
        {
            "date": "2024-02-01",
            "account": "Assets:Broker:X",
            "account_commodity": "FUND:X",
            "transaction_commodity": "USD",
            "amount": "10",
            "value": "300"
        }
    ],
    "prices": [
        {"date": "2024-01-01", "commodity": "EUR", "currency": "USD", "price": "1.10"}
    ],
    "options": {"report_commodity": "USD", "price_source": "average-cost"}
}"#;

fn snapshot_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

fn run_with(file: &NamedTempFile, extra: &[&str]) -> (ExitCode, String) {
    let path = file.path().to_str().unwrap();
    let mut argv = vec!["fxledger-rates", path];
    argv.extend_from_slice(extra);
    let args = Args::parse_from(argv);

    let mut out = Vec::new();
    let code = run(&args, &mut out).unwrap();
    (code, String::from_utf8(out).unwrap())
}

fn is_success(code: ExitCode) -> bool {
    format!("{code:?}") == format!("{:?}", ExitCode::SUCCESS)
}

/// The rate printed on the text row for `commodity`.
fn text_rate(output: &str, commodity: &str) -> Option<Decimal> {
    output
        .lines()
        .find(|line| line.split_whitespace().next() == Some(commodity))
        .and_then(|line| line.split_whitespace().nth(1))
        .and_then(|rate| rate.parse().ok())
}

fn json_decimal(value: &serde_json::Value) -> Decimal {
    match value {
        serde_json::Value::String(s) => s.parse().unwrap(),
        other => other.to_string().parse().unwrap(),
    }
}

#[test]
fn test_rate_table_from_snapshot_options() {
    let file = snapshot_file(BROKER_SNAPSHOT);
    let (code, output) = run_with(&file, &[]);

    assert!(is_success(code), "unexpected problems:\n{output}");
    assert_eq!(text_rate(&output, "FUND:X"), Some(dec!(25)));
    assert!(output.contains(" USD"));
}

#[test]
fn test_end_date_flag_overrides_snapshot() {
    let file = snapshot_file(BROKER_SNAPSHOT);
    let (code, output) = run_with(&file, &["--end-date", "2024-01-15"]);

    assert!(is_success(code));
    assert_eq!(text_rate(&output, "FUND:X"), Some(dec!(20)));
}

#[test]
fn test_report_flag_overrides_option_cleanly() {
    let file = snapshot_file(BROKER_SNAPSHOT);
    let (code, output) = run_with(&file, &["-o", "report_commodity=EUR", "--report", "USD"]);

    assert!(is_success(code), "unexpected problems:\n{output}");
    assert!(!output.contains("E7003"));
    assert_eq!(text_rate(&output, "FUND:X"), Some(dec!(25)));
}

#[test]
fn test_price_database_source() {
    let file = snapshot_file(
        r#"{
            "splits": [{
                "date": "2024-01-05",
                "account": "Assets:Bank:EUR",
                "account_commodity": "EUR",
                "transaction_commodity": "EUR",
                "amount": "100",
                "value": "100"
            }],
            "prices": [
                {"date": "2024-01-01", "commodity": "EUR", "currency": "USD", "price": "1.10"},
                {"date": "2024-03-01", "commodity": "EUR", "currency": "USD", "price": "1.20"}
            ]
        }"#,
    );

    let (code, output) = run_with(&file, &["-s", "pricedb-latest"]);
    assert!(is_success(code), "unexpected problems:\n{output}");
    assert_eq!(text_rate(&output, "EUR"), Some(dec!(1.2)));

    let (_, output) = run_with(&file, &["-s", "pricedb-nearest", "-e", "2024-01-10"]);
    assert_eq!(text_rate(&output, "EUR"), Some(dec!(1.1)));
}

#[test]
fn test_json_output() {
    let file = snapshot_file(BROKER_SNAPSHOT);
    let (code, output) = run_with(&file, &["-f", "json"]);
    assert!(is_success(code));

    let json: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(json["report_commodity"], "USD");
    assert_eq!(json["price_source"], "average-cost");
    assert!(json["diagnostics"].as_array().unwrap().is_empty());
    assert!(json.get("series").is_none());

    let rates = json["rates"].as_array().unwrap();
    let fund = rates.iter().find(|r| r["commodity"] == "FUND:X").unwrap();
    assert_eq!(json_decimal(&fund["rate"]), dec!(25));
}

#[test]
fn test_series_output() {
    let file = snapshot_file(BROKER_SNAPSHOT);
    let (code, output) = run_with(&file, &["--series", "FUND:X", "-f", "json"]);
    assert!(is_success(code));

    let json: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert!(json.get("rates").is_none());
    let series = json["series"].as_array().unwrap();
    assert_eq!(series.len(), 1);
    let prices: Vec<Decimal> = series[0]["points"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| json_decimal(&p["price"]))
        .collect();
    assert_eq!(prices, vec![dec!(20), dec!(25)]);

    let (_, text) = run_with(&file, &["--series", "FUND:X", "--instantaneous"]);
    assert!(text.starts_with("FUND:X\n"));
    assert!(text.contains("2024-02-01  30 USD"));
}

#[test]
fn test_unresolvable_rate_sets_exit_code() {
    let file = snapshot_file(
        r#"{
            "splits": [{
                "date": "2024-01-02",
                "account": "Assets:Vault",
                "account_commodity": "METAL:AU",
                "transaction_commodity": "METAL:AG",
                "amount": "1",
                "value": "80"
            }],
            "options": {"price_source": "weighted-average"}
        }"#,
    );
    let (code, output) = run_with(&file, &[]);

    assert!(!is_success(code));
    assert!(output.contains("warning[R1001]"), "missing diagnostic:\n{output}");
}

#[test]
fn test_option_warnings_are_reported() {
    let file = snapshot_file(BROKER_SNAPSHOT);
    let (code, output) = run_with(&file, &["-o", "bogus=1", "-s", "mark-to-model"]);

    assert!(!is_success(code));
    assert!(output.contains("warning[E7001]"));
    assert!(output.contains("[R3001]"));
}

#[test]
fn test_missing_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.json");
    let args = Args::parse_from(["fxledger-rates", path.to_str().unwrap()]);

    let err = run(&args, &mut Vec::new()).unwrap_err();
    assert!(err.to_string().contains("failed to read"));
}

#[test]
fn test_malformed_snapshot_is_an_error() {
    let file = snapshot_file("{\"splits\": [ {\"date\": \"yesterday\"} ]}");
    let path = file.path().to_str().unwrap();
    let args = Args::parse_from(["fxledger-rates", path]);

    let err = run(&args, &mut Vec::new()).unwrap_err();
    assert!(err.to_string().contains("failed to parse"));
}
