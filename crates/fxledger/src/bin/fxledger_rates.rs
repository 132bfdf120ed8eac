//! fxledger-rates - Exchange rates and price series from a ledger snapshot.

fn main() -> std::process::ExitCode {
    fxledger::cmd::rates_cmd::main()
}
