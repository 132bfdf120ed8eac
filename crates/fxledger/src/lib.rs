//! fxledger CLI tools.
//!
//! This crate provides command-line tools over ledger snapshots:
//!
//! - `fxledger-rates`: Print the exchange-rate table or price series of a
//!   snapshot in a report commodity
//!
//! # Example Usage
//!
//! ```bash
//! fxledger-rates snapshot.json --report USD --source weighted-average
//! fxledger-rates snapshot.json --series NYSE:IBM --instantaneous --format json
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cmd;
