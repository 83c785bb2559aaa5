//! Input/Output operations for the XC driver
//!
//! This module handles logging setup, density sample files and the results
//! ledger.

mod ledger;
mod output;
mod samples;

pub use ledger::{append_entries, parse_ledger, read_ledger, LedgerEntry};
pub use output::setup_output;
pub use samples::{load_samples, parse_samples, DensitySamples, SampleDensity, SampleFile};
