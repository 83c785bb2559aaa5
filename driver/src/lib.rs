//! Driver for neural XC functional evaluation
//!
//! Reads a YAML configuration, evaluates one functional on the density samples
//! of every configured system and appends the integrated energies to a
//! results ledger.

pub mod app;
pub mod config;
pub mod io;
