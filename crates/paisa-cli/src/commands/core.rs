//! Shared command utilities
//!
//! This module contains:
//! - `open_ledger` - Open the SQLite-backed ledger
//! - `parse_date` - Parse YYYY-MM-DD arguments
//! - `build_scanner` - Assemble payment probes for detection commands

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use paisa_core::{Clock, Ledger, Scanner, SqliteStore, SyntheticUpiProbe};

/// Open (or create) the ledger database
pub fn open_ledger(db_path: &Path) -> Result<Ledger> {
    let path_str = db_path
        .to_str()
        .context("Database path is not valid UTF-8")?;
    let store = SqliteStore::open(path_str).context("Failed to open database")?;
    Ok(Ledger::new(Arc::new(store)))
}

pub fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", value))
}

/// Idle probes on every channel, with the synthetic UPI probe if `demo`
pub fn build_scanner(ledger: &Ledger, clock: Arc<dyn Clock>, demo: bool) -> Scanner {
    let scanner = Scanner::idle();
    if demo {
        scanner.with_probe(Box::new(SyntheticUpiProbe::new(ledger.clone(), clock)))
    } else {
        scanner
    }
}
