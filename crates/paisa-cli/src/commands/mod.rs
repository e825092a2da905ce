//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `core` - Shared utilities (open_ledger, parse_date, build_scanner)
//! - `transactions` - Transaction commands (add, list, delete, classify)
//! - `budget` - Budget and savings goal commands
//! - `reports` - Summary, reports, insights and export
//! - `detection` - Consent, settings, status, scan and watch

pub mod budget;
pub mod core;
pub mod detection;
pub mod reports;
pub mod transactions;

// Re-export command functions for main.rs
pub use budget::*;
pub use core::*;
pub use detection::*;
pub use reports::*;
pub use transactions::*;

/// Truncate a string to a maximum number of characters, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Format an amount in rupees with two decimals
pub fn rupees(amount: f64) -> String {
    format!("₹{:.2}", amount)
}
