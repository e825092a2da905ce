//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Paisa - Track spending, budgets and savings goals
#[derive(Parser)]
#[command(name = "paisa")]
#[command(about = "Personal finance tracker with automatic transaction detection", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Database path
    #[arg(long, default_value = "paisa.db", global = true)]
    pub db: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Record a transaction by hand
    Add(AddArgs),

    /// List transactions, newest first
    List {
        /// Maximum number to show
        #[arg(short, long, default_value = "20")]
        limit: usize,

        /// Only show this kind: expense or income
        #[arg(short, long)]
        kind: Option<String>,

        /// Only show auto-detected transactions
        #[arg(long)]
        auto: bool,
    },

    /// Delete a transaction
    Delete {
        /// Transaction ID
        id: String,
    },

    /// Show which category a description would get
    Classify {
        /// Transaction description
        description: String,

        /// Merchant name
        #[arg(short, long, default_value = "")]
        merchant: String,
    },

    /// Show income, expenses, balance and savings progress
    Summary,

    /// Manage the monthly budget
    Budget {
        #[command(subcommand)]
        action: Option<BudgetAction>,
    },

    /// Manage savings goals
    Goals {
        #[command(subcommand)]
        action: Option<GoalsAction>,
    },

    /// Show spending reports
    Report {
        /// Period for the expense summary: daily, weekly, monthly
        #[arg(short, long, default_value = "monthly")]
        period: String,
    },

    /// Show insights, budget warnings and suggestions
    Insights,

    /// Export transactions, budget and goals as JSON
    Export {
        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Grant or revoke consent for automatic detection
    Consent {
        #[command(subcommand)]
        action: ConsentAction,
    },

    /// Show or change detection settings
    Settings {
        #[command(subcommand)]
        action: Option<SettingsAction>,
    },

    /// Show detection status
    Status,

    /// Run one detection pass
    Scan {
        /// Use the synthetic UPI probe
        #[arg(long)]
        demo: bool,
    },

    /// Run detection continuously until Ctrl-C
    Watch {
        /// Use the live cadence instead of periodic scanning
        #[arg(long)]
        live: bool,

        /// Use the synthetic UPI probe
        #[arg(long)]
        demo: bool,
    },
}

#[derive(Args)]
pub struct AddArgs {
    /// Transaction kind: expense or income
    pub kind: String,

    /// Amount in rupees
    pub amount: f64,

    /// Description
    #[arg(short, long, default_value = "")]
    pub description: String,

    /// Merchant or payer
    #[arg(short, long, default_value = "")]
    pub merchant: String,

    /// Category for expenses (defaults to others)
    #[arg(short, long)]
    pub category: Option<String>,

    /// Date (YYYY-MM-DD, defaults to now)
    #[arg(long)]
    pub date: Option<String>,

    /// Payment method label, e.g. "PhonePe UPI"
    #[arg(long)]
    pub payment_method: Option<String>,
}

#[derive(Subcommand)]
pub enum BudgetAction {
    /// Show budget usage for this month
    Show,

    /// Set the monthly budget
    Set {
        /// Amount in rupees (0 clears it)
        amount: f64,
    },

    /// Set a per-category limit
    Limit {
        /// Category name
        category: String,

        /// Amount in rupees (0 removes the limit)
        amount: f64,
    },
}

#[derive(Subcommand)]
pub enum GoalsAction {
    /// List savings goals with progress
    List,

    /// Add a savings goal
    Add {
        /// Goal name
        name: String,

        /// Target amount in rupees
        amount: f64,

        /// Target date (YYYY-MM-DD)
        date: String,
    },

    /// Delete a savings goal
    Delete {
        /// Goal ID
        id: String,
    },

    /// Mark a savings goal as completed
    Complete {
        /// Goal ID
        id: String,
    },
}

#[derive(Subcommand)]
pub enum ConsentAction {
    /// Allow automatic detection
    Grant,

    /// Withdraw consent and forget processed transaction IDs
    Revoke,
}

#[derive(Subcommand)]
pub enum SettingsAction {
    /// Show current settings
    Show,

    /// Change one setting
    Set {
        /// Setting name, e.g. allow_upi or scan_interval_ms
        key: String,

        /// New value
        value: String,
    },
}
