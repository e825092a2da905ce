//! Paisa CLI - Personal finance tracker
//!
//! Usage:
//!   paisa add expense 250 -d "Lunch"   Record a transaction
//!   paisa budget set 30000             Set the monthly budget
//!   paisa consent grant                Allow automatic detection
//!   paisa watch --demo                 Detect payments until Ctrl-C

mod cli;
mod commands;


use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use paisa_core::{Clock, SystemClock};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let ledger = commands::open_ledger(&cli.db)?;

    match cli.command {
        Commands::Add(args) => commands::cmd_add(&ledger, clock.as_ref(), &args),
        Commands::List { limit, kind, auto } => {
            commands::cmd_list(&ledger, limit, kind.as_deref(), auto)
        }
        Commands::Delete { id } => commands::cmd_delete(&ledger, &id),
        Commands::Classify {
            description,
            merchant,
        } => commands::cmd_classify(&description, &merchant),
        Commands::Summary => commands::cmd_summary(&ledger),
        Commands::Budget { action } => match action {
            None | Some(BudgetAction::Show) => commands::cmd_budget_show(&ledger, clock.as_ref()),
            Some(BudgetAction::Set { amount }) => commands::cmd_budget_set(&ledger, amount),
            Some(BudgetAction::Limit { category, amount }) => {
                commands::cmd_budget_limit(&ledger, &category, amount)
            }
        },
        Commands::Goals { action } => match action {
            None | Some(GoalsAction::List) => commands::cmd_goals_list(&ledger, clock.as_ref()),
            Some(GoalsAction::Add { name, amount, date }) => {
                commands::cmd_goals_add(&ledger, clock.as_ref(), &name, amount, &date)
            }
            Some(GoalsAction::Delete { id }) => commands::cmd_goals_delete(&ledger, &id),
            Some(GoalsAction::Complete { id }) => commands::cmd_goals_complete(&ledger, &id),
        },
        Commands::Report { period } => commands::cmd_report(&ledger, clock.as_ref(), &period),
        Commands::Insights => commands::cmd_insights(&ledger, clock.as_ref()),
        Commands::Export { output } => {
            commands::cmd_export(&ledger, clock.as_ref(), output.as_deref())
        }
        Commands::Consent { action } => match action {
            ConsentAction::Grant => commands::cmd_consent_grant(&ledger, clock).await,
            ConsentAction::Revoke => commands::cmd_consent_revoke(&ledger, clock).await,
        },
        Commands::Settings { action } => match action {
            None | Some(SettingsAction::Show) => commands::cmd_settings_show(&ledger),
            Some(SettingsAction::Set { key, value }) => {
                commands::cmd_settings_set(&ledger, clock, &key, &value).await
            }
        },
        Commands::Status => commands::cmd_status(&ledger, clock).await,
        Commands::Scan { demo } => commands::cmd_scan(&ledger, clock, demo).await,
        Commands::Watch { live, demo } => commands::cmd_watch(&ledger, clock, live, demo).await,
    }
}
