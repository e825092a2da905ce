//! Transaction command implementations

use anyhow::{anyhow, Result};
use chrono::TimeZone;
use paisa_core::{
    Category, Clock, Ledger, MerchantClassifier, NewTransaction, RecurrenceDetector,
    TransactionKind,
};

use super::{parse_date, rupees, truncate};
use crate::cli::AddArgs;

pub fn cmd_add(ledger: &Ledger, clock: &dyn Clock, args: &AddArgs) -> Result<()> {
    let kind: TransactionKind = args.kind.parse().map_err(|e: String| anyhow!(e))?;

    let category = match (&args.category, kind) {
        (Some(_), TransactionKind::Income) => {
            return Err(anyhow!("Income transactions do not take a category"));
        }
        (Some(name), TransactionKind::Expense) => {
            Some(name.parse::<Category>().map_err(|e| anyhow!(e))?)
        }
        (None, _) => None,
    };

    let date = match &args.date {
        Some(value) => {
            let day = parse_date(value)?;
            let midnight = day
                .and_hms_opt(0, 0, 0)
                .ok_or_else(|| anyhow!("Invalid date '{}'", value))?;
            chrono::Utc.from_utc_datetime(&midnight)
        }
        None => clock.now(),
    };

    let tx = ledger.add_manual_transaction(
        NewTransaction {
            kind,
            amount: args.amount,
            description: args.description.clone(),
            merchant: args.merchant.clone(),
            date,
            category,
            payment_method: args.payment_method.clone(),
        },
        clock.now(),
    )?;

    println!("✅ Added {} {} ({})", tx.kind, rupees(tx.amount), tx.id);
    if let Some(category) = tx.category {
        println!("   Category: {}", category.display_name());
    }

    Ok(())
}

pub fn cmd_list(
    ledger: &Ledger,
    limit: usize,
    kind: Option<&str>,
    auto_only: bool,
) -> Result<()> {
    let kind = kind
        .map(|k| k.parse::<TransactionKind>().map_err(|e| anyhow!(e)))
        .transpose()?;

    let mut transactions = ledger.transactions();
    transactions.retain(|t| {
        kind.map_or(true, |k| t.kind == k) && (!auto_only || t.is_auto_detected())
    });
    transactions.sort_by(|a, b| b.date.cmp(&a.date));

    if transactions.is_empty() {
        println!("No transactions found. Add one with:");
        println!("  paisa add expense 250 --description \"Lunch\"");
        return Ok(());
    }

    println!();
    println!("📝 Recent Transactions");
    println!("   ─────────────────────────────────────────────────────────────");

    for tx in transactions.iter().take(limit) {
        let amount_str = if tx.is_expense() {
            format!("\x1b[31m-{}\x1b[0m", rupees(tx.amount)) // Red for expenses
        } else {
            format!("\x1b[32m+{}\x1b[0m", rupees(tx.amount)) // Green for income
        };
        let category = tx.category.map(|c| c.display_name()).unwrap_or("-");
        let marker = if tx.is_auto_detected() { "⚡" } else { " " };

        println!(
            "   {} {} │ {:>14} │ {:<13} │ {}",
            marker,
            tx.date.format("%Y-%m-%d"),
            amount_str,
            category,
            truncate(&tx.description, 35)
        );
    }

    if transactions.len() > limit {
        println!();
        println!("   ... {} more (use --limit to show more)", transactions.len() - limit);
    }

    Ok(())
}

pub fn cmd_delete(ledger: &Ledger, id: &str) -> Result<()> {
    let tx = ledger
        .get_transaction(id)
        .ok_or_else(|| anyhow!("Transaction {} not found", id))?;

    ledger.delete_transaction(id)?;

    println!("✅ Deleted transaction {}:", id);
    println!(
        "   {} │ {} │ {}",
        tx.date.format("%Y-%m-%d"),
        rupees(tx.amount),
        truncate(&tx.description, 40)
    );

    Ok(())
}

pub fn cmd_classify(description: &str, merchant: &str) -> Result<()> {
    let category = MerchantClassifier::new().classify(description, merchant);
    let recurrence = RecurrenceDetector::new().detect(description, merchant);

    println!("Category:   {} ({})", category.display_name(), category);
    match recurrence {
        Some(tag) => println!("Recurrence: {} (matched {})", tag.frequency, tag.pattern),
        None => println!("Recurrence: none"),
    }

    Ok(())
}
