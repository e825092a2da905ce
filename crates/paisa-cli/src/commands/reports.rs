//! Summary, report, insights and export commands

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use paisa_core::insights::{budget_warnings, spending_insights, suggestions};
use paisa_core::reports::{category_breakdown, expense_summary, month_comparison, summary};
use paisa_core::{generate_insights, Advice, Clock, Ledger, Period, Priority, Tone};

use super::rupees;

pub fn cmd_summary(ledger: &Ledger) -> Result<()> {
    let transactions = ledger.transactions();
    let goals = ledger.goals();
    let totals = summary(&transactions, &goals);

    println!();
    println!("📊 Paisa Summary");
    println!("   ─────────────────────────────────────────");
    println!("   Income:        {:>14}", rupees(totals.total_income));
    println!("   Expenses:      {:>14}", rupees(totals.total_expenses));
    println!("   Balance:       {:>14}", rupees(totals.balance));
    if !goals.is_empty() {
        println!("   Savings goal:  {:>13.1}%", totals.savings_progress);
    }
    println!();
    println!(
        "   {} transactions, {} savings goals",
        transactions.len(),
        goals.len()
    );

    Ok(())
}

pub fn cmd_report(ledger: &Ledger, clock: &dyn Clock, period: &str) -> Result<()> {
    let period: Period = period.parse().map_err(|e: String| anyhow!(e))?;
    let transactions = ledger.transactions();
    let today = clock.today();

    println!();
    println!("📈 Spending Report ({})", period);
    println!("   ─────────────────────────────────────────");

    match expense_summary(&transactions, period, today) {
        Some(s) => {
            println!("   Since {}:", period.start(today));
            println!("     Total:   {:>14}", rupees(s.total));
            println!("     Average: {:>14}", rupees(s.average));
            println!("     Count:   {:>14}", s.count);
        }
        None => println!("   No expenses since {}", period.start(today)),
    }

    let breakdown = category_breakdown(&transactions);
    if !breakdown.is_empty() {
        println!();
        println!("   Top categories:");
        for share in &breakdown {
            println!(
                "     {:<14} {:>14}  {:>5.1}%",
                share.category.display_name(),
                rupees(share.amount),
                share.percent
            );
        }
    }

    let comparison = month_comparison(&transactions, today);
    println!();
    println!("   Month over month:");
    println!("     Last month:    {:>14}", rupees(comparison.last_month));
    println!("     This month:    {:>14}", rupees(comparison.current_month));
    let sign = if comparison.change >= 0.0 { "+" } else { "-" };
    println!(
        "     Change:       {}{:>13} ({}{:.1}%)",
        sign,
        rupees(comparison.change.abs()),
        sign,
        comparison.change_percent.abs()
    );

    Ok(())
}

fn priority_icon(priority: Priority) -> &'static str {
    match priority {
        Priority::High => "❗",
        Priority::Medium => "•",
        Priority::Low => "·",
    }
}

fn tone_icon(tone: Tone) -> &'static str {
    match tone {
        Tone::Info => "💡",
        Tone::Success => "✅",
        Tone::Warning => "⚠️",
        Tone::Danger => "🚨",
    }
}

fn print_advice(header: &str, items: &[Advice]) {
    if items.is_empty() {
        return;
    }
    println!();
    println!("{}", header);
    println!("   ─────────────────────────────────────────");
    for item in items {
        println!("   {} {}", tone_icon(item.tone), item.title);
        println!("      {}", item.message);
    }
}

pub fn cmd_insights(ledger: &Ledger, clock: &dyn Clock) -> Result<()> {
    let transactions = ledger.transactions();
    let budget = ledger.budget();
    let goals = ledger.goals();

    let detected = generate_insights(&transactions);
    let spending = spending_insights(&transactions);
    let warnings = budget_warnings(&transactions, &budget, clock.today());
    let next_steps = suggestions(&transactions, &budget, &goals);

    if detected.is_empty() && spending.is_empty() && warnings.is_empty() && next_steps.is_empty()
    {
        println!("Nothing to report yet. Add some transactions first.");
        return Ok(());
    }

    if !detected.is_empty() {
        println!();
        println!("🔍 Detection Insights");
        println!("   ─────────────────────────────────────────");
        for insight in &detected {
            println!("   {} {}", priority_icon(insight.priority), insight.title);
            println!("      {}", insight.message);
        }
    }

    print_advice("💸 Spending", &spending);
    print_advice("⚠️  Budget Warnings", &warnings);
    print_advice("💡 Suggestions", &next_steps);

    Ok(())
}

pub fn cmd_export(ledger: &Ledger, clock: &dyn Clock, output: Option<&Path>) -> Result<()> {
    let json = ledger.export_json(clock.now())?;

    match output {
        Some(path) => {
            std::fs::write(path, &json)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            let count = ledger.transactions().len();
            println!("✅ Exported {} transactions to {}", count, path.display());
        }
        None => println!("{}", json),
    }

    Ok(())
}
