//! Budget and savings goal commands

use anyhow::{anyhow, bail, Result};
use paisa_core::reports::{budget_overview, goal_progress, BudgetLine};
use paisa_core::{BudgetStatus, Category, Clock, Ledger, NewSavingsGoal};

use super::{parse_date, rupees, truncate};

fn status_icon(status: BudgetStatus) -> &'static str {
    match status {
        BudgetStatus::Good => "🟢",
        BudgetStatus::Warning => "🟡",
        BudgetStatus::Overspent => "🔴",
    }
}

fn print_budget_line(label: &str, line: &BudgetLine) {
    println!(
        "   {} {:<14} {:>12} of {:>12}  ({:.1}% used, {} left)",
        status_icon(line.status),
        label,
        rupees(line.spent),
        rupees(line.limit),
        line.used_percent,
        rupees(line.remaining)
    );
}

pub fn cmd_budget_show(ledger: &Ledger, clock: &dyn Clock) -> Result<()> {
    let budget = ledger.budget();
    let overview = budget_overview(&ledger.transactions(), &budget, clock.today());

    println!();
    println!("💰 Budget for {}", clock.today().format("%B %Y"));
    println!("   ─────────────────────────────────────────────────────────────");

    if budget.monthly <= 0.0 && overview.categories.is_empty() {
        println!("   No budget set. Set one with:");
        println!("     paisa budget set 30000");
        return Ok(());
    }

    print_budget_line("Monthly", &overview.monthly);

    if !overview.categories.is_empty() {
        println!();
        for line in &overview.categories {
            let label = line.category.map(|c| c.display_name()).unwrap_or("-");
            print_budget_line(label, line);
        }
    }

    Ok(())
}

pub fn cmd_budget_set(ledger: &Ledger, amount: f64) -> Result<()> {
    let budget = ledger.set_monthly_budget(amount)?;
    if budget.monthly > 0.0 {
        println!("✅ Monthly budget set to {}", rupees(budget.monthly));
    } else {
        println!("✅ Monthly budget cleared");
    }
    Ok(())
}

pub fn cmd_budget_limit(ledger: &Ledger, category: &str, amount: f64) -> Result<()> {
    let category: Category = category.parse().map_err(|e: String| anyhow!(e))?;
    ledger.set_category_limit(category, amount)?;
    if amount > 0.0 {
        println!("✅ {} limit set to {}", category.display_name(), rupees(amount));
    } else {
        println!("✅ {} limit removed", category.display_name());
    }
    Ok(())
}

pub fn cmd_goals_list(ledger: &Ledger, clock: &dyn Clock) -> Result<()> {
    let goals = ledger.goals();
    if goals.is_empty() {
        println!("No savings goals yet. Add one with:");
        println!("  paisa goals add \"Emergency fund\" 50000 2027-03-31");
        return Ok(());
    }

    let progress = goal_progress(&ledger.transactions(), &goals, clock.today());

    println!();
    println!("🎯 Savings Goals");
    println!("   ─────────────────────────────────────────────────────────────");

    for item in &progress {
        let goal = &item.goal;
        let marker = if goal.completed { "✓" } else { "○" };
        let due = if goal.completed {
            "completed".to_string()
        } else if item.days_left > 0 {
            format!("{} days left", item.days_left)
        } else {
            "past due".to_string()
        };

        println!(
            "   {} {:<24} {:>12}  {:>5.1}%  {} to go, {}",
            marker,
            truncate(&goal.name, 24),
            rupees(goal.target_amount),
            item.progress,
            rupees(item.remaining),
            due
        );
        println!("     {} │ due {}", goal.id, goal.target_date);
    }

    Ok(())
}

pub fn cmd_goals_add(
    ledger: &Ledger,
    clock: &dyn Clock,
    name: &str,
    amount: f64,
    date: &str,
) -> Result<()> {
    let target_date = parse_date(date)?;
    let goal = ledger.add_goal(
        NewSavingsGoal {
            name: name.to_string(),
            target_amount: amount,
            target_date,
        },
        clock.now(),
    )?;

    println!(
        "✅ Added goal \"{}\" ({} by {}) as {}",
        goal.name,
        rupees(goal.target_amount),
        goal.target_date,
        goal.id
    );
    Ok(())
}

pub fn cmd_goals_delete(ledger: &Ledger, id: &str) -> Result<()> {
    if !ledger.delete_goal(id)? {
        bail!("Savings goal {} not found", id);
    }
    println!("✅ Deleted savings goal {}", id);
    Ok(())
}

pub fn cmd_goals_complete(ledger: &Ledger, id: &str) -> Result<()> {
    let goal = ledger.complete_goal(id)?;
    println!("🎉 Marked \"{}\" as completed", goal.name);
    Ok(())
}
