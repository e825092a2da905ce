//! Whole-ledger advice: spending observations, budget warnings, suggestions

use chrono::NaiveDate;

use crate::models::{Budget, Category, SavingsGoal, Transaction};
use crate::reports::{
    category_month_expenses, current_month_expenses, current_month_income,
    expense_totals_by_category, sort_descending,
};

use super::types::{Advice, Tone};

/// Highest-spending category and the share of fixed expenses
pub fn spending_insights(transactions: &[Transaction]) -> Vec<Advice> {
    let mut advice = Vec::new();

    if let Some((category, amount)) = top_category(transactions) {
        advice.push(Advice::new(
            Tone::Info,
            "Highest Spending Category",
            format!(
                "You spend the most on {} (₹{:.2})",
                category.display_name(),
                amount
            ),
        ));
    }

    let (fixed, variable) = transactions
        .iter()
        .filter(|t| t.is_expense())
        .fold((0.0, 0.0), |(fixed, variable), t| {
            if t.effective_category().is_fixed() {
                (fixed + t.amount, variable)
            } else {
                (fixed, variable + t.amount)
            }
        });
    let total = fixed + variable;
    if total > 0.0 {
        advice.push(Advice::new(
            Tone::Info,
            "Fixed vs Variable Expenses",
            format!(
                "{:.1}% of your expenses are fixed (₹{:.2})",
                fixed / total * 100.0,
                fixed
            ),
        ));
    }

    advice
}

/// Current-month overspending; empty when everything is within limits
pub fn budget_warnings(
    transactions: &[Transaction],
    budget: &Budget,
    today: NaiveDate,
) -> Vec<Advice> {
    let mut warnings = Vec::new();
    let expenses = current_month_expenses(transactions, today);
    let income = current_month_income(transactions, today);

    if expenses > income {
        warnings.push(Advice::new(
            Tone::Danger,
            "Expenses Exceed Income",
            format!(
                "Your expenses (₹{:.2}) are higher than your income (₹{:.2})",
                expenses, income
            ),
        ));
    }

    if budget.monthly > 0.0 && expenses > budget.monthly {
        warnings.push(Advice::new(
            Tone::Danger,
            "Budget Overspent",
            format!(
                "You've spent ₹{:.2} over your monthly budget",
                expenses - budget.monthly
            ),
        ));
    }

    for category in Category::ALL {
        let Some(limit) = budget.limit_for(category) else {
            continue;
        };
        let spent = category_month_expenses(transactions, category, today);
        if spent > limit {
            warnings.push(Advice::new(
                Tone::Warning,
                "Category Limit Exceeded",
                format!(
                    "{} spending (₹{:.2}) exceeds limit (₹{:.2})",
                    category.display_name(),
                    spent,
                    limit
                ),
            ));
        }
    }

    warnings
}

/// Next steps worth taking
pub fn suggestions(
    transactions: &[Transaction],
    budget: &Budget,
    goals: &[SavingsGoal],
) -> Vec<Advice> {
    let mut suggestions = Vec::new();

    if let Some((category, amount)) = top_category(transactions) {
        suggestions.push(Advice::new(
            Tone::Info,
            "Reduce Spending",
            format!(
                "Consider reducing {} expenses by 10-20% to save ₹{:.2} per month",
                category.display_name(),
                amount * 0.1
            ),
        ));
    }

    if goals.is_empty() {
        suggestions.push(Advice::new(
            Tone::Info,
            "Start Saving",
            "Set up a savings goal to build better financial habits",
        ));
    }

    if budget.monthly == 0.0 {
        suggestions.push(Advice::new(
            Tone::Info,
            "Set a Budget",
            "Create a monthly budget to better control your spending",
        ));
    }

    suggestions
}

fn top_category(transactions: &[Transaction]) -> Option<(Category, f64)> {
    let mut totals = expense_totals_by_category(transactions);
    sort_descending(&mut totals);
    totals.into_iter().next()
}
