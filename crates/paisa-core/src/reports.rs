//! Ledger reports: totals, budget usage, period summaries, comparisons
//!
//! Every function is a pure computation over a slice of transactions, so the
//! caller decides where "today" is. Calendar windows use the UTC date of each
//! transaction.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;

use crate::models::{Budget, Category, SavingsGoal, Transaction, TransactionKind};

/// Number of categories shown by [`category_breakdown`]
pub const TOP_CATEGORIES: usize = 5;

/// Usage above this percentage is a warning
pub const WARNING_THRESHOLD: f64 = 80.0;

// ========== Totals ==========

/// All-time income, expenses, and progress toward the active goal
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub total_income: f64,
    pub total_expenses: f64,
    pub balance: f64,
    /// Percent of the first incomplete goal covered by the balance
    pub savings_progress: f64,
}

pub fn summary(transactions: &[Transaction], goals: &[SavingsGoal]) -> Summary {
    let total_income = total(transactions, TransactionKind::Income);
    let total_expenses = total(transactions, TransactionKind::Expense);
    let balance = total_income - total_expenses;

    let savings_progress = if goals.is_empty() {
        0.0
    } else {
        match goals.iter().find(|g| !g.completed) {
            Some(goal) => goal_percent(balance, goal.target_amount),
            None => 100.0,
        }
    };

    Summary {
        total_income,
        total_expenses,
        balance,
        savings_progress,
    }
}

/// Income minus expenses over all time
pub fn balance(transactions: &[Transaction]) -> f64 {
    total(transactions, TransactionKind::Income) - total(transactions, TransactionKind::Expense)
}

fn total(transactions: &[Transaction], kind: TransactionKind) -> f64 {
    transactions
        .iter()
        .filter(|t| t.kind == kind)
        .map(|t| t.amount)
        .sum()
}

fn goal_percent(balance: f64, target: f64) -> f64 {
    if target <= 0.0 {
        return 100.0;
    }
    (balance / target * 100.0).min(100.0)
}

// ========== Calendar windows ==========

fn same_month(date: NaiveDate, year: i32, month: u32) -> bool {
    date.year() == year && date.month() == month
}

fn month_total(
    transactions: &[Transaction],
    kind: TransactionKind,
    year: i32,
    month: u32,
    category: Option<Category>,
) -> f64 {
    transactions
        .iter()
        .filter(|t| t.kind == kind && same_month(t.date.date_naive(), year, month))
        .filter(|t| category.map_or(true, |c| t.effective_category() == c))
        .map(|t| t.amount)
        .sum()
}

/// (year, month) of the month before `today`
fn previous_month(today: NaiveDate) -> (i32, u32) {
    if today.month() == 1 {
        (today.year() - 1, 12)
    } else {
        (today.year(), today.month() - 1)
    }
}

pub fn current_month_expenses(transactions: &[Transaction], today: NaiveDate) -> f64 {
    month_total(
        transactions,
        TransactionKind::Expense,
        today.year(),
        today.month(),
        None,
    )
}

pub fn current_month_income(transactions: &[Transaction], today: NaiveDate) -> f64 {
    month_total(
        transactions,
        TransactionKind::Income,
        today.year(),
        today.month(),
        None,
    )
}

pub fn last_month_expenses(transactions: &[Transaction], today: NaiveDate) -> f64 {
    let (year, month) = previous_month(today);
    month_total(transactions, TransactionKind::Expense, year, month, None)
}

/// Current-month expenses in one category
pub fn category_month_expenses(
    transactions: &[Transaction],
    category: Category,
    today: NaiveDate,
) -> f64 {
    month_total(
        transactions,
        TransactionKind::Expense,
        today.year(),
        today.month(),
        Some(category),
    )
}

/// Expense totals per category, in first-seen order
pub(crate) fn expense_totals_by_category(transactions: &[Transaction]) -> Vec<(Category, f64)> {
    let mut totals: Vec<(Category, f64)> = Vec::new();
    for t in transactions.iter().filter(|t| t.is_expense()) {
        let category = t.effective_category();
        match totals.iter_mut().find(|(c, _)| *c == category) {
            Some((_, sum)) => *sum += t.amount,
            None => totals.push((category, t.amount)),
        }
    }
    totals
}

/// Sort by amount, largest first; equal amounts keep their order
pub(crate) fn sort_descending<K>(totals: &mut [(K, f64)]) {
    totals.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
}

// ========== Budget ==========

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetStatus {
    Good,
    Warning,
    Overspent,
}

impl BudgetStatus {
    pub fn from_used_percent(used: f64) -> Self {
        if used > 100.0 {
            BudgetStatus::Overspent
        } else if used > WARNING_THRESHOLD {
            BudgetStatus::Warning
        } else {
            BudgetStatus::Good
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BudgetStatus::Good => "good",
            BudgetStatus::Warning => "warning",
            BudgetStatus::Overspent => "overspent",
        }
    }
}

impl fmt::Display for BudgetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Spending against one limit for the current month
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetLine {
    /// `None` for the overall monthly budget
    pub category: Option<Category>,
    pub spent: f64,
    pub limit: f64,
    pub remaining: f64,
    pub used_percent: f64,
    pub status: BudgetStatus,
}

impl BudgetLine {
    fn new(category: Option<Category>, spent: f64, limit: f64) -> Self {
        let used_percent = if limit > 0.0 {
            spent / limit * 100.0
        } else {
            0.0
        };
        Self {
            category,
            spent,
            limit,
            remaining: limit - spent,
            used_percent,
            status: BudgetStatus::from_used_percent(used_percent),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetOverview {
    pub monthly: BudgetLine,
    /// Only categories with a positive limit, in category order
    pub categories: Vec<BudgetLine>,
}

pub fn budget_overview(
    transactions: &[Transaction],
    budget: &Budget,
    today: NaiveDate,
) -> BudgetOverview {
    let monthly = BudgetLine::new(
        None,
        current_month_expenses(transactions, today),
        budget.monthly,
    );

    let categories = Category::ALL
        .into_iter()
        .filter_map(|category| {
            let limit = budget.limit_for(category)?;
            let spent = category_month_expenses(transactions, category, today);
            Some(BudgetLine::new(Some(category), spent, limit))
        })
        .collect();

    BudgetOverview {
        monthly,
        categories,
    }
}

// ========== Periods ==========

/// Reporting window ending today
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    /// Today only
    Daily,
    /// Since the most recent Sunday
    Weekly,
    /// Since the 1st of the month
    Monthly,
}

impl Period {
    pub fn as_str(&self) -> &'static str {
        match self {
            Period::Daily => "daily",
            Period::Weekly => "weekly",
            Period::Monthly => "monthly",
        }
    }

    /// First day included in the window
    pub fn start(&self, today: NaiveDate) -> NaiveDate {
        match self {
            Period::Daily => today,
            Period::Weekly => {
                today - Duration::days(i64::from(today.weekday().num_days_from_sunday()))
            }
            Period::Monthly => today.with_day(1).unwrap_or(today),
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Period {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "daily" | "day" => Ok(Period::Daily),
            "weekly" | "week" => Ok(Period::Weekly),
            "monthly" | "month" => Ok(Period::Monthly),
            _ => Err(format!("Unknown period: {}", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpenseSummary {
    pub period: Period,
    pub total: f64,
    /// Mean amount per expense
    pub average: f64,
    pub count: usize,
}

/// Expenses dated on or after the period start; `None` when there are none
pub fn expense_summary(
    transactions: &[Transaction],
    period: Period,
    today: NaiveDate,
) -> Option<ExpenseSummary> {
    let start = period.start(today);
    let amounts: Vec<f64> = transactions
        .iter()
        .filter(|t| t.is_expense() && t.date.date_naive() >= start)
        .map(|t| t.amount)
        .collect();

    if amounts.is_empty() {
        return None;
    }

    let total: f64 = amounts.iter().sum();
    Some(ExpenseSummary {
        period,
        total,
        average: total / amounts.len() as f64,
        count: amounts.len(),
    })
}

// ========== Categories and months ==========

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryShare {
    pub category: Category,
    pub amount: f64,
    /// Share of all expenses
    pub percent: f64,
}

/// Largest expense categories over all time
pub fn category_breakdown(transactions: &[Transaction]) -> Vec<CategoryShare> {
    let mut totals = expense_totals_by_category(transactions);
    let grand_total: f64 = totals.iter().map(|(_, amount)| amount).sum();
    sort_descending(&mut totals);

    totals
        .into_iter()
        .take(TOP_CATEGORIES)
        .map(|(category, amount)| CategoryShare {
            category,
            amount,
            percent: if grand_total > 0.0 {
                amount / grand_total * 100.0
            } else {
                0.0
            },
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthComparison {
    pub last_month: f64,
    pub current_month: f64,
    pub change: f64,
    /// 0 when last month had no expenses
    pub change_percent: f64,
}

pub fn month_comparison(transactions: &[Transaction], today: NaiveDate) -> MonthComparison {
    let last_month = last_month_expenses(transactions, today);
    let current_month = current_month_expenses(transactions, today);
    let change = current_month - last_month;

    MonthComparison {
        last_month,
        current_month,
        change,
        change_percent: if last_month > 0.0 {
            change / last_month * 100.0
        } else {
            0.0
        },
    }
}

// ========== Goals ==========

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GoalProgress {
    pub goal: SavingsGoal,
    /// Percent of the target covered by the current balance, capped at 100
    pub progress: f64,
    pub remaining: f64,
    /// Days until the target date; zero or negative once it has passed
    pub days_left: i64,
}

pub fn goal_progress(
    transactions: &[Transaction],
    goals: &[SavingsGoal],
    today: NaiveDate,
) -> Vec<GoalProgress> {
    let balance = balance(transactions);

    goals
        .iter()
        .map(|goal| GoalProgress {
            goal: goal.clone(),
            progress: goal_percent(balance, goal.target_amount),
            remaining: (goal.target_amount - balance).max(0.0),
            days_left: (goal.target_date - today).num_days(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TransactionSource;
    use chrono::{TimeZone, Utc};

    fn tx(
        kind: TransactionKind,
        amount: f64,
        category: Option<Category>,
        date: NaiveDate,
    ) -> Transaction {
        Transaction {
            id: format!("t_{}_{}", date, amount),
            kind,
            amount,
            description: String::new(),
            merchant: String::new(),
            date: Utc.from_utc_datetime(&date.and_hms_opt(10, 0, 0).unwrap()),
            category,
            recurrence: None,
            source: TransactionSource::Manual,
            payment_method: None,
            recorded_at: None,
        }
    }

    fn expense(amount: f64, category: Category, date: NaiveDate) -> Transaction {
        tx(TransactionKind::Expense, amount, Some(category), date)
    }

    fn income(amount: f64, date: NaiveDate) -> Transaction {
        tx(TransactionKind::Income, amount, None, date)
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn goal(name: &str, target: f64, completed: bool) -> SavingsGoal {
        SavingsGoal {
            id: format!("goal_{}", name),
            name: name.to_string(),
            target_amount: target,
            target_date: day(2026, 12, 31),
            completed,
            created_at: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_summary_savings_progress() {
        let today = day(2026, 5, 10);
        let txs = vec![income(10_000.0, today), expense(4_000.0, Category::Rent, today)];

        let s = summary(&txs, &[]);
        assert_eq!(s.balance, 6_000.0);
        assert_eq!(s.savings_progress, 0.0);

        let s = summary(&txs, &[goal("trip", 12_000.0, false)]);
        assert_eq!(s.savings_progress, 50.0);

        let s = summary(&txs, &[goal("phone", 3_000.0, false)]);
        assert_eq!(s.savings_progress, 100.0);

        let s = summary(&txs, &[goal("done", 1.0, true)]);
        assert_eq!(s.savings_progress, 100.0);

        // First incomplete goal wins
        let s = summary(
            &txs,
            &[goal("done", 1.0, true), goal("car", 60_000.0, false)],
        );
        assert_eq!(s.savings_progress, 10.0);
    }

    #[test]
    fn test_budget_status_thresholds() {
        assert_eq!(BudgetStatus::from_used_percent(80.0), BudgetStatus::Good);
        assert_eq!(BudgetStatus::from_used_percent(80.5), BudgetStatus::Warning);
        assert_eq!(BudgetStatus::from_used_percent(100.0), BudgetStatus::Warning);
        assert_eq!(BudgetStatus::from_used_percent(100.1), BudgetStatus::Overspent);
    }

    #[test]
    fn test_budget_overview_current_month_only() {
        let today = day(2026, 5, 20);
        let txs = vec![
            expense(900.0, Category::Food, day(2026, 5, 2)),
            expense(5_000.0, Category::Food, day(2026, 4, 30)),
            expense(100.0, Category::Transport, day(2026, 5, 3)),
        ];
        let mut budget = Budget {
            monthly: 1_000.0,
            ..Default::default()
        };
        budget.category_limits.insert(Category::Food, 800.0);
        budget.category_limits.insert(Category::Transport, 0.0);

        let overview = budget_overview(&txs, &budget, today);
        assert_eq!(overview.monthly.spent, 1_000.0);
        assert_eq!(overview.monthly.remaining, 0.0);
        assert_eq!(overview.monthly.status, BudgetStatus::Warning);

        assert_eq!(overview.categories.len(), 1);
        let food = &overview.categories[0];
        assert_eq!(food.category, Some(Category::Food));
        assert_eq!(food.status, BudgetStatus::Overspent);
    }

    #[test]
    fn test_zero_budget_reports_zero_used() {
        let today = day(2026, 5, 20);
        let txs = vec![expense(500.0, Category::Food, today)];
        let overview = budget_overview(&txs, &Budget::default(), today);
        assert_eq!(overview.monthly.used_percent, 0.0);
        assert_eq!(overview.monthly.status, BudgetStatus::Good);
        assert_eq!(overview.monthly.remaining, -500.0);
    }

    #[test]
    fn test_period_starts() {
        // 2026-05-13 is a Wednesday
        let today = day(2026, 5, 13);
        assert_eq!(Period::Daily.start(today), today);
        assert_eq!(Period::Weekly.start(today), day(2026, 5, 10));
        assert_eq!(Period::Monthly.start(today), day(2026, 5, 1));

        let sunday = day(2026, 5, 10);
        assert_eq!(Period::Weekly.start(sunday), sunday);
        assert_eq!("week".parse::<Period>().unwrap(), Period::Weekly);
        assert!("fortnight".parse::<Period>().is_err());
    }

    #[test]
    fn test_expense_summary() {
        let today = day(2026, 5, 13);
        let txs = vec![
            expense(300.0, Category::Food, today),
            expense(100.0, Category::Food, day(2026, 5, 11)),
            expense(999.0, Category::Food, day(2026, 5, 9)),
            income(5_000.0, today),
        ];

        let daily = expense_summary(&txs, Period::Daily, today).unwrap();
        assert_eq!(daily.count, 1);
        assert_eq!(daily.total, 300.0);

        let weekly = expense_summary(&txs, Period::Weekly, today).unwrap();
        assert_eq!(weekly.count, 2);
        assert_eq!(weekly.average, 200.0);

        let monthly = expense_summary(&txs, Period::Monthly, today).unwrap();
        assert_eq!(monthly.count, 3);

        assert!(expense_summary(&[], Period::Monthly, today).is_none());
    }

    #[test]
    fn test_category_breakdown_top_five() {
        let today = day(2026, 5, 13);
        let txs: Vec<Transaction> = [
            (Category::Food, 600.0),
            (Category::Rent, 1_000.0),
            (Category::Transport, 100.0),
            (Category::Bills, 100.0),
            (Category::Health, 50.0),
            (Category::Education, 25.0),
            (Category::Food, 100.0),
        ]
        .into_iter()
        .map(|(c, a)| expense(a, c, today))
        .collect();

        let breakdown = category_breakdown(&txs);
        assert_eq!(breakdown.len(), 5);
        assert_eq!(breakdown[0].category, Category::Rent);
        assert_eq!(breakdown[1].category, Category::Food);
        assert_eq!(breakdown[1].amount, 700.0);
        // Tie keeps first-seen order
        assert_eq!(breakdown[2].category, Category::Transport);
        assert_eq!(breakdown[3].category, Category::Bills);
        assert!((breakdown[0].percent - 1_000.0 / 1_975.0 * 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_month_comparison_across_year_boundary() {
        let today = day(2026, 1, 15);
        let txs = vec![
            expense(200.0, Category::Food, day(2025, 12, 31)),
            expense(300.0, Category::Food, day(2026, 1, 2)),
        ];
        let cmp = month_comparison(&txs, today);
        assert_eq!(cmp.last_month, 200.0);
        assert_eq!(cmp.current_month, 300.0);
        assert_eq!(cmp.change, 100.0);
        assert_eq!(cmp.change_percent, 50.0);

        let only_current = month_comparison(&txs[1..], today);
        assert_eq!(only_current.change_percent, 0.0);
    }

    #[test]
    fn test_goal_progress() {
        let today = day(2026, 12, 1);
        let txs = vec![income(2_500.0, today)];
        let progress = goal_progress(&txs, &[goal("laptop", 10_000.0, false)], today);

        assert_eq!(progress.len(), 1);
        assert_eq!(progress[0].progress, 25.0);
        assert_eq!(progress[0].remaining, 7_500.0);
        assert_eq!(progress[0].days_left, 30);
    }
}
