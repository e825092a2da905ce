//! Insights over auto-detected transactions
//!
//! Produced in a fixed order: top category, top merchant, recurring
//! payments, detection efficiency. The first three look only at
//! auto-detected transactions and are omitted when there is nothing to say.
//! When two keys have the same total, the one encountered first wins.

use crate::models::Transaction;

use super::types::{Insight, InsightKind, Priority};

pub fn generate_insights(transactions: &[Transaction]) -> Vec<Insight> {
    let detected: Vec<&Transaction> = transactions
        .iter()
        .filter(|t| t.is_auto_detected())
        .collect();
    let mut insights = Vec::new();

    let by_category = top_total(
        detected
            .iter()
            .filter(|t| t.is_expense())
            .map(|t| (t.effective_category(), t.amount)),
    );
    if let Some((category, sum)) = by_category {
        insights.push(Insight::new(
            InsightKind::SpendingPattern,
            Priority::High,
            format!("You spend most on {} (₹{:.2})", category, sum),
        ));
    }

    let by_merchant = top_total(
        detected
            .iter()
            .filter(|t| t.is_expense())
            .map(|t| (t.merchant.as_str(), t.amount)),
    );
    if let Some((merchant, sum)) = by_merchant {
        insights.push(Insight::new(
            InsightKind::MerchantPattern,
            Priority::Medium,
            format!("Your highest spending is at {} (₹{:.2})", merchant, sum),
        ));
    }

    let recurring: Vec<&&Transaction> = detected
        .iter()
        .filter(|t| t.recurrence.is_some())
        .collect();
    if !recurring.is_empty() {
        let sum: f64 = recurring.iter().map(|t| t.amount).sum();
        insights.push(Insight::new(
            InsightKind::RecurringSummary,
            Priority::Medium,
            format!(
                "You have {} recurring payments totaling ₹{:.2} per month",
                recurring.len(),
                sum
            ),
        ));
    }

    if !transactions.is_empty() {
        let efficiency = detected.len() as f64 / transactions.len() as f64 * 100.0;
        insights.push(Insight::new(
            InsightKind::Efficiency,
            Priority::Low,
            format!("{:.1}% of your transactions were automatically detected", efficiency),
        ));
    }

    insights
}

/// Key with the strictly greatest summed amount; ties keep the first key seen
fn top_total<K: PartialEq>(entries: impl Iterator<Item = (K, f64)>) -> Option<(K, f64)> {
    let mut totals: Vec<(K, f64)> = Vec::new();
    for (key, amount) in entries {
        match totals.iter_mut().find(|(k, _)| *k == key) {
            Some((_, sum)) => *sum += amount,
            None => totals.push((key, amount)),
        }
    }

    let mut best: Option<(K, f64)> = None;
    for (key, sum) in totals {
        if best.as_ref().map_or(true, |(_, top)| sum > *top) {
            best = Some((key, sum));
        }
    }
    best
}
