//! Typed records over a key-value store
//!
//! Reads never fail on bad data: a missing or unparseable value is logged and
//! replaced by its default, and individually malformed transactions are
//! skipped. Writes propagate storage errors.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::dedup::ProcessedIds;
use crate::error::{Error, Result};
use crate::models::{
    Budget, Category, NewSavingsGoal, NewTransaction, SavingsGoal, Transaction, TransactionKind,
    TransactionSource,
};
use crate::settings::DetectionSettings;
use crate::storage::{keys, KeyValueStore};

/// Everything a user owns, as written by `export`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportSnapshot {
    pub transactions: Vec<Transaction>,
    pub budget: Budget,
    pub savings_goals: Vec<SavingsGoal>,
    pub export_date: DateTime<Utc>,
}

/// Typed access to persisted application state
#[derive(Clone)]
pub struct Ledger {
    store: Arc<dyn KeyValueStore>,
}

impl Ledger {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    // ========== Raw JSON helpers ==========

    fn read_raw(&self, key: &str) -> Option<String> {
        match self.store.get(key) {
            Ok(value) => value,
            Err(e) => {
                warn!(key, error = %e, "Failed to read stored value, using default");
                None
            }
        }
    }

    fn read_or_default<T: DeserializeOwned + Default>(&self, key: &str) -> T {
        let Some(raw) = self.read_raw(key) else {
            return T::default();
        };
        match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(e) => {
                warn!(key, error = %e, "Stored value is malformed, using default");
                T::default()
            }
        }
    }

    fn write<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let json = serde_json::to_string(value)?;
        self.store.set(key, &json)
    }

    // ========== Transactions ==========

    /// All transactions in insertion order
    pub fn transactions(&self) -> Vec<Transaction> {
        decode_transactions(self.read_raw(keys::TRANSACTIONS))
    }

    /// Change the stored transaction list in one store-level update
    ///
    /// Concurrent writers (another `paisa` process on the same database)
    /// cannot interleave between the read and the write.
    fn update_transactions<R>(
        &self,
        mut change: impl FnMut(&mut Vec<Transaction>) -> Result<R>,
    ) -> Result<R> {
        let mut outcome = None;
        self.store.update(keys::TRANSACTIONS, &mut |raw| {
            let mut transactions = decode_transactions(raw);
            outcome = Some(change(&mut transactions)?);
            Ok(serde_json::to_string(&transactions)?)
        })?;
        outcome.ok_or_else(|| Error::Storage("transaction update did not run".to_string()))
    }

    pub fn get_transaction(&self, id: &str) -> Option<Transaction> {
        self.transactions().into_iter().find(|t| t.id == id)
    }

    /// Append a fully-formed transaction; ids must be unique
    pub fn append_transaction(&self, transaction: &Transaction) -> Result<()> {
        validate_amount(transaction.amount)?;

        self.update_transactions(|transactions| {
            if transactions.iter().any(|t| t.id == transaction.id) {
                return Err(Error::DuplicateId(transaction.id.clone()));
            }
            transactions.push(transaction.clone());
            Ok(())
        })?;

        debug!(id = %transaction.id, kind = %transaction.kind, "Transaction stored");
        Ok(())
    }

    /// Record a hand-entered transaction as-is (no classification)
    pub fn add_manual_transaction(
        &self,
        new: NewTransaction,
        now: DateTime<Utc>,
    ) -> Result<Transaction> {
        validate_amount(new.amount)?;

        let category = match new.kind {
            TransactionKind::Expense => Some(new.category.unwrap_or(Category::Others)),
            TransactionKind::Income => None,
        };

        // The id is picked inside the update so a concurrent writer can't take it
        let transaction = self.update_transactions(|transactions| {
            let id = unique_id("txn", now, |candidate| {
                transactions.iter().any(|t| t.id == candidate)
            });
            let transaction = Transaction {
                id,
                kind: new.kind,
                amount: new.amount,
                description: new.description.clone(),
                merchant: new.merchant.clone(),
                date: new.date,
                category,
                recurrence: None,
                source: TransactionSource::Manual,
                payment_method: new.payment_method.clone(),
                recorded_at: Some(now),
            };
            transactions.push(transaction.clone());
            Ok(transaction)
        })?;

        info!(id = %transaction.id, amount = transaction.amount, "Manual transaction added");
        Ok(transaction)
    }

    /// Delete by id; returns whether anything was removed
    pub fn delete_transaction(&self, id: &str) -> Result<bool> {
        self.update_transactions(|transactions| {
            let before = transactions.len();
            transactions.retain(|t| t.id != id);
            Ok(transactions.len() != before)
        })
    }

    // ========== Budget ==========

    pub fn budget(&self) -> Budget {
        self.read_or_default(keys::BUDGET)
    }

    pub fn save_budget(&self, budget: &Budget) -> Result<()> {
        self.write(keys::BUDGET, budget)
    }

    pub fn set_monthly_budget(&self, amount: f64) -> Result<Budget> {
        validate_amount(amount)?;
        let mut budget = self.budget();
        budget.monthly = amount;
        self.save_budget(&budget)?;
        Ok(budget)
    }

    /// Set a category cap; zero clears it
    pub fn set_category_limit(&self, category: Category, limit: f64) -> Result<Budget> {
        validate_amount(limit)?;
        let mut budget = self.budget();
        if limit == 0.0 {
            budget.category_limits.remove(&category);
        } else {
            budget.category_limits.insert(category, limit);
        }
        self.save_budget(&budget)?;
        Ok(budget)
    }

    // ========== Savings goals ==========

    pub fn goals(&self) -> Vec<SavingsGoal> {
        self.read_or_default(keys::SAVINGS_GOALS)
    }

    pub fn save_goals(&self, goals: &[SavingsGoal]) -> Result<()> {
        self.write(keys::SAVINGS_GOALS, goals)
    }

    pub fn add_goal(&self, new: NewSavingsGoal, now: DateTime<Utc>) -> Result<SavingsGoal> {
        let name = new.name.trim();
        if name.is_empty() {
            return Err(Error::InvalidData("Goal name is required".to_string()));
        }
        if !new.target_amount.is_finite() || new.target_amount <= 0.0 {
            return Err(Error::InvalidData(format!(
                "Goal target must be positive, got {}",
                new.target_amount
            )));
        }

        let mut goals = self.goals();
        let id = unique_id("goal", now, |candidate| {
            goals.iter().any(|g| g.id == candidate)
        });
        let goal = SavingsGoal {
            id,
            name: name.to_string(),
            target_amount: new.target_amount,
            target_date: new.target_date,
            completed: false,
            created_at: now,
        };
        goals.push(goal.clone());
        self.save_goals(&goals)?;
        Ok(goal)
    }

    pub fn delete_goal(&self, id: &str) -> Result<bool> {
        let mut goals = self.goals();
        let before = goals.len();
        goals.retain(|g| g.id != id);
        if goals.len() == before {
            return Ok(false);
        }
        self.save_goals(&goals)?;
        Ok(true)
    }

    pub fn complete_goal(&self, id: &str) -> Result<SavingsGoal> {
        let mut goals = self.goals();
        let goal = goals
            .iter_mut()
            .find(|g| g.id == id)
            .ok_or_else(|| Error::NotFound(format!("savings goal {}", id)))?;
        goal.completed = true;
        let updated = goal.clone();
        self.save_goals(&goals)?;
        Ok(updated)
    }

    // ========== Detection state ==========

    pub fn settings(&self) -> DetectionSettings {
        self.read_or_default(keys::DETECTION_SETTINGS)
    }

    pub fn save_settings(&self, settings: &DetectionSettings) -> Result<()> {
        self.write(keys::DETECTION_SETTINGS, settings)
    }

    pub fn consent(&self) -> bool {
        self.read_or_default(keys::DETECTION_CONSENT)
    }

    pub fn save_consent(&self, consent: bool) -> Result<()> {
        self.write(keys::DETECTION_CONSENT, &consent)
    }

    pub fn processed_ids(&self) -> ProcessedIds {
        let ids: Vec<String> = self.read_or_default(keys::PROCESSED_IDS);
        ids.into_iter().collect()
    }

    pub fn save_processed_ids(&self, ids: &ProcessedIds) -> Result<()> {
        self.write(keys::PROCESSED_IDS, ids.as_slice())
    }

    pub fn clear_processed_ids(&self) -> Result<()> {
        self.store.remove(keys::PROCESSED_IDS)
    }

    // ========== Export ==========

    pub fn export(&self, now: DateTime<Utc>) -> ExportSnapshot {
        ExportSnapshot {
            transactions: self.transactions(),
            budget: self.budget(),
            savings_goals: self.goals(),
            export_date: now,
        }
    }

    pub fn export_json(&self, now: DateTime<Utc>) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.export(now))?)
    }
}

/// Parse the stored transaction array, skipping malformed records
fn decode_transactions(raw: Option<String>) -> Vec<Transaction> {
    let Some(raw) = raw else {
        return Vec::new();
    };
    let values: Vec<serde_json::Value> = match serde_json::from_str(&raw) {
        Ok(values) => values,
        Err(e) => {
            warn!(
                key = keys::TRANSACTIONS,
                error = %e,
                "Stored value is malformed, using default"
            );
            return Vec::new();
        }
    };
    values
        .into_iter()
        .enumerate()
        .filter_map(|(index, value)| match serde_json::from_value(value) {
            Ok(tx) => Some(tx),
            Err(e) => {
                warn!(index, error = %e, "Skipping malformed stored transaction");
                None
            }
        })
        .collect()
}

fn validate_amount(amount: f64) -> Result<()> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(Error::InvalidData(format!(
            "Amount must be a non-negative number, got {}",
            amount
        )));
    }
    Ok(())
}

/// `{prefix}_{millis}`, bumped until it is not taken
fn unique_id(prefix: &str, now: DateTime<Utc>, taken: impl Fn(&str) -> bool) -> String {
    let mut millis = now.timestamp_millis();
    loop {
        let candidate = format!("{}_{}", prefix, millis);
        if !taken(&candidate) {
            return candidate;
        }
        millis += 1;
    }
}
