//! Core types for insights and advice

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// What an auto-detection insight is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightKind {
    /// Top spending category
    SpendingPattern,
    /// Top merchant by spend
    MerchantPattern,
    /// Count and sum of recurring payments
    RecurringSummary,
    /// Share of transactions that were auto-detected
    Efficiency,
}

impl InsightKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            InsightKind::SpendingPattern => "spending_pattern",
            InsightKind::MerchantPattern => "merchant_pattern",
            InsightKind::RecurringSummary => "recurring_summary",
            InsightKind::Efficiency => "efficiency",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            InsightKind::SpendingPattern => "Top Spending Category",
            InsightKind::MerchantPattern => "Most Visited Merchant",
            InsightKind::RecurringSummary => "Recurring Payments",
            InsightKind::Efficiency => "Auto-Detection Efficiency",
        }
    }
}

impl fmt::Display for InsightKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for InsightKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "spending_pattern" => Ok(InsightKind::SpendingPattern),
            "merchant_pattern" => Ok(InsightKind::MerchantPattern),
            "recurring_summary" => Ok(InsightKind::RecurringSummary),
            "efficiency" => Ok(InsightKind::Efficiency),
            _ => Err(format!("Unknown insight kind: {}", s)),
        }
    }
}

/// Display priority of an insight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "high" => Ok(Priority::High),
            "medium" => Ok(Priority::Medium),
            "low" => Ok(Priority::Low),
            _ => Err(format!("Unknown priority: {}", s)),
        }
    }
}

/// A summary statement about auto-detected transactions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    pub kind: InsightKind,
    pub title: String,
    pub message: String,
    pub priority: Priority,
}

impl Insight {
    pub fn new(kind: InsightKind, priority: Priority, message: impl Into<String>) -> Self {
        Self {
            kind,
            title: kind.title().to_string(),
            message: message.into(),
            priority,
        }
    }
}

/// How a piece of advice should be presented
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    Info,
    Success,
    Warning,
    Danger,
}

impl Tone {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tone::Info => "info",
            Tone::Success => "success",
            Tone::Warning => "warning",
            Tone::Danger => "danger",
        }
    }
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Spending observation, budget warning, or suggestion over the whole ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Advice {
    pub title: String,
    pub message: String,
    pub tone: Tone,
}

impl Advice {
    pub fn new(tone: Tone, title: &str, message: impl Into<String>) -> Self {
        Self {
            title: title.to_string(),
            message: message.into(),
            tone,
        }
    }
}
