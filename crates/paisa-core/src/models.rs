//! Domain models for Paisa

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Whether money came in or went out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }
}

impl std::str::FromStr for TransactionKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            _ => Err(format!("Unknown transaction kind: {}", s)),
        }
    }
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Expense category (closed set)
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Food,
    Rent,
    Transport,
    Shopping,
    Bills,
    Emi,
    Health,
    Entertainment,
    Education,
    #[default]
    Others,
}

impl Category {
    /// Every category, in display order
    pub const ALL: [Category; 10] = [
        Self::Food,
        Self::Rent,
        Self::Transport,
        Self::Shopping,
        Self::Bills,
        Self::Emi,
        Self::Health,
        Self::Entertainment,
        Self::Education,
        Self::Others,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Food => "food",
            Self::Rent => "rent",
            Self::Transport => "transport",
            Self::Shopping => "shopping",
            Self::Bills => "bills",
            Self::Emi => "emi",
            Self::Health => "health",
            Self::Entertainment => "entertainment",
            Self::Education => "education",
            Self::Others => "others",
        }
    }

    /// Human-readable name
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Food => "Food",
            Self::Rent => "Rent",
            Self::Transport => "Transport",
            Self::Shopping => "Shopping",
            Self::Bills => "Bills",
            Self::Emi => "EMI/Loans",
            Self::Health => "Health",
            Self::Entertainment => "Entertainment",
            Self::Education => "Education",
            Self::Others => "Others",
        }
    }

    /// Fixed monthly obligations (as opposed to discretionary spending)
    pub fn is_fixed(&self) -> bool {
        matches!(self, Self::Rent | Self::Emi | Self::Bills)
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let lower = s.to_lowercase();
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == lower)
            .ok_or_else(|| format!("Unknown category: {}", s))
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Recurrence frequency inferred from transaction text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
}

impl Frequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
        }
    }
}

impl std::fmt::Display for Frequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Recurrence label attached by the recurrence detector
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurrenceTag {
    pub frequency: Frequency,
    /// The rule that matched, rendered as `/source/i`
    pub pattern: String,
}

/// Transaction source - how it was created
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TransactionSource {
    /// Entered by the user
    #[default]
    Manual,
    /// Committed by the detection loop
    AutoDetected,
}

impl TransactionSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::AutoDetected => "auto_detected",
        }
    }
}

impl std::fmt::Display for TransactionSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Payment channel a scanner probe watches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentChannel {
    Upi,
    BankTransfer,
    Wallet,
    Card,
}

impl PaymentChannel {
    /// Channels in scan order
    pub const ALL: [PaymentChannel; 4] = [Self::Upi, Self::BankTransfer, Self::Wallet, Self::Card];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Upi => "upi",
            Self::BankTransfer => "bank_transfer",
            Self::Wallet => "wallet",
            Self::Card => "card",
        }
    }
}

impl std::fmt::Display for PaymentChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A financial transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    pub kind: TransactionKind,
    /// Always non-negative; `kind` carries the sign
    pub amount: f64,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub merchant: String,
    /// When the transaction happened
    pub date: DateTime<Utc>,
    /// Present for expenses, absent for income
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub recurrence: Option<RecurrenceTag>,
    #[serde(default)]
    pub source: TransactionSource,
    /// Free-form label, e.g. "PhonePe UPI"
    #[serde(default)]
    pub payment_method: Option<String>,
    /// When the transaction was written to the ledger
    #[serde(default)]
    pub recorded_at: Option<DateTime<Utc>>,
}

impl Transaction {
    pub fn is_expense(&self) -> bool {
        self.kind == TransactionKind::Expense
    }

    pub fn is_income(&self) -> bool {
        self.kind == TransactionKind::Income
    }

    pub fn is_auto_detected(&self) -> bool {
        self.source == TransactionSource::AutoDetected
    }

    /// Category for aggregation; expenses without one count as `others`
    pub fn effective_category(&self) -> Category {
        self.category.unwrap_or_default()
    }
}

/// A transaction entered by hand (before it gets an id)
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub kind: TransactionKind,
    pub amount: f64,
    pub description: String,
    pub merchant: String,
    pub date: DateTime<Utc>,
    pub category: Option<Category>,
    pub payment_method: Option<String>,
}

/// Monthly budget with optional per-category caps
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Budget {
    #[serde(default)]
    pub monthly: f64,
    #[serde(default)]
    pub category_limits: BTreeMap<Category, f64>,
}

impl Budget {
    /// Limit for a category, if a positive one is set
    pub fn limit_for(&self, category: Category) -> Option<f64> {
        self.category_limits
            .get(&category)
            .copied()
            .filter(|limit| *limit > 0.0)
    }
}

/// A savings target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavingsGoal {
    pub id: String,
    pub name: String,
    pub target_amount: f64,
    pub target_date: NaiveDate,
    #[serde(default)]
    pub completed: bool,
    pub created_at: DateTime<Utc>,
}

/// A savings goal before it gets an id
#[derive(Debug, Clone)]
pub struct NewSavingsGoal {
    pub name: String,
    pub target_amount: f64,
    pub target_date: NaiveDate,
}
