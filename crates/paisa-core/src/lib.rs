//! Paisa Core Library
//!
//! Shared functionality for the Paisa personal finance tracker:
//! - Key-value persistence (in-memory and SQLite)
//! - Typed ledger of transactions, budget, savings goals, and detection state
//! - Keyword merchant classification and recurrence tagging
//! - Pluggable payment-channel probes
//! - Detection loop with consent, periodic and live cadences
//! - Reports, detection insights, and budget advice

pub mod classify;
pub mod clock;
pub mod dedup;
pub mod detector;
pub mod error;
pub mod insights;
pub mod ledger;
pub mod models;
pub mod recurrence;
pub mod reports;
pub mod scanner;
pub mod settings;
pub mod storage;

pub use classify::{classify, MerchantClassifier};
pub use clock::{Clock, FixedClock, SystemClock};
pub use dedup::{filter_new, ProcessedIds};
pub use detector::{
    DetectionEvent, DetectionLoop, DetectionStatus, EventCallback, LoopState, NoticeLevel,
    TickReport,
};
pub use error::{Error, Result};
pub use insights::{generate_insights, Advice, Insight, InsightKind, Priority, Tone};
pub use ledger::{ExportSnapshot, Ledger};
pub use models::{
    Budget, Category, Frequency, NewSavingsGoal, NewTransaction, PaymentChannel, RecurrenceTag,
    SavingsGoal, Transaction, TransactionKind, TransactionSource,
};
pub use recurrence::{detect_recurrence, RecurrenceDetector, RecurrenceRule};
pub use reports::{BudgetStatus, Period};
pub use scanner::{IdleProbe, PaymentProbe, ScanOutcome, Scanner, SyntheticUpiProbe};
pub use settings::{DetectionSettings, SettingsPatch};
pub use storage::{KeyValueStore, MemoryStore, SqliteStore};
