//! Insights and advice
//!
//! Two independent views over the ledger:
//!
//! - **Detection insights** ([`generate_insights`]) - what auto-detection has
//!   found: top category, top merchant, recurring payments, and how much of
//!   the ledger was detected rather than typed in
//! - **Advice** ([`spending_insights`], [`budget_warnings`], [`suggestions`]) -
//!   observations over every transaction, checked against the budget and
//!   savings goals
//!
//! ## Usage
//!
//! ```rust,ignore
//! use paisa_core::insights::{generate_insights, budget_warnings};
//!
//! let transactions = ledger.transactions();
//! for insight in generate_insights(&transactions) {
//!     println!("[{}] {}", insight.priority, insight.message);
//! }
//! let warnings = budget_warnings(&transactions, &ledger.budget(), clock.today());
//! ```

pub mod advisor;
pub mod detection;
pub mod types;

pub use advisor::{budget_warnings, spending_insights, suggestions};
pub use detection::generate_insights;
pub use types::{Advice, Insight, InsightKind, Priority, Tone};
