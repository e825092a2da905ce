//! Synthetic UPI payments for demos

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Duration;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use super::PaymentProbe;
use crate::clock::Clock;
use crate::error::{Error, Result};
use crate::ledger::Ledger;
use crate::models::{Category, PaymentChannel, Transaction, TransactionKind, TransactionSource};

/// Chance of producing a payment on a quiet tick
pub const DEFAULT_PROBABILITY: f64 = 0.3;

/// Payment method labels that count as "a UPI payment happened recently"
const UPI_MARKERS: &[&str] = &["UPI", "PhonePe", "Paytm", "Google Pay"];

/// Fabricates a "Sent to Person" UPI expense now and then
///
/// Stays quiet while any UPI-like transaction dated within the last five
/// minutes is in the ledger. Otherwise each scan produces one payment of
/// ₹100 to ₹2099 with probability `probability`.
pub struct SyntheticUpiProbe {
    ledger: Ledger,
    clock: Arc<dyn Clock>,
    probability: f64,
    rng: Mutex<StdRng>,
}

impl SyntheticUpiProbe {
    pub fn new(ledger: Ledger, clock: Arc<dyn Clock>) -> Self {
        Self::with_rng(ledger, clock, DEFAULT_PROBABILITY, StdRng::from_entropy())
    }

    /// Deterministic variant
    pub fn with_seed(ledger: Ledger, clock: Arc<dyn Clock>, probability: f64, seed: u64) -> Self {
        Self::with_rng(ledger, clock, probability, StdRng::seed_from_u64(seed))
    }

    fn with_rng(ledger: Ledger, clock: Arc<dyn Clock>, probability: f64, rng: StdRng) -> Self {
        Self {
            ledger,
            clock,
            probability: if probability.is_nan() {
                0.0
            } else {
                probability.clamp(0.0, 1.0)
            },
            rng: Mutex::new(rng),
        }
    }

    fn has_recent_upi_payment(&self) -> bool {
        let cutoff = self.clock.now() - Duration::minutes(5);
        self.ledger.transactions().iter().any(|t| {
            t.date > cutoff
                && t.payment_method
                    .as_deref()
                    .is_some_and(|method| UPI_MARKERS.iter().any(|m| method.contains(m)))
        })
    }
}

#[async_trait]
impl PaymentProbe for SyntheticUpiProbe {
    fn channel(&self) -> PaymentChannel {
        PaymentChannel::Upi
    }

    fn name(&self) -> &str {
        "synthetic-upi"
    }

    async fn scan(&self) -> Result<Vec<Transaction>> {
        if self.has_recent_upi_payment() {
            return Ok(Vec::new());
        }

        let amount = {
            let mut rng = self
                .rng
                .lock()
                .map_err(|_| Error::Scan("demo rng lock poisoned".to_string()))?;
            if !rng.gen_bool(self.probability) {
                return Ok(Vec::new());
            }
            rng.gen_range(100u32..2100)
        };

        let now = self.clock.now();
        debug!(amount, "Generated synthetic UPI payment");

        Ok(vec![Transaction {
            id: format!("upi_person_{}", now.timestamp_millis()),
            kind: TransactionKind::Expense,
            amount: f64::from(amount),
            description: "PhonePe - Sent to Person".to_string(),
            merchant: "RAJESH KUMAR".to_string(),
            date: now,
            category: Some(Category::Others),
            recurrence: None,
            source: TransactionSource::AutoDetected,
            payment_method: Some("PhonePe UPI".to_string()),
            recorded_at: None,
        }])
    }
}
