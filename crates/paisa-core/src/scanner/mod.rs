//! Payment-channel probes
//!
//! Each channel (UPI, bank transfer, wallet, card) is watched by one
//! [`PaymentProbe`]. The [`Scanner`] runs the probes whose channel is enabled,
//! one after another, and merges their candidates. A probe failure is logged
//! and treated as "nothing found"; it never stops the other probes.
//!
//! Until a real integration is plugged in, every channel uses an
//! [`IdleProbe`]. [`SyntheticUpiProbe`] generates fake UPI payments for demos
//! and is never installed by default.

mod demo;

pub use demo::SyntheticUpiProbe;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::Result;
use crate::models::{PaymentChannel, Transaction};
use crate::settings::DetectionSettings;

/// Source of candidate transactions for one payment channel
#[async_trait]
pub trait PaymentProbe: Send + Sync {
    fn channel(&self) -> PaymentChannel;

    /// Human-readable name for logs
    fn name(&self) -> &str {
        self.channel().as_str()
    }

    /// Candidates seen since the last call; ids need not be committed yet
    async fn scan(&self) -> Result<Vec<Transaction>>;
}

/// Probe for a channel with no integration; always finds nothing
#[derive(Debug, Clone, Copy)]
pub struct IdleProbe {
    channel: PaymentChannel,
}

impl IdleProbe {
    pub fn new(channel: PaymentChannel) -> Self {
        Self { channel }
    }
}

#[async_trait]
impl PaymentProbe for IdleProbe {
    fn channel(&self) -> PaymentChannel {
        self.channel
    }

    async fn scan(&self) -> Result<Vec<Transaction>> {
        Ok(Vec::new())
    }
}

/// Merged result of one scan pass
#[derive(Debug, Default)]
pub struct ScanOutcome {
    pub candidates: Vec<Transaction>,
    /// Probes that ran
    pub probes_run: usize,
    /// Probes that returned an error
    pub probes_failed: usize,
}

/// Ordered set of probes
#[derive(Default)]
pub struct Scanner {
    probes: Vec<Box<dyn PaymentProbe>>,
}

impl Scanner {
    /// Scanner with no probes at all
    pub fn empty() -> Self {
        Self::default()
    }

    /// One idle probe per channel
    pub fn idle() -> Self {
        let mut scanner = Self::empty();
        for channel in PaymentChannel::ALL {
            scanner.register(Box::new(IdleProbe::new(channel)));
        }
        scanner
    }

    /// Add a probe; it runs after the ones already registered
    pub fn register(&mut self, probe: Box<dyn PaymentProbe>) {
        self.probes.push(probe);
    }

    /// Swap whatever watches `probe.channel()` for `probe`
    pub fn replace(&mut self, probe: Box<dyn PaymentProbe>) {
        let channel = probe.channel();
        let first = self.probes.iter().position(|p| p.channel() == channel);
        self.probes.retain(|p| p.channel() != channel);
        match first {
            Some(index) => self.probes.insert(index, probe),
            None => self.probes.push(probe),
        }
    }

    pub fn with_probe(mut self, probe: Box<dyn PaymentProbe>) -> Self {
        self.replace(probe);
        self
    }

    pub fn channels(&self) -> Vec<PaymentChannel> {
        self.probes.iter().map(|p| p.channel()).collect()
    }

    /// Run every enabled probe in order and merge the candidates
    pub async fn scan(&self, settings: &DetectionSettings) -> ScanOutcome {
        let mut outcome = ScanOutcome::default();

        for probe in &self.probes {
            if !settings.is_channel_enabled(probe.channel()) {
                continue;
            }
            outcome.probes_run += 1;

            match probe.scan().await {
                Ok(found) => {
                    if !found.is_empty() {
                        debug!(probe = probe.name(), count = found.len(), "Probe found candidates");
                    }
                    outcome.candidates.extend(found);
                }
                Err(e) => {
                    outcome.probes_failed += 1;
                    warn!(probe = probe.name(), error = %e, "Probe failed, skipping this tick");
                }
            }
        }

        outcome
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted probes for loop tests

    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::error::Error;
    use crate::models::{Category, TransactionKind, TransactionSource};
    use chrono::{TimeZone, Utc};

    pub fn candidate(id: &str, description: &str, merchant: &str, amount: f64) -> Transaction {
        Transaction {
            id: id.to_string(),
            kind: TransactionKind::Expense,
            amount,
            description: description.to_string(),
            merchant: merchant.to_string(),
            date: Utc.with_ymd_and_hms(2026, 5, 10, 12, 0, 0).unwrap(),
            category: Some(Category::Others),
            recurrence: None,
            source: TransactionSource::AutoDetected,
            payment_method: Some("UPI".to_string()),
            recorded_at: None,
        }
    }

    /// Returns queued batches in order, then nothing
    pub struct ScriptedProbe {
        pub channel: PaymentChannel,
        pub batches: Mutex<VecDeque<Vec<Transaction>>>,
        pub calls: Arc<AtomicUsize>,
    }

    impl ScriptedProbe {
        pub fn new(channel: PaymentChannel, batches: Vec<Vec<Transaction>>) -> Self {
            Self {
                channel,
                batches: Mutex::new(batches.into()),
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    #[async_trait]
    impl PaymentProbe for ScriptedProbe {
        fn channel(&self) -> PaymentChannel {
            self.channel
        }

        async fn scan(&self) -> Result<Vec<Transaction>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.batches.lock().unwrap().pop_front().unwrap_or_default())
        }
    }

    /// Returns the same candidate on every call
    pub struct RepeatingProbe {
        pub channel: PaymentChannel,
        pub template: Transaction,
        pub calls: Arc<AtomicUsize>,
        /// Give each call's candidate a fresh id
        pub unique_ids: bool,
    }

    #[async_trait]
    impl PaymentProbe for RepeatingProbe {
        fn channel(&self) -> PaymentChannel {
            self.channel
        }

        async fn scan(&self) -> Result<Vec<Transaction>> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            let mut tx = self.template.clone();
            if self.unique_ids {
                tx.id = format!("{}_{}", tx.id, n);
            }
            Ok(vec![tx])
        }
    }

    /// Always errors
    pub struct FailingProbe(pub PaymentChannel);

    #[async_trait]
    impl PaymentProbe for FailingProbe {
        fn channel(&self) -> PaymentChannel {
            self.0
        }

        async fn scan(&self) -> Result<Vec<Transaction>> {
            Err(Error::Scan("gateway unreachable".to_string()))
        }
    }
}
