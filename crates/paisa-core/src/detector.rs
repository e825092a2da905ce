//! Automatic transaction detection loop
//!
//! A [`DetectionLoop`] periodically asks the [`Scanner`] for candidate
//! transactions, drops ones it has already seen, enriches the rest
//! (category, recurrence tag, auto-detected source) and commits them to the
//! [`Ledger`].
//!
//! The loop is in one of three states:
//!
//! ```text
//!   stopped --start_scanning--> scanning <--start_live / stop_live--> live
//!      ^                           |                                  |
//!      +------------stop / revoke_consent-----------------------------+
//! ```
//!
//! Nothing runs without consent. Each active state owns exactly one cadence
//! timer (`scan_interval_ms` or `live_interval_ms`); switching state stops the
//! old timer before starting the new one, and a new timer fires its first
//! tick immediately.
//!
//! All mutable state sits behind one async mutex. A tick holds it from start
//! to finish, so ticks never overlap and public operations only ever observe
//! the loop between ticks. Observer callbacks run while that lock is held and
//! must not call back into the loop.

use std::sync::{Arc, Weak};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{oneshot, Mutex};
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::classify::MerchantClassifier;
use crate::clock::Clock;
use crate::dedup::{filter_new, ProcessedIds};
use crate::error::{Error, Result};
use crate::ledger::Ledger;
use crate::models::{Category, Transaction, TransactionSource};
use crate::recurrence::RecurrenceDetector;
use crate::scanner::Scanner;
use crate::settings::{DetectionSettings, SettingsPatch};

/// Where the loop is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LoopState {
    Stopped,
    Scanning,
    Live,
}

impl LoopState {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoopState::Stopped => "stopped",
            LoopState::Scanning => "scanning",
            LoopState::Live => "live",
        }
    }

    pub fn is_active(&self) -> bool {
        !matches!(self, LoopState::Stopped)
    }
}

impl std::fmt::Display for LoopState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How a notice should be presented
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl NoticeLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            NoticeLevel::Info => "info",
            NoticeLevel::Success => "success",
            NoticeLevel::Warning => "warning",
            NoticeLevel::Error => "error",
        }
    }
}

impl std::fmt::Display for NoticeLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Something observers may want to react to
#[derive(Debug, Clone, PartialEq)]
pub enum DetectionEvent {
    /// A detected transaction was written to the ledger
    TransactionCommitted(Transaction),
    /// User-facing message; suppressed when `instant_notifications` is off
    Notice { message: String, level: NoticeLevel },
}

pub type EventCallback = Box<dyn Fn(&DetectionEvent) + Send + Sync>;

/// Snapshot returned by [`DetectionLoop::status`]
#[derive(Debug, Clone, Serialize)]
pub struct DetectionStatus {
    pub state: LoopState,
    pub initialized: bool,
    pub consent: bool,
    pub settings: DetectionSettings,
    /// Size of the processed-id set
    pub detected_count: usize,
    pub last_scan_at: Option<DateTime<Utc>>,
}

/// What one tick did
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TickReport {
    /// Candidates returned by the probes
    pub candidates: usize,
    /// Candidates dropped because their id was already processed
    pub skipped_duplicates: usize,
    /// Ids committed to the ledger, in commit order
    pub committed: Vec<String>,
    pub probe_failures: usize,
    pub commit_failures: usize,
}

/// Detection state machine with its cadence timer
pub struct DetectionLoop {
    core: Arc<Mutex<DetectionCore>>,
}

struct DetectionCore {
    ledger: Ledger,
    scanner: Scanner,
    classifier: MerchantClassifier,
    recurrence: RecurrenceDetector,
    clock: Arc<dyn Clock>,
    observers: Vec<EventCallback>,
    settings: DetectionSettings,
    consent: bool,
    processed: ProcessedIds,
    state: LoopState,
    initialized: bool,
    last_scan_at: Option<DateTime<Utc>>,
    /// Stops the running cadence task
    timer: Option<oneshot::Sender<()>>,
}

impl DetectionLoop {
    /// Create a stopped loop, loading settings, consent and processed ids
    pub fn new(ledger: Ledger, scanner: Scanner, clock: Arc<dyn Clock>) -> Self {
        Self::with_rules(
            ledger,
            scanner,
            clock,
            MerchantClassifier::default(),
            RecurrenceDetector::default(),
        )
    }

    /// Like [`DetectionLoop::new`] with custom classification and recurrence rules
    pub fn with_rules(
        ledger: Ledger,
        scanner: Scanner,
        clock: Arc<dyn Clock>,
        classifier: MerchantClassifier,
        recurrence: RecurrenceDetector,
    ) -> Self {
        let settings = ledger.settings();
        let consent = ledger.consent();
        let processed = ledger.processed_ids();

        debug!(
            consent,
            processed = processed.len(),
            live_mode = settings.live_mode,
            "Detection loop created"
        );

        let core = DetectionCore {
            ledger,
            scanner,
            classifier,
            recurrence,
            clock,
            observers: Vec::new(),
            settings,
            consent,
            processed,
            state: LoopState::Stopped,
            initialized: false,
            last_scan_at: None,
            timer: None,
        };

        Self {
            core: Arc::new(Mutex::new(core)),
        }
    }

    /// Register an observer for commits and notices
    pub async fn subscribe(&self, callback: EventCallback) {
        self.core.lock().await.observers.push(callback);
    }

    /// Start detecting if consent is present
    ///
    /// Resumes live mode when the persisted settings ask for it. Returns
    /// whether the loop is now running.
    pub async fn initialize(&self) -> bool {
        let mut core = self.core.lock().await;
        core.initialize(self.handle())
    }

    /// Begin periodic scanning; `false` without consent
    ///
    /// A loop that is already live stays live.
    pub async fn start_scanning(&self) -> bool {
        let mut core = self.core.lock().await;
        if !core.consent {
            info!("Detection needs consent, not starting");
            return false;
        }
        if core.state == LoopState::Stopped {
            core.start_cadence(LoopState::Scanning, self.handle());
        }
        true
    }

    /// Switch to the live cadence and remember that choice
    ///
    /// Returns `false` without consent.
    pub async fn start_live(&self) -> Result<bool> {
        let mut core = self.core.lock().await;
        if !core.consent {
            info!("Detection needs consent, not going live");
            return Ok(false);
        }
        if core.state == LoopState::Live {
            return Ok(true);
        }

        let mut updated = core.settings.clone();
        updated.live_mode = true;
        core.ledger.save_settings(&updated)?;
        core.settings = updated;
        core.go_live(self.handle());
        Ok(true)
    }

    /// Leave live mode for periodic scanning and remember that choice
    pub async fn stop_live(&self) -> Result<()> {
        let mut core = self.core.lock().await;
        if core.settings.live_mode {
            let mut updated = core.settings.clone();
            updated.live_mode = false;
            core.ledger.save_settings(&updated)?;
            core.settings = updated;
        }
        if core.state == LoopState::Live {
            core.leave_live(self.handle());
        }
        Ok(())
    }

    /// Stop whichever cadence is running
    ///
    /// A tick already in progress finishes first.
    pub async fn stop(&self) {
        let mut core = self.core.lock().await;
        core.halt();
    }

    /// Merge `patch` into the settings, persist them, and apply them
    ///
    /// Flipping `live_mode` while active switches cadence; any other change
    /// restarts the active cadence with the new settings.
    pub async fn update_settings(&self, patch: SettingsPatch) -> Result<DetectionSettings> {
        let mut core = self.core.lock().await;

        let mut updated = core.settings.clone();
        patch.apply(&mut updated)?;
        core.ledger.save_settings(&updated)?;

        let live_changed = updated.live_mode != core.settings.live_mode;
        core.settings = updated;
        info!("Detection settings updated");

        let state = core.state;
        match state {
            LoopState::Stopped => {}
            LoopState::Scanning if live_changed && core.settings.live_mode => {
                core.go_live(self.handle())
            }
            LoopState::Live if live_changed && !core.settings.live_mode => {
                core.leave_live(self.handle())
            }
            active => core.start_cadence(active, self.handle()),
        }

        Ok(core.settings.clone())
    }

    /// Record consent and start detecting
    pub async fn grant_consent(&self) -> Result<bool> {
        let mut core = self.core.lock().await;
        core.ledger.save_consent(true)?;
        core.consent = true;
        info!("Detection consent granted");
        Ok(core.initialize(self.handle()))
    }

    /// Withdraw consent: stop, and forget every processed id
    pub async fn revoke_consent(&self) -> Result<()> {
        let mut core = self.core.lock().await;
        // Memory only follows what storage accepted
        core.ledger.save_consent(false)?;
        core.consent = false;
        core.halt();
        core.initialized = false;
        core.ledger.clear_processed_ids()?;
        core.processed.clear();
        info!("Detection consent revoked, processed ids cleared");
        Ok(())
    }

    pub async fn state(&self) -> LoopState {
        self.core.lock().await.state
    }

    pub async fn status(&self) -> DetectionStatus {
        let core = self.core.lock().await;
        DetectionStatus {
            state: core.state,
            initialized: core.initialized,
            consent: core.consent,
            settings: core.settings.clone(),
            detected_count: core.processed.len(),
            last_scan_at: core.last_scan_at,
        }
    }

    /// Run one tick now, outside the cadence
    pub async fn tick(&self) -> TickReport {
        self.core.lock().await.tick().await
    }

    fn handle(&self) -> Weak<Mutex<DetectionCore>> {
        Arc::downgrade(&self.core)
    }
}

impl DetectionCore {
    fn initialize(&mut self, handle: Weak<Mutex<DetectionCore>>) -> bool {
        if !self.consent {
            info!("Detection needs consent, staying stopped");
            return false;
        }

        let mode = if self.settings.live_mode {
            LoopState::Live
        } else {
            LoopState::Scanning
        };
        if self.state != mode {
            self.start_cadence(mode, handle);
        }
        self.initialized = true;
        true
    }

    fn go_live(&mut self, handle: Weak<Mutex<DetectionCore>>) {
        self.start_cadence(LoopState::Live, handle);
        self.notify(
            "Real-time transaction monitoring is now active",
            NoticeLevel::Success,
        );
    }

    fn leave_live(&mut self, handle: Weak<Mutex<DetectionCore>>) {
        self.start_cadence(LoopState::Scanning, handle);
        self.notify("Real-time monitoring has been disabled", NoticeLevel::Info);
    }

    /// Replace the running timer with one for `mode`
    fn start_cadence(&mut self, mode: LoopState, handle: Weak<Mutex<DetectionCore>>) {
        self.stop_timer();

        let period = match mode {
            LoopState::Live => self.settings.live_interval(),
            LoopState::Scanning => self.settings.scan_interval(),
            LoopState::Stopped => {
                self.state = LoopState::Stopped;
                return;
            }
        };

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        tokio::spawn(run_cadence(handle, period, shutdown_rx));
        self.timer = Some(shutdown_tx);
        self.state = mode;

        info!(
            mode = mode.as_str(),
            interval_ms = period.as_millis() as u64,
            "Detection cadence started"
        );
    }

    fn halt(&mut self) {
        if self.state.is_active() {
            info!(mode = self.state.as_str(), "Detection stopped");
        }
        self.stop_timer();
        self.state = LoopState::Stopped;
    }

    fn stop_timer(&mut self) {
        if let Some(shutdown) = self.timer.take() {
            // The task may already be gone
            let _ = shutdown.send(());
        }
    }

    async fn tick(&mut self) -> TickReport {
        let mut report = TickReport::default();
        if !self.consent {
            return report;
        }

        self.last_scan_at = Some(self.clock.now());
        let outcome = self.scanner.scan(&self.settings).await;
        report.candidates = outcome.candidates.len();
        report.probe_failures = outcome.probes_failed;
        if report.probe_failures > 0 {
            self.notify(
                &format!(
                    "Could not check {} payment channel(s) this time",
                    report.probe_failures
                ),
                NoticeLevel::Warning,
            );
        }
        if outcome.candidates.is_empty() {
            return report;
        }

        let fresh = filter_new(outcome.candidates, &self.processed);
        report.skipped_duplicates = report.candidates - fresh.len();

        for candidate in fresh {
            // Two probes may report the same id in one tick
            if self.processed.contains(&candidate.id) {
                report.skipped_duplicates += 1;
                continue;
            }

            match self.commit(candidate) {
                Ok(transaction) => {
                    report.committed.push(transaction.id.clone());
                    self.announce(transaction);
                }
                Err(Error::DuplicateId(id)) => {
                    debug!(id = %id, "Candidate already in ledger, marking processed");
                    self.mark_processed(id);
                    report.skipped_duplicates += 1;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to commit detected transaction");
                    report.commit_failures += 1;
                }
            }
        }

        if report.commit_failures > 0 {
            self.notify(
                &format!(
                    "Failed to record {} detected transaction(s)",
                    report.commit_failures
                ),
                NoticeLevel::Error,
            );
        }

        if !report.committed.is_empty() {
            info!(
                committed = report.committed.len(),
                skipped = report.skipped_duplicates,
                "Detection tick committed transactions"
            );
        }
        report
    }

    fn commit(&mut self, candidate: Transaction) -> Result<Transaction> {
        let transaction = self.enrich(candidate);
        self.ledger.append_transaction(&transaction)?;
        self.mark_processed(transaction.id.clone());
        Ok(transaction)
    }

    fn enrich(&self, mut transaction: Transaction) -> Transaction {
        if transaction.is_expense() {
            if self.settings.auto_classify {
                transaction.category = Some(
                    self.classifier
                        .classify(&transaction.description, &transaction.merchant),
                );
            } else if transaction.category.is_none() {
                transaction.category = Some(Category::Others);
            }
        } else {
            transaction.category = None;
        }

        if self.settings.detect_recurring {
            transaction.recurrence = self
                .recurrence
                .detect(&transaction.description, &transaction.merchant);
        }

        transaction.source = TransactionSource::AutoDetected;
        transaction.recorded_at = Some(self.clock.now());
        transaction
    }

    fn mark_processed(&mut self, id: String) {
        if self.processed.insert(id) {
            if let Err(e) = self.ledger.save_processed_ids(&self.processed) {
                warn!(error = %e, "Failed to persist processed ids");
            }
        }
    }

    fn announce(&self, transaction: Transaction) {
        let message = if transaction.is_income() {
            format!(
                "Auto-detected income: ₹{} from {}",
                transaction.amount, transaction.merchant
            )
        } else {
            format!(
                "Auto-detected expense: ₹{} at {}",
                transaction.amount, transaction.merchant
            )
        };

        self.emit(&DetectionEvent::TransactionCommitted(transaction));
        self.notify(&message, NoticeLevel::Success);
    }

    fn notify(&self, message: &str, level: NoticeLevel) {
        if !self.settings.instant_notifications {
            return;
        }
        self.emit(&DetectionEvent::Notice {
            message: message.to_string(),
            level,
        });
    }

    fn emit(&self, event: &DetectionEvent) {
        for observer in &self.observers {
            observer(event);
        }
    }
}

/// Timer task: tick every `period` until told to stop or the loop is dropped
async fn run_cadence(
    core: Weak<Mutex<DetectionCore>>,
    period: Duration,
    mut shutdown: oneshot::Receiver<()>,
) {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = &mut shutdown => break,
            _ = ticker.tick() => {
                let Some(shared) = core.upgrade() else { break };
                let mut guard = shared.lock().await;
                // Stopped while waiting for the lock
                if !matches!(shutdown.try_recv(), Err(oneshot::error::TryRecvError::Empty)) {
                    break;
                }
                guard.tick().await;
            }
        }
    }

    debug!("Detection cadence task exited");
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex as StdMutex;

    use chrono::TimeZone;

    use super::*;
    use crate::clock::FixedClock;
    use crate::models::{Frequency, PaymentChannel, TransactionKind};
    use crate::scanner::testing::{candidate, FailingProbe, RepeatingProbe, ScriptedProbe};
    use crate::storage::testing::FlakyStore;
    use crate::storage::{keys, KeyValueStore, MemoryStore};

    struct Harness {
        detection: DetectionLoop,
        ledger: Ledger,
        store: Arc<MemoryStore>,
        events: Arc<StdMutex<Vec<DetectionEvent>>>,
    }

    async fn harness(scanner: Scanner, consent: bool) -> Harness {
        let store = Arc::new(MemoryStore::new());
        let ledger = Ledger::new(store.clone());
        ledger.save_consent(consent).unwrap();
        harness_with(scanner, ledger, store).await
    }

    async fn harness_with(scanner: Scanner, ledger: Ledger, store: Arc<MemoryStore>) -> Harness {
        let clock = Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2026, 5, 10, 12, 0, 0).unwrap(),
        ));
        let detection = DetectionLoop::new(ledger.clone(), scanner, clock);

        let events = Arc::new(StdMutex::new(Vec::new()));
        let sink = events.clone();
        detection
            .subscribe(Box::new(move |event| sink.lock().unwrap().push(event.clone())))
            .await;

        Harness {
            detection,
            ledger,
            store,
            events,
        }
    }

    fn repeating(template: Transaction, unique_ids: bool) -> (Scanner, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let probe = RepeatingProbe {
            channel: PaymentChannel::Upi,
            template,
            calls: calls.clone(),
            unique_ids,
        };
        (Scanner::idle().with_probe(Box::new(probe)), calls)
    }

    fn notices(events: &StdMutex<Vec<DetectionEvent>>) -> Vec<String> {
        events
            .lock()
            .unwrap()
            .iter()
            .filter_map(|e| match e {
                DetectionEvent::Notice { message, .. } => Some(message.clone()),
                _ => None,
            })
            .collect()
    }

    fn notice_levels(events: &StdMutex<Vec<DetectionEvent>>) -> Vec<NoticeLevel> {
        events
            .lock()
            .unwrap()
            .iter()
            .filter_map(|e| match e {
                DetectionEvent::Notice { level, .. } => Some(*level),
                _ => None,
            })
            .collect()
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_consent_is_a_soft_no_op() {
        let scanner = Scanner::idle().with_probe(Box::new(ScriptedProbe::new(
            PaymentChannel::Upi,
            vec![vec![candidate("u1", "Swiggy order", "Swiggy", 250.0)]],
        )));
        let h = harness(scanner, false).await;

        assert!(!h.detection.initialize().await);
        assert!(!h.detection.start_scanning().await);
        assert!(!h.detection.start_live().await.unwrap());
        assert_eq!(h.detection.state().await, LoopState::Stopped);

        let report = h.detection.tick().await;
        assert_eq!(report, TickReport::default());
        assert!(h.ledger.transactions().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_tick_commits_enriched_transaction() {
        let scanner = Scanner::idle().with_probe(Box::new(ScriptedProbe::new(
            PaymentChannel::Upi,
            vec![vec![candidate("u1", "Monthly Netflix subscription", "Netflix", 649.0)]],
        )));
        let h = harness(scanner, true).await;

        assert!(h.detection.start_scanning().await);
        settle().await;

        let stored = h.ledger.get_transaction("u1").unwrap();
        assert_eq!(stored.category, Some(Category::Bills));
        let tag = stored.recurrence.clone().unwrap();
        assert_eq!(tag.frequency, Frequency::Monthly);
        assert_eq!(tag.pattern, "/monthly/i");
        assert!(stored.is_auto_detected());
        assert!(stored.recorded_at.is_some());

        assert!(h.ledger.processed_ids().contains("u1"));
        assert_eq!(
            notices(&h.events),
            vec!["Auto-detected expense: ₹649 at Netflix".to_string()]
        );
        assert!(h
            .events
            .lock()
            .unwrap()
            .iter()
            .any(|e| matches!(e, DetectionEvent::TransactionCommitted(t) if t.id == "u1")));

        let status = h.detection.status().await;
        assert_eq!(status.state, LoopState::Scanning);
        assert_eq!(status.detected_count, 1);
        assert!(status.last_scan_at.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_seen_ids_are_never_committed_twice() {
        let (scanner, calls) = repeating(candidate("same", "Uber trip", "Uber", 180.0), false);
        let h = harness(scanner, true).await;

        let first = h.detection.tick().await;
        let second = h.detection.tick().await;
        assert_eq!(first.committed, vec!["same".to_string()]);
        assert!(second.committed.is_empty());
        assert_eq!(second.skipped_duplicates, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(h.ledger.transactions().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_same_id_twice_in_one_tick() {
        let scanner = Scanner::empty()
            .with_probe(Box::new(ScriptedProbe::new(
                PaymentChannel::Upi,
                vec![vec![candidate("dup", "Zomato", "", 300.0)]],
            )))
            .with_probe(Box::new(ScriptedProbe::new(
                PaymentChannel::Wallet,
                vec![vec![candidate("dup", "Zomato", "", 300.0)]],
            )));
        let h = harness(scanner, true).await;

        let report = h.detection.tick().await;
        assert_eq!(report.candidates, 2);
        assert_eq!(report.committed, vec!["dup".to_string()]);
        assert_eq!(report.skipped_duplicates, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_id_already_in_ledger_is_marked_processed() {
        let scanner = Scanner::idle().with_probe(Box::new(ScriptedProbe::new(
            PaymentChannel::Card,
            vec![vec![candidate("known", "Amazon", "", 999.0)]],
        )));
        let h = harness(scanner, true).await;
        h.ledger
            .append_transaction(&candidate("known", "Amazon", "", 999.0))
            .unwrap();

        let report = h.detection.tick().await;
        assert!(report.committed.is_empty());
        assert_eq!(report.skipped_duplicates, 1);
        assert_eq!(report.commit_failures, 0);
        assert!(h.ledger.processed_ids().contains("known"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_scan_cadence_and_stop() {
        let (scanner, calls) = repeating(candidate("tick", "Chai", "", 20.0), true);
        let h = harness(scanner, true).await;
        h.detection
            .update_settings(SettingsPatch {
                scan_interval_ms: Some(1_000),
                ..Default::default()
            })
            .await
            .unwrap();

        assert!(h.detection.start_scanning().await);
        settle().await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_millis(1_000)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        tokio::time::sleep(Duration::from_millis(2_000)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 4);

        h.detection.stop().await;
        assert_eq!(h.detection.state().await, LoopState::Stopped);
        tokio::time::sleep(Duration::from_millis(5_000)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert_eq!(h.ledger.transactions().len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_live_mode_switches_cadence() {
        let (scanner, calls) = repeating(candidate("live", "Tea", "", 15.0), true);
        let h = harness(scanner, true).await;
        h.detection
            .update_settings(SettingsPatch {
                scan_interval_ms: Some(10_000),
                live_interval_ms: Some(1_000),
                ..Default::default()
            })
            .await
            .unwrap();

        assert!(h.detection.start_live().await.unwrap());
        settle().await;
        assert_eq!(h.detection.state().await, LoopState::Live);
        assert!(h.ledger.settings().live_mode);

        tokio::time::sleep(Duration::from_millis(3_000)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 4);

        h.detection.stop_live().await.unwrap();
        settle().await;
        assert_eq!(h.detection.state().await, LoopState::Scanning);
        assert!(!h.ledger.settings().live_mode);
        // Scanning starts with an immediate tick, then waits the longer interval
        assert_eq!(calls.load(Ordering::SeqCst), 5);
        tokio::time::sleep(Duration::from_millis(5_000)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 5);

        let messages = notices(&h.events);
        assert!(messages.contains(&"Real-time transaction monitoring is now active".to_string()));
        assert!(messages.contains(&"Real-time monitoring has been disabled".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_initialize_resumes_live_mode() {
        let store = Arc::new(MemoryStore::new());
        let ledger = Ledger::new(store.clone());
        ledger.save_consent(true).unwrap();
        ledger
            .save_settings(&DetectionSettings {
                live_mode: true,
                ..Default::default()
            })
            .unwrap();

        let h = harness_with(Scanner::idle(), ledger, store).await;
        assert!(h.detection.initialize().await);

        let status = h.detection.status().await;
        assert!(status.initialized);
        assert_eq!(status.state, LoopState::Live);
    }

    #[tokio::test(start_paused = true)]
    async fn test_settings_toggle_live_mode_while_active() {
        let h = harness(Scanner::idle(), true).await;
        assert!(h.detection.start_scanning().await);

        let settings = h
            .detection
            .update_settings(SettingsPatch {
                live_mode: Some(true),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(settings.live_mode);
        assert_eq!(h.detection.state().await, LoopState::Live);

        h.detection
            .update_settings(SettingsPatch {
                live_mode: Some(false),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(h.detection.state().await, LoopState::Scanning);
    }

    #[tokio::test(start_paused = true)]
    async fn test_settings_change_keeps_processed_ids_and_consent() {
        let (scanner, _) = repeating(candidate("keep", "Ola ride", "", 120.0), false);
        let h = harness(scanner, true).await;
        assert!(h.detection.start_scanning().await);
        settle().await;

        h.detection
            .update_settings(SettingsPatch {
                allow_wallet_payments: Some(false),
                ..Default::default()
            })
            .await
            .unwrap();
        settle().await;

        let status = h.detection.status().await;
        assert!(status.consent);
        assert_eq!(status.state, LoopState::Scanning);
        assert_eq!(status.detected_count, 1);
        assert_eq!(h.ledger.transactions().len(), 1);
        assert!(!h.ledger.settings().allow_wallet_payments);
    }

    #[tokio::test(start_paused = true)]
    async fn test_revoke_consent_stops_and_clears() {
        let (scanner, calls) = repeating(candidate("r", "Dinner", "", 500.0), true);
        let h = harness(scanner, true).await;
        assert!(h.detection.initialize().await);
        settle().await;
        assert_eq!(h.detection.status().await.detected_count, 1);

        h.detection.revoke_consent().await.unwrap();
        let status = h.detection.status().await;
        assert_eq!(status.state, LoopState::Stopped);
        assert!(!status.consent);
        assert_eq!(status.detected_count, 0);
        assert_eq!(h.store.get(keys::PROCESSED_IDS).unwrap(), None);
        assert!(!h.ledger.consent());

        let before = calls.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(calls.load(Ordering::SeqCst), before);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_revoke_keeps_loop_running() {
        let store = Arc::new(FlakyStore::default());
        let ledger = Ledger::new(store.clone());
        ledger.save_consent(true).unwrap();
        let mut ids = ProcessedIds::new();
        ids.insert("seen");
        ledger.save_processed_ids(&ids).unwrap();

        let clock = Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2026, 5, 10, 12, 0, 0).unwrap(),
        ));
        let detection = DetectionLoop::new(ledger.clone(), Scanner::idle(), clock);
        assert!(detection.start_scanning().await);

        store.break_writes(true);
        assert!(detection.revoke_consent().await.is_err());

        let status = detection.status().await;
        assert!(status.consent);
        assert_eq!(status.state, LoopState::Scanning);
        assert_eq!(status.detected_count, 1);
        assert!(ledger.consent());
        assert!(ledger.processed_ids().contains("seen"));

        store.break_writes(false);
        detection.revoke_consent().await.unwrap();
        let status = detection.status().await;
        assert!(!status.consent);
        assert_eq!(status.state, LoopState::Stopped);
        assert_eq!(status.detected_count, 0);
        assert!(ledger.processed_ids().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_live_switch_keeps_settings() {
        let store = Arc::new(FlakyStore::default());
        let ledger = Ledger::new(store.clone());
        ledger.save_consent(true).unwrap();
        let clock = Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2026, 5, 10, 12, 0, 0).unwrap(),
        ));
        let detection = DetectionLoop::new(ledger, Scanner::idle(), clock);

        store.break_writes(true);
        assert!(detection.start_live().await.is_err());
        let status = detection.status().await;
        assert!(!status.settings.live_mode);
        assert_eq!(status.state, LoopState::Stopped);
    }

    #[tokio::test(start_paused = true)]
    async fn test_grant_consent_starts_scanning() {
        let h = harness(Scanner::idle(), false).await;
        assert!(h.detection.grant_consent().await.unwrap());
        assert!(h.ledger.consent());
        assert_eq!(h.detection.state().await, LoopState::Scanning);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pipeline_switches() {
        let scanner = Scanner::idle().with_probe(Box::new(ScriptedProbe::new(
            PaymentChannel::Upi,
            vec![vec![candidate("p1", "Swiggy weekly order", "Swiggy", 400.0)]],
        )));
        let h = harness(scanner, true).await;
        h.detection
            .update_settings(SettingsPatch {
                auto_classify: Some(false),
                detect_recurring: Some(false),
                instant_notifications: Some(false),
                ..Default::default()
            })
            .await
            .unwrap();

        let report = h.detection.tick().await;
        assert_eq!(report.committed, vec!["p1".to_string()]);

        let stored = h.ledger.get_transaction("p1").unwrap();
        assert_eq!(stored.category, Some(Category::Others));
        assert_eq!(stored.recurrence, None);

        // Commits are still announced to observers, notices are not
        let events = h.events.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], DetectionEvent::TransactionCommitted(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_income_is_tagged_but_not_classified() {
        let mut salary = candidate("sal", "Salary credit", "ACME Corp", 50_000.0);
        salary.kind = TransactionKind::Income;
        let scanner = Scanner::idle().with_probe(Box::new(ScriptedProbe::new(
            PaymentChannel::BankTransfer,
            vec![vec![salary]],
        )));
        let h = harness(scanner, true).await;

        h.detection.tick().await;
        let stored = h.ledger.get_transaction("sal").unwrap();
        assert_eq!(stored.category, None);
        assert_eq!(stored.recurrence.unwrap().pattern, "/salary/i");
        assert_eq!(
            notices(&h.events),
            vec!["Auto-detected income: ₹50000 from ACME Corp".to_string()]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_probe_failure_is_contained() {
        let scanner = Scanner::idle()
            .with_probe(Box::new(FailingProbe(PaymentChannel::Upi)))
            .with_probe(Box::new(ScriptedProbe::new(
                PaymentChannel::Card,
                vec![vec![candidate("c1", "Myntra", "", 1_200.0)]],
            )));
        let h = harness(scanner, true).await;

        let report = h.detection.tick().await;
        assert_eq!(report.probe_failures, 1);
        assert_eq!(report.committed, vec!["c1".to_string()]);
        assert_eq!(
            h.ledger.get_transaction("c1").unwrap().category,
            Some(Category::Shopping)
        );
        assert_eq!(
            notice_levels(&h.events),
            vec![NoticeLevel::Warning, NoticeLevel::Success]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_candidate_is_skipped() {
        let scanner = Scanner::idle().with_probe(Box::new(ScriptedProbe::new(
            PaymentChannel::Upi,
            vec![vec![
                candidate("bad", "Broken", "", f64::NAN),
                candidate("good", "Zomato", "", 150.0),
            ]],
        )));
        let h = harness(scanner, true).await;

        let report = h.detection.tick().await;
        assert_eq!(report.commit_failures, 1);
        assert_eq!(report.committed, vec!["good".to_string()]);
        assert!(!h.ledger.processed_ids().contains("bad"));
        assert_eq!(
            notices(&h.events).last().map(String::as_str),
            Some("Failed to record 1 detected transaction(s)")
        );
        assert_eq!(notice_levels(&h.events).last(), Some(&NoticeLevel::Error));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_notices_respect_instant_notifications() {
        let scanner = Scanner::idle().with_probe(Box::new(FailingProbe(PaymentChannel::Upi)));
        let h = harness(scanner, true).await;
        h.detection
            .update_settings(SettingsPatch::single("instant_notifications", "off").unwrap())
            .await
            .unwrap();

        let report = h.detection.tick().await;
        assert_eq!(report.probe_failures, 1);
        assert!(notices(&h.events).is_empty());
    }
}
