//! Detection privacy and cadence settings
//!
//! Persisted as one JSON record. Fields missing from storage take their
//! defaults, so records written by older builds keep loading.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::PaymentChannel;

/// Default periodic scan cadence
pub const DEFAULT_SCAN_INTERVAL_MS: u64 = 30_000;
/// Default live-mode cadence
pub const DEFAULT_LIVE_INTERVAL_MS: u64 = 5_000;
/// Shortest cadence accepted for either mode
pub const MIN_INTERVAL_MS: u64 = 100;

/// Per-channel scan toggles, pipeline switches, and cadences
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionSettings {
    pub allow_upi: bool,
    pub allow_bank_transfers: bool,
    pub allow_wallet_payments: bool,
    pub allow_card_payments: bool,
    /// Assign categories to detected expenses
    pub auto_classify: bool,
    /// Attach recurrence tags to detected transactions
    pub detect_recurring: bool,
    /// Whether the loop should run at the live cadence
    pub live_mode: bool,
    /// Emit user-facing notices for detections
    pub instant_notifications: bool,
    pub scan_interval_ms: u64,
    pub live_interval_ms: u64,
}

impl Default for DetectionSettings {
    fn default() -> Self {
        Self {
            allow_upi: true,
            allow_bank_transfers: true,
            allow_wallet_payments: true,
            allow_card_payments: true,
            auto_classify: true,
            detect_recurring: true,
            live_mode: false,
            instant_notifications: true,
            scan_interval_ms: DEFAULT_SCAN_INTERVAL_MS,
            live_interval_ms: DEFAULT_LIVE_INTERVAL_MS,
        }
    }
}

impl DetectionSettings {
    pub fn is_channel_enabled(&self, channel: PaymentChannel) -> bool {
        match channel {
            PaymentChannel::Upi => self.allow_upi,
            PaymentChannel::BankTransfer => self.allow_bank_transfers,
            PaymentChannel::Wallet => self.allow_wallet_payments,
            PaymentChannel::Card => self.allow_card_payments,
        }
    }

    pub fn scan_interval(&self) -> Duration {
        Duration::from_millis(self.scan_interval_ms.max(MIN_INTERVAL_MS))
    }

    pub fn live_interval(&self) -> Duration {
        Duration::from_millis(self.live_interval_ms.max(MIN_INTERVAL_MS))
    }
}

/// Partial update; `None` leaves a field unchanged
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettingsPatch {
    pub allow_upi: Option<bool>,
    pub allow_bank_transfers: Option<bool>,
    pub allow_wallet_payments: Option<bool>,
    pub allow_card_payments: Option<bool>,
    pub auto_classify: Option<bool>,
    pub detect_recurring: Option<bool>,
    pub live_mode: Option<bool>,
    pub instant_notifications: Option<bool>,
    pub scan_interval_ms: Option<u64>,
    pub live_interval_ms: Option<u64>,
}

impl SettingsPatch {
    /// Patch setting a single field by its persisted name
    ///
    /// Booleans accept `true`/`false`/`on`/`off`; intervals are milliseconds.
    pub fn single(key: &str, value: &str) -> Result<Self> {
        let mut patch = Self::default();
        match key {
            "allow_upi" => patch.allow_upi = Some(parse_flag(key, value)?),
            "allow_bank_transfers" => patch.allow_bank_transfers = Some(parse_flag(key, value)?),
            "allow_wallet_payments" => patch.allow_wallet_payments = Some(parse_flag(key, value)?),
            "allow_card_payments" => patch.allow_card_payments = Some(parse_flag(key, value)?),
            "auto_classify" => patch.auto_classify = Some(parse_flag(key, value)?),
            "detect_recurring" => patch.detect_recurring = Some(parse_flag(key, value)?),
            "live_mode" => patch.live_mode = Some(parse_flag(key, value)?),
            "instant_notifications" => {
                patch.instant_notifications = Some(parse_flag(key, value)?)
            }
            "scan_interval_ms" => patch.scan_interval_ms = Some(parse_millis(key, value)?),
            "live_interval_ms" => patch.live_interval_ms = Some(parse_millis(key, value)?),
            _ => return Err(Error::InvalidData(format!("Unknown setting: {}", key))),
        }
        Ok(patch)
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Apply onto `settings`, rejecting intervals below the minimum
    pub fn apply(&self, settings: &mut DetectionSettings) -> Result<()> {
        for interval in [self.scan_interval_ms, self.live_interval_ms]
            .into_iter()
            .flatten()
        {
            if interval < MIN_INTERVAL_MS {
                return Err(Error::InvalidData(format!(
                    "Interval must be at least {} ms, got {}",
                    MIN_INTERVAL_MS, interval
                )));
            }
        }

        fn set<T: Copy>(field: &mut T, value: Option<T>) {
            if let Some(v) = value {
                *field = v;
            }
        }

        set(&mut settings.allow_upi, self.allow_upi);
        set(&mut settings.allow_bank_transfers, self.allow_bank_transfers);
        set(&mut settings.allow_wallet_payments, self.allow_wallet_payments);
        set(&mut settings.allow_card_payments, self.allow_card_payments);
        set(&mut settings.auto_classify, self.auto_classify);
        set(&mut settings.detect_recurring, self.detect_recurring);
        set(&mut settings.live_mode, self.live_mode);
        set(
            &mut settings.instant_notifications,
            self.instant_notifications,
        );
        set(&mut settings.scan_interval_ms, self.scan_interval_ms);
        set(&mut settings.live_interval_ms, self.live_interval_ms);
        Ok(())
    }
}

fn parse_flag(key: &str, value: &str) -> Result<bool> {
    match value.to_lowercase().as_str() {
        "true" | "on" | "yes" | "1" => Ok(true),
        "false" | "off" | "no" | "0" => Ok(false),
        _ => Err(Error::InvalidData(format!(
            "{} expects true/false, got {}",
            key, value
        ))),
    }
}

fn parse_millis(key: &str, value: &str) -> Result<u64> {
    value
        .parse()
        .map_err(|_| Error::InvalidData(format!("{} expects milliseconds, got {}", key, value)))
}
