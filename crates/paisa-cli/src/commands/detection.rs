//! Detection commands: consent, settings, status, scan and watch

use std::sync::Arc;

use anyhow::{bail, Result};
use paisa_core::{
    Clock, DetectionEvent, DetectionLoop, DetectionSettings, Ledger, NoticeLevel, SettingsPatch,
    TickReport,
};
use tracing::info;

use super::{build_scanner, rupees, truncate};

fn detection_loop(ledger: &Ledger, clock: Arc<dyn Clock>, demo: bool) -> DetectionLoop {
    let scanner = build_scanner(ledger, clock.clone(), demo);
    DetectionLoop::new(ledger.clone(), scanner, clock)
}

fn on_off(flag: bool) -> &'static str {
    if flag {
        "on"
    } else {
        "off"
    }
}

fn print_consent_hint() {
    println!("Automatic detection needs your consent first:");
    println!("  paisa consent grant");
}

pub async fn cmd_consent_grant(ledger: &Ledger, clock: Arc<dyn Clock>) -> Result<()> {
    let detector = detection_loop(ledger, clock, false);
    detector.grant_consent().await?;
    detector.stop().await;

    println!("✅ Consent granted. Run `paisa watch` to start detecting payments.");
    Ok(())
}

pub async fn cmd_consent_revoke(ledger: &Ledger, clock: Arc<dyn Clock>) -> Result<()> {
    let detector = detection_loop(ledger, clock, false);
    detector.revoke_consent().await?;

    println!("✅ Consent revoked. Processed transaction IDs have been cleared.");
    Ok(())
}

fn print_settings(settings: &DetectionSettings) {
    println!("   Channels:");
    println!("     allow_upi              {}", on_off(settings.allow_upi));
    println!("     allow_bank_transfers   {}", on_off(settings.allow_bank_transfers));
    println!("     allow_wallet_payments  {}", on_off(settings.allow_wallet_payments));
    println!("     allow_card_payments    {}", on_off(settings.allow_card_payments));
    println!("   Processing:");
    println!("     auto_classify          {}", on_off(settings.auto_classify));
    println!("     detect_recurring       {}", on_off(settings.detect_recurring));
    println!("     instant_notifications  {}", on_off(settings.instant_notifications));
    println!("   Cadence:");
    println!("     live_mode              {}", on_off(settings.live_mode));
    println!("     scan_interval_ms       {}", settings.scan_interval_ms);
    println!("     live_interval_ms       {}", settings.live_interval_ms);
}

pub fn cmd_settings_show(ledger: &Ledger) -> Result<()> {
    println!();
    println!("⚙️  Detection Settings");
    println!("   ─────────────────────────────────────────");
    print_settings(&ledger.settings());
    Ok(())
}

pub async fn cmd_settings_set(
    ledger: &Ledger,
    clock: Arc<dyn Clock>,
    key: &str,
    value: &str,
) -> Result<()> {
    let patch = SettingsPatch::single(key, value)?;
    let detector = detection_loop(ledger, clock, false);
    detector.update_settings(patch).await?;

    println!("✅ Set {} = {}", key, value);
    Ok(())
}

pub async fn cmd_status(ledger: &Ledger, clock: Arc<dyn Clock>) -> Result<()> {
    let detector = detection_loop(ledger, clock, false);
    let status = detector.status().await;

    println!();
    println!("📡 Detection Status");
    println!("   ─────────────────────────────────────────");
    println!(
        "   Consent:        {}",
        if status.consent { "granted" } else { "not granted" }
    );
    println!(
        "   Mode:           {}",
        if status.settings.live_mode {
            "live"
        } else {
            "periodic scanning"
        }
    );
    println!("   Loop:           {}", status.state);
    println!("   Processed IDs:  {}", status.detected_count);

    let auto_detected = ledger
        .transactions()
        .iter()
        .filter(|t| t.is_auto_detected())
        .count();
    println!("   Auto-detected:  {}", auto_detected);

    Ok(())
}

fn print_tick_report(ledger: &Ledger, report: &TickReport) {
    println!();
    println!("🔎 Scan Results");
    println!("   ─────────────────────────────────────────");
    println!("   Candidates:     {}", report.candidates);
    println!("   Committed:      {}", report.committed.len());
    println!("   Duplicates:     {}", report.skipped_duplicates);
    if report.probe_failures > 0 {
        println!("   Probe errors:   {}", report.probe_failures);
    }
    if report.commit_failures > 0 {
        println!("   Commit errors:  {}", report.commit_failures);
    }

    for id in &report.committed {
        if let Some(tx) = ledger.get_transaction(id) {
            println!(
                "   + {} {} │ {}",
                tx.kind,
                rupees(tx.amount),
                truncate(&tx.description, 40)
            );
        }
    }
}

pub async fn cmd_scan(ledger: &Ledger, clock: Arc<dyn Clock>, demo: bool) -> Result<()> {
    if !ledger.consent() {
        print_consent_hint();
        return Ok(());
    }

    let detector = detection_loop(ledger, clock, demo);
    let report = detector.tick().await;
    print_tick_report(ledger, &report);
    Ok(())
}

fn print_event(event: &DetectionEvent) {
    match event {
        DetectionEvent::TransactionCommitted(tx) => {
            info!(id = %tx.id, amount = tx.amount, "Transaction detected");
        }
        DetectionEvent::Notice { message, level } => {
            let icon = match level {
                NoticeLevel::Info => "ℹ️ ",
                NoticeLevel::Success => "✅",
                NoticeLevel::Warning => "⚠️ ",
                NoticeLevel::Error => "❌",
            };
            println!("{} {}", icon, message);
        }
    }
}

pub async fn cmd_watch(
    ledger: &Ledger,
    clock: Arc<dyn Clock>,
    live: bool,
    demo: bool,
) -> Result<()> {
    if !ledger.consent() {
        print_consent_hint();
        bail!("Detection consent has not been granted");
    }

    let detector = detection_loop(ledger, clock, demo);
    detector.subscribe(Box::new(print_event)).await;

    let running = if live {
        detector.start_live().await?
    } else {
        detector.initialize().await
    };
    if !running {
        bail!("Detection could not start");
    }

    let state = detector.state().await;
    println!("👀 Watching for payments ({}). Press Ctrl-C to stop.", state);

    tokio::signal::ctrl_c().await?;
    detector.stop().await;

    let status = detector.status().await;
    println!();
    println!(
        "Stopped. {} transaction IDs processed in total.",
        status.detected_count
    );
    Ok(())
}
