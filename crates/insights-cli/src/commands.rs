//! Subcommand implementations.

use std::sync::Arc;

use anyhow::{Context, Result};
use insights::{FlushOutcome, Insights, TrackRequest};
use insights_core::constants::MS_PER_DAY;
use insights_core::{Clock, SystemClock};
use insights_settings::InsightsSettings;
use insights_store::{ConnectionConfig, EventStore, SqliteEventStore};
use tracing::info;

fn open_store(settings: &InsightsSettings) -> Result<SqliteEventStore> {
    let path = settings.storage.resolved_database_path();
    let config = ConnectionConfig {
        pool_size: settings.storage.pool_size,
        busy_timeout_ms: settings.storage.busy_timeout_ms,
    };
    SqliteEventStore::open(&path, &config, Arc::new(SystemClock))
        .with_context(|| format!("Failed to open event database: {}", path.display()))
}

fn describe(outcome: FlushOutcome) -> String {
    match outcome {
        FlushOutcome::Busy => "flush already in progress".to_string(),
        FlushOutcome::Empty => "nothing to flush".to_string(),
        FlushOutcome::Delivered { events } => format!("delivered {events} event(s)"),
        FlushOutcome::Failed {
            events,
            stale_evicted,
        } => format!("delivery of {events} event(s) failed; evicted {stale_evicted} stale"),
    }
}

/// Record one event, then run the termination flush.
pub async fn track(settings: InsightsSettings, request: TrackRequest) -> Result<()> {
    let insights = Insights::builder(settings)
        .build()
        .context("Failed to start insights")?;
    let kind = request.kind;
    insights.track(request);
    let outcome = insights
        .on_terminating()
        .await
        .context("Termination flush failed")?;
    info!(%kind, ?outcome, "tracked event");
    println!("tracked {kind}: {}", describe(outcome));
    Ok(())
}

/// Flush everything stored, then wait for the flush to finish.
pub async fn flush(settings: InsightsSettings) -> Result<()> {
    let insights = Insights::builder(settings)
        .build()
        .context("Failed to start insights")?;
    let outcome = insights.flush().await.context("Flush failed")?;
    println!("{}", describe(outcome));
    Ok(())
}

/// Print the stored event count.
pub fn pending(settings: &InsightsSettings) -> Result<()> {
    let store = open_store(settings)?;
    let count = store.count().context("Failed to count events")?;
    println!("{count}");
    Ok(())
}

/// Delete events older than `days`.
pub fn purge(settings: &InsightsSettings, days: u32) -> Result<()> {
    let store = open_store(settings)?;
    let cutoff = purge_cutoff(SystemClock.now_ms(), days);
    let deleted = store
        .delete_before(cutoff)
        .context("Failed to delete events")?;
    info!(deleted, cutoff, "purged events");
    println!("deleted {deleted} event(s)");
    Ok(())
}

fn purge_cutoff(now_ms: i64, days: u32) -> i64 {
    now_ms - i64::from(days) * MS_PER_DAY
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings_with_db(path: &std::path::Path) -> InsightsSettings {
        let mut settings = InsightsSettings::default();
        settings.storage.database_path = Some(path.display().to_string());
        settings
    }

    #[test]
    fn cutoff_subtracts_whole_days() {
        assert_eq!(purge_cutoff(10 * MS_PER_DAY, 7), 3 * MS_PER_DAY);
        assert_eq!(purge_cutoff(1_000, 0), 1_000);
    }

    #[test]
    fn describe_outcomes() {
        assert_eq!(describe(FlushOutcome::Empty), "nothing to flush");
        assert_eq!(
            describe(FlushOutcome::Delivered { events: 3 }),
            "delivered 3 event(s)"
        );
        assert!(describe(FlushOutcome::Failed { events: 2, stale_evicted: 1 }).contains("evicted 1"));
    }

    #[test]
    fn purge_removes_only_old_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.db");
        let settings = settings_with_db(&path);
        let now = SystemClock.now_ms();
        {
            let store = open_store(&settings).unwrap();
            let _ = store.save_with_timestamp(now - 30 * MS_PER_DAY, b"{}").unwrap();
            let _ = store.save_with_timestamp(now, b"{}").unwrap();
        }

        purge(&settings, 7).unwrap();
        let store = open_store(&settings).unwrap();
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn pending_opens_fresh_database() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings_with_db(&dir.path().join("nested").join("events.db"));
        pending(&settings).unwrap();
    }
}
