//! Single-flight flush engine.
//!
//! At most one flush body runs at a time. The flush resource is a
//! one-permit [`Semaphore`]: threshold, background and manual triggers take it
//! without waiting and skip when it is held; termination waits for it.
//!
//! A flush snapshots the clock, sends everything stored at or before the
//! snapshot, and then:
//!
//! - on a 2xx response deletes everything at or before the snapshot
//! - on any other outcome deletes only records older than the stale threshold
//!
//! The permit is an RAII guard, so it is released on every exit path,
//! including a panic inside the transport.

use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use insights_core::{Clock, EventBatch};
use insights_store::EventStore;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::counter::BatchCounter;
use crate::transport::Transport;

/// What started a flush attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlushTrigger {
    /// The stored count reached the batch size.
    Threshold,
    /// The host is entering the background.
    Background,
    /// The host is terminating.
    Termination,
    /// Explicit [`Insights::flush`](crate::Insights::flush) call.
    Manual,
}

impl FlushTrigger {
    /// Lowercase name for logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Threshold => "threshold",
            Self::Background => "background",
            Self::Termination => "termination",
            Self::Manual => "manual",
        }
    }
}

impl fmt::Display for FlushTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a flush attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlushOutcome {
    /// Another flush held the resource; nothing was done.
    Busy,
    /// Nothing was stored at or before the snapshot; no request was made.
    Empty,
    /// The collector accepted the batch and it was deleted locally.
    Delivered {
        /// Events sent.
        events: usize,
    },
    /// Delivery failed; only stale records were evicted.
    Failed {
        /// Events attempted.
        events: usize,
        /// Records removed for being older than the stale threshold.
        stale_evicted: usize,
    },
}

/// Owns the flush resource and runs flush bodies.
pub struct FlushController {
    store: Arc<dyn EventStore>,
    transport: Arc<dyn Transport>,
    clock: Arc<dyn Clock>,
    counter: Arc<BatchCounter>,
    permit: Arc<Semaphore>,
    stale_threshold_ms: i64,
}

impl fmt::Debug for FlushController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlushController")
            .field("idle", &self.is_idle())
            .field("stale_threshold_ms", &self.stale_threshold_ms)
            .finish_non_exhaustive()
    }
}

impl FlushController {
    /// Controller evicting records older than `stale_threshold_ms` on failure.
    pub fn new(
        store: Arc<dyn EventStore>,
        transport: Arc<dyn Transport>,
        clock: Arc<dyn Clock>,
        counter: Arc<BatchCounter>,
        stale_threshold_ms: i64,
    ) -> Self {
        Self {
            store,
            transport,
            clock,
            counter,
            permit: Arc::new(Semaphore::new(1)),
            stale_threshold_ms,
        }
    }

    /// Whether no flush is running.
    pub fn is_idle(&self) -> bool {
        self.permit.available_permits() == 1
    }

    /// Flush in place if the resource is free, otherwise return
    /// [`FlushOutcome::Busy`] immediately.
    pub async fn try_flush(&self, trigger: FlushTrigger) -> FlushOutcome {
        let Ok(_permit) = self.permit.try_acquire() else {
            debug!(%trigger, "flush already in progress, skipping");
            return FlushOutcome::Busy;
        };
        self.run(trigger).await
    }

    /// Start a flush on a new task if the resource is free.
    ///
    /// The permit is taken before this returns, so a caller that gets `None`
    /// knows another flush is running. The task holds the permit until the
    /// flush body completes.
    pub fn spawn_if_idle(self: &Arc<Self>, trigger: FlushTrigger) -> Option<JoinHandle<FlushOutcome>> {
        let Ok(permit) = Arc::clone(&self.permit).try_acquire_owned() else {
            debug!(%trigger, "flush already in progress, skipping");
            return None;
        };
        let this = Arc::clone(self);
        Some(tokio::spawn(async move {
            let _permit = permit;
            this.run(trigger).await
        }))
    }

    /// Wait until no flush is running.
    pub async fn wait_idle(&self) {
        match self.permit.acquire().await {
            Ok(permit) => drop(permit),
            Err(error) => warn!(%error, "flush semaphore closed"),
        }
    }

    async fn run(&self, trigger: FlushTrigger) -> FlushOutcome {
        let snapshot = self.clock.now_ms();
        let events = match self.store.load_before(snapshot) {
            Ok(events) => events,
            Err(error) => {
                error!(%trigger, %error, "failed to load events for flush");
                Vec::new()
            }
        };
        if events.is_empty() {
            debug!(%trigger, "no events to flush");
            self.resync_counter();
            return FlushOutcome::Empty;
        }

        let count = events.len();
        let batch = EventBatch { events };
        debug!(%trigger, events = count, snapshot, "flushing events");

        let delivered = match AssertUnwindSafe(self.transport.send(&batch)).catch_unwind().await {
            Ok(Ok(response)) if response.is_success() => true,
            Ok(Ok(response)) => {
                warn!(%trigger, status = response.status, events = count, "collector rejected batch");
                false
            }
            Ok(Err(error)) => {
                warn!(%trigger, %error, events = count, "failed to send batch");
                false
            }
            Err(_) => {
                error!(%trigger, events = count, "transport panicked while sending batch");
                false
            }
        };

        let outcome = if delivered {
            match self.store.delete_before(snapshot) {
                Ok(deleted) => info!(%trigger, events = count, deleted, "batch delivered"),
                Err(error) => error!(%trigger, %error, "failed to delete delivered events"),
            }
            FlushOutcome::Delivered { events: count }
        } else {
            let cutoff = snapshot - self.stale_threshold_ms;
            let stale_evicted = match self.store.delete_before(cutoff) {
                Ok(deleted) => {
                    if deleted > 0 {
                        info!(%trigger, deleted, cutoff, "evicted stale events");
                    }
                    deleted
                }
                Err(error) => {
                    error!(%trigger, %error, "failed to evict stale events");
                    0
                }
            };
            FlushOutcome::Failed {
                events: count,
                stale_evicted,
            }
        };
        self.resync_counter();
        outcome
    }

    fn resync_counter(&self) {
        match self.store.count() {
            Ok(count) => self.counter.resync(count),
            Err(error) => warn!(%error, "failed to count stored events"),
        }
    }
}

/// Await a spawned flush, mapping a panicked task to a failed outcome.
pub(crate) async fn join_flush(handle: JoinHandle<FlushOutcome>) -> FlushOutcome {
    match handle.await {
        Ok(outcome) => outcome,
        Err(error) => {
            error!(%error, "flush task ended abnormally");
            FlushOutcome::Failed {
                events: 0,
                stale_evicted: 0,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{MockTransport, TransportError, TransportResponse};
    use assert_matches::assert_matches;
    use async_trait::async_trait;
    use insights_core::constants::MS_PER_DAY;
    use insights_core::{Actor, EventEnvelope, EventFields, ManualClock};
    use insights_store::SqliteEventStore;

    const NOW: i64 = 1_700_000_000_000;
    const STALE: i64 = 7 * MS_PER_DAY;

    struct Harness {
        store: Arc<SqliteEventStore>,
        clock: Arc<ManualClock>,
        counter: Arc<BatchCounter>,
    }

    impl Harness {
        fn new() -> Self {
            let clock = Arc::new(ManualClock::new(NOW));
            Self {
                store: Arc::new(SqliteEventStore::in_memory(clock.clone()).unwrap()),
                clock,
                counter: Arc::new(BatchCounter::new(10)),
            }
        }

        fn controller(&self, transport: Arc<dyn Transport>) -> Arc<FlushController> {
            Arc::new(FlushController::new(
                self.store.clone(),
                transport,
                self.clock.clone(),
                self.counter.clone(),
                STALE,
            ))
        }

        fn save_at(&self, created_on: i64, page: &str) {
            let fields = EventFields {
                page_name: Some(page.into()),
                ..Default::default()
            };
            let env = EventEnvelope::single(Actor::new("v", "u"), fields);
            let _ = self
                .store
                .save_with_timestamp(created_on, &serde_json::to_vec(&env).unwrap())
                .unwrap();
        }
    }

    fn responding(status: u16) -> Arc<MockTransport> {
        let mut transport = MockTransport::new();
        let _ = transport
            .expect_send()
            .times(1)
            .returning(move |_| Ok(TransportResponse::status(status)));
        Arc::new(transport)
    }

    #[tokio::test]
    async fn empty_store_makes_no_request() {
        let h = Harness::new();
        let mut transport = MockTransport::new();
        let _ = transport.expect_send().times(0);
        let flush = h.controller(Arc::new(transport));

        assert_eq!(flush.try_flush(FlushTrigger::Manual).await, FlushOutcome::Empty);
        assert!(flush.is_idle());
    }

    #[tokio::test]
    async fn success_deletes_through_snapshot_only() {
        let h = Harness::new();
        h.save_at(NOW - 10, "a");
        h.save_at(NOW, "b");
        h.save_at(NOW + 5, "later");
        let flush = h.controller(responding(200));

        let outcome = flush.try_flush(FlushTrigger::Manual).await;
        assert_eq!(outcome, FlushOutcome::Delivered { events: 2 });
        assert_eq!(h.store.count().unwrap(), 1);
        assert_eq!(h.store.oldest_created_on().unwrap(), Some(NOW + 5));
        assert_eq!(h.counter.observed(), 1);
    }

    #[tokio::test]
    async fn batch_is_not_capped() {
        let h = Harness::new();
        for i in 0..25 {
            h.save_at(NOW - 100 + i, "p");
        }
        let mut transport = MockTransport::new();
        let _ = transport
            .expect_send()
            .withf(|batch| batch.len() == 25)
            .times(1)
            .returning(|_| Ok(TransportResponse::status(201)));
        let flush = h.controller(Arc::new(transport));

        assert_eq!(
            flush.try_flush(FlushTrigger::Manual).await,
            FlushOutcome::Delivered { events: 25 }
        );
    }

    #[tokio::test]
    async fn server_error_evicts_only_stale() {
        let h = Harness::new();
        h.save_at(NOW - 8 * MS_PER_DAY, "old");
        h.save_at(NOW - STALE, "boundary");
        h.save_at(NOW - 1_000, "recent");
        let flush = h.controller(responding(500));

        let outcome = flush.try_flush(FlushTrigger::Manual).await;
        assert_eq!(
            outcome,
            FlushOutcome::Failed {
                events: 3,
                stale_evicted: 2
            }
        );
        assert_eq!(h.store.count().unwrap(), 1);
        assert_eq!(h.store.oldest_created_on().unwrap(), Some(NOW - 1_000));
    }

    #[tokio::test]
    async fn transport_error_evicts_only_stale() {
        let h = Harness::new();
        h.save_at(NOW - 30 * MS_PER_DAY, "old");
        h.save_at(NOW, "recent");
        let mut transport = MockTransport::new();
        let _ = transport
            .expect_send()
            .times(1)
            .returning(|_| Err(TransportError::Timeout));
        let flush = h.controller(Arc::new(transport));

        assert_matches!(
            flush.try_flush(FlushTrigger::Manual).await,
            FlushOutcome::Failed { events: 2, stale_evicted: 1 }
        );
        assert_eq!(h.store.count().unwrap(), 1);
    }

    struct PanickingTransport;

    #[async_trait]
    impl Transport for PanickingTransport {
        async fn send(&self, _batch: &EventBatch) -> Result<TransportResponse, TransportError> {
            panic!("transport exploded");
        }

        fn invalidate(&self) {}
    }

    #[tokio::test]
    async fn transport_panic_releases_permit() {
        let h = Harness::new();
        h.save_at(NOW - 10 * MS_PER_DAY, "old");
        h.save_at(NOW, "recent");
        let flush = h.controller(Arc::new(PanickingTransport));

        assert_matches!(
            flush.try_flush(FlushTrigger::Manual).await,
            FlushOutcome::Failed { events: 2, stale_evicted: 1 }
        );
        assert!(flush.is_idle());
    }

    #[tokio::test]
    async fn held_permit_reports_busy() {
        let h = Harness::new();
        h.save_at(NOW, "a");
        let mut transport = MockTransport::new();
        let _ = transport.expect_send().times(0);
        let flush = h.controller(Arc::new(transport));

        let _held = flush.permit.try_acquire().unwrap();
        assert_eq!(flush.try_flush(FlushTrigger::Threshold).await, FlushOutcome::Busy);
        assert!(flush.spawn_if_idle(FlushTrigger::Threshold).is_none());
    }

    #[tokio::test]
    async fn spawned_flush_holds_permit_until_done() {
        let h = Harness::new();
        h.save_at(NOW, "a");
        let flush = h.controller(responding(200));

        let handle = flush.spawn_if_idle(FlushTrigger::Threshold).unwrap();
        assert!(!flush.is_idle());
        assert_eq!(join_flush(handle).await, FlushOutcome::Delivered { events: 1 });
        assert!(flush.is_idle());
    }

    #[tokio::test]
    async fn wait_idle_returns_immediately_when_idle() {
        let h = Harness::new();
        let mut transport = MockTransport::new();
        let _ = transport.expect_send().times(0);
        let flush = h.controller(Arc::new(transport));
        flush.wait_idle().await;
        assert!(flush.is_idle());
    }

    #[test]
    fn trigger_names() {
        assert_eq!(FlushTrigger::Threshold.to_string(), "threshold");
        assert_eq!(FlushTrigger::Termination.as_str(), "termination");
    }
}
