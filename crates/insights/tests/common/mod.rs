//! Shared fixtures for the engine integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU16, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use insights::{
    BackgroundExecutionHost, DeviceInfo, DeviceType, ExtensionGrant, Insights, InsightsSettings,
    Orientation, StaticDeviceInfo, Transport, TransportError, TransportResponse,
};
use insights_core::{Clock, EventBatch, EventEnvelope, ManualClock};
use insights_store::{EventStore, SqliteEventStore};
use parking_lot::Mutex;

pub const NOW: i64 = 1_700_000_000_000;

pub fn settings() -> InsightsSettings {
    InsightsSettings::new("UAT", "prg-1", "1.0.0", "https://collector.test/events", "usr-1")
}

pub fn device() -> DeviceInfo {
    DeviceInfo {
        model: "iPhone12,1".into(),
        name: "Test Phone".into(),
        device_type: DeviceType::MobilePhone,
        orientation: Orientation::Portrait,
        screen_width: 375.0,
        screen_height: 812.0,
        os_version: "17.2".into(),
        language: "en".into(),
    }
}

/// Transport fake that records batches and tracks concurrency.
#[derive(Default)]
pub struct RecordingTransport {
    status: AtomicU16,
    delay_ms: AtomicU64,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    completed: AtomicUsize,
    invalidated: AtomicBool,
    batches: Mutex<Vec<EventBatch>>,
}

impl RecordingTransport {
    pub fn new(status: u16) -> Arc<Self> {
        let transport = Self::default();
        transport.status.store(status, Ordering::SeqCst);
        Arc::new(transport)
    }

    pub fn slow(status: u16, delay: Duration) -> Arc<Self> {
        let transport = Self::new(status);
        let millis = u64::try_from(delay.as_millis()).unwrap();
        transport.delay_ms.store(millis, Ordering::SeqCst);
        transport
    }

    pub fn calls(&self) -> usize {
        self.batches.lock().len()
    }

    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn is_invalidated(&self) -> bool {
        self.invalidated.load(Ordering::SeqCst)
    }

    pub fn batches(&self) -> Vec<EventBatch> {
        self.batches.lock().clone()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send(&self, batch: &EventBatch) -> Result<TransportResponse, TransportError> {
        if self.is_invalidated() {
            return Err(TransportError::Invalidated);
        }
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        let _ = self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        self.batches.lock().push(batch.clone());

        let delay = self.delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }

        let _ = self.in_flight.fetch_sub(1, Ordering::SeqCst);
        let _ = self.completed.fetch_add(1, Ordering::SeqCst);
        Ok(TransportResponse::status(self.status.load(Ordering::SeqCst)))
    }

    fn invalidate(&self) {
        self.invalidated.store(true, Ordering::SeqCst);
    }
}

/// Background host granting a fixed window and recording releases.
pub struct TimedHost {
    window: Duration,
    pub ended: AtomicUsize,
}

impl TimedHost {
    pub fn new(window: Duration) -> Arc<Self> {
        Arc::new(Self {
            window,
            ended: AtomicUsize::new(0),
        })
    }
}

impl BackgroundExecutionHost for TimedHost {
    fn request_extension(&self, _name: &str) -> Option<ExtensionGrant> {
        Some(ExtensionGrant {
            id: 7,
            deadline: Some(tokio::time::Instant::now() + self.window),
        })
    }

    fn end_extension(&self, grant: ExtensionGrant) {
        assert_eq!(grant.id, 7);
        let _ = self.ended.fetch_add(1, Ordering::SeqCst);
    }
}

/// An instance wired to an in-memory store and a manual clock.
pub struct Fixture {
    pub insights: Insights,
    pub store: Arc<SqliteEventStore>,
    pub clock: Arc<ManualClock>,
}

impl Fixture {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self::with_settings(settings(), transport)
    }

    pub fn with_settings(settings: InsightsSettings, transport: Arc<dyn Transport>) -> Self {
        Self::build(settings, transport, None)
    }

    pub fn build(
        settings: InsightsSettings,
        transport: Arc<dyn Transport>,
        host: Option<Arc<dyn BackgroundExecutionHost>>,
    ) -> Self {
        let clock = Arc::new(ManualClock::new(NOW));
        let store = Arc::new(SqliteEventStore::in_memory(clock.clone()).unwrap());
        let mut builder = Insights::builder(settings)
            .store(store.clone())
            .transport(transport)
            .clock(clock.clone())
            .device_info(Arc::new(StaticDeviceInfo(device())));
        if let Some(host) = host {
            builder = builder.background_host(host);
        }
        Self {
            insights: builder.build().unwrap(),
            store,
            clock,
        }
    }

    pub fn stored(&self) -> Vec<EventEnvelope> {
        self.store.load_before(i64::MAX).unwrap()
    }

    pub fn now(&self) -> i64 {
        self.clock.now_ms()
    }
}
