//! The [`Insights`] handle.
//!
//! Built once per process (or per test) with [`Insights::builder`]. Building
//! spawns the serial worker and the lifecycle listener on the current Tokio
//! runtime.

use std::collections::HashMap;
use std::sync::Arc;

use insights_core::{Clock, ErrorInfo, SystemClock};
use insights_settings::InsightsSettings;
use insights_store::{ConnectionConfig, EventStore, SqliteEventStore};
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use uuid::Uuid;

use crate::counter::BatchCounter;
use crate::device::{DeviceInfoProvider, StaticDeviceInfo};
use crate::enricher::{EventEnricher, TrackRequest};
use crate::errors::Result;
use crate::flush::{FlushController, FlushOutcome, FlushTrigger, join_flush};
use crate::lifecycle::{
    BackgroundExecutionHost, LifecycleHandler, LifecycleNotifier, NoopBackgroundHost,
    spawn_listener,
};
use crate::transport::{HttpTransport, Transport};
use crate::worker::{self, Command, Worker};

/// Assembles an [`Insights`] instance. Every collaborator has a default.
pub struct InsightsBuilder {
    settings: InsightsSettings,
    store: Option<Arc<dyn EventStore>>,
    transport: Option<Arc<dyn Transport>>,
    device: Option<Arc<dyn DeviceInfoProvider>>,
    clock: Option<Arc<dyn Clock>>,
    background: Option<Arc<dyn BackgroundExecutionHost>>,
}

impl InsightsBuilder {
    fn new(settings: InsightsSettings) -> Self {
        Self {
            settings,
            store: None,
            transport: None,
            device: None,
            clock: None,
            background: None,
        }
    }

    /// Use `store` instead of the `SQLite` database from settings.
    #[must_use]
    pub fn store(mut self, store: Arc<dyn EventStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Use `transport` instead of the HTTP transport.
    #[must_use]
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Use `device` instead of host detection.
    #[must_use]
    pub fn device_info(mut self, device: Arc<dyn DeviceInfoProvider>) -> Self {
        self.device = Some(device);
        self
    }

    /// Use `clock` instead of the system clock.
    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Use `host` for background execution grants.
    #[must_use]
    pub fn background_host(mut self, host: Arc<dyn BackgroundExecutionHost>) -> Self {
        self.background = Some(host);
        self
    }

    /// Validate settings, open defaults for missing collaborators and start
    /// the worker and lifecycle listener.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn build(self) -> Result<Insights> {
        let runtime = Handle::try_current()?;
        let settings = self.settings;
        settings.validate()?;

        let clock: Arc<dyn Clock> = match self.clock {
            Some(clock) => clock,
            None => Arc::new(SystemClock),
        };
        let device: Arc<dyn DeviceInfoProvider> = match self.device {
            Some(device) => device,
            None => Arc::new(StaticDeviceInfo::detect()),
        };
        let store: Arc<dyn EventStore> = match self.store {
            Some(store) => store,
            None => {
                let path = settings.storage.resolved_database_path();
                let config = ConnectionConfig {
                    pool_size: settings.storage.pool_size,
                    busy_timeout_ms: settings.storage.busy_timeout_ms,
                };
                Arc::new(SqliteEventStore::open(&path, &config, Arc::clone(&clock))?)
            }
        };
        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(HttpTransport::new(&settings, &device.device_info())?),
        };
        let background: Arc<dyn BackgroundExecutionHost> = match self.background {
            Some(host) => host,
            None => Arc::new(NoopBackgroundHost),
        };

        let counter = Arc::new(BatchCounter::new(settings.batching.max_batch_size));
        match store.count() {
            Ok(count) => counter.resync(count),
            Err(error) => warn!(%error, "failed to count stored events"),
        }
        let flush = Arc::new(FlushController::new(
            Arc::clone(&store),
            Arc::clone(&transport),
            Arc::clone(&clock),
            Arc::clone(&counter),
            settings.batching.stale_threshold_ms(),
        ));

        let visit_id = Uuid::new_v4().to_string();
        let enricher = EventEnricher::new(&settings, visit_id.clone(), device, clock);
        let (commands, _worker) = Worker::new(enricher, Arc::clone(&store), counter, Arc::clone(&flush))
            .spawn(&runtime, settings.batching.queue_capacity);

        let lifecycle = Arc::new(LifecycleHandler::new(
            commands.clone(),
            Arc::clone(&flush),
            background,
        ));
        let (notifier, listener) = spawn_listener(Arc::clone(&lifecycle), &runtime);

        info!(
            visit_id = %visit_id,
            environment = %settings.environment,
            api_url = %settings.api_url,
            "insights started"
        );

        Ok(Insights {
            settings,
            visit_id,
            commands,
            store,
            transport,
            flush,
            lifecycle,
            notifier,
            listener: Mutex::new(Some(listener)),
        })
    }
}

/// Handle through which the host tracks events.
///
/// Tracking calls queue work for the serial worker and return immediately;
/// they never fail. Dropping the last handle lets the worker drain the queue
/// and stop.
pub struct Insights {
    settings: InsightsSettings,
    visit_id: String,
    commands: mpsc::Sender<Command>,
    store: Arc<dyn EventStore>,
    transport: Arc<dyn Transport>,
    flush: Arc<FlushController>,
    lifecycle: Arc<LifecycleHandler>,
    notifier: LifecycleNotifier,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl std::fmt::Debug for Insights {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Insights")
            .field("visit_id", &self.visit_id)
            .field("environment", &self.settings.environment)
            .field("api_url", &self.settings.api_url)
            .finish_non_exhaustive()
    }
}

impl Insights {
    /// Start assembling an instance from `settings`.
    pub fn builder(settings: InsightsSettings) -> InsightsBuilder {
        InsightsBuilder::new(settings)
    }

    /// Track a click on `link`.
    ///
    /// `params` are extra fields keyed by wire name (`goal`,
    /// `hyperwallet_ea_country`, ...).
    pub fn track_click(
        &self,
        page_name: impl Into<String>,
        page_group: impl Into<String>,
        link: impl Into<String>,
        params: HashMap<String, String>,
    ) {
        self.track(TrackRequest::click(page_name, page_group, link, params));
    }

    /// Track an error shown on a page.
    pub fn track_error(
        &self,
        page_name: impl Into<String>,
        page_group: impl Into<String>,
        error_info: ErrorInfo,
    ) {
        self.track(TrackRequest::error(page_name, page_group, error_info));
    }

    /// Track a page impression.
    pub fn track_impression(
        &self,
        page_name: impl Into<String>,
        page_group: impl Into<String>,
        params: HashMap<String, String>,
    ) {
        self.track(TrackRequest::impression(page_name, page_group, params));
    }

    /// Queue an arbitrary tracking request.
    pub fn track(&self, request: TrackRequest) {
        worker::enqueue_track(&self.commands, request);
    }

    /// Flush after everything queued so far, returning
    /// [`FlushOutcome::Busy`] if another flush is running.
    pub async fn flush(&self) -> Result<FlushOutcome> {
        match worker::request_flush(&self.commands, FlushTrigger::Manual).await? {
            Some(handle) => Ok(join_flush(handle).await),
            None => Ok(FlushOutcome::Busy),
        }
    }

    /// Wait until every call queued before this one has been processed.
    pub async fn drain(&self) -> Result<()> {
        worker::sync(&self.commands).await
    }

    /// Number of events waiting in the local store.
    pub async fn pending_events(&self) -> Result<u64> {
        self.drain().await?;
        Ok(self.store.count()?)
    }

    /// Background-entry flush. See [`LifecycleEvent::EnteringBackground`](crate::LifecycleEvent).
    ///
    /// Returns `Ok(None)` when the granted window closed before the flush
    /// finished; the flush itself is never cancelled.
    pub async fn on_entering_background(&self) -> Result<Option<FlushOutcome>> {
        self.lifecycle.entering_background().await
    }

    /// Termination flush: flushes and then blocks until no flush is running.
    pub async fn on_terminating(&self) -> Result<FlushOutcome> {
        self.lifecycle.terminating().await
    }

    /// A notifier bound to this instance's lifecycle listener.
    pub fn lifecycle_notifier(&self) -> LifecycleNotifier {
        self.notifier.clone()
    }

    /// Whether a flush is currently running.
    pub fn is_flushing(&self) -> bool {
        !self.flush.is_idle()
    }

    /// Invalidate the transport and remove the lifecycle observer.
    ///
    /// Tracking still stores events, but no further batch can be delivered.
    pub fn invalidate(&self) {
        self.transport.invalidate();
        self.remove_observer();
        info!(visit_id = %self.visit_id, "insights invalidated");
    }

    /// Random identifier of this visit.
    pub fn visit_id(&self) -> &str {
        &self.visit_id
    }

    /// Settings this instance was built with.
    pub fn settings(&self) -> &InsightsSettings {
        &self.settings
    }

    fn remove_observer(&self) {
        if let Some(listener) = self.listener.lock().take() {
            listener.abort();
        }
    }
}

impl Drop for Insights {
    fn drop(&mut self) {
        self.remove_observer();
    }
}
