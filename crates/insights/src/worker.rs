//! Serial worker.
//!
//! Tracking calls and flush requests are processed in FIFO order by a single
//! task, so saves never race each other and a flush requested after a track
//! call sees that event in the store.

use std::sync::Arc;

use insights_store::EventStore;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use crate::counter::BatchCounter;
use crate::enricher::{EventEnricher, TrackRequest};
use crate::errors::{InsightsError, Result};
use crate::flush::{FlushController, FlushOutcome, FlushTrigger};

pub(crate) enum Command {
    Track(Box<TrackRequest>),
    Flush {
        trigger: FlushTrigger,
        reply: oneshot::Sender<Option<JoinHandle<FlushOutcome>>>,
    },
    Sync {
        reply: oneshot::Sender<()>,
    },
}

pub(crate) struct Worker {
    enricher: EventEnricher,
    store: Arc<dyn EventStore>,
    counter: Arc<BatchCounter>,
    flush: Arc<FlushController>,
}

impl Worker {
    pub(crate) fn new(
        enricher: EventEnricher,
        store: Arc<dyn EventStore>,
        counter: Arc<BatchCounter>,
        flush: Arc<FlushController>,
    ) -> Self {
        Self {
            enricher,
            store,
            counter,
            flush,
        }
    }

    pub(crate) fn spawn(self, runtime: &Handle, capacity: usize) -> (mpsc::Sender<Command>, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let handle = runtime.spawn(self.run(rx));
        (tx, handle)
    }

    async fn run(self, mut rx: mpsc::Receiver<Command>) {
        while let Some(command) = rx.recv().await {
            match command {
                Command::Track(request) => self.track(&request),
                Command::Flush { trigger, reply } => {
                    let _ = reply.send(self.flush.spawn_if_idle(trigger));
                }
                Command::Sync { reply } => {
                    let _ = reply.send(());
                }
            }
        }
        debug!("event worker stopped");
    }

    fn track(&self, request: &TrackRequest) {
        let envelope = self.enricher.enrich(request);
        let payload = match serde_json::to_vec(&envelope) {
            Ok(payload) => payload,
            Err(error) => {
                error!(kind = %request.kind, %error, "failed to encode event");
                return;
            }
        };
        if let Err(error) = self.store.save(&payload) {
            error!(kind = %request.kind, %error, "failed to save event");
            return;
        }
        if self.counter.record_save() {
            debug!(count = self.counter.observed(), "batch threshold reached");
            // The spawned flush owns the permit; nothing waits on it here.
            let _ = self.flush.spawn_if_idle(FlushTrigger::Threshold);
        }
    }
}

/// Queue a tracking call without waiting. Drops the event when the queue is
/// full or closed.
pub(crate) fn enqueue_track(commands: &mpsc::Sender<Command>, request: TrackRequest) {
    let kind = request.kind;
    match commands.try_send(Command::Track(Box::new(request))) {
        Ok(()) => {}
        Err(mpsc::error::TrySendError::Full(_)) => {
            warn!(%kind, "event queue full, dropping event");
        }
        Err(mpsc::error::TrySendError::Closed(_)) => {
            warn!(%kind, "event queue closed, dropping event");
        }
    }
}

/// Queue a flush behind everything already queued and return the spawned
/// flush task, or `None` when another flush holds the resource.
pub(crate) async fn request_flush(
    commands: &mpsc::Sender<Command>,
    trigger: FlushTrigger,
) -> Result<Option<JoinHandle<FlushOutcome>>> {
    let (reply, rx) = oneshot::channel();
    commands
        .send(Command::Flush { trigger, reply })
        .await
        .map_err(|_| InsightsError::QueueClosed)?;
    rx.await.map_err(|_| InsightsError::QueueClosed)
}

/// Wait until every command queued before this call has been processed.
pub(crate) async fn sync(commands: &mpsc::Sender<Command>) -> Result<()> {
    let (reply, rx) = oneshot::channel();
    commands
        .send(Command::Sync { reply })
        .await
        .map_err(|_| InsightsError::QueueClosed)?;
    rx.await.map_err(|_| InsightsError::QueueClosed)
}
