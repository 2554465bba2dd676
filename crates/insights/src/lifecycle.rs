//! Host lifecycle handling.
//!
//! Two signals matter: entering the background and terminating. Hosts either
//! call [`Insights::on_entering_background`](crate::Insights::on_entering_background)
//! / [`Insights::on_terminating`](crate::Insights::on_terminating) directly or
//! post [`LifecycleEvent`]s through a [`LifecycleNotifier`], which a listener
//! task registered at construction dispatches.

use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::errors::{InsightsError, Result};
use crate::flush::{FlushController, FlushOutcome, FlushTrigger, join_flush};
use crate::worker::{self, Command};

/// Name under which background execution time is requested.
pub const BACKGROUND_TASK_NAME: &str = "FlushData";

/// Host lifecycle signals.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// The host is moving to the background.
    EnteringBackground,
    /// The host is about to exit.
    Terminating,
}

/// A window of extra execution time granted by the host.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtensionGrant {
    /// Host-assigned identifier, passed back on `end_extension`.
    pub id: u64,
    /// When the window closes; `None` means unbounded.
    pub deadline: Option<Instant>,
}

/// Grants finite execution time while the host is backgrounded.
pub trait BackgroundExecutionHost: Send + Sync {
    /// Ask for extra time. `None` means the host refused.
    fn request_extension(&self, name: &str) -> Option<ExtensionGrant>;

    /// Release a grant obtained from [`request_extension`](Self::request_extension).
    fn end_extension(&self, grant: ExtensionGrant);
}

/// Host with no background restrictions: every request gets an unbounded grant.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopBackgroundHost;

impl BackgroundExecutionHost for NoopBackgroundHost {
    fn request_extension(&self, _name: &str) -> Option<ExtensionGrant> {
        Some(ExtensionGrant {
            id: 0,
            deadline: None,
        })
    }

    fn end_extension(&self, _grant: ExtensionGrant) {}
}

/// Runs the background and termination flush sequences.
pub(crate) struct LifecycleHandler {
    commands: mpsc::Sender<Command>,
    flush: Arc<FlushController>,
    host: Arc<dyn BackgroundExecutionHost>,
}

impl LifecycleHandler {
    pub(crate) fn new(
        commands: mpsc::Sender<Command>,
        flush: Arc<FlushController>,
        host: Arc<dyn BackgroundExecutionHost>,
    ) -> Self {
        Self {
            commands,
            flush,
            host,
        }
    }

    /// Flush behind queued saves, waiting at most until the grant deadline.
    ///
    /// `Ok(None)` means the window closed first; the flush keeps running.
    pub(crate) async fn entering_background(&self) -> Result<Option<FlushOutcome>> {
        let grant = self.host.request_extension(BACKGROUND_TASK_NAME);
        if grant.is_none() {
            warn!("background execution extension refused");
        }
        let deadline = grant.as_ref().and_then(|g| g.deadline);

        let attempt = async {
            let outcome = match worker::request_flush(&self.commands, FlushTrigger::Background).await? {
                Some(handle) => join_flush(handle).await,
                None => FlushOutcome::Busy,
            };
            Ok::<_, InsightsError>(outcome)
        };
        let result = match deadline {
            Some(deadline) => match tokio::time::timeout_at(deadline, attempt).await {
                Ok(result) => result.map(Some),
                Err(_) => {
                    info!("background window closed before flush finished");
                    Ok(None)
                }
            },
            None => attempt.await.map(Some),
        };

        if let Some(grant) = grant {
            self.host.end_extension(grant);
        }
        result
    }

    /// Flush behind queued saves, then block until no flush is running.
    pub(crate) async fn terminating(&self) -> Result<FlushOutcome> {
        let queued = worker::request_flush(&self.commands, FlushTrigger::Termination).await;
        self.flush.wait_idle().await;
        match queued? {
            Some(handle) => Ok(join_flush(handle).await),
            None => Ok(FlushOutcome::Busy),
        }
    }

    async fn dispatch(&self, event: LifecycleEvent) {
        let result = match event {
            LifecycleEvent::EnteringBackground => self.entering_background().await.map(|_| ()),
            LifecycleEvent::Terminating => self.terminating().await.map(|_| ()),
        };
        if let Err(error) = result {
            warn!(?event, %error, "lifecycle flush failed");
        }
    }
}

type Notification = (LifecycleEvent, Option<oneshot::Sender<()>>);

/// Posts lifecycle signals to an [`Insights`](crate::Insights) instance.
///
/// Cloneable; every clone targets the same listener. Once the instance is
/// invalidated every post fails with [`InsightsError::ObserverRemoved`].
#[derive(Clone, Debug)]
pub struct LifecycleNotifier {
    tx: mpsc::UnboundedSender<Notification>,
}

impl LifecycleNotifier {
    /// Post `event` without waiting for it to be handled.
    pub fn notify(&self, event: LifecycleEvent) -> Result<()> {
        self.tx
            .send((event, None))
            .map_err(|_| InsightsError::ObserverRemoved)
    }

    /// Post `event` and wait until its flush sequence has finished.
    pub async fn notify_and_wait(&self, event: LifecycleEvent) -> Result<()> {
        let (ack, done) = oneshot::channel();
        self.tx
            .send((event, Some(ack)))
            .map_err(|_| InsightsError::ObserverRemoved)?;
        done.await.map_err(|_| InsightsError::ObserverRemoved)
    }
}

/// Start the listener task behind a new [`LifecycleNotifier`].
pub(crate) fn spawn_listener(
    handler: Arc<LifecycleHandler>,
    runtime: &Handle,
) -> (LifecycleNotifier, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::unbounded_channel::<Notification>();
    let task = runtime.spawn(async move {
        while let Some((event, ack)) = rx.recv().await {
            debug!(?event, "lifecycle event received");
            handler.dispatch(event).await;
            if let Some(ack) = ack {
                let _ = ack.send(());
            }
        }
    });
    (LifecycleNotifier { tx }, task)
}
