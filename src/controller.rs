//! Try-on controller: the state machine that orchestrates submitter,
//! scheduler, and reconciler for one live session.
//!
//! States: `Idle → Submitting → [Polling] → {Succeeded | Failed}`; an
//! immediate result skips `Polling`. The controller owns at most one live
//! session; starting a new submission cancels the previous one, and dropping
//! the controller tears the session down. State is published on a
//! `tokio::sync::watch` channel so any UI can subscribe without the core
//! knowing about it.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::error::TryOnError;
use crate::models::history::{HistoryEntry, PathRecord, ProductRef};
use crate::models::job::{Submission, TryOnRequest, TryOnSuccess};
use crate::services::audit::PathAudit;
use crate::services::backend::TryOnBackend;
use crate::services::history::HistoryRecorder;
use crate::services::poll::{PollSession, MAX_POLL_ATTEMPTS, POLL_INTERVAL_MS};
use crate::services::submit;

/// UI-visible state of the try-on flow.
#[derive(Debug, Clone, PartialEq)]
pub enum TryOnState {
    Idle,
    Submitting,
    Polling { progress: u8 },
    Succeeded(TryOnSuccess),
    Failed { detail: String },
}

impl TryOnState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TryOnState::Succeeded(_) | TryOnState::Failed { .. })
    }
}

/// Orchestrates one try-on submission at a time.
pub struct TryOnController {
    inner: Arc<ControllerInner>,
    session: Mutex<Option<JoinHandle<()>>>,
}

struct ControllerInner {
    backend: Arc<dyn TryOnBackend>,
    history: Arc<dyn HistoryRecorder>,
    audit: Arc<dyn PathAudit>,
    state_tx: watch::Sender<TryOnState>,
    /// Identity of the current session. Every state publication carries the
    /// generation it was produced under, so a tick resolving after
    /// cancellation can never mutate state.
    generation: AtomicU64,
    max_attempts: u32,
    interval: Duration,
}

impl TryOnController {
    pub fn new(
        backend: Arc<dyn TryOnBackend>,
        history: Arc<dyn HistoryRecorder>,
        audit: Arc<dyn PathAudit>,
    ) -> Self {
        Self::with_limits(
            backend,
            history,
            audit,
            MAX_POLL_ATTEMPTS,
            Duration::from_millis(POLL_INTERVAL_MS),
        )
    }

    /// Controller with an explicit poll budget, for configuration overrides
    /// and tests.
    pub fn with_limits(
        backend: Arc<dyn TryOnBackend>,
        history: Arc<dyn HistoryRecorder>,
        audit: Arc<dyn PathAudit>,
        max_attempts: u32,
        interval: Duration,
    ) -> Self {
        let (state_tx, _) = watch::channel(TryOnState::Idle);
        Self {
            inner: Arc::new(ControllerInner {
                backend,
                history,
                audit,
                state_tx,
                generation: AtomicU64::new(0),
                max_attempts,
                interval,
            }),
            session: Mutex::new(None),
        }
    }

    /// Subscribe to state changes.
    pub fn subscribe(&self) -> watch::Receiver<TryOnState> {
        self.inner.state_tx.subscribe()
    }

    /// Current state snapshot.
    pub fn state(&self) -> TryOnState {
        self.inner.state_tx.borrow().clone()
    }

    /// Start a new try-on submission.
    ///
    /// Any live session is cancelled first; at most one session exists per
    /// controller. The work runs on a spawned task, with progress and the
    /// terminal outcome published through the watch channel.
    pub fn start(&self, request: TryOnRequest, product: ProductRef) {
        self.cancel();

        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let inner = Arc::clone(&self.inner);
        inner.publish(generation, TryOnState::Submitting);

        let task = tokio::spawn(async move {
            inner.run(generation, request, product).await;
        });
        *self.session_guard() = Some(task);
    }

    /// Cancel the live session, if any.
    ///
    /// Bumps the generation before aborting so that even a tick already past
    /// its await point cannot publish stale state. No tick callback fires
    /// after this returns.
    pub fn cancel(&self) {
        self.inner.generation.fetch_add(1, Ordering::SeqCst);
        if let Some(task) = self.session_guard().take() {
            task.abort();
        }
    }

    fn session_guard(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        match self.session.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Drop for TryOnController {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl ControllerInner {
    /// Publish a state update attributed to `generation`, dropping it if a
    /// newer session has started since.
    fn publish(&self, generation: u64, state: TryOnState) {
        if self.generation.load(Ordering::SeqCst) != generation {
            tracing::debug!("Discarding state update from a cancelled session");
            return;
        }
        let _ = self.state_tx.send(state);
    }

    async fn run(&self, generation: u64, request: TryOnRequest, product: ProductRef) {
        match self.drive(generation, &request).await {
            Ok(success) => {
                metrics::counter!("tryon_jobs_completed_total").increment(1);
                self.publish(generation, TryOnState::Succeeded(success.clone()));
                self.record(&success, &product).await;
            }
            Err(e) => {
                metrics::counter!("tryon_jobs_failed_total").increment(1);
                tracing::error!(error = %e, "Try-on failed");
                self.publish(
                    generation,
                    TryOnState::Failed {
                        detail: e.to_string(),
                    },
                );
            }
        }
    }

    async fn drive(
        &self,
        generation: u64,
        request: &TryOnRequest,
    ) -> Result<TryOnSuccess, TryOnError> {
        match submit::submit(self.backend.as_ref(), request).await? {
            Submission::Immediate(success) => {
                tracing::info!("Submission returned an immediate result, no polling needed");
                Ok(success)
            }
            Submission::Deferred(handle) => {
                self.publish(generation, TryOnState::Polling { progress: 0 });
                let session = PollSession::with_limits(handle, self.max_attempts, self.interval);
                let progress = |pct: u8| {
                    self.publish(generation, TryOnState::Polling { progress: pct });
                };
                session.run(self.backend.as_ref(), &progress).await
            }
        }
    }

    /// Record the terminal success with the history and audit collaborators.
    /// Their failures are warnings only and never revert a success.
    async fn record(&self, success: &TryOnSuccess, product: &ProductRef) {
        let entry = HistoryEntry {
            product_id: product.id.clone(),
            product_name: product.name.clone(),
            product_image: product.image.clone(),
            user_image_url: success.user_image_url.clone(),
            cloth_image_url: success.cloth_image_url.clone(),
            result_image_url: success.result_image_url.clone(),
            status: "completed".to_string(),
        };
        if let Err(e) = self.history.record(&entry).await {
            tracing::warn!(error = %e, "Try-on succeeded but history write failed");
        }

        let record = PathRecord {
            timestamp: Utc::now(),
            user_image: success
                .user_image_url
                .clone()
                .unwrap_or_else(|| "in-memory image".to_string()),
            product_image: product.image.clone(),
            result_image: success.result_image_url.clone(),
        };
        if let Err(e) = self.audit.append(&record).await {
            tracing::warn!(error = %e, "Try-on succeeded but audit write failed");
        }
    }
}
