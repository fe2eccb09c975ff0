//! Poll scheduler for deferred try-on jobs.
//!
//! A [`PollSession`] owns the timed loop for exactly one submission: fixed
//! inter-tick delay, hard attempt ceiling, sequential ticks (the delay is
//! rescheduled after each tick resolves, never free-running), transient
//! transport tolerance, and a single last-chance status fetch before any
//! terminal error is surfaced.

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::error::TryOnError;
use crate::models::job::{JobHandle, TryOnSuccess};
use crate::services::backend::TryOnBackend;
use crate::services::reconcile::{reconcile, PollDecision};

/// Fixed delay between status checks.
pub const POLL_INTERVAL_MS: u64 = 2000;

/// Hard ceiling on status checks per session. 70 × 2 s ≈ 140 s, intentionally
/// above the advertised two-minute processing claim so jobs finishing near
/// the boundary are not failed spuriously.
pub const MAX_POLL_ATTEMPTS: u32 = 70;

/// Transport failures are absorbed until fewer than this many attempts
/// remain; after that a failing tick is terminal.
pub const TRANSPORT_FAILURE_WINDOW: u32 = 5;

/// Progress reported for one attempt: `min(95, round(100·attempt/max))`.
/// Capped below 100 until a terminal outcome is actually reached.
pub fn progress_estimate(attempt: u32, max_attempts: u32) -> u8 {
    let pct = (100.0 * f64::from(attempt) / f64::from(max_attempts)).round() as u8;
    pct.min(95)
}

/// One polling session for a deferred job. Owned exclusively by the caller
/// for the lifetime of one submission; consumed by [`PollSession::run`].
pub struct PollSession {
    handle: JobHandle,
    attempt: u32,
    max_attempts: u32,
    interval: Duration,
    started_at: DateTime<Utc>,
}

impl PollSession {
    pub fn new(handle: JobHandle) -> Self {
        Self::with_limits(handle, MAX_POLL_ATTEMPTS, Duration::from_millis(POLL_INTERVAL_MS))
    }

    /// Session with explicit budget, for configuration overrides and tests.
    pub fn with_limits(handle: JobHandle, max_attempts: u32, interval: Duration) -> Self {
        Self {
            handle,
            attempt: 0,
            max_attempts,
            interval,
            started_at: Utc::now(),
        }
    }

    fn remaining(&self) -> u32 {
        self.max_attempts.saturating_sub(self.attempt)
    }

    /// Drive the session to a terminal outcome.
    ///
    /// `progress` is invoked once per tick with the capped estimate, and
    /// once more with exactly 100 when a terminal decision is reached.
    /// Cancellation is cooperative: the caller drops or aborts the future
    /// and no further tick runs.
    pub async fn run(
        mut self,
        backend: &dyn TryOnBackend,
        progress: &(dyn Fn(u8) + Send + Sync),
    ) -> Result<TryOnSuccess, TryOnError> {
        loop {
            tokio::time::sleep(self.interval).await;
            self.attempt += 1;
            progress(progress_estimate(self.attempt, self.max_attempts));
            metrics::counter!("tryon_poll_ticks_total").increment(1);

            tracing::debug!(
                job_id = %self.handle.id,
                attempt = self.attempt,
                max_attempts = self.max_attempts,
                "Polling job status"
            );

            let snapshot = match backend.status(&self.handle.id).await {
                Ok(snapshot) => snapshot,
                Err(e) => {
                    metrics::counter!("tryon_poll_transient_errors_total").increment(1);
                    if self.remaining() < TRANSPORT_FAILURE_WINDOW {
                        return self.last_chance(backend, e, progress).await;
                    }
                    tracing::warn!(
                        job_id = %self.handle.id,
                        attempt = self.attempt,
                        error = %e,
                        "Status check failed, continuing to poll"
                    );
                    continue;
                }
            };

            match reconcile(&snapshot, self.attempt, self.max_attempts) {
                PollDecision::Success(url) => {
                    progress(100);
                    tracing::info!(
                        job_id = %self.handle.id,
                        attempt = self.attempt,
                        elapsed_ms = (Utc::now() - self.started_at).num_milliseconds(),
                        "Result image available"
                    );
                    return Ok(self.success(url));
                }
                PollDecision::Failure(e) => {
                    return self.last_chance(backend, e, progress).await;
                }
                PollDecision::ContinueTolerant => {
                    tracing::warn!(
                        job_id = %self.handle.id,
                        attempt = self.attempt,
                        "Status endpoint degraded, continuing to poll"
                    );
                    if self.attempt >= self.max_attempts {
                        return self
                            .last_chance(backend, TryOnError::PollTimeout, progress)
                            .await;
                    }
                }
                PollDecision::Continue => {}
            }
        }
    }

    /// One direct status fetch before surfacing a terminal error.
    ///
    /// The service's status and result fields can become consistent slightly
    /// after a transient error, so a result URL found here converts the
    /// outcome to success.
    async fn last_chance(
        self,
        backend: &dyn TryOnBackend,
        error: TryOnError,
        progress: &(dyn Fn(u8) + Send + Sync),
    ) -> Result<TryOnSuccess, TryOnError> {
        tracing::warn!(
            job_id = %self.handle.id,
            attempt = self.attempt,
            error = %error,
            "Terminal poll error, performing last-chance status fetch"
        );

        if let Ok(snapshot) = backend.status(&self.handle.id).await {
            if let Some(url) = snapshot.result_image_url.filter(|u| !u.is_empty()) {
                tracing::info!(
                    job_id = %self.handle.id,
                    "Last-chance fetch found a result image"
                );
                progress(100);
                return Ok(self.success(url));
            }
        }

        progress(100);
        Err(error)
    }

    fn success(self, result_image_url: String) -> TryOnSuccess {
        TryOnSuccess {
            result_image_url,
            user_image_url: self.handle.user_image_url,
            cloth_image_url: self.handle.cloth_image_url,
        }
    }
}
