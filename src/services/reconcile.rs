//! Per-tick decision logic for the poll loop.
//!
//! [`reconcile`] is a pure function over one status snapshot plus the session
//! counters, so the precedence rules can be tested without any networking.

use crate::error::TryOnError;
use crate::models::job::{JobStatus, JobStatusSnapshot};

/// Detail used when the service reports failure without an `error` field.
pub const DEFAULT_FAILURE_DETAIL: &str = "Processing failed";

/// Within this many remaining attempts, `completed` with no result URL stops
/// being tolerated and becomes terminal.
pub const COMPLETED_STALL_WINDOW: u32 = 10;

/// What the scheduler should do after one poll tick.
#[derive(Debug, Clone, PartialEq)]
pub enum PollDecision {
    /// Nothing terminal yet; schedule the next tick.
    Continue,
    /// Keep polling, but the service signalled a transient degradation.
    ContinueTolerant,
    /// Terminal success with the result image URL.
    Success(String),
    /// Terminal failure.
    Failure(TryOnError),
}

/// Decide the fate of a poll session from one status snapshot.
///
/// Precedence, checked in order regardless of the declared `status`:
/// 1. a non-empty `result_image_url` wins outright;
/// 2. `failed` is terminal, with the service's `error` as detail;
/// 3. a `message` containing "unavailable" is a transient signal from the
///    service, tolerated like a recoverable tick;
/// 4. `completed` without a result URL keeps polling until fewer than
///    [`COMPLETED_STALL_WINDOW`] attempts remain;
/// 5. exhausting `max_attempts` is a timeout.
///
/// The status and result fields of the remote service are known to become
/// consistent slightly after one another, which is why result presence
/// outranks the status field.
pub fn reconcile(snapshot: &JobStatusSnapshot, attempt: u32, max_attempts: u32) -> PollDecision {
    if let Some(url) = snapshot.result_image_url.as_deref().filter(|u| !u.is_empty()) {
        return PollDecision::Success(url.to_string());
    }

    if snapshot.status == JobStatus::Failed {
        let detail = snapshot
            .error
            .clone()
            .unwrap_or_else(|| DEFAULT_FAILURE_DETAIL.to_string());
        return PollDecision::Failure(TryOnError::ProcessingFailed(detail));
    }

    // Heuristic carried over from the service's observed behavior: a message
    // mentioning "unavailable" means the status endpoint itself is degraded,
    // not that the job failed.
    if let Some(message) = snapshot.message.as_deref() {
        if message.contains("unavailable") {
            return PollDecision::ContinueTolerant;
        }
    }

    if snapshot.status == JobStatus::Completed {
        let remaining = max_attempts.saturating_sub(attempt);
        if remaining < COMPLETED_STALL_WINDOW {
            return PollDecision::Failure(TryOnError::ProcessingFailed(
                "processing reported complete but no result image was produced".to_string(),
            ));
        }
        return PollDecision::Continue;
    }

    if attempt >= max_attempts {
        return PollDecision::Failure(TryOnError::PollTimeout);
    }

    PollDecision::Continue
}
