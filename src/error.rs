//! Error taxonomy for the try-on job lifecycle.
//!
//! Submission-time and poll-terminal errors surface directly to the UI with
//! human-readable detail; transient per-tick errors are absorbed by the poll
//! scheduler until its tolerance window closes. History and audit write
//! failures live in their own modules and are downgraded to warnings, never
//! failing a completed try-on.

/// A terminal error for one try-on submission.
///
/// `Display` is the exact detail string shown to the user, so variants that
/// carry a remote-supplied message format it verbatim.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TryOnError {
    /// Request metadata failed validation before any network call.
    #[error("invalid try-on request: {0}")]
    InvalidRequest(String),

    /// The user photo is not a decodable image payload.
    #[error("photo is not a decodable image: {0}")]
    InvalidPhoto(String),

    /// The garment image could not be fetched; no remote job was created.
    #[error("garment image unavailable: {0}")]
    GarmentUnavailable(String),

    /// The remote service returned non-2xx at submission time.
    #[error("try-on service rejected the submission: {0}")]
    RemoteRejected(String),

    /// A status check failed at the network layer. Recoverable unless it
    /// lands within the final attempts of the poll budget.
    #[error("status check failed: {0}")]
    TransientPollError(String),

    /// The remote service explicitly reported failure. The detail is the
    /// service's `error` field, surfaced verbatim.
    #[error("{0}")]
    ProcessingFailed(String),

    /// The attempt budget was exhausted without a terminal result.
    #[error("timed out waiting for the try-on result")]
    PollTimeout,
}
