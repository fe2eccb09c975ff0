use garde::Validate;
use serde::{Deserialize, Serialize};

/// Status of a try-on job as reported by the remote service.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

/// One try-on submission: the user photo, the garment to composite onto it,
/// and the garment's category. Constructed once per attempt, never mutated.
#[derive(Debug, Clone, Validate)]
pub struct TryOnRequest {
    /// Raw photo bytes. Must be a decodable image; checked by the submitter
    /// with `image::guess_format` before any network I/O.
    #[garde(skip)]
    pub user_photo: Vec<u8>,

    /// URL of the garment image to fetch and forward to the service.
    #[garde(length(min = 1, max = 2048))]
    pub garment_image_url: String,

    #[garde(length(min = 1, max = 64))]
    pub category_id: String,
}

/// Opaque handle for a deferred job, built from the submission response.
///
/// The handle is authoritative for identity: every status snapshot is
/// attributed to the handle that produced it and never cross-applied to a
/// different submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobHandle {
    pub id: String,
    pub initial_status: JobStatus,
    /// Service-hosted copy of the user photo, echoed at submission time.
    pub user_image_url: Option<String>,
    /// Service-hosted copy of the garment image.
    pub cloth_image_url: Option<String>,
}

/// One poll tick's view of the job. Not retained beyond the tick that
/// produced the terminal decision.
#[derive(Debug, Clone, Deserialize)]
pub struct JobStatusSnapshot {
    pub status: JobStatus,
    #[serde(default)]
    pub result_image_url: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Terminal success value committed to UI state and the history recorder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TryOnSuccess {
    pub result_image_url: String,
    pub user_image_url: Option<String>,
    pub cloth_image_url: Option<String>,
}

/// Outcome of one submission round trip.
#[derive(Debug, Clone)]
pub enum Submission {
    /// The response already carried a result image; no polling needed.
    Immediate(TryOnSuccess),
    /// The job was accepted as pending; poll with the handle.
    Deferred(JobHandle),
}

/// JSON envelope wrapping every response body from the try-on service.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub data: T,
}

/// `data` payload of a 2xx submission response.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitData {
    #[serde(default)]
    pub status: Option<JobStatus>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub result_image_url: Option<String>,
    #[serde(default)]
    pub user_image_url: Option<String>,
    #[serde(default)]
    pub cloth_image_url: Option<String>,
}

/// Body of a non-2xx response from the try-on service.
#[derive(Debug, Default, Deserialize)]
pub struct ApiRejection {
    #[serde(default)]
    pub detail: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ApiRejection {
    /// Best human-readable detail: `detail` over `error`, if either is set.
    pub fn into_detail(self) -> Option<String> {
        self.detail.or(self.error)
    }
}
