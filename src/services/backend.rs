//! Transport seam for the remote try-on service.
//!
//! The lifecycle core (submitter, scheduler, controller) only talks to
//! [`TryOnBackend`]; [`HttpTryOnBackend`] implements it over the service's
//! HTTP contract, and tests substitute scripted implementations.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};

use crate::error::TryOnError;
use crate::models::job::{ApiRejection, Envelope, JobStatusSnapshot, SubmitData};

/// Network operations the job lifecycle depends on.
#[async_trait]
pub trait TryOnBackend: Send + Sync {
    /// Fetch the garment image bytes. Any failure here means no remote job
    /// is ever created.
    async fn fetch_garment(&self, url: &str) -> Result<Vec<u8>, TryOnError>;

    /// One multipart submission round trip. Errors are submission-terminal.
    async fn submit(
        &self,
        photo: Vec<u8>,
        garment: Vec<u8>,
        category_id: &str,
    ) -> Result<SubmitData, TryOnError>;

    /// Fetch the current status of a deferred job. Errors here are
    /// transport-level; the scheduler decides whether they are tolerable.
    async fn status(&self, job_id: &str) -> Result<JobStatusSnapshot, TryOnError>;
}

/// HTTP client for the try-on service
/// (`POST /api/try-on`, `GET /api/try-on/{id}`).
pub struct HttpTryOnBackend {
    http: reqwest::Client,
    base_url: String,
}

impl HttpTryOnBackend {
    pub fn new(base_url: &str) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl TryOnBackend for HttpTryOnBackend {
    async fn fetch_garment(&self, url: &str) -> Result<Vec<u8>, TryOnError> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| TryOnError::GarmentUnavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TryOnError::GarmentUnavailable(format!("HTTP {status}")));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| TryOnError::GarmentUnavailable(e.to_string()))?;
        Ok(bytes.to_vec())
    }

    async fn submit(
        &self,
        photo: Vec<u8>,
        garment: Vec<u8>,
        category_id: &str,
    ) -> Result<SubmitData, TryOnError> {
        let form = Form::new()
            .part("user_image", Part::bytes(photo).file_name("user_image.png"))
            .part("cloth_image", Part::bytes(garment).file_name("cloth_image.png"))
            .text("category_id", category_id.to_string());

        let response = self
            .http
            .post(format!("{}/api/try-on", self.base_url))
            .multipart(form)
            .send()
            .await
            .map_err(|e| TryOnError::RemoteRejected(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response
                .json::<ApiRejection>()
                .await
                .ok()
                .and_then(ApiRejection::into_detail)
                .unwrap_or_else(|| format!("HTTP {status}"));
            return Err(TryOnError::RemoteRejected(detail));
        }

        let envelope: Envelope<SubmitData> = response
            .json()
            .await
            .map_err(|e| TryOnError::RemoteRejected(format!("malformed response: {e}")))?;
        Ok(envelope.data)
    }

    async fn status(&self, job_id: &str) -> Result<JobStatusSnapshot, TryOnError> {
        let response = self
            .http
            .get(format!("{}/api/try-on/{}", self.base_url, job_id))
            .send()
            .await
            .map_err(|e| TryOnError::TransientPollError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TryOnError::TransientPollError(format!("HTTP {status}")));
        }

        let envelope: Envelope<JobStatusSnapshot> = response
            .json()
            .await
            .map_err(|e| TryOnError::TransientPollError(format!("malformed response: {e}")))?;
        Ok(envelope.data)
    }
}
