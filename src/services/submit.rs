//! Job submission: validate the request, fetch the garment, perform one
//! multipart round trip, and classify the response as immediate or deferred.

use garde::Validate;

use crate::error::TryOnError;
use crate::models::job::{JobHandle, JobStatus, SubmitData, Submission, TryOnRequest, TryOnSuccess};
use crate::services::backend::TryOnBackend;

/// Submit one try-on request.
///
/// Side-effect free beyond the network calls: touches neither history nor
/// UI state. The garment fetch happens before the submission POST, so a
/// missing garment never creates a job server-side.
pub async fn submit(
    backend: &dyn TryOnBackend,
    request: &TryOnRequest,
) -> Result<Submission, TryOnError> {
    request
        .validate()
        .map_err(|e| TryOnError::InvalidRequest(e.to_string()))?;

    image::guess_format(&request.user_photo).map_err(|e| TryOnError::InvalidPhoto(e.to_string()))?;

    tracing::debug!(
        garment_url = %request.garment_image_url,
        category = %request.category_id,
        "Fetching garment image"
    );
    let garment = backend.fetch_garment(&request.garment_image_url).await?;

    metrics::counter!("tryon_jobs_submitted_total").increment(1);
    tracing::info!(
        category = %request.category_id,
        photo_bytes = request.user_photo.len(),
        garment_bytes = garment.len(),
        "Submitting try-on job"
    );

    let data = backend
        .submit(request.user_photo.clone(), garment, &request.category_id)
        .await?;

    classify(data)
}

/// Classify a 2xx submission response.
///
/// A present result URL is an immediate success regardless of `status`;
/// otherwise a pending status with a job id defers to the poll scheduler.
/// Anything else is a protocol violation.
fn classify(data: SubmitData) -> Result<Submission, TryOnError> {
    if let Some(url) = data.result_image_url.filter(|u| !u.is_empty()) {
        return Ok(Submission::Immediate(TryOnSuccess {
            result_image_url: url,
            user_image_url: data.user_image_url,
            cloth_image_url: data.cloth_image_url,
        }));
    }

    match (data.status, data.id) {
        (Some(JobStatus::Pending), Some(id)) => {
            tracing::info!(job_id = %id, "Try-on job accepted as pending");
            Ok(Submission::Deferred(JobHandle {
                id,
                initial_status: JobStatus::Pending,
                user_image_url: data.user_image_url,
                cloth_image_url: data.cloth_image_url,
            }))
        }
        _ => Err(TryOnError::RemoteRejected(
            "submission response carried neither a result image nor a pending job id".to_string(),
        )),
    }
}
