//! Scripted collaborators for lifecycle testing: no networking involved.
#![allow(dead_code)] // each test binary uses its own subset of helpers

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::{watch, Notify};

use styletry_tryon::controller::TryOnState;
use styletry_tryon::error::TryOnError;
use styletry_tryon::models::history::{HistoryEntry, PathRecord, ProductRef};
use styletry_tryon::models::job::{JobStatus, JobStatusSnapshot, SubmitData, TryOnRequest};
use styletry_tryon::services::audit::{AuditError, PathAudit};
use styletry_tryon::services::backend::TryOnBackend;
use styletry_tryon::services::history::{HistoryError, HistoryRecorder};

/// Smallest payload `image::guess_format` accepts as PNG.
pub const TINY_PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

pub fn request() -> TryOnRequest {
    TryOnRequest {
        user_photo: TINY_PNG.to_vec(),
        garment_image_url: "https://cdn/garment.png".to_string(),
        category_id: "shirts".to_string(),
    }
}

pub fn product() -> ProductRef {
    ProductRef {
        id: "prod-1".to_string(),
        name: "Linen Shirt".to_string(),
        image: "https://cdn/linen-shirt.png".to_string(),
    }
}

pub fn snapshot(status: JobStatus) -> JobStatusSnapshot {
    JobStatusSnapshot {
        status,
        result_image_url: None,
        message: None,
        error: None,
    }
}

pub fn snapshot_with_url(status: JobStatus, url: &str) -> JobStatusSnapshot {
    JobStatusSnapshot {
        result_image_url: Some(url.to_string()),
        ..snapshot(status)
    }
}

pub fn failed_snapshot(error: &str) -> JobStatusSnapshot {
    JobStatusSnapshot {
        error: Some(error.to_string()),
        ..snapshot(JobStatus::Failed)
    }
}

pub fn pending_submit(id: &str) -> SubmitData {
    SubmitData {
        status: Some(JobStatus::Pending),
        id: Some(id.to_string()),
        result_image_url: None,
        user_image_url: Some("https://cdn/user-copy.png".to_string()),
        cloth_image_url: Some("https://cdn/cloth-copy.png".to_string()),
    }
}

pub fn immediate_submit(url: &str) -> SubmitData {
    SubmitData {
        result_image_url: Some(url.to_string()),
        ..pending_submit("unused")
    }
}

/// Block until the controller publishes a terminal state.
pub async fn wait_terminal(rx: &mut watch::Receiver<TryOnState>) -> TryOnState {
    loop {
        let state = rx.borrow_and_update().clone();
        if state.is_terminal() {
            return state;
        }
        rx.changed().await.expect("controller state channel closed");
    }
}

/// Block until the controller reports polling progress.
pub async fn wait_polling(rx: &mut watch::Receiver<TryOnState>) -> u8 {
    loop {
        let state = rx.borrow_and_update().clone();
        if let TryOnState::Polling { progress } = state {
            return progress;
        }
        rx.changed().await.expect("controller state channel closed");
    }
}

/// Backend that replays scripted responses. Status responses are consumed
/// from a queue; once exhausted, the last response repeats (so a terminal
/// script also answers the scheduler's last-chance fetch).
pub struct ScriptedBackend {
    garment: Mutex<Result<Vec<u8>, TryOnError>>,
    submit: Mutex<Result<SubmitData, TryOnError>>,
    statuses: Mutex<VecDeque<Result<JobStatusSnapshot, TryOnError>>>,
    last_status: Mutex<Option<Result<JobStatusSnapshot, TryOnError>>>,
    pub submit_calls: AtomicU32,
    pub status_calls: AtomicU32,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self {
            garment: Mutex::new(Ok(TINY_PNG.to_vec())),
            submit: Mutex::new(Err(TryOnError::RemoteRejected("unscripted".to_string()))),
            statuses: Mutex::new(VecDeque::new()),
            last_status: Mutex::new(None),
            submit_calls: AtomicU32::new(0),
            status_calls: AtomicU32::new(0),
        }
    }

    pub fn set_garment(&self, response: Result<Vec<u8>, TryOnError>) {
        *self.garment.lock().unwrap() = response;
    }

    pub fn set_submit(&self, response: Result<SubmitData, TryOnError>) {
        *self.submit.lock().unwrap() = response;
    }

    pub fn queue_status(&self, response: Result<JobStatusSnapshot, TryOnError>) {
        self.statuses.lock().unwrap().push_back(response);
    }
}

#[async_trait]
impl TryOnBackend for ScriptedBackend {
    async fn fetch_garment(&self, _url: &str) -> Result<Vec<u8>, TryOnError> {
        self.garment.lock().unwrap().clone()
    }

    async fn submit(
        &self,
        _photo: Vec<u8>,
        _garment: Vec<u8>,
        _category_id: &str,
    ) -> Result<SubmitData, TryOnError> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        self.submit.lock().unwrap().clone()
    }

    async fn status(&self, _job_id: &str) -> Result<JobStatusSnapshot, TryOnError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        let mut queue = self.statuses.lock().unwrap();
        match queue.pop_front() {
            Some(response) => {
                *self.last_status.lock().unwrap() = Some(response.clone());
                response
            }
            None => self
                .last_status
                .lock()
                .unwrap()
                .clone()
                .unwrap_or(Err(TryOnError::TransientPollError(
                    "status script exhausted".to_string(),
                ))),
        }
    }
}

/// Backend whose second and later status calls block on a gate, simulating
/// an in-flight response that resolves only after the caller acts.
pub struct GatedBackend {
    pub gate: Notify,
    pub status_calls: AtomicU32,
}

impl GatedBackend {
    pub fn new() -> Self {
        Self {
            gate: Notify::new(),
            status_calls: AtomicU32::new(0),
        }
    }
}

#[async_trait]
impl TryOnBackend for GatedBackend {
    async fn fetch_garment(&self, _url: &str) -> Result<Vec<u8>, TryOnError> {
        Ok(TINY_PNG.to_vec())
    }

    async fn submit(
        &self,
        _photo: Vec<u8>,
        _garment: Vec<u8>,
        _category_id: &str,
    ) -> Result<SubmitData, TryOnError> {
        Ok(pending_submit("job-gated"))
    }

    async fn status(&self, _job_id: &str) -> Result<JobStatusSnapshot, TryOnError> {
        let call = self.status_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call == 1 {
            return Ok(snapshot(JobStatus::Processing));
        }
        self.gate.notified().await;
        Ok(snapshot_with_url(JobStatus::Processing, "https://x/late.png"))
    }
}

/// History recorder that stores entries in memory, optionally failing.
pub struct RecordingHistory {
    pub entries: Mutex<Vec<HistoryEntry>>,
    pub fail: AtomicBool,
}

impl RecordingHistory {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            fail: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl HistoryRecorder for RecordingHistory {
    async fn record(&self, entry: &HistoryEntry) -> Result<(), HistoryError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(HistoryError::Rejected("HTTP 500".to_string()));
        }
        self.entries.lock().unwrap().push(entry.clone());
        Ok(())
    }
}

/// Audit sink that stores records in memory, optionally failing.
pub struct RecordingAudit {
    pub records: Mutex<Vec<PathRecord>>,
    pub fail: AtomicBool,
}

impl RecordingAudit {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            fail: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl PathAudit for RecordingAudit {
    async fn append(&self, record: &PathRecord) -> Result<(), AuditError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(AuditError::Io(std::io::Error::other("disk full")));
        }
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }
}
