//! History recorder collaborator.
//!
//! The lifecycle calls [`HistoryRecorder::record`] once per terminal success
//! and treats failures as warnings only; the storage itself is external.

use async_trait::async_trait;

use crate::models::history::HistoryEntry;

#[async_trait]
pub trait HistoryRecorder: Send + Sync {
    async fn record(&self, entry: &HistoryEntry) -> Result<(), HistoryError>;
}

/// Records history rows via a REST insert endpoint (JSON body, bearer key).
pub struct RestHistoryRecorder {
    http: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl RestHistoryRecorder {
    pub fn new(endpoint: String, api_key: Option<String>) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(15))
            .build()?;

        Ok(Self {
            http,
            endpoint,
            api_key,
        })
    }
}

#[async_trait]
impl HistoryRecorder for RestHistoryRecorder {
    async fn record(&self, entry: &HistoryEntry) -> Result<(), HistoryError> {
        let mut request = self.http.post(&self.endpoint).json(entry);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(HistoryError::Http)?;
        let status = response.status();
        if !status.is_success() {
            return Err(HistoryError::Rejected(format!("HTTP {status}")));
        }

        tracing::debug!(product_id = %entry.product_id, "History entry recorded");
        Ok(())
    }
}

/// Recorder used when no history endpoint is configured.
pub struct NullHistoryRecorder;

#[async_trait]
impl HistoryRecorder for NullHistoryRecorder {
    async fn record(&self, entry: &HistoryEntry) -> Result<(), HistoryError> {
        tracing::debug!(
            product_id = %entry.product_id,
            "History recording disabled, dropping entry"
        );
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("history store rejected the entry: {0}")]
    Rejected(String),
}
