use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    /// Base URL of the remote try-on service (e.g., "http://localhost:8000")
    pub tryon_api_base_url: String,

    /// Delay between status checks, in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Hard ceiling on status checks per submission
    #[serde(default = "default_max_poll_attempts")]
    pub max_poll_attempts: u32,

    /// REST endpoint for the history store. History recording is disabled
    /// when unset.
    pub history_endpoint: Option<String>,

    /// Bearer key for the history endpoint
    pub history_api_key: Option<String>,

    /// Append-only JSONL file for the path audit log
    #[serde(default = "default_audit_path")]
    pub audit_path: String,
}

fn default_poll_interval_ms() -> u64 {
    crate::services::poll::POLL_INTERVAL_MS
}

fn default_max_poll_attempts() -> u32 {
    crate::services::poll::MAX_POLL_ATTEMPTS
}

fn default_audit_path() -> String {
    "tryon-paths.jsonl".to_string()
}

impl AppConfig {
    pub fn from_env() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }
}
