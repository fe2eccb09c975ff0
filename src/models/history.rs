use chrono::{DateTime, Utc};
use serde::Serialize;

/// The product a try-on was run against. Catalog lookup itself is out of
/// scope; the lifecycle only needs enough to label history and audit rows.
#[derive(Debug, Clone)]
pub struct ProductRef {
    pub id: String,
    pub name: String,
    /// Catalog image URL of the product.
    pub image: String,
}

/// Row written to the history store once a try-on reaches terminal success.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryEntry {
    pub product_id: String,
    pub product_name: String,
    pub product_image: String,
    pub user_image_url: Option<String>,
    pub cloth_image_url: Option<String>,
    pub result_image_url: String,
    pub status: String,
}

/// One line of the append-only path audit log, written per completed job.
#[derive(Debug, Clone, Serialize)]
pub struct PathRecord {
    pub timestamp: DateTime<Utc>,
    pub user_image: String,
    pub product_image: String,
    pub result_image: String,
}
