//! Path audit sink: an append-only JSONL log of the image paths involved in
//! each completed try-on. Failures are logged and otherwise ignored.

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use crate::models::history::PathRecord;

#[async_trait]
pub trait PathAudit: Send + Sync {
    async fn append(&self, record: &PathRecord) -> Result<(), AuditError>;
}

/// Appends one JSON line per completed job to a local file, creating the
/// file on first write.
pub struct JsonlPathAudit {
    path: PathBuf,
}

impl JsonlPathAudit {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl PathAudit for JsonlPathAudit {
    async fn append(&self, record: &PathRecord) -> Result<(), AuditError> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;

        tracing::debug!(path = %self.path.display(), "Path audit record appended");
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    #[error("failed to write audit log: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize audit record: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[tokio::test]
    async fn appends_one_line_per_record() {
        let dir = std::env::temp_dir().join(format!("tryon-audit-{}", uuid::Uuid::new_v4()));
        tokio::fs::create_dir_all(&dir).await.unwrap();
        let path = dir.join("paths.jsonl");
        let audit = JsonlPathAudit::new(&path);

        let record = PathRecord {
            timestamp: Utc::now(),
            user_image: "in-memory image".to_string(),
            product_image: "https://cdn/product.png".to_string(),
            result_image: "https://cdn/result.png".to_string(),
        };
        audit.append(&record).await.unwrap();
        audit.append(&record).await.unwrap();

        let contents = tokio::fs::read_to_string(&path).await.unwrap();
        let lines: Vec<_> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        for line in lines {
            let parsed: serde_json::Value = serde_json::from_str(line).unwrap();
            assert_eq!(parsed["result_image"], "https://cdn/result.png");
        }

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }
}
