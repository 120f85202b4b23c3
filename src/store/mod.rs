//! Record store for archived inspections.
//!
//! This module provides:
//! - `record`: the archived record and its identity rules
//! - `sqlite`: embedded relational backend
//! - `sheets`: hosted spreadsheet backend
//!
//! Both backends honour the same contract: `append` stamps and writes one
//! row, `list` returns newest first, and `purge` removes either every row
//! or the rows of one inspector (trimmed, case-insensitive match).

mod record;
mod sheets;
mod sqlite;

pub use record::*;
pub use sheets::*;
pub use sqlite::*;

use async_trait::async_trait;
use thiserror::Error;

/// Persistence failures
#[derive(Debug, Error)]
pub enum StoreError {
    /// No connection to the backend could be established
    #[error("record store unavailable: {0}")]
    Unavailable(String),

    /// The backend accepted the connection but the operation failed
    #[error("record store operation failed: {0}")]
    Backend(String),

    /// A persisted row could not be read back as a record
    #[error("malformed record row: {0}")]
    MalformedRow(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::Backend(e.to_string())
    }
}

/// Durable inspection archive
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Short backend name for logs
    fn backend(&self) -> &'static str;

    /// Stamp and durably add one record
    async fn append(&self, draft: RecordDraft) -> Result<InspectionRecord, StoreError>;

    /// Records newest first, optionally scoped to one inspector
    async fn list(&self, inspector: Option<&str>) -> Result<Vec<InspectionRecord>, StoreError>;

    /// Delete every record, or only those of one inspector.
    /// Returns the number of records removed.
    async fn purge(&self, inspector: Option<&str>) -> Result<usize, StoreError>;
}

/// `list` for history views: an unreachable or failing archive reads as
/// empty and is logged.
pub async fn list_or_empty(store: &dyn RecordStore, inspector: Option<&str>) -> Vec<InspectionRecord> {
    match store.list(inspector).await {
        Ok(records) => records,
        Err(e) => {
            tracing::warn!(backend = store.backend(), "History unavailable: {}", e);
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_list_or_empty_degrades() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"file").unwrap();

        let offline = SqliteRecordStore::new(blocker.join("inspections.db"));
        assert!(offline.list(None).await.is_err());
        assert!(list_or_empty(&offline, None).await.is_empty());

        let online = SqliteRecordStore::new(dir.path().join("inspections.db"));
        online
            .append(RecordDraft {
                project: "TK-1".to_string(),
                inspector: "Laura".to_string(),
                discipline: "MECHANICAL".to_string(),
                standard: "API 653".to_string(),
                verdict: "ok".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(list_or_empty(&online, Some("laura")).await.len(), 1);
    }
}
