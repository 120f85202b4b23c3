//! SQLite-backed inspection archive
//!
//! One `inspections` table, one row per record. The connection is opened
//! lazily and dropped after a failed statement so the next call reopens it.

use super::{
    normalize_inspector, parse_timestamp, InspectionRecord, RecordDraft, RecordStore, StoreError,
};
use async_trait::async_trait;
use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS inspections (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        timestamp TEXT NOT NULL,
        project TEXT NOT NULL,
        inspector TEXT NOT NULL,
        discipline TEXT NOT NULL,
        standard TEXT NOT NULL,
        verdict TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_inspections_timestamp
        ON inspections(timestamp DESC);
"#;

/// SQLite record store
pub struct SqliteRecordStore {
    inner: Arc<Inner>,
}

struct Inner {
    db_path: PathBuf,
    conn: Mutex<Option<Connection>>,
}

impl SqliteRecordStore {
    /// Create a store for the database at `db_path`. Nothing is opened yet.
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        let db_path = db_path.into();

        // Ensure parent directory exists
        if let Some(parent) = db_path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                tracing::warn!("Failed to create database directory: {}", e);
            }
        }

        Self {
            inner: Arc::new(Inner {
                db_path,
                conn: Mutex::new(None),
            }),
        }
    }

    /// Default archive location: `<config_dir>/vigia/historial_vigia.db`
    pub fn default_path() -> Result<PathBuf, StoreError> {
        dirs::config_dir()
            .map(|d| d.join("vigia").join("historial_vigia.db"))
            .ok_or_else(|| StoreError::Unavailable("Could not determine config directory".to_string()))
    }

    pub fn db_path(&self) -> &Path {
        &self.inner.db_path
    }

    /// Run `op` on the (lazily opened) connection in a blocking task
    async fn with_connection<T, F>(&self, op: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T, StoreError> + Send + 'static,
    {
        let inner = Arc::clone(&self.inner);

        tokio::task::spawn_blocking(move || {
            let mut guard = inner
                .conn
                .lock()
                .map_err(|_| StoreError::Backend("connection lock poisoned".to_string()))?;

            if guard.is_none() {
                *guard = Some(open_connection(&inner.db_path)?);
            }

            let result = match guard.as_mut() {
                Some(conn) => op(conn),
                None => Err(StoreError::Unavailable("connection not established".to_string())),
            };

            if result.is_err() {
                // Force a reconnect on the next call
                *guard = None;
            }

            result
        })
        .await
        .map_err(|e| StoreError::Backend(format!("Task failed: {}", e)))?
    }
}

fn open_connection(path: &Path) -> Result<Connection, StoreError> {
    let conn = Connection::open(path).map_err(|e| {
        StoreError::Unavailable(format!("Failed to open {}: {}", path.display(), e))
    })?;

    conn.execute_batch(SCHEMA)
        .map_err(|e| StoreError::Unavailable(format!("Failed to create tables: {}", e)))?;

    debug!(path = %path.display(), "Opened inspection database");
    Ok(conn)
}

/// Records newest first. Rows whose timestamp does not parse are skipped
/// with a warning, the same policy as the spreadsheet backend.
fn select_records(conn: &Connection) -> Result<Vec<InspectionRecord>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT id, timestamp, project, inspector, discipline, standard, verdict
         FROM inspections
         ORDER BY timestamp DESC, id DESC",
    )?;

    let rows = stmt.query_map([], |row| {
        let id: i64 = row.get(0)?;
        let raw_ts: String = row.get(1)?;

        Ok(parse_timestamp(&raw_ts)
            .map(|timestamp| -> rusqlite::Result<InspectionRecord> {
                Ok(InspectionRecord {
                    timestamp,
                    project: row.get(2)?,
                    inspector: row.get(3)?,
                    discipline: row.get(4)?,
                    standard: row.get(5)?,
                    verdict: row.get(6)?,
                })
            })
            .transpose()?
            .ok_or((id, raw_ts)))
    })?;

    let mut records = Vec::new();
    for row in rows {
        match row? {
            Ok(record) => records.push(record),
            Err((id, raw_ts)) => {
                warn!(id, timestamp = %raw_ts, "Skipping inspection row with bad timestamp")
            }
        }
    }

    Ok(records)
}

/// Ids of one inspector's rows, matched on the inspector column alone
fn select_ids_of(conn: &Connection, inspector: &str) -> Result<Vec<i64>, StoreError> {
    let who = normalize_inspector(inspector);
    let mut stmt = conn.prepare("SELECT id, inspector FROM inspections")?;

    let rows = stmt.query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)))?;

    let mut ids = Vec::new();
    for row in rows {
        let (id, owner) = row?;
        if normalize_inspector(&owner) == who {
            ids.push(id);
        }
    }
    Ok(ids)
}

#[async_trait]
impl RecordStore for SqliteRecordStore {
    fn backend(&self) -> &'static str {
        "sqlite"
    }

    async fn append(&self, draft: RecordDraft) -> Result<InspectionRecord, StoreError> {
        let record = draft.stamp();
        let row = record.clone();

        self.with_connection(move |conn| {
            conn.execute(
                "INSERT INTO inspections (timestamp, project, inspector, discipline, standard, verdict)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    row.timestamp_text(),
                    row.project,
                    row.inspector,
                    row.discipline,
                    row.standard,
                    row.verdict
                ],
            )?;
            Ok(())
        })
        .await?;

        debug!(project = %record.project, inspector = %record.inspector, "Inserted inspection");
        Ok(record)
    }

    async fn list(&self, inspector: Option<&str>) -> Result<Vec<InspectionRecord>, StoreError> {
        let filter = inspector.map(str::to_string);

        self.with_connection(move |conn| {
            let records = select_records(conn)?
                .into_iter()
                .filter(|r| filter.as_deref().map_or(true, |who| r.belongs_to(who)))
                .collect();
            Ok(records)
        })
        .await
    }

    async fn purge(&self, inspector: Option<&str>) -> Result<usize, StoreError> {
        let filter = inspector.map(str::to_string);

        self.with_connection(move |conn| {
            let tx = conn.transaction()?;

            let removed = match filter.as_deref() {
                None => tx.execute("DELETE FROM inspections", [])?,
                Some(who) => {
                    // Identity matching is Unicode-aware, so select in Rust
                    // and delete by id inside the same transaction.
                    let ids = select_ids_of(&tx, who)?;

                    let mut removed = 0;
                    for id in ids {
                        removed += tx.execute("DELETE FROM inspections WHERE id = ?1", params![id])?;
                    }
                    removed
                }
            };

            tx.commit()?;
            Ok(removed)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_store() -> (SqliteRecordStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = SqliteRecordStore::new(dir.path().join("inspections.db"));
        (store, dir)
    }

    fn draft(inspector: &str, discipline: &str, standard: &str) -> RecordDraft {
        RecordDraft {
            project: "TK-204".to_string(),
            inspector: inspector.to_string(),
            discipline: discipline.to_string(),
            standard: standard.to_string(),
            verdict: "**1. VISUAL FINDINGS** shell corrosion".to_string(),
        }
    }

    #[tokio::test]
    async fn test_append_and_list_by_inspector() {
        let (store, _dir) = create_test_store();

        let record = store
            .append(draft("Laura Gómez", "MECHANICAL", "API 653"))
            .await
            .unwrap();
        store
            .append(draft("Tomás Ruiz", "ELECTRICAL_POWER", "NFPA 70B"))
            .await
            .unwrap();

        let mine = store.list(Some("  laura gómez ")).await.unwrap();
        assert_eq!(mine, vec![record]);

        let theirs = store.list(Some("TOMÁS RUIZ")).await.unwrap();
        assert_eq!(theirs.len(), 1);
        assert_eq!(theirs[0].standard, "NFPA 70B");

        assert!(store.list(Some("nobody")).await.unwrap().is_empty());
        assert_eq!(store.list(None).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_list_is_newest_first() {
        let (store, _dir) = create_test_store();

        for standard in ["API 653", "API 510", "API 570"] {
            store.append(draft("a", "MECHANICAL", standard)).await.unwrap();
        }

        let records = store.list(None).await.unwrap();
        let standards: Vec<_> = records.iter().map(|r| r.standard.as_str()).collect();
        // Same-second inserts fall back to insertion order, newest first
        assert_eq!(standards, vec!["API 570", "API 510", "API 653"]);
        assert!(records.windows(2).all(|w| w[0].timestamp >= w[1].timestamp));
    }

    #[tokio::test]
    async fn test_scoped_purge_keeps_other_inspectors() {
        let (store, _dir) = create_test_store();

        store.append(draft("Laura", "MECHANICAL", "API 653")).await.unwrap();
        store.append(draft(" LAURA", "WELDING_STRUCTURE", "AWS D1.1")).await.unwrap();
        store.append(draft("Tomás", "SAFETY_HSE", "ISO 45001")).await.unwrap();

        let removed = store.purge(Some("laura")).await.unwrap();
        assert_eq!(removed, 2);
        assert!(store.list(Some("Laura")).await.unwrap().is_empty());
        assert_eq!(store.list(Some("tomás")).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_bad_timestamp_rows_are_skipped_not_fatal() {
        let (store, dir) = create_test_store();

        store.append(draft("Laura", "MECHANICAL", "API 653")).await.unwrap();

        let conn = Connection::open(dir.path().join("inspections.db")).unwrap();
        for (ts, who) in [("01/05/2024 08:30", "Tomás"), ("yesterday", "laura ")] {
            conn.execute(
                "INSERT INTO inspections (timestamp, project, inspector, discipline, standard, verdict)
                 VALUES (?1, 'TK-9', ?2, 'MECHANICAL', 'API 510', 'x')",
                params![ts, who],
            )
            .unwrap();
        }

        let records = store.list(None).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].inspector, "Laura");

        assert_eq!(store.purge(Some("LAURA")).await.unwrap(), 2);

        let owners: Vec<String> = conn
            .prepare("SELECT inspector FROM inspections")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(owners, vec!["Tomás".to_string()]);
    }

    #[tokio::test]
    async fn test_global_purge_empties_archive() {
        let (store, _dir) = create_test_store();

        store.append(draft("a", "MECHANICAL", "API 653")).await.unwrap();
        store.append(draft("b", "MECHANICAL", "API 510")).await.unwrap();

        assert_eq!(store.purge(None).await.unwrap(), 2);
        assert!(store.list(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_records_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("inspections.db");

        {
            let store = SqliteRecordStore::new(&path);
            store.append(draft("a", "MECHANICAL", "API 653")).await.unwrap();
        }

        let store = SqliteRecordStore::new(&path);
        assert_eq!(store.list(None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unreachable_database_is_unavailable() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"not a directory").unwrap();

        let store = SqliteRecordStore::new(blocker.join("inspections.db"));

        let err = store
            .append(draft("a", "MECHANICAL", "API 653"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));
        assert!(matches!(
            store.list(None).await,
            Err(StoreError::Unavailable(_))
        ));
    }
}
