//! Spreadsheet-backed inspection archive
//!
//! Layout: one sheet, a header row, then one data row per record in the
//! column order timestamp, project, inspector, discipline, standard, verdict.
//!
//! Purge is read-all / filter / clear / rewrite. Within one process the
//! sequence is serialized by `write_lock`; another process writing the same
//! sheet between the read and the rewrite loses its rows. The hosted API
//! offers no conditional write to close that window.

use super::{
    normalize_inspector, parse_timestamp, sort_newest_first, InspectionRecord, RecordDraft,
    RecordStore, StoreError,
};
use crate::ai::http_client::sheets_client;
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;

/// Header row written at the top of the sheet
pub const SHEET_HEADER: [&str; 6] = [
    "Timestamp",
    "Project",
    "Inspector",
    "Discipline",
    "Standard",
    "Verdict",
];

/// Default Google Sheets REST endpoint
pub const DEFAULT_SHEETS_BASE_URL: &str = "https://sheets.googleapis.com/v4/spreadsheets";

/// Raw row operations a spreadsheet service must offer
#[async_trait]
pub trait SheetTransport: Send + Sync {
    /// Append one row after the last non-empty row
    async fn append_row(&self, row: Vec<String>) -> Result<(), StoreError>;

    /// Every row, header included
    async fn read_rows(&self) -> Result<Vec<Vec<String>>, StoreError>;

    /// Remove all cell values
    async fn clear(&self) -> Result<(), StoreError>;

    /// Write `rows` starting at the first cell
    async fn write_rows(&self, rows: Vec<Vec<String>>) -> Result<(), StoreError>;
}

/// Record store over any sheet transport
pub struct SheetsRecordStore<T: SheetTransport> {
    transport: T,
    write_lock: Mutex<()>,
    header_checked: AtomicBool,
}

impl<T: SheetTransport> SheetsRecordStore<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            write_lock: Mutex::new(()),
            header_checked: AtomicBool::new(false),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Write the header row into an empty sheet (once per store)
    async fn ensure_header(&self) -> Result<(), StoreError> {
        if self.header_checked.load(Ordering::Acquire) {
            return Ok(());
        }

        let rows = self.transport.read_rows().await?;
        if rows.iter().all(|r| is_blank(r)) {
            self.transport.write_rows(vec![header_row()]).await?;
        }

        self.header_checked.store(true, Ordering::Release);
        Ok(())
    }

    /// Split off the header and parse data rows. Unreadable rows are
    /// skipped with a warning but stay in the sheet.
    fn parse_rows(rows: Vec<Vec<String>>) -> Vec<InspectionRecord> {
        rows.into_iter()
            .filter(|row| !is_header(row) && !is_blank(row))
            .filter_map(|row| match row_to_record(&row) {
                Ok(record) => Some(record),
                Err(e) => {
                    tracing::warn!("Skipping sheet row: {}", e);
                    None
                }
            })
            .collect()
    }
}

fn header_row() -> Vec<String> {
    SHEET_HEADER.iter().map(|s| s.to_string()).collect()
}

fn is_blank(row: &[String]) -> bool {
    row.iter().all(|c| c.trim().is_empty())
}

/// Normalized inspector cell, whether or not the rest of the row parses
fn row_inspector(row: &[String]) -> Option<String> {
    row.get(2).map(|cell| normalize_inspector(cell))
}

fn is_header(row: &[String]) -> bool {
    row.first()
        .map(|c| c.trim().eq_ignore_ascii_case(SHEET_HEADER[0]))
        .unwrap_or(false)
}

/// Column order matches `SHEET_HEADER`
pub fn record_to_row(record: &InspectionRecord) -> Vec<String> {
    vec![
        record.timestamp_text(),
        record.project.clone(),
        record.inspector.clone(),
        record.discipline.clone(),
        record.standard.clone(),
        record.verdict.clone(),
    ]
}

/// Parse a data row; missing trailing cells read as empty strings
pub fn row_to_record(row: &[String]) -> Result<InspectionRecord, StoreError> {
    let cell = |i: usize| row.get(i).cloned().unwrap_or_default();

    let raw_ts = cell(0);
    let timestamp = parse_timestamp(&raw_ts)
        .ok_or_else(|| StoreError::MalformedRow(format!("bad timestamp '{}'", raw_ts)))?;

    Ok(InspectionRecord {
        timestamp,
        project: cell(1),
        inspector: cell(2),
        discipline: cell(3),
        standard: cell(4),
        verdict: cell(5),
    })
}

#[async_trait]
impl<T: SheetTransport> RecordStore for SheetsRecordStore<T> {
    fn backend(&self) -> &'static str {
        "sheets"
    }

    async fn append(&self, draft: RecordDraft) -> Result<InspectionRecord, StoreError> {
        let _guard = self.write_lock.lock().await;

        self.ensure_header().await?;

        let record = draft.stamp();
        self.transport.append_row(record_to_row(&record)).await?;

        tracing::debug!(project = %record.project, "Appended inspection row");
        Ok(record)
    }

    async fn list(&self, inspector: Option<&str>) -> Result<Vec<InspectionRecord>, StoreError> {
        let rows = self.transport.read_rows().await?;

        // Reverse first so same-second rows come out latest-appended first
        let mut records: Vec<_> = Self::parse_rows(rows)
            .into_iter()
            .rev()
            .filter(|r| inspector.map_or(true, |who| r.belongs_to(who)))
            .collect();
        sort_newest_first(&mut records);

        Ok(records)
    }

    async fn purge(&self, inspector: Option<&str>) -> Result<usize, StoreError> {
        let _guard = self.write_lock.lock().await;

        // Work on raw rows: a row that does not parse still has an owner
        // and must survive another inspector's purge.
        let rows: Vec<Vec<String>> = self
            .transport
            .read_rows()
            .await?
            .into_iter()
            .filter(|row| !is_header(row) && !is_blank(row))
            .collect();
        let before = rows.len();

        let survivors: Vec<Vec<String>> = match inspector {
            None => Vec::new(),
            Some(who) => {
                let who = normalize_inspector(who);
                rows.into_iter()
                    .filter(|row| row_inspector(row).as_deref() != Some(who.as_str()))
                    .collect()
            }
        };
        let removed = before - survivors.len();
        let kept = survivors.len();

        let mut rewrite = vec![header_row()];
        rewrite.extend(survivors);

        self.transport.clear().await?;
        self.transport.write_rows(rewrite).await?;
        self.header_checked.store(true, Ordering::Release);

        tracing::info!(removed, kept, "Purged sheet records");
        Ok(removed)
    }
}

/// Google Sheets values API transport
pub struct GoogleSheetsTransport {
    client: Client,
    base_url: String,
    spreadsheet_id: String,
    sheet_name: String,
    access_token: String,
    timeout: Duration,
}

#[derive(Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

impl GoogleSheetsTransport {
    pub fn new(
        spreadsheet_id: impl Into<String>,
        sheet_name: impl Into<String>,
        access_token: impl Into<String>,
    ) -> Self {
        Self {
            client: sheets_client().clone(),
            base_url: DEFAULT_SHEETS_BASE_URL.to_string(),
            spreadsheet_id: spreadsheet_id.into(),
            sheet_name: sheet_name.into(),
            access_token: access_token.into(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Use a caller-built HTTP client instead of the shared one
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    /// `{base}/{spreadsheet}/values/{sheet}!{range}{suffix}`
    fn values_url(&self, range: &str, suffix: &str) -> Result<Url, StoreError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| StoreError::Unavailable(format!("Invalid sheets URL: {}", e)))?;

        url.path_segments_mut()
            .map_err(|_| StoreError::Unavailable("Sheets URL cannot be a base".to_string()))?
            .push(&self.spreadsheet_id)
            .push("values")
            .push(&format!("{}!{}{}", self.sheet_name, range, suffix));

        Ok(url)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, StoreError> {
        let resp = request
            .bearer_auth(&self.access_token)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| StoreError::Unavailable(format!("Sheets request failed: {}", e)))?;

        if resp.status().is_success() {
            Ok(resp)
        } else {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            Err(StoreError::Backend(format!("Sheets API error ({}): {}", status, text)))
        }
    }
}

#[async_trait]
impl SheetTransport for GoogleSheetsTransport {
    async fn append_row(&self, row: Vec<String>) -> Result<(), StoreError> {
        let url = self.values_url("A:F", ":append")?;
        let request = self
            .client
            .post(url)
            .query(&[("valueInputOption", "RAW"), ("insertDataOption", "INSERT_ROWS")])
            .json(&json!({ "majorDimension": "ROWS", "values": [row] }));

        self.send(request).await.map(|_| ())
    }

    async fn read_rows(&self) -> Result<Vec<Vec<String>>, StoreError> {
        let url = self.values_url("A:F", "")?;
        let resp = self.send(self.client.get(url)).await?;

        let range: ValueRange = resp
            .json()
            .await
            .map_err(|e| StoreError::Backend(format!("Failed to parse sheet values: {}", e)))?;

        Ok(range
            .values
            .into_iter()
            .map(|row| row.into_iter().map(cell_text).collect())
            .collect())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        let url = self.values_url("A:F", ":clear")?;
        self.send(self.client.post(url).json(&json!({}))).await.map(|_| ())
    }

    async fn write_rows(&self, rows: Vec<Vec<String>>) -> Result<(), StoreError> {
        let url = self.values_url("A1", "")?;
        let request = self
            .client
            .put(url)
            .query(&[("valueInputOption", "RAW")])
            .json(&json!({ "majorDimension": "ROWS", "values": rows }));

        self.send(request).await.map(|_| ())
    }
}

fn cell_text(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}
