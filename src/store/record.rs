//! Inspection record data structures.

use chrono::{Local, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

/// Text form of record timestamps, both in SQLite and in the sheet
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One archived inspection outcome. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InspectionRecord {
    /// Creation time, assigned by the store
    pub timestamp: NaiveDateTime,

    /// Project / asset tag
    pub project: String,

    /// Inspector identity as entered
    pub inspector: String,

    /// Discipline catalog key
    pub discipline: String,

    pub standard: String,

    /// AI-generated verdict text
    pub verdict: String,
}

/// Record contents before the store stamps it
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RecordDraft {
    pub project: String,
    pub inspector: String,
    pub discipline: String,
    pub standard: String,
    pub verdict: String,
}

impl RecordDraft {
    /// Stamp the draft with the current local time, truncated to seconds
    pub fn stamp(self) -> InspectionRecord {
        self.stamp_at(now_seconds())
    }

    pub fn stamp_at(self, timestamp: NaiveDateTime) -> InspectionRecord {
        InspectionRecord {
            timestamp,
            project: self.project,
            inspector: self.inspector,
            discipline: self.discipline,
            standard: self.standard,
            verdict: self.verdict,
        }
    }
}

impl InspectionRecord {
    pub fn timestamp_text(&self) -> String {
        self.timestamp.format(TIMESTAMP_FORMAT).to_string()
    }

    /// One-line history label: `timestamp | project (discipline)`
    pub fn summary_line(&self) -> String {
        format!(
            "{} | {} ({})",
            self.timestamp_text(),
            self.project,
            self.discipline
        )
    }

    /// Whether this record belongs to `inspector` under the store's
    /// trimmed, case-insensitive identity rule
    pub fn belongs_to(&self, inspector: &str) -> bool {
        normalize_inspector(&self.inspector) == normalize_inspector(inspector)
    }
}

/// Canonical identity form used for filtering and purging
pub fn normalize_inspector(identity: &str) -> String {
    identity.trim().to_lowercase()
}

/// Parse a persisted timestamp
pub fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(text.trim(), TIMESTAMP_FORMAT).ok()
}

fn now_seconds() -> NaiveDateTime {
    let now = Local::now().naive_local();
    now.with_nanosecond(0).unwrap_or(now)
}

/// Order newest first. Ties keep their relative order, so callers that
/// want "later insert wins" pass rows in reverse insertion order.
pub fn sort_newest_first(records: &mut [InspectionRecord]) {
    records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(inspector: &str) -> RecordDraft {
        RecordDraft {
            project: "TK-101".to_string(),
            inspector: inspector.to_string(),
            discipline: "MECHANICAL".to_string(),
            standard: "API 653".to_string(),
            verdict: "1. VISUAL FINDINGS ...".to_string(),
        }
    }

    #[test]
    fn test_identity_rule() {
        let record = draft("  Ana Pérez ").stamp();
        assert!(record.belongs_to("ana pérez"));
        assert!(record.belongs_to("ANA PÉREZ   "));
        assert!(!record.belongs_to("Ana"));
    }

    #[test]
    fn test_timestamp_round_trip_text() {
        let record = draft("x").stamp();
        let text = record.timestamp_text();
        assert_eq!(parse_timestamp(&text), Some(record.timestamp));
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn test_summary_line() {
        let ts = parse_timestamp("2024-05-01 08:30:00").unwrap();
        let record = draft("x").stamp_at(ts);
        assert_eq!(record.summary_line(), "2024-05-01 08:30:00 | TK-101 (MECHANICAL)");
    }

    #[test]
    fn test_sort_newest_first_is_stable() {
        let early = parse_timestamp("2024-01-01 00:00:00").unwrap();
        let late = parse_timestamp("2024-06-01 00:00:00").unwrap();
        let mut records = vec![
            draft("a").stamp_at(early),
            draft("b").stamp_at(late),
            draft("c").stamp_at(late),
        ];
        sort_newest_first(&mut records);
        let order: Vec<_> = records.iter().map(|r| r.inspector.as_str()).collect();
        assert_eq!(order, vec!["b", "c", "a"]);
    }
}
