//! Request and outcome types for one analysis

use crate::ai::{ImageError, ImageInput, ProviderError, SelectionError};
use crate::standards::Discipline;
use crate::store::{InspectionRecord, RecordDraft};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Who inspected what, against which standard
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RequestInfo {
    pub inspector: String,
    pub project: String,
    pub discipline: Discipline,
    pub standard: String,
}

impl RequestInfo {
    pub fn draft(&self, verdict: impl Into<String>) -> RecordDraft {
        RecordDraft {
            project: self.project.clone(),
            inspector: self.inspector.clone(),
            discipline: self.discipline.as_str().to_string(),
            standard: self.standard.clone(),
            verdict: verdict.into(),
        }
    }
}

/// One analysis call's input. Lives only for the call.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub info: RequestInfo,

    /// Free-form technical sheet text
    pub technical_context: String,

    /// One or more photographs, in order
    pub images: Vec<ImageInput>,
}

/// Why an analysis produced no report
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// No image, or an image that could not be read or decoded
    #[error("input error: {0}")]
    Input(String),

    /// No usable model in the provider catalog
    #[error("no AI model available: {0}")]
    Capability(String),

    /// The generation call itself failed
    #[error("AI provider error: {0}")]
    Provider(#[from] ProviderError),
}

impl From<ImageError> for AnalysisError {
    fn from(e: ImageError) -> Self {
        AnalysisError::Input(e.to_string())
    }
}

impl From<SelectionError> for AnalysisError {
    fn from(e: SelectionError) -> Self {
        AnalysisError::Capability(e.to_string())
    }
}

/// What happened to the archive write
#[derive(Debug, Clone, PartialEq)]
pub enum PersistenceStatus {
    Stored(InspectionRecord),
    /// The report is still valid; only the archive write failed
    Failed(String),
}

impl PersistenceStatus {
    pub fn is_stored(&self) -> bool {
        matches!(self, Self::Stored(_))
    }
}

/// A generated report
#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    pub report: String,

    /// Model that wrote the report
    pub model: String,

    pub persistence: PersistenceStatus,
}
