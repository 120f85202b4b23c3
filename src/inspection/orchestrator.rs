//! Inspection orchestrator
//!
//! Turns photos plus metadata into a stored verdict:
//!
//! ```text
//! images ──► decode/resize ──► select model ──► prompt + images ──► provider
//!                                                                     │
//!                                   archive (best effort) ◄── report ─┘
//! ```
//!
//! Input, capability and provider failures abort with `AnalysisError`.
//! A failed archive write only downgrades `PersistenceStatus`; the report
//! text is always returned.

use super::types::{AnalysisError, AnalysisOutcome, AnalysisRequest, PersistenceStatus};
use crate::ai::model_selector::{select_model, ModelPreference};
use crate::ai::prompts::build_inspection_prompt;
use crate::ai::provider::{InlineImage, VisionProvider};
use crate::ai::vision::load_image;
use crate::standards;
use crate::store::{list_or_empty, InspectionRecord, RecordStore, StoreError};
use std::sync::Arc;
use tracing::{info, warn};

/// Inspection service. Construct once and share by reference.
pub struct Inspector {
    store: Arc<dyn RecordStore>,
    provider: Arc<dyn VisionProvider>,
    preference: ModelPreference,
}

impl Inspector {
    pub fn new(
        store: Arc<dyn RecordStore>,
        provider: Arc<dyn VisionProvider>,
        preference: ModelPreference,
    ) -> Self {
        Self {
            store,
            provider,
            preference,
        }
    }

    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    /// Catalog keys, in order
    pub fn disciplines(&self) -> Vec<&'static str> {
        standards::list_disciplines()
    }

    /// Standards for a discipline key; empty when unknown
    pub fn standards(&self, discipline: &str) -> &'static [&'static str] {
        standards::list_standards(discipline)
    }

    /// Run one analysis end to end
    pub async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisOutcome, AnalysisError> {
        let info = &request.info;

        if request.images.is_empty() {
            return Err(AnalysisError::Input("at least one image is required".to_string()));
        }

        if !info.discipline.covers(&info.standard) {
            // The form only offers catalog standards; anything else is
            // passed through but noted.
            warn!(
                discipline = %info.discipline,
                standard = %info.standard,
                "Standard is not in the discipline's catalog set"
            );
        }

        let mut images = Vec::with_capacity(request.images.len());
        for input in &request.images {
            let prepared = load_image(input).await?;
            images.push(InlineImage {
                mime_type: prepared.mime_type(),
                data: prepared.jpeg,
            });
        }

        let model = select_model(self.provider.as_ref(), &self.preference).await?;

        let prompt = build_inspection_prompt(
            info.discipline.label(),
            &info.standard,
            &request.technical_context,
            images.len(),
        );

        let report = self.provider.generate(&model, &prompt, &images).await?;
        drop(images);

        info!(
            project = %info.project,
            inspector = %info.inspector,
            model = %model,
            chars = report.len(),
            "Generated inspection report"
        );

        let persistence = match self.store.append(info.draft(report.clone())).await {
            Ok(record) => PersistenceStatus::Stored(record),
            Err(e) => {
                warn!(backend = self.store.backend(), "Report not archived: {}", e);
                PersistenceStatus::Failed(e.to_string())
            }
        };

        Ok(AnalysisOutcome {
            report,
            model,
            persistence,
        })
    }

    /// Archived records, newest first. An unreachable archive reads as empty.
    pub async fn history(&self, inspector: Option<&str>) -> Vec<InspectionRecord> {
        list_or_empty(self.store.as_ref(), inspector).await
    }

    /// Delete all records, or one inspector's
    pub async fn purge(&self, inspector: Option<&str>) -> Result<usize, StoreError> {
        let removed = self.store.purge(inspector).await?;
        info!(removed, scoped = inspector.is_some(), "Purged inspection archive");
        Ok(removed)
    }
}
