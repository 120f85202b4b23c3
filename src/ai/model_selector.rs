//! Model selection
//!
//! Picks one generation-capable model from the provider catalog using an
//! ordered list of preference rules. A rule matches a model when every one
//! of its markers appears in the model id. First matching rule wins; within
//! a rule, catalog order wins. With no match the first capable model is used.

use super::provider::{ProviderError, VisionProvider};
use thiserror::Error;

/// Default rules: lightweight 1.5 first, then a general vision model
pub const DEFAULT_MODEL_PREFERENCE: &str = "flash+1.5,pro+vision";

#[derive(Debug, Error)]
pub enum SelectionError {
    #[error("catalog query failed: {0}")]
    Catalog(#[from] ProviderError),

    #[error("no model supports content generation")]
    NoCapableModel,
}

/// Ordered preference rules
#[derive(Debug, Clone, PartialEq)]
pub struct ModelPreference {
    rules: Vec<Vec<String>>,
}

impl ModelPreference {
    /// Parse `marker+marker,marker+marker`. Blank rules and markers are
    /// ignored; matching is case-insensitive.
    pub fn parse(text: &str) -> Self {
        let rules = text
            .split(',')
            .map(|rule| {
                rule.split('+')
                    .map(|m| m.trim().to_lowercase())
                    .filter(|m| !m.is_empty())
                    .collect::<Vec<_>>()
            })
            .filter(|rule| !rule.is_empty())
            .collect();

        Self { rules }
    }

    pub fn rules(&self) -> &[Vec<String>] {
        &self.rules
    }

    /// Choose from generation-capable model ids, in catalog order
    pub fn pick<'a>(&self, models: &'a [String]) -> Option<&'a str> {
        for rule in &self.rules {
            let hit = models.iter().find(|name| {
                let name = name.to_lowercase();
                rule.iter().all(|marker| name.contains(marker.as_str()))
            });
            if let Some(name) = hit {
                return Some(name.as_str());
            }
        }

        models.first().map(String::as_str)
    }
}

impl Default for ModelPreference {
    fn default() -> Self {
        Self::parse(DEFAULT_MODEL_PREFERENCE)
    }
}

/// Query the catalog and pick a model
pub async fn select_model(
    provider: &dyn VisionProvider,
    preference: &ModelPreference,
) -> Result<String, SelectionError> {
    let capable: Vec<String> = provider
        .list_models()
        .await?
        .into_iter()
        .filter(|m| m.supports_generation())
        .map(|m| m.name)
        .collect();

    let chosen = preference
        .pick(&capable)
        .map(str::to_string)
        .ok_or(SelectionError::NoCapableModel)?;

    tracing::debug!(model = %chosen, candidates = capable.len(), "Selected model");
    Ok(chosen)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::provider::{InlineImage, ModelInfo, GENERATE_CONTENT};
    use async_trait::async_trait;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    struct Catalog(Result<Vec<ModelInfo>, String>);

    #[async_trait]
    impl VisionProvider for Catalog {
        async fn list_models(&self) -> Result<Vec<ModelInfo>, ProviderError> {
            self.0.clone().map_err(ProviderError::Transport)
        }

        async fn generate(
            &self,
            _model: &str,
            _prompt: &str,
            _images: &[InlineImage],
        ) -> Result<String, ProviderError> {
            unreachable!("selection never generates")
        }
    }

    #[test]
    fn test_parse_rules() {
        let pref = ModelPreference::parse(" Flash + 1.5 , , pro+vision,+ ");
        assert_eq!(
            pref.rules(),
            &[names(&["flash", "1.5"]), names(&["pro", "vision"])]
        );
        assert_eq!(pref, ModelPreference::default());
    }

    #[test]
    fn test_first_rule_wins_over_catalog_order() {
        let models = names(&[
            "models/gemini-pro-vision",
            "models/gemini-1.0-pro",
            "models/gemini-1.5-flash-latest",
            "models/gemini-1.5-flash",
        ]);
        let pref = ModelPreference::default();
        assert_eq!(pref.pick(&models), Some("models/gemini-1.5-flash-latest"));
    }

    #[test]
    fn test_second_rule_then_fallback() {
        let pref = ModelPreference::default();

        let models = names(&["models/gemini-1.0-pro", "models/gemini-pro-vision"]);
        assert_eq!(pref.pick(&models), Some("models/gemini-pro-vision"));

        let models = names(&["models/gemini-2.0-flash", "models/gemini-1.0-pro"]);
        assert_eq!(pref.pick(&models), Some("models/gemini-2.0-flash"));

        assert_eq!(pref.pick(&[]), None);
    }

    #[test]
    fn test_selection_is_deterministic() {
        let models = names(&["b-model", "a-pro-vision", "c-flash-1.5"]);
        let pref = ModelPreference::default();
        let first = pref.pick(&models);
        for _ in 0..10 {
            assert_eq!(pref.pick(&models), first);
        }
    }

    #[test]
    fn test_custom_preference() {
        let pref = ModelPreference::parse("2.5+pro,flash");
        let models = names(&["gemini-2.0-flash", "gemini-2.5-pro"]);
        assert_eq!(pref.pick(&models), Some("gemini-2.5-pro"));
    }

    #[tokio::test]
    async fn test_select_ignores_non_generating_models() {
        let provider = Catalog(Ok(vec![
            ModelInfo::new("models/embedding-001-flash-1.5", &["embedContent"]),
            ModelInfo::new("models/gemini-pro-vision", &[GENERATE_CONTENT]),
        ]));
        let chosen = select_model(&provider, &ModelPreference::default())
            .await
            .unwrap();
        assert_eq!(chosen, "models/gemini-pro-vision");
    }

    #[tokio::test]
    async fn test_empty_catalog_has_no_model() {
        let provider = Catalog(Ok(vec![]));
        let err = select_model(&provider, &ModelPreference::default())
            .await
            .unwrap_err();
        assert!(matches!(err, SelectionError::NoCapableModel));
    }

    #[tokio::test]
    async fn test_catalog_failure_is_reported() {
        let provider = Catalog(Err("connection reset".to_string()));
        let err = select_model(&provider, &ModelPreference::default())
            .await
            .unwrap_err();
        assert!(matches!(err, SelectionError::Catalog(_)));
        assert!(err.to_string().contains("connection reset"));
    }
}
