//! Generative provider boundary
//!
//! The orchestrator only needs two calls: list the model catalog and run
//! one multimodal generation. Everything provider-specific lives behind
//! `VisionProvider`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Capability flag for text generation
pub const GENERATE_CONTENT: &str = "generateContent";

/// One catalog entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ModelInfo {
    /// Model identifier as the provider names it, e.g. `models/gemini-1.5-flash`
    pub name: String,

    /// Generation methods the model supports
    #[serde(default)]
    pub supported_methods: Vec<String>,
}

impl ModelInfo {
    pub fn new(name: impl Into<String>, methods: &[&str]) -> Self {
        Self {
            name: name.into(),
            supported_methods: methods.iter().map(|m| m.to_string()).collect(),
        }
    }

    pub fn supports_generation(&self) -> bool {
        self.supported_methods.iter().any(|m| m == GENERATE_CONTENT)
    }
}

/// Image payload sent inline with a prompt
#[derive(Debug, Clone)]
pub struct InlineImage {
    pub mime_type: &'static str,
    pub data: Vec<u8>,
}

#[derive(Debug, Error)]
pub enum ProviderError {
    /// Network failure, timeout, TLS
    #[error("request failed: {0}")]
    Transport(String),

    /// Non-success status from the provider (quota, auth, bad request)
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Response body did not have the expected shape
    #[error("malformed response: {0}")]
    Malformed(String),

    /// The provider refused to answer the prompt
    #[error("response blocked: {0}")]
    Blocked(String),
}

/// Multimodal text generation service
#[async_trait]
pub trait VisionProvider: Send + Sync {
    /// Full model catalog
    async fn list_models(&self) -> Result<Vec<ModelInfo>, ProviderError>;

    /// Generate text for `prompt` plus `images`, in order
    async fn generate(
        &self,
        model: &str,
        prompt: &str,
        images: &[InlineImage],
    ) -> Result<String, ProviderError>;
}
