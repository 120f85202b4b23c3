//! Gemini API Client
//!
//! Handles communication with Google's Generative Language REST API:
//! - Model catalog listing (paged)
//! - Multimodal `generateContent` with inline JPEG parts
//!
//! Calls are never retried; each one is bounded by the configured timeout.

use super::http_client::gemini_client;
use super::provider::{InlineImage, ModelInfo, ProviderError, VisionProvider};
use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default REST endpoint
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Configuration for the Gemini client
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// API key for Google AI
    pub api_key: String,

    /// Base URL for API (default: v1beta endpoint)
    pub base_url: String,

    /// Deadline for each request
    pub timeout: Duration,

    /// Output token ceiling for a report
    pub max_output_tokens: u32,

    pub temperature: f32,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            timeout: Duration::from_secs(120),
            max_output_tokens: 4096,
            temperature: 0.2,
        }
    }
}

/// Gemini client
pub struct GeminiClient {
    client: Client,
    config: GeminiConfig,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Self {
        Self {
            client: gemini_client().clone(),
            config,
        }
    }

    /// Use a caller-built HTTP client instead of the shared one
    pub fn with_client(config: GeminiConfig, client: Client) -> Self {
        Self { client, config }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<String, ProviderError> {
        let resp = request
            .header("x-goog-api-key", &self.config.api_key)
            .timeout(self.config.timeout)
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        if status.is_success() {
            Ok(body)
        } else {
            Err(ProviderError::Api {
                status: status.as_u16(),
                message: api_error_message(&body),
            })
        }
    }
}

#[async_trait]
impl VisionProvider for GeminiClient {
    async fn list_models(&self) -> Result<Vec<ModelInfo>, ProviderError> {
        let mut models = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self
                .client
                .get(self.endpoint("models"))
                .query(&[("pageSize", "1000")]);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token.as_str())]);
            }

            let body = self.send(request).await?;
            let page = parse_models_page(&body)?;
            models.extend(page.models.into_iter().map(ModelInfo::from));

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        Ok(models)
    }

    async fn generate(
        &self,
        model: &str,
        prompt: &str,
        images: &[InlineImage],
    ) -> Result<String, ProviderError> {
        let request = build_generate_request(prompt, images, &self.config);
        let url = self.endpoint(&format!("{}:generateContent", qualified_model(model)));

        tracing::info!(model, images = images.len(), "Sending inspection prompt");

        let body = self.send(self.client.post(url).json(&request)).await?;
        parse_generate_response(&body)
    }
}

/// Catalog ids come back as `models/<id>`; bare ids are accepted too
fn qualified_model(model: &str) -> String {
    if model.starts_with("models/") || model.starts_with("tunedModels/") {
        model.to_string()
    } else {
        format!("models/{}", model)
    }
}

// API request/response types

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content {
    role: &'static str,
    parts: Vec<Part>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part {
    Text { text: String },
    Inline {
        #[serde(rename = "inlineData")]
        inline_data: Blob,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Blob {
    mime_type: String,
    data: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    max_output_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModelsPage {
    #[serde(default)]
    models: Vec<RawModel>,
    next_page_token: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawModel {
    name: String,
    #[serde(default)]
    supported_generation_methods: Vec<String>,
}

impl From<RawModel> for ModelInfo {
    fn from(raw: RawModel) -> Self {
        ModelInfo {
            name: raw.name,
            supported_methods: raw.supported_generation_methods,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
}

fn build_generate_request(
    prompt: &str,
    images: &[InlineImage],
    config: &GeminiConfig,
) -> GenerateRequest {
    let mut parts = vec![Part::Text {
        text: prompt.to_string(),
    }];

    parts.extend(images.iter().map(|img| Part::Inline {
        inline_data: Blob {
            mime_type: img.mime_type.to_string(),
            data: base64::engine::general_purpose::STANDARD.encode(&img.data),
        },
    }));

    GenerateRequest {
        contents: vec![Content {
            role: "user",
            parts,
        }],
        generation_config: GenerationConfig {
            max_output_tokens: config.max_output_tokens,
            temperature: config.temperature,
        },
    }
}

fn parse_models_page(body: &str) -> Result<ModelsPage, ProviderError> {
    serde_json::from_str(body)
        .map_err(|e| ProviderError::Malformed(format!("Failed to parse model list: {}", e)))
}

/// Concatenate the text parts of the first candidate
fn parse_generate_response(body: &str) -> Result<String, ProviderError> {
    let response: GenerateResponse = serde_json::from_str(body)
        .map_err(|e| ProviderError::Malformed(format!("Failed to parse response: {}", e)))?;

    if let Some(reason) = response
        .prompt_feedback
        .and_then(|f| f.block_reason)
    {
        return Err(ProviderError::Blocked(reason));
    }

    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| ProviderError::Malformed("No candidates in response".to_string()))?;

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        return match candidate.finish_reason {
            Some(reason) if reason != "STOP" => Err(ProviderError::Blocked(reason)),
            _ => Err(ProviderError::Malformed("Empty response text".to_string())),
        };
    }

    Ok(text)
}

/// Prefer the structured error message, fall back to the raw body
fn api_error_message(body: &str) -> String {
    serde_json::from_str::<ApiErrorBody>(body)
        .map(|b| b.error.message)
        .unwrap_or_else(|_| body.trim().to_string())
}
