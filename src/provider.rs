//! Remote language-model providers.
//!
//! The relay treats the model as a black box: a prompt goes in, a single
//! block of text comes out. [`SummaryProvider`] is the seam between the
//! HTTP layer and the network; [`GeminiProvider`] is the production
//! implementation, and tests substitute their own.
//!
//! # Error classification
//!
//! Provider failures carry the upstream message verbatim. The server maps
//! them to HTTP statuses by inspecting that message (see [`ProviderError::kind`]):
//!
//! | Message contains | Kind | HTTP |
//! |------------------|------|------|
//! | `API key` | [`ProviderErrorKind::Auth`] | 401 |
//! | `quota` | [`ProviderErrorKind::Quota`] | 429 |
//! | anything else | [`ProviderErrorKind::Other`] | 500 |

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::config::ProviderConfig;

/// A failure reported by (or while talking to) the remote model.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ProviderError {
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorKind {
    Auth,
    Quota,
    Other,
}

impl ProviderError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ProviderErrorKind {
        if self.message.contains("API key") {
            ProviderErrorKind::Auth
        } else if self.message.contains("quota") {
            ProviderErrorKind::Quota
        } else {
            ProviderErrorKind::Other
        }
    }
}

/// A remote text-generation capability.
#[async_trait]
pub trait SummaryProvider: Send + Sync {
    /// Short provider identifier used in logs (e.g. `"gemini"`).
    fn name(&self) -> &str;

    /// Model identifier requests are sent to.
    fn model(&self) -> &str;

    /// Sends `prompt` and returns the generated text.
    ///
    /// Exactly one attempt is made; callers decide what to do with failures.
    async fn generate(&self, prompt: &str) -> Result<String, ProviderError>;
}

// ============ Gemini ============

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(rename = "generationConfig", skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(rename = "maxOutputTokens", skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    candidates: Option<Vec<Candidate>>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ApiError,
}

/// Google Gemini `generateContent` client.
///
/// Holds one `reqwest::Client` for the life of the process; the configured
/// timeout bounds every call.
pub struct GeminiProvider {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
    temperature: Option<f32>,
    max_output_tokens: Option<u32>,
}

impl GeminiProvider {
    pub fn new(config: &ProviderConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config
                .model
                .trim_start_matches("models/")
                .to_string(),
            api_key: config.api_key.clone().filter(|k| !k.trim().is_empty()),
            temperature: config.temperature,
            max_output_tokens: config.max_output_tokens,
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }

    fn request_body<'a>(&self, prompt: &'a str) -> GenerateRequest<'a> {
        let generation_config =
            if self.temperature.is_some() || self.max_output_tokens.is_some() {
                Some(GenerationConfig {
                    temperature: self.temperature,
                    max_output_tokens: self.max_output_tokens,
                })
            } else {
                None
            };
        GenerateRequest {
            contents: vec![Content {
                parts: vec![RequestPart { text: prompt }],
            }],
            generation_config,
        }
    }
}

#[async_trait]
impl SummaryProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            ProviderError::new("API key not configured: set GEMINI_API_KEY")
        })?;

        debug!(model = %self.model, prompt_bytes = prompt.len(), "sending generateContent");

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", api_key)
            .json(&self.request_body(prompt))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::new("request to Gemini timed out")
                } else {
                    ProviderError::new(format!("request to Gemini failed: {}", e))
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::new(format!("failed to read Gemini response: {}", e)))?;

        if !status.is_success() {
            let detail = serde_json::from_str::<ErrorEnvelope>(&body)
                .map(|env| env.error.message)
                .unwrap_or(body);
            return Err(ProviderError::new(format!(
                "Gemini API error ({}): {}",
                status, detail
            )));
        }

        parse_generate_response(&body)
    }
}

/// Extracts the first candidate's text from a `generateContent` response body.
fn parse_generate_response(body: &str) -> Result<String, ProviderError> {
    let parsed: GenerateResponse = serde_json::from_str(body)
        .map_err(|e| ProviderError::new(format!("invalid Gemini response: {}", e)))?;

    if let Some(error) = parsed.error {
        return Err(ProviderError::new(format!(
            "Gemini API error: {}",
            error.message
        )));
    }

    let text: String = parsed
        .candidates
        .and_then(|c| c.into_iter().next())
        .and_then(|c| c.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|p| p.text)
                .collect::<Vec<_>>()
                .concat()
        })
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(ProviderError::new("Gemini returned an empty response"));
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_by_message() {
        assert_eq!(
            ProviderError::new("API key not valid. Please pass a valid API key.").kind(),
            ProviderErrorKind::Auth
        );
        assert_eq!(
            ProviderError::new("You exceeded your current quota").kind(),
            ProviderErrorKind::Quota
        );
        assert_eq!(
            ProviderError::new("model overloaded").kind(),
            ProviderErrorKind::Other
        );
    }

    #[test]
    fn auth_wins_over_quota() {
        let err = ProviderError::new("API key has no quota");
        assert_eq!(err.kind(), ProviderErrorKind::Auth);
    }

    #[test]
    fn parses_candidate_text() {
        let body = r#"{"candidates":[{"content":{"parts":[{"text":"Hello "},{"text":"world."}],"role":"model"}}]}"#;
        assert_eq!(parse_generate_response(body).unwrap(), "Hello world.");
    }

    #[test]
    fn empty_candidates_is_an_error() {
        let err = parse_generate_response(r#"{"candidates":[]}"#).unwrap_err();
        assert!(err.message.contains("empty"));
        let err = parse_generate_response("{}").unwrap_err();
        assert!(err.message.contains("empty"));
    }

    #[test]
    fn embedded_error_is_reported() {
        let err = parse_generate_response(r#"{"error":{"message":"quota exhausted"}}"#)
            .unwrap_err();
        assert_eq!(err.kind(), ProviderErrorKind::Quota);
    }

    #[tokio::test]
    async fn missing_key_is_an_auth_error() {
        let provider = GeminiProvider::new(&ProviderConfig::default()).unwrap();
        let err = provider.generate("hello").await.unwrap_err();
        assert_eq!(err.kind(), ProviderErrorKind::Auth);
    }

    #[test]
    fn model_prefix_is_stripped() {
        let cfg = ProviderConfig {
            model: "models/gemini-2.5-flash".to_string(),
            base_url: "http://localhost:1/".to_string(),
            ..Default::default()
        };
        let provider = GeminiProvider::new(&cfg).unwrap();
        assert_eq!(
            provider.endpoint(),
            "http://localhost:1/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }
}
