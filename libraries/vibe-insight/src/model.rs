//! Text model client
//!
//! Speaks the `generateContent` REST surface with a JSON response schema.

use crate::error::{InsightError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

/// Default hosted endpoint
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Default model name
pub const DEFAULT_MODEL: &str = "gemini-3-flash-preview";

/// A model that turns a prompt into JSON text matching `schema`
#[async_trait]
pub trait TextModel: Send + Sync {
    /// Generate a JSON document for `prompt`
    async fn generate_json(&self, prompt: &str, schema: &Value) -> Result<String>;
}

/// Model client configuration
#[derive(Debug, Clone)]
pub struct ModelConfig {
    /// API key; requests are not attempted without one
    pub api_key: Option<String>,
    /// Model name
    pub model: String,
    /// Endpoint base URL
    pub base_url: String,
    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig<'a>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<TextPart<'a>>,
}

#[derive(Debug, Serialize)]
struct TextPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig<'a> {
    response_mime_type: &'static str,
    response_schema: &'a Value,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
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

impl GenerateResponse {
    fn text(self) -> Option<String> {
        self.candidates
            .into_iter()
            .filter_map(|c| c.content)
            .flat_map(|c| c.parts)
            .find_map(|p| p.text)
            .filter(|t| !t.is_empty())
    }
}

/// `generateContent` client
pub struct GeminiClient {
    http: Client,
    config: ModelConfig,
}

impl GeminiClient {
    /// Create a client; validates the base URL
    pub fn new(config: ModelConfig) -> Result<Self> {
        let base_url = config.base_url.trim_end_matches('/').to_string();
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(InsightError::InvalidUrl(
                "URL must start with http:// or https://".into(),
            ));
        }

        let http = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(Duration::from_secs(10))
            .user_agent(format!("VibePlayer/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            config: ModelConfig { base_url, ..config },
        })
    }

    /// Model name in use
    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url, self.config.model
        )
    }
}

#[async_trait]
impl TextModel for GeminiClient {
    async fn generate_json(&self, prompt: &str, schema: &Value) -> Result<String> {
        let key = self
            .config
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or(InsightError::MissingApiKey)?;

        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![TextPart { text: prompt }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                response_schema: schema,
            },
        };

        debug!(model = %self.config.model, "Requesting vibe report");
        let response = self
            .http
            .post(self.endpoint())
            .query(&[("key", key)])
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(InsightError::ServerError {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| InsightError::ParseError(e.to_string()))?;
        parsed.text().ok_or(InsightError::EmptyResponse)
    }
}

/// Response schema for a vibe report
pub(crate) fn vibe_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "playlistName": { "type": "STRING" },
            "vibe": { "type": "STRING" },
            "description": { "type": "STRING" },
            "suggestedColorFrom": { "type": "STRING", "description": "A Hex color code" },
            "suggestedColorTo": { "type": "STRING", "description": "A Hex color code" }
        },
        "required": ["playlistName", "vibe", "description", "suggestedColorFrom", "suggestedColorTo"]
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_http_base() {
        let config = ModelConfig {
            base_url: "ftp://models".into(),
            ..ModelConfig::default()
        };
        assert!(matches!(GeminiClient::new(config), Err(InsightError::InvalidUrl(_))));
    }

    #[test]
    fn endpoint_includes_model() {
        let client = GeminiClient::new(ModelConfig {
            base_url: "http://localhost:8080/".into(),
            ..ModelConfig::default()
        })
        .unwrap();
        assert_eq!(
            client.endpoint(),
            "http://localhost:8080/v1beta/models/gemini-3-flash-preview:generateContent"
        );
    }

    #[test]
    fn extracts_first_text_part() {
        let raw = r#"{"candidates":[{"content":{"parts":[{"text":"{\"a\":1}"}]}}]}"#;
        let parsed: GenerateResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.text().as_deref(), Some("{\"a\":1}"));
    }

    #[test]
    fn no_candidates_means_no_text() {
        let parsed: GenerateResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.text().is_none());
    }

    #[test]
    fn schema_requires_all_fields() {
        let schema = vibe_schema();
        assert_eq!(schema["required"].as_array().map(Vec::len), Some(5));
    }
}
