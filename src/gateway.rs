//! Outbound calls to the generative-text API and cleanup of what comes back.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use std::time::Duration;

use crate::dto::PolishedResult;

/// How much raw model output goes into the logs when it fails to parse.
pub const RAW_LOG_LIMIT: usize = 500;

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("AI client was not initialized")]
    ModelUnavailable,

    #[error("AI response is not a polished email: {reason}")]
    ResponseFormat { reason: String, raw: String },

    #[error("AI request failed: {0}")]
    UpstreamCall(String),

    #[error("AI API returned {status}: {body}")]
    UpstreamStatus { status: StatusCode, body: String },
}

impl From<reqwest::Error> for GatewayError {
    fn from(e: reqwest::Error) -> Self {
        Self::UpstreamCall(e.to_string())
    }
}

/// A model that answers a prompt with text expected to hold one JSON object.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate_json(&self, prompt: &str) -> Result<String, GatewayError>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateResponse {
    fn into_text(self) -> Option<String> {
        let parts = self.candidates.into_iter().next()?.content?.parts;
        let text: String = parts.into_iter().filter_map(|p| p.text).collect();
        (!text.is_empty()).then_some(text)
    }
}

/// Gemini `generateContent` client.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(
        api_key: String,
        model: String,
        base_url: &str,
        timeout: Duration,
    ) -> Result<Self, GatewayError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_key,
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate_json(&self, prompt: &str) -> Result<String, GatewayError> {
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![RequestPart { text: prompt }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
            },
        };

        tracing::debug!("Calling model {}", self.model);

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::UpstreamStatus { status, body });
        }

        let generated: GenerateResponse = response.json().await?;
        generated
            .into_text()
            .ok_or_else(|| GatewayError::UpstreamCall("no text in model response".to_string()))
    }
}

/// Strips a surrounding code fence and whitespace from model output.
pub fn normalize_model_output(raw: &str) -> &str {
    let trimmed = raw.trim();
    if trimmed.len() >= 6 && trimmed.starts_with("```") && trimmed.ends_with("```") {
        if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}')) {
            if start < end {
                return trimmed[start..=end].trim();
            }
        }
    }
    trimmed
}

/// Parses normalized model output into the four-field result.
pub fn parse_polished(raw: &str) -> Result<PolishedResult, GatewayError> {
    let text = normalize_model_output(raw);
    serde_json::from_str(text).map_err(|e| GatewayError::ResponseFormat {
        reason: e.to_string(),
        raw: text.chars().take(RAW_LOG_LIMIT).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const BARE: &str = r#"{"polishedSubject":"A","polishedBody":"B","tone":"Formal","readability":"High"}"#;

    fn expected() -> PolishedResult {
        PolishedResult {
            polished_subject: "A".to_string(),
            polished_body: "B".to_string(),
            tone: "Formal".to_string(),
            readability: "High".to_string(),
        }
    }

    #[test]
    fn bare_object_parses() {
        assert_eq!(parse_polished(BARE).unwrap(), expected());
    }

    #[test]
    fn fenced_object_parses_like_bare() {
        let fenced = format!("```json\n{BARE}\n```");
        assert_eq!(parse_polished(&fenced).unwrap(), expected());

        let tight = format!("```{BARE}```");
        assert_eq!(parse_polished(&tight).unwrap(), expected());

        let padded = format!("\n  ```json\n{BARE}\n```  \n");
        assert_eq!(parse_polished(&padded).unwrap(), expected());
    }

    #[test]
    fn unfenced_text_is_only_trimmed() {
        assert_eq!(normalize_model_output("  {\"a\":1}\n"), "{\"a\":1}");
        assert_eq!(normalize_model_output("note: {\"a\":1}"), "note: {\"a\":1}");
    }

    #[test]
    fn prose_is_a_format_error() {
        let err = parse_polished("Sorry, I can't help").unwrap_err();
        match err {
            GatewayError::ResponseFormat { raw, .. } => assert_eq!(raw, "Sorry, I can't help"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn missing_field_is_a_format_error() {
        let partial = r#"{"polishedSubject":"A","polishedBody":"B","tone":"Formal"}"#;
        assert!(matches!(
            parse_polished(partial),
            Err(GatewayError::ResponseFormat { .. })
        ));
    }

    #[test]
    fn raw_output_is_truncated_for_logging() {
        let long = "x".repeat(RAW_LOG_LIMIT * 2);
        match parse_polished(&long).unwrap_err() {
            GatewayError::ResponseFormat { raw, .. } => {
                assert_eq!(raw.chars().count(), RAW_LOG_LIMIT);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn request_body_asks_for_json() {
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![RequestPart { text: "hello" }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
            },
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["contents"][0]["parts"][0]["text"], "hello");
        assert_eq!(
            value["generationConfig"]["responseMimeType"],
            "application/json"
        );
    }

    #[test]
    fn response_text_joins_parts_of_first_candidate() {
        let body = r#"{"candidates":[{"content":{"parts":[{"text":"{\"a\":"},{"text":"1}"}]}},{"content":{"parts":[{"text":"ignored"}]}}]}"#;
        let response: GenerateResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.into_text().as_deref(), Some("{\"a\":1}"));

        let empty: GenerateResponse = serde_json::from_str(r#"{"candidates":[]}"#).unwrap();
        assert!(empty.into_text().is_none());
    }

    #[test]
    fn endpoint_includes_model() {
        let client = GeminiClient::new(
            "k".to_string(),
            "gemini-2.5-flash".to_string(),
            "https://example.test/v1beta/",
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(
            client.endpoint(),
            "https://example.test/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }
}
