use serde::{Deserialize, Serialize};

pub const DEFAULT_TONE: &str = "Professional";

/// Draft submitted to `/api/analyze`. Every field is optional on the wire.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftRequest {
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub tone_option: Option<String>,
}

/// A draft with defaults filled in, ready for prompting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Draft {
    pub subject: String,
    pub body: String,
    pub tone: String,
}

impl Draft {
    /// Length in characters, as the client counts them.
    pub fn char_count(&self) -> usize {
        self.subject.chars().count() + self.body.chars().count()
    }
}

impl From<DraftRequest> for Draft {
    fn from(request: DraftRequest) -> Self {
        Self {
            subject: request.subject.unwrap_or_default(),
            body: request.body.unwrap_or_default(),
            tone: request
                .tone_option
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_TONE.to_string()),
        }
    }
}

/// The rewritten email and its scores, exactly as the frontend expects them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PolishedResult {
    pub polished_subject: String,
    pub polished_body: String,
    pub tone: String,
    pub readability: String,
}

/// Body of `/api/send`. Any `from` field the client sends is ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SendEmailRequest {
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendEmailResponse {
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub ai_available: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
