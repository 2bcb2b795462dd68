/// Assessment client — the single point of entry for scoring-service calls.
///
/// ARCHITECTURAL RULE: no other module may call the scoring API directly;
/// everything goes through [`Assessor`].
///
/// The client never retries: the scheduler treats any failure as terminal
/// for that document in the current run, and re-queueing is an operator
/// action.
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::assessment::prompts;

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
/// The model used for all assessment calls.
/// Intentionally hardcoded to prevent accidental drift.
pub const MODEL: &str = "claude-sonnet-4-5";
const MAX_TOKENS: u32 = 1024;

#[derive(Debug, Error)]
pub enum AssessError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("malformed assessment result: {0}")]
    Parse(String),

    #[error("assessment service returned empty content")]
    EmptyContent,
}

/// The structured result of one scoring call. Deserialization fails closed:
/// a reply missing any field, or carrying a wrong-typed one, is a
/// [`AssessError::Parse`], never a partially-filled result.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Assessment {
    pub base_requirement_score: i32,
    pub commentary: String,
    pub fitness_score: i32,
}

#[async_trait]
pub trait Assessor: Send + Sync {
    async fn assess(
        &self,
        resume_text: &str,
        role_description: &str,
    ) -> Result<Assessment, AssessError>;
}

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<AnthropicMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
    usage: Usage,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    input_tokens: u32,
    output_tokens: u32,
}

impl MessagesResponse {
    fn text(&self) -> Option<&str> {
        self.content
            .iter()
            .find(|b| b.block_type == "text")
            .and_then(|b| b.text.as_deref())
    }
}

#[derive(Debug, Deserialize)]
struct AnthropicError {
    error: AnthropicErrorBody,
}

#[derive(Debug, Deserialize)]
struct AnthropicErrorBody {
    message: String,
}

/// Scores resumes against a role description via the Anthropic Messages API.
#[derive(Clone)]
pub struct AnthropicAssessor {
    client: Client,
    api_key: String,
}

impl AnthropicAssessor {
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(120))
                .build()
                .expect("Failed to build HTTP client"),
            api_key,
        }
    }
}

#[async_trait]
impl Assessor for AnthropicAssessor {
    async fn assess(
        &self,
        resume_text: &str,
        role_description: &str,
    ) -> Result<Assessment, AssessError> {
        let system = prompts::assessment_system(role_description);
        let request_body = AnthropicRequest {
            model: MODEL,
            max_tokens: MAX_TOKENS,
            system: &system,
            messages: vec![AnthropicMessage {
                role: "user",
                content: resume_text,
            }],
        };

        let response = self
            .client
            .post(ANTHROPIC_API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            // Surface the API's own message when the body parses
            let message = serde_json::from_str::<AnthropicError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(AssessError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: MessagesResponse = response.json().await?;
        debug!(
            "Assessment call succeeded: input_tokens={}, output_tokens={}",
            parsed.usage.input_tokens, parsed.usage.output_tokens
        );

        let text = parsed.text().ok_or(AssessError::EmptyContent)?;
        parse_assessment(text)
    }
}

/// Parses the model's reply into a typed [`Assessment`].
pub(crate) fn parse_assessment(text: &str) -> Result<Assessment, AssessError> {
    let text = strip_json_fences(text);
    serde_json::from_str(text).map_err(|e| AssessError::Parse(e.to_string()))
}

/// Strips ```json ... ``` or ``` ... ``` code fences from model output.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}
