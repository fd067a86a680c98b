//! OpenAI-compatible chat completions backend with structured output.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::prompts::{DEFAULT_MODEL, SCHEMA_NAME};
use super::{ClassificationRequest, LabelModel, ModelError};

/// Default OpenAI API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct JsonSchemaFormat<'a> {
    name: &'static str,
    strict: bool,
    schema: &'a serde_json::Value,
}

#[derive(Debug, Serialize)]
struct ResponseFormat<'a> {
    #[serde(rename = "type")]
    format_type: &'static str,
    json_schema: JsonSchemaFormat<'a>,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    response_format: ResponseFormat<'a>,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
    #[serde(default)]
    refusal: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiError,
}

/// Labeling model backed by an OpenAI-compatible `/chat/completions` endpoint.
#[derive(Debug, Clone)]
pub struct OpenAiModel {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    model: String,
}

impl OpenAiModel {
    pub fn new(api_key: Option<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.filter(|k| !k.is_empty()),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: normalize_model(&model.into()),
        }
    }

    /// Create from `OPENAI_API_KEY`, `OPENAI_BASE_URL` and an optional model name.
    pub fn from_env(model: Option<&str>) -> Self {
        let model = Self::new(
            std::env::var("OPENAI_API_KEY").ok(),
            model.unwrap_or(DEFAULT_MODEL),
        );
        match std::env::var("OPENAI_BASE_URL") {
            Ok(url) if !url.is_empty() => model.with_base_url(url),
            _ => model,
        }
    }

    /// Set a custom base URL (proxies, compatible providers, tests).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

/// Accept `provider/model` spellings such as `openai/gpt-4o-mini`.
fn normalize_model(model: &str) -> String {
    let model = model.trim();
    if model.is_empty() {
        return DEFAULT_MODEL.to_string();
    }
    model
        .strip_prefix("openai/")
        .unwrap_or(model)
        .to_string()
}

#[async_trait]
impl LabelModel for OpenAiModel {
    fn name(&self) -> &str {
        &self.model
    }

    async fn classify(&self, request: &ClassificationRequest) -> Result<String, ModelError> {
        let api_key = self.api_key.as_ref().ok_or(ModelError::NotConfigured)?;

        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &request.system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: &request.user_message,
                },
            ],
            response_format: ResponseFormat {
                format_type: "json_schema",
                json_schema: JsonSchemaFormat {
                    name: SCHEMA_NAME,
                    strict: true,
                    schema: &request.schema,
                },
            },
            temperature: 0.0,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ModelError::Request(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ModelError::Request(format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            let message = serde_json::from_str::<ApiErrorResponse>(&text)
                .map(|e| e.error.message)
                .unwrap_or(text);
            return Err(ModelError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: ChatResponse = serde_json::from_str(&text)
            .map_err(|e| ModelError::Request(format!("Failed to parse response: {}", e)))?;

        let message = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message)
            .ok_or(ModelError::EmptyResponse)?;

        if let Some(refusal) = message.refusal {
            return Err(ModelError::Refusal(refusal));
        }

        message
            .content
            .filter(|c| !c.trim().is_empty())
            .ok_or(ModelError::EmptyResponse)
    }
}
