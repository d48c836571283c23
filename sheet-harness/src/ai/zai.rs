use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};

use super::{ChatRequest, ChatResponse, CompletionBackend, Message};
use crate::error::{HarnessError, Result};
use crate::models::HarnessSettings;
use crate::tools::ToolSpec;

const CONNECTIVITY_TIMEOUT: Duration = Duration::from_secs(30);
const ERROR_BODY_PREVIEW: usize = 300;

/// Client for the Z.AI (OpenAI-compatible) chat-completion endpoint.
pub struct ZaiClient {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

impl ZaiClient {
    pub fn new(settings: &HarnessSettings) -> Result<Self> {
        let api_key = sanitize_api_key(&settings.api_key);
        if api_key.is_empty() {
            return Err(HarnessError::Config(
                "TEST_AGENT_SECRET is empty or has no printable characters".to_string(),
            ));
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", settings.endpoint.trim_end_matches('/')),
            api_key,
            model: settings.model.clone(),
            max_tokens: settings.max_tokens,
            temperature: settings.temperature,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// One tiny request to prove the key and endpoint work.
    pub async fn check_connectivity(&self) -> Result<()> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![Message::user("test")],
            max_tokens: 5,
            temperature: None,
            tools: None,
            tool_choice: None,
        };
        self.post(&request, Some(CONNECTIVITY_TIMEOUT)).await?;
        log::info!("[api] Connectivity check passed ({})", self.model);
        Ok(())
    }

    /// POST a request, returning the raw body of a 2xx reply.
    async fn post(&self, request: &ChatRequest, timeout: Option<Duration>) -> Result<String> {
        let mut builder = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .header("Accept", "application/json")
            .json(request);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = translate_api_error(status.as_u16(), &body);
            log::error!("[api] HTTP {}: {}", status.as_u16(), message);
            return Err(HarnessError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(body)
    }
}

#[async_trait]
impl CompletionBackend for ZaiClient {
    async fn complete(&self, messages: &[Message], tools: &[ToolSpec]) -> Result<ChatResponse> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: messages.to_vec(),
            max_tokens: self.max_tokens,
            temperature: Some(self.temperature),
            tools: (!tools.is_empty()).then(|| tools.to_vec()),
            tool_choice: (!tools.is_empty()).then(|| json!("auto")),
        };
        log::debug!(
            "[api] -> {} ({} messages, {} tools)",
            self.model,
            request.messages.len(),
            tools.len()
        );

        let body = self.post(&request, None).await?;
        let response: ChatResponse =
            serde_json::from_str(&body).map_err(|source| HarnessError::Parse {
                source,
                body: clip(&body, ERROR_BODY_PREVIEW),
            })?;
        let Some(choice) = response.choices.first() else {
            return Err(HarnessError::NoChoices);
        };

        let names: Vec<&str> = choice
            .message
            .calls()
            .iter()
            .map(|c| c.function.name.as_str())
            .collect();
        log::debug!(
            "[api] <- finish={} tools=[{}] tokens={}",
            choice.finish_reason.as_deref().unwrap_or("unknown"),
            names.join(", "),
            response.usage.map(|u| u.total_tokens).unwrap_or(0)
        );
        Ok(response)
    }
}

/// Trim the key and drop anything outside printable ASCII; pasted keys often
/// carry invisible Unicode.
pub fn sanitize_api_key(raw: &str) -> String {
    raw.trim().chars().filter(|c| (' '..='~').contains(c)).collect()
}

/// Turn a non-2xx reply into a message a person can act on.
pub fn translate_api_error(status: u16, body: &str) -> String {
    let code = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| match &v["error"]["code"] {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .unwrap_or_default();

    match code.as_str() {
        "1261" => "API balance is empty. Add tokens at open.z.ai to continue.".to_string(),
        "1301" | "1302" => {
            "The request was blocked by the provider's content filter.".to_string()
        }
        _ => match status {
            401 => "Invalid API key. Check TEST_AGENT_SECRET.".to_string(),
            429 => "Too many requests. Wait a moment and try again.".to_string(),
            _ => format!(
                "An API error occurred (HTTP {}): {}",
                status,
                clip(body, ERROR_BODY_PREVIEW)
            ),
        },
    }
}

fn clip(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}
