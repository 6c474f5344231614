//! Anthropic Messages API provider.

use async_trait::async_trait;
use replybot_core::{
    context::Context,
    error::ReplybotError,
    message::{Completion, MessageMetadata},
    traits::Provider,
};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, warn};

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Anthropic Messages API provider.
pub struct AnthropicProvider {
    client: reqwest::Client,
    api_key: String,
    model: String,
    max_tokens: u32,
}

impl AnthropicProvider {
    /// Create from config values.
    pub fn from_config(api_key: String, model: String, max_tokens: u32) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            model,
            max_tokens,
        }
    }
}

#[derive(Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    #[serde(skip_serializing_if = "String::is_empty")]
    system: String,
    messages: Vec<AnthropicMessage>,
}

#[derive(Serialize, Deserialize)]
struct AnthropicMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct AnthropicResponse {
    content: Option<Vec<AnthropicContentBlock>>,
    model: Option<String>,
    usage: Option<AnthropicUsage>,
}

#[derive(Deserialize)]
struct AnthropicContentBlock {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    text: String,
}

#[derive(Deserialize)]
struct AnthropicUsage {
    #[serde(default)]
    input_tokens: u64,
    #[serde(default)]
    output_tokens: u64,
}

impl AnthropicResponse {
    /// Concatenated text blocks, trimmed; `None` when nothing was said.
    fn text(&self) -> Option<String> {
        let joined: String = self
            .content
            .as_deref()
            .unwrap_or_default()
            .iter()
            .filter(|b| b.kind.is_empty() || b.kind == "text")
            .map(|b| b.text.as_str())
            .collect();
        let trimmed = joined.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    }
}

#[async_trait]
impl Provider for AnthropicProvider {
    fn name(&self) -> &str {
        "anthropic"
    }

    async fn complete(&self, context: &Context) -> Result<Completion, ReplybotError> {
        let (system, api_messages) = context.to_api_messages();
        let start = Instant::now();

        let body = AnthropicRequest {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            system,
            messages: api_messages
                .into_iter()
                .map(|m| AnthropicMessage {
                    role: m.role,
                    content: m.content,
                })
                .collect(),
        };

        debug!("anthropic: POST {ANTHROPIC_API_URL} model={}", self.model);

        let resp = self
            .client
            .post(ANTHROPIC_API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| ReplybotError::Provider(format!("anthropic request failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(ReplybotError::Provider(format!(
                "anthropic returned {status}: {text}"
            )));
        }

        let parsed: AnthropicResponse = resp.json().await.map_err(|e| {
            ReplybotError::Provider(format!("anthropic: failed to parse response: {e}"))
        })?;

        let text = parsed
            .text()
            .ok_or_else(|| ReplybotError::Provider("anthropic: empty completion".to_string()))?;

        Ok(Completion {
            text,
            metadata: MessageMetadata {
                provider_used: "anthropic".to_string(),
                tokens_used: parsed
                    .usage
                    .as_ref()
                    .map(|u| u.input_tokens + u.output_tokens),
                processing_time_ms: start.elapsed().as_millis() as u64,
                model: parsed.model,
            },
        })
    }

    async fn is_available(&self) -> bool {
        if self.api_key.is_empty() {
            warn!("anthropic: no API key configured");
            return false;
        }
        // No lightweight health endpoint; trust the key.
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anthropic_provider_name() {
        let p = AnthropicProvider::from_config("sk-ant-test".into(), "claude".into(), 512);
        assert_eq!(p.name(), "anthropic");
    }

    #[test]
    fn test_request_empty_system_omitted() {
        let body = AnthropicRequest {
            model: "claude".into(),
            max_tokens: 512,
            system: String::new(),
            messages: vec![AnthropicMessage {
                role: "user".into(),
                content: "Hello".into(),
            }],
        };
        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("system").is_none());
        assert_eq!(json["max_tokens"], 512);
    }

    #[test]
    fn test_response_joins_text_blocks_and_skips_others() {
        let json = r#"{"content":[{"type":"text","text":"สวัสดี"},{"type":"tool_use","text":"x"},{"type":"text","text":"ค่ะ "}],"usage":{"input_tokens":10,"output_tokens":5}}"#;
        let resp: AnthropicResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.text(), Some("สวัสดีค่ะ".into()));
    }

    #[test]
    fn test_empty_response_yields_none() {
        let resp: AnthropicResponse = serde_json::from_str(r#"{"content":[]}"#).unwrap();
        assert_eq!(resp.text(), None);
        let resp: AnthropicResponse = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(resp.text(), None);
    }
}
