//! OpenAI-compatible chat completions provider.
//!
//! Works with OpenAI's API and any endpoint that speaks the same
//! `/chat/completions` dialect (OpenRouter, Together, local gateways).

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

/// OpenAI-compatible provider.
pub struct OpenAiProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenAiProvider {
    /// Create from config values.
    pub fn from_config(base_url: String, api_key: String, model: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            api_key,
            model,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url.trim_end_matches('/'))
    }
}

#[derive(Serialize, Deserialize, Clone)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Option<Vec<ChatChoice>>,
    model: Option<String>,
    usage: Option<ChatUsage>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: Option<ChatMessage>,
}

#[derive(Deserialize)]
struct ChatUsage {
    total_tokens: Option<u64>,
}

/// The fallback prompt travels as the `system` message, the user text as `user`.
fn build_request(model: &str, context: &Context) -> ChatCompletionRequest {
    let (system, api_messages) = context.to_api_messages();
    let mut messages = Vec::with_capacity(api_messages.len() + 1);
    if !system.is_empty() {
        messages.push(ChatMessage {
            role: "system".to_string(),
            content: system,
        });
    }
    messages.extend(api_messages.into_iter().map(|m| ChatMessage {
        role: m.role,
        content: m.content,
    }));
    ChatCompletionRequest {
        model: model.to_string(),
        messages,
    }
}

/// First non-blank choice text, trimmed.
fn reply_text(resp: &ChatCompletionResponse) -> Option<String> {
    resp.choices
        .as_ref()?
        .iter()
        .filter_map(|c| c.message.as_ref())
        .map(|m| m.content.trim())
        .find(|text| !text.is_empty())
        .map(str::to_string)
}

#[async_trait]
impl Provider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn complete(&self, context: &Context) -> Result<Completion, ReplybotError> {
        let start = Instant::now();
        let body = build_request(&self.model, context);

        let url = self.endpoint("chat/completions");
        debug!("openai: POST {url} model={}", self.model);

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ReplybotError::Provider(format!("openai request failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(ReplybotError::Provider(format!(
                "openai returned {status}: {text}"
            )));
        }

        let parsed: ChatCompletionResponse = resp.json().await.map_err(|e| {
            ReplybotError::Provider(format!("openai: failed to parse response: {e}"))
        })?;

        let text = reply_text(&parsed)
            .ok_or_else(|| ReplybotError::Provider("openai: empty completion".to_string()))?;

        Ok(Completion {
            text,
            metadata: MessageMetadata {
                provider_used: "openai".to_string(),
                tokens_used: parsed.usage.as_ref().and_then(|u| u.total_tokens),
                processing_time_ms: start.elapsed().as_millis() as u64,
                model: parsed.model,
            },
        })
    }

    async fn is_available(&self) -> bool {
        if self.api_key.is_empty() {
            warn!("openai: no API key configured");
            return false;
        }
        match self
            .client
            .get(self.endpoint("models"))
            .bearer_auth(&self.api_key)
            .send()
            .await
        {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                warn!("openai not available: {e}");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openai_provider_name() {
        let p = OpenAiProvider::from_config(
            "https://api.openai.com/v1/".into(),
            "sk-test".into(),
            "gpt-4o-mini".into(),
        );
        assert_eq!(p.name(), "openai");
        assert_eq!(
            p.endpoint("chat/completions"),
            "https://api.openai.com/v1/chat/completions"
        );
    }

    #[test]
    fn test_request_puts_prompt_in_system_role() {
        let ctx = Context::new("ตอบสั้นๆ", "สวัสดี");
        let req = build_request("gpt-4o-mini", &ctx);
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["model"], "gpt-4o-mini");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][0]["content"], "ตอบสั้นๆ");
        assert_eq!(json["messages"][1]["role"], "user");
        assert_eq!(json["messages"][1]["content"], "สวัสดี");
    }

    #[test]
    fn test_request_without_prompt_has_only_user() {
        let req = build_request("m", &Context::new("", "hi"));
        assert_eq!(req.messages.len(), 1);
        assert_eq!(req.messages[0].role, "user");
    }

    #[test]
    fn test_response_parsing() {
        let json = r#"{"choices":[{"message":{"role":"assistant","content":"  สวัสดีค่ะ \n"},"finish_reason":"stop"}],"model":"gpt-4o-mini","usage":{"total_tokens":42}}"#;
        let resp: ChatCompletionResponse = serde_json::from_str(json).unwrap();
        assert_eq!(reply_text(&resp), Some("สวัสดีค่ะ".into()));
        assert_eq!(resp.usage.as_ref().and_then(|u| u.total_tokens), Some(42));
    }

    #[test]
    fn test_blank_or_missing_choices_yield_none() {
        let blank: ChatCompletionResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"role":"assistant","content":"   "}}]}"#,
        )
        .unwrap();
        assert_eq!(reply_text(&blank), None);

        let missing: ChatCompletionResponse = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(reply_text(&missing), None);
    }
}
