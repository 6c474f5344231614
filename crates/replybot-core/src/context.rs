use serde::{Deserialize, Serialize};

/// Prompt context passed to a language-model provider on the fallback path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Context {
    /// Operator-configured prompt sent ahead of the user's text.
    pub system_prompt: String,
    /// The user's message, original casing preserved.
    pub current_message: String,
}

/// A structured message for API-based providers (OpenAI, Anthropic).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiMessage {
    /// "user" or "assistant".
    pub role: String,
    /// The message content.
    pub content: String,
}

impl Context {
    /// Create a context from the fallback prompt and the user's text.
    pub fn new(system_prompt: &str, message: &str) -> Self {
        Self {
            system_prompt: system_prompt.to_string(),
            current_message: message.to_string(),
        }
    }

    /// Convert context to structured API messages.
    ///
    /// Returns `(system_prompt, messages)` — the system prompt is separated
    /// because Anthropic requires it outside the messages array.
    pub fn to_api_messages(&self) -> (String, Vec<ApiMessage>) {
        let messages = vec![ApiMessage {
            role: "user".to_string(),
            content: self.current_message.clone(),
        }];
        (self.system_prompt.clone(), messages)
    }
}
