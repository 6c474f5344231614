//! LINE webhook payload types. Only the fields the reply pipeline reads are
//! modeled; serde skips the rest.

use replybot_core::message::IncomingMessage;
use serde::Deserialize;

/// Body of one webhook call: a batch of events.
#[derive(Debug, Deserialize)]
pub struct WebhookPayload {
    pub events: Vec<WebhookEvent>,
}

impl WebhookPayload {
    pub fn parse(body: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(body)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookEvent {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub reply_token: Option<String>,
    #[serde(default)]
    pub source: Option<EventSource>,
    #[serde(default)]
    pub message: Option<EventMessage>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSource {
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventMessage {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub text: Option<String>,
}

impl WebhookEvent {
    /// The event as an inbound text message, or `None` for anything that is
    /// not a text message with a reply token.
    pub fn to_incoming(&self) -> Option<IncomingMessage> {
        if self.kind != "message" {
            return None;
        }
        let message = self.message.as_ref().filter(|m| m.kind == "text")?;
        let text = message.text.clone()?;
        let reply_target = self.reply_token.clone().filter(|t| !t.is_empty())?;

        Some(IncomingMessage {
            sender_id: self.source.as_ref().and_then(|s| s.user_id.clone()),
            text,
            reply_target,
        })
    }
}
