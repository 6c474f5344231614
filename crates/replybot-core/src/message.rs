use serde::{Deserialize, Serialize};
use serde_json::Value;

/// LINE rejects text messages longer than this many characters.
pub const MAX_TEXT_CHARS: usize = 5000;

/// LINE rejects flex `altText` longer than this many characters.
pub const MAX_ALT_TEXT_CHARS: usize = 400;

/// An inbound text message extracted from a webhook event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncomingMessage {
    /// Platform-specific user ID, when the source carries one.
    pub sender_id: Option<String>,
    /// Message text content, as the user typed it.
    pub text: String,
    /// Opaque handle used to reply to this message (LINE reply token).
    pub reply_target: String,
}

/// One outbound message object in a reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ReplyMessage {
    Text {
        text: String,
    },
    #[serde(rename_all = "camelCase")]
    Image {
        original_content_url: String,
        preview_image_url: String,
    },
    #[serde(rename_all = "camelCase")]
    Flex {
        alt_text: String,
        contents: Value,
    },
}

impl ReplyMessage {
    /// Plain text message, truncated to the platform limit.
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text {
            text: truncate_chars(text.into(), MAX_TEXT_CHARS),
        }
    }

    /// Image message using the same URL for the full image and the preview.
    pub fn image(url: impl Into<String>) -> Self {
        let url = url.into();
        Self::Image {
            original_content_url: url.clone(),
            preview_image_url: url,
        }
    }

    /// Flex message wrapping a bubble or carousel container. `alt_text` is
    /// truncated to the platform limit.
    pub fn flex(alt_text: impl Into<String>, contents: Value) -> Self {
        Self::Flex {
            alt_text: truncate_chars(alt_text.into(), MAX_ALT_TEXT_CHARS),
            contents,
        }
    }
}

fn truncate_chars(s: String, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((cut, _)) => s[..cut].to_string(),
        None => s,
    }
}

/// A completion returned by a language-model provider.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Completion {
    pub text: String,
    pub metadata: MessageMetadata,
}

/// Metadata about how a completion was generated.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MessageMetadata {
    /// Which provider produced this response.
    pub provider_used: String,
    /// Token count (if available from the provider).
    pub tokens_used: Option<u64>,
    /// Wall-clock processing time in milliseconds.
    pub processing_time_ms: u64,
    /// Model identifier (if applicable).
    pub model: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_reply_message_wire_shape() {
        let img = serde_json::to_value(ReplyMessage::image("https://x/a.png")).unwrap();
        assert_eq!(
            img,
            json!({
                "type": "image",
                "originalContentUrl": "https://x/a.png",
                "previewImageUrl": "https://x/a.png",
            })
        );

        let flex = serde_json::to_value(ReplyMessage::flex("alt", json!({"type": "bubble"})))
            .unwrap();
        assert_eq!(flex["type"], "flex");
        assert_eq!(flex["altText"], "alt");
        assert_eq!(flex["contents"]["type"], "bubble");
    }

    #[test]
    fn test_text_message_truncates_to_platform_limit() {
        let long = "ก".repeat(MAX_TEXT_CHARS + 10);
        match ReplyMessage::text(long) {
            ReplyMessage::Text { text } => assert_eq!(text.chars().count(), MAX_TEXT_CHARS),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_flex_alt_text_truncates_to_platform_limit() {
        let title = "โปร".repeat(200);
        match ReplyMessage::flex(title, json!({"type": "bubble"})) {
            ReplyMessage::Flex { alt_text, .. } => {
                assert_eq!(alt_text.chars().count(), MAX_ALT_TEXT_CHARS)
            }
            other => panic!("unexpected {other:?}"),
        }
        match ReplyMessage::flex("short", json!({})) {
            ReplyMessage::Flex { alt_text, .. } => assert_eq!(alt_text, "short"),
            other => panic!("unexpected {other:?}"),
        }
    }
}
