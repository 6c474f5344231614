//! Reply delivery through `POST /v2/bot/message/reply`.

use super::LineChannel;
use replybot_core::{error::ReplybotError, message::ReplyMessage, settings::MAX_REPLY_MESSAGES};
use serde_json::{json, Value};
use tracing::{debug, warn};

/// Request body for the reply API, capped at the per-reply message limit.
pub(crate) fn reply_body(reply_token: &str, messages: &[ReplyMessage]) -> Value {
    if messages.len() > MAX_REPLY_MESSAGES {
        warn!(
            "line: dropping {} messages over the per-reply limit",
            messages.len() - MAX_REPLY_MESSAGES
        );
    }
    let capped = &messages[..messages.len().min(MAX_REPLY_MESSAGES)];
    json!({
        "replyToken": reply_token,
        "messages": capped,
    })
}

impl LineChannel {
    /// Send messages against a reply token. Delivery is attempted once.
    pub(crate) async fn send_reply(
        &self,
        reply_token: &str,
        messages: &[ReplyMessage],
    ) -> Result<(), ReplybotError> {
        if messages.is_empty() {
            return Ok(());
        }
        let url = self.endpoint("v2/bot/message/reply");
        let body = reply_body(reply_token, messages);
        debug!("line: POST {url} ({} messages)", messages.len());

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.config.channel_access_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| ReplybotError::Channel(format!("line reply failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let error_text = resp.text().await.unwrap_or_default();
            return Err(ReplybotError::Channel(format!(
                "line reply failed ({status}): {error_text}"
            )));
        }
        Ok(())
    }
}
