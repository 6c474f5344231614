//! LINE Messaging API channel.
//!
//! Inbound events arrive by webhook (signed with the channel secret);
//! replies go out through the reply API using the event's reply token.
//! Docs: <https://developers.line.biz/en/reference/messaging-api/>

pub(crate) mod send;
pub mod signature;
pub mod types;

#[cfg(test)]
mod tests;

use async_trait::async_trait;
use replybot_core::{
    config::LineConfig, error::ReplybotError, message::ReplyMessage, traits::Channel,
};

/// LINE channel: signature checks plus the reply API client.
pub struct LineChannel {
    config: LineConfig,
    client: reqwest::Client,
}

impl LineChannel {
    /// Create a new LINE channel from config.
    pub fn new(config: LineConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.config.api_base.trim_end_matches('/'))
    }
}

#[async_trait]
impl Channel for LineChannel {
    fn name(&self) -> &str {
        "line"
    }

    fn verify_signature(&self, body: &[u8], signature: &str) -> bool {
        signature::verify(&self.config.channel_secret, body, signature)
    }

    async fn reply(
        &self,
        reply_target: &str,
        messages: Vec<ReplyMessage>,
    ) -> Result<(), ReplybotError> {
        self.send_reply(reply_target, &messages).await
    }
}
