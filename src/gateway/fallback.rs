//! Completion path for texts no keyword rule claims.

use super::Gateway;
use replybot_core::{context::Context, error::ReplybotError, message::ReplyMessage};
use std::time::Duration;
use tracing::{debug, info};

impl Gateway {
    /// Answer `text` with the provider, bounded by the completion deadline.
    ///
    /// Without a provider the prompt itself is the reply.
    pub(super) async fn fallback_reply(
        &self,
        prompt: &str,
        text: &str,
    ) -> Result<ReplyMessage, ReplybotError> {
        let Some(provider) = &self.provider else {
            debug!("no provider configured, replying with prompt");
            return Ok(ReplyMessage::text(prompt));
        };

        let context = Context::new(prompt, text);
        let secs = self.reply.completion_timeout_secs;
        let completion = tokio::time::timeout(Duration::from_secs(secs), provider.complete(&context))
            .await
            .map_err(|_| ReplybotError::Timeout(secs))??;

        let answer = completion.text.trim();
        if answer.is_empty() {
            return Err(ReplybotError::Provider(format!(
                "{} returned an empty completion",
                provider.name()
            )));
        }
        info!(
            "completion from {} in {}ms",
            completion.metadata.provider_used, completion.metadata.processing_time_ms
        );
        Ok(ReplyMessage::text(answer))
    }
}
