use crate::{
    context::Context,
    error::ReplybotError,
    message::{Completion, ReplyMessage},
};
use async_trait::async_trait;

/// Language-model provider used on the fallback path.
///
/// Every completion backend (OpenAI-compatible, Anthropic) implements this
/// trait to provide a uniform interface.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Human-readable provider name.
    fn name(&self) -> &str;

    /// Send a prompt context to the provider and get a completion.
    async fn complete(&self, context: &Context) -> Result<Completion, ReplybotError>;

    /// Check if the provider is available and ready.
    async fn is_available(&self) -> bool;
}

/// Messaging channel that delivers replies to inbound events.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Human-readable channel name.
    fn name(&self) -> &str;

    /// Check a webhook signature against the exact request bytes.
    fn verify_signature(&self, body: &[u8], signature: &str) -> bool;

    /// Deliver one or more messages against a reply handle. No retries.
    async fn reply(
        &self,
        reply_target: &str,
        messages: Vec<ReplyMessage>,
    ) -> Result<(), ReplybotError>;
}
