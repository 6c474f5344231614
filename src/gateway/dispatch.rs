//! Concurrent per-event processing for one webhook batch.

use super::{selector, Gateway};
use replybot_channels::line::types::WebhookEvent;
use replybot_core::{
    error::ReplybotError,
    message::{IncomingMessage, ReplyMessage},
    settings::Settings,
};
use serde::Serialize;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

/// What happened to one event of a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EventOutcome {
    /// Not a text message; nothing sent.
    Skipped,
    /// Reply delivered. `rule` is `None` on the completion path.
    Replied { rule: Option<usize>, messages: usize },
    /// The pipeline failed and the apology was delivered instead.
    Apologized { reason: String },
    /// The reply API rejected the reply; not retried.
    DeliveryFailed { error: String },
}

impl Gateway {
    /// Process a batch. Outcomes are returned in input order.
    ///
    /// A panicked event task fails the whole batch, but only after every
    /// sibling task has finished and delivered its own reply.
    pub async fn dispatch(
        self: &Arc<Self>,
        events: &[WebhookEvent],
    ) -> Result<Vec<EventOutcome>, ReplybotError> {
        let snapshot = self.settings.snapshot();
        let mut outcomes = vec![EventOutcome::Skipped; events.len()];
        let mut tasks = JoinSet::new();

        for (index, event) in events.iter().enumerate() {
            let Some(incoming) = event.to_incoming() else {
                continue;
            };
            let gw = Arc::clone(self);
            let settings = Arc::clone(&snapshot);
            tasks.spawn(async move { (index, gw.handle_message(&settings, incoming).await) });
        }

        let mut failure = None;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, outcome)) => outcomes[index] = outcome,
                Err(e) => {
                    error!("event task failed: {e}");
                    failure.get_or_insert(e.to_string());
                }
            }
        }
        match failure {
            Some(e) => Err(ReplybotError::Dispatch(e)),
            None => Ok(outcomes),
        }
    }

    /// Run one text message through select → fallback → deliver.
    pub(super) async fn handle_message(
        &self,
        settings: &Settings,
        incoming: IncomingMessage,
    ) -> EventOutcome {
        let lowered = incoming.text.to_lowercase();
        let (rule, messages) =
            match selector::select(settings, &lowered, &self.reply.default_alt_text) {
                Ok(selector::Selection::Reply {
                    rule_index,
                    messages,
                }) => (Some(rule_index), messages),
                Ok(selector::Selection::Fallback) => {
                    match self.fallback_reply(&settings.prompt, &incoming.text).await {
                        Ok(message) => (None, vec![message]),
                        Err(e) => return self.apologize(&incoming, e).await,
                    }
                }
                Err(e) => return self.apologize(&incoming, e).await,
            };

        let count = messages.len();
        match self.channel.reply(&incoming.reply_target, messages).await {
            Ok(()) => {
                info!(
                    "replied to {} ({count} messages, rule {rule:?})",
                    incoming.sender_id.as_deref().unwrap_or("unknown")
                );
                EventOutcome::Replied {
                    rule,
                    messages: count,
                }
            }
            Err(e) => {
                warn!("reply delivery failed: {e}");
                EventOutcome::DeliveryFailed {
                    error: e.to_string(),
                }
            }
        }
    }

    async fn apologize(&self, incoming: &IncomingMessage, cause: ReplybotError) -> EventOutcome {
        warn!("event failed, sending apology: {cause}");
        let apology = ReplyMessage::text(self.reply.apology_message.as_str());
        match self.channel.reply(&incoming.reply_target, vec![apology]).await {
            Ok(()) => EventOutcome::Apologized {
                reason: cause.to_string(),
            },
            Err(e) => {
                warn!("apology delivery failed: {e}");
                EventOutcome::DeliveryFailed {
                    error: e.to_string(),
                }
            }
        }
    }
}
