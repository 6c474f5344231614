//! Gateway: turns a batch of webhook events into replies.
//!
//! Each event runs select → (completion fallback) → deliver against one
//! settings snapshot captured for the whole batch.

mod dispatch;
mod fallback;
pub mod selector;


pub use dispatch::EventOutcome;

use replybot_core::{
    config::ReplyConfig,
    settings::SettingsStore,
    traits::{Channel, Provider},
};
use std::sync::Arc;

/// Routes inbound events to canned replies or the completion provider.
pub struct Gateway {
    pub(super) provider: Option<Arc<dyn Provider>>,
    pub(super) channel: Arc<dyn Channel>,
    pub(super) settings: Arc<SettingsStore>,
    pub(super) reply: ReplyConfig,
}

impl Gateway {
    pub fn new(
        provider: Option<Arc<dyn Provider>>,
        channel: Arc<dyn Channel>,
        settings: Arc<SettingsStore>,
        reply: ReplyConfig,
    ) -> Self {
        Self {
            provider,
            channel,
            settings,
            reply,
        }
    }

    pub fn channel(&self) -> &Arc<dyn Channel> {
        &self.channel
    }

    pub fn settings(&self) -> &Arc<SettingsStore> {
        &self.settings
    }
}
