use thiserror::Error;

use crate::settings::SettingsError;

/// Top-level error type for replybot.
#[derive(Debug, Error)]
pub enum ReplybotError {
    /// Error from a language-model provider.
    #[error("provider error: {0}")]
    Provider(String),

    /// Error from the messaging channel (reply delivery).
    #[error("channel error: {0}")]
    Channel(String),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// The settings document failed migration or validation.
    #[error("settings error: {0}")]
    Settings(#[from] SettingsError),

    /// A keyword rule could not be turned into messages.
    #[error("template error: {0}")]
    Template(String),

    /// An outbound call exceeded its deadline.
    #[error("timed out after {0}s")]
    Timeout(u64),

    /// A per-event task could not be joined.
    #[error("dispatch error: {0}")]
    Dispatch(String),

    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
