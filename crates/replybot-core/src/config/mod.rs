mod defaults;
mod providers;


pub use providers::*;

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

use crate::error::ReplybotError;
use defaults::*;

/// Top-level replybot configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub line: LineConfig,
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub reply: ReplyConfig,
    #[serde(default)]
    pub settings: SettingsConfig,
    #[serde(default)]
    pub log: LogConfig,
}

/// HTTP listener config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Externally reachable base URL used for uploaded file links.
    /// Empty = derive from the request's `Host` header.
    #[serde(default)]
    pub public_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            public_url: String::new(),
        }
    }
}

/// LINE Messaging API credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineConfig {
    /// Shared secret used to verify `x-line-signature`.
    #[serde(default)]
    pub channel_secret: String,
    /// Bearer token for the reply API.
    #[serde(default)]
    pub channel_access_token: String,
    #[serde(default = "default_line_api_base")]
    pub api_base: String,
}

impl Default for LineConfig {
    fn default() -> Self {
        Self {
            channel_secret: String::new(),
            channel_access_token: String::new(),
            api_base: default_line_api_base(),
        }
    }
}

/// Reply pipeline knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplyConfig {
    /// Sent in place of a reply when an event fails.
    #[serde(default = "default_apology_message")]
    pub apology_message: String,
    /// Flex `altText` used when a rule provides none.
    #[serde(default = "default_alt_text")]
    pub default_alt_text: String,
    /// Deadline for the completion call on the fallback path.
    #[serde(default = "default_completion_timeout")]
    pub completion_timeout_secs: u64,
}

impl Default for ReplyConfig {
    fn default() -> Self {
        Self {
            apology_message: default_apology_message(),
            default_alt_text: default_alt_text(),
            completion_timeout_secs: default_completion_timeout(),
        }
    }
}

/// Where the operator-editable settings and assets live.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingsConfig {
    #[serde(default = "default_settings_path")]
    pub path: String,
    #[serde(default = "default_admin_page")]
    pub admin_page: String,
    #[serde(default = "default_uploads_dir")]
    pub uploads_dir: String,
    /// Bearer token for admin and upload routes. Empty = no auth.
    #[serde(default)]
    pub admin_api_key: String,
}

impl Default for SettingsConfig {
    fn default() -> Self {
        Self {
            path: default_settings_path(),
            admin_page: default_admin_page(),
            uploads_dir: default_uploads_dir(),
            admin_api_key: String::new(),
        }
    }
}

/// Logging config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Directory for daily rolling log files. Empty = stdout only.
    #[serde(default)]
    pub dir: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            dir: String::new(),
        }
    }
}

impl Config {
    /// Overlay environment variables on top of the file values.
    ///
    /// Recognized: `PORT`, `LINE_CHANNEL_SECRET`, `LINE_ACCESS_TOKEN`,
    /// `OPENAI_API_KEY`, `ANTHROPIC_API_KEY`.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ReplybotError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup("PORT") {
            self.server.port = port
                .trim()
                .parse()
                .map_err(|_| ReplybotError::Config(format!("invalid PORT: {port}")))?;
        }
        if let Some(secret) = lookup("LINE_CHANNEL_SECRET") {
            self.line.channel_secret = secret;
        }
        if let Some(token) = lookup("LINE_ACCESS_TOKEN") {
            self.line.channel_access_token = token;
        }
        if let Some(key) = lookup("OPENAI_API_KEY") {
            self.provider.openai.get_or_insert_with(Default::default).api_key = key;
        }
        if let Some(key) = lookup("ANTHROPIC_API_KEY") {
            self.provider
                .anthropic
                .get_or_insert_with(Default::default)
                .api_key = key;
        }
        Ok(())
    }

    /// Fail fast when the LINE credentials needed to serve webhooks are missing.
    pub fn require_line_credentials(&self) -> Result<(), ReplybotError> {
        if self.line.channel_secret.is_empty() {
            return Err(ReplybotError::Config(
                "line.channel_secret is empty. Set it in config.toml or LINE_CHANNEL_SECRET."
                    .to_string(),
            ));
        }
        if self.line.channel_access_token.is_empty() {
            return Err(ReplybotError::Config(
                "line.channel_access_token is empty. Set it in config.toml or LINE_ACCESS_TOKEN."
                    .to_string(),
            ));
        }
        Ok(())
    }
}

/// Load configuration from a TOML file, then apply environment overrides.
///
/// Falls back to defaults if the file does not exist.
pub fn load(path: &str) -> Result<Config, ReplybotError> {
    let mut config = load_file(Path::new(path))?;
    config.apply_env_overrides(|key| std::env::var(key).ok().filter(|v| !v.is_empty()))?;
    Ok(config)
}

fn load_file(path: &Path) -> Result<Config, ReplybotError> {
    if !path.exists() {
        info!(
            "Config file not found at {}, using defaults",
            path.display()
        );
        return Ok(Config::default());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| ReplybotError::Config(format!("failed to read {}: {}", path.display(), e)))?;

    toml::from_str(&content)
        .map_err(|e| ReplybotError::Config(format!("failed to parse config: {}", e)))
}
