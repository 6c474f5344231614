//! Provider factory: builds the configured completion provider from config.

use replybot_core::{config, traits::Provider};
use replybot_providers::{anthropic::AnthropicProvider, openai::OpenAiProvider};
use std::sync::Arc;

/// Build the configured provider. `"none"` yields `None`: the fallback path
/// then replies with the settings prompt.
pub fn build_provider(cfg: &config::Config) -> anyhow::Result<Option<Arc<dyn Provider>>> {
    match cfg.provider.default.as_str() {
        "none" | "" => Ok(None),
        "openai" => {
            let oc = cfg
                .provider
                .openai
                .as_ref()
                .ok_or_else(|| anyhow::anyhow!("provider.openai section missing in config"))?;
            if oc.api_key.is_empty() {
                anyhow::bail!("provider.openai.api_key is empty. Set it in config.toml or OPENAI_API_KEY.");
            }
            Ok(Some(Arc::new(OpenAiProvider::from_config(
                oc.base_url.clone(),
                oc.api_key.clone(),
                oc.model.clone(),
            ))))
        }
        "anthropic" => {
            let ac =
                cfg.provider.anthropic.as_ref().ok_or_else(|| {
                    anyhow::anyhow!("provider.anthropic section missing in config")
                })?;
            if ac.api_key.is_empty() {
                anyhow::bail!(
                    "provider.anthropic.api_key is empty. Set it in config.toml or ANTHROPIC_API_KEY."
                );
            }
            Ok(Some(Arc::new(AnthropicProvider::from_config(
                ac.api_key.clone(),
                ac.model.clone(),
                ac.max_tokens,
            ))))
        }
        other => anyhow::bail!("unsupported provider: {other}"),
    }
}
