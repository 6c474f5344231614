mod api;
mod gateway;
mod provider_builder;

use clap::{Parser, Subcommand};
use gateway::selector::{self, Selection};
use replybot_channels::line::LineChannel;
use replybot_core::{
    config::{self, LogConfig},
    settings::{ReplyKind, Settings, SettingsStore},
    template,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(
    name = "replybot",
    version,
    about = "Keyword-driven LINE auto-responder with language-model fallback"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file.
    #[arg(short, long, default_value = "config.toml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the webhook server.
    Start,
    /// Show config, settings, and provider availability.
    Status,
    /// Load and validate the settings file.
    Check,
    /// Run the keyword selector offline against a message.
    Ask {
        /// The message to match.
        #[arg(trailing_var_arg = true)]
        message: Vec<String>,
    },
}

/// Install the tracing subscriber. The guard must live as long as the process.
fn init_logging(cfg: &LogConfig) -> Option<WorkerGuard> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cfg.level));

    if cfg.dir.is_empty() {
        tracing_subscriber::fmt().with_env_filter(filter).init();
        return None;
    }

    let appender = tracing_appender::rolling::daily(&cfg.dir, "replybot.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(fmt::layer().with_ansi(false).with_writer(writer))
        .init();
    Some(guard)
}

/// Load the settings file strictly: a missing file is an error here.
fn load_settings(path: &Path) -> anyhow::Result<Settings> {
    if !path.exists() {
        anyhow::bail!("settings file not found: {}", path.display());
    }
    let store = SettingsStore::open(path)?;
    Ok((*store.snapshot()).clone())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load(&cli.config)?;
    let _log_guard = init_logging(&cfg.log);

    match cli.command {
        Commands::Start => {
            cfg.require_line_credentials()?;

            let provider = provider_builder::build_provider(&cfg)?;
            match &provider {
                Some(p) if !p.is_available().await => {
                    tracing::warn!("provider '{}' is not reachable right now", p.name());
                }
                Some(p) => tracing::info!("provider: {}", p.name()),
                None => tracing::info!("provider: none (fallback replies with the prompt)"),
            }

            let store = Arc::new(SettingsStore::open(&cfg.settings.path)?);
            tracing::info!(
                "loaded {} keyword rules from {}",
                store.snapshot().keywords.len(),
                store.path().display()
            );

            let channel = Arc::new(LineChannel::new(cfg.line.clone()));
            let gw = Arc::new(gateway::Gateway::new(
                provider,
                channel,
                store,
                cfg.reply.clone(),
            ));

            let state = api::ApiState {
                gateway: gw,
                admin_api_key: Some(cfg.settings.admin_api_key.clone())
                    .filter(|k| !k.is_empty()),
                admin_page: PathBuf::from(&cfg.settings.admin_page),
                uploads_dir: PathBuf::from(&cfg.settings.uploads_dir),
                public_url: Some(cfg.server.public_url.clone()).filter(|u| !u.is_empty()),
                uptime: Instant::now(),
            };

            println!("replybot — starting on port {}", cfg.server.port);
            let addr = format!("{}:{}", cfg.server.host, cfg.server.port);
            api::serve(state, &addr).await?;
        }
        Commands::Status => {
            println!("replybot — Status Check\n");
            println!("Config: {}", cli.config);
            println!("Listen: {}:{}", cfg.server.host, cfg.server.port);
            println!(
                "LINE credentials: {}",
                if cfg.require_line_credentials().is_ok() {
                    "configured"
                } else {
                    "missing"
                }
            );
            println!();

            match load_settings(Path::new(&cfg.settings.path)) {
                Ok(s) => println!(
                    "Settings: {} ({} rules, {} templates)",
                    cfg.settings.path,
                    s.keywords.len(),
                    s.flex_templates.len()
                ),
                Err(e) => println!("Settings: {e}"),
            }
            println!();

            println!("Default provider: {}", cfg.provider.default);
            match provider_builder::build_provider(&cfg) {
                Ok(Some(p)) => println!(
                    "  {}: {}",
                    p.name(),
                    if p.is_available().await {
                        "available"
                    } else {
                        "unreachable"
                    }
                ),
                Ok(None) => println!("  none: fallback replies with the prompt"),
                Err(e) => println!("  error: {e}"),
            }
        }
        Commands::Check => {
            let settings = load_settings(Path::new(&cfg.settings.path))?;
            println!("{}: ok\n", cfg.settings.path);
            println!("Prompt: {}", settings.prompt);
            println!();
            for (i, rule) in settings.keywords.iter().enumerate() {
                let detail = match &rule.reply {
                    ReplyKind::Text { .. } => String::new(),
                    ReplyKind::Image { images } => format!(" ({} images)", images.len()),
                    ReplyKind::Flex { layout, .. } => format!(" ({layout:?})"),
                    ReplyKind::Template {
                        template,
                        responses,
                        ..
                    } => format!(" ({template}, {} cards)", responses.len()),
                };
                println!(
                    "  #{i} {}{detail}: {}",
                    rule.reply.label(),
                    rule.keywords.join(", ")
                );
            }
            if !settings.flex_templates.is_empty() {
                println!();
                for (name, doc) in &settings.flex_templates {
                    let names: Vec<String> = template::placeholders(doc)
                        .into_iter()
                        .map(|n| format!("{{{{{n}}}}}"))
                        .collect();
                    if names.is_empty() {
                        println!("  template {name}: no placeholders");
                    } else {
                        println!("  template {name}: {}", names.join(", "));
                    }
                }
            }
        }
        Commands::Ask { message } => {
            if message.is_empty() {
                anyhow::bail!("no message provided. Usage: replybot ask <message>");
            }

            let text = message.join(" ");
            let settings = load_settings(Path::new(&cfg.settings.path))?;
            let output = match selector::select(
                &settings,
                &text.to_lowercase(),
                &cfg.reply.default_alt_text,
            )? {
                Selection::Reply {
                    rule_index,
                    messages,
                } => serde_json::json!({"rule": rule_index, "messages": messages}),
                Selection::Fallback => serde_json::json!({
                    "fallback": cfg.provider.default,
                    "prompt": settings.prompt,
                }),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}
