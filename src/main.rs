mod app;
mod bridge;
mod cli;
mod completion;
mod config;
mod context;
mod conversation;
mod credentials;
mod editor;
mod error;
mod mention;
mod models;
mod orchestrator;
mod paths;
mod prompt;
mod provider;
mod workspace;

#[cfg(feature = "tui")]
mod markdown;
#[cfg(feature = "tui")]
mod tui;

use anyhow::Context;
use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // stdout is reserved for replies and bridge events.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = cli::Args::parse();

    let config_dir = paths::config_dir()?;
    let cfg = config::Config::load_optional(config_dir.join("config.toml"))?.unwrap_or_default();
    tracing::debug!(?config_dir, ?cfg, "resolved config");

    let http = reqwest::Client::builder()
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("failed to build HTTP client")?;

    match &args.cmd {
        Some(cli::Command::ConfigureKey { key }) => {
            return app::cmd_configure_key(key.clone());
        }
        Some(cli::Command::Models) => {
            let selected = app::resolve_model(&args, &cfg)?;
            app::cmd_models(&selected);
            return Ok(());
        }
        Some(cli::Command::Bridge) => {
            let (orchestrator, events) = app::build_orchestrator(&http, &args, &cfg)?;
            return bridge::run_stdio(orchestrator, events).await;
        }
        #[cfg(feature = "tui")]
        Some(cli::Command::Tui) => {
            let (orchestrator, events) = app::build_orchestrator(&http, &args, &cfg)?;
            return tui::run_tui(orchestrator, events).await;
        }
        None => {}
    }

    let prompt = args.prompt.join(" ");
    if prompt.trim().is_empty() {
        anyhow::bail!(
            "No prompt provided. Try: code-chat \"Explain this\" --file src/main.rs, or `code-chat bridge`"
        );
    }

    let (orchestrator, events) = app::build_orchestrator(&http, &args, &cfg)?;
    app::cmd_ask(orchestrator, events, prompt, &args.attach).await
}
