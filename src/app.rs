use crate::cli::Args;
use crate::completion::CompletionClient;
use crate::context::AttachedFile;
use crate::credentials::{self, CredentialStore, FileCredentialStore};
use crate::editor::EditorState;
use crate::orchestrator::{Orchestrator, UiEvent, UiRequest};
use crate::{config, models, paths, provider};
use anyhow::Context;
use provider::Provider;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

pub type HostOrchestrator = Orchestrator<FileCredentialStore, EditorState>;

pub fn credential_store() -> anyhow::Result<FileCredentialStore> {
    let path = paths::credentials_path()?;
    Ok(FileCredentialStore::new(path).with_env_override(credentials::API_KEY_ENV))
}

pub fn build_provider(
    http: &reqwest::Client,
    cfg: &config::Config,
    provider_name: &str,
) -> anyhow::Result<Arc<dyn Provider + Send + Sync>> {
    match provider_name {
        "groq" => {
            #[cfg(feature = "groq")]
            {
                let p = match cfg.api_base.as_deref() {
                    Some(base) => provider::groq::GroqProvider::with_base(http.clone(), base)
                        .with_context(|| format!("invalid api_base: {base}"))?,
                    None => provider::groq::GroqProvider::new(http.clone())?,
                };
                Ok(Arc::new(p))
            }
            #[cfg(not(feature = "groq"))]
            {
                let _ = http;
                let _ = cfg;
                anyhow::bail!("groq provider is not enabled in this build")
            }
        }
        "stub" => Ok(Arc::new(provider::stub::StubProvider::new())),
        other => anyhow::bail!("unknown provider: {other}"),
    }
}

/// Model from the CLI, then config, then the catalog default. Must be in the catalog.
pub fn resolve_model(args: &Args, cfg: &config::Config) -> anyhow::Result<String> {
    let model = args
        .model
        .clone()
        .or_else(|| cfg.model.clone())
        .unwrap_or_else(|| models::DEFAULT_MODEL.to_string());
    if models::find(&model).is_none() {
        anyhow::bail!("unknown model: {model} (run `code-chat models` to list them)");
    }
    Ok(model)
}

pub fn build_orchestrator(
    http: &reqwest::Client,
    args: &Args,
    cfg: &config::Config,
) -> anyhow::Result<(HostOrchestrator, mpsc::UnboundedReceiver<UiEvent>)> {
    let provider_name = args
        .provider
        .clone()
        .or_else(|| cfg.provider.clone())
        .unwrap_or_else(|| "groq".to_string());
    let provider = build_provider(http, cfg, &provider_name)?;

    let model = resolve_model(args, cfg)?;
    let client = CompletionClient::new(provider, cfg.client_config(model));

    let root = match &args.workspace {
        Some(dir) => dir.clone(),
        None => std::env::current_dir().context("failed to resolve current directory")?,
    };
    let mut editor = EditorState::new(root, cfg.workspace_limit());
    editor.current_file = args.file.clone();
    editor.language = args.language.clone();
    editor.selection = args.selection;

    tracing::debug!(
        provider = %provider_name,
        model = client.current_model(),
        "orchestrator ready"
    );

    let (tx, rx) = mpsc::unbounded_channel();
    Ok((Orchestrator::new(client, credential_store()?, editor, tx), rx))
}

pub fn cmd_configure_key(key: Option<String>) -> anyhow::Result<()> {
    use std::io::{BufRead, Write};

    let key = match key {
        Some(k) => k,
        None => {
            let mut err = std::io::stderr();
            write!(
                err,
                "Enter your Groq API key (get one at https://console.groq.com/keys): "
            )
            .ok();
            err.flush().ok();
            let mut line = String::new();
            std::io::stdin()
                .lock()
                .read_line(&mut line)
                .context("failed to read API key from stdin")?;
            line
        }
    };
    let key = key.trim();
    if key.is_empty() {
        anyhow::bail!("no API key given");
    }

    let store = FileCredentialStore::new(paths::credentials_path()?);
    store.set(key)?;
    eprintln!("Saved Groq API key to: {}", store.path().display());
    Ok(())
}

pub fn cmd_models(selected: &str) {
    for m in models::all() {
        let mark = if m.id == selected { "*" } else { " " };
        println!("{mark} {:<26} {:<22} {}", m.id, m.name, m.description);
    }
}

/// Send one prompt through the orchestrator and print the reply.
pub async fn cmd_ask(
    mut orchestrator: HostOrchestrator,
    mut events: mpsc::UnboundedReceiver<UiEvent>,
    prompt: String,
    attach: &[std::path::PathBuf],
) -> anyhow::Result<()> {
    let attached_files = attach
        .iter()
        .map(|p| AttachedFile::load(p))
        .collect::<anyhow::Result<Vec<_>>>()?;

    let request = UiRequest::SendMessage {
        content: prompt,
        attached_files,
    };
    orchestrator
        .handle(request, &CancellationToken::new())
        .await;
    drop(orchestrator);

    while let Some(event) = events.recv().await {
        match event {
            UiEvent::Thinking => tracing::debug!("waiting for response"),
            UiEvent::AddMessage(msg) => println!("{}", msg.content),
            UiEvent::Error(text) => anyhow::bail!(text),
            other => tracing::debug!(?other, "ignored UI event"),
        }
    }
    Ok(())
}
