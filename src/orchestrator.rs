use crate::completion::CompletionClient;
use crate::context::{AttachedFile, FileKind};
use crate::conversation::Transcript;
use crate::credentials::CredentialStore;
use crate::editor::ContextSource;
use crate::error::CompletionError;
use crate::mention;
use crate::workspace::{EntryKind, WorkspaceFile};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Events sent by the chat UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum UiRequest {
    #[serde(rename_all = "camelCase")]
    SendMessage {
        content: String,
        #[serde(default)]
        attached_files: Vec<AttachedFile>,
    },
    GetWorkspaceFiles,
    SetModel(String),
    SetApiKey(String),
    /// The UI went away; abandon whatever is in flight.
    Dispose,
}

/// Events pushed to the chat UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum UiEvent {
    Ready,
    Thinking,
    AddMessage(ChatMessage),
    WorkspaceFiles(Vec<WorkspaceFile>),
    Error(String),
    Info(String),
    ModelChanged(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Ai,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: String,
    pub content: String,
    #[serde(rename = "type")]
    pub sender: Sender,
    /// RFC 3339, UTC.
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attached_files: Vec<AttachedFile>,
}

impl ChatMessage {
    pub fn ai(content: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            content: content.into(),
            sender: Sender::Ai,
            timestamp: chrono::Utc::now().to_rfc3339(),
            attached_files: Vec::new(),
        }
    }
}

/// Host-side glue between the UI protocol and the completion client.
pub struct Orchestrator<S, C> {
    client: CompletionClient,
    credentials: S,
    editor: C,
    transcript: Transcript,
    events: mpsc::UnboundedSender<UiEvent>,
}

impl<S, C> Orchestrator<S, C>
where
    S: CredentialStore,
    C: ContextSource,
{
    pub fn new(
        client: CompletionClient,
        credentials: S,
        editor: C,
        events: mpsc::UnboundedSender<UiEvent>,
    ) -> Self {
        Self {
            client,
            credentials,
            editor,
            transcript: Transcript::new(),
            events,
        }
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn model(&self) -> &str {
        self.client.current_model()
    }

    pub fn events(&self) -> mpsc::UnboundedSender<UiEvent> {
        self.events.clone()
    }

    fn emit(&self, event: UiEvent) {
        if self.events.send(event).is_err() {
            tracing::debug!("UI receiver closed; event dropped");
        }
    }

    pub fn ready(&self) {
        self.emit(UiEvent::Ready);
    }

    pub async fn handle(&mut self, request: UiRequest, cancel: &CancellationToken) {
        match request {
            UiRequest::SendMessage {
                content,
                attached_files,
            } => self.send_message(content, attached_files, cancel).await,
            UiRequest::GetWorkspaceFiles => match self.editor.workspace_files() {
                Ok(files) => self.emit(UiEvent::WorkspaceFiles(files)),
                Err(e) => self.emit(UiEvent::Error(format!("{e:#}"))),
            },
            UiRequest::SetModel(model) => match self.client.set_model(&model) {
                Ok(()) => {
                    tracing::info!(%model, "model selected");
                    self.emit(UiEvent::ModelChanged(model));
                }
                Err(e) => self.emit(UiEvent::Error(e.to_string())),
            },
            UiRequest::SetApiKey(api_key) => {
                self.set_api_key(api_key.trim());
            }
            UiRequest::Dispose => cancel.cancel(),
        }
    }

    fn set_api_key(&mut self, api_key: &str) {
        if api_key.is_empty() {
            self.emit(UiEvent::Error("No API key given.".to_string()));
            return;
        }
        match self.credentials.set(api_key) {
            Ok(()) => {
                self.client.set_api_key(api_key);
                self.emit(UiEvent::Info("Groq API key saved.".to_string()));
            }
            Err(e) => self.emit(UiEvent::Error(format!("{e:#}"))),
        }
    }

    async fn send_message(
        &mut self,
        content: String,
        attached_files: Vec<AttachedFile>,
        cancel: &CancellationToken,
    ) {
        match self.credentials.get() {
            Ok(Some(key)) => self.client.set_api_key(key),
            Ok(None) => {
                self.emit(UiEvent::Error(CompletionError::Configuration.to_string()));
                return;
            }
            Err(e) => {
                self.emit(UiEvent::Error(format!("{e:#}")));
                return;
            }
        }

        self.emit(UiEvent::Thinking);

        let workspace = self.editor.workspace_files().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "workspace listing unavailable");
            Vec::new()
        });
        let context = self.editor.context(&workspace);
        let attached_files = resolve_attachments(&content, attached_files, &workspace);

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::info!("request abandoned; UI closed");
                return;
            }
            r = self.client.generate_response(
                &content,
                &attached_files,
                &context,
                self.transcript.turns(),
            ) => r,
        };

        match result {
            Ok(text) => {
                self.transcript.push_exchange(content, text.clone());
                tracing::info!(turns = self.transcript.len(), "response received");
                self.emit(UiEvent::AddMessage(ChatMessage::ai(text)));
            }
            Err(e) => self.emit(UiEvent::Error(e.to_string())),
        }
    }
}

/// Load content for text attachments sent without it, and attach files named
/// by `@mentions` in the message.
fn resolve_attachments(
    content: &str,
    attached: Vec<AttachedFile>,
    workspace: &[WorkspaceFile],
) -> Vec<AttachedFile> {
    let mut out: Vec<AttachedFile> = attached.into_iter().map(hydrate).collect();

    for name in mention::mentioned_names(content) {
        if out.iter().any(|f| f.name == name) {
            continue;
        }
        let Some(entry) = workspace
            .iter()
            .find(|w| w.kind == EntryKind::File && w.name == name)
        else {
            continue;
        };
        match AttachedFile::load(&entry.path) {
            Ok(file) => out.push(file),
            Err(e) => tracing::warn!(error = %e, "mentioned file not attached"),
        }
    }
    out
}

fn hydrate(file: AttachedFile) -> AttachedFile {
    if file.content.is_some() || file.kind != FileKind::Text {
        return file;
    }
    match AttachedFile::load(&file.path) {
        Ok(loaded) => AttachedFile {
            content: loaded.content,
            size: file.size.or(loaded.size),
            ..file
        },
        Err(e) => {
            tracing::debug!(error = %e, "attachment content not loaded");
            file
        }
    }
}

/// Handle requests one at a time until the channel closes or the UI is disposed.
///
/// Callers emit `Ready` themselves, before the UI side starts sending.
pub async fn serve<S, C>(
    mut orchestrator: Orchestrator<S, C>,
    mut requests: mpsc::UnboundedReceiver<UiRequest>,
    cancel: CancellationToken,
) where
    S: CredentialStore,
    C: ContextSource,
{
    while let Some(request) = requests.recv().await {
        orchestrator.handle(request, &cancel).await;
        if cancel.is_cancelled() {
            break;
        }
    }
}
