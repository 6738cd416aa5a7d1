use crate::context::{AttachedFile, ChatContext, Turn};
use crate::conversation::{self, HistoryWindow};
use crate::error::CompletionError;
use crate::models::{self, ModelDescriptor};
use crate::provider::{CompletionRequest, Provider};
use std::fmt;
use std::sync::Arc;

/// Returned when the API answers without usable text.
pub const FALLBACK_RESPONSE: &str = "Sorry, I could not generate a response.";

#[derive(Clone)]
pub struct ClientConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub history_window: HistoryWindow,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: models::DEFAULT_MODEL.to_string(),
            temperature: 0.7,
            max_tokens: 1000,
            history_window: HistoryWindow::DEFAULT,
        }
    }
}

// Keep the key out of debug logs.
impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("history_window", &self.history_window)
            .finish()
    }
}

pub struct CompletionClient {
    provider: Arc<dyn Provider + Send + Sync>,
    config: ClientConfig,
}

impl CompletionClient {
    pub fn new(provider: Arc<dyn Provider + Send + Sync>, config: ClientConfig) -> Self {
        Self { provider, config }
    }

    pub fn set_api_key(&mut self, api_key: impl Into<String>) {
        self.config.api_key = Some(api_key.into());
    }

    pub fn set_model(&mut self, model: &str) -> Result<(), CompletionError> {
        if models::find(model).is_none() {
            return Err(CompletionError::UnknownModel(model.to_string()));
        }
        self.config.model = model.to_string();
        Ok(())
    }

    pub fn current_model(&self) -> &str {
        &self.config.model
    }

    pub fn model_info(&self) -> Option<&'static ModelDescriptor> {
        models::find(&self.config.model)
    }

    pub fn is_configured(&self) -> bool {
        self.config.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }

    /// Send one message with its context and return the assistant's text.
    ///
    /// Fails fast with `Configuration` when no key is set; the provider is
    /// not called in that case.
    pub async fn generate_response(
        &self,
        message: &str,
        attached_files: &[AttachedFile],
        context: &ChatContext,
        history: &[Turn],
    ) -> Result<String, CompletionError> {
        let Some(api_key) = self.config.api_key.clone().filter(|k| !k.is_empty()) else {
            return Err(CompletionError::Configuration);
        };

        let messages = conversation::assemble(
            message,
            attached_files,
            context,
            history,
            self.config.history_window,
        );
        let req = CompletionRequest {
            model: self.config.model.clone(),
            messages,
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };
        tracing::debug!(
            provider = self.provider.name(),
            model = %req.model,
            turns = req.messages.len(),
            attachments = attached_files.len(),
            "sending completion request"
        );

        match self.provider.complete(api_key, req).await {
            Ok(resp) => Ok(resp
                .first_text()
                .map(str::to_string)
                .unwrap_or_else(|| FALLBACK_RESPONSE.to_string())),
            Err(e) => {
                tracing::warn!(error = %e, "completion request failed");
                Err(CompletionError::from_transport(e))
            }
        }
    }
}
