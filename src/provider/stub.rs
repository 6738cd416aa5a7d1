use super::{Choice, ChoiceMessage, CompletionRequest, CompletionResponse, Provider};
use crate::context::Role;
use crate::error::TransportError;
use futures_core::future::BoxFuture;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Offline provider. Echoes the last user turn, or replays a canned outcome.
#[derive(Debug, Default, Clone)]
pub struct StubProvider {
    calls: Arc<AtomicUsize>,
    outcome: Arc<Mutex<Option<Result<CompletionResponse, TransportError>>>>,
    last_request: Arc<Mutex<Option<CompletionRequest>>>,
}

impl StubProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer every request with `outcome` instead of echoing.
    pub fn with_outcome(outcome: Result<CompletionResponse, TransportError>) -> Self {
        let stub = Self::new();
        if let Ok(mut slot) = stub.outcome.lock() {
            *slot = Some(outcome);
        }
        stub
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<CompletionRequest> {
        self.last_request.lock().ok().and_then(|r| r.clone())
    }

    fn echo(req: &CompletionRequest) -> CompletionResponse {
        let said = req
            .messages
            .iter()
            .rev()
            .find(|t| t.role == Role::User)
            .map(|t| t.content.as_str())
            .unwrap_or_default();
        CompletionResponse {
            choices: vec![Choice {
                message: Some(ChoiceMessage {
                    role: Role::Assistant,
                    content: Some(format!(
                        "[stub provider]\nmodel: {}\nturns: {}\n\nYou said: {said}",
                        req.model,
                        req.messages.len()
                    )),
                }),
            }],
        }
    }
}

impl Provider for StubProvider {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn complete(
        &self,
        _api_key: String,
        req: CompletionRequest,
    ) -> BoxFuture<'static, Result<CompletionResponse, TransportError>> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let canned = self.outcome.lock().ok().and_then(|o| o.clone());
        let result = canned.unwrap_or_else(|| Ok(Self::echo(&req)));
        if let Ok(mut last) = self.last_request.lock() {
            *last = Some(req);
        }

        Box::pin(async move { result })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Turn;

    fn request(user: &str) -> CompletionRequest {
        CompletionRequest {
            model: "m".into(),
            messages: vec![Turn::system("s"), Turn::user(user)],
            temperature: 0.7,
            max_tokens: 1000,
        }
    }

    #[tokio::test]
    async fn echoes_and_counts() {
        let stub = StubProvider::new();
        let resp = stub.complete(String::new(), request("ping")).await.unwrap();
        assert!(resp.first_text().unwrap().ends_with("You said: ping"));
        assert_eq!(stub.calls(), 1);
        assert_eq!(stub.last_request().unwrap().messages.len(), 2);
    }

    #[tokio::test]
    async fn canned_error_is_replayed() {
        let stub = StubProvider::with_outcome(Err(TransportError::Status {
            status: 500,
            message: "boom".into(),
        }));
        let clone = stub.clone();
        assert!(stub.complete(String::new(), request("a")).await.is_err());
        assert!(clone.complete(String::new(), request("b")).await.is_err());
        assert_eq!(stub.calls(), 2);
    }
}
