use super::{CompletionRequest, CompletionResponse, Provider};
use crate::error::TransportError;
use futures_core::future::BoxFuture;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Url;
use serde::Deserialize;

pub const GROQ_API_BASE: &str = "https://api.groq.com/";

#[derive(Debug, Clone)]
pub struct GroqProvider {
    http: reqwest::Client,
    api_base: Url,
}

impl GroqProvider {
    pub fn new(http: reqwest::Client) -> anyhow::Result<Self> {
        Self::with_base(http, GROQ_API_BASE)
    }

    pub fn with_base(http: reqwest::Client, api_base: &str) -> anyhow::Result<Self> {
        // Url::join drops the last segment unless the base ends with '/'.
        let base = if api_base.ends_with('/') {
            api_base.to_string()
        } else {
            format!("{api_base}/")
        };
        Ok(Self {
            http,
            api_base: Url::parse(&base)?,
        })
    }

    fn build_url(&self) -> Result<Url, TransportError> {
        // Docs: https://console.groq.com/docs/api-reference#chat-create
        self.api_base
            .join("openai/v1/chat/completions")
            .map_err(|e| TransportError::Network(e.to_string()))
    }

    fn headers(api_key: &str) -> Result<HeaderMap, TransportError> {
        let mut h = HeaderMap::new();
        h.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let mut v = HeaderValue::from_str(&format!("Bearer {api_key}"))
            .map_err(|_| {
                TransportError::Network("API key contains invalid characters".to_string())
            })?;
        v.set_sensitive(true);
        h.insert(AUTHORIZATION, v);
        Ok(h)
    }
}

impl Provider for GroqProvider {
    fn name(&self) -> &'static str {
        "groq"
    }

    fn complete(
        &self,
        api_key: String,
        req: CompletionRequest,
    ) -> BoxFuture<'static, Result<CompletionResponse, TransportError>> {
        let this = self.clone();

        Box::pin(async move {
            let url = this.build_url()?;
            let headers = Self::headers(&api_key)?;

            let resp = this
                .http
                .post(url)
                .headers(headers)
                .json(&req)
                .send()
                .await
                .map_err(|e| TransportError::Network(e.to_string()))?;

            let status = resp.status();
            if !status.is_success() {
                let text = resp.text().await.unwrap_or_default();
                return Err(TransportError::Status {
                    status: status.as_u16(),
                    message: error_message(status, &text),
                });
            }

            resp.json::<CompletionResponse>()
                .await
                .map_err(|e| {
                    TransportError::Network(format!("failed to parse completion JSON: {e}"))
                })
        })
    }
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Prefer the API's `error.message`, then the raw body, then the status text.
fn error_message(status: reqwest::StatusCode, body: &str) -> String {
    if let Ok(env) = serde_json::from_str::<ErrorEnvelope>(body) {
        return env.error.message;
    }
    let body = body.trim();
    if !body.is_empty() {
        return body.to_string();
    }
    status
        .canonical_reason()
        .map(str::to_string)
        .unwrap_or_else(|| format!("HTTP {}", status.as_u16()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Turn;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request() -> CompletionRequest {
        CompletionRequest {
            model: "llama-3.1-8b-instant".into(),
            messages: vec![Turn::system("sys"), Turn::user("hi")],
            temperature: 0.7,
            max_tokens: 1000,
        }
    }

    fn provider(server: &MockServer) -> GroqProvider {
        GroqProvider::with_base(reqwest::Client::new(), &server.uri()).unwrap()
    }

    #[tokio::test]
    async fn posts_chat_completion_with_bearer_key() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/openai/v1/chat/completions"))
            .and(header("authorization", "Bearer gsk_test"))
            .and(body_partial_json(json!({
                "model": "llama-3.1-8b-instant",
                "max_tokens": 1000,
                "messages": [
                    {"role": "system", "content": "sys"},
                    {"role": "user", "content": "hi"}
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "chatcmpl-1",
                "object": "chat.completion",
                "choices": [{
                    "index": 0,
                    "message": {"role": "assistant", "content": "Hello!"},
                    "finish_reason": "stop"
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let resp = provider(&server)
            .complete("gsk_test".into(), request())
            .await
            .unwrap();
        assert_eq!(resp.first_text(), Some("Hello!"));
    }

    #[tokio::test]
    async fn error_status_carries_api_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_json(json!({
                "error": {"message": "Rate limit reached", "type": "tokens"}
            })))
            .mount(&server)
            .await;

        let err = provider(&server)
            .complete("k".into(), request())
            .await
            .unwrap_err();
        assert_eq!(
            err,
            TransportError::Status {
                status: 429,
                message: "Rate limit reached".into()
            }
        );
    }

    #[tokio::test]
    async fn error_status_falls_back_to_raw_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("upstream down"))
            .mount(&server)
            .await;

        let err = provider(&server)
            .complete("k".into(), request())
            .await
            .unwrap_err();
        assert_eq!(
            err,
            TransportError::Status {
                status: 503,
                message: "upstream down".into()
            }
        );
    }

    #[tokio::test]
    async fn unreachable_server_is_a_network_error() {
        let p = GroqProvider::with_base(reqwest::Client::new(), "http://127.0.0.1:1").unwrap();
        let err = p.complete("k".into(), request()).await.unwrap_err();
        assert!(matches!(err, TransportError::Network(_)));
    }

    #[test]
    fn error_message_uses_status_text_for_empty_body() {
        assert_eq!(error_message(reqwest::StatusCode::BAD_GATEWAY, ""), "Bad Gateway");
    }
}
