use crate::context::{Role, Turn};
use crate::error::TransportError;
use futures_core::future::BoxFuture;
use serde::{Deserialize, Serialize};

/// Chat-completions request body (OpenAI-compatible).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<Turn>,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompletionResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Choice {
    #[serde(default)]
    pub message: Option<ChoiceMessage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChoiceMessage {
    pub role: Role,
    #[serde(default)]
    pub content: Option<String>,
}

impl CompletionResponse {
    /// Content of the first choice, if it has any text.
    pub fn first_text(&self) -> Option<&str> {
        self.choices
            .first()?
            .message
            .as_ref()?
            .content
            .as_deref()
            .filter(|s| !s.is_empty())
    }
}

/// Remote completion API.
///
/// One request, one response. Implementations never retry.
pub trait Provider {
    fn name(&self) -> &'static str;

    fn complete(
        &self,
        api_key: String,
        req: CompletionRequest,
    ) -> BoxFuture<'static, Result<CompletionResponse, TransportError>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_serializes_lowercase_roles() {
        let req = CompletionRequest {
            model: "m".into(),
            messages: vec![Turn::system("s"), Turn::user("u")],
            temperature: 0.7,
            max_tokens: 1000,
        };
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(v["messages"][0]["role"], "system");
        assert_eq!(v["messages"][1]["content"], "u");
        assert_eq!(v["max_tokens"], 1000);
    }

    #[test]
    fn first_text_ignores_missing_or_empty_content() {
        let r: CompletionResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert_eq!(r.first_text(), None);

        let r: CompletionResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"role":"assistant","content":""}}]}"#,
        )
        .unwrap();
        assert_eq!(r.first_text(), None);

        let r: CompletionResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"role":"assistant","content":null}}]}"#,
        )
        .unwrap();
        assert_eq!(r.first_text(), None);

        let r: CompletionResponse = serde_json::from_str(
            r#"{"id":"x","choices":[{"index":0,"message":{"role":"assistant","content":"hi"},"finish_reason":"stop"}]}"#,
        )
        .unwrap();
        assert_eq!(r.first_text(), Some("hi"));
    }
}
