use thiserror::Error;

/// Failure reported by a provider before any status mapping.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The API answered with a non-success status.
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// Connection, TLS, timeout or decode failure.
    #[error("{0}")]
    Network(String),
}

fn raw_or_unknown(raw: &str) -> &str {
    if raw.is_empty() {
        "Unknown error"
    } else {
        raw
    }
}

/// Terminal failure of one completion request. `Display` is what the user sees.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompletionError {
    #[error("Groq API key not configured. Please set your Groq API key first.")]
    Configuration,

    #[error("AI service error: Invalid API key. Please check your Groq API key.")]
    Auth,

    #[error("AI service error: Model not found or no access.")]
    NotFound,

    #[error("AI service error: Rate limit exceeded. Please wait a moment before trying again.")]
    RateLimited,

    #[error("AI service error: Bad request. The message might be too long.")]
    BadRequest,

    #[error("AI service error: Groq server error. Please try again in a moment.")]
    Server,

    /// Any other status or a transport failure; carries the raw error text.
    #[error("AI service error: {}", raw_or_unknown(.0))]
    Transport(String),

    #[error("Unknown model: {0}")]
    UnknownModel(String),
}

/// Status codes with a dedicated user-facing error. Everything else is `Transport`.
pub const STATUS_ERRORS: &[(u16, CompletionError)] = &[
    (404, CompletionError::NotFound),
    (401, CompletionError::Auth),
    (429, CompletionError::RateLimited),
    (400, CompletionError::BadRequest),
    (500, CompletionError::Server),
];

impl CompletionError {
    pub fn from_transport(err: TransportError) -> Self {
        match err {
            TransportError::Status { status, message } => STATUS_ERRORS
                .iter()
                .find(|(code, _)| *code == status)
                .map(|(_, e)| e.clone())
                .unwrap_or_else(|| Self::Transport(message)),
            TransportError::Network(message) => Self::Transport(message),
        }
    }
}

impl From<TransportError> for CompletionError {
    fn from(err: TransportError) -> Self {
        Self::from_transport(err)
    }
}
