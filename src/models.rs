use serde::Serialize;

/// Model used when neither the CLI nor the config picks one.
pub const DEFAULT_MODEL: &str = "llama-3.1-8b-instant";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelDescriptor {
    pub id: &'static str,
    pub name: &'static str,
    pub provider: &'static str,
    pub description: &'static str,
    pub requires_api_key: bool,
}

static MODELS: &[ModelDescriptor] = &[
    ModelDescriptor {
        id: "llama-3.1-70b-versatile",
        name: "Llama 3.1 70B",
        provider: "groq",
        description: "Meta - Powerful, versatile model for complex tasks",
        requires_api_key: true,
    },
    ModelDescriptor {
        id: DEFAULT_MODEL,
        name: "Llama 3.1 8B Instant",
        provider: "groq",
        description: "Meta - Fast, efficient model for quick responses",
        requires_api_key: true,
    },
    ModelDescriptor {
        id: "mixtral-8x7b-32768",
        name: "Mixtral 8x7B",
        provider: "groq",
        description: "Mistral AI - Excellent for coding and technical tasks",
        requires_api_key: true,
    },
    ModelDescriptor {
        id: "gemma-7b-it",
        name: "Gemma 7B IT",
        provider: "groq",
        description: "Google - Optimized for instruction following",
        requires_api_key: true,
    },
];

pub fn all() -> &'static [ModelDescriptor] {
    MODELS
}

pub fn find(id: &str) -> Option<&'static ModelDescriptor> {
    MODELS.iter().find(|m| m.id == id)
}
