#[cfg(feature = "groq")]
pub mod groq;
pub mod stub;
mod types;

pub use types::{Choice, ChoiceMessage, CompletionRequest, CompletionResponse, Provider};
