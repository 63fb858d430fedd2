use thiserror::Error;

/// Errors surfaced by a tweet generation attempt.
///
/// Both kinds are terminal for the current request; the next submission starts
/// a fresh attempt.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenerationError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Provider error: {0}")]
    Provider(String),
}

impl GenerationError {
    pub fn configuration(message: impl Into<String>) -> Self {
        GenerationError::Configuration(message.into())
    }

    pub fn provider(message: impl Into<String>) -> Self {
        GenerationError::Provider(message.into())
    }

    /// Text shown to the user for this error.
    pub fn user_message(&self) -> String {
        match self {
            GenerationError::Configuration(message) => format!(
                "The text generation service is not configured: {}. Supply the API credential and try again.",
                message
            ),
            GenerationError::Provider(message) => format!("Model error: {}", message),
        }
    }
}

impl From<async_openai::error::OpenAIError> for GenerationError {
    fn from(err: async_openai::error::OpenAIError) -> Self {
        GenerationError::Provider(err.to_string())
    }
}

impl From<ollama_rs::error::OllamaError> for GenerationError {
    fn from(err: ollama_rs::error::OllamaError) -> Self {
        GenerationError::Provider(err.to_string())
    }
}

impl From<reqwest::Error> for GenerationError {
    fn from(err: reqwest::Error) -> Self {
        GenerationError::Provider(err.to_string())
    }
}
