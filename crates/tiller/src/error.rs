use thiserror::Error;

/// Error types that can occur when asking a streaming adapter for a
/// response.
///
/// Adapters report mid-stream failures through a terminal
/// [`crate::stream::AssistantEvent::Error`] event instead; `LlmError` covers
/// the request never getting off the ground.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LlmError {
    /// HTTP request/response errors
    #[error("HTTP error: {0}")]
    Http(String),

    /// Authentication and authorization errors
    #[error("auth error: {0}")]
    Auth(String),

    /// Invalid request parameters or format
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Errors returned by the LLM provider
    #[error("provider error: {0}")]
    Provider(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),
}

impl From<serde_json::Error> for LlmError {
    fn from(err: serde_json::Error) -> Self {
        LlmError::Json(format!(
            "{} at line {} column {}",
            err,
            err.line(),
            err.column()
        ))
    }
}
