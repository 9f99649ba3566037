use thiserror::Error;

pub const EXCERPT_CHARS: usize = 200;

/// Failure talking to either the text-completion or the image-generation service.
#[derive(Debug, Error)]
pub enum ModelCallError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The image service refused the prompt. Kept apart from `Api` so that logs
    /// can tell a prompt problem from a transient outage.
    #[error("content policy rejection: {0}")]
    ContentPolicy(String),

    #[error("empty response: {0}")]
    EmptyResponse(String),

    #[error("timed out after {0}s")]
    Timeout(u64),

    #[error("failed to decode response: {0}")]
    Decode(String),
}

impl ModelCallError {
    pub fn is_content_policy(&self) -> bool {
        matches!(self, ModelCallError::ContentPolicy(_))
    }
}

/// The text model's output could not be turned into a story document.
#[derive(Debug, Error)]
#[error("failed to parse story response: {reason}. Response: {excerpt}")]
pub struct ResponseParseError {
    pub reason: String,
    pub excerpt: String,
}

impl ResponseParseError {
    pub fn new(reason: impl Into<String>, raw: &str) -> Self {
        Self {
            reason: reason.into(),
            excerpt: raw.chars().take(EXCERPT_CHARS).collect(),
        }
    }
}

/// The only error a caller of the story pipeline ever sees.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("story generation failed: {0}")]
    Model(#[from] ModelCallError),

    #[error("story generation failed: {0}")]
    Parse(#[from] ResponseParseError),
}
