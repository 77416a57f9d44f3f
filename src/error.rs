//! Error types for backend calls.

/// A failure talking to the text-generation backend.
///
/// These are never retried by the classifier; they abort the run. Responses
/// that arrive but cannot be decoded are a different matter, see
/// [`crate::parser::DecodeError`].
#[derive(Debug, thiserror::Error)]
pub enum ClassifyError {
    #[error("backend call timed out")]
    Timeout,
    #[error("backend transport error: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("backend returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("could not build backend request: {0}")]
    Request(String),
    #[error("backend response has unexpected shape: {0}")]
    MalformedResponse(String),
}

impl From<reqwest::Error> for ClassifyError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ClassifyError::Timeout
        } else {
            ClassifyError::Transport(e)
        }
    }
}
