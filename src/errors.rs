#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("authentication failed: {0}")]
    Authentication(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("request blocked by anti-bot challenge: {0}")]
    Blocked(String),

    #[error("request timed out")]
    Timeout,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("unexpected response shape: {0}")]
    Decode(String),
}

impl ApiError {
    // Failures worth retrying on the next pass of the search loop.
    pub fn retryable(&self) -> bool {
        matches!(
            self,
            ApiError::Timeout | ApiError::Transport(_) | ApiError::Blocked(_)
        )
    }

    pub fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Timeout
        } else {
            ApiError::Transport(err.to_string())
        }
    }
}
