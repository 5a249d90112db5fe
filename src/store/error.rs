use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store returned status {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("record not found")]
    NotFound,

    #[error("request timed out")]
    Timeout,

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("failed to parse store response: {0}")]
    Parse(#[from] serde_json::Error),
}
