use thiserror::Error;

/// Failure of a single remote call, before any retry policy is applied.
#[derive(Debug, Error)]
pub enum BackendError {
    /// HTTP 429. The only condition the retrying client retries.
    #[error("rate limited by the sheets API (HTTP 429)")]
    RateLimited,

    #[error("worksheet '{0}' not found")]
    WorksheetNotFound(String),

    #[error("sheets API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("transport: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),
}

impl BackendError {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, BackendError::RateLimited)
    }
}

pub type Result<T> = std::result::Result<T, SheetsError>;

/// Errors surfaced by [`crate::RetryingTableClient`].
#[derive(Debug, Error)]
pub enum SheetsError {
    #[error("invalid row index {0} (rows are 1-based)")]
    InvalidRowIndex(u32),

    #[error("quota exhausted: {operation} still rate limited after {attempts} attempts")]
    QuotaExhausted {
        operation: &'static str,
        attempts: u32,
    },

    /// Non-quota failures, passed through without retry.
    #[error(transparent)]
    Backend(#[from] BackendError),
}
