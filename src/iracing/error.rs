use thiserror::Error;

/// Failure classes of the iRacing Data API.
///
/// `RateLimited`, `ServerError` and `Transport` are retried with backoff,
/// `AuthExpired` triggers a single re-login. Everything else fails the one
/// fetch it belongs to; callers treat any of these as retryable-later and
/// never as fatal to the process.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("rate limited by the iRacing API")]
    RateLimited,

    #[error("iRacing API server error: HTTP {0}")]
    ServerError(u16),

    #[error("iRacing session expired")]
    AuthExpired,

    #[error("not found: {0}")]
    NotFound(String),

    #[error("malformed response from {path}: {source}")]
    MalformedResponse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("request to {path} failed with HTTP {status}: {body}")]
    Request {
        path: String,
        status: u16,
        body: String,
    },

    #[error(transparent)]
    Transport(#[from] reqwest::Error),
}

impl ApiError {
    /// Whether another attempt with backoff can reasonably succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::RateLimited | Self::ServerError(_) | Self::Transport(_)
        )
    }
}
