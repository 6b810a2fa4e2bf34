//! Retry policy and classification of HTTP failures.

use reqwest::StatusCode;

/// Maximum number of attempts for one network operation.
pub const MAX_RETRIES: usize = 3;

/// Pause between attempts in milliseconds.
pub const RETRY_DELAY_MS: u64 = 1000;

/// Failures that another attempt will not fix.
#[derive(Debug, thiserror::Error)]
pub enum NonRetryableError {
    #[error("API rate limit exceeded. Please wait a few minutes before trying again.")]
    RateLimitExceeded,

    #[error("Authentication failed ({0}). Check your GITHUB_TOKEN.")]
    AuthenticationFailed(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Request error: HTTP {status} for {url}")]
    ClientError { status: u16, url: String },
}

/// Classify a response status. `None` means success or worth retrying.
pub fn classify_status(status: StatusCode, url: &str) -> Option<NonRetryableError> {
    match status {
        StatusCode::UNAUTHORIZED => Some(NonRetryableError::AuthenticationFailed(url.to_string())),
        // GitHub answers 403 once the anonymous quota is used up
        StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS => {
            Some(NonRetryableError::RateLimitExceeded)
        }
        StatusCode::NOT_FOUND => Some(NonRetryableError::NotFound(url.to_string())),
        s if s.is_client_error() => Some(NonRetryableError::ClientError {
            status: s.as_u16(),
            url: url.to_string(),
        }),
        _ => None,
    }
}

/// Turn an `error_for_status()` failure into an `anyhow::Error`, wrapping
/// the non-retryable cases in [`NonRetryableError`].
pub fn check_retryable(error: reqwest::Error) -> anyhow::Error {
    let url = error
        .url()
        .map(|u| u.to_string())
        .unwrap_or_default();
    match error.status().and_then(|s| classify_status(s, &url)) {
        Some(non_retryable) => anyhow::Error::from(non_retryable),
        None => anyhow::Error::from(error),
    }
}

/// Only [`NonRetryableError`] stops the retry loop.
pub fn is_retryable_error(e: &anyhow::Error) -> bool {
    e.downcast_ref::<NonRetryableError>().is_none()
}
