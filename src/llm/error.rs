//! Provider error types with retry classification.
//!
//! Hosted model APIs fail in two flavors: transient (rate limits, 5xx,
//! network hiccups) and permanent (bad request, auth, unparseable body).
//! Only the first flavor is worth retrying.

use std::time::Duration;

/// Error from a model provider call.
#[derive(Debug)]
pub struct ProviderError {
    pub kind: ProviderErrorKind,
    /// HTTP status code, when the provider answered at all.
    pub status_code: Option<u16>,
    pub message: String,
    /// Delay requested by the provider via `Retry-After`.
    pub retry_after: Option<Duration>,
}

impl ProviderError {
    pub fn rate_limited(message: String, retry_after: Option<Duration>) -> Self {
        Self {
            kind: ProviderErrorKind::RateLimited,
            status_code: Some(429),
            message,
            retry_after,
        }
    }

    pub fn server_error(status_code: u16, message: String) -> Self {
        Self {
            kind: ProviderErrorKind::ServerError,
            status_code: Some(status_code),
            message,
            retry_after: None,
        }
    }

    pub fn client_error(status_code: u16, message: String) -> Self {
        Self {
            kind: ProviderErrorKind::ClientError,
            status_code: Some(status_code),
            message,
            retry_after: None,
        }
    }

    pub fn network_error(message: String) -> Self {
        Self {
            kind: ProviderErrorKind::NetworkError,
            status_code: None,
            message,
            retry_after: None,
        }
    }

    pub fn parse_error(message: String) -> Self {
        Self {
            kind: ProviderErrorKind::ParseError,
            status_code: None,
            message,
            retry_after: None,
        }
    }

    /// Delay to wait before the given retry attempt.
    ///
    /// A provider-supplied `Retry-After` always wins; otherwise exponential
    /// backoff from a per-kind base, with deterministic jitter, capped at
    /// 60 seconds.
    pub fn suggested_delay(&self, attempt: u32) -> Duration {
        if let Some(retry_after) = self.retry_after {
            return retry_after;
        }

        let base_secs = match self.kind {
            ProviderErrorKind::RateLimited => 5,
            ProviderErrorKind::ServerError => 2,
            _ => 1,
        };

        let delay_secs = base_secs * 2u64.saturating_pow(attempt);
        let jitter_range = delay_secs / 4;
        let jitter = if jitter_range > 0 {
            (attempt as u64 * 7) % jitter_range
        } else {
            0
        };

        Duration::from_secs((delay_secs + jitter).min(60))
    }
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.status_code {
            Some(code) => write!(f, "{} (HTTP {}): {}", self.kind, code, self.message),
            None => write!(f, "{}: {}", self.kind, self.message),
        }
    }
}

impl std::error::Error for ProviderError {}

/// Classification of provider errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorKind {
    /// 429 - transient, retry with backoff
    RateLimited,
    /// 500/502/503/504 - transient, retry
    ServerError,
    /// 400/401/403/404 - permanent, do not retry
    ClientError,
    /// Connection failure or timeout - transient, retry
    NetworkError,
    /// Unexpected response body - permanent
    ParseError,
}

impl ProviderErrorKind {
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ProviderErrorKind::RateLimited
                | ProviderErrorKind::ServerError
                | ProviderErrorKind::NetworkError
        )
    }
}

impl std::fmt::Display for ProviderErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderErrorKind::RateLimited => write!(f, "Rate limited"),
            ProviderErrorKind::ServerError => write!(f, "Server error"),
            ProviderErrorKind::ClientError => write!(f, "Client error"),
            ProviderErrorKind::NetworkError => write!(f, "Network error"),
            ProviderErrorKind::ParseError => write!(f, "Parse error"),
        }
    }
}

/// Retry policy shared by the provider clients.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts per request.
    pub max_retries: u32,
    /// Maximum total time to spend on one request including retries.
    pub max_retry_duration: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            max_retry_duration: Duration::from_secs(120),
        }
    }
}

impl RetryConfig {
    pub fn should_retry(&self, error: &ProviderError) -> bool {
        error.kind.is_transient()
    }
}

/// Parse a `Retry-After` header given in seconds, if present.
pub(crate) fn parse_retry_after(headers: &reqwest::header::HeaderMap) -> Option<Duration> {
    headers
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse::<u64>().ok().map(Duration::from_secs))
}

/// Run a provider request with automatic retry for transient errors.
///
/// Shared by both provider clients; the closure issues one bare request.
pub(crate) async fn with_retry<T, F, Fut>(config: &RetryConfig, mut request: F) -> anyhow::Result<T>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, ProviderError>>,
{
    let start = std::time::Instant::now();
    let mut attempt = 0;

    loop {
        match request().await {
            Ok(response) => {
                if attempt > 0 {
                    tracing::info!(
                        "provider request succeeded after {} retries ({:?})",
                        attempt,
                        start.elapsed()
                    );
                }
                return Ok(response);
            }
            Err(error) => {
                if !config.should_retry(&error) || attempt >= config.max_retries {
                    return Err(anyhow::anyhow!("{}", error));
                }

                let delay = error.suggested_delay(attempt);
                let remaining = config.max_retry_duration.saturating_sub(start.elapsed());
                let delay = delay.min(remaining);
                if delay.is_zero() {
                    tracing::warn!("retry budget exhausted: {}", error);
                    return Err(anyhow::anyhow!("{}", error));
                }

                tracing::warn!(
                    "provider request failed (attempt {}), retrying in {:?}: {}",
                    attempt + 1,
                    delay,
                    error
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

/// Map an HTTP status code onto an error kind.
pub fn classify_http_status(status: u16) -> ProviderErrorKind {
    match status {
        429 => ProviderErrorKind::RateLimited,
        500 | 502 | 503 | 504 => ProviderErrorKind::ServerError,
        400..=499 => ProviderErrorKind::ClientError,
        _ => ProviderErrorKind::ServerError,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_classification() {
        assert!(ProviderErrorKind::RateLimited.is_transient());
        assert!(ProviderErrorKind::ServerError.is_transient());
        assert!(ProviderErrorKind::NetworkError.is_transient());
        assert!(!ProviderErrorKind::ClientError.is_transient());
        assert!(!ProviderErrorKind::ParseError.is_transient());
    }

    #[test]
    fn http_status_classification() {
        assert_eq!(classify_http_status(429), ProviderErrorKind::RateLimited);
        assert_eq!(classify_http_status(503), ProviderErrorKind::ServerError);
        assert_eq!(classify_http_status(401), ProviderErrorKind::ClientError);
        assert_eq!(classify_http_status(404), ProviderErrorKind::ClientError);
    }

    #[test]
    fn backoff_grows_and_is_capped() {
        let error = ProviderError::rate_limited("test".to_string(), None);

        assert!(error.suggested_delay(1) > error.suggested_delay(0));
        assert!(error.suggested_delay(10).as_secs() <= 60);
    }

    #[test]
    fn retry_after_is_respected() {
        let error =
            ProviderError::rate_limited("test".to_string(), Some(Duration::from_secs(30)));
        assert_eq!(error.suggested_delay(0), Duration::from_secs(30));
        assert_eq!(error.suggested_delay(5), Duration::from_secs(30));
    }
}
