use std::future::Future;
use std::time::Duration;

use reqwest::StatusCode;

use crate::error::LlmError;

const BASE_BACKOFF_SECS: u64 = 1;
const MAX_BACKOFF_SECS: u64 = 60;

/// Rate limits and server errors are transient; everything else is final.
fn is_transient(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

/// Honors a numeric `Retry-After` header, otherwise backs off exponentially.
fn delay_for(response: &reqwest::Response, attempt: u32) -> Duration {
    let header = response
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok());
    match header {
        Some(secs) => Duration::from_secs(secs.min(MAX_BACKOFF_SECS)),
        None => backoff(attempt),
    }
}

fn backoff(attempt: u32) -> Duration {
    let secs = BASE_BACKOFF_SECS
        .checked_shl(attempt)
        .map_or(MAX_BACKOFF_SECS, |s| s.min(MAX_BACKOFF_SECS));
    Duration::from_secs(secs)
}

/// Send a request built by `send`, retrying transient failures up to
/// `max_retries` times.
///
/// Connection errors, timeouts, 429 and 5xx responses are retried. The last
/// response is returned as-is once retries run out, except for 429 which
/// becomes [`LlmError::RateLimited`].
///
/// # Errors
///
/// Returns `LlmError::RateLimited` when still rate limited after the last
/// attempt, or `LlmError::Http` when the final attempt fails in transport.
pub(crate) async fn send_with_retry<F, Fut>(
    provider: &str,
    max_retries: u32,
    mut send: F,
) -> Result<reqwest::Response, LlmError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<reqwest::Response, reqwest::Error>>,
{
    let mut attempt = 0;
    loop {
        let last = attempt == max_retries;
        let delay = match send().await {
            Ok(response) if !is_transient(response.status()) => return Ok(response),
            Ok(response) if last => {
                return if response.status() == StatusCode::TOO_MANY_REQUESTS {
                    Err(LlmError::RateLimited)
                } else {
                    Ok(response)
                };
            }
            Ok(response) => {
                tracing::warn!(provider, status = %response.status(), attempt = attempt + 1, max_retries, "transient response, retrying");
                delay_for(&response, attempt)
            }
            Err(e) if last || !(e.is_connect() || e.is_timeout()) => return Err(LlmError::Http(e)),
            Err(e) => {
                tracing::warn!(provider, attempt = attempt + 1, max_retries, "request failed, retrying: {e}");
                backoff(attempt)
            }
        };
        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}
