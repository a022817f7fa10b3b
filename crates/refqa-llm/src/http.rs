//! Shared HTTP client construction for consistent timeout and TLS configuration.

use std::time::Duration;

use crate::error::LlmError;

/// Create a shared HTTP client with standard refqa configuration.
///
/// Config: 30s connect timeout, 120s request timeout (document summaries are
/// slow), rustls TLS, `refqa/{version}` user-agent, redirect limit 10.
///
/// # Errors
///
/// Returns an error if the TLS backend cannot be initialized.
pub fn default_client() -> Result<reqwest::Client, LlmError> {
    reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(30))
        .timeout(Duration::from_secs(120))
        .user_agent(concat!("refqa/", env!("CARGO_PKG_VERSION")))
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()
        .map_err(LlmError::Http)
}
