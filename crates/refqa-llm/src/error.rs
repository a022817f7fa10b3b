#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid response body: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{provider} request failed with status {status}")]
    Status { provider: &'static str, status: u16 },

    #[error("{provider} request failed: {message}")]
    Backend {
        provider: &'static str,
        message: String,
    },

    #[error("invalid endpoint {url}: {message}")]
    InvalidEndpoint { url: String, message: String },

    #[error("rate limited")]
    RateLimited,

    #[error("empty response from {provider}")]
    EmptyResponse { provider: &'static str },

    #[error("embedding not supported by {provider}")]
    EmbedUnsupported { provider: &'static str },

    #[error("{0}")]
    Other(String),
}
