use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::LlmError;
use crate::provider::{LlmProvider, Message};
use crate::retry::send_with_retry;

const PROVIDER: &str = "openai";
const DEFAULT_MAX_RETRIES: u32 = 3;

/// Chat completions and embeddings over the OpenAI HTTP API, or any server
/// that speaks it.
#[derive(Clone)]
pub struct OpenAiProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    max_tokens: u32,
    embedding_model: Option<String>,
    max_retries: u32,
}

impl fmt::Debug for OpenAiProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiProvider")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("embedding_model", &self.embedding_model)
            .field("max_tokens", &self.max_tokens)
            .field("max_retries", &self.max_retries)
            .field("api_key", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl OpenAiProvider {
    /// Without an `embedding_model` the provider can chat but not embed.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(
        api_key: String,
        base_url: String,
        model: String,
        max_tokens: u32,
        embedding_model: Option<String>,
    ) -> Result<Self, LlmError> {
        Ok(Self {
            client: crate::http::default_client()?,
            api_key,
            base_url: base_url.trim_end_matches('/').to_owned(),
            model,
            max_tokens,
            embedding_model,
            max_retries: DEFAULT_MAX_RETRIES,
        })
    }

    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// POST `body` to `{base_url}/{path}` and decode a successful response.
    async fn call<B, R>(&self, path: &str, body: &B) -> Result<R, LlmError>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        let url = format!("{}/{path}", self.base_url);
        let response = send_with_retry(PROVIDER, self.max_retries, || {
            self.client
                .post(&url)
                .bearer_auth(&self.api_key)
                .json(body)
                .send()
        })
        .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            tracing::error!(path, %status, body = %text, "OpenAI API error");
            return Err(LlmError::Status {
                provider: PROVIDER,
                status: status.as_u16(),
            });
        }
        Ok(serde_json::from_str(&text)?)
    }
}

impl LlmProvider for OpenAiProvider {
    async fn chat(&self, messages: &[Message]) -> Result<String, LlmError> {
        let request = CompletionRequest {
            model: &self.model,
            messages: messages
                .iter()
                .map(|m| WireMessage {
                    role: m.role.as_str(),
                    content: &m.content,
                })
                .collect(),
            max_tokens: self.max_tokens,
        };
        let completion: Completion = self.call("chat/completions", &request).await?;

        if let Some(usage) = &completion.usage {
            tracing::debug!(
                model = %self.model,
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "completion usage"
            );
        }

        completion
            .choices
            .into_iter()
            .find_map(|c| c.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(LlmError::EmptyResponse { provider: PROVIDER })
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, LlmError> {
        let Some(model) = self.embedding_model.as_deref() else {
            return Err(LlmError::EmbedUnsupported { provider: PROVIDER });
        };
        let embeddings: Embeddings = self
            .call("embeddings", &EmbeddingRequest { model, input: text })
            .await?;

        embeddings
            .data
            .into_iter()
            .next()
            .map(|item| item.embedding)
            .ok_or(LlmError::EmptyResponse { provider: PROVIDER })
    }

    fn supports_embeddings(&self) -> bool {
        self.embedding_model.is_some()
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        PROVIDER
    }
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    max_tokens: u32,
}

#[derive(Serialize)]
struct WireMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct Completion {
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct Usage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Deserialize)]
struct Embeddings {
    data: Vec<EmbeddingItem>,
}

#[derive(Deserialize)]
struct EmbeddingItem {
    embedding: Vec<f32>,
}
