use ollama_rs::Ollama;
use ollama_rs::generation::chat::ChatMessage;
use ollama_rs::generation::chat::request::ChatMessageRequest;
use ollama_rs::generation::embeddings::request::{EmbeddingsInput, GenerateEmbeddingsRequest};
use reqwest::Url;

use crate::error::LlmError;
use crate::provider::{LlmProvider, Message, Role};

const PROVIDER: &str = "ollama";
const DEFAULT_PORT: u16 = 11434;

/// Local models served by Ollama, for both chat and embeddings.
#[derive(Debug, Clone)]
pub struct OllamaProvider {
    client: Ollama,
    model: String,
    embedding_model: String,
}

impl OllamaProvider {
    /// `base_url` without a port uses Ollama's default port.
    ///
    /// # Errors
    ///
    /// Returns `LlmError::InvalidEndpoint` if `base_url` is not an absolute URL.
    pub fn new(base_url: &str, model: String, embedding_model: String) -> Result<Self, LlmError> {
        let (host, port) = split_endpoint(base_url)?;
        Ok(Self {
            client: Ollama::new(host, port),
            model,
            embedding_model,
        })
    }
}

impl LlmProvider for OllamaProvider {
    async fn chat(&self, messages: &[Message]) -> Result<String, LlmError> {
        let history = messages.iter().map(to_chat_message).collect();
        let response = self
            .client
            .send_chat_messages(ChatMessageRequest::new(self.model.clone(), history))
            .await
            .map_err(backend_error)?;

        let content = response.message.content;
        if content.trim().is_empty() {
            return Err(LlmError::EmptyResponse { provider: PROVIDER });
        }
        Ok(content)
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, LlmError> {
        let request =
            GenerateEmbeddingsRequest::new(self.embedding_model.clone(), EmbeddingsInput::from(text));
        let response = self
            .client
            .generate_embeddings(request)
            .await
            .map_err(backend_error)?;

        response
            .embeddings
            .into_iter()
            .next()
            .ok_or(LlmError::EmptyResponse { provider: PROVIDER })
    }

    fn supports_embeddings(&self) -> bool {
        true
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        PROVIDER
    }
}

fn backend_error(e: impl std::fmt::Display) -> LlmError {
    LlmError::Backend {
        provider: PROVIDER,
        message: e.to_string(),
    }
}

fn to_chat_message(msg: &Message) -> ChatMessage {
    let content = msg.content.clone();
    match msg.role {
        Role::System => ChatMessage::system(content),
        Role::User => ChatMessage::user(content),
        Role::Assistant => ChatMessage::assistant(content),
    }
}

/// Split `http://host:port/` into the `(scheme://host, port)` pair the client wants.
fn split_endpoint(base_url: &str) -> Result<(String, u16), LlmError> {
    let invalid = |message: String| LlmError::InvalidEndpoint {
        url: base_url.to_owned(),
        message,
    };
    let url = Url::parse(base_url).map_err(|e| invalid(e.to_string()))?;
    let host = url
        .host_str()
        .ok_or_else(|| invalid("missing host".into()))?;
    Ok((
        format!("{}://{host}", url.scheme()),
        url.port().unwrap_or(DEFAULT_PORT),
    ))
}
