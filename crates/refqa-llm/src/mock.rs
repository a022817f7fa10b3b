//! Test-only mock LLM provider.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::provider::{LlmProvider, Message};

type EmbedRule = Arc<dyn Fn(&str) -> Vec<f32> + Send + Sync>;

#[derive(Clone)]
pub struct MockProvider {
    responses: Arc<Mutex<Vec<String>>>,
    calls: Arc<Mutex<Vec<Vec<Message>>>>,
    embed_rule: Option<EmbedRule>,
    embed_calls: Arc<AtomicUsize>,
    pub default_response: String,
    pub embedding: Vec<f32>,
    pub supports_embeddings: bool,
    pub fail_chat: bool,
    pub fail_embed: bool,
    /// Embedding succeeds this many times, then every call fails.
    pub fail_embed_after: Option<usize>,
}

impl fmt::Debug for MockProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockProvider")
            .field("default_response", &self.default_response)
            .field("supports_embeddings", &self.supports_embeddings)
            .field("fail_chat", &self.fail_chat)
            .field("fail_embed", &self.fail_embed)
            .field("fail_embed_after", &self.fail_embed_after)
            .finish_non_exhaustive()
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self {
            responses: Arc::new(Mutex::new(Vec::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
            embed_rule: None,
            embed_calls: Arc::new(AtomicUsize::new(0)),
            default_response: "mock response".into(),
            embedding: vec![0.0; 8],
            supports_embeddings: true,
            fail_chat: false,
            fail_embed: false,
            fail_embed_after: None,
        }
    }
}

impl MockProvider {
    #[must_use]
    pub fn with_responses(responses: Vec<String>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses)),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn failing() -> Self {
        Self {
            fail_chat: true,
            ..Self::default()
        }
    }

    /// Compute embeddings from the input text instead of returning the fixed vector.
    #[must_use]
    pub fn with_embed_rule(mut self, rule: impl Fn(&str) -> Vec<f32> + Send + Sync + 'static) -> Self {
        self.embed_rule = Some(Arc::new(rule));
        self
    }

    /// Every message list passed to `chat`, in call order.
    #[must_use]
    pub fn calls(&self) -> Vec<Vec<Message>> {
        self.calls.lock().unwrap().clone()
    }
}

impl LlmProvider for MockProvider {
    async fn chat(&self, messages: &[Message]) -> Result<String, crate::LlmError> {
        self.calls.lock().unwrap().push(messages.to_vec());
        if self.fail_chat {
            return Err(crate::LlmError::Other("mock LLM error".into()));
        }
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            Ok(self.default_response.clone())
        } else {
            Ok(responses.remove(0))
        }
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, crate::LlmError> {
        if !self.supports_embeddings {
            return Err(crate::LlmError::EmbedUnsupported { provider: "mock" });
        }
        let call = self.embed_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_embed || self.fail_embed_after.is_some_and(|n| call >= n) {
            return Err(crate::LlmError::Other("mock embed error".into()));
        }
        Ok(match &self.embed_rule {
            Some(rule) => rule(text),
            None => self.embedding.clone(),
        })
    }

    fn supports_embeddings(&self) -> bool {
        self.supports_embeddings
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "mock"
    }
}
