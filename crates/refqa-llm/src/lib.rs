//! LLM provider abstraction with OpenAI-compatible and Ollama backends.

pub mod any;
pub mod error;
pub mod http;
#[cfg(feature = "mock")]
pub mod mock;
pub mod ollama;
pub mod openai;
pub mod provider;
pub(crate) mod retry;

pub use any::AnyProvider;
pub use error::LlmError;
pub use provider::{LlmProvider, Message, Role, TextFuture};
