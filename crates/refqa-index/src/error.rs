//! Error types for refqa-index.

use std::num::TryFromIntError;

/// Errors that can occur while building or querying a category index.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    /// Vector store operation failed.
    #[error("vector store error: {0}")]
    Store(#[from] crate::vector_store::VectorStoreError),

    /// Qdrant client could not be created.
    #[error("Qdrant error: {0}")]
    Qdrant(#[from] Box<qdrant_client::QdrantError>),

    /// LLM provider error (embedding).
    #[error("LLM error: {0}")]
    Llm(#[from] refqa_llm::LlmError),

    /// Corpus or summary store error.
    #[error("corpus error: {0}")]
    Corpus(#[from] refqa_corpus::CorpusError),

    /// Integer conversion error.
    #[error("integer conversion failed: {0}")]
    IntConversion(#[from] TryFromIntError),

    /// There is nothing to index for the category.
    #[error("no summarized documents for category {0}")]
    NoDocuments(String),

    /// The search returned no hits.
    #[error("no matching document in category {0}")]
    NoMatch(String),
}

/// Result type alias using `IndexError`.
pub type Result<T> = std::result::Result<T, IndexError>;
