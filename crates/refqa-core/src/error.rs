use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error(transparent)]
    Corpus(#[from] refqa_corpus::CorpusError),

    #[error(transparent)]
    Index(#[from] refqa_index::IndexError),

    #[error("LLM error: {0}")]
    Llm(#[from] refqa_llm::LlmError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, CoreError>;
