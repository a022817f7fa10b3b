use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum CorpusError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(
        "reference data is missing, the path is incorrect, or the directory is empty: {}",
        .0.display()
    )]
    SourceMissing(PathBuf),

    #[error("no extracted corpus for category {0}")]
    CorpusMissing(String),

    #[error("PDF error: {0}")]
    Pdf(String),

    #[error("image error: {0}")]
    Image(String),

    #[error("OCR failed: {0}")]
    Ocr(String),

    #[error("LLM error: {0}")]
    Llm(#[from] refqa_llm::LlmError),
}
