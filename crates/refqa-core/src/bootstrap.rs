//! Wiring from [`Config`] to providers, index managers, and controllers.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use refqa_corpus::{OcrEngine, PdfExtractorConfig, SummaryStore, TesseractOcr};
use refqa_index::{IndexBackend, IndexManager};
use refqa_llm::ollama::OllamaProvider;
use refqa_llm::openai::OpenAiProvider;
use refqa_llm::{AnyProvider, LlmProvider};

use crate::assistant::Assistant;
use crate::config::{Config, IndexBackendKind, ProviderKind};
use crate::controller::{InitializationController, QuestionController};

/// Build the configured chat/embedding provider.
///
/// # Errors
///
/// Returns an error if the OpenAI provider has no API key, its HTTP client
/// cannot be created, or the Ollama endpoint is not a valid URL.
pub fn create_provider(config: &Config) -> anyhow::Result<AnyProvider> {
    let llm = &config.llm;
    match llm.provider {
        ProviderKind::OpenAi => {
            let api_key = config
                .secrets
                .openai_api_key
                .as_ref()
                .context("missing OPENAI_API_KEY environment variable")?;
            let provider = OpenAiProvider::new(
                api_key.expose().to_owned(),
                llm.base_url().to_owned(),
                llm.model.clone(),
                llm.max_tokens,
                Some(llm.embedding_model.clone()),
            )?
            .with_max_retries(llm.max_retries);
            Ok(AnyProvider::OpenAi(provider))
        }
        ProviderKind::Ollama => Ok(AnyProvider::Ollama(OllamaProvider::new(
            llm.base_url(),
            llm.model.clone(),
            llm.embedding_model.clone(),
        )?)),
    }
}

/// # Errors
///
/// Returns an error if the Qdrant client cannot be created.
pub fn create_index_backend(config: &Config) -> anyhow::Result<IndexBackend> {
    match config.index.backend {
        IndexBackendKind::Local => Ok(IndexBackend::local(&config.paths.index_dir)),
        IndexBackendKind::Qdrant => IndexBackend::qdrant(&config.index.qdrant_url)
            .with_context(|| format!("failed to connect to Qdrant at {}", config.index.qdrant_url)),
    }
}

/// Shared components behind the initialization and question controllers.
pub struct Pipeline<P> {
    index: Arc<IndexManager<P>>,
    assistant: Assistant<P>,
    ocr: Arc<dyn OcrEngine>,
    pdf: PdfExtractorConfig,
    data_dir: PathBuf,
}

impl<P> std::fmt::Debug for Pipeline<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("data_dir", &self.data_dir)
            .field("pdf", &self.pdf)
            .finish_non_exhaustive()
    }
}

impl<P: LlmProvider + Clone + 'static> Pipeline<P> {
    /// Assemble the pipeline around `provider`, using `backend` for the indexes.
    pub fn new(config: &Config, provider: P, backend: IndexBackend) -> Self {
        let assistant = Assistant::new(provider.clone());
        let summarizer = assistant.clone();
        let index = IndexManager::new(
            backend,
            provider,
            &config.paths.data_dir,
            Box::new(move |corpus| SummaryStore::new(corpus, summarizer.summarizer())),
        )
        .with_settings(config.index.settings());

        Self {
            index: Arc::new(index),
            assistant,
            ocr: Arc::new(TesseractOcr::new(
                config.ingest.tesseract.clone(),
                config.ingest.ocr_languages.clone(),
            )),
            pdf: config.ingest.pdf_config(),
            data_dir: config.paths.data_dir.clone(),
        }
    }

    #[must_use]
    pub fn with_ocr(mut self, ocr: Arc<dyn OcrEngine>) -> Self {
        self.ocr = ocr;
        self
    }

    #[must_use]
    pub fn index(&self) -> &IndexManager<P> {
        &self.index
    }

    #[must_use]
    pub fn initialization(&self, source_path: impl Into<PathBuf>) -> InitializationController<P> {
        InitializationController::new(
            source_path,
            Arc::clone(&self.index),
            self.assistant.clone(),
            Arc::clone(&self.ocr),
        )
        .with_pdf_config(self.pdf)
    }

    #[must_use]
    pub fn questions(&self) -> QuestionController<P> {
        QuestionController::new(Arc::clone(&self.index), self.assistant.clone())
    }
}
