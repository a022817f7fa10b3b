use std::path::{Path, PathBuf};
use std::sync::Arc;

use refqa_corpus::{
    CorpusExtractor, FaqExtractor, OcrEngine, PdfExtractor, PdfExtractorConfig, SourceKind,
};
use refqa_index::{IndexManager, IndexReport};
use refqa_llm::LlmProvider;

use crate::assistant::Assistant;
use crate::error::Result;
use crate::progress::progress_bar;

/// Turns a category's reference files into a searchable index:
/// extract the corpus, summarize it, embed the summaries.
pub struct InitializationController<P> {
    source_path: PathBuf,
    index: Arc<IndexManager<P>>,
    assistant: Assistant<P>,
    ocr: Arc<dyn OcrEngine>,
    pdf: PdfExtractorConfig,
}

impl<P> std::fmt::Debug for InitializationController<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InitializationController")
            .field("source_path", &self.source_path)
            .field("pdf", &self.pdf)
            .finish_non_exhaustive()
    }
}

impl<P: LlmProvider + 'static> InitializationController<P> {
    /// `source_path` holds one sub-directory of reference files per category.
    pub fn new(
        source_path: impl Into<PathBuf>,
        index: Arc<IndexManager<P>>,
        assistant: Assistant<P>,
        ocr: Arc<dyn OcrEngine>,
    ) -> Self {
        Self {
            source_path: source_path.into(),
            index,
            assistant,
            ocr,
            pdf: PdfExtractorConfig::default(),
        }
    }

    #[must_use]
    pub fn with_pdf_config(mut self, pdf: PdfExtractorConfig) -> Self {
        self.pdf = pdf;
        self
    }

    #[must_use]
    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    /// Extract, summarize, and index one category.
    ///
    /// A saved corpus or summary file is taken as complete and reused as is,
    /// including a checkpoint left by an interrupted extraction. Delete the
    /// file to extract the category again.
    ///
    /// # Errors
    ///
    /// Returns an error if the category has no source files or any step fails.
    pub async fn initialize(&self, category: &str) -> Result<IndexReport> {
        let extractor = self.extractor(category)?;
        let corpus = extractor.extract().await?;
        tracing::info!(category, kind = ?extractor.kind(), entries = corpus.len(), "corpus ready");

        let documents = self.index.summary_store(category).create().await?;
        tracing::info!(category, documents = documents.len(), "summaries ready");

        Ok(self.index.create_index(category).await?)
    }

    /// Initialize every category whose index does not exist yet.
    ///
    /// # Errors
    ///
    /// Stops at the first category that fails to initialize.
    pub async fn ensure_indexes(&self, categories: &[String]) -> Result<Vec<IndexReport>> {
        let bar = progress_bar(categories.len() as u64, "building indexes");
        let mut reports = Vec::with_capacity(categories.len());
        for category in categories {
            bar.set_message(category.clone());
            let report = if self.index.index_exists(category).await? {
                tracing::info!(category, "index already exists");
                IndexReport {
                    category: category.clone(),
                    documents: 0,
                    created: false,
                }
            } else {
                self.initialize(category).await?
            };
            reports.push(report);
            bar.inc(1);
        }
        bar.finish_with_message("all indexes ready");
        Ok(reports)
    }

    fn extractor(&self, category: &str) -> Result<Box<dyn CorpusExtractor>> {
        let store = self.index.corpus_store(category);
        Ok(match SourceKind::for_category(category) {
            SourceKind::Faq => Box::new(FaqExtractor::new(&self.source_path, store)?),
            SourceKind::Pdf => Box::new(
                PdfExtractor::new(
                    &self.source_path,
                    store,
                    Arc::clone(&self.ocr),
                    self.assistant.ocr_formatter(),
                )?
                .with_config(self.pdf),
            ),
        })
    }
}
