//! PDF corpus extraction: page text plus LLM-cleaned OCR of embedded images.

mod images;
mod text;

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;

pub use text::normalize_whitespace;

use crate::error::CorpusError;
use crate::ocr::{ImageBlob, OcrEngine};
use crate::source::{SourceKind, category_dir, file_stem, list_files};
use crate::store::{Corpus, CorpusStore};
use crate::{CorpusExtractor, SECTION_SEPARATOR, TextFn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PdfExtractorConfig {
    /// Images must be strictly wider than this to be OCR'd.
    pub min_image_width: u32,
    /// Images must be strictly taller than this to be OCR'd.
    pub min_image_height: u32,
    /// Checkpoint the partial corpus after this many files (0 disables).
    pub save_every: usize,
    /// OCR output shorter than this (in characters) is discarded.
    pub min_ocr_chars: usize,
}

impl Default for PdfExtractorConfig {
    fn default() -> Self {
        Self {
            min_image_width: 500,
            min_image_height: 500,
            save_every: 100,
            min_ocr_chars: 30,
        }
    }
}

pub struct PdfExtractor {
    dir: PathBuf,
    store: CorpusStore,
    ocr: Arc<dyn OcrEngine>,
    formatter: TextFn,
    config: PdfExtractorConfig,
}

impl std::fmt::Debug for PdfExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PdfExtractor")
            .field("dir", &self.dir)
            .field("store", &self.store)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl PdfExtractor {
    /// Extractor for the PDFs under `source_path/{store.category()}`.
    ///
    /// `formatter` cleans up raw OCR output before it is appended to a page.
    ///
    /// # Errors
    ///
    /// Returns `CorpusError::SourceMissing` if the category directory is
    /// missing or empty.
    pub fn new(
        source_path: &Path,
        store: CorpusStore,
        ocr: Arc<dyn OcrEngine>,
        formatter: TextFn,
    ) -> Result<Self, CorpusError> {
        let dir = category_dir(source_path, store.category())?;
        Ok(Self {
            dir,
            store,
            ocr,
            formatter,
            config: PdfExtractorConfig::default(),
        })
    }

    #[must_use]
    pub fn with_config(mut self, config: PdfExtractorConfig) -> Self {
        self.config = config;
        self
    }

    async fn extract_all(&self) -> Result<Corpus, CorpusError> {
        let category = self.store.category();
        if let Some(corpus) = self.store.load().await? {
            tracing::info!(category, entries = corpus.len(), "using existing corpus");
            return Ok(corpus);
        }

        let files = list_files(&self.dir, SourceKind::Pdf.extension()).await?;
        tracing::info!(category, files = files.len(), "extracting PDF corpus");

        let mut corpus = Corpus::new();
        for (done, path) in files.iter().enumerate() {
            match self.extract_file(path).await {
                Ok(text) => {
                    corpus.insert(file_stem(path), text);
                }
                Err(e) => {
                    tracing::warn!(file = %path.display(), "skipping unreadable PDF: {e}");
                }
            }

            let done = done + 1;
            if self.config.save_every > 0 && done % self.config.save_every == 0 {
                tracing::info!(category, done, total = files.len(), "checkpointing corpus");
                self.store.save(&corpus).await?;
            }
        }

        if !self.store.save(&corpus).await? {
            tracing::warn!(category, "corpus was extracted but could not be saved");
        }
        Ok(corpus)
    }

    /// Extract one PDF: normalized page text with formatted OCR text appended,
    /// pages joined by the section separator.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, or if neither its text nor
    /// its page structure can be parsed.
    pub async fn extract_file(&self, path: &Path) -> Result<String, CorpusError> {
        let data: Arc<[u8]> = tokio::fs::read(path).await?.into();

        let text_data = Arc::clone(&data);
        let texts = match tokio::task::spawn_blocking(move || {
            pdf_extract::extract_text_from_mem_by_pages(&text_data).map_err(|e| e.to_string())
        })
        .await
        {
            Ok(Ok(pages)) => pages,
            Ok(Err(e)) => {
                tracing::warn!(file = %path.display(), "text extraction failed: {e}");
                Vec::new()
            }
            Err(e) => {
                tracing::warn!(file = %path.display(), "text extraction aborted: {e}");
                Vec::new()
            }
        };

        let PdfExtractorConfig {
            min_image_width,
            min_image_height,
            ..
        } = self.config;
        let image_data = Arc::clone(&data);
        let images = tokio::task::spawn_blocking(move || {
            images::page_images(&image_data, min_image_width, min_image_height)
        })
        .await
        .map_err(|e| CorpusError::Pdf(e.to_string()))?;
        let images = match images {
            Ok(images) => images,
            Err(e) if !texts.is_empty() => {
                tracing::warn!(file = %path.display(), "image extraction failed: {e}");
                Vec::new()
            }
            Err(e) => return Err(e),
        };

        let page_count = texts.len().max(images.len());
        let mut pages = Vec::with_capacity(page_count);
        for number in 0..page_count {
            let mut page = normalize_whitespace(texts.get(number).map_or("", String::as_str));
            for image in images.get(number).into_iter().flatten() {
                page.push_str(&self.ocr_image(image, number + 1).await);
            }
            pages.push(page);
        }

        tracing::debug!(file = %path.display(), pages = page_count, "PDF extracted");
        Ok(pages.join(SECTION_SEPARATOR))
    }

    /// OCR one image; empty when OCR fails or finds too little text.
    async fn ocr_image(&self, image: &ImageBlob, page: usize) -> String {
        let raw = match self.ocr.recognize(image).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(page, "error processing image: {e}");
                return String::new();
            }
        };
        if raw.chars().count() < self.config.min_ocr_chars {
            return String::new();
        }
        match (self.formatter)(&raw).await {
            Ok(formatted) => formatted,
            Err(e) => {
                tracing::warn!(page, "OCR text formatting failed, keeping raw text: {e}");
                raw
            }
        }
    }
}

impl CorpusExtractor for PdfExtractor {
    fn extract(&self) -> Pin<Box<dyn Future<Output = Result<Corpus, CorpusError>> + Send + '_>> {
        Box::pin(self.extract_all())
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Pdf
    }
}
