//! Reference-document extraction and the on-disk corpus and summary stores.
//!
//! PDF sources are read page by page, embedded raster images are OCR'd and
//! cleaned up by an LLM; FAQ sources are flattened from JSON. Both end up in a
//! per-category corpus file that the summary store and the index read from.

pub mod error;
pub mod faq;
pub mod json;
pub mod ocr;
pub mod pdf;
pub(crate) mod source;
pub mod store;
pub mod summary;

use std::future::Future;
use std::pin::Pin;

pub use error::CorpusError;
pub use faq::FaqExtractor;
pub use ocr::{ImageBlob, ImageKind, OcrEngine, TesseractOcr};
pub use pdf::{PdfExtractor, PdfExtractorConfig};
pub use source::SourceKind;
pub use store::{Corpus, CorpusStore};
pub use summary::{SummarizedDocument, SummaryMetadata, SummaryStore};

/// Page separator used when joining PDF pages and FAQ entries.
pub const SECTION_SEPARATOR: &str = "\n---\n";

/// Erased async text transform (OCR cleanup, summarization) backed by an LLM.
pub type TextFn = Box<dyn Fn(&str) -> refqa_llm::TextFuture + Send + Sync>;

pub trait CorpusExtractor: Send + Sync {
    /// Extract the category corpus, or load it when it was already extracted.
    fn extract(&self) -> Pin<Box<dyn Future<Output = Result<Corpus, CorpusError>> + Send + '_>>;

    fn kind(&self) -> SourceKind;
}
