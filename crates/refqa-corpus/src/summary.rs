use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::CorpusError;
use crate::json::write_pretty;
use crate::source::SourceKind;
use crate::store::CorpusStore;
use crate::TextFn;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryMetadata {
    pub source: String,
    pub qa_category: String,
}

/// One indexed document: a summary (or the verbatim text) of a corpus entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummarizedDocument {
    pub page_content: String,
    pub metadata: SummaryMetadata,
}

/// The `{category}_summarized_documents.json` file of one category.
pub struct SummaryStore {
    corpus: CorpusStore,
    summarizer: TextFn,
}

impl std::fmt::Debug for SummaryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SummaryStore")
            .field("corpus", &self.corpus)
            .finish_non_exhaustive()
    }
}

impl SummaryStore {
    /// Summaries live next to the corpus file in the same data directory.
    #[must_use]
    pub fn new(corpus: CorpusStore, summarizer: TextFn) -> Self {
        Self { corpus, summarizer }
    }

    #[must_use]
    pub fn category(&self) -> &str {
        self.corpus.category()
    }

    #[must_use]
    pub fn path(&self) -> PathBuf {
        self.corpus
            .data_dir()
            .join(format!("{}_summarized_documents.json", self.category()))
    }

    #[must_use]
    pub fn exists(&self) -> bool {
        self.path().is_file()
    }

    /// Summarize every corpus entry and save the result; loads the saved file
    /// instead when it already exists.
    ///
    /// FAQ entries are stored verbatim. A failed summary keeps the raw text.
    ///
    /// # Errors
    ///
    /// Returns `CorpusError::CorpusMissing` if the corpus was never extracted,
    /// or an I/O error if the file cannot be written.
    pub async fn create(&self) -> Result<Vec<SummarizedDocument>, CorpusError> {
        if self.exists() {
            return self.load().await;
        }

        let category = self.category();
        let corpus = self.corpus.require().await?;
        let summarize = SourceKind::for_category(category).is_summarized();
        tracing::info!(category, documents = corpus.len(), summarize, "building document summaries");

        let mut documents = Vec::with_capacity(corpus.len());
        for (source, content) in corpus {
            let page_content = if summarize {
                match (self.summarizer)(&content).await {
                    Ok(summary) => summary,
                    Err(e) => {
                        tracing::warn!(category, %source, "summary failed, keeping full text: {e}");
                        content
                    }
                }
            } else {
                content
            };
            documents.push(SummarizedDocument {
                page_content,
                metadata: SummaryMetadata {
                    source,
                    qa_category: category.to_owned(),
                },
            });
        }

        write_pretty(&self.path(), &documents).await?;
        Ok(documents)
    }

    /// Saved summaries, created first when the file does not exist.
    ///
    /// # Errors
    ///
    /// See [`create`](Self::create).
    pub async fn get(&self) -> Result<Vec<SummarizedDocument>, CorpusError> {
        if self.exists() {
            self.load().await
        } else {
            self.create().await
        }
    }

    async fn load(&self) -> Result<Vec<SummarizedDocument>, CorpusError> {
        read_documents(&self.path()).await
    }
}

/// An unparsable summary file is reported and treated as empty.
async fn read_documents(path: &Path) -> Result<Vec<SummarizedDocument>, CorpusError> {
    let bytes = tokio::fs::read(path).await?;
    match serde_json::from_slice(&bytes) {
        Ok(documents) => Ok(documents),
        Err(e) => {
            tracing::error!(path = %path.display(), "error decoding summarized documents: {e}");
            Ok(Vec::new())
        }
    }
}
