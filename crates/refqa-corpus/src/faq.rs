use std::collections::BTreeMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use serde::Deserialize;

use crate::error::CorpusError;
use crate::source::{SourceKind, category_dir, list_files};
use crate::store::{Corpus, CorpusStore};
use crate::{CorpusExtractor, SECTION_SEPARATOR};

#[derive(Debug, Deserialize)]
struct FaqEntry {
    #[serde(default)]
    question: String,
    #[serde(default)]
    answers: Vec<String>,
}

/// Flattens FAQ JSON files (`id -> [{question, answers}]`) into a corpus.
#[derive(Debug, Clone)]
pub struct FaqExtractor {
    dir: PathBuf,
    store: CorpusStore,
}

impl FaqExtractor {
    /// # Errors
    ///
    /// Returns `CorpusError::SourceMissing` if the category directory is
    /// missing or empty.
    pub fn new(source_path: &Path, store: CorpusStore) -> Result<Self, CorpusError> {
        let dir = category_dir(source_path, store.category())?;
        Ok(Self { dir, store })
    }

    async fn extract_all(&self) -> Result<Corpus, CorpusError> {
        let category = self.store.category();
        if let Some(corpus) = self.store.load().await? {
            tracing::info!(category, entries = corpus.len(), "using existing corpus");
            return Ok(corpus);
        }

        let files = list_files(&self.dir, SourceKind::Faq.extension()).await?;
        let mut corpus = Corpus::new();
        for path in &files {
            let bytes = tokio::fs::read(path).await?;
            corpus.extend(flatten_faq(&bytes)?);
        }
        tracing::info!(category, files = files.len(), entries = corpus.len(), "FAQ corpus extracted");

        self.store.save(&corpus).await?;
        Ok(corpus)
    }
}

/// Render each id's entries as `Q:{question},Ans:{answers}` blocks.
fn flatten_faq(bytes: &[u8]) -> Result<Corpus, CorpusError> {
    let faq: BTreeMap<String, Vec<FaqEntry>> = serde_json::from_slice(bytes)?;
    Ok(faq
        .into_iter()
        .map(|(id, entries)| {
            let mut text = String::new();
            for entry in entries {
                text.push_str(&format!(
                    "Q:{},Ans:{}",
                    entry.question,
                    entry.answers.join(" ")
                ));
                text.push_str(SECTION_SEPARATOR);
            }
            (id, text.trim().to_owned())
        })
        .collect())
}

impl CorpusExtractor for FaqExtractor {
    fn extract(&self) -> Pin<Box<dyn Future<Output = Result<Corpus, CorpusError>> + Send + '_>> {
        Box::pin(self.extract_all())
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Faq
    }
}
