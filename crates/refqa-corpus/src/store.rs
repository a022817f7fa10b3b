use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::CorpusError;
use crate::json::write_pretty;

/// Extracted text per source, keyed by file stem (PDF) or FAQ id.
pub type Corpus = BTreeMap<String, String>;

/// The `{category}_all_text.json` file of one category.
#[derive(Debug, Clone)]
pub struct CorpusStore {
    data_dir: PathBuf,
    category: String,
}

impl CorpusStore {
    #[must_use]
    pub fn new(data_dir: impl Into<PathBuf>, category: impl Into<String>) -> Self {
        Self {
            data_dir: data_dir.into(),
            category: category.into(),
        }
    }

    #[must_use]
    pub fn category(&self) -> &str {
        &self.category
    }

    #[must_use]
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    #[must_use]
    pub fn path(&self) -> PathBuf {
        self.data_dir
            .join(format!("{}_all_text.json", self.category))
    }

    #[must_use]
    pub fn exists(&self) -> bool {
        self.path().is_file()
    }

    /// Merge `corpus` over the stored file and write it back.
    ///
    /// Returns `Ok(false)` without writing when the existing file is not a
    /// valid corpus, so a damaged file is never silently replaced.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or written.
    pub async fn save(&self, corpus: &Corpus) -> Result<bool, CorpusError> {
        let path = self.path();
        tokio::fs::create_dir_all(&self.data_dir).await?;

        let merged = if path.is_file() {
            let bytes = tokio::fs::read(&path).await?;
            let Ok(mut existing) = serde_json::from_slice::<Corpus>(&bytes) else {
                tracing::warn!(path = %path.display(), "corpus file is not valid JSON, not saving");
                return Ok(false);
            };
            existing.extend(corpus.iter().map(|(k, v)| (k.clone(), v.clone())));
            existing
        } else {
            corpus.clone()
        };

        write_pretty(&path, &merged).await?;
        tracing::debug!(
            category = %self.category,
            entries = merged.len(),
            "corpus saved"
        );
        Ok(true)
    }

    /// Load the stored corpus, `None` when it was never extracted.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read.
    pub async fn load(&self) -> Result<Option<Corpus>, CorpusError> {
        let path = self.path();
        if !path.is_file() {
            return Ok(None);
        }
        let bytes = tokio::fs::read(&path).await?;
        match serde_json::from_slice(&bytes) {
            Ok(corpus) => Ok(Some(corpus)),
            Err(e) => {
                tracing::warn!(path = %path.display(), "corpus file is not properly formatted: {e}");
                Ok(Some(Corpus::new()))
            }
        }
    }

    /// Like [`load`](Self::load), but a missing corpus is an error.
    ///
    /// # Errors
    ///
    /// Returns `CorpusError::CorpusMissing` when nothing was extracted yet.
    pub async fn require(&self) -> Result<Corpus, CorpusError> {
        self.load()
            .await?
            .ok_or_else(|| CorpusError::CorpusMissing(self.category.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus(pairs: &[(&str, &str)]) -> Corpus {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[tokio::test]
    async fn load_missing_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = CorpusStore::new(dir.path(), "finance");
        assert!(!store.exists());
        assert!(store.load().await.unwrap().is_none());
        assert!(matches!(
            store.require().await,
            Err(CorpusError::CorpusMissing(c)) if c == "finance"
        ));
    }

    #[tokio::test]
    async fn save_creates_dir_and_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = CorpusStore::new(dir.path().join("formatted"), "insurance");
        assert!(store.save(&corpus(&[("1", "保單")])).await.unwrap());
        assert!(store.path().ends_with("insurance_all_text.json"));
        assert_eq!(store.load().await.unwrap().unwrap(), corpus(&[("1", "保單")]));
    }

    #[tokio::test]
    async fn save_merges_over_existing_entries() {
        let dir = tempfile::tempdir().unwrap();
        let store = CorpusStore::new(dir.path(), "finance");
        store.save(&corpus(&[("1", "old"), ("2", "keep")])).await.unwrap();
        store.save(&corpus(&[("1", "new"), ("3", "added")])).await.unwrap();

        let loaded = store.require().await.unwrap();
        assert_eq!(
            loaded,
            corpus(&[("1", "new"), ("2", "keep"), ("3", "added")])
        );
    }

    #[tokio::test]
    async fn save_refuses_to_overwrite_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = CorpusStore::new(dir.path(), "finance");
        std::fs::write(store.path(), "{not json").unwrap();

        assert!(!store.save(&corpus(&[("1", "x")])).await.unwrap());
        assert_eq!(std::fs::read_to_string(store.path()).unwrap(), "{not json");
    }

    #[tokio::test]
    async fn invalid_file_loads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = CorpusStore::new(dir.path(), "faq");
        std::fs::write(store.path(), "[]").unwrap();
        assert_eq!(store.load().await.unwrap(), Some(Corpus::new()));
    }
}
