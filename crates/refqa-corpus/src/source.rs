use std::path::{Path, PathBuf};

use crate::error::CorpusError;

/// How a category's reference files are stored and processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// PDF documents, OCR'd and summarized before indexing.
    Pdf,
    /// FAQ JSON, short enough to index verbatim.
    Faq,
}

impl SourceKind {
    #[must_use]
    pub fn for_category(category: &str) -> Self {
        if category == "faq" { Self::Faq } else { Self::Pdf }
    }

    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Faq => "json",
        }
    }

    #[must_use]
    pub fn is_summarized(self) -> bool {
        matches!(self, Self::Pdf)
    }
}

/// Resolve `source_path/category`, requiring an existing, non-empty directory.
pub(crate) fn category_dir(source_path: &Path, category: &str) -> Result<PathBuf, CorpusError> {
    let dir = source_path.join(category);
    let non_empty = std::fs::read_dir(&dir)
        .map(|mut entries| entries.next().is_some())
        .unwrap_or(false);
    if non_empty {
        Ok(dir)
    } else {
        Err(CorpusError::SourceMissing(dir))
    }
}

/// Files in `dir` with the given extension, sorted by file name.
pub(crate) async fn list_files(dir: &Path, extension: &str) -> Result<Vec<PathBuf>, CorpusError> {
    let mut files = Vec::new();
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) == Some(extension)
            && entry.file_type().await?.is_file()
        {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// File name without its extension, used as the corpus key.
pub(crate) fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}
