//! Per-category index lifecycle: build from summaries, search, resolve full text.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use refqa_corpus::{Corpus, CorpusStore, SECTION_SEPARATOR, SummarizedDocument, SummaryStore};
use refqa_llm::LlmProvider;

use crate::error::{IndexError, Result};
use crate::in_memory_store::InMemoryVectorStore;
use crate::qdrant_ops::QdrantOps;
use crate::selection::SelectionPolicy;
use crate::vector_store::{VectorFilter, VectorPoint, VectorStore};

/// Builds the summary store for a category's corpus.
pub type SummaryFactory = Box<dyn Fn(CorpusStore) -> SummaryStore + Send + Sync>;

pub enum IndexBackend {
    /// In-process store, persisted as one JSON snapshot per category.
    Local {
        store: Arc<InMemoryVectorStore>,
        index_dir: PathBuf,
    },
    Qdrant(QdrantOps),
}

impl IndexBackend {
    #[must_use]
    pub fn local(index_dir: impl Into<PathBuf>) -> Self {
        Self::Local {
            store: Arc::new(InMemoryVectorStore::new()),
            index_dir: index_dir.into(),
        }
    }

    /// # Errors
    ///
    /// Returns an error if the Qdrant client cannot be created.
    pub fn qdrant(url: &str) -> Result<Self> {
        Ok(Self::Qdrant(QdrantOps::new(url)?))
    }

    fn store(&self) -> &dyn VectorStore {
        match self {
            Self::Local { store, .. } => store.as_ref(),
            Self::Qdrant(ops) => ops,
        }
    }
}

impl std::fmt::Debug for IndexBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Local { index_dir, .. } => f
                .debug_struct("Local")
                .field("index_dir", index_dir)
                .finish_non_exhaustive(),
            Self::Qdrant(ops) => f.debug_tuple("Qdrant").field(ops).finish(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndexSettings {
    pub collection_prefix: String,
    pub top_k: u64,
    pub selection: SelectionPolicy,
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self {
            collection_prefix: "refqa".into(),
            top_k: 5,
            selection: SelectionPolicy::Best,
        }
    }
}

/// Context handed to the answer prompt.
#[derive(Debug, Clone, PartialEq)]
pub struct Retrieval {
    /// Full corpus text of the selected sources, joined by the section separator.
    pub context: String,
    /// Selected source ids, best first.
    pub sources: Vec<String>,
    pub scores: Vec<f32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexReport {
    pub category: String,
    pub documents: usize,
    /// `false` when the index already existed and nothing was done.
    pub created: bool,
}

pub struct IndexManager<P> {
    backend: IndexBackend,
    provider: P,
    data_dir: PathBuf,
    settings: IndexSettings,
    summaries: SummaryFactory,
    corpora: RwLock<HashMap<String, Arc<Corpus>>>,
}

impl<P> std::fmt::Debug for IndexManager<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexManager")
            .field("backend", &self.backend)
            .field("data_dir", &self.data_dir)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl<P: LlmProvider> IndexManager<P> {
    /// `data_dir` holds the corpus and summary files; `summaries` wraps a
    /// category's corpus store with the summarizer used to build it.
    pub fn new(
        backend: IndexBackend,
        provider: P,
        data_dir: impl Into<PathBuf>,
        summaries: SummaryFactory,
    ) -> Self {
        Self {
            backend,
            provider,
            data_dir: data_dir.into(),
            settings: IndexSettings::default(),
            summaries,
            corpora: RwLock::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn with_settings(mut self, settings: IndexSettings) -> Self {
        self.settings = settings;
        self
    }

    #[must_use]
    pub fn collection_name(&self, category: &str) -> String {
        format!("{}_{category}", self.settings.collection_prefix)
    }

    /// Snapshot file of a category, local backend only.
    #[must_use]
    pub fn snapshot_path(&self, category: &str) -> Option<PathBuf> {
        match &self.backend {
            IndexBackend::Local { index_dir, .. } => {
                Some(index_dir.join(format!("{category}_index.json")))
            }
            IndexBackend::Qdrant(_) => None,
        }
    }

    #[must_use]
    pub fn corpus_store(&self, category: &str) -> CorpusStore {
        CorpusStore::new(&self.data_dir, category)
    }

    #[must_use]
    pub fn summary_store(&self, category: &str) -> SummaryStore {
        (self.summaries)(self.corpus_store(category))
    }

    /// # Errors
    ///
    /// Returns an error if the vector store cannot be reached.
    pub async fn index_exists(&self, category: &str) -> Result<bool> {
        match self.snapshot_path(category) {
            Some(path) => Ok(path.is_file()),
            None => Ok(self
                .backend
                .store()
                .collection_exists(&self.collection_name(category))
                .await?),
        }
    }

    /// Embed the category's summarized documents into its collection.
    ///
    /// Does nothing when the index already exists.
    ///
    /// # Errors
    ///
    /// Returns `IndexError::NoDocuments` when there is nothing to index, or an
    /// error from the summary store, the embedding provider, or the vector store.
    pub async fn create_index(&self, category: &str) -> Result<IndexReport> {
        if self.index_exists(category).await? {
            return Ok(IndexReport {
                category: category.to_owned(),
                documents: 0,
                created: false,
            });
        }

        let summaries = self.summary_store(category);
        let mut documents = summaries.get().await?;
        if documents.is_empty() {
            documents = summaries.create().await?;
        }
        if documents.is_empty() {
            return Err(IndexError::NoDocuments(category.to_owned()));
        }

        // An existing collection counts as a built index, so it is created
        // only after every embedding succeeded.
        let total = documents.len();
        tracing::info!(category, total, "embedding summarized documents");
        let mut points = Vec::with_capacity(total);
        for (i, doc) in documents.iter().enumerate() {
            let vector = self.provider.embed(&doc.page_content).await?;
            points.push(document_point(doc, vector));
            if (i + 1) % 50 == 0 {
                tracing::debug!(category, progress = format_args!("{}/{total}", i + 1));
            }
        }

        let vector_size = u64::try_from(points.first().map_or(0, |p| p.vector.len()))?;
        let collection = self.collection_name(category);
        let store = self.backend.store();
        store.ensure_collection(&collection, vector_size).await?;
        store.upsert(&collection, points).await?;

        if let IndexBackend::Local { store, index_dir } = &self.backend {
            let path = index_dir.join(format!("{category}_index.json"));
            store.save_snapshot(&collection, &path).await?;
        }
        self.forget_corpus(category);

        tracing::info!(category, documents = total, "index created");
        Ok(IndexReport {
            category: category.to_owned(),
            documents: total,
            created: true,
        })
    }

    /// Find the source that best answers `query` and return its full text.
    ///
    /// Builds the index first when it does not exist.
    ///
    /// # Errors
    ///
    /// Returns `IndexError::NoMatch` when the search has no hits, or an error
    /// from index creation, embedding, or the vector store.
    pub async fn search(&self, query: &str, category: &str) -> Result<Retrieval> {
        self.create_index(category).await?;
        self.ensure_loaded(category).await?;

        let vector = self.provider.embed(query).await?;
        let hits = self
            .backend
            .store()
            .search(
                &self.collection_name(category),
                vector,
                self.settings.top_k,
                Some(VectorFilter::text_equals("qa_category", category)),
            )
            .await?;

        let selected = self.settings.selection.select(&hits);
        if selected.is_empty() {
            return Err(IndexError::NoMatch(category.to_owned()));
        }

        let corpus = self.corpus(category).await?;
        let mut sources = Vec::with_capacity(selected.len());
        let mut scores = Vec::with_capacity(selected.len());
        let mut texts = Vec::with_capacity(selected.len());
        for hit in selected {
            let source = hit.payload_str("source").unwrap_or_default().to_owned();
            match corpus.get(&source) {
                Some(text) => texts.push(text.as_str()),
                None => {
                    tracing::warn!(category, %source, "selected source is missing from the corpus");
                    texts.push("");
                }
            }
            sources.push(source);
            scores.push(hit.score);
        }
        tracing::debug!(category, ?sources, ?scores, "retrieved");

        Ok(Retrieval {
            context: texts.join(SECTION_SEPARATOR),
            sources,
            scores,
        })
    }

    /// Restore a local snapshot into memory on first use.
    async fn ensure_loaded(&self, category: &str) -> Result<()> {
        let IndexBackend::Local { store, .. } = &self.backend else {
            return Ok(());
        };
        let collection = self.collection_name(category);
        if store.collection_exists(&collection).await? {
            return Ok(());
        }
        if let Some(path) = self.snapshot_path(category) {
            let points = store.load_snapshot(&collection, &path).await?;
            tracing::info!(category, points, "index loaded from snapshot");
        }
        Ok(())
    }

    async fn corpus(&self, category: &str) -> Result<Arc<Corpus>> {
        if let Some(corpus) = self.cached_corpus(category) {
            return Ok(corpus);
        }
        let corpus = match self.corpus_store(category).load().await? {
            Some(corpus) => corpus,
            None => {
                tracing::warn!(category, "no corpus file, answers will have empty context");
                Corpus::new()
            }
        };
        let corpus = Arc::new(corpus);
        if let Ok(mut cache) = self.corpora.write() {
            cache.insert(category.to_owned(), Arc::clone(&corpus));
        }
        Ok(corpus)
    }

    fn cached_corpus(&self, category: &str) -> Option<Arc<Corpus>> {
        self.corpora.read().ok()?.get(category).cloned()
    }

    fn forget_corpus(&self, category: &str) {
        if let Ok(mut cache) = self.corpora.write() {
            cache.remove(category);
        }
    }

    #[must_use]
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

fn document_point(doc: &SummarizedDocument, vector: Vec<f32>) -> VectorPoint {
    VectorPoint {
        id: uuid::Uuid::new_v4().to_string(),
        vector,
        payload: HashMap::from([
            ("source".to_owned(), serde_json::json!(doc.metadata.source)),
            (
                "qa_category".to_owned(),
                serde_json::json!(doc.metadata.qa_category),
            ),
            ("page_content".to_owned(), serde_json::json!(doc.page_content)),
        ]),
    }
}
