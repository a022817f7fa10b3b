//! Per-category vector indexes over summarized reference documents.
//!
//! Summaries are embedded into one collection per category, either in Qdrant
//! or in an in-process store persisted as JSON snapshots. A search selects the
//! best-matching source and returns its full corpus text as answer context.

pub mod error;
pub mod in_memory_store;
pub mod manager;
pub mod qdrant_ops;
pub mod selection;
pub mod vector_store;

pub use error::{IndexError, Result};
pub use in_memory_store::InMemoryVectorStore;
pub use manager::{IndexBackend, IndexManager, IndexReport, IndexSettings, Retrieval, SummaryFactory};
pub use qdrant_ops::QdrantOps;
pub use selection::SelectionPolicy;
pub use vector_store::{
    Payload, ScoredVectorPoint, VectorFilter, VectorPoint, VectorStore, VectorStoreError,
};
