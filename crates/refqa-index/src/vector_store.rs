use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

pub type Payload = HashMap<String, serde_json::Value>;

#[derive(Debug, thiserror::Error)]
pub enum VectorStoreError {
    #[error("vector store unreachable: {0}")]
    Connection(String),
    #[error("collection {collection}: {message}")]
    Collection { collection: String, message: String },
    #[error("point {id} has dimension {actual}, collection expects {expected}")]
    Dimension { id: String, expected: u64, actual: usize },
    #[error("search failed: {0}")]
    Search(String),
    #[error("snapshot {path}: {message}")]
    Snapshot { path: String, message: String },
}

impl VectorStoreError {
    pub(crate) fn collection(collection: &str, message: impl std::fmt::Display) -> Self {
        Self::Collection {
            collection: collection.to_owned(),
            message: message.to_string(),
        }
    }
}

/// One embedded summary: the vector plus the payload that leads back to its source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorPoint {
    pub id: String,
    pub vector: Vec<f32>,
    pub payload: Payload,
}

/// Payload constraint: every listed field must hold the given string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VectorFilter {
    pub equals: Vec<(String, String)>,
}

impl VectorFilter {
    #[must_use]
    pub fn text_equals(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            equals: vec![(field.into(), value.into())],
        }
    }

    #[must_use]
    pub fn matches(&self, payload: &Payload) -> bool {
        self.equals.iter().all(|(field, value)| {
            payload.get(field).and_then(serde_json::Value::as_str) == Some(value.as_str())
        })
    }
}

/// A search hit. `score` is a similarity: higher means closer.
#[derive(Debug, Clone)]
pub struct ScoredVectorPoint {
    pub id: String,
    pub score: f32,
    pub payload: Payload,
}

impl ScoredVectorPoint {
    #[must_use]
    pub fn payload_str(&self, field: &str) -> Option<&str> {
        self.payload.get(field).and_then(serde_json::Value::as_str)
    }
}

pub(crate) type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Storage for one collection of embeddings per category.
pub trait VectorStore: Send + Sync {
    /// Create `collection` for vectors of `vector_size` if it is missing.
    fn ensure_collection(
        &self,
        collection: &str,
        vector_size: u64,
    ) -> BoxFuture<'_, Result<(), VectorStoreError>>;

    fn collection_exists(&self, collection: &str) -> BoxFuture<'_, Result<bool, VectorStoreError>>;

    fn upsert(
        &self,
        collection: &str,
        points: Vec<VectorPoint>,
    ) -> BoxFuture<'_, Result<(), VectorStoreError>>;

    /// Up to `limit` nearest points, best first.
    fn search(
        &self,
        collection: &str,
        vector: Vec<f32>,
        limit: u64,
        filter: Option<VectorFilter>,
    ) -> BoxFuture<'_, Result<Vec<ScoredVectorPoint>, VectorStoreError>>;
}
