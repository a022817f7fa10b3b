use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};

use crate::vector_store::{
    BoxFuture, Payload, ScoredVectorPoint, VectorFilter, VectorPoint, VectorStore, VectorStoreError,
};

#[derive(Clone, Default, Serialize, Deserialize)]
struct Collection {
    vector_size: u64,
    /// Keyed by point id; ordered so snapshots are stable.
    points: BTreeMap<String, (Vec<f32>, Payload)>,
}

impl Collection {
    fn insert(&mut self, point: VectorPoint) -> Result<(), VectorStoreError> {
        if u64::try_from(point.vector.len()).ok() != Some(self.vector_size) {
            return Err(VectorStoreError::Dimension {
                id: point.id,
                expected: self.vector_size,
                actual: point.vector.len(),
            });
        }
        self.points.insert(point.id, (point.vector, point.payload));
        Ok(())
    }

    fn rank(
        &self,
        query: &[f32],
        filter: &VectorFilter,
        limit: usize,
    ) -> Result<Vec<ScoredVectorPoint>, VectorStoreError> {
        if u64::try_from(query.len()).ok() != Some(self.vector_size) {
            return Err(VectorStoreError::Search(format!(
                "query has dimension {}, collection expects {}",
                query.len(),
                self.vector_size
            )));
        }
        let mut hits: Vec<ScoredVectorPoint> = self
            .points
            .iter()
            .filter(|(_, (_, payload))| filter.matches(payload))
            .map(|(id, (vector, payload))| ScoredVectorPoint {
                id: id.clone(),
                score: cosine_similarity(query, vector),
                payload: payload.clone(),
            })
            .collect();
        // ties keep id order from the BTreeMap
        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(limit);
        Ok(hits)
    }
}

/// On-disk form of one collection.
#[derive(Serialize, Deserialize)]
struct Snapshot {
    collection: String,
    #[serde(flatten)]
    data: Collection,
}

/// Flat cosine-similarity store kept in process memory.
///
/// A collection can be saved to and restored from a JSON snapshot so a built
/// index survives restarts without a vector database.
#[derive(Default)]
pub struct InMemoryVectorStore {
    collections: RwLock<HashMap<String, Collection>>,
}

impl std::fmt::Debug for InMemoryVectorStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryVectorStore").finish_non_exhaustive()
    }
}

impl InMemoryVectorStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<String, Collection>>, VectorStoreError> {
        self.collections
            .read()
            .map_err(|e| VectorStoreError::Connection(e.to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<String, Collection>>, VectorStoreError> {
        self.collections
            .write()
            .map_err(|e| VectorStoreError::Connection(e.to_string()))
    }

    /// Write `collection` to `path` as JSON, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection does not exist or the file cannot be written.
    pub async fn save_snapshot(&self, collection: &str, path: &Path) -> Result<(), VectorStoreError> {
        let snapshot_err = |message: String| VectorStoreError::Snapshot {
            path: path.display().to_string(),
            message,
        };
        let bytes = {
            let collections = self.read()?;
            let data = collections
                .get(collection)
                .ok_or_else(|| VectorStoreError::collection(collection, "not found"))?;
            serde_json::to_vec(&Snapshot {
                collection: collection.to_owned(),
                data: data.clone(),
            })
            .map_err(|e| snapshot_err(e.to_string()))?
        };

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| snapshot_err(e.to_string()))?;
        }
        tokio::fs::write(path, bytes)
            .await
            .map_err(|e| snapshot_err(e.to_string()))?;
        tracing::debug!(collection, path = %path.display(), "snapshot saved");
        Ok(())
    }

    /// Replace `collection` with the snapshot stored at `path` and return its
    /// point count.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a valid snapshot.
    pub async fn load_snapshot(&self, collection: &str, path: &Path) -> Result<usize, VectorStoreError> {
        let snapshot_err = |message: String| VectorStoreError::Snapshot {
            path: path.display().to_string(),
            message,
        };
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| snapshot_err(e.to_string()))?;
        let snapshot: Snapshot =
            serde_json::from_slice(&bytes).map_err(|e| snapshot_err(e.to_string()))?;

        let count = snapshot.data.points.len();
        if snapshot.collection != collection {
            tracing::debug!(collection, saved_as = %snapshot.collection, "snapshot renamed on load");
        }
        self.write()?.insert(collection.to_owned(), snapshot.data);
        tracing::debug!(collection, points = count, "snapshot loaded");
        Ok(count)
    }

    /// Number of points in `collection`, `None` if it does not exist.
    #[must_use]
    pub fn len(&self, collection: &str) -> Option<usize> {
        self.read().ok()?.get(collection).map(|c| c.points.len())
    }
}

impl VectorStore for InMemoryVectorStore {
    fn ensure_collection(
        &self,
        collection: &str,
        vector_size: u64,
    ) -> BoxFuture<'_, Result<(), VectorStoreError>> {
        let collection = collection.to_owned();
        Box::pin(async move {
            self.write()?.entry(collection).or_insert_with(|| Collection {
                vector_size,
                points: BTreeMap::new(),
            });
            Ok(())
        })
    }

    fn collection_exists(&self, collection: &str) -> BoxFuture<'_, Result<bool, VectorStoreError>> {
        let collection = collection.to_owned();
        Box::pin(async move { Ok(self.read()?.contains_key(&collection)) })
    }

    fn upsert(
        &self,
        collection: &str,
        points: Vec<VectorPoint>,
    ) -> BoxFuture<'_, Result<(), VectorStoreError>> {
        let collection = collection.to_owned();
        Box::pin(async move {
            let mut collections = self.write()?;
            let target = collections
                .get_mut(&collection)
                .ok_or_else(|| VectorStoreError::collection(&collection, "not found"))?;
            points.into_iter().try_for_each(|p| target.insert(p))
        })
    }

    fn search(
        &self,
        collection: &str,
        vector: Vec<f32>,
        limit: u64,
        filter: Option<VectorFilter>,
    ) -> BoxFuture<'_, Result<Vec<ScoredVectorPoint>, VectorStoreError>> {
        let collection = collection.to_owned();
        Box::pin(async move {
            let collections = self.read()?;
            let target = collections
                .get(&collection)
                .ok_or_else(|| VectorStoreError::collection(&collection, "not found"))?;
            let limit = usize::try_from(limit).unwrap_or(usize::MAX);
            target.rank(&vector, &filter.unwrap_or_default(), limit)
        })
    }
}

/// Cosine similarity; zero when either vector has no length.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let (dot, norm_a, norm_b) = a
        .iter()
        .zip(b)
        .fold((0.0f32, 0.0f32, 0.0f32), |(dot, na, nb), (x, y)| {
            (dot + x * y, na + x * x, nb + y * y)
        });
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a.sqrt() * norm_b.sqrt())
    }
}
