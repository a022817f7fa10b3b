//! Qdrant-backed [`VectorStore`](crate::VectorStore).

use qdrant_client::Qdrant;
use qdrant_client::qdrant::{
    Condition, CreateCollectionBuilder, Distance, Filter, PointStruct, ScoredPoint,
    SearchPointsBuilder, UpsertPointsBuilder, VectorParamsBuilder, point_id::PointIdOptions,
    value::Kind,
};

use crate::vector_store::{
    BoxFuture, Payload, ScoredVectorPoint, VectorFilter, VectorPoint, VectorStore, VectorStoreError,
};

/// One Qdrant collection per category, cosine distance.
#[derive(Clone)]
pub struct QdrantOps {
    client: Qdrant,
}

impl std::fmt::Debug for QdrantOps {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QdrantOps").finish_non_exhaustive()
    }
}

impl QdrantOps {
    /// The client connects lazily; this only validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the Qdrant client cannot be created.
    pub fn new(url: &str) -> Result<Self, Box<qdrant_client::QdrantError>> {
        let client = Qdrant::from_url(url).build().map_err(Box::new)?;
        Ok(Self { client })
    }
}

impl VectorStore for QdrantOps {
    fn ensure_collection(
        &self,
        collection: &str,
        vector_size: u64,
    ) -> BoxFuture<'_, Result<(), VectorStoreError>> {
        let collection = collection.to_owned();
        Box::pin(async move {
            if self.collection_exists(&collection).await? {
                return Ok(());
            }
            self.client
                .create_collection(
                    CreateCollectionBuilder::new(collection.as_str())
                        .vectors_config(VectorParamsBuilder::new(vector_size, Distance::Cosine)),
                )
                .await
                .map_err(|e| VectorStoreError::collection(&collection, e))?;
            tracing::info!(collection = %collection, vector_size, "Qdrant collection created");
            Ok(())
        })
    }

    fn collection_exists(&self, collection: &str) -> BoxFuture<'_, Result<bool, VectorStoreError>> {
        let collection = collection.to_owned();
        Box::pin(async move {
            self.client
                .collection_exists(collection.as_str())
                .await
                .map_err(|e| VectorStoreError::Connection(e.to_string()))
        })
    }

    fn upsert(
        &self,
        collection: &str,
        points: Vec<VectorPoint>,
    ) -> BoxFuture<'_, Result<(), VectorStoreError>> {
        let collection = collection.to_owned();
        Box::pin(async move {
            let points: Vec<PointStruct> = points.into_iter().map(to_point_struct).collect();
            self.client
                .upsert_points(UpsertPointsBuilder::new(collection.as_str(), points).wait(true))
                .await
                .map_err(|e| VectorStoreError::collection(&collection, e))?;
            Ok(())
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
            let mut request =
                SearchPointsBuilder::new(collection.as_str(), vector, limit).with_payload(true);
            if let Some(filter) = filter {
                request = request.filter(to_filter(&filter));
            }
            let response = self
                .client
                .search_points(request)
                .await
                .map_err(|e| VectorStoreError::Search(e.to_string()))?;
            Ok(response.result.into_iter().map(from_scored_point).collect())
        })
    }
}

fn to_point_struct(point: VectorPoint) -> PointStruct {
    let payload: serde_json::Map<String, serde_json::Value> = point.payload.into_iter().collect();
    PointStruct::new(point.id, point.vector, qdrant_client::Payload::from(payload))
}

fn to_filter(filter: &VectorFilter) -> Filter {
    Filter::must(
        filter
            .equals
            .iter()
            .map(|(field, value)| Condition::matches(field.as_str(), value.clone())),
    )
}

/// Scalar payload values come back as JSON; lists and structs are dropped.
fn from_scored_point(point: ScoredPoint) -> ScoredVectorPoint {
    let payload: Payload = point
        .payload
        .into_iter()
        .filter_map(|(key, value)| {
            let json = match value.kind? {
                Kind::StringValue(s) => serde_json::Value::String(s),
                Kind::IntegerValue(i) => serde_json::Value::from(i),
                Kind::DoubleValue(d) => serde_json::Number::from_f64(d)?.into(),
                Kind::BoolValue(b) => serde_json::Value::Bool(b),
                _ => return None,
            };
            Some((key, json))
        })
        .collect();

    let id = match point.id.and_then(|id| id.point_id_options) {
        Some(PointIdOptions::Uuid(uuid)) => uuid,
        Some(PointIdOptions::Num(n)) => n.to_string(),
        None => String::new(),
    };

    ScoredVectorPoint {
        id,
        score: point.score,
        payload,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn client_builds_without_connecting() {
        let ops = QdrantOps::new("http://localhost:6334").unwrap();
        assert!(format!("{ops:?}").contains("QdrantOps"));
    }

    #[test]
    fn payload_is_carried_into_point() {
        let point = VectorPoint {
            id: "5f0c2a3e-8a4b-4c1d-9e2f-0a1b2c3d4e5f".into(),
            vector: vec![0.1, 0.2],
            payload: Payload::from([
                ("source".into(), serde_json::json!("12")),
                ("qa_category".into(), serde_json::json!("finance")),
            ]),
        };
        let qp = to_point_struct(point);
        assert_eq!(qp.payload.len(), 2);
        assert!(matches!(
            qp.payload["source"].kind,
            Some(Kind::StringValue(ref s)) if s == "12"
        ));
    }

    #[test]
    fn filter_has_one_condition_per_field() {
        let mut filter = VectorFilter::text_equals("qa_category", "faq");
        filter.equals.push(("source".into(), "3".into()));
        let f = to_filter(&filter);
        assert_eq!(f.must.len(), 2);
        assert!(f.must_not.is_empty());
    }

    #[test]
    fn scored_point_keeps_scalars() {
        let point = ScoredPoint {
            id: Some(7u64.into()),
            score: 0.75,
            payload: HashMap::from([
                ("source".to_owned(), qdrant_client::qdrant::Value::from("3")),
                ("pages".to_owned(), qdrant_client::qdrant::Value::from(4i64)),
            ]),
            ..ScoredPoint::default()
        };
        let hit = from_scored_point(point);
        assert_eq!(hit.id, "7");
        assert_eq!(hit.payload_str("source"), Some("3"));
        assert_eq!(hit.payload["pages"], serde_json::json!(4));
        assert!((hit.score - 0.75).abs() < f32::EPSILON);
    }
}
