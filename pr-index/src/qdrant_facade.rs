//! Thin adapter around `qdrant-client` to isolate API usage.
//!
//! All Qdrant interactions live behind this facade so the rest of the
//! workspace never touches the builder API directly.

use std::{collections::HashMap, time::Instant};

use qdrant_client::qdrant::{
    CreateCollectionBuilder, DeletePointsBuilder, Distance, GetPointsBuilder, PointId,
    PointStruct, PointsIdsList,
    SearchPointsBuilder, UpsertPointsBuilder, Value as QValue, VectorParamsBuilder,
    point_id::PointIdOptions, value::Kind, vectors_config,
};
use qdrant_client::{Payload as QPayload, Qdrant};
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::config::{DistanceKind, IndexConfig, VectorSpace};
use crate::errors::VectorStoreError;
use crate::record::{IndexHit, Payload};

/// Qdrant-backed PR index.
///
/// The collection is ensured at most once per process: the first caller
/// runs the check/create, concurrent callers wait for it, and a failure
/// leaves the cell empty so the next call retries.
pub struct QdrantIndex {
    client: Qdrant,
    collection: String,
    space: VectorSpace,
    ready: OnceCell<()>,
}

impl QdrantIndex {
    /// Creates a new facade from the given configuration.
    ///
    /// Does not contact the server; see [`QdrantIndex::ensure_collection`].
    pub fn new(cfg: &IndexConfig) -> Result<Self, VectorStoreError> {
        cfg.validate()?;

        let mut builder = Qdrant::from_url(&cfg.qdrant_url).timeout(cfg.timeout);
        if let Some(key) = &cfg.qdrant_api_key {
            builder = builder.api_key(key.clone());
        }
        let client = builder
            .build()
            .map_err(|e| VectorStoreError::Qdrant(format!("client build: {e}")))?;

        Ok(Self {
            client,
            collection: cfg.collection.clone(),
            space: cfg.space,
            ready: OnceCell::new(),
        })
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn space(&self) -> VectorSpace {
        self.space
    }

    /// Ensures the collection exists with the configured size and distance.
    ///
    /// - Exists with matching size → no-op.
    /// - Exists with another size → [`VectorStoreError::CollectionDimension`].
    /// - Missing → created.
    pub async fn ensure_collection(&self) -> Result<(), VectorStoreError> {
        self.ready
            .get_or_try_init(|| self.create_or_verify())
            .await
            .map(|_| ())
    }

    async fn create_or_verify(&self) -> Result<(), VectorStoreError> {
        info!(
            collection = %self.collection,
            size = self.space.size,
            distance = ?self.space.distance,
            "ensuring collection"
        );

        let exists = self
            .client
            .collection_exists(&self.collection)
            .await
            .map_err(|e| VectorStoreError::Qdrant(format!("collection_exists: {e}")))?;

        if exists {
            let info = self
                .client
                .collection_info(&self.collection)
                .await
                .map_err(|e| VectorStoreError::Qdrant(format!("collection_info: {e}")))?;

            let actual = info
                .result
                .and_then(|i| i.config)
                .and_then(|c| c.params)
                .and_then(|p| p.vectors_config)
                .and_then(|v| v.config)
                .and_then(|c| match c {
                    vectors_config::Config::Params(p) => Some(p.size),
                    vectors_config::Config::ParamsMap(_) => None,
                });

            return match actual {
                Some(size) if size != self.space.size as u64 => {
                    Err(VectorStoreError::CollectionDimension {
                        collection: self.collection.clone(),
                        actual: size,
                        expected: self.space.size as u64,
                    })
                }
                Some(_) => {
                    debug!(collection = %self.collection, "collection already exists");
                    Ok(())
                }
                None => {
                    warn!(
                        collection = %self.collection,
                        "collection uses named vectors; size not verified"
                    );
                    Ok(())
                }
            };
        }

        let distance = match self.space.distance {
            DistanceKind::Cosine => Distance::Cosine,
            DistanceKind::Dot => Distance::Dot,
            DistanceKind::Euclid => Distance::Euclid,
        };

        self.client
            .create_collection(
                CreateCollectionBuilder::new(&self.collection)
                    .vectors_config(VectorParamsBuilder::new(self.space.size as u64, distance)),
            )
            .await
            .map_err(|e| VectorStoreError::Qdrant(format!("create_collection: {e}")))?;

        info!(collection = %self.collection, "collection created");
        Ok(())
    }

    /// Inserts or replaces the point `id`; waits for the write to be applied
    /// so a following read sees it.
    pub async fn upsert(
        &self,
        id: u64,
        vector: Vec<f32>,
        payload: Payload,
    ) -> Result<(), VectorStoreError> {
        self.space.check(&vector)?;
        self.ensure_collection().await?;

        let q_payload: QPayload = serde_json::Value::Object(payload)
            .try_into()
            .map_err(|e| VectorStoreError::Payload(format!("payload convert: {e}")))?;
        let point = PointStruct::new(id, vector, q_payload);

        debug!(collection = %self.collection, id, "qdrant upsert");
        let started = Instant::now();
        let res = self
            .client
            .upsert_points(UpsertPointsBuilder::new(&self.collection, vec![point]).wait(true))
            .await
            .map_err(|e| VectorStoreError::Qdrant(format!("upsert_points: {e}")))?;

        info!(
            id,
            result = ?res.result,
            latency_ms = started.elapsed().as_millis() as u64,
            "upsert acknowledged"
        );
        Ok(())
    }

    /// Top-`k` search; hits come back sorted by descending score.
    pub async fn search(&self, vector: Vec<f32>, k: u64) -> Result<Vec<IndexHit>, VectorStoreError> {
        self.space.check(&vector)?;
        self.ensure_collection().await?;

        debug!(collection = %self.collection, k, "qdrant search");
        let started = Instant::now();
        let res = self
            .client
            .search_points(SearchPointsBuilder::new(&self.collection, vector, k).with_payload(true))
            .await
            .map_err(|e| VectorStoreError::Qdrant(format!("search_points: {e}")))?;

        let hits: Vec<IndexHit> = res
            .result
            .into_iter()
            .filter_map(|sp| {
                let id = numeric_id(sp.id)?;
                Some(IndexHit {
                    id,
                    score: sp.score,
                    payload: qpayload_to_json(sp.payload),
                })
            })
            .collect();

        info!(
            k,
            hits = hits.len(),
            latency_ms = started.elapsed().as_millis() as u64,
            "search completed"
        );
        Ok(hits)
    }

    /// Fetches the payload stored for `id`.
    pub async fn get(&self, id: u64) -> Result<Option<Payload>, VectorStoreError> {
        self.ensure_collection().await?;

        let res = self
            .client
            .get_points(
                GetPointsBuilder::new(&self.collection, vec![PointId::from(id)]).with_payload(true),
            )
            .await
            .map_err(|e| VectorStoreError::Qdrant(format!("get_points: {e}")))?;

        Ok(res
            .result
            .into_iter()
            .next()
            .map(|p| qpayload_to_json(p.payload)))
    }

    /// Removes point `id`; deleting an unknown id is not an error.
    pub async fn delete(&self, id: u64) -> Result<(), VectorStoreError> {
        self.ensure_collection().await?;

        self.client
            .delete_points(
                DeletePointsBuilder::new(&self.collection)
                    .points(PointsIdsList {
                        ids: vec![PointId::from(id)],
                    })
                    .wait(true),
            )
            .await
            .map_err(|e| VectorStoreError::Qdrant(format!("delete_points: {e}")))?;

        info!(collection = %self.collection, id, "point deleted");
        Ok(())
    }
}

fn numeric_id(id: Option<PointId>) -> Option<u64> {
    match id?.point_id_options? {
        PointIdOptions::Num(n) => Some(n),
        PointIdOptions::Uuid(_) => None,
    }
}

/// Converts a Qdrant payload into a JSON object, including nested structs and lists.
pub(crate) fn qpayload_to_json(p: HashMap<String, QValue>) -> Payload {
    p.into_iter().map(|(k, v)| (k, qvalue_to_json(v))).collect()
}

fn qvalue_to_json(v: QValue) -> serde_json::Value {
    match v.kind {
        Some(Kind::StringValue(s)) => serde_json::Value::String(s),
        Some(Kind::IntegerValue(i)) => serde_json::Value::Number(i.into()),
        Some(Kind::DoubleValue(f)) => serde_json::Number::from_f64(f)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        Some(Kind::BoolValue(b)) => serde_json::Value::Bool(b),
        Some(Kind::StructValue(s)) => serde_json::Value::Object(qpayload_to_json(s.fields)),
        Some(Kind::ListValue(l)) => {
            serde_json::Value::Array(l.values.into_iter().map(qvalue_to_json).collect())
        }
        Some(Kind::NullValue(_)) | None => serde_json::Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qdrant_client::qdrant::{ListValue, Struct};

    fn s(v: &str) -> QValue {
        QValue {
            kind: Some(Kind::StringValue(v.into())),
        }
    }

    #[test]
    fn payload_conversion_handles_nesting() {
        let nested = QValue {
            kind: Some(Kind::StructValue(Struct {
                fields: HashMap::from([("label".to_string(), s("bug"))]),
            })),
        };
        let list = QValue {
            kind: Some(Kind::ListValue(ListValue {
                values: vec![s("a"), QValue { kind: Some(Kind::IntegerValue(7)) }],
            })),
        };
        let p = HashMap::from([
            ("text".to_string(), s("Title: x")),
            ("meta".to_string(), nested),
            ("tags".to_string(), list),
        ]);

        let json = serde_json::Value::Object(qpayload_to_json(p));
        assert_eq!(json["text"], "Title: x");
        assert_eq!(json["meta"]["label"], "bug");
        assert_eq!(json["tags"], serde_json::json!(["a", 7]));
    }

    #[test]
    fn only_numeric_ids_are_hits() {
        assert_eq!(numeric_id(Some(PointId::from(42u64))), Some(42));
        assert_eq!(numeric_id(None), None);
    }

    #[tokio::test]
    async fn dimension_is_checked_before_network() {
        let idx = QdrantIndex::new(&IndexConfig::new_default(
            "http://localhost:6334",
            "pr_cache",
            4,
        ))
        .unwrap();
        let err = idx.search(vec![0.0; 3], 3).await.unwrap_err();
        assert!(matches!(
            err,
            VectorStoreError::VectorSizeMismatch { got: 3, want: 4 }
        ));
    }
}
