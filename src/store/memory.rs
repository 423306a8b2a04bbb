use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::{DocumentCollection, StoreError};
use crate::filter::{DocumentFilter, FilterValue};

/// In-memory collection backend. Records are kept in insertion order and
/// filters are evaluated against JSON projections, so the backend observes
/// the same filter semantics as the Postgres one. The conditional
/// `update_one` runs under the write lock, which preserves the
/// compare-and-set behavior the token consume path depends on.
///
/// Used by the test suites; also serves as an ephemeral dev backend when no
/// DATABASE_URL is configured.
pub struct MemoryCollection<T> {
    records: Arc<RwLock<Vec<serde_json::Value>>>,
    _phantom: std::marker::PhantomData<T>,
}

impl<T> MemoryCollection<T> {
    pub fn new() -> Self {
        Self {
            records: Arc::new(RwLock::new(Vec::new())),
            _phantom: std::marker::PhantomData,
        }
    }
}

impl<T> Default for MemoryCollection<T> {
    fn default() -> Self {
        Self::new()
    }
}

fn to_doc<T: Serialize>(record: &T) -> Result<serde_json::Value, StoreError> {
    serde_json::to_value(record).map_err(|e| StoreError::Backend(e.to_string()))
}

fn from_doc<T: DeserializeOwned>(doc: &serde_json::Value) -> Result<T, StoreError> {
    serde_json::from_value(doc.clone()).map_err(|e| StoreError::Backend(e.to_string()))
}

#[async_trait]
impl<T> DocumentCollection<T> for MemoryCollection<T>
where
    T: Serialize + DeserializeOwned + Send + Sync,
{
    async fn insert_one(&self, record: &T) -> Result<(), StoreError> {
        let doc = to_doc(record)?;
        self.records.write().await.push(doc);
        Ok(())
    }

    async fn insert_many(&self, records: &[T]) -> Result<(), StoreError> {
        let docs = records.iter().map(to_doc).collect::<Result<Vec<_>, _>>()?;
        self.records.write().await.extend(docs);
        Ok(())
    }

    async fn find(
        &self,
        filter: &DocumentFilter,
        skip: Option<i64>,
        limit: Option<i64>,
    ) -> Result<Vec<T>, StoreError> {
        let records = self.records.read().await;
        let skip = skip.unwrap_or(0).max(0) as usize;
        let limit = limit.map(|l| l.max(0) as usize).unwrap_or(usize::MAX);
        records
            .iter()
            .filter(|doc| filter.matches(doc))
            .skip(skip)
            .take(limit)
            .map(from_doc)
            .collect()
    }

    async fn delete_many(&self, filter: &DocumentFilter) -> Result<u64, StoreError> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|doc| !filter.matches(doc));
        Ok((before - records.len()) as u64)
    }

    async fn update_one(
        &self,
        filter: &DocumentFilter,
        field: &'static str,
        value: FilterValue,
    ) -> Result<u64, StoreError> {
        let mut records = self.records.write().await;
        match records.iter_mut().find(|doc| filter.matches(doc)) {
            Some(doc) => {
                doc[field] = value.to_json();
                Ok(1)
            }
            None => Ok(0),
        }
    }
}
