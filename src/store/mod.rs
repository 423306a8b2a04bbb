pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;

use crate::filter::{DocumentFilter, FilterError, FilterValue};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid filter: {0}")]
    Filter(#[from] FilterError),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error("store failure: {0}")]
    Backend(String),
}

/// An opaque document collection: insert, filtered find with skip/limit,
/// filtered bulk delete, and a conditional single-field update. Services talk
/// to this trait only; the Postgres backend serves production and the
/// in-memory backend serves tests.
#[async_trait]
pub trait DocumentCollection<T>: Send + Sync {
    async fn insert_one(&self, record: &T) -> Result<(), StoreError>;

    async fn insert_many(&self, records: &[T]) -> Result<(), StoreError>;

    /// Returns matching records in store-default order. `skip`/`limit` apply
    /// skip/take semantics on that order; no stable ordering is guaranteed.
    async fn find(
        &self,
        filter: &DocumentFilter,
        skip: Option<i64>,
        limit: Option<i64>,
    ) -> Result<Vec<T>, StoreError>;

    /// Removes every matching record; vacuous success on zero matches.
    async fn delete_many(&self, filter: &DocumentFilter) -> Result<u64, StoreError>;

    /// Sets a single field on the matching record and reports how many rows
    /// matched. The token consume path relies on the filter and the write
    /// being applied as one atomic step, so a `time_used IS NULL` clause
    /// makes this a compare-and-set.
    async fn update_one(
        &self,
        filter: &DocumentFilter,
        field: &'static str,
        value: FilterValue,
    ) -> Result<u64, StoreError>;
}
