use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use regionhub_core::RegionId;
use regionhub_region::Region;

/// Store operation error.
///
/// These are **infrastructure errors** (storage, constraints, connectivity) as
/// opposed to domain errors (validation, not-found).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write (duplicate id, or a second
    /// live region with the same code).
    #[error("unique constraint violated: {0}")]
    Conflict(String),

    /// An update targeted a row that does not exist.
    #[error("row not found: {0}")]
    RowNotFound(String),

    /// The backing store could not be reached (pool closed, IO, timeouts).
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Any other query failure (malformed rows, driver errors).
    #[error("query failed: {0}")]
    Query(String),
}

/// Durable region storage.
///
/// ## Read semantics
///
/// - `get_by_id` returns the row regardless of its deleted flag
/// - `get_by_code`, `list_paged` and `count` only see non-deleted rows
/// - `list_paged` orders by `name` ascending and slices
///   `[page * page_size, page * page_size + page_size)`; pages past the end are empty
///
/// ## Write semantics
///
/// - at most one non-deleted row per `code` (writes that would break this fail
///   with `StoreError::Conflict`)
/// - each call is a single independent operation; no cross-call transactions
#[async_trait]
pub trait RegionStore: Send + Sync {
    async fn get_by_id(&self, id: RegionId) -> Result<Option<Region>, StoreError>;

    async fn get_by_code(&self, code: &str) -> Result<Option<Region>, StoreError>;

    async fn list_paged(&self, page_size: u32, page: u32) -> Result<Vec<Region>, StoreError>;

    async fn count(&self) -> Result<u64, StoreError>;

    async fn insert(&self, region: &Region) -> Result<(), StoreError>;

    async fn update(&self, region: &Region) -> Result<(), StoreError>;
}

#[async_trait]
impl<S> RegionStore for Arc<S>
where
    S: RegionStore + ?Sized,
{
    async fn get_by_id(&self, id: RegionId) -> Result<Option<Region>, StoreError> {
        (**self).get_by_id(id).await
    }

    async fn get_by_code(&self, code: &str) -> Result<Option<Region>, StoreError> {
        (**self).get_by_code(code).await
    }

    async fn list_paged(&self, page_size: u32, page: u32) -> Result<Vec<Region>, StoreError> {
        (**self).list_paged(page_size, page).await
    }

    async fn count(&self) -> Result<u64, StoreError> {
        (**self).count().await
    }

    async fn insert(&self, region: &Region) -> Result<(), StoreError> {
        (**self).insert(region).await
    }

    async fn update(&self, region: &Region) -> Result<(), StoreError> {
        (**self).update(region).await
    }
}

/// Offset of the first row of `page`, saturating instead of overflowing.
pub(crate) fn page_offset(page_size: u32, page: u32) -> u64 {
    u64::from(page_size).saturating_mul(u64::from(page))
}
