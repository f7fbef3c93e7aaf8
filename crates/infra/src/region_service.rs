//! Region business operations over a store and a cache-aside repository.
//!
//! ## Create
//!
//! Creation is split in two:
//!
//! - `enqueue_create` (request path) checks the code is free, then hands a
//!   `RegionCreateMessage` to the dispatcher and returns whether it was accepted
//! - `create` (consumer path) re-checks and inserts
//!
//! The check and the dispatch are not atomic. Two racing requests may both
//! enqueue; the store's live-code uniqueness rejects the second insert and the
//! consumer sees `AlreadyExists`.
//!
//! ## Reads
//!
//! Only `get_by_id_cached` goes through the cache. Updates and deletes do not
//! invalidate it, so cached reads may be stale until the entry expires.

use thiserror::Error;
use tracing::{debug, instrument};

use regionhub_core::RegionId;
use regionhub_messaging::{Dispatcher, MessageTransport};
use regionhub_region::{Region, RegionCreateMessage};

use crate::cache::{CacheError, CacheStore};
use crate::cache_repository::CacheAsideRepository;
use crate::store::{RegionStore, StoreError};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegionServiceError {
    #[error("region not found")]
    NotFound,

    #[error("a region with this code already exists")]
    AlreadyExists,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Cache(#[from] CacheError),
}

impl RegionServiceError {
    /// True for store/cache failures (as opposed to business outcomes).
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Store(_) | Self::Cache(_))
    }
}

pub type RegionServiceResult<T> = Result<T, RegionServiceError>;

/// Region operations. Cheap to share behind an `Arc`.
#[derive(Debug)]
pub struct RegionService<S, C> {
    store: S,
    cache: CacheAsideRepository<C>,
}

impl<S, C> RegionService<S, C>
where
    S: RegionStore,
    C: CacheStore,
{
    pub fn new(store: S, cache: CacheAsideRepository<C>) -> Self {
        Self { store, cache }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn cache(&self) -> &CacheAsideRepository<C> {
        &self.cache
    }

    /// True iff a non-deleted region holds `code`.
    pub async fn exists_by_code(&self, code: &str) -> RegionServiceResult<bool> {
        Ok(self.store.get_by_code(code).await?.is_some())
    }

    /// Insert a new region unless its code is taken.
    #[instrument(skip(self, region), fields(region_id = %region.id_typed(), code = region.code()), err)]
    pub async fn create(&self, region: Region) -> RegionServiceResult<()> {
        if self.exists_by_code(region.code()).await? {
            return Err(RegionServiceError::AlreadyExists);
        }

        match self.store.insert(&region).await {
            Ok(()) => Ok(()),
            Err(StoreError::Conflict(_)) => Err(RegionServiceError::AlreadyExists),
            Err(e) => Err(e.into()),
        }
    }

    /// Check the code is free, then hand the create request to `channel`.
    ///
    /// Returns whether the dispatcher accepted the message; the region does not
    /// exist yet when this returns `true`.
    #[instrument(skip(self, dispatcher, message), fields(code = %message.code), err)]
    pub async fn enqueue_create<T>(
        &self,
        dispatcher: &Dispatcher<T>,
        channel: &str,
        message: &RegionCreateMessage,
    ) -> RegionServiceResult<bool>
    where
        T: MessageTransport,
    {
        if self.exists_by_code(&message.code).await? {
            return Err(RegionServiceError::AlreadyExists);
        }

        let sent = dispatcher.send(channel, Some(message)).await;
        debug!(sent, channel, "create request dispatched");
        Ok(sent)
    }

    /// Load by id, including soft-deleted rows.
    pub async fn get_by_id(&self, id: RegionId) -> RegionServiceResult<Region> {
        self.store
            .get_by_id(id)
            .await?
            .ok_or(RegionServiceError::NotFound)
    }

    /// Load a live region by id through the cache (keyed by the id string).
    ///
    /// A soft-deleted row is `NotFound` and is never written to the cache.
    pub async fn get_by_id_cached(&self, id: RegionId) -> RegionServiceResult<Region> {
        self.cache
            .get_or_compute(&id.to_string(), || async {
                self.store
                    .get_by_id(id)
                    .await
                    .map(|found| found.filter(Region::is_active))
                    .map_err(RegionServiceError::from)
            })
            .await?
            .ok_or(RegionServiceError::NotFound)
    }

    /// Load the live region holding `code`.
    pub async fn get_by_code(&self, code: &str) -> RegionServiceResult<Region> {
        self.store
            .get_by_code(code)
            .await?
            .ok_or(RegionServiceError::NotFound)
    }

    /// Live regions ordered by name; pages past the end are empty.
    pub async fn list_paged(&self, page_size: u32, page: u32) -> RegionServiceResult<Vec<Region>> {
        Ok(self.store.list_paged(page_size, page).await?)
    }

    pub async fn count(&self) -> RegionServiceResult<u64> {
        Ok(self.store.count().await?)
    }

    /// Overwrite `code` and `name` of the stored region with `region.id`.
    ///
    /// Code uniqueness against other rows is not re-checked here; the store
    /// may still refuse a second live code, which surfaces as `Store`.
    #[instrument(skip(self, region), fields(region_id = %region.id_typed()), err)]
    pub async fn update(&self, region: &Region) -> RegionServiceResult<()> {
        let mut stored = self.get_by_id(region.id_typed()).await?;
        stored.change_details(region.code(), region.name());
        self.store.update(&stored).await?;
        Ok(())
    }

    /// Soft delete. Deleting an already-deleted region succeeds.
    #[instrument(skip(self), fields(region_id = %id), err)]
    pub async fn delete_by_id(&self, id: RegionId) -> RegionServiceResult<()> {
        let mut stored = self.get_by_id(id).await?;
        if stored.is_deleted() {
            return Ok(());
        }
        stored.mark_deleted();
        self.store.update(&stored).await?;
        Ok(())
    }
}
