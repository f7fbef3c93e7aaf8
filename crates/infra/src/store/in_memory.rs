use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;

use regionhub_core::RegionId;
use regionhub_region::Region;

use super::r#trait::{page_offset, RegionStore, StoreError};

/// In-memory region store for tests/dev.
///
/// Enforces the same live-code uniqueness rule as the Postgres partial index.
/// `set_offline(true)` makes every call fail with `StoreError::Unavailable`.
#[derive(Debug, Default)]
pub struct InMemoryRegionStore {
    rows: RwLock<HashMap<RegionId, Region>>,
    offline: AtomicBool,
}

impl InMemoryRegionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed rows directly, bypassing uniqueness checks.
    pub fn with_regions(regions: impl IntoIterator<Item = Region>) -> Self {
        let store = Self::new();
        if let Ok(mut rows) = store.rows.write() {
            rows.extend(regions.into_iter().map(|r| (r.id_typed(), r)));
        }
        store
    }

    /// Simulate an outage of the backing store.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Total number of rows, deleted ones included.
    pub fn len(&self) -> usize {
        self.rows.read().map(|rows| rows.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_online(&self) -> Result<(), StoreError> {
        if self.offline.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("in-memory store is offline".to_string()))
        } else {
            Ok(())
        }
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, HashMap<RegionId, Region>>, StoreError> {
        self.check_online()?;
        self.rows
            .read()
            .map_err(|_| StoreError::Unavailable("region rows lock poisoned".to_string()))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, HashMap<RegionId, Region>>, StoreError> {
        self.check_online()?;
        self.rows
            .write()
            .map_err(|_| StoreError::Unavailable("region rows lock poisoned".to_string()))
    }
}

fn live_code_taken(rows: &HashMap<RegionId, Region>, region: &Region) -> bool {
    region.is_active()
        && rows
            .values()
            .any(|r| r.is_active() && r.code() == region.code() && r.id_typed() != region.id_typed())
}

#[async_trait]
impl RegionStore for InMemoryRegionStore {
    async fn get_by_id(&self, id: RegionId) -> Result<Option<Region>, StoreError> {
        Ok(self.read()?.get(&id).cloned())
    }

    async fn get_by_code(&self, code: &str) -> Result<Option<Region>, StoreError> {
        Ok(self
            .read()?
            .values()
            .find(|r| r.is_active() && r.code() == code)
            .cloned())
    }

    async fn list_paged(&self, page_size: u32, page: u32) -> Result<Vec<Region>, StoreError> {
        let mut live: Vec<Region> = self.read()?.values().filter(|r| r.is_active()).cloned().collect();
        live.sort_by(|a, b| a.name().cmp(b.name()).then_with(|| a.id_typed().cmp(&b.id_typed())));

        let offset = usize::try_from(page_offset(page_size, page)).unwrap_or(usize::MAX);
        Ok(live.into_iter().skip(offset).take(page_size as usize).collect())
    }

    async fn count(&self) -> Result<u64, StoreError> {
        Ok(self.read()?.values().filter(|r| r.is_active()).count() as u64)
    }

    async fn insert(&self, region: &Region) -> Result<(), StoreError> {
        let mut rows = self.write()?;
        if rows.contains_key(&region.id_typed()) {
            return Err(StoreError::Conflict(format!("region id {} already stored", region.id_typed())));
        }
        if live_code_taken(&rows, region) {
            return Err(StoreError::Conflict(format!("live region with code {} exists", region.code())));
        }
        rows.insert(region.id_typed(), region.clone());
        Ok(())
    }

    async fn update(&self, region: &Region) -> Result<(), StoreError> {
        let mut rows = self.write()?;
        if !rows.contains_key(&region.id_typed()) {
            return Err(StoreError::RowNotFound(region.id_typed().to_string()));
        }
        if live_code_taken(&rows, region) {
            return Err(StoreError::Conflict(format!("live region with code {} exists", region.code())));
        }
        rows.insert(region.id_typed(), region.clone());
        Ok(())
    }
}
