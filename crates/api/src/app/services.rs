use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use regionhub_infra::cache::{CacheStore, InMemoryCacheStore};
use regionhub_infra::cache_repository::CacheAsideRepository;
use regionhub_infra::config::Settings;
use regionhub_infra::region_service::RegionService;
use regionhub_infra::store::{InMemoryRegionStore, RegionStore};
use regionhub_infra::workers::{RegionCreateWorker, WorkerHandle};
use regionhub_messaging::{Dispatcher, InMemoryTransport, MessageTransport};

#[cfg(feature = "redis")]
use anyhow::Context;
#[cfg(feature = "redis")]
use regionhub_infra::{cache::RedisCacheStore, queue::RedisStreamsTransport, store::PostgresRegionStore};

/// Region service over type-erased adapters, so both profiles share one type.
pub type DynRegionService = RegionService<Arc<dyn RegionStore>, Arc<dyn CacheStore>>;

/// Everything the handlers need.
///
/// In the in-memory profile the create consumer runs in-process; it is stopped
/// when the last reference to the services is dropped.
pub struct AppServices {
    regions: Arc<DynRegionService>,
    dispatcher: Dispatcher<Arc<dyn MessageTransport>>,
    create_channel: String,
    worker: Option<WorkerHandle>,
}

impl std::fmt::Debug for AppServices {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppServices")
            .field("create_channel", &self.create_channel)
            .field("in_process_worker", &self.worker.is_some())
            .finish()
    }
}

impl AppServices {
    pub fn regions(&self) -> &DynRegionService {
        &self.regions
    }

    pub fn dispatcher(&self) -> &Dispatcher<Arc<dyn MessageTransport>> {
        &self.dispatcher
    }

    pub fn create_channel(&self) -> &str {
        &self.create_channel
    }

    /// In-memory wiring (dev/test): store, cache, queue, and the create worker.
    ///
    /// Must be called from within a tokio runtime.
    pub fn in_memory(settings: &Settings) -> Self {
        Self::in_memory_with_store(settings, Arc::new(InMemoryRegionStore::new()))
    }

    /// In-memory wiring over a caller-provided store (tests seed it directly).
    pub fn in_memory_with_store(settings: &Settings, store: Arc<InMemoryRegionStore>) -> Self {
        let store: Arc<dyn RegionStore> = store;
        let cache: Arc<dyn CacheStore> = Arc::new(InMemoryCacheStore::new());
        let regions = Arc::new(RegionService::new(
            store,
            CacheAsideRepository::with_options(cache, settings.cache_entry_options()),
        ));

        let transport = Arc::new(InMemoryTransport::new());
        let channel = settings.queue.create_region_channel.clone();
        // Declare before serving so the first create is not lost.
        let subscription = transport.declare(channel.clone());
        let worker = RegionCreateWorker::spawn(
            "region-create",
            subscription,
            regions.clone(),
            CancellationToken::new(),
        );

        let transport: Arc<dyn MessageTransport> = transport;
        Self {
            regions,
            dispatcher: Dispatcher::new(transport),
            create_channel: channel,
            worker: Some(worker),
        }
    }

    /// Persistent wiring: Postgres store, Redis cache, Redis Streams queue.
    ///
    /// The create consumer is a separate deployment reading the stream.
    #[cfg(feature = "redis")]
    pub async fn persistent(settings: &Settings) -> anyhow::Result<Self> {
        let database_url = settings
            .database_url
            .as_deref()
            .context("database_url is required for persistent stores")?;
        let redis_url = settings
            .redis_url
            .as_deref()
            .context("redis_url is required for persistent stores")?;

        let store: Arc<dyn RegionStore> = Arc::new(PostgresRegionStore::connect(database_url).await?);
        let cache: Arc<dyn CacheStore> =
            Arc::new(RedisCacheStore::connect(redis_url, settings.cache.key_prefix.clone()).await?);
        let transport: Arc<dyn MessageTransport> = Arc::new(RedisStreamsTransport::connect(redis_url, None).await?);

        let regions = Arc::new(RegionService::new(
            store,
            CacheAsideRepository::with_options(cache, settings.cache_entry_options()),
        ));

        Ok(Self {
            regions,
            dispatcher: Dispatcher::new(transport),
            create_channel: settings.queue.create_region_channel.clone(),
            worker: None,
        })
    }
}

/// Pick the profile from settings.
pub async fn build_services(settings: &Settings) -> anyhow::Result<AppServices> {
    if settings.use_persistent_stores {
        #[cfg(feature = "redis")]
        {
            return AppServices::persistent(settings).await;
        }
        #[cfg(not(feature = "redis"))]
        {
            tracing::warn!(
                "use_persistent_stores=true but redis feature not enabled, falling back to in-memory"
            );
            return Ok(AppServices::in_memory(settings));
        }
    }

    Ok(AppServices::in_memory(settings))
}
