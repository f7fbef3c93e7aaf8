//! Infrastructure layer: stores, caches, queue transports, config, workers.

pub mod cache;
pub mod cache_repository;
pub mod config;
pub mod queue;
pub mod region_service;
pub mod store;
pub mod workers;


pub use cache_repository::CacheAsideRepository;
pub use region_service::{RegionService, RegionServiceError, RegionServiceResult};
