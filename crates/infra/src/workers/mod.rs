//! Background workers.

pub mod region_create_worker;

pub use region_create_worker::{RegionCreateWorker, WorkerError, WorkerHandle};
