//! Region store of record.
//!
//! The store is the durable owner of region rows. Every read path except
//! `get_by_id` filters out soft-deleted rows.

pub mod in_memory;
pub mod postgres;
pub mod r#trait;

pub use in_memory::InMemoryRegionStore;
pub use postgres::PostgresRegionStore;
pub use r#trait::{RegionStore, StoreError};
