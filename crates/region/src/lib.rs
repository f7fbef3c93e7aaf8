//! Region domain module.
//!
//! Regions are telephone-area ("DDD") records with a display name. They are
//! never physically removed: deletion is a terminal status transition.

pub mod message;
pub mod region;

pub use message::RegionCreateMessage;
pub use region::{validate_code, validate_name, Region, RegionStatus, MAX_CODE_LEN, MAX_NAME_LEN};
