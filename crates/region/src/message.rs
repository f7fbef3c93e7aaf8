use serde::{Deserialize, Serialize};

use regionhub_core::DomainResult;

use crate::region::{validate_code, validate_name, Region};

/// Queue payload requesting creation of a region.
///
/// Wire shape: `{"code": "..", "name": ".."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionCreateMessage {
    pub code: String,
    pub name: String,
}

impl RegionCreateMessage {
    /// Validated constructor (trims both fields).
    pub fn new(code: &str, name: &str) -> DomainResult<Self> {
        Ok(Self {
            code: validate_code(code)?,
            name: validate_name(name)?,
        })
    }

    /// Turn the request into a fresh region with a newly assigned id.
    pub fn into_region(self) -> DomainResult<Region> {
        Region::create(&self.code, &self.name)
    }
}
