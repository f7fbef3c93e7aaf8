use serde::{Deserialize, Serialize};

use regionhub_region::Region;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct CreateRegionRequest {
    #[serde(alias = "ddd")]
    pub code: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateRegionRequest {
    pub id: String,
    #[serde(alias = "ddd")]
    pub code: String,
    pub name: String,
}

fn default_page_size() -> u32 {
    10
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageQuery {
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default)]
    pub page: u32,
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionResponse {
    pub id: String,
    pub code: String,
    pub name: String,
}

impl From<&Region> for RegionResponse {
    fn from(region: &Region) -> Self {
        Self {
            id: region.id_typed().to_string(),
            code: region.code().to_string(),
            name: region.name().to_string(),
        }
    }
}

/// Response envelope: `{success, error, data?}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaseResponse<T = ()> {
    pub success: bool,
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl BaseResponse<()> {
    pub fn ok() -> Self {
        Self {
            success: true,
            error: String::new(),
            data: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            data: None,
        }
    }
}

impl<T> BaseResponse<T> {
    pub fn with_data(data: T) -> Self {
        Self {
            success: true,
            error: String::new(),
            data: Some(data),
        }
    }
}

/// Paged envelope: the base envelope plus paging metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PagedResponse<T> {
    pub success: bool,
    pub error: String,
    pub data: Vec<T>,
    pub current_page: u32,
    pub total_items: u64,
    pub items_per_page: u32,
}

impl<T> PagedResponse<T> {
    pub fn new(data: Vec<T>, query: PageQuery, total_items: u64) -> Self {
        Self {
            success: true,
            error: String::new(),
            data,
            current_page: query.page,
            total_items,
            items_per_page: query.page_size,
        }
    }
}
