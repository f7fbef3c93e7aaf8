use serde::{Deserialize, Serialize};

use regionhub_core::{DomainError, DomainResult, RegionId};

/// Longest accepted area code (digits).
pub const MAX_CODE_LEN: usize = 4;

/// Longest accepted display name (characters).
pub const MAX_NAME_LEN: usize = 100;

/// Region status lifecycle.
///
/// `Active -> Deleted` is the only transition; there is no way back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegionStatus {
    Active,
    Deleted,
}

/// A telephone-area region.
///
/// Serialized as the cache snapshot `{id, code, name, isDeleted}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Region {
    id: RegionId,
    code: String,
    name: String,
    is_deleted: bool,
}

impl Region {
    /// Build a brand new, active region with a freshly generated id.
    pub fn create(code: &str, name: &str) -> DomainResult<Self> {
        Self::with_id(RegionId::new(), code, name)
    }

    /// Build an active region for a known id (validated).
    ///
    /// Used for update payloads, where the caller names the record to change.
    pub fn with_id(id: RegionId, code: &str, name: &str) -> DomainResult<Self> {
        Ok(Self {
            id,
            code: validate_code(code)?,
            name: validate_name(name)?,
            is_deleted: false,
        })
    }

    /// Rebuild a region from persisted state. No validation: the store is the
    /// record of truth.
    pub fn rehydrate(
        id: RegionId,
        code: impl Into<String>,
        name: impl Into<String>,
        status: RegionStatus,
    ) -> Self {
        Self {
            id,
            code: code.into(),
            name: name.into(),
            is_deleted: status == RegionStatus::Deleted,
        }
    }

    pub fn id_typed(&self) -> RegionId {
        self.id
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn status(&self) -> RegionStatus {
        if self.is_deleted {
            RegionStatus::Deleted
        } else {
            RegionStatus::Active
        }
    }

    pub fn is_deleted(&self) -> bool {
        self.is_deleted
    }

    pub fn is_active(&self) -> bool {
        !self.is_deleted
    }

    /// Overwrite `code` and `name`, keeping identity and status.
    pub fn change_details(&mut self, code: impl Into<String>, name: impl Into<String>) {
        self.code = code.into();
        self.name = name.into();
    }

    /// Soft delete. Idempotent: deleting twice leaves the region deleted.
    pub fn mark_deleted(&mut self) {
        self.is_deleted = true;
    }
}

/// Normalize and validate an area code: 1..=`MAX_CODE_LEN` ASCII digits.
pub fn validate_code(code: &str) -> DomainResult<String> {
    let code = code.trim();
    if code.is_empty() {
        return Err(DomainError::validation("code must not be empty"));
    }
    if code.len() > MAX_CODE_LEN {
        return Err(DomainError::validation(format!(
            "code must be at most {MAX_CODE_LEN} digits"
        )));
    }
    if !code.bytes().all(|b| b.is_ascii_digit()) {
        return Err(DomainError::validation("code must contain only digits"));
    }
    Ok(code.to_string())
}

/// Normalize and validate a display name: non-blank, at most `MAX_NAME_LEN` chars.
pub fn validate_name(name: &str) -> DomainResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(DomainError::validation("name must not be empty"));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(DomainError::validation(format!(
            "name must be at most {MAX_NAME_LEN} characters"
        )));
    }
    Ok(name.to_string())
}
