use crate::error::{SyncError, SyncResult};

/// Validates that a string is not blank (empty or whitespace-only).
/// Returns the trimmed string on success.
pub fn non_blank(value: &str, field: &str) -> SyncResult<String> {
    let trimmed = value.trim().to_string();
    if trimmed.is_empty() {
        Err(SyncError::BlankField {
            field: field.to_string(),
        })
    } else {
        Ok(trimmed)
    }
}

/// Validates that a count is positive (> 0).
pub fn positive(value: usize, field: &str) -> SyncResult<usize> {
    if value == 0 {
        Err(SyncError::NonPositive {
            field: field.to_string(),
        })
    } else {
        Ok(value)
    }
}

/// Validates that a set/vec is non-empty.
pub fn non_empty_set<T>(value: &[T], field: &str) -> SyncResult<()> {
    if value.is_empty() {
        Err(SyncError::EmptySet {
            field: field.to_string(),
        })
    } else {
        Ok(())
    }
}

/// Trims an optional string, returning None if blank.
pub fn trim_optional(value: Option<&str>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
