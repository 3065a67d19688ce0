use crate::models::question::Difficulty;
use validator::{Validate, ValidationError};

pub fn validate<T: Validate>(val: &T) -> Result<(), validator::ValidationErrors> {
    val.validate()
}

pub fn validate_difficulty(value: &str) -> Result<(), ValidationError> {
    value
        .parse::<Difficulty>()
        .map(|_| ())
        .map_err(|_| ValidationError::new("difficulty"))
}

/// Lowercase words joined by `-` or `_`, e.g. `system-design`.
pub fn validate_slug(value: &str) -> Result<(), ValidationError> {
    let ok = !value.is_empty()
        && !value.starts_with(['-', '_'])
        && !value.ends_with(['-', '_'])
        && value
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_');
    if ok {
        Ok(())
    } else {
        Err(ValidationError::new("slug"))
    }
}

/// Rejects text that is empty once surrounding whitespace is removed.
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

pub fn validate_no_blank_items(items: &[String]) -> Result<(), ValidationError> {
    if items.iter().any(|s| s.trim().is_empty()) {
        return Err(ValidationError::new("blank_item"));
    }
    Ok(())
}
