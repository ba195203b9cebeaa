//! Lightweight input validation helpers. Keep logic minimal and deterministic.

use crate::CoreError;

/// Longest make or model we accept.
pub const MAX_TEXT_LEN: usize = 255;

/// Validate a required text field: non-blank and of reasonable length.
pub fn validate_required_text(field: &str, value: &str) -> Result<(), CoreError> {
    if value.trim().is_empty() {
        return Err(CoreError::InvalidCar(format!("{} must not be blank", field)));
    }
    if value.chars().count() > MAX_TEXT_LEN {
        return Err(CoreError::InvalidCar(format!(
            "{} must be at most {} characters",
            field, MAX_TEXT_LEN
        )));
    }
    Ok(())
}
