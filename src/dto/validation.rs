//! Validation helpers for DTOs.

use validator::ValidationError;

/// Longest callback payload accepted, matching inline button limits of chat platforms.
pub const MAX_CALLBACK_DATA_BYTES: usize = 64;

/// Validates that a text field carries at least one non-whitespace character.
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("value must contain non-whitespace characters".into());
        return Err(err);
    }
    Ok(())
}

/// Validates a button payload: non-empty printable ASCII of at most
/// [`MAX_CALLBACK_DATA_BYTES`] bytes.
///
/// # Examples
///
/// ```ignore
/// validate_callback_data("timer:10") // Ok
/// validate_callback_data("")         // Err - empty
/// validate_callback_data("caf\u{e9}")  // Err - not ASCII
/// ```
pub fn validate_callback_data(data: &str) -> Result<(), ValidationError> {
    if data.is_empty() || data.len() > MAX_CALLBACK_DATA_BYTES {
        let mut err = ValidationError::new("callback_data_length");
        err.message = Some(
            format!(
                "callback data must be 1 to {MAX_CALLBACK_DATA_BYTES} bytes (got {})",
                data.len()
            )
            .into(),
        );
        return Err(err);
    }

    if !data.chars().all(|c| c.is_ascii_graphic()) {
        let mut err = ValidationError::new("callback_data_format");
        err.message = Some("callback data must be printable ASCII without spaces".into());
        return Err(err);
    }

    Ok(())
}
