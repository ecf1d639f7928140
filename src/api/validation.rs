//! Input validation for API requests.
//!
//! Presence checks for request fields. Each returns the message to put in the
//! error envelope, so handlers can map failures straight into an `ApiError`.
//! Presence is the only rule: any non-empty value is accepted.

/// Validate a task title
pub fn validate_title(title: &str) -> Result<(), String> {
    if title.is_empty() {
        return Err("Title is required".to_string());
    }

    Ok(())
}

/// Validate a display name
pub fn validate_name(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("Name is required".to_string());
    }

    Ok(())
}
