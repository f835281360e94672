//! Boundary checks shared by the lifecycle services.
//!
//! Requests arrive with every field optional; these helpers turn them into
//! typed values or an [`InputError`].

use crate::model::user::Role;
use crate::service::error::InputError;
use uuid::Uuid;

/// Trimmed, non-blank text.
pub(crate) fn require_text(value: Option<&str>, field: &'static str) -> Result<String, InputError> {
    match value.map(str::trim) {
        Some(trimmed) if !trimmed.is_empty() => Ok(trimmed.to_string()),
        _ => Err(InputError::Missing(field)),
    }
}

/// Non-blank text kept verbatim.
pub(crate) fn require_body(value: Option<&str>, field: &'static str) -> Result<String, InputError> {
    match value {
        Some(body) if !body.trim().is_empty() => Ok(body.to_string()),
        _ => Err(InputError::Missing(field)),
    }
}

/// Non-empty secret kept verbatim; whitespace is significant.
pub(crate) fn require_secret(
    value: Option<&str>,
    field: &'static str,
) -> Result<String, InputError> {
    match value {
        Some(secret) if !secret.is_empty() => Ok(secret.to_string()),
        _ => Err(InputError::Missing(field)),
    }
}

pub(crate) fn require_id(value: Option<&str>, field: &'static str) -> Result<Uuid, InputError> {
    let text = require_text(value, field)?;
    Uuid::parse_str(&text).map_err(|_| InputError::MalformedId { field, value: text })
}

pub(crate) fn require_flag(value: Option<bool>, field: &'static str) -> Result<bool, InputError> {
    value.ok_or(InputError::Missing(field))
}

/// Maps role tags onto the closed role set.
pub(crate) fn parse_roles(tags: &[String]) -> Result<Vec<Role>, InputError> {
    tags.iter()
        .map(|tag| Role::parse(tag).ok_or_else(|| InputError::UnknownRole(tag.clone())))
        .collect()
}
