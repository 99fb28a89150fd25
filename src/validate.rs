//! Identifier validation
//!
//! Every mutating and checking operation runs role, resource, and permission
//! identifiers through [`validate_identifier`] before touching configuration
//! or cache state. Rejection is fail-closed: callers either propagate the
//! error (mutation entry points) or convert it to a deny (read paths).

use crate::error::{AuthzError, Result};
use tracing::warn;

/// Substrings characteristic of template or code injection.
///
/// Identifiers are plain names; none of these sequences has a legitimate
/// use in a role, resource, or permission identifier.
const INJECTION_MARKERS: &[&str] = &[
    "${", "$(", "{{", "}}", "<script", "</script", ";'", ";\"",
];

/// Validate a role, resource, or permission identifier.
///
/// Rejects values that are empty or whitespace-only, contain control
/// characters (U+0000..=U+001F, U+007F), or contain an injection-style
/// substring.
///
/// The rejected value is logged at warn level but never embedded in the
/// returned error, so adversarial input cannot be reflected through error
/// channels.
///
/// # Errors
///
/// Returns [`AuthzError::InvalidInput`] naming `field` on any rejection.
pub fn validate_identifier(value: &str, field: &str) -> Result<()> {
    if value.trim().is_empty() {
        warn!(field, "rejected empty identifier");
        return Err(AuthzError::invalid_input(field));
    }

    if value.chars().any(is_control_char) {
        warn!(field, value, "rejected identifier containing control characters");
        return Err(AuthzError::invalid_input(field));
    }

    if let Some(marker) = INJECTION_MARKERS.iter().find(|m| value.contains(**m)) {
        warn!(field, value, marker, "rejected identifier containing injection marker");
        return Err(AuthzError::invalid_input(field));
    }

    Ok(())
}

/// Validate the (role, resource, permission) triple used by every query.
pub fn validate_triple(role: &str, resource: &str, permission: &str) -> Result<()> {
    validate_identifier(role, "role")?;
    validate_identifier(resource, "resource")?;
    validate_identifier(permission, "permission")?;
    Ok(())
}

fn is_control_char(c: char) -> bool {
    matches!(c, '\u{0000}'..='\u{001F}' | '\u{007F}')
}
