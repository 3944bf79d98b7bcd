//! Field validators shared by the create DTOs.

use tripwix_core::slug::slugify;
use validator::ValidationError;

/// Slugs are lowercase ASCII letters, digits, `-` and `_`.
pub fn validate_slug(slug: &str) -> Result<(), ValidationError> {
    let ok = !slug.is_empty()
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_');
    if ok {
        Ok(())
    } else {
        Err(ValidationError::new("slug")
            .with_message("Use lowercase letters, digits, hyphens and underscores.".into()))
    }
}

/// A property reference must contain at least one letter or digit, so the
/// generated slug is never empty.
pub fn validate_reference(reference: &str) -> Result<(), ValidationError> {
    if slugify(reference).is_empty() {
        Err(ValidationError::new("reference")
            .with_message("Reference must contain a letter or a digit.".into()))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_rules() {
        assert!(validate_slug("sea-view_2").is_ok());
        assert!(validate_slug("Sea View").is_err());
        assert!(validate_slug("").is_err());
    }

    #[test]
    fn reference_needs_a_slug_character() {
        assert!(validate_reference("TW-104").is_ok());
        assert!(validate_reference("Ção").is_ok());
        assert!(validate_reference("###").is_err());
        assert!(validate_reference(" - ").is_err());
    }
}
