//! Identifier validation.

use crate::error::{Error, Result};
use once_cell::sync::Lazy;
use regex::Regex;

static IDENTIFIER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern is a valid regex")
});

/// Longest identifier accepted by every built-in dialect (Postgres truncates at 63 bytes)
pub const MAX_IDENTIFIER_LEN: usize = 63;

/// Check that `name` is usable as a table, column, relation, constraint or alias name.
pub(crate) fn validate_identifier(name: &str) -> Result<()> {
    if name.len() <= MAX_IDENTIFIER_LEN && IDENTIFIER.is_match(name) {
        Ok(())
    } else {
        Err(Error::InvalidIdentifier {
            identifier: name.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_identifiers() {
        for name in ["users", "Name", "_private", "order_items2"] {
            assert!(validate_identifier(name).is_ok(), "{name}");
        }
    }

    #[test]
    fn test_invalid_identifiers() {
        for name in ["", "1users", "user name", "users;drop", "a\"b", "naïve"] {
            assert!(
                matches!(validate_identifier(name), Err(Error::InvalidIdentifier { .. })),
                "{name}"
            );
        }
        assert!(validate_identifier(&"x".repeat(64)).is_err());
    }
}
