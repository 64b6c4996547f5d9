//! Registry of capability records, one per dialect.

use super::{Capabilities, Dialect};
use crate::error::{Error, Result};
use std::collections::BTreeMap;

/// Immutable set of [`Capabilities`] keyed by [`Dialect`].
///
/// Construct once at startup and pass by reference; the translator only ever
/// reads from it.
///
/// # Examples
///
/// ```
/// use riptide::dialect::{Capabilities, CapabilityRegistry, Dialect, Feature};
///
/// // A Postgres-family target with distributed tables enabled
/// let registry = CapabilityRegistry::builtin()
///     .with(Capabilities::postgres().with_feature(Feature::Distribution, true));
/// assert!(registry.get(Dialect::Postgres)?.supports(Feature::Distribution));
/// # Ok::<(), riptide::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct CapabilityRegistry {
    entries: BTreeMap<Dialect, Capabilities>,
}

impl CapabilityRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in record for every dialect
    pub fn builtin() -> Self {
        Dialect::ALL
            .into_iter()
            .fold(Self::new(), |registry, d| registry.with(Capabilities::for_dialect(d)))
    }

    /// Add or replace the record for `caps.dialect()`
    pub fn with(mut self, caps: Capabilities) -> Self {
        self.entries.insert(caps.dialect(), caps);
        self
    }

    /// Record for `dialect`
    ///
    /// # Errors
    ///
    /// Returns `Error::UnknownDialect` if no record was registered.
    pub fn get(&self, dialect: Dialect) -> Result<&Capabilities> {
        self.entries
            .get(&dialect)
            .ok_or_else(|| Error::UnknownDialect(dialect.to_string()))
    }

    pub fn dialects(&self) -> impl Iterator<Item = Dialect> + '_ {
        self.entries.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::Feature;

    #[test]
    fn test_builtin_has_all_dialects() {
        let registry = CapabilityRegistry::builtin();
        assert_eq!(registry.dialects().count(), 4);
        for d in Dialect::ALL {
            assert_eq!(registry.get(d).unwrap().dialect(), d);
        }
    }

    #[test]
    fn test_missing_entry_is_an_error() {
        let registry = CapabilityRegistry::new().with(Capabilities::sqlite());
        assert!(registry.get(Dialect::Sqlite).is_ok());
        assert!(matches!(
            registry.get(Dialect::MySql),
            Err(Error::UnknownDialect(name)) if name == "mysql"
        ));
    }

    #[test]
    fn test_with_replaces_entry() {
        let registry = CapabilityRegistry::builtin()
            .with(Capabilities::mysql().with_feature(Feature::Returning, true));
        assert!(registry.get(Dialect::MySql).unwrap().supports(Feature::Returning));
        assert_eq!(registry.dialects().count(), 4);
    }
}
