//! Dialects and the capability registry.
//!
//! A [`Dialect`] is a closed tag naming a target engine family. Everything the
//! translator needs to know about a target (quoting, placeholders, the type
//! table, generator expressions and feature flags) lives in an immutable
//! [`Capabilities`] record, and a [`CapabilityRegistry`] holds one record per
//! dialect. Both are built once and shared by reference.
//!
//! # Examples
//!
//! ```
//! use riptide::dialect::{CapabilityRegistry, Dialect, Feature};
//!
//! let registry = CapabilityRegistry::builtin();
//! let pg = registry.get(Dialect::Postgres)?;
//! assert_eq!(pg.identifier_quote(), '"');
//! assert!(pg.supports(Feature::MaterializedViews));
//! assert!(!registry.get(Dialect::Sqlite)?.supports(Feature::Partitioning));
//! # Ok::<(), riptide::Error>(())
//! ```

mod capabilities;
mod registry;

pub use capabilities::{
    BulkInsert, Capabilities, Feature, GeneratorSource, PlaceholderStyle, TypeSpec,
};
pub use registry::CapabilityRegistry;

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Target engine family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[serde(alias = "postgresql", alias = "pg")]
    Postgres,
    #[serde(alias = "mariadb")]
    MySql,
    Sqlite,
    /// Document-oriented target; renders JSON command documents instead of SQL
    #[serde(alias = "mongo", alias = "mongodb")]
    Document,
}

impl Dialect {
    pub const ALL: [Dialect; 4] = [
        Dialect::Postgres,
        Dialect::MySql,
        Dialect::Sqlite,
        Dialect::Document,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Dialect::Postgres => "postgres",
            Dialect::MySql => "mysql",
            Dialect::Sqlite => "sqlite",
            Dialect::Document => "document",
        }
    }

    /// Whether the target speaks SQL
    pub fn is_relational(self) -> bool {
        self != Dialect::Document
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Dialect {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" => Ok(Dialect::Postgres),
            "mysql" | "mariadb" => Ok(Dialect::MySql),
            "sqlite" => Ok(Dialect::Sqlite),
            "document" | "mongo" | "mongodb" => Ok(Dialect::Document),
            _ => Err(Error::UnknownDialect(s.to_string())),
        }
    }
}
