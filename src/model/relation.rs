//! Relation (foreign key) definitions.
//!
//! A relation names a target table and a column-to-column mapping from the
//! owning table to the target. `Single` relations are foreign keys held by
//! the owning table (many-to-one); `Multiple` relations are the reverse side
//! (one-to-many) and never produce constraints or participate in row writes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of target rows a relation resolves to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cardinality {
    Single,
    Multiple,
}

/// `ON UPDATE` / `ON DELETE` policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferentialAction {
    Restrict,
    Cascade,
    SetNull,
    #[default]
    NoAction,
}

impl ReferentialAction {
    pub fn sql(self) -> &'static str {
        match self {
            ReferentialAction::Restrict => "RESTRICT",
            ReferentialAction::Cascade => "CASCADE",
            ReferentialAction::SetNull => "SET NULL",
            ReferentialAction::NoAction => "NO ACTION",
        }
    }
}

impl fmt::Display for ReferentialAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sql())
    }
}

/// Named relation from an owning table to a target table
///
/// # Examples
///
/// ```
/// use riptide::model::{Cardinality, ReferentialAction, Relation};
///
/// // posts.AuthorId -> users.Id
/// let author = Relation::single("author", "users")
///     .on("AuthorId", "Id")
///     .on_delete(ReferentialAction::Cascade);
/// assert_eq!(author.cardinality(), Cardinality::Single);
/// assert_eq!(author.mapping(), &[("AuthorId".to_string(), "Id".to_string())]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relation {
    name: String,
    target: String,
    cardinality: Cardinality,
    mapping: Vec<(String, String)>,
    on_update: ReferentialAction,
    on_delete: ReferentialAction,
}

impl Relation {
    pub fn new(name: impl Into<String>, target: impl Into<String>, cardinality: Cardinality) -> Self {
        Self {
            name: name.into(),
            target: target.into(),
            cardinality,
            mapping: Vec::new(),
            on_update: ReferentialAction::default(),
            on_delete: ReferentialAction::default(),
        }
    }

    /// Many-to-one relation backed by a foreign key on the owning table
    pub fn single(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self::new(name, target, Cardinality::Single)
    }

    /// One-to-many relation; the target holds the foreign key
    pub fn multiple(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self::new(name, target, Cardinality::Multiple)
    }

    /// Pair an owning-table column with a target-table column
    pub fn on(mut self, local: impl Into<String>, remote: impl Into<String>) -> Self {
        self.mapping.push((local.into(), remote.into()));
        self
    }

    pub fn on_update(mut self, action: ReferentialAction) -> Self {
        self.on_update = action;
        self
    }

    pub fn on_delete(mut self, action: ReferentialAction) -> Self {
        self.on_delete = action;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn cardinality(&self) -> Cardinality {
        self.cardinality
    }

    /// `(owning column, target column)` pairs in declaration order
    pub fn mapping(&self) -> &[(String, String)] {
        &self.mapping
    }

    pub fn local_columns(&self) -> impl Iterator<Item = &str> {
        self.mapping.iter().map(|(local, _)| local.as_str())
    }

    pub fn remote_columns(&self) -> impl Iterator<Item = &str> {
        self.mapping.iter().map(|(_, remote)| remote.as_str())
    }

    pub fn update_action(&self) -> ReferentialAction {
        self.on_update
    }

    pub fn delete_action(&self) -> ReferentialAction {
        self.on_delete
    }

    pub fn is_single(&self) -> bool {
        self.cardinality == Cardinality::Single
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_no_action() {
        let rel = Relation::multiple("posts", "posts").on("Id", "AuthorId");
        assert_eq!(rel.update_action(), ReferentialAction::NoAction);
        assert_eq!(rel.delete_action(), ReferentialAction::NoAction);
        assert!(!rel.is_single());
    }

    #[test]
    fn test_composite_mapping_order() {
        let rel = Relation::single("line", "order_lines")
            .on("OrderId", "OrderId")
            .on("LineNo", "LineNo");
        assert_eq!(rel.local_columns().collect::<Vec<_>>(), ["OrderId", "LineNo"]);
        assert_eq!(rel.remote_columns().collect::<Vec<_>>(), ["OrderId", "LineNo"]);
    }

    #[test]
    fn test_action_sql() {
        assert_eq!(ReferentialAction::SetNull.to_string(), "SET NULL");
        assert_eq!(ReferentialAction::Restrict.sql(), "RESTRICT");
    }
}
