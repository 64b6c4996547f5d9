//! Schema: the set of tables a query is built against.

use super::relation::{Cardinality, ReferentialAction, Relation};
use super::{DataType, TableDef, TypeFamily};
use crate::error::{Error, Result};
use std::collections::BTreeMap;

/// Immutable collection of [`TableDef`]s with cross-table relations checked.
///
/// Built once at startup and shared by reference; nothing in the crate
/// mutates it afterwards.
///
/// # Examples
///
/// ```
/// use riptide::model::{Column, DataType, Relation, Schema, Table};
///
/// let schema = Schema::new([
///     Table::new("users")
///         .column(Column::new("Id", DataType::Serial))
///         .primary_key(["Id"])
///         .relation(Relation::multiple("posts", "posts").on("Id", "AuthorId"))
///         .build()?,
///     Table::new("posts")
///         .column(Column::new("Id", DataType::Serial))
///         .column(Column::new("AuthorId", DataType::Integer).not_null())
///         .primary_key(["Id"])
///         .relation(Relation::single("author", "users").on("AuthorId", "Id"))
///         .build()?,
/// ])?;
/// let (rel, target) = schema.relation("posts", "author")?;
/// assert_eq!(target.name(), "users");
/// assert!(rel.is_single());
/// # Ok::<(), riptide::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct Schema {
    tables: BTreeMap<String, TableDef>,
}

impl Schema {
    /// Assemble tables into a schema.
    ///
    /// # Errors
    ///
    /// - `Error::InvalidDefinition` if two tables share a name, a relation
    ///   pairs columns of incompatible types, or `SET NULL` targets a
    ///   non-nullable column
    /// - `Error::UnknownTable` if a relation targets a table not in the set
    /// - `Error::UnknownColumn` if a relation maps to a missing target column
    pub fn new(tables: impl IntoIterator<Item = TableDef>) -> Result<Self> {
        let mut map = BTreeMap::new();
        for table in tables {
            let name = table.name().to_string();
            if map.insert(name.clone(), table).is_some() {
                return Err(Error::InvalidDefinition {
                    table: name,
                    detail: "table is declared twice".to_string(),
                });
            }
        }
        let schema = Self { tables: map };
        for table in schema.tables.values() {
            for rel in table.relations() {
                schema.check_relation(table, rel)?;
            }
        }
        Ok(schema)
    }

    fn check_relation(&self, table: &TableDef, rel: &Relation) -> Result<()> {
        let target = self.table(rel.target())?;
        let invalid = |detail: String| Error::InvalidDefinition {
            table: table.name().to_string(),
            detail,
        };
        for (local, remote) in rel.mapping() {
            let local_col = table.try_column(local)?;
            let remote_col = target.try_column(remote)?;
            if key_family(local_col.data_type()) != key_family(remote_col.data_type()) {
                return Err(invalid(format!(
                    "relation `{}` pairs {} `{local}` with {} `{}`.`{remote}`",
                    rel.name(),
                    local_col.data_type(),
                    remote_col.data_type(),
                    target.name(),
                )));
            }
            let set_null = rel.update_action() == ReferentialAction::SetNull
                || rel.delete_action() == ReferentialAction::SetNull;
            if rel.cardinality() == Cardinality::Single && set_null && !local_col.is_nullable() {
                return Err(invalid(format!(
                    "relation `{}` uses SET NULL but `{local}` is not nullable",
                    rel.name()
                )));
            }
        }
        Ok(())
    }

    /// Look up a table, failing with `Error::UnknownTable`
    pub fn table(&self, name: &str) -> Result<&TableDef> {
        self.tables.get(name).ok_or_else(|| Error::UnknownTable {
            table: name.to_string(),
        })
    }

    pub fn get(&self, name: &str) -> Option<&TableDef> {
        self.tables.get(name)
    }

    /// Tables ordered by name
    pub fn tables(&self) -> impl Iterator<Item = &TableDef> {
        self.tables.values()
    }

    /// Resolve `relation` on `table` to the relation and its target table
    pub fn relation(&self, table: &str, relation: &str) -> Result<(&Relation, &TableDef)> {
        let rel = self.table(table)?.try_relation(relation)?;
        Ok((rel, self.table(rel.target())?))
    }
}

/// Key columns pair across serial and plain integer types
fn key_family(data_type: DataType) -> TypeFamily {
    match data_type.family() {
        TypeFamily::Serial => TypeFamily::Integer,
        family => family,
    }
}
