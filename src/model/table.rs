//! Table definitions.
//!
//! [`Table`] collects columns, keys, relations and the storage layout, and
//! [`Table::build`] checks that everything referenced exists before producing
//! an immutable [`TableDef`]. Relation targets are checked later, when tables
//! are assembled into a [`Schema`](super::Schema).

use super::column::{Column, ColumnDef};
use super::ident::validate_identifier;
use super::relation::Relation;
use crate::error::{Error, Result};
use std::collections::{BTreeMap, BTreeSet};

/// Partitioning scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PartitionStrategy {
    Range,
    List,
    Hash,
}

impl PartitionStrategy {
    pub fn sql(self) -> &'static str {
        match self {
            PartitionStrategy::Range => "RANGE",
            PartitionStrategy::List => "LIST",
            PartitionStrategy::Hash => "HASH",
        }
    }
}

/// Partition descriptor for a table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    strategy: PartitionStrategy,
    columns: Vec<String>,
    partitions: Option<u32>,
}

impl Partition {
    pub fn range<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(PartitionStrategy::Range, columns, None)
    }

    pub fn list<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(PartitionStrategy::List, columns, None)
    }

    /// Hash partitioning into `partitions` buckets
    pub fn hash<I, S>(columns: I, partitions: u32) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(PartitionStrategy::Hash, columns, Some(partitions))
    }

    fn new<I, S>(strategy: PartitionStrategy, columns: I, partitions: Option<u32>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            strategy,
            columns: columns.into_iter().map(Into::into).collect(),
            partitions,
        }
    }

    pub fn strategy(&self) -> PartitionStrategy {
        self.strategy
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn partitions(&self) -> Option<u32> {
        self.partitions
    }
}

/// Distribution key for distributed (sharded) tables
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Distribution {
    columns: Vec<String>,
}

impl Distribution {
    pub fn by<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }
}

/// Named unique key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniqueKey {
    pub name: String,
    pub columns: Vec<String>,
}

/// Validated, immutable table metadata
#[derive(Debug, Clone)]
pub struct TableDef {
    name: String,
    namespace: Option<String>,
    columns: Vec<ColumnDef>,
    index: BTreeMap<String, usize>,
    primary_key: Vec<String>,
    unique_keys: Vec<UniqueKey>,
    relations: Vec<Relation>,
    partition: Option<Partition>,
    distribution: Option<Distribution>,
    comment: Option<String>,
}

impl TableDef {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Schema/namespace the table lives in, if any
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Columns in declaration order
    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.index.get(name).map(|&i| &self.columns[i])
    }

    /// Look up a column, failing with `Error::UnknownColumn`
    pub fn try_column(&self, name: &str) -> Result<&ColumnDef> {
        self.column(name)
            .ok_or_else(|| Error::unknown_column(&self.name, name))
    }

    /// Position of `name` in declaration order
    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn primary_key(&self) -> &[String] {
        &self.primary_key
    }

    pub fn unique_keys(&self) -> &[UniqueKey] {
        &self.unique_keys
    }

    pub fn relations(&self) -> &[Relation] {
        &self.relations
    }

    pub fn relation(&self, name: &str) -> Option<&Relation> {
        self.relations.iter().find(|r| r.name() == name)
    }

    /// Look up a relation, failing with `Error::UnknownRelation`
    pub fn try_relation(&self, name: &str) -> Result<&Relation> {
        self.relation(name).ok_or_else(|| Error::UnknownRelation {
            table: self.name.clone(),
            relation: name.to_string(),
        })
    }

    pub fn partition(&self) -> Option<&Partition> {
        self.partition.as_ref()
    }

    pub fn distribution(&self) -> Option<&Distribution> {
        self.distribution.as_ref()
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }
}

/// Builder for a [`TableDef`]
#[derive(Debug, Clone)]
pub struct Table {
    name: String,
    namespace: Option<String>,
    columns: Vec<Column>,
    primary_key: Vec<String>,
    unique_keys: Vec<UniqueKey>,
    relations: Vec<Relation>,
    partition: Option<Partition>,
    distribution: Option<Distribution>,
    comment: Option<String>,
}

impl Table {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: None,
            columns: Vec::new(),
            primary_key: Vec::new(),
            unique_keys: Vec::new(),
            relations: Vec::new(),
            partition: None,
            distribution: None,
            comment: None,
        }
    }

    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    pub fn primary_key<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.primary_key = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn unique<I, S>(mut self, name: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.unique_keys.push(UniqueKey {
            name: name.into(),
            columns: columns.into_iter().map(Into::into).collect(),
        });
        self
    }

    pub fn relation(mut self, relation: Relation) -> Self {
        self.relations.push(relation);
        self
    }

    pub fn partition(mut self, partition: Partition) -> Self {
        self.partition = Some(partition);
        self
    }

    pub fn distribution(mut self, distribution: Distribution) -> Self {
        self.distribution = Some(distribution);
        self
    }

    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Validate and freeze the definition.
    ///
    /// Primary-key columns are made non-nullable.
    ///
    /// # Errors
    ///
    /// - `Error::InvalidIdentifier` for a malformed table, namespace, column,
    ///   key or relation name
    /// - `Error::InvalidConstraintPairing` / `Error::InvalidPattern` /
    ///   `Error::TypeMismatch` from column validation
    /// - `Error::UnknownColumn` when a key, relation, partition or
    ///   distribution references a missing column
    /// - `Error::InvalidDefinition` for duplicate names, empty keys or an
    ///   empty column list
    pub fn build(self) -> Result<TableDef> {
        let table = self.name;
        validate_identifier(&table)?;
        if let Some(ns) = &self.namespace {
            validate_identifier(ns)?;
        }
        let invalid = |detail: String| Error::InvalidDefinition {
            table: table.clone(),
            detail,
        };
        if self.columns.is_empty() {
            return Err(invalid("a table needs at least one column".to_string()));
        }

        let pk: BTreeSet<&str> = self.primary_key.iter().map(String::as_str).collect();
        if pk.len() != self.primary_key.len() {
            return Err(invalid("primary key repeats a column".to_string()));
        }

        let mut columns = Vec::with_capacity(self.columns.len());
        let mut index = BTreeMap::new();
        for mut column in self.columns {
            if pk.contains(column.name()) {
                column.force_not_null();
            }
            let def = column.build(&table)?;
            if index.insert(def.name().to_string(), columns.len()).is_some() {
                return Err(invalid(format!("column `{}` is declared twice", def.name())));
            }
            columns.push(def);
        }

        let check_columns = |what: &str, names: &[String]| -> Result<()> {
            if names.is_empty() {
                return Err(invalid(format!("{what} has no columns")));
            }
            match names.iter().find(|n| !index.contains_key(n.as_str())) {
                Some(missing) => Err(Error::unknown_column(&table, missing)),
                None => Ok(()),
            }
        };

        if !self.primary_key.is_empty() {
            check_columns("primary key", &self.primary_key)?;
        }

        let mut names = BTreeSet::new();
        for key in &self.unique_keys {
            validate_identifier(&key.name)?;
            if !names.insert(key.name.as_str()) {
                return Err(invalid(format!("constraint `{}` is declared twice", key.name)));
            }
            check_columns(&format!("unique key `{}`", key.name), &key.columns)?;
        }

        let mut relation_names = BTreeSet::new();
        for rel in &self.relations {
            validate_identifier(rel.name())?;
            validate_identifier(rel.target())?;
            if index.contains_key(rel.name()) {
                return Err(invalid(format!("relation `{}` shadows a column", rel.name())));
            }
            if !relation_names.insert(rel.name()) {
                return Err(invalid(format!("relation `{}` is declared twice", rel.name())));
            }
            let locals: Vec<String> = rel.local_columns().map(str::to_string).collect();
            check_columns(&format!("relation `{}`", rel.name()), &locals)?;
        }

        if let Some(partition) = &self.partition {
            check_columns("partition", partition.columns())?;
            if partition.partitions() == Some(0) {
                return Err(invalid("hash partitioning needs at least one partition".to_string()));
            }
        }
        if let Some(distribution) = &self.distribution {
            check_columns("distribution", distribution.columns())?;
        }

        Ok(TableDef {
            name: table,
            namespace: self.namespace,
            columns,
            index,
            primary_key: self.primary_key,
            unique_keys: self.unique_keys,
            relations: self.relations,
            partition: self.partition,
            distribution: self.distribution,
            comment: self.comment,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DataType;

    fn users() -> Table {
        Table::new("users")
            .column(Column::new("Id", DataType::Serial))
            .column(Column::new("Name", DataType::Varchar).length(120).not_null())
            .column(Column::new("Email", DataType::Varchar))
            .primary_key(["Id"])
    }

    #[test]
    fn test_build_preserves_declaration_order() {
        let table = users().build().unwrap();
        let names: Vec<_> = table.columns().iter().map(ColumnDef::name).collect();
        assert_eq!(names, ["Id", "Name", "Email"]);
        assert_eq!(table.position("Email"), Some(2));
    }

    #[test]
    fn test_primary_key_is_not_null() {
        let table = Table::new("tags")
            .column(Column::new("Slug", DataType::Varchar).length(40))
            .primary_key(["Slug"])
            .build()
            .unwrap();
        assert!(!table.column("Slug").unwrap().is_nullable());
    }

    #[test]
    fn test_unknown_key_column() {
        let err = users().unique("users_email_key", ["Mail"]).build().unwrap_err();
        assert!(matches!(
            err,
            Error::UnknownColumn { ref table, ref column } if table == "users" && column == "Mail"
        ));
    }

    #[test]
    fn test_relation_local_columns_must_exist() {
        let err = users()
            .relation(Relation::single("team", "teams").on("TeamId", "Id"))
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::UnknownColumn { ref column, .. } if column == "TeamId"));

        let err = users()
            .relation(Relation::single("team", "teams"))
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::InvalidDefinition { .. }));
    }

    #[test]
    fn test_duplicate_column() {
        let err = users()
            .column(Column::new("Name", DataType::Text))
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::InvalidDefinition { ref detail, .. } if detail.contains("`Name`")));
    }

    #[test]
    fn test_invalid_table_name() {
        assert!(matches!(
            Table::new("users; drop").column(Column::new("Id", DataType::Serial)).build(),
            Err(Error::InvalidIdentifier { .. })
        ));
    }

    #[test]
    fn test_try_lookups() {
        let table = users().build().unwrap();
        assert!(table.try_column("Name").is_ok());
        assert!(matches!(table.try_column("Age"), Err(Error::UnknownColumn { .. })));
        assert!(matches!(table.try_relation("posts"), Err(Error::UnknownRelation { .. })));
    }

    #[test]
    fn test_partition_columns_checked() {
        let err = users().partition(Partition::hash(["Region"], 4)).build().unwrap_err();
        assert!(matches!(err, Error::UnknownColumn { ref column, .. } if column == "Region"));
        let table = users().partition(Partition::hash(["Id"], 4)).build().unwrap();
        assert_eq!(table.partition().unwrap().strategy(), PartitionStrategy::Hash);
    }
}
