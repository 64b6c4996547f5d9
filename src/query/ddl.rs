//! Schema statements: create/drop table and create view.

use super::Select;
use crate::error::Result;
use crate::model::ident::validate_identifier;
use crate::model::{Schema, TableDef};

/// `CREATE TABLE` from a table definition.
///
/// Built against the schema so foreign keys reference their target under
/// its own namespace.
#[derive(Debug, Clone)]
pub struct CreateTable<'m> {
    schema: &'m Schema,
    table: &'m TableDef,
    if_not_exists: bool,
}

impl<'m> CreateTable<'m> {
    /// # Errors
    ///
    /// `Error::UnknownTable` if `table` is not in `schema`
    pub fn new(schema: &'m Schema, table: &str) -> Result<Self> {
        Ok(Self {
            schema,
            table: schema.table(table)?,
            if_not_exists: false,
        })
    }

    pub fn if_not_exists(mut self) -> Self {
        self.if_not_exists = true;
        self
    }

    pub fn table(&self) -> &'m TableDef {
        self.table
    }

    pub fn schema(&self) -> &'m Schema {
        self.schema
    }

    pub fn is_if_not_exists(&self) -> bool {
        self.if_not_exists
    }
}

/// `DROP TABLE`
#[derive(Debug, Clone)]
pub struct DropTable<'m> {
    table: &'m TableDef,
    if_exists: bool,
    cascade: bool,
}

impl<'m> DropTable<'m> {
    pub fn new(table: &'m TableDef) -> Self {
        Self {
            table,
            if_exists: false,
            cascade: false,
        }
    }

    pub fn if_exists(mut self) -> Self {
        self.if_exists = true;
        self
    }

    /// Also drop dependent objects; needs the `Cascade` capability
    pub fn cascade(mut self) -> Self {
        self.cascade = true;
        self
    }

    pub fn table(&self) -> &'m TableDef {
        self.table
    }

    pub fn is_if_exists(&self) -> bool {
        self.if_exists
    }

    pub fn is_cascade(&self) -> bool {
        self.cascade
    }
}

/// `CREATE VIEW` over a select.
///
/// Views cannot bind parameters, so the select must not contain literals
/// (filters or paging); translation fails otherwise.
#[derive(Debug, Clone)]
pub struct CreateView<'m> {
    name: String,
    select: Select<'m>,
    materialized: bool,
    or_replace: bool,
}

impl<'m> CreateView<'m> {
    /// # Errors
    ///
    /// Returns `Error::InvalidIdentifier` for a malformed view name.
    pub fn new(name: impl Into<String>, select: Select<'m>) -> Result<Self> {
        let name = name.into();
        validate_identifier(&name)?;
        Ok(Self {
            name,
            select,
            materialized: false,
            or_replace: false,
        })
    }

    /// Needs the `MaterializedViews` capability
    pub fn materialized(mut self) -> Self {
        self.materialized = true;
        self
    }

    pub fn or_replace(mut self) -> Self {
        self.or_replace = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn select(&self) -> &Select<'m> {
        &self.select
    }

    pub fn is_materialized(&self) -> bool {
        self.materialized
    }

    pub fn is_or_replace(&self) -> bool {
        self.or_replace
    }
}
