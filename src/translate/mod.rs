//! Translator.
//!
//! [`Translator::translate`] renders a [`Query`] into a [`Statement`]: text
//! for one dialect plus the ordered parameter list its placeholders refer
//! to. Rendering is a pure function of the descriptor and the dialect's
//! [`Capabilities`]; the same input always yields byte-identical output.
//!
//! One generic renderer covers the common SQL subset. The few steps where a
//! dialect's syntax genuinely diverges (cast targets, `BEGIN`, `ILIKE`,
//! partitioning) match on the [`Dialect`] tag, and the document target has
//! its own renderer that builds JSON commands.
//!
//! # Examples
//!
//! ```
//! use riptide::dialect::Capabilities;
//! use riptide::model::{Column, DataType, Schema, Table};
//! use riptide::query::Select;
//! use riptide::translate::Translator;
//! use riptide::Value;
//!
//! let schema = Schema::new([Table::new("users")
//!     .column(Column::new("Id", DataType::Serial))
//!     .column(Column::new("Age", DataType::Integer))
//!     .primary_key(["Id"])
//!     .build()?])?;
//! let users = schema.table("users")?;
//!
//! let select = Select::new(&schema, "users")?
//!     .column("Id")?
//!     .filter(users.col("Age")?.gte(18)?)?;
//!
//! let pg = Capabilities::postgres();
//! let statement = Translator::new(&pg).translate(&select.into())?;
//! assert_eq!(
//!     statement.sql(),
//!     "SELECT \"users\".\"Id\" AS \"Id\" FROM \"users\" WHERE \"users\".\"Age\" >= $1"
//! );
//! assert_eq!(statement.params(), &[Value::Int(18)]);
//! # Ok::<(), riptide::Error>(())
//! ```

mod ddl;
mod document;
mod filter;
mod mutation;
mod raw;
mod select;
mod transaction;
mod writer;

use crate::dialect::{Capabilities, Dialect};
use crate::error::Result;
use crate::query::{Query, QueryKind};
use crate::value::{to_sea_values, Value};

/// Rendered query text and its positional parameters
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    dialect: Dialect,
    kind: QueryKind,
    sql: String,
    params: Vec<Value>,
}

impl Statement {
    pub(crate) fn new(dialect: Dialect, kind: QueryKind, sql: String, params: Vec<Value>) -> Self {
        Self {
            dialect,
            kind,
            sql,
            params,
        }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn kind(&self) -> QueryKind {
        self.kind
    }

    /// SQL text, or a JSON command document for [`Dialect::Document`]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Parameters in placeholder order
    pub fn params(&self) -> &[Value] {
        &self.params
    }

    /// Parameters as `sea_query::Values`, for drivers built on sea-query's value stack
    pub fn sea_values(&self) -> sea_query::Values {
        to_sea_values(&self.params)
    }

    pub fn into_parts(self) -> (String, Vec<Value>) {
        (self.sql, self.params)
    }
}

/// Renders query descriptors for one dialect
///
/// Holds only a reference to the dialect's capability record; it is `Copy`
/// and can be shared freely across threads.
#[derive(Debug, Clone, Copy)]
pub struct Translator<'c> {
    caps: &'c Capabilities,
    max_parameters: Option<usize>,
}

impl<'c> Translator<'c> {
    pub fn new(caps: &'c Capabilities) -> Self {
        Self {
            caps,
            max_parameters: None,
        }
    }

    /// Cap the number of bound parameters below the dialect's own limit
    pub fn with_max_parameters(mut self, limit: usize) -> Self {
        self.max_parameters = Some(limit);
        self
    }

    pub fn capabilities(&self) -> &'c Capabilities {
        self.caps
    }

    pub fn dialect(&self) -> Dialect {
        self.caps.dialect()
    }

    /// Effective parameter limit: the tighter of the dialect's and the configured cap
    pub fn parameter_limit(&self) -> Option<usize> {
        match (self.caps.max_parameters(), self.max_parameters) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Render `query` for this translator's dialect.
    ///
    /// # Errors
    ///
    /// - `Error::UnsupportedCapability` when the query needs a feature the
    ///   dialect does not have
    /// - `Error::UnsupportedDataType` for a type with no mapping on the dialect
    /// - `Error::UnknownGenerator` / `Error::UnresolvedGenerator` for generator
    ///   references the dialect cannot evaluate and the caller did not resolve
    /// - `Error::UnboundParameter` for a raw query placeholder with no value
    /// - `Error::ParameterLimit` when the statement binds too many parameters
    /// - `Error::InvalidDefinition` for descriptors that are complete only at
    ///   translation time (an update with no assignments, a view binding
    ///   parameters)
    pub fn translate(&self, query: &Query<'_>) -> Result<Statement> {
        let kind = query.kind();
        let (sql, params) = if self.caps.dialect().is_relational() {
            match query {
                Query::Select(q) => select::render(self.caps, q)?,
                Query::Insert(q) => mutation::render_insert(self.caps, q)?,
                Query::Update(q) => mutation::render_update(self.caps, q)?,
                Query::Delete(q) => mutation::render_delete(self.caps, q)?,
                Query::Raw(q) => raw::render(self.caps, q)?,
                Query::Transaction(q) => transaction::render(self.caps, q)?,
                Query::CreateTable(q) => ddl::render_create_table(self.caps, q)?,
                Query::DropTable(q) => ddl::render_drop_table(self.caps, q)?,
                Query::CreateView(q) => ddl::render_create_view(self.caps, q)?,
            }
        } else {
            document::render(self.caps, query)?
        };

        writer::check_limit(self.caps.dialect(), kind, params.len(), self.parameter_limit())?;
        log::trace!("translated {} for {}: {}", kind, self.caps.dialect(), sql);
        Ok(Statement::new(self.caps.dialect(), kind, sql, params))
    }
}
