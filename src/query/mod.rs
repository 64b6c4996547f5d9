//! Query Descriptor.
//!
//! A [`Query`] is the dialect-independent description of one database
//! operation. Descriptors borrow the [`Schema`](crate::model::Schema) they
//! were built against, are validated while being built, and are consumed by
//! one [`Translator`](crate::translate::Translator) call.

mod ddl;
mod mutation;
mod raw;
mod select;
mod transaction;

pub use ddl::{CreateTable, CreateView, DropTable};
pub use mutation::{Assignment, Delete, Insert, Row, Update};
pub use raw::Raw;
pub use select::{
    Aggregate, AggregateFn, Join, JoinClause, JoinKind, OrderBy, Page, Projection, ProjectionExpr,
    Select, SortDirection, SortTarget,
};
pub use transaction::{IsolationLevel, Transaction};

use crate::dialect::Capabilities;
use crate::error::Result;
use crate::generator::GeneratorProvider;
use std::fmt;

/// Discriminant of a [`Query`], carried by errors and events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum QueryKind {
    Select,
    Insert,
    Update,
    Delete,
    Raw,
    Transaction,
    CreateTable,
    DropTable,
    CreateView,
}

impl QueryKind {
    pub fn name(self) -> &'static str {
        match self {
            QueryKind::Select => "select",
            QueryKind::Insert => "insert",
            QueryKind::Update => "update",
            QueryKind::Delete => "delete",
            QueryKind::Raw => "raw",
            QueryKind::Transaction => "transaction",
            QueryKind::CreateTable => "create table",
            QueryKind::DropTable => "drop table",
            QueryKind::CreateView => "create view",
        }
    }
}

impl fmt::Display for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One database operation
#[derive(Debug, Clone)]
pub enum Query<'m> {
    Select(Select<'m>),
    Insert(Insert<'m>),
    Update(Update<'m>),
    Delete(Delete<'m>),
    Raw(Raw),
    Transaction(Transaction),
    CreateTable(CreateTable<'m>),
    DropTable(DropTable<'m>),
    CreateView(CreateView<'m>),
}

impl<'m> Query<'m> {
    pub fn kind(&self) -> QueryKind {
        match self {
            Query::Select(_) => QueryKind::Select,
            Query::Insert(_) => QueryKind::Insert,
            Query::Update(_) => QueryKind::Update,
            Query::Delete(_) => QueryKind::Delete,
            Query::Raw(_) => QueryKind::Raw,
            Query::Transaction(_) => QueryKind::Transaction,
            Query::CreateTable(_) => QueryKind::CreateTable,
            Query::DropTable(_) => QueryKind::DropTable,
            Query::CreateView(_) => QueryKind::CreateView,
        }
    }

    /// Primary table the query operates on, if it has one
    pub fn table(&self) -> Option<&str> {
        match self {
            Query::Select(q) => Some(q.table().name()),
            Query::Insert(q) => Some(q.table().name()),
            Query::Update(q) => Some(q.table().name()),
            Query::Delete(q) => Some(q.table().name()),
            Query::CreateTable(q) => Some(q.table().name()),
            Query::DropTable(q) => Some(q.table().name()),
            Query::CreateView(q) => Some(q.name()),
            Query::Raw(_) | Query::Transaction(_) => None,
        }
    }

    /// Replace generator references whose value the caller must compute
    /// (`GeneratorSource::Literal` on this dialect) with values from `provider`.
    ///
    /// Only Insert and Update carry generator references; other queries are
    /// returned unchanged.
    ///
    /// # Errors
    ///
    /// Returns `Error::UnknownGenerator` if the dialect or the provider does
    /// not know a referenced generator, and `Error::ValidationFailed` /
    /// `Error::TypeMismatch` if a generated value does not fit its column.
    pub fn resolve_generators(self, caps: &Capabilities, provider: &dyn GeneratorProvider) -> Result<Self> {
        Ok(match self {
            Query::Insert(q) => Query::Insert(q.resolve_generators(caps, provider)?),
            Query::Update(q) => Query::Update(q.resolve_generators(caps, provider)?),
            other => other,
        })
    }
}

macro_rules! impl_from_query {
    ($($variant:ident),*) => {
        $(impl<'m> From<$variant<'m>> for Query<'m> {
            fn from(q: $variant<'m>) -> Self {
                Query::$variant(q)
            }
        })*
    };
}

impl_from_query!(Select, Insert, Update, Delete, CreateTable, DropTable, CreateView);

impl From<Raw> for Query<'_> {
    fn from(q: Raw) -> Self {
        Query::Raw(q)
    }
}

impl From<Transaction> for Query<'_> {
    fn from(q: Transaction) -> Self {
        Query::Transaction(q)
    }
}
