//! Crate error type.
//!
//! Every failure the crate can produce is a variant of [`Error`], grouped by
//! the stage that raised it (see [`ErrorOrigin`]). Variants carry the table,
//! column, operator, dialect and query kind needed to act on them without
//! re-parsing SQL text.

use crate::classify::ClassifiedError;
use crate::dialect::{Dialect, Feature};
use crate::model::DataType;
use crate::query::QueryKind;
use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Stage of the pipeline an [`Error`] originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorOrigin {
    /// Constructing the data model, a filter, or a query descriptor
    Build,
    /// Rendering a descriptor for a dialect
    Translation,
    /// Executing rendered SQL through the driver collaborator
    Execution,
    /// Loading configuration
    Configuration,
}

/// Errors raised while building, translating or executing queries.
#[derive(Debug, Error)]
pub enum Error {
    /// An operator or value is not valid for the column's declared type
    #[error("type mismatch on {table}.{column}{}: {detail}", .operator.as_ref().map(|op| format!(" ({op})")).unwrap_or_default())]
    TypeMismatch {
        table: String,
        column: String,
        operator: Option<String>,
        detail: String,
    },

    #[error("unknown column `{column}` on table `{table}`")]
    UnknownColumn { table: String, column: String },

    #[error("unknown table `{table}`")]
    UnknownTable { table: String },

    #[error("unknown relation `{relation}` on table `{table}`")]
    UnknownRelation { table: String, relation: String },

    /// A join alias referenced by a projection, filter or sort does not exist
    #[error("unknown alias `{alias}` in query on `{table}`")]
    UnknownAlias { table: String, alias: String },

    #[error("alias `{alias}` is declared more than once in query on `{table}`")]
    DuplicateAlias { table: String, alias: String },

    /// Page numbers are 1-based and page sizes must be positive
    #[error("invalid paging on `{table}`: page {page}, page size {page_size}")]
    InvalidPaging {
        table: String,
        page: i64,
        page_size: i64,
    },

    /// A `$`-notation filter document is malformed
    #[error("invalid filter on `{table}`: {detail}")]
    InvalidFilter { table: String, detail: String },

    #[error("empty `{combinator}` combinator")]
    EmptyCombinator { combinator: &'static str },

    /// A length/precision modifier or validation rule does not apply to the column type
    #[error("constraint `{constraint}` is not applicable to column `{column}` of type {data_type}")]
    InvalidConstraintPairing {
        column: String,
        constraint: String,
        data_type: DataType,
    },

    #[error("invalid pattern on column `{column}`: {message}")]
    InvalidPattern { column: String, message: String },

    #[error("invalid identifier `{identifier}`")]
    InvalidIdentifier { identifier: String },

    #[error("invalid definition of `{table}`: {detail}")]
    InvalidDefinition { table: String, detail: String },

    /// Rows of a multi-row insert do not share the same column set
    #[error("row {row} of insert into `{table}` does not match the column set of the first row")]
    RowShapeMismatch { table: String, row: usize },

    #[error("missing value for required column `{table}`.`{column}`")]
    MissingValue { table: String, column: String },

    #[error("value for `{table}`.`{column}` fails validation: {rule}")]
    ValidationFailed {
        table: String,
        column: String,
        rule: String,
    },

    #[error("{data_type} has no type mapping for {dialect}{}", .column.as_ref().map(|c| format!(" (column `{c}`)")).unwrap_or_default())]
    UnsupportedDataType {
        dialect: Dialect,
        table: Option<String>,
        column: Option<String>,
        data_type: DataType,
    },

    #[error("{dialect} does not support {feature} ({query_kind} {detail})")]
    UnsupportedCapability {
        dialect: Dialect,
        query_kind: QueryKind,
        feature: Feature,
        detail: String,
    },

    #[error("unknown generator `{name}` for {dialect} (column `{column}`)")]
    UnknownGenerator {
        dialect: Dialect,
        name: String,
        column: String,
    },

    /// A literal-backed generator was not resolved to a value before translation
    #[error("generator `{name}` for column `{column}` must be resolved to a value before translating for {dialect}")]
    UnresolvedGenerator {
        dialect: Dialect,
        name: String,
        column: String,
    },

    #[error("raw query parameter `:{name}` has no bound value")]
    UnboundParameter { name: String },

    #[error("{query_kind} binds {count} parameters, {dialect} allows at most {limit}")]
    ParameterLimit {
        dialect: Dialect,
        query_kind: QueryKind,
        count: usize,
        limit: usize,
    },

    #[error("unknown dialect `{0}`")]
    UnknownDialect(String),

    #[error(transparent)]
    Execution(#[from] ClassifiedError),

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

impl Error {
    /// Stage of the pipeline this error was raised in
    pub fn origin(&self) -> ErrorOrigin {
        match self {
            Error::UnsupportedDataType { .. }
            | Error::UnsupportedCapability { .. }
            | Error::UnknownGenerator { .. }
            | Error::UnresolvedGenerator { .. }
            | Error::UnboundParameter { .. }
            | Error::ParameterLimit { .. } => ErrorOrigin::Translation,
            Error::Execution(_) => ErrorOrigin::Execution,
            Error::Config(_) | Error::UnknownDialect(_) => ErrorOrigin::Configuration,
            _ => ErrorOrigin::Build,
        }
    }

    /// Classified driver error, if this error came from execution
    pub fn classified(&self) -> Option<&ClassifiedError> {
        match self {
            Error::Execution(e) => Some(e),
            _ => None,
        }
    }

    pub(crate) fn unknown_column(table: &str, column: &str) -> Self {
        Error::UnknownColumn {
            table: table.to_string(),
            column: column.to_string(),
        }
    }

    pub(crate) fn type_mismatch(
        table: &str,
        column: &str,
        operator: Option<&str>,
        detail: impl Into<String>,
    ) -> Self {
        Error::TypeMismatch {
            table: table.to_string(),
            column: column.to_string(),
            operator: operator.map(str::to_string),
            detail: detail.into(),
        }
    }

    pub(crate) fn unsupported(
        dialect: Dialect,
        query_kind: QueryKind,
        feature: Feature,
        detail: impl Into<String>,
    ) -> Self {
        Error::UnsupportedCapability {
            dialect,
            query_kind,
            feature,
            detail: detail.into(),
        }
    }
}
