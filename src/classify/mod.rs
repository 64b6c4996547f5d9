//! Error Classifier.
//!
//! Maps an opaque native driver error onto a closed, dialect-independent
//! [`ErrorClass`]. Classification is table-driven per dialect: native codes
//! are matched exactly or by prefix, optionally qualified by a message
//! pattern. An unrecognized code is [`ErrorClass::Unclassified`]; the native
//! error is always kept as the [`source`](std::error::Error::source) of the
//! returned [`ClassifiedError`], untouched.
//!
//! # Examples
//!
//! ```
//! use riptide::classify::{classify_parts, ConstraintKind, ErrorClass, NativeError};
//! use riptide::dialect::Dialect;
//! use riptide::query::QueryKind;
//!
//! let pg = classify_parts(
//!     Dialect::Postgres,
//!     QueryKind::Insert,
//!     Some("users"),
//!     NativeError::new("23505", "duplicate key value violates unique constraint \"users_email_key\""),
//! );
//! let mysql = classify_parts(
//!     Dialect::MySql,
//!     QueryKind::Insert,
//!     Some("users"),
//!     NativeError::new("1062", "Duplicate entry 'a@x.com' for key 'users.email'"),
//! );
//! assert_eq!(pg.class(), ErrorClass::ConstraintViolation(ConstraintKind::Unique));
//! assert_eq!(pg.class(), mysql.class());
//! ```

mod rules;

use crate::dialect::Dialect;
use crate::query::{Query, QueryKind};
use std::fmt;
use thiserror::Error;

/// Kind of integrity constraint that was violated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstraintKind {
    Unique,
    ForeignKey,
    NotNull,
    Check,
    /// Integrity violation the driver did not narrow down
    Other,
}

impl ConstraintKind {
    pub fn name(self) -> &'static str {
        match self {
            ConstraintKind::Unique => "unique",
            ConstraintKind::ForeignKey => "foreign_key",
            ConstraintKind::NotNull => "not_null",
            ConstraintKind::Check => "check",
            ConstraintKind::Other => "other",
        }
    }
}

/// Dialect-independent execution failure class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    ConstraintViolation(ConstraintKind),
    Syntax,
    /// Table or view not found
    MissingRelation,
    MissingColumn,
    Timeout,
    LockWaitTimeout,
    ConnectionLost,
    Unclassified,
}

impl ErrorClass {
    /// Stable snake_case name, used as a metrics attribute
    pub fn name(self) -> &'static str {
        match self {
            ErrorClass::ConstraintViolation(_) => "constraint_violation",
            ErrorClass::Syntax => "syntax_error",
            ErrorClass::MissingRelation => "missing_relation",
            ErrorClass::MissingColumn => "missing_column",
            ErrorClass::Timeout => "timeout",
            ErrorClass::LockWaitTimeout => "lock_wait_timeout",
            ErrorClass::ConnectionLost => "connection_lost",
            ErrorClass::Unclassified => "unclassified",
        }
    }

    pub fn is_constraint_violation(self) -> bool {
        matches!(self, ErrorClass::ConstraintViolation(_))
    }

    /// Failures that may succeed when the same statement is sent again.
    ///
    /// This is a hint for caller retry policies; nothing in this crate retries.
    pub fn is_transient(self) -> bool {
        matches!(
            self,
            ErrorClass::Timeout | ErrorClass::LockWaitTimeout | ErrorClass::ConnectionLost
        )
    }
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorClass::ConstraintViolation(kind) => write!(f, "{} constraint violation", kind.name()),
            other => f.write_str(other.name()),
        }
    }
}

/// Error as reported by a driver: a code (SQLSTATE, error number, result
/// code) and the driver's message. An empty code means the driver gave none.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("[{code}] {message}")]
pub struct NativeError {
    code: String,
    message: String,
}

impl NativeError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Error without a native code, such as a transport failure
    pub fn message_only(message: impl Into<String>) -> Self {
        Self::new("", message)
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Where a classified error happened
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorContext {
    pub dialect: Dialect,
    pub query_kind: QueryKind,
    /// Table named by the native message, else the query's primary table
    pub table: Option<String>,
    /// Column named by the native message
    pub column: Option<String>,
    pub native_code: String,
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.dialect, self.query_kind)?;
        match (&self.table, &self.column) {
            (Some(table), Some(column)) => write!(f, " on {table}.{column}"),
            (Some(table), None) => write!(f, " on {table}"),
            (None, Some(column)) => write!(f, " on column {column}"),
            (None, None) => Ok(()),
        }
    }
}

/// A native error annotated with its class and context
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{class} ({context})")]
pub struct ClassifiedError {
    class: ErrorClass,
    context: ErrorContext,
    #[source]
    native: NativeError,
}

impl ClassifiedError {
    pub fn class(&self) -> ErrorClass {
        self.class
    }

    pub fn context(&self) -> &ErrorContext {
        &self.context
    }

    pub fn native(&self) -> &NativeError {
        &self.native
    }

    pub fn into_native(self) -> NativeError {
        self.native
    }
}

/// Classify a native error raised while executing `query` on `dialect`.
pub fn classify(dialect: Dialect, query: &Query<'_>, native: NativeError) -> ClassifiedError {
    classify_parts(dialect, query.kind(), query.table(), native)
}

/// Classify a native error from its parts, for callers that no longer hold
/// the query descriptor.
pub fn classify_parts(
    dialect: Dialect,
    query_kind: QueryKind,
    table: Option<&str>,
    native: NativeError,
) -> ClassifiedError {
    let rules = rules::for_dialect(dialect);
    let class = rules.class_of(&native);
    let (named_table, column) = rules.names_in(native.message());
    if class == ErrorClass::Unclassified {
        log::debug!(
            "unclassified {dialect} error code `{}`: {}",
            native.code(),
            native.message()
        );
    }
    ClassifiedError {
        class,
        context: ErrorContext {
            dialect,
            query_kind,
            table: named_table.or_else(|| table.map(str::to_string)),
            column,
            native_code: native.code().to_string(),
        },
        native,
    }
}
