//! Transaction control statements.

use crate::model::ident::validate_identifier;
use crate::error::Result;

/// Transaction isolation level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IsolationLevel {
    ReadUncommitted,
    ReadCommitted,
    RepeatableRead,
    Serializable,
}

impl IsolationLevel {
    pub fn sql(self) -> &'static str {
        match self {
            IsolationLevel::ReadUncommitted => "READ UNCOMMITTED",
            IsolationLevel::ReadCommitted => "READ COMMITTED",
            IsolationLevel::RepeatableRead => "REPEATABLE READ",
            IsolationLevel::Serializable => "SERIALIZABLE",
        }
    }
}

/// Transaction control statement, rendered per dialect and executed like any
/// other statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transaction {
    /// Start a transaction, optionally at a specific isolation level
    Begin(Option<IsolationLevel>),
    Commit,
    Rollback,
    Savepoint(String),
    ReleaseSavepoint(String),
    RollbackToSavepoint(String),
}

impl Transaction {
    pub fn begin() -> Self {
        Transaction::Begin(None)
    }

    pub fn begin_with(level: IsolationLevel) -> Self {
        Transaction::Begin(Some(level))
    }

    /// # Errors
    ///
    /// Returns `Error::InvalidIdentifier` for a malformed savepoint name.
    pub fn savepoint(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        validate_identifier(&name)?;
        Ok(Transaction::Savepoint(name))
    }

    pub fn release_savepoint(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        validate_identifier(&name)?;
        Ok(Transaction::ReleaseSavepoint(name))
    }

    pub fn rollback_to_savepoint(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        validate_identifier(&name)?;
        Ok(Transaction::RollbackToSavepoint(name))
    }

    /// Savepoint name, for the savepoint statements
    pub fn savepoint_name(&self) -> Option<&str> {
        match self {
            Transaction::Savepoint(name)
            | Transaction::ReleaseSavepoint(name)
            | Transaction::RollbackToSavepoint(name) => Some(name),
            _ => None,
        }
    }
}
