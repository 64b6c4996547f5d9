//! Transaction control rendering.

use super::writer::SqlWriter;
use crate::dialect::{Capabilities, Dialect, Feature};
use crate::error::Result;
use crate::query::{QueryKind, Transaction};
use crate::value::Value;

pub(crate) fn render(caps: &Capabilities, txn: &Transaction) -> Result<(String, Vec<Value>)> {
    let mut w = SqlWriter::new(caps, QueryKind::Transaction);
    w.require(Feature::Transactions, "control statement")?;
    if let Some(name) = txn.savepoint_name() {
        w.require(Feature::Savepoints, format!("savepoint `{name}`"))?;
    }

    match txn {
        Transaction::Begin(level) => {
            w.push(match w.dialect() {
                Dialect::MySql => "START TRANSACTION",
                _ => "BEGIN",
            });
            if let Some(level) = level {
                w.require(
                    Feature::TransactionIsolation,
                    format!("BEGIN at {}", level.sql()),
                )?;
                w.push(" TRANSACTION ISOLATION LEVEL ");
                w.push(level.sql());
            }
        }
        Transaction::Commit => w.push("COMMIT"),
        Transaction::Rollback => w.push("ROLLBACK"),
        Transaction::Savepoint(name) => {
            w.push("SAVEPOINT ");
            w.ident(name);
        }
        Transaction::ReleaseSavepoint(name) => {
            w.push("RELEASE SAVEPOINT ");
            w.ident(name);
        }
        Transaction::RollbackToSavepoint(name) => {
            w.push("ROLLBACK TO SAVEPOINT ");
            w.ident(name);
        }
    }
    Ok(w.finish())
}
