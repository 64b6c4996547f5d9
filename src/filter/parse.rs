//! `$`-notation filter documents.
//!
//! ```text
//! { "Age": { "$gte": 18, "$lt": 65 }, "Name": "Grace" }
//! { "$or": [ { "Active": true }, { "Role": { "$in": ["admin", "owner"] } } ] }
//! { "author": { "Name": { "$startsWith": "Gr" } } }
//! ```
//!
//! Sibling keys combine with an implicit `$and` in document order. A key
//! naming a relation nests a filter over the relation's target table.

use super::{ColumnFilter, Filter};
use crate::error::{Error, Result};
use crate::model::{Schema, TableDef};
use crate::value::Value;
use serde_json::{Map, Value as Json};

impl Filter {
    /// Parse a `$`-notation filter against `table`.
    ///
    /// # Errors
    ///
    /// - `Error::UnknownTable` / `Error::UnknownColumn` for names that do not
    ///   resolve (a key that is neither a column nor a relation is reported as
    ///   an unknown column)
    /// - `Error::TypeMismatch` for an operator or operand invalid for the column
    /// - `Error::EmptyCombinator` for `{}` or an empty `$and`/`$or`
    /// - `Error::InvalidFilter` for malformed documents or unknown operators
    ///
    /// # Examples
    ///
    /// ```
    /// use riptide::filter::Filter;
    /// use riptide::model::{Column, DataType, Schema, Table};
    /// use serde_json::json;
    ///
    /// let schema = Schema::new([Table::new("users")
    ///     .column(Column::new("Age", DataType::Integer))
    ///     .build()?])?;
    /// let filter = Filter::parse(&schema, "users", &json!({"Age": {"$gte": 18, "$lt": 65}}))?;
    /// assert_eq!(filter.leaf_count(), 2);
    /// # Ok::<(), riptide::Error>(())
    /// ```
    pub fn parse(schema: &Schema, table: &str, document: &Json) -> Result<Filter> {
        Parser { schema }.document(schema.table(table)?, document)
    }
}

struct Parser<'s> {
    schema: &'s Schema,
}

impl<'s> Parser<'s> {
    fn invalid(table: &TableDef, detail: impl Into<String>) -> Error {
        Error::InvalidFilter {
            table: table.name().to_string(),
            detail: detail.into(),
        }
    }

    fn document(&self, table: &TableDef, document: &Json) -> Result<Filter> {
        match document {
            Json::Object(entries) => self.entries(table, entries, "$and"),
            other => Err(Self::invalid(table, format!("expected an object, found {other}"))),
        }
    }

    fn entries(&self, table: &TableDef, entries: &Map<String, Json>, combinator: &'static str) -> Result<Filter> {
        let children = entries
            .iter()
            .map(|(key, value)| self.entry(table, key, value))
            .collect::<Result<Vec<_>>>()?;
        if children.is_empty() {
            return Err(Error::EmptyCombinator { combinator });
        }
        if combinator == "$or" {
            Filter::any(children)
        } else {
            Filter::all(children)
        }
    }

    fn entry(&self, table: &TableDef, key: &str, value: &Json) -> Result<Filter> {
        match key {
            "$and" => self.combinator(table, value, "$and"),
            "$or" => self.combinator(table, value, "$or"),
            k if k.starts_with('$') => Err(Self::invalid(table, format!("unexpected operator `{k}` at filter level"))),
            k if table.column(k).is_some() => self.column(table.col(k)?, value),
            k if table.relation(k).is_some() => {
                let (rel, target) = self.schema.relation(table.name(), k)?;
                let inner = self.document(target, value)?;
                Filter::related(self.schema, table.name(), rel.name(), inner)
            }
            k => Err(Error::unknown_column(table.name(), k)),
        }
    }

    fn combinator(&self, table: &TableDef, value: &Json, combinator: &'static str) -> Result<Filter> {
        match value {
            Json::Array(items) => {
                let children = items
                    .iter()
                    .map(|item| self.document(table, item))
                    .collect::<Result<Vec<_>>>()?;
                if combinator == "$or" {
                    Filter::any(children)
                } else {
                    Filter::all(children)
                }
            }
            Json::Object(entries) => self.entries(table, entries, combinator),
            other => Err(Self::invalid(
                table,
                format!("`{combinator}` expects an array or object, found {other}"),
            )),
        }
    }

    fn column(&self, col: ColumnFilter<'_>, value: &Json) -> Result<Filter> {
        match value {
            Json::Object(ops) if ops.keys().any(|k| k.starts_with('$')) => {
                let children = ops
                    .iter()
                    .map(|(op, operand)| self.operator(&col, op, operand))
                    .collect::<Result<Vec<_>>>()?;
                Filter::all(children)
            }
            scalar => col.eq(Value::from_json(scalar)),
        }
    }

    fn operator(&self, col: &ColumnFilter<'_>, op: &str, operand: &Json) -> Result<Filter> {
        let table = col.table();
        let text = |operand: &Json| -> Result<String> {
            operand
                .as_str()
                .map(str::to_string)
                .ok_or_else(|| Self::invalid(table, format!("`{op}` expects a string")))
        };
        let list = |operand: &Json| -> Result<Vec<Value>> {
            operand
                .as_array()
                .map(|items| items.iter().map(Value::from_json).collect())
                .ok_or_else(|| Self::invalid(table, format!("`{op}` expects an array")))
        };
        let scalar = Value::from_json;

        match op {
            "$eq" => col.eq(scalar(operand)),
            "$ne" => col.ne(scalar(operand)),
            "$gt" => col.gt(scalar(operand)),
            "$gte" => col.gte(scalar(operand)),
            "$lt" => col.lt(scalar(operand)),
            "$lte" => col.lte(scalar(operand)),
            "$between" => match list(operand)?.as_slice() {
                [low, high] => col.between(low.clone(), high.clone()),
                _ => Err(Self::invalid(table, "`$between` expects [low, high]")),
            },
            "$in" => col.is_in(list(operand)?),
            "$nin" => col.not_in(list(operand)?),
            "$null" => match operand.as_bool() {
                Some(true) => col.is_null(),
                Some(false) => col.is_not_null(),
                None => Err(Self::invalid(table, "`$null` expects a boolean")),
            },
            "$like" => col.like(text(operand)?),
            "$nlike" => col.not_like(text(operand)?),
            "$ilike" => col.ilike(text(operand)?),
            "$startsWith" => col.starts_with(text(operand)?),
            "$endsWith" => col.ends_with(text(operand)?),
            "$contains" => col.contains(text(operand)?),
            other => Err(Self::invalid(table, format!("unknown operator `{other}`"))),
        }
    }
}
