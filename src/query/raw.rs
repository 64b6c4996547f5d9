//! Raw SQL with named parameters.

use crate::value::Value;
use std::collections::BTreeMap;

/// Opaque SQL text with `:name` parameters.
///
/// The model is bypassed, but values are still bound as parameters: each
/// `:name` is rewritten into the dialect's placeholder style at translation
/// time, in order of appearance.
///
/// # Examples
///
/// ```
/// use riptide::query::Raw;
///
/// let raw = Raw::new("SELECT * FROM users WHERE \"Age\" >= :min AND \"Age\" < :max")
///     .bind("min", 18)
///     .bind("max", 65);
/// assert_eq!(raw.params().len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Raw {
    sql: String,
    params: BTreeMap<String, Value>,
}

impl Raw {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: BTreeMap::new(),
        }
    }

    /// Bind a value to `:name`; binding the same name again replaces the value
    pub fn bind(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn params(&self) -> &BTreeMap<String, Value> {
        &self.params
    }

    pub fn param(&self, name: &str) -> Option<&Value> {
        self.params.get(name)
    }
}
