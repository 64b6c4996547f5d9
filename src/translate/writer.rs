//! SQL text buffer that owns the parameter list.
//!
//! Every literal goes through [`SqlWriter::param`], which appends the value
//! and emits its placeholder in the same step, so placeholder position and
//! parameter position cannot drift apart.

use crate::dialect::{Capabilities, Dialect, Feature};
use crate::error::{Error, Result};
use crate::model::TableDef;
use crate::query::QueryKind;
use crate::value::Value;

pub(crate) struct SqlWriter<'c> {
    caps: &'c Capabilities,
    kind: QueryKind,
    sql: String,
    params: Vec<Value>,
    subqueries: usize,
}

impl<'c> SqlWriter<'c> {
    pub(crate) fn new(caps: &'c Capabilities, kind: QueryKind) -> Self {
        Self {
            caps,
            kind,
            sql: String::with_capacity(128),
            params: Vec::new(),
            subqueries: 0,
        }
    }

    pub(crate) fn caps(&self) -> &'c Capabilities {
        self.caps
    }

    pub(crate) fn dialect(&self) -> Dialect {
        self.caps.dialect()
    }

    pub(crate) fn kind(&self) -> QueryKind {
        self.kind
    }

    pub(crate) fn push(&mut self, text: &str) {
        self.sql.push_str(text);
    }

    pub(crate) fn ident(&mut self, name: &str) {
        let quoted = self.caps.quote_identifier(name);
        self.sql.push_str(&quoted);
    }

    /// `"source"."column"`
    pub(crate) fn qualified(&mut self, source: &str, column: &str) {
        self.ident(source);
        self.sql.push('.');
        self.ident(column);
    }

    /// Table name, schema-qualified when the table declares a namespace
    pub(crate) fn table(&mut self, table: &TableDef) {
        self.table_name(table.namespace(), table.name());
    }

    pub(crate) fn table_name(&mut self, namespace: Option<&str>, name: &str) {
        if let Some(ns) = namespace {
            self.ident(ns);
            self.sql.push('.');
        }
        self.ident(name);
    }

    /// Bind `value` and emit its placeholder
    pub(crate) fn param(&mut self, value: Value) {
        self.params.push(value);
        let placeholder = self.caps.placeholder_style().placeholder(self.params.len());
        self.sql.push_str(&placeholder);
    }

    /// Emit `items` separated by `sep`
    pub(crate) fn join<T>(
        &mut self,
        items: impl IntoIterator<Item = T>,
        sep: &str,
        mut render: impl FnMut(&mut Self, T) -> Result<()>,
    ) -> Result<()> {
        for (i, item) in items.into_iter().enumerate() {
            if i > 0 {
                self.sql.push_str(sep);
            }
            render(self, item)?;
        }
        Ok(())
    }

    pub(crate) fn require(&self, feature: Feature, detail: impl AsRef<str>) -> Result<()> {
        self.caps.require(feature, self.kind, detail.as_ref())
    }

    /// Fresh alias for a correlated subquery over `relation`
    pub(crate) fn subquery_alias(&mut self, relation: &str) -> String {
        self.subqueries += 1;
        format!("{relation}_{}", self.subqueries)
    }

    pub(crate) fn param_count(&self) -> usize {
        self.params.len()
    }

    pub(crate) fn finish(self) -> (String, Vec<Value>) {
        (self.sql, self.params)
    }
}

pub(crate) fn check_limit(dialect: Dialect, kind: QueryKind, count: usize, limit: Option<usize>) -> Result<()> {
    match limit {
        Some(limit) if count > limit => Err(Error::ParameterLimit {
            dialect,
            query_kind: kind,
            count,
            limit,
        }),
        _ => Ok(()),
    }
}

/// Escape the `LIKE` wildcards and the escape character itself in `text`
pub(crate) fn escape_like(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 4);
    for ch in text.chars() {
        if matches!(ch, '%' | '_' | LIKE_ESCAPE) {
            out.push(LIKE_ESCAPE);
        }
        out.push(ch);
    }
    out
}

pub(crate) const LIKE_ESCAPE: char = '!';

/// String literal for contexts that cannot bind parameters (DDL defaults)
pub(crate) fn string_literal(dialect: Dialect, text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('\'');
    for ch in text.chars() {
        match ch {
            '\'' => out.push_str("''"),
            '\\' if dialect == Dialect::MySql => out.push_str("\\\\"),
            c => out.push(c),
        }
    }
    out.push('\'');
    out
}

/// Inline SQL literal for `value`
pub(crate) fn sql_literal(dialect: Dialect, value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Bool(b) => match (dialect, b) {
            (Dialect::Sqlite, true) => "1".to_string(),
            (Dialect::Sqlite, false) => "0".to_string(),
            (_, true) => "TRUE".to_string(),
            (_, false) => "FALSE".to_string(),
        },
        Value::Int(i) => i.to_string(),
        Value::Float(f) if f.is_finite() => f.to_string(),
        Value::Float(f) => string_literal(dialect, &f.to_string()),
        Value::Decimal(d) => d.to_string(),
        Value::String(s) => string_literal(dialect, s),
        Value::Uuid(u) => string_literal(dialect, &u.to_string()),
        Value::Date(d) => string_literal(dialect, &d.format("%Y-%m-%d").to_string()),
        Value::Time(t) => string_literal(dialect, &t.format("%H:%M:%S%.f").to_string()),
        Value::DateTime(dt) => string_literal(dialect, &dt.format("%Y-%m-%d %H:%M:%S%.f").to_string()),
        Value::Timestamp(ts) => string_literal(dialect, &ts.format("%Y-%m-%d %H:%M:%S%.f%:z").to_string()),
        Value::Json(j) => string_literal(dialect, &j.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_params_and_placeholders_stay_aligned() {
        let pg = Capabilities::postgres();
        let mut w = SqlWriter::new(&pg, QueryKind::Raw);
        w.push("a = ");
        w.param(Value::Int(1));
        w.push(" AND b = ");
        w.param(Value::from("x"));
        let (sql, params) = w.finish();
        assert_eq!(sql, "a = $1 AND b = $2");
        assert_eq!(params, vec![Value::Int(1), Value::from("x")]);
    }

    #[test]
    fn test_table_name_with_namespace() {
        let mysql = Capabilities::mysql();
        let mut w = SqlWriter::new(&mysql, QueryKind::Select);
        w.table_name(Some("app"), "users");
        assert_eq!(w.finish().0, "`app`.`users`");
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("50%_off!"), "50!%!_off!!");
        assert_eq!(escape_like("plain"), "plain");
    }

    #[test]
    fn test_literals() {
        assert_eq!(sql_literal(Dialect::Postgres, &Value::from("O'Brien")), "'O''Brien'");
        assert_eq!(sql_literal(Dialect::MySql, &Value::from("a\\b")), "'a\\\\b'");
        assert_eq!(sql_literal(Dialect::Postgres, &Value::from("a\\b")), "'a\\b'");
        assert_eq!(sql_literal(Dialect::Sqlite, &Value::Bool(true)), "1");
        assert_eq!(sql_literal(Dialect::Postgres, &Value::Bool(false)), "FALSE");
        assert_eq!(sql_literal(Dialect::MySql, &Value::Int(-4)), "-4");
        let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert_eq!(sql_literal(Dialect::Postgres, &Value::Date(date)), "'2024-02-29'");
        assert_eq!(sql_literal(Dialect::Postgres, &Value::Null), "NULL");
    }

    #[test]
    fn test_check_limit() {
        assert!(check_limit(Dialect::Sqlite, QueryKind::Insert, 10, Some(10)).is_ok());
        assert!(check_limit(Dialect::Sqlite, QueryKind::Insert, 11, Some(10)).is_err());
        assert!(check_limit(Dialect::Document, QueryKind::Insert, 1_000_000, None).is_ok());
    }
}
