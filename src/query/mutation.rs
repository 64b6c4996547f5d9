//! Insert, Update and Delete descriptors.
//!
//! Written values are coerced and validated against their column when they
//! are added, so a descriptor that was built successfully only fails
//! translation for dialect reasons (unsupported capabilities, unknown or
//! unresolved generators, parameter limits).

use super::select::check_filter_table;
use super::QueryKind;
use crate::dialect::{Capabilities, GeneratorSource};
use crate::error::{Error, Result};
use crate::filter::Filter;
use crate::generator::GeneratorProvider;
use crate::model::ident::validate_identifier;
use crate::model::{ColumnDef, DefaultValue, TableDef};
use crate::value::Value;

/// Value written to a column
#[derive(Debug, Clone, PartialEq)]
pub enum Assignment {
    Value(Value),
    /// Named generator; a dialect keyword or a value the caller resolves
    /// with [`Query::resolve_generators`](super::Query::resolve_generators)
    Generator(String),
}

/// Column -> value mapping for one written row
///
/// # Examples
///
/// ```
/// use riptide::query::Row;
///
/// let row = Row::new().set("Name", "Grace").set("Email", "g@x.com").generate("Id", "uuid");
/// assert_eq!(row.len(), 3);
///
/// let same: Row = [("Name", "Grace"), ("Email", "g@x.com")].into_iter().collect();
/// assert_eq!(same.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    values: Vec<(String, Assignment)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a value, replacing any earlier assignment to the column
    pub fn set(self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.assign(column.into(), Assignment::Value(value.into()))
    }

    /// Fill the column from the named generator
    pub fn generate(self, column: impl Into<String>, generator: impl Into<String>) -> Self {
        self.assign(column.into(), Assignment::Generator(generator.into()))
    }

    fn assign(mut self, column: String, assignment: Assignment) -> Self {
        match self.values.iter_mut().find(|(c, _)| *c == column) {
            Some((_, slot)) => *slot = assignment,
            None => self.values.push((column, assignment)),
        }
        self
    }

    /// Row from a JSON object; other JSON values yield `None`
    pub fn from_json(document: &serde_json::Value) -> Option<Self> {
        let object = document.as_object()?;
        Some(
            object
                .iter()
                .fold(Row::new(), |row, (k, v)| row.set(k.as_str(), Value::from_json(v))),
        )
    }

    pub fn get(&self, column: &str) -> Option<&Assignment> {
        self.values.iter().find(|(c, _)| c == column).map(|(_, a)| a)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Assignment)> {
        self.values.iter().map(|(c, a)| (c.as_str(), a))
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        iter.into_iter().fold(Row::new(), |row, (k, v)| row.set(k, v))
    }
}

/// Resolve a written column, with relation names reported as such
fn writable_column<'t>(table: &'t TableDef, column: &str) -> Result<&'t ColumnDef> {
    match table.column(column) {
        Some(def) => Ok(def),
        None => match table.relation(column) {
            Some(rel) => Err(Error::InvalidDefinition {
                table: table.name().to_string(),
                detail: format!(
                    "relation `{}` cannot be written directly; set its key columns instead",
                    rel.name()
                ),
            }),
            None => Err(Error::unknown_column(table.name(), column)),
        },
    }
}

fn check_assignment(table: &TableDef, column: &ColumnDef, assignment: Assignment) -> Result<Assignment> {
    match assignment {
        Assignment::Value(v) => Ok(Assignment::Value(column.check_value(table.name(), v)?)),
        Assignment::Generator(name) => {
            validate_identifier(&name)?;
            Ok(Assignment::Generator(name))
        }
    }
}

/// Value for a literal-backed generator, or `None` if the dialect evaluates it
fn generate(
    caps: &Capabilities,
    provider: &dyn GeneratorProvider,
    table: &TableDef,
    column: &ColumnDef,
    name: &str,
) -> Result<Option<Value>> {
    let unknown = || Error::UnknownGenerator {
        dialect: caps.dialect(),
        name: name.to_string(),
        column: column.name().to_string(),
    };
    match caps.generator(name) {
        Some(GeneratorSource::Keyword(_)) => Ok(None),
        Some(GeneratorSource::Literal) => {
            let value = provider.generate(name, column).ok_or_else(unknown)?;
            column.check_value(table.name(), value).map(Some)
        }
        None => Err(unknown()),
    }
}

fn resolve_assignment(
    caps: &Capabilities,
    provider: &dyn GeneratorProvider,
    table: &TableDef,
    column: &ColumnDef,
    assignment: Assignment,
) -> Result<Assignment> {
    match assignment {
        Assignment::Generator(name) => Ok(match generate(caps, provider, table, column, &name)? {
            Some(value) => Assignment::Value(value),
            None => Assignment::Generator(name),
        }),
        value => Ok(value),
    }
}

fn returning_columns<'c>(table: &TableDef, columns: impl IntoIterator<Item = &'c str>) -> Result<Vec<String>> {
    columns
        .into_iter()
        .map(|c| table.try_column(c).map(|def| def.name().to_string()))
        .collect()
}

/// Insert of one or more rows sharing the same column set
#[derive(Debug, Clone)]
pub struct Insert<'m> {
    table: &'m TableDef,
    columns: Vec<String>,
    rows: Vec<Vec<Assignment>>,
    returning: Vec<String>,
}

impl<'m> Insert<'m> {
    pub fn new(table: &'m TableDef) -> Self {
        Self {
            table,
            columns: Vec::new(),
            rows: Vec::new(),
            returning: Vec::new(),
        }
    }

    pub fn table(&self) -> &'m TableDef {
        self.table
    }

    /// Written columns in table declaration order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Rows, each aligned with [`Insert::columns`]
    pub fn rows(&self) -> &[Vec<Assignment>] {
        &self.rows
    }

    pub fn returning_columns(&self) -> &[String] {
        &self.returning
    }

    /// Add a row.
    ///
    /// # Errors
    ///
    /// - `Error::UnknownColumn` for a column the table does not have
    /// - `Error::TypeMismatch` / `Error::ValidationFailed` for a bad value
    /// - `Error::MissingValue` if a column that needs a value is absent
    /// - `Error::RowShapeMismatch` if the column set differs from the first row's
    pub fn row(mut self, row: Row) -> Result<Self> {
        let table = self.table;
        if row.is_empty() {
            return Err(Error::InvalidDefinition {
                table: table.name().to_string(),
                detail: "insert row sets no columns".to_string(),
            });
        }
        let mut cells = Vec::with_capacity(row.len());
        for (column, assignment) in row.values {
            let def = writable_column(table, &column)?;
            let position = table.position(def.name()).unwrap_or(usize::MAX);
            cells.push((position, column, check_assignment(table, def, assignment)?));
        }
        if let Some(missing) = table
            .columns()
            .iter()
            .find(|c| c.needs_value() && !cells.iter().any(|(_, name, _)| name == c.name()))
        {
            return Err(Error::MissingValue {
                table: table.name().to_string(),
                column: missing.name().to_string(),
            });
        }
        cells.sort_by_key(|(position, _, _)| *position);

        let names: Vec<String> = cells.iter().map(|(_, name, _)| name.clone()).collect();
        if self.rows.is_empty() {
            self.columns = names;
        } else if names != self.columns {
            return Err(Error::RowShapeMismatch {
                table: table.name().to_string(),
                row: self.rows.len(),
            });
        }
        self.rows.push(cells.into_iter().map(|(_, _, a)| a).collect());
        Ok(self)
    }

    pub fn rows_from(self, rows: impl IntoIterator<Item = Row>) -> Result<Self> {
        rows.into_iter().try_fold(self, Insert::row)
    }

    /// Columns to return from the inserted rows
    pub fn returning<'c>(mut self, columns: impl IntoIterator<Item = &'c str>) -> Result<Self> {
        self.returning = returning_columns(self.table, columns)?;
        Ok(self)
    }

    /// Omitted columns whose default comes from a generator, in declaration order
    pub fn generated_defaults(&self) -> impl Iterator<Item = (&'m ColumnDef, &'m str)> + '_ {
        let table = self.table;
        table.columns().iter().filter_map(move |c| match c.default_value() {
            Some(DefaultValue::Generator(name)) if !self.columns.iter().any(|w| w == c.name()) => {
                Some((c, name.as_str()))
            }
            _ => None,
        })
    }

    pub(crate) fn resolve_generators(mut self, caps: &Capabilities, provider: &dyn GeneratorProvider) -> Result<Self> {
        let table = self.table;
        for row in &mut self.rows {
            for (column, cell) in self.columns.iter().zip(row.iter_mut()) {
                let def = table.try_column(column)?;
                let current = std::mem::replace(cell, Assignment::Value(Value::Null));
                *cell = resolve_assignment(caps, provider, table, def, current)?;
            }
        }

        let literal_defaults: Vec<(&ColumnDef, &str)> = self
            .generated_defaults()
            .filter(|(_, name)| matches!(caps.generator(name), Some(GeneratorSource::Literal) | None))
            .collect();
        for (def, name) in literal_defaults {
            let position = table.position(def.name()).unwrap_or(usize::MAX);
            let index = self
                .columns
                .iter()
                .position(|c| table.position(c).unwrap_or(usize::MAX) > position)
                .unwrap_or(self.columns.len());
            let mut generated = Vec::with_capacity(self.rows.len());
            for _ in &self.rows {
                match generate(caps, provider, table, def, name)? {
                    Some(value) => generated.push(Assignment::Value(value)),
                    None => generated.push(Assignment::Generator(name.to_string())),
                }
            }
            self.columns.insert(index, def.name().to_string());
            for (row, cell) in self.rows.iter_mut().zip(generated) {
                row.insert(index, cell);
            }
        }
        Ok(self)
    }
}

/// Update of the rows matching an optional filter
#[derive(Debug, Clone)]
pub struct Update<'m> {
    table: &'m TableDef,
    assignments: Vec<(String, Assignment)>,
    filter: Option<Filter>,
    returning: Vec<String>,
}

impl<'m> Update<'m> {
    pub fn new(table: &'m TableDef) -> Self {
        Self {
            table,
            assignments: Vec::new(),
            filter: None,
            returning: Vec::new(),
        }
    }

    pub fn table(&self) -> &'m TableDef {
        self.table
    }

    /// Assignments in table declaration order
    pub fn assignments(&self) -> &[(String, Assignment)] {
        &self.assignments
    }

    pub fn filter_expr(&self) -> Option<&Filter> {
        self.filter.as_ref()
    }

    pub fn returning_columns(&self) -> &[String] {
        &self.returning
    }

    fn assign(mut self, column: &str, assignment: Assignment) -> Result<Self> {
        let table = self.table;
        let def = writable_column(table, column)?;
        let assignment = check_assignment(table, def, assignment)?;
        match self.assignments.iter_mut().find(|(c, _)| c == def.name()) {
            Some((_, slot)) => *slot = assignment,
            None => {
                self.assignments.push((def.name().to_string(), assignment));
                self.assignments
                    .sort_by_key(|(c, _)| table.position(c).unwrap_or(usize::MAX));
            }
        }
        Ok(self)
    }

    /// # Errors
    ///
    /// `Error::UnknownColumn`, `Error::TypeMismatch` or `Error::ValidationFailed`.
    pub fn set(self, column: &str, value: impl Into<Value>) -> Result<Self> {
        self.assign(column, Assignment::Value(value.into()))
    }

    pub fn set_generator(self, column: &str, generator: impl Into<String>) -> Result<Self> {
        self.assign(column, Assignment::Generator(generator.into()))
    }

    /// Apply every assignment of `row`
    pub fn set_row(self, row: Row) -> Result<Self> {
        row.values
            .into_iter()
            .try_fold(self, |update, (column, assignment)| update.assign(&column, assignment))
    }

    /// Restrict the updated rows. Calling it again combines filters with `$and`.
    pub fn filter(mut self, filter: Filter) -> Result<Self> {
        check_filter_table(&filter, self.table, QueryKind::Update)?;
        self.filter = Some(match self.filter.take() {
            Some(existing) => existing.and(filter),
            None => filter,
        });
        Ok(self)
    }

    pub fn returning<'c>(mut self, columns: impl IntoIterator<Item = &'c str>) -> Result<Self> {
        self.returning = returning_columns(self.table, columns)?;
        Ok(self)
    }

    pub(crate) fn resolve_generators(mut self, caps: &Capabilities, provider: &dyn GeneratorProvider) -> Result<Self> {
        let table = self.table;
        let assignments = std::mem::take(&mut self.assignments);
        self.assignments = assignments
            .into_iter()
            .map(|(column, assignment)| -> Result<(String, Assignment)> {
                let def = table.try_column(&column)?;
                Ok((column, resolve_assignment(caps, provider, table, def, assignment)?))
            })
            .collect::<Result<_>>()?;
        Ok(self)
    }
}

/// Delete of the rows matching an optional filter
#[derive(Debug, Clone)]
pub struct Delete<'m> {
    table: &'m TableDef,
    filter: Option<Filter>,
    returning: Vec<String>,
}

impl<'m> Delete<'m> {
    pub fn new(table: &'m TableDef) -> Self {
        Self {
            table,
            filter: None,
            returning: Vec::new(),
        }
    }

    pub fn table(&self) -> &'m TableDef {
        self.table
    }

    pub fn filter_expr(&self) -> Option<&Filter> {
        self.filter.as_ref()
    }

    pub fn returning_columns(&self) -> &[String] {
        &self.returning
    }

    pub fn filter(mut self, filter: Filter) -> Result<Self> {
        check_filter_table(&filter, self.table, QueryKind::Delete)?;
        self.filter = Some(match self.filter.take() {
            Some(existing) => existing.and(filter),
            None => filter,
        });
        Ok(self)
    }

    pub fn returning<'c>(mut self, columns: impl IntoIterator<Item = &'c str>) -> Result<Self> {
        self.returning = returning_columns(self.table, columns)?;
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::StandardGenerators;
    use crate::model::{Column, DataType, Relation, Table};

    fn users() -> TableDef {
        Table::new("users")
            .column(Column::new("Id", DataType::Serial))
            .column(Column::new("Name", DataType::Varchar).length(40).not_null())
            .column(Column::new("Email", DataType::Varchar))
            .column(Column::new("Token", DataType::Uuid).not_null().default_generator("uuid"))
            .primary_key(["Id"])
            .relation(Relation::multiple("posts", "posts").on("Id", "AuthorId"))
            .build()
            .unwrap()
    }

    fn grace() -> Row {
        Row::new().set("Email", "g@x.com").set("Name", "Grace")
    }

    #[test]
    fn test_columns_follow_declaration_order() {
        let users = users();
        let insert = Insert::new(&users).row(grace()).unwrap();
        assert_eq!(insert.columns(), ["Name", "Email"]);
        assert_eq!(
            insert.rows()[0],
            vec![Assignment::Value("Grace".into()), Assignment::Value("g@x.com".into())]
        );
    }

    #[test]
    fn test_missing_required_value() {
        let users = users();
        let err = Insert::new(&users).row(Row::new().set("Email", "g@x.com")).unwrap_err();
        assert!(matches!(err, Error::MissingValue { ref column, .. } if column == "Name"));
    }

    #[test]
    fn test_row_shape_mismatch() {
        let users = users();
        let err = Insert::new(&users)
            .row(grace())
            .unwrap()
            .row(Row::new().set("Name", "Ada"))
            .unwrap_err();
        assert!(matches!(err, Error::RowShapeMismatch { row: 1, .. }));
    }

    #[test]
    fn test_relation_is_not_writable() {
        let users = users();
        let err = Insert::new(&users).row(grace().set("posts", 1)).unwrap_err();
        assert!(matches!(err, Error::InvalidDefinition { ref detail, .. } if detail.contains("`posts`")));
    }

    #[test]
    fn test_validation_on_write() {
        let users = users();
        let err = Insert::new(&users).row(Row::new().set("Name", "x".repeat(41))).unwrap_err();
        assert!(matches!(err, Error::ValidationFailed { ref column, .. } if column == "Name"));
        let err = Update::new(&users).set("Name", Value::Null).unwrap_err();
        assert!(matches!(err, Error::ValidationFailed { ref rule, .. } if rule == "not null"));
    }

    #[test]
    fn test_resolve_literal_default_on_sqlite() {
        let users = users();
        let insert = Insert::new(&users).row(grace()).unwrap();
        assert_eq!(insert.generated_defaults().count(), 1);

        let resolved = insert
            .clone()
            .resolve_generators(&Capabilities::sqlite(), &StandardGenerators)
            .unwrap();
        assert_eq!(resolved.columns(), ["Name", "Email", "Token"]);
        assert!(matches!(resolved.rows()[0][2], Assignment::Value(Value::Uuid(_))));
        assert_eq!(resolved.generated_defaults().count(), 0);

        // Postgres evaluates uuid defaults itself
        let untouched = insert
            .resolve_generators(&Capabilities::postgres(), &StandardGenerators)
            .unwrap();
        assert_eq!(untouched.columns(), ["Name", "Email"]);
    }

    #[test]
    fn test_unknown_generator() {
        let users = users();
        let insert = Insert::new(&users).row(grace().generate("Email", "sequence")).unwrap();
        let err = insert
            .resolve_generators(&Capabilities::postgres(), &StandardGenerators)
            .unwrap_err();
        assert!(matches!(err, Error::UnknownGenerator { ref name, .. } if name == "sequence"));
    }

    #[test]
    fn test_update_assignments_in_declaration_order() {
        let users = users();
        let update = Update::new(&users)
            .set("Email", "new@x.com")
            .unwrap()
            .set("Name", "Grace")
            .unwrap()
            .set("Email", "newer@x.com")
            .unwrap();
        let cols: Vec<_> = update.assignments().iter().map(|(c, _)| c.as_str()).collect();
        assert_eq!(cols, ["Name", "Email"]);
        assert_eq!(update.assignments()[1].1, Assignment::Value("newer@x.com".into()));
    }

    #[test]
    fn test_returning_checks_columns() {
        let users = users();
        assert!(Delete::new(&users).returning(["Id"]).is_ok());
        assert!(matches!(Delete::new(&users).returning(["Nope"]), Err(Error::UnknownColumn { .. })));
    }

    #[test]
    fn test_row_from_json() {
        let row = Row::from_json(&serde_json::json!({"Name": "Grace", "Email": null})).unwrap();
        assert_eq!(row.get("Email"), Some(&Assignment::Value(Value::Null)));
        assert!(Row::from_json(&serde_json::json!([1, 2])).is_none());
    }
}
