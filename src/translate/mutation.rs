//! Insert, Update and Delete rendering.

use super::filter;
use super::writer::SqlWriter;
use crate::dialect::{BulkInsert, Capabilities, Feature, GeneratorSource};
use crate::error::{Error, Result};
use crate::filter::Filter;
use crate::model::TableDef;
use crate::query::{Assignment, Delete, Insert, QueryKind, Update};
use crate::value::Value;

/// How one cell of a written row is rendered
enum Cell<'a> {
    Param(&'a Value),
    Expr(&'a str),
}

/// Dialect expression for a generator reference.
///
/// Only keyword-backed generators render inline; literal-backed ones must
/// have been resolved to values with `Query::resolve_generators`.
pub(crate) fn generator_expr<'c>(caps: &'c Capabilities, column: &str, name: &str) -> Result<&'c str> {
    match caps.generator(name) {
        Some(GeneratorSource::Keyword(expr)) => Ok(expr.as_ref()),
        Some(GeneratorSource::Literal) => Err(Error::UnresolvedGenerator {
            dialect: caps.dialect(),
            name: name.to_string(),
            column: column.to_string(),
        }),
        None => Err(Error::UnknownGenerator {
            dialect: caps.dialect(),
            name: name.to_string(),
            column: column.to_string(),
        }),
    }
}

fn cell<'a>(caps: &'a Capabilities, column: &str, assignment: &'a Assignment) -> Result<Cell<'a>> {
    match assignment {
        Assignment::Value(value) => Ok(Cell::Param(value)),
        Assignment::Generator(name) => generator_expr(caps, column, name).map(Cell::Expr),
    }
}

fn write_cell(w: &mut SqlWriter<'_>, cell: &Cell<'_>) {
    match cell {
        Cell::Param(value) => w.param((*value).clone()),
        Cell::Expr(expr) => w.push(expr),
    }
}

fn tuple(w: &mut SqlWriter<'_>, row: &[Cell<'_>]) -> Result<()> {
    w.join(row, ", ", |w, cell| {
        write_cell(w, cell);
        Ok(())
    })
}

fn returning(w: &mut SqlWriter<'_>, table: &TableDef, columns: &[String]) -> Result<()> {
    if columns.is_empty() {
        return Ok(());
    }
    w.require(Feature::Returning, format!("on `{}`", table.name()))?;
    w.push(" RETURNING ");
    w.join(columns, ", ", |w, column| {
        w.ident(column);
        Ok(())
    })
}

fn where_clause(w: &mut SqlWriter<'_>, table: &TableDef, condition: Option<&Filter>) -> Result<()> {
    if let Some(condition) = condition {
        w.push(" WHERE ");
        filter::render(w, condition, table.name(), &[])?;
    }
    Ok(())
}

fn empty(table: &TableDef, detail: &str) -> Error {
    Error::InvalidDefinition {
        table: table.name().to_string(),
        detail: detail.to_string(),
    }
}

/// Column list and rendered cells of an insert, with omitted
/// keyword-backed generator defaults filled in declaration order
fn insert_rows<'a>(caps: &'a Capabilities, insert: &'a Insert<'_>) -> Result<(Vec<&'a str>, Vec<Vec<Cell<'a>>>)> {
    let table = insert.table();
    let mut defaults = Vec::new();
    for (column, name) in insert.generated_defaults() {
        defaults.push((column.name(), generator_expr(caps, column.name(), name)?));
    }

    let mut columns: Vec<&str> = insert.columns().iter().map(String::as_str).collect();
    let mut rows = insert
        .rows()
        .iter()
        .map(|row| {
            columns
                .iter()
                .zip(row)
                .map(|(column, assignment)| cell(caps, column, assignment))
                .collect::<Result<Vec<_>>>()
        })
        .collect::<Result<Vec<_>>>()?;

    for (column, expr) in defaults {
        let position = table.position(column).unwrap_or(usize::MAX);
        let index = columns
            .iter()
            .position(|c| table.position(c).unwrap_or(usize::MAX) > position)
            .unwrap_or(columns.len());
        columns.insert(index, column);
        for row in &mut rows {
            row.insert(index, Cell::Expr(expr));
        }
    }
    Ok((columns, rows))
}

pub(crate) fn render_insert(caps: &Capabilities, insert: &Insert<'_>) -> Result<(String, Vec<Value>)> {
    let table = insert.table();
    if insert.rows().is_empty() {
        return Err(empty(table, "insert has no rows"));
    }
    let (columns, rows) = insert_rows(caps, insert)?;

    let mut w = SqlWriter::new(caps, QueryKind::Insert);
    w.push("INSERT INTO ");
    w.table(table);
    w.push(" (");
    w.join(&columns, ", ", |w, column| {
        w.ident(column);
        Ok(())
    })?;
    w.push(")");

    match caps.bulk_insert() {
        BulkInsert::UnionAll if rows.len() > 1 => {
            w.push(" ");
            w.join(&rows, " UNION ALL ", |w, row| {
                w.push("SELECT ");
                tuple(w, row)
            })?;
        }
        _ => {
            w.push(" VALUES ");
            w.join(&rows, ", ", |w, row| {
                w.push("(");
                tuple(w, row)?;
                w.push(")");
                Ok(())
            })?;
        }
    }
    returning(&mut w, table, insert.returning_columns())?;
    Ok(w.finish())
}

pub(crate) fn render_update(caps: &Capabilities, update: &Update<'_>) -> Result<(String, Vec<Value>)> {
    let table = update.table();
    if update.assignments().is_empty() {
        return Err(empty(table, "update sets no columns"));
    }

    let mut w = SqlWriter::new(caps, QueryKind::Update);
    w.push("UPDATE ");
    w.table(table);
    w.push(" SET ");
    w.join(update.assignments(), ", ", |w, (column, assignment)| {
        let rendered = cell(caps, column, assignment)?;
        w.ident(column);
        w.push(" = ");
        write_cell(w, &rendered);
        Ok(())
    })?;
    where_clause(&mut w, table, update.filter_expr())?;
    returning(&mut w, table, update.returning_columns())?;
    Ok(w.finish())
}

pub(crate) fn render_delete(caps: &Capabilities, delete: &Delete<'_>) -> Result<(String, Vec<Value>)> {
    let table = delete.table();
    let mut w = SqlWriter::new(caps, QueryKind::Delete);
    w.push("DELETE FROM ");
    w.table(table);
    where_clause(&mut w, table, delete.filter_expr())?;
    returning(&mut w, table, delete.returning_columns())?;
    Ok(w.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::StandardGenerators;
    use crate::model::{Column, DataType, Schema, Table};
    use crate::query::{Query, Row};

    fn schema() -> Schema {
        Schema::new([
            Table::new("users")
                .column(Column::new("Id", DataType::Serial))
                .column(Column::new("Name", DataType::Varchar).length(80).not_null())
                .column(Column::new("Email", DataType::Varchar).length(120))
                .primary_key(["Id"])
                .build()
                .unwrap(),
            Table::new("tokens")
                .column(Column::new("Id", DataType::Uuid).default_generator("uuid"))
                .column(Column::new("Code", DataType::Varchar).length(21).default_generator("nanoid"))
                .column(Column::new("Owner", DataType::Integer).not_null())
                .primary_key(["Id"])
                .build()
                .unwrap(),
        ])
        .unwrap()
    }

    #[test]
    fn test_insert_single_row() {
        let schema = schema();
        let insert = Insert::new(schema.table("users").unwrap())
            .row(Row::new().set("Name", "Grace").set("Email", "g@x.com"))
            .unwrap();
        let (sql, params) = render_insert(&Capabilities::mysql(), &insert).unwrap();
        assert_eq!(sql, "INSERT INTO `users` (`Name`, `Email`) VALUES (?, ?)");
        assert_eq!(params, vec![Value::from("Grace"), Value::from("g@x.com")]);
    }

    #[test]
    fn test_insert_union_all_form() {
        let schema = schema();
        let insert = Insert::new(schema.table("users").unwrap())
            .rows_from([Row::new().set("Name", "a"), Row::new().set("Name", "b")])
            .unwrap();
        let caps = Capabilities::sqlite().with_bulk_insert(BulkInsert::UnionAll);
        let (sql, params) = render_insert(&caps, &insert).unwrap();
        assert_eq!(sql, "INSERT INTO \"users\" (\"Name\") SELECT ? UNION ALL SELECT ?");
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn test_insert_fills_keyword_generator_defaults() {
        let schema = schema();
        let insert = Insert::new(schema.table("tokens").unwrap())
            .row(Row::new().set("Code", "abc").set("Owner", 7))
            .unwrap();
        let (sql, params) = render_insert(&Capabilities::postgres(), &insert).unwrap();
        assert_eq!(
            sql,
            "INSERT INTO \"tokens\" (\"Id\", \"Code\", \"Owner\") VALUES (gen_random_uuid(), $1, $2)"
        );
        assert_eq!(params, vec![Value::from("abc"), Value::Int(7)]);
    }

    #[test]
    fn test_insert_requires_resolved_literal_generators() {
        let schema = schema();
        let insert = Insert::new(schema.table("tokens").unwrap())
            .row(Row::new().set("Owner", 7))
            .unwrap();
        let sqlite = Capabilities::sqlite();
        assert!(matches!(
            render_insert(&sqlite, &insert),
            Err(Error::UnresolvedGenerator { name, .. }) if name == "uuid"
        ));

        let resolved = match Query::Insert(insert).resolve_generators(&sqlite, &StandardGenerators).unwrap() {
            Query::Insert(q) => q,
            other => panic!("unexpected {other:?}"),
        };
        let (sql, params) = render_insert(&sqlite, &resolved).unwrap();
        assert_eq!(sql, "INSERT INTO \"tokens\" (\"Id\", \"Code\", \"Owner\") VALUES (?, ?, ?)");
        assert_eq!(params.len(), 3);
    }

    #[test]
    fn test_returning_gated() {
        let schema = schema();
        let insert = Insert::new(schema.table("users").unwrap())
            .row(Row::new().set("Name", "Grace"))
            .unwrap()
            .returning(["Id"])
            .unwrap();
        let (sql, _) = render_insert(&Capabilities::postgres(), &insert).unwrap();
        assert!(sql.ends_with(" RETURNING \"Id\""));
        assert!(matches!(
            render_insert(&Capabilities::mysql(), &insert),
            Err(Error::UnsupportedCapability {
                feature: Feature::Returning,
                ..
            })
        ));
    }

    #[test]
    fn test_update_and_delete() {
        let schema = schema();
        let users = schema.table("users").unwrap();
        let update = Update::new(users)
            .set("Email", "new@x.com")
            .unwrap()
            .filter(users.col("Id").unwrap().eq(3).unwrap())
            .unwrap();
        let (sql, params) = render_update(&Capabilities::postgres(), &update).unwrap();
        assert_eq!(sql, "UPDATE \"users\" SET \"Email\" = $1 WHERE \"users\".\"Id\" = $2");
        assert_eq!(params, vec![Value::from("new@x.com"), Value::Int(3)]);

        let delete = Delete::new(users)
            .filter(users.col("Email").unwrap().is_null().unwrap())
            .unwrap();
        let (sql, params) = render_delete(&Capabilities::sqlite(), &delete).unwrap();
        assert_eq!(sql, "DELETE FROM \"users\" WHERE \"users\".\"Email\" IS NULL");
        assert!(params.is_empty());
    }

    #[test]
    fn test_update_without_assignments_fails() {
        let schema = schema();
        let update = Update::new(schema.table("users").unwrap());
        assert!(matches!(
            render_update(&Capabilities::postgres(), &update),
            Err(Error::InvalidDefinition { .. })
        ));
    }

    #[test]
    fn test_update_generator_assignment() {
        let schema = schema();
        let update = Update::new(schema.table("tokens").unwrap())
            .set_generator("Id", "uuid")
            .unwrap();
        let (sql, params) = render_update(&Capabilities::mysql(), &update).unwrap();
        assert_eq!(sql, "UPDATE `tokens` SET `Id` = UUID()");
        assert!(params.is_empty());
    }
}
