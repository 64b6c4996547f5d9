//! Select rendering.

use super::filter::{self, InlineJoin};
use super::writer::SqlWriter;
use crate::dialect::{Capabilities, Dialect, Feature};
use crate::error::{Error, Result};
use crate::model::DataType;
use crate::query::{JoinKind, Projection, ProjectionExpr, QueryKind, Select, SortTarget};
use crate::value::Value;

pub(crate) fn render(caps: &Capabilities, select: &Select<'_>) -> Result<(String, Vec<Value>)> {
    let mut w = SqlWriter::new(caps, QueryKind::Select);
    write(&mut w, select)?;
    Ok(w.finish())
}

/// Render `select` into `w`, wrapping it in `COUNT(*)` for count queries
pub(crate) fn write(w: &mut SqlWriter<'_>, select: &Select<'_>) -> Result<()> {
    if !select.is_count() {
        return body(w, select);
    }
    w.push("SELECT COUNT(*) AS ");
    w.ident("count");
    w.push(" FROM (");
    body(w, select)?;
    w.push(") AS ");
    w.ident("count_subquery");
    Ok(())
}

fn body(w: &mut SqlWriter<'_>, select: &Select<'_>) -> Result<()> {
    let root = select.root_alias();
    w.push("SELECT ");
    if select.is_distinct() {
        w.push("DISTINCT ");
    }

    if select.projections().is_empty() {
        w.join(select.table().columns(), ", ", |w, column| {
            w.qualified(root, column.name());
            w.push(" AS ");
            w.ident(column.name());
            Ok(())
        })?;
    } else {
        w.join(select.projections(), ", ", |w, projection| {
            expression(w, select, projection)?;
            w.push(" AS ");
            w.ident(projection.alias());
            Ok(())
        })?;
    }

    w.push(" FROM ");
    w.table(select.table());

    for join in select.joins() {
        w.require(
            Feature::Joins,
            format!("join `{}` on `{}`", join.alias(), select.table().name()),
        )?;
        w.push(" ");
        w.push(join.kind().sql());
        w.push(" JOIN ");
        w.table(join.target());
        w.push(" ");
        w.ident(join.alias());
        w.push(" ON ");
        w.join(join.relation().mapping(), " AND ", |w, (local, remote)| {
            w.qualified(join.parent(), local);
            w.push(" = ");
            w.qualified(join.alias(), remote);
            Ok(())
        })?;
        if let Some(on) = join.filter() {
            w.push(" AND ");
            filter::render(w, on, join.alias(), &[])?;
        }
    }

    if let Some(condition) = select.filter_expr() {
        let inline: Vec<InlineJoin<'_>> = select
            .joins()
            .iter()
            .filter(|j| j.kind() == JoinKind::Inner && j.relation().is_single())
            .map(|j| InlineJoin {
                parent: j.parent(),
                relation: j.relation().name(),
                alias: j.alias(),
            })
            .collect();
        w.push(" WHERE ");
        filter::render(w, condition, root, &inline)?;
    }

    let group_by = select.group_by();
    if !group_by.is_empty() {
        w.push(" GROUP BY ");
        w.join(group_by, ", ", |w, projection| expression(w, select, projection))?;
    }

    if !select.order().is_empty() {
        w.push(" ORDER BY ");
        w.join(select.order(), ", ", |w, order| {
            match &order.target {
                SortTarget::Column { source, column } => w.qualified(source, column),
                SortTarget::Output(alias) => w.ident(alias),
            }
            w.push(" ");
            w.push(order.direction.sql());
            Ok(())
        })?;
    }

    if let Some(page) = select.page_spec() {
        w.push(" LIMIT ");
        w.param(Value::Int(page.limit()));
        w.push(" OFFSET ");
        w.param(Value::Int(page.offset()));
    }
    Ok(())
}

fn expression(w: &mut SqlWriter<'_>, select: &Select<'_>, projection: &Projection) -> Result<()> {
    let source = projection.source();
    match projection.expr() {
        ProjectionExpr::Column { column } => w.qualified(source, column),
        ProjectionExpr::Cast { column, data_type } => {
            w.require(Feature::Cast, format!("cast of `{column}` to {data_type}"))?;
            let target = cast_type(w, select.table().name(), column, *data_type)?;
            w.push("CAST(");
            w.qualified(source, column);
            w.push(" AS ");
            w.push(&target);
            w.push(")");
        }
        ProjectionExpr::Aggregate {
            func,
            column,
            distinct,
        } => {
            w.require(
                Feature::Aggregation,
                format!("{} on `{}`", func.sql(), select.table().name()),
            )?;
            w.push(func.sql());
            w.push("(");
            if *distinct {
                w.push("DISTINCT ");
            }
            match column {
                Some(column) => w.qualified(source, column),
                None => w.push("*"),
            }
            w.push(")");
        }
    }
    Ok(())
}

/// Cast target keyword for `data_type`.
///
/// Serial types cast to their integer counterpart. MySQL only accepts a
/// fixed set of cast targets, so it maps the type table's keyword onto one.
fn cast_type(w: &SqlWriter<'_>, table: &str, column: &str, data_type: DataType) -> Result<String> {
    let target = match data_type {
        DataType::SmallSerial => DataType::SmallInt,
        DataType::Serial => DataType::Integer,
        DataType::BigSerial => DataType::BigInt,
        other => other,
    };
    let spec = w.caps().type_spec(target).ok_or_else(|| Error::UnsupportedDataType {
        dialect: w.dialect(),
        table: Some(table.to_string()),
        column: Some(column.to_string()),
        data_type,
    })?;
    if w.dialect() != Dialect::MySql {
        return Ok(spec.render(None));
    }
    Ok(match target {
        DataType::Boolean | DataType::SmallInt | DataType::Integer | DataType::BigInt => "SIGNED",
        DataType::Date => "DATE",
        DataType::Time => "TIME",
        DataType::DateTime | DataType::Timestamp => "DATETIME",
        DataType::Decimal => "DECIMAL",
        DataType::Real => "FLOAT",
        DataType::Double => "DOUBLE",
        DataType::Json => "JSON",
        _ => "CHAR",
    }
    .to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::Filter;
    use crate::model::{Column, Relation, Schema, Table};
    use crate::query::{Aggregate, Join, SortDirection};

    fn schema() -> Schema {
        Schema::new([
            Table::new("users")
                .column(Column::new("Id", DataType::Serial))
                .column(Column::new("Name", DataType::Varchar).length(80))
                .column(Column::new("Role", DataType::Varchar).length(20))
                .column(Column::new("Age", DataType::Integer))
                .column(Column::new("Balance", DataType::Decimal).precision(12, 2))
                .primary_key(["Id"])
                .build()
                .unwrap(),
            Table::new("posts")
                .column(Column::new("Id", DataType::Serial))
                .column(Column::new("AuthorId", DataType::Integer))
                .column(Column::new("Title", DataType::Text))
                .primary_key(["Id"])
                .relation(Relation::single("author", "users").on("AuthorId", "Id"))
                .build()
                .unwrap(),
        ])
        .unwrap()
    }

    fn sql(caps: &Capabilities, select: &Select<'_>) -> (String, Vec<Value>) {
        render(caps, select).unwrap()
    }

    #[test]
    fn test_default_projection_lists_every_column() {
        let schema = schema();
        let select = Select::new(&schema, "posts").unwrap();
        assert_eq!(
            sql(&Capabilities::sqlite(), &select).0,
            "SELECT \"posts\".\"Id\" AS \"Id\", \"posts\".\"AuthorId\" AS \"AuthorId\", \"posts\".\"Title\" AS \"Title\" FROM \"posts\""
        );
    }

    #[test]
    fn test_join_with_local_filter() {
        let schema = schema();
        let users = schema.table("users").unwrap();
        let select = Select::new(&schema, "posts")
            .unwrap()
            .column("Title")
            .unwrap()
            .join(Join::left("author").alias("a").filter(users.col("Age").unwrap().gte(18).unwrap()))
            .unwrap()
            .joined_column_as("a", "Name", "AuthorName")
            .unwrap();
        let (text, params) = sql(&Capabilities::mysql(), &select);
        assert_eq!(
            text,
            "SELECT `posts`.`Title` AS `Title`, `a`.`Name` AS `AuthorName` FROM `posts` LEFT JOIN `users` `a` ON `posts`.`AuthorId` = `a`.`Id` AND `a`.`Age` >= ?"
        );
        assert_eq!(params, vec![Value::Int(18)]);
    }

    #[test]
    fn test_aggregates_group_by_plain_projections() {
        let schema = schema();
        let select = Select::new(&schema, "users")
            .unwrap()
            .column("Role")
            .unwrap()
            .aggregate(Aggregate::avg("Age"), "AvgAge")
            .unwrap()
            .aggregate(Aggregate::count("Name").distinct(), "Names")
            .unwrap()
            .order_by_output("AvgAge", SortDirection::Desc)
            .unwrap();
        assert_eq!(
            sql(&Capabilities::postgres(), &select).0,
            "SELECT \"users\".\"Role\" AS \"Role\", AVG(\"users\".\"Age\") AS \"AvgAge\", COUNT(DISTINCT \"users\".\"Name\") AS \"Names\" FROM \"users\" GROUP BY \"users\".\"Role\" ORDER BY \"AvgAge\" DESC"
        );
    }

    #[test]
    fn test_paging_binds_limit_and_offset_last() {
        let schema = schema();
        let users = schema.table("users").unwrap();
        let select = Select::new(&schema, "users")
            .unwrap()
            .column("Id")
            .unwrap()
            .filter(users.col("Age").unwrap().gt(21).unwrap())
            .unwrap()
            .order_by("Id", SortDirection::Asc)
            .unwrap()
            .page(3, 25)
            .unwrap();
        let (text, params) = sql(&Capabilities::postgres(), &select);
        assert_eq!(
            text,
            "SELECT \"users\".\"Id\" AS \"Id\" FROM \"users\" WHERE \"users\".\"Age\" > $1 ORDER BY \"users\".\"Id\" ASC LIMIT $2 OFFSET $3"
        );
        assert_eq!(params, vec![Value::Int(21), Value::Int(25), Value::Int(50)]);
    }

    #[test]
    fn test_count_wraps_without_order_or_page() {
        let schema = schema();
        let select = Select::new(&schema, "users")
            .unwrap()
            .column("Id")
            .unwrap()
            .order_by("Id", SortDirection::Desc)
            .unwrap()
            .page(2, 10)
            .unwrap()
            .to_count();
        let (text, params) = sql(&Capabilities::sqlite(), &select);
        assert_eq!(
            text,
            "SELECT COUNT(*) AS \"count\" FROM (SELECT \"users\".\"Id\" AS \"Id\" FROM \"users\") AS \"count_subquery\""
        );
        assert!(params.is_empty());
    }

    #[test]
    fn test_cast_uses_type_table_and_mysql_targets() {
        let schema = schema();
        let select = Select::new(&schema, "users")
            .unwrap()
            .column_cast("Age", DataType::Varchar, "AgeText")
            .unwrap()
            .column_cast("Id", DataType::BigInt, "BigId")
            .unwrap();
        assert_eq!(
            sql(&Capabilities::postgres(), &select).0,
            "SELECT CAST(\"users\".\"Age\" AS VARCHAR) AS \"AgeText\", CAST(\"users\".\"Id\" AS BIGINT) AS \"BigId\" FROM \"users\""
        );
        assert_eq!(
            sql(&Capabilities::mysql(), &select).0,
            "SELECT CAST(`users`.`Age` AS CHAR) AS `AgeText`, CAST(`users`.`Id` AS SIGNED) AS `BigId` FROM `users`"
        );
    }

    #[test]
    fn test_unmapped_cast_type_fails() {
        let schema = schema();
        let select = Select::new(&schema, "users")
            .unwrap()
            .column_cast("Age", DataType::Json, "AgeJson")
            .unwrap();
        let caps = Capabilities::postgres().without_type(DataType::Json);
        assert!(matches!(
            render(&caps, &select),
            Err(Error::UnsupportedDataType {
                data_type: DataType::Json,
                ..
            })
        ));
    }

    #[test]
    fn test_related_filter_inlines_against_inner_join() {
        let schema = schema();
        let users = schema.table("users").unwrap();
        let related = Filter::related(&schema, "posts", "author", users.col("Role").unwrap().eq("admin").unwrap()).unwrap();
        let select = Select::new(&schema, "posts")
            .unwrap()
            .column("Id")
            .unwrap()
            .join(Join::inner("author"))
            .unwrap()
            .filter(related.clone())
            .unwrap();
        assert_eq!(
            sql(&Capabilities::postgres(), &select).0,
            "SELECT \"posts\".\"Id\" AS \"Id\" FROM \"posts\" INNER JOIN \"users\" \"author\" ON \"posts\".\"AuthorId\" = \"author\".\"Id\" WHERE \"author\".\"Role\" = $1"
        );

        let left = Select::new(&schema, "posts")
            .unwrap()
            .column("Id")
            .unwrap()
            .join(Join::left("author"))
            .unwrap()
            .filter(related)
            .unwrap();
        assert!(sql(&Capabilities::postgres(), &left).0.contains("WHERE EXISTS (SELECT 1 FROM \"users\" \"author_1\""));
    }

    #[test]
    fn test_joins_require_feature() {
        let schema = schema();
        let select = Select::new(&schema, "posts").unwrap().join(Join::inner("author")).unwrap();
        let caps = Capabilities::sqlite().with_feature(Feature::Joins, false);
        assert!(matches!(
            render(&caps, &select),
            Err(Error::UnsupportedCapability {
                feature: Feature::Joins,
                query_kind: QueryKind::Select,
                ..
            })
        ));
    }

    #[test]
    fn test_decimal_projection_differs_only_in_quoting() {
        let schema = schema();
        let select = Select::new(&schema, "users").unwrap().column("Balance").unwrap();
        let pg = sql(&Capabilities::postgres(), &select).0;
        let mysql = sql(&Capabilities::mysql(), &select).0;
        assert_eq!(pg.replace('"', "`"), mysql);
    }
}
