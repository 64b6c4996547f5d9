//! CREATE TABLE, DROP TABLE and CREATE VIEW rendering.
//!
//! DDL cannot bind parameters, so literal column defaults are rendered as
//! escaped SQL literals and a view's select must not bind anything.

use super::mutation::generator_expr;
use super::select;
use super::writer::{sql_literal, SqlWriter};
use crate::dialect::{Capabilities, Dialect, Feature, GeneratorSource};
use crate::error::{Error, Result};
use crate::model::{ColumnDef, DefaultKeyword, DefaultValue, PartitionStrategy, TableDef};
use crate::query::{CreateTable, CreateView, DropTable, QueryKind};
use crate::value::Value;

fn column_list(w: &mut SqlWriter<'_>, columns: &[String]) -> Result<()> {
    w.push("(");
    w.join(columns, ", ", |w, column| {
        w.ident(column);
        Ok(())
    })?;
    w.push(")");
    Ok(())
}

fn column_def(w: &mut SqlWriter<'_>, table: &TableDef, column: &ColumnDef) -> Result<()> {
    let spec = w
        .caps()
        .type_spec(column.data_type())
        .ok_or_else(|| Error::UnsupportedDataType {
            dialect: w.dialect(),
            table: Some(table.name().to_string()),
            column: Some(column.name().to_string()),
            data_type: column.data_type(),
        })?;
    let keyword = spec.render(column.modifier());
    w.ident(column.name());
    w.push(" ");
    w.push(&keyword);
    if !column.is_nullable() {
        w.push(" NOT NULL");
    }
    match column.default_value() {
        Some(DefaultValue::Literal(value)) => {
            let literal = sql_literal(w.dialect(), value);
            w.push(" DEFAULT ");
            w.push(&literal);
        }
        // MySQL takes only CURRENT_TIMESTAMP bare; other keywords are expression defaults
        Some(DefaultValue::Keyword(keyword))
            if w.dialect() == Dialect::MySql && !matches!(keyword, DefaultKeyword::CurrentTimestamp) =>
        {
            w.push(" DEFAULT (");
            w.push(keyword.sql());
            w.push(")");
        }
        Some(DefaultValue::Keyword(keyword)) => {
            w.push(" DEFAULT ");
            w.push(keyword.sql());
        }
        Some(DefaultValue::Generator(name)) => match w.caps().generator(name) {
            // Computed by the caller at insert time; the column has no database default
            Some(GeneratorSource::Literal) => {}
            _ => {
                let expr = generator_expr(w.caps(), column.name(), name)?;
                w.push(" DEFAULT (");
                w.push(expr);
                w.push(")");
            }
        },
        None => {}
    }
    Ok(())
}

fn partition(w: &mut SqlWriter<'_>, table: &TableDef) -> Result<()> {
    let Some(partition) = table.partition() else {
        return Ok(());
    };
    w.require(Feature::Partitioning, format!("`{}`", table.name()))?;
    match (w.dialect(), partition.strategy()) {
        (Dialect::MySql, PartitionStrategy::Hash) => {
            w.push(" PARTITION BY KEY ");
            column_list(w, partition.columns())?;
            if let Some(n) = partition.partitions() {
                w.push(&format!(" PARTITIONS {n}"));
            }
        }
        (Dialect::MySql, strategy) => {
            return Err(Error::unsupported(
                Dialect::MySql,
                w.kind(),
                Feature::Partitioning,
                format!(
                    "`{}`: {} partitioning needs explicit partition definitions",
                    table.name(),
                    strategy.sql()
                ),
            ))
        }
        (_, strategy) => {
            w.push(" PARTITION BY ");
            w.push(strategy.sql());
            w.push(" ");
            column_list(w, partition.columns())?;
        }
    }
    Ok(())
}

pub(crate) fn render_create_table(caps: &Capabilities, create: &CreateTable<'_>) -> Result<(String, Vec<Value>)> {
    let table = create.table();
    let mut w = SqlWriter::new(caps, QueryKind::CreateTable);
    w.require(Feature::Ddl, format!("`{}`", table.name()))?;

    w.push("CREATE TABLE ");
    if create.is_if_not_exists() {
        w.push("IF NOT EXISTS ");
    }
    w.table(table);
    w.push(" (");
    w.join(table.columns(), ", ", |w, column| column_def(w, table, column))?;

    if !table.primary_key().is_empty() {
        w.push(", PRIMARY KEY ");
        column_list(&mut w, table.primary_key())?;
    }
    for key in table.unique_keys() {
        w.push(", CONSTRAINT ");
        w.ident(&key.name);
        w.push(" UNIQUE ");
        column_list(&mut w, &key.columns)?;
    }
    for relation in table.relations().iter().filter(|r| r.is_single()) {
        let local: Vec<String> = relation.local_columns().map(str::to_string).collect();
        let remote: Vec<String> = relation.remote_columns().map(str::to_string).collect();
        w.push(", CONSTRAINT ");
        w.ident(&format!("fk_{}_{}", table.name(), relation.name()));
        w.push(" FOREIGN KEY ");
        column_list(&mut w, &local)?;
        let target = create.schema().table(relation.target())?;
        w.push(" REFERENCES ");
        w.table(target);
        w.push(" ");
        column_list(&mut w, &remote)?;
        w.push(" ON DELETE ");
        w.push(relation.delete_action().sql());
        w.push(" ON UPDATE ");
        w.push(relation.update_action().sql());
    }
    w.push(")");

    partition(&mut w, table)?;
    if let Some(distribution) = table.distribution() {
        w.require(Feature::Distribution, format!("`{}`", table.name()))?;
        w.push(" DISTRIBUTED BY ");
        column_list(&mut w, distribution.columns())?;
    }
    Ok(w.finish())
}

pub(crate) fn render_drop_table(caps: &Capabilities, drop: &DropTable<'_>) -> Result<(String, Vec<Value>)> {
    let table = drop.table();
    let mut w = SqlWriter::new(caps, QueryKind::DropTable);
    w.require(Feature::Ddl, format!("`{}`", table.name()))?;
    w.push("DROP TABLE ");
    if drop.is_if_exists() {
        w.push("IF EXISTS ");
    }
    w.table(table);
    if drop.is_cascade() {
        w.require(Feature::Cascade, format!("`{}`", table.name()))?;
        w.push(" CASCADE");
    }
    Ok(w.finish())
}

pub(crate) fn render_create_view(caps: &Capabilities, view: &CreateView<'_>) -> Result<(String, Vec<Value>)> {
    let mut w = SqlWriter::new(caps, QueryKind::CreateView);
    let detail = format!("view `{}`", view.name());
    w.require(Feature::Ddl, &detail)?;
    if view.is_materialized() {
        w.require(Feature::MaterializedViews, &detail)?;
        if view.is_or_replace() {
            return Err(Error::InvalidDefinition {
                table: view.name().to_string(),
                detail: "a materialized view cannot be created with OR REPLACE".to_string(),
            });
        }
    }
    if view.is_or_replace() && w.dialect() == Dialect::Sqlite {
        return Err(Error::unsupported(
            Dialect::Sqlite,
            QueryKind::CreateView,
            Feature::Ddl,
            format!("{detail}: CREATE OR REPLACE VIEW"),
        ));
    }

    w.push("CREATE ");
    if view.is_or_replace() {
        w.push("OR REPLACE ");
    }
    if view.is_materialized() {
        w.push("MATERIALIZED ");
    }
    w.push("VIEW ");
    w.ident(view.name());
    w.push(" AS ");
    select::write(&mut w, view.select())?;

    if w.param_count() > 0 {
        return Err(Error::InvalidDefinition {
            table: view.name().to_string(),
            detail: format!(
                "view query binds {} parameters; views cannot bind parameters",
                w.param_count()
            ),
        });
    }
    Ok(w.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Column, DataType, Distribution, Partition, ReferentialAction, Relation, Schema, Table};
    use crate::query::Select;

    fn schema() -> Schema {
        Schema::new([
            Table::new("users")
                .column(Column::new("Id", DataType::Serial))
                .column(Column::new("Email", DataType::Varchar).length(120).not_null())
                .column(Column::new("Status", DataType::Varchar).length(10).default_value("active"))
                .column(Column::new("Created", DataType::Timestamp).default_keyword(DefaultKeyword::CurrentTimestamp))
                .primary_key(["Id"])
                .unique("uq_users_email", ["Email"])
                .build()
                .unwrap(),
            Table::new("posts")
                .column(Column::new("Id", DataType::Uuid).default_generator("uuid"))
                .column(Column::new("AuthorId", DataType::Integer).not_null())
                .column(Column::new("Price", DataType::Decimal).precision(10, 2))
                .primary_key(["Id"])
                .relation(
                    Relation::single("author", "users")
                        .on("AuthorId", "Id")
                        .on_delete(ReferentialAction::Cascade),
                )
                .build()
                .unwrap(),
            Table::new("events")
                .column(Column::new("Id", DataType::BigInt).not_null())
                .column(Column::new("Tenant", DataType::Integer).not_null())
                .partition(Partition::hash(["Tenant"], 8))
                .build()
                .unwrap(),
            Table::new("metrics")
                .column(Column::new("At", DataType::Date).not_null())
                .partition(Partition::range(["At"]))
                .distribution(Distribution::by(["At"]))
                .build()
                .unwrap(),
        ])
        .unwrap()
    }

    #[test]
    fn test_create_table_postgres() {
        let schema = schema();
        let create = CreateTable::new(&schema, "users").unwrap().if_not_exists();
        let (sql, params) = render_create_table(&Capabilities::postgres(), &create).unwrap();
        assert_eq!(
            sql,
            "CREATE TABLE IF NOT EXISTS \"users\" (\"Id\" SERIAL NOT NULL, \"Email\" VARCHAR(120) NOT NULL, \"Status\" VARCHAR(10) DEFAULT 'active', \"Created\" TIMESTAMPTZ DEFAULT CURRENT_TIMESTAMP, PRIMARY KEY (\"Id\"), CONSTRAINT \"uq_users_email\" UNIQUE (\"Email\"))"
        );
        assert!(params.is_empty());
    }

    #[test]
    fn test_create_table_foreign_key_and_generator_default() {
        let schema = schema();
        let create = CreateTable::new(&schema, "posts").unwrap();
        let (pg, _) = render_create_table(&Capabilities::postgres(), &create).unwrap();
        assert_eq!(
            pg,
            "CREATE TABLE \"posts\" (\"Id\" UUID NOT NULL DEFAULT (gen_random_uuid()), \"AuthorId\" INTEGER NOT NULL, \"Price\" NUMERIC(10,2), PRIMARY KEY (\"Id\"), CONSTRAINT \"fk_posts_author\" FOREIGN KEY (\"AuthorId\") REFERENCES \"users\" (\"Id\") ON DELETE CASCADE ON UPDATE NO ACTION)"
        );
        let (sqlite, _) = render_create_table(&Capabilities::sqlite(), &create).unwrap();
        assert!(sqlite.starts_with("CREATE TABLE \"posts\" (\"Id\" TEXT NOT NULL, "));
        let (mysql, _) = render_create_table(&Capabilities::mysql(), &create).unwrap();
        assert!(mysql.contains("`Price` DECIMAL(10,2)"));
    }

    #[test]
    fn test_foreign_key_references_target_namespace() {
        let schema = Schema::new([
            Table::new("users")
                .namespace("auth")
                .column(Column::new("Id", DataType::Serial))
                .primary_key(["Id"])
                .build()
                .unwrap(),
            Table::new("posts")
                .namespace("blog")
                .column(Column::new("Id", DataType::Serial))
                .column(Column::new("AuthorId", DataType::Integer).not_null())
                .primary_key(["Id"])
                .relation(Relation::single("author", "users").on("AuthorId", "Id"))
                .build()
                .unwrap(),
        ])
        .unwrap();
        let create = CreateTable::new(&schema, "posts").unwrap();
        let (sql, _) = render_create_table(&Capabilities::postgres(), &create).unwrap();
        assert!(sql.starts_with("CREATE TABLE \"blog\".\"posts\" ("), "{sql}");
        assert!(
            sql.contains("CONSTRAINT \"fk_posts_author\" FOREIGN KEY (\"AuthorId\") REFERENCES \"auth\".\"users\" (\"Id\")"),
            "{sql}"
        );
    }

    #[test]
    fn test_mysql_wraps_date_keyword_defaults() {
        let schema = Schema::new([Table::new("visits")
            .column(Column::new("Day", DataType::Date).default_keyword(DefaultKeyword::CurrentDate))
            .column(Column::new("At", DataType::Timestamp).default_keyword(DefaultKeyword::CurrentTimestamp))
            .build()
            .unwrap()])
        .unwrap();
        let create = CreateTable::new(&schema, "visits").unwrap();
        let (mysql, _) = render_create_table(&Capabilities::mysql(), &create).unwrap();
        assert!(mysql.contains("`Day` DATE DEFAULT (CURRENT_DATE)"), "{mysql}");
        assert!(mysql.contains(" DEFAULT CURRENT_TIMESTAMP)"), "{mysql}");
        let (pg, _) = render_create_table(&Capabilities::postgres(), &create).unwrap();
        assert!(pg.contains("\"Day\" DATE DEFAULT CURRENT_DATE"), "{pg}");
    }

    #[test]
    fn test_partitioning_per_dialect() {
        let schema = schema();
        let events = CreateTable::new(&schema, "events").unwrap();
        assert!(render_create_table(&Capabilities::postgres(), &events)
            .unwrap()
            .0
            .ends_with(") PARTITION BY HASH (\"Tenant\")"));
        assert!(render_create_table(&Capabilities::mysql(), &events)
            .unwrap()
            .0
            .ends_with(") PARTITION BY KEY (`Tenant`) PARTITIONS 8"));
        assert!(matches!(
            render_create_table(&Capabilities::sqlite(), &events),
            Err(Error::UnsupportedCapability {
                dialect: Dialect::Sqlite,
                feature: Feature::Partitioning,
                query_kind: QueryKind::CreateTable,
                ..
            })
        ));
    }

    #[test]
    fn test_distribution_requires_flag() {
        let schema = schema();
        let metrics = CreateTable::new(&schema, "metrics").unwrap();
        assert!(matches!(
            render_create_table(&Capabilities::postgres(), &metrics),
            Err(Error::UnsupportedCapability {
                feature: Feature::Distribution,
                ..
            })
        ));
        let distributed = Capabilities::postgres().with_feature(Feature::Distribution, true);
        let (sql, _) = render_create_table(&distributed, &metrics).unwrap();
        assert!(sql.ends_with(") PARTITION BY RANGE (\"At\") DISTRIBUTED BY (\"At\")"));
        assert!(matches!(
            render_create_table(&Capabilities::mysql(), &metrics),
            Err(Error::UnsupportedCapability {
                feature: Feature::Partitioning,
                ..
            })
        ));
    }

    #[test]
    fn test_unmapped_type_fails() {
        let schema = schema();
        let create = CreateTable::new(&schema, "posts").unwrap();
        let caps = Capabilities::postgres().without_type(DataType::Decimal);
        assert!(matches!(
            render_create_table(&caps, &create),
            Err(Error::UnsupportedDataType {
                data_type: DataType::Decimal,
                column: Some(c),
                ..
            }) if c == "Price"
        ));
    }

    #[test]
    fn test_drop_table() {
        let schema = schema();
        let drop = DropTable::new(schema.table("users").unwrap()).if_exists().cascade();
        assert_eq!(
            render_drop_table(&Capabilities::postgres(), &drop).unwrap().0,
            "DROP TABLE IF EXISTS \"users\" CASCADE"
        );
        assert!(matches!(
            render_drop_table(&Capabilities::sqlite(), &drop),
            Err(Error::UnsupportedCapability {
                feature: Feature::Cascade,
                ..
            })
        ));
    }

    #[test]
    fn test_create_view() {
        let schema = schema();
        let select = Select::new(&schema, "users").unwrap().column("Email").unwrap();
        let view = CreateView::new("user_emails", select.clone()).unwrap().materialized();
        assert_eq!(
            render_create_view(&Capabilities::postgres(), &view).unwrap().0,
            "CREATE MATERIALIZED VIEW \"user_emails\" AS SELECT \"users\".\"Email\" AS \"Email\" FROM \"users\""
        );
        assert!(matches!(
            render_create_view(&Capabilities::mysql(), &view),
            Err(Error::UnsupportedCapability {
                feature: Feature::MaterializedViews,
                ..
            })
        ));

        let paged = CreateView::new("first_users", select.page(1, 10).unwrap()).unwrap();
        assert!(matches!(
            render_create_view(&Capabilities::postgres(), &paged),
            Err(Error::InvalidDefinition { .. })
        ));
    }
}
