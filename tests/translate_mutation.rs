//! Insert, Update, Delete, DDL, raw and transaction translation

mod common;

use common::blog_schema;
use riptide::dialect::{CapabilityRegistry, Feature};
use riptide::generator::{Generators, StandardGenerators};
use riptide::query::{CreateTable, Delete, DropTable, Insert, Query, Raw, Row, Transaction, Update};
use riptide::{Dialect, Error, Translator, Value};
use test_case::test_case;

fn translate(dialect: Dialect, query: &Query<'_>) -> riptide::Result<(String, Vec<Value>)> {
    let registry = CapabilityRegistry::builtin();
    Ok(Translator::new(registry.get(dialect)?).translate(query)?.into_parts())
}

// ============================================================================
// Insert
// ============================================================================

#[test_case(Dialect::Postgres, "INSERT INTO \"users\" (\"Name\", \"Email\") VALUES ($1, $2)" ; "postgres")]
#[test_case(Dialect::MySql, "INSERT INTO `users` (`Name`, `Email`) VALUES (?, ?)" ; "mysql")]
#[test_case(Dialect::Sqlite, "INSERT INTO \"users\" (\"Name\", \"Email\") VALUES (?, ?)" ; "sqlite")]
fn test_insert_scenario(dialect: Dialect, expected: &str) {
    let schema = blog_schema();
    let insert = Insert::new(schema.table("users").unwrap())
        .row(Row::new().set("Name", "Grace").set("Email", "g@x.com"))
        .unwrap();
    let (sql, params) = translate(dialect, &insert.into()).unwrap();
    assert_eq!(sql, expected);
    assert_eq!(params, vec![Value::from("Grace"), Value::from("g@x.com")]);
}

#[test]
fn test_insert_columns_follow_declaration_order() {
    let schema = blog_schema();
    let insert = Insert::new(schema.table("users").unwrap())
        .row(Row::new().set("Age", 36).set("Name", "Ada"))
        .unwrap();
    let (sql, params) = translate(Dialect::Sqlite, &insert.into()).unwrap();
    assert_eq!(sql, "INSERT INTO \"users\" (\"Name\", \"Age\") VALUES (?, ?)");
    assert_eq!(params, vec![Value::from("Ada"), Value::Int(36)]);
}

#[test]
fn test_multi_row_insert() {
    let schema = blog_schema();
    let insert = Insert::new(schema.table("users").unwrap())
        .rows_from([
            Row::new().set("Name", "a").set("Email", "a@x.com"),
            Row::new().set("Name", "b").set("Email", "b@x.com"),
        ])
        .unwrap();
    let (sql, params) = translate(Dialect::Postgres, &insert.into()).unwrap();
    assert_eq!(
        sql,
        "INSERT INTO \"users\" (\"Name\", \"Email\") VALUES ($1, $2), ($3, $4)"
    );
    assert_eq!(params.len(), 4);

    let mismatched = Insert::new(schema.table("users").unwrap()).rows_from([
        Row::new().set("Name", "a"),
        Row::new().set("Name", "b").set("Email", "b@x.com"),
    ]);
    assert!(matches!(mismatched, Err(Error::RowShapeMismatch { .. })));
}

#[test]
fn test_missing_required_column() {
    let schema = blog_schema();
    let insert = Insert::new(schema.table("users").unwrap()).row(Row::new().set("Email", "a@x.com"));
    assert!(matches!(insert, Err(Error::MissingValue { column, .. }) if column == "Name"));
}

#[test_case(Dialect::Postgres, "gen_random_uuid()" ; "postgres")]
#[test_case(Dialect::MySql, "UUID()" ; "mysql")]
fn test_keyword_generator_default(dialect: Dialect, expr: &str) {
    let schema = blog_schema();
    let insert = Insert::new(schema.table("posts").unwrap())
        .row(Row::new().set("AuthorId", 1).set("Title", "Hello"))
        .unwrap();
    let (sql, params) = translate(dialect, &insert.into()).unwrap();
    assert!(sql.contains(&format!("VALUES ({expr}, ")), "{sql}");
    assert_eq!(params, vec![Value::Int(1), Value::from("Hello")]);
}

#[test]
fn test_literal_generator_resolved_by_caller() {
    let schema = blog_schema();
    let registry = CapabilityRegistry::builtin();
    let sqlite = registry.get(Dialect::Sqlite).unwrap();
    let fixed = uuid::Uuid::from_u128(7);
    let generators = Generators::new().with("uuid", move |_| Value::Uuid(fixed));

    let query: Query<'_> = Insert::new(schema.table("posts").unwrap())
        .row(Row::new().set("AuthorId", 1).set("Title", "Hello"))
        .unwrap()
        .into();
    assert!(matches!(
        Translator::new(sqlite).translate(&query),
        Err(Error::UnresolvedGenerator { .. })
    ));

    let resolved = query.resolve_generators(sqlite, &generators).unwrap();
    let statement = Translator::new(sqlite).translate(&resolved).unwrap();
    assert_eq!(
        statement.sql(),
        "INSERT INTO \"posts\" (\"Id\", \"AuthorId\", \"Title\") VALUES (?, ?, ?)"
    );
    assert_eq!(statement.params()[0], Value::Uuid(fixed));
}

#[test]
fn test_standard_generators_fill_uuid() {
    let schema = blog_schema();
    let registry = CapabilityRegistry::builtin();
    let sqlite = registry.get(Dialect::Sqlite).unwrap();
    let query: Query<'_> = Insert::new(schema.table("posts").unwrap())
        .row(Row::new().set("AuthorId", 1).set("Title", "Hello"))
        .unwrap()
        .into();
    let statement = Translator::new(sqlite)
        .translate(&query.resolve_generators(sqlite, &StandardGenerators).unwrap())
        .unwrap();
    assert!(matches!(statement.params()[0], Value::Uuid(_)));
}

// ============================================================================
// Update and Delete
// ============================================================================

#[test]
fn test_update_with_relation_filter() {
    let schema = blog_schema();
    let posts = schema.table("posts").unwrap();
    let users = schema.table("users").unwrap();
    let update = Update::new(posts)
        .set("Published", false)
        .unwrap()
        .filter(
            riptide::filter::Filter::related(&schema, "posts", "author", users.col("Name").unwrap().eq("spam").unwrap())
                .unwrap(),
        )
        .unwrap();
    let (sql, params) = translate(Dialect::Postgres, &update.into()).unwrap();
    assert_eq!(
        sql,
        "UPDATE \"posts\" SET \"Published\" = $1 WHERE EXISTS (SELECT 1 FROM \"users\" \"author_1\" WHERE \"posts\".\"AuthorId\" = \"author_1\".\"Id\" AND \"author_1\".\"Name\" = $2)"
    );
    assert_eq!(params, vec![Value::Bool(false), Value::from("spam")]);
}

#[test]
fn test_delete_returning_only_where_supported() {
    let schema = blog_schema();
    let users = schema.table("users").unwrap();
    let delete: Query<'_> = Delete::new(users)
        .filter(users.col("Age").unwrap().lt(13).unwrap())
        .unwrap()
        .returning(["Id"])
        .unwrap()
        .into();
    let (sql, _) = translate(Dialect::Sqlite, &delete).unwrap();
    assert_eq!(sql, "DELETE FROM \"users\" WHERE \"users\".\"Age\" < ? RETURNING \"Id\"");
    assert!(matches!(
        translate(Dialect::MySql, &delete),
        Err(Error::UnsupportedCapability { feature: Feature::Returning, dialect: Dialect::MySql, .. })
    ));
}

#[test]
fn test_document_update() {
    let schema = blog_schema();
    let users = schema.table("users").unwrap();
    let update = Update::new(users)
        .set("Age", 41)
        .unwrap()
        .filter(users.col("Name").unwrap().eq("Ada").unwrap())
        .unwrap();
    let (doc, params) = translate(Dialect::Document, &update.into()).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&doc).unwrap();
    assert_eq!(parsed["update"], "users");
    assert_eq!(parsed["updates"][0]["q"]["Name"]["$eq"]["$param"], 1);
    assert_eq!(parsed["updates"][0]["u"]["$set"]["Age"]["$param"], 2);
    assert_eq!(params, vec![Value::from("Ada"), Value::Int(41)]);
}

// ============================================================================
// DDL, raw and transactions
// ============================================================================

#[test]
fn test_create_and_drop_table() {
    let schema = blog_schema();
    let create: Query<'_> = CreateTable::new(&schema, "posts").unwrap().into();
    let (sql, params) = translate(Dialect::MySql, &create).unwrap();
    assert!(sql.starts_with("CREATE TABLE `posts` (`Id` CHAR(36) NOT NULL DEFAULT (UUID()), "), "{sql}");
    assert!(sql.contains("CONSTRAINT `fk_posts_author` FOREIGN KEY (`AuthorId`) REFERENCES `users` (`Id`) ON DELETE CASCADE"));
    assert!(params.is_empty());

    let drop: Query<'_> = DropTable::new(schema.table("posts").unwrap()).if_exists().into();
    assert_eq!(translate(Dialect::Sqlite, &drop).unwrap().0, "DROP TABLE IF EXISTS \"posts\"");
    assert!(matches!(
        translate(Dialect::Document, &drop),
        Err(Error::UnsupportedCapability { feature: Feature::Ddl, .. })
    ));
}

#[test_case(Dialect::Postgres, "SELECT * FROM users WHERE \"Age\" > $1 AND \"Name\" = $2" ; "postgres")]
#[test_case(Dialect::Sqlite, "SELECT * FROM users WHERE \"Age\" > ? AND \"Name\" = ?" ; "sqlite")]
fn test_raw_placeholders(dialect: Dialect, expected: &str) {
    let raw = Raw::new("SELECT * FROM users WHERE \"Age\" > :age AND \"Name\" = :name")
        .bind("name", "Ada")
        .bind("age", 30);
    let (sql, params) = translate(dialect, &raw.into()).unwrap();
    assert_eq!(sql, expected);
    assert_eq!(params, vec![Value::Int(30), Value::from("Ada")]);
}

#[test_case(Dialect::Postgres, "BEGIN" ; "postgres")]
#[test_case(Dialect::MySql, "START TRANSACTION" ; "mysql")]
#[test_case(Dialect::Sqlite, "BEGIN" ; "sqlite")]
fn test_begin(dialect: Dialect, expected: &str) {
    assert_eq!(translate(dialect, &Transaction::begin().into()).unwrap().0, expected);
}
