//! Placeholder/parameter alignment properties

mod common;

use common::blog_schema;
use proptest::prelude::*;
use riptide::dialect::CapabilityRegistry;
use riptide::filter::Filter;
use riptide::query::{Query, Select};
use riptide::{Dialect, Translator, Value};

fn placeholders(dialect: Dialect, sql: &str) -> usize {
    match dialect {
        Dialect::Postgres => sql.matches('$').count(),
        _ => sql.matches('?').count(),
    }
}

proptest! {
    #[test]
    fn test_nth_placeholder_binds_nth_literal(
        ages in prop::collection::vec(any::<i32>(), 1..16),
        any_of in any::<bool>(),
    ) {
        let schema = blog_schema();
        let users = schema.table("users").unwrap();
        let leaves: Vec<Filter> = ages
            .iter()
            .map(|age| users.col("Age").unwrap().eq(*age).unwrap())
            .collect();
        let filter = (if any_of { Filter::any(leaves) } else { Filter::all(leaves) }).unwrap();
        let query: Query<'_> = Select::new(&schema, "users")
            .unwrap()
            .column("Id")
            .unwrap()
            .filter(filter)
            .unwrap()
            .into();

        let registry = CapabilityRegistry::builtin();
        let pg = Translator::new(registry.get(Dialect::Postgres).unwrap()).translate(&query).unwrap();
        let expected: Vec<Value> = ages.iter().map(|a| Value::Int(i64::from(*a))).collect();
        prop_assert_eq!(pg.params(), expected.as_slice());
        for n in 1..=ages.len() {
            let needle = format!("\"users\".\"Age\" = ${n}");
            prop_assert!(pg.sql().contains(&needle));
        }

        for dialect in [Dialect::Postgres, Dialect::MySql, Dialect::Sqlite] {
            let translator = Translator::new(registry.get(dialect).unwrap());
            let first = translator.translate(&query).unwrap();
            prop_assert_eq!(placeholders(dialect, first.sql()), first.params().len());
            prop_assert_eq!(&first, &translator.translate(&query).unwrap());
        }
    }

    #[test]
    fn test_membership_lists_bind_every_member(members in prop::collection::vec(0i32..1000, 0..32)) {
        let schema = blog_schema();
        let users = schema.table("users").unwrap();
        let query: Query<'_> = Select::new(&schema, "users")
            .unwrap()
            .column("Id")
            .unwrap()
            .filter(users.col("Age").unwrap().is_in(members.clone()).unwrap())
            .unwrap()
            .into();
        let registry = CapabilityRegistry::builtin();
        let statement = Translator::new(registry.get(Dialect::Sqlite).unwrap()).translate(&query).unwrap();
        prop_assert_eq!(statement.params().len(), members.len());
        prop_assert_eq!(placeholders(Dialect::Sqlite, statement.sql()), members.len());
        if members.is_empty() {
            prop_assert!(statement.sql().ends_with("WHERE 1 = 0"));
        }
    }
}
