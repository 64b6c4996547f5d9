//! Generator collaborator.
//!
//! A column default or written value may reference a generator by name. The
//! dialect's generator table decides whether the database evaluates it (a
//! keyword expression such as `gen_random_uuid()`) or the caller computes the
//! value before translation. A [`GeneratorProvider`] supplies the values in
//! the second case; see [`Query::resolve_generators`](crate::query::Query::resolve_generators).

use crate::model::{ColumnDef, DataType};
use crate::value::Value;
use chrono::Utc;
use rand::Rng;
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

/// Computes values for named generators
pub trait GeneratorProvider: Send + Sync {
    /// Value for `name` to be written to `column`, or `None` if the provider
    /// does not know the generator
    fn generate(&self, name: &str, column: &ColumnDef) -> Option<Value>;
}

impl<F> GeneratorProvider for F
where
    F: Fn(&str, &ColumnDef) -> Option<Value> + Send + Sync,
{
    fn generate(&self, name: &str, column: &ColumnDef) -> Option<Value> {
        self(name, column)
    }
}

const NANOID_LEN: usize = 21;
const NANOID_ALPHABET: &[u8; 64] = b"useandom-26T198340PX75pxJACKVERYMINDBUSHWOLF_GQZbfghjklqvwyzrict";

/// Built-in generators: `uuid` (v4), `now`, `current_date` and `nanoid`
/// (21 characters sampled uniformly from a 64-symbol URL-safe alphabet).
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardGenerators;

impl StandardGenerators {
    fn now_for(data_type: DataType) -> Value {
        let now = Utc::now();
        match data_type {
            DataType::Date => Value::Date(now.date_naive()),
            DataType::Time => Value::Time(now.time()),
            DataType::DateTime => Value::DateTime(now.naive_utc()),
            _ => Value::Timestamp(now),
        }
    }

    fn nanoid() -> String {
        let mut rng = rand::thread_rng();
        (0..NANOID_LEN)
            .map(|_| NANOID_ALPHABET[rng.gen_range(0..NANOID_ALPHABET.len())] as char)
            .collect()
    }
}

impl GeneratorProvider for StandardGenerators {
    fn generate(&self, name: &str, column: &ColumnDef) -> Option<Value> {
        match name {
            "uuid" => Some(match column.data_type() {
                DataType::Uuid => Value::Uuid(Uuid::new_v4()),
                _ => Value::String(Uuid::new_v4().to_string()),
            }),
            "now" => Some(Self::now_for(column.data_type())),
            "current_date" => Some(Value::Date(Utc::now().date_naive())),
            "nanoid" => Some(Value::String(Self::nanoid())),
            _ => None,
        }
    }
}

type GeneratorFn = Box<dyn Fn(&ColumnDef) -> Value + Send + Sync>;

/// Named generators registered by the caller, falling back to
/// [`StandardGenerators`]
///
/// # Examples
///
/// ```
/// use riptide::generator::{GeneratorProvider, Generators};
/// use riptide::model::{Column, DataType, Table};
/// use riptide::Value;
///
/// let generators = Generators::new().with("tenant", |_col| Value::from("acme"));
/// let table = Table::new("orders")
///     .column(Column::new("Tenant", DataType::Varchar).length(40))
///     .build()?;
/// let column = table.column("Tenant").unwrap();
/// assert_eq!(generators.generate("tenant", column), Some(Value::from("acme")));
/// assert!(generators.generate("uuid", column).is_some());
/// # Ok::<(), riptide::Error>(())
/// ```
#[derive(Default)]
pub struct Generators {
    custom: BTreeMap<String, GeneratorFn>,
}

impl Generators {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<F>(mut self, name: impl Into<String>, generator: F) -> Self
    where
        F: Fn(&ColumnDef) -> Value + Send + Sync + 'static,
    {
        self.custom.insert(name.into(), Box::new(generator));
        self
    }
}

impl fmt::Debug for Generators {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Generators")
            .field("custom", &self.custom.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl GeneratorProvider for Generators {
    fn generate(&self, name: &str, column: &ColumnDef) -> Option<Value> {
        match self.custom.get(name) {
            Some(generator) => Some(generator(column)),
            None => StandardGenerators.generate(name, column),
        }
    }
}
