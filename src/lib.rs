//! # Riptide
//!
//! Dialect-independent relational query model and SQL translator.
//!
//! Describe tables once with the [`model`], build typed [`filter`]s and
//! [`query`] descriptors against that model, and let a [`Translator`] render
//! them for Postgres, MySQL, SQLite or a document store using the per-dialect
//! [`dialect::Capabilities`] record. Driver failures are mapped to a stable
//! taxonomy by the [`classify`] module, independently of the target engine.
//!
//! ```
//! use riptide::dialect::CapabilityRegistry;
//! use riptide::model::{Column, DataType, Schema, Table};
//! use riptide::query::Insert;
//! use riptide::query::Row;
//! use riptide::{Dialect, Translator, Value};
//!
//! let schema = Schema::new([Table::new("users")
//!     .column(Column::new("Id", DataType::Serial))
//!     .column(Column::new("Name", DataType::Varchar).length(80).not_null())
//!     .column(Column::new("Email", DataType::Varchar).length(120))
//!     .primary_key(["Id"])
//!     .build()?])?;
//!
//! let insert = Insert::new(schema.table("users")?)
//!     .row(Row::new().set("Name", "Grace").set("Email", "g@x.com"))?;
//!
//! let registry = CapabilityRegistry::builtin();
//! let statement = Translator::new(registry.get(Dialect::MySql)?).translate(&insert.into())?;
//! assert_eq!(statement.sql(), "INSERT INTO `users` (`Name`, `Email`) VALUES (?, ?)");
//! assert_eq!(statement.params(), &[Value::from("Grace"), Value::from("g@x.com")]);
//! # Ok::<(), riptide::Error>(())
//! ```
//!
//! The crate does no I/O. Execution goes through a caller-supplied
//! [`executor::Executor`]; [`executor::Session`] wires translation,
//! execution, [`events`] and classification together.

pub mod classify;
pub mod config;
pub mod dialect;
pub mod error;
pub mod events;
pub mod executor;
pub mod filter;
pub mod generator;
#[cfg(feature = "metrics")]
pub mod metrics;
pub mod model;
pub mod query;
#[cfg(any(test, feature = "test-helpers"))]
pub mod testing;
pub mod translate;
pub mod value;

pub use classify::{ClassifiedError, ErrorClass, NativeError};
pub use config::RiptideConfig;
pub use dialect::Dialect;
pub use error::{Error, Result};
pub use executor::{Executor, Session};
pub use query::{Query, QueryKind};
pub use translate::{Statement, Translator};
pub use value::Value;
