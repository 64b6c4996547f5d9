//! Data model: tables, columns, keys and relations.
//!
//! The model is the vocabulary every other component compiles against. It is
//! built once through the [`Table`] and [`Column`] builders, assembled into a
//! [`Schema`], and then only ever read.

mod column;
mod data_type;
pub(crate) mod ident;
mod relation;
mod schema;
mod table;

pub use column::{Column, ColumnDef, DefaultKeyword, DefaultValue, Validation};
pub use data_type::{DataType, TypeFamily, TypeModifier};
pub use ident::MAX_IDENTIFIER_LEN;
pub use relation::{Cardinality, ReferentialAction, Relation};
pub use schema::Schema;
pub use table::{Distribution, Partition, PartitionStrategy, Table, TableDef, UniqueKey};
