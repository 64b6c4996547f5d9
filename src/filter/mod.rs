//! Filter Expression Model.
//!
//! A [`Filter`] is a predicate tree whose leaves bind one column to an
//! operator from that column's type-specific operator set. Type checking
//! happens when a leaf is built, so a translated filter is always well typed.
//! Filters can be built programmatically through [`ColumnFilter`] (see
//! [`TableDef::col`](crate::model::TableDef::col)) or parsed from
//! `$`-notation JSON with [`Filter::parse`].

mod expr;
mod operator;
mod parse;

pub use expr::{ColumnFilter, Filter, FilterKind, Leaf, Predicate, Related};
pub use operator::Operator;
