//! Filter operators and the per-type operator sets.

use crate::model::{DataType, TypeFamily};
use std::fmt;

/// Operator a filter leaf applies to a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    Between,
    In,
    NotIn,
    IsNull,
    IsNotNull,
    Like,
    NotLike,
    ILike,
    StartsWith,
    EndsWith,
    Contains,
}

const NULL_CHECKS: &[Operator] = &[Operator::IsNull, Operator::IsNotNull];

const EQUALITY: &[Operator] = &[
    Operator::Eq,
    Operator::Ne,
    Operator::In,
    Operator::NotIn,
    Operator::IsNull,
    Operator::IsNotNull,
];

const STRING: &[Operator] = &[
    Operator::Eq,
    Operator::Ne,
    Operator::In,
    Operator::NotIn,
    Operator::IsNull,
    Operator::IsNotNull,
    Operator::Like,
    Operator::NotLike,
    Operator::ILike,
    Operator::StartsWith,
    Operator::EndsWith,
    Operator::Contains,
];

const ORDERED: &[Operator] = &[
    Operator::Eq,
    Operator::Ne,
    Operator::In,
    Operator::NotIn,
    Operator::IsNull,
    Operator::IsNotNull,
    Operator::Gt,
    Operator::Gte,
    Operator::Lt,
    Operator::Lte,
    Operator::Between,
];

impl Operator {
    /// Operators valid for a column of `data_type`
    ///
    /// - JSON: null checks only
    /// - boolean, UUID: equality, membership, null checks
    /// - strings: the above plus pattern matching
    /// - numeric, date/time: the above (without patterns) plus ordering and range
    pub fn for_type(data_type: DataType) -> &'static [Operator] {
        match data_type.family() {
            TypeFamily::Json => NULL_CHECKS,
            TypeFamily::Boolean | TypeFamily::Uuid => EQUALITY,
            TypeFamily::String => STRING,
            TypeFamily::Integer | TypeFamily::Decimal | TypeFamily::Serial | TypeFamily::Temporal => {
                ORDERED
            }
        }
    }

    pub fn applies_to(self, data_type: DataType) -> bool {
        Self::for_type(data_type).contains(&self)
    }

    /// `$`-notation token
    pub fn token(self) -> &'static str {
        match self {
            Operator::Eq => "$eq",
            Operator::Ne => "$ne",
            Operator::Gt => "$gt",
            Operator::Gte => "$gte",
            Operator::Lt => "$lt",
            Operator::Lte => "$lte",
            Operator::Between => "$between",
            Operator::In => "$in",
            Operator::NotIn => "$nin",
            Operator::IsNull | Operator::IsNotNull => "$null",
            Operator::Like => "$like",
            Operator::NotLike => "$nlike",
            Operator::ILike => "$ilike",
            Operator::StartsWith => "$startsWith",
            Operator::EndsWith => "$endsWith",
            Operator::Contains => "$contains",
        }
    }

    /// SQL comparison operator for the binary comparisons
    pub(crate) fn comparison_sql(self) -> Option<&'static str> {
        match self {
            Operator::Eq => Some("="),
            Operator::Ne => Some("<>"),
            Operator::Gt => Some(">"),
            Operator::Gte => Some(">="),
            Operator::Lt => Some("<"),
            Operator::Lte => Some("<="),
            _ => None,
        }
    }

    pub fn is_pattern(self) -> bool {
        matches!(
            self,
            Operator::Like
                | Operator::NotLike
                | Operator::ILike
                | Operator::StartsWith
                | Operator::EndsWith
                | Operator::Contains
        )
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}
