//! Filter expression tree.

use super::Operator;
use crate::error::{Error, Result};
use crate::model::{ColumnDef, Relation, Schema, TableDef};
use crate::value::Value;

/// Operator with its operands, bound to one column
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// `=`, `<>`, `>`, `>=`, `<`, `<=`
    Compare(Operator, Value),
    Between(Value, Value),
    /// Membership; an empty list matches no rows
    In(Vec<Value>),
    /// Non-membership; an empty list matches every row
    NotIn(Vec<Value>),
    IsNull,
    IsNotNull,
    /// Caller-supplied SQL `LIKE` pattern, wildcards included
    Like {
        pattern: String,
        negated: bool,
        case_insensitive: bool,
    },
    /// Literal text matched as a prefix, suffix or substring; wildcards in
    /// `text` are escaped when rendered
    Match { operator: Operator, text: String },
}

impl Predicate {
    pub fn operator(&self) -> Operator {
        match self {
            Predicate::Compare(op, _) => *op,
            Predicate::Between(..) => Operator::Between,
            Predicate::In(_) => Operator::In,
            Predicate::NotIn(_) => Operator::NotIn,
            Predicate::IsNull => Operator::IsNull,
            Predicate::IsNotNull => Operator::IsNotNull,
            Predicate::Like {
                negated: false,
                case_insensitive: true,
                ..
            } => Operator::ILike,
            Predicate::Like { negated: true, .. } => Operator::NotLike,
            Predicate::Like { .. } => Operator::Like,
            Predicate::Match { operator, .. } => *operator,
        }
    }
}

/// Leaf predicate on `table`.`column`
#[derive(Debug, Clone, PartialEq)]
pub struct Leaf {
    table: String,
    column: String,
    predicate: Predicate,
}

impl Leaf {
    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn predicate(&self) -> &Predicate {
        &self.predicate
    }
}

/// Filter over the target of a relation
#[derive(Debug, Clone, PartialEq)]
pub struct Related {
    table: String,
    relation: Relation,
    target_namespace: Option<String>,
    filter: Box<Filter>,
}

impl Related {
    /// Owning table of the relation
    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn relation(&self) -> &str {
        self.relation.name()
    }

    /// Relation definition, captured when the filter was built
    pub fn definition(&self) -> &Relation {
        &self.relation
    }

    pub fn target_namespace(&self) -> Option<&str> {
        self.target_namespace.as_deref()
    }

    /// Filter over the relation's target table
    pub fn filter(&self) -> &Filter {
        &self.filter
    }
}

/// Shape of a [`Filter`] node
#[derive(Debug, Clone, PartialEq)]
pub enum FilterKind {
    Leaf(Leaf),
    And(Vec<Filter>),
    Or(Vec<Filter>),
    Related(Related),
}

/// Typed predicate tree.
///
/// Leaves are built through [`TableDef::col`], which checks the operator
/// against the column's type; combinators can never be empty.
///
/// # Examples
///
/// ```
/// use riptide::filter::Filter;
/// use riptide::model::{Column, DataType, Table};
///
/// let users = Table::new("users")
///     .column(Column::new("Age", DataType::Integer))
///     .column(Column::new("Active", DataType::Boolean))
///     .build()?;
///
/// let adults = Filter::all([users.col("Age")?.gte(18)?, users.col("Age")?.lt(65)?])?;
/// assert_eq!(adults.leaf_count(), 2);
///
/// // Ordering is not defined for booleans
/// assert!(users.col("Active")?.gt(true).is_err());
/// # Ok::<(), riptide::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    kind: FilterKind,
}

impl Filter {
    pub fn kind(&self) -> &FilterKind {
        &self.kind
    }

    /// `$and` over `filters`
    ///
    /// # Errors
    ///
    /// Returns `Error::EmptyCombinator` if `filters` is empty.
    pub fn all(filters: impl IntoIterator<Item = Filter>) -> Result<Filter> {
        Self::combine("$and", filters, FilterKind::And)
    }

    /// `$or` over `filters`
    ///
    /// # Errors
    ///
    /// Returns `Error::EmptyCombinator` if `filters` is empty.
    pub fn any(filters: impl IntoIterator<Item = Filter>) -> Result<Filter> {
        Self::combine("$or", filters, FilterKind::Or)
    }

    fn combine(
        combinator: &'static str,
        filters: impl IntoIterator<Item = Filter>,
        kind: fn(Vec<Filter>) -> FilterKind,
    ) -> Result<Filter> {
        let children: Vec<Filter> = filters.into_iter().collect();
        if children.is_empty() {
            return Err(Error::EmptyCombinator { combinator });
        }
        Ok(Filter {
            kind: kind(children),
        })
    }

    pub fn and(self, other: Filter) -> Filter {
        Filter {
            kind: FilterKind::And(vec![self, other]),
        }
    }

    pub fn or(self, other: Filter) -> Filter {
        Filter {
            kind: FilterKind::Or(vec![self, other]),
        }
    }

    /// Restrict `table` rows to those whose `relation` target matches `filter`.
    ///
    /// Whether this renders as a join condition or a correlated subquery is
    /// decided at translation time.
    ///
    /// # Errors
    ///
    /// - `Error::UnknownTable` / `Error::UnknownRelation` if the relation
    ///   does not resolve
    /// - `Error::InvalidFilter` if `filter` constrains a table other than the
    ///   relation's target
    pub fn related(schema: &Schema, table: &str, relation: &str, filter: Filter) -> Result<Filter> {
        let (rel, target) = schema.relation(table, relation)?;
        if let Some(other) = filter.leaf_tables().find(|t| *t != target.name()) {
            return Err(Error::InvalidFilter {
                table: table.to_string(),
                detail: format!(
                    "relation `{}` targets `{}` but the nested filter constrains `{other}`",
                    rel.name(),
                    target.name()
                ),
            });
        }
        Ok(Filter {
            kind: FilterKind::Related(Related {
                table: table.to_string(),
                relation: rel.clone(),
                target_namespace: target.namespace().map(str::to_string),
                filter: Box::new(filter),
            }),
        })
    }

    /// Number of leaf predicates, nested relation filters included
    pub fn leaf_count(&self) -> usize {
        match &self.kind {
            FilterKind::Leaf(_) => 1,
            FilterKind::And(children) | FilterKind::Or(children) => {
                children.iter().map(Filter::leaf_count).sum()
            }
            FilterKind::Related(related) => related.filter.leaf_count(),
        }
    }

    /// Tables of the leaves at this level, not descending into relation filters
    pub(crate) fn leaf_tables(&self) -> Box<dyn Iterator<Item = &str> + '_> {
        match &self.kind {
            FilterKind::Leaf(leaf) => Box::new(std::iter::once(leaf.table.as_str())),
            FilterKind::And(children) | FilterKind::Or(children) => {
                Box::new(children.iter().flat_map(Filter::leaf_tables))
            }
            FilterKind::Related(related) => Box::new(std::iter::once(related.table.as_str())),
        }
    }

    fn leaf(table: &TableDef, column: &ColumnDef, predicate: Predicate) -> Filter {
        Filter {
            kind: FilterKind::Leaf(Leaf {
                table: table.name().to_string(),
                column: column.name().to_string(),
                predicate,
            }),
        }
    }
}

impl TableDef {
    /// Start a filter on one of this table's columns
    ///
    /// # Errors
    ///
    /// Returns `Error::UnknownColumn` if the column does not exist.
    pub fn col(&self, column: &str) -> Result<ColumnFilter<'_>> {
        Ok(ColumnFilter {
            table: self,
            column: self.try_column(column)?,
        })
    }
}

/// Typed filter constructors for one column
///
/// Every constructor checks the operator against the column's operator set
/// and coerces operands to the column type, failing with
/// `Error::TypeMismatch` otherwise.
#[derive(Debug, Clone, Copy)]
pub struct ColumnFilter<'t> {
    table: &'t TableDef,
    column: &'t ColumnDef,
}

impl<'t> ColumnFilter<'t> {
    pub fn table(&self) -> &'t TableDef {
        self.table
    }

    pub fn column(&self) -> &'t ColumnDef {
        self.column
    }

    fn allow(&self, op: Operator) -> Result<()> {
        if op.applies_to(self.column.data_type()) {
            Ok(())
        } else {
            Err(Error::type_mismatch(
                self.table.name(),
                self.column.name(),
                Some(op.token()),
                format!("{} columns do not support this operator", self.column.data_type()),
            ))
        }
    }

    fn operand(&self, op: Operator, value: Value) -> Result<Value> {
        if value.is_null() {
            return Err(Error::type_mismatch(
                self.table.name(),
                self.column.name(),
                Some(op.token()),
                "null operand; use a null check instead",
            ));
        }
        self.column.coerce(self.table.name(), Some(op.token()), value)
    }

    fn build(&self, op: Operator, predicate: Predicate) -> Result<Filter> {
        self.allow(op)?;
        Ok(Filter::leaf(self.table, self.column, predicate))
    }

    fn compare(&self, op: Operator, value: Value) -> Result<Filter> {
        self.allow(op)?;
        let value = self.operand(op, value)?;
        self.build(op, Predicate::Compare(op, value))
    }

    /// `= value`; a null value becomes `IS NULL`
    pub fn eq(&self, value: impl Into<Value>) -> Result<Filter> {
        match value.into() {
            Value::Null => self.is_null(),
            v => self.compare(Operator::Eq, v),
        }
    }

    /// `<> value`; a null value becomes `IS NOT NULL`
    pub fn ne(&self, value: impl Into<Value>) -> Result<Filter> {
        match value.into() {
            Value::Null => self.is_not_null(),
            v => self.compare(Operator::Ne, v),
        }
    }

    pub fn gt(&self, value: impl Into<Value>) -> Result<Filter> {
        self.compare(Operator::Gt, value.into())
    }

    pub fn gte(&self, value: impl Into<Value>) -> Result<Filter> {
        self.compare(Operator::Gte, value.into())
    }

    pub fn lt(&self, value: impl Into<Value>) -> Result<Filter> {
        self.compare(Operator::Lt, value.into())
    }

    pub fn lte(&self, value: impl Into<Value>) -> Result<Filter> {
        self.compare(Operator::Lte, value.into())
    }

    /// Inclusive range
    pub fn between(&self, low: impl Into<Value>, high: impl Into<Value>) -> Result<Filter> {
        let op = Operator::Between;
        self.allow(op)?;
        let low = self.operand(op, low.into())?;
        let high = self.operand(op, high.into())?;
        self.build(op, Predicate::Between(low, high))
    }

    /// Membership. An empty list is accepted and matches no rows.
    pub fn is_in<I, V>(&self, values: I) -> Result<Filter>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let values = self.members(Operator::In, values)?;
        self.build(Operator::In, Predicate::In(values))
    }

    /// Non-membership. An empty list is accepted and matches every row.
    pub fn not_in<I, V>(&self, values: I) -> Result<Filter>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let values = self.members(Operator::NotIn, values)?;
        self.build(Operator::NotIn, Predicate::NotIn(values))
    }

    fn members<I, V>(&self, op: Operator, values: I) -> Result<Vec<Value>>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.allow(op)?;
        values
            .into_iter()
            .map(|v| self.operand(op, v.into()))
            .collect()
    }

    pub fn is_null(&self) -> Result<Filter> {
        self.build(Operator::IsNull, Predicate::IsNull)
    }

    pub fn is_not_null(&self) -> Result<Filter> {
        self.build(Operator::IsNotNull, Predicate::IsNotNull)
    }

    /// SQL `LIKE` with a caller-supplied pattern (`%` and `_` are wildcards)
    pub fn like(&self, pattern: impl Into<String>) -> Result<Filter> {
        self.like_with(Operator::Like, pattern.into(), false, false)
    }

    pub fn not_like(&self, pattern: impl Into<String>) -> Result<Filter> {
        self.like_with(Operator::NotLike, pattern.into(), true, false)
    }

    /// Case-insensitive `LIKE`
    pub fn ilike(&self, pattern: impl Into<String>) -> Result<Filter> {
        self.like_with(Operator::ILike, pattern.into(), false, true)
    }

    fn like_with(&self, op: Operator, pattern: String, negated: bool, case_insensitive: bool) -> Result<Filter> {
        self.build(
            op,
            Predicate::Like {
                pattern,
                negated,
                case_insensitive,
            },
        )
    }

    /// Values beginning with `text`, taken literally
    pub fn starts_with(&self, text: impl Into<String>) -> Result<Filter> {
        self.matching(Operator::StartsWith, text.into())
    }

    /// Values ending with `text`, taken literally
    pub fn ends_with(&self, text: impl Into<String>) -> Result<Filter> {
        self.matching(Operator::EndsWith, text.into())
    }

    /// Values containing `text`, taken literally
    pub fn contains(&self, text: impl Into<String>) -> Result<Filter> {
        self.matching(Operator::Contains, text.into())
    }

    fn matching(&self, operator: Operator, text: String) -> Result<Filter> {
        self.build(operator, Predicate::Match { operator, text })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Column, DataType, Relation, Table};

    fn users() -> TableDef {
        Table::new("users")
            .column(Column::new("Id", DataType::Serial))
            .column(Column::new("Name", DataType::Varchar).length(80))
            .column(Column::new("Age", DataType::Integer))
            .column(Column::new("Active", DataType::Boolean))
            .column(Column::new("Prefs", DataType::Json))
            .primary_key(["Id"])
            .build()
            .unwrap()
    }

    #[test]
    fn test_operator_outside_type_set() {
        let users = users();
        let err = users.col("Active").unwrap().gt(true).unwrap_err();
        assert!(matches!(
            err,
            Error::TypeMismatch { ref table, ref column, operator: Some(ref op), .. }
                if table == "users" && column == "Active" && op == "$gt"
        ));
        assert!(users.col("Prefs").unwrap().eq(serde_json::json!({"a": 1})).is_err());
        assert!(users.col("Prefs").unwrap().is_null().is_ok());
        assert!(users.col("Age").unwrap().starts_with("1").is_err());
    }

    #[test]
    fn test_operand_is_coerced() {
        let users = users();
        assert!(matches!(
            users.col("Age").unwrap().eq("eighteen"),
            Err(Error::TypeMismatch { operator: Some(ref op), .. }) if op == "$eq"
        ));
        let filter = users.col("Age").unwrap().is_in([1, 2, 3]).unwrap();
        match filter.kind() {
            FilterKind::Leaf(leaf) => {
                assert_eq!(leaf.predicate(), &Predicate::In(vec![Value::Int(1), Value::Int(2), Value::Int(3)]))
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_eq_null_becomes_null_check() {
        let users = users();
        let filter = users.col("Name").unwrap().eq(Value::Null).unwrap();
        match filter.kind() {
            FilterKind::Leaf(leaf) => assert_eq!(leaf.predicate(), &Predicate::IsNull),
            other => panic!("unexpected {other:?}"),
        }
        assert!(users.col("Name").unwrap().is_in([Value::Null]).is_err());
    }

    #[test]
    fn test_empty_membership_is_accepted() {
        let users = users();
        let empty: [i64; 0] = [];
        assert!(users.col("Age").unwrap().is_in(empty).is_ok());
        assert!(users.col("Age").unwrap().not_in(empty).is_ok());
    }

    #[test]
    fn test_empty_combinators_rejected() {
        assert!(matches!(Filter::all(Vec::new()), Err(Error::EmptyCombinator { combinator: "$and" })));
        assert!(matches!(Filter::any(Vec::new()), Err(Error::EmptyCombinator { combinator: "$or" })));
    }

    #[test]
    fn test_unknown_column() {
        assert!(matches!(users().col("Email"), Err(Error::UnknownColumn { .. })));
    }

    #[test]
    fn test_related_checks_target_table() {
        let users = Table::new("users")
            .column(Column::new("Id", DataType::Serial))
            .column(Column::new("Name", DataType::Text))
            .primary_key(["Id"])
            .build()
            .unwrap();
        let posts = Table::new("posts")
            .column(Column::new("Id", DataType::Serial))
            .column(Column::new("AuthorId", DataType::Integer))
            .column(Column::new("Title", DataType::Text))
            .primary_key(["Id"])
            .relation(Relation::single("author", "users").on("AuthorId", "Id"))
            .build()
            .unwrap();
        let schema = Schema::new([users, posts]).unwrap();
        let users = schema.table("users").unwrap();
        let posts = schema.table("posts").unwrap();

        let inner = users.col("Name").unwrap().eq("Grace").unwrap();
        let filter = Filter::related(&schema, "posts", "author", inner).unwrap();
        assert_eq!(filter.leaf_count(), 1);

        let wrong = posts.col("Title").unwrap().eq("x").unwrap();
        assert!(matches!(
            Filter::related(&schema, "posts", "author", wrong),
            Err(Error::InvalidFilter { .. })
        ));
        let inner = users.col("Name").unwrap().eq("Grace").unwrap();
        assert!(matches!(
            Filter::related(&schema, "posts", "editor", inner),
            Err(Error::UnknownRelation { .. })
        ));
    }
}
