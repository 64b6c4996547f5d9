//! Select descriptor.
//!
//! Every builder step resolves the names it is given against the schema, so
//! unknown columns, aliases and relations are reported while the query is
//! being built:
//!
//! ```
//! use riptide::model::{Column, DataType, Relation, Schema, Table};
//! use riptide::query::{Aggregate, Join, Select, SortDirection};
//!
//! let schema = Schema::new([
//!     Table::new("users")
//!         .column(Column::new("Id", DataType::Serial))
//!         .column(Column::new("Name", DataType::Varchar).length(80))
//!         .primary_key(["Id"])
//!         .build()?,
//!     Table::new("orders")
//!         .column(Column::new("Id", DataType::Serial))
//!         .column(Column::new("UserId", DataType::Integer))
//!         .column(Column::new("Total", DataType::Decimal).precision(10, 2))
//!         .primary_key(["Id"])
//!         .relation(Relation::single("customer", "users").on("UserId", "Id"))
//!         .build()?,
//! ])?;
//!
//! let spend = Select::new(&schema, "orders")?
//!     .join(Join::inner("customer").alias("c"))?
//!     .joined_column_as("c", "Name", "customer")?
//!     .aggregate(Aggregate::sum("Total"), "spent")?
//!     .order_by_output("spent", SortDirection::Desc)?
//!     .page(1, 10)?;
//! assert_eq!(spend.group_by().len(), 1);
//! # Ok::<(), riptide::Error>(())
//! ```

use super::QueryKind;
use crate::error::{Error, Result};
use crate::filter::Filter;
use crate::model::ident::validate_identifier;
use crate::model::{DataType, Relation, Schema, TableDef};

/// `INNER`, `LEFT` or `RIGHT` join
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JoinKind {
    Inner,
    Left,
    Right,
}

impl JoinKind {
    pub fn sql(self) -> &'static str {
        match self {
            JoinKind::Inner => "INNER",
            JoinKind::Left => "LEFT",
            JoinKind::Right => "RIGHT",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn sql(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregateFn {
    Count,
    Sum,
    Min,
    Max,
    Avg,
}

impl AggregateFn {
    pub fn sql(self) -> &'static str {
        match self {
            AggregateFn::Count => "COUNT",
            AggregateFn::Sum => "SUM",
            AggregateFn::Min => "MIN",
            AggregateFn::Max => "MAX",
            AggregateFn::Avg => "AVG",
        }
    }

    fn accepts(self, data_type: DataType) -> bool {
        match self {
            AggregateFn::Count => true,
            AggregateFn::Sum | AggregateFn::Avg => data_type.is_numeric(),
            AggregateFn::Min | AggregateFn::Max => data_type.is_ordered(),
        }
    }
}

/// Aggregate projection request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Aggregate {
    func: AggregateFn,
    column: Option<String>,
    source: Option<String>,
    distinct: bool,
}

impl Aggregate {
    fn new(func: AggregateFn, column: Option<String>) -> Self {
        Self {
            func,
            column,
            source: None,
            distinct: false,
        }
    }

    pub fn count(column: impl Into<String>) -> Self {
        Self::new(AggregateFn::Count, Some(column.into()))
    }

    /// `COUNT(*)`
    pub fn count_all() -> Self {
        Self::new(AggregateFn::Count, None)
    }

    pub fn sum(column: impl Into<String>) -> Self {
        Self::new(AggregateFn::Sum, Some(column.into()))
    }

    pub fn min(column: impl Into<String>) -> Self {
        Self::new(AggregateFn::Min, Some(column.into()))
    }

    pub fn max(column: impl Into<String>) -> Self {
        Self::new(AggregateFn::Max, Some(column.into()))
    }

    pub fn avg(column: impl Into<String>) -> Self {
        Self::new(AggregateFn::Avg, Some(column.into()))
    }

    /// Aggregate over distinct values only
    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    /// Aggregate a column of a joined source instead of the root table
    pub fn of(mut self, alias: impl Into<String>) -> Self {
        self.source = Some(alias.into());
        self
    }
}

/// Output expression of a projection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectionExpr {
    Column {
        column: String,
    },
    Cast {
        column: String,
        data_type: DataType,
    },
    /// `column` is `None` for `COUNT(*)`
    Aggregate {
        func: AggregateFn,
        column: Option<String>,
        distinct: bool,
    },
}

/// One output column: an expression over a source, and its output alias
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Projection {
    source: String,
    expr: ProjectionExpr,
    alias: String,
}

impl Projection {
    /// Alias of the source the expression reads from
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn expr(&self) -> &ProjectionExpr {
        &self.expr
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    pub fn is_aggregate(&self) -> bool {
        matches!(self.expr, ProjectionExpr::Aggregate { .. })
    }
}

/// Join request, resolved against the schema by [`Select::join`]
#[derive(Debug, Clone)]
pub struct Join {
    kind: JoinKind,
    relation: String,
    alias: Option<String>,
    parent: Option<String>,
    filter: Option<Filter>,
}

impl Join {
    pub fn new(kind: JoinKind, relation: impl Into<String>) -> Self {
        Self {
            kind,
            relation: relation.into(),
            alias: None,
            parent: None,
            filter: None,
        }
    }

    pub fn inner(relation: impl Into<String>) -> Self {
        Self::new(JoinKind::Inner, relation)
    }

    pub fn left(relation: impl Into<String>) -> Self {
        Self::new(JoinKind::Left, relation)
    }

    pub fn right(relation: impl Into<String>) -> Self {
        Self::new(JoinKind::Right, relation)
    }

    /// Alias of the joined source; defaults to the relation name
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Follow the relation from an earlier join instead of the root table
    pub fn via(mut self, parent_alias: impl Into<String>) -> Self {
        self.parent = Some(parent_alias.into());
        self
    }

    /// Extra condition on the joined table, rendered into the `ON` clause
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }
}

/// Join resolved against the schema
#[derive(Debug, Clone)]
pub struct JoinClause<'m> {
    kind: JoinKind,
    parent: String,
    relation: &'m Relation,
    target: &'m TableDef,
    alias: String,
    filter: Option<Filter>,
}

impl<'m> JoinClause<'m> {
    pub fn kind(&self) -> JoinKind {
        self.kind
    }

    /// Alias of the source the relation is followed from
    pub fn parent(&self) -> &str {
        &self.parent
    }

    pub fn relation(&self) -> &'m Relation {
        self.relation
    }

    pub fn target(&self) -> &'m TableDef {
        self.target
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    pub fn filter(&self) -> Option<&Filter> {
        self.filter.as_ref()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SortTarget {
    Column { source: String, column: String },
    /// A projection's output alias
    Output(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub target: SortTarget,
    pub direction: SortDirection,
}

/// 1-based page number and page size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    page: i64,
    size: i64,
}

impl Page {
    /// # Errors
    ///
    /// Returns `Error::InvalidPaging` unless both `page` and `size` are positive.
    pub fn new(table: &str, page: i64, size: i64) -> Result<Self> {
        if page <= 0 || size <= 0 {
            return Err(Error::InvalidPaging {
                table: table.to_string(),
                page,
                page_size: size,
            });
        }
        Ok(Self { page, size })
    }

    pub fn number(&self) -> i64 {
        self.page
    }

    pub fn limit(&self) -> i64 {
        self.size
    }

    /// `(page - 1) * size`, saturating
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.size)
    }
}

/// Select descriptor rooted at one table
#[derive(Debug, Clone)]
pub struct Select<'m> {
    schema: &'m Schema,
    table: &'m TableDef,
    distinct: bool,
    projections: Vec<Projection>,
    joins: Vec<JoinClause<'m>>,
    filter: Option<Filter>,
    order: Vec<OrderBy>,
    page: Option<Page>,
    count: bool,
}

impl<'m> Select<'m> {
    /// Start a select over `table`. The root source's alias is the table name.
    ///
    /// # Errors
    ///
    /// Returns `Error::UnknownTable` if `table` is not in the schema.
    pub fn new(schema: &'m Schema, table: &str) -> Result<Self> {
        Ok(Self {
            schema,
            table: schema.table(table)?,
            distinct: false,
            projections: Vec::new(),
            joins: Vec::new(),
            filter: None,
            order: Vec::new(),
            page: None,
            count: false,
        })
    }

    pub fn schema(&self) -> &'m Schema {
        self.schema
    }

    pub fn table(&self) -> &'m TableDef {
        self.table
    }

    /// Alias of the root source
    pub fn root_alias(&self) -> &'m str {
        self.table.name()
    }

    pub fn is_distinct(&self) -> bool {
        self.distinct
    }

    /// Requested projections; empty means every root column in declaration order
    pub fn projections(&self) -> &[Projection] {
        &self.projections
    }

    pub fn joins(&self) -> &[JoinClause<'m>] {
        &self.joins
    }

    pub fn join_by_alias(&self, alias: &str) -> Option<&JoinClause<'m>> {
        self.joins.iter().find(|j| j.alias == alias)
    }

    pub fn filter_expr(&self) -> Option<&Filter> {
        self.filter.as_ref()
    }

    pub fn order(&self) -> &[OrderBy] {
        &self.order
    }

    pub fn page_spec(&self) -> Option<Page> {
        self.page
    }

    /// Whether this is a row count over the underlying select (see [`Select::to_count`])
    pub fn is_count(&self) -> bool {
        self.count
    }

    pub fn has_aggregates(&self) -> bool {
        self.projections.iter().any(Projection::is_aggregate)
    }

    /// Projections forming the implicit `GROUP BY`: every non-aggregated
    /// projection, and only when at least one aggregate is present
    pub fn group_by(&self) -> Vec<&Projection> {
        if !self.has_aggregates() {
            return Vec::new();
        }
        self.projections.iter().filter(|p| !p.is_aggregate()).collect()
    }

    /// Table behind a source alias (the root table's name or a join alias)
    ///
    /// # Errors
    ///
    /// Returns `Error::UnknownAlias` if no source has that alias.
    pub fn source(&self, alias: &str) -> Result<&'m TableDef> {
        if alias == self.root_alias() {
            return Ok(self.table);
        }
        self.join_by_alias(alias)
            .map(|j| j.target)
            .ok_or_else(|| self.unknown_alias(alias))
    }

    fn unknown_alias(&self, alias: &str) -> Error {
        Error::UnknownAlias {
            table: self.table.name().to_string(),
            alias: alias.to_string(),
        }
    }

    fn push_projection(mut self, source: &str, expr: ProjectionExpr, alias: String) -> Result<Self> {
        validate_identifier(&alias)?;
        if self.projections.iter().any(|p| p.alias == alias) {
            return Err(Error::DuplicateAlias {
                table: self.table.name().to_string(),
                alias,
            });
        }
        self.projections.push(Projection {
            source: source.to_string(),
            expr,
            alias,
        });
        Ok(self)
    }

    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    /// Project a root column under its own name
    pub fn column(self, column: &str) -> Result<Self> {
        self.column_as(column, column)
    }

    pub fn columns<'c>(self, columns: impl IntoIterator<Item = &'c str>) -> Result<Self> {
        columns.into_iter().try_fold(self, Select::column)
    }

    pub fn column_as(self, column: &str, alias: &str) -> Result<Self> {
        let root = self.root_alias();
        self.joined_column_as(root, column, alias)
    }

    /// Project a column of a joined source under its own name
    pub fn joined_column(self, source: &str, column: &str) -> Result<Self> {
        self.joined_column_as(source, column, column)
    }

    pub fn joined_column_as(self, source: &str, column: &str, alias: &str) -> Result<Self> {
        self.source(source)?.try_column(column)?;
        let expr = ProjectionExpr::Column {
            column: column.to_string(),
        };
        self.push_projection(source, expr, alias.to_string())
    }

    /// Project a root column converted with `CAST(... AS <type>)`
    pub fn column_cast(self, column: &str, data_type: DataType, alias: &str) -> Result<Self> {
        self.table.try_column(column)?;
        let expr = ProjectionExpr::Cast {
            column: column.to_string(),
            data_type,
        };
        let root = self.root_alias();
        self.push_projection(root, expr, alias.to_string())
    }

    /// Project an aggregate.
    ///
    /// Non-aggregated projections become the implicit `GROUP BY`.
    ///
    /// # Errors
    ///
    /// - `Error::UnknownAlias` / `Error::UnknownColumn` for unresolved names
    /// - `Error::TypeMismatch` for `SUM`/`AVG` over non-numeric columns and
    ///   `MIN`/`MAX` over unordered ones
    /// - `Error::InvalidDefinition` for `COUNT(DISTINCT *)`
    pub fn aggregate(self, aggregate: Aggregate, alias: &str) -> Result<Self> {
        let source = aggregate
            .source
            .clone()
            .unwrap_or_else(|| self.root_alias().to_string());
        let table = self.source(&source)?;
        match &aggregate.column {
            Some(column) => {
                let def = table.try_column(column)?;
                if !aggregate.func.accepts(def.data_type()) {
                    return Err(Error::type_mismatch(
                        table.name(),
                        column,
                        Some(aggregate.func.sql()),
                        format!("{} is not defined for {} columns", aggregate.func.sql(), def.data_type()),
                    ));
                }
            }
            None if aggregate.distinct => {
                return Err(Error::InvalidDefinition {
                    table: table.name().to_string(),
                    detail: "COUNT(*) cannot be DISTINCT".to_string(),
                })
            }
            None => {}
        }
        let expr = ProjectionExpr::Aggregate {
            func: aggregate.func,
            column: aggregate.column,
            distinct: aggregate.distinct,
        };
        self.push_projection(&source, expr, alias.to_string())
    }

    /// `COUNT(*) AS alias`
    pub fn count_all(self, alias: &str) -> Result<Self> {
        self.aggregate(Aggregate::count_all(), alias)
    }

    /// Add a join.
    ///
    /// Joins render in the order they are added.
    ///
    /// # Errors
    ///
    /// - `Error::UnknownAlias` if the join follows an unknown parent alias
    /// - `Error::UnknownRelation` if the parent table has no such relation
    /// - `Error::DuplicateAlias` if the alias is already taken
    /// - `Error::InvalidFilter` if the join filter constrains another table
    pub fn join(mut self, join: Join) -> Result<Self> {
        let parent = join
            .parent
            .unwrap_or_else(|| self.root_alias().to_string());
        let parent_table = self.source(&parent)?;
        let relation = parent_table.try_relation(&join.relation)?;
        let target = self.schema.table(relation.target())?;
        let alias = join.alias.unwrap_or_else(|| join.relation.clone());
        validate_identifier(&alias)?;
        if alias == self.root_alias() || self.join_by_alias(&alias).is_some() {
            return Err(Error::DuplicateAlias {
                table: self.table.name().to_string(),
                alias,
            });
        }
        if let Some(filter) = &join.filter {
            check_filter_table(filter, target, QueryKind::Select)?;
        }
        self.joins.push(JoinClause {
            kind: join.kind,
            parent,
            relation,
            target,
            alias,
            filter: join.filter,
        });
        Ok(self)
    }

    /// Restrict rows. Calling it again combines filters with `$and`.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidFilter` if the filter's leaves are not on the
    /// root table; constrain joined tables with
    /// [`Filter::related`](crate::filter::Filter::related).
    pub fn filter(mut self, filter: Filter) -> Result<Self> {
        check_filter_table(&filter, self.table, QueryKind::Select)?;
        self.filter = Some(match self.filter.take() {
            Some(existing) => existing.and(filter),
            None => filter,
        });
        Ok(self)
    }

    /// Restrict rows with a `$`-notation filter document
    pub fn filter_json(self, document: &serde_json::Value) -> Result<Self> {
        let filter = Filter::parse(self.schema, self.table.name(), document)?;
        self.filter(filter)
    }

    pub fn order_by(self, column: &str, direction: SortDirection) -> Result<Self> {
        let root = self.root_alias();
        self.order_by_joined(root, column, direction)
    }

    pub fn order_by_joined(mut self, source: &str, column: &str, direction: SortDirection) -> Result<Self> {
        self.source(source)?.try_column(column)?;
        self.order.push(OrderBy {
            target: SortTarget::Column {
                source: source.to_string(),
                column: column.to_string(),
            },
            direction,
        });
        Ok(self)
    }

    /// Sort by a projection's output alias
    pub fn order_by_output(mut self, alias: &str, direction: SortDirection) -> Result<Self> {
        if !self.projections.iter().any(|p| p.alias == alias) {
            return Err(self.unknown_alias(alias));
        }
        self.order.push(OrderBy {
            target: SortTarget::Output(alias.to_string()),
            direction,
        });
        Ok(self)
    }

    /// Page through results; `page` is 1-based.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidPaging` if `page` or `page_size` is not positive.
    pub fn page(mut self, page: i64, page_size: i64) -> Result<Self> {
        self.page = Some(Page::new(self.table.name(), page, page_size)?);
        Ok(self)
    }

    /// Count the rows this select would return across all pages.
    ///
    /// Sorting and paging are dropped; the remaining query becomes a
    /// subquery of `SELECT COUNT(*)`.
    pub fn to_count(&self) -> Select<'m> {
        Select {
            order: Vec::new(),
            page: None,
            count: true,
            ..self.clone()
        }
    }
}

/// Leaves at the top level of `filter` must constrain `table`
pub(crate) fn check_filter_table(filter: &Filter, table: &TableDef, kind: QueryKind) -> Result<()> {
    match filter.leaf_tables().find(|t| *t != table.name()) {
        Some(other) => Err(Error::InvalidFilter {
            table: table.name().to_string(),
            detail: format!("{kind} on `{}` cannot filter on `{other}` directly", table.name()),
        }),
        None => Ok(()),
    }
}
