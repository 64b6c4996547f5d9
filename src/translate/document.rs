//! Document target rendering.
//!
//! Queries render as JSON command documents (`find`, `count`, `insert`,
//! `update`, `delete`). Literals never appear in the document; each is a
//! `{"$param": n}` reference into the parameter list, numbered in document
//! order. Anything without a document equivalent (joins, aggregation,
//! relation filters, SQL patterns, DDL, transactions) fails with
//! `UnsupportedCapability` through the capability record.

use super::raw;
use crate::dialect::{Capabilities, Feature};
use crate::error::{Error, Result};
use crate::filter::{Filter, FilterKind, Leaf, Predicate};
use crate::query::{Assignment, Delete, Insert, ProjectionExpr, Query, QueryKind, Select, SortDirection, SortTarget, Update};
use crate::value::Value;
use serde_json::{json, Map, Value as Json};

struct DocWriter<'c> {
    caps: &'c Capabilities,
    kind: QueryKind,
    params: Vec<Value>,
}

impl<'c> DocWriter<'c> {
    fn param(&mut self, value: Value) -> Json {
        self.params.push(value);
        json!({ "$param": self.params.len() })
    }

    fn require(&self, feature: Feature, detail: impl AsRef<str>) -> Result<()> {
        self.caps.require(feature, self.kind, detail.as_ref())
    }

    fn filter(&mut self, filter: Option<&Filter>) -> Result<Json> {
        match filter {
            Some(filter) => self.node(filter),
            None => Ok(Json::Object(Map::new())),
        }
    }

    fn node(&mut self, filter: &Filter) -> Result<Json> {
        match filter.kind() {
            FilterKind::Leaf(leaf) => self.leaf(leaf),
            FilterKind::And(children) => self.group("$and", children),
            FilterKind::Or(children) => self.group("$or", children),
            FilterKind::Related(related) => {
                self.require(
                    Feature::Subqueries,
                    format!("filter on relation `{}`", related.relation()),
                )?;
                Ok(Json::Null)
            }
        }
    }

    fn group(&mut self, combinator: &str, children: &[Filter]) -> Result<Json> {
        if let [only] = children {
            return self.node(only);
        }
        let items = children
            .iter()
            .map(|child| self.node(child))
            .collect::<Result<Vec<_>>>()?;
        Ok(json!({ combinator: items }))
    }

    fn leaf(&mut self, leaf: &Leaf) -> Result<Json> {
        let condition = match leaf.predicate() {
            Predicate::Compare(op, value) => json!({ op.token(): self.param(value.clone()) }),
            Predicate::Between(low, high) => {
                let low = self.param(low.clone());
                let high = self.param(high.clone());
                json!({ "$gte": low, "$lte": high })
            }
            Predicate::In(values) => json!({ "$in": self.list(values) }),
            Predicate::NotIn(values) => json!({ "$nin": self.list(values) }),
            Predicate::IsNull => json!({ "$eq": Json::Null }),
            Predicate::IsNotNull => json!({ "$ne": Json::Null }),
            Predicate::Like { .. } | Predicate::Match { .. } => {
                self.require(
                    Feature::Patterns,
                    format!("`{}` on {}.{}", leaf.predicate().operator(), leaf.table(), leaf.column()),
                )?;
                Json::Null
            }
        };
        Ok(json!({ leaf.column(): condition }))
    }

    fn list(&mut self, values: &[Value]) -> Vec<Json> {
        values.iter().map(|v| self.param(v.clone())).collect()
    }

    /// Documents cannot evaluate generator expressions; every reference
    /// must have been resolved to a value
    fn unresolved(&self, column: &str, name: &str) -> Error {
        match self.caps.generator(name) {
            None => Error::UnknownGenerator {
                dialect: self.caps.dialect(),
                name: name.to_string(),
                column: column.to_string(),
            },
            Some(_) => Error::UnresolvedGenerator {
                dialect: self.caps.dialect(),
                name: name.to_string(),
                column: column.to_string(),
            },
        }
    }

    fn assignment(&mut self, column: &str, assignment: &Assignment) -> Result<Json> {
        match assignment {
            Assignment::Value(value) => Ok(self.param(value.clone())),
            Assignment::Generator(name) => Err(self.unresolved(column, name)),
        }
    }

    fn no_returning(&self, columns: &[String], table: &str) -> Result<()> {
        if columns.is_empty() {
            Ok(())
        } else {
            self.require(Feature::Returning, format!("on `{table}`"))
        }
    }
}

fn select(w: &mut DocWriter<'_>, select: &Select<'_>) -> Result<Json> {
    let table = select.table().name();
    if let Some(join) = select.joins().first() {
        w.require(Feature::Joins, format!("join `{}` on `{table}`", join.alias()))?;
    }
    if select.is_distinct() {
        w.require(Feature::Aggregation, format!("DISTINCT on `{table}`"))?;
    }
    let mut projection = Map::new();
    for p in select.projections() {
        match p.expr() {
            ProjectionExpr::Column { column } if column == p.alias() => {
                projection.insert(p.alias().to_string(), json!(1));
            }
            ProjectionExpr::Column { column } => {
                projection.insert(p.alias().to_string(), json!(format!("${column}")));
            }
            ProjectionExpr::Cast { column, .. } => {
                w.require(Feature::Cast, format!("cast of `{column}`"))?;
            }
            ProjectionExpr::Aggregate { func, .. } => {
                w.require(Feature::Aggregation, format!("{} on `{table}`", func.sql()))?;
            }
        }
    }

    let filter = w.filter(select.filter_expr())?;
    if select.is_count() {
        return Ok(json!({ "count": table, "query": filter }));
    }

    let mut command = Map::new();
    command.insert("find".to_string(), json!(table));
    command.insert("filter".to_string(), filter);
    if !projection.is_empty() {
        command.insert("projection".to_string(), Json::Object(projection));
    }
    if !select.order().is_empty() {
        let mut sort = Map::new();
        for order in select.order() {
            let field = match &order.target {
                SortTarget::Column { column, .. } => column.clone(),
                SortTarget::Output(alias) => select
                    .projections()
                    .iter()
                    .find(|p| p.alias() == alias)
                    .and_then(|p| match p.expr() {
                        ProjectionExpr::Column { column } => Some(column.clone()),
                        _ => None,
                    })
                    .unwrap_or_else(|| alias.clone()),
            };
            let direction = match order.direction {
                SortDirection::Asc => 1,
                SortDirection::Desc => -1,
            };
            sort.insert(field, json!(direction));
        }
        command.insert("sort".to_string(), Json::Object(sort));
    }
    if let Some(page) = select.page_spec() {
        let skip = w.param(Value::Int(page.offset()));
        let limit = w.param(Value::Int(page.limit()));
        command.insert("skip".to_string(), skip);
        command.insert("limit".to_string(), limit);
    }
    Ok(Json::Object(command))
}

fn insert(w: &mut DocWriter<'_>, insert: &Insert<'_>) -> Result<Json> {
    let table = insert.table().name();
    if insert.rows().is_empty() {
        return Err(Error::InvalidDefinition {
            table: table.to_string(),
            detail: "insert has no rows".to_string(),
        });
    }
    if let Some((column, name)) = insert.generated_defaults().next() {
        return Err(w.unresolved(column.name(), name));
    }
    w.no_returning(insert.returning_columns(), table)?;

    let mut documents = Vec::with_capacity(insert.rows().len());
    for row in insert.rows() {
        let mut document = Map::new();
        for (column, assignment) in insert.columns().iter().zip(row) {
            let value = w.assignment(column, assignment)?;
            document.insert(column.clone(), value);
        }
        documents.push(Json::Object(document));
    }
    Ok(json!({ "insert": table, "documents": documents }))
}

fn update(w: &mut DocWriter<'_>, update: &Update<'_>) -> Result<Json> {
    let table = update.table().name();
    if update.assignments().is_empty() {
        return Err(Error::InvalidDefinition {
            table: table.to_string(),
            detail: "update sets no columns".to_string(),
        });
    }
    w.no_returning(update.returning_columns(), table)?;

    let query = w.filter(update.filter_expr())?;
    let mut set = Map::new();
    for (column, assignment) in update.assignments() {
        let value = w.assignment(column, assignment)?;
        set.insert(column.clone(), value);
    }
    Ok(json!({
        "update": table,
        "updates": [{ "q": query, "u": { "$set": set }, "multi": true }],
    }))
}

fn delete(w: &mut DocWriter<'_>, delete: &Delete<'_>) -> Result<Json> {
    let table = delete.table().name();
    w.no_returning(delete.returning_columns(), table)?;
    let query = w.filter(delete.filter_expr())?;
    Ok(json!({ "delete": table, "deletes": [{ "q": query, "limit": 0 }] }))
}

pub(crate) fn render(caps: &Capabilities, query: &Query<'_>) -> Result<(String, Vec<Value>)> {
    let mut w = DocWriter {
        caps,
        kind: query.kind(),
        params: Vec::new(),
    };
    let command = match query {
        Query::Select(q) => select(&mut w, q)?,
        Query::Insert(q) => insert(&mut w, q)?,
        Query::Update(q) => update(&mut w, q)?,
        Query::Delete(q) => delete(&mut w, q)?,
        Query::Raw(q) => return raw::render(caps, q),
        Query::Transaction(_) => {
            w.require(Feature::Transactions, "control statement")?;
            Json::Null
        }
        Query::CreateTable(_) | Query::DropTable(_) | Query::CreateView(_) => {
            w.require(Feature::Ddl, format!("on `{}`", query.table().unwrap_or_default()))?;
            Json::Null
        }
    };
    Ok((command.to_string(), w.params))
}
