//! Filter rendering.

use super::writer::{escape_like, SqlWriter, LIKE_ESCAPE};
use crate::dialect::{Dialect, Feature};
use crate::error::Result;
use crate::filter::{Filter, FilterKind, Leaf, Operator, Predicate, Related};
use crate::value::Value;

/// Inner single-cardinality join a nested relation filter can be inlined against
#[derive(Debug, Clone, Copy)]
pub(crate) struct InlineJoin<'a> {
    pub parent: &'a str,
    pub relation: &'a str,
    pub alias: &'a str,
}

/// Render `filter` with its leaves qualified by `alias`.
///
/// Combinators with more than one child are parenthesized, so the tree
/// shape carries through to the SQL unchanged.
pub(crate) fn render(w: &mut SqlWriter<'_>, filter: &Filter, alias: &str, inline: &[InlineJoin<'_>]) -> Result<()> {
    match filter.kind() {
        FilterKind::Leaf(leaf) => leaf_sql(w, leaf, alias),
        FilterKind::And(children) => group(w, children, " AND ", alias, inline),
        FilterKind::Or(children) => group(w, children, " OR ", alias, inline),
        FilterKind::Related(related) => related_sql(w, related, alias, inline),
    }
}

fn group(w: &mut SqlWriter<'_>, children: &[Filter], sep: &str, alias: &str, inline: &[InlineJoin<'_>]) -> Result<()> {
    if let [only] = children {
        return render(w, only, alias, inline);
    }
    w.push("(");
    w.join(children, sep, |w, child| render(w, child, alias, inline))?;
    w.push(")");
    Ok(())
}

fn related_sql(w: &mut SqlWriter<'_>, related: &Related, alias: &str, inline: &[InlineJoin<'_>]) -> Result<()> {
    let relation = related.definition();
    if relation.is_single() {
        if let Some(join) = inline
            .iter()
            .find(|j| j.parent == alias && j.relation == relation.name())
        {
            return render(w, related.filter(), join.alias, inline);
        }
    }

    w.require(
        Feature::Subqueries,
        format!("filter on relation `{}`", relation.name()),
    )?;
    let sub = w.subquery_alias(relation.name());
    w.push("EXISTS (SELECT 1 FROM ");
    w.table_name(related.target_namespace(), relation.target());
    w.push(" ");
    w.ident(&sub);
    w.push(" WHERE ");
    w.join(relation.mapping(), " AND ", |w, (local, remote)| {
        w.qualified(alias, local);
        w.push(" = ");
        w.qualified(&sub, remote);
        Ok(())
    })?;
    w.push(" AND ");
    render(w, related.filter(), &sub, &[])?;
    w.push(")");
    Ok(())
}

fn leaf_sql(w: &mut SqlWriter<'_>, leaf: &Leaf, alias: &str) -> Result<()> {
    let column = |w: &mut SqlWriter<'_>| w.qualified(alias, leaf.column());
    match leaf.predicate() {
        Predicate::Compare(op, value) => {
            column(w);
            w.push(" ");
            w.push(op.comparison_sql().unwrap_or("="));
            w.push(" ");
            w.param(value.clone());
        }
        Predicate::Between(low, high) => {
            column(w);
            w.push(" BETWEEN ");
            w.param(low.clone());
            w.push(" AND ");
            w.param(high.clone());
        }
        Predicate::In(values) | Predicate::NotIn(values) if values.is_empty() => {
            // Empty IN matches nothing, empty NOT IN matches everything
            let matches_all = matches!(leaf.predicate(), Predicate::NotIn(_));
            w.push(if matches_all { "1 = 1" } else { "1 = 0" });
        }
        Predicate::In(values) | Predicate::NotIn(values) => {
            column(w);
            w.push(match leaf.predicate() {
                Predicate::NotIn(_) => " NOT IN (",
                _ => " IN (",
            });
            w.join(values, ", ", |w, v| {
                w.param(v.clone());
                Ok(())
            })?;
            w.push(")");
        }
        Predicate::IsNull => {
            column(w);
            w.push(" IS NULL");
        }
        Predicate::IsNotNull => {
            column(w);
            w.push(" IS NOT NULL");
        }
        Predicate::Like {
            pattern,
            negated,
            case_insensitive,
        } => {
            w.require(Feature::Patterns, pattern_detail(leaf))?;
            let not = if *negated { "NOT " } else { "" };
            match (*case_insensitive, w.dialect()) {
                (true, Dialect::Postgres) => {
                    column(w);
                    w.push(&format!(" {not}ILIKE "));
                    w.param(Value::String(pattern.clone()));
                }
                (true, _) => {
                    w.push("LOWER(");
                    column(w);
                    w.push(&format!(") {not}LIKE LOWER("));
                    w.param(Value::String(pattern.clone()));
                    w.push(")");
                }
                (false, _) => {
                    column(w);
                    w.push(&format!(" {not}LIKE "));
                    w.param(Value::String(pattern.clone()));
                }
            }
        }
        Predicate::Match { operator, text } => {
            w.require(Feature::Patterns, pattern_detail(leaf))?;
            let escaped = escape_like(text);
            let pattern = match operator {
                Operator::StartsWith => format!("{escaped}%"),
                Operator::EndsWith => format!("%{escaped}"),
                _ => format!("%{escaped}%"),
            };
            column(w);
            w.push(" LIKE ");
            w.param(Value::String(pattern));
            w.push(&format!(" ESCAPE '{LIKE_ESCAPE}'"));
        }
    }
    Ok(())
}

fn pattern_detail(leaf: &Leaf) -> String {
    format!("`{}` on {}.{}", leaf.predicate().operator(), leaf.table(), leaf.column())
}
