// Filter compiler: contract WHERE clauses to Totalum's filter grammar.
//
// Totalum only understands equality, `ne`, `lte`, `gte` and `regex`, so the
// richer contract vocabulary is approximated:
//
// - `lt`/`lte` both become `lte` and `gt`/`gte` both become `gte`. Strict
//   bounds cannot be expressed; boundary values are included.
// - `in` becomes an `or` of equalities (`{field: null}` for an empty list).
// - `not_in` becomes one `ne` conjunct per value, always at the top level
//   whatever the clause's own connector (nothing for an empty list).
// - `in`/`not_in` with a non-array value act as if given an empty list.
// - `contains`/`starts_with`/`ends_with` become case-insensitive regexes
//   built from the raw value. Metacharacters in it are not escaped.
//
// Clauses with the OR connector are gathered into a single `or` group that
// is placed first; every other clause is conjoined after it.

use totalum_auth_core::db::adapter::{Connector, FindManyQuery, Operator, SortDirection, WhereClause};
use totalum_auth_core::db::value::{format_timestamp, Value};
use totalum_auth_core::remote::{FilterNode, Predicate, RemoteFilter, RemoteSort};

use crate::naming;

/// Regex options used for the text operators.
const CASE_INSENSITIVE: &str = "i";

/// What a single clause compiles to.
enum Compiled {
    /// One node, placed according to the clause's connector.
    Node(FilterNode),
    /// Conjuncts that always go to the top level.
    Conjuncts(Vec<FilterNode>),
}

/// Convert a WHERE clause slice to a Totalum filter.
pub fn build_filter(clauses: &[WhereClause]) -> RemoteFilter {
    let mut and_conditions: Vec<FilterNode> = Vec::new();
    let mut or_group: Vec<FilterNode> = Vec::new();

    for clause in clauses {
        match compile_clause(clause) {
            Compiled::Conjuncts(nodes) => and_conditions.extend(nodes),
            Compiled::Node(node) if clause.connector == Connector::Or => or_group.push(node),
            Compiled::Node(node) => and_conditions.push(node),
        }
    }

    let mut conditions = Vec::with_capacity(and_conditions.len() + 1);
    if !or_group.is_empty() {
        conditions.push(FilterNode::Or(or_group));
    }
    conditions.extend(and_conditions);

    RemoteFilter { conditions }
}

/// Convert a single clause.
fn compile_clause(clause: &WhereClause) -> Compiled {
    let field = naming::field_to_remote(&clause.field);
    let value = filter_value(&clause.value);
    let node = |predicate| FilterNode::field(field.clone(), predicate);

    match clause.operator {
        Operator::Eq => Compiled::Node(node(Predicate::Equals(value))),
        Operator::Ne => Compiled::Node(node(Predicate::NotEquals(value))),
        Operator::Lt | Operator::Lte => Compiled::Node(node(Predicate::Lte(value))),
        Operator::Gt | Operator::Gte => Compiled::Node(node(Predicate::Gte(value))),
        Operator::In => {
            let values = as_list(value);
            if values.is_empty() {
                Compiled::Node(node(Predicate::Equals(Value::Null)))
            } else {
                Compiled::Node(FilterNode::Or(
                    values
                        .into_iter()
                        .map(|v| node(Predicate::Equals(v)))
                        .collect(),
                ))
            }
        }
        Operator::NotIn => Compiled::Conjuncts(
            as_list(value)
                .into_iter()
                .map(|v| node(Predicate::NotEquals(v)))
                .collect(),
        ),
        Operator::Contains => Compiled::Node(node(regex(value.to_text()))),
        Operator::StartsWith => Compiled::Node(node(regex(format!("^{}", value.to_text())))),
        Operator::EndsWith => Compiled::Node(node(regex(format!("{}$", value.to_text())))),
    }
}

fn regex(pattern: String) -> Predicate {
    Predicate::Regex {
        pattern,
        options: CASE_INSENSITIVE.to_string(),
    }
}

/// Dates are compared as their canonical text on the remote side.
fn filter_value(value: &Value) -> Value {
    match value {
        Value::Date(d) => Value::String(format_timestamp(d)),
        Value::Array(items) => Value::Array(items.iter().map(filter_value).collect()),
        other => other.clone(),
    }
}

/// `in`/`not_in` operands. Anything but an array counts as empty.
fn as_list(value: Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        _ => Vec::new(),
    }
}

/// Build the remote sort from a find-many query.
pub fn build_sort(query: &FindManyQuery) -> Option<RemoteSort> {
    query.sort_by.as_ref().map(|sort| RemoteSort {
        field: naming::field_to_remote(&sort.field),
        ascending: sort.direction == SortDirection::Asc,
    })
}
