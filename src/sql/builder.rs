//! Builds the three parameterized SELECT statements (page, total count, filtered count) from a parsed intent.

use crate::error::BuildError;
use crate::intent::{QueryIntent, SafeIdentifier};
use crate::sql::BindValue;

/// Statement text plus the values bound to its `?` placeholders, in placeholder order.
#[derive(Clone, Debug, PartialEq)]
pub struct ParameterizedStatement {
    pub sql: String,
    pub params: Vec<BindValue>,
}

impl ParameterizedStatement {
    fn new() -> Self {
        ParameterizedStatement {
            sql: String::new(),
            params: Vec::new(),
        }
    }

    fn push_param(&mut self, v: BindValue) {
        self.params.push(v);
    }

    fn placeholder_count(&self) -> usize {
        self.sql.matches('?').count()
    }
}

/// The statements answering one request. All are built from the same filters.
#[derive(Clone, Debug, PartialEq)]
pub struct StatementSet {
    pub data: ParameterizedStatement,
    pub total_count: ParameterizedStatement,
    pub filtered_count: ParameterizedStatement,
}

/// ` WHERE a > ? AND b = ?` with values pushed in filter order; empty when there are no filters.
fn where_clause(intent: &QueryIntent, q: &mut ParameterizedStatement) -> String {
    let mut where_parts = Vec::with_capacity(intent.filters.len());
    for f in &intent.filters {
        q.push_param(f.value.clone());
        where_parts.push(format!("{} {} ?", f.field, f.op.as_sql()));
    }
    if where_parts.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", where_parts.join(" AND "))
    }
}

/// SELECT fields with filters, ORDER BY, LIMIT and optional OFFSET.
pub fn select_page(table: &SafeIdentifier, intent: &QueryIntent) -> ParameterizedStatement {
    let mut q = ParameterizedStatement::new();
    let cols = intent
        .fields
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    let where_clause = where_clause(intent, &mut q);
    let order_clause = if intent.order.is_empty() {
        String::new()
    } else {
        let parts: Vec<String> = intent
            .order
            .iter()
            .map(|o| format!("{} {}", o.field, o.direction.as_sql()))
            .collect();
        format!(" ORDER BY {}", parts.join(", "))
    };
    let limit_clause = format!(" LIMIT {}", intent.limit);
    let offset_clause = intent.offset.map(|n| format!(" OFFSET {}", n)).unwrap_or_default();
    q.sql = format!(
        "SELECT {} FROM {}{}{}{}{}",
        cols, table, where_clause, order_clause, limit_clause, offset_clause
    );
    q
}

/// COUNT of every row in the table; ignores filters.
pub fn count_all(table: &SafeIdentifier) -> ParameterizedStatement {
    let mut q = ParameterizedStatement::new();
    q.sql = format!("SELECT COUNT(*) AS count FROM {}", table);
    q
}

/// COUNT of rows matching the intent's filters, with the same predicates and values as `select_page`.
pub fn count_filtered(table: &SafeIdentifier, intent: &QueryIntent) -> ParameterizedStatement {
    let mut q = ParameterizedStatement::new();
    let where_clause = where_clause(intent, &mut q);
    q.sql = format!("SELECT COUNT(*) AS count FROM {}{}", table, where_clause);
    q
}

/// Build all three statements and check each one binds exactly one value per placeholder.
pub fn build(table: &SafeIdentifier, intent: &QueryIntent) -> Result<StatementSet, BuildError> {
    let set = StatementSet {
        data: select_page(table, intent),
        total_count: count_all(table),
        filtered_count: count_filtered(table, intent),
    };
    for q in [&set.data, &set.total_count, &set.filtered_count] {
        let placeholders = q.placeholder_count();
        if placeholders != q.params.len() {
            return Err(BuildError::PlaceholderMismatch {
                sql: q.sql.clone(),
                placeholders,
                params: q.params.len(),
            });
        }
    }
    tracing::debug!(
        data = %set.data.sql,
        filtered_count = %set.filtered_count.sql,
        params = ?set.data.params,
        "statements built"
    );
    Ok(set)
}
