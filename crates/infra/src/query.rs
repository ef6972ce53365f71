//! Declarative query composition shared by every backend.
//!
//! A [`Query`] names a table, equality / is-null filters, embedded relations,
//! ordering and an optional limit. The REST backend renders it as PostgREST
//! query parameters; the in-memory backend evaluates it directly.

use auditdesk_core::{Cardinality, Relation, Table};
use serde_json::Value;

use crate::store::DataAccessError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    /// `col=eq.value`
    Eq { column: String, value: String },
    /// `col=is.null`
    IsNull { column: String },
}

impl Filter {
    pub fn column(&self) -> &str {
        match self {
            Filter::Eq { column, .. } | Filter::IsNull { column } => column,
        }
    }

    /// PostgREST operator expression.
    pub fn render(&self) -> (String, String) {
        match self {
            Filter::Eq { column, value } => (column.clone(), format!("eq.{value}")),
            Filter::IsNull { column } => (column.clone(), "is.null".to_string()),
        }
    }

    /// Evaluate against a row value (`None` when the column is absent).
    pub fn matches(&self, value: Option<&Value>) -> bool {
        match self {
            Filter::Eq { value: expected, .. } => match value {
                Some(Value::String(s)) => s == expected,
                Some(Value::Null) | None => false,
                Some(other) => other.to_string() == *expected,
            },
            Filter::IsNull { .. } => matches!(value, None | Some(Value::Null)),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub column: String,
    pub direction: Direction,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    table: Table,
    filters: Vec<Filter>,
    embeds: Vec<Table>,
    order: Vec<Order>,
    limit: Option<usize>,
}

impl Query {
    pub fn table(table: Table) -> Self {
        Self {
            table,
            filters: Vec::new(),
            embeds: Vec::new(),
            order: Vec::new(),
            limit: None,
        }
    }

    pub fn eq(mut self, column: impl Into<String>, value: impl ToString) -> Self {
        self.filters.push(Filter::Eq {
            column: column.into(),
            value: value.to_string(),
        });
        self
    }

    pub fn is_null(mut self, column: impl Into<String>) -> Self {
        self.filters.push(Filter::IsNull { column: column.into() });
        self
    }

    /// Pull the related rows of `table` in the same round trip.
    pub fn embed(mut self, table: Table) -> Self {
        if !self.embeds.contains(&table) {
            self.embeds.push(table);
        }
        self
    }

    pub fn order_by(mut self, column: impl Into<String>, direction: Direction) -> Self {
        self.order.push(Order {
            column: column.into(),
            direction,
        });
        self
    }

    /// `created_at` descending.
    pub fn newest_first(self) -> Self {
        self.order_by("created_at", Direction::Desc)
    }

    pub fn limit(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }

    pub fn target(&self) -> Table {
        self.table
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn embeds(&self) -> &[Table] {
        &self.embeds
    }

    pub fn ordering(&self) -> &[Order] {
        &self.order
    }

    pub fn row_limit(&self) -> Option<usize> {
        self.limit
    }

    /// Resolve each embed to the foreign key it follows.
    pub fn relations(&self) -> Result<Vec<&'static Relation>, DataAccessError> {
        self.embeds
            .iter()
            .map(|to| {
                self.table.relation_to(*to).ok_or_else(|| {
                    DataAccessError::InvalidQuery(format!("{} has no relation to {}", self.table, to))
                })
            })
            .collect()
    }

    /// `*,clients(*),checklist_items(*)`
    pub fn select_clause(&self) -> String {
        let mut clause = String::from("*");
        for table in &self.embeds {
            clause.push(',');
            clause.push_str(table.as_str());
            clause.push_str("(*)");
        }
        clause
    }

    /// PostgREST query parameters, in a stable order.
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = vec![("select".to_string(), self.select_clause())];
        params.extend(self.filters.iter().map(Filter::render));
        if !self.order.is_empty() {
            let order = self
                .order
                .iter()
                .map(|o| {
                    let dir = match o.direction {
                        Direction::Asc => "asc",
                        Direction::Desc => "desc",
                    };
                    format!("{}.{dir}", o.column)
                })
                .collect::<Vec<_>>()
                .join(",");
            params.push(("order".to_string(), order));
        }
        if let Some(n) = self.limit {
            params.push(("limit".to_string(), n.to_string()));
        }
        params
    }

    /// Only the filters, for `count` requests.
    pub fn filter_params(&self) -> Vec<(String, String)> {
        self.filters.iter().map(Filter::render).collect()
    }
}

/// Value an embed takes when no related row exists.
pub fn empty_embed(cardinality: Cardinality) -> Value {
    match cardinality {
        Cardinality::ToOne => Value::Null,
        Cardinality::ToMany => Value::Array(Vec::new()),
    }
}
