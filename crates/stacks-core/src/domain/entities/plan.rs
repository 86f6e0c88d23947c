//! Query execution plans.
//!
//! Plans are plain data handed across the storage port. The gateway builds
//! them; drivers interpret them (the memory driver) or render them
//! (the SQL renderer). Building the same request twice yields equal plans.

use serde::Serialize;

use crate::domain::{
    entities::record::Row,
    value_objects::{SortDirection, Value},
};

// ── Predicates ────────────────────────────────────────────────────────────────

/// One `WHERE` term. Terms of a plan are joined with `AND`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Predicate {
    /// `column = value`; never matches a `NULL` cell.
    Eq { column: String, value: Value },
    /// `column IS NULL`.
    IsNull { column: String },
    /// `column IN (values…)`; an empty list matches nothing.
    In { column: String, values: Vec<Value> },
}

impl Predicate {
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Eq {
            column: column.into(),
            value: value.into(),
        }
    }

    pub fn is_null(column: impl Into<String>) -> Self {
        Self::IsNull {
            column: column.into(),
        }
    }

    pub fn is_in(column: impl Into<String>, values: Vec<Value>) -> Self {
        Self::In {
            column: column.into(),
            values,
        }
    }

    pub fn column(&self) -> &str {
        match self {
            Self::Eq { column, .. } | Self::IsNull { column } | Self::In { column, .. } => column,
        }
    }

    /// Evaluate this term against a row with SQL semantics.
    pub fn matches(&self, row: &Row) -> bool {
        match self {
            Self::Eq { column, value } => row.get(column).is_some_and(|v| v.sql_eq(value)),
            Self::IsNull { column } => row.get(column).is_none_or(Value::is_null),
            Self::In { column, values } => row
                .get(column)
                .is_some_and(|v| values.iter().any(|candidate| v.sql_eq(candidate))),
        }
    }
}

/// `true` when every predicate holds (an empty list always holds).
pub fn matches_all(predicates: &[Predicate], row: &Row) -> bool {
    predicates.iter().all(|p| p.matches(row))
}

// ── Select ────────────────────────────────────────────────────────────────────

/// Projected columns of a select.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Projection {
    #[default]
    All,
    Columns(Vec<String>),
}

/// One `ORDER BY` term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderBy {
    pub column: String,
    pub direction: SortDirection,
}

impl OrderBy {
    pub fn new(column: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            column: column.into(),
            direction,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectPlan {
    pub table: String,
    pub projection: Projection,
    pub predicates: Vec<Predicate>,
    pub order: Vec<OrderBy>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl SelectPlan {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            projection: Projection::All,
            predicates: Vec::new(),
            order: Vec::new(),
            limit: None,
            offset: None,
        }
    }

    pub fn project(mut self, projection: Projection) -> Self {
        self.projection = projection;
        self
    }

    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    pub fn filters(mut self, predicates: impl IntoIterator<Item = Predicate>) -> Self {
        self.predicates.extend(predicates);
        self
    }

    pub fn order_by(mut self, order: OrderBy) -> Self {
        self.order.push(order);
        self
    }

    pub fn limit(mut self, limit: Option<u64>) -> Self {
        self.limit = limit;
        self
    }

    pub fn offset(mut self, offset: Option<u64>) -> Self {
        self.offset = offset;
        self
    }
}

// ── Count / Insert / Update / Delete ──────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountPlan {
    pub table: String,
    pub predicates: Vec<Predicate>,
}

/// Insert one row, returning it with its generated identity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InsertPlan {
    pub table: String,
    pub values: Row,
}

/// Update matching rows, returning every updated row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpdatePlan {
    pub table: String,
    pub set: Row,
    pub predicates: Vec<Predicate>,
}

/// Delete matching rows, returning their prior state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeletePlan {
    pub table: String,
    pub predicates: Vec<Predicate>,
}
