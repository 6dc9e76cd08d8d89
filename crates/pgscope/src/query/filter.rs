//! Q objects for structured filtering.
//!
//! Q objects build filter expressions that combine with AND, OR and NOT.
//! Unlike raw conditions they stay structured until the relation is
//! rendered, which is why [`merge_with_or`](crate::scopes::merge_with_or)
//! refuses them.

use pgscope_core::{Dialect, PostgresDialect, SqlValue, ToSqlValue};
use std::fmt;

/// A filter expression that can be combined with other expressions.
///
/// # Example
///
/// ```
/// use pgscope::Q;
///
/// let q = Q::eq("status", "active").and(Q::gt("age", 18).or(Q::eq("verified", true)));
/// let (sql, params) = q.build();
/// assert_eq!(sql, r#"("status" = ?) AND (("age" > ?) OR ("verified" = ?))"#);
/// assert_eq!(params.len(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct Q {
    expr: FilterExpr,
}

/// Internal filter expression representation.
#[derive(Debug, Clone)]
pub enum FilterExpr {
    /// Simple comparison: field op value
    Comparison {
        field: String,
        op: CompareOp,
        value: SqlValue,
    },
    /// IS NULL check
    IsNull { field: String },
    /// IS NOT NULL check
    IsNotNull { field: String },
    /// IN list check
    InList {
        field: String,
        values: Vec<SqlValue>,
    },
    /// AND combination
    And(Box<FilterExpr>, Box<FilterExpr>),
    /// OR combination
    Or(Box<FilterExpr>, Box<FilterExpr>),
    /// NOT negation
    Not(Box<FilterExpr>),
}

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    /// Equal (=)
    Eq,
    /// Not equal (<>)
    Ne,
    /// Greater than (>)
    Gt,
    /// Greater than or equal (>=)
    Gte,
    /// Less than (<)
    Lt,
    /// Less than or equal (<=)
    Lte,
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Eq => write!(f, "="),
            Self::Ne => write!(f, "<>"),
            Self::Gt => write!(f, ">"),
            Self::Gte => write!(f, ">="),
            Self::Lt => write!(f, "<"),
            Self::Lte => write!(f, "<="),
        }
    }
}

impl Q {
    fn compare<V: ToSqlValue>(field: &str, op: CompareOp, value: V) -> Self {
        Self {
            expr: FilterExpr::Comparison {
                field: field.to_string(),
                op,
                value: value.to_sql_value(),
            },
        }
    }

    /// Creates an equality filter (field = value).
    pub fn eq<V: ToSqlValue>(field: &str, value: V) -> Self {
        Self::compare(field, CompareOp::Eq, value)
    }

    /// Creates an inequality filter (field <> value).
    pub fn ne<V: ToSqlValue>(field: &str, value: V) -> Self {
        Self::compare(field, CompareOp::Ne, value)
    }

    /// Creates a greater-than filter (field > value).
    pub fn gt<V: ToSqlValue>(field: &str, value: V) -> Self {
        Self::compare(field, CompareOp::Gt, value)
    }

    /// Creates a greater-than-or-equal filter (field >= value).
    pub fn gte<V: ToSqlValue>(field: &str, value: V) -> Self {
        Self::compare(field, CompareOp::Gte, value)
    }

    /// Creates a less-than filter (field < value).
    pub fn lt<V: ToSqlValue>(field: &str, value: V) -> Self {
        Self::compare(field, CompareOp::Lt, value)
    }

    /// Creates a less-than-or-equal filter (field <= value).
    pub fn lte<V: ToSqlValue>(field: &str, value: V) -> Self {
        Self::compare(field, CompareOp::Lte, value)
    }

    /// Creates an IS NULL filter.
    pub fn is_null(field: &str) -> Self {
        Self {
            expr: FilterExpr::IsNull {
                field: field.to_string(),
            },
        }
    }

    /// Creates an IS NOT NULL filter.
    pub fn is_not_null(field: &str) -> Self {
        Self {
            expr: FilterExpr::IsNotNull {
                field: field.to_string(),
            },
        }
    }

    /// Creates an IN list filter.
    ///
    /// An empty list matches nothing.
    pub fn in_list<V: ToSqlValue>(field: &str, values: Vec<V>) -> Self {
        Self {
            expr: FilterExpr::InList {
                field: field.to_string(),
                values: values.into_iter().map(ToSqlValue::to_sql_value).collect(),
            },
        }
    }

    /// Combines this filter with another using AND.
    #[must_use]
    pub fn and(self, other: Q) -> Q {
        Q {
            expr: FilterExpr::And(Box::new(self.expr), Box::new(other.expr)),
        }
    }

    /// Combines this filter with another using OR.
    #[must_use]
    pub fn or(self, other: Q) -> Q {
        Q {
            expr: FilterExpr::Or(Box::new(self.expr), Box::new(other.expr)),
        }
    }

    /// Negates this filter with NOT.
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Q {
        Q {
            expr: FilterExpr::Not(Box::new(self.expr)),
        }
    }

    /// Returns the internal filter expression.
    pub fn into_expr(self) -> FilterExpr {
        self.expr
    }

    /// Builds the SQL fragment and parameters.
    pub fn build(&self) -> (String, Vec<SqlValue>) {
        self.expr.build()
    }
}

impl From<Q> for FilterExpr {
    fn from(q: Q) -> Self {
        q.expr
    }
}

impl FilterExpr {
    /// Builds the SQL fragment and parameters, quoting every field name.
    pub fn build(&self) -> (String, Vec<SqlValue>) {
        match self {
            Self::Comparison { field, op, value } => {
                (format!("{} {op} ?", quote_field(field)), vec![value.clone()])
            }
            Self::IsNull { field } => (format!("{} IS NULL", quote_field(field)), vec![]),
            Self::IsNotNull { field } => (format!("{} IS NOT NULL", quote_field(field)), vec![]),
            Self::InList { values, .. } if values.is_empty() => ("1=0".to_string(), vec![]),
            Self::InList { field, values } => {
                let placeholders: Vec<&str> = values.iter().map(|_| "?").collect();
                (
                    format!("{} IN ({})", quote_field(field), placeholders.join(", ")),
                    values.clone(),
                )
            }
            Self::And(left, right) => {
                let (left_sql, mut left_params) = left.build();
                let (right_sql, right_params) = right.build();
                left_params.extend(right_params);
                (format!("({left_sql}) AND ({right_sql})"), left_params)
            }
            Self::Or(left, right) => {
                let (left_sql, mut left_params) = left.build();
                let (right_sql, right_params) = right.build();
                left_params.extend(right_params);
                (format!("({left_sql}) OR ({right_sql})"), left_params)
            }
            Self::Not(inner) => {
                let (inner_sql, params) = inner.build();
                (format!("NOT ({inner_sql})"), params)
            }
        }
    }
}

/// Quotes a field name; `table.column` quotes both parts.
fn quote_field(field: &str) -> String {
    let dialect = PostgresDialect::new();
    match field.rsplit_once('.') {
        Some((table, column)) => dialect.qualified_column(table, column),
        None => dialect.quote_column_name(field),
    }
}
