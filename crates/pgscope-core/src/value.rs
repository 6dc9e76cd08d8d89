//! SQL values, parameter handling and array arguments.
//!
//! Scope builders never splice caller values into SQL text. They collect
//! [`SqlValue`]s as bound parameters, with one exception: the literal
//! `VALUES (...)` tuples of set membership, rendered through
//! [`SqlValue::to_sql_inline`].

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A SQL value that can be used as a parameter.
///
/// Serializes untagged, so JSON metadata can carry parameters as plain
/// `null`, `true`, `42`, `1.5` or `"text"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SqlValue {
    /// NULL value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Float value.
    Float(f64),
    /// Text value.
    Text(String),
    /// Binary blob value.
    Blob(Vec<u8>),
}

impl SqlValue {
    /// Returns the SQL representation for inline use.
    ///
    /// Text is wrapped in single quotes with embedded quotes doubled, and
    /// blobs use PostgreSQL's `'\x...'` bytea escape form. NaN and the
    /// infinities become quoted `float8` literals.
    ///
    /// **Warning**: only use this for trusted values. Prefer parameters.
    #[must_use]
    pub fn to_sql_inline(&self) -> String {
        match self {
            Self::Null => String::from("NULL"),
            Self::Bool(true) => String::from("TRUE"),
            Self::Bool(false) => String::from("FALSE"),
            Self::Int(n) => format!("{n}"),
            Self::Float(f) if f.is_nan() => String::from("'NaN'::float8"),
            Self::Float(f) if f.is_infinite() && f.is_sign_negative() => {
                String::from("'-Infinity'::float8")
            }
            Self::Float(f) if f.is_infinite() => String::from("'Infinity'::float8"),
            Self::Float(f) => format!("{f}"),
            Self::Text(s) => {
                let escaped = s.replace('\'', "''");
                format!("'{escaped}'")
            }
            Self::Blob(b) => {
                let hex: String = b.iter().map(|byte| format!("{byte:02x}")).collect();
                format!("'\\x{hex}'::bytea")
            }
        }
    }

    /// Returns whether this is a text value.
    #[must_use]
    pub const fn is_text(&self) -> bool {
        matches!(self, Self::Text(_))
    }

    /// Returns the parameter placeholder used while fragments are composed.
    ///
    /// Placeholders are renumbered to `$1, $2, ...` when a statement is
    /// rendered for PostgreSQL.
    #[must_use]
    pub const fn placeholder() -> &'static str {
        "?"
    }

    /// Key identifying a value for de-duplication.
    ///
    /// `Int(1)` and `Float(1.0)` are distinct values here, as are `Int(1)`
    /// and `Text("1")`.
    fn dedup_key(&self) -> String {
        format!("{self:?}")
    }
}

/// Trait for types that can be converted to SQL values.
pub trait ToSqlValue {
    /// Converts the value to a `SqlValue`.
    fn to_sql_value(self) -> SqlValue;
}

impl ToSqlValue for SqlValue {
    fn to_sql_value(self) -> SqlValue {
        self
    }
}

macro_rules! impl_to_sql_value {
    ($variant:ident: $($ty:ty),+) => {
        $(
            impl ToSqlValue for $ty {
                fn to_sql_value(self) -> SqlValue {
                    SqlValue::$variant(self.into())
                }
            }
        )+
    };
}

impl_to_sql_value!(Bool: bool);
impl_to_sql_value!(Int: i64, i32, i16, i8, u32, u16, u8);
impl_to_sql_value!(Float: f64, f32);
impl_to_sql_value!(Text: String, &str);

impl<T: ToSqlValue> ToSqlValue for Option<T> {
    fn to_sql_value(self) -> SqlValue {
        match self {
            Some(v) => v.to_sql_value(),
            None => SqlValue::Null,
        }
    }
}

impl ToSqlValue for Vec<u8> {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Blob(self)
    }
}

impl ToSqlValue for &[u8] {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Blob(self.to_vec())
    }
}

/// An array argument: a single scalar or an arbitrarily nested list.
///
/// Scope builders accept `impl Into<Values>` so that `"a"`, `vec!["a", "b"]`
/// and `vec![vec![1, 2], vec![3]]` are all valid arguments. Call
/// [`Values::flatten`] to collapse the tree into the parameter list.
///
/// ```
/// use pgscope_core::value::{SqlValue, Values};
///
/// let nested = Values::from(vec![vec![1, 2], vec![3]]);
/// assert_eq!(
///     nested.flatten(),
///     vec![SqlValue::Int(1), SqlValue::Int(2), SqlValue::Int(3)]
/// );
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Values {
    /// A single scalar value.
    One(SqlValue),
    /// A list, possibly containing further lists.
    Many(Vec<Values>),
}

impl Values {
    /// Returns an empty list.
    #[must_use]
    pub const fn empty() -> Self {
        Self::Many(Vec::new())
    }

    /// Returns whether the argument was supplied as a list.
    #[must_use]
    pub const fn is_list(&self) -> bool {
        matches!(self, Self::Many(_))
    }

    /// Collapses every nesting level into one flat list, preserving order.
    #[must_use]
    pub fn flatten(self) -> Vec<SqlValue> {
        let mut out = Vec::new();
        self.flatten_into(&mut out);
        out
    }

    fn flatten_into(self, out: &mut Vec<SqlValue>) {
        match self {
            Self::One(value) => out.push(value),
            Self::Many(items) => {
                for item in items {
                    item.flatten_into(out);
                }
            }
        }
    }
}

/// Removes repeated values, keeping the first occurrence of each.
#[must_use]
pub fn dedup_values(values: Vec<SqlValue>) -> Vec<SqlValue> {
    let mut seen = HashSet::new();
    values
        .into_iter()
        .filter(|v| seen.insert(v.dedup_key()))
        .collect()
}

macro_rules! impl_values_from_scalar {
    ($($ty:ty),+) => {
        $(
            impl From<$ty> for Values {
                fn from(value: $ty) -> Self {
                    Self::One(value.to_sql_value())
                }
            }
        )+
    };
}

impl_values_from_scalar!(SqlValue, bool, i64, i32, i16, i8, u32, u16, u8, f64, f32, String, &str);

impl<T: Into<Values>> From<Option<T>> for Values {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => v.into(),
            None => Self::One(SqlValue::Null),
        }
    }
}

impl<T: Into<Values>> From<Vec<T>> for Values {
    fn from(items: Vec<T>) -> Self {
        Self::Many(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Values>, const N: usize> From<[T; N]> for Values {
    fn from(items: [T; N]) -> Self {
        Self::Many(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Clone + Into<Values>> From<&[T]> for Values {
    fn from(items: &[T]) -> Self {
        Self::Many(items.iter().cloned().map(Into::into).collect())
    }
}
