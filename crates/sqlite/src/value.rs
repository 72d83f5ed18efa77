//! Typed column values.

use crate::{ColumnType, Error, Result};
use std::fmt;

/// The content of a single column, or a value to bind to a statement parameter.
///
/// Once extracted from a row the value is independent of the statement it came from.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Integer(i64),
    Real(f64),
    Text(String),
    Null,
}

impl FieldValue {
    pub fn column_type(&self) -> ColumnType {
        match self {
            FieldValue::Integer(_) => ColumnType::Integer,
            FieldValue::Real(_) => ColumnType::Float,
            FieldValue::Text(_) => ColumnType::Text,
            FieldValue::Null => ColumnType::Null,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_real(&self) -> Option<f64> {
        match self {
            FieldValue::Real(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(v) => Some(v.as_str()),
            _ => None,
        }
    }

    /// Typed extraction, fails with a value error when the variant does not match `T`
    ///
    /// ```ignore
    /// let count: i64 = value.get()?;
    /// let name: Option<String> = value.get()?;
    /// ```
    pub fn get<T: FromField>(&self) -> Result<T> {
        T::from_field(self)
    }
}

impl fmt::Display for FieldValue {
    /// The untyped text representation, null is rendered as an empty string
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Integer(v) => write!(f, "{v}"),
            FieldValue::Real(v) => write!(f, "{v}"),
            FieldValue::Text(v) => f.write_str(v),
            FieldValue::Null => Ok(()),
        }
    }
}

/// Conversion out of a [`FieldValue`] without reinterpreting mismatched variants.
pub trait FromField: Sized {
    fn from_field(value: &FieldValue) -> Result<Self>;
}

fn type_mismatch(expected: ColumnType, value: &FieldValue) -> Error {
    Error::ValueError(format!("Expected {expected} value, found {}", value.column_type()))
}

impl FromField for i64 {
    fn from_field(value: &FieldValue) -> Result<Self> {
        value.as_integer().ok_or_else(|| type_mismatch(ColumnType::Integer, value))
    }
}

impl FromField for i32 {
    fn from_field(value: &FieldValue) -> Result<Self> {
        let v = i64::from_field(value)?;
        i32::try_from(v).map_err(|_| Error::ValueError(format!("Integer value {v} does not fit in 32 bits")))
    }
}

impl FromField for f64 {
    fn from_field(value: &FieldValue) -> Result<Self> {
        value.as_real().ok_or_else(|| type_mismatch(ColumnType::Float, value))
    }
}

impl FromField for String {
    fn from_field(value: &FieldValue) -> Result<Self> {
        value
            .as_text()
            .map(str::to_string)
            .ok_or_else(|| type_mismatch(ColumnType::Text, value))
    }
}

impl<T: FromField> FromField for Option<T> {
    fn from_field(value: &FieldValue) -> Result<Self> {
        if value.is_null() { Ok(None) } else { T::from_field(value).map(Some) }
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Integer(v)
    }
}

impl From<i32> for FieldValue {
    fn from(v: i32) -> Self {
        FieldValue::Integer(i64::from(v))
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Real(v)
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::Text(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Text(v.to_string())
    }
}

impl From<()> for FieldValue {
    fn from(_: ()) -> Self {
        FieldValue::Null
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(FieldValue::Null, Into::into)
    }
}

/// Build a bind list from heterogeneous values.
///
/// Usage: `stmt.bind(params!["Tom Brady", 28, 7])?`
#[macro_export]
macro_rules! params {
    ($($val:expr),* $(,)?) => {
        &[$($crate::FieldValue::from($val)),*][..]
    };
}
