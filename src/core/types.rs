use super::{OrmError, Result, Value};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Field type as seen by the mapping layer.
///
/// `Other` covers any field type outside the five known ones; dialects map it
/// to their text type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SemanticType {
    Int32,
    Int64,
    Bool,
    Float64,
    Text,
    Other(String),
}

impl SemanticType {
    pub fn name(&self) -> &str {
        match self {
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::Bool => "bool",
            Self::Float64 => "float64",
            Self::Text => "text",
            Self::Other(name) => name,
        }
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, Self::Int32 | Self::Int64)
    }
}

impl From<String> for SemanticType {
    fn from(name: String) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "int32" | "i32" | "int" => Self::Int32,
            "int64" | "i64" | "long" => Self::Int64,
            "bool" | "boolean" => Self::Bool,
            "float64" | "f64" | "double" => Self::Float64,
            "text" | "string" => Self::Text,
            _ => Self::Other(name),
        }
    }
}

impl From<SemanticType> for String {
    fn from(semantic_type: SemanticType) -> Self {
        semantic_type.name().to_string()
    }
}

impl fmt::Display for SemanticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Conversion between a Rust field type and a [`Value`].
///
/// Implemented for the field types `#[derive(Entity)]` understands. Implement it
/// for your own types to make them usable as columns; report
/// [`SemanticType::Other`] when none of the built-in kinds fit.
pub trait ColumnType: Sized {
    fn semantic_type() -> SemanticType;

    fn to_value(&self) -> Value;

    fn from_value(value: Value) -> Result<Self>;
}

fn not_assignable(value: &Value, target: &str) -> OrmError {
    OrmError::MappingError(format!(
        "value {} of type {} is not assignable to {}",
        value,
        value.type_name(),
        target
    ))
}

impl ColumnType for i64 {
    fn semantic_type() -> SemanticType {
        SemanticType::Int64
    }

    fn to_value(&self) -> Value {
        Value::Integer(*self)
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Integer(i) => Ok(i),
            other => Err(not_assignable(&other, "i64")),
        }
    }
}

impl ColumnType for i32 {
    fn semantic_type() -> SemanticType {
        SemanticType::Int32
    }

    fn to_value(&self) -> Value {
        Value::Integer(i64::from(*self))
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Integer(i) => i32::try_from(i).map_err(|_| {
                OrmError::MappingError(format!("integer {} is out of range for i32", i))
            }),
            other => Err(not_assignable(&other, "i32")),
        }
    }
}

impl ColumnType for bool {
    fn semantic_type() -> SemanticType {
        SemanticType::Bool
    }

    fn to_value(&self) -> Value {
        Value::Boolean(*self)
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Boolean(b) => Ok(b),
            other => Err(not_assignable(&other, "bool")),
        }
    }
}

impl ColumnType for f64 {
    fn semantic_type() -> SemanticType {
        SemanticType::Float64
    }

    fn to_value(&self) -> Value {
        Value::Float(*self)
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Float(f) => Ok(f),
            Value::Integer(i) => Ok(i as f64),
            other => Err(not_assignable(&other, "f64")),
        }
    }
}

impl ColumnType for String {
    fn semantic_type() -> SemanticType {
        SemanticType::Text
    }

    fn to_value(&self) -> Value {
        Value::Text(self.clone())
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Text(s) => Ok(s),
            other => Err(not_assignable(&other, "String")),
        }
    }
}

impl<T: ColumnType> ColumnType for Option<T> {
    fn semantic_type() -> SemanticType {
        T::semantic_type()
    }

    fn to_value(&self) -> Value {
        match self {
            Some(inner) => inner.to_value(),
            None => Value::Null,
        }
    }

    fn from_value(value: Value) -> Result<Self> {
        if value.is_null() {
            return Ok(None);
        }
        T::from_value(value).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_semantic_type_names() {
        assert_eq!(SemanticType::from("Int64".to_string()), SemanticType::Int64);
        assert_eq!(SemanticType::from("boolean".to_string()), SemanticType::Bool);
        assert_eq!(
            SemanticType::from("uuid".to_string()),
            SemanticType::Other("uuid".to_string())
        );
        assert_eq!(String::from(SemanticType::Float64), "float64");
    }

    #[test]
    fn test_i32_narrowing() {
        assert_eq!(i32::from_value(Value::Integer(12)).unwrap(), 12);
        assert!(i32::from_value(Value::Integer(i64::MAX)).unwrap_err().is_mapping());
    }

    #[test]
    fn test_unassignable_values() {
        assert!(i64::from_value(Value::Text("x".into())).unwrap_err().is_mapping());
        assert!(String::from_value(Value::Integer(1)).unwrap_err().is_mapping());
        assert!(bool::from_value(Value::Integer(1)).is_err());
    }

    #[test]
    fn test_option_columns() {
        assert_eq!(Option::<i64>::semantic_type(), SemanticType::Int64);
        assert_eq!(Option::<i64>::from_value(Value::Null).unwrap(), None);
        assert_eq!(Some(3i64).to_value(), Value::Integer(3));
        assert_eq!(f64::from_value(Value::Integer(2)).unwrap(), 2.0);
    }
}
