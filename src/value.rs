//! The closed native-value union used on both marshalling directions.
//!
//! Encoding branches on this enum instead of runtime type inspection, which
//! keeps the boolean/integer distinction explicit at the call boundary. The
//! single "determine from value" fallback is [`Value::try_from`] on a
//! [`serde_json::Value`], used by the bulk map-encoding entry point.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde_json::Value as JsonValue;

use crate::error::Error;

/// One native value, on either side of the wire.
///
/// `Null`/`Bool`/`Long`/`Double`/`String` map directly onto wire variants;
/// `Decimal`/`Date`/`Timestamp`/`Json` ride the string variant with a type
/// hint when encoded, and are produced by registry converters when decoded.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Long(i64),
    Double(f64),
    String(String),
    Decimal(Decimal),
    Date(NaiveDate),
    Timestamp(DateTime<Utc>),
    Json(JsonValue),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Long(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Double(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Value::Decimal(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_json(&self) -> Option<&JsonValue> {
        match self {
            Value::Json(j) => Some(j),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Long(i64::from(v))
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Long(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<Decimal> for Value {
    fn from(v: Decimal) -> Self {
        Value::Decimal(v)
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Value::Date(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::Timestamp(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

impl TryFrom<JsonValue> for Value {
    type Error = Error;

    /// Infer a value from dynamic JSON. Booleans are matched before numbers
    /// so a boolean can never be misclassified as a long. JSON numbers that
    /// fit neither `i64` nor `f64` (e.g. `u64` above `i64::MAX`) have no
    /// wire mapping.
    fn try_from(json: JsonValue) -> Result<Self, Error> {
        match json {
            JsonValue::Null => Ok(Value::Null),
            JsonValue::Bool(b) => Ok(Value::Bool(b)),
            JsonValue::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(Value::Long(i))
                } else if n.is_u64() {
                    // An integer past i64::MAX; as_f64 would cast it lossily.
                    Err(Error::UnsupportedValueType(format!(
                        "JSON integer out of range: {n}"
                    )))
                } else if let Some(f) = n.as_f64() {
                    Ok(Value::Double(f))
                } else {
                    Err(Error::UnsupportedValueType(format!(
                        "JSON number out of range: {n}"
                    )))
                }
            }
            JsonValue::String(s) => Ok(Value::String(s)),
            json @ (JsonValue::Array(_) | JsonValue::Object(_)) => Ok(Value::Json(json)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bool_inferred_before_number() {
        let v = Value::try_from(json!(true)).unwrap();
        assert_eq!(v, Value::Bool(true));

        let v = Value::try_from(json!(1)).unwrap();
        assert_eq!(v, Value::Long(1));
    }

    #[test]
    fn test_infer_structures_as_json() {
        let v = Value::try_from(json!({"a": 1})).unwrap();
        assert_eq!(v, Value::Json(json!({"a": 1})));

        let v = Value::try_from(json!([1, 2])).unwrap();
        assert_eq!(v, Value::Json(json!([1, 2])));
    }

    #[test]
    fn test_unrepresentable_number_rejected() {
        let v = Value::try_from(json!(u64::MAX));
        assert!(matches!(v, Err(Error::UnsupportedValueType(_))));

        // The whole out-of-i64 integer range is rejected, never cast lossily.
        let v = Value::try_from(json!(i64::MAX as u64 + 1));
        assert!(matches!(v, Err(Error::UnsupportedValueType(_))));
    }

    #[test]
    fn test_range_boundaries_stay_exact() {
        let v = Value::try_from(json!(i64::MAX)).unwrap();
        assert_eq!(v, Value::Long(i64::MAX));

        let v = Value::try_from(json!(1.11)).unwrap();
        assert_eq!(v, Value::Double(1.11));
    }

    #[test]
    fn test_option_maps_to_null() {
        assert_eq!(Value::from(None::<i64>), Value::Null);
        assert_eq!(Value::from(Some(5i64)), Value::Long(5));
    }
}
