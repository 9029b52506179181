//! Pluggable per-SQL-type value normalization.
//!
//! A [`ConverterRegistry`] maps a SQL type name to a [`Converter`]
//! capability. Registries are injected explicitly wherever decoding happens;
//! there is no process-wide default, so tests can substitute fakes freely.
//!
//! Two registries ship:
//! - [`ConverterRegistry::graphql`] keeps values JSON-friendly: `jsonb`/`json`
//!   parse into structures, timestamps become ISO-8601 strings with a `Z`
//!   suffix, `numeric` becomes a double.
//! - [`ConverterRegistry::native`] produces rich native types: timestamps
//!   parse into UTC datetimes, `numeric` into arbitrary-precision decimals,
//!   `date` into calendar dates.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;

use crate::error::ConvertError;
use crate::value::Value;

/// A single-method normalization capability for one SQL type.
///
/// Converters are total or partial functions from the raw wire payload to a
/// native value; a converter is never invoked on a null cell.
pub trait Converter: Send + Sync {
    fn convert(&self, raw: &Value) -> Result<Value, ConvertError>;
}

fn expect_str(raw: &Value) -> Result<&str, ConvertError> {
    raw.as_str()
        .ok_or_else(|| ConvertError::new(format!("expected string payload, got {raw:?}")))
}

/// `jsonb`/`json` text → parsed JSON structure.
pub struct JsonToStructure;

impl Converter for JsonToStructure {
    fn convert(&self, raw: &Value) -> Result<Value, ConvertError> {
        let text = expect_str(raw)?;
        let parsed = serde_json::from_str(text)
            .map_err(|e| ConvertError::new(format!("invalid JSON: {e}")))?;
        Ok(Value::Json(parsed))
    }
}

/// Timestamp text → ISO-8601 string with a `Z` suffix, for consumers that
/// want timestamps to stay JSON-scalar (GraphQL responses).
pub struct TimestampToIsoZ;

impl Converter for TimestampToIsoZ {
    fn convert(&self, raw: &Value) -> Result<Value, ConvertError> {
        let text = expect_str(raw)?;
        Ok(Value::String(format!("{}Z", text.replacen(' ', "T", 1))))
    }
}

/// Timestamp text → timezone-aware UTC datetime. The service emits naive
/// `YYYY-MM-DD HH:MM:SS[.ffffff]` text in UTC; fractional seconds are
/// optional.
pub struct TimestampToUtc;

impl Converter for TimestampToUtc {
    fn convert(&self, raw: &Value) -> Result<Value, ConvertError> {
        let text = expect_str(raw)?;
        let naive = NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f")
            .map_err(|e| ConvertError::new(format!("invalid timestamp: {e}")))?;
        Ok(Value::Timestamp(DateTime::<Utc>::from_naive_utc_and_offset(
            naive, Utc,
        )))
    }
}

/// `numeric` text → double.
pub struct NumericToDouble;

impl Converter for NumericToDouble {
    fn convert(&self, raw: &Value) -> Result<Value, ConvertError> {
        let text = expect_str(raw)?;
        let parsed: f64 = text
            .parse()
            .map_err(|e| ConvertError::new(format!("invalid numeric: {e}")))?;
        Ok(Value::Double(parsed))
    }
}

/// `numeric` text → arbitrary-precision decimal.
pub struct NumericToDecimal;

impl Converter for NumericToDecimal {
    fn convert(&self, raw: &Value) -> Result<Value, ConvertError> {
        let text = expect_str(raw)?;
        let parsed = Decimal::from_str(text)
            .map_err(|e| ConvertError::new(format!("invalid numeric: {e}")))?;
        Ok(Value::Decimal(parsed))
    }
}

/// `date` text → calendar date.
pub struct DateToNaive;

impl Converter for DateToNaive {
    fn convert(&self, raw: &Value) -> Result<Value, ConvertError> {
        let text = expect_str(raw)?;
        let parsed = NaiveDate::parse_from_str(text, "%Y-%m-%d")
            .map_err(|e| ConvertError::new(format!("invalid date: {e}")))?;
        Ok(Value::Date(parsed))
    }
}

/// Mapping from SQL type name to converter capability.
#[derive(Clone, Default)]
pub struct ConverterRegistry {
    map: HashMap<String, Arc<dyn Converter>>,
}

impl ConverterRegistry {
    /// An empty registry: every column passes through unconverted.
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, type_name: impl Into<String>, converter: Arc<dyn Converter>) -> Self {
        self.map.insert(type_name.into(), converter);
        self
    }

    pub fn register(&mut self, type_name: impl Into<String>, converter: Arc<dyn Converter>) {
        self.map.insert(type_name.into(), converter);
    }

    pub fn get(&self, type_name: &str) -> Option<&dyn Converter> {
        self.map.get(type_name).map(AsRef::as_ref)
    }

    /// GraphQL-oriented registry: JSON parses, timestamps stay ISO strings,
    /// numerics become doubles.
    pub fn graphql() -> Self {
        Self::new()
            .with("json", Arc::new(JsonToStructure))
            .with("jsonb", Arc::new(JsonToStructure))
            .with("timestamp", Arc::new(TimestampToIsoZ))
            .with("timestamptz", Arc::new(TimestampToIsoZ))
            .with("numeric", Arc::new(NumericToDouble))
    }

    /// Native-oriented registry: JSON parses, timestamps become UTC
    /// datetimes, numerics become decimals, dates become calendar dates.
    pub fn native() -> Self {
        Self::new()
            .with("json", Arc::new(JsonToStructure))
            .with("jsonb", Arc::new(JsonToStructure))
            .with("timestamp", Arc::new(TimestampToUtc))
            .with("timestamptz", Arc::new(TimestampToUtc))
            .with("numeric", Arc::new(NumericToDecimal))
            .with("date", Arc::new(DateToNaive))
    }
}

impl std::fmt::Debug for ConverterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut types: Vec<&str> = self.map.keys().map(String::as_str).collect();
        types.sort_unstable();
        f.debug_struct("ConverterRegistry")
            .field("types", &types)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_json_converter_parses_structures() {
        let v = JsonToStructure
            .convert(&Value::String(r#"{"a": [1, 2]}"#.to_string()))
            .unwrap();
        assert_eq!(v, Value::Json(json!({"a": [1, 2]})));
    }

    #[test]
    fn test_json_converter_rejects_malformed_text() {
        let err = JsonToStructure
            .convert(&Value::String("{broken".to_string()))
            .unwrap_err();
        assert!(err.0.contains("invalid JSON"));
    }

    #[test]
    fn test_timestamp_to_iso_z() {
        let v = TimestampToIsoZ
            .convert(&Value::String("1976-11-02 08:45:00".to_string()))
            .unwrap();
        assert_eq!(v, Value::String("1976-11-02T08:45:00Z".to_string()));
    }

    #[test]
    fn test_timestamp_to_utc_with_and_without_fraction() {
        let expected = Utc.with_ymd_and_hms(1976, 11, 2, 8, 45, 0).unwrap();
        let v = TimestampToUtc
            .convert(&Value::String("1976-11-02 08:45:00".to_string()))
            .unwrap();
        assert_eq!(v, Value::Timestamp(expected));

        let v = TimestampToUtc
            .convert(&Value::String("1976-11-02 08:45:00.5".to_string()))
            .unwrap();
        let Value::Timestamp(ts) = v else { panic!("expected timestamp") };
        assert_eq!(ts.timestamp_subsec_millis(), 500);
    }

    #[test]
    fn test_numeric_converters_disagree_on_representation() {
        let raw = Value::String("1.12345".to_string());
        assert_eq!(NumericToDouble.convert(&raw).unwrap(), Value::Double(1.12345));
        assert_eq!(
            NumericToDecimal.convert(&raw).unwrap(),
            Value::Decimal(Decimal::from_str("1.12345").unwrap())
        );
    }

    #[test]
    fn test_registry_lookup_by_type_name() {
        let registry = ConverterRegistry::graphql();
        assert!(registry.get("jsonb").is_some());
        assert!(registry.get("int8").is_none());
    }
}
