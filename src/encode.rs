//! Parameter encoding: native [`Value`]s to tagged wire [`Parameter`]s.
//!
//! Scalars map directly onto wire variants. Decimals, dates, timestamps and
//! JSON structures travel as string payloads with a type hint telling the
//! service how to reinterpret them. Three bulk entry points cover the common
//! call styles: a fluent [`ParamBuilder`], an ordered name/value mapping
//! ([`encode_map`]), and descriptor-driven encoding ([`encode_specs`]).

use serde_json::Value as JsonValue;

use crate::error::{Error, Result};
use crate::value::Value;
use crate::wire::{Parameter, WireValue};

/// Timestamp wire format: microsecond precision, round-trips to at least
/// second precision.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

impl Parameter {
    /// Encode one named value.
    pub fn from_value(name: impl Into<String>, value: impl Into<Value>) -> Self {
        let (wire, hint) = encode_value(value.into());
        Self {
            name: name.into(),
            value: wire,
            type_hint: hint,
        }
    }

    /// Null-or-value encoding: `None` becomes the null marker.
    pub fn nullable(name: impl Into<String>, value: Option<Value>) -> Self {
        Self::from_value(name, value.unwrap_or(Value::Null))
    }

    /// Escape hatch for explicit wire-type control: a string payload tagged
    /// with the caller-supplied hint verbatim, bypassing value inference.
    pub fn cast(name: impl Into<String>, text: impl Into<String>, hint: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: WireValue::string(text),
            type_hint: Some(hint.into()),
        }
    }
}

fn encode_value(value: Value) -> (WireValue, Option<String>) {
    match value {
        Value::Null => (WireValue::null(), None),
        Value::String(s) => (WireValue::string(s), None),
        // Booleans before integers: a boolean never encodes as a long.
        Value::Bool(b) => (WireValue::boolean(b), None),
        Value::Long(i) => (WireValue::long(i), None),
        Value::Double(f) => (WireValue::double(f), None),
        Value::Decimal(d) => (WireValue::string(d.to_string()), Some("DECIMAL".to_string())),
        Value::Date(d) => (
            WireValue::string(d.format("%Y-%m-%d").to_string()),
            Some("DATE".to_string()),
        ),
        Value::Timestamp(ts) => (
            WireValue::string(ts.format(TIMESTAMP_FORMAT).to_string()),
            Some("TIMESTAMP".to_string()),
        ),
        Value::Json(j) => (WireValue::string(j.to_string()), Some("JSON".to_string())),
    }
}

/// Scalar literal text of a value, as used inside a joined list parameter.
fn scalar_text(name: &str, value: &Value) -> Result<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Long(i) => Ok(i.to_string()),
        Value::Double(f) => Ok(f.to_string()),
        Value::Decimal(d) => Ok(d.to_string()),
        Value::Date(d) => Ok(d.format("%Y-%m-%d").to_string()),
        Value::Timestamp(ts) => Ok(ts.format(TIMESTAMP_FORMAT).to_string()),
        Value::Null | Value::Json(_) => Err(Error::UnsupportedValueType(format!(
            "list parameter '{name}' cannot contain {value:?}"
        ))),
    }
}

/// Encode a list of values as one comma-joined string parameter.
///
/// Elements are single-quoted iff the first element is a string, bare
/// numeric text otherwise. The result is a SQL-literal fragment, not a
/// list-typed wire value; this mirrors the service's lack of a list type
/// and is a deliberate simplification.
pub fn encode_list(name: impl Into<String>, values: &[Value]) -> Result<Parameter> {
    let name = name.into();
    let Some(first) = values.first() else {
        return Err(Error::EmptyList(name));
    };
    let quote = matches!(first, Value::String(_));
    let parts: Vec<String> = values
        .iter()
        .map(|v| {
            let text = scalar_text(&name, v)?;
            Ok(if quote { format!("'{text}'") } else { text })
        })
        .collect::<Result<_>>()?;
    Ok(Parameter {
        name,
        value: WireValue::string(parts.join(",")),
        type_hint: None,
    })
}

/// Encode an ordered name → dynamic-JSON mapping into a parameter list.
///
/// This is the outermost "determine from value" convenience: each JSON value
/// is inferred via [`Value::try_from`]. Duplicate names are a caller error
/// and are not validated here; the service matches parameters by name.
pub fn encode_map<K, I>(entries: I) -> Result<Vec<Parameter>>
where
    K: Into<String>,
    I: IntoIterator<Item = (K, JsonValue)>,
{
    entries
        .into_iter()
        .map(|(name, json)| Ok(Parameter::from_value(name, Value::try_from(json)?)))
        .collect()
}

/// One bulk-encoding descriptor.
///
/// `value: None` routes through the null branch; `cast` forces a string
/// payload tagged with the given hint verbatim, bypassing inference.
#[derive(Debug, Clone)]
pub struct ParamSpec {
    pub name: String,
    pub value: Option<Value>,
    pub cast: Option<String>,
}

impl ParamSpec {
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
            cast: None,
        }
    }

    pub fn null(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: None,
            cast: None,
        }
    }

    #[must_use]
    pub fn with_cast(mut self, hint: impl Into<String>) -> Self {
        self.cast = Some(hint.into());
        self
    }
}

/// Encode a descriptor list into a parameter list.
pub fn encode_specs(specs: &[ParamSpec]) -> Result<Vec<Parameter>> {
    specs
        .iter()
        .map(|spec| match (&spec.value, &spec.cast) {
            (Some(value), Some(hint)) => Ok(Parameter::cast(
                &spec.name,
                scalar_text(&spec.name, value)?,
                hint,
            )),
            (value, _) => Ok(Parameter::nullable(&spec.name, value.clone())),
        })
        .collect()
}

/// Fluent parameter-list builder.
///
/// ```
/// use data_api_mapper::ParamBuilder;
///
/// let params = ParamBuilder::new()
///     .long("id", 1)
///     .string("name", "first row")
///     .build();
/// assert_eq!(params.len(), 2);
/// ```
#[derive(Debug, Default)]
pub struct ParamBuilder {
    params: Vec<Parameter>,
}

impl ParamBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn value(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.push(Parameter::from_value(name, value));
        self
    }

    #[must_use]
    pub fn null(self, name: impl Into<String>) -> Self {
        self.value(name, Value::Null)
    }

    #[must_use]
    pub fn boolean(self, name: impl Into<String>, v: bool) -> Self {
        self.value(name, v)
    }

    #[must_use]
    pub fn long(self, name: impl Into<String>, v: i64) -> Self {
        self.value(name, v)
    }

    #[must_use]
    pub fn double(self, name: impl Into<String>, v: f64) -> Self {
        self.value(name, v)
    }

    #[must_use]
    pub fn string(self, name: impl Into<String>, v: impl Into<String>) -> Self {
        self.value(name, v.into())
    }

    #[must_use]
    pub fn decimal(self, name: impl Into<String>, v: rust_decimal::Decimal) -> Self {
        self.value(name, v)
    }

    #[must_use]
    pub fn date(self, name: impl Into<String>, v: chrono::NaiveDate) -> Self {
        self.value(name, v)
    }

    #[must_use]
    pub fn timestamp(self, name: impl Into<String>, v: chrono::DateTime<chrono::Utc>) -> Self {
        self.value(name, v)
    }

    #[must_use]
    pub fn json(mut self, name: impl Into<String>, v: JsonValue) -> Self {
        self.params.push(Parameter::from_value(name, Value::Json(v)));
        self
    }

    #[must_use]
    pub fn cast(
        mut self,
        name: impl Into<String>,
        text: impl Into<String>,
        hint: impl Into<String>,
    ) -> Self {
        self.params.push(Parameter::cast(name, text, hint));
        self
    }

    /// Append a comma-joined list parameter. Fails on an empty list.
    pub fn list(mut self, name: impl Into<String>, values: &[Value]) -> Result<Self> {
        self.params.push(encode_list(name, values)?);
        Ok(self)
    }

    pub fn build(self) -> Vec<Parameter> {
        self.params
    }
}
