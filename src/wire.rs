//! Wire shapes exchanged with the external data service.
//!
//! Field names serialize in camelCase to match the service's JSON bodies
//! exactly (`stringValue`, `typeHint`, `columnMetadata`, ...). A wire value
//! is a single-key tagged object, the same idiom DynamoDB-style services use
//! for attribute values.

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::value::Value;

/// One tagged wire value: exactly one variant field is set.
///
/// `is_null` marks the SQL NULL; the other four carry scalar payloads.
/// Domain-shaped payloads (decimals, dates, timestamps, JSON) travel as
/// `string_value` with a [`Parameter::type_hint`] alongside.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireValue {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_null: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub string_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub long_value: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub double_value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub boolean_value: Option<bool>,
}

impl WireValue {
    pub fn null() -> Self {
        Self {
            is_null: Some(true),
            ..Self::default()
        }
    }

    pub fn string(v: impl Into<String>) -> Self {
        Self {
            string_value: Some(v.into()),
            ..Self::default()
        }
    }

    pub fn long(v: i64) -> Self {
        Self {
            long_value: Some(v),
            ..Self::default()
        }
    }

    pub fn double(v: f64) -> Self {
        Self {
            double_value: Some(v),
            ..Self::default()
        }
    }

    pub fn boolean(v: bool) -> Self {
        Self {
            boolean_value: Some(v),
            ..Self::default()
        }
    }

    /// Extract the raw native value behind the sole set variant.
    ///
    /// The null marker wins over any other field that happens to be set.
    /// A value with no variant set at all violates the service contract.
    pub fn to_raw(&self) -> Result<Value, Error> {
        if self.is_null.is_some() {
            return Ok(Value::Null);
        }
        if let Some(s) = &self.string_value {
            return Ok(Value::String(s.clone()));
        }
        if let Some(i) = self.long_value {
            return Ok(Value::Long(i));
        }
        if let Some(f) = self.double_value {
            return Ok(Value::Double(f));
        }
        if let Some(b) = self.boolean_value {
            return Ok(Value::Bool(b));
        }
        Err(Error::ShapeMismatch(
            "wire value has no variant field set".to_string(),
        ))
    }
}

/// One named statement parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Parameter {
    pub name: String,
    pub value: WireValue,
    /// Tells the service how to reinterpret a string payload
    /// (`"DECIMAL"`, `"DATE"`, `"TIMESTAMP"`, `"JSON"`, ...).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_hint: Option<String>,
}

/// Raw column descriptor as returned by the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireColumn {
    pub name: String,
    pub table_name: String,
    pub type_name: String,
    /// Nonzero means nullable.
    pub nullable: i64,
}

/// Execute-statement request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatementRequest {
    pub credentials_ref: String,
    pub target_ref: String,
    pub database: String,
    pub sql: String,
    pub parameters: Vec<Parameter>,
    pub include_metadata: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
}

/// Execute-statement response body.
///
/// Row-returning statements carry `records` + `column_metadata`; write
/// statements carry `number_of_records_updated` instead.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatementResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub records: Option<Vec<Vec<WireValue>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column_metadata: Option<Vec<WireColumn>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number_of_records_updated: Option<i64>,
}

/// Begin-transaction request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BeginTransactionRequest {
    pub credentials_ref: String,
    pub target_ref: String,
    pub database: String,
}

/// Begin-transaction response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BeginTransactionResponse {
    pub transaction_id: String,
}

/// Commit/rollback request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionControlRequest {
    pub credentials_ref: String,
    pub target_ref: String,
    pub transaction_id: String,
}

/// Commit/rollback response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionStatusResponse {
    pub transaction_status: String,
}
