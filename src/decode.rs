//! Row decoding: tagged wire rows to native records.
//!
//! A [`RecordDecoder`] zips each row against the resolved [`ResultShape`]
//! and the injected [`ConverterRegistry`]. Null cells short-circuit: a
//! converter never runs on a null, whatever the column type. A row that
//! fails to decode aborts the whole result set; row order and count are
//! part of the service contract, so skipping a bad row is never correct.

use crate::convert::{Converter, ConverterRegistry};
use crate::error::{Error, Result};
use crate::shape::ResultShape;
use crate::value::Value;
use crate::wire::WireValue;

/// Raw payload text is truncated to this length in conversion errors.
const ERROR_VALUE_MAX: usize = 120;

/// One decoded row: an ordered field-name → value mapping.
///
/// Field order follows column order; lookups by name scan linearly, which
/// is the right trade for the column counts queries actually return.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    fields: Vec<(String, Value)>,
}

impl Record {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl IntoIterator for Record {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

/// Decodes positionally-aligned wire rows into [`Record`]s.
pub struct RecordDecoder<'a> {
    fields: Vec<String>,
    converters: Vec<Option<&'a dyn Converter>>,
}

impl<'a> RecordDecoder<'a> {
    pub fn new(shape: &ResultShape, registry: &'a ConverterRegistry) -> Self {
        Self {
            fields: shape.field_names(),
            converters: shape.converters(registry),
        }
    }

    /// Decode one row. The row must be the same length and order as the
    /// shape it was resolved against.
    pub fn decode_row(&self, row: &[WireValue]) -> Result<Record> {
        if row.len() != self.fields.len() {
            return Err(Error::ShapeMismatch(format!(
                "row has {} values but shape has {} columns",
                row.len(),
                self.fields.len()
            )));
        }
        let mut fields = Vec::with_capacity(row.len());
        for (i, cell) in row.iter().enumerate() {
            let raw = cell.to_raw()?;
            // Converters never see nulls.
            let value = match self.converters[i] {
                Some(converter) if !raw.is_null() => {
                    converter.convert(&raw).map_err(|e| Error::Conversion {
                        column: self.fields[i].clone(),
                        value: truncate(&raw),
                        reason: e.0,
                    })?
                }
                _ => raw,
            };
            fields.push((self.fields[i].clone(), value));
        }
        Ok(Record { fields })
    }

    /// Decode all rows, aborting on the first failure.
    pub fn decode(&self, rows: &[Vec<WireValue>]) -> Result<Vec<Record>> {
        rows.iter().map(|row| self.decode_row(row)).collect()
    }
}

fn truncate(raw: &Value) -> String {
    let text = match raw {
        Value::String(s) => s.clone(),
        other => format!("{other:?}"),
    };
    if text.len() > ERROR_VALUE_MAX {
        let cut = text
            .char_indices()
            .take_while(|(i, _)| *i < ERROR_VALUE_MAX)
            .last()
            .map_or(0, |(i, c)| i + c.len_utf8());
        format!("{}...", &text[..cut])
    } else {
        text
    }
}
