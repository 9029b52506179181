//! Result-shape derivation from raw column metadata.
//!
//! A join-producing query returns columns from several tables with
//! potentially colliding bare names. Qualifying only non-main-table columns
//! keeps the common single-table case free of prefixes while avoiding
//! collisions in joins.

use std::collections::HashMap;

use crate::convert::{Converter, ConverterRegistry};
use crate::wire::WireColumn;

/// One column descriptor, ordered identically to each row's values.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnMetadata {
    pub name: String,
    pub table_name: String,
    pub type_name: String,
    pub nullable: bool,
}

impl ColumnMetadata {
    pub fn from_wire(raw: &WireColumn) -> Self {
        Self {
            name: raw.name.clone(),
            table_name: raw.table_name.clone(),
            type_name: raw.type_name.clone(),
            nullable: raw.nullable != 0,
        }
    }
}

/// Ordered column metadata for one query result.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultShape {
    pub columns: Vec<ColumnMetadata>,
}

impl ResultShape {
    pub fn from_wire(raw: &[WireColumn]) -> Self {
        Self {
            columns: raw.iter().map(ColumnMetadata::from_wire).collect(),
        }
    }

    /// The table name occurring most frequently among the columns.
    ///
    /// Tie-break: when two tables have equal column counts, the one whose
    /// first column appears earliest in the metadata order wins. The service
    /// does not guarantee table ordering, so the rule must not depend on map
    /// iteration order.
    pub fn main_table(&self) -> Option<&str> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for col in &self.columns {
            *counts.entry(col.table_name.as_str()).or_insert(0) += 1;
        }
        let mut best: Option<(&str, usize)> = None;
        // Iterate columns, not the map, so first occurrence breaks ties.
        for col in &self.columns {
            let table = col.table_name.as_str();
            let count = counts[table];
            match best {
                Some((winner, max)) if winner == table || count <= max => {}
                _ => best = Some((table, count)),
            }
        }
        best.map(|(table, _)| table)
    }

    /// Derived field name per column, in column order.
    ///
    /// Main-table columns keep their bare name; columns pulled in from other
    /// tables are qualified as `{table_name}_{name}`.
    pub fn field_names(&self) -> Vec<String> {
        let main = self.main_table().unwrap_or_default().to_string();
        self.columns
            .iter()
            .map(|col| {
                if col.table_name == main {
                    col.name.clone()
                } else {
                    format!("{}_{}", col.table_name, col.name)
                }
            })
            .collect()
    }

    /// Per-column converter from the registry, in column order. Columns
    /// whose SQL type is absent from the registry pass through unconverted.
    pub fn converters<'a>(&self, registry: &'a ConverterRegistry) -> Vec<Option<&'a dyn Converter>> {
        self.columns
            .iter()
            .map(|col| registry.get(&col.type_name))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}
