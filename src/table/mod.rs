// src/table/mod.rs
//! Assembles enriched records into the tabular form written to one sheet:
//! first-seen column union, then three explicit column passes (prune raw
//! columns, insert the curated columns, relocate bulky columns to the end).

use serde_json::Value;

use crate::flatten::Record;

/// Raw nested columns fully superseded by their derived counterparts.
pub const PRUNED_COLUMNS: &[&str] = &["time", "range", "duration", "meta"];

/// Still-nested or long-form columns pushed to the end of the sheet, in this
/// relative order.
pub const TRAILING_COLUMNS: &[&str] = &[
    "components",
    "entries",
    "scalingLevelDice",
    "damageInflict",
    "savingThrow",
    "miscTags",
    "areaTags",
];

/// Curated-by-hand columns, inserted at fixed positions after the name column.
pub const APPROVED_COLUMN: &str = "approved";
pub const ICON_ID_COLUMN: &str = "iconify_id";

/// One sheet's worth of rows with an explicit column order.
#[derive(Debug)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Record>,
}

impl Table {
    /// Build the final table from one document's enriched records.
    pub fn from_records(records: Vec<Record>) -> Self {
        let mut columns: Vec<String> = Vec::new();
        for record in &records {
            for key in record.keys() {
                if !columns.iter().any(|column| column == key) {
                    columns.push(key.clone());
                }
            }
        }

        let mut table = Table {
            columns,
            rows: records,
        };
        table.prune();
        table.insert_curated();
        table.relocate_trailing();
        table
    }

    /// Cell lookup; a key absent from the row renders blank.
    pub fn cell(&self, row: usize, column: &str) -> &Value {
        self.rows
            .get(row)
            .and_then(|record| record.get(column))
            .unwrap_or(&Value::Null)
    }

    /// Drop the superseded raw columns. Absence is not an error.
    fn prune(&mut self) {
        self.columns
            .retain(|column| !PRUNED_COLUMNS.contains(&column.as_str()));
    }

    /// Insert the curated columns at absolute positions 1 and 2 and seed every
    /// row with their defaults (false / null).
    fn insert_curated(&mut self) {
        self.columns.insert(1, APPROVED_COLUMN.to_string());
        self.columns.insert(2, ICON_ID_COLUMN.to_string());
        for row in &mut self.rows {
            row.insert(APPROVED_COLUMN.to_string(), Value::Bool(false));
            row.insert(ICON_ID_COLUMN.to_string(), Value::Null);
        }
    }

    /// Move the bulky columns that are present to the end, keeping their
    /// listed relative order.
    fn relocate_trailing(&mut self) {
        for name in TRAILING_COLUMNS {
            if let Some(idx) = self.columns.iter().position(|column| column == name) {
                let column = self.columns.remove(idx);
                self.columns.push(column);
            }
        }
    }
}
