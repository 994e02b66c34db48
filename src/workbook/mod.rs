// src/workbook/mod.rs
//! Spreadsheet sink: one worksheet per source document. The curated approval
//! column renders as a check/cross glyph over a green/red fill instead of a
//! literal boolean.

use anyhow::{Context, Result};
use rust_xlsxwriter::{Color, Format, Workbook};
use serde_json::Value;
use std::path::Path;
use tracing::info;

use crate::table::{Table, APPROVED_COLUMN};

pub struct SheetWriter {
    workbook: Workbook,
    approved_yes: Format,
    approved_no: Format,
}

impl SheetWriter {
    pub fn new() -> Self {
        Self {
            workbook: Workbook::new(),
            approved_yes: Format::new().set_background_color(Color::RGB(0x00FF00)),
            approved_no: Format::new().set_background_color(Color::RGB(0xFF0000)),
        }
    }

    /// Append one sheet named `name` holding `table`: a header row, then one
    /// row per record, cells typed from their JSON values. Still-nested bulky
    /// values render as compact JSON text; nulls stay blank.
    pub fn add_sheet(&mut self, name: &str, table: &Table) -> Result<()> {
        let worksheet = self.workbook.add_worksheet();
        worksheet
            .set_name(name)
            .with_context(|| format!("naming sheet `{}`", name))?;

        for (col, column) in table.columns.iter().enumerate() {
            worksheet.write_string(0, col as u16, column.as_str())?;
        }

        for row in 0..table.rows.len() {
            let out_row = row as u32 + 1;
            for (col, column) in table.columns.iter().enumerate() {
                let col = col as u16;
                match table.cell(row, column) {
                    Value::Null => {}
                    Value::Bool(approved) if column == APPROVED_COLUMN => {
                        let (glyph, format) = if *approved {
                            ("✓", &self.approved_yes)
                        } else {
                            ("✗", &self.approved_no)
                        };
                        worksheet.write_string_with_format(out_row, col, glyph, format)?;
                    }
                    Value::Bool(flag) => {
                        worksheet.write_boolean(out_row, col, *flag)?;
                    }
                    Value::Number(number) => {
                        worksheet.write_number(out_row, col, number.as_f64().unwrap_or(0.0))?;
                    }
                    Value::String(text) => {
                        worksheet.write_string(out_row, col, text.as_str())?;
                    }
                    nested => {
                        worksheet.write_string(out_row, col, &nested.to_string())?;
                    }
                }
            }
        }

        info!(sheet = name, rows = table.rows.len(), columns = table.columns.len(), "sheet written");
        Ok(())
    }

    pub fn save(mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        self.workbook
            .save(path)
            .with_context(|| format!("saving workbook {}", path.display()))?;
        Ok(())
    }
}

impl Default for SheetWriter {
    fn default() -> Self {
        Self::new()
    }
}
