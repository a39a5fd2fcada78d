//! The OOXML workbook backend: maps the grid representation to and from
//! `.xlsx` bytes.
//!
//! Reading tolerates whatever cell types a spreadsheet tool produced;
//! anything that is not text or a number is carried as text. The only hard
//! failure is a workbook that cannot be opened at all.

use crate::codec::{Cell, SheetData};
use crate::Result;
use anyhow::Context;
use calamine::{open_workbook_auto, open_workbook_auto_from_rs, Data, Reader, Sheets};
use rust_xlsxwriter::Workbook;
use std::io::{Cursor, Read, Seek};
use std::path::Path;

/// Column widths matching what the budget sheets have always used.
const COLUMN_WIDTHS: [f64; 4] = [28.0, 32.0, 22.0, 14.0];

/// Serializes sheets to workbook bytes.
pub fn write_workbook(sheets: &[SheetData]) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();

    for sheet in sheets {
        let worksheet = workbook.add_worksheet();
        worksheet
            .set_name(&sheet.name)
            .with_context(|| format!("Invalid sheet name '{}'", sheet.name))?;

        for (row_ix, row) in sheet.rows.iter().enumerate() {
            for (col_ix, cell) in row.iter().enumerate() {
                let row_ix = row_ix as u32;
                let col_ix = col_ix as u16;
                match cell {
                    Cell::Empty => {}
                    Cell::Text(s) => {
                        worksheet
                            .write_string(row_ix, col_ix, s)
                            .with_context(|| format!("Failed to write cell ({row_ix}, {col_ix})"))?;
                    }
                    Cell::Number(n) => {
                        worksheet
                            .write_number(row_ix, col_ix, *n)
                            .with_context(|| format!("Failed to write cell ({row_ix}, {col_ix})"))?;
                    }
                }
            }
        }

        for (col_ix, width) in COLUMN_WIDTHS.iter().enumerate() {
            worksheet.set_column_width(col_ix as u16, *width)?;
        }
    }

    let bytes = workbook
        .save_to_buffer()
        .context("Failed to serialize the workbook")?;
    Ok(bytes)
}

/// Serializes sheets and writes the workbook to `path`.
pub fn write_workbook_file(path: impl AsRef<Path>, sheets: &[SheetData]) -> Result<()> {
    let path = path.as_ref();
    let bytes = write_workbook(sheets)?;
    std::fs::write(path, bytes)
        .with_context(|| format!("Unable to write workbook to {}", path.display()))
}

/// Reads a workbook file into sheets.
pub fn read_workbook(path: impl AsRef<Path>) -> Result<Vec<SheetData>> {
    let path = path.as_ref();
    let mut workbook = open_workbook_auto(path)
        .with_context(|| format!("Unable to open workbook at {}", path.display()))?;
    grid_from_workbook(&mut workbook)
}

/// Reads workbook bytes (e.g. from a document handle) into sheets.
pub fn read_workbook_bytes(bytes: &[u8]) -> Result<Vec<SheetData>> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .context("Unable to open the workbook data")?;
    grid_from_workbook(&mut workbook)
}

fn grid_from_workbook<RS>(workbook: &mut Sheets<RS>) -> Result<Vec<SheetData>>
where
    RS: Read + Seek,
{
    let names = workbook.sheet_names().to_owned();
    let mut sheets = Vec::with_capacity(names.len());

    for name in names {
        let range = workbook
            .worksheet_range(&name)
            .with_context(|| format!("Unable to read worksheet '{name}'"))?;
        let rows = range
            .rows()
            .map(|row| row.iter().map(data_to_cell).collect())
            .collect();
        sheets.push(SheetData { name, rows });
    }

    Ok(sheets)
}

fn data_to_cell(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Float(f) => Cell::Number(*f),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::DateTime(dt) => Cell::Number(dt.as_f64()),
        other => Cell::Text(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workbook_round_trip() {
        let sheets = vec![
            SheetData {
                name: "Mar 2025".to_string(),
                rows: vec![
                    vec![Cell::text("=== EXPENSES ===")],
                    vec![Cell::text("Date"), Cell::text("Description")],
                    vec![
                        Cell::text("2025-03-05"),
                        Cell::text("Groceries"),
                        Cell::text("Grocery"),
                        Cell::number(52.75),
                    ],
                ],
            },
            SheetData {
                name: "Apr 2025".to_string(),
                rows: vec![vec![Cell::text("hello")]],
            },
        ];

        let bytes = write_workbook(&sheets).unwrap();
        let back = read_workbook_bytes(&bytes).unwrap();

        assert_eq!(back.len(), 2);
        assert_eq!(back[0].name, "Mar 2025");
        assert_eq!(back[1].name, "Apr 2025");
        let expense_row = &back[0].rows[2];
        assert_eq!(expense_row[0], Cell::text("2025-03-05"));
        assert_eq!(expense_row[3], Cell::number(52.75));
    }

    #[test]
    fn test_garbage_bytes_fail_to_open() {
        assert!(read_workbook_bytes(b"this is not a workbook").is_err());
    }
}
