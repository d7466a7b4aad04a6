// src/data/xlsx.rs
use anyhow::{anyhow, Context, Result};
use calamine::{open_workbook_auto, Data, Reader};
use std::path::Path;
use tracing::{debug, info};

use super::columns::{is_blank_row, record_from_cells, Cell, ColumnMap};
use super::ContractRecord;

/// Read the first worksheet of a workbook (xlsx, xls, xlsb, ods).
/// The first non-empty row is the header.
#[tracing::instrument(level = "info", skip(path), fields(path = %path.display()))]
pub fn read_records(path: &Path) -> Result<Vec<ContractRecord>> {
    let mut workbook = open_workbook_auto(path)
        .with_context(|| format!("Failed to open workbook: {:?}", path))?;
    let sheet_names = workbook.sheet_names();
    debug!(sheets = ?sheet_names, "workbook opened");

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| anyhow!("workbook {:?} has no worksheets", path))?
        .with_context(|| format!("Failed to read first worksheet of {:?}", path))?;

    // calamine trims leading empty rows; keep source numbering for errors
    let first_row = range.start().map(|(r, _)| r as usize).unwrap_or(0);
    let mut rows = range.rows();

    let header_cells = match rows.next() {
        Some(h) => h,
        None => return Err(anyhow!("worksheet in {:?} is empty", path)),
    };
    let headers: Vec<String> = header_cells.iter().map(header_text).collect();
    let map = ColumnMap::from_headers(&headers)?;

    let mut records = Vec::with_capacity(range.height().saturating_sub(1));
    let mut skipped = 0usize;
    for (idx, raw) in rows.enumerate() {
        // header is source row first_row + 1, data starts right after
        let row_no = first_row + idx + 2;
        let cells: Vec<Cell> = raw.iter().map(to_cell).collect();
        if is_blank_row(&cells) {
            skipped += 1;
            continue;
        }
        records.push(record_from_cells(row_no, &map, &cells)?);
    }

    info!(rows = records.len(), blank = skipped, "worksheet read");
    Ok(records)
}

fn header_text(value: &Data) -> String {
    match value {
        Data::String(s) => s.trim().to_string(),
        other => other.to_string(),
    }
}

pub(crate) fn to_cell(value: &Data) -> Cell {
    match value {
        Data::Empty => Cell::Empty,
        Data::Int(i) => Cell::Int(*i),
        Data::Float(f) => Cell::Number(*f),
        Data::String(s) => Cell::text(s),
        other => Cell::text(&other.to_string()),
    }
}
