// src/data/csv_file.rs
use anyhow::{Context, Result};
use csv::{ReaderBuilder, StringRecord, Trim};
use std::{fs::File, io::Read, path::Path};
use tracing::info;

use super::columns::{is_blank_row, record_from_cells, Cell, ColumnMap};
use super::ContractRecord;

#[tracing::instrument(level = "info", skip(path), fields(path = %path.display()))]
pub fn read_records(path: &Path) -> Result<Vec<ContractRecord>> {
    let file = File::open(path).with_context(|| format!("Failed to open CSV file: {:?}", path))?;
    from_reader(file)
}

/// Parse a header row followed by data rows. Row numbers in errors count the
/// header as row 1.
pub fn from_reader<R: Read>(reader: R) -> Result<Vec<ContractRecord>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true) // short rows are reported per column, not as parse errors
        .trim(Trim::All)
        .from_reader(reader);

    let headers = rdr.headers().context("reading CSV header row")?.clone();
    let header_names: Vec<&str> = headers.iter().collect();
    let map = ColumnMap::from_headers(&header_names)?;

    let mut records = Vec::new();
    let mut skipped = 0usize;
    for (idx, result) in rdr.records().enumerate() {
        let row_no = idx + 2;
        let raw: StringRecord =
            result.with_context(|| format!("CSV parse error at row {}", row_no))?;
        let cells: Vec<Cell> = raw.iter().map(Cell::text).collect();
        if is_blank_row(&cells) {
            skipped += 1;
            continue;
        }
        records.push(record_from_cells(row_no, &map, &cells)?);
    }

    info!(rows = records.len(), blank = skipped, "csv read");
    Ok(records)
}
