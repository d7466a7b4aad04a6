// src/data/mod.rs
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::{collections::HashSet, path::Path, sync::Arc};
use tracing::info;

pub mod columns;
pub mod csv_file;
pub mod parquet_file;
pub mod xlsx;

/// One row of the contracts dataset: contract activity for an
/// entity/city/year/spending-destination combination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractRecord {
    pub entity: String,
    pub city: String,
    pub spending_destination: String,
    pub year: i32,
    pub population: f64,
    pub contracts_per_100k: f64,
    pub contract_count: i64,
}

/// The loaded dataset. Immutable once built; share it through `Arc`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContractTable {
    records: Vec<ContractRecord>,
    cities: Vec<String>,
    entities: Vec<String>,
}

impl ContractTable {
    pub fn new(records: Vec<ContractRecord>) -> Self {
        // cities keep first-appearance order, entities are sorted
        let mut seen = HashSet::new();
        let cities: Vec<String> = records
            .iter()
            .filter(|r| seen.insert(r.city.as_str()))
            .map(|r| r.city.clone())
            .collect();

        let mut entities: Vec<String> = records.iter().map(|r| r.entity.clone()).collect();
        entities.sort();
        entities.dedup();

        Self {
            records,
            cities,
            entities,
        }
    }

    pub fn records(&self) -> &[ContractRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct cities, in the order they first appear in the source.
    pub fn cities(&self) -> &[String] {
        &self.cities
    }

    /// Distinct reporting entities, sorted ascending.
    pub fn entities(&self) -> &[String] {
        &self.entities
    }

    /// Smallest and largest year present.
    pub fn year_span(&self) -> Option<(i32, i32)> {
        let min = self.records.iter().map(|r| r.year).min()?;
        let max = self.records.iter().map(|r| r.year).max()?;
        Some((min, max))
    }
}

/// Supported input formats, picked from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Spreadsheet,
    Csv,
    Parquet,
}

impl SourceFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Ok(Self::Spreadsheet),
            "csv" => Ok(Self::Csv),
            "parquet" => Ok(Self::Parquet),
            other => bail!(
                "unsupported data file `{}` (extension `{}`); expected xlsx, xls, ods, csv or parquet",
                path.display(),
                other
            ),
        }
    }
}

/// Read the dataset at `path` into a shared, read-only table.
/// Any missing column or malformed row aborts the load.
#[tracing::instrument(level = "info", skip(path), fields(path = %path.as_ref().display()))]
pub fn load_table<P: AsRef<Path>>(path: P) -> Result<Arc<ContractTable>> {
    let path = path.as_ref();
    if !path.is_file() {
        bail!("data file `{}` does not exist", path.display());
    }

    let records = match SourceFormat::from_path(path)? {
        SourceFormat::Spreadsheet => xlsx::read_records(path),
        SourceFormat::Csv => csv_file::read_records(path),
        SourceFormat::Parquet => parquet_file::read_records(path),
    }
    .with_context(|| format!("loading contracts from {}", path.display()))?;

    let table = ContractTable::new(records);
    info!(
        rows = table.len(),
        cities = table.cities().len(),
        entities = table.entities().len(),
        "contracts table loaded"
    );
    Ok(Arc::new(table))
}
