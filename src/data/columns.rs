// src/data/columns.rs
use anyhow::{anyhow, bail, Result};
use std::fmt;

use super::ContractRecord;

/// The seven columns every input must carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceColumn {
    Entity,
    City,
    SpendingDestination,
    Year,
    Population,
    ContractsPer100k,
    ContractCount,
}

impl SourceColumn {
    pub const ALL: [SourceColumn; 7] = [
        SourceColumn::Entity,
        SourceColumn::City,
        SourceColumn::SpendingDestination,
        SourceColumn::Year,
        SourceColumn::Population,
        SourceColumn::ContractsPer100k,
        SourceColumn::ContractCount,
    ];

    /// Header as spelled in the published spreadsheet.
    pub fn source_name(self) -> &'static str {
        match self {
            SourceColumn::Entity => "entidad",
            SourceColumn::City => "ciudad",
            SourceColumn::SpendingDestination => "destino_gasto",
            SourceColumn::Year => "año",
            SourceColumn::Population => "poblacion",
            SourceColumn::ContractsPer100k => "No_contratos/100k pop",
            SourceColumn::ContractCount => "No_contratos",
        }
    }

    /// Header written by the parquet export.
    pub fn export_name(self) -> &'static str {
        match self {
            SourceColumn::Entity => "entity",
            SourceColumn::City => "city",
            SourceColumn::SpendingDestination => "spending_destination",
            SourceColumn::Year => "year",
            SourceColumn::Population => "population",
            SourceColumn::ContractsPer100k => "contracts_per_100k",
            SourceColumn::ContractCount => "contract_count",
        }
    }

    fn matches(self, header: &str) -> bool {
        let h = header.trim();
        h == self.source_name() || h == self.export_name()
    }
}

impl fmt::Display for SourceColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.source_name())
    }
}

/// Position of each required column within a header row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMap {
    positions: [usize; 7],
}

impl ColumnMap {
    /// Locate every required column in `headers`. Extra columns are ignored;
    /// missing ones are reported together.
    pub fn from_headers<S: AsRef<str>>(headers: &[S]) -> Result<Self> {
        let mut positions = [0usize; 7];
        let mut missing = Vec::new();

        for (slot, col) in SourceColumn::ALL.iter().enumerate() {
            match headers.iter().position(|h| col.matches(h.as_ref())) {
                Some(idx) => positions[slot] = idx,
                None => missing.push(col.source_name()),
            }
        }

        if !missing.is_empty() {
            let found: Vec<&str> = headers.iter().map(|h| h.as_ref()).collect();
            bail!(
                "missing required column(s) {:?}; found headers {:?}",
                missing,
                found
            );
        }
        Ok(Self { positions })
    }

    /// Map for rows already laid out in `SourceColumn::ALL` order.
    pub fn identity() -> Self {
        Self {
            positions: [0, 1, 2, 3, 4, 5, 6],
        }
    }

    pub fn position(&self, col: SourceColumn) -> usize {
        self.positions[col as usize]
    }

    /// Pick the required cells out of a full row, in `SourceColumn::ALL` order.
    /// Cells past the end of a short row read as empty.
    pub fn select<'a>(&self, row: &'a [Cell]) -> [&'a Cell; 7] {
        SourceColumn::ALL.map(|col| row.get(self.position(col)).unwrap_or(&EMPTY))
    }
}

static EMPTY: Cell = Cell::Empty;

/// A single input value, before it is checked against its column type.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    /// Native integer from a typed source; kept exact past 2^53.
    Int(i64),
}

impl Cell {
    /// Blank strings count as empty.
    pub fn text(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(trimmed.to_string())
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    fn raw(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(s) => s.clone(),
            Cell::Number(n) => n.to_string(),
            Cell::Int(i) => i.to_string(),
        }
    }
}

/// True when every cell of the row is empty (spreadsheet padding).
pub fn is_blank_row(row: &[Cell]) -> bool {
    row.iter().all(Cell::is_empty)
}

/// Convert one data row into a record. `row_no` is the 1-based row number in
/// the source file and is quoted in every error.
pub fn record_from_cells(row_no: usize, map: &ColumnMap, row: &[Cell]) -> Result<ContractRecord> {
    let [entity, city, destination, year, population, rate, count] = map.select(row);

    Ok(ContractRecord {
        entity: text_field(row_no, SourceColumn::Entity, entity)?,
        city: text_field(row_no, SourceColumn::City, city)?,
        spending_destination: text_field(row_no, SourceColumn::SpendingDestination, destination)?,
        year: i32::try_from(int_field(row_no, SourceColumn::Year, year)?)
            .map_err(|_| invalid(row_no, SourceColumn::Year, year, "year"))?,
        population: float_field(row_no, SourceColumn::Population, population)?,
        contracts_per_100k: float_field(row_no, SourceColumn::ContractsPer100k, rate)?,
        contract_count: int_field(row_no, SourceColumn::ContractCount, count)?,
    })
}

fn text_field(row_no: usize, col: SourceColumn, cell: &Cell) -> Result<String> {
    match cell {
        Cell::Empty => bail!("row {}: column `{}` is missing", row_no, col),
        Cell::Text(s) => Ok(s.clone()),
        // numeric labels (e.g. a bare code) keep their integer spelling
        Cell::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => Ok(format!("{}", *n as i64)),
        Cell::Number(n) => Ok(n.to_string()),
        Cell::Int(i) => Ok(i.to_string()),
    }
}

fn float_field(row_no: usize, col: SourceColumn, cell: &Cell) -> Result<f64> {
    let value = match cell {
        Cell::Empty => bail!("row {}: column `{}` is missing", row_no, col),
        Cell::Number(n) => *n,
        Cell::Int(i) => *i as f64,
        Cell::Text(s) => s.parse::<f64>().map_err(|_| invalid(row_no, col, cell, "number"))?,
    };
    if !value.is_finite() {
        return Err(invalid(row_no, col, cell, "finite number"));
    }
    Ok(value)
}

fn int_field(row_no: usize, col: SourceColumn, cell: &Cell) -> Result<i64> {
    match cell {
        Cell::Int(i) => return Ok(*i),
        Cell::Text(s) => {
            if let Ok(v) = s.parse::<i64>() {
                return Ok(v);
            }
        }
        _ => {}
    }
    // spreadsheets hand integers back as floats
    let value = float_field(row_no, col, cell)?;
    if value.fract() != 0.0 || value.abs() >= 9.0e15 {
        return Err(invalid(row_no, col, cell, "integer"));
    }
    Ok(value as i64)
}

fn invalid(row_no: usize, col: SourceColumn, cell: &Cell, expected: &str) -> anyhow::Error {
    anyhow!(
        "row {}: column `{}` has invalid value `{}` (expected {})",
        row_no,
        col,
        cell.raw(),
        expected
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source_headers() -> Vec<String> {
        SourceColumn::ALL
            .iter()
            .map(|c| c.source_name().to_string())
            .collect()
    }

    fn bogota_row() -> Vec<Cell> {
        vec![
            Cell::text("ICA_NAL"),
            Cell::text("Colombia, Bogotá, Bogotá"),
            Cell::text("Inv"),
            Cell::Number(2001.0),
            Cell::Number(7_412_566.0),
            Cell::Number(5.2),
            Cell::Number(10.0),
        ]
    }

    #[test]
    fn test_headers_in_any_order_with_extras() {
        let headers = vec![
            "Unnamed: 0",
            "No_contratos",
            "ciudad",
            "año",
            "entidad",
            "destino_gasto",
            "poblacion",
            "No_contratos/100k pop",
        ];
        let map = ColumnMap::from_headers(&headers).unwrap();
        assert_eq!(map.position(SourceColumn::Entity), 4);
        assert_eq!(map.position(SourceColumn::ContractCount), 1);
        assert_eq!(map.position(SourceColumn::ContractsPer100k), 7);
    }

    #[test]
    fn test_export_headers_accepted() {
        let headers: Vec<&str> = SourceColumn::ALL.iter().map(|c| c.export_name()).collect();
        assert!(ColumnMap::from_headers(&headers).is_ok());
    }

    #[test]
    fn test_missing_columns_are_all_listed() {
        let headers = vec!["entidad", "ciudad", "año", "poblacion", "No_contratos"];
        let err = ColumnMap::from_headers(&headers).unwrap_err().to_string();
        assert!(err.contains("destino_gasto"), "{}", err);
        assert!(err.contains("No_contratos/100k pop"), "{}", err);
    }

    #[test]
    fn test_record_from_cells() {
        let map = ColumnMap::from_headers(&source_headers()).unwrap();
        let rec = record_from_cells(2, &map, &bogota_row()).unwrap();
        assert_eq!(rec.entity, "ICA_NAL");
        assert_eq!(rec.city, "Colombia, Bogotá, Bogotá");
        assert_eq!(rec.year, 2001);
        assert_eq!(rec.population, 7_412_566.0);
        assert_eq!(rec.contracts_per_100k, 5.2);
        assert_eq!(rec.contract_count, 10);
    }

    #[test]
    fn test_text_cells_are_parsed() {
        let map = ColumnMap::from_headers(&source_headers()).unwrap();
        let mut row = bogota_row();
        row[3] = Cell::text(" 2001 ");
        row[6] = Cell::text("12.0");
        let rec = record_from_cells(2, &map, &row).unwrap();
        assert_eq!(rec.year, 2001);
        assert_eq!(rec.contract_count, 12);
    }

    #[test]
    fn test_missing_field_names_row_and_column() {
        let map = ColumnMap::from_headers(&source_headers()).unwrap();
        let mut row = bogota_row();
        row[2] = Cell::text("   ");
        let err = record_from_cells(7, &map, &row).unwrap_err().to_string();
        assert_eq!(err, "row 7: column `destino_gasto` is missing");
    }

    #[test]
    fn test_fractional_count_rejected() {
        let map = ColumnMap::from_headers(&source_headers()).unwrap();
        let mut row = bogota_row();
        row[6] = Cell::Number(10.5);
        let err = record_from_cells(3, &map, &row).unwrap_err().to_string();
        assert!(err.contains("row 3"), "{}", err);
        assert!(err.contains("expected integer"), "{}", err);
    }

    #[test]
    fn test_short_row_reads_as_missing() {
        let map = ColumnMap::from_headers(&source_headers()).unwrap();
        let row = bogota_row()[..5].to_vec();
        let err = record_from_cells(4, &map, &row).unwrap_err().to_string();
        assert!(err.contains("No_contratos/100k pop"), "{}", err);
    }

    #[test]
    fn test_native_int_cells_stay_exact() {
        let map = ColumnMap::from_headers(&source_headers()).unwrap();
        let mut row = bogota_row();
        row[3] = Cell::Int(2001);
        row[6] = Cell::Int(9_007_199_254_740_993);
        let rec = record_from_cells(2, &map, &row).unwrap();
        assert_eq!(rec.year, 2001);
        assert_eq!(rec.contract_count, 9_007_199_254_740_993);
    }

    #[test]
    fn test_blank_row() {
        assert!(is_blank_row(&[Cell::Empty, Cell::text(" ")]));
        assert!(!is_blank_row(&[Cell::Empty, Cell::Number(0.0)]));
    }
}
