// src/data/parquet_file.rs
use anyhow::{Context, Result};
use arrow::{
    array::{Array, ArrayRef, Float64Array, Int64Array, StringArray},
    compute::{cast_with_options, CastOptions},
    datatypes::DataType,
    record_batch::RecordBatch,
};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use std::{fs::File, path::Path};
use tracing::info;

use super::columns::{is_blank_row, record_from_cells, Cell, ColumnMap, SourceColumn};
use super::ContractRecord;

/// Read a parquet file carrying either the source or the export column names.
#[tracing::instrument(level = "info", skip(path), fields(path = %path.display()))]
pub fn read_records(path: &Path) -> Result<Vec<ContractRecord>> {
    let file =
        File::open(path).with_context(|| format!("failed to open `{}`", path.display()))?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .with_context(|| format!("reading parquet metadata of `{}`", path.display()))?;

    let field_names: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let map = ColumnMap::from_headers(&field_names)?;

    let mut reader = builder.with_batch_size(1024).build()?;
    let mut records = Vec::new();
    // parquet has no header row, row numbers start at 1
    let mut row_no = 1usize;
    let layout = ColumnMap::identity();
    while let Some(batch) = reader.next().transpose()? {
        let columns = typed_columns(&batch, &map)?;
        for i in 0..batch.num_rows() {
            let cells = columns.row(i);
            if !is_blank_row(&cells) {
                records.push(record_from_cells(row_no, &layout, &cells)?);
            }
            row_no += 1;
        }
    }

    info!(rows = records.len(), "parquet read");
    Ok(records)
}

/// The seven required columns of one batch, cast to Utf8, Int64 or Float64.
struct TypedColumns {
    arrays: Vec<ArrayRef>,
}

/// Type a column is read as. Numeric columns stored as strings stay strings so
/// a bad value reaches the row check verbatim; integer columns stay integers.
fn read_type(col: SourceColumn, stored: &DataType) -> DataType {
    match col {
        SourceColumn::Entity | SourceColumn::City | SourceColumn::SpendingDestination => {
            DataType::Utf8
        }
        _ if matches!(
            stored,
            DataType::Utf8 | DataType::LargeUtf8 | DataType::Utf8View
        ) =>
        {
            DataType::Utf8
        }
        SourceColumn::Year | SourceColumn::ContractCount if stored.is_integer() => DataType::Int64,
        _ => DataType::Float64,
    }
}

fn typed_columns(batch: &RecordBatch, map: &ColumnMap) -> Result<TypedColumns> {
    // unsafe casts fail loudly instead of turning values into nulls
    let options = CastOptions {
        safe: false,
        ..Default::default()
    };
    let mut arrays = Vec::with_capacity(SourceColumn::ALL.len());
    for col in SourceColumn::ALL {
        let source = batch.column(map.position(col));
        let target = read_type(col, source.data_type());
        let casted = cast_with_options(source, &target, &options)
            .with_context(|| format!("casting column `{}` to {:?}", col, target))?;
        arrays.push(casted);
    }
    Ok(TypedColumns { arrays })
}

impl TypedColumns {
    fn row(&self, i: usize) -> Vec<Cell> {
        self.arrays
            .iter()
            .map(|arr| {
                if arr.is_null(i) {
                    return Cell::Empty;
                }
                if let Some(s) = arr.as_any().downcast_ref::<StringArray>() {
                    Cell::text(s.value(i))
                } else if let Some(n) = arr.as_any().downcast_ref::<Int64Array>() {
                    Cell::Int(n.value(i))
                } else if let Some(f) = arr.as_any().downcast_ref::<Float64Array>() {
                    Cell::Number(f.value(i))
                } else {
                    Cell::Empty
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::tests::record;
    use crate::export::write_parquet;
    use arrow::datatypes::{Field, Schema};
    use parquet::arrow::ArrowWriter;
    use std::sync::Arc;
    use tempfile::tempdir;

    /// Write one batch with the spreadsheet's own column names.
    fn write_source_named(path: &Path, year: ArrayRef, count: ArrayRef) -> Result<()> {
        let fields: Vec<Field> = SourceColumn::ALL
            .iter()
            .zip([
                DataType::Utf8,
                DataType::Utf8,
                DataType::Utf8,
                year.data_type().clone(),
                DataType::Float64,
                DataType::Float64,
                count.data_type().clone(),
            ])
            .map(|(col, ty)| Field::new(col.source_name(), ty, true))
            .collect();
        let schema = Arc::new(Schema::new(fields));
        let n = year.len();
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(StringArray::from(vec!["ICA_NAL"; n])),
                Arc::new(StringArray::from(vec!["Colombia, Bogotá, Bogotá"; n])),
                Arc::new(StringArray::from(vec!["Inv"; n])),
                year,
                Arc::new(Float64Array::from(vec![7_412_566.0; n])),
                Arc::new(Float64Array::from(vec![5.2; n])),
                count,
            ],
        )?;
        let mut writer = ArrowWriter::try_new(File::create(path)?, schema, None)?;
        writer.write(&batch)?;
        writer.close()?;
        Ok(())
    }

    #[test]
    fn test_reads_exported_file() -> Result<()> {
        let tmp = tempdir()?;
        let path = tmp.path().join("agg.parquet");
        let rows = vec![
            record("ICA_NAL", "Bogotá", "Inv", 2001, 15),
            record("MADR", "Medellín", "Fun", 2010, 3),
        ];
        write_parquet(&rows, &path)?;

        let back = read_records(&path)?;
        assert_eq!(back, rows);
        Ok(())
    }

    #[test]
    fn test_reads_source_column_names() -> Result<()> {
        let tmp = tempdir()?;
        let path = tmp.path().join("source.parquet");
        write_source_named(
            &path,
            Arc::new(StringArray::from(vec!["2001", "2019"])),
            Arc::new(Int64Array::from(vec![10, 3])),
        )?;

        let back = read_records(&path)?;
        assert_eq!(back.len(), 2);
        assert_eq!(back[0].city, "Colombia, Bogotá, Bogotá");
        assert_eq!(back[0].year, 2001);
        assert_eq!(back[1].year, 2019);
        assert_eq!(back[1].contract_count, 3);
        Ok(())
    }

    #[test]
    fn test_bad_text_number_names_the_value() -> Result<()> {
        let tmp = tempdir()?;
        let path = tmp.path().join("bad.parquet");
        write_source_named(
            &path,
            Arc::new(StringArray::from(vec!["2001", "dos mil"])),
            Arc::new(Int64Array::from(vec![10, 3])),
        )?;

        let err = read_records(&path).unwrap_err().to_string();
        assert!(
            err.starts_with("row 2: column `año` has invalid value `dos mil`"),
            "{}",
            err
        );
        Ok(())
    }

    #[test]
    fn test_large_counts_are_exact() -> Result<()> {
        let tmp = tempdir()?;
        let path = tmp.path().join("big.parquet");
        let big = (1i64 << 53) + 1;
        write_source_named(
            &path,
            Arc::new(arrow::array::Int32Array::from(vec![2001])),
            Arc::new(Int64Array::from(vec![big])),
        )?;

        let back = read_records(&path)?;
        assert_eq!(back[0].contract_count, big);
        Ok(())
    }

    #[test]
    fn test_read_type() {
        assert_eq!(read_type(SourceColumn::City, &DataType::Int64), DataType::Utf8);
        assert_eq!(read_type(SourceColumn::Year, &DataType::Utf8), DataType::Utf8);
        assert_eq!(read_type(SourceColumn::Year, &DataType::Int32), DataType::Int64);
        assert_eq!(read_type(SourceColumn::ContractCount, &DataType::UInt16), DataType::Int64);
        assert_eq!(read_type(SourceColumn::Population, &DataType::Int64), DataType::Float64);
        assert_eq!(read_type(SourceColumn::Year, &DataType::Float64), DataType::Float64);
    }

    #[test]
    fn test_identity_map() {
        let map = ColumnMap::identity();
        for (i, col) in SourceColumn::ALL.iter().enumerate() {
            assert_eq!(map.position(*col), i);
        }
    }
}
