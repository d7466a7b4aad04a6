// src/export.rs
use anyhow::{Context, Result};
use arrow::{
    array::{ArrayRef, Float64Array, Int32Array, Int64Array, StringArray},
    datatypes::{DataType, Field, Schema},
    record_batch::RecordBatch,
};
use parquet::{
    arrow::ArrowWriter, basic::Compression, file::properties::WriterProperties,
};
use std::{
    fs::{self, File},
    io::BufWriter,
    path::Path,
    sync::Arc,
};
use tracing::info;

use crate::data::{columns::SourceColumn, ContractRecord};

/// Arrow schema of an exported aggregate table.
pub fn aggregate_schema() -> Schema {
    Schema::new(vec![
        Field::new(SourceColumn::Entity.export_name(), DataType::Utf8, false),
        Field::new(SourceColumn::City.export_name(), DataType::Utf8, false),
        Field::new(SourceColumn::SpendingDestination.export_name(), DataType::Utf8, false),
        Field::new(SourceColumn::Year.export_name(), DataType::Int32, false),
        Field::new(SourceColumn::Population.export_name(), DataType::Float64, false),
        Field::new(SourceColumn::ContractsPer100k.export_name(), DataType::Float64, false),
        Field::new(SourceColumn::ContractCount.export_name(), DataType::Int64, false),
    ])
}

fn to_batch(rows: &[ContractRecord], schema: Arc<Schema>) -> Result<RecordBatch> {
    let columns: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from_iter_values(rows.iter().map(|r| r.entity.as_str()))),
        Arc::new(StringArray::from_iter_values(rows.iter().map(|r| r.city.as_str()))),
        Arc::new(StringArray::from_iter_values(
            rows.iter().map(|r| r.spending_destination.as_str()),
        )),
        Arc::new(Int32Array::from_iter_values(rows.iter().map(|r| r.year))),
        Arc::new(Float64Array::from_iter_values(rows.iter().map(|r| r.population))),
        Arc::new(Float64Array::from_iter_values(
            rows.iter().map(|r| r.contracts_per_100k),
        )),
        Arc::new(Int64Array::from_iter_values(rows.iter().map(|r| r.contract_count))),
    ];
    RecordBatch::try_new(schema, columns).context("building aggregate record batch")
}

/// Write `rows` to a SNAPPY parquet file at `path` through a `.tmp` sibling
/// that is renamed into place once closed.
pub fn write_parquet(rows: &[ContractRecord], path: &Path) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).with_context(|| format!("could not create `{}`", dir.display()))?;
    }

    let schema = Arc::new(aggregate_schema());
    let batch = to_batch(rows, schema.clone())?;

    let tmp = path.with_extension("parquet.tmp");
    let file = File::create(&tmp).with_context(|| format!("creating {:?}", &tmp))?;
    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();
    let mut writer = ArrowWriter::try_new(BufWriter::new(file), schema, Some(props))
        .context("creating Arrow writer for export")?;
    writer.write(&batch).context("writing export batch")?;
    writer.close().context("closing export writer")?;
    fs::rename(&tmp, path)
        .with_context(|| format!("renaming {:?} to {:?}", &tmp, path))?;

    info!(rows = rows.len(), path = %path.display(), "aggregate exported");
    Ok(())
}
