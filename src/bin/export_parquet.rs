use agrodash::{aggregate, export::write_parquet, load_table, logging, query, Filters};
use anyhow::{bail, Result};
use chrono::Local;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Write the contract aggregate table (optionally filtered) to parquet"
)]
struct Args {
    #[arg(short, long)]
    data: PathBuf,
    /// Output file; defaults to ./output/aggregate_<timestamp>.parquet
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Filter to one city (requires at least one --entity)
    #[arg(long)]
    city: Option<String>,
    #[arg(long)]
    min_year: Option<i32>,
    #[arg(long = "entity")]
    entities: Vec<String>,
}

fn main() -> Result<()> {
    logging::init("info");
    let args = Args::parse();

    let table = load_table(&args.data)?;

    let rows = match args.city {
        Some(city) => {
            if args.entities.is_empty() {
                bail!("--city needs at least one --entity");
            }
            query(
                &table,
                &Filters::new(city, args.min_year.unwrap_or(i32::MIN), args.entities),
            )
        }
        None => match args.min_year {
            Some(min_year) => aggregate(table.records().iter().filter(|r| r.year >= min_year)),
            None => aggregate(table.records()),
        },
    };

    let output = args.output.unwrap_or_else(|| {
        let now = Local::now().format("%Y%m%d_%H%M%S").to_string();
        PathBuf::from("output").join(format!("aggregate_{}.parquet", now))
    });
    write_parquet(&rows, &output)?;
    info!(rows = rows.len(), "wrote {}", output.display());
    Ok(())
}
