use agrodash::{chart::hover_text, config::DashboardDefaults, load_table, logging, query, Filters};
use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

/// Run one dashboard query from the command line and print the rows.
#[derive(Parser)]
#[command(author, version, about = "Print the filtered contract aggregate for one filter set")]
struct Args {
    #[arg(short, long)]
    data: PathBuf,
    #[arg(long, default_value_t = DashboardDefaults::default().city)]
    city: String,
    #[arg(long, default_value_t = 2000)]
    min_year: i32,
    /// Repeat for several entities; defaults to ICA_NAL
    #[arg(long = "entity")]
    entities: Vec<String>,
    /// Print the chart hover text instead of JSON rows
    #[arg(long)]
    hover: bool,
}

fn main() -> Result<()> {
    logging::init("warn");
    let args = Args::parse();

    let table = load_table(&args.data)?;
    let entities = if args.entities.is_empty() {
        DashboardDefaults::default().entities
    } else {
        args.entities
    };
    let filters = Filters::new(args.city, args.min_year, entities);
    let rows = query(&table, &filters);
    info!(rows = rows.len(), "query done");

    if args.hover {
        for r in &rows {
            println!("{}", hover_text(r).replace("<br>", "\n"));
        }
    } else {
        println!("{}", serde_json::to_string_pretty(&rows)?);
    }
    Ok(())
}
