use agrodash::{config::DashboardConfig, load_table, logging, server};
use anyhow::{Context, Result};
use clap::Parser;
use std::{net::SocketAddr, path::PathBuf};
use tracing::{info, warn};

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Contratos sector agricultura - Colombia: interactive bubble-chart dashboard"
)]
struct Args {
    /// YAML config file (defaults to ./agrodash.yaml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Spreadsheet, CSV or parquet file with the contracts data
    #[arg(short, long)]
    data: Option<PathBuf>,
    #[arg(short, long)]
    port: Option<u16>,
    #[arg(long)]
    bind: Option<std::net::IpAddr>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // ─── 1) config: defaults → yaml → env → flags ───────────────────
    let config_file = DashboardConfig::source_file(args.config.as_deref());
    let mut cfg = DashboardConfig::load(config_file.as_deref())?;
    if let Some(data) = args.data {
        cfg.data_path = data;
    }
    if let Some(port) = args.port {
        cfg.port = port;
    }
    if let Some(bind) = args.bind {
        cfg.bind = bind;
    }

    // ─── 2) init logging ─────────────────────────────────────────────
    logging::init(&cfg.log_level);
    info!("startup");
    match &config_file {
        Some(path) => info!(path = %path.display(), "config file loaded"),
        None => info!("no config file, using defaults"),
    }

    std::panic::set_hook(Box::new(|info| {
        eprintln!("panic: {:?}", info);
    }));

    // ─── 3) load the contracts table once ────────────────────────────
    let table = load_table(&cfg.data_path)
        .with_context(|| format!("cannot start without {}", cfg.data_path.display()))?;
    if !table.cities().contains(&cfg.defaults.city) {
        warn!(city = %cfg.defaults.city, "default city not present in data");
    }

    // ─── 4) serve ────────────────────────────────────────────────────
    let addr = SocketAddr::new(cfg.bind, cfg.port);
    let state = server::AppState::new(table, &cfg);
    server::serve(state, addr).await;

    info!("shutdown");
    Ok(())
}
