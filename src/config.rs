// src/config.rs
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    env, fs,
    net::{IpAddr, Ipv4Addr},
    path::{Path, PathBuf},
};
use crate::chart::ChartSettings;

/// Config file picked up from the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "agrodash.yaml";

/// Dashboard settings. Layered as: defaults, YAML file, environment, CLI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub data_path: PathBuf,
    pub bind: IpAddr,
    pub port: u16,
    pub log_level: String,
    pub defaults: DashboardDefaults,
    pub chart: ChartSettings,
    pub year_range: YearRange,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("data_final_agr.xlsx"),
            bind: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 8050,
            log_level: "info".into(),
            defaults: DashboardDefaults::default(),
            chart: ChartSettings::default(),
            year_range: YearRange::default(),
        }
    }
}

/// Initial values of the three controls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardDefaults {
    pub city: String,
    pub min_year: i32,
    pub entities: Vec<String>,
}

impl Default for DashboardDefaults {
    fn default() -> Self {
        Self {
            city: "Colombia, Bogotá, Bogotá".into(),
            min_year: 2000,
            entities: vec!["ICA_NAL".into()],
        }
    }
}

/// Bounds and mark spacing of the year slider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct YearRange {
    pub min: i32,
    pub max: i32,
    pub mark_step: i32,
}

impl Default for YearRange {
    fn default() -> Self {
        Self {
            min: 2000,
            max: 2021,
            mark_step: 5,
        }
    }
}

impl DashboardConfig {
    /// The file `load` reads: `path` if given, else `agrodash.yaml` when it
    /// exists in the working directory.
    pub fn source_file(path: Option<&Path>) -> Option<PathBuf> {
        match path {
            Some(p) => Some(p.to_path_buf()),
            None => Some(PathBuf::from(DEFAULT_CONFIG_FILE)).filter(|p| p.is_file()),
        }
    }

    /// Read `path` if given (it must exist), else `agrodash.yaml` if present,
    /// else start from defaults. Environment overrides are applied on top.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut cfg = match Self::source_file(path) {
            Some(p) => Self::from_file(&p)?,
            None => Self::default(),
        };
        cfg.apply_env(|key| env::var(key).ok())?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text =
            fs::read_to_string(path).with_context(|| format!("reading config {:?}", path))?;
        let cfg: Self =
            serde_yaml::from_str(&text).with_context(|| format!("parsing config {:?}", path))?;
        Ok(cfg)
    }

    /// Apply `DATA_PATH`, `BIND_ADDR`, `PORT` and `LOG_LEVEL` from `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("DATA_PATH") {
            self.data_path = PathBuf::from(v);
        }
        if let Some(v) = lookup("BIND_ADDR") {
            self.bind = v
                .parse()
                .with_context(|| format!("BIND_ADDR `{}` is not an IP address", v))?;
        }
        if let Some(v) = lookup("PORT") {
            self.port = v
                .parse()
                .with_context(|| format!("PORT `{}` is not a port number", v))?;
        }
        if let Some(v) = lookup("LOG_LEVEL") {
            self.log_level = v;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.chart.size_divisor.is_finite() && self.chart.size_divisor > 0.0) {
            bail!(
                "chart.size_divisor must be a positive number, got {}",
                self.chart.size_divisor
            );
        }
        if self.year_range.min > self.year_range.max {
            bail!(
                "year_range.min ({}) is after year_range.max ({})",
                self.year_range.min,
                self.year_range.max
            );
        }
        if self.year_range.mark_step <= 0 {
            bail!("year_range.mark_step must be positive");
        }
        Ok(())
    }
}
