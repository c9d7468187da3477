//! # Configuration
//!
//! Run parameters with documented defaults, loadable from a TOML file.
//! Every section and field is optional in the file; missing values fall back to
//! the defaults below.

use std::fs;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;
use tracing::info;

use crate::error::PortfolioError;
use crate::error::Result;

/// Number of random weight vectors drawn per run.
pub const DEFAULT_TRIAL_COUNT: usize = 6000;
/// Length of the price history window in years.
pub const DEFAULT_LOOKBACK_YEARS: u32 = 5;
/// Trading periods per year used to annualize daily statistics.
pub const DEFAULT_PERIODS_PER_YEAR: u32 = 252;
/// Rows shown by the tabular top-N view.
pub const DEFAULT_TOP_ROWS: usize = 10;

/// Parameters of a single simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
  /// Number of independent trials. Must be at least 1.
  pub trial_count: usize,
  /// Lookback window in years, ending today. Must be positive.
  pub lookback_years: u32,
  /// Annualization factor for mean and covariance of daily log returns.
  pub periods_per_year: u32,
  /// Seed for reproducible runs. `None` draws a fresh seed from entropy.
  pub seed: Option<u64>,
  /// Score trials on the rayon thread pool.
  pub parallel: bool,
  /// Draw a progress bar on stderr while trials run.
  pub show_progress: bool,
}

impl Default for SimulationConfig {
  fn default() -> Self {
    Self {
      trial_count: DEFAULT_TRIAL_COUNT,
      lookback_years: DEFAULT_LOOKBACK_YEARS,
      periods_per_year: DEFAULT_PERIODS_PER_YEAR,
      seed: None,
      parallel: false,
      show_progress: false,
    }
  }
}

impl SimulationConfig {
  /// Reject parameters that cannot produce a meaningful run.
  pub fn validate(&self) -> Result<()> {
    if self.trial_count == 0 {
      return Err(PortfolioError::InputValidation(
        "trial_count must be at least 1".to_string(),
      ));
    }
    if self.lookback_years == 0 {
      return Err(PortfolioError::InputValidation(
        "lookback_years must be greater than 0".to_string(),
      ));
    }
    if self.periods_per_year == 0 {
      return Err(PortfolioError::InputValidation(
        "periods_per_year must be greater than 0".to_string(),
      ));
    }
    Ok(())
  }
}

/// Location of the persisted result table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
  pub result_path: PathBuf,
}

impl Default for StoreConfig {
  fn default() -> Self {
    Self {
      result_path: PathBuf::from("mc.json"),
    }
  }
}

/// Spreadsheet export settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
  pub path: PathBuf,
  /// Number of top rows to export; `None` exports the whole table.
  pub rows: Option<usize>,
}

impl Default for ExportConfig {
  fn default() -> Self {
    Self {
      path: PathBuf::from("MCSimResults.csv"),
      rows: None,
    }
  }
}

/// Chart output settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
  pub performance_html: PathBuf,
  pub risk_return_html: PathBuf,
  pub top_rows: usize,
}

impl Default for ChartConfig {
  fn default() -> Self {
    Self {
      performance_html: PathBuf::from("performance.html"),
      risk_return_html: PathBuf::from("mc_results.html"),
      top_rows: DEFAULT_TOP_ROWS,
    }
  }
}

/// Complete application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
  pub simulation: SimulationConfig,
  pub store: StoreConfig,
  pub export: ExportConfig,
  pub charts: ChartConfig,
}

impl AppConfig {
  /// Parse a configuration from TOML text and validate it.
  pub fn from_toml_str(content: &str) -> Result<Self> {
    let config: AppConfig = toml::from_str(content)?;
    config.validate()?;
    Ok(config)
  }

  /// Load a configuration file.
  pub fn load(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)?;
    let config = Self::from_toml_str(&content)?;
    info!("Loaded configuration from {}", path.display());
    Ok(config)
  }

  pub fn validate(&self) -> Result<()> {
    self
      .simulation
      .validate()
      .map_err(|e| PortfolioError::Config(e.to_string()))?;
    if self.export.rows == Some(0) {
      return Err(PortfolioError::Config(
        "export.rows must be at least 1 when set".to_string(),
      ));
    }
    Ok(())
  }
}
