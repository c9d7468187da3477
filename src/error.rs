//! # Errors
//!
//! Error taxonomy for the simulation pipeline. Validation and data errors abort a
//! run before any trial is drawn, degenerate trials are absorbed by the runner,
//! and persistence failures are kept apart from computation failures.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for portfolio simulation.
#[derive(Error, Debug)]
pub enum PortfolioError {
  #[error("invalid input: {0}")]
  InputValidation(String),

  #[error("insufficient data: {0}")]
  InsufficientData(String),

  #[error("degenerate volatility: portfolio volatility is zero (return {expected_return})")]
  DegenerateVolatility { expected_return: f64 },

  #[error("negative portfolio variance {0:e}: covariance matrix is not positive semi-definite")]
  NegativeVariance(f64),

  #[error("no simulation result stored at {}", .0.display())]
  NoResult(PathBuf),

  #[error("persistence error at {}: {message}", .path.display())]
  Persistence { path: PathBuf, message: String },

  #[error("invalid configuration: {0}")]
  Config(String),

  #[error("TOML parsing error: {0}")]
  Toml(#[from] toml::de::Error),

  #[error("export error: {0}")]
  Export(#[from] csv::Error),

  #[error("IO error: {0}")]
  Io(#[from] std::io::Error),
}

impl PortfolioError {
  pub(crate) fn persistence(path: impl Into<PathBuf>, message: impl ToString) -> Self {
    Self::Persistence {
      path: path.into(),
      message: message.to_string(),
    }
  }
}

/// Result type alias for portfolio operations.
pub type Result<T> = std::result::Result<T, PortfolioError>;
