//! # Portfolio Types
//!
//! $$
//! \mathcal R=\{(\mathbf w_k,\mu_k,\sigma_k,S_k)\}_{k},\qquad S_k\ge S_{k+1}
//! $$
//!
//! Tickers, price series, weight vectors and the ranked trial table.

use std::cmp::Reverse;
use std::collections::HashSet;

use chrono::NaiveDate;
use ndarray::ArrayView1;
use ordered_float::OrderedFloat;
use serde::Deserialize;
use serde::Serialize;
use tracing::warn;

use crate::error::PortfolioError;
use crate::error::Result;

/// Largest accepted number of instruments.
pub const MAX_TICKERS: usize = 10;
/// Minimum number of instruments for a simulation run.
pub const MIN_SIMULATION_TICKERS: usize = 2;
/// Minimum number of instruments for the performance projection.
pub const MIN_PERFORMANCE_TICKERS: usize = 1;
/// Allowed deviation of a weight vector's sum from one.
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-9;

pub const RETURN_COLUMN: &str = "Return";
pub const VOLATILITY_COLUMN: &str = "Volatility";
pub const SHARPE_COLUMN: &str = "Sharpe";

/// Ordered list of instrument symbols.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TickerList(Vec<String>);

impl TickerList {
  /// Parse raw entry-box values.
  ///
  /// Entries are whitespace-trimmed and trailing blanks are dropped. A blank
  /// entry followed by a filled one is rejected, as are lists shorter than
  /// `min_len` or longer than [`MAX_TICKERS`]. Duplicates are kept.
  pub fn parse<S: AsRef<str>>(entries: &[S], min_len: usize) -> Result<Self> {
    let mut symbols: Vec<String> = entries
      .iter()
      .map(|s| s.as_ref().trim().to_string())
      .collect();

    while symbols.last().is_some_and(|s| s.is_empty()) {
      symbols.pop();
    }

    if let Some(pos) = symbols.iter().position(|s| s.is_empty()) {
      return Err(PortfolioError::InputValidation(format!(
        "security {} must contain a ticker",
        pos + 1
      )));
    }
    if symbols.len() < min_len {
      return Err(PortfolioError::InputValidation(format!(
        "at least {min_len} tickers required, got {}",
        symbols.len()
      )));
    }
    if symbols.len() > MAX_TICKERS {
      return Err(PortfolioError::InputValidation(format!(
        "at most {MAX_TICKERS} tickers allowed, got {}",
        symbols.len()
      )));
    }

    let mut seen = HashSet::new();
    for s in &symbols {
      if !seen.insert(s.as_str()) {
        warn!(ticker = %s, "duplicate ticker in portfolio");
      }
    }

    Ok(Self(symbols))
  }

  pub fn for_simulation<S: AsRef<str>>(entries: &[S]) -> Result<Self> {
    Self::parse(entries, MIN_SIMULATION_TICKERS)
  }

  pub fn for_performance<S: AsRef<str>>(entries: &[S]) -> Result<Self> {
    Self::parse(entries, MIN_PERFORMANCE_TICKERS)
  }

  pub fn as_slice(&self) -> &[String] {
    &self.0
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  pub fn iter(&self) -> std::slice::Iter<'_, String> {
    self.0.iter()
  }
}

/// Time-ordered adjusted-close observations for one ticker.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PriceSeries {
  points: Vec<(NaiveDate, f64)>,
}

impl PriceSeries {
  /// Build a series, ordering the observations by date.
  pub fn new(mut points: Vec<(NaiveDate, f64)>) -> Self {
    points.sort_by_key(|(date, _)| *date);
    Self { points }
  }

  pub fn points(&self) -> &[(NaiveDate, f64)] {
    &self.points
  }

  pub fn len(&self) -> usize {
    self.points.len()
  }

  pub fn is_empty(&self) -> bool {
    self.points.is_empty()
  }

  /// Observations falling inside `[start, end]`.
  pub fn within(&self, start: NaiveDate, end: NaiveDate) -> Self {
    Self {
      points: self
        .points
        .iter()
        .filter(|(d, _)| *d >= start && *d <= end)
        .copied()
        .collect(),
    }
  }
}

impl FromIterator<(NaiveDate, f64)> for PriceSeries {
  fn from_iter<I: IntoIterator<Item = (NaiveDate, f64)>>(iter: I) -> Self {
    Self::new(iter.into_iter().collect())
  }
}

/// Non-negative portfolio weights summing to one, in ticker order.
#[derive(Clone, Debug, PartialEq)]
pub struct WeightVector(Vec<f64>);

impl WeightVector {
  /// Validate and wrap explicit weights.
  pub fn new(weights: Vec<f64>) -> Result<Self> {
    if weights.is_empty() {
      return Err(PortfolioError::InputValidation(
        "weight vector must not be empty".to_string(),
      ));
    }
    if let Some(w) = weights.iter().find(|w| !w.is_finite() || **w < 0.0) {
      return Err(PortfolioError::InputValidation(format!(
        "weights must be finite and non-negative, got {w}"
      )));
    }
    let sum: f64 = weights.iter().sum();
    if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
      return Err(PortfolioError::InputValidation(format!(
        "weights must sum to 1, got {sum}"
      )));
    }
    Ok(Self(weights))
  }

  pub(crate) fn from_normalized(weights: Vec<f64>) -> Self {
    Self(weights)
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  pub fn as_slice(&self) -> &[f64] {
    &self.0
  }

  pub fn view(&self) -> ArrayView1<'_, f64> {
    ArrayView1::from(self.0.as_slice())
  }

  pub fn into_vec(self) -> Vec<f64> {
    self.0
  }
}

/// One scored random draw.
#[derive(Clone, Debug, PartialEq)]
pub struct SimulationTrial {
  /// Zero-based draw index within the run.
  pub trial: usize,
  pub weights: WeightVector,
  /// Annualized expected log return.
  pub expected_return: f64,
  /// Annualized volatility.
  pub volatility: f64,
  /// `expected_return / volatility` (zero risk-free rate).
  pub sharpe: f64,
}

/// Trials of a run ranked by Sharpe ratio, highest first.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(into = "StoredTable", try_from = "StoredTable")]
pub struct ResultTable {
  tickers: Vec<String>,
  trials: Vec<SimulationTrial>,
}

impl ResultTable {
  /// Rank trials by descending Sharpe. Equal ratios keep their draw order.
  pub fn from_trials(tickers: Vec<String>, mut trials: Vec<SimulationTrial>) -> Self {
    trials.sort_by_key(|t| Reverse(OrderedFloat(t.sharpe)));
    Self { tickers, trials }
  }

  pub fn tickers(&self) -> &[String] {
    &self.tickers
  }

  pub fn trials(&self) -> &[SimulationTrial] {
    &self.trials
  }

  pub fn len(&self) -> usize {
    self.trials.len()
  }

  pub fn is_empty(&self) -> bool {
    self.trials.is_empty()
  }

  /// Highest-Sharpe trial.
  pub fn best(&self) -> Option<&SimulationTrial> {
    self.trials.first()
  }

  /// Column names: one weight column per ticker, then return, volatility, Sharpe.
  pub fn columns(&self) -> Vec<String> {
    let mut columns = self.tickers.clone();
    columns.extend([RETURN_COLUMN, VOLATILITY_COLUMN, SHARPE_COLUMN].map(String::from));
    columns
  }

  /// Flat row values in [`ResultTable::columns`] order.
  pub fn row(&self, idx: usize) -> Option<Vec<f64>> {
    self.trials.get(idx).map(|t| {
      let mut row = t.weights.as_slice().to_vec();
      row.extend([t.expected_return, t.volatility, t.sharpe]);
      row
    })
  }

  pub fn is_ranked(&self) -> bool {
    self.trials.windows(2).all(|w| w[0].sharpe >= w[1].sharpe)
  }

  /// First `n` rows. Asking for more rows than exist returns the whole table.
  pub fn top_n(&self, n: usize) -> ResultTable {
    Self {
      tickers: self.tickers.clone(),
      trials: self.trials.iter().take(n).cloned().collect(),
    }
  }
}

/// Free-function form of [`ResultTable::top_n`].
pub fn top_n(table: &ResultTable, n: usize) -> ResultTable {
  table.top_n(n)
}

/// Columnar on-disk layout of a [`ResultTable`].
#[derive(Clone, Debug, Serialize, Deserialize)]
struct StoredTable {
  columns: Vec<String>,
  index: Vec<usize>,
  rows: Vec<Vec<f64>>,
}

impl From<ResultTable> for StoredTable {
  fn from(table: ResultTable) -> Self {
    let columns = table.columns();
    let rows = (0..table.len()).filter_map(|i| table.row(i)).collect();
    let index = table.trials.iter().map(|t| t.trial).collect();
    Self {
      columns,
      index,
      rows,
    }
  }
}

impl TryFrom<StoredTable> for ResultTable {
  type Error = String;

  fn try_from(stored: StoredTable) -> std::result::Result<Self, Self::Error> {
    let width = stored.columns.len();
    let tail = [RETURN_COLUMN, VOLATILITY_COLUMN, SHARPE_COLUMN];
    if width < tail.len() + 1 || stored.columns[width - tail.len()..] != tail {
      return Err(format!(
        "expected ticker columns followed by {tail:?}, got {:?}",
        stored.columns
      ));
    }
    if stored.index.len() != stored.rows.len() {
      return Err(format!(
        "index has {} entries for {} rows",
        stored.index.len(),
        stored.rows.len()
      ));
    }

    let n_assets = width - tail.len();
    let tickers = stored.columns[..n_assets].to_vec();
    let mut trials = Vec::with_capacity(stored.rows.len());

    for (trial, row) in stored.index.into_iter().zip(stored.rows) {
      if row.len() != width {
        return Err(format!(
          "row for trial {trial} has {} values, expected {width}",
          row.len()
        ));
      }
      let weights = WeightVector::new(row[..n_assets].to_vec()).map_err(|e| e.to_string())?;
      trials.push(SimulationTrial {
        trial,
        weights,
        expected_return: row[n_assets],
        volatility: row[n_assets + 1],
        sharpe: row[n_assets + 2],
      });
    }

    Ok(Self { tickers, trials })
  }
}
