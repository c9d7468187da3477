//! # Returns Model
//!
//! $$
//! r_{d,i}=\ln\frac{P_{d,i}}{P_{d-1,i}},\qquad
//! \Sigma_{ij}=\frac{1}{T-1}\sum_{d}(r_{d,i}-\bar r_i)(r_{d,j}-\bar r_j)
//! $$
//!
//! Daily log returns, their per-asset means and the sample covariance matrix
//! (`T - 1` denominator). Both are per period; annualization multiplies by
//! `periods_per_year` in [`super::metrics`].

use chrono::NaiveDate;
use ndarray::Array1;
use ndarray::Array2;
use ndarray::Axis;
use ndarray::s;
use ndarray_stats::CorrelationExt;
use tracing::debug;

use super::data::AlignedPriceTable;
use crate::error::PortfolioError;
use crate::error::Result;

/// Simple returns `p[d] / p[d-1] - 1`, one row shorter than the price table.
pub fn pct_returns(prices: &Array2<f64>) -> Array2<f64> {
  if prices.nrows() < 2 {
    return Array2::zeros((0, prices.ncols()));
  }
  &prices.slice(s![1.., ..]) / &prices.slice(s![..-1, ..]) - 1.0
}

/// Log returns `ln(p[d] / p[d-1])`, one row shorter than the price table.
pub fn log_returns(prices: &Array2<f64>) -> Array2<f64> {
  if prices.nrows() < 2 {
    return Array2::zeros((0, prices.ncols()));
  }
  (&prices.slice(s![1.., ..]) / &prices.slice(s![..-1, ..])).mapv(f64::ln)
}

/// Compounded percent performance `100 * (prod(1 + r) - 1)` per ticker.
pub fn cumulative_percent_returns(pct: &Array2<f64>) -> Array2<f64> {
  let mut growth = pct.mapv(|r| 1.0 + r);
  growth.accumulate_axis_inplace(Axis(0), |&prev, curr| *curr *= prev);
  growth.mapv(|g| 100.0 * (g - 1.0))
}

/// Cumulative percent return per ticker, indexed by date.
#[derive(Clone, Debug, PartialEq)]
pub struct CumulativeReturns {
  pub tickers: Vec<String>,
  /// Dates from the second aligned observation onward.
  pub dates: Vec<NaiveDate>,
  /// `dates × tickers`, in percent.
  pub values: Array2<f64>,
}

impl CumulativeReturns {
  pub fn from_table(table: &AlignedPriceTable) -> Result<Self> {
    if table.n_dates() < 2 {
      return Err(PortfolioError::InsufficientData(format!(
        "performance needs at least 2 common dates, got {}",
        table.n_dates()
      )));
    }
    let pct = pct_returns(table.prices());
    Ok(Self {
      tickers: table.tickers().to_vec(),
      dates: table.dates()[1..].to_vec(),
      values: cumulative_percent_returns(&pct),
    })
  }

  /// Total percent return over the window for each ticker.
  pub fn last(&self) -> Option<Array1<f64>> {
    let n = self.values.nrows();
    (n > 0).then(|| self.values.row(n - 1).to_owned())
  }
}

/// Read-only return/covariance model shared by every trial of a run.
#[derive(Clone, Debug)]
pub struct ReturnsModel {
  tickers: Vec<String>,
  log_returns: Array2<f64>,
  mean_returns: Array1<f64>,
  covariance: Array2<f64>,
}

impl ReturnsModel {
  /// Derive log returns and their covariance from aligned prices.
  ///
  /// Needs at least two return observations so the sample covariance is defined.
  pub fn build(table: &AlignedPriceTable) -> Result<Self> {
    let log_returns = log_returns(table.prices());
    Self::from_log_returns(table.tickers().to_vec(), log_returns)
  }

  /// Build directly from a `periods × assets` log-return matrix.
  pub fn from_log_returns(tickers: Vec<String>, log_returns: Array2<f64>) -> Result<Self> {
    if tickers.len() != log_returns.ncols() {
      return Err(PortfolioError::InputValidation(format!(
        "{} tickers for {} return columns",
        tickers.len(),
        log_returns.ncols()
      )));
    }
    if log_returns.nrows() < 2 {
      return Err(PortfolioError::InsufficientData(format!(
        "at least 2 return observations required, got {}",
        log_returns.nrows()
      )));
    }
    if log_returns.iter().any(|r| !r.is_finite()) {
      return Err(PortfolioError::InsufficientData(
        "log returns contain non-finite values".to_string(),
      ));
    }

    let mean_returns = log_returns
      .mean_axis(Axis(0))
      .ok_or_else(|| PortfolioError::InsufficientData("empty return matrix".to_string()))?;
    let covariance = log_returns
      .t()
      .cov(1.0)
      .map_err(|e| PortfolioError::InsufficientData(e.to_string()))?;

    debug!(
      periods = log_returns.nrows(),
      assets = log_returns.ncols(),
      "built returns model"
    );

    Ok(Self {
      tickers,
      log_returns,
      mean_returns,
      covariance,
    })
  }

  pub fn tickers(&self) -> &[String] {
    &self.tickers
  }

  pub fn n_assets(&self) -> usize {
    self.tickers.len()
  }

  pub fn n_periods(&self) -> usize {
    self.log_returns.nrows()
  }

  /// `periods × assets` daily log returns.
  pub fn log_returns(&self) -> &Array2<f64> {
    &self.log_returns
  }

  /// Mean daily log return per asset.
  pub fn mean_returns(&self) -> &Array1<f64> {
    &self.mean_returns
  }

  /// Daily sample covariance of log returns.
  pub fn covariance(&self) -> &Array2<f64> {
    &self.covariance
  }
}

#[cfg(test)]
mod tests {
  use approx::assert_abs_diff_eq;
  use ndarray::array;

  use super::*;
  use crate::quant::portfolio::data::table_from_columns;

  #[test]
  fn log_returns_drop_first_row() {
    let prices = array![[100.0, 50.0], [110.0, 50.0], [99.0, 55.0]];
    let lr = log_returns(&prices);

    assert_eq!(lr.dim(), (2, 2));
    assert_abs_diff_eq!(lr[[0, 0]], (1.1f64).ln(), epsilon = 1e-15);
    assert_abs_diff_eq!(lr[[1, 0]], (0.9f64).ln(), epsilon = 1e-15);
    assert_abs_diff_eq!(lr[[0, 1]], 0.0, epsilon = 1e-15);
  }

  #[test]
  fn cumulative_returns_compound() {
    let prices = array![[100.0], [110.0], [121.0], [108.9]];
    let pct = pct_returns(&prices);
    let cumulative = cumulative_percent_returns(&pct);

    assert_abs_diff_eq!(cumulative[[0, 0]], 10.0, epsilon = 1e-9);
    assert_abs_diff_eq!(cumulative[[1, 0]], 21.0, epsilon = 1e-9);
    assert_abs_diff_eq!(cumulative[[2, 0]], 8.9, epsilon = 1e-9);
  }

  #[test]
  fn performance_projection_has_one_row_per_return() {
    let table = table_from_columns(&["AAA"], &[vec![10.0, 12.0, 15.0]]);
    let perf = CumulativeReturns::from_table(&table).unwrap();

    assert_eq!(perf.dates.len(), 2);
    assert_eq!(perf.dates[0], table.dates()[1]);
    assert_abs_diff_eq!(perf.last().unwrap()[0], 50.0, epsilon = 1e-9);
  }

  #[test]
  fn covariance_uses_sample_denominator() {
    let lr = array![[0.01, 0.02], [-0.01, 0.00], [0.03, 0.01], [0.01, -0.03]];
    let model = ReturnsModel::from_log_returns(vec!["A".into(), "B".into()], lr.clone()).unwrap();

    let mean_a = 0.04 / 4.0;
    let mean_b = 0.0;
    let var_a: f64 = lr.column(0).iter().map(|r| (r - mean_a).powi(2)).sum::<f64>() / 3.0;
    let cov_ab: f64 = lr
      .rows()
      .into_iter()
      .map(|row| (row[0] - mean_a) * (row[1] - mean_b))
      .sum::<f64>()
      / 3.0;

    assert_abs_diff_eq!(model.mean_returns()[0], mean_a, epsilon = 1e-15);
    assert_abs_diff_eq!(model.covariance()[[0, 0]], var_a, epsilon = 1e-15);
    assert_abs_diff_eq!(model.covariance()[[0, 1]], cov_ab, epsilon = 1e-15);
    assert_abs_diff_eq!(model.covariance()[[1, 0]], cov_ab, epsilon = 1e-15);
  }

  #[test]
  fn zero_variance_asset_has_zero_row() {
    let table = table_from_columns(
      &["FLAT", "MOVE"],
      &[vec![10.0, 10.0, 10.0, 10.0], vec![10.0, 11.0, 10.5, 12.0]],
    );
    let model = ReturnsModel::build(&table).unwrap();

    assert_eq!(model.covariance()[[0, 0]], 0.0);
    assert_eq!(model.covariance()[[0, 1]], 0.0);
    assert!(model.covariance()[[1, 1]] > 0.0);
  }

  #[test]
  fn too_few_observations_is_insufficient_data() {
    let table = table_from_columns(&["A", "B"], &[vec![10.0, 11.0], vec![5.0, 6.0]]);
    assert!(matches!(
      ReturnsModel::build(&table),
      Err(PortfolioError::InsufficientData(_))
    ));
  }
}
