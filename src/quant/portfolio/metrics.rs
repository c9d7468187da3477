//! # Portfolio Metrics
//!
//! $$
//! \mu_p=K\,\bar{\mathbf r}^\top\mathbf w,\qquad
//! \sigma_p=\sqrt{\mathbf w^\top(K\Sigma)\mathbf w},\qquad
//! S_p=\frac{\mu_p}{\sigma_p}
//! $$
//!
//! Annualized return, volatility and Sharpe ratio of a weight vector, with
//! `K = periods_per_year` and a zero risk-free rate.

use ndarray::ArrayView1;
use ndarray::ArrayView2;

use super::returns::ReturnsModel;
use super::types::WeightVector;
use crate::error::PortfolioError;
use crate::error::Result;

/// Quadratic forms this close below zero are floating-point noise on a
/// positive semi-definite matrix and count as exactly zero.
const VARIANCE_ROUNDOFF: f64 = 1e-15;

/// Quadratic forms at or below this fraction of the largest annualized asset
/// variance (floored at one) are round-off on a zero-variance portfolio.
const VARIANCE_FLOOR: f64 = 1e-20;

/// Annualized statistics of one weight vector.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PortfolioScore {
  pub expected_return: f64,
  pub volatility: f64,
  pub sharpe: f64,
}

/// Annualized expected return `sum(mean * w) * periods_per_year`.
pub fn annualized_return(
  weights: ArrayView1<f64>,
  mean_returns: ArrayView1<f64>,
  periods_per_year: f64,
) -> f64 {
  mean_returns.dot(&weights) * periods_per_year
}

/// Annualized volatility `sqrt(w' (cov * periods_per_year) w)`.
///
/// A clearly negative quadratic form means the covariance matrix is broken and
/// is reported as [`PortfolioError::NegativeVariance`] instead of clamped. A
/// variance within [`VARIANCE_FLOOR`] of zero, relative to the largest diagonal
/// entry, yields exactly zero.
pub fn annualized_volatility(
  weights: ArrayView1<f64>,
  covariance: ArrayView2<f64>,
  periods_per_year: f64,
) -> Result<f64> {
  let annual_cov = &covariance * periods_per_year;
  let variance = weights.dot(&annual_cov.dot(&weights));

  if variance.is_nan() || variance < -VARIANCE_ROUNDOFF {
    return Err(PortfolioError::NegativeVariance(variance));
  }

  let scale = annual_cov.diag().iter().copied().fold(1.0, f64::max);
  if variance <= VARIANCE_FLOOR * scale {
    return Ok(0.0);
  }
  Ok(variance.sqrt())
}

/// Score `weights` against a returns model.
///
/// Zero volatility yields [`PortfolioError::DegenerateVolatility`], which the
/// runner treats as a per-trial condition.
pub fn score(
  weights: &WeightVector,
  model: &ReturnsModel,
  periods_per_year: u32,
) -> Result<PortfolioScore> {
  if weights.len() != model.n_assets() {
    return Err(PortfolioError::InputValidation(format!(
      "{} weights for {} assets",
      weights.len(),
      model.n_assets()
    )));
  }

  let k = f64::from(periods_per_year);
  let w = weights.view();
  let expected_return = annualized_return(w, model.mean_returns().view(), k);
  let volatility = annualized_volatility(w, model.covariance().view(), k)?;

  if volatility == 0.0 {
    return Err(PortfolioError::DegenerateVolatility { expected_return });
  }

  Ok(PortfolioScore {
    expected_return,
    volatility,
    sharpe: expected_return / volatility,
  })
}
