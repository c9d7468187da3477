//! # Portfolio Data Utilities
//!
//! $$
//! \mathcal D=\bigcap_{i=1}^{N}\operatorname{dates}(P^{(i)}),\qquad
//! A_{d,i}=P^{(i)}_d\ \ (d\in\mathcal D)
//! $$
//!
//! Alignment of per-ticker price series into one rectangular table.
//! Dates missing for any ticker are dropped (inner join); nothing is forward
//! filled, so no return is ever fabricated across a gap.

use std::collections::BTreeMap;
use std::collections::HashMap;

use chrono::NaiveDate;
use ndarray::Array2;
use tracing::debug;
use tracing::warn;

use super::types::PriceSeries;
use super::types::TickerList;
use crate::error::PortfolioError;
use crate::error::Result;

/// Prices on common dates, one column per ticker in [`TickerList`] order.
#[derive(Clone, Debug, PartialEq)]
pub struct AlignedPriceTable {
  tickers: Vec<String>,
  dates: Vec<NaiveDate>,
  prices: Array2<f64>,
}

impl AlignedPriceTable {
  pub fn tickers(&self) -> &[String] {
    &self.tickers
  }

  pub fn dates(&self) -> &[NaiveDate] {
    &self.dates
  }

  /// `dates × tickers` price matrix.
  pub fn prices(&self) -> &Array2<f64> {
    &self.prices
  }

  pub fn n_assets(&self) -> usize {
    self.tickers.len()
  }

  pub fn n_dates(&self) -> usize {
    self.dates.len()
  }
}

/// Usable observations of one series keyed by date. Later duplicates win.
fn clean_series(ticker: &str, series: &PriceSeries) -> BTreeMap<NaiveDate, f64> {
  let mut out = BTreeMap::new();
  let mut dropped = 0usize;

  for &(date, price) in series.points() {
    if price.is_finite() && price > 0.0 {
      out.insert(date, price);
    } else {
      out.remove(&date);
      dropped += 1;
    }
  }

  if dropped > 0 {
    warn!(ticker, dropped, "dropped non-positive or non-finite prices");
  }
  out
}

/// Inner-join the fetched series on date.
///
/// Fails with [`PortfolioError::InsufficientData`] when a ticker has no usable
/// observations or when the series share no date at all.
pub fn align(
  tickers: &TickerList,
  series_by_ticker: &HashMap<String, PriceSeries>,
) -> Result<AlignedPriceTable> {
  let mut cleaned = Vec::with_capacity(tickers.len());

  for ticker in tickers.iter() {
    let series = series_by_ticker.get(ticker).ok_or_else(|| {
      PortfolioError::InsufficientData(format!("no price series supplied for {ticker}"))
    })?;
    let points = clean_series(ticker, series);
    if points.is_empty() {
      return Err(PortfolioError::InsufficientData(format!(
        "no price data for {ticker}"
      )));
    }
    cleaned.push(points);
  }

  let Some((first, rest)) = cleaned.split_first() else {
    return Err(PortfolioError::InsufficientData(
      "no tickers to align".to_string(),
    ));
  };

  let dates: Vec<NaiveDate> = first
    .keys()
    .filter(|d| rest.iter().all(|s| s.contains_key(*d)))
    .copied()
    .collect();

  if dates.is_empty() {
    return Err(PortfolioError::InsufficientData(
      "price series share no common dates".to_string(),
    ));
  }

  let longest: usize = cleaned.iter().map(|s| s.len()).max().unwrap_or(0);
  debug!(
    kept = dates.len(),
    longest,
    "aligned price series on common dates"
  );

  let prices = Array2::from_shape_fn((dates.len(), cleaned.len()), |(row, col)| {
    cleaned[col].get(&dates[row]).copied().unwrap_or(f64::NAN)
  });

  Ok(AlignedPriceTable {
    tickers: tickers.as_slice().to_vec(),
    dates,
    prices,
  })
}

#[cfg(test)]
pub(crate) fn table_from_columns(tickers: &[&str], columns: &[Vec<f64>]) -> AlignedPriceTable {
  let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
  let n = columns.first().map(|c| c.len()).unwrap_or(0);
  let dates = (0..n)
    .map(|i| start + chrono::Days::new(i as u64))
    .collect();
  let prices = Array2::from_shape_fn((n, columns.len()), |(r, c)| columns[c][r]);
  AlignedPriceTable {
    tickers: tickers.iter().map(|s| s.to_string()).collect(),
    dates,
    prices,
  }
}
