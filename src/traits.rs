//! # Traits
//!
//! $$
//! \text{provider}:(\text{ticker},t_0,t_1)\mapsto\{(t_k,P_k)\}_{k}
//! $$
//!
use chrono::NaiveDate;

use crate::quant::portfolio::PriceSeries;

/// Source of historical adjusted-close prices.
///
/// Implementations return the observations in `[start, end]` ordered by date.
/// An error or an empty series is recoverable for the caller; the runner turns
/// both into an insufficient-data failure naming the ticker.
pub trait PriceHistoryProvider: Send + Sync {
  fn fetch(&self, ticker: &str, start: NaiveDate, end: NaiveDate) -> anyhow::Result<PriceSeries>;
}

impl<P: PriceHistoryProvider + ?Sized> PriceHistoryProvider for &P {
  fn fetch(&self, ticker: &str, start: NaiveDate, end: NaiveDate) -> anyhow::Result<PriceSeries> {
    (**self).fetch(ticker, start, end)
  }
}

impl<P: PriceHistoryProvider + ?Sized> PriceHistoryProvider for Box<P> {
  fn fetch(&self, ticker: &str, start: NaiveDate, end: NaiveDate) -> anyhow::Result<PriceSeries> {
    (**self).fetch(ticker, start, end)
  }
}
