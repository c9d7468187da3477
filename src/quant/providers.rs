//! # Price History Providers
//!
//! $$
//! [t_0,t_1]=[\,\text{today}-Y\ \text{years},\ \text{today}\,]
//! $$
//!
//! Lookback window computation and offline [`PriceHistoryProvider`]
//! implementations. The Yahoo Finance provider lives in [`super::yahoo`] behind
//! the `yahoo` feature.

use std::collections::HashMap;
use std::path::Path;
use std::path::PathBuf;

use anyhow::Context;
use anyhow::anyhow;
use anyhow::bail;
use chrono::Local;
use chrono::Months;
use chrono::NaiveDate;
use csv::ReaderBuilder;
use tracing::debug;
use tracing::info;

use super::portfolio::PriceSeries;
use crate::error::PortfolioError;
use crate::error::Result;
use crate::traits::PriceHistoryProvider;

/// Closed date range prices are requested for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LookbackWindow {
  pub start: NaiveDate,
  pub end: NaiveDate,
}

impl LookbackWindow {
  /// `years` calendar years ending at `end`.
  pub fn ending_at(end: NaiveDate, years: u32) -> Result<Self> {
    if years == 0 {
      return Err(PortfolioError::InputValidation(
        "lookback window must be at least one year".to_string(),
      ));
    }
    let start = end
      .checked_sub_months(Months::new(years.saturating_mul(12)))
      .ok_or_else(|| {
        PortfolioError::InputValidation(format!("lookback of {years} years is out of range"))
      })?;
    Ok(Self { start, end })
  }

  /// `years` calendar years ending today (local date), evaluated at call time.
  pub fn ending_today(years: u32) -> Result<Self> {
    Self::ending_at(Local::now().date_naive(), years)
  }
}

/// Provider over series held in memory, filtered to the requested window.
#[derive(Clone, Debug, Default)]
pub struct InMemoryProvider {
  series: HashMap<String, PriceSeries>,
}

impl InMemoryProvider {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_series(mut self, ticker: impl Into<String>, series: PriceSeries) -> Self {
    self.insert(ticker, series);
    self
  }

  pub fn insert(&mut self, ticker: impl Into<String>, series: PriceSeries) {
    self.series.insert(ticker.into(), series);
  }
}

impl PriceHistoryProvider for InMemoryProvider {
  fn fetch(&self, ticker: &str, start: NaiveDate, end: NaiveDate) -> anyhow::Result<PriceSeries> {
    self
      .series
      .get(ticker)
      .map(|s| s.within(start, end))
      .ok_or_else(|| anyhow!("unknown ticker {ticker}"))
  }
}

/// Reads `<dir>/<TICKER>.csv` files with a `Date` column and an `Adj Close`
/// (or `Close`) column, as written by common price-download tools.
#[derive(Clone, Debug)]
pub struct CsvDirectoryProvider {
  dir: PathBuf,
}

const DATE_COLUMNS: [&str; 3] = ["date", "datetime", "timestamp"];
const PRICE_COLUMNS: [&str; 4] = ["adj close", "adj_close", "adjclose", "close"];

impl CsvDirectoryProvider {
  pub fn new(dir: impl Into<PathBuf>) -> Self {
    Self { dir: dir.into() }
  }

  /// File holding `ticker`'s prices. Tickers that could name a path outside
  /// the directory are rejected.
  pub fn path_for(&self, ticker: &str) -> anyhow::Result<PathBuf> {
    if ticker.is_empty() || ticker.contains("..") || ticker.chars().any(std::path::is_separator) {
      bail!("ticker {ticker:?} is not a valid file name");
    }
    Ok(self.dir.join(format!("{ticker}.csv")))
  }

  fn read(path: &Path) -> anyhow::Result<PriceSeries> {
    let mut reader = ReaderBuilder::new()
      .has_headers(true)
      .flexible(true)
      .from_path(path)
      .with_context(|| format!("failed opening {}", path.display()))?;

    let headers: Vec<String> = reader
      .headers()?
      .iter()
      .map(|h| h.trim().to_lowercase())
      .collect();
    let find = |names: &[&str]| {
      names
        .iter()
        .find_map(|name| headers.iter().position(|h| h == name))
    };
    let date_col = find(&DATE_COLUMNS).ok_or_else(|| anyhow!("no date column in {}", path.display()))?;
    let price_col =
      find(&PRICE_COLUMNS).ok_or_else(|| anyhow!("no close column in {}", path.display()))?;

    let mut points = Vec::new();
    let mut skipped = 0usize;
    for (row, record) in reader.records().enumerate() {
      let record = record.with_context(|| format!("row {} of {}", row + 1, path.display()))?;
      let (Some(date), Some(price)) = (record.get(date_col), record.get(price_col)) else {
        skipped += 1;
        continue;
      };
      match (parse_date(date), price.trim().parse::<f64>()) {
        (Some(date), Ok(price)) => points.push((date, price)),
        _ => skipped += 1,
      }
    }

    if skipped > 0 {
      debug!(skipped, path = %path.display(), "skipped unparseable price rows");
    }
    Ok(PriceSeries::new(points))
  }
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
  let raw = raw.trim();
  let day = raw.get(..10).unwrap_or(raw);
  NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

impl PriceHistoryProvider for CsvDirectoryProvider {
  fn fetch(&self, ticker: &str, start: NaiveDate, end: NaiveDate) -> anyhow::Result<PriceSeries> {
    let path = self.path_for(ticker)?;
    if !path.is_file() {
      bail!("no price file for {ticker} at {}", path.display());
    }
    let series = Self::read(&path)?.within(start, end);
    info!(ticker, observations = series.len(), "loaded prices from {}", path.display());
    Ok(series)
  }
}

#[cfg(test)]
mod tests {
  use std::fs;

  use super::*;

  fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
  }

  #[test]
  fn window_spans_whole_years() {
    let w = LookbackWindow::ending_at(d(2024, 6, 14), 5).unwrap();
    assert_eq!(w.start, d(2019, 6, 14));
    assert_eq!(w.end, d(2024, 6, 14));

    let leap = LookbackWindow::ending_at(d(2024, 2, 29), 1).unwrap();
    assert_eq!(leap.start, d(2023, 2, 28));
  }

  #[test]
  fn zero_year_window_is_rejected() {
    assert!(LookbackWindow::ending_at(d(2024, 1, 1), 0).is_err());
  }

  #[test]
  fn in_memory_provider_filters_window() {
    let series: PriceSeries = (1..=10).map(|day| (d(2024, 1, day), day as f64)).collect();
    let provider = InMemoryProvider::new().with_series("AAA", series);

    let got = provider.fetch("AAA", d(2024, 1, 3), d(2024, 1, 5)).unwrap();
    assert_eq!(got.len(), 3);
    assert!(provider.fetch("ZZZ", d(2024, 1, 1), d(2024, 1, 5)).is_err());
  }

  #[test]
  fn csv_provider_reads_adjusted_close() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
      dir.path().join("AAA.csv"),
      "Date,Open,High,Low,Close,Adj Close,Volume\n\
       2024-01-02,10,11,9,10.5,10.4,100\n\
       2024-01-03,10,11,9,10.7,10.6,100\n\
       2024-01-04,10,11,9,null,null,100\n\
       2024-01-05 00:00:00,10,11,9,10.9,10.8,100\n",
    )
    .unwrap();

    let provider = CsvDirectoryProvider::new(dir.path());
    let series = provider.fetch("AAA", d(2024, 1, 1), d(2024, 12, 31)).unwrap();

    assert_eq!(
      series.points(),
      &[
        (d(2024, 1, 2), 10.4),
        (d(2024, 1, 3), 10.6),
        (d(2024, 1, 5), 10.8)
      ]
    );
  }

  #[test]
  fn csv_provider_reports_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let provider = CsvDirectoryProvider::new(dir.path());
    assert!(provider.fetch("NOPE", d(2024, 1, 1), d(2024, 2, 1)).is_err());
  }

  #[test]
  fn csv_provider_stays_inside_its_directory() {
    let root = tempfile::tempdir().unwrap();
    let data = root.path().join("data");
    fs::create_dir(&data).unwrap();
    fs::write(root.path().join("OUT.csv"), "Date,Close\n2024-01-02,1.0\n").unwrap();

    let provider = CsvDirectoryProvider::new(&data);
    for ticker in ["../OUT", "..", "a/b", ""] {
      assert!(provider.path_for(ticker).is_err(), "{ticker:?}");
      assert!(provider.fetch(ticker, d(2024, 1, 1), d(2024, 2, 1)).is_err());
    }
    assert_eq!(provider.path_for("BRK.B").unwrap(), data.join("BRK.B.csv"));
  }
}
