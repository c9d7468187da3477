//! # Yahoo Finance
//!
//! Adjusted-close history downloaded with `yahoo_finance_api`.

use anyhow::Context;
use anyhow::anyhow;
use chrono::DateTime;
use chrono::Datelike;
use chrono::NaiveDate;
use time::Month;
use time::OffsetDateTime;
use tokio::runtime::Runtime;
use tracing::info;
use yahoo_finance_api::YahooConnector;

use super::portfolio::PriceSeries;
use crate::traits::PriceHistoryProvider;

/// Blocking wrapper around the async Yahoo connector.
pub struct YahooProvider {
  connector: YahooConnector,
  runtime: Runtime,
}

impl YahooProvider {
  pub fn new() -> anyhow::Result<Self> {
    let runtime = tokio::runtime::Builder::new_current_thread()
      .enable_all()
      .build()
      .context("failed building tokio runtime")?;
    let connector = YahooConnector::new().map_err(|e| anyhow!("yahoo connector: {e}"))?;
    Ok(Self { connector, runtime })
  }
}

fn to_offset(date: NaiveDate) -> anyhow::Result<OffsetDateTime> {
  let month = Month::try_from(date.month() as u8)?;
  let day = time::Date::from_calendar_date(date.year(), month, date.day() as u8)?;
  Ok(day.midnight().assume_utc())
}

impl PriceHistoryProvider for YahooProvider {
  fn fetch(&self, ticker: &str, start: NaiveDate, end: NaiveDate) -> anyhow::Result<PriceSeries> {
    let from = to_offset(start)?;
    let to = to_offset(end)?;

    let response = self
      .runtime
      .block_on(self.connector.get_quote_history(ticker, from, to))
      .map_err(|e| anyhow!("yahoo quote history for {ticker}: {e}"))?;
    let quotes = response
      .quotes()
      .map_err(|e| anyhow!("yahoo quotes for {ticker}: {e}"))?;

    let series: PriceSeries = quotes
      .iter()
      .filter_map(|q| {
        let secs = i64::try_from(q.timestamp).ok()?;
        let date = DateTime::from_timestamp(secs, 0)?.date_naive();
        Some((date, q.adjclose))
      })
      .collect();

    info!(ticker, observations = series.len(), "downloaded price history");
    Ok(series)
  }
}
