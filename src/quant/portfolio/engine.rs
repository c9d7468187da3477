//! # Simulation Runner
//!
//! $$
//! \mathbf w^{(k)}\sim\text{Sampler},\quad
//! (\mu_k,\sigma_k,S_k)=\text{score}(\mathbf w^{(k)};\bar{\mathbf r},\Sigma),\quad k=1..M
//! $$
//!
//! Orchestrates fetch, alignment, the returns model and `M` independent trials,
//! then ranks the trials by Sharpe ratio.

use std::collections::HashMap;

use indicatif::ProgressBar;
use indicatif::ProgressStyle;
use rayon::prelude::*;
use tracing::debug;
use tracing::info;
use tracing::warn;

use super::data::AlignedPriceTable;
use super::data::align;
use super::metrics::score;
use super::returns::CumulativeReturns;
use super::returns::ReturnsModel;
use super::sampler::WeightSampler;
use super::types::MIN_SIMULATION_TICKERS;
use super::types::ResultTable;
use super::types::SimulationTrial;
use super::types::TickerList;
use crate::config::SimulationConfig;
use crate::error::PortfolioError;
use crate::error::Result;
use crate::quant::providers::LookbackWindow;
use crate::traits::PriceHistoryProvider;

/// Runs simulations against a price provider.
#[derive(Clone, Debug)]
pub struct SimulationRunner<P> {
  provider: P,
  config: SimulationConfig,
}

impl<P: PriceHistoryProvider> SimulationRunner<P> {
  /// Construct a runner, validating the configuration up front.
  pub fn new(provider: P, config: SimulationConfig) -> Result<Self> {
    config.validate()?;
    Ok(Self { provider, config })
  }

  /// Borrow runner configuration.
  pub fn config(&self) -> &SimulationConfig {
    &self.config
  }

  /// Lookback window ending today.
  pub fn window(&self) -> Result<LookbackWindow> {
    LookbackWindow::ending_today(self.config.lookback_years)
  }

  /// Fetch every ticker once and align the series on common dates.
  pub fn fetch_prices(
    &self,
    tickers: &TickerList,
    window: &LookbackWindow,
  ) -> Result<AlignedPriceTable> {
    let mut series = HashMap::new();

    for ticker in tickers.iter() {
      if series.contains_key(ticker) {
        continue;
      }
      let fetched = self
        .provider
        .fetch(ticker, window.start, window.end)
        .map_err(|e| PortfolioError::InsufficientData(format!("failed to fetch {ticker}: {e:#}")))?;
      debug!(ticker = %ticker, observations = fetched.len(), "fetched price history");
      series.insert(ticker.clone(), fetched);
    }

    let table = align(tickers, &series)?;
    info!(
      tickers = tickers.len(),
      dates = table.n_dates(),
      start = %window.start,
      end = %window.end,
      "aligned price history"
    );
    Ok(table)
  }

  /// Run a simulation over the window ending today.
  pub fn run(&self, tickers: &TickerList) -> Result<ResultTable> {
    let window = self.window()?;
    self.run_window(tickers, &window)
  }

  /// Run a simulation over an explicit window.
  pub fn run_window(&self, tickers: &TickerList, window: &LookbackWindow) -> Result<ResultTable> {
    if tickers.len() < MIN_SIMULATION_TICKERS {
      return Err(PortfolioError::InputValidation(format!(
        "simulation needs at least {MIN_SIMULATION_TICKERS} tickers, got {}",
        tickers.len()
      )));
    }
    let table = self.fetch_prices(tickers, window)?;
    let model = ReturnsModel::build(&table)?;
    simulate(&model, &self.config)
  }

  /// Cumulative percent performance per ticker over the window ending today.
  pub fn performance(&self, tickers: &TickerList) -> Result<CumulativeReturns> {
    let window = self.window()?;
    self.performance_window(tickers, &window)
  }

  pub fn performance_window(
    &self,
    tickers: &TickerList,
    window: &LookbackWindow,
  ) -> Result<CumulativeReturns> {
    let table = self.fetch_prices(tickers, window)?;
    CumulativeReturns::from_table(&table)
  }
}

fn progress_bar(config: &SimulationConfig) -> ProgressBar {
  if !config.show_progress {
    return ProgressBar::hidden();
  }
  let pb = ProgressBar::new(config.trial_count as u64);
  if let Ok(style) = ProgressStyle::with_template("{bar:40} {pos}/{len} trials ({eta})") {
    pb.set_style(style);
  }
  pb
}

/// Draw and score `config.trial_count` independent trials on a fixed model.
///
/// Trials with zero volatility are left out of the table; any other scoring
/// failure aborts the run. With a seed, sequential and parallel runs produce the
/// same table.
pub fn simulate(model: &ReturnsModel, config: &SimulationConfig) -> Result<ResultTable> {
  config.validate()?;
  let n_assets = model.n_assets();
  if n_assets < MIN_SIMULATION_TICKERS {
    return Err(PortfolioError::InputValidation(format!(
      "simulation needs at least {MIN_SIMULATION_TICKERS} assets, got {n_assets}"
    )));
  }

  let seed = config.seed.unwrap_or_else(rand::random);
  let periods_per_year = config.periods_per_year;
  let progress = progress_bar(config);
  info!(
    trials = config.trial_count,
    assets = n_assets,
    seed,
    parallel = config.parallel,
    "starting simulation"
  );

  let draw = |trial: usize| -> Result<Option<SimulationTrial>> {
    let weights = WeightSampler::for_trial(seed, trial).sample(n_assets)?;
    let scored = match score(&weights, model, periods_per_year) {
      Ok(s) => Some(SimulationTrial {
        trial,
        weights,
        expected_return: s.expected_return,
        volatility: s.volatility,
        sharpe: s.sharpe,
      }),
      Err(PortfolioError::DegenerateVolatility { .. }) => None,
      Err(e) => return Err(e),
    };
    progress.inc(1);
    Ok(scored)
  };

  let drawn: Vec<Option<SimulationTrial>> = if config.parallel {
    (0..config.trial_count)
      .into_par_iter()
      .map(draw)
      .collect::<Result<_>>()?
  } else {
    (0..config.trial_count).map(draw).collect::<Result<_>>()?
  };
  progress.finish_and_clear();

  let trials: Vec<SimulationTrial> = drawn.into_iter().flatten().collect();
  let excluded = config.trial_count - trials.len();
  if excluded > 0 {
    warn!(excluded, "excluded trials with zero volatility");
  }

  let table = ResultTable::from_trials(model.tickers().to_vec(), trials);
  if let Some(best) = table.best() {
    info!(
      rows = table.len(),
      best_trial = best.trial,
      best_sharpe = best.sharpe,
      best_return = best.expected_return,
      best_volatility = best.volatility,
      "simulation complete"
    );
  }
  Ok(table)
}
