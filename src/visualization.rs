//! # Visualization
//!
//! $$
//! \{(\sigma_k,\mu_k;S_k)\}_k\mapsto\text{scatter},\qquad
//! \{(d, C_{d,i})\}_{d}\mapsto\text{lines}
//! $$
//!
//! Read-only projections of simulation data: the risk/return scatter coloured
//! by Sharpe ratio, the cumulative performance chart and the top-N table.

use std::fs;
use std::path::Path;

use plotly::Layout;
use plotly::Plot;
use plotly::Scatter;
use plotly::common::ColorBar;
use plotly::common::ColorScale;
use plotly::common::ColorScalePalette;
use plotly::common::Marker;
use plotly::common::Mode;
use plotly::common::Title;
use plotly::layout::Axis;
use prettytable::Cell;
use prettytable::Row;
use prettytable::Table;
use tracing::info;

use crate::error::Result;
use crate::quant::portfolio::CumulativeReturns;
use crate::quant::portfolio::ResultTable;

fn layout(title: &str, x: &str, y: &str) -> Layout {
  Layout::new()
    .title(Title::from(title))
    .x_axis(Axis::new().title(Title::from(x)))
    .y_axis(Axis::new().title(Title::from(y)))
    .height(600)
    .width(1200)
}

fn write_plot(plot: &Plot, path: &Path) -> Result<()> {
  if let Some(parent) = path.parent() {
    if !parent.as_os_str().is_empty() {
      fs::create_dir_all(parent)?;
    }
  }
  plot.write_html(path);
  info!(path = %path.display(), "wrote chart");
  Ok(())
}

/// Line chart of cumulative percent returns per ticker.
pub fn performance_plot(perf: &CumulativeReturns) -> Plot {
  let dates: Vec<String> = perf.dates.iter().map(|d| d.to_string()).collect();
  let mut plot = Plot::new();

  for (i, ticker) in perf.tickers.iter().enumerate() {
    let trace = Scatter::new(dates.clone(), perf.values.column(i).to_vec())
      .name(ticker)
      .mode(Mode::Lines);
    plot.add_trace(trace);
  }

  plot.set_layout(layout("Individual Percent Returns", "Date", "Returns"));
  plot
}

/// Scatter of volatility against return, coloured by Sharpe ratio.
pub fn risk_return_plot(table: &ResultTable) -> Plot {
  let trials = table.trials();
  let volatility: Vec<f64> = trials.iter().map(|t| t.volatility).collect();
  let returns: Vec<f64> = trials.iter().map(|t| t.expected_return).collect();
  let sharpe: Vec<f64> = trials.iter().map(|t| t.sharpe).collect();

  let marker = Marker::new()
    .size(5)
    .color_array(sharpe)
    .color_scale(ColorScale::Palette(ColorScalePalette::Viridis))
    .show_scale(true)
    .color_bar(ColorBar::new().title(Title::from("Sharpe Ratio")));

  let trace = Scatter::new(volatility, returns)
    .mode(Mode::Markers)
    .name("trials")
    .marker(marker);

  let mut plot = Plot::new();
  plot.add_trace(trace);
  plot.set_layout(layout("MC Simulation Results", "Volatility", "Returns"));
  plot
}

pub fn plot_performance(perf: &CumulativeReturns, path: impl AsRef<Path>) -> Result<()> {
  write_plot(&performance_plot(perf), path.as_ref())
}

pub fn plot_risk_return(table: &ResultTable, path: impl AsRef<Path>) -> Result<()> {
  write_plot(&risk_return_plot(table), path.as_ref())
}

/// First `n` rows as a text table with the index column first.
pub fn top_table(table: &ResultTable, n: usize) -> Table {
  let top = table.top_n(n);
  let mut out = Table::new();

  let mut titles = vec![Cell::new("Trial")];
  titles.extend(top.columns().iter().map(|c| Cell::new(c)));
  out.set_titles(Row::new(titles));

  for (i, trial) in top.trials().iter().enumerate() {
    let mut cells = vec![Cell::new(&trial.trial.to_string())];
    if let Some(row) = top.row(i) {
      cells.extend(row.iter().map(|v| Cell::new(&format!("{v:.4}"))));
    }
    out.add_row(Row::new(cells));
  }
  out
}
