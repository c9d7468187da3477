//! # portfolio-mc
//!
//! $$
//! \max_{k\le M} \frac{\bar{\mathbf r}^\top\mathbf w^{(k)}}{\sqrt{\mathbf w^{(k)\top}\Sigma\,\mathbf w^{(k)}}},
//! \qquad \mathbf w^{(k)}\in\Delta^{N-1}
//! $$
//!
//! Monte Carlo search for favourable portfolio weights over 2 to 10 instruments.
//!
//! ## Modules
//!
//! | Module              | Description                                                        |
//! |---------------------|--------------------------------------------------------------------|
//! | [`quant::portfolio`] | Alignment, returns model, sampler, metrics, runner and result store |
//! | [`quant::providers`] | Lookback window and offline price providers                         |
//! | [`export`]           | CSV export of the ranked table                                      |
//! | [`visualization`]    | Plotly charts and the top-N text table                              |
//! | [`config`]           | TOML-backed run configuration                                       |
//!
//! ## Features
//!
//! - `yahoo`: download adjusted closes from Yahoo Finance.
//!
//! ## Example Usage
//!
//! ```rust
//! use portfolio_mc::config::SimulationConfig;
//! use portfolio_mc::quant::portfolio::{SimulationRunner, TickerList};
//! use portfolio_mc::quant::providers::CsvDirectoryProvider;
//!
//! let runner = SimulationRunner::new(CsvDirectoryProvider::new("prices"), SimulationConfig::default())?;
//! let tickers = TickerList::for_simulation(&["AAPL", "MSFT", "XOM"])?;
//! let table = runner.run(&tickers)?;
//! println!("best sharpe {:?}", table.best().map(|t| t.sharpe));
//! ```

pub mod config;
pub mod error;
pub mod export;
pub mod quant;
pub mod traits;
pub mod visualization;

pub use error::PortfolioError;
pub use error::Result;
