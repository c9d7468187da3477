//! # Portfolio
//!
//! $$
//! \sigma_p^2 = \mathbf{w}^\top \Sigma \mathbf{w}
//! $$
//!
//! Monte Carlo search over long-only portfolio weights: alignment, returns
//! model, simplex sampling, scoring and the ranked result store.

pub mod data;
pub mod engine;
pub mod metrics;
pub mod returns;
pub mod sampler;
pub mod store;
pub mod types;

pub use data::AlignedPriceTable;
pub use data::align;
pub use engine::SimulationRunner;
pub use engine::simulate;
pub use metrics::PortfolioScore;
pub use metrics::annualized_return;
pub use metrics::annualized_volatility;
pub use metrics::score;
pub use returns::CumulativeReturns;
pub use returns::ReturnsModel;
pub use returns::cumulative_percent_returns;
pub use returns::log_returns;
pub use returns::pct_returns;
pub use sampler::WeightSampler;
pub use store::ResultStore;
pub use types::PriceSeries;
pub use types::ResultTable;
pub use types::SimulationTrial;
pub use types::TickerList;
pub use types::WeightVector;
pub use types::top_n;
