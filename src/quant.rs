//! # Quant
//!
//! Portfolio simulation core and the price data sources feeding it.

pub mod portfolio;
pub mod providers;
#[cfg(feature = "yahoo")]
pub mod yahoo;
