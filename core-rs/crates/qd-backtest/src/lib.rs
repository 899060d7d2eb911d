//! Bar-by-bar backtest engine with exact fixed-point cash accounting.

pub mod engine;
pub mod types;

pub use engine::{BacktestEngine, BacktestError};
pub use types::{BacktestConfig, BacktestMetrics, BacktestReport, Trade};
