//! Indicator and return-series statistics primitives shared by the
//! strategy, backtest, walk-forward, and fitness layers.

pub mod indicators;
pub mod stats;

pub use indicators::{atr, bollinger_bands, ema, macd, rsi, sma, BollingerOutput, MacdOutput};
pub use stats::{
    calmar_ratio, max_drawdown, mean, population_stddev, profit_factor, sharpe_ratio,
    sortino_ratio, stddev, win_rate, DrawdownResult,
};
