//! Walk-forward validation: splits a bar series into rolling train/test
//! windows, backtests each half independently, and gates promotion on
//! whether the Sharpe ratio measured out-of-sample (across all test
//! windows combined) holds up against the in-sample Sharpe averaged
//! across windows.

use qd_backtest::{BacktestConfig, BacktestEngine, BacktestError, BacktestMetrics};
use qd_schemas::PriceBar;
use qd_strategy::Strategy;

#[derive(Clone, Debug, PartialEq)]
pub enum WalkForwardError {
    TooFewBars { have: usize, need: usize },
    InvalidWindowCount,
    Backtest(BacktestError),
}

impl std::fmt::Display for WalkForwardError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WalkForwardError::TooFewBars { have, need } => {
                write!(f, "need at least {need} bars for this window count, have {have}")
            }
            WalkForwardError::InvalidWindowCount => write!(f, "window_count must be >= 1"),
            WalkForwardError::Backtest(e) => write!(f, "backtest failed: {e}"),
        }
    }
}

impl std::error::Error for WalkForwardError {}

impl From<BacktestError> for WalkForwardError {
    fn from(e: BacktestError) -> Self {
        WalkForwardError::Backtest(e)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct WalkForwardConfig {
    pub window_count: usize,
    /// Fraction of each window used for training; the remainder is the
    /// held-out test slice. Defaults to 0.7 (70/30 train/test split).
    pub train_fraction: f64,
    /// `combined_test_sharpe / avg_train_sharpe` must be at least this for
    /// the run to pass. Defaults to 0.6.
    pub threshold: f64,
}

impl Default for WalkForwardConfig {
    fn default() -> Self {
        Self {
            window_count: 4,
            train_fraction: 0.7,
            threshold: 0.6,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct WindowResult {
    pub window_index: usize,
    pub train_start: i64,
    pub train_end: i64,
    pub test_start: i64,
    pub test_end: i64,
    pub train_metrics: BacktestMetrics,
    pub test_metrics: BacktestMetrics,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WalkForwardDecision {
    Pass,
    Fail,
}

#[derive(Clone, Debug, PartialEq)]
pub struct WalkForwardResult {
    pub decision: WalkForwardDecision,
    pub reasons: Vec<String>,
    pub windows: Vec<WindowResult>,
    /// Sharpe ratio computed over every test window's daily returns
    /// concatenated, in window order.
    pub combined_test_sharpe: f64,
    /// Mean of each window's train-slice Sharpe ratio.
    pub avg_train_sharpe: f64,
    /// `combined_test_sharpe / avg_train_sharpe`.
    pub ratio: f64,
}

/// Splits `bars` into `window_count` contiguous, non-overlapping windows,
/// each further split into a leading train slice and a trailing test
/// slice per `train_fraction`.
pub fn split_windows(
    bars: &[PriceBar],
    window_count: usize,
    train_fraction: f64,
) -> Result<Vec<(&[PriceBar], &[PriceBar])>, WalkForwardError> {
    if window_count == 0 {
        return Err(WalkForwardError::InvalidWindowCount);
    }
    let min_bars = window_count * 2;
    if bars.len() < min_bars {
        return Err(WalkForwardError::TooFewBars {
            have: bars.len(),
            need: min_bars,
        });
    }

    let window_len = bars.len() / window_count;
    let mut windows = Vec::with_capacity(window_count);
    for i in 0..window_count {
        let start = i * window_len;
        let end = if i == window_count - 1 {
            bars.len()
        } else {
            start + window_len
        };
        let window = &bars[start..end];
        let split = ((window.len() as f64) * train_fraction).round() as usize;
        let split = split.clamp(1, window.len() - 1);
        windows.push((&window[..split], &window[split..]));
    }
    Ok(windows)
}

/// Runs walk-forward validation. `strategy_factory` must produce a fresh
/// strategy instance per backtest so no state leaks between windows or
/// between the train/test halves of the same window.
pub fn run_walk_forward(
    bars: &[PriceBar],
    config: &WalkForwardConfig,
    config_template: &BacktestConfig,
    strategy_factory: impl Fn() -> Box<dyn Strategy>,
) -> Result<WalkForwardResult, WalkForwardError> {
    let windows = split_windows(bars, config.window_count, config.train_fraction)?;

    let mut results = Vec::with_capacity(windows.len());
    let mut combined_test_returns = Vec::new();
    let mut train_sharpes = Vec::new();

    for (i, (train_bars, test_bars)) in windows.into_iter().enumerate() {
        let train_engine = BacktestEngine::new(config_template.clone(), strategy_factory());
        let train_report = train_engine.run(train_bars)?;

        let test_engine = BacktestEngine::new(config_template.clone(), strategy_factory());
        let test_report = test_engine.run(test_bars)?;

        train_sharpes.push(train_report.metrics.sharpe_ratio);
        combined_test_returns.extend_from_slice(&test_report.daily_returns);

        results.push(WindowResult {
            window_index: i,
            train_start: train_bars.first().map(|b| b.timestamp_ms).unwrap_or(0),
            train_end: train_bars.last().map(|b| b.timestamp_ms).unwrap_or(0),
            test_start: test_bars.first().map(|b| b.timestamp_ms).unwrap_or(0),
            test_end: test_bars.last().map(|b| b.timestamp_ms).unwrap_or(0),
            train_metrics: train_report.metrics,
            test_metrics: test_report.metrics,
        });
    }

    let avg_train_sharpe = if train_sharpes.is_empty() {
        0.0
    } else {
        train_sharpes.iter().sum::<f64>() / train_sharpes.len() as f64
    };
    let combined_test_sharpe = qd_stats::sharpe_ratio(&combined_test_returns);

    let ratio = if avg_train_sharpe == 0.0 {
        if combined_test_sharpe >= 0.0 {
            f64::INFINITY
        } else {
            f64::NEG_INFINITY
        }
    } else {
        combined_test_sharpe / avg_train_sharpe
    };

    let mut reasons = Vec::new();
    let passed = ratio.is_finite() && ratio >= config.threshold;
    if !passed {
        reasons.push(format!(
            "combined test/train Sharpe ratio below threshold: {ratio:.3} < {:.3}",
            config.threshold
        ));
    }

    let decision = if reasons.is_empty() {
        WalkForwardDecision::Pass
    } else {
        WalkForwardDecision::Fail
    };

    Ok(WalkForwardResult {
        decision,
        reasons,
        windows: results,
        combined_test_sharpe,
        avg_train_sharpe,
        ratio,
    })
}
