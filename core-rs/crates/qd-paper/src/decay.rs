//! Strategy health / decay classification from a paper account's daily
//! return series: rolling short vs. long Sharpe, their momentum ratio,
//! consecutive loss days, and drawdown from the equity peak.
//!
//! Computed over at most the last 60 snapshots; fewer than 7 snapshots is
//! too little history to say anything, so it classifies as healthy.

use qd_stats::stats::{max_drawdown, sharpe_ratio};

const SHORT_WINDOW: usize = 7;
const LONG_WINDOW: usize = 30;
const MAX_HISTORY: usize = 60;
const MIN_SNAPSHOTS: usize = 7;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DecayLevel {
    Healthy,
    Warning,
    Degrading,
    Critical,
}

#[derive(Clone, Debug, PartialEq)]
pub struct DecayState {
    pub sharpe_short: f64,
    pub sharpe_long: f64,
    /// `sharpe_short / sharpe_long`, or `sign(sharpe_short)` when
    /// `sharpe_long` is too close to zero (or non-finite) to divide by.
    pub momentum: f64,
    pub consecutive_loss_days: u32,
    /// Drawdown from the running peak, in percent (25.0 = 25%).
    pub drawdown_from_peak_pct: f64,
    pub level: DecayLevel,
}

fn tail(values: &[f64], n: usize) -> &[f64] {
    if values.len() <= n {
        values
    } else {
        &values[values.len() - n..]
    }
}

fn consecutive_loss_days(daily_returns: &[f64]) -> u32 {
    let mut count = 0u32;
    for r in daily_returns.iter().rev() {
        if *r < 0.0 {
            count += 1;
        } else {
            break;
        }
    }
    count
}

fn sharpe_momentum(sharpe_short: f64, sharpe_long: f64) -> f64 {
    if !sharpe_long.is_finite() || sharpe_long.abs() < 1e-3 {
        if sharpe_short > 0.0 {
            1.0
        } else if sharpe_short < 0.0 {
            -1.0
        } else {
            0.0
        }
    } else {
        sharpe_short / sharpe_long
    }
}

/// Classifies decay from a daily-return series (oldest first) and the
/// corresponding equity curve (same length, oldest first). Both are
/// truncated to the last 60 entries before use.
pub fn classify(daily_returns: &[f64], equity_curve: &[f64]) -> DecayState {
    if equity_curve.len() < MIN_SNAPSHOTS {
        return DecayState {
            sharpe_short: 0.0,
            sharpe_long: 0.0,
            momentum: 0.0,
            consecutive_loss_days: 0,
            drawdown_from_peak_pct: 0.0,
            level: DecayLevel::Healthy,
        };
    }

    let returns = tail(daily_returns, MAX_HISTORY);
    let equity = tail(equity_curve, MAX_HISTORY);

    let sharpe_short = sharpe_ratio(tail(returns, SHORT_WINDOW));
    let sharpe_long = sharpe_ratio(tail(returns, LONG_WINDOW));
    let momentum = sharpe_momentum(sharpe_short, sharpe_long);

    let loss_days = consecutive_loss_days(returns);
    let drawdown = max_drawdown(equity).max_drawdown_pct * 100.0;

    let level = if momentum < -0.5 || loss_days >= 7 || drawdown > 25.0 {
        DecayLevel::Critical
    } else if momentum < 0.0 || loss_days >= 5 || drawdown > 15.0 {
        DecayLevel::Degrading
    } else if momentum < 0.5 || loss_days >= 3 {
        DecayLevel::Warning
    } else {
        DecayLevel::Healthy
    };

    DecayState {
        sharpe_short,
        sharpe_long,
        momentum,
        consecutive_loss_days: loss_days,
        drawdown_from_peak_pct: drawdown,
        level,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn too_few_snapshots_is_healthy() {
        let returns = vec![-0.05; 3];
        let equity = vec![100.0, 95.0, 90.0];
        let state = classify(&returns, &equity);
        assert_eq!(state.level, DecayLevel::Healthy);
    }

    #[test]
    fn healthy_when_flat_and_positive() {
        let returns = vec![0.01; 30];
        let equity: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
        let state = classify(&returns, &equity);
        assert_eq!(state.level, DecayLevel::Healthy);
    }

    #[test]
    fn critical_on_deep_drawdown() {
        let returns = vec![-0.02; 10];
        let equity = vec![100.0, 98.0, 96.0, 94.0, 92.0, 90.0, 85.0, 80.0, 75.0, 70.0];
        let state = classify(&returns, &equity);
        assert_eq!(state.level, DecayLevel::Critical);
    }

    #[test]
    fn critical_on_long_loss_streak() {
        let returns = vec![-0.001; 9];
        let equity: Vec<f64> = (0..9).map(|i| 100.0 - i as f64 * 0.1).collect();
        let state = classify(&returns, &equity);
        assert_eq!(state.consecutive_loss_days, 9);
        assert_eq!(state.level, DecayLevel::Critical);
    }

    #[test]
    fn consecutive_loss_days_counts_from_tail() {
        let returns = vec![0.01, 0.01, -0.01, -0.01, -0.01];
        assert_eq!(consecutive_loss_days(&returns), 3);
    }

    #[test]
    fn momentum_falls_back_to_sign_when_long_sharpe_near_zero() {
        assert_eq!(sharpe_momentum(2.0, 0.0), 1.0);
        assert_eq!(sharpe_momentum(-2.0, 0.0), -1.0);
        assert_eq!(sharpe_momentum(0.0, 0.0), 0.0);
    }
}
