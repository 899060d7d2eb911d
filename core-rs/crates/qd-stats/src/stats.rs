//! Return-series statistics used by the backtest/walk-forward/fitness
//! layers. These operate on plain `f64` return series (not price series);
//! callers derive per-bar or per-day returns before calling in.

const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Arithmetic mean. Empty input -> NaN.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (Bessel-corrected, divisor `n - 1`).
/// Fewer than 2 values -> NaN.
pub fn stddev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return f64::NAN;
    }
    let m = mean(values);
    let variance = values.iter().map(|x| (x - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

/// Population standard deviation (divisor `n`). A single value -> 0.0.
pub fn population_stddev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    if values.len() == 1 {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|x| (x - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Annualized Sharpe ratio: `mean / stddev * sqrt(252)`.
/// Zero volatility with a positive mean return is undefined risk-adjusted
/// upside and reported as `+inf`; zero volatility with a non-positive mean
/// is reported as `-inf` (matches the fitness layer's "unbounded-risk
/// returns are never silently averaged away" convention).
pub fn sharpe_ratio(returns: &[f64]) -> f64 {
    if returns.len() < 2 {
        return f64::NAN;
    }
    let m = mean(returns);
    let sigma = stddev(returns);
    if sigma == 0.0 {
        return if m > 0.0 {
            f64::INFINITY
        } else {
            f64::NEG_INFINITY
        };
    }
    (m / sigma) * TRADING_DAYS_PER_YEAR.sqrt()
}

/// Annualized Sortino ratio: mean / downside-deviation * sqrt(252), where
/// downside deviation only accumulates negative returns but is divided by
/// the full sample length.
pub fn sortino_ratio(returns: &[f64]) -> f64 {
    if returns.len() < 2 {
        return f64::NAN;
    }
    let m = mean(returns);
    let downside_sq_sum: f64 = returns.iter().filter(|r| **r < 0.0).map(|r| r.powi(2)).sum();
    let downside_dev = (downside_sq_sum / returns.len() as f64).sqrt();
    if downside_dev == 0.0 {
        return if m > 0.0 {
            f64::INFINITY
        } else {
            f64::NEG_INFINITY
        };
    }
    (m / downside_dev) * TRADING_DAYS_PER_YEAR.sqrt()
}

/// Maximum drawdown from an equity curve, expressed as a positive fraction
/// (0.2 == 20% drawdown), along with the index of the running peak and the
/// index of the trough that realized the worst drawdown from that peak.
pub struct DrawdownResult {
    pub max_drawdown_pct: f64,
    pub peak_index: usize,
    pub trough_index: usize,
}

pub fn max_drawdown(equity_curve: &[f64]) -> DrawdownResult {
    if equity_curve.is_empty() {
        return DrawdownResult {
            max_drawdown_pct: 0.0,
            peak_index: 0,
            trough_index: 0,
        };
    }

    let mut peak = equity_curve[0];
    let mut peak_idx = 0;
    let mut worst_pct = 0.0;
    let mut worst_peak_idx = 0;
    let mut worst_trough_idx = 0;

    for (i, &equity) in equity_curve.iter().enumerate() {
        if equity > peak {
            peak = equity;
            peak_idx = i;
        }
        if peak > 0.0 {
            let dd = (peak - equity) / peak;
            if dd > worst_pct {
                worst_pct = dd;
                worst_peak_idx = peak_idx;
                worst_trough_idx = i;
            }
        }
    }

    DrawdownResult {
        max_drawdown_pct: worst_pct,
        peak_index: worst_peak_idx,
        trough_index: worst_trough_idx,
    }
}

/// Calmar ratio: annualized return / max drawdown. Zero drawdown with a
/// positive annualized return is reported as `+inf`.
pub fn calmar_ratio(annualized_return: f64, max_drawdown_pct: f64) -> f64 {
    if max_drawdown_pct == 0.0 {
        return if annualized_return > 0.0 {
            f64::INFINITY
        } else {
            0.0
        };
    }
    annualized_return / max_drawdown_pct
}

/// Profit factor: gross profit / gross loss across a series of realized
/// trade P&Ls. All-wins (zero losses) -> `+inf`; all-losses (zero
/// profit) -> `0.0`.
pub fn profit_factor(trade_pnls: &[f64]) -> f64 {
    let gross_profit: f64 = trade_pnls.iter().filter(|p| **p > 0.0).sum();
    let gross_loss: f64 = trade_pnls.iter().filter(|p| **p < 0.0).map(|p| -p).sum();

    if gross_loss == 0.0 {
        return if gross_profit > 0.0 { f64::INFINITY } else { 0.0 };
    }
    gross_profit / gross_loss
}

/// Fraction of trades with positive P&L. Empty input -> 0.0.
pub fn win_rate(trade_pnls: &[f64]) -> f64 {
    if trade_pnls.is_empty() {
        return 0.0;
    }
    let wins = trade_pnls.iter().filter(|p| **p > 0.0).count();
    wins as f64 / trade_pnls.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_and_stddev_basic() {
        let v = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(mean(&v), 3.0);
        assert!((stddev(&v) - 1.5811388300841898).abs() < 1e-9);
    }

    #[test]
    fn stddev_needs_two_points() {
        assert!(stddev(&[1.0]).is_nan());
    }

    #[test]
    fn sharpe_zero_vol_positive_mean_is_infinite() {
        let returns = vec![0.01, 0.01, 0.01];
        assert_eq!(sharpe_ratio(&returns), f64::INFINITY);
    }

    #[test]
    fn sharpe_zero_vol_zero_mean_is_neg_infinite() {
        let returns = vec![0.0, 0.0, 0.0];
        assert_eq!(sharpe_ratio(&returns), f64::NEG_INFINITY);
    }

    #[test]
    fn sortino_only_penalizes_downside() {
        let returns = vec![0.05, 0.05, 0.05, -0.01];
        let s = sortino_ratio(&returns);
        assert!(s.is_finite());
        assert!(s > 0.0);
    }

    #[test]
    fn max_drawdown_finds_peak_and_trough() {
        let equity = vec![100.0, 120.0, 90.0, 95.0, 130.0, 80.0];
        let dd = max_drawdown(&equity);
        assert!((dd.max_drawdown_pct - (130.0 - 80.0) / 130.0).abs() < 1e-9);
        assert_eq!(dd.peak_index, 4);
        assert_eq!(dd.trough_index, 5);
    }

    #[test]
    fn profit_factor_edge_cases() {
        assert_eq!(profit_factor(&[10.0, 5.0]), f64::INFINITY);
        assert_eq!(profit_factor(&[-10.0, -5.0]), 0.0);
        assert_eq!(profit_factor(&[10.0, -5.0]), 2.0);
    }

    #[test]
    fn win_rate_basic() {
        assert_eq!(win_rate(&[1.0, -1.0, 2.0, -3.0]), 0.5);
        assert_eq!(win_rate(&[]), 0.0);
    }
}
