//! Fund-level risk manager: classifies today's drawdown against the fund's
//! day-start equity and produces a position-size scale factor, alongside
//! exposure/cash-reserve reporting against the fund's current allocations.
//!
//! Deterministic, pure logic; no IO, no time. Day-boundary marking and
//! equity ticks are both driven explicitly by the caller, following the
//! same tick/day-rollover shape the rest of the workspace uses for
//! stateful, sticky classifiers.

use std::collections::BTreeMap;

#[derive(Clone, Debug, PartialEq)]
pub enum RiskError {
    NonPositiveStartEquity,
    NonPositiveEquity,
}

impl std::fmt::Display for RiskError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NonPositiveStartEquity => write!(f, "day-start equity must be > 0"),
            Self::NonPositiveEquity => write!(f, "equity must be > 0"),
        }
    }
}

impl std::error::Error for RiskError {}

/// Daily-drawdown severity bucket.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RiskLevel {
    Normal,
    Caution,
    Warning,
    Critical,
}

impl RiskLevel {
    fn classify(daily_drawdown_pct: f64) -> Self {
        if daily_drawdown_pct > 10.0 {
            RiskLevel::Critical
        } else if daily_drawdown_pct > 5.0 {
            RiskLevel::Warning
        } else if daily_drawdown_pct > 3.0 {
            RiskLevel::Caution
        } else {
            RiskLevel::Normal
        }
    }

    /// Multiplier applied to position sizing; `Critical` halts new risk
    /// entirely.
    pub fn scale_factor(self) -> f64 {
        match self {
            RiskLevel::Normal => 1.0,
            RiskLevel::Caution => 0.8,
            RiskLevel::Warning => 0.5,
            RiskLevel::Critical => 0.0,
        }
    }
}

/// Persistent state of the fund risk manager across ticks/day boundaries.
#[derive(Clone, Debug, PartialEq)]
pub struct RiskState {
    pub day_id: u32,
    pub today_start_equity: f64,
    pub peak_equity: f64,
}

impl RiskState {
    pub fn new(day_id: u32, equity: f64) -> Self {
        Self {
            day_id,
            today_start_equity: equity,
            peak_equity: equity,
        }
    }

    /// Marks a new trading day: resets `today_start_equity` to `equity`.
    /// Peak equity is never reset here — it is monotone over the engine's
    /// lifetime.
    pub fn mark_day_boundary(&mut self, day_id: u32, equity: f64) {
        self.day_id = day_id;
        self.today_start_equity = equity;
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RiskEvaluation {
    pub level: RiskLevel,
    pub scale_factor: f64,
    pub daily_drawdown_pct: f64,
    pub exposure_pct: f64,
    pub cash_reserve_pct: f64,
}

/// Evaluates current fund risk against `state`, updating the monotone
/// peak equity in place.
///
/// `allocated_capital` is the sum of capital currently committed across
/// open strategy allocations, used to derive `exposure_pct`/
/// `cash_reserve_pct` against `equity`.
pub fn evaluate(
    state: &mut RiskState,
    equity: f64,
    allocated_capital: f64,
) -> Result<RiskEvaluation, RiskError> {
    if state.today_start_equity <= 0.0 {
        return Err(RiskError::NonPositiveStartEquity);
    }
    if equity <= 0.0 {
        return Err(RiskError::NonPositiveEquity);
    }

    if equity > state.peak_equity {
        state.peak_equity = equity;
    }

    let today_pnl_pct = (equity - state.today_start_equity) / state.today_start_equity * 100.0;
    let daily_drawdown_pct = (-today_pnl_pct).max(0.0);
    let level = RiskLevel::classify(daily_drawdown_pct);

    let exposure_pct = (allocated_capital / equity * 100.0).max(0.0);
    let cash_reserve_pct = (100.0 - exposure_pct).max(0.0);

    Ok(RiskEvaluation {
        level,
        scale_factor: level.scale_factor(),
        daily_drawdown_pct,
        exposure_pct,
        cash_reserve_pct,
    })
}

/// Convenience helper: evaluates a whole book of strategy allocations
/// (strategy id -> committed capital) against fund `equity`.
pub fn evaluate_book(
    state: &mut RiskState,
    equity: f64,
    allocations: &BTreeMap<String, f64>,
) -> Result<RiskEvaluation, RiskError> {
    let allocated_capital: f64 = allocations.values().sum();
    evaluate(state, equity, allocated_capital)
}
