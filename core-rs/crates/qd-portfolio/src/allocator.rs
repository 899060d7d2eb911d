//! Capital allocator: turns eligible strategies' fitness scores into a
//! capital-weight map under a cash-reserve/single-strategy/gross-exposure
//! cap stack, with an extra correlation-group cap layered in via
//! union-find clustering.
//!
//! Grounded on the reference allocator's candidate/constraints/decision
//! shape, generalized from a signal-score weighting to the fitness-based
//! half-weighting this fund actually uses, and with the group cap spliced
//! in between the single-strategy cap and the gross-exposure cap.

use std::collections::BTreeMap;

use qd_schemas::StrategyLevel;

use crate::grouping::group_by_correlation;

const NEW_L3_PAPER_DAYS_THRESHOLD: u32 = 30;
const NEW_L3_CAP: f64 = 0.10;
const L2_PAPER_CAP: f64 = 0.15;
const GROUP_CAP: f64 = 0.4;
const GROUP_CORRELATION_THRESHOLD: f64 = 0.7;

#[derive(Clone, Debug, PartialEq)]
pub enum AllocationError {
    NonPositiveCapital,
    EmptyStrategyId,
}

impl std::fmt::Display for AllocationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NonPositiveCapital => write!(f, "total capital must be > 0"),
            Self::EmptyStrategyId => write!(f, "strategy id must not be empty"),
        }
    }
}

impl std::error::Error for AllocationError {}

#[derive(Clone, Debug, PartialEq)]
pub struct StrategyCandidate {
    pub strategy_id: String,
    pub level: StrategyLevel,
    pub fitness: f64,
    /// Days the strategy has been running at `L3Live`; strategies newly
    /// promoted to live (< 30 days) get a tighter cap.
    pub paper_days_active: u32,
    pub sharpe: Option<f64>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AllocationConstraints {
    pub cash_reserve_pct: f64,
    pub max_single_strategy_pct: f64,
    pub max_total_exposure_pct: f64,
}

impl Default for AllocationConstraints {
    fn default() -> Self {
        Self {
            cash_reserve_pct: 10.0,
            max_single_strategy_pct: 20.0,
            max_total_exposure_pct: 80.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum RejectionReason {
    NotEligible,
    NonPositiveFitness,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RejectedCandidate {
    pub strategy_id: String,
    pub reason: RejectionReason,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AllocationEntry {
    pub strategy_id: String,
    pub capital_usd: f64,
    pub weight_pct: f64,
    pub reason: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AllocationDecision {
    pub entries: Vec<AllocationEntry>,
    pub rejected: Vec<RejectedCandidate>,
    pub exposure_pct: f64,
    pub cash_reserve_pct: f64,
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

/// Allocates `total_capital_usd` across `candidates` by fitness-weighted
/// half-sizing, the single-strategy/new-strategy/paper caps, an optional
/// correlation-group cap, and finally the fund's gross-exposure cap.
pub fn allocate(
    total_capital_usd: f64,
    candidates: &[StrategyCandidate],
    correlated_pairs: &[(String, String)],
    constraints: &AllocationConstraints,
) -> Result<AllocationDecision, AllocationError> {
    if total_capital_usd <= 0.0 {
        return Err(AllocationError::NonPositiveCapital);
    }
    for c in candidates {
        if c.strategy_id.is_empty() {
            return Err(AllocationError::EmptyStrategyId);
        }
    }

    let mut rejected = Vec::new();
    let mut eligible: Vec<&StrategyCandidate> = Vec::new();
    for c in candidates {
        let is_eligible_level = matches!(c.level, StrategyLevel::L2Paper | StrategyLevel::L3Live);
        if !is_eligible_level {
            rejected.push(RejectedCandidate {
                strategy_id: c.strategy_id.clone(),
                reason: RejectionReason::NotEligible,
            });
            continue;
        }
        if c.fitness <= 0.0 {
            rejected.push(RejectedCandidate {
                strategy_id: c.strategy_id.clone(),
                reason: RejectionReason::NonPositiveFitness,
            });
            continue;
        }
        eligible.push(c);
    }

    let sum_fitness: f64 = eligible.iter().map(|c| c.fitness).sum();

    // 1. Raw half-weight proportional to fitness share.
    let mut weights: BTreeMap<String, f64> = BTreeMap::new();
    if sum_fitness > 0.0 {
        for c in &eligible {
            weights.insert(c.strategy_id.clone(), (c.fitness / sum_fitness) * 0.5);
        }
    }

    // 2. Per-strategy cap, tightened for new-L3 and L2-paper strategies.
    let single_cap = constraints.max_single_strategy_pct / 100.0;
    for c in &eligible {
        let cap = match c.level {
            StrategyLevel::L3Live if c.paper_days_active < NEW_L3_PAPER_DAYS_THRESHOLD => {
                single_cap.min(NEW_L3_CAP)
            }
            StrategyLevel::L2Paper => single_cap.min(L2_PAPER_CAP),
            _ => single_cap,
        };
        if let Some(w) = weights.get_mut(&c.strategy_id) {
            if *w > cap {
                *w = cap;
            }
        }
    }

    // 3. Correlation-group cap via union-find clustering.
    let ids: Vec<String> = eligible.iter().map(|c| c.strategy_id.clone()).collect();
    if !correlated_pairs.is_empty() {
        let groups = group_by_correlation(&ids, correlated_pairs);
        let mut group_totals: BTreeMap<String, f64> = BTreeMap::new();
        for (id, group) in &groups {
            *group_totals.entry(group.clone()).or_insert(0.0) += weights.get(id).copied().unwrap_or(0.0);
        }
        for (group, total) in &group_totals {
            if *total > GROUP_CAP {
                let scale = GROUP_CAP / total;
                for (id, member_group) in &groups {
                    if member_group == group {
                        if let Some(w) = weights.get_mut(id) {
                            *w *= scale;
                        }
                    }
                }
            }
        }
    }

    // 4. Fund-wide gross-exposure cap.
    let total_cap = constraints.max_total_exposure_pct / 100.0;
    let sum_weights: f64 = weights.values().sum();
    if sum_weights > total_cap && sum_weights > 0.0 {
        let scale = total_cap / sum_weights;
        for w in weights.values_mut() {
            *w *= scale;
        }
    }

    // 5. Capital per entry, weight clipped once more at the single cap.
    let mut entries = Vec::with_capacity(eligible.len());
    for c in &eligible {
        let weight = weights.get(&c.strategy_id).copied().unwrap_or(0.0);
        let max_single_capital = single_cap * total_capital_usd;
        let capital_usd = round_to((weight * total_capital_usd).min(max_single_capital), 2);
        let weight_pct = round_to(weight * 100.0, 1);

        let sharpe_part = match c.sharpe {
            Some(s) => format!(", sharpe={s:.2}"),
            None => String::new(),
        };
        let reason = format!(
            "fitness={:.3}, level={:?}, weight={:.1}%{}",
            c.fitness, c.level, weight_pct, sharpe_part
        );

        entries.push(AllocationEntry {
            strategy_id: c.strategy_id.clone(),
            capital_usd,
            weight_pct,
            reason,
        });
    }

    let exposure_pct = round_to(entries.iter().map(|e| e.weight_pct).sum::<f64>(), 1);
    let cash_reserve_pct = round_to((100.0 - exposure_pct).max(constraints.cash_reserve_pct), 1);

    Ok(AllocationDecision {
        entries,
        rejected,
        exposure_pct,
        cash_reserve_pct,
    })
}
