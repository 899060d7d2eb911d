//! Composite fitness scoring and leaderboard ranking.
//!
//! Grounded on the reference promotion evaluator's weighted-composite +
//! tie-break pattern (`compare_candidates`/`score`), generalized from a
//! single CAGR/Sharpe/drawdown gate to the fund's window-score/penalty
//! composite and confidence-weighted leaderboard.

use qd_schemas::StrategyLevel;

/// Sharpe/drawdown pair for one evaluation window.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct WindowMetrics {
    pub sharpe: f64,
    /// Fractional max drawdown (0.05 = 5%), sign-independent.
    pub max_drawdown_pct: f64,
}

/// Per-window score: Sharpe penalized by drawdown depth.
pub fn window_score(metrics: WindowMetrics) -> f64 {
    metrics.sharpe - metrics.max_drawdown_pct.abs()
}

#[derive(Clone, Debug, PartialEq)]
pub struct FitnessInput {
    pub paper: Option<WindowMetrics>,
    pub recent: WindowMetrics,
    pub long_term: WindowMetrics,
    /// Correlation of this strategy's returns with the rest of the
    /// portfolio, in `[-1, 1]`.
    pub correlation_with_portfolio: f64,
    pub strategy_age_days: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FitnessBreakdown {
    pub base: f64,
    pub decay_penalty: f64,
    pub overfit_penalty: f64,
    pub correlation_penalty: f64,
    pub half_life_penalty: f64,
    pub fitness: f64,
}

/// Computes the composite fitness score and its penalty breakdown.
pub fn composite_fitness(input: &FitnessInput) -> FitnessBreakdown {
    let recent_score = window_score(input.recent);
    let long_term_score = window_score(input.long_term);

    let base = match input.paper {
        Some(paper) => 0.5 * window_score(paper) + 0.35 * recent_score + 0.15 * long_term_score,
        None => 0.7 * recent_score + 0.3 * long_term_score,
    };

    let decay_penalty = (input.long_term.sharpe - input.recent.sharpe).max(0.0) * 0.3;

    let overfit_base_sharpe = input.paper.map(|p| p.sharpe).unwrap_or(input.recent.sharpe);
    let overfit_penalty = (input.recent.sharpe - overfit_base_sharpe).max(0.0) * 0.5;

    let correlation_penalty = input.correlation_with_portfolio * 0.2;

    let half_life_penalty = if input.strategy_age_days > 180 {
        0.1 * (input.strategy_age_days as f64 - 180.0) / 365.0
    } else {
        0.0
    };

    let fitness =
        base - decay_penalty - overfit_penalty - correlation_penalty - half_life_penalty;

    FitnessBreakdown {
        base,
        decay_penalty,
        overfit_penalty,
        correlation_penalty,
        half_life_penalty,
        fitness,
    }
}

/// Confidence multiplier applied to fitness to produce a leaderboard
/// score. Unrecognized/terminal levels get the lowest multiplier; a
/// passed walk-forward validation adds a flat bonus.
pub fn confidence_multiplier(level: StrategyLevel, walk_forward_passed: bool) -> f64 {
    let base = match level {
        StrategyLevel::L1Backtest => 0.3,
        StrategyLevel::L2Paper => 0.7,
        StrategyLevel::L3Live => 1.0,
        _ => 0.1,
    };
    base + if walk_forward_passed { 0.1 } else { 0.0 }
}

#[derive(Clone, Debug, PartialEq)]
pub struct LeaderboardProfile {
    pub strategy_id: String,
    pub level: StrategyLevel,
    pub fitness: f64,
    pub walk_forward_passed: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LeaderboardEntry {
    pub strategy_id: String,
    pub fitness: f64,
    pub multiplier: f64,
    pub score: f64,
    pub rank: usize,
}

/// Ranks eligible profiles (excludes `Killed` and `L0Incubate`) by
/// `fitness * confidence_multiplier`, descending, 1-indexed.
pub fn rank(profiles: &[LeaderboardProfile]) -> Vec<LeaderboardEntry> {
    let mut scored: Vec<(&LeaderboardProfile, f64, f64)> = profiles
        .iter()
        .filter(|p| !matches!(p.level, StrategyLevel::Killed | StrategyLevel::L0Incubate))
        .map(|p| {
            let multiplier = confidence_multiplier(p.level, p.walk_forward_passed);
            (p, multiplier, p.fitness * multiplier)
        })
        .collect();

    scored.sort_by(|a, b| b.2.partial_cmp(&a.2).unwrap_or(std::cmp::Ordering::Equal));

    scored
        .into_iter()
        .enumerate()
        .map(|(i, (p, multiplier, score))| LeaderboardEntry {
            strategy_id: p.strategy_id.clone(),
            fitness: p.fitness,
            multiplier,
            score,
            rank: i + 1,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wm(sharpe: f64, dd: f64) -> WindowMetrics {
        WindowMetrics {
            sharpe,
            max_drawdown_pct: dd,
        }
    }

    #[test]
    fn without_paper_uses_recent_long_term_blend() {
        let input = FitnessInput {
            paper: None,
            recent: wm(1.0, 0.05),
            long_term: wm(0.8, 0.1),
            correlation_with_portfolio: 0.0,
            strategy_age_days: 30,
        };
        let breakdown = composite_fitness(&input);
        let expected_base = 0.7 * window_score(wm(1.0, 0.05)) + 0.3 * window_score(wm(0.8, 0.1));
        assert!((breakdown.base - expected_base).abs() < 1e-9);
        assert_eq!(breakdown.overfit_penalty, 0.0);
    }

    #[test]
    fn with_paper_weights_paper_heaviest() {
        let input = FitnessInput {
            paper: Some(wm(1.2, 0.03)),
            recent: wm(1.0, 0.05),
            long_term: wm(0.8, 0.1),
            correlation_with_portfolio: 0.0,
            strategy_age_days: 30,
        };
        let breakdown = composite_fitness(&input);
        let expected_base = 0.5 * window_score(wm(1.2, 0.03))
            + 0.35 * window_score(wm(1.0, 0.05))
            + 0.15 * window_score(wm(0.8, 0.1));
        assert!((breakdown.base - expected_base).abs() < 1e-9);
    }

    #[test]
    fn decay_penalty_only_when_long_term_beats_recent() {
        let input = FitnessInput {
            paper: None,
            recent: wm(0.5, 0.05),
            long_term: wm(1.5, 0.05),
            correlation_with_portfolio: 0.0,
            strategy_age_days: 30,
        };
        let breakdown = composite_fitness(&input);
        assert!((breakdown.decay_penalty - 0.3).abs() < 1e-9);
    }

    #[test]
    fn half_life_penalty_kicks_in_after_180_days() {
        let input = FitnessInput {
            paper: None,
            recent: wm(1.0, 0.0),
            long_term: wm(1.0, 0.0),
            correlation_with_portfolio: 0.0,
            strategy_age_days: 180,
        };
        assert_eq!(composite_fitness(&input).half_life_penalty, 0.0);

        let input = FitnessInput {
            strategy_age_days: 545,
            ..input
        };
        assert!((composite_fitness(&input).half_life_penalty - 0.1).abs() < 1e-9);
    }

    #[test]
    fn leaderboard_excludes_killed_and_incubate_and_ranks_descending() {
        let profiles = vec![
            LeaderboardProfile {
                strategy_id: "a".into(),
                level: StrategyLevel::L3Live,
                fitness: 1.0,
                walk_forward_passed: true,
            },
            LeaderboardProfile {
                strategy_id: "b".into(),
                level: StrategyLevel::L2Paper,
                fitness: 2.0,
                walk_forward_passed: false,
            },
            LeaderboardProfile {
                strategy_id: "c".into(),
                level: StrategyLevel::Killed,
                fitness: 100.0,
                walk_forward_passed: true,
            },
            LeaderboardProfile {
                strategy_id: "d".into(),
                level: StrategyLevel::L0Incubate,
                fitness: 100.0,
                walk_forward_passed: true,
            },
        ];
        let entries = rank(&profiles);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].rank, 1);
        assert_eq!(entries[1].rank, 2);
        assert!(entries[0].score >= entries[1].score);
    }
}
