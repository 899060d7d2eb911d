use anyhow::{Context, Result};
use qd_portfolio::{allocate, AllocationConstraints, StrategyCandidate};
use serde::Deserialize;

#[derive(Deserialize)]
struct RawCandidate {
    strategy_id: String,
    level: String,
    fitness: f64,
    paper_days_active: u32,
    sharpe: Option<f64>,
}

#[derive(Deserialize, Default)]
struct RawCorrelatedPairs {
    #[serde(default)]
    pairs: Vec<(String, String)>,
}

pub async fn run(
    candidates_path: String,
    correlated_pairs_path: Option<String>,
    total_capital_usd: f64,
    cash_reserve_pct: f64,
    max_single_strategy_pct: f64,
    max_total_exposure_pct: f64,
) -> Result<()> {
    let raw = std::fs::read_to_string(&candidates_path)
        .with_context(|| format!("reading candidates file {candidates_path}"))?;
    let raw_candidates: Vec<RawCandidate> = serde_json::from_str(&raw)
        .with_context(|| format!("parsing candidates file {candidates_path} as JSON array"))?;

    let candidates: Vec<StrategyCandidate> = raw_candidates
        .into_iter()
        .map(|c| {
            Ok(StrategyCandidate {
                strategy_id: c.strategy_id,
                level: crate::bars::strategy_level_from_str(&c.level)?,
                fitness: c.fitness,
                paper_days_active: c.paper_days_active,
                sharpe: c.sharpe,
            })
        })
        .collect::<Result<_>>()?;

    let correlated_pairs = match correlated_pairs_path {
        Some(path) => {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("reading correlated pairs file {path}"))?;
            let parsed: RawCorrelatedPairs = serde_json::from_str(&raw)
                .with_context(|| format!("parsing correlated pairs file {path}"))?;
            parsed.pairs
        }
        None => Vec::new(),
    };

    let constraints = AllocationConstraints {
        cash_reserve_pct,
        max_single_strategy_pct,
        max_total_exposure_pct,
    };

    let decision = allocate(total_capital_usd, &candidates, &correlated_pairs, &constraints)
        .map_err(|e| anyhow::anyhow!("allocation failed: {e}"))?;

    for entry in &decision.entries {
        println!(
            "strategy_id={} capital_usd={:.2} weight_pct={:.1} reason=\"{}\"",
            entry.strategy_id, entry.capital_usd, entry.weight_pct, entry.reason
        );
    }
    for rejected in &decision.rejected {
        println!("rejected strategy_id={} reason={:?}", rejected.strategy_id, rejected.reason);
    }
    println!("exposure_pct={:.4}", decision.exposure_pct);
    println!("cash_reserve_pct={:.4}", decision.cash_reserve_pct);

    Ok(())
}
