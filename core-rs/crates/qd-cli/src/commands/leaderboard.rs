use anyhow::{Context, Result};
use qd_fitness::{rank, LeaderboardProfile};
use serde::Deserialize;

#[derive(Deserialize)]
struct RawProfile {
    strategy_id: String,
    level: String,
    fitness: f64,
    walk_forward_passed: bool,
}

pub async fn show(profiles_path: String) -> Result<()> {
    let raw = std::fs::read_to_string(&profiles_path)
        .with_context(|| format!("reading profiles file {profiles_path}"))?;
    let raw_profiles: Vec<RawProfile> = serde_json::from_str(&raw)
        .with_context(|| format!("parsing profiles file {profiles_path} as JSON array"))?;

    let profiles: Vec<LeaderboardProfile> = raw_profiles
        .into_iter()
        .map(|p| {
            Ok(LeaderboardProfile {
                strategy_id: p.strategy_id,
                level: crate::bars::strategy_level_from_str(&p.level)?,
                fitness: p.fitness,
                walk_forward_passed: p.walk_forward_passed,
            })
        })
        .collect::<Result<_>>()?;

    for entry in rank(&profiles) {
        println!(
            "rank={} strategy_id={} fitness={:.4} multiplier={:.2} score={:.4}",
            entry.rank, entry.strategy_id, entry.fitness, entry.multiplier, entry.score
        );
    }

    Ok(())
}
