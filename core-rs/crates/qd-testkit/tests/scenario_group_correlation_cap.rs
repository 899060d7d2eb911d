use qd_portfolio::{allocate, AllocationConstraints, StrategyCandidate};
use qd_schemas::StrategyLevel;

fn candidate(id: &str) -> StrategyCandidate {
    StrategyCandidate {
        strategy_id: id.to_string(),
        level: StrategyLevel::L3Live,
        fitness: 2.0,
        paper_days_active: 365,
        sharpe: None,
    }
}

#[test]
fn correlated_pair_is_capped_below_its_uncorrelated_allocation() {
    let candidates = vec![candidate("s1"), candidate("s2"), candidate("s3")];
    let constraints = AllocationConstraints::default();

    let uncorrelated = allocate(100_000.0, &candidates, &[], &constraints).unwrap();
    let uncorrelated_pair_total: f64 = uncorrelated
        .entries
        .iter()
        .filter(|e| e.strategy_id == "s1" || e.strategy_id == "s2")
        .map(|e| e.capital_usd)
        .sum();

    // s1 and s2 are 0.9-correlated (above the 0.7 grouping threshold);
    // s3 is weakly correlated with both and stays out of the group.
    let correlated_pairs = vec![("s1".to_string(), "s2".to_string())];
    let correlated = allocate(100_000.0, &candidates, &correlated_pairs, &constraints).unwrap();
    let correlated_pair_total: f64 = correlated
        .entries
        .iter()
        .filter(|e| e.strategy_id == "s1" || e.strategy_id == "s2")
        .map(|e| e.capital_usd)
        .sum();

    assert!(
        correlated_pair_total <= uncorrelated_pair_total,
        "grouping s1/s2 should never raise their combined capital: {correlated_pair_total} > {uncorrelated_pair_total}"
    );
}
