use qd_portfolio::{allocate, AllocationConstraints, StrategyCandidate};
use qd_schemas::StrategyLevel;

fn candidate(id: &str, fitness: f64) -> StrategyCandidate {
    StrategyCandidate {
        strategy_id: id.to_string(),
        level: StrategyLevel::L3Live,
        fitness,
        paper_days_active: 365,
        sharpe: None,
    }
}

#[test]
fn three_l3_strategies_get_strictly_decreasing_capital_under_the_gross_cap() {
    let candidates = vec![
        candidate("s1", 3.0),
        candidate("s2", 2.5),
        candidate("s3", 2.0),
    ];
    let constraints = AllocationConstraints {
        cash_reserve_pct: 30.0,
        max_single_strategy_pct: 30.0,
        max_total_exposure_pct: 70.0,
    };

    let decision = allocate(100_000.0, &candidates, &[], &constraints).unwrap();

    assert_eq!(decision.entries.len(), 3);
    assert!(decision.entries[0].capital_usd > decision.entries[1].capital_usd);
    assert!(decision.entries[1].capital_usd > decision.entries[2].capital_usd);

    let total: f64 = decision.entries.iter().map(|e| e.capital_usd).sum();
    assert!(total <= 70_000.0 + 1.0, "total capital {total} exceeds the gross cap plus epsilon");
}
