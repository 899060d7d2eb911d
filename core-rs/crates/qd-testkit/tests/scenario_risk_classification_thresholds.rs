use qd_risk::{evaluate, RiskLevel, RiskState};

fn classify_at_pct_of_start(pct_of_start: f64) -> RiskLevel {
    let start = 100_000.0;
    let mut state = RiskState::new(1, start);
    let eval = evaluate(&mut state, start * pct_of_start, 0.0).unwrap();
    eval.level
}

#[test]
fn daily_drawdown_buckets_match_the_documented_thresholds() {
    assert_eq!(classify_at_pct_of_start(0.87), RiskLevel::Critical);
    assert_eq!(classify_at_pct_of_start(0.93), RiskLevel::Warning);
    assert_eq!(classify_at_pct_of_start(0.96), RiskLevel::Caution);
    assert_eq!(classify_at_pct_of_start(1.00), RiskLevel::Normal);
}
