use qd_backtest::BacktestConfig;
use qd_schemas::Market;
use qd_strategy::builtins::SmaCrossoverStrategy;
use qd_walkforward::{run_walk_forward, WalkForwardConfig, WalkForwardDecision};

#[test]
fn walk_forward_runs_all_windows_and_reports_a_combined_sharpe_ratio() {
    let closes: Vec<f64> = (0..80)
        .map(|i| 100.0 + (i as f64 / 4.0).sin() * 5.0 + i as f64 * 0.3)
        .collect();
    let bars = qd_testkit::bars_from_closes(&closes);

    let config_template = BacktestConfig::new("TEST", Market::Equity, 10_000_000_000);
    let wf_config = WalkForwardConfig::default();

    let result = run_walk_forward(&bars, &wf_config, &config_template, || {
        Box::new(SmaCrossoverStrategy::new(3, 5))
    })
    .unwrap();

    assert_eq!(result.windows.len(), wf_config.window_count);
    for window in &result.windows {
        assert!(window.train_start < window.train_end);
        assert!(window.train_end < window.test_start);
        assert!(window.test_start <= window.test_end);
    }
    match result.decision {
        WalkForwardDecision::Pass => assert!(result.ratio >= wf_config.threshold),
        WalkForwardDecision::Fail => assert!(result.ratio < wf_config.threshold || !result.ratio.is_finite()),
    }
}
