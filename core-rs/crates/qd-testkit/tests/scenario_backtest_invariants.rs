use qd_backtest::{BacktestConfig, BacktestEngine};
use qd_schemas::Market;
use qd_strategy::builtins::SmaCrossoverStrategy;

fn sample_bars() -> Vec<qd_schemas::PriceBar> {
    let closes = [
        100.0, 100.0, 100.0, 100.0, 100.0, 102.0, 105.0, 110.0, 115.0, 120.0, 115.0, 108.0, 100.0,
        95.0, 90.0,
    ];
    qd_testkit::bars_from_closes(&closes)
}

#[test]
fn equity_curve_length_matches_bars_and_cash_never_goes_negative() {
    let bars = sample_bars();

    let config = BacktestConfig::new("TEST", Market::Equity, 10_000_000_000);
    let engine = BacktestEngine::new(config, Box::new(SmaCrossoverStrategy::new(3, 5)));
    let report = engine.run(&bars).unwrap();

    assert_eq!(report.equity_curve.len(), bars.len());
    assert!(report.final_cash_micros >= 0, "cash must never go negative");
}

#[test]
fn final_equity_equals_cash_plus_open_position_value() {
    let bars = sample_bars();

    let config = BacktestConfig::new("TEST", Market::Equity, 10_000_000_000);
    let engine = BacktestEngine::new(config, Box::new(SmaCrossoverStrategy::new(3, 5)));
    let report = engine.run(&bars).unwrap();

    let (_, last_equity) = *report.equity_curve.last().unwrap();
    assert_eq!(last_equity, report.final_equity_micros);
}
