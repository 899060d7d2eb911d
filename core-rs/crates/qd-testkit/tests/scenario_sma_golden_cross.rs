use qd_backtest::{BacktestConfig, BacktestEngine};
use qd_schemas::{Market, Side};
use qd_strategy::builtins::SmaCrossoverStrategy;

#[test]
fn sma_golden_cross_enters_at_the_crossover_bar() {
    let closes = [
        100.0, 100.0, 100.0, 100.0, 100.0, 102.0, 105.0, 110.0, 115.0, 120.0, 115.0, 108.0, 100.0,
        95.0, 90.0,
    ];
    let bars = qd_testkit::bars_from_closes(&closes);

    let mut config = BacktestConfig::new("TEST", Market::Equity, 10_000_000_000);
    config.slippage_bps = 0;

    let engine = BacktestEngine::new(config, Box::new(SmaCrossoverStrategy::new(3, 5)));
    let report = engine.run(&bars).expect("backtest should run cleanly");

    assert!(!report.trades.is_empty(), "expected at least one trade");
    let first = &report.trades[0];
    assert_eq!(first.side, Side::Buy);

    let fast = qd_stats::sma(&closes, 3);
    let slow = qd_stats::sma(&closes, 5);
    let crossover_bar = (0..closes.len())
        .find(|&i| {
            i > 0
                && !fast[i].is_nan()
                && !slow[i].is_nan()
                && fast[i] > slow[i]
                && !(fast[i - 1] > slow[i - 1])
        })
        .expect("a crossover bar must exist in this series");

    let expected_entry_micros = (closes[crossover_bar] * 1_000_000.0).round() as i64;
    assert_eq!(first.entry_price_micros, expected_entry_micros);
}
