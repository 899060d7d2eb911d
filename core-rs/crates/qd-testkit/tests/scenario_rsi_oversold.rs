use std::collections::BTreeMap;

use qd_schemas::{PriceBar, SignalAction};
use qd_strategy::builtins::RsiMeanReversionStrategy;
use qd_strategy::{Signal, Strategy, StrategyContext};

fn bar(close: f64) -> PriceBar {
    let micros = (close * 1_000_000.0).round() as i64;
    PriceBar::new(0, micros, micros, micros, micros, 1_000)
}

#[test]
fn rsi_strategy_buys_once_oversold_in_a_decreasing_series() {
    let closes: Vec<f64> = (0..16).map(|i| 25.0 - i as f64).collect();
    assert_eq!(closes.last().copied(), Some(10.0));

    let rsi_values = qd_stats::rsi(&closes, 14);
    assert!(rsi_values.last().unwrap() < &5.0, "strictly decreasing series should drive RSI near 0");

    let mut strategy = RsiMeanReversionStrategy::new(14, 30.0, 70.0);
    let mut memory = BTreeMap::new();
    let mut logs = Vec::new();
    let mut buy_signals = 0;

    for i in 0..closes.len() {
        let bars: Vec<PriceBar> = closes[..=i].iter().map(|c| bar(*c)).collect();
        let mut ctx = StrategyContext {
            symbol: "TEST",
            bars: &bars,
            position_qty: if buy_signals > 0 { 1 } else { 0 },
            cash_micros: 100_000_000,
            equity_micros: 100_000_000,
            positions: Vec::new(),
            regime: qd_strategy::MarketRegime::Sideways,
            memory: &mut memory,
            logs: &mut logs,
        };
        if let Some(signal) = strategy.on_bar(&mut ctx) {
            assert_eq!(signal, Signal::new(SignalAction::Buy));
            buy_signals += 1;
        }
    }

    assert_eq!(buy_signals, 1, "exactly one buy should fire once RSI crosses below 30, then stay flat");
}
