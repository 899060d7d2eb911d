use qd_backtest::{BacktestConfig, BacktestEngine, BacktestError};
use qd_fill::FillError;
use qd_schemas::{Market, PriceBar, SignalAction};
use qd_strategy::{Signal, Strategy, StrategyContext};

struct BuyThenCloseNextBar {
    done: bool,
}

impl Strategy for BuyThenCloseNextBar {
    fn name(&self) -> &str {
        "buy_then_close_next_bar"
    }

    fn on_bar(&mut self, ctx: &mut StrategyContext<'_>) -> Option<Signal> {
        if ctx.position_qty == 0 && !self.done {
            self.done = true;
            Some(Signal::new(SignalAction::Buy).with_qty(10))
        } else if ctx.position_qty > 0 {
            Some(Signal::new(SignalAction::Close))
        } else {
            None
        }
    }
}

fn bars() -> Vec<PriceBar> {
    vec![
        PriceBar::new(0, 100_000_000, 100_000_000, 100_000_000, 100_000_000, 1_000),
        PriceBar::new(1, 101_000_000, 101_000_000, 101_000_000, 101_000_000, 1_000),
        PriceBar::new(2, 102_000_000, 102_000_000, 102_000_000, 102_000_000, 1_000),
    ]
}

#[test]
fn a_next_bar_sell_clears_when_settlement_is_same_day() {
    let config = BacktestConfig::new("TEST", Market::UsEquity, 1_000_000_000);
    let engine = BacktestEngine::new(config, Box::new(BuyThenCloseNextBar { done: false }));
    let report = engine.run(&bars()).unwrap();
    assert_eq!(report.trades.len(), 1);
}

#[test]
fn a_next_bar_sell_is_blocked_when_shares_have_not_settled_yet() {
    let mut config = BacktestConfig::new("TEST", Market::UsEquity, 1_000_000_000);
    config.settlement_days = 2;
    let engine = BacktestEngine::new(config, Box::new(BuyThenCloseNextBar { done: false }));
    let err = engine.run(&bars()).unwrap_err();
    assert!(matches!(
        err,
        BacktestError::Fill(FillError::InsufficientSettledQuantity { .. })
    ));
}
