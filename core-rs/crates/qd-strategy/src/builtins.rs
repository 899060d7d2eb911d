//! Two concrete built-in strategies exercising the indicator library:
//! an SMA crossover trend follower and an RSI mean-reversion strategy.

use qd_schemas::SignalAction;
use qd_stats::{rsi, sma};

use crate::types::{MarketRegime, MemoryValue, Signal, StrategyContext};
use crate::Strategy;

const WAS_ABOVE_KEY: &str = "was_fast_above_slow";

/// Buys when the fast SMA crosses above the slow SMA, closes when it
/// crosses back below.
pub struct SmaCrossoverStrategy {
    name: String,
    fast_period: usize,
    slow_period: usize,
}

impl SmaCrossoverStrategy {
    pub fn new(fast_period: usize, slow_period: usize) -> Self {
        Self {
            name: format!("sma_cross_{fast_period}_{slow_period}"),
            fast_period,
            slow_period,
        }
    }
}

impl Strategy for SmaCrossoverStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    fn on_bar(&mut self, ctx: &mut StrategyContext<'_>) -> Option<Signal> {
        let closes = ctx.closes();
        if closes.len() < self.slow_period {
            return None;
        }

        let fast = sma(&closes, self.fast_period);
        let slow = sma(&closes, self.slow_period);
        let last = closes.len() - 1;

        let (fast_now, slow_now) = (fast[last], slow[last]);
        if fast_now.is_nan() || slow_now.is_nan() {
            return None;
        }

        let is_above = fast_now > slow_now;
        let was_above = match ctx.memory.get(WAS_ABOVE_KEY) {
            Some(MemoryValue::Flag(b)) => Some(*b),
            _ => None,
        };
        ctx.memory
            .insert(WAS_ABOVE_KEY.to_string(), MemoryValue::Flag(is_above));

        match was_above {
            None => None,
            Some(false) if is_above && ctx.position_qty == 0 => Some(Signal::new(SignalAction::Buy)),
            Some(true) if !is_above && ctx.position_qty > 0 => {
                Some(Signal::new(SignalAction::Close))
            }
            _ => None,
        }
    }
}

/// Buys when RSI drops below `oversold`, closes when it rises above
/// `overbought`.
pub struct RsiMeanReversionStrategy {
    name: String,
    period: usize,
    oversold: f64,
    overbought: f64,
}

impl RsiMeanReversionStrategy {
    pub fn new(period: usize, oversold: f64, overbought: f64) -> Self {
        Self {
            name: format!("rsi_mean_reversion_{period}"),
            period,
            oversold,
            overbought,
        }
    }
}

impl Strategy for RsiMeanReversionStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    fn on_bar(&mut self, ctx: &mut StrategyContext<'_>) -> Option<Signal> {
        let closes = ctx.closes();
        if closes.len() < self.period + 1 {
            return None;
        }

        let values = rsi(&closes, self.period);
        let current = *values.last().unwrap();
        if current.is_nan() {
            return None;
        }

        if ctx.position_qty == 0 && current < self.oversold {
            Some(Signal::new(SignalAction::Buy))
        } else if ctx.position_qty > 0 && current > self.overbought {
            Some(Signal::new(SignalAction::Close))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qd_schemas::PriceBar;
    use std::collections::BTreeMap;

    fn bar(close: f64) -> PriceBar {
        let micros = (close * 1_000_000.0) as i64;
        PriceBar::new(0, micros, micros, micros, micros, 0)
    }

    #[test]
    fn sma_crossover_buys_on_cross_up() {
        let mut strategy = SmaCrossoverStrategy::new(2, 4);
        let prices = [10.0, 10.0, 10.0, 10.0, 12.0, 14.0, 16.0, 18.0];
        let mut memory = BTreeMap::new();
        let mut logs = Vec::new();
        let mut last_signal = None;
        for i in 0..prices.len() {
            let bars: Vec<PriceBar> = prices[..=i].iter().map(|p| bar(*p)).collect();
            let mut ctx = StrategyContext {
                symbol: "TEST",
                bars: &bars,
                position_qty: 0,
                cash_micros: 100_000_000,
                equity_micros: 100_000_000,
                positions: Vec::new(),
                regime: MarketRegime::Sideways,
                memory: &mut memory,
                logs: &mut logs,
            };
            last_signal = strategy.on_bar(&mut ctx);
        }
        assert_eq!(last_signal, Some(Signal::new(SignalAction::Buy)));
    }

    #[test]
    fn rsi_mean_reversion_buys_oversold() {
        let mut strategy = RsiMeanReversionStrategy::new(3, 30.0, 70.0);
        let prices = [10.0, 9.0, 8.0, 7.0];
        let mut memory = BTreeMap::new();
        let mut logs = Vec::new();
        let bars: Vec<PriceBar> = prices.iter().map(|p| bar(*p)).collect();
        let mut ctx = StrategyContext {
            symbol: "TEST",
            bars: &bars,
            position_qty: 0,
            cash_micros: 100_000_000,
            equity_micros: 100_000_000,
            positions: Vec::new(),
            regime: MarketRegime::Sideways,
            memory: &mut memory,
            logs: &mut logs,
        };
        let signal = strategy.on_bar(&mut ctx);
        assert_eq!(signal, Some(Signal::new(SignalAction::Buy)));
    }
}
