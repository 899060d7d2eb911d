use std::collections::BTreeMap;

use qd_fill::settlement::SettlementLedger;
use qd_fill::{simulate_fill, FillError};
use qd_schemas::{OrderType, PriceBar, Side, SignalAction};
use qd_stats::stats::{calmar_ratio, max_drawdown, profit_factor, sharpe_ratio, sortino_ratio, win_rate};
use qd_strategy::types::{MarketRegime, StrategyMemory};
use qd_strategy::{Strategy, StrategyContext};

use crate::types::{BacktestConfig, BacktestMetrics, BacktestReport, Trade};

#[derive(Clone, Debug, PartialEq)]
pub enum BacktestError {
    EmptyBarSeries,
    NegativeTimestamp { ts_ms: i64 },
    NonMonotonicTimestamp { prev_ts_ms: i64, ts_ms: i64 },
    Fill(FillError),
}

impl std::fmt::Display for BacktestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BacktestError::EmptyBarSeries => write!(f, "bar series must not be empty"),
            BacktestError::NegativeTimestamp { ts_ms } => {
                write!(f, "negative timestamp: {ts_ms}")
            }
            BacktestError::NonMonotonicTimestamp { prev_ts_ms, ts_ms } => write!(
                f,
                "bar timestamps must be strictly increasing: {prev_ts_ms} -> {ts_ms}"
            ),
            BacktestError::Fill(e) => write!(f, "fill rejected: {e}"),
        }
    }
}

impl std::error::Error for BacktestError {}

impl From<FillError> for BacktestError {
    fn from(e: FillError) -> Self {
        BacktestError::Fill(e)
    }
}

/// Coerces NaN to 0.0 (an undefined statistic reports as "no edge"
/// rather than propagating NaN into a report), while leaving the
/// deliberately unbounded ±inf cases (zero-volatility Sharpe/Sortino,
/// all-wins/all-losses profit factor) untouched.
fn finite_or_zero(x: f64) -> f64 {
    if x.is_nan() {
        0.0
    } else {
        x
    }
}

struct OpenPosition {
    side: Side,
    qty: i64,
    entry_price_micros: i64,
    entry_ts_ms: i64,
    commission_micros: i64,
    stop_loss_micros: Option<i64>,
    take_profit_micros: Option<i64>,
}

/// Bar-by-bar backtest engine. Pipeline per bar: BAR -> STRATEGY -> FILL ->
/// CASH ACCOUNTING.
///
/// Only one open position per symbol is tracked at a time (partial sells
/// are not supported). A BUY while short first closes the short, then
/// opens long; a BUY while already long is a no-op. A SELL only ever
/// closes a matching long — it never opens a short position; a SELL
/// while flat or already short is a no-op. A CLOSE signal while flat is
/// a no-op.
pub struct BacktestEngine {
    config: BacktestConfig,
    strategy: Box<dyn Strategy>,
    cash_micros: i64,
    position: Option<OpenPosition>,
    settlement: SettlementLedger,
    history: Vec<PriceBar>,
    memory: StrategyMemory,
    logs: Vec<String>,
    trades: Vec<Trade>,
    equity_curve: Vec<(i64, i64)>,
    initialized: bool,
}

impl BacktestEngine {
    pub fn new(config: BacktestConfig, strategy: Box<dyn Strategy>) -> Self {
        let cash_micros = config.initial_cash_micros;
        let settlement = SettlementLedger::new(config.settlement_days);
        Self {
            config,
            strategy,
            cash_micros,
            position: None,
            settlement,
            history: Vec::new(),
            memory: BTreeMap::new(),
            logs: Vec::new(),
            trades: Vec::new(),
            equity_curve: Vec::new(),
            initialized: false,
        }
    }

    fn position_qty_signed(&self) -> i64 {
        match &self.position {
            Some(p) if p.side == Side::Buy => p.qty,
            Some(p) => -p.qty,
            None => 0,
        }
    }

    fn mark_to_market(&self, last_close_micros: i64) -> i64 {
        let unrealized = match &self.position {
            Some(p) if p.side == Side::Buy => {
                (last_close_micros - p.entry_price_micros) as i128 * p.qty as i128
            }
            Some(p) => (p.entry_price_micros - last_close_micros) as i128 * p.qty as i128,
            None => 0,
        };
        (self.cash_micros as i128 + unrealized).clamp(i64::MIN as i128, i64::MAX as i128) as i64
    }

    /// `qty * fillPrice * (1 + commissionRate) = equity * sizePct / 100`,
    /// rounded down to the market's lot size. `size_pct` of `None` spends
    /// the full `equity_micros`. The commission rate used is the config's
    /// flat override, or 0 when the per-market table is in effect (the
    /// table doesn't reduce to a single rate this formula can use).
    fn sized_qty(&self, price_micros: i64, equity_micros: i64, size_pct: Option<f64>) -> i64 {
        if price_micros <= 0 {
            return 0;
        }
        let pct = size_pct.unwrap_or(100.0).clamp(0.0, 100.0);
        let commission_rate = self.config.commission_rate.unwrap_or(0.0).max(0.0);
        let budget_micros = equity_micros as f64 * (pct / 100.0);
        let raw_qty = (budget_micros / (price_micros as f64 * (1.0 + commission_rate))) as i64;
        let lot_size = qd_fill::lot::lot_size_for(self.config.market);
        (raw_qty.max(0) / lot_size) * lot_size
    }

    fn check_price_limit(
        &self,
        price_micros: i64,
        prev_close_micros: Option<i64>,
    ) -> Result<(), BacktestError> {
        if let Some(prev) = prev_close_micros {
            let board = qd_fill::price_limit::board_for_symbol(&self.config.symbol, false);
            qd_fill::price_limit::validate_price_limit(self.config.market, Some(board), prev, price_micros)?;
        }
        Ok(())
    }

    fn open_position(
        &mut self,
        bar: &PriceBar,
        side: Side,
        qty: i64,
        stop_loss_micros: Option<i64>,
        take_profit_micros: Option<i64>,
        day_index: i64,
        prev_close_micros: Option<i64>,
    ) -> Result<(), BacktestError> {
        if qty <= 0 {
            return Ok(());
        }
        qd_fill::lot::validate_lot_size(self.config.market, qty, side)?;
        self.check_price_limit(bar.close_micros, prev_close_micros)?;

        let outcome = simulate_fill(
            self.config.market,
            side,
            OrderType::Market,
            bar.close_micros,
            qty,
            self.config.slippage_bps,
            self.config.commission_rate,
        )?;

        let notional = outcome.fill_price_micros as i128 * qty as i128;
        self.cash_micros = match side {
            Side::Buy => {
                (self.cash_micros as i128 - notional - outcome.commission_micros as i128) as i64
            }
            Side::Sell => {
                (self.cash_micros as i128 + notional - outcome.commission_micros as i128) as i64
            }
        };

        if side == Side::Buy {
            self.settlement.record_buy(qty, day_index);
        }

        self.position = Some(OpenPosition {
            side,
            qty,
            entry_price_micros: outcome.fill_price_micros,
            entry_ts_ms: bar.timestamp_ms,
            commission_micros: outcome.commission_micros,
            stop_loss_micros,
            take_profit_micros,
        });
        tracing::debug!(symbol = %self.config.symbol, qty, side = ?side, "opened position");
        Ok(())
    }

    fn close_position(
        &mut self,
        bar: &PriceBar,
        day_index: i64,
        prev_close_micros: Option<i64>,
    ) -> Result<(), BacktestError> {
        let Some(position) = self.position.take() else {
            return Ok(());
        };

        let exit_side = match position.side {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        };

        if position.side == Side::Buy {
            if let Err(e) = self.settlement.consume_sell(position.qty, day_index) {
                self.position = Some(position);
                return Err(e.into());
            }
        }

        if let Err(e) = self.check_price_limit(bar.close_micros, prev_close_micros) {
            self.position = Some(position);
            return Err(e);
        }

        let outcome = simulate_fill(
            self.config.market,
            exit_side,
            OrderType::Market,
            bar.close_micros,
            position.qty,
            self.config.slippage_bps,
            self.config.commission_rate,
        )?;

        let notional = outcome.fill_price_micros as i128 * position.qty as i128;
        self.cash_micros = match exit_side {
            Side::Buy => {
                (self.cash_micros as i128 - notional - outcome.commission_micros as i128) as i64
            }
            Side::Sell => {
                (self.cash_micros as i128 + notional - outcome.commission_micros as i128) as i64
            }
        };

        let pnl_micros = match position.side {
            Side::Buy => {
                (outcome.fill_price_micros - position.entry_price_micros) as i128
                    * position.qty as i128
            }
            Side::Sell => {
                (position.entry_price_micros - outcome.fill_price_micros) as i128
                    * position.qty as i128
            }
        } - position.commission_micros as i128
            - outcome.commission_micros as i128;

        self.trades.push(Trade {
            symbol: self.config.symbol.clone(),
            side: position.side,
            qty: position.qty,
            entry_price_micros: position.entry_price_micros,
            exit_price_micros: outcome.fill_price_micros,
            entry_ts_ms: position.entry_ts_ms,
            exit_ts_ms: bar.timestamp_ms,
            commission_micros: position.commission_micros + outcome.commission_micros,
            pnl_micros: pnl_micros as i64,
            stop_loss_micros: position.stop_loss_micros,
            take_profit_micros: position.take_profit_micros,
        });
        tracing::debug!(symbol = %self.config.symbol, pnl_micros, "closed position");
        Ok(())
    }

    pub fn run(mut self, bars: &[PriceBar]) -> Result<BacktestReport, BacktestError> {
        if bars.is_empty() {
            return Err(BacktestError::EmptyBarSeries);
        }

        let mut prev_ts: Option<i64> = None;
        for (bar_idx, bar) in bars.iter().enumerate() {
            let day_index = bar_idx as i64;
            if bar.timestamp_ms < 0 {
                return Err(BacktestError::NegativeTimestamp {
                    ts_ms: bar.timestamp_ms,
                });
            }
            if let Some(prev) = prev_ts {
                if bar.timestamp_ms <= prev {
                    return Err(BacktestError::NonMonotonicTimestamp {
                        prev_ts_ms: prev,
                        ts_ms: bar.timestamp_ms,
                    });
                }
            }
            prev_ts = Some(bar.timestamp_ms);

            self.history.push(bar.clone());
            let prev_close_micros = if self.history.len() >= 2 {
                Some(self.history[self.history.len() - 2].close_micros)
            } else {
                None
            };

            let position_qty = self.position_qty_signed();
            let equity_micros = self.mark_to_market(bar.close_micros);
            let cash_micros = self.cash_micros;
            let positions = match &self.position {
                Some(p) => vec![qd_strategy::PositionSnapshot {
                    symbol: self.config.symbol.clone(),
                    side: p.side,
                    qty: p.qty,
                    entry_price_micros: p.entry_price_micros,
                }],
                None => Vec::new(),
            };

            let signal = {
                let mut ctx = StrategyContext {
                    symbol: &self.config.symbol,
                    bars: &self.history,
                    position_qty,
                    cash_micros,
                    equity_micros,
                    positions,
                    regime: MarketRegime::Sideways,
                    memory: &mut self.memory,
                    logs: &mut self.logs,
                };
                if !self.initialized {
                    self.strategy.init(&mut ctx);
                    self.initialized = true;
                }
                self.strategy.on_bar(&mut ctx)
            };

            if let Some(signal) = signal {
                match signal.action {
                    SignalAction::Buy => {
                        if let Some(position) = &self.position {
                            if position.side == Side::Sell {
                                self.close_position(bar, day_index, prev_close_micros)?;
                                let qty = signal.qty.unwrap_or_else(|| {
                                    self.sized_qty(bar.close_micros, equity_micros, signal.size_pct)
                                });
                                self.open_position(
                                    bar,
                                    Side::Buy,
                                    qty,
                                    signal.stop_loss_micros,
                                    signal.take_profit_micros,
                                    day_index,
                                    prev_close_micros,
                                )?;
                            }
                            // Already long: single-lot-per-symbol, no averaging in.
                        } else {
                            let qty = signal.qty.unwrap_or_else(|| {
                                self.sized_qty(bar.close_micros, equity_micros, signal.size_pct)
                            });
                            self.open_position(
                                bar,
                                Side::Buy,
                                qty,
                                signal.stop_loss_micros,
                                signal.take_profit_micros,
                                day_index,
                                prev_close_micros,
                            )?;
                        }
                    }
                    SignalAction::Sell => {
                        if let Some(position) = &self.position {
                            if position.side == Side::Buy {
                                self.close_position(bar, day_index, prev_close_micros)?;
                            }
                            // Already short: no-op.
                        }
                        // Flat: a sell only closes a matching long, it never
                        // opens a short position.
                    }
                    SignalAction::Close => {
                        self.close_position(bar, day_index, prev_close_micros)?;
                    }
                }
            }

            let equity_after = self.mark_to_market(bar.close_micros);
            self.equity_curve.push((bar.timestamp_ms, equity_after));
        }

        // Flatten any position still open at the end of the run.
        if self.position.is_some() {
            let last_bar = bars.last().expect("non-empty checked above");
            let last_day_index = (bars.len() - 1) as i64;
            let prev_close_micros = if self.history.len() >= 2 {
                Some(self.history[self.history.len() - 2].close_micros)
            } else {
                None
            };
            self.close_position(last_bar, last_day_index, prev_close_micros)?;
            if let Some(last) = self.equity_curve.last_mut() {
                last.1 = self.cash_micros;
            }
        }

        let (metrics, daily_returns) = self.compute_metrics();

        Ok(BacktestReport {
            run_id: self.config.run_id,
            config_hash: self.config.config_hash.clone(),
            trades: self.trades,
            equity_curve: self.equity_curve,
            daily_returns,
            final_cash_micros: self.cash_micros,
            final_equity_micros: self.cash_micros,
            metrics,
        })
    }

    fn compute_metrics(&self) -> (BacktestMetrics, Vec<f64>) {
        let equity_values: Vec<f64> = self
            .equity_curve
            .iter()
            .map(|(_, e)| *e as f64)
            .collect();

        let returns: Vec<f64> = equity_values
            .windows(2)
            .map(|w| if w[0] != 0.0 { (w[1] - w[0]) / w[0] } else { 0.0 })
            .collect();

        let drawdown = max_drawdown(&equity_values);
        let trade_pnls: Vec<f64> = self.trades.iter().map(|t| t.pnl_micros as f64).collect();

        let total_return_pct = if self.config.initial_cash_micros != 0 {
            (self.cash_micros - self.config.initial_cash_micros) as f64
                / self.config.initial_cash_micros as f64
        } else {
            0.0
        };

        let sharpe = finite_or_zero(sharpe_ratio(&returns));
        let sortino = finite_or_zero(sortino_ratio(&returns));
        let annualized_return = total_return_pct * (252.0 / equity_values.len().max(1) as f64);

        let metrics = BacktestMetrics {
            sharpe_ratio: sharpe,
            sortino_ratio: sortino,
            max_drawdown_pct: drawdown.max_drawdown_pct,
            calmar_ratio: finite_or_zero(calmar_ratio(annualized_return, drawdown.max_drawdown_pct)),
            profit_factor: profit_factor(&trade_pnls),
            win_rate: win_rate(&trade_pnls),
            total_return_pct: finite_or_zero(total_return_pct),
        };

        (metrics, returns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qd_schemas::Market;
    use qd_strategy::{Signal, StrategyContext as Ctx};

    struct BuyThenClose {
        done: bool,
    }

    impl Strategy for BuyThenClose {
        fn name(&self) -> &str {
            "buy_then_close"
        }

        fn on_bar(&mut self, ctx: &mut Ctx<'_>) -> Option<Signal> {
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

    struct SellWhileFlat;

    impl Strategy for SellWhileFlat {
        fn name(&self) -> &str {
            "sell_while_flat"
        }

        fn on_bar(&mut self, _ctx: &mut Ctx<'_>) -> Option<Signal> {
            Some(Signal::new(SignalAction::Sell))
        }
    }

    fn bar(ts_ms: i64, close: i64) -> PriceBar {
        PriceBar::new(ts_ms, close, close, close, close, 1_000)
    }

    #[test]
    fn round_trip_trade_updates_cash_by_realized_pnl() {
        let config = BacktestConfig::new("TEST", Market::UsEquity, 1_000_000_000);
        let engine = BacktestEngine::new(config, Box::new(BuyThenClose { done: false }));

        let bars = vec![
            bar(0, 100_000_000),
            bar(1, 110_000_000),
            bar(2, 110_000_000),
        ];

        let report = engine.run(&bars).unwrap();
        assert_eq!(report.trades.len(), 1);
        let trade = &report.trades[0];
        assert!(trade.pnl_micros > 0);
        assert_eq!(report.final_cash_micros, 1_000_000_000 + trade.pnl_micros);
        assert_eq!(report.daily_returns.len(), report.equity_curve.len() - 1);
    }

    #[test]
    fn sell_while_flat_never_opens_a_short() {
        let config = BacktestConfig::new("TEST", Market::UsEquity, 1_000_000_000);
        let engine = BacktestEngine::new(config, Box::new(SellWhileFlat));
        let bars = vec![bar(0, 100_000_000), bar(1, 101_000_000)];
        let report = engine.run(&bars).unwrap();
        assert!(report.trades.is_empty());
    }

    #[test]
    fn buy_while_short_closes_then_opens_long() {
        // Nothing in the signal-driven run() loop can open a short (a Sell
        // signal only ever closes a matching long), but open_position still
        // accepts Side::Sell for hosts/tests that seed one directly, and the
        // reversal logic must still close it cleanly on a Buy.
        let config = BacktestConfig::new("TEST", Market::UsEquity, 1_000_000_000);
        let mut engine = BacktestEngine::new(config, Box::new(BuyThenClose { done: false }));
        let bar0 = bar(0, 100_000_000);
        engine.open_position(&bar0, Side::Sell, 10, None, None, 0, None).unwrap();
        assert_eq!(engine.position_qty_signed(), -10);

        let bar1 = bar(1, 100_000_000);
        engine.close_position(&bar1, 1, None).unwrap();
        engine.open_position(&bar1, Side::Buy, 5, None, None, 1, None).unwrap();
        assert_eq!(engine.position_qty_signed(), 5);
        assert_eq!(engine.trades.len(), 1);
    }

    #[test]
    fn blocks_a_sell_that_would_consume_unsettled_shares() {
        let mut config = BacktestConfig::new("TEST", Market::UsEquity, 1_000_000_000);
        config.settlement_days = 2;
        let engine = BacktestEngine::new(config, Box::new(BuyThenClose { done: false }));

        let bars = vec![
            bar(0, 100_000_000),
            bar(1, 110_000_000),
            bar(2, 110_000_000),
        ];

        let err = engine.run(&bars).unwrap_err();
        assert!(matches!(
            err,
            BacktestError::Fill(FillError::InsufficientSettledQuantity { .. })
        ));
    }

    #[test]
    fn rejects_non_monotonic_timestamps() {
        let config = BacktestConfig::new("TEST", Market::UsEquity, 1_000_000_000);
        let engine = BacktestEngine::new(config, Box::new(BuyThenClose { done: false }));
        let bars = vec![bar(5, 100_000_000), bar(5, 101_000_000)];
        let err = engine.run(&bars).unwrap_err();
        assert!(matches!(err, BacktestError::NonMonotonicTimestamp { .. }));
    }

    #[test]
    fn flattens_open_position_at_end_of_run() {
        let config = BacktestConfig::new("TEST", Market::UsEquity, 1_000_000_000);
        let engine = BacktestEngine::new(config, Box::new(BuyThenClose { done: false }));
        let bars = vec![bar(0, 100_000_000)];
        let report = engine.run(&bars).unwrap();
        assert_eq!(report.trades.len(), 1);
    }

    struct SizePctBuyer;

    impl Strategy for SizePctBuyer {
        fn name(&self) -> &str {
            "size_pct_buyer"
        }

        fn on_bar(&mut self, ctx: &mut Ctx<'_>) -> Option<Signal> {
            if ctx.position_qty == 0 {
                Some(Signal::new(SignalAction::Buy).with_size_pct(50.0))
            } else {
                None
            }
        }
    }

    #[test]
    fn size_pct_commits_roughly_that_fraction_of_equity() {
        let mut config = BacktestConfig::new("TEST", Market::UsEquity, 1_000_000_000);
        config.commission_rate = Some(0.0);
        let engine = BacktestEngine::new(config, Box::new(SizePctBuyer));
        let bars = vec![bar(0, 100_000_000), bar(1, 100_000_000)];
        let report = engine.run(&bars).unwrap();
        let trade = &report.trades[0];
        let notional = trade.entry_price_micros as i128 * trade.qty as i128;
        let half_equity = 1_000_000_000i128 / 2;
        assert!(notional <= half_equity);
        assert!(notional > half_equity - 100_000_000 / 2);
    }
}
