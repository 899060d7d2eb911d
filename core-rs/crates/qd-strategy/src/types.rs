use std::collections::BTreeMap;

use qd_schemas::{OrderType, PriceBar, Side, SignalAction};

/// A tagged value a strategy can stash between bars (e.g. a running
/// accumulator, a cooldown counter, a "last entry price" marker).
#[derive(Clone, Debug, PartialEq)]
pub enum MemoryValue {
    Number(f64),
    Integer(i64),
    Flag(bool),
    Text(String),
}

/// Per-strategy scratch memory, keyed by arbitrary strategy-chosen names.
pub type StrategyMemory = BTreeMap<String, MemoryValue>;

/// Coarse market-condition label surfaced to strategies. Regime
/// detection itself is external to this crate; the engine always reports
/// `Sideways` and a host that wires in a classifier can set the others.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MarketRegime {
    Bull,
    Bear,
    Sideways,
    Volatile,
    Crisis,
}

/// A snapshot of one open position, as seen by a strategy that wants to
/// reason about exposure beyond its own symbol.
#[derive(Clone, Debug, PartialEq)]
pub struct PositionSnapshot {
    pub symbol: String,
    pub side: Side,
    pub qty: i64,
    pub entry_price_micros: i64,
}

/// A strategy's decision for the current bar.
#[derive(Clone, Debug, PartialEq)]
pub struct Signal {
    pub action: SignalAction,
    /// Symbol the signal applies to. `None` means "the context's own
    /// symbol" (every built-in strategy in this crate trades one symbol).
    pub symbol: Option<String>,
    /// Desired quantity; `None` lets the caller decide sizing (via
    /// `size_pct`, falling back to a full-equity default).
    pub qty: Option<i64>,
    /// Fraction of equity (0-100) to commit on entry. Used only when
    /// `qty` is `None`.
    pub size_pct: Option<f64>,
    pub order_type: OrderType,
    pub limit_price_micros: Option<i64>,
    pub stop_loss_micros: Option<i64>,
    pub take_profit_micros: Option<i64>,
    /// Free-text rationale, surfaced in logs/event records.
    pub reason: Option<String>,
    /// Strategy's self-reported confidence in [0, 1], informational only.
    pub confidence: Option<f64>,
}

impl Signal {
    pub fn new(action: SignalAction) -> Self {
        Self {
            action,
            symbol: None,
            qty: None,
            size_pct: None,
            order_type: OrderType::Market,
            limit_price_micros: None,
            stop_loss_micros: None,
            take_profit_micros: None,
            reason: None,
            confidence: None,
        }
    }

    pub fn with_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.symbol = Some(symbol.into());
        self
    }

    pub fn with_qty(mut self, qty: i64) -> Self {
        self.qty = Some(qty);
        self
    }

    pub fn with_size_pct(mut self, size_pct: f64) -> Self {
        self.size_pct = Some(size_pct);
        self
    }

    pub fn with_limit_price(mut self, price_micros: i64) -> Self {
        self.order_type = OrderType::Limit;
        self.limit_price_micros = Some(price_micros);
        self
    }

    pub fn with_stop_loss(mut self, price_micros: i64) -> Self {
        self.stop_loss_micros = Some(price_micros);
        self
    }

    pub fn with_take_profit(mut self, price_micros: i64) -> Self {
        self.take_profit_micros = Some(price_micros);
        self
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence);
        self
    }
}

/// Everything a strategy sees on a given bar: its own price history (up to
/// and including the current bar), the current position, and a mutable
/// handle to its own scratch memory. No IO handles, no broker/DB access —
/// strategies are pure functions of this context, with a log sink as the
/// one write-only side channel for diagnostics.
pub struct StrategyContext<'a> {
    pub symbol: &'a str,
    /// Price history up to and including the current bar, oldest first.
    pub bars: &'a [PriceBar],
    pub position_qty: i64,
    /// Uncommitted cash, distinct from `equity_micros` (cash plus
    /// unrealized mark-to-market on open positions).
    pub cash_micros: i64,
    pub equity_micros: i64,
    /// Every open position visible to the strategy (this engine only
    /// ever populates the strategy's own symbol, but the shape supports
    /// hosts that run multi-symbol books).
    pub positions: Vec<PositionSnapshot>,
    pub regime: MarketRegime,
    pub memory: &'a mut StrategyMemory,
    pub logs: &'a mut Vec<String>,
}

impl<'a> StrategyContext<'a> {
    /// Closing prices as `f64`, suitable for `qd_stats::indicators` inputs.
    pub fn closes(&self) -> Vec<f64> {
        self.bars
            .iter()
            .map(|b| b.close_micros as f64 / qd_schemas::MICROS_SCALE as f64)
            .collect()
    }

    pub fn highs(&self) -> Vec<f64> {
        self.bars
            .iter()
            .map(|b| b.high_micros as f64 / qd_schemas::MICROS_SCALE as f64)
            .collect()
    }

    pub fn lows(&self) -> Vec<f64> {
        self.bars
            .iter()
            .map(|b| b.low_micros as f64 / qd_schemas::MICROS_SCALE as f64)
            .collect()
    }

    pub fn current_bar(&self) -> &PriceBar {
        self.bars.last().expect("context always carries at least the current bar")
    }

    /// Appends a line to the strategy's log sink.
    pub fn log(&mut self, message: impl Into<String>) {
        self.logs.push(message.into());
    }
}
