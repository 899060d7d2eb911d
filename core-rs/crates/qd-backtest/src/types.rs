use qd_schemas::{Market, Side};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq)]
pub struct BacktestConfig {
    pub run_id: Uuid,
    pub symbol: String,
    pub market: Market,
    pub initial_cash_micros: i64,
    pub slippage_bps: i64,
    /// Flat commission rate applied to fill notional (e.g. 0.001 = 10bps),
    /// overriding the per-market commission table. `None` uses the table.
    pub commission_rate: Option<f64>,
    /// Trading days before a long buy's shares may be sold (T+N
    /// settlement). Zero means same-day settlement.
    pub settlement_days: i64,
    /// Config hash from the layered config loader, carried through to the
    /// report so two runs can be compared for identical inputs.
    pub config_hash: Option<String>,
}

impl BacktestConfig {
    pub fn new(symbol: impl Into<String>, market: Market, initial_cash_micros: i64) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            symbol: symbol.into(),
            market,
            initial_cash_micros,
            slippage_bps: 0,
            commission_rate: None,
            settlement_days: 0,
            config_hash: None,
        }
    }
}

/// A single closed round-trip trade.
#[derive(Clone, Debug, PartialEq)]
pub struct Trade {
    pub symbol: String,
    pub side: Side,
    pub qty: i64,
    pub entry_price_micros: i64,
    pub exit_price_micros: i64,
    pub entry_ts_ms: i64,
    pub exit_ts_ms: i64,
    pub commission_micros: i64,
    pub pnl_micros: i64,
    pub stop_loss_micros: Option<i64>,
    pub take_profit_micros: Option<i64>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct BacktestMetrics {
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    pub max_drawdown_pct: f64,
    pub calmar_ratio: f64,
    pub profit_factor: f64,
    pub win_rate: f64,
    pub total_return_pct: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct BacktestReport {
    pub run_id: Uuid,
    pub config_hash: Option<String>,
    pub trades: Vec<Trade>,
    /// (timestamp_ms, equity_micros) per bar.
    pub equity_curve: Vec<(i64, i64)>,
    /// Per-bar fractional equity change, same length as `equity_curve`
    /// minus one (the series Sharpe/Sortino are computed over).
    pub daily_returns: Vec<f64>,
    pub final_cash_micros: i64,
    pub final_equity_micros: i64,
    pub metrics: BacktestMetrics,
}
