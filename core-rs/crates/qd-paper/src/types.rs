use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use qd_fill::settlement::SettlementLedger;
use qd_schemas::{Market, OrderType, Side};
use uuid::Uuid;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum OrderStatus {
    Pending,
    Filled,
    Rejected,
    Cancelled,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PaperOrder {
    pub id: Uuid,
    pub symbol: String,
    pub side: Side,
    pub order_type: OrderType,
    pub qty: i64,
    pub limit_price_micros: Option<i64>,
    pub status: OrderStatus,
    pub fill_price_micros: Option<i64>,
    pub commission_micros: i64,
    pub submitted_at: DateTime<Utc>,
    /// Set when `status` is `Rejected`, describing why.
    pub reason: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PaperPosition {
    pub symbol: String,
    pub side: Side,
    pub qty: i64,
    pub entry_price_micros: i64,
}

#[derive(Clone, Debug)]
pub struct PaperAccountState {
    pub account_id: Uuid,
    pub market: Market,
    pub cash_micros: i64,
    pub positions: BTreeMap<String, PaperPosition>,
    pub orders: Vec<PaperOrder>,
    /// (timestamp, equity_micros), oldest first.
    pub equity_snapshots: Vec<(DateTime<Utc>, i64)>,
    /// Realized daily P&L in micros, oldest first — the input to decay
    /// classification.
    pub daily_pnl_micros: Vec<i64>,
    /// Trading days before a long buy's shares may be sold. Zero means
    /// same-day settlement.
    pub settlement_days: i64,
    /// When the account was opened; fill timestamps are converted to a
    /// day index relative to this for settlement bookkeeping.
    pub opened_at: DateTime<Utc>,
    /// Per-symbol FIFO settlement ledger for long positions.
    pub settlement_ledgers: BTreeMap<String, SettlementLedger>,
    /// Last tick price seen per symbol, used as the "previous close" for
    /// price-limit validation on the next order.
    pub last_price_micros: BTreeMap<String, i64>,
}

impl PaperAccountState {
    pub fn new(account_id: Uuid, market: Market, initial_cash_micros: i64) -> Self {
        Self {
            account_id,
            market,
            cash_micros: initial_cash_micros,
            positions: BTreeMap::new(),
            orders: Vec::new(),
            equity_snapshots: Vec::new(),
            daily_pnl_micros: Vec::new(),
            settlement_days: 0,
            opened_at: Utc::now(),
            settlement_ledgers: BTreeMap::new(),
            last_price_micros: BTreeMap::new(),
        }
    }

    /// Trading-day index of `ts` relative to when the account was opened,
    /// for settlement bookkeeping.
    pub fn day_index(&self, ts: DateTime<Utc>) -> i64 {
        (ts - self.opened_at).num_days()
    }

    pub fn equity_micros(&self, marks: &BTreeMap<String, i64>) -> i64 {
        let mut equity = self.cash_micros as i128;
        for (symbol, position) in &self.positions {
            let mark = *marks.get(symbol).unwrap_or(&position.entry_price_micros);
            let delta = match position.side {
                Side::Buy => (mark - position.entry_price_micros) as i128 * position.qty as i128,
                Side::Sell => (position.entry_price_micros - mark) as i128 * position.qty as i128,
            };
            equity += delta;
        }
        equity.clamp(i64::MIN as i128, i64::MAX as i128) as i64
    }
}
