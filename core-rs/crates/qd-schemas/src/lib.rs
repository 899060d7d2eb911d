//! Shared value types referenced across the workspace.
//!
//! These are the small, dependency-free tags and identifiers that several
//! crates need to agree on (market class, order side, timeframe) without
//! creating a dependency cycle between e.g. `qd-fill` and `qd-backtest`.

use serde::{Deserialize, Serialize};

/// Fixed-point scale for all monetary/price quantities: 1 unit = 1e-6.
pub const MICROS_SCALE: i64 = 1_000_000;

/// Market class, used to look up commission/lot/price-limit rules.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Market {
    Crypto,
    UsEquity,
    Equity,
    Commodity,
    HkEquity,
    CnAShare,
}

impl Market {
    /// Falls back to `Equity` for any tag this system does not recognize.
    pub fn parse_or_equity(tag: &str) -> Self {
        match tag {
            "crypto" => Market::Crypto,
            "us_equity" => Market::UsEquity,
            "equity" => Market::Equity,
            "commodity" => Market::Commodity,
            "hk_equity" => Market::HkEquity,
            "cn_a_share" => Market::CnAShare,
            _ => Market::Equity,
        }
    }
}

/// BUY or SELL for a fill/order.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

/// Order pricing mode.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderType {
    Market,
    Limit,
}

/// A strategy's per-bar decision.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalAction {
    Buy,
    Sell,
    Close,
}

/// Market regime tag. Produced externally; the core only carries the tag,
/// it never classifies regimes itself.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Regime {
    Bull,
    Bear,
    Sideways,
    Volatile,
    Crisis,
}

/// A single OHLCV observation. Timestamps are Unix ms.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub timestamp_ms: i64,
    pub open_micros: i64,
    pub high_micros: i64,
    pub low_micros: i64,
    pub close_micros: i64,
    pub volume: i64,
}

impl PriceBar {
    pub fn new(
        timestamp_ms: i64,
        open_micros: i64,
        high_micros: i64,
        low_micros: i64,
        close_micros: i64,
        volume: i64,
    ) -> Self {
        Self {
            timestamp_ms,
            open_micros,
            high_micros,
            low_micros,
            close_micros,
            volume,
        }
    }
}

/// Strategy promotion ladder.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StrategyLevel {
    L0Incubate,
    L1Backtest,
    L2Paper,
    L3Live,
    Killed,
}

impl StrategyLevel {
    /// True if `self -> next` is a legal monotonic promotion (or a
    /// demotion straight to `Killed`, which is always legal).
    pub fn can_transition_to(self, next: StrategyLevel) -> bool {
        if next == StrategyLevel::Killed {
            return true;
        }
        if self == StrategyLevel::Killed {
            return false;
        }
        next >= self
    }
}

/// Run lifecycle status for a strategy.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    Running,
    Paused,
    Stopped,
}
