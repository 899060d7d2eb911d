//! Constant-bps slippage model, generalized from the backtest engine's
//! worst-case-fill-price adjustment to a single given quoted price.

use qd_schemas::Side;

/// Adjusts `price_micros` by `slippage_bps` against the trader: BUY fills
/// move up, SELL fills move down. `slippage_bps` must already be
/// validated non-negative by the caller.
pub fn apply_slippage(side: Side, price_micros: i64, slippage_bps: i64) -> i64 {
    if slippage_bps == 0 {
        return price_micros;
    }
    let adjustment = (price_micros as i128 * slippage_bps as i128) / 10_000i128;
    match side {
        Side::Buy => (price_micros as i128 + adjustment).min(i64::MAX as i128) as i64,
        Side::Sell => (price_micros as i128 - adjustment).max(0) as i64,
    }
}
