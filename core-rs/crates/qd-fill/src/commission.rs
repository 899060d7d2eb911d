//! Per-market commission table. Crypto distinguishes maker (limit) from
//! taker (market) rates; equities and commodities charge a flat rate;
//! HK/CN equities additionally levy a stamp duty on sells only.

use qd_schemas::{Market, OrderType, Side};

const CRYPTO_MAKER_BPS: i64 = 8;
const CRYPTO_TAKER_BPS: i64 = 10;
const US_EQUITY_BPS: i64 = 5;
const EQUITY_BPS: i64 = 5;
const COMMODITY_BPS: i64 = 6;
const HK_EQUITY_COMMISSION_BPS: i64 = 5;
const HK_EQUITY_SELL_STAMP_DUTY_BPS: i64 = 10;
const CN_A_SHARE_COMMISSION_BPS: i64 = 3;
const CN_A_SHARE_SELL_STAMP_DUTY_BPS: i64 = 10;

fn apply_bps(notional_micros: i64, bps: i64) -> i64 {
    ((notional_micros as i128 * bps as i128) / 10_000i128) as i64
}

/// Commission owed on a fill of `notional_micros`, in micros.
pub fn commission_for(
    market: Market,
    order_type: OrderType,
    side: Side,
    notional_micros: i64,
) -> i64 {
    let sell_stamp_duty_bps = match market {
        Market::HkEquity => HK_EQUITY_SELL_STAMP_DUTY_BPS,
        Market::CnAShare => CN_A_SHARE_SELL_STAMP_DUTY_BPS,
        _ => 0,
    };
    let stamp_duty_bps = if side == Side::Sell { sell_stamp_duty_bps } else { 0 };

    let base_bps = match market {
        Market::Crypto => match order_type {
            OrderType::Limit => CRYPTO_MAKER_BPS,
            OrderType::Market => CRYPTO_TAKER_BPS,
        },
        Market::UsEquity => US_EQUITY_BPS,
        Market::Equity => EQUITY_BPS,
        Market::Commodity => COMMODITY_BPS,
        Market::HkEquity => HK_EQUITY_COMMISSION_BPS,
        Market::CnAShare => CN_A_SHARE_COMMISSION_BPS,
    };

    apply_bps(notional_micros, base_bps + stamp_duty_bps)
}
