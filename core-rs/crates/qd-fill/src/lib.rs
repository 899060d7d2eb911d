//! Fill simulator: slippage, commission, lot-size, price-limit, and
//! settlement rules applied to a proposed fill before it is allowed to
//! land on the books.

pub mod commission;
pub mod lot;
pub mod price_limit;
pub mod settlement;
pub mod slippage;

use qd_schemas::{Market, Side};

/// Fill simulator error variants. Each maps to a validation failure a
/// caller can recover from by rejecting the order (none of these are
/// internal/unexpected conditions).
#[derive(Clone, Debug, PartialEq)]
pub enum FillError {
    /// Slippage/commission rate knobs must be >= 0; a negative value would
    /// produce a systematically favorable fill.
    NegativeRateBps { field: &'static str, value_bps: i64 },
    /// Order quantity is not a multiple of the market's lot size.
    InvalidLotSize {
        market: Market,
        qty: i64,
        lot_size: i64,
    },
    /// Proposed price falls outside the market's daily price-limit band.
    PriceLimitExceeded {
        limit_low_micros: i64,
        limit_high_micros: i64,
        price_micros: i64,
    },
    /// A sell would consume more shares than are currently settled.
    InsufficientSettledQuantity { requested: i64, settled: i64 },
}

impl std::fmt::Display for FillError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FillError::NegativeRateBps { field, value_bps } => write!(
                f,
                "negative rate rejected: {field} = {value_bps} bps (must be >= 0)"
            ),
            FillError::InvalidLotSize {
                market,
                qty,
                lot_size,
            } => write!(
                f,
                "qty {qty} is not a multiple of lot size {lot_size} for market {market:?}"
            ),
            FillError::PriceLimitExceeded {
                limit_low_micros,
                limit_high_micros,
                price_micros,
            } => write!(
                f,
                "price {price_micros} outside daily limit band [{limit_low_micros}, {limit_high_micros}]"
            ),
            FillError::InsufficientSettledQuantity { requested, settled } => write!(
                f,
                "sell of {requested} exceeds settled quantity {settled}"
            ),
        }
    }
}

impl std::error::Error for FillError {}

/// Applies constant-bps slippage to a quoted price, then computes
/// commission on the resulting notional. Returns the all-in fill price and
/// the commission owed, in micros.
///
/// `commission_rate_override` lets a caller (e.g. a backtest config's
/// `commissionRate`) replace the per-market commission table with a flat
/// rate applied to notional; `None` falls back to the table.
pub fn simulate_fill(
    market: Market,
    side: Side,
    order_type: qd_schemas::OrderType,
    quoted_price_micros: i64,
    qty: i64,
    slippage_bps: i64,
    commission_rate_override: Option<f64>,
) -> Result<FillOutcome, FillError> {
    if slippage_bps < 0 {
        return Err(FillError::NegativeRateBps {
            field: "slippage_bps",
            value_bps: slippage_bps,
        });
    }
    if let Some(rate) = commission_rate_override {
        if rate < 0.0 {
            return Err(FillError::NegativeRateBps {
                field: "commission_rate",
                value_bps: (rate * 10_000.0) as i64,
            });
        }
    }

    let fill_price_micros = slippage::apply_slippage(side, quoted_price_micros, slippage_bps);
    let notional_micros = (fill_price_micros as i128) * (qty as i128);
    let notional_micros = notional_micros.clamp(0, i64::MAX as i128) as i64;

    let commission_micros = match commission_rate_override {
        Some(rate) => ((notional_micros as f64) * rate).round() as i64,
        None => commission::commission_for(market, order_type, side, notional_micros),
    };

    Ok(FillOutcome {
        fill_price_micros,
        commission_micros,
    })
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FillOutcome {
    pub fill_price_micros: i64,
    pub commission_micros: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use qd_schemas::OrderType;

    #[test]
    fn buy_fill_is_worse_than_quote() {
        let out = simulate_fill(
            Market::UsEquity,
            Side::Buy,
            OrderType::Market,
            100_000_000,
            100,
            10,
            None,
        )
        .unwrap();
        assert!(out.fill_price_micros > 100_000_000);
        assert!(out.commission_micros > 0);
    }

    #[test]
    fn negative_slippage_is_rejected() {
        let err = simulate_fill(
            Market::UsEquity,
            Side::Buy,
            OrderType::Market,
            100_000_000,
            100,
            -5,
            None,
        )
        .unwrap_err();
        assert!(matches!(err, FillError::NegativeRateBps { .. }));
    }

    #[test]
    fn commission_rate_override_replaces_the_market_table() {
        let table = simulate_fill(
            Market::UsEquity,
            Side::Buy,
            OrderType::Market,
            100_000_000,
            100,
            0,
            None,
        )
        .unwrap();
        let overridden = simulate_fill(
            Market::UsEquity,
            Side::Buy,
            OrderType::Market,
            100_000_000,
            100,
            0,
            Some(0.01),
        )
        .unwrap();
        assert_ne!(table.commission_micros, overridden.commission_micros);
        assert_eq!(
            overridden.commission_micros,
            ((overridden.fill_price_micros as i128 * 100) as f64 * 0.01).round() as i64
        );
    }
}
