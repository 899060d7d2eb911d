//! Lot-size validation. CN A-shares and HK equities enforce a round-lot
//! multiple; every other market trades in arbitrary quantities. The
//! restriction only applies to buys — a sell that closes an odd lot
//! position opened before the rule applied (or opened on a different
//! market) must still be able to exit.

use qd_schemas::{Market, Side};

use crate::FillError;

pub fn lot_size_for(market: Market) -> i64 {
    match market {
        Market::CnAShare => 100,
        Market::HkEquity => 100,
        _ => 1,
    }
}

/// Rejects `qty` if it is not a multiple of the market's lot size.
/// Sells are exempt: lot-size enforcement is a buy-side-only rule.
pub fn validate_lot_size(market: Market, qty: i64, side: Side) -> Result<(), FillError> {
    if side == Side::Sell {
        return Ok(());
    }
    let lot_size = lot_size_for(market);
    if qty % lot_size != 0 {
        return Err(FillError::InvalidLotSize {
            market,
            qty,
            lot_size,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cn_a_share_requires_round_lot_on_buy() {
        assert!(validate_lot_size(Market::CnAShare, 100, Side::Buy).is_ok());
        assert!(validate_lot_size(Market::CnAShare, 150, Side::Buy).is_err());
    }

    #[test]
    fn hk_equity_requires_round_lot_on_buy() {
        assert!(validate_lot_size(Market::HkEquity, 200, Side::Buy).is_ok());
        assert!(validate_lot_size(Market::HkEquity, 150, Side::Buy).is_err());
    }

    #[test]
    fn odd_lot_sells_are_never_rejected() {
        assert!(validate_lot_size(Market::CnAShare, 150, Side::Sell).is_ok());
        assert!(validate_lot_size(Market::HkEquity, 150, Side::Sell).is_ok());
    }

    #[test]
    fn other_markets_have_no_lot_restriction() {
        assert!(validate_lot_size(Market::Crypto, 7, Side::Buy).is_ok());
        assert!(validate_lot_size(Market::UsEquity, 1, Side::Buy).is_ok());
    }
}
