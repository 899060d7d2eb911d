//! Daily price-limit bands. Only CN A-shares are limited in this system;
//! every other market trades without a daily band.

use qd_schemas::Market;

use crate::FillError;

/// CN A-share listing board, which determines the width of the daily
/// price-limit band. Special-treatment ("ST") status overrides the
/// board's normal band to the narrower ST band regardless of board.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CnABoard {
    MainBoard,
    ChiNextOrStar,
    SpecialTreatment,
}

/// Derives the listing board from a CN A-share symbol code. ChiNext
/// (Shenzhen, codes `300`/`301`) and STAR Market (Shanghai, codes
/// `688`/`689`) carry a wider band than the main board; special-treatment
/// names are conventionally flagged with an "ST" marker in the display
/// code rather than in the numeric prefix, so `is_st` is taken as given
/// rather than parsed.
pub fn board_for_symbol(symbol: &str, is_st: bool) -> CnABoard {
    if is_st {
        return CnABoard::SpecialTreatment;
    }
    let upper = symbol.to_ascii_uppercase();
    let code = upper
        .strip_suffix(".SH")
        .or_else(|| upper.strip_suffix(".SZ"))
        .unwrap_or(&upper);
    if code.starts_with("300") || code.starts_with("301") || code.starts_with("688") || code.starts_with("689") {
        CnABoard::ChiNextOrStar
    } else {
        CnABoard::MainBoard
    }
}

fn limit_bps_for(market: Market, board: Option<CnABoard>) -> Option<i64> {
    match market {
        Market::CnAShare => Some(match board.unwrap_or(CnABoard::MainBoard) {
            CnABoard::SpecialTreatment => 500,
            CnABoard::ChiNextOrStar => 2_000,
            CnABoard::MainBoard => 1_000,
        }),
        _ => None,
    }
}

/// Validates `price_micros` against the prior close's daily limit band.
/// Markets with no price-limit rule always pass.
pub fn validate_price_limit(
    market: Market,
    board: Option<CnABoard>,
    prev_close_micros: i64,
    price_micros: i64,
) -> Result<(), FillError> {
    let Some(limit_bps) = limit_bps_for(market, board) else {
        return Ok(());
    };

    let band = (prev_close_micros as i128 * limit_bps as i128 / 10_000i128) as i64;
    let low = prev_close_micros - band;
    let high = prev_close_micros + band;

    if price_micros < low || price_micros > high {
        return Err(FillError::PriceLimitExceeded {
            limit_low_micros: low,
            limit_high_micros: high,
            price_micros,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn main_board_allows_ten_percent_move() {
        assert!(validate_price_limit(Market::CnAShare, None, 10_000_000, 11_000_000).is_ok());
        assert!(validate_price_limit(Market::CnAShare, None, 10_000_000, 11_000_001).is_err());
    }

    #[test]
    fn chinext_allows_twenty_percent_move() {
        let board = Some(CnABoard::ChiNextOrStar);
        assert!(validate_price_limit(Market::CnAShare, board, 10_000_000, 12_000_000).is_ok());
        assert!(validate_price_limit(Market::CnAShare, board, 10_000_000, 12_000_001).is_err());
    }

    #[test]
    fn st_overrides_to_five_percent_even_on_chinext() {
        let board = Some(CnABoard::SpecialTreatment);
        assert!(validate_price_limit(Market::CnAShare, board, 10_000_000, 10_500_000).is_ok());
        assert!(validate_price_limit(Market::CnAShare, board, 10_000_000, 10_500_001).is_err());
    }

    #[test]
    fn other_markets_are_unlimited() {
        assert!(validate_price_limit(Market::Crypto, None, 10_000_000, 50_000_000).is_ok());
    }

    #[test]
    fn board_for_symbol_recognizes_chinext_and_star_prefixes() {
        assert_eq!(board_for_symbol("300750.SZ", false), CnABoard::ChiNextOrStar);
        assert_eq!(board_for_symbol("301269.SZ", false), CnABoard::ChiNextOrStar);
        assert_eq!(board_for_symbol("688981.SH", false), CnABoard::ChiNextOrStar);
        assert_eq!(board_for_symbol("689009.SH", false), CnABoard::ChiNextOrStar);
        assert_eq!(board_for_symbol("600519.SH", false), CnABoard::MainBoard);
    }

    #[test]
    fn board_for_symbol_st_flag_overrides_prefix() {
        assert_eq!(board_for_symbol("300750.SZ", true), CnABoard::SpecialTreatment);
    }
}
