use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use qd_fill::settlement::SettlementLedger;
use qd_fill::{simulate_fill, FillError};
use qd_schemas::{OrderType, Side};
use uuid::Uuid;

use crate::types::{OrderStatus, PaperAccountState, PaperOrder, PaperPosition};

#[derive(Clone, Debug, PartialEq)]
pub enum PaperError {
    Fill(FillError),
    SymbolAlreadyHasPosition { symbol: String },
    NoOpenPosition { symbol: String },
}

impl std::fmt::Display for PaperError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaperError::Fill(e) => write!(f, "fill rejected: {e}"),
            PaperError::SymbolAlreadyHasPosition { symbol } => {
                write!(f, "symbol '{symbol}' already has an open position")
            }
            PaperError::NoOpenPosition { symbol } => {
                write!(f, "no open position for symbol '{symbol}'")
            }
        }
    }
}

impl std::error::Error for PaperError {}

impl From<FillError> for PaperError {
    fn from(e: FillError) -> Self {
        PaperError::Fill(e)
    }
}

/// Lot-size, price-limit, and settlement checks an order must clear
/// before it's allowed to fill. Run before any fill attempt so a failure
/// can be recorded on the order itself rather than silently discarded.
fn validate_before_fill(
    account: &PaperAccountState,
    order: &PaperOrder,
    current_price_micros: i64,
    existing: Option<&PaperPosition>,
    day_index: i64,
) -> Result<(), FillError> {
    qd_fill::lot::validate_lot_size(account.market, order.qty, order.side)?;

    if let Some(prev_close) = account.last_price_micros.get(&order.symbol).copied() {
        let board = qd_fill::price_limit::board_for_symbol(&order.symbol, false);
        qd_fill::price_limit::validate_price_limit(
            account.market,
            Some(board),
            prev_close,
            current_price_micros,
        )?;
    }

    if let Some(position) = existing {
        if position.side == Side::Buy && order.side == Side::Sell {
            if let Some(ledger) = account.settlement_ledgers.get(&order.symbol) {
                let settled = ledger.settled_quantity(day_index);
                if order.qty > settled {
                    return Err(FillError::InsufficientSettledQuantity {
                        requested: order.qty,
                        settled,
                    });
                }
            }
        }
    }

    Ok(())
}

/// Submits an order against the current market price. Market orders fill
/// immediately; limit orders fill immediately only if the current price
/// already satisfies the limit, otherwise the order is recorded as
/// `Pending` and left for a later `try_fill_pending` call as new ticks
/// arrive. An order that fails lot-size, price-limit, or settlement
/// validation is still recorded, with `status = Rejected` and a reason.
pub fn submit_order(
    account: &mut PaperAccountState,
    symbol: &str,
    side: Side,
    order_type: OrderType,
    qty: i64,
    limit_price_micros: Option<i64>,
    current_price_micros: i64,
    slippage_bps: i64,
    now: DateTime<Utc>,
) -> Result<PaperOrder, PaperError> {
    let mut order = PaperOrder {
        id: Uuid::new_v4(),
        symbol: symbol.to_string(),
        side,
        order_type,
        qty,
        limit_price_micros,
        status: OrderStatus::Pending,
        fill_price_micros: None,
        commission_micros: 0,
        submitted_at: now,
        reason: None,
    };

    let day_index = account.day_index(now);
    let existing = account.positions.get(symbol).cloned();
    if let Err(e) = validate_before_fill(account, &order, current_price_micros, existing.as_ref(), day_index) {
        order.status = OrderStatus::Rejected;
        order.reason = Some(e.to_string());
        account.orders.push(order.clone());
        return Err(e.into());
    }
    account
        .last_price_micros
        .insert(symbol.to_string(), current_price_micros);

    let fillable = match order_type {
        OrderType::Market => true,
        OrderType::Limit => {
            let limit = limit_price_micros.expect("limit order must carry a limit price");
            match side {
                Side::Buy => current_price_micros <= limit,
                Side::Sell => current_price_micros >= limit,
            }
        }
    };

    if fillable {
        if let Err(e) = apply_fill(account, &mut order, current_price_micros, slippage_bps) {
            order.status = OrderStatus::Rejected;
            order.reason = Some(e.to_string());
            account.orders.push(order.clone());
            return Err(e);
        }
    }

    account.orders.push(order.clone());
    Ok(order)
}

/// Re-evaluates all `Pending` limit orders against a new tick price,
/// filling any that now qualify. Orders that fail validation at fill
/// time are marked `Rejected` in place rather than aborting the sweep.
pub fn try_fill_pending(
    account: &mut PaperAccountState,
    symbol: &str,
    current_price_micros: i64,
    slippage_bps: i64,
) -> Result<Vec<Uuid>, PaperError> {
    let pending_ids: Vec<Uuid> = account
        .orders
        .iter()
        .filter(|o| o.symbol == symbol && o.status == OrderStatus::Pending)
        .map(|o| o.id)
        .collect();

    let mut filled = Vec::new();
    for id in pending_ids {
        let idx = account.orders.iter().position(|o| o.id == id).unwrap();
        let (side, limit, order_type, submitted_at) = {
            let o = &account.orders[idx];
            (o.side, o.limit_price_micros, o.order_type, o.submitted_at)
        };
        let should_fill = match order_type {
            OrderType::Market => true,
            OrderType::Limit => {
                let limit = limit.expect("limit order must carry a limit price");
                match side {
                    Side::Buy => current_price_micros <= limit,
                    Side::Sell => current_price_micros >= limit,
                }
            }
        };
        if !should_fill {
            continue;
        }

        let mut order = account.orders[idx].clone();
        let day_index = account.day_index(submitted_at);
        let existing = account.positions.get(symbol).cloned();
        match validate_before_fill(account, &order, current_price_micros, existing.as_ref(), day_index) {
            Err(e) => {
                order.status = OrderStatus::Rejected;
                order.reason = Some(e.to_string());
                account.orders[idx] = order;
            }
            Ok(()) => {
                account
                    .last_price_micros
                    .insert(symbol.to_string(), current_price_micros);
                match apply_fill(account, &mut order, current_price_micros, slippage_bps) {
                    Err(e) => {
                        order.status = OrderStatus::Rejected;
                        order.reason = Some(e.to_string());
                        account.orders[idx] = order;
                    }
                    Ok(()) => {
                        account.orders[idx] = order;
                        filled.push(id);
                    }
                }
            }
        }
    }
    Ok(filled)
}

fn apply_fill(
    account: &mut PaperAccountState,
    order: &mut PaperOrder,
    current_price_micros: i64,
    slippage_bps: i64,
) -> Result<(), PaperError> {
    let existing = account.positions.get(&order.symbol).cloned();
    let day_index = account.day_index(order.submitted_at);

    match existing {
        None => {
            let outcome = simulate_fill(
                account.market,
                order.side,
                order.order_type,
                current_price_micros,
                order.qty,
                slippage_bps,
                None,
            )?;
            let notional = outcome.fill_price_micros as i128 * order.qty as i128;
            account.cash_micros = match order.side {
                Side::Buy => {
                    (account.cash_micros as i128 - notional - outcome.commission_micros as i128)
                        as i64
                }
                Side::Sell => {
                    (account.cash_micros as i128 + notional - outcome.commission_micros as i128)
                        as i64
                }
            };
            if order.side == Side::Buy {
                account
                    .settlement_ledgers
                    .entry(order.symbol.clone())
                    .or_insert_with(|| SettlementLedger::new(account.settlement_days))
                    .record_buy(order.qty, day_index);
            }
            account.positions.insert(
                order.symbol.clone(),
                PaperPosition {
                    symbol: order.symbol.clone(),
                    side: order.side,
                    qty: order.qty,
                    entry_price_micros: outcome.fill_price_micros,
                },
            );
            order.status = OrderStatus::Filled;
            order.fill_price_micros = Some(outcome.fill_price_micros);
            order.commission_micros = outcome.commission_micros;
            tracing::info!(symbol = %order.symbol, side = ?order.side, qty = order.qty, "paper order filled (open)");
        }
        Some(position) => {
            // Only a fully offsetting close is supported (partial sells
            // are not modeled), matching the backtest engine's
            // single-lot-per-symbol simplification.
            let exit_side = match position.side {
                Side::Buy => Side::Sell,
                Side::Sell => Side::Buy,
            };
            if order.side != exit_side || order.qty != position.qty {
                return Err(PaperError::SymbolAlreadyHasPosition {
                    symbol: order.symbol.clone(),
                });
            }

            if position.side == Side::Buy {
                let ledger = account
                    .settlement_ledgers
                    .entry(order.symbol.clone())
                    .or_insert_with(|| SettlementLedger::new(account.settlement_days));
                ledger.consume_sell(position.qty, day_index)?;
            }

            let outcome = simulate_fill(
                account.market,
                order.side,
                order.order_type,
                current_price_micros,
                order.qty,
                slippage_bps,
                None,
            )?;
            let notional = outcome.fill_price_micros as i128 * order.qty as i128;
            account.cash_micros = match order.side {
                Side::Buy => {
                    (account.cash_micros as i128 - notional - outcome.commission_micros as i128)
                        as i64
                }
                Side::Sell => {
                    (account.cash_micros as i128 + notional - outcome.commission_micros as i128)
                        as i64
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
            };
            account.daily_pnl_micros.push(pnl_micros as i64);

            account.positions.remove(&order.symbol);
            order.status = OrderStatus::Filled;
            order.fill_price_micros = Some(outcome.fill_price_micros);
            order.commission_micros = outcome.commission_micros;
            tracing::info!(symbol = %order.symbol, pnl_micros, "paper order filled (close)");
        }
    }
    Ok(())
}

/// Records an equity snapshot from the current mark map.
pub fn snapshot(account: &mut PaperAccountState, now: DateTime<Utc>, marks: &BTreeMap<String, i64>) -> i64 {
    let equity = account.equity_micros(marks);
    account.equity_snapshots.push((now, equity));
    equity
}

#[cfg(test)]
mod tests {
    use super::*;
    use qd_schemas::Market;

    fn now() -> DateTime<Utc> {
        DateTime::<Utc>::UNIX_EPOCH
    }

    #[test]
    fn market_buy_then_close_realizes_pnl() {
        let mut account = PaperAccountState::new(Uuid::nil(), Market::UsEquity, 1_000_000_000);
        submit_order(
            &mut account,
            "AAPL",
            Side::Buy,
            OrderType::Market,
            10,
            None,
            100_000_000,
            0,
            now(),
        )
        .unwrap();
        assert!(account.positions.contains_key("AAPL"));

        submit_order(
            &mut account,
            "AAPL",
            Side::Sell,
            OrderType::Market,
            10,
            None,
            110_000_000,
            0,
            now(),
        )
        .unwrap();
        assert!(!account.positions.contains_key("AAPL"));
        assert_eq!(account.daily_pnl_micros.len(), 1);
        assert!(account.daily_pnl_micros[0] > 0);
    }

    #[test]
    fn sell_before_settlement_is_rejected() {
        let mut account = PaperAccountState::new(Uuid::nil(), Market::UsEquity, 1_000_000_000);
        account.settlement_days = 2;
        submit_order(
            &mut account,
            "AAPL",
            Side::Buy,
            OrderType::Market,
            10,
            None,
            100_000_000,
            0,
            now(),
        )
        .unwrap();

        let err = submit_order(
            &mut account,
            "AAPL",
            Side::Sell,
            OrderType::Market,
            10,
            None,
            110_000_000,
            0,
            now(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            PaperError::Fill(FillError::InsufficientSettledQuantity { .. })
        ));
        assert!(account.positions.contains_key("AAPL"));
    }

    #[test]
    fn rejected_lot_size_is_recorded_as_a_rejected_order_not_discarded() {
        let mut account = PaperAccountState::new(Uuid::nil(), Market::CnAShare, 1_000_000_000);
        let err = submit_order(
            &mut account,
            "600519",
            Side::Buy,
            OrderType::Market,
            150,
            None,
            100_000_000,
            0,
            now(),
        )
        .unwrap_err();
        assert!(matches!(err, PaperError::Fill(FillError::InvalidLotSize { .. })));
        assert_eq!(account.orders.len(), 1);
        assert_eq!(account.orders[0].status, OrderStatus::Rejected);
        assert!(account.orders[0].reason.is_some());
        assert!(!account.positions.contains_key("600519"));
    }

    #[test]
    fn odd_lot_sell_of_an_existing_position_is_not_blocked_by_lot_size() {
        let mut account = PaperAccountState::new(Uuid::nil(), Market::CnAShare, 1_000_000_000);
        submit_order(
            &mut account,
            "600519",
            Side::Buy,
            OrderType::Market,
            200,
            None,
            100_000_000,
            0,
            now(),
        )
        .unwrap();
        account.positions.get_mut("600519").unwrap().qty = 150;
        submit_order(
            &mut account,
            "600519",
            Side::Sell,
            OrderType::Market,
            150,
            None,
            100_000_000,
            0,
            now(),
        )
        .unwrap();
        assert!(!account.positions.contains_key("600519"));
    }

    #[test]
    fn limit_order_stays_pending_until_price_crosses() {
        let mut account = PaperAccountState::new(Uuid::nil(), Market::UsEquity, 1_000_000_000);
        let order = submit_order(
            &mut account,
            "AAPL",
            Side::Buy,
            OrderType::Limit,
            10,
            Some(90_000_000),
            100_000_000,
            0,
            now(),
        )
        .unwrap();
        assert_eq!(order.status, OrderStatus::Pending);

        let filled = try_fill_pending(&mut account, "AAPL", 89_000_000, 0).unwrap();
        assert_eq!(filled.len(), 1);
        assert!(account.positions.contains_key("AAPL"));
    }
}
