use std::collections::BTreeMap;

use chrono::Utc;
use qd_paper::{submit_order, PaperAccountState};
use qd_schemas::{Market, OrderType, Side};
use uuid::Uuid;

#[test]
fn equity_equals_cash_plus_mark_to_market_position_value() {
    let mut account = PaperAccountState::new(Uuid::new_v4(), Market::Equity, 10_000_000_000);

    submit_order(
        &mut account,
        "AAPL",
        Side::Buy,
        OrderType::Market,
        10,
        None,
        190_000_000,
        5,
        Utc::now(),
    )
    .unwrap();

    let mut marks = BTreeMap::new();
    marks.insert("AAPL".to_string(), 195_000_000);

    let equity = account.equity_micros(&marks);

    let position = account.positions.get("AAPL").unwrap();
    let expected = account.cash_micros
        + (marks["AAPL"] - position.entry_price_micros) * position.qty;

    assert_eq!(equity, expected);
    assert!(account.cash_micros >= 0, "cash must never go negative");
}
