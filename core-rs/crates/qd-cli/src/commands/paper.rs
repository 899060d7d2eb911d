use std::collections::BTreeMap;

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use qd_db::paper::{AccountRow, PositionRow, SnapshotRow};
use qd_paper::PaperAccountState;
use uuid::Uuid;

use crate::bars;

pub async fn create_account(market: String, initial_cash_micros: i64) -> Result<()> {
    let pool = qd_db::connect_from_env().await?;
    let id = Uuid::new_v4();
    let market = bars::market_from_tag(&market);

    let account = PaperAccountState::new(id, market, initial_cash_micros);
    qd_db::paper::upsert_account(
        &pool,
        &AccountRow {
            id: account.account_id,
            market: market_tag(market),
            cash_micros: account.cash_micros,
            created_at: Utc::now(),
        },
    )
    .await
    .context("inserting paper account")?;

    println!("account_id={id}");
    Ok(())
}

pub async fn submit_order(
    account_id: Uuid,
    symbol: String,
    side: String,
    order_type: String,
    qty: i64,
    limit_price_micros: Option<i64>,
    current_price_micros: i64,
    slippage_bps: i64,
) -> Result<()> {
    let pool = qd_db::connect_from_env().await?;
    let mut account = load_account(&pool, account_id).await?;

    let side = bars::side_from_str(&side)?;
    let order_type = bars::order_type_from_str(&order_type)?;

    let order = qd_paper::submit_order(
        &mut account,
        &symbol,
        side,
        order_type,
        qty,
        limit_price_micros,
        current_price_micros,
        slippage_bps,
        Utc::now(),
    )
    .map_err(|e| anyhow!("submit_order rejected: {e}"))?;

    qd_db::paper::upsert_account(
        &pool,
        &AccountRow {
            id: account.account_id,
            market: market_tag(account.market),
            cash_micros: account.cash_micros,
            created_at: Utc::now(),
        },
    )
    .await?;

    match account.positions.get(&symbol) {
        Some(position) => {
            qd_db::paper::upsert_position(
                &pool,
                &PositionRow {
                    account_id: account.account_id,
                    symbol: symbol.clone(),
                    side: side_tag(position.side),
                    qty: position.qty,
                    entry_price_micros: position.entry_price_micros,
                },
            )
            .await?;
        }
        None => {
            qd_db::paper::delete_position(&pool, account.account_id, &symbol).await?;
        }
    }

    println!("order_id={}", order.id);
    println!("status={:?}", order.status);
    println!("fill_price_micros={:?}", order.fill_price_micros);
    println!("commission_micros={}", order.commission_micros);
    println!("cash_micros={}", account.cash_micros);

    Ok(())
}

pub async fn snapshot(account_id: Uuid, marks: Vec<(String, i64)>) -> Result<()> {
    let pool = qd_db::connect_from_env().await?;
    let mut account = load_account(&pool, account_id).await?;

    let mark_map: BTreeMap<String, i64> = marks.into_iter().collect();
    let equity = qd_paper::snapshot(&mut account, Utc::now(), &mark_map);

    let (taken_at, equity_micros) = *account
        .equity_snapshots
        .last()
        .expect("snapshot() always appends one entry");
    let daily_pnl_micros = account.daily_pnl_micros.last().copied().unwrap_or(0);

    qd_db::paper::insert_snapshot(
        &pool,
        &SnapshotRow {
            account_id: account.account_id,
            taken_at,
            equity_micros,
            daily_pnl_micros,
        },
    )
    .await
    .context("inserting paper snapshot")?;

    println!("equity_micros={equity}");
    Ok(())
}

pub async fn metrics(account_id: Uuid, history_limit: i64) -> Result<()> {
    let pool = qd_db::connect_from_env().await?;
    let snapshots = qd_db::paper::load_snapshots(&pool, account_id, history_limit).await?;

    if snapshots.is_empty() {
        println!("no snapshots recorded for account {account_id}");
        return Ok(());
    }

    let equity_curve: Vec<f64> = snapshots.iter().map(|s| s.equity_micros as f64).collect();
    let daily_returns: Vec<f64> = equity_curve
        .windows(2)
        .map(|w| if w[0] == 0.0 { 0.0 } else { (w[1] - w[0]) / w[0] })
        .collect();

    let decay = qd_paper::classify_decay(&daily_returns, &equity_curve);

    println!("level={:?}", decay.level);
    println!("sharpe_short={:.4}", decay.sharpe_short);
    println!("sharpe_long={:.4}", decay.sharpe_long);
    println!("momentum={:.4}", decay.momentum);
    println!("consecutive_loss_days={}", decay.consecutive_loss_days);
    println!("drawdown_from_peak_pct={:.4}", decay.drawdown_from_peak_pct);

    Ok(())
}

async fn load_account(pool: &sqlx::PgPool, account_id: Uuid) -> Result<PaperAccountState> {
    let rows = sqlx::query_as::<_, (Uuid, String, i64)>(
        "select id, market, cash_micros from paper_accounts where id = $1",
    )
    .bind(account_id)
    .fetch_optional(pool)
    .await
    .context("loading paper account")?
    .ok_or_else(|| anyhow!("no paper account with id {account_id}"))?;

    let (id, market_tag_str, cash_micros) = rows;
    let mut account = PaperAccountState::new(id, bars::market_from_tag(&market_tag_str), cash_micros);

    for position in qd_db::paper::load_positions(pool, account_id).await? {
        account.positions.insert(
            position.symbol.clone(),
            qd_paper::PaperPosition {
                symbol: position.symbol,
                side: bars::side_from_str(&position.side)?,
                qty: position.qty,
                entry_price_micros: position.entry_price_micros,
            },
        );
    }

    Ok(account)
}

fn market_tag(market: qd_schemas::Market) -> String {
    use qd_schemas::Market::*;
    match market {
        Crypto => "crypto",
        UsEquity => "us_equity",
        Equity => "equity",
        Commodity => "commodity",
        HkEquity => "hk_equity",
        CnAShare => "cn_a_share",
    }
    .to_string()
}

fn side_tag(side: qd_schemas::Side) -> String {
    match side {
        qd_schemas::Side::Buy => "buy".to_string(),
        qd_schemas::Side::Sell => "sell".to_string(),
    }
}
