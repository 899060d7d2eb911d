//! Paper trading state persistence: accounts, positions, orders, and
//! equity snapshots, normalized by account id.

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::DbError;

#[derive(Clone, Debug, PartialEq)]
pub struct AccountRow {
    pub id: Uuid,
    pub market: String,
    pub cash_micros: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PositionRow {
    pub account_id: Uuid,
    pub symbol: String,
    pub side: String,
    pub qty: i64,
    pub entry_price_micros: i64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct OrderRow {
    pub id: Uuid,
    pub account_id: Uuid,
    pub symbol: String,
    pub side: String,
    pub order_type: String,
    pub qty: i64,
    pub limit_price_micros: Option<i64>,
    pub status: String,
    pub fill_price_micros: Option<i64>,
    pub commission_micros: Option<i64>,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SnapshotRow {
    pub account_id: Uuid,
    pub taken_at: DateTime<Utc>,
    pub equity_micros: i64,
    pub daily_pnl_micros: i64,
}

pub async fn upsert_account(pool: &PgPool, row: &AccountRow) -> Result<(), DbError> {
    sqlx::query(
        r#"
        insert into paper_accounts (id, market, cash_micros, created_at)
        values ($1, $2, $3, $4)
        on conflict (id) do update set cash_micros = excluded.cash_micros
        "#,
    )
    .bind(row.id)
    .bind(&row.market)
    .bind(row.cash_micros)
    .bind(row.created_at)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn upsert_position(pool: &PgPool, row: &PositionRow) -> Result<(), DbError> {
    sqlx::query(
        r#"
        insert into paper_positions (account_id, symbol, side, qty, entry_price_micros)
        values ($1, $2, $3, $4, $5)
        on conflict (account_id, symbol) do update set
            side = excluded.side, qty = excluded.qty, entry_price_micros = excluded.entry_price_micros
        "#,
    )
    .bind(row.account_id)
    .bind(&row.symbol)
    .bind(&row.side)
    .bind(row.qty)
    .bind(row.entry_price_micros)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn delete_position(pool: &PgPool, account_id: Uuid, symbol: &str) -> Result<(), DbError> {
    sqlx::query("delete from paper_positions where account_id = $1 and symbol = $2")
        .bind(account_id)
        .bind(symbol)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn insert_order(pool: &PgPool, row: &OrderRow) -> Result<(), DbError> {
    sqlx::query(
        r#"
        insert into paper_orders
            (id, account_id, symbol, side, order_type, qty, limit_price_micros, status, fill_price_micros, commission_micros, submitted_at)
        values ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        on conflict (id) do update set
            status = excluded.status,
            fill_price_micros = excluded.fill_price_micros,
            commission_micros = excluded.commission_micros
        "#,
    )
    .bind(row.id)
    .bind(row.account_id)
    .bind(&row.symbol)
    .bind(&row.side)
    .bind(&row.order_type)
    .bind(row.qty)
    .bind(row.limit_price_micros)
    .bind(&row.status)
    .bind(row.fill_price_micros)
    .bind(row.commission_micros)
    .bind(row.submitted_at)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn insert_snapshot(pool: &PgPool, row: &SnapshotRow) -> Result<(), DbError> {
    sqlx::query(
        r#"
        insert into paper_snapshots (account_id, taken_at, equity_micros, daily_pnl_micros)
        values ($1, $2, $3, $4)
        on conflict (account_id, taken_at) do nothing
        "#,
    )
    .bind(row.account_id)
    .bind(row.taken_at)
    .bind(row.equity_micros)
    .bind(row.daily_pnl_micros)
    .execute(pool)
    .await?;
    Ok(())
}

/// Loads all positions for an account, best-effort: a row that fails to
/// parse is logged and skipped.
pub async fn load_positions(pool: &PgPool, account_id: Uuid) -> Result<Vec<PositionRow>, DbError> {
    let rows = sqlx::query(
        "select account_id, symbol, side, qty, entry_price_micros from paper_positions where account_id = $1",
    )
    .bind(account_id)
    .fetch_all(pool)
    .await?;

    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        match parse_position(&row) {
            Ok(parsed) => out.push(parsed),
            Err(e) => tracing::warn!(error = %e, "skipping corrupted paper_positions row"),
        }
    }
    Ok(out)
}

pub async fn load_snapshots(
    pool: &PgPool,
    account_id: Uuid,
    limit: i64,
) -> Result<Vec<SnapshotRow>, DbError> {
    let rows = sqlx::query(
        "select account_id, taken_at, equity_micros, daily_pnl_micros from paper_snapshots \
         where account_id = $1 order by taken_at desc limit $2",
    )
    .bind(account_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        match parse_snapshot(&row) {
            Ok(parsed) => out.push(parsed),
            Err(e) => tracing::warn!(error = %e, "skipping corrupted paper_snapshots row"),
        }
    }
    out.reverse();
    Ok(out)
}

fn parse_position(row: &sqlx::postgres::PgRow) -> Result<PositionRow, sqlx::Error> {
    Ok(PositionRow {
        account_id: row.try_get("account_id")?,
        symbol: row.try_get("symbol")?,
        side: row.try_get("side")?,
        qty: row.try_get("qty")?,
        entry_price_micros: row.try_get("entry_price_micros")?,
    })
}

fn parse_snapshot(row: &sqlx::postgres::PgRow) -> Result<SnapshotRow, sqlx::Error> {
    Ok(SnapshotRow {
        account_id: row.try_get("account_id")?,
        taken_at: row.try_get("taken_at")?,
        equity_micros: row.try_get("equity_micros")?,
        daily_pnl_micros: row.try_get("daily_pnl_micros")?,
    })
}
