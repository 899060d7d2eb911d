//! Strategy registry persistence: one row per strategy record, mutated in
//! place as it's promoted.

use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::DbError;

#[derive(Clone, Debug, PartialEq)]
pub struct StrategyRow {
    pub id: Uuid,
    pub name: String,
    pub level: String,
    pub status: String,
    pub params_json: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub async fn upsert(pool: &PgPool, row: &StrategyRow) -> Result<(), DbError> {
    sqlx::query(
        r#"
        insert into strategy_records (id, name, level, status, params_json, created_at, updated_at)
        values ($1, $2, $3, $4, $5, $6, $7)
        on conflict (id) do update set
            level = excluded.level,
            status = excluded.status,
            params_json = excluded.params_json,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(row.id)
    .bind(&row.name)
    .bind(&row.level)
    .bind(&row.status)
    .bind(&row.params_json)
    .bind(row.created_at)
    .bind(row.updated_at)
    .execute(pool)
    .await?;
    Ok(())
}

/// Loads all strategy records, best-effort: a row that fails to parse is
/// logged and skipped rather than failing the whole load. The caller's
/// in-memory registry falls back to empty only if every row fails.
pub async fn load_all(pool: &PgPool) -> Result<Vec<StrategyRow>, DbError> {
    let rows = sqlx::query("select id, name, level, status, params_json, created_at, updated_at from strategy_records")
        .fetch_all(pool)
        .await?;

    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        match parse_row(&row) {
            Ok(parsed) => out.push(parsed),
            Err(e) => tracing::warn!(error = %e, "skipping corrupted strategy_records row"),
        }
    }
    Ok(out)
}

fn parse_row(row: &sqlx::postgres::PgRow) -> Result<StrategyRow, sqlx::Error> {
    Ok(StrategyRow {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        level: row.try_get("level")?,
        status: row.try_get("status")?,
        params_json: row.try_get("params_json")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
