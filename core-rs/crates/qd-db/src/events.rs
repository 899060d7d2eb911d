//! Agent event store persistence, retention-capped to the 500 most
//! recent rows by timestamp (the caller evicts; this module just
//! reflects whatever's left).

use serde_json::Value;
use sqlx::{PgPool, Row};

use crate::DbError;

#[derive(Clone, Debug, PartialEq)]
pub struct AgentEventRow {
    pub id: String,
    pub event_type: String,
    pub title: String,
    pub detail: String,
    pub timestamp_ms: i64,
    pub status: String,
    pub action_params_json: Option<Value>,
}

pub async fn insert(pool: &PgPool, row: &AgentEventRow) -> Result<(), DbError> {
    sqlx::query(
        r#"
        insert into agent_events (id, event_type, title, detail, timestamp_ms, status, action_params_json)
        values ($1, $2, $3, $4, $5, $6, $7)
        on conflict (id) do update set status = excluded.status
        "#,
    )
    .bind(&row.id)
    .bind(&row.event_type)
    .bind(&row.title)
    .bind(&row.detail)
    .bind(row.timestamp_ms)
    .bind(&row.status)
    .bind(&row.action_params_json)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn evict_beyond_retention(pool: &PgPool, retention: i64) -> Result<u64, DbError> {
    let result = sqlx::query(
        r#"
        delete from agent_events
        where id not in (
            select id from agent_events order by timestamp_ms desc limit $1
        )
        "#,
    )
    .bind(retention)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

/// Loads the most recent `limit` events, best-effort: a row that fails
/// to parse is logged and skipped.
pub async fn load_recent(pool: &PgPool, limit: i64) -> Result<Vec<AgentEventRow>, DbError> {
    let rows = sqlx::query(
        "select id, event_type, title, detail, timestamp_ms, status, action_params_json \
         from agent_events order by timestamp_ms desc limit $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        match parse_row(&row) {
            Ok(parsed) => out.push(parsed),
            Err(e) => tracing::warn!(error = %e, "skipping corrupted agent_events row"),
        }
    }
    out.reverse();
    Ok(out)
}

fn parse_row(row: &sqlx::postgres::PgRow) -> Result<AgentEventRow, sqlx::Error> {
    Ok(AgentEventRow {
        id: row.try_get("id")?,
        event_type: row.try_get("event_type")?,
        title: row.try_get("title")?,
        detail: row.try_get("detail")?,
        timestamp_ms: row.try_get("timestamp_ms")?,
        status: row.try_get("status")?,
        action_params_json: row.try_get("action_params_json")?,
    })
}
