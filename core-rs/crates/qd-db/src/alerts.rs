//! Alert rule persistence.

use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::DbError;

#[derive(Clone, Debug, PartialEq)]
pub struct AlertRow {
    pub id: Uuid,
    pub condition_json: Value,
    pub created_at: DateTime<Utc>,
    pub triggered_at: Option<DateTime<Utc>>,
    pub notified: bool,
    pub message: Option<String>,
}

pub async fn upsert(pool: &PgPool, row: &AlertRow) -> Result<(), DbError> {
    sqlx::query(
        r#"
        insert into alerts (id, condition_json, created_at, triggered_at, notified, message)
        values ($1, $2, $3, $4, $5, $6)
        on conflict (id) do update set
            triggered_at = excluded.triggered_at,
            notified = excluded.notified,
            message = excluded.message
        "#,
    )
    .bind(row.id)
    .bind(&row.condition_json)
    .bind(row.created_at)
    .bind(row.triggered_at)
    .bind(row.notified)
    .bind(&row.message)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn load_all(pool: &PgPool) -> Result<Vec<AlertRow>, DbError> {
    let rows = sqlx::query(
        "select id, condition_json, created_at, triggered_at, notified, message from alerts",
    )
    .fetch_all(pool)
    .await?;

    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        match parse_row(&row) {
            Ok(parsed) => out.push(parsed),
            Err(e) => tracing::warn!(error = %e, "skipping corrupted alerts row"),
        }
    }
    Ok(out)
}

fn parse_row(row: &sqlx::postgres::PgRow) -> Result<AlertRow, sqlx::Error> {
    Ok(AlertRow {
        id: row.try_get("id")?,
        condition_json: row.try_get("condition_json")?,
        created_at: row.try_get("created_at")?,
        triggered_at: row.try_get("triggered_at")?,
        notified: row.try_get("notified")?,
        message: row.try_get("message")?,
    })
}
