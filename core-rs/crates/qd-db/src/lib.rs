//! Postgres persistence for the four single-writer stores: the strategy
//! registry, paper trading state, alert rules, and agent events.
//!
//! Grounded on the reference workspace's `connect_from_env`/`migrate`/
//! `status` shape, trimmed to this project's four tables instead of the
//! teacher's run/outbox/inbox/reconcile schema, and using a local error
//! enum (rather than the teacher's `anyhow::Result`) so library callers
//! get a typed `DbError` to match on.

pub mod alerts;
pub mod events;
pub mod paper;
pub mod registry;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

pub const ENV_DB_URL: &str = "QD_DATABASE_URL";

#[derive(Debug)]
pub enum DbError {
    MissingEnvVar { name: &'static str },
    Connect(sqlx::Error),
    Migrate(sqlx::migrate::MigrateError),
    Query(sqlx::Error),
}

impl std::fmt::Display for DbError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingEnvVar { name } => write!(f, "missing env var {name}"),
            Self::Connect(e) => write!(f, "failed to connect to Postgres: {e}"),
            Self::Migrate(e) => write!(f, "db migrate failed: {e}"),
            Self::Query(e) => write!(f, "db query failed: {e}"),
        }
    }
}

impl std::error::Error for DbError {}

impl From<sqlx::Error> for DbError {
    fn from(e: sqlx::Error) -> Self {
        DbError::Query(e)
    }
}

/// Connects to Postgres using `QD_DATABASE_URL`.
pub async fn connect_from_env() -> Result<PgPool, DbError> {
    let url = std::env::var(ENV_DB_URL).map_err(|_| DbError::MissingEnvVar { name: ENV_DB_URL })?;

    PgPoolOptions::new()
        .max_connections(10)
        .connect(&url)
        .await
        .map_err(DbError::Connect)
}

/// Runs embedded SQLx migrations.
pub async fn migrate(pool: &PgPool) -> Result<(), DbError> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(DbError::Migrate)
}

#[derive(Debug, Clone)]
pub struct DbStatus {
    pub ok: bool,
    pub has_strategy_records_table: bool,
}

/// Connectivity + schema presence check.
pub async fn status(pool: &PgPool) -> Result<DbStatus, DbError> {
    let (one,): (i32,) = sqlx::query_as("select 1").fetch_one(pool).await?;

    let (exists,): (bool,) = sqlx::query_as(
        r#"
        select exists (
            select 1 from information_schema.tables
            where table_schema = 'public' and table_name = 'strategy_records'
        )
        "#,
    )
    .fetch_one(pool)
    .await?;

    Ok(DbStatus {
        ok: one == 1,
        has_strategy_records_table: exists,
    })
}
