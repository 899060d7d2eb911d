use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use qd_db::registry::StrategyRow;
use qd_schemas::StrategyLevel;
use uuid::Uuid;

use crate::bars::{strategy_level_from_str, strategy_level_to_str};

pub async fn list() -> Result<()> {
    let pool = qd_db::connect_from_env().await?;
    let rows = qd_db::registry::load_all(&pool).await?;
    for row in rows {
        println!(
            "id={} name={} level={} status={}",
            row.id, row.name, row.level, row.status
        );
    }
    Ok(())
}

pub async fn promote(id: Uuid, to_level: String) -> Result<()> {
    let pool = qd_db::connect_from_env().await?;
    let mut rows = qd_db::registry::load_all(&pool).await?;
    let row = rows
        .iter_mut()
        .find(|r| r.id == id)
        .ok_or_else(|| anyhow!("no strategy with id {id}"))?;

    let current = strategy_level_from_str(&row.level)?;
    let next = strategy_level_from_str(&to_level)?;
    if !current.can_transition_to(next) {
        anyhow::bail!("illegal promotion: {:?} -> {:?}", current, next);
    }

    row.level = strategy_level_to_str(next).to_string();
    row.updated_at = Utc::now();

    qd_db::registry::upsert(&pool, row)
        .await
        .context("persisting strategy promotion")?;

    println!("id={} level={}", row.id, row.level);
    Ok(())
}

pub async fn register(name: String, level: String) -> Result<()> {
    let pool = qd_db::connect_from_env().await?;
    let now = Utc::now();
    let level: StrategyLevel = strategy_level_from_str(&level)?;

    let row = StrategyRow {
        id: Uuid::new_v4(),
        name,
        level: strategy_level_to_str(level).to_string(),
        status: "running".to_string(),
        params_json: serde_json::json!({}),
        created_at: now,
        updated_at: now,
    };

    qd_db::registry::upsert(&pool, &row)
        .await
        .context("registering strategy")?;

    println!("id={}", row.id);
    Ok(())
}
