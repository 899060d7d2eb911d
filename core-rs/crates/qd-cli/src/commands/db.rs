use anyhow::Result;

pub async fn status() -> Result<()> {
    let pool = qd_db::connect_from_env().await?;
    let status = qd_db::status(&pool).await?;
    println!("db_ok={} has_strategy_records_table={}", status.ok, status.has_strategy_records_table);
    Ok(())
}

pub async fn migrate() -> Result<()> {
    let pool = qd_db::connect_from_env().await?;
    qd_db::migrate(&pool).await?;
    println!("migrations_applied=true");
    Ok(())
}
