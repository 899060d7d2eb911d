use anyhow::Result;

pub async fn hash(paths: Vec<String>) -> Result<()> {
    let loaded = qd_config::load_layered_yaml(&paths)?;
    println!("config_hash={}", loaded.config_hash);
    println!("{}", loaded.canonical_json);
    Ok(())
}
