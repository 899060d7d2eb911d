//! Price bar loading for CLI commands: a JSON array of bars, since this
//! core carries no market-data ingestion pipeline of its own.

use anyhow::{Context, Result};
use qd_schemas::PriceBar;
use serde::Deserialize;
use std::path::Path;

#[derive(Deserialize)]
struct RawBar {
    timestamp_ms: i64,
    open_micros: i64,
    high_micros: i64,
    low_micros: i64,
    close_micros: i64,
    volume: i64,
}

pub fn load_bars(path: impl AsRef<Path>) -> Result<Vec<PriceBar>> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading bars file {}", path.display()))?;
    let bars: Vec<RawBar> = serde_json::from_str(&raw)
        .with_context(|| format!("parsing bars file {} as JSON array", path.display()))?;

    Ok(bars
        .into_iter()
        .map(|b| {
            PriceBar::new(
                b.timestamp_ms,
                b.open_micros,
                b.high_micros,
                b.low_micros,
                b.close_micros,
                b.volume,
            )
        })
        .collect())
}

pub fn strategy_from_name(name: &str) -> Result<Box<dyn qd_strategy::Strategy>> {
    match name {
        "sma_cross" => Ok(Box::new(qd_strategy::builtins::SmaCrossoverStrategy::new(10, 30))),
        "rsi_mean_reversion" => Ok(Box::new(qd_strategy::builtins::RsiMeanReversionStrategy::new(
            14, 30.0, 70.0,
        ))),
        other => anyhow::bail!(
            "unknown --strategy '{other}'. supported: sma_cross, rsi_mean_reversion"
        ),
    }
}

pub fn market_from_tag(tag: &str) -> qd_schemas::Market {
    qd_schemas::Market::parse_or_equity(tag)
}

pub fn side_from_str(s: &str) -> Result<qd_schemas::Side> {
    match s {
        "buy" => Ok(qd_schemas::Side::Buy),
        "sell" => Ok(qd_schemas::Side::Sell),
        other => anyhow::bail!("unknown --side '{other}'. supported: buy, sell"),
    }
}

pub fn order_type_from_str(s: &str) -> Result<qd_schemas::OrderType> {
    match s {
        "market" => Ok(qd_schemas::OrderType::Market),
        "limit" => Ok(qd_schemas::OrderType::Limit),
        other => anyhow::bail!("unknown --order-type '{other}'. supported: market, limit"),
    }
}

pub fn strategy_level_from_str(s: &str) -> Result<qd_schemas::StrategyLevel> {
    use qd_schemas::StrategyLevel::*;
    match s {
        "l0_incubate" => Ok(L0Incubate),
        "l1_backtest" => Ok(L1Backtest),
        "l2_paper" => Ok(L2Paper),
        "l3_live" => Ok(L3Live),
        "killed" => Ok(Killed),
        other => anyhow::bail!(
            "unknown strategy level '{other}'. supported: l0_incubate, l1_backtest, l2_paper, l3_live, killed"
        ),
    }
}

pub fn strategy_level_to_str(level: qd_schemas::StrategyLevel) -> &'static str {
    use qd_schemas::StrategyLevel::*;
    match level {
        L0Incubate => "l0_incubate",
        L1Backtest => "l1_backtest",
        L2Paper => "l2_paper",
        L3Live => "l3_live",
        Killed => "killed",
    }
}
