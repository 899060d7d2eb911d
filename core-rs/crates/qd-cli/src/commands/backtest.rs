use anyhow::{Context, Result};
use qd_backtest::{BacktestConfig, BacktestEngine};

use crate::bars;

pub async fn run(
    bars_path: String,
    symbol: String,
    market: String,
    strategy: String,
    initial_cash_micros: i64,
    slippage_bps: i64,
) -> Result<()> {
    let price_bars = bars::load_bars(&bars_path)?;
    let strategy = bars::strategy_from_name(&strategy)?;

    let mut config = BacktestConfig::new(symbol, bars::market_from_tag(&market), initial_cash_micros);
    config.slippage_bps = slippage_bps;

    let engine = BacktestEngine::new(config, strategy);
    let report = engine
        .run(&price_bars)
        .context("backtest run failed")?;

    println!("run_id={}", report.run_id);
    println!("trades={}", report.trades.len());
    println!("final_equity_micros={}", report.final_equity_micros);
    println!("sharpe_ratio={:.4}", report.metrics.sharpe_ratio);
    println!("sortino_ratio={:.4}", report.metrics.sortino_ratio);
    println!("max_drawdown_pct={:.4}", report.metrics.max_drawdown_pct);
    println!("calmar_ratio={:.4}", report.metrics.calmar_ratio);
    println!("profit_factor={:.4}", report.metrics.profit_factor);
    println!("win_rate={:.4}", report.metrics.win_rate);
    println!("total_return_pct={:.4}", report.metrics.total_return_pct);

    Ok(())
}
