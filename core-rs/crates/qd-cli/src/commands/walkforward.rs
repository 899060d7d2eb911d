use anyhow::{anyhow, Result};
use qd_backtest::BacktestConfig;
use qd_walkforward::{run_walk_forward, WalkForwardConfig, WalkForwardDecision};

use crate::bars;

pub async fn validate(
    bars_path: String,
    symbol: String,
    market: String,
    strategy: String,
    initial_cash_micros: i64,
    window_count: usize,
) -> Result<()> {
    let price_bars = bars::load_bars(&bars_path)?;
    let market = bars::market_from_tag(&market);

    let mut wf_config = WalkForwardConfig::default();
    wf_config.window_count = window_count;

    let base_config = BacktestConfig::new(symbol, market, initial_cash_micros);

    let result = run_walk_forward(&price_bars, &wf_config, &base_config, || {
        bars::strategy_from_name(&strategy).expect("strategy name already validated at startup")
    })
    .map_err(|e| anyhow!("walk-forward validation failed: {e}"))?;

    let decision = match result.decision {
        WalkForwardDecision::Pass => "pass",
        WalkForwardDecision::Fail => "fail",
    };
    println!("decision={decision}");
    println!("combined_test_sharpe={:.4}", result.combined_test_sharpe);
    println!("avg_train_sharpe={:.4}", result.avg_train_sharpe);
    println!("ratio={:.4}", result.ratio);
    for reason in &result.reasons {
        println!("reason={reason}");
    }
    for window in &result.windows {
        println!(
            "window={} train=[{},{}] test=[{},{}] train_sharpe={:.4} test_sharpe={:.4}",
            window.window_index,
            window.train_start,
            window.train_end,
            window.test_start,
            window.test_end,
            window.train_metrics.sharpe_ratio,
            window.test_metrics.sharpe_ratio
        );
    }

    Ok(())
}
