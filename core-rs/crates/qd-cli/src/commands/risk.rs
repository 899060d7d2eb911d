use anyhow::{anyhow, Result};
use qd_risk::RiskState;

pub async fn evaluate(today_start_equity: f64, equity: f64, allocated_capital: f64) -> Result<()> {
    let mut state = RiskState::new(1, today_start_equity);
    let eval = qd_risk::evaluate(&mut state, equity, allocated_capital)
        .map_err(|e| anyhow!("risk evaluation failed: {e}"))?;

    println!("level={:?}", eval.level);
    println!("scale_factor={:.2}", eval.scale_factor);
    println!("daily_drawdown_pct={:.4}", eval.daily_drawdown_pct);
    println!("exposure_pct={:.4}", eval.exposure_pct);
    println!("cash_reserve_pct={:.4}", eval.cash_reserve_pct);

    Ok(())
}
