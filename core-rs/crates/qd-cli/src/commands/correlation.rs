use std::collections::BTreeMap;

use anyhow::{Context, Result};
use qd_correlation::CorrelationMatrix;
use serde::Deserialize;

#[derive(Deserialize)]
struct RawSeries {
    series: BTreeMap<String, Vec<f64>>,
}

pub async fn show(series_path: String, threshold: f64) -> Result<()> {
    let raw = std::fs::read_to_string(&series_path)
        .with_context(|| format!("reading return series file {series_path}"))?;
    let parsed: RawSeries = serde_json::from_str(&raw)
        .with_context(|| format!("parsing return series file {series_path}"))?;

    let matrix = CorrelationMatrix::compute(&parsed.series);

    for (a, b, corr) in matrix.high_correlation_pairs(threshold) {
        println!("{a},{b},{corr:.4}");
    }

    Ok(())
}
