//! Shared fixtures for the scenario tests under `tests/`.

use qd_schemas::PriceBar;

/// Builds a flat-OHLC bar series (open = high = low = close) from a list
/// of close prices, one bar per millisecond starting at 0.
pub fn bars_from_closes(closes: &[f64]) -> Vec<PriceBar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, c)| {
            let micros = (c * 1_000_000.0).round() as i64;
            PriceBar::new(i as i64, micros, micros, micros, micros, 1_000)
        })
        .collect()
}
