//! Pairwise return correlation across strategies/symbols, with
//! deterministic (`BTreeMap`-keyed) iteration so the matrix and the
//! high-correlation pair list are reproducible across runs.

use std::collections::BTreeMap;

/// Threshold above which a pair is flagged as highly correlated.
pub const HIGH_CORRELATION_THRESHOLD: f64 = 0.7;

fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

/// Pearson correlation coefficient between two equal-length return
/// series. Fewer than 2 points, or a zero-variance series, returns 0.0
/// (no detectable linear relationship rather than an undefined one).
pub fn pearson_correlation(a: &[f64], b: &[f64]) -> f64 {
    if a.len() != b.len() || a.len() < 2 {
        return 0.0;
    }

    let n = a.len() as f64;
    let mean_a = a.iter().sum::<f64>() / n;
    let mean_b = b.iter().sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;
    for i in 0..a.len() {
        let da = a[i] - mean_a;
        let db = b[i] - mean_b;
        cov += da * db;
        var_a += da * da;
        var_b += db * db;
    }

    if var_a == 0.0 || var_b == 0.0 {
        return 0.0;
    }

    cov / (var_a.sqrt() * var_b.sqrt())
}

/// A symmetric correlation matrix over a named set of return series, with
/// 1.0 on the diagonal by construction.
#[derive(Clone, Debug, Default)]
pub struct CorrelationMatrix {
    pub keys: Vec<String>,
    values: BTreeMap<(String, String), f64>,
}

impl CorrelationMatrix {
    /// Builds the matrix from a deterministic (`BTreeMap`) set of named
    /// return series, all expected to share the same length.
    pub fn compute(series: &BTreeMap<String, Vec<f64>>) -> Self {
        let keys: Vec<String> = series.keys().cloned().collect();
        let mut values = BTreeMap::new();

        for (i, key_a) in keys.iter().enumerate() {
            for key_b in keys.iter().skip(i) {
                let corr = if key_a == key_b {
                    1.0
                } else {
                    pearson_correlation(&series[key_a], &series[key_b])
                };
                values.insert((key_a.clone(), key_b.clone()), corr);
                values.insert((key_b.clone(), key_a.clone()), corr);
            }
        }

        Self { keys, values }
    }

    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        self.values.get(&(a.to_string(), b.to_string())).copied()
    }

    /// All unordered pairs whose absolute correlation meets or exceeds
    /// `threshold`, in deterministic key order.
    pub fn high_correlation_pairs(&self, threshold: f64) -> Vec<(String, String, f64)> {
        let mut pairs = Vec::new();
        for (i, key_a) in self.keys.iter().enumerate() {
            for key_b in self.keys.iter().skip(i + 1) {
                if let Some(corr) = self.get(key_a, key_b) {
                    if corr.abs() >= threshold {
                        pairs.push((key_a.clone(), key_b.clone(), round_to(corr, 3)));
                    }
                }
            }
        }
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perfectly_correlated_series() {
        let a = vec![1.0, 2.0, 3.0, 4.0];
        let b = vec![2.0, 4.0, 6.0, 8.0];
        assert!((pearson_correlation(&a, &b) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn perfectly_anti_correlated_series() {
        let a = vec![1.0, 2.0, 3.0, 4.0];
        let b = vec![4.0, 3.0, 2.0, 1.0];
        assert!((pearson_correlation(&a, &b) - (-1.0)).abs() < 1e-9);
    }

    #[test]
    fn matrix_diagonal_is_one_and_symmetric() {
        let mut series = BTreeMap::new();
        series.insert("A".to_string(), vec![1.0, 2.0, 3.0, 2.0]);
        series.insert("B".to_string(), vec![2.0, 1.0, 4.0, 3.0]);
        let matrix = CorrelationMatrix::compute(&series);
        assert_eq!(matrix.get("A", "A"), Some(1.0));
        assert_eq!(matrix.get("A", "B"), matrix.get("B", "A"));
    }

    #[test]
    fn high_correlation_pairs_respects_threshold() {
        let mut series = BTreeMap::new();
        series.insert("A".to_string(), vec![1.0, 2.0, 3.0, 4.0]);
        series.insert("B".to_string(), vec![2.0, 4.0, 6.0, 8.0]);
        series.insert("C".to_string(), vec![5.0, 1.0, 9.0, 2.0]);
        let matrix = CorrelationMatrix::compute(&series);
        let pairs = matrix.high_correlation_pairs(HIGH_CORRELATION_THRESHOLD);
        assert!(pairs.iter().any(|(a, b, _)| (a == "A" && b == "B")));
    }

    #[test]
    fn high_correlation_pairs_rounds_to_three_decimals() {
        let mut series = BTreeMap::new();
        series.insert("A".to_string(), vec![1.0, 2.0, 3.0, 4.0]);
        series.insert("B".to_string(), vec![2.0, 4.0, 6.0, 8.0]);
        let matrix = CorrelationMatrix::compute(&series);
        let pairs = matrix.high_correlation_pairs(HIGH_CORRELATION_THRESHOLD);
        let (_, _, corr) = pairs.iter().find(|(a, b, _)| a == "A" && b == "B").unwrap();
        assert_eq!(*corr, 1.0);
        assert_eq!((*corr * 1000.0).round(), 1000.0);
    }
}
