use std::collections::BTreeMap;

use qd_correlation::CorrelationMatrix;

#[test]
fn matrix_is_symmetric_with_unit_diagonal_and_thresholded_pairs() {
    let mut series = BTreeMap::new();
    series.insert("a".to_string(), vec![1.0, 2.0, 3.0, 4.0, 5.0]);
    series.insert("b".to_string(), vec![2.0, 4.0, 6.0, 8.0, 10.0]);
    series.insert("c".to_string(), vec![5.0, 1.0, 4.0, 2.0, 3.0]);

    let matrix = CorrelationMatrix::compute(&series);

    for key in &matrix.keys {
        assert_eq!(matrix.get(key, key), Some(1.0));
    }

    for a in &matrix.keys {
        for b in &matrix.keys {
            assert_eq!(matrix.get(a, b), matrix.get(b, a), "correlation must be symmetric for ({a}, {b})");
        }
    }

    for (a, b, corr) in matrix.high_correlation_pairs(0.7) {
        assert!(corr.abs() >= 0.7, "pair ({a}, {b}) reported with |corr| {corr} below the 0.7 threshold");
    }
}
