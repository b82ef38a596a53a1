//! Assertions shared by unit tests, integration tests and the quality harness.

pub fn assert_exact(label: &str, expected: f64, got: f64) {
    assert!(
        expected == got,
        "{}: expected exactly {:.9}, got {:.9}",
        label,
        expected,
        got
    );
}

pub fn assert_rel_close(label: &str, expected: f64, got: f64, rtol: f64) {
    let denom = expected.abs().max(1e-300);
    let rel = (expected - got).abs() / denom;
    assert!(
        rel < rtol,
        "{}: expected ~= {:.9}, got {:.9}, rel_err={:.6e}, rtol={:.6e}",
        label,
        expected,
        got,
        rel,
        rtol
    );
}

pub fn assert_monotone_chain(label: &str, values: &[f64]) {
    for i in 1..values.len() {
        assert!(
            values[i] >= values[i - 1],
            "{}: non-monotone at i={}: {} < {}",
            label,
            i,
            values[i],
            values[i - 1]
        );
    }
}

/// Exact number of observations `<= x` in an ascending sample.
pub fn exact_rank_for_sorted(sorted: &[f64], x: f64) -> u64 {
    sorted.partition_point(|&v| v <= x) as u64
}

/// Range of 1-based ranks the value `x` occupies in an ascending sample.
///
/// For a value absent from the sample the range is empty (`lo == hi + 1`) and
/// sits where `x` would be inserted.
pub fn exact_rank_span_for_sorted(sorted: &[f64], x: f64) -> (u64, u64) {
    let below = sorted.partition_point(|&v| v < x) as u64;
    (below + 1, exact_rank_for_sorted(sorted, x))
}
