//! Accuracy harness: how far `quantile_at` lands from the exact order statistic.
//!
//! For every probe `q` on an even grid the target rank is `max(1, round(q·n))`,
//! the same rank `quantile_at` addresses. The estimated value is mapped back to
//! the span of ranks it occupies in the exact sorted sample; the error is the
//! distance from the target rank to that span, divided by `n`.
//! - `ks`: worst error over the grid.
//! - `mae`: mean error over the grid.
//!
//! Callers supply the sample, so tests and benches can share synthetic data.

use crate::histogram::test_helpers::exact_rank_span_for_sorted;
use crate::histogram::Histogram;
use crate::{HistError, HistResult};

/// Number of probe quantiles used by [`assess`].
pub const DEFAULT_GRID: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QualityReport {
    pub n: usize,
    pub max_centroids: usize,
    /// Worst normalized rank error over the grid.
    pub ks: f64,
    /// Mean normalized rank error over the grid.
    pub mae: f64,
    /// Single scalar for rough comparison, in `(0, 1]` (higher is better).
    pub score: f64,
}

impl QualityReport {
    #[inline]
    pub fn from_metrics(n: usize, max_centroids: usize, ks: f64, mae: f64) -> Self {
        let score = (-((50.0 * ks) + (400.0 * mae))).exp();
        QualityReport {
            n,
            max_centroids,
            ks,
            mae,
            score,
        }
    }

    /// No worse than `other` on both metrics (within rounding).
    pub fn no_worse_than(&self, other: &QualityReport) -> bool {
        let eps = 1e-12;
        self.ks <= other.ks + eps && self.mae <= other.mae + eps
    }

    pub fn to_line(&self) -> String {
        format!(
            "QualityReport(n={}, max_centroids={}, KS={:.6e}, MAE={:.6e}, score={:.3})",
            self.n, self.max_centroids, self.ks, self.mae, self.score
        )
    }

    pub fn log(&self) {
        crate::htrace!("{}", self.to_line());
    }
}

/// Build a histogram with budget `max_centroids` over `values` and assess it.
pub fn assess(values: &[f64], max_centroids: usize) -> HistResult<QualityReport> {
    let mut h = Histogram::new(max_centroids)?;
    h.add_many(values.iter().copied())?;
    assess_histogram(&h, values, DEFAULT_GRID)
}

/// Assess an already-populated histogram against the raw `values` it was fed.
pub fn assess_histogram(h: &Histogram, values: &[f64], grid: usize) -> HistResult<QualityReport> {
    if values.is_empty() {
        return Err(HistError::InvalidArgument {
            context: "quality sample must not be empty",
        });
    }
    if grid == 0 {
        return Err(HistError::InvalidArgument {
            context: "quality grid must be >= 1",
        });
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let n = sorted.len() as f64;

    let mut ks = 0.0f64;
    let mut sum = 0.0;
    for i in 0..grid {
        let q = (i as f64 + 0.5) / grid as f64;
        let pos = h.quantile_at(q)?;
        let (lo, hi) = exact_rank_span_for_sorted(&sorted, pos.value);
        let miss = if pos.rank < lo {
            lo - pos.rank
        } else if pos.rank > hi {
            pos.rank - hi
        } else {
            0
        };
        let err = miss as f64 / n;
        ks = ks.max(err);
        sum += err;
    }
    Ok(QualityReport::from_metrics(
        sorted.len(),
        h.max_centroids(),
        ks,
        sum / grid as f64,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use histogram_testdata::{gen_dataset, DistKind};

    #[test]
    fn lossless_budget_is_exact() {
        let values = gen_dataset(DistKind::Discrete { levels: 20 }, 5_000, 3);
        let rep = assess(&values, 32).unwrap();
        rep.log();
        assert_eq!(rep.ks, 0.0);
        assert_eq!(rep.mae, 0.0);
        assert_eq!(rep.score, 1.0);
    }

    #[test]
    fn larger_budget_is_no_worse() {
        let values = gen_dataset(DistKind::Normal, 20_000, 42);
        let coarse = assess(&values, 8).unwrap();
        let fine = assess(&values, 256).unwrap();
        eprintln!("COARSE -> {}", coarse.to_line());
        eprintln!("FINE   -> {}", fine.to_line());
        assert!(
            fine.no_worse_than(&coarse),
            "coarse={}, fine={}",
            coarse.to_line(),
            fine.to_line()
        );
        assert!(fine.score >= coarse.score);
    }

    #[test]
    fn rejects_empty_sample_and_grid() {
        assert!(assess(&[], 10).is_err());
        let h = Histogram::new(4).unwrap();
        assert!(assess_histogram(&h, &[1.0], 0).is_err());
    }
}
