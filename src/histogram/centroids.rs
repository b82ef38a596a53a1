use serde::{Deserialize, Serialize};

/// A centroid summarizes one or more raw observations as a weighted point with spread.
///
/// `variance` is the sample variance of the observations folded into the centroid
/// (one degree of freedom removed); a centroid built from identical values has
/// `variance == 0`.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Centroid {
    pub value: f64,
    pub count: u64,
    pub variance: f64,
}

impl Centroid {
    #[inline]
    pub fn new(value: f64, count: u64, variance: f64) -> Self {
        Centroid {
            value,
            count,
            variance,
        }
    }

    /// A single raw observation.
    #[inline]
    pub fn unit(value: f64) -> Self {
        Centroid::new(value, 1, 0.0)
    }

    #[inline]
    pub fn stdev(&self) -> f64 {
        self.variance.sqrt()
    }

    #[inline]
    pub(crate) fn count_f64(&self) -> f64 {
        self.count as f64
    }

    /// Fold `other` into `self` when both sit on the *same* value: counts add,
    /// the value is unchanged, variances pool with one degree of freedom removed.
    pub fn combine_shared_mean(&self, other: &Centroid) -> Centroid {
        debug_assert!(self.value == other.value);
        let n = self.count + other.count;
        let within = (self.count_f64() - 1.0) * self.variance
            + (other.count_f64() - 1.0) * other.variance;
        Centroid {
            value: self.value,
            count: n,
            variance: pooled(within, n),
        }
    }

    /// Variance the merged centroid of `self` and `other` would carry:
    /// within-group spread plus the between-group term from the mean separation.
    pub fn combined_variance(&self, other: &Centroid) -> f64 {
        let (na, nb) = (self.count_f64(), other.count_f64());
        let n = self.count + other.count;
        let delta = other.value - self.value;
        let within = (na - 1.0) * self.variance + (nb - 1.0) * other.variance;
        let between = delta * delta * na * nb / (na + nb);
        pooled(within + between, n)
    }

    /// Weighted-mean merge of two adjacent centroids (`self` below `other`).
    ///
    /// The merged value is clamped into `[self.value, other.value]` so rounding
    /// can never push it onto a neighbouring key.
    pub fn merge(&self, other: &Centroid) -> Centroid {
        let n = self.count + other.count;
        let (lo, hi) = if self.value <= other.value {
            (self.value, other.value)
        } else {
            (other.value, self.value)
        };
        let share = other.count_f64() / n as f64;
        let value = (self.value + (other.value - self.value) * share).clamp(lo, hi);
        Centroid {
            value,
            count: n,
            variance: self.combined_variance(other),
        }
    }
}

/// Divide a sum of squared deviations by `n - 1`; `n < 2` carries no spread.
#[inline]
fn pooled(sum_sq: f64, n: u64) -> f64 {
    if n < 2 {
        0.0
    } else {
        (sum_sq / (n - 1) as f64).max(0.0)
    }
}

/// Merge cost between two adjacent centroids: distance weighted by the combined
/// count, plus the spread the merged centroid would have.
#[inline]
pub fn compute_loss(a: &Centroid, b: &Centroid) -> f64 {
    (a.value - b.value).abs() * (a.count_f64() + b.count_f64()) + a.combined_variance(b)
}
