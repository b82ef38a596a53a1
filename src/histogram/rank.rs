//! Rank and density evaluation for `Histogram`.
//!
//! Each centroid is modelled as a normal distribution `N(value, variance)`
//! carrying `count` observations; a zero-variance centroid is a point mass.
//!
//! # Semantics
//! - **Exact centroid hit**: all strictly-preceding counts plus the centroid's
//!   "at-mean" share: its full count for a point mass, half its count otherwise
//!   (the mean bisects the bucket).
//! - **Between centroids**: strictly-preceding counts plus the two neighbours'
//!   normal CDFs blended by their share of the combined count, scaled back by
//!   that count and floored.
//! - **Beyond either end**: the nearest centroid's normal CDF times its count, floored.
//! - **Empty histogram** → `0`.
//!
//! `count_at` is the density analogue: at an exact hit it reuses the at-mean
//! share, between centroids it takes the larger of the two neighbours'
//! `count · pdf`, beyond an end it uses the nearest centroid.
//!
//! # Guarantees
//! - `rank_at` is **non-decreasing** in the query value.
//! - Without compression (all centroids are point masses), `rank_at(v)` is the
//!   exact number of observations `<= v` and `count_at(v)` the exact multiplicity.
//!
//! # Performance
//! - Each call snapshots centroids and prefix counts once (`O(n)`); every probe
//!   is then a binary search (`O(log n)`) in the index's key order, where
//!   `-0.0` and `0.0` are the same key.
//! - Large probe batches are evaluated in parallel with Rayon.

use std::f64::consts::{PI, SQRT_2};

use rayon::prelude::*;

use crate::histogram::centroids::Centroid;
use crate::histogram::index::key;
use crate::histogram::Histogram;

/// Crossover for parallel evaluation with Rayon.
///
/// Below this size a scalar loop is typically faster.
const PAR_MIN: usize = 32_768;

/// Normal CDF of `c` at `x`; a point mass is a step at its value.
#[inline]
pub(crate) fn normal_cdf(x: f64, c: &Centroid) -> f64 {
    let sd = c.stdev();
    if sd == 0.0 {
        return if x < c.value {
            0.0
        } else if x > c.value {
            1.0
        } else {
            0.5
        };
    }
    0.5 * (1.0 + libm::erf((x - c.value) / (sd * SQRT_2)))
}

/// Normal density of `c` at `x`. A point mass has no density away from its value.
#[inline]
pub(crate) fn normal_pdf(x: f64, c: &Centroid) -> f64 {
    let sd = c.stdev();
    if sd == 0.0 {
        return 0.0;
    }
    let z = (x - c.value) / sd;
    (-0.5 * z * z).exp() / (sd * (2.0 * PI).sqrt())
}

/// Share of a centroid's count that sits at-or-below its own mean.
#[inline]
pub(crate) fn rank_at_mean(c: &Centroid) -> f64 {
    if c.variance == 0.0 {
        c.count_f64()
    } else {
        c.count_f64() / 2.0
    }
}

impl Histogram {
    /// Interpolated number of observations at or below `value`.
    ///
    /// A NaN probe ranks `0`.
    pub fn rank_at(&self, value: f64) -> u64 {
        let (cents, prefix) = self.snapshot();
        rank_kernel(value, &cents, &prefix)
    }

    /// [`Histogram::rank_at`] over many probes, sharing one snapshot.
    pub fn rank_at_many(&self, values: &[f64]) -> Vec<u64> {
        if values.is_empty() {
            return Vec::new();
        }
        let (cents, prefix) = self.snapshot();
        if values.len() >= PAR_MIN {
            values
                .par_iter()
                .with_min_len(4096)
                .map(|&v| rank_kernel(v, &cents, &prefix))
                .collect()
        } else {
            values
                .iter()
                .map(|&v| rank_kernel(v, &cents, &prefix))
                .collect()
        }
    }

    /// Estimated number of observations located at `value` (a density, not a rank).
    ///
    /// A NaN probe yields `NaN`.
    pub fn count_at(&self, value: f64) -> f64 {
        let cents = self.centroids();
        count_kernel(value, &cents)
    }

    /// [`Histogram::count_at`] over many probes.
    pub fn count_at_many(&self, values: &[f64]) -> Vec<f64> {
        if values.is_empty() {
            return Vec::new();
        }
        let cents = self.centroids();
        if values.len() >= PAR_MIN {
            values
                .par_iter()
                .with_min_len(4096)
                .map(|&v| count_kernel(v, &cents))
                .collect()
        } else {
            values.iter().map(|&v| count_kernel(v, &cents)).collect()
        }
    }

    /// Ascending centroids plus, for each, the total count strictly before it.
    fn snapshot(&self) -> (Vec<Centroid>, Vec<u64>) {
        let cents = self.centroids();
        let mut prefix = Vec::with_capacity(cents.len());
        let mut run = 0u64;
        for c in &cents {
            prefix.push(run);
            run += c.count;
        }
        (cents, prefix)
    }
}

/* ------------------------- PRIVATE KERNELS ------------------------- */

#[inline]
fn rank_kernel(value: f64, cents: &[Centroid], prefix: &[u64]) -> u64 {
    let n = cents.len();
    if n == 0 || value.is_nan() {
        return 0;
    }
    match cents.binary_search_by(|c| key(c.value).cmp(&key(value))) {
        Ok(idx) => prefix[idx] + rank_at_mean(&cents[idx]).floor() as u64,
        Err(0) => {
            let c = &cents[0];
            (c.count_f64() * normal_cdf(value, c)).floor() as u64
        }
        Err(idx) if idx == n => {
            let c = &cents[n - 1];
            prefix[n - 1] + (c.count_f64() * normal_cdf(value, c)).floor() as u64
        }
        Err(idx) => {
            // Count-share blend scaled by the combined count, i.e. Σ count·Φ.
            let (l, r) = (&cents[idx - 1], &cents[idx]);
            let blended =
                l.count_f64() * normal_cdf(value, l) + r.count_f64() * normal_cdf(value, r);
            prefix[idx - 1] + blended.floor() as u64
        }
    }
}

#[inline]
fn count_kernel(value: f64, cents: &[Centroid]) -> f64 {
    let n = cents.len();
    if n == 0 {
        return 0.0;
    }
    if value.is_nan() {
        return f64::NAN;
    }
    match cents.binary_search_by(|c| key(c.value).cmp(&key(value))) {
        Ok(idx) => rank_at_mean(&cents[idx]),
        Err(0) => cents[0].count_f64() * normal_pdf(value, &cents[0]),
        Err(idx) if idx == n => cents[n - 1].count_f64() * normal_pdf(value, &cents[n - 1]),
        Err(idx) => {
            let (l, r) = (&cents[idx - 1], &cents[idx]);
            let dl = l.count_f64() * normal_pdf(value, l);
            let dr = r.count_f64() * normal_pdf(value, r);
            dl.max(dr)
        }
    }
}
