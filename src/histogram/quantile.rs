//! Rank → value lookups for `Histogram`.
//!
//! - **`value_at(rank)`**: walk centroids in ascending order, accumulating counts
//!   until the running total reaches `rank`. The owning centroid and the
//!   position inside it (`offset`) identify the observation.
//! - **Offset interpolation**: a centroid with spread spreads its observations
//!   linearly across one standard deviation either side of its mean; a point
//!   mass returns its value for every offset.
//! - **`quantile_at(q)`**: `value_at(round(q · count))`, clamped to rank `1`.
//!   Note the 0-based rounding here versus the markers' 1-based
//!   `round(q · (count − 1)) + 1`; the two may differ by one rank.
//! - **`marker_at(i)`**: `O(1)` read of a live marker, interpolated the same way.
//!
//! # Edge cases
//! - **Empty histogram** → `RankOutOfRange`.
//! - **`rank == 0` or `rank > count`** → `RankOutOfRange`.
//! - **`q` outside `[0, 1]` or NaN** → `InvalidArgument`.

use serde::{Deserialize, Serialize};

use crate::histogram::centroids::Centroid;
use crate::histogram::Histogram;
use crate::{HistError, HistResult};

/// One addressed observation: its rank, owning centroid, offset inside that
/// centroid, and interpolated value.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub rank: u64,
    pub centroid: Centroid,
    pub offset: u64,
    pub value: f64,
}

/// Value of the `offset`-th observation (0-based) inside `c`.
///
/// `mean + stdev · (−1 + 2·offset/(count−1))`: the first observation sits one
/// standard deviation below the mean, the last one above.
#[inline]
pub fn infer_value_from_offset(offset: u64, c: &Centroid) -> f64 {
    if c.variance == 0.0 || c.count < 2 {
        return c.value;
    }
    let t = offset as f64 / (c.count - 1) as f64;
    c.value + c.stdev() * (-1.0 + 2.0 * t)
}

impl Histogram {
    /// The observation at 1-based `rank`. Linear in the number of centroids.
    pub fn value_at(&self, rank: u64) -> HistResult<Position> {
        if rank == 0 || rank > self.count() {
            return Err(HistError::RankOutOfRange {
                rank,
                count: self.count(),
            });
        }
        let mut remaining = rank;
        for e in self.index().values() {
            let c = e.centroid;
            if remaining <= c.count {
                let offset = remaining - 1;
                return Ok(Position {
                    rank,
                    centroid: c,
                    offset,
                    value: infer_value_from_offset(offset, &c),
                });
            }
            remaining -= c.count;
        }
        Err(HistError::Invariant {
            what: "count exceeds the sum of centroid counts",
        })
    }

    /// The observation at quantile `q ∈ [0, 1]`.
    pub fn quantile_at(&self, q: f64) -> HistResult<Position> {
        if q.is_nan() || !(0.0..=1.0).contains(&q) {
            return Err(HistError::InvalidArgument {
                context: "quantile must be within [0, 1]",
            });
        }
        let rank = ((q * self.count() as f64).round() as u64).max(1);
        self.value_at(rank)
    }

    #[inline]
    pub fn median(&self) -> HistResult<Position> {
        self.quantile_at(0.5)
    }

    /// Current position of marker `index` (in configuration order).
    pub fn marker_at(&self, index: usize) -> HistResult<Position> {
        let st = self.marker_set().state(index)?;
        let entry = self.index().get(st.key).ok_or(HistError::Invariant {
            what: "marker points at a dead centroid",
        })?;
        let c = entry.centroid;
        Ok(Position {
            rank: st.rank,
            centroid: c,
            offset: st.offset,
            value: infer_value_from_offset(st.offset, &c),
        })
    }
}
