// src/histogram/histogram.rs
use serde::Deserialize;

use crate::histogram::centroids::{compute_loss, Centroid};
use crate::histogram::index::{key, CentroidEntry, Key, TwinIndex};
use crate::histogram::markers::MarkerSet;
use crate::{HistError, HistResult};

pub const DEFAULT_MAX_CENTROIDS: usize = 100;

/// Streaming histogram orchestration + public mutation API.
///
/// - Values are kept exactly (one centroid per distinct value) until the number
///   of distinct values exceeds `max_centroids`.
/// - Past that point every new centroid triggers one merge of the cheapest
///   adjacent pair, chosen by loss (see [`compute_loss`]).
/// - Optional markers track fixed quantiles incrementally.
///
/// The centroid and loss indices are private to [`TwinIndex`] and only mutated
/// from here, so the cross-index invariants hold after every public call.
#[derive(Debug, Clone)]
pub struct Histogram {
    index: TwinIndex,
    markers: MarkerSet,
    count: u64,
    max_centroids: usize,
}

#[inline]
fn ensure_finite(v: f64, context: &'static str) -> HistResult<()> {
    if v.is_finite() {
        Ok(())
    } else {
        Err(HistError::NonFiniteInput { context })
    }
}

#[inline]
fn ensure_budget(n: usize) -> HistResult<()> {
    if n < 1 {
        return Err(HistError::InvalidArgument {
            context: "max_centroids must be >= 1",
        });
    }
    Ok(())
}

/* =============================================================================
 * Options / Builder
 * ============================================================================= */

#[inline]
fn default_max_centroids() -> usize {
    DEFAULT_MAX_CENTROIDS
}

/// Declarative configuration, e.g. from a JSON/TOML config section.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HistogramOptions {
    #[serde(default = "default_max_centroids")]
    pub max_centroids: usize,
    /// Target quantiles tracked by markers, each within `[0, 1]`.
    #[serde(default)]
    pub markers: Vec<f64>,
}

impl Default for HistogramOptions {
    fn default() -> Self {
        Self {
            max_centroids: DEFAULT_MAX_CENTROIDS,
            markers: Vec::new(),
        }
    }
}

/// Builder for [`Histogram`].
#[derive(Debug, Clone)]
pub struct HistogramBuilder {
    max_centroids: usize,
    markers: Vec<f64>,
}

impl Default for HistogramBuilder {
    fn default() -> Self {
        Self {
            max_centroids: DEFAULT_MAX_CENTROIDS,
            markers: Vec::new(),
        }
    }
}

impl HistogramBuilder {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the compression budget (must be `>= 1`).
    #[inline]
    pub fn max_centroids(mut self, n: usize) -> Self {
        self.max_centroids = n;
        self
    }

    /// Quantiles to track with markers. Fixed for the histogram's lifetime.
    #[inline]
    pub fn markers(mut self, quantiles: Vec<f64>) -> Self {
        self.markers = quantiles;
        self
    }

    pub fn build(self) -> HistResult<Histogram> {
        ensure_budget(self.max_centroids)?;
        Ok(Histogram {
            index: TwinIndex::default(),
            markers: MarkerSet::new(&self.markers)?,
            count: 0,
            max_centroids: self.max_centroids,
        })
    }
}

/* =============================================================================
 * Histogram
 * ============================================================================= */

impl Histogram {
    /// Empty histogram with budget `max_centroids` and no markers.
    pub fn new(max_centroids: usize) -> HistResult<Histogram> {
        Self::builder().max_centroids(max_centroids).build()
    }

    /// Entry point for fluent construction.
    #[inline]
    pub fn builder() -> HistogramBuilder {
        HistogramBuilder::default()
    }

    pub fn from_options(opts: &HistogramOptions) -> HistResult<Histogram> {
        Self::builder()
            .max_centroids(opts.max_centroids)
            .markers(opts.markers.clone())
            .build()
    }

    /// Total number of raw observations represented.
    #[inline]
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Number of live centroids.
    #[inline]
    pub fn centroid_count(&self) -> usize {
        self.index.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// The configured compression budget.
    #[inline]
    pub fn max_centroids(&self) -> usize {
        self.max_centroids
    }

    /// Target quantiles of the configured markers, in marker-index order.
    pub fn markers(&self) -> Vec<f64> {
        self.markers.quantiles()
    }

    /// Ascending snapshot of the live centroids.
    pub fn centroids(&self) -> Vec<Centroid> {
        self.index.values().map(|e| e.centroid).collect()
    }

    /// Ascending snapshot of the live entries together with their stored loss.
    pub fn entries(&self) -> Vec<CentroidEntry> {
        self.index.values().copied().collect()
    }

    #[inline]
    pub(crate) fn index(&self) -> &TwinIndex {
        &self.index
    }

    #[inline]
    pub(crate) fn marker_set(&self) -> &MarkerSet {
        &self.markers
    }

    /* ===========================
     * Ingestion
     * =========================== */

    /// Add one raw value. Returns the loss of the merge this triggered, or `0.0`
    /// if the histogram stayed within budget.
    pub fn add(&mut self, value: f64) -> HistResult<f64> {
        ensure_finite(value, "sample value")?;
        Ok(self.ingest(Centroid::unit(value)))
    }

    /// Add many raw values; returns the summed merge loss.
    ///
    /// The whole batch is validated first, so a bad value changes nothing.
    pub fn add_many<I: IntoIterator<Item = f64>>(&mut self, values: I) -> HistResult<f64> {
        let values: Vec<f64> = values.into_iter().collect();
        if values.iter().any(|v| !v.is_finite()) {
            return Err(HistError::NonFiniteInput {
                context: "sample value",
            });
        }
        Ok(values
            .into_iter()
            .map(|v| self.ingest(Centroid::unit(v)))
            .sum())
    }

    /// Add a pre-aggregated centroid. Same contract as [`Histogram::add`].
    pub fn append(&mut self, c: Centroid) -> HistResult<f64> {
        if c.count < 1 {
            return Err(HistError::InvalidArgument {
                context: "centroid count must be >= 1",
            });
        }
        ensure_finite(c.value, "centroid value")?;
        ensure_finite(c.variance, "centroid variance")?;
        if c.variance < 0.0 {
            return Err(HistError::InvalidArgument {
                context: "centroid variance must be >= 0",
            });
        }
        Ok(self.ingest(c))
    }

    /// Fold every centroid of `other` into `self`.
    ///
    /// All centroids are inserted before any compression so the merge order
    /// of the source does not bias which pairs get merged; the excess is
    /// drained afterwards.
    pub fn merge_from(&mut self, other: &Histogram) {
        if other.is_empty() {
            return;
        }
        self.count += other.count;
        for e in other.index.values() {
            self.insert_or_increment(e.centroid);
        }
        let merges = self.drain_excess();
        htrace!(
            "merge_from: in={}, merges={}, centroids={}, count={}",
            other.centroid_count(),
            merges,
            self.centroid_count(),
            self.count
        );
        debug_assert!(self.check_invariants());
    }

    /// Change the compression budget.
    ///
    /// Shrinking the budget merges synchronously until the histogram fits, so
    /// this can cost `O(excess · log n)`. Returns the number of merges performed.
    pub fn set_max_centroids(&mut self, n: usize) -> HistResult<usize> {
        ensure_budget(n)?;
        self.max_centroids = n;
        let merges = self.drain_excess();
        htrace!("set_max_centroids: budget={}, merges={}", n, merges);
        debug_assert!(self.check_invariants());
        Ok(merges)
    }

    /* ===========================
     * Internals
     * =========================== */

    fn ingest(&mut self, c: Centroid) -> f64 {
        self.count += c.count;
        self.insert_or_increment(c);
        // One insertion creates at most one excess centroid.
        let loss = if self.index.len() > self.max_centroids {
            self.compress().unwrap_or(0.0)
        } else {
            0.0
        };
        debug_assert!(self.check_invariants());
        loss
    }

    fn drain_excess(&mut self) -> usize {
        let mut merges = 0;
        while self.index.len() > self.max_centroids {
            if self.compress().is_none() {
                break;
            }
            merges += 1;
        }
        merges
    }

    /// Fold `c` into the centroid at the same value, or create a new one.
    /// `count` must already include `c.count`. Returns `true` if created.
    fn insert_or_increment(&mut self, c: Centroid) -> bool {
        let k = key(c.value);
        let existing = self.index.get(k).map(|e| e.centroid);
        let created = match existing {
            Some(cur) => {
                self.write(cur.combine_shared_mean(&c));
                false
            }
            None => {
                self.write(c);
                true
            }
        };
        self.refresh_successor(k);
        if created {
            self.markers.on_insert(&self.index, k, c.count, self.count);
        }
        created
    }

    /// Store `c` with its loss against the current predecessor.
    fn write(&mut self, c: Centroid) {
        let loss = match self.index.prior(key(c.value)) {
            Some(p) => compute_loss(&p.centroid, &c),
            None => f64::INFINITY,
        };
        self.index.upsert(CentroidEntry { centroid: c, loss });
    }

    /// Recompute the loss of the entry after `k`, which depends on `k`'s centroid.
    fn refresh_successor(&mut self, k: Key) {
        let Some(cur) = self.index.get(k).map(|e| e.centroid) else {
            return;
        };
        if let Some(next) = self.index.next(k).map(|e| e.centroid) {
            self.index.upsert(CentroidEntry {
                centroid: next,
                loss: compute_loss(&cur, &next),
            });
        }
    }

    /// Merge the cheapest adjacent pair. Returns the pre-merge loss of the
    /// selected entry, or `None` when fewer than two centroids exist.
    fn compress(&mut self) -> Option<f64> {
        let (loss, min_key) = self.index.min_loss_with_prior()?;
        let min = self.index.get(min_key)?.centroid;
        let prior = self.index.prior(min_key)?.centroid;
        let prior_key = key(prior.value);
        let merged = prior.merge(&min);

        self.index.remove(prior_key);
        self.index.remove(min_key);
        self.write(merged);
        let merged_key = key(merged.value);
        self.refresh_successor(merged_key);
        self.markers
            .on_merge(prior_key, min_key, merged_key, prior.count);

        htrace!(
            "compress: [{} x{}] + [{} x{}] -> [{} x{}], loss={}, centroids={}/{}",
            prior.value,
            prior.count,
            min.value,
            min.count,
            merged.value,
            merged.count,
            loss,
            self.index.len(),
            self.max_centroids
        );
        Some(loss)
    }

    /// Verify every structural invariant. `O(n)`; meant for tests and debug builds.
    pub fn check_invariants(&self) -> bool {
        if !self.index.check_consistency(compute_loss) {
            return false;
        }
        let total: u64 = self.index.values().map(|e| e.centroid.count).sum();
        if total != self.count || self.index.len() > self.max_centroids {
            return false;
        }
        (0..self.markers.len()).all(|i| match self.markers.state(i) {
            Ok(st) => match self.index.get(st.key) {
                Some(e) => {
                    st.rank >= 1 && st.rank <= self.count && st.offset < e.centroid.count
                }
                None => false,
            },
            Err(HistError::MarkerEmpty { .. }) => self.is_empty(),
            Err(_) => false,
        })
    }
}
