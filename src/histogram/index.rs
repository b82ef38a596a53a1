//! Ordered storage for the histogram: a centroid index keyed by value and a
//! loss index keyed by `(loss, value)`, kept in lock-step.
//!
//! Both indices are private to [`TwinIndex`]; every mutation goes through
//! [`TwinIndex::upsert`] or [`TwinIndex::remove`], which always touch both
//! sides before returning. Navigation (`prior`, `next`, ranges) works from any
//! key, present or not, at `O(log n)` per lookup.

use std::collections::btree_map;
use std::collections::{BTreeMap, BTreeSet};
use std::ops::Bound::{Excluded, Unbounded};

use ordered_float::OrderedFloat;

use crate::histogram::centroids::Centroid;

pub(crate) type Key = OrderedFloat<f64>;

#[inline]
pub(crate) fn key(value: f64) -> Key {
    OrderedFloat::from(value)
}

/// A centroid plus the loss between it and its value-order predecessor
/// (`+inf` for the first entry).
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct CentroidEntry {
    pub centroid: Centroid,
    pub loss: f64,
}

impl CentroidEntry {
    #[inline]
    pub(crate) fn key(&self) -> Key {
        key(self.centroid.value)
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct TwinIndex {
    by_value: BTreeMap<Key, CentroidEntry>,
    by_loss: BTreeSet<(Key, Key)>,
}

impl TwinIndex {
    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.by_value.len()
    }

    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.by_value.is_empty()
    }

    #[inline]
    pub(crate) fn get(&self, k: Key) -> Option<&CentroidEntry> {
        self.by_value.get(&k)
    }

    /// Greatest entry strictly below `k`.
    #[inline]
    pub(crate) fn prior(&self, k: Key) -> Option<&CentroidEntry> {
        self.by_value.range(..k).next_back().map(|(_, e)| e)
    }

    /// Smallest entry strictly above `k`.
    #[inline]
    pub(crate) fn next(&self, k: Key) -> Option<&CentroidEntry> {
        self.by_value
            .range((Excluded(k), Unbounded))
            .next()
            .map(|(_, e)| e)
    }

    #[inline]
    pub(crate) fn first(&self) -> Option<&CentroidEntry> {
        self.by_value.values().next()
    }

    /// Entries with value `>= k`, ascending when walked forward.
    #[inline]
    pub(crate) fn range_from(&self, k: Key) -> btree_map::Range<'_, Key, CentroidEntry> {
        self.by_value.range(k..)
    }

    /// Entries with value `<= k`, descending when walked from the back.
    #[inline]
    pub(crate) fn range_to(&self, k: Key) -> btree_map::Range<'_, Key, CentroidEntry> {
        self.by_value.range(..=k)
    }

    #[inline]
    pub(crate) fn all(&self) -> btree_map::Range<'_, Key, CentroidEntry> {
        self.by_value.range::<Key, _>(..)
    }

    #[inline]
    pub(crate) fn values(&self) -> btree_map::Values<'_, Key, CentroidEntry> {
        self.by_value.values()
    }

    /// Insert `entry`, or replace the entry already stored at its value.
    /// The mirrored loss record is rewritten in the same call.
    pub(crate) fn upsert(&mut self, entry: CentroidEntry) {
        let k = entry.key();
        if let Some(old) = self.by_value.insert(k, entry) {
            let removed = self.by_loss.remove(&(key(old.loss), k));
            debug_assert!(removed, "loss record missing for live centroid");
        }
        self.by_loss.insert((key(entry.loss), k));
    }

    /// Delete the entry at `k` from both indices.
    pub(crate) fn remove(&mut self, k: Key) -> Option<CentroidEntry> {
        let old = self.by_value.remove(&k)?;
        let removed = self.by_loss.remove(&(key(old.loss), k));
        debug_assert!(removed, "loss record missing for live centroid");
        Some(old)
    }

    /// Cheapest merge candidate: the minimum-loss entry that has a predecessor.
    ///
    /// The first entry carries `+inf` and sorts last, but losses can overflow to
    /// `+inf` as well; skipping the first key keeps the choice well-defined.
    /// Returns `(loss, value)`.
    pub(crate) fn min_loss_with_prior(&self) -> Option<(f64, Key)> {
        if self.by_value.len() < 2 {
            return None;
        }
        let first = *self.by_value.keys().next()?;
        self.by_loss
            .iter()
            .find(|(_, v)| *v != first)
            .map(|(l, v)| (l.into_inner(), *v))
    }

    /// Check every cross-index invariant; used by debug assertions and tests.
    pub(crate) fn check_consistency(&self, loss: impl Fn(&Centroid, &Centroid) -> f64) -> bool {
        if self.by_value.len() != self.by_loss.len() {
            return false;
        }
        let mut prev: Option<&Centroid> = None;
        for (k, e) in &self.by_value {
            if *k != e.key() || !self.by_loss.contains(&(key(e.loss), *k)) {
                return false;
            }
            let expected = match prev {
                Some(p) => loss(p, &e.centroid),
                None => f64::INFINITY,
            };
            if key(expected) != key(e.loss) {
                return false;
            }
            prev = Some(&e.centroid);
        }
        true
    }
}
