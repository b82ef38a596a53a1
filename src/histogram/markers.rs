//! Live quantile markers.
//!
//! A marker follows one target quantile `q` as data arrives, so reading it is
//! `O(1)` instead of a scan. Each populated marker holds:
//! - `rank`: the 1-based raw position it currently tracks,
//! - `key`: the value of the centroid holding that position,
//! - `offset`: the position inside that centroid (`0 ≤ offset < count`).
//!
//! Markers refer to centroids by key, never by reference. When compression
//! replaces two centroids with one, the engine calls [`MarkerSet::on_merge`]
//! and every marker on either input is re-pointed explicitly.
//!
//! Maintenance runs once per *newly created* centroid. Repeats of an existing
//! value only grow a centroid in place and leave markers alone, so markers can
//! lag under heavy repetition.

use crate::histogram::index::{Key, TwinIndex};
use crate::{HistError, HistResult};

#[derive(Debug, Copy, Clone, PartialEq)]
pub(crate) struct MarkerState {
    pub(crate) rank: u64,
    pub(crate) key: Key,
    pub(crate) offset: u64,
}

#[derive(Debug, Copy, Clone, PartialEq)]
struct Marker {
    quantile: f64,
    state: Option<MarkerState>,
}

impl Marker {
    /// Ideal 1-based rank for this quantile over `count` observations.
    #[inline]
    fn target_rank(&self, count: u64) -> u64 {
        (self.quantile * count.saturating_sub(1) as f64).round() as u64 + 1
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct MarkerSet {
    markers: Vec<Marker>,
}

impl MarkerSet {
    pub(crate) fn new(quantiles: &[f64]) -> HistResult<Self> {
        let mut markers = Vec::with_capacity(quantiles.len());
        for &q in quantiles {
            if q.is_nan() || !(0.0..=1.0).contains(&q) {
                return Err(HistError::InvalidArgument {
                    context: "marker quantile must be within [0, 1]",
                });
            }
            markers.push(Marker {
                quantile: q,
                state: None,
            });
        }
        Ok(MarkerSet { markers })
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.markers.len()
    }

    pub(crate) fn quantiles(&self) -> Vec<f64> {
        self.markers.iter().map(|m| m.quantile).collect()
    }

    pub(crate) fn state(&self, index: usize) -> HistResult<MarkerState> {
        let m = self
            .markers
            .get(index)
            .ok_or(HistError::MarkerNotConfigured {
                index,
                markers: self.markers.len(),
            })?;
        m.state.ok_or(HistError::MarkerEmpty { index })
    }

    /// React to a newly created centroid at `inserted` holding `added` raw values.
    ///
    /// `count` is the histogram total *after* the insertion. Each marker first
    /// shifts its rank when the new values land below it, then walks toward its
    /// ideal rank one raw position at a time. A single `add` moves at most one
    /// position; batch ingestion may move several.
    pub(crate) fn on_insert(&mut self, index: &TwinIndex, inserted: Key, added: u64, count: u64) {
        for marker in &mut self.markers {
            let mut st = match marker.state {
                Some(st) => st,
                None => match index.first() {
                    Some(first) => MarkerState {
                        rank: 1,
                        key: first.key(),
                        offset: 0,
                    },
                    None => continue,
                },
            };

            if inserted < st.key {
                st.rank += added;
            }

            let target = marker.target_rank(count);
            while st.rank < target {
                if !step_forward(index, &mut st) {
                    break;
                }
            }
            while st.rank > target {
                if !step_back(index, &mut st) {
                    break;
                }
            }
            marker.state = Some(st);
        }
    }

    /// Re-point markers after `prior` and `min` were merged into `merged`.
    ///
    /// `prior`'s raw values come first in the merged bucket, so its markers keep
    /// their offset; markers on `min` shift by `prior_count`.
    pub(crate) fn on_merge(&mut self, prior: Key, min: Key, merged: Key, prior_count: u64) {
        for st in self.markers.iter_mut().filter_map(|m| m.state.as_mut()) {
            if st.key == prior {
                st.key = merged;
            } else if st.key == min {
                st.key = merged;
                st.offset += prior_count;
            }
        }
    }
}

/// Advance one raw position; `false` if already on the last observation.
fn step_forward(index: &TwinIndex, st: &mut MarkerState) -> bool {
    let Some(cur) = index.get(st.key) else {
        debug_assert!(false, "marker points at a dead centroid");
        return false;
    };
    if st.offset + 1 < cur.centroid.count {
        st.offset += 1;
    } else if let Some(next) = index.next(st.key) {
        st.key = next.key();
        st.offset = 0;
    } else {
        return false;
    }
    st.rank += 1;
    true
}

/// Retreat one raw position; `false` if already on the first observation.
fn step_back(index: &TwinIndex, st: &mut MarkerState) -> bool {
    if st.offset > 0 {
        st.offset -= 1;
    } else if let Some(prev) = index.prior(st.key) {
        st.key = prev.key();
        st.offset = prev.centroid.count - 1;
    } else {
        return false;
    }
    st.rank -= 1;
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::histogram::centroids::Centroid;
    use crate::histogram::index::{key, CentroidEntry};

    fn index_of(counts: &[(f64, u64)]) -> TwinIndex {
        let mut ix = TwinIndex::default();
        for &(v, c) in counts {
            // Loss values are irrelevant to marker walking.
            ix.upsert(CentroidEntry {
                centroid: Centroid::new(v, c, 0.0),
                loss: v,
            });
        }
        ix
    }

    #[test]
    fn rejects_quantiles_outside_unit_interval() {
        assert!(MarkerSet::new(&[0.0, 0.5, 1.0]).is_ok());
        assert!(MarkerSet::new(&[1.5]).is_err());
        assert!(MarkerSet::new(&[-0.1]).is_err());
        assert!(MarkerSet::new(&[f64::NAN]).is_err());
    }

    #[test]
    fn target_rank_is_one_based_and_rounded() {
        let m = Marker {
            quantile: 0.5,
            state: None,
        };
        assert_eq!(m.target_rank(1), 1);
        assert_eq!(m.target_rank(100), 51);
        assert_eq!(m.target_rank(101), 51);
    }

    #[test]
    fn lookup_failures_are_distinguished() {
        let set = MarkerSet::new(&[0.5]).unwrap();
        assert_eq!(set.state(0), Err(HistError::MarkerEmpty { index: 0 }));
        assert_eq!(
            set.state(3),
            Err(HistError::MarkerNotConfigured {
                index: 3,
                markers: 1
            })
        );
    }

    #[test]
    fn steps_walk_within_and_across_centroids() {
        let ix = index_of(&[(1.0, 2), (2.0, 1)]);
        let mut st = MarkerState {
            rank: 1,
            key: key(1.0),
            offset: 0,
        };
        assert!(step_forward(&ix, &mut st));
        assert_eq!((st.rank, st.key, st.offset), (2, key(1.0), 1));
        assert!(step_forward(&ix, &mut st));
        assert_eq!((st.rank, st.key, st.offset), (3, key(2.0), 0));
        assert!(!step_forward(&ix, &mut st));

        assert!(step_back(&ix, &mut st));
        assert_eq!((st.rank, st.key, st.offset), (2, key(1.0), 1));
        assert!(step_back(&ix, &mut st));
        assert!(!step_back(&ix, &mut st));
        assert_eq!(st.rank, 1);
    }

    #[test]
    fn merge_repoints_both_inputs() {
        let mut set = MarkerSet::new(&[0.0, 1.0]).unwrap();
        set.markers[0].state = Some(MarkerState {
            rank: 1,
            key: key(1.0),
            offset: 1,
        });
        set.markers[1].state = Some(MarkerState {
            rank: 4,
            key: key(2.0),
            offset: 0,
        });
        set.on_merge(key(1.0), key(2.0), key(1.4), 3);

        assert_eq!(set.markers[0].state.unwrap().key, key(1.4));
        assert_eq!(set.markers[0].state.unwrap().offset, 1);
        assert_eq!(set.markers[1].state.unwrap().key, key(1.4));
        assert_eq!(set.markers[1].state.unwrap().offset, 3);
    }
}
