//! Debounced local-maxima detection over centroid counts.
//!
//! A single ascending pass keeps two sliding windows of `smoothing` centroids:
//! `left` trails the scan position, `right` leads it. The centroid that just
//! crossed from `right` into `left` is the *boundary*. Once both windows are
//! full, their summed counts are compared (equal widths, so sums order the same
//! way as means):
//! - `right > left` → rising, `right < left` → falling, equal → trend unchanged.
//! - Every boundary is folded into the open candidate (`start`, `end`, `min`,
//!   `max`, `sum` of counts).
//! - rising → falling marks the candidate as a peak.
//! - falling → rising closes it at the valley; a peak is emitted, and a new
//!   candidate opens at that same valley centroid.
//! - A peak still open when the scan ends is emitted too.
//!
//! With fewer than `2 · smoothing` centroids both windows never fill, so no
//! peaks are reported. This is a cheap debounced detector, not exact mode finding.

use std::cmp::Ordering;
use std::collections::{btree_map, VecDeque};

use serde::{Deserialize, Serialize};

use crate::histogram::centroids::Centroid;
use crate::histogram::index::{CentroidEntry, Key};
use crate::histogram::Histogram;
use crate::{HistError, HistResult};

pub const DEFAULT_SMOOTHING: usize = 3;

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Peak {
    /// Value of the first boundary centroid in the run.
    pub start: f64,
    /// Value of the last boundary centroid in the run.
    pub end: f64,
    pub min: u64,
    pub max: u64,
    pub sum: u64,
}

impl Peak {
    fn open(c: &Centroid) -> Self {
        Peak {
            start: c.value,
            end: c.value,
            min: c.count,
            max: c.count,
            sum: c.count,
        }
    }

    fn extend(&mut self, c: &Centroid) {
        self.end = c.value;
        self.min = self.min.min(c.count);
        self.max = self.max.max(c.count);
        self.sum += c.count;
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Trend {
    Rising,
    Falling,
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    peak: Peak,
    crested: bool,
}

/// Count-only sliding window.
#[derive(Debug, Clone, Default)]
struct Window {
    items: VecDeque<Centroid>,
    sum: u64,
}

impl Window {
    fn push(&mut self, c: Centroid) {
        self.sum += c.count;
        self.items.push_back(c);
    }

    fn pop(&mut self) -> Option<Centroid> {
        let c = self.items.pop_front()?;
        self.sum -= c.count;
        Some(c)
    }

    fn len(&self) -> usize {
        self.items.len()
    }
}

/// Lazy peak scan; see the module docs. Created by [`Histogram::peaks`].
#[derive(Debug, Clone)]
pub struct Peaks<'a> {
    source: btree_map::Values<'a, Key, CentroidEntry>,
    smoothing: usize,
    left: Window,
    right: Window,
    trend: Option<Trend>,
    candidate: Option<Candidate>,
    finished: bool,
}

impl<'a> Peaks<'a> {
    /// Process one centroid; returns a peak if this step closed one.
    fn step(&mut self, c: Centroid) -> Option<Peak> {
        self.right.push(c);
        if self.right.len() <= self.smoothing {
            return None;
        }
        let boundary = self.right.pop()?;
        self.left.push(boundary);
        if self.left.len() > self.smoothing {
            self.left.pop();
        }
        if self.left.len() < self.smoothing {
            return None;
        }

        match self.candidate.as_mut() {
            Some(cand) => cand.peak.extend(&boundary),
            None => {
                self.candidate = Some(Candidate {
                    peak: Peak::open(&boundary),
                    crested: false,
                })
            }
        }

        let now = match self.right.sum.cmp(&self.left.sum) {
            Ordering::Greater => Trend::Rising,
            Ordering::Less => Trend::Falling,
            Ordering::Equal => return None,
        };
        let before = self.trend.replace(now);
        match (before, now) {
            (Some(Trend::Rising), Trend::Falling) => {
                if let Some(cand) = self.candidate.as_mut() {
                    cand.crested = true;
                }
                None
            }
            (Some(Trend::Falling), Trend::Rising) => {
                let closed = self.candidate.replace(Candidate {
                    peak: Peak::open(&boundary),
                    crested: false,
                });
                closed.filter(|c| c.crested).map(|c| c.peak)
            }
            _ => None,
        }
    }
}

impl<'a> Iterator for Peaks<'a> {
    type Item = Peak;

    fn next(&mut self) -> Option<Peak> {
        if self.finished {
            return None;
        }
        while let Some(e) = self.source.next() {
            if let Some(p) = self.step(e.centroid) {
                return Some(p);
            }
        }
        self.finished = true;
        self.candidate
            .take()
            .filter(|c| c.crested)
            .map(|c| c.peak)
    }
}

impl std::iter::FusedIterator for Peaks<'_> {}

impl Histogram {
    /// Scan for count peaks, debounced over `smoothing` centroids on each side.
    ///
    /// Each call starts a fresh scan. `smoothing` must be `>= 1`.
    pub fn peaks(&self, smoothing: usize) -> HistResult<Peaks<'_>> {
        if smoothing == 0 {
            return Err(HistError::InvalidArgument {
                context: "smoothing must be >= 1",
            });
        }
        Ok(Peaks {
            source: self.index().values(),
            smoothing,
            left: Window::default(),
            right: Window::default(),
            trend: None,
            candidate: None,
            finished: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::histogram::test_helpers::assert_exact;

    fn from_profile(counts: &[u64]) -> Histogram {
        let mut h = Histogram::new(counts.len().max(1)).unwrap();
        for (i, &c) in counts.iter().enumerate() {
            for _ in 0..c {
                h.add(i as f64).unwrap();
            }
        }
        h
    }

    #[test]
    fn unimodal_profile_yields_one_peak() {
        let h = from_profile(&[1, 2, 3, 4, 5, 4, 3, 2, 1]);
        let peaks: Vec<Peak> = h.peaks(1).unwrap().collect();
        assert_eq!(peaks.len(), 1);
        let p = peaks[0];
        assert_exact("start", 0.0, p.start);
        assert_exact("end", 7.0, p.end);
        assert_eq!((p.min, p.max), (1, 5));
        assert_eq!(p.sum, 24);
    }

    #[test]
    fn bimodal_profile_splits_at_the_valley() {
        let h = from_profile(&[1, 3, 6, 3, 1, 3, 6, 3, 1]);
        let peaks: Vec<Peak> = h.peaks(1).unwrap().collect();
        assert_eq!(peaks.len(), 2);
        assert_exact("first start", 0.0, peaks[0].start);
        assert_exact("valley", 4.0, peaks[0].end);
        assert_exact("second start", 4.0, peaks[1].start);
        assert_exact("second end", 7.0, peaks[1].end);
        assert!(peaks.iter().all(|p| p.max == 6 && p.min == 1));
    }

    #[test]
    fn monotone_and_short_inputs_have_no_peaks() {
        let rising = from_profile(&[1, 2, 3, 4, 5, 6]);
        assert_eq!(rising.peaks(1).unwrap().count(), 0);

        let short = from_profile(&[1, 5, 1]);
        assert_eq!(short.peaks(2).unwrap().count(), 0);

        let empty = Histogram::new(4).unwrap();
        assert_eq!(empty.peaks(DEFAULT_SMOOTHING).unwrap().count(), 0);
    }

    #[test]
    fn zero_smoothing_is_rejected() {
        let h = from_profile(&[1, 2, 1]);
        assert!(h.peaks(0).is_err());
    }

    #[test]
    fn scans_are_restartable() {
        let h = from_profile(&[1, 2, 3, 4, 5, 4, 3, 2, 1]);
        let a: Vec<Peak> = h.peaks(1).unwrap().collect();
        let b: Vec<Peak> = h.peaks(1).unwrap().collect();
        assert_eq!(a, b);
    }
}
