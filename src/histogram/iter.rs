//! Ordered centroid cursors.
//!
//! `ascending`/`descending` return a lazy iterator over live centroids. The
//! start position comes from optional [`Criteria`]:
//! - `value`: ascending starts at the first centroid `>= value`, descending at
//!   the last centroid `<= value`;
//! - `marker_index`: start at the centroid the marker currently sits on
//!   (inclusive); an unpopulated marker yields an empty sequence;
//! - no criteria: first (ascending) or last (descending) centroid.
//!
//! The cursor borrows the histogram, so it cannot be held across a mutation.
//! Every call builds a fresh cursor.

use std::collections::btree_map;
use std::iter::FusedIterator;

use serde::{Deserialize, Serialize};

use crate::histogram::centroids::Centroid;
use crate::histogram::index::{key, CentroidEntry, Key};
use crate::histogram::Histogram;
use crate::{HistError, HistResult};

/// Start position for [`Histogram::ascending`] / [`Histogram::descending`].
/// Exactly one field must be set.
#[derive(Debug, Copy, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Criteria {
    #[serde(default)]
    pub marker_index: Option<usize>,
    #[serde(default)]
    pub value: Option<f64>,
}

impl Criteria {
    #[inline]
    pub fn value(v: f64) -> Self {
        Criteria {
            marker_index: None,
            value: Some(v),
        }
    }

    #[inline]
    pub fn marker(index: usize) -> Self {
        Criteria {
            marker_index: Some(index),
            value: None,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Direction {
    Ascending,
    Descending,
}

/// Lazy centroid sequence in one direction.
#[derive(Debug, Clone)]
pub struct Centroids<'a> {
    range: Option<btree_map::Range<'a, Key, CentroidEntry>>,
    direction: Direction,
}

impl<'a> Iterator for Centroids<'a> {
    type Item = Centroid;

    #[inline]
    fn next(&mut self) -> Option<Centroid> {
        let range = self.range.as_mut()?;
        let next = match self.direction {
            Direction::Ascending => range.next(),
            Direction::Descending => range.next_back(),
        };
        next.map(|(_, e)| e.centroid)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        match &self.range {
            Some(r) => r.size_hint(),
            None => (0, Some(0)),
        }
    }
}

impl FusedIterator for Centroids<'_> {}

/// Where a cursor starts, once criteria are resolved.
enum Start {
    Edge,
    At(Key),
    Nowhere,
}

impl Histogram {
    /// Centroids in ascending value order.
    pub fn ascending(&self, criteria: Option<Criteria>) -> HistResult<Centroids<'_>> {
        self.cursor(criteria, Direction::Ascending)
    }

    /// Centroids in descending value order.
    pub fn descending(&self, criteria: Option<Criteria>) -> HistResult<Centroids<'_>> {
        self.cursor(criteria, Direction::Descending)
    }

    fn cursor(&self, criteria: Option<Criteria>, direction: Direction) -> HistResult<Centroids<'_>> {
        let range = match self.resolve_start(criteria)? {
            Start::Nowhere => None,
            Start::Edge => Some(self.index().all()),
            Start::At(k) => Some(match direction {
                Direction::Ascending => self.index().range_from(k),
                Direction::Descending => self.index().range_to(k),
            }),
        };
        Ok(Centroids { range, direction })
    }

    fn resolve_start(&self, criteria: Option<Criteria>) -> HistResult<Start> {
        let Some(c) = criteria else {
            return Ok(Start::Edge);
        };
        match (c.marker_index, c.value) {
            (Some(_), Some(_)) => Err(HistError::InvalidArgument {
                context: "criteria must set only one of marker_index and value",
            }),
            (None, None) => Err(HistError::InvalidArgument {
                context: "criteria must set marker_index or value",
            }),
            (None, Some(v)) => {
                if v.is_nan() {
                    return Err(HistError::InvalidArgument {
                        context: "criteria value must not be NaN",
                    });
                }
                Ok(Start::At(key(v)))
            }
            (Some(i), None) => match self.marker_set().state(i) {
                Ok(st) => Ok(Start::At(st.key)),
                Err(HistError::MarkerEmpty { .. }) => Ok(Start::Nowhere),
                Err(e) => Err(e),
            },
        }
    }
}
