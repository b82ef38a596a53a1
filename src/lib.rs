//! Streaming approximate histogram.
//!
//! Raw values are folded into at most `max_centroids` weighted centroids
//! (`value`, `count`, `variance`). When the budget is exceeded the adjacent pair
//! with the smallest merge loss is combined. Optional markers follow fixed
//! quantiles as data arrives. See [`histogram::Histogram`].

mod error;
pub mod histogram;
pub mod quality;

pub use error::{HistError, HistResult};
pub use histogram::{Centroid, Histogram, HistogramBuilder, HistogramOptions, Position};
pub use quality::QualityReport;

#[cfg(target_os = "linux")]
use jemallocator::Jemalloc;

#[global_allocator]
#[cfg(target_os = "linux")]
static ALLOC: Jemalloc = Jemalloc;
