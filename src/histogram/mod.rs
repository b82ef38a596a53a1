// Opt-in tracing (cheap unless env var set)
#[macro_export]
macro_rules! htrace {
    ($($arg:tt)*) => {
        if std::env::var_os("HISTOGRAM_TRACE").is_some() {
            eprintln!($($arg)*);
        }
    }
}

pub mod centroids;
pub mod iter;
pub mod peaks;
pub mod quantile;
pub mod rank;
pub mod test_helpers;

// Internal building blocks
mod histogram;
mod index;
mod markers;

// Public surface
pub use centroids::{compute_loss, Centroid};
pub use histogram::{Histogram, HistogramBuilder, HistogramOptions, DEFAULT_MAX_CENTROIDS};
pub use index::CentroidEntry;
pub use iter::{Centroids, Criteria};
pub use peaks::{Peak, Peaks, DEFAULT_SMOOTHING};
pub use quantile::{infer_value_from_offset, Position};
