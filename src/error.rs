// src/error.rs
use core::fmt;

/// Library-wide error for gr-histogram.
///
/// Every failure is detected before the histogram is mutated, so an `Err`
/// always leaves the histogram exactly as it was.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HistError {
    /// A parameter is outside its domain.
    /// `context` names the parameter (e.g. "max_centroids", "marker quantile").
    InvalidArgument { context: &'static str },

    /// NaN/±inf where a finite number is required.
    NonFiniteInput { context: &'static str },

    /// Requested rank is not addressable (zero, beyond `count`, or empty histogram).
    RankOutOfRange { rank: u64, count: u64 },

    /// No marker is configured at `index`.
    MarkerNotConfigured { index: usize, markers: usize },

    /// The marker exists but has not seen any data yet.
    MarkerEmpty { index: usize },

    /// Internal invariant violation (should never happen).
    Invariant { what: &'static str },
}

impl fmt::Display for HistError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HistError::InvalidArgument { context } => {
                write!(f, "histogram: invalid argument ({})", context)
            }
            HistError::NonFiniteInput { context } => write!(
                f,
                "histogram: non-finite values are not allowed ({}). \
hint: drop NaN/±inf before ingesting",
                context
            ),
            HistError::RankOutOfRange { rank, count } => write!(
                f,
                "histogram: rank {} is out of range (valid ranks are 1..={})",
                rank, count
            ),
            HistError::MarkerNotConfigured { index, markers } => write!(
                f,
                "histogram: no marker at index {} ({} configured)",
                index, markers
            ),
            HistError::MarkerEmpty { index } => {
                write!(f, "histogram: marker {} has no data yet", index)
            }
            HistError::Invariant { what } => {
                write!(f, "histogram: internal invariant violation: {}", what)
            }
        }
    }
}

impl std::error::Error for HistError {}

pub type HistResult<T> = Result<T, HistError>;
