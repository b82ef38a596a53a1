//! histogram-testdata
//! Synthetic streams shared by benches and tests.
//! Continuous shapes are squashed into \[0,1]; discrete shapes produce
//! integer-valued samples so repeated values exercise the increment path.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};

/// Available synthetic distributions.
#[derive(Clone, Copy, Debug)]
pub enum DistKind {
    /// Uniform in \[0,1)
    Uniform,
    /// Gaussian mapped to \[0,1]
    Normal,
    /// Log-normal-ish: exp(N(0, σ²)) squashed to \[0,1]
    LogNormal { sigma: f64 },
    /// Two separated Gaussian humps (around 0.25 and 0.75)
    Bimodal,
    /// Integers in `0..levels`, heavily repeated
    Discrete { levels: u32 },
}

/// Generate `n` samples for the chosen distribution, in stream (unsorted) order.
pub fn gen_dataset(kind: DistKind, n: usize, seed: u64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut out = Vec::with_capacity(n);

    match kind {
        DistKind::Uniform => {
            for _ in 0..n {
                out.push(rng.random::<f64>());
            }
        }
        DistKind::Normal => {
            let normal = Normal::new(0.0, 1.0).unwrap();
            for _ in 0..n {
                let z: f64 = normal.sample(&mut rng);
                out.push((0.5 + 0.2 * z).clamp(0.0, 1.0));
            }
        }
        DistKind::LogNormal { sigma } => {
            let normal = Normal::new(0.0, 1.0).unwrap();
            for _ in 0..n {
                let z: f64 = normal.sample(&mut rng);
                let x = (sigma * z).exp();
                let y = x / (1.0 + x);
                out.push(y.clamp(0.0, 1.0));
            }
        }
        DistKind::Bimodal => {
            let left = Normal::new(0.25, 0.05).unwrap();
            let right = Normal::new(0.75, 0.05).unwrap();
            for _ in 0..n {
                let x: f64 = if rng.random_bool(0.5) {
                    left.sample(&mut rng)
                } else {
                    right.sample(&mut rng)
                };
                out.push(x.clamp(0.0, 1.0));
            }
        }
        DistKind::Discrete { levels } => {
            let levels = levels.max(1);
            for _ in 0..n {
                out.push(rng.random_range(0..levels) as f64);
            }
        }
    }
    out
}

/// Expand a count profile into a raw stream: value `i` repeated `counts[i]` times.
///
/// With `shuffle_seed` the stream is shuffled so distinct values arrive interleaved.
pub fn stream_from_profile(counts: &[u64], shuffle_seed: Option<u64>) -> Vec<f64> {
    let mut out = Vec::with_capacity(counts.iter().sum::<u64>() as usize);
    for (i, &c) in counts.iter().enumerate() {
        out.extend(std::iter::repeat_n(i as f64, c as usize));
    }
    if let Some(seed) = shuffle_seed {
        let mut rng = StdRng::seed_from_u64(seed);
        out.shuffle(&mut rng);
    }
    out
}
