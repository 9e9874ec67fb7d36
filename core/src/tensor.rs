//! Flat f64 helpers shared by tests, benches and callers building inputs.
//!
//! Free functions on row-major slices with explicit dimensions, same as the
//! kernels themselves.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Transpose A[M,K] → out[K,M].
pub fn transpose_f64(a: &[f64], out: &mut [f64], m: usize, k: usize) {
    debug_assert_eq!(a.len(), m * k);
    debug_assert_eq!(out.len(), k * m);

    for i in 0..m {
        for j in 0..k {
            out[j * m + i] = a[i * k + j];
        }
    }
}

/// Largest absolute elementwise difference. Slices must be the same length.
pub fn max_abs_diff(a: &[f64], b: &[f64]) -> f64 {
    debug_assert_eq!(a.len(), b.len());
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).abs())
        .fold(0.0, f64::max)
}

/// Seeded sampler for reproducible weights, gradients and feature ids.
///
/// Same seed, same sequence, on every platform (`StdRng` is a fixed ChaCha
/// stream for a given rand release).
pub struct SampleRng {
    rng: StdRng,
}

impl SampleRng {
    pub fn new(seed: u64) -> Self {
        SampleRng { rng: StdRng::seed_from_u64(seed) }
    }

    /// Uniform in [-scale, scale].
    pub fn uniform(&mut self, scale: f64) -> f64 {
        self.rng.gen_range(-scale..=scale)
    }

    /// Uniform integer in [lo, hi). `hi` must exceed `lo`.
    pub fn range(&mut self, lo: usize, hi: usize) -> usize {
        self.rng.gen_range(lo..hi)
    }

    pub fn fill_uniform(&mut self, buf: &mut [f64], scale: f64) {
        buf.iter_mut().for_each(|v| *v = self.uniform(scale));
    }

    /// Gradient-like buffer: each entry is exactly zero with probability `p_zero`.
    pub fn fill_sparse(&mut self, buf: &mut [f64], scale: f64, p_zero: f64) {
        for v in buf.iter_mut() {
            *v = if self.rng.gen_bool(p_zero) { 0.0 } else { self.uniform(scale) };
        }
    }
}
