//! Marginal distributions for the yield scatter: density histograms and a Gaussian KDE.

use statrs::distribution::{Continuous, Normal};
use statrs::statistics::Statistics;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bin {
    pub lo: f64,
    pub hi: f64,
    pub density: f64,
}

/// Equal-width bins over `[min, max]` normalized so the bar areas sum to one.
/// The last bin is closed on the right; a constant sample gets a unit-wide range around it.
pub fn density_histogram(values: &[f64], bins: usize) -> Vec<Bin> {
    if values.is_empty() || bins == 0 {
        return Vec::new();
    }
    let mut lo = values.iter().cloned().fold(f64::INFINITY, f64::min);
    let mut hi = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    if lo == hi {
        lo -= 0.5;
        hi += 0.5;
    }
    let width = (hi - lo) / bins as f64;

    let mut counts = vec![0usize; bins];
    for &v in values {
        let idx = (((v - lo) / width) as usize).min(bins - 1);
        counts[idx] += 1;
    }

    let total = values.len() as f64;
    counts
        .into_iter()
        .enumerate()
        .map(|(i, c)| Bin {
            lo: lo + i as f64 * width,
            hi: lo + (i + 1) as f64 * width,
            density: c as f64 / (total * width),
        })
        .collect()
}

/// Scott's rule: `σ · n^(-1/5)` with the sample standard deviation.
pub fn scott_bandwidth(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let bw = values.std_dev() * (values.len() as f64).powf(-0.2);
    (bw.is_finite() && bw > 0.0).then_some(bw)
}

/// Gaussian KDE evaluated on `grid_points` points spanning `cut` bandwidths past the data.
/// Empty when the sample is degenerate.
pub fn gaussian_kde(values: &[f64], grid_points: usize, cut: f64) -> Vec<(f64, f64)> {
    let Some(bw) = scott_bandwidth(values) else {
        return Vec::new();
    };
    if grid_points < 2 {
        return Vec::new();
    }
    let kernel = Normal::standard();
    let lo = values.iter().cloned().fold(f64::INFINITY, f64::min) - cut * bw;
    let hi = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max) + cut * bw;
    let step = (hi - lo) / (grid_points - 1) as f64;
    let norm = values.len() as f64 * bw;

    (0..grid_points)
        .map(|i| {
            let at = lo + i as f64 * step;
            let d: f64 = values.iter().map(|&v| kernel.pdf((at - v) / bw)).sum();
            (at, d / norm)
        })
        .collect()
}
