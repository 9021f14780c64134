use ndarray::{ArrayView1, ArrayViewMut1};
use ndarray_stats::QuantileExt;

/// NUE curves whose maximum stays at or below this are fractions, not percentages.
pub const FRACTION_THRESHOLD: f64 = 1.5;

/// Rescale a fractional NUE series to percent in place. Returns `true` when rescaled.
pub fn normalize_nue(nue: &mut [f64]) -> bool {
    let max = *ArrayView1::from(&*nue).max_skipnan();
    if max <= FRACTION_THRESHOLD {
        ArrayViewMut1::from(nue).mapv_inplace(|v| v * 100.0);
        true
    } else {
        false
    }
}
