use ndarray::ArrayView1;
use ndarray_stats::QuantileExt;

use crate::models::ReferenceMap;

/// N rate at which benefit peaks; the first peak wins on ties, NaN entries are ignored.
pub fn max_benefit_rate(n_fert: &[f64], benefit: &[f64]) -> Option<f64> {
    let idx = ArrayView1::from(benefit).argmax_skipnan().ok()?;
    n_fert.get(idx).copied()
}

/// Integer label for a reference line (ties round to even).
pub fn display_rate(rate: f64) -> i64 {
    rate.round_ties_even() as i64
}

pub fn local_practice_rate(region: &str, reference: &ReferenceMap) -> Option<f64> {
    reference.rate_for(region)
}
