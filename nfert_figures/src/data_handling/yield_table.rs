use polars::prelude::*;
use tracing::{info, warn};

use crate::helper_functions::{column_as_f64, column_names, pick};
use crate::models::{polars_err, SheetSource};

/// Statistical (observed) and modelled yields, pairwise complete.
#[derive(Debug, Clone, PartialEq)]
pub struct YieldPairs {
    pub observed: Vec<f64>,
    pub modelled: Vec<f64>,
}

/// Column names for the observed/modelled pair; exact names win, otherwise fuzzy matching.
fn resolve_column(columns: &[String], wanted: &str) -> PolarsResult<String> {
    if let Some(exact) = columns.iter().find(|c| c.as_str() == wanted) {
        return Ok(exact.clone());
    }
    pick(columns, wanted)
        .map(str::to_string)
        .ok_or_else(|| polars_err(format!("column '{wanted}' not found (have {columns:?})").into()))
}

pub fn load_yield_pairs(
    source: &dyn SheetSource,
    sheet: &str,
    observed_col: &str,
    modelled_col: &str,
) -> PolarsResult<YieldPairs> {
    let df = source.read_sheet(sheet)?;
    yield_pairs_from_frame(&df, observed_col, modelled_col)
}

pub fn yield_pairs_from_frame(
    df: &DataFrame,
    observed_col: &str,
    modelled_col: &str,
) -> PolarsResult<YieldPairs> {
    let columns = column_names(df);
    let x_name = resolve_column(&columns, observed_col)?;
    let y_name = resolve_column(&columns, modelled_col)?;
    info!("Observed yield column: '{}', modelled yield column: '{}'", x_name, y_name);

    let xs = column_as_f64(df, &x_name)?;
    let ys = column_as_f64(df, &y_name)?;

    let mut pairs = YieldPairs { observed: Vec::with_capacity(xs.len()), modelled: Vec::with_capacity(ys.len()) };
    let mut skipped = 0usize;
    for (x, y) in xs.into_iter().zip(ys) {
        match (x, y) {
            (Some(x), Some(y)) => {
                pairs.observed.push(x);
                pairs.modelled.push(y);
            }
            _ => skipped += 1,
        }
    }
    if skipped > 0 {
        warn!("Skipped {} rows with a missing observed or modelled yield", skipped);
    }
    Ok(pairs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::df;

    #[test]
    fn exact_names_are_used_and_gaps_dropped() {
        let df = df![
            "statistical_yield(kg/ha)" => &[Some(3000.0), Some(3500.0), None],
            "modelling yield kg/ha" => &[Some(3100.0), None, Some(4000.0)]
        ].unwrap();
        let pairs = yield_pairs_from_frame(&df, "statistical_yield(kg/ha)", "modelling yield kg/ha").unwrap();
        assert_eq!(pairs.observed, vec![3000.0]);
        assert_eq!(pairs.modelled, vec![3100.0]);
    }

    #[test]
    fn fuzzy_names_are_accepted() {
        let df = df![
            "Statistical Yield (kg/ha)" => &[1.0, 2.0],
            "Modelling-Yield kg/ha" => &[1.5, 2.5]
        ].unwrap();
        let pairs = yield_pairs_from_frame(&df, "statistical_yield", "modelling yield").unwrap();
        assert_eq!(pairs.modelled, vec![1.5, 2.5]);
    }

    #[test]
    fn missing_column_is_fatal() {
        let df = df!["statistical_yield(kg/ha)" => &[1.0]].unwrap();
        assert!(yield_pairs_from_frame(&df, "statistical_yield(kg/ha)", "modelling yield kg/ha").is_err());
    }
}
