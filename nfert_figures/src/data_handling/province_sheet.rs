use polars::prelude::*;
use tracing::debug;

use crate::helper_functions::{column_as_f64, column_names, pick_any};
use crate::models::{ColumnRole, PanelOutcome, RegionSeries};

/// Resolve every role to a column of `df`; the `Err` side lists the roles that found nothing.
pub fn match_roles(df: &DataFrame) -> Result<Vec<(ColumnRole, String)>, Vec<ColumnRole>> {
    let columns = column_names(df);
    let mut found = Vec::with_capacity(ColumnRole::ALL.len());
    let mut missing = Vec::new();
    for role in ColumnRole::ALL {
        match pick_any(&columns, role.variants()) {
            Some(col) => found.push((role, col.to_string())),
            None => missing.push(role),
        }
    }
    if missing.is_empty() { Ok(found) } else { Err(missing) }
}

/// Pull one province's curves out of its sheet.
///
/// Rows with a gap in any of the four columns are dropped and the rest sorted by N rate.
pub fn extract_region(region: &str, df: &DataFrame) -> PolarsResult<PanelOutcome> {
    let matched = match match_roles(df) {
        Ok(m) => m,
        Err(missing) => return Ok(PanelOutcome::MissingColumns { missing }),
    };
    debug!("{}: matched columns {:?}", region, matched);

    let mut columns = Vec::with_capacity(matched.len());
    for (role, source_col) in &matched {
        let values = column_as_f64(df, source_col)?;
        columns.push(Column::from(Series::new(PlSmallStr::from(role.key()), values)));
    }

    let clean = DataFrame::new(columns)?
        .drop_nulls::<String>(None)?
        .sort(
            [ColumnRole::NFert.key()],
            SortMultipleOptions::default().with_maintain_order(true),
        )?;

    if clean.height() == 0 {
        return Ok(PanelOutcome::NoData);
    }

    let take = |role: ColumnRole| -> PolarsResult<Vec<f64>> {
        Ok(clean.column(role.key())?.f64()?.into_no_null_iter().collect())
    };

    Ok(PanelOutcome::Ready(RegionSeries {
        region: region.to_string(),
        n_fert: take(ColumnRole::NFert)?,
        nue: take(ColumnRole::Nue)?,
        benefit: take(ColumnRole::Benefit)?,
        yield_kg: take(ColumnRole::Yield)?,
    }))
}
