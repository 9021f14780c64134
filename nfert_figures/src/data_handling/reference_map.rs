use std::collections::HashMap;
use std::path::Path;

use polars::prelude::*;
use tracing::{debug, info, warn};

use crate::data_handling::workbook::open_sheet_source;
use crate::helper_functions::column_as_f64;
use crate::models::{ReferenceMap, SheetSource};

const NAME_COLUMN: &str = "pname";
const VALUE_COLUMNS: [&str; 2] = ["fer_amount_mean", "fer_amount"];

/// Load the province → local practice N rate table.
///
/// Never fails: an unreadable file or a file without a usable
/// `pname` + `fer_amount_mean`/`fer_amount` pair yields an empty map and a warning.
pub fn load_reference_map(path: &Path) -> ReferenceMap {
    let source = open_sheet_source(path);
    let map = reference_map_from_source(source.as_ref());
    if map.is_empty() {
        warn!("No local practice rates loaded from '{}'", path.display());
    } else {
        info!("Loaded {} local practice rates from '{}'", map.len(), path.display());
    }
    map
}

pub fn reference_map_from_source(source: &dyn SheetSource) -> ReferenceMap {
    let sheet_names = match source.sheet_names() {
        Ok(names) => names,
        Err(e) => {
            warn!("Cannot open local practice table: {}", e);
            return ReferenceMap::default();
        }
    };

    let mut rows: Vec<(String, f64)> = Vec::new();
    let mut matched_sheets = 0usize;

    for sheet in &sheet_names {
        let df = match source.read_sheet(sheet) {
            Ok(df) => df,
            Err(e) => {
                debug!("Skipping sheet '{}': {}", sheet, e);
                continue;
            }
        };
        match rows_from_sheet(&df) {
            Ok(Some(sheet_rows)) => {
                matched_sheets += 1;
                rows.extend(sheet_rows);
            }
            Ok(None) => debug!("Sheet '{}' has no pname/fer_amount pair", sheet),
            Err(e) => debug!("Skipping sheet '{}': {}", sheet, e),
        }
    }

    if matched_sheets == 0 {
        warn!("No valid '{}' + '{}' columns found", NAME_COLUMN, VALUE_COLUMNS.join("/"));
        return ReferenceMap::default();
    }

    // later rows overwrite earlier ones
    let mut map = ReferenceMap::default();
    for (name, value) in rows {
        map.insert(name, value);
    }
    map
}

/// `Ok(None)` when the sheet does not carry both columns.
fn rows_from_sheet(df: &DataFrame) -> PolarsResult<Option<Vec<(String, f64)>>> {
    let by_lower: HashMap<String, String> = df
        .get_column_names()
        .iter()
        .map(|c| (c.trim().to_lowercase(), c.to_string()))
        .collect();

    let name_col = by_lower.get(NAME_COLUMN);
    let value_col = VALUE_COLUMNS.iter().find_map(|v| by_lower.get(*v));
    let (Some(name_col), Some(value_col)) = (name_col, value_col) else {
        return Ok(None);
    };

    let names = df.column(name_col)?.cast(&DataType::String)?;
    let values = column_as_f64(df, value_col)?;

    let rows = names
        .str()?
        .into_iter()
        .zip(values)
        .filter_map(|(name, value)| match (name, value) {
            (Some(n), Some(v)) => Some((n.trim().to_string(), v)),
            _ => None,
        })
        .collect();
    Ok(Some(rows))
}
