use std::path::PathBuf;
use polars::error::PolarsResult;
use polars::frame::DataFrame;
use polars::prelude::{CsvReadOptions, DataType, SerReader};

pub fn read_csv(file_path: &str) -> PolarsResult<DataFrame> {
    CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(PathBuf::from(file_path)))?
        .finish()
}

/// Lower-case and strip whitespace, `-` and `_` so "N-Fert (kg/ha)" and "n_fert" compare equal.
pub fn normalize_column_name(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_whitespace() && *c != '-' && *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

/// First column whose normalized name contains the normalized `like`.
pub fn pick<'a>(columns: &'a [String], like: &str) -> Option<&'a str> {
    let key = normalize_column_name(like);
    columns
        .iter()
        .find(|c| normalize_column_name(c).contains(&key))
        .map(String::as_str)
}

/// Try each variant in order and return the first column that matches.
pub fn pick_any<'a>(columns: &'a [String], variants: &[&str]) -> Option<&'a str> {
    variants.iter().find_map(|v| pick(columns, v))
}

pub fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names().iter().map(|c| c.to_string()).collect()
}

/// Coerce a column to f64; unparsable entries and NaN come back as `None`.
pub fn column_as_f64(df: &DataFrame, name: &str) -> PolarsResult<Vec<Option<f64>>> {
    let casted = df.column(name)?.cast(&DataType::Float64)?;
    let values = casted
        .f64()?
        .into_iter()
        .map(|v| v.filter(|x| !x.is_nan()))
        .collect();
    Ok(values)
}
