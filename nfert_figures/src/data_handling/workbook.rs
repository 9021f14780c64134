// src/data_handling/workbook.rs
// -----------------------------------------------------------------------------
// Sheet sources: spreadsheet workbooks through calamine, plain CSV through polars.
// Every sheet comes back as a DataFrame; numeric columns are Float64, everything
// else is String, empty cells are nulls.
// -----------------------------------------------------------------------------

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use calamine::{open_workbook_auto, Data as Cell, Reader};
use polars::prelude::*;
use tracing::debug;

use crate::helper_functions::read_csv;
use crate::models::{polars_err, SheetSource};

/// `.xlsx` / `.xlsm` / `.xls` / `.ods` workbook, reopened per read.
pub struct ExcelWorkbook {
    pub path: PathBuf,
}

/// A single CSV file exposed as one sheet named after its file stem.
pub struct CsvTable {
    pub path: PathBuf,
}

/// Pick a reader by file extension; anything that is not `.csv` goes to calamine.
pub fn open_sheet_source(path: &Path) -> Box<dyn SheetSource> {
    let is_csv = path
        .extension()
        .and_then(|e| e.to_str())
        .map_or(false, |s| s.eq_ignore_ascii_case("csv"));
    if is_csv {
        Box::new(CsvTable { path: path.to_path_buf() })
    } else {
        Box::new(ExcelWorkbook { path: path.to_path_buf() })
    }
}

// ─── ExcelWorkbook ───────────────────────────────────────────────────────────

fn cell_to_string(cell: &Cell) -> String {
    match cell {
        Cell::String(s) => s.clone(),
        Cell::Empty => String::new(),
        Cell::Bool(b) => b.to_string(),
        Cell::Error(e) => format!("ERR({e:?})"),
        Cell::Float(n) => n.to_string(),
        Cell::Int(i) => i.to_string(),
        Cell::DateTime(dt) => dt.to_string(),
        Cell::DateTimeIso(s) | Cell::DurationIso(s) => s.clone(),
    }
}

fn cell_to_f64(cell: &Cell) -> Option<f64> {
    match cell {
        Cell::Float(n) => Some(*n),
        Cell::Int(i) => Some(*i as f64),
        _ => None,
    }
}

/// Blank headers become `Unnamed: i`, repeated ones get `.1`, `.2`, ... suffixes.
fn dedup_headers(raw: Vec<String>) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    raw.into_iter()
        .enumerate()
        .map(|(i, h)| {
            let base = if h.trim().is_empty() { format!("Unnamed: {i}") } else { h };
            let count = seen.entry(base.clone()).or_insert(0);
            let name = if *count == 0 { base.clone() } else { format!("{base}.{count}") };
            *count += 1;
            name
        })
        .collect()
}

/// Numeric when every non-empty cell is a number, text otherwise.
fn cells_to_column(header: &str, cells: &[&Cell]) -> Column {
    let name = PlSmallStr::from(header);
    let numeric = cells
        .iter()
        .all(|c| matches!(c, Cell::Empty | Cell::Float(_) | Cell::Int(_)));
    if numeric {
        let values: Vec<Option<f64>> = cells.iter().map(|c| cell_to_f64(c)).collect();
        Series::new(name, values).into()
    } else {
        let values: Vec<Option<String>> = cells
            .iter()
            .map(|c| match c {
                Cell::Empty => None,
                other => Some(cell_to_string(other)),
            })
            .collect();
        Series::new(name, values).into()
    }
}

impl SheetSource for ExcelWorkbook {
    fn sheet_names(&self) -> PolarsResult<Vec<String>> {
        let wb = open_workbook_auto(&self.path)
            .map_err(|e| polars_err(format!("cannot open {}: {e}", self.path.display()).into()))?;
        Ok(wb.sheet_names().to_vec())
    }

    fn read_sheet(&self, name: &str) -> PolarsResult<DataFrame> {
        let mut wb = open_workbook_auto(&self.path)
            .map_err(|e| polars_err(format!("cannot open {}: {e}", self.path.display()).into()))?;
        let range = wb
            .worksheet_range(name)
            .map_err(|e| polars_err(format!("worksheet '{name}': {e}").into()))?;

        let mut rows = range.rows();
        let headers = match rows.next() {
            Some(header_row) => dedup_headers(header_row.iter().map(cell_to_string).collect()),
            None => return Ok(DataFrame::empty()),
        };
        debug!("Sheet '{}' header = {:?}", name, headers);

        let mut cols: Vec<Vec<&Cell>> = vec![Vec::with_capacity(range.height()); headers.len()];
        for row in rows {
            for (i, cell) in row.iter().enumerate().take(headers.len()) {
                cols[i].push(cell);
            }
        }

        let columns: Vec<Column> = headers
            .iter()
            .zip(cols.iter())
            .map(|(h, c)| cells_to_column(h, c))
            .collect();

        DataFrame::new(columns)
    }
}

// ─── CsvTable ────────────────────────────────────────────────────────────────

impl CsvTable {
    fn stem(&self) -> String {
        self.path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("Sheet1")
            .to_string()
    }
}

impl SheetSource for CsvTable {
    fn sheet_names(&self) -> PolarsResult<Vec<String>> {
        if !self.path.exists() {
            return Err(polars_err(format!("{} not found", self.path.display()).into()));
        }
        Ok(vec![self.stem()])
    }

    fn read_sheet(&self, name: &str) -> PolarsResult<DataFrame> {
        if name != self.stem() {
            return Err(polars_err(format!("worksheet '{name}' missing").into()));
        }
        read_csv(&self.path.to_string_lossy())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn headers_are_named_and_deduplicated() {
        let raw = vec!["NUE".to_string(), "".to_string(), "NUE".to_string(), "NUE".to_string()];
        assert_eq!(dedup_headers(raw), vec!["NUE", "Unnamed: 1", "NUE.1", "NUE.2"]);
    }

    #[test]
    fn numeric_cells_become_float_column() {
        let cells = [Cell::Int(10), Cell::Empty, Cell::Float(2.5)];
        let refs: Vec<&Cell> = cells.iter().collect();
        let col = cells_to_column("N-Fert", &refs);
        assert_eq!(col.dtype(), &DataType::Float64);
        let values: Vec<Option<f64>> = col.f64().unwrap().into_iter().collect();
        assert_eq!(values, vec![Some(10.0), None, Some(2.5)]);
    }

    #[test]
    fn mixed_cells_become_string_column() {
        let cells = [Cell::String("Vientiane".into()), Cell::Float(3.0), Cell::Empty];
        let refs: Vec<&Cell> = cells.iter().collect();
        let col = cells_to_column("pname", &refs);
        assert_eq!(col.dtype(), &DataType::String);
        assert_eq!(col.null_count(), 1);
    }

    #[test]
    fn csv_file_is_a_single_sheet() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("province_rates.csv");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "pname,fer_amount_mean").unwrap();
        writeln!(f, "Attapeu,61.2").unwrap();

        let source = open_sheet_source(&path);
        assert_eq!(source.sheet_names().unwrap(), vec!["province_rates".to_string()]);
        let df = source.read_sheet("province_rates").unwrap();
        assert_eq!(df.height(), 1);
        assert!(source.read_sheet("Sheet2").is_err());
    }

    #[test]
    fn missing_workbook_is_an_error() {
        let source = open_sheet_source(Path::new("/definitely/not/here.xlsx"));
        assert!(source.sheet_names().is_err());
    }

    #[test]
    fn xlsx_sheets_keep_order_types_and_headers() {
        use super::xlsx_fixture::{write_xlsx, Value::*};

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("provinces.xlsx");
        write_xlsx(
            &path,
            &[
                (
                    "Vientiane",
                    vec![
                        vec![Text("N-Fert"), Blank, Text("NUE"), Text("NUE"), Text("note")],
                        vec![Number(0.0), Number(1.0), Number(35.0), Number(0.35), Text("base")],
                        vec![Number(40.0), Number(2.0), Blank, Number(0.42), Number(3.0)],
                    ],
                ),
                ("Bokeo", vec![vec![Text("pname")]]),
            ],
        );

        let source = open_sheet_source(&path);
        assert_eq!(source.sheet_names().unwrap(), vec!["Vientiane", "Bokeo"]);

        let df = source.read_sheet("Vientiane").unwrap();
        assert_eq!(df.get_column_names_str(), vec!["N-Fert", "Unnamed: 1", "NUE", "NUE.1", "note"]);
        assert_eq!(df.height(), 2);

        let nue = df.column("NUE").unwrap();
        assert_eq!(nue.dtype(), &DataType::Float64);
        let values: Vec<Option<f64>> = nue.f64().unwrap().into_iter().collect();
        assert_eq!(values, vec![Some(35.0), None]);

        let note = df.column("note").unwrap();
        assert_eq!(note.dtype(), &DataType::String);
        let notes: Vec<Option<&str>> = note.str().unwrap().into_iter().collect();
        assert_eq!(notes, vec![Some("base"), Some("3")]);

        let header_only = source.read_sheet("Bokeo").unwrap();
        assert_eq!((header_only.width(), header_only.height()), (1, 0));
        assert!(source.read_sheet("Attapeu").is_err());
    }
}
