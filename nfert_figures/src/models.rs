use std::collections::HashMap;
use std::fmt;

use polars::error::PolarsError;
use polars::frame::DataFrame;
use polars::prelude::PolarsResult;
use serde::Serialize;

/// Wrap any foreign error as a polars compute error so it can travel through `PolarsResult`.
pub fn polars_err(err: Box<dyn std::error::Error + Send + Sync>) -> PolarsError {
    PolarsError::ComputeError(err.to_string().into())
}

/// Anything that can hand out named sheets as data frames (a workbook, a CSV file, ...).
pub trait SheetSource {
    fn sheet_names(&self) -> PolarsResult<Vec<String>>;
    fn read_sheet(&self, name: &str) -> PolarsResult<DataFrame>;
}

/// The four columns a province sheet must provide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnRole {
    NFert,
    Nue,
    Benefit,
    Yield,
}

impl ColumnRole {
    pub const ALL: [ColumnRole; 4] = [
        ColumnRole::NFert,
        ColumnRole::Nue,
        ColumnRole::Benefit,
        ColumnRole::Yield,
    ];

    /// Accepted header variants, tried in order.
    pub fn variants(self) -> &'static [&'static str] {
        match self {
            ColumnRole::NFert => &["N-Fert", "N_Fert", "Nfert", "N Fert"],
            ColumnRole::Nue => &["NUE_sim", "NUE"],
            ColumnRole::Benefit => &["B_sim", "Benefit"],
            ColumnRole::Yield => &["Yield_sim", "Yield"],
        }
    }

    /// Column name used once the role has been pulled out of the sheet.
    pub fn key(self) -> &'static str {
        match self {
            ColumnRole::NFert => "n_fert",
            ColumnRole::Nue => "nue",
            ColumnRole::Benefit => "benefit",
            ColumnRole::Yield => "yield",
        }
    }
}

impl fmt::Display for ColumnRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ColumnRole::NFert => "N-Fert",
            ColumnRole::Nue => "NUE",
            ColumnRole::Benefit => "Benefit",
            ColumnRole::Yield => "Yield",
        };
        write!(f, "{s}")
    }
}

/// One province worth of cleaned curves, sorted by N rate.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionSeries {
    pub region: String,
    pub n_fert: Vec<f64>,
    pub nue: Vec<f64>,
    pub benefit: Vec<f64>,
    pub yield_kg: Vec<f64>,
}

impl RegionSeries {
    pub fn len(&self) -> usize {
        self.n_fert.len()
    }

    pub fn is_empty(&self) -> bool {
        self.n_fert.is_empty()
    }
}

/// Result of pulling a province out of its sheet.
#[derive(Debug, Clone, PartialEq)]
pub enum PanelOutcome {
    Ready(RegionSeries),
    MissingColumns { missing: Vec<ColumnRole> },
    NoData,
}

/// Province → local practice N rate (kg/ha).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReferenceMap(pub HashMap<String, f64>);

impl std::ops::Deref for ReferenceMap {
    type Target = HashMap<String, f64>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl std::ops::DerefMut for ReferenceMap {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl ReferenceMap {
    pub fn rate_for(&self, region: &str) -> Option<f64> {
        self.0.get(region.trim()).copied()
    }
}

/// Everything the grid renderer needs for a drawable panel.
#[derive(Debug, Clone)]
pub struct PlotPanel {
    pub series: RegionSeries,
    pub nue_rescaled: bool,
    pub max_benefit_rate: f64,
    pub local_practice_rate: Option<f64>,
}

#[derive(Debug, Clone)]
pub enum Panel {
    Plot(PlotPanel),
    Placeholder { region: String, message: &'static str },
}

impl Panel {
    pub fn region(&self) -> &str {
        match self {
            Panel::Plot(p) => &p.series.region,
            Panel::Placeholder { region, .. } => region,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RegressionResult {
    pub slope: f64,
    pub intercept: f64,
    pub r2: f64,
    pub mae: f64,
    pub rmse: f64,
    pub n: usize,
}
