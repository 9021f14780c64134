//! Turn province sheets into render-ready panels.

use polars::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::analysis::normalize::normalize_nue;
use crate::analysis::reference_point::{display_rate, local_practice_rate, max_benefit_rate};
use crate::data_handling::province_sheet::extract_region;
use crate::models::{ColumnRole, Panel, PanelOutcome, PlotPanel, ReferenceMap, SheetSource};

pub const MISSING_COLUMNS: &str = "Missing columns";
pub const NO_DATA: &str = "No data";

/// Normalize and annotate one extracted province.
pub fn prepare_panel(region: &str, outcome: PanelOutcome, reference: &ReferenceMap) -> Panel {
    let mut series = match outcome {
        PanelOutcome::Ready(series) => series,
        PanelOutcome::MissingColumns { missing } => {
            let names: Vec<String> = missing.iter().map(ColumnRole::to_string).collect();
            warn!("{}: missing columns {}", region, names.join(", "));
            return Panel::Placeholder { region: region.to_string(), message: MISSING_COLUMNS };
        }
        PanelOutcome::NoData => {
            warn!("{}: no complete rows", region);
            return Panel::Placeholder { region: region.to_string(), message: NO_DATA };
        }
    };

    let nue_rescaled = normalize_nue(&mut series.nue);
    if nue_rescaled {
        debug!("{}: NUE looks fractional, scaled to percent", region);
    }

    // the series is non-empty here, so a peak always exists
    let max_benefit_rate = max_benefit_rate(&series.n_fert, &series.benefit).unwrap_or(f64::NAN);
    let local_practice_rate = local_practice_rate(region, reference);

    info!(
        "{}: {} rows, max benefit at {} kg/ha, local practice {}",
        region,
        series.len(),
        display_rate(max_benefit_rate),
        local_practice_rate.map_or_else(|| "n/a".to_string(), |v| format!("{v:.0} kg/ha"))
    );

    Panel::Plot(PlotPanel { series, nue_rescaled, max_benefit_rate, local_practice_rate })
}

/// Read, extract and prepare up to `limit` sheets in workbook order.
pub fn build_panels(
    source: &dyn SheetSource,
    reference: &ReferenceMap,
    limit: usize,
) -> PolarsResult<Vec<Panel>> {
    let sheet_names = source.sheet_names()?;
    if sheet_names.len() > limit {
        warn!(
            "Workbook has {} sheets, only the first {} fit in the grid",
            sheet_names.len(),
            limit
        );
    }

    sheet_names
        .iter()
        .take(limit)
        .map(|name| {
            let df = source.read_sheet(name)?;
            let outcome = extract_region(name, &df)?;
            Ok(prepare_panel(name, outcome, reference))
        })
        .collect()
}

/// Per-panel record written with `--summary-json`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PanelSummary {
    pub region: String,
    pub status: &'static str,
    pub rows: usize,
    pub nue_rescaled: bool,
    pub max_benefit_rate: Option<f64>,
    pub local_practice_rate: Option<f64>,
}

impl From<&Panel> for PanelSummary {
    fn from(panel: &Panel) -> Self {
        match panel {
            Panel::Plot(p) => PanelSummary {
                region: p.series.region.clone(),
                status: "ok",
                rows: p.series.len(),
                nue_rescaled: p.nue_rescaled,
                max_benefit_rate: Some(p.max_benefit_rate),
                local_practice_rate: p.local_practice_rate,
            },
            Panel::Placeholder { region, message } => PanelSummary {
                region: region.clone(),
                status: *message,
                rows: 0,
                nue_rescaled: false,
                max_benefit_rate: None,
                local_practice_rate: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RegionSeries;
    use polars::df;

    fn series(nue: Vec<f64>) -> RegionSeries {
        RegionSeries {
            region: "Champasak".into(),
            n_fert: vec![0.0, 60.0, 120.0],
            nue,
            benefit: vec![10.0, 50.0, 30.0],
            yield_kg: vec![2500.0, 3800.0, 4100.0],
        }
    }

    #[test]
    fn ready_panel_is_normalized_and_annotated() {
        let mut reference = ReferenceMap::default();
        reference.insert("Champasak".into(), 72.0);
        let panel = prepare_panel("Champasak", PanelOutcome::Ready(series(vec![0.2, 0.4, 0.3])), &reference);
        let Panel::Plot(p) = panel else { panic!("expected a plot panel") };
        assert!(p.nue_rescaled);
        assert_eq!(p.series.nue, vec![20.0, 40.0, 30.0]);
        assert_eq!(p.max_benefit_rate, 60.0);
        assert_eq!(p.local_practice_rate, Some(72.0));
    }

    #[test]
    fn soft_failures_become_placeholders() {
        let reference = ReferenceMap::default();
        let missing = prepare_panel(
            "Xekong",
            PanelOutcome::MissingColumns { missing: vec![ColumnRole::Benefit] },
            &reference,
        );
        assert!(matches!(missing, Panel::Placeholder { message: MISSING_COLUMNS, .. }));
        let empty = prepare_panel("Xekong", PanelOutcome::NoData, &reference);
        assert!(matches!(empty, Panel::Placeholder { message: NO_DATA, .. }));
        assert_eq!(PanelSummary::from(&empty).status, NO_DATA);
    }

    struct MemorySheets(Vec<(String, DataFrame)>);

    impl SheetSource for MemorySheets {
        fn sheet_names(&self) -> PolarsResult<Vec<String>> {
            Ok(self.0.iter().map(|(n, _)| n.clone()).collect())
        }
        fn read_sheet(&self, name: &str) -> PolarsResult<DataFrame> {
            self.0
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, df)| df.clone())
                .ok_or_else(|| PolarsError::ComputeError("no such sheet".into()))
        }
    }

    #[test]
    fn panels_follow_sheet_order_and_limit() {
        let good = df![
            "N_Fert" => &[0.0, 40.0],
            "NUE_sim" => &[35.0, 42.0],
            "Benefit" => &[-5.0, 12.0],
            "Yield_sim" => &[2400.0, 3100.0]
        ].unwrap();
        let broken = df!["N_Fert" => &[0.0]].unwrap();
        let source = MemorySheets(vec![
            ("Vientiane".into(), good.clone()),
            ("Bokeo".into(), broken),
            ("Attapeu".into(), good),
        ]);

        let panels = build_panels(&source, &ReferenceMap::default(), 2).unwrap();
        assert_eq!(panels.len(), 2);
        assert_eq!(panels[0].region(), "Vientiane");
        assert!(matches!(panels[1], Panel::Placeholder { message: MISSING_COLUMNS, .. }));

        let summary = PanelSummary::from(&panels[0]);
        assert_eq!(summary.max_benefit_rate, Some(40.0));
        assert!(!summary.nue_rescaled);
    }

    #[test]
    fn workbook_sheets_become_panels_in_order() {
        use crate::data_handling::workbook::open_sheet_source;
        use crate::data_handling::workbook::xlsx_fixture::{write_xlsx, Value::*};

        let header = || vec![Text("N_Fert"), Text("NUE_sim"), Text("B_sim"), Text("Yield_sim")];
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.xlsx");
        write_xlsx(
            &path,
            &[
                (
                    "Vientiane",
                    vec![
                        header(),
                        vec![Number(80.0), Number(30.0), Blank, Number(3900.0)],
                        vec![Number(40.0), Number(42.0), Number(12.0), Number(3100.0)],
                        vec![Number(0.0), Number(35.0), Number(-5.0), Number(2400.0)],
                    ],
                ),
                ("Bokeo", vec![vec![Text("N_Fert")], vec![Number(0.0)]]),
                ("Attapeu", vec![header(), vec![Number(0.0), Number(0.3), Number(0.0), Number(2500.0)]]),
            ],
        );

        let mut reference = ReferenceMap::default();
        reference.insert("Attapeu".into(), 48.0);
        let panels = build_panels(open_sheet_source(&path).as_ref(), &reference, 30).unwrap();

        let regions: Vec<&str> = panels.iter().map(Panel::region).collect();
        assert_eq!(regions, vec!["Vientiane", "Bokeo", "Attapeu"]);

        let Panel::Plot(first) = &panels[0] else { panic!("expected a plot panel") };
        assert_eq!(first.series.n_fert, vec![0.0, 40.0]);
        assert_eq!(first.max_benefit_rate, 40.0);
        assert!(matches!(panels[1], Panel::Placeholder { message: MISSING_COLUMNS, .. }));

        let Panel::Plot(last) = &panels[2] else { panic!("expected a plot panel") };
        assert!(last.nue_rescaled);
        assert_eq!(last.local_practice_rate, Some(48.0));
    }
}
