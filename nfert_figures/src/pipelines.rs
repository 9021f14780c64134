use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use anyhow::{Context, Result};
use plotters::style::RGBColor;
use serde::Serialize;
use tracing::{info, warn};

use crate::analysis::panels::{build_panels, PanelSummary};
use crate::analysis::regression::{fit_ols, format_equation};
use crate::cli::{GridArgs, YieldArgs};
use crate::data_handling::reference_map::load_reference_map;
use crate::data_handling::workbook::open_sheet_source;
use crate::data_handling::yield_table::load_yield_pairs;
use crate::models::Panel;
use crate::plotting::colors::{average_swatch_hex, parse_hex_color};
use crate::plotting::nue_grid::{render_grid_png, render_grid_svg, GridOptions, GRID_CAPACITY};
use crate::plotting::style::FigureStyle;
use crate::plotting::yield_scatter::{render_yield_png, render_yield_svg, ScatterOptions};

/// A swatch image, when given, overrides the hex colour.
pub fn resolve_maxline_color(hex: &str, swatch: Option<&Path>) -> Result<RGBColor> {
    match swatch {
        Some(path) => parse_hex_color(&average_swatch_hex(path)?),
        None => parse_hex_color(hex),
    }
}

pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), value)
        .with_context(|| format!("writing {}", path.display()))?;
    info!("Wrote summary to {}", path.display());
    Ok(())
}

pub fn grid_summary(panels: &[Panel]) -> Vec<PanelSummary> {
    panels.iter().map(PanelSummary::from).collect()
}

pub fn run_nue_grid(args: &GridArgs, style: &FigureStyle) -> Result<()> {
    info!("Building NUE grid from {}", args.xlsx.display());
    info!("x ticks requested: {:?} (axis ticks stay at 0/40/80/120)", args.x_ticks);

    let reference = load_reference_map(&args.local_nfert_xlsx);
    let maxline_color = resolve_maxline_color(&args.maxline_hex, args.maxline_swatch.as_deref())?;

    let source = open_sheet_source(&args.xlsx);
    let panels = build_panels(source.as_ref(), &reference, GRID_CAPACITY)
        .with_context(|| format!("reading province workbook {}", args.xlsx.display()))?;
    if panels.is_empty() {
        warn!("{} has no sheets, the figure will be blank", args.xlsx.display());
    }
    let drawn = panels.iter().filter(|p| matches!(p, Panel::Plot(_))).count();
    info!("{} panels, {} with data", panels.len(), drawn);

    if let Some(path) = &args.summary_json {
        write_json(path, &grid_summary(&panels))?;
    }

    let opts = GridOptions {
        margins: args.margins(),
        dpi: args.dpi,
        yield_offset: args.yield_offset,
        frame_lw: args.frame_lw,
        province_fontsize: args.province_fontsize,
        maxline_color,
    };
    render_grid_png(&args.out_png, &panels, &opts, style)?;
    render_grid_svg(&args.out_svg, &panels, &opts, style)?;
    Ok(())
}

pub fn run_yield_fit(args: &YieldArgs, style: &FigureStyle) -> Result<()> {
    info!("Fitting modelled against statistical yield from {} [{}]", args.xlsx.display(), args.sheet);

    let source = open_sheet_source(&args.xlsx);
    let pairs = load_yield_pairs(source.as_ref(), &args.sheet, &args.x_column, &args.y_column)
        .with_context(|| format!("reading yield table {}", args.xlsx.display()))?;
    let fit = fit_ols(&pairs.observed, &pairs.modelled)?;
    info!(
        "{}  R² = {:.3}  MAE = {:.2}  RMSE = {:.2}  (n = {})",
        format_equation(&fit),
        fit.r2,
        fit.mae,
        fit.rmse,
        fit.n
    );

    if let Some(path) = &args.summary_json {
        write_json(path, &fit)?;
    }

    let opts = ScatterOptions { season: args.season.clone(), axis_max: args.axis_max, dpi: args.dpi };
    render_yield_png(&args.out_png, &pairs, &fit, &opts, style)?;
    render_yield_svg(&args.out_svg, &pairs, &fit, &opts, style)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Args, Command};
    use crate::data_handling::workbook::xlsx_fixture::{write_xlsx, Value::*};
    use crate::models::{PlotPanel, RegionSeries};
    use clap::Parser;
    use image::{Rgba, RgbaImage};

    #[test]
    fn swatch_wins_over_hex() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("swatch.png");
        RgbaImage::from_pixel(2, 2, Rgba([10, 20, 30, 255])).save(&path).unwrap();

        assert_eq!(resolve_maxline_color("#E60000", None).unwrap(), RGBColor(230, 0, 0));
        assert_eq!(resolve_maxline_color("#E60000", Some(&path)).unwrap(), RGBColor(10, 20, 30));
    }

    #[test]
    fn bad_colour_or_swatch_is_fatal() {
        assert!(resolve_maxline_color("#GG0000", None).is_err());
        assert!(resolve_maxline_color("#E60000", Some(Path::new("/no/such/swatch.png"))).is_err());
    }

    #[test]
    fn summary_json_lists_every_panel() {
        let panels = vec![
            Panel::Plot(PlotPanel {
                series: RegionSeries {
                    region: "Oudomxay".into(),
                    n_fert: vec![0.0, 60.0],
                    nue: vec![30.0, 45.0],
                    benefit: vec![5.0, 40.0],
                    yield_kg: vec![2600.0, 3500.0],
                },
                nue_rescaled: false,
                max_benefit_rate: 60.0,
                local_practice_rate: None,
            }),
            Panel::Placeholder { region: "Phongsaly".into(), message: "No data" },
        ];
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.json");
        write_json(&path, &grid_summary(&panels)).unwrap();

        let parsed: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        let rows = parsed.as_array().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["region"], "Oudomxay");
        assert_eq!(rows[0]["max_benefit_rate"], 60.0);
        assert_eq!(rows[1]["status"], "No data");
        assert!(rows[1]["local_practice_rate"].is_null());
    }

    #[test]
    fn grid_command_runs_from_workbooks() {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("data.xlsx");
        let rates = dir.path().join("rates.xlsx");
        write_xlsx(
            &data,
            &[
                (
                    "Luang Prabang",
                    vec![
                        vec![Text("N-Fert"), Text("NUE"), Text("Benefit"), Text("Yield")],
                        vec![Number(0.0), Number(0.31), Number(0.0), Number(2700.0)],
                        vec![Number(60.0), Number(0.44), Number(160.0), Number(3800.0)],
                        vec![Number(120.0), Number(0.29), Number(95.0), Number(4200.0)],
                    ],
                ),
                ("Xaisomboun", vec![vec![Text("N-Fert"), Text("NUE")]]),
            ],
        );
        write_xlsx(
            &rates,
            &[("Sheet1", vec![vec![Text("pname"), Text("fer_amount_mean")], vec![Text("Luang Prabang"), Number(52.0)]])],
        );

        let out = |name: &str| dir.path().join(name).to_string_lossy().into_owned();
        let args = Args::parse_from([
            "nfert_figures".to_string(),
            "nue-grid".to_string(),
            format!("--xlsx={}", data.display()),
            format!("--local-nfert-xlsx={}", rates.display()),
            format!("--out-png={}", out("grid.png")),
            format!("--out-svg={}", out("grid.svg")),
            format!("--summary-json={}", out("grid.json")),
            "--dpi=20".to_string(),
        ]);
        let Command::NueGrid(grid) = args.command else { panic!("expected nue-grid") };
        run_nue_grid(&grid, &FigureStyle::default()).unwrap();

        assert!(std::fs::metadata(out("grid.png")).unwrap().len() > 0);
        assert!(std::fs::read_to_string(out("grid.svg")).unwrap().contains("Luang Prabang"));
        let summary: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(out("grid.json")).unwrap()).unwrap();
        assert_eq!(summary[0]["max_benefit_rate"], 60.0);
        assert_eq!(summary[0]["local_practice_rate"], 52.0);
        assert_eq!(summary[0]["nue_rescaled"], true);
        assert_eq!(summary[1]["status"], "Missing columns");
    }

    #[test]
    fn yield_command_runs_from_a_workbook() {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("WS-0513.xlsx");
        let mut rows = vec![vec![Text("statistical_yield(kg/ha)"), Text("modelling yield kg/ha")]];
        for i in 0..12 {
            let x = 2800.0 + 150.0 * i as f64;
            rows.push(vec![Number(x), Number(0.8 * x + 400.0 + if i % 3 == 0 { 90.0 } else { -45.0 })]);
        }
        rows.push(vec![Number(3000.0), Blank]);
        write_xlsx(&data, &[("Sheet1", rows)]);

        let out = |name: &str| dir.path().join(name).to_string_lossy().into_owned();
        let args = Args::parse_from([
            "nfert_figures".to_string(),
            "yield-fit".to_string(),
            format!("--xlsx={}", data.display()),
            format!("--out-png={}", out("fit.png")),
            format!("--out-svg={}", out("fit.svg")),
            format!("--summary-json={}", out("fit.json")),
            "--dpi=30".to_string(),
        ]);
        let Command::YieldFit(fit_args) = args.command else { panic!("expected yield-fit") };
        run_yield_fit(&fit_args, &FigureStyle::default()).unwrap();

        let fit: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(out("fit.json")).unwrap()).unwrap();
        assert_eq!(fit["n"], 12);
        assert!(fit["r2"].as_f64().unwrap() > 0.9);
        assert!(std::fs::metadata(out("fit.png")).unwrap().len() > 0);
        assert!(std::fs::metadata(out("fit.svg")).unwrap().len() > 0);
    }
}
