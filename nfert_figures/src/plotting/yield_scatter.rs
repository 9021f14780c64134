//! Observed vs modelled yield scatter with marginal density histograms.

use std::path::Path;

use anyhow::{Context, Result};
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters_bitmap::BitMapBackend;
use plotters_svg::SVGBackend;
use tracing::info;

use crate::analysis::density::{density_histogram, gaussian_kde, Bin};
use crate::analysis::regression::format_equation;
use crate::data_handling::yield_table::YieldPairs;
use crate::models::RegressionResult;
use crate::plotting::colors::parse_hex_color;
use crate::plotting::layout::{font_px, pt_to_px};
use crate::plotting::nue_grid::figure_pixels;
use crate::plotting::style::FigureStyle;

pub const FIGURE_INCHES: (f64, f64) = (8.0, 8.0);
pub const HISTOGRAM_BINS: usize = 20;
pub const KDE_POINTS: usize = 200;
pub const KDE_CUT: f64 = 3.0;

pub struct ScatterOptions {
    pub season: String,
    pub axis_max: f64,
    pub dpi: f64,
}

/// Legend lines for the fit, in display order.
pub fn fit_legend_lines(fit: &RegressionResult) -> Vec<String> {
    vec![
        format!("R² = {:.2}", fit.r2),
        format_equation(fit),
        format!("MAE = {:.2} kg/ha", fit.mae),
        format!("RMSE = {:.2} kg/ha", fit.rmse),
    ]
}

/// Bins clipped to `0..=axis_max`; bins falling entirely outside are dropped.
fn clip_bins(bins: &[Bin], axis_max: f64) -> Vec<Bin> {
    bins.iter()
        .filter_map(|b| {
            let lo = b.lo.max(0.0);
            let hi = b.hi.min(axis_max);
            (lo < hi).then_some(Bin { lo, hi, density: b.density })
        })
        .collect()
}

fn density_top(bins: &[Bin], kde: &[(f64, f64)]) -> f64 {
    let peak = bins
        .iter()
        .map(|b| b.density)
        .chain(kde.iter().map(|(_, d)| *d))
        .filter(|d| d.is_finite())
        .fold(0.0, f64::max);
    if peak > 0.0 { peak * 1.05 } else { 1.0 }
}

pub fn draw_yield_figure<DB>(
    root: &DrawingArea<DB, Shift>,
    pairs: &YieldPairs,
    fit: &RegressionResult,
    opts: &ScatterOptions,
    style: &FigureStyle,
) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    root.fill(&WHITE)?;
    let scatter_color = parse_hex_color(&style.scatter_color)?;
    let hist_color = parse_hex_color(&style.histogram_color)?;

    let (w, h) = root.dim_in_pixel();
    let (top_row, lower) = root.split_vertically(h / 4);
    let (top_hist, _corner) = top_row.split_horizontally(w * 3 / 4);
    let (main_area, right_hist) = lower.split_horizontally(w * 3 / 4);

    let font_size = font_px(style.yield_fit_font_size, opts.dpi);
    let font = (style.font_family.as_str(), font_size).into_font();
    let margin = (font_size * 0.8).round() as u32;
    let left_px = (font_size * 5.0).round() as u32;
    let bottom_px = (font_size * 3.5).round() as u32;
    let line_px = pt_to_px(1.5, opts.dpi);
    let axis_max = opts.axis_max;

    // ── main scatter ────────────────────────────────────────────────────────
    let mut chart = ChartBuilder::on(&main_area)
        .margin(margin)
        .x_label_area_size(bottom_px)
        .y_label_area_size(left_px)
        .build_cartesian_2d(0f64..axis_max, 0f64..axis_max)?;

    let tick_fmt = |v: &f64| format!("{v:.0}");
    chart
        .configure_mesh()
        .x_desc(format!("Statistical yield - {} (kg/ha)", opts.season))
        .y_desc(format!("Modelling yield - {} (kg/ha)", opts.season))
        .axis_desc_style(font.clone())
        .label_style(font.clone())
        .x_label_formatter(&tick_fmt)
        .y_label_formatter(&tick_fmt)
        .light_line_style(TRANSPARENT)
        .bold_line_style(BLACK.mix(0.1))
        .draw()?;

    let radius = pt_to_px(3.0, opts.dpi);
    let legend = fit_legend_lines(fit);

    chart
        .draw_series(
            pairs
                .observed
                .iter()
                .zip(&pairs.modelled)
                .map(|(&x, &y)| Circle::new((x, y), radius, scatter_color.filled())),
        )?
        .label(legend[0].as_str())
        .legend(move |(x, y)| Circle::new((x + 10, y), radius, scatter_color.filled()));
    for line in &legend[1..] {
        chart
            .draw_series(std::iter::empty::<Circle<(f64, f64), u32>>())?
            .label(line.as_str())
            .legend(|(x, y)| EmptyElement::at((x, y)));
    }

    let x_lo = pairs.observed.iter().copied().fold(f64::INFINITY, f64::min);
    let x_hi = pairs.observed.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let predict = |x: f64| fit.slope * x + fit.intercept;
    chart
        .draw_series(LineSeries::new(
            vec![(x_lo, predict(x_lo)), (x_hi, predict(x_hi))],
            BLACK.stroke_width(line_px),
        ))?
        .label("Fit line")
        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLACK.stroke_width(line_px)));

    chart
        .draw_series(DashedLineSeries::new(
            vec![(0.0, 0.0), (axis_max, axis_max)],
            pt_to_px(3.7, opts.dpi),
            pt_to_px(1.6, opts.dpi),
            RED.stroke_width(line_px),
        ))?
        .label("1:1 line")
        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], RED.stroke_width(line_px)));

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .label_font(font.clone())
        .position(SeriesLabelPosition::UpperLeft)
        .draw()?;

    // ── marginals ───────────────────────────────────────────────────────────
    let x_bins = clip_bins(&density_histogram(&pairs.observed, HISTOGRAM_BINS), axis_max);
    let x_kde: Vec<(f64, f64)> = gaussian_kde(&pairs.observed, KDE_POINTS, KDE_CUT)
        .into_iter()
        .filter(|(v, _)| *v >= 0.0 && *v <= axis_max)
        .collect();
    let mut top = ChartBuilder::on(&top_hist)
        .margin(margin)
        .y_label_area_size(left_px)
        .build_cartesian_2d(0f64..axis_max, 0f64..density_top(&x_bins, &x_kde))?;
    top.draw_series(
        x_bins
            .iter()
            .map(|b| Rectangle::new([(b.lo, 0.0), (b.hi, b.density)], hist_color.filled())),
    )?;
    top.draw_series(DashedLineSeries::new(
        x_kde,
        pt_to_px(3.7, opts.dpi),
        pt_to_px(1.6, opts.dpi),
        RED.stroke_width(line_px),
    ))?;

    let y_bins = clip_bins(&density_histogram(&pairs.modelled, HISTOGRAM_BINS), axis_max);
    let y_kde: Vec<(f64, f64)> = gaussian_kde(&pairs.modelled, KDE_POINTS, KDE_CUT)
        .into_iter()
        .filter(|(v, _)| *v >= 0.0 && *v <= axis_max)
        .map(|(v, d)| (d, v))
        .collect();
    let y_density_max = density_top(&y_bins, &[]).max(
        y_kde.iter().map(|(d, _)| *d).fold(0.0, f64::max) * 1.05,
    );
    let mut right = ChartBuilder::on(&right_hist)
        .margin(margin)
        .x_label_area_size(bottom_px)
        .build_cartesian_2d(0f64..y_density_max, 0f64..axis_max)?;
    right.draw_series(
        y_bins
            .iter()
            .map(|b| Rectangle::new([(0.0, b.lo), (b.density, b.hi)], hist_color.filled())),
    )?;
    right.draw_series(DashedLineSeries::new(
        y_kde,
        pt_to_px(3.7, opts.dpi),
        pt_to_px(1.6, opts.dpi),
        RED.stroke_width(line_px),
    ))?;

    Ok(())
}

pub fn render_yield_png(
    path: &Path,
    pairs: &YieldPairs,
    fit: &RegressionResult,
    opts: &ScatterOptions,
    style: &FigureStyle,
) -> Result<()> {
    let root = BitMapBackend::new(path, figure_pixels(FIGURE_INCHES, opts.dpi)).into_drawing_area();
    draw_yield_figure(&root, pairs, fit, opts, style)?;
    root.present().with_context(|| format!("writing {}", path.display()))?;
    info!("Saved {}", path.display());
    Ok(())
}

pub fn render_yield_svg(
    path: &Path,
    pairs: &YieldPairs,
    fit: &RegressionResult,
    opts: &ScatterOptions,
    style: &FigureStyle,
) -> Result<()> {
    let root = SVGBackend::new(path, figure_pixels(FIGURE_INCHES, opts.dpi)).into_drawing_area();
    draw_yield_figure(&root, pairs, fit, opts, style)?;
    root.present().with_context(|| format!("writing {}", path.display()))?;
    info!("Saved {}", path.display());
    Ok(())
}
