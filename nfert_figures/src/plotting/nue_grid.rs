//! The province grid: NUE, benefit and yield against N rate, one panel per sheet.

use std::ops::Range;
use std::path::Path;

use anyhow::{Context, Result};
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use plotters_backend::BackendCoord;
use plotters_bitmap::BitMapBackend;
use plotters_svg::SVGBackend;
use tracing::{debug, info};

use crate::analysis::reference_point::display_rate;
use crate::models::{Panel, PlotPanel};
use crate::plotting::colors::parse_hex_color;
use crate::plotting::layout::{font_px, pt_to_px, AxesBox, GridLayout, Margins};
use crate::plotting::style::FigureStyle;

pub const GRID_ROWS: usize = 6;
pub const GRID_COLS: usize = 5;
pub const GRID_CAPACITY: usize = GRID_ROWS * GRID_COLS;
/// Figure size in inches.
pub const FIGURE_INCHES: (f64, f64) = (26.0, 28.0);

const X_RANGE: (f64, f64) = (0.0, 120.0);
const X_TICKS: [f64; 4] = [0.0, 40.0, 80.0, 120.0];
const NUE_TICKS: [f64; 4] = [0.0, 40.0, 80.0, 120.0];
const BENEFIT_TICKS: [f64; 3] = [-200.0, 0.0, 200.0];
const BENEFIT_BOTTOM: f64 = -500.0;
const YIELD_TICKS: [f64; 2] = [2000.0, 4000.0];
const YIELD_BOTTOM: f64 = 2000.0;
const TICK_LEN_PT: f64 = 3.5;

pub struct GridOptions {
    pub margins: Margins,
    pub dpi: f64,
    /// Yield spine position as a fraction of the axes width.
    pub yield_offset: f64,
    /// Frame width in points.
    pub frame_lw: f64,
    pub province_fontsize: f64,
    pub maxline_color: RGBColor,
}

impl GridOptions {
    pub fn layout(&self) -> GridLayout {
        GridLayout {
            figure: figure_pixels(FIGURE_INCHES, self.dpi),
            rows: GRID_ROWS,
            cols: GRID_COLS,
            margins: self.margins,
        }
    }
}

pub fn figure_pixels(inches: (f64, f64), dpi: f64) -> (u32, u32) {
    ((inches.0 * dpi).round() as u32, (inches.1 * dpi).round() as u32)
}

struct SeriesColors {
    nue: RGBColor,
    benefit: RGBColor,
    yield_kg: RGBColor,
    local_practice: RGBColor,
}

impl SeriesColors {
    fn from_style(style: &FigureStyle) -> Result<Self> {
        Ok(Self {
            nue: parse_hex_color(&style.nue_color)?,
            benefit: parse_hex_color(&style.benefit_color)?,
            yield_kg: parse_hex_color(&style.yield_color)?,
            local_practice: parse_hex_color(&style.local_practice_color)?,
        })
    }
}

fn finite_extent(values: &[f64]) -> Option<(f64, f64)> {
    values
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

/// Data extent padded by 5 % on both sides, widened so every tick is inside.
pub fn padded_range(values: &[f64], ticks: &[f64]) -> (f64, f64) {
    let (mut lo, mut hi) = match finite_extent(values) {
        Some((lo, hi)) => {
            let pad = 0.05 * (hi - lo);
            (lo - pad, hi + pad)
        }
        None => (f64::INFINITY, f64::NEG_INFINITY),
    };
    for &t in ticks {
        lo = lo.min(t);
        hi = hi.max(t);
    }
    if !lo.is_finite() || !hi.is_finite() {
        return (0.0, 1.0);
    }
    if lo < hi { (lo, hi) } else { (lo - 0.5, hi + 0.5) }
}

/// Range pinned at `bottom` whose top sits 5 % of the span above the data maximum.
pub fn range_from_bottom(values: &[f64], bottom: f64) -> (f64, f64) {
    let top = finite_extent(values).map_or(f64::NEG_INFINITY, |(_, hi)| hi + 0.05 * (hi - bottom));
    if top > bottom { (bottom, top) } else { (bottom, bottom + 1.0) }
}

pub fn ticks_within(ticks: &[f64], range: (f64, f64)) -> Vec<f64> {
    ticks.iter().copied().filter(|t| *t >= range.0 && *t <= range.1).collect()
}

fn in_view(x: f64) -> bool {
    x >= X_RANGE.0 && x <= X_RANGE.1
}

fn visible_points(x: &[f64], y: &[f64]) -> Vec<(f64, f64)> {
    x.iter().copied().zip(y.iter().copied()).filter(|(x, _)| in_view(*x)).collect()
}

fn axes_point(frame: &(Range<i32>, Range<i32>), fx: f64, fy: f64) -> BackendCoord {
    let (xs, ys) = frame;
    let w = (xs.end - xs.start) as f64;
    let h = (ys.end - ys.start) as f64;
    (xs.start + (fx * w).round() as i32, ys.end - (fy * h).round() as i32)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TickSide {
    Bottom,
    Left,
    Right,
}

/// Tick segment, label anchor and label alignment for a tick whose foot is `at`.
/// Ticks point outwards and the label sits one tick length beyond the tip.
fn tick_geometry(side: TickSide, at: BackendCoord, len: i32) -> ([BackendCoord; 2], BackendCoord, Pos) {
    let (x, y) = at;
    match side {
        TickSide::Bottom => ([at, (x, y + len)], (x, y + 2 * len), Pos::new(HPos::Center, VPos::Top)),
        TickSide::Left => ([at, (x - len, y)], (x - 2 * len, y), Pos::new(HPos::Right, VPos::Center)),
        TickSide::Right => ([at, (x + len, y)], (x + 2 * len, y), Pos::new(HPos::Left, VPos::Center)),
    }
}

fn draw_tick<DB>(
    root: &DrawingArea<DB, Shift>,
    side: TickSide,
    at: BackendCoord,
    len: i32,
    label: String,
    style: &TextStyle<'_>,
) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let (segment, anchor, pos) = tick_geometry(side, at, len);
    root.draw(&PathElement::new(segment.to_vec(), BLACK.stroke_width(1)))?;
    root.draw(&Text::new(label, anchor, style.pos(pos)))?;
    Ok(())
}

/// Draw every panel into `root`, filling grid cells row by row.
pub fn draw_grid<DB>(
    root: &DrawingArea<DB, Shift>,
    panels: &[Panel],
    opts: &GridOptions,
    style: &FigureStyle,
) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    root.fill(&WHITE)?;
    let colors = SeriesColors::from_style(style)?;
    let layout = opts.layout();

    for (panel, axes) in panels.iter().zip(layout.boxes()) {
        match panel {
            Panel::Plot(p) => draw_plot_panel(root, axes, p, opts, style, &colors)?,
            Panel::Placeholder { message, .. } => draw_placeholder(root, axes, message, opts, style)?,
        }
        debug!("Drew panel '{}' at {:?}", panel.region(), axes);
    }
    Ok(())
}

fn draw_placeholder<DB>(
    root: &DrawingArea<DB, Shift>,
    axes: AxesBox,
    message: &str,
    opts: &GridOptions,
    style: &FigureStyle,
) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let font = (style.font_family.as_str(), font_px(style.font_size, opts.dpi)).into_font();
    let centre = (axes.x + axes.width as i32 / 2, axes.y + axes.height as i32 / 2);
    root.draw(&Text::new(
        message,
        centre,
        TextStyle::from(font).pos(Pos::new(HPos::Center, VPos::Center)),
    ))?;
    Ok(())
}

fn draw_plot_panel<DB>(
    root: &DrawingArea<DB, Shift>,
    axes: AxesBox,
    panel: &PlotPanel,
    opts: &GridOptions,
    style: &FigureStyle,
    colors: &SeriesColors,
) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let s = &panel.series;
    let tick_px = font_px(style.font_size, opts.dpi);
    let frame_px = pt_to_px(opts.frame_lw, opts.dpi);
    let line_px = pt_to_px(style.series_line_width, opts.dpi);
    let tick_len = pt_to_px(TICK_LEN_PT, opts.dpi) as i32;

    // label areas sit outside the axes box so the plotting area matches it exactly
    let left_px = ((tick_px * 4.0).round() as u32).min(axes.x.max(0) as u32);
    let bottom_px = (tick_px * 3.0).round() as u32;
    let right_px = (tick_px * 3.5).round() as u32;
    let area = root.clone().shrink(
        (axes.x - left_px as i32, axes.y),
        (axes.width + left_px + right_px, axes.height + bottom_px),
    );

    let nue_range = padded_range(&s.nue, &NUE_TICKS);
    let benefit_range = range_from_bottom(&s.benefit, BENEFIT_BOTTOM);
    let yield_range = range_from_bottom(&s.yield_kg, YIELD_BOTTOM);

    let tick_font = (style.font_family.as_str(), tick_px).into_font();
    let no_label = |_: &f64| String::new();

    let mut chart = ChartBuilder::on(&area)
        .x_label_area_size(bottom_px)
        .y_label_area_size(left_px)
        .right_y_label_area_size(right_px)
        .build_cartesian_2d(X_RANGE.0..X_RANGE.1, nue_range.0..nue_range.1)?
        .set_secondary_coord(X_RANGE.0..X_RANGE.1, benefit_range.0..benefit_range.1);

    // the mesh only carries the spines and axis titles, ticks are fixed and drawn below
    chart
        .configure_mesh()
        .disable_mesh()
        .x_desc("N-fert (kg/ha)")
        .y_desc("NUE (kg/kg)")
        .axis_desc_style(tick_font.clone())
        .label_style(tick_font.clone())
        .x_label_formatter(&no_label)
        .y_label_formatter(&no_label)
        .axis_style(BLACK.stroke_width(frame_px))
        .set_all_tick_mark_size(0)
        .draw()?;

    chart
        .configure_secondary_axes()
        .label_style(tick_font.clone())
        .x_label_formatter(&no_label)
        .y_label_formatter(&no_label)
        .axis_style(BLACK.stroke_width(frame_px))
        .set_all_tick_mark_size(0)
        .draw()?;

    chart.draw_series(LineSeries::new(
        visible_points(&s.n_fert, &s.nue),
        colors.nue.stroke_width(line_px),
    ))?;
    chart.draw_secondary_series(LineSeries::new(
        visible_points(&s.n_fert, &s.benefit),
        colors.benefit.stroke_width(line_px),
    ))?;

    // yield gets its own y scale over the same plotting rectangle
    let mut yield_chart = ChartBuilder::on(&area)
        .x_label_area_size(bottom_px)
        .y_label_area_size(left_px)
        .right_y_label_area_size(right_px)
        .build_cartesian_2d(X_RANGE.0..X_RANGE.1, yield_range.0..yield_range.1)?;
    yield_chart.draw_series(LineSeries::new(
        visible_points(&s.n_fert, &s.yield_kg),
        colors.yield_kg.stroke_width(line_px),
    ))?;

    let frame = chart.plotting_area().get_pixel_range();
    let (fx, fy) = frame.clone();

    let x_label = tick_font.color(&BLACK);
    for t in X_TICKS {
        let at = chart.backend_coord(&(t, nue_range.0));
        draw_tick(root, TickSide::Bottom, at, tick_len, format!("{t:.0}"), &x_label)?;
    }
    let nue_label = tick_font.color(&colors.nue);
    for t in ticks_within(&NUE_TICKS, nue_range) {
        let at = chart.backend_coord(&(X_RANGE.0, t));
        draw_tick(root, TickSide::Left, at, tick_len, format!("{t:.0}"), &nue_label)?;
    }
    let benefit_label = tick_font.color(&colors.benefit);
    for t in ticks_within(&BENEFIT_TICKS, benefit_range) {
        let at = chart.borrow_secondary().backend_coord(&(X_RANGE.1, t));
        draw_tick(root, TickSide::Right, at, tick_len, format!("{t:.0}"), &benefit_label)?;
    }

    let spine_x = fx.start + (opts.yield_offset * (fx.end - fx.start) as f64).round() as i32;
    root.draw(&PathElement::new(
        vec![(spine_x, fy.start), (spine_x, fy.end)],
        BLACK.stroke_width(frame_px),
    ))?;
    let yield_label = tick_font.color(&colors.yield_kg);
    for t in ticks_within(&YIELD_TICKS, yield_range) {
        let (_, y) = yield_chart.backend_coord(&(X_RANGE.0, t));
        draw_tick(root, TickSide::Right, (spine_x, y), tick_len, format!("{t:.0}"), &yield_label)?;
    }

    root.draw(&Rectangle::new(
        [(fx.start, fy.start), (fx.end, fy.end)],
        BLACK.stroke_width(frame_px),
    ))?;

    let name_font = (style.font_family.as_str(), font_px(opts.province_fontsize, opts.dpi)).into_font();
    root.draw(&Text::new(
        s.region.as_str(),
        axes_point(&frame, 0.02, 0.08),
        TextStyle::from(name_font).pos(Pos::new(HPos::Left, VPos::Bottom)),
    ))?;

    let (_, label_y) = axes_point(&frame, 0.0, 0.05);

    if let Some(lp) = panel.local_practice_rate {
        if in_view(lp) {
            chart.draw_series(DashedLineSeries::new(
                vec![(lp, nue_range.0), (lp, nue_range.1)],
                pt_to_px(3.7, opts.dpi),
                pt_to_px(1.6, opts.dpi),
                colors.local_practice.stroke_width(line_px),
            ))?;
            let (lx, _) = chart.backend_coord(&(lp + 0.03 * (X_RANGE.1 - X_RANGE.0), nue_range.0));
            root.draw(&Text::new(
                format!("{lp:.0}"),
                (lx, label_y),
                tick_font.color(&colors.local_practice).pos(Pos::new(HPos::Center, VPos::Top)),
            ))?;
        } else {
            debug!("{}: local practice {} outside the x range", s.region, lp);
        }
    }

    let xm = panel.max_benefit_rate;
    if in_view(xm) {
        chart.draw_series(LineSeries::new(
            vec![(xm, nue_range.0), (xm, nue_range.1)],
            opts.maxline_color.stroke_width(pt_to_px(style.max_benefit_line_width, opts.dpi)),
        ))?;
        let (mx, _) = chart.backend_coord(&(xm + 0.8, nue_range.0));
        root.draw(&Text::new(
            display_rate(xm).to_string(),
            (mx, label_y),
            tick_font.color(&opts.maxline_color).pos(Pos::new(HPos::Left, VPos::Top)),
        ))?;
    }

    Ok(())
}

pub fn render_grid_png(path: &Path, panels: &[Panel], opts: &GridOptions, style: &FigureStyle) -> Result<()> {
    let root = BitMapBackend::new(path, opts.layout().figure).into_drawing_area();
    draw_grid(&root, panels, opts, style)?;
    root.present().with_context(|| format!("writing {}", path.display()))?;
    info!("Saved {}", path.display());
    Ok(())
}

pub fn render_grid_svg(path: &Path, panels: &[Panel], opts: &GridOptions, style: &FigureStyle) -> Result<()> {
    let root = SVGBackend::new(path, opts.layout().figure).into_drawing_area();
    draw_grid(&root, panels, opts, style)?;
    root.present().with_context(|| format!("writing {}", path.display()))?;
    info!("Saved {}", path.display());
    Ok(())
}
