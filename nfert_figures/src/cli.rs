use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};

use crate::plotting::layout::Margins;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Province NUE grid and yield regression figures")]
pub struct Args {
    /// JSON file overriding fonts, colours and line widths
    #[arg(long, global = true)]
    pub style: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// One panel per province sheet: NUE, benefit and yield against N rate
    NueGrid(GridArgs),
    /// Statistical vs modelled yield with a least-squares fit
    YieldFit(YieldArgs),
}

#[derive(ClapArgs, Debug, Clone)]
pub struct GridArgs {
    /// Workbook with one sheet per province
    #[arg(long, default_value = "data.xlsx")]
    pub xlsx: PathBuf,

    #[arg(long, default_value = "NUE_1015.png")]
    pub out_png: PathBuf,

    #[arg(long, default_value = "NUE_1015.svg")]
    pub out_svg: PathBuf,

    /// Yield spine position as a fraction of the axes width
    #[arg(long, default_value_t = 1.0)]
    pub yield_offset: f64,

    /// Colour of the max-benefit line
    #[arg(long, default_value = "#E60000")]
    pub maxline_hex: String,

    /// Image whose average colour replaces --maxline-hex
    #[arg(long)]
    pub maxline_swatch: Option<PathBuf>,

    /// Frame width in points
    #[arg(long, default_value_t = 1.2)]
    pub frame_lw: f64,

    #[arg(long, value_delimiter = ',', default_value = "20,60,100")]
    pub x_ticks: Vec<f64>,

    #[arg(long, default_value_t = 28.0)]
    pub province_fontsize: f64,

    /// Table of local practice N rates (pname, fer_amount_mean)
    #[arg(long, default_value = "province_fer_amount_mean.xlsx")]
    pub local_nfert_xlsx: PathBuf,

    #[arg(long, default_value_t = 0.06)]
    pub left: f64,
    #[arg(long, default_value_t = 0.93)]
    pub right: f64,
    #[arg(long, default_value_t = 0.90)]
    pub top: f64,
    #[arg(long, default_value_t = 0.08)]
    pub bottom: f64,
    #[arg(long, default_value_t = 0.40)]
    pub wspace: f64,
    #[arg(long, default_value_t = 0.30)]
    pub hspace: f64,

    #[arg(long, default_value_t = 100.0)]
    pub dpi: f64,

    /// Write per-panel results as JSON
    #[arg(long)]
    pub summary_json: Option<PathBuf>,
}

impl GridArgs {
    pub fn margins(&self) -> Margins {
        Margins {
            left: self.left,
            right: self.right,
            top: self.top,
            bottom: self.bottom,
            wspace: self.wspace,
            hspace: self.hspace,
        }
    }
}

#[derive(ClapArgs, Debug, Clone)]
pub struct YieldArgs {
    #[arg(long, default_value = "WS-0513.xlsx")]
    pub xlsx: PathBuf,

    #[arg(long, default_value = "Sheet1")]
    pub sheet: String,

    /// Observed (statistical) yield column
    #[arg(long, default_value = "statistical_yield(kg/ha)")]
    pub x_column: String,

    /// Modelled yield column
    #[arg(long, default_value = "modelling yield kg/ha")]
    pub y_column: String,

    /// Season name used in the axis labels
    #[arg(long, default_value = "Wet season")]
    pub season: String,

    #[arg(long, default_value_t = 6000.0)]
    pub axis_max: f64,

    #[arg(long, default_value = "yield_fit.png")]
    pub out_png: PathBuf,

    #[arg(long, default_value = "yield_fit.svg")]
    pub out_svg: PathBuf,

    #[arg(long, default_value_t = 100.0)]
    pub dpi: f64,

    /// Write the fit statistics as JSON
    #[arg(long)]
    pub summary_json: Option<PathBuf>,
}
