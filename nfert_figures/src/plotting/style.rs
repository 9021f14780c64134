use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Fonts, colours and line widths shared by both figures. Every field can be
/// overridden from a JSON file; missing keys keep their defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FigureStyle {
    pub font_family: String,
    /// points
    pub font_size: f64,
    pub nue_color: String,
    pub benefit_color: String,
    pub yield_color: String,
    pub local_practice_color: String,
    /// points
    pub series_line_width: f64,
    pub max_benefit_line_width: f64,
    pub scatter_color: String,
    pub histogram_color: String,
    pub yield_fit_font_size: f64,
}

impl Default for FigureStyle {
    fn default() -> Self {
        Self {
            font_family: "serif".to_string(),
            font_size: 16.0,
            nue_color: "#015AE5".to_string(),
            benefit_color: "#E69800".to_string(),
            yield_color: "#39A702".to_string(),
            local_practice_color: "#555555".to_string(),
            series_line_width: 1.6,
            max_benefit_line_width: 1.8,
            scatter_color: "#E69800".to_string(),
            histogram_color: "#3AA702".to_string(),
            yield_fit_font_size: 14.0,
        }
    }
}

impl FigureStyle {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            None => Ok(Self::default()),
            Some(p) => {
                let text = std::fs::read_to_string(p)
                    .with_context(|| format!("reading style file {}", p.display()))?;
                serde_json::from_str(&text)
                    .with_context(|| format!("parsing style file {}", p.display()))
            }
        }
    }
}
