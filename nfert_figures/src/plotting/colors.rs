use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use palette::Srgb;
use plotters::style::RGBColor;
use tracing::info;

pub fn parse_hex_color(hex: &str) -> Result<RGBColor> {
    let c: Srgb<u8> = hex
        .trim()
        .parse()
        .map_err(|e| anyhow!("invalid colour '{hex}': {e}"))?;
    Ok(RGBColor(c.red, c.green, c.blue))
}

pub fn to_hex(color: RGBColor) -> String {
    format!("#{:X}", Srgb::new(color.0, color.1, color.2))
}

/// Mean colour of every non-transparent pixel in a swatch image, as `#RRGGBB`.
pub fn average_swatch_hex(path: &Path) -> Result<String> {
    let img = image::open(path)
        .with_context(|| format!("cannot read swatch image {}", path.display()))?
        .to_rgba8();

    let mut sum = [0f64; 3];
    let mut n = 0usize;
    for px in img.pixels().filter(|p| p.0[3] > 0) {
        for (acc, v) in sum.iter_mut().zip(px.0.iter()) {
            *acc += *v as f64;
        }
        n += 1;
    }
    if n == 0 {
        bail!("swatch image {} has no opaque pixels", path.display());
    }

    let [r, g, b] = sum.map(|s| (s / n as f64).round_ties_even() as u8);
    let hex = to_hex(RGBColor(r, g, b));
    info!("Sampled {} from {} ({} pixels)", hex, path.display(), n);
    Ok(hex)
}
